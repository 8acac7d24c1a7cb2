use std::collections::VecDeque;

use phyto_shared::PlantState;

/// Bounded history of classification outputs for majority smoothing.
#[derive(Debug, Clone)]
pub struct TemporalContext {
    history: VecDeque<PlantState>,
    depth: usize,
}

impl TemporalContext {
    pub fn new(depth: usize) -> Self {
        let depth = depth.max(1);
        Self {
            history: VecDeque::with_capacity(depth),
            depth,
        }
    }

    pub fn push(&mut self, state: PlantState) {
        if self.history.len() == self.depth {
            self.history.pop_front();
        }
        self.history.push_back(state);
    }

    /// Most frequent known state; ties go to the first-enumerated state.
    ///
    /// Unknown entries take part in neither the count nor the result, so a
    /// history holding only Unknown (or nothing) smooths to Unknown.
    pub fn smoothed(&self) -> PlantState {
        let mut counts = [0usize; PlantState::COUNT];
        for idx in self.history.iter().filter_map(|s| s.index()) {
            counts[idx] += 1;
        }

        let mut best = PlantState::Unknown;
        let mut best_count = 0;
        for (state, &count) in PlantState::KNOWN.iter().zip(counts.iter()) {
            if count > best_count {
                best = *state;
                best_count = count;
            }
        }
        best
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_is_unknown() {
        assert_eq!(TemporalContext::new(5).smoothed(), PlantState::Unknown);
    }

    #[test]
    fn majority_wins() {
        let mut context = TemporalContext::new(5);
        for state in [
            PlantState::Calm,
            PlantState::Stress,
            PlantState::Stress,
            PlantState::Calm,
            PlantState::Stress,
        ] {
            context.push(state);
        }
        assert_eq!(context.smoothed(), PlantState::Stress);
    }

    #[test]
    fn ties_go_to_first_enumerated() {
        let mut context = TemporalContext::new(5);
        context.push(PlantState::Stress);
        context.push(PlantState::Active);
        assert_eq!(context.smoothed(), PlantState::Active);
    }

    #[test]
    fn oldest_entries_fall_out() {
        let mut context = TemporalContext::new(3);
        for _ in 0..3 {
            context.push(PlantState::Resting);
        }
        for _ in 0..2 {
            context.push(PlantState::Stimulus);
        }
        assert_eq!(context.len(), 3);
        assert_eq!(context.smoothed(), PlantState::Stimulus);
    }
}
