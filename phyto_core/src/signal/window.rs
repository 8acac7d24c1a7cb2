use std::collections::VecDeque;

use phyto_shared::RawSample;

/// Default window capacity in samples.
pub const DEFAULT_CAPACITY: usize = 50;

/// Fixed-capacity buffer of the most recent samples, newest first.
///
/// A window is never mutated in place by the loop: [`Window::push`] returns
/// the next window and the previous value is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Window {
    samples: VecDeque<RawSample>,
    capacity: usize,
}

impl Window {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Window with `sample` prepended and the oldest sample dropped at capacity.
    #[must_use]
    pub fn push(&self, sample: RawSample) -> Self {
        let mut samples = self.samples.clone();
        samples.push_front(sample);
        samples.truncate(self.capacity);
        Self {
            samples,
            capacity: self.capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn newest(&self) -> Option<&RawSample> {
        self.samples.front()
    }

    /// Samples newest first.
    pub fn iter(&self) -> impl Iterator<Item = &RawSample> {
        self.samples.iter()
    }

    /// Deviation values oldest first, the order the extractor expects.
    pub fn chronological_deviations(&self) -> Vec<f32> {
        self.samples.iter().rev().map(|s| s.deviation).collect()
    }

    pub fn has_at_least(&self, min_samples: usize) -> bool {
        self.samples.len() >= min_samples
    }
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f64, v: f32) -> RawSample {
        RawSample::from_deviation(t, v)
    }

    #[test]
    fn push_keeps_newest_first_and_bounds_capacity() {
        let mut window = Window::new(3);
        for i in 0..5 {
            window = window.push(sample(i as f64, i as f32));
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.newest().map(|s| s.deviation), Some(4.0));
        assert_eq!(window.chronological_deviations(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn push_leaves_previous_window_unchanged() {
        let first = Window::new(4).push(sample(0.0, 1.0));
        let second = first.push(sample(0.05, 2.0));
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 2);
    }

    #[test]
    fn readiness_threshold() {
        let mut window = Window::default();
        for i in 0..9 {
            window = window.push(sample(i as f64, 0.0));
        }
        assert!(!window.has_at_least(10));
        window = window.push(sample(9.0, 0.0));
        assert!(window.has_at_least(10));
    }
}
