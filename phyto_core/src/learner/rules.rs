//! Heuristic rule baseline.
//!
//! A fixed decision list over a handful of features, kept as a third
//! opinion next to the adaptive classifiers. It never learns.

use std::collections::BTreeMap;

use phyto_shared::PlantState;

use super::{StateClassifier, Verdict};
use crate::profile::{OrganismProfile, RuleThresholds};
use crate::signal::FeatureRecord;

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBaseline;

impl RuleBaseline {
    pub fn new() -> Self {
        Self
    }

    /// First matching rule wins.
    pub fn decide(features: &FeatureRecord, rules: &RuleThresholds) -> PlantState {
        if features.max_diff > rules.stimulus_max_diff {
            PlantState::Stimulus
        } else if features.std > rules.stress_std {
            PlantState::Stress
        } else if features.slope.abs() > rules.transition_slope {
            PlantState::Transition
        } else if features.std > rules.active_std {
            PlantState::Active
        } else if features.std < rules.resting_std {
            PlantState::Resting
        } else {
            PlantState::Calm
        }
    }
}

impl StateClassifier for RuleBaseline {
    fn name(&self) -> &'static str {
        "rules"
    }

    fn classify(&self, features: &FeatureRecord, profile: &OrganismProfile) -> Verdict {
        let state = Self::decide(features, &profile.rules);
        let scores: BTreeMap<PlantState, f32> = PlantState::KNOWN
            .iter()
            .map(|&s| (s, if s == state { 1.0 } else { 0.0 }))
            .collect();
        Verdict { state, scores }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::builtin;
    use crate::signal::FeatureExtractor;

    fn classify(values: &[f32]) -> Verdict {
        let features = FeatureExtractor::new(20.0).extract_values(values).unwrap();
        RuleBaseline::new().classify(&features, &builtin::plant())
    }

    #[test]
    fn test_flat_is_resting() {
        assert_eq!(classify(&[1.0; 12]).state, PlantState::Resting);
    }

    #[test]
    fn test_spike_is_stimulus() {
        let mut values = vec![0.0; 20];
        values[9] = 50.0;
        assert_eq!(classify(&values).state, PlantState::Stimulus);
    }

    #[test]
    fn test_ramp_is_transition() {
        let values: Vec<f32> = (0..12).map(|i| i as f32 * 1.5).collect();
        assert_eq!(classify(&values).state, PlantState::Transition);
    }

    #[test]
    fn test_scores_are_one_hot() {
        let verdict = classify(&[0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        assert_eq!(verdict.scores.len(), PlantState::COUNT);
        let total: f32 = verdict.scores.values().sum();
        assert_eq!(total, 1.0);
        assert_eq!(verdict.scores[&verdict.state], 1.0);
    }
}
