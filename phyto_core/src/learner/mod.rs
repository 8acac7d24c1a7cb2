//! Classifiers over feature records.
//!
//! Provides the prototype distance classifier and the heuristic rule
//! baseline. The hyperdimensional classifier lives in [`crate::hdc`] and
//! reports its results through the same [`Verdict`] type.

pub mod prototype;
pub mod rules;

use std::collections::BTreeMap;

use phyto_shared::PlantState;
use serde::Serialize;

use crate::profile::OrganismProfile;
use crate::signal::FeatureRecord;

pub use prototype::PrototypeClassifier;
pub use rules::RuleBaseline;

/// A classification: one winning state and a score per known state.
///
/// Scores are only comparable within a single classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub state: PlantState,
    pub scores: BTreeMap<PlantState, f32>,
}

impl Verdict {
    /// Stand-in used when a classifier could not be constructed.
    pub fn unavailable() -> Self {
        Self {
            state: PlantState::Unknown,
            scores: BTreeMap::new(),
        }
    }

    /// Pick the highest score; ties go to the first-enumerated state.
    pub fn from_scores(scores: BTreeMap<PlantState, f32>) -> Self {
        let mut best = PlantState::Unknown;
        let mut best_score = f32::NEG_INFINITY;
        for state in PlantState::KNOWN {
            if let Some(&score) = scores.get(&state) {
                if score > best_score {
                    best = state;
                    best_score = score;
                }
            }
        }
        Self {
            state: best,
            scores,
        }
    }

    /// Score of the winning state, 0 when unavailable.
    pub fn confidence(&self) -> f32 {
        self.scores.get(&self.state).copied().unwrap_or(0.0)
    }
}

/// Common interface for the stateless-at-call-time classifiers.
pub trait StateClassifier {
    fn name(&self) -> &'static str;

    fn classify(&self, features: &FeatureRecord, profile: &OrganismProfile) -> Verdict;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdict_picks_highest_and_breaks_ties_by_order() {
        let scores: BTreeMap<PlantState, f32> = PlantState::KNOWN
            .iter()
            .map(|&s| (s, if s == PlantState::Active || s == PlantState::Stress { 0.4 } else { 0.05 }))
            .collect();
        let verdict = Verdict::from_scores(scores);
        assert_eq!(verdict.state, PlantState::Active);
        assert!((verdict.confidence() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn unavailable_verdict_is_unknown_and_empty() {
        let verdict = Verdict::unavailable();
        assert_eq!(verdict.state, PlantState::Unknown);
        assert!(verdict.scores.is_empty());
        assert_eq!(verdict.confidence(), 0.0);
        assert_eq!(Verdict::from_scores(BTreeMap::new()).state, PlantState::Unknown);
    }

    #[test]
    fn classifiers_report_their_names() {
        let pdc = PrototypeClassifier::new(
            &crate::profile::builtin::plant(),
            &crate::config::PdcConfig::default(),
        )
        .unwrap();
        assert_eq!(pdc.name(), "pdc");
        assert_eq!(RuleBaseline::new().name(), "rules");
    }
}
