//! Per-tick output of the co-training loop.

use phyto_shared::{PlantState, RawSample};
use serde::Serialize;

use crate::hdc::{LearnOutcome, LearningStats, Novelty};
use crate::learner::Verdict;
use crate::signal::{FeatureRecord, SignalQuality};

/// Everything the loop reports for one sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickResult {
    /// Zero-based index of this tick in the stream.
    pub tick: u64,
    pub sample: RawSample,
    pub organism: String,
    /// Absent while the window holds too few samples.
    pub classification: Option<Classification>,
}

impl TickResult {
    pub fn raw_only(tick: u64, sample: RawSample, organism: &str) -> Self {
        Self {
            tick,
            sample,
            organism: organism.to_string(),
            classification: None,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.classification.is_some()
    }

    /// Smoothed state, or Unknown for raw-only results.
    pub fn smoothed_state(&self) -> PlantState {
        self.classification
            .as_ref()
            .map_or(PlantState::Unknown, |c| c.smoothed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classification {
    pub pdc: Verdict,
    pub hdc: Verdict,
    pub rules: Verdict,
    /// State pushed into the smoothing history this tick.
    pub primary: PlantState,
    pub smoothed: PlantState,
    pub features: FeatureRecord,
    pub quality: SignalQuality,
    pub novelty: Option<Novelty>,
    pub hdc_stats: Option<LearningStats>,
    pub pseudo_label_count: u64,
    /// Outcome of the auto-calibration step, while calibrating.
    pub calibration: Option<LearnOutcome>,
    pub learning: LearnEvent,
}

/// Learning applied after classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearnEvent {
    None,
    /// Operator label, taught to both classifiers.
    UserLabel {
        state: PlantState,
        hdc: Option<LearnOutcome>,
        pdc_alpha: Option<f32>,
    },
    /// Both classifiers agreed with confidence; taught to the HDC only.
    PseudoLabel { state: PlantState, hdc: LearnOutcome },
    /// The PDC's opinion taught to an HDC state with few exemplars.
    SeedBootstrap { state: PlantState, hdc: LearnOutcome },
}

impl LearnEvent {
    pub fn state(&self) -> Option<PlantState> {
        match self {
            LearnEvent::None => None,
            LearnEvent::UserLabel { state, .. }
            | LearnEvent::PseudoLabel { state, .. }
            | LearnEvent::SeedBootstrap { state, .. } => Some(*state),
        }
    }
}
