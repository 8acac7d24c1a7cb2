//! # Phyto Cognition Core
//!
//! A deterministic engine that turns a stream of bioelectric samples from
//! a plant or fungus into a classified physiological state. Two adaptive
//! classifiers, a hyperdimensional exemplar memory and a prototype distance
//! softmax, teach each other from operator labels and confident agreement.
//!
//! ## Quick Start
//!
//! ```rust
//! use phyto_cognition_core::{CoTrainer, EngineConfig};
//! use phyto_shared::{Mailbox, RawSample};
//!
//! let mut trainer = CoTrainer::new(EngineConfig::default()).unwrap();
//! let mailbox = Mailbox::new();
//!
//! for i in 0..40 {
//!     let deviation = 2.0 * (i as f32 * 0.3).sin();
//!     let result = trainer.tick(RawSample::from_deviation(i as f64 * 0.05, deviation), &mailbox);
//!     if let Some(classification) = &result.classification {
//!         println!("{} -> {}", result.tick, classification.smoothed);
//!     }
//! }
//!
//! mailbox.submit_label("calm").unwrap();
//! ```
//!
//! ## Core Modules
//!
//! - [`signal`] - Windowing, feature extraction and the quality gate
//! - [`profile`] - Organism profiles and the profile registry
//! - [`hdc`] - Hyperdimensional encoder and exemplar memory
//! - [`learner`] - Prototype distance classifier and rule baseline
//! - [`cotrain`] - Per-tick orchestration and learning
//! - [`config`] - Engine configuration via TOML
//! - [`logging`] - JSON line-delimited tick journal

pub mod config;
pub mod cotrain;
pub mod error;
pub mod hdc;
pub mod learner;
pub mod logging;
pub mod profile;
pub mod signal;

pub use config::{CoTrainConfig, ConfigError, EngineConfig, EngineSection, HdcConfig, PdcConfig};
pub use cotrain::{Classification, CoTrainer, LearnEvent, TemporalContext, TickResult};
pub use error::{EngineError, EngineResult};
pub use hdc::{HdcMemory, Hypervector, LearnOutcome, LearningStats, Novelty, SignalEncoder};
pub use learner::{PrototypeClassifier, RuleBaseline, StateClassifier, Verdict};
pub use logging::TickJournal;
pub use profile::{HdcFeature, OrganismProfile, ProfileRegistry, QuantizationRanges, ValueRange};
pub use signal::{
    assess_quality, clamp_outliers, FeatureExtractor, FeatureRecord, QualityReason, SignalQuality,
    Window,
};

pub use phyto_shared::{Mailbox, MailboxError, PlantState, RawSample};
