//! Hyperdimensional classifier.
//!
//! Feature records are quantized and bound into 10,048-bit hypervectors,
//! compared against seed prototypes and learned exemplars by Hamming
//! similarity. The memory tracks per-state novelty statistics and runs a
//! short auto-calibration phase that learns the opening ticks as resting.

pub mod encoder;
pub mod hypervector;
pub mod memory;

pub use encoder::{quantize, SignalEncoder, LEVELS};
pub use hypervector::{Hypervector, HV_BITS, HV_WORDS};
pub use memory::{
    Exemplar, HdcClassification, HdcMemory, LearnOutcome, LearningStats, Novelty, StateStats,
};
