//! Signal processing for bioelectric windows.
//!
//! Provides window management, feature extraction, Goertzel/mel spectral
//! analysis and the quality gate that decides whether a window may be
//! learned from.

pub mod features;
pub mod quality;
pub mod spectral;
pub mod window;

pub use features::{
    FeatureExtractor, FeatureRecord, TIME_DOMAIN_FEATURES, TIME_DOMAIN_NAMES, TOTAL_FEATURES,
};
pub use quality::{assess_quality, clamp_outliers, QualityReason, SignalQuality};
pub use spectral::{
    compute_spectral_entropy, goertzel_power, MelFilterbank, SpectralSummary, WindowFunction,
    CEPSTRAL_COEFFS,
};
pub use window::Window;
