//! Engine configuration management via TOML files.
//!
//! Every section is optional; missing sections and keys fall back to the
//! defaults the engine was tuned with. Organism-specific data lives in
//! [`crate::profile`], not here.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::profile::builtin::DEFAULT_ORGANISM;
use crate::signal::WindowFunction;

/// Engine configuration loaded from a TOML file.
///
/// # Examples
///
/// ```
/// use phyto_cognition_core::EngineConfig;
///
/// let config = EngineConfig::load_from_file("config/engine.toml")
///     .unwrap_or_else(|_| EngineConfig::default());
///
/// println!("Sample rate: {} Hz", config.engine.sample_rate_hz);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineConfig {
    pub engine: EngineSection,
    pub hdc: HdcConfig,
    pub pdc: PdcConfig,
    pub cotrain: CoTrainConfig,
}

impl EngineConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(&path)?;
        Self::from_str(&contents)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawEngineConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let config = Self {
            engine: EngineSection::from_raw(&raw.engine)?,
            hdc: raw.hdc,
            pdc: raw.pdc,
            cotrain: raw.cotrain,
        };
        config.hdc.validate()?;
        config.pdc.validate()?;
        config.cotrain.validate()?;
        Ok(config)
    }
}

/// Stream-level parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EngineSection {
    /// Acquisition sample rate in Hz
    pub sample_rate_hz: f32,
    /// Number of samples kept in the sliding window
    pub window_capacity: usize,
    /// Samples required before a window is classified
    pub min_samples: usize,
    /// Seed for the hyperdimensional role and level vectors
    pub seed: u64,
    /// Profile selected at startup
    pub organism: String,
    /// Triangular filters in the cepstral filterbank
    pub spectral_filters: usize,
    /// Taper applied before spectral estimation
    pub window_function: WindowFunction,
}

impl EngineSection {
    fn from_raw(raw: &RawEngineSection) -> Result<Self, ConfigError> {
        if !raw.sample_rate_hz.is_finite() || raw.sample_rate_hz <= 0.0 {
            return Err(ConfigError::Parse(
                "engine.sample_rate_hz must be positive".into(),
            ));
        }
        if raw.min_samples < 2 {
            return Err(ConfigError::Parse("engine.min_samples must be ≥ 2".into()));
        }
        if raw.window_capacity < raw.min_samples {
            return Err(ConfigError::Parse(
                "engine.window_capacity must be ≥ engine.min_samples".into(),
            ));
        }
        if raw.spectral_filters < 9 {
            return Err(ConfigError::Parse(
                "engine.spectral_filters must be ≥ 9 to yield eight cepstral coefficients".into(),
            ));
        }

        Ok(Self {
            sample_rate_hz: raw.sample_rate_hz,
            window_capacity: raw.window_capacity,
            min_samples: raw.min_samples,
            seed: raw.seed,
            organism: raw.organism.trim().to_string(),
            spectral_filters: raw.spectral_filters,
            window_function: raw.window_function,
        })
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            window_capacity: default_window_capacity(),
            min_samples: default_min_samples(),
            seed: default_seed(),
            organism: default_organism(),
            spectral_filters: default_spectral_filters(),
            window_function: default_window_function(),
        }
    }
}

/// Hyperdimensional classifier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HdcConfig {
    pub max_exemplars_per_state: usize,
    /// Similarity above which a new exemplar is redundant
    pub redundancy_threshold: f32,
    /// Weight applied to seed-prototype similarity
    pub seed_weight: f32,
    /// Weight applied to exemplar similarity
    pub exemplar_weight: f32,
    /// EMA decay for the per-state similarity statistics
    pub novelty_decay: f32,
    /// Standard deviations below the mean that count as novel
    pub novelty_sigma: f32,
    /// Observations a state needs before novelty is reported
    pub novelty_min_observations: u32,
    /// Classified ticks spent in auto-calibration
    pub calibration_ticks: u32,
    /// Every n-th calibration tick is learned as resting
    pub calibration_interval: u32,
}

impl HdcConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_exemplars_per_state == 0 {
            return Err(ConfigError::Parse(
                "hdc.max_exemplars_per_state must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.redundancy_threshold) {
            return Err(ConfigError::Parse(
                "hdc.redundancy_threshold must lie in [0, 1]".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.novelty_decay) {
            return Err(ConfigError::Parse(
                "hdc.novelty_decay must lie in [0, 1)".into(),
            ));
        }
        if self.calibration_interval == 0 {
            return Err(ConfigError::Parse(
                "hdc.calibration_interval must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for HdcConfig {
    fn default() -> Self {
        Self {
            max_exemplars_per_state: 5,
            redundancy_threshold: 0.85,
            seed_weight: 0.3,
            exemplar_weight: 1.0,
            novelty_decay: 0.95,
            novelty_sigma: 1.5,
            novelty_min_observations: 5,
            calibration_ticks: 60,
            calibration_interval: 10,
        }
    }
}

/// Prototype distance classifier parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdcConfig {
    pub base_learning_rate: f32,
    pub min_alpha: f32,
    pub max_alpha: f32,
}

impl PdcConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_alpha >= 0.0 && self.min_alpha <= self.max_alpha && self.max_alpha <= 1.0) {
            return Err(ConfigError::Parse(
                "pdc alpha bounds must satisfy 0 ≤ min_alpha ≤ max_alpha ≤ 1".into(),
            ));
        }
        if !self.base_learning_rate.is_finite() || self.base_learning_rate < 0.0 {
            return Err(ConfigError::Parse(
                "pdc.base_learning_rate must be ≥ 0".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PdcConfig {
    fn default() -> Self {
        Self {
            base_learning_rate: 0.2,
            min_alpha: 0.01,
            max_alpha: 0.3,
        }
    }
}

/// Co-training loop parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoTrainConfig {
    /// Minimum ticks between pseudo-labels
    pub pseudo_label_interval: u64,
    /// PDC probability required for pseudo-labels and seed bootstrapping
    pub pdc_confidence: f32,
    /// HDC score required for pseudo-labels
    pub hdc_confidence: f32,
    /// Seed bootstrapping stops once a state holds this many exemplars
    pub bootstrap_max_exemplars: usize,
    /// Ticks between drift corrections
    pub drift_interval: u64,
    /// EMA rate used to widen quantization ranges
    pub drift_alpha: f32,
    /// Depth of the majority-vote smoothing history
    pub smoothing_depth: usize,
}

impl CoTrainConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.drift_interval == 0 {
            return Err(ConfigError::Parse(
                "cotrain.drift_interval must be ≥ 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.drift_alpha) {
            return Err(ConfigError::Parse(
                "cotrain.drift_alpha must lie in [0, 1]".into(),
            ));
        }
        if self.smoothing_depth == 0 {
            return Err(ConfigError::Parse(
                "cotrain.smoothing_depth must be ≥ 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for CoTrainConfig {
    fn default() -> Self {
        Self {
            pseudo_label_interval: 20,
            pdc_confidence: 0.25,
            hdc_confidence: 0.4,
            bootstrap_max_exemplars: 3,
            drift_interval: 30,
            drift_alpha: 0.01,
            smoothing_depth: 5,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEngineConfig {
    #[serde(default)]
    engine: RawEngineSection,
    #[serde(default)]
    hdc: HdcConfig,
    #[serde(default)]
    pdc: PdcConfig,
    #[serde(default)]
    cotrain: CoTrainConfig,
}

#[derive(Debug, Deserialize)]
struct RawEngineSection {
    #[serde(default = "default_sample_rate")]
    sample_rate_hz: f32,
    #[serde(default = "default_window_capacity")]
    window_capacity: usize,
    #[serde(default = "default_min_samples")]
    min_samples: usize,
    #[serde(default = "default_seed")]
    seed: u64,
    #[serde(default = "default_organism")]
    organism: String,
    #[serde(default = "default_spectral_filters")]
    spectral_filters: usize,
    #[serde(default = "default_window_function")]
    window_function: WindowFunction,
}

impl Default for RawEngineSection {
    fn default() -> Self {
        Self {
            sample_rate_hz: default_sample_rate(),
            window_capacity: default_window_capacity(),
            min_samples: default_min_samples(),
            seed: default_seed(),
            organism: default_organism(),
            spectral_filters: default_spectral_filters(),
            window_function: default_window_function(),
        }
    }
}

fn default_sample_rate() -> f32 {
    20.0
}

fn default_window_capacity() -> usize {
    50
}

fn default_min_samples() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_organism() -> String {
    DEFAULT_ORGANISM.to_string()
}

fn default_spectral_filters() -> usize {
    12
}

fn default_window_function() -> WindowFunction {
    WindowFunction::Hamming
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_config_defaults_when_sections_missing() {
        let config = EngineConfig::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.engine.window_capacity, 50);
        assert_eq!(config.engine.min_samples, 10);
        assert_eq!(config.engine.organism, "plant");
        assert_eq!(config.engine.window_function, WindowFunction::Hamming);
        assert_eq!(config.hdc.max_exemplars_per_state, 5);
        assert_eq!(config.cotrain.pseudo_label_interval, 20);
    }

    #[test]
    fn engine_config_parses_custom_values() {
        let toml = "[engine]\nsample_rate_hz = 10.0\norganism = \"fungus\"\n[hdc]\nredundancy_threshold = 0.9\n[cotrain]\ndrift_interval = 15";
        let config = EngineConfig::from_str(toml).unwrap();
        assert!((config.engine.sample_rate_hz - 10.0).abs() < f32::EPSILON);
        assert_eq!(config.engine.organism, "fungus");
        assert!((config.hdc.redundancy_threshold - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.hdc.calibration_ticks, 60);
        assert_eq!(config.cotrain.drift_interval, 15);
    }

    #[test]
    fn engine_config_selects_window_function() {
        let config = EngineConfig::from_str("[engine]\nwindow_function = \"hann\"").unwrap();
        assert_eq!(config.engine.window_function, WindowFunction::Hann);
        let config = EngineConfig::from_str("[engine]\nwindow_function = \"none\"").unwrap();
        assert_eq!(config.engine.window_function, WindowFunction::None);
        assert!(EngineConfig::from_str("[engine]\nwindow_function = \"kaiser\"").is_err());
    }

    #[test]
    fn engine_config_rejects_window_smaller_than_minimum() {
        let toml = "[engine]\nwindow_capacity = 5\nmin_samples = 10";
        assert!(EngineConfig::from_str(toml).is_err());
    }

    #[test]
    fn engine_config_rejects_inverted_alpha_bounds() {
        let toml = "[pdc]\nmin_alpha = 0.5\nmax_alpha = 0.1";
        assert!(EngineConfig::from_str(toml).is_err());
    }

    #[test]
    fn engine_config_rejects_non_toml() {
        let err = EngineConfig::from_str("[engine").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn shipped_engine_file_parses() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/engine.toml");
        let config = EngineConfig::load_from_file(path).unwrap();
        assert_eq!(config.engine.seed, 42);
    }
}
