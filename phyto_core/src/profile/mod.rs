//! Organism profiles.
//!
//! A profile carries everything organism-specific the classifiers consume:
//! quantization ranges for the hyperdimensional encoder, normalization bounds
//! and prototypes for the distance classifier, the softmax temperature, rule
//! thresholds for the heuristic baseline and the quality-gate thresholds.
//! Profiles are selected by name from a [`ProfileRegistry`], which ships the
//! built-in profiles and accepts more loaded from TOML.

pub mod builtin;
pub mod registry;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use phyto_shared::PlantState;
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::signal::{FeatureRecord, TIME_DOMAIN_FEATURES, TIME_DOMAIN_NAMES};

pub use registry::ProfileRegistry;

/// Closed `[min, max]` interval, written as a two-element array in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct ValueRange {
    pub min: f32,
    pub max: f32,
}

impl ValueRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f32 {
        self.max - self.min
    }

    /// Finite bounds with `min < max`.
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }

    /// Linear map into `[0, 1]`, clamping out-of-range values.
    pub fn normalize(&self, value: f32) -> f32 {
        let span = self.span();
        if !(span > 0.0) || !value.is_finite() {
            return 0.0;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    /// Inverse of [`ValueRange::normalize`] for values in `[0, 1]`.
    pub fn denormalize(&self, unit: f32) -> f32 {
        self.min + unit.clamp(0.0, 1.0) * self.span()
    }
}

impl From<[f32; 2]> for ValueRange {
    fn from(pair: [f32; 2]) -> Self {
        Self::new(pair[0], pair[1])
    }
}

impl From<ValueRange> for [f32; 2] {
    fn from(range: ValueRange) -> Self {
        [range.min, range.max]
    }
}

/// The five features the hyperdimensional encoder quantizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdcFeature {
    Mean,
    Std,
    Range,
    Slope,
    Energy,
}

impl HdcFeature {
    pub const ALL: [HdcFeature; 5] = [
        HdcFeature::Mean,
        HdcFeature::Std,
        HdcFeature::Range,
        HdcFeature::Slope,
        HdcFeature::Energy,
    ];

    pub fn value(self, features: &FeatureRecord) -> f32 {
        match self {
            HdcFeature::Mean => features.mean,
            HdcFeature::Std => features.std,
            HdcFeature::Range => features.range,
            HdcFeature::Slope => features.slope,
            HdcFeature::Energy => features.energy,
        }
    }

    /// Position of this feature in [`FeatureRecord::time_domain`].
    pub fn time_domain_index(self) -> usize {
        match self {
            HdcFeature::Mean => 0,
            HdcFeature::Std => 1,
            HdcFeature::Range => 4,
            HdcFeature::Slope => 5,
            HdcFeature::Energy => 6,
        }
    }

    pub fn name(self) -> &'static str {
        TIME_DOMAIN_NAMES[self.time_domain_index()]
    }
}

/// Per-feature `[min, max]` used to quantize the HDC features.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantizationRanges {
    pub mean: ValueRange,
    pub std: ValueRange,
    pub range: ValueRange,
    pub slope: ValueRange,
    pub energy: ValueRange,
}

impl QuantizationRanges {
    pub fn get(&self, feature: HdcFeature) -> &ValueRange {
        match feature {
            HdcFeature::Mean => &self.mean,
            HdcFeature::Std => &self.std,
            HdcFeature::Range => &self.range,
            HdcFeature::Slope => &self.slope,
            HdcFeature::Energy => &self.energy,
        }
    }

    pub fn get_mut(&mut self, feature: HdcFeature) -> &mut ValueRange {
        match feature {
            HdcFeature::Mean => &mut self.mean,
            HdcFeature::Std => &mut self.std,
            HdcFeature::Range => &mut self.range,
            HdcFeature::Slope => &mut self.slope,
            HdcFeature::Energy => &mut self.energy,
        }
    }

    pub fn is_valid(&self) -> bool {
        HdcFeature::ALL.iter().all(|&f| self.get(f).is_valid())
    }
}

/// Thresholds for the signal quality gate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Standard deviation below this is a flat line.
    pub flat_std_floor: f32,
    /// Range above this is saturated.
    pub saturated_range_ceiling: f32,
    /// Excess kurtosis above this is an artifact.
    pub artifact_kurtosis_ceiling: f32,
    /// Lag-1 autocorrelation below this is noise.
    pub noisy_autocorr_floor: f32,
}

/// Thresholds for the heuristic rule baseline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleThresholds {
    /// mV/s
    pub stimulus_max_diff: f32,
    pub stress_std: f32,
    pub transition_slope: f32,
    pub active_std: f32,
    pub resting_std: f32,
}

/// Static organism configuration consumed by every classifier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrganismProfile {
    pub name: String,
    pub quantization: QuantizationRanges,
    /// One bound per time-domain feature, in [`FeatureRecord::time_domain`] order.
    pub bounds: Vec<ValueRange>,
    /// One 19-element prototype per classifiable state.
    pub prototypes: BTreeMap<PlantState, Vec<f32>>,
    pub temperature: f32,
    pub rules: RuleThresholds,
    pub quality: QualityThresholds,
}

impl OrganismProfile {
    /// Load a profile from a TOML file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a profile from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawProfile =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;
        let profile = Self::try_from(raw)?;
        profile.validate()?;
        Ok(profile)
    }

    /// Check every invariant the classifiers rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fail = |reason: String| {
            Err(ConfigError::Parse(format!(
                "profile '{}': {}",
                self.name, reason
            )))
        };

        if self.name.trim().is_empty() {
            return Err(ConfigError::Parse("profile name must not be empty".into()));
        }
        if !self.quantization.is_valid() {
            return fail("quantization ranges must be finite with min < max".into());
        }
        if self.bounds.len() != TIME_DOMAIN_FEATURES {
            return fail(format!(
                "expected {} normalization bounds, got {}",
                TIME_DOMAIN_FEATURES,
                self.bounds.len()
            ));
        }
        if let Some(idx) = self.bounds.iter().position(|b| !b.is_valid()) {
            return fail(format!(
                "bound '{}' must be finite with min < max",
                TIME_DOMAIN_NAMES[idx]
            ));
        }
        for state in PlantState::KNOWN {
            match self.prototypes.get(&state) {
                Some(proto) if proto.len() == TIME_DOMAIN_FEATURES => {
                    if proto.iter().any(|v| !v.is_finite()) {
                        return fail(format!("prototype '{}' has non-finite values", state));
                    }
                }
                Some(proto) => {
                    return fail(format!(
                        "prototype '{}' has {} values, expected {}",
                        state,
                        proto.len(),
                        TIME_DOMAIN_FEATURES
                    ))
                }
                None => return fail(format!("missing prototype for '{}'", state)),
            }
        }
        if !self.temperature.is_finite() || self.temperature <= 0.0 {
            return fail("temperature must be positive".into());
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RawProfile {
    name: String,
    #[serde(default = "default_temperature")]
    temperature: f32,
    quantization: QuantizationRanges,
    bounds: BTreeMap<String, ValueRange>,
    prototypes: BTreeMap<String, Vec<f32>>,
    rules: RuleThresholds,
    quality: QualityThresholds,
}

fn default_temperature() -> f32 {
    0.1
}

impl TryFrom<RawProfile> for OrganismProfile {
    type Error = ConfigError;

    fn try_from(raw: RawProfile) -> Result<Self, Self::Error> {
        let mut bounds = Vec::with_capacity(TIME_DOMAIN_FEATURES);
        for name in TIME_DOMAIN_NAMES {
            let bound = raw.bounds.get(name).copied().ok_or_else(|| {
                ConfigError::Parse(format!("profile '{}': missing bound '{}'", raw.name, name))
            })?;
            bounds.push(bound);
        }
        if let Some(extra) = raw.bounds.keys().find(|k| !TIME_DOMAIN_NAMES.contains(&k.as_str())) {
            return Err(ConfigError::Parse(format!(
                "profile '{}': unknown bound '{}'",
                raw.name, extra
            )));
        }

        let mut prototypes = BTreeMap::new();
        for (key, values) in raw.prototypes {
            let state: PlantState = key
                .parse()
                .map_err(|err: phyto_shared::ParseStateError| ConfigError::Parse(err.to_string()))?;
            if !state.is_known() {
                return Err(ConfigError::Parse(format!(
                    "profile '{}': no prototype may be given for 'unknown'",
                    raw.name
                )));
            }
            prototypes.insert(state, values);
        }

        Ok(Self {
            name: raw.name.trim().to_string(),
            quantization: raw.quantization,
            bounds,
            prototypes,
            temperature: raw.temperature,
            rules: raw.rules,
            quality: raw.quality,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LICHEN_TOML: &str = include_str!("../../config/profiles/lichen.toml");

    #[test]
    fn value_range_normalizes_and_clamps() {
        let range = ValueRange::new(-10.0, 10.0);
        assert_eq!(range.normalize(0.0), 0.5);
        assert_eq!(range.normalize(-50.0), 0.0);
        assert_eq!(range.normalize(50.0), 1.0);
        assert_eq!(range.denormalize(0.25), -5.0);
        assert_eq!(ValueRange::new(1.0, 1.0).normalize(3.0), 0.0);
    }

    #[test]
    fn hdc_feature_indices_match_names() {
        let names: Vec<&str> = HdcFeature::ALL.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["mean", "std", "range", "slope", "energy"]);
    }

    #[test]
    fn profile_parses_from_toml() {
        let profile = OrganismProfile::from_toml_str(LICHEN_TOML).unwrap();
        assert_eq!(profile.name, "lichen");
        assert_eq!(profile.bounds.len(), TIME_DOMAIN_FEATURES);
        assert_eq!(profile.prototypes.len(), PlantState::COUNT);
        assert_eq!(profile.quantization.std, ValueRange::new(0.0, 4.0));
    }

    #[test]
    fn profile_rejects_missing_bound() {
        let broken = LICHEN_TOML.replace("kurtosis = [-3.0, 12.0]", "");
        let err = OrganismProfile::from_toml_str(&broken).unwrap_err();
        assert!(err.to_string().contains("kurtosis"));
    }

    #[test]
    fn profile_rejects_short_prototype() {
        let mut profile = builtin::plant();
        profile.prototypes.insert(PlantState::Calm, vec![0.5; 4]);
        assert!(profile.validate().is_err());
    }

    #[test]
    fn builtin_profiles_validate() {
        for profile in [builtin::plant(), builtin::fungus()] {
            profile.validate().unwrap();
        }
    }

    #[test]
    fn value_range_reads_array_syntax() {
        #[derive(Deserialize)]
        struct Wrapper {
            span: ValueRange,
        }
        let parsed: Wrapper = toml::from_str("span = [1.5, 4.0]").unwrap();
        assert_eq!(parsed.span, ValueRange::new(1.5, 4.0));
    }
}
