//! Prototype distance classifier.
//!
//! Each known state owns a unit-length prototype over the 19 normalized
//! time-domain features. Classification is a temperature softmax over
//! negative Euclidean distances; learning pulls the labelled prototype
//! toward the observation with an adaptive rate.

use std::collections::BTreeMap;

use ndarray::{Array1, Array2, ArrayView1};
use phyto_shared::PlantState;

use super::{StateClassifier, Verdict};
use crate::config::PdcConfig;
use crate::error::{EngineError, EngineResult};
use crate::profile::OrganismProfile;
use crate::signal::{FeatureRecord, TIME_DOMAIN_FEATURES};

#[derive(Debug, Clone)]
pub struct PrototypeClassifier {
    prototypes: Array2<f32>, // [states, features]
    config: PdcConfig,
}

impl PrototypeClassifier {
    pub fn new(profile: &OrganismProfile, config: &PdcConfig) -> EngineResult<Self> {
        Ok(Self {
            prototypes: Self::load_prototypes(profile)?,
            config: config.clone(),
        })
    }

    /// Replace every prototype with the profile's, discarding learned drift.
    pub fn reset_prototypes(&mut self, profile: &OrganismProfile) -> EngineResult<()> {
        self.prototypes = Self::load_prototypes(profile)?;
        Ok(())
    }

    fn load_prototypes(profile: &OrganismProfile) -> EngineResult<Array2<f32>> {
        profile
            .validate()
            .map_err(|err| EngineError::invalid_profile(&profile.name, err.to_string()))?;

        let mut prototypes = Array2::zeros((PlantState::COUNT, TIME_DOMAIN_FEATURES));
        for (row, state) in PlantState::KNOWN.iter().enumerate() {
            let values = profile.prototypes.get(state).ok_or_else(|| {
                EngineError::invalid_profile(
                    &profile.name,
                    format!("missing prototype for '{}'", state),
                )
            })?;
            if values.len() != TIME_DOMAIN_FEATURES {
                return Err(EngineError::DimensionMismatch {
                    expected: TIME_DOMAIN_FEATURES,
                    got: values.len(),
                    context: format!("prototype '{}'", state),
                });
            }
            let vector = Array1::from_vec(values.clone());
            let norm = l2_norm(vector.view());
            if !(norm > 0.0) {
                return Err(EngineError::invalid_profile(
                    &profile.name,
                    format!("prototype '{}' has zero length", state),
                ));
            }
            prototypes.row_mut(row).assign(&(vector / norm));
        }
        Ok(prototypes)
    }

    /// Normalize the time-domain features into `[0, 1]` by the profile bounds.
    pub fn encode(features: &FeatureRecord, profile: &OrganismProfile) -> Array1<f32> {
        let raw = features.time_domain();
        Array1::from_shape_fn(TIME_DOMAIN_FEATURES, |i| {
            profile
                .bounds
                .get(i)
                .map_or(0.0, |bound| bound.normalize(raw[i]))
        })
    }

    /// Per-state probabilities in [`PlantState::KNOWN`] order.
    pub fn probabilities(&self, features: &FeatureRecord, profile: &OrganismProfile) -> Array1<f32> {
        let v = Self::encode(features, profile);
        let temperature = profile.temperature.max(f32::EPSILON);
        let logits = Array1::from_shape_fn(PlantState::COUNT, |row| {
            let diff = &v - &self.prototypes.row(row);
            -l2_norm(diff.view()) / temperature
        });
        softmax(&logits)
    }

    /// Move the prototype of `state` toward the observation.
    ///
    /// Returns the learning rate that was applied.
    pub fn learn(
        &mut self,
        features: &FeatureRecord,
        state: PlantState,
        profile: &OrganismProfile,
    ) -> EngineResult<f32> {
        let row = state.index().ok_or_else(|| EngineError::UnknownState {
            name: state.as_str().to_string(),
        })?;
        let v = Self::encode(features, profile);

        let mut prototype = self.prototypes.row_mut(row);
        let sim = cosine(v.view(), prototype.view());
        let alpha = (self.config.base_learning_rate * (1.0 - sim))
            .clamp(self.config.min_alpha, self.config.max_alpha);

        let updated = &v * alpha + &prototype * (1.0 - alpha);
        let norm = l2_norm(updated.view());
        if norm > 0.0 {
            prototype.assign(&(updated / norm));
        }
        Ok(alpha)
    }

    pub fn prototype(&self, state: PlantState) -> Option<ArrayView1<'_, f32>> {
        state.index().map(|row| self.prototypes.row(row))
    }
}

impl StateClassifier for PrototypeClassifier {
    fn name(&self) -> &'static str {
        "pdc"
    }

    fn classify(&self, features: &FeatureRecord, profile: &OrganismProfile) -> Verdict {
        let probs = self.probabilities(features, profile);
        let scores: BTreeMap<PlantState, f32> = PlantState::KNOWN
            .iter()
            .zip(probs.iter())
            .map(|(&state, &p)| (state, p))
            .collect();
        Verdict::from_scores(scores)
    }
}

/// Softmax with max subtraction for numerical stability
fn softmax(x: &Array1<f32>) -> Array1<f32> {
    let max = x.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Array1<f32> = x.mapv(|v| (v - max).exp());
    let sum: f32 = exp.sum();
    exp / sum
}

fn l2_norm(v: ArrayView1<'_, f32>) -> f32 {
    v.dot(&v).sqrt()
}

fn cosine(a: ArrayView1<'_, f32>, b: ArrayView1<'_, f32>) -> f32 {
    let denom = l2_norm(a) * l2_norm(b);
    if denom > 0.0 {
        a.dot(&b) / denom
    } else {
        0.0
    }
}
