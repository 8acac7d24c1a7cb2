//! Signal quality gate and window-level outlier clamp.
//!
//! Quality failures are not errors. A degraded verdict only disables online
//! learning for the tick; classification and emission continue.

use serde::{Deserialize, Serialize};

use super::features::{nearest_rank, FeatureRecord};
use crate::profile::QualityThresholds;

/// Why a reading is or is not usable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityReason {
    Good,
    FlatLine,
    Saturated,
    Artifact,
    Noisy,
}

impl QualityReason {
    /// Score attached to each verdict. Degraded verdicts stay below 0.5.
    pub fn score(self) -> f32 {
        match self {
            QualityReason::Good => 1.0,
            QualityReason::FlatLine => 0.0,
            QualityReason::Saturated => 0.1,
            QualityReason::Artifact => 0.25,
            QualityReason::Noisy => 0.4,
        }
    }
}

/// Verdict of the quality gate for one feature record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalQuality {
    pub is_usable: bool,
    pub score: f32,
    pub reason: QualityReason,
}

impl SignalQuality {
    fn from_reason(reason: QualityReason) -> Self {
        Self {
            is_usable: reason == QualityReason::Good,
            score: reason.score(),
            reason,
        }
    }
}

/// Classify a feature record, checking conditions in priority order.
pub fn assess_quality(features: &FeatureRecord, thresholds: &QualityThresholds) -> SignalQuality {
    let reason = if features.std < thresholds.flat_std_floor {
        QualityReason::FlatLine
    } else if features.range > thresholds.saturated_range_ceiling {
        QualityReason::Saturated
    } else if features.kurtosis > thresholds.artifact_kurtosis_ceiling {
        QualityReason::Artifact
    } else if features.autocorr_lag1 < thresholds.noisy_autocorr_floor {
        QualityReason::Noisy
    } else {
        QualityReason::Good
    };

    SignalQuality::from_reason(reason)
}

/// Clamp values outside the Tukey fences `[Q1 - 1.5·IQR, Q3 + 1.5·IQR]`.
///
/// Values are clamped to the nearer fence, never dropped, so the output has
/// the input's length and order. A zero IQR leaves the window untouched.
pub fn clamp_outliers(values: &[f32]) -> Vec<f32> {
    if values.len() < 4 {
        return values.to_vec();
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let q1 = nearest_rank(&sorted, 0.25);
    let q3 = nearest_rank(&sorted, 0.75);
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return values.to_vec();
    }

    let lower = q1 - 1.5 * iqr;
    let upper = q3 + 1.5 * iqr;
    values.iter().map(|v| v.clamp(lower, upper)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::features::FeatureExtractor;

    fn thresholds() -> QualityThresholds {
        QualityThresholds {
            flat_std_floor: 0.05,
            saturated_range_ceiling: 400.0,
            artifact_kurtosis_ceiling: 10.0,
            noisy_autocorr_floor: 0.1,
        }
    }

    fn record(values: &[f32]) -> FeatureRecord {
        FeatureExtractor::new(20.0).extract_values(values).unwrap()
    }

    #[test]
    fn flat_window_is_not_usable() {
        let quality = assess_quality(&record(&[0.0; 20]), &thresholds());
        assert_eq!(quality.reason, QualityReason::FlatLine);
        assert!(!quality.is_usable);
        assert!(quality.score < 0.5);
    }

    #[test]
    fn wide_window_is_saturated() {
        let values: Vec<f32> = (0..20).map(|i| if i < 10 { 0.0 } else { 900.0 }).collect();
        let quality = assess_quality(&record(&values), &thresholds());
        assert_eq!(quality.reason, QualityReason::Saturated);
    }

    #[test]
    fn single_spike_is_an_artifact() {
        let mut values = vec![0.0f32; 20];
        values[9] = 50.0;
        let quality = assess_quality(&record(&values), &thresholds());
        assert_eq!(quality.reason, QualityReason::Artifact);
    }

    #[test]
    fn alternating_window_is_noisy() {
        let values: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 2.0 } else { -2.0 }).collect();
        let quality = assess_quality(&record(&values), &thresholds());
        assert_eq!(quality.reason, QualityReason::Noisy);
    }

    #[test]
    fn smooth_wave_is_good() {
        let values: Vec<f32> = (0..50).map(|i| 5.0 * (i as f32 * 0.15).sin()).collect();
        let quality = assess_quality(&record(&values), &thresholds());
        assert_eq!(quality.reason, QualityReason::Good);
        assert!(quality.is_usable);
        assert_eq!(quality.score, 1.0);
    }

    #[test]
    fn clamp_preserves_length_and_limits_outliers() {
        let mut values: Vec<f32> = (0..20).map(|i| i as f32).collect();
        values[7] = 1000.0;
        let clamped = clamp_outliers(&values);
        assert_eq!(clamped.len(), values.len());
        assert!(clamped[7] < 1000.0);
        assert_eq!(clamped[3], 3.0);
    }

    #[test]
    fn clamp_skips_degenerate_spread() {
        let mut values = vec![0.0f32; 20];
        values[9] = 50.0;
        assert_eq!(clamp_outliers(&values), values);
    }
}
