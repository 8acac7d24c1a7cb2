//! Feature record extraction.
//!
//! Turns one window of deviation values into the fixed 27-field
//! [`FeatureRecord`]: 19 time-domain and shape statistics followed by eight
//! band-limited cepstral coefficients. Extraction is deterministic; the same
//! sequence always yields the same record.

use phyto_shared::RawSample;
use serde::{Deserialize, Serialize};

use super::spectral::{analyze, MelFilterbank, WindowFunction, CEPSTRAL_COEFFS, DEFAULT_FILTERS};
use crate::error::{EngineError, EngineResult};

/// Number of time-domain/shape fields (everything except the cepstrum).
pub const TIME_DOMAIN_FEATURES: usize = 19;

/// Total scalar fields in a feature record.
pub const TOTAL_FEATURES: usize = TIME_DOMAIN_FEATURES + CEPSTRAL_COEFFS;

/// Names of the time-domain fields, in [`FeatureRecord::time_domain`] order.
pub const TIME_DOMAIN_NAMES: [&str; TIME_DOMAIN_FEATURES] = [
    "mean",
    "std",
    "min",
    "max",
    "range",
    "slope",
    "energy",
    "rms",
    "max_diff",
    "zero_crossing_rate",
    "hjorth_mobility",
    "hjorth_complexity",
    "skewness",
    "kurtosis",
    "spectral_entropy",
    "local_maxima",
    "autocorr_lag1",
    "p25",
    "p75",
];

/// Statistics derived from one window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub mean: f32,
    pub std: f32,
    pub min: f32,
    pub max: f32,
    pub range: f32,
    /// Mean of the last third minus mean of the first third.
    pub slope: f32,
    /// Sum of squared deviations.
    pub energy: f32,
    pub rms: f32,
    /// Largest first difference, in mV/s.
    pub max_diff: f32,
    pub zero_crossing_rate: f32,
    pub hjorth_mobility: f32,
    pub hjorth_complexity: f32,
    pub skewness: f32,
    /// Excess kurtosis.
    pub kurtosis: f32,
    pub spectral_entropy: f32,
    pub local_maxima: f32,
    pub autocorr_lag1: f32,
    pub p25: f32,
    pub p75: f32,
    pub cepstral: [f32; CEPSTRAL_COEFFS],
}

impl FeatureRecord {
    /// The 19 time-domain fields in canonical order.
    pub fn time_domain(&self) -> [f32; TIME_DOMAIN_FEATURES] {
        [
            self.mean,
            self.std,
            self.min,
            self.max,
            self.range,
            self.slope,
            self.energy,
            self.rms,
            self.max_diff,
            self.zero_crossing_rate,
            self.hjorth_mobility,
            self.hjorth_complexity,
            self.skewness,
            self.kurtosis,
            self.spectral_entropy,
            self.local_maxima,
            self.autocorr_lag1,
            self.p25,
            self.p75,
        ]
    }

    /// All 27 fields, time-domain first.
    pub fn to_vec(&self) -> Vec<f32> {
        let mut out = self.time_domain().to_vec();
        out.extend_from_slice(&self.cepstral);
        out
    }
}

/// Stateless extractor parameterised by sample rate and spectral setup.
#[derive(Debug, Clone)]
pub struct FeatureExtractor {
    sample_rate_hz: f32,
    window: WindowFunction,
    filterbank: MelFilterbank,
}

impl FeatureExtractor {
    pub fn new(sample_rate_hz: f32) -> Self {
        Self::with_filterbank(sample_rate_hz, DEFAULT_FILTERS, WindowFunction::Hamming)
    }

    pub fn with_filterbank(sample_rate_hz: f32, filters: usize, window: WindowFunction) -> Self {
        Self {
            sample_rate_hz,
            window,
            filterbank: MelFilterbank::new(filters, sample_rate_hz),
        }
    }

    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate_hz
    }

    /// Extract from samples given oldest-first.
    pub fn extract(&self, samples: &[RawSample]) -> EngineResult<FeatureRecord> {
        let values: Vec<f32> = samples.iter().map(|s| s.deviation).collect();
        self.extract_values(&values)
    }

    /// Extract from chronological deviation values.
    pub fn extract_values(&self, values: &[f32]) -> EngineResult<FeatureRecord> {
        if values.is_empty() {
            return Err(EngineError::InsufficientSamples {
                required: 1,
                got: 0,
            });
        }

        let n = values.len() as f32;
        let (min, max, sum) = values.iter().fold(
            (f32::INFINITY, f32::NEG_INFINITY, 0.0f32),
            |(lo, hi, acc), &x| (lo.min(x), hi.max(x), acc + x),
        );
        let mean = sum / n;
        let variance = population_variance(values, mean);
        let std = variance.sqrt();
        let energy: f32 = values.iter().map(|x| x * x).sum();

        let diffs = differences(values);
        let max_diff = diffs.iter().fold(0.0f32, |acc, d| acc.max(d.abs())) * self.sample_rate_hz;
        let (mobility, complexity) = hjorth(values, variance, &diffs);
        let (skewness, kurtosis) = standardized_moments(values, mean, std);
        let spectral = analyze(values, &self.filterbank, self.window);

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        Ok(FeatureRecord {
            mean,
            std,
            min,
            max,
            range: max - min,
            slope: thirds_slope(values),
            energy,
            rms: (energy / n).sqrt(),
            max_diff,
            zero_crossing_rate: zero_crossing_rate(values, mean),
            hjorth_mobility: mobility,
            hjorth_complexity: complexity,
            skewness,
            kurtosis,
            spectral_entropy: spectral.entropy,
            local_maxima: local_maxima(values) as f32,
            autocorr_lag1: autocorr_lag1(values, mean),
            p25: nearest_rank(&sorted, 0.25),
            p75: nearest_rank(&sorted, 0.75),
            cepstral: spectral.cepstral,
        })
    }
}

fn population_variance(values: &[f32], mean: f32) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().map(|x| (x - mean).powi(2)).sum::<f32>() / values.len() as f32
}

fn mean_of(values: &[f32]) -> f32 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f32>() / values.len() as f32
    }
}

fn differences(values: &[f32]) -> Vec<f32> {
    values.windows(2).map(|pair| pair[1] - pair[0]).collect()
}

fn thirds_slope(values: &[f32]) -> f32 {
    let third = values.len() / 3;
    if third == 0 {
        return 0.0;
    }
    mean_of(&values[values.len() - third..]) - mean_of(&values[..third])
}

fn zero_crossing_rate(values: &[f32], mean: f32) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let crossings = values
        .windows(2)
        .filter(|pair| {
            let a = pair[0] - mean;
            let b = pair[1] - mean;
            (a < 0.0 && b >= 0.0) || (a >= 0.0 && b < 0.0)
        })
        .count();
    crossings as f32 / (values.len() - 1) as f32
}

/// Hjorth mobility and complexity from the 0th/1st/2nd difference variances.
fn hjorth(values: &[f32], variance: f32, diffs: &[f32]) -> (f32, f32) {
    if variance <= f32::EPSILON || diffs.is_empty() {
        return (0.0, 0.0);
    }

    let d1_var = population_variance(diffs, mean_of(diffs));
    let mobility = (d1_var / variance).sqrt();
    if d1_var <= f32::EPSILON || values.len() < 3 {
        return (mobility, 0.0);
    }

    let d2 = differences(diffs);
    let d2_var = population_variance(&d2, mean_of(&d2));
    let d1_mobility = (d2_var / d1_var).sqrt();
    let complexity = if mobility > 0.0 {
        d1_mobility / mobility
    } else {
        0.0
    };
    (mobility, complexity)
}

fn standardized_moments(values: &[f32], mean: f32, std: f32) -> (f32, f32) {
    if std <= f32::EPSILON {
        return (0.0, 0.0);
    }
    let n = values.len() as f32;
    let (m3, m4) = values.iter().fold((0.0f32, 0.0f32), |(m3, m4), &x| {
        let z = (x - mean) / std;
        (m3 + z.powi(3), m4 + z.powi(4))
    });
    (m3 / n, m4 / n - 3.0)
}

fn local_maxima(values: &[f32]) -> usize {
    values
        .windows(3)
        .filter(|w| w[0] < w[1] && w[1] > w[2])
        .count()
}

fn autocorr_lag1(values: &[f32], mean: f32) -> f32 {
    let denom: f32 = values.iter().map(|x| (x - mean).powi(2)).sum();
    if denom <= f32::EPSILON {
        return 0.0;
    }
    let numer: f32 = values
        .windows(2)
        .map(|pair| (pair[0] - mean) * (pair[1] - mean))
        .sum();
    numer / denom
}

/// Nearest-rank percentile of an ascending slice: `sorted[ceil(p*n) - 1]`.
pub fn nearest_rank(sorted: &[f32], percentile: f32) -> f32 {
    if sorted.is_empty() {
        return 0.0;
    }
    let rank = (percentile as f64 * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> FeatureExtractor {
        FeatureExtractor::new(20.0)
    }

    #[test]
    fn constant_window_has_no_spread() {
        let record = extractor().extract_values(&[3.5; 30]).unwrap();
        assert_eq!(record.std, 0.0);
        assert_eq!(record.range, 0.0);
        assert_eq!(record.max_diff, 0.0);
        assert_eq!(record.local_maxima, 0.0);
        assert_eq!(record.kurtosis, 0.0);
        assert!((record.mean - 3.5).abs() < 1e-6);
    }

    #[test]
    fn increasing_window_has_positive_slope() {
        let short: Vec<f32> = (0..30).map(|i| i as f32 * 0.5).collect();
        let long: Vec<f32> = (0..30).map(|i| i as f32 * 2.0).collect();
        let a = extractor().extract_values(&short).unwrap();
        let b = extractor().extract_values(&long).unwrap();
        assert!(a.slope > 0.0);
        assert!(b.slope > a.slope);
        assert!(b.range > a.range);
        assert!((a.range - 14.5).abs() < 1e-4);
    }

    #[test]
    fn spike_in_flat_background() {
        let mut values = vec![0.0f32; 20];
        values[9] = 50.0;
        let record = extractor().extract_values(&values).unwrap();
        assert!((record.max_diff - 1000.0).abs() < 1e-3);
        assert!(record.local_maxima >= 1.0);
        assert!(record.kurtosis > 10.0);
        assert!(record.skewness > 0.0);
    }

    #[test]
    fn always_eight_cepstral_coefficients() {
        for len in [1usize, 5, 8, 13, 50] {
            let values: Vec<f32> = (0..len).map(|i| (i as f32 * 0.7).sin()).collect();
            let record = extractor().extract_values(&values).unwrap();
            assert_eq!(record.cepstral.len(), CEPSTRAL_COEFFS);
            assert_eq!(record.to_vec().len(), TOTAL_FEATURES);
        }
    }

    #[test]
    fn nearest_rank_percentiles() {
        let sorted: Vec<f32> = (1..=8).map(|v| v as f32).collect();
        assert_eq!(nearest_rank(&sorted, 0.25), 2.0);
        assert_eq!(nearest_rank(&sorted, 0.75), 6.0);
        assert_eq!(nearest_rank(&[4.0], 0.25), 4.0);
    }

    #[test]
    fn energy_and_rms_agree() {
        let record = extractor().extract_values(&[3.0, -4.0, 3.0, -4.0]).unwrap();
        assert!((record.energy - 50.0).abs() < 1e-5);
        assert!((record.rms - 12.5f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn alternating_signal_crosses_every_step() {
        let values: Vec<f32> = (0..20).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let record = extractor().extract_values(&values).unwrap();
        assert!((record.zero_crossing_rate - 1.0).abs() < 1e-6);
        assert!(record.autocorr_lag1 < -0.9);
        assert!(record.hjorth_mobility > 1.0);
    }

    #[test]
    fn smooth_signal_is_autocorrelated() {
        let values: Vec<f32> = (0..50).map(|i| (i as f32 * 0.1).sin()).collect();
        let record = extractor().extract_values(&values).unwrap();
        assert!(record.autocorr_lag1 > 0.8);
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            extractor().extract_values(&[]),
            Err(EngineError::InsufficientSamples { .. })
        ));
    }

    #[test]
    fn raw_samples_use_deviation_channel() {
        let samples: Vec<RawSample> = (0..12)
            .map(|i| RawSample::new(i as f64 * 0.05, 512, 2500.0, i as f32))
            .collect();
        let record = extractor().extract(&samples).unwrap();
        assert!((record.min - 0.0).abs() < 1e-6);
        assert!((record.max - 11.0).abs() < 1e-6);
    }
}
