//! Band-limited spectral analysis for short bioelectric windows.
//!
//! Windows are far too short for a useful FFT at 20 Hz, so power is estimated
//! at a handful of chosen frequencies with the Goertzel recurrence. A
//! mel-spaced triangular filterbank built from those estimates yields the
//! spectral entropy and the cepstral coefficients of the feature record.

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// Number of cepstral coefficients reported per window.
pub const CEPSTRAL_COEFFS: usize = 8;

/// Default number of triangular filters.
pub const DEFAULT_FILTERS: usize = 12;

/// Minimum window length for spectral features.
pub const MIN_SPECTRAL_SAMPLES: usize = 8;

const LOG_FLOOR: f32 = 1e-10;

/// Window function applied before spectral estimation.
///
/// Windowing reduces spectral leakage by smoothly tapering the signal at edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFunction {
    /// No windowing (rectangular)
    None,
    /// Hann window: 0.5 - 0.5*cos(2π*n/N)
    Hann,
    /// Hamming window: 0.54 - 0.46*cos(2π*n/N)
    Hamming,
}

impl WindowFunction {
    /// Generate window coefficients for a given length.
    pub fn generate(&self, n: usize) -> Vec<f32> {
        match self {
            WindowFunction::None => vec![1.0; n],
            WindowFunction::Hann => (0..n)
                .map(|i| 0.5 - 0.5 * (2.0 * PI * i as f32 / n as f32).cos())
                .collect(),
            WindowFunction::Hamming => (0..n)
                .map(|i| 0.54 - 0.46 * (2.0 * PI * i as f32 / n as f32).cos())
                .collect(),
        }
    }

    /// Multiply `signal` by the window coefficients.
    pub fn apply(&self, signal: &[f32]) -> Vec<f32> {
        signal
            .iter()
            .zip(self.generate(signal.len()))
            .map(|(x, w)| x * w)
            .collect()
    }
}

/// Power of `signal` at a single frequency via the Goertzel recurrence.
pub fn goertzel_power(signal: &[f32], frequency_hz: f32, sample_rate_hz: f32) -> f32 {
    if signal.is_empty() || sample_rate_hz <= 0.0 {
        return 0.0;
    }

    let omega = 2.0 * PI * frequency_hz / sample_rate_hz;
    let coeff = 2.0 * omega.cos();
    let mut s1 = 0.0f32;
    let mut s2 = 0.0f32;
    for &x in signal {
        let s0 = x + coeff * s1 - s2;
        s2 = s1;
        s1 = s0;
    }

    (s1 * s1 + s2 * s2 - coeff * s1 * s2).max(0.0)
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

/// Triangular filters with mel-spaced edges between 0 Hz and Nyquist.
#[derive(Debug, Clone, PartialEq)]
pub struct MelFilterbank {
    sample_rate_hz: f32,
    /// `filters + 2` edge frequencies in Hz, ascending.
    edges: Vec<f32>,
}

impl MelFilterbank {
    pub fn new(filters: usize, sample_rate_hz: f32) -> Self {
        let filters = filters.max(1);
        let nyquist = sample_rate_hz.max(0.0) / 2.0;
        let mel_max = hz_to_mel(nyquist);
        let edges = (0..filters + 2)
            .map(|i| mel_to_hz(mel_max * i as f32 / (filters + 1) as f32))
            .collect();

        Self {
            sample_rate_hz,
            edges,
        }
    }

    pub fn filters(&self) -> usize {
        self.edges.len() - 2
    }

    pub fn edges(&self) -> &[f32] {
        &self.edges
    }

    /// Triangle-weighted energy per filter.
    ///
    /// Each triangle is sampled at the midpoint of its rising edge, its centre
    /// and the midpoint of its falling edge, with triangular weights 0.5, 1, 0.5.
    pub fn energies(&self, signal: &[f32]) -> Vec<f32> {
        self.edges
            .windows(3)
            .map(|edge| {
                let (lo, centre, hi) = (edge[0], edge[1], edge[2]);
                let rising = goertzel_power(signal, 0.5 * (lo + centre), self.sample_rate_hz);
                let peak = goertzel_power(signal, centre, self.sample_rate_hz);
                let falling = goertzel_power(signal, 0.5 * (centre + hi), self.sample_rate_hz);
                0.5 * rising + peak + 0.5 * falling
            })
            .collect()
    }
}

/// Normalized Shannon entropy of a non-negative spectrum.
///
/// Returns a value in [0, 1]; 0 for an empty or all-zero spectrum.
pub fn compute_spectral_entropy(psd: &[f32]) -> f32 {
    if psd.is_empty() {
        return 0.0;
    }

    let total: f32 = psd.iter().sum();
    if total < 1e-10 {
        return 0.0;
    }

    let entropy: f32 = psd
        .iter()
        .map(|&p| p / total)
        .filter(|&p| p > 1e-10)
        .map(|p| -p * p.ln())
        .sum();

    let max_entropy = (psd.len() as f32).ln();
    if max_entropy > 0.0 {
        (entropy / max_entropy).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Type-II cosine transform of `input`, returning coefficients `1..=CEPSTRAL_COEFFS`.
///
/// The 0th (energy) coefficient is skipped. Coefficients past the input
/// length are zero.
pub fn dct_ii_cepstrum(input: &[f32]) -> [f32; CEPSTRAL_COEFFS] {
    let mut out = [0.0f32; CEPSTRAL_COEFFS];
    let m = input.len();
    if m == 0 {
        return out;
    }

    for (slot, k) in out.iter_mut().zip(1..) {
        if k >= m {
            break;
        }
        *slot = input
            .iter()
            .enumerate()
            .map(|(i, &x)| x * (PI * k as f32 * (i as f32 + 0.5) / m as f32).cos())
            .sum();
    }
    out
}

/// Spectral fields of one feature record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectralSummary {
    pub entropy: f32,
    pub cepstral: [f32; CEPSTRAL_COEFFS],
}

impl SpectralSummary {
    fn empty() -> Self {
        Self {
            entropy: 0.0,
            cepstral: [0.0; CEPSTRAL_COEFFS],
        }
    }
}

/// Window, filter, log-compress and transform one window of values.
pub fn analyze(signal: &[f32], filterbank: &MelFilterbank, window: WindowFunction) -> SpectralSummary {
    if signal.len() < MIN_SPECTRAL_SAMPLES {
        return SpectralSummary::empty();
    }

    let windowed = window.apply(signal);
    let energies = filterbank.energies(&windowed);
    let log_energies: Vec<f32> = energies.iter().map(|&e| (e + LOG_FLOOR).ln()).collect();

    SpectralSummary {
        entropy: compute_spectral_entropy(&energies),
        cepstral: dct_ii_cepstrum(&log_energies),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, rate: f32, n: usize) -> Vec<f32> {
        (0..n)
            .map(|i| (2.0 * PI * freq * i as f32 / rate).sin())
            .collect()
    }

    #[test]
    fn test_window_function_hamming_endpoints() {
        let window = WindowFunction::Hamming.generate(8);
        assert!((window[0] - 0.08).abs() < 1e-6);
        assert!(window[4] > 0.99);
    }

    #[test]
    fn test_goertzel_peaks_at_signal_frequency() {
        let signal = sine(4.0, 20.0, 50);
        let on = goertzel_power(&signal, 4.0, 20.0);
        let off = goertzel_power(&signal, 8.0, 20.0);
        assert!(on > 10.0 * off);
    }

    #[test]
    fn test_goertzel_empty_signal() {
        assert_eq!(goertzel_power(&[], 2.0, 20.0), 0.0);
    }

    #[test]
    fn test_filterbank_edges_span_nyquist() {
        let bank = MelFilterbank::new(DEFAULT_FILTERS, 20.0);
        assert_eq!(bank.filters(), 12);
        assert_eq!(bank.edges().len(), 14);
        assert!(bank.edges()[0].abs() < 1e-6);
        assert!((bank.edges()[13] - 10.0).abs() < 1e-3);
        assert!(bank.edges().windows(2).all(|pair| pair[1] > pair[0]));
    }

    #[test]
    fn test_spectral_entropy_uniform() {
        let entropy = compute_spectral_entropy(&[1.0, 1.0, 1.0, 1.0]);
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_spectral_entropy_peaked() {
        let entropy = compute_spectral_entropy(&[0.0, 0.0, 1.0, 0.0, 0.0]);
        assert!(entropy < 0.1);
    }

    #[test]
    fn test_dct_of_constant_has_no_ac_terms() {
        let coeffs = dct_ii_cepstrum(&[2.0; 12]);
        assert!(coeffs.iter().all(|c| c.abs() < 1e-4));
    }

    #[test]
    fn test_short_signal_yields_zero_summary() {
        let bank = MelFilterbank::new(DEFAULT_FILTERS, 20.0);
        let summary = analyze(&[1.0, 2.0, 3.0], &bank, WindowFunction::Hamming);
        assert_eq!(summary.entropy, 0.0);
        assert_eq!(summary.cepstral, [0.0; CEPSTRAL_COEFFS]);
    }

    #[test]
    fn test_analyze_produces_finite_summary() {
        let bank = MelFilterbank::new(DEFAULT_FILTERS, 20.0);
        let summary = analyze(&sine(2.5, 20.0, 50), &bank, WindowFunction::Hamming);
        assert!(summary.entropy >= 0.0 && summary.entropy <= 1.0);
        assert!(summary.cepstral.iter().all(|c| c.is_finite()));
    }
}
