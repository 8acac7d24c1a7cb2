//! Feature quantization and role/level binding.

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::hypervector::Hypervector;
use crate::profile::{HdcFeature, QuantizationRanges, ValueRange};
use crate::signal::FeatureRecord;

/// Number of quantization levels per feature.
pub const LEVELS: usize = 16;

/// Map `value` onto one of [`LEVELS`] levels inside `range`.
///
/// Out-of-range values clamp into `0..=15`; a degenerate range maps to 0.
pub fn quantize(value: f32, range: &ValueRange) -> usize {
    if !range.is_valid() {
        return 0;
    }
    let unit = range.normalize(value);
    ((unit * LEVELS as f32) as usize).min(LEVELS - 1)
}

/// Seeded codebook of role and level vectors.
///
/// Encoding binds each feature's role vector with the level vector its
/// value quantizes to, then XORs the five bindings together.
#[derive(Debug, Clone)]
pub struct SignalEncoder {
    roles: Vec<Hypervector>,
    levels: Vec<Hypervector>,
}

impl SignalEncoder {
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let roles = HdcFeature::ALL
            .iter()
            .map(|_| Hypervector::random(&mut rng))
            .collect();
        let levels = (0..LEVELS).map(|_| Hypervector::random(&mut rng)).collect();
        Self { roles, levels }
    }

    pub fn role(&self, feature: HdcFeature) -> &Hypervector {
        &self.roles[feature_slot(feature)]
    }

    pub fn level(&self, level: usize) -> &Hypervector {
        &self.levels[level.min(LEVELS - 1)]
    }

    /// Encode a feature record without temporal context.
    pub fn encode(&self, features: &FeatureRecord, ranges: &QuantizationRanges) -> Hypervector {
        let values = HdcFeature::ALL.map(|feature| feature.value(features));
        self.encode_values(&values, ranges)
    }

    /// Encode raw values given in [`HdcFeature::ALL`] order.
    pub fn encode_values(&self, values: &[f32; 5], ranges: &QuantizationRanges) -> Hypervector {
        let mut out = Hypervector::zero();
        for (feature, value) in HdcFeature::ALL.iter().zip(values) {
            let level = quantize(*value, ranges.get(*feature));
            out.bind_assign(&self.role(*feature).bind(self.level(level)));
        }
        out
    }
}

fn feature_slot(feature: HdcFeature) -> usize {
    match feature {
        HdcFeature::Mean => 0,
        HdcFeature::Std => 1,
        HdcFeature::Range => 2,
        HdcFeature::Slope => 3,
        HdcFeature::Energy => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::builtin;

    #[test]
    fn quantize_clamps_to_level_bounds() {
        let range = ValueRange::new(0.0, 16.0);
        assert_eq!(quantize(-100.0, &range), 0);
        assert_eq!(quantize(100.0, &range), 15);
        assert_eq!(quantize(16.0, &range), 15);
        assert_eq!(quantize(8.5, &range), 8);
        assert_eq!(quantize(f32::NAN, &range), 0);
    }

    #[test]
    fn degenerate_range_maps_to_zero() {
        assert_eq!(quantize(5.0, &ValueRange::new(2.0, 2.0)), 0);
        assert_eq!(quantize(5.0, &ValueRange::new(3.0, 1.0)), 0);
    }

    #[test]
    fn encoder_is_deterministic_per_seed() {
        let ranges = builtin::plant().quantization;
        let values = [1.0, 2.0, 10.0, 0.5, 300.0];
        let a = SignalEncoder::new(42).encode_values(&values, &ranges);
        let b = SignalEncoder::new(42).encode_values(&values, &ranges);
        let c = SignalEncoder::new(7).encode_values(&values, &ranges);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn different_levels_give_different_vectors() {
        let ranges = builtin::plant().quantization;
        let encoder = SignalEncoder::new(42);
        let quiet = encoder.encode_values(&[0.0, 0.1, 0.5, 0.0, 10.0], &ranges);
        let loud = encoder.encode_values(&[20.0, 12.0, 50.0, 10.0, 40_000.0], &ranges);
        assert!(quiet.similarity(&loud) < 0.5);
    }
}
