//! Built-in organism profiles.
//!
//! Deviations are in millivolts at the default 20 Hz sample rate. Prototype
//! rows are written in normalized feature units (each element in `[0, 1]`,
//! in [`crate::signal::TIME_DOMAIN_NAMES`] order); the distance classifier
//! scales them to unit length when it loads them.

use std::collections::BTreeMap;

use phyto_shared::PlantState;

use super::{
    OrganismProfile, QualityThresholds, QuantizationRanges, RuleThresholds, ValueRange,
};
use crate::signal::TIME_DOMAIN_FEATURES;

/// Name of the profile selected when the configuration names none.
pub const DEFAULT_ORGANISM: &str = "plant";

type PrototypeRows = [[f32; TIME_DOMAIN_FEATURES]; PlantState::COUNT];

fn bounds(pairs: [[f32; 2]; TIME_DOMAIN_FEATURES]) -> Vec<ValueRange> {
    pairs.into_iter().map(ValueRange::from).collect()
}

fn prototypes(rows: PrototypeRows) -> BTreeMap<PlantState, Vec<f32>> {
    PlantState::KNOWN
        .into_iter()
        .zip(rows)
        .map(|(state, row)| (state, row.to_vec()))
        .collect()
}

// Shared prototype shapes. Column order: mean, std, min, max, range, slope,
// energy, rms, max_diff, zcr, mobility, complexity, skewness, kurtosis,
// entropy, local_maxima, autocorr, p25, p75.
const PLANT_PROTOTYPES: PrototypeRows = [
    // resting
    [0.50, 0.03, 0.67, 0.33, 0.02, 0.50, 0.00, 0.02, 0.01, 0.15, 0.05, 0.25, 0.50, 0.15, 0.35, 0.12, 0.98, 0.60, 0.40],
    // calm
    [0.50, 0.10, 0.60, 0.40, 0.08, 0.50, 0.02, 0.08, 0.05, 0.20, 0.10, 0.30, 0.50, 0.15, 0.45, 0.20, 0.92, 0.58, 0.42],
    // active
    [0.50, 0.30, 0.45, 0.55, 0.30, 0.50, 0.10, 0.30, 0.20, 0.30, 0.25, 0.35, 0.50, 0.20, 0.60, 0.30, 0.80, 0.50, 0.50],
    // transition
    [0.65, 0.35, 0.55, 0.65, 0.35, 0.90, 0.20, 0.40, 0.20, 0.10, 0.10, 0.30, 0.50, 0.15, 0.30, 0.15, 0.97, 0.62, 0.60],
    // stimulus
    [0.55, 0.40, 0.60, 0.70, 0.50, 0.55, 0.25, 0.45, 0.80, 0.20, 0.40, 0.50, 0.80, 0.60, 0.55, 0.20, 0.70, 0.55, 0.50],
    // stress
    [0.40, 0.70, 0.20, 0.80, 0.80, 0.50, 0.60, 0.70, 0.60, 0.35, 0.35, 0.45, 0.50, 0.30, 0.70, 0.35, 0.75, 0.35, 0.65],
];

const FUNGUS_PROTOTYPES: PrototypeRows = [
    // resting
    [0.50, 0.02, 0.65, 0.35, 0.02, 0.50, 0.00, 0.02, 0.01, 0.10, 0.04, 0.20, 0.50, 0.15, 0.30, 0.08, 0.99, 0.60, 0.40],
    // calm
    [0.50, 0.08, 0.60, 0.40, 0.06, 0.50, 0.01, 0.06, 0.03, 0.15, 0.08, 0.25, 0.50, 0.15, 0.40, 0.15, 0.95, 0.58, 0.42],
    // active
    [0.50, 0.25, 0.45, 0.55, 0.25, 0.50, 0.08, 0.25, 0.15, 0.25, 0.20, 0.35, 0.50, 0.20, 0.55, 0.25, 0.85, 0.50, 0.50],
    // transition
    [0.70, 0.30, 0.55, 0.70, 0.30, 0.95, 0.25, 0.45, 0.15, 0.08, 0.08, 0.30, 0.50, 0.15, 0.25, 0.10, 0.98, 0.65, 0.65],
    // stimulus
    [0.55, 0.35, 0.60, 0.70, 0.45, 0.55, 0.20, 0.40, 0.85, 0.15, 0.45, 0.55, 0.85, 0.70, 0.50, 0.15, 0.65, 0.55, 0.50],
    // stress
    [0.35, 0.65, 0.20, 0.80, 0.75, 0.45, 0.55, 0.65, 0.55, 0.30, 0.30, 0.40, 0.45, 0.30, 0.65, 0.30, 0.80, 0.35, 0.60],
];

/// Green plant electrodes: slow potentials of a few to tens of millivolts.
pub fn plant() -> OrganismProfile {
    OrganismProfile {
        name: "plant".to_string(),
        quantization: QuantizationRanges {
            mean: ValueRange::new(-30.0, 30.0),
            std: ValueRange::new(0.0, 15.0),
            range: ValueRange::new(0.0, 60.0),
            slope: ValueRange::new(-15.0, 15.0),
            energy: ValueRange::new(0.0, 45_000.0),
        },
        bounds: bounds([
            [-30.0, 30.0],
            [0.0, 15.0],
            [-60.0, 30.0],
            [-30.0, 60.0],
            [0.0, 60.0],
            [-15.0, 15.0],
            [0.0, 45_000.0],
            [0.0, 30.0],
            [0.0, 600.0],
            [0.0, 1.0],
            [0.0, 2.0],
            [0.0, 6.0],
            [-3.0, 3.0],
            [-3.0, 12.0],
            [0.0, 1.0],
            [0.0, 25.0],
            [-1.0, 1.0],
            [-40.0, 25.0],
            [-25.0, 40.0],
        ]),
        prototypes: prototypes(PLANT_PROTOTYPES),
        temperature: 0.1,
        rules: RuleThresholds {
            stimulus_max_diff: 300.0,
            stress_std: 8.0,
            transition_slope: 6.0,
            active_std: 3.0,
            resting_std: 0.5,
        },
        quality: QualityThresholds {
            flat_std_floor: 0.05,
            saturated_range_ceiling: 400.0,
            artifact_kurtosis_ceiling: 10.0,
            noisy_autocorr_floor: 0.1,
        },
    }
}

/// Mycelium electrodes: quieter, spikier trains than plant tissue.
pub fn fungus() -> OrganismProfile {
    OrganismProfile {
        name: "fungus".to_string(),
        quantization: QuantizationRanges {
            mean: ValueRange::new(-10.0, 10.0),
            std: ValueRange::new(0.0, 5.0),
            range: ValueRange::new(0.0, 20.0),
            slope: ValueRange::new(-5.0, 5.0),
            energy: ValueRange::new(0.0, 5_000.0),
        },
        bounds: bounds([
            [-10.0, 10.0],
            [0.0, 5.0],
            [-20.0, 10.0],
            [-10.0, 20.0],
            [0.0, 20.0],
            [-5.0, 5.0],
            [0.0, 5_000.0],
            [0.0, 10.0],
            [0.0, 200.0],
            [0.0, 1.0],
            [0.0, 2.0],
            [0.0, 6.0],
            [-3.0, 3.0],
            [-3.0, 15.0],
            [0.0, 1.0],
            [0.0, 25.0],
            [-1.0, 1.0],
            [-15.0, 8.0],
            [-8.0, 15.0],
        ]),
        prototypes: prototypes(FUNGUS_PROTOTYPES),
        temperature: 0.12,
        rules: RuleThresholds {
            stimulus_max_diff: 100.0,
            stress_std: 3.0,
            transition_slope: 2.0,
            active_std: 1.0,
            resting_std: 0.15,
        },
        quality: QualityThresholds {
            flat_std_floor: 0.02,
            saturated_range_ceiling: 150.0,
            artifact_kurtosis_ceiling: 12.0,
            noisy_autocorr_floor: 0.05,
        },
    }
}

/// Every built-in profile.
pub fn all() -> Vec<OrganismProfile> {
    vec![plant(), fungus()]
}
