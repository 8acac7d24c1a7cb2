//! Exemplar memory, novelty statistics and auto-calibration.

use std::collections::{BTreeMap, VecDeque};

use phyto_shared::PlantState;
use serde::Serialize;
use tracing::{debug, info};

use super::encoder::SignalEncoder;
use super::hypervector::Hypervector;
use crate::config::HdcConfig;
use crate::error::{EngineError, EngineResult};
use crate::learner::Verdict;
use crate::profile::{HdcFeature, OrganismProfile, QuantizationRanges};
use crate::signal::FeatureRecord;

/// Raw vectors kept for temporal binding.
const TEMPORAL_RING: usize = 3;

/// A stored, labelled hypervector.
#[derive(Debug, Clone)]
pub struct Exemplar {
    pub vector: Hypervector,
    pub state: PlantState,
    /// Value of the memory's learn clock when the exemplar was stored.
    pub timestamp: u64,
}

/// Exponential moving statistics of a state's best-match score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct StateStats {
    pub mean: f32,
    pub variance: f32,
    pub observations: u32,
}

impl StateStats {
    pub fn std(&self) -> f32 {
        self.variance.max(0.0).sqrt()
    }

    fn observe(&mut self, score: f32, decay: f32) {
        if self.observations == 0 {
            self.mean = score;
            self.variance = 0.0;
        } else {
            let diff = score - self.mean;
            self.mean += (1.0 - decay) * diff;
            self.variance = decay * (self.variance + (1.0 - decay) * diff * diff);
        }
        self.observations = self.observations.saturating_add(1);
    }
}

/// Novelty check against the winning state's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Novelty {
    pub is_novel: bool,
    pub score: f32,
    pub mean: f32,
    pub std: f32,
    pub observations: u32,
}

/// Result of one hyperdimensional classification.
#[derive(Debug, Clone)]
pub struct HdcClassification {
    pub verdict: Verdict,
    pub novelty: Novelty,
    /// Temporally bound vector of this tick, used for learning.
    pub encoded: Hypervector,
}

/// What happened to a vector offered to [`HdcMemory::learn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LearnOutcome {
    Stored { evicted: bool },
    /// Too similar to an exemplar already held for the state.
    Redundant,
    /// Unknown is never stored.
    Ignored,
}

impl LearnOutcome {
    pub fn is_stored(self) -> bool {
        matches!(self, LearnOutcome::Stored { .. })
    }
}

/// Snapshot of the memory's learning progress.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LearningStats {
    pub calibration_complete: bool,
    pub calibration_ticks: u32,
    pub calibration_target: u32,
    pub exemplar_counts: BTreeMap<PlantState, usize>,
    pub total_learned: u64,
    pub rejected: u64,
}

/// Hyperdimensional classifier state.
#[derive(Debug, Clone)]
pub struct HdcMemory {
    config: HdcConfig,
    encoder: SignalEncoder,
    seeds: BTreeMap<PlantState, Hypervector>,
    exemplars: BTreeMap<PlantState, VecDeque<Exemplar>>,
    stats: BTreeMap<PlantState, StateStats>,
    history: VecDeque<Hypervector>,
    calibration_ticks: u32,
    calibration_complete: bool,
    clock: u64,
    total_learned: u64,
    rejected: u64,
}

impl HdcMemory {
    pub fn new(profile: &OrganismProfile, config: &HdcConfig, seed: u64) -> EngineResult<Self> {
        let mut memory = Self {
            config: config.clone(),
            encoder: SignalEncoder::new(seed),
            seeds: BTreeMap::new(),
            exemplars: PlantState::KNOWN
                .iter()
                .map(|&s| (s, VecDeque::with_capacity(config.max_exemplars_per_state + 1)))
                .collect(),
            stats: PlantState::KNOWN
                .iter()
                .map(|&s| (s, StateStats::default()))
                .collect(),
            history: VecDeque::with_capacity(TEMPORAL_RING),
            calibration_ticks: 0,
            calibration_complete: config.calibration_ticks == 0,
            clock: 0,
            total_learned: 0,
            rejected: 0,
        };
        memory.rederive_seeds(profile)?;
        Ok(memory)
    }

    /// Rebuild the seed prototypes from the profile's distance prototypes.
    ///
    /// Each prototype is mapped back to feature units through the profile
    /// bounds and encoded without temporal context.
    pub fn rederive_seeds(&mut self, profile: &OrganismProfile) -> EngineResult<()> {
        profile
            .validate()
            .map_err(|err| EngineError::invalid_profile(&profile.name, err.to_string()))?;

        let mut seeds = BTreeMap::new();
        for state in PlantState::KNOWN {
            let prototype = profile.prototypes.get(&state).ok_or_else(|| {
                EngineError::invalid_profile(
                    &profile.name,
                    format!("missing prototype for '{}'", state),
                )
            })?;
            let values = HdcFeature::ALL.map(|feature| {
                let idx = feature.time_domain_index();
                profile.bounds[idx].denormalize(prototype[idx])
            });
            seeds.insert(
                state,
                self.encoder.encode_values(&values, &profile.quantization),
            );
        }
        self.seeds = seeds;
        Ok(())
    }

    /// Encode the record, bind it with the two previous raw vectors and score it.
    ///
    /// Updates the temporal ring and the winning state's statistics.
    pub fn classify(
        &mut self,
        features: &FeatureRecord,
        ranges: &QuantizationRanges,
    ) -> HdcClassification {
        let raw = self.encoder.encode(features, ranges);
        let encoded = self.bind_temporal(&raw);

        self.history.push_front(raw);
        self.history.truncate(TEMPORAL_RING);

        let verdict = Verdict::from_scores(self.score(&encoded));
        let novelty = self.observe(verdict.state, verdict.confidence());

        HdcClassification {
            verdict,
            novelty,
            encoded,
        }
    }

    fn bind_temporal(&self, raw: &Hypervector) -> Hypervector {
        let mut encoded = raw.clone();
        for (lag, previous) in self.history.iter().take(2).enumerate() {
            encoded.bind_assign(&previous.permute(lag + 1));
        }
        encoded
    }

    /// Per-state score: the weighted seed similarity, raised to the best
    /// weighted exemplar similarity when the state holds exemplars.
    ///
    /// Seeds carry no temporal context while queries after the first tick are
    /// bound with their two predecessors, so seed similarity then sits near
    /// zero and only breaks ties until exemplars are learned. Exemplars are
    /// stored from bound queries and compare like for like.
    pub fn score(&self, vector: &Hypervector) -> BTreeMap<PlantState, f32> {
        PlantState::KNOWN
            .iter()
            .map(|&state| {
                let seed = self
                    .seeds
                    .get(&state)
                    .map(|s| self.config.seed_weight * vector.similarity(s))
                    .unwrap_or(0.0);
                let best_exemplar = self
                    .exemplars
                    .get(&state)
                    .into_iter()
                    .flatten()
                    .map(|e| self.config.exemplar_weight * vector.similarity(&e.vector))
                    .fold(None, |acc: Option<f32>, s| Some(acc.map_or(s, |a| a.max(s))));
                let score = match best_exemplar {
                    Some(best) => seed.max(best),
                    None => seed,
                };
                (state, score)
            })
            .collect()
    }

    fn observe(&mut self, state: PlantState, score: f32) -> Novelty {
        let decay = self.config.novelty_decay;
        let sigma = self.config.novelty_sigma;
        let min_observations = self.config.novelty_min_observations;

        let Some(stats) = self.stats.get_mut(&state) else {
            return Novelty {
                is_novel: false,
                score,
                mean: 0.0,
                std: 0.0,
                observations: 0,
            };
        };

        let is_novel =
            stats.observations > min_observations && score < stats.mean - sigma * stats.std();
        let novelty = Novelty {
            is_novel,
            score,
            mean: stats.mean,
            std: stats.std(),
            observations: stats.observations,
        };
        stats.observe(score, decay);
        novelty
    }

    /// Offer a labelled vector to the memory.
    pub fn learn(&mut self, vector: &Hypervector, state: PlantState) -> LearnOutcome {
        let max = self.config.max_exemplars_per_state;
        let threshold = self.config.redundancy_threshold;

        let Some(bucket) = self.exemplars.get_mut(&state) else {
            return LearnOutcome::Ignored;
        };

        if bucket.iter().any(|e| vector.similarity(&e.vector) > threshold) {
            self.rejected += 1;
            debug!("hdc rejected redundant exemplar for {}", state);
            return LearnOutcome::Redundant;
        }

        self.clock += 1;
        bucket.push_back(Exemplar {
            vector: vector.clone(),
            state,
            timestamp: self.clock,
        });
        let mut evicted = false;
        while bucket.len() > max {
            bucket.pop_front();
            evicted = true;
        }
        self.total_learned += 1;
        debug!(
            "hdc stored exemplar for {} ({} held, evicted: {})",
            state,
            bucket.len(),
            evicted
        );
        LearnOutcome::Stored { evicted }
    }

    /// Advance auto-calibration by one classified tick.
    ///
    /// Every `calibration_interval`-th tick is learned as resting. Returns
    /// `None` once calibration has completed.
    pub fn calibration_step(&mut self, vector: &Hypervector) -> Option<LearnOutcome> {
        if self.calibration_complete {
            return None;
        }
        self.calibration_ticks += 1;

        let outcome = if self.calibration_ticks % self.config.calibration_interval.max(1) == 0 {
            self.learn(vector, PlantState::Resting)
        } else {
            LearnOutcome::Ignored
        };

        if self.calibration_ticks >= self.config.calibration_ticks {
            self.calibration_complete = true;
            info!(
                "hdc calibration complete after {} ticks ({} resting exemplars)",
                self.calibration_ticks,
                self.exemplar_count(PlantState::Resting)
            );
        }
        Some(outcome)
    }

    pub fn is_calibrated(&self) -> bool {
        self.calibration_complete
    }

    pub fn exemplar_count(&self, state: PlantState) -> usize {
        self.exemplars.get(&state).map_or(0, VecDeque::len)
    }

    pub fn exemplars(&self, state: PlantState) -> impl Iterator<Item = &Exemplar> {
        self.exemplars.get(&state).into_iter().flatten()
    }

    pub fn state_stats(&self, state: PlantState) -> StateStats {
        self.stats.get(&state).copied().unwrap_or_default()
    }

    pub fn seed(&self, state: PlantState) -> Option<&Hypervector> {
        self.seeds.get(&state)
    }

    pub fn encoder(&self) -> &SignalEncoder {
        &self.encoder
    }

    pub fn learning_stats(&self) -> LearningStats {
        LearningStats {
            calibration_complete: self.calibration_complete,
            calibration_ticks: self.calibration_ticks,
            calibration_target: self.config.calibration_ticks,
            exemplar_counts: PlantState::KNOWN
                .iter()
                .map(|&s| (s, self.exemplar_count(s)))
                .collect(),
            total_learned: self.total_learned,
            rejected: self.rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::builtin;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn memory() -> HdcMemory {
        HdcMemory::new(&builtin::plant(), &HdcConfig::default(), 42).unwrap()
    }

    fn random_vectors(n: usize) -> Vec<Hypervector> {
        let mut rng = StdRng::seed_from_u64(7);
        (0..n).map(|_| Hypervector::random(&mut rng)).collect()
    }

    #[test]
    fn same_vector_twice_stores_once() {
        let mut memory = memory();
        let v = &random_vectors(1)[0];
        assert!(memory.learn(v, PlantState::Calm).is_stored());
        assert_eq!(memory.learn(v, PlantState::Calm), LearnOutcome::Redundant);
        assert_eq!(memory.exemplar_count(PlantState::Calm), 1);
        assert_eq!(memory.learning_stats().rejected, 1);
    }

    #[test]
    fn distinct_vectors_are_both_stored() {
        let mut memory = memory();
        for v in random_vectors(2) {
            memory.learn(&v, PlantState::Active);
        }
        assert_eq!(memory.exemplar_count(PlantState::Active), 2);
    }

    #[test]
    fn capacity_evicts_oldest() {
        let mut memory = memory();
        let vectors = random_vectors(6);
        let mut outcomes = Vec::new();
        for v in &vectors {
            outcomes.push(memory.learn(v, PlantState::Stress));
        }
        assert_eq!(memory.exemplar_count(PlantState::Stress), 5);
        assert_eq!(outcomes[5], LearnOutcome::Stored { evicted: true });
        let oldest = memory.exemplars(PlantState::Stress).next().unwrap();
        assert_eq!(oldest.vector, vectors[1]);
        assert_eq!(memory.learning_stats().total_learned, 6);
    }

    #[test]
    fn unknown_is_never_stored() {
        let mut memory = memory();
        let v = &random_vectors(1)[0];
        assert_eq!(memory.learn(v, PlantState::Unknown), LearnOutcome::Ignored);
        assert_eq!(memory.learning_stats().total_learned, 0);
    }

    #[test]
    fn exemplar_outscores_seed() {
        let mut memory = memory();
        let v = &random_vectors(1)[0];
        memory.learn(v, PlantState::Transition);
        let scores = memory.score(v);
        assert_eq!(scores[&PlantState::Transition], 1.0);
        assert!(scores[&PlantState::Calm] <= 0.3);
    }

    #[test]
    fn novelty_needs_enough_observations() {
        let mut memory = memory();
        for _ in 0..5 {
            let n = memory.observe(PlantState::Calm, 0.9);
            assert!(!n.is_novel);
        }
        let low = memory.observe(PlantState::Calm, -0.9);
        assert!(!low.is_novel, "five observations are not enough");

        let mut seasoned = self::memory();
        for _ in 0..6 {
            seasoned.observe(PlantState::Calm, 0.9);
        }
        assert!(seasoned.observe(PlantState::Calm, -0.9).is_novel);
    }

    #[test]
    fn stats_follow_ema() {
        let mut stats = StateStats::default();
        stats.observe(1.0, 0.5);
        assert_eq!(stats.mean, 1.0);
        stats.observe(0.0, 0.5);
        assert!((stats.mean - 0.5).abs() < 1e-6);
        assert!((stats.variance - 0.25).abs() < 1e-6);
    }

    #[test]
    fn calibration_learns_every_interval_then_stops() {
        let mut memory = memory();
        let vectors = random_vectors(60);
        let mut stored = 0;
        for v in &vectors {
            if let Some(outcome) = memory.calibration_step(v) {
                if outcome.is_stored() {
                    stored += 1;
                }
            }
        }
        assert!(memory.is_calibrated());
        assert_eq!(stored, 6);
        assert_eq!(memory.exemplar_count(PlantState::Resting), 5);
        assert!(memory.calibration_step(&vectors[0]).is_none());
    }

    #[test]
    fn temporal_binding_uses_history() {
        let mut memory = memory();
        let features = crate::signal::FeatureExtractor::new(20.0)
            .extract_values(&[0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0])
            .unwrap();
        let ranges = builtin::plant().quantization;
        let first = memory.classify(&features, &ranges).encoded;
        let second = memory.classify(&features, &ranges).encoded;
        assert_ne!(first, second);
        assert_eq!(first, memory.encoder().encode(&features, &ranges));
    }

    #[test]
    fn bound_queries_score_near_zero_against_seeds() {
        let mut memory = memory();
        let features = crate::signal::FeatureExtractor::new(20.0)
            .extract_values(&[0.0, 1.0, 0.5, 1.5, 1.0, 2.0, 1.5, 2.5, 2.0, 3.0])
            .unwrap();
        let ranges = builtin::plant().quantization;
        for _ in 0..2 {
            memory.classify(&features, &ranges);
        }
        let bound = memory.classify(&features, &ranges);
        for (state, score) in &bound.verdict.scores {
            assert!(score.abs() < 0.05, "{} scored {}", state, score);
        }
    }

    #[test]
    fn seeds_follow_profile() {
        let mut memory = memory();
        let plant_seed = memory.seed(PlantState::Stress).cloned().unwrap();
        memory.rederive_seeds(&builtin::fungus()).unwrap();
        assert_ne!(memory.seed(PlantState::Stress), Some(&plant_seed));
        assert_eq!(memory.seeds.len(), PlantState::COUNT);
        let fungus_seed = memory.seed(PlantState::Stress).unwrap();
        let values = {
            let p = builtin::fungus();
            let proto = &p.prototypes[&PlantState::Stress];
            HdcFeature::ALL.map(|f| {
                let idx = f.time_domain_index();
                p.bounds[idx].denormalize(proto[idx])
            })
        };
        let expected = memory
            .encoder()
            .encode_values(&values, &builtin::fungus().quantization);
        assert_eq!(fungus_seed, &expected);
    }
}
