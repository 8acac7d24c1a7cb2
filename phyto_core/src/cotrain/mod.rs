//! Co-training loop.
//!
//! Owns the sliding window and both adaptive classifiers for one stream.
//! Each tick extracts features, classifies with every available classifier,
//! smooths the primary state, then teaches the classifiers from operator
//! labels, confident agreement or the distance classifier's opinion.

pub mod context;
pub mod result;

use phyto_shared::{Mailbox, PlantState, RawSample};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::hdc::{HdcClassification, HdcMemory};
use crate::learner::{PrototypeClassifier, RuleBaseline, StateClassifier, Verdict};
use crate::profile::builtin::DEFAULT_ORGANISM;
use crate::profile::{HdcFeature, OrganismProfile, ProfileRegistry};
use crate::signal::{assess_quality, clamp_outliers, FeatureExtractor, FeatureRecord, Window};
use crate::signal::SignalQuality;

pub use context::TemporalContext;
pub use result::{Classification, LearnEvent, TickResult};

/// Per-stream engine state.
///
/// # Examples
///
/// ```
/// use phyto_cognition_core::{CoTrainer, EngineConfig};
/// use phyto_shared::{Mailbox, RawSample};
///
/// let mut trainer = CoTrainer::new(EngineConfig::default()).unwrap();
/// let mailbox = Mailbox::new();
///
/// for i in 0..12 {
///     let sample = RawSample::from_deviation(i as f64 * 0.05, (i % 3) as f32);
///     let result = trainer.tick(sample, &mailbox);
///     assert_eq!(result.is_classified(), i >= 9);
/// }
/// ```
#[derive(Debug)]
pub struct CoTrainer {
    config: EngineConfig,
    registry: ProfileRegistry,
    profile: OrganismProfile,
    extractor: FeatureExtractor,
    window: Window,
    hdc: Option<HdcMemory>,
    pdc: Option<PrototypeClassifier>,
    rules: RuleBaseline,
    context: TemporalContext,
    ticks: u64,
    classified_ticks: u64,
    post_calibration_ticks: u64,
    pseudo_labels: u64,
    last_pseudo_tick: Option<u64>,
}

impl CoTrainer {
    /// Build a trainer over the built-in profiles.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::with_registry(config, ProfileRegistry::builtin())
    }

    /// Build a trainer selecting `config.engine.organism` from `registry`.
    ///
    /// An unregistered organism falls back to the default profile; only a
    /// registry without that profile is an error. A classifier that cannot
    /// be initialised is left out and reported as Unknown every tick; the
    /// other keeps running.
    pub fn with_registry(config: EngineConfig, registry: ProfileRegistry) -> EngineResult<Self> {
        let profile = match registry.get(&config.engine.organism) {
            Ok(profile) => profile.clone(),
            Err(err) => {
                warn!("{}; starting with '{}'", err, DEFAULT_ORGANISM);
                registry.get(DEFAULT_ORGANISM)?.clone()
            }
        };

        let hdc = HdcMemory::new(&profile, &config.hdc, config.engine.seed)
            .map_err(|err| warn!("hdc classifier unavailable: {}", err))
            .ok();
        let pdc = PrototypeClassifier::new(&profile, &config.pdc)
            .map_err(|err| warn!("pdc classifier unavailable: {}", err))
            .ok();

        let extractor = FeatureExtractor::with_filterbank(
            config.engine.sample_rate_hz,
            config.engine.spectral_filters,
            config.engine.window_function,
        );
        let rules = RuleBaseline::new();

        info!(
            "co-trainer ready for '{}' ({} Hz, window {}, {:?} taper, baseline '{}')",
            profile.name,
            config.engine.sample_rate_hz,
            config.engine.window_capacity,
            config.engine.window_function,
            rules.name()
        );

        Ok(Self {
            window: Window::new(config.engine.window_capacity),
            context: TemporalContext::new(config.cotrain.smoothing_depth),
            extractor,
            hdc,
            pdc,
            rules,
            profile,
            registry,
            config,
            ticks: 0,
            classified_ticks: 0,
            post_calibration_ticks: 0,
            pseudo_labels: 0,
            last_pseudo_tick: None,
        })
    }

    /// Process one sample.
    ///
    /// The mailbox is drained once: a pending organism request is applied
    /// before classification, a pending label after it. Labels stay queued
    /// while the window is still filling.
    pub fn tick(&mut self, sample: RawSample, mailbox: &Mailbox) -> TickResult {
        let tick = self.ticks;
        self.ticks += 1;

        if let Some(name) = mailbox.take_organism() {
            if let Err(err) = self.switch_profile(&name) {
                warn!("ignored organism request: {}", err);
            }
        }

        self.window = self.window.push(sample);
        if !self.window.has_at_least(self.config.engine.min_samples) {
            return TickResult::raw_only(tick, sample, &self.profile.name);
        }

        let values = clamp_outliers(&self.window.chronological_deviations());
        let features = match self.extractor.extract_values(&values) {
            Ok(features) => features,
            Err(err) => {
                warn!("feature extraction failed: {}", err);
                return TickResult::raw_only(tick, sample, &self.profile.name);
            }
        };
        let quality = assess_quality(&features, &self.profile.quality);

        let classification = self.classify_and_learn(&features, quality, mailbox);
        TickResult {
            tick,
            sample,
            organism: self.profile.name.clone(),
            classification: Some(classification),
        }
    }

    fn classify_and_learn(
        &mut self,
        features: &FeatureRecord,
        quality: SignalQuality,
        mailbox: &Mailbox,
    ) -> Classification {
        let classified_tick = self.classified_ticks;
        self.classified_ticks += 1;

        let pdc = self
            .pdc
            .as_ref()
            .map(|pdc| pdc.classify(features, &self.profile))
            .unwrap_or_else(Verdict::unavailable);
        let rules = self.rules.classify(features, &self.profile);
        let hdc: Option<HdcClassification> = self
            .hdc
            .as_mut()
            .map(|hdc| hdc.classify(features, &self.profile.quantization));

        let hdc_calibrated = self.hdc.as_ref().is_some_and(HdcMemory::is_calibrated);
        let primary = match &hdc {
            Some(h) if hdc_calibrated || self.pdc.is_none() => h.verdict.state,
            _ => pdc.state,
        };
        self.context.push(primary);
        let smoothed = self.context.smoothed();

        let calibration = match (&hdc, self.hdc.as_mut()) {
            (Some(h), Some(memory)) => memory.calibration_step(&h.encoded),
            _ => None,
        };
        let learning = self.learn(
            features,
            quality,
            &pdc,
            hdc.as_ref(),
            mailbox,
            classified_tick,
        );

        if calibration.is_none() && self.hdc.is_some() {
            self.post_calibration_ticks += 1;
            if self.post_calibration_ticks % self.config.cotrain.drift_interval.max(1) == 0 {
                self.correct_drift(features);
            }
        }

        Classification {
            hdc: hdc
                .as_ref()
                .map_or_else(Verdict::unavailable, |h| h.verdict.clone()),
            novelty: hdc.as_ref().map(|h| h.novelty),
            hdc_stats: self.hdc.as_ref().map(HdcMemory::learning_stats),
            pdc,
            rules,
            primary,
            smoothed,
            features: *features,
            quality,
            pseudo_label_count: self.pseudo_labels,
            calibration,
            learning,
        }
    }

    fn learn(
        &mut self,
        features: &FeatureRecord,
        quality: SignalQuality,
        pdc: &Verdict,
        hdc: Option<&HdcClassification>,
        mailbox: &Mailbox,
        classified_tick: u64,
    ) -> LearnEvent {
        if let Some(state) = mailbox.take_label() {
            return self.apply_user_label(features, state, hdc);
        }

        let novel = hdc.is_some_and(|h| h.novelty.is_novel);
        if !quality.is_usable || novel {
            return LearnEvent::None;
        }
        let (Some(hdc), Some(memory)) = (hdc, self.hdc.as_mut()) else {
            return LearnEvent::None;
        };

        let cotrain = &self.config.cotrain;
        let cooled_down = self
            .last_pseudo_tick
            .map_or(true, |last| classified_tick - last >= cotrain.pseudo_label_interval);
        let agree = pdc.state.is_known() && pdc.state == hdc.verdict.state;

        if agree
            && pdc.confidence() > cotrain.pdc_confidence
            && hdc.verdict.confidence() > cotrain.hdc_confidence
            && cooled_down
        {
            let outcome = memory.learn(&hdc.encoded, pdc.state);
            self.pseudo_labels += 1;
            self.last_pseudo_tick = Some(classified_tick);
            debug!("pseudo-label {} ({:?})", pdc.state, outcome);
            return LearnEvent::PseudoLabel {
                state: pdc.state,
                hdc: outcome,
            };
        }

        if memory.is_calibrated()
            && pdc.state.is_known()
            && memory.exemplar_count(pdc.state) < cotrain.bootstrap_max_exemplars
            && pdc.confidence() > cotrain.pdc_confidence
        {
            let outcome = memory.learn(&hdc.encoded, pdc.state);
            debug!("seed bootstrap {} ({:?})", pdc.state, outcome);
            return LearnEvent::SeedBootstrap {
                state: pdc.state,
                hdc: outcome,
            };
        }

        LearnEvent::None
    }

    fn apply_user_label(
        &mut self,
        features: &FeatureRecord,
        state: PlantState,
        hdc: Option<&HdcClassification>,
    ) -> LearnEvent {
        let hdc_outcome = match (hdc, self.hdc.as_mut()) {
            (Some(h), Some(memory)) => Some(memory.learn(&h.encoded, state)),
            _ => None,
        };
        let pdc_alpha = match self.pdc.as_mut() {
            Some(pdc) => match pdc.learn(features, state, &self.profile) {
                Ok(alpha) => Some(alpha),
                Err(err) => {
                    warn!("{} rejected user label: {}", pdc.name(), err);
                    None
                }
            },
            None => None,
        };
        info!("user label {} applied", state);
        LearnEvent::UserLabel {
            state,
            hdc: hdc_outcome,
            pdc_alpha,
        }
    }

    /// Widen quantization ranges toward observations that fell outside them.
    fn correct_drift(&mut self, features: &FeatureRecord) {
        let alpha = self.config.cotrain.drift_alpha;
        for feature in HdcFeature::ALL {
            let value = feature.value(features);
            if !value.is_finite() {
                continue;
            }
            let range = self.profile.quantization.get_mut(feature);
            if value < range.min {
                range.min += alpha * (value - range.min);
                debug!("drift widened {} min to {}", feature.name(), range.min);
            } else if value > range.max {
                range.max += alpha * (value - range.max);
                debug!("drift widened {} max to {}", feature.name(), range.max);
            }
        }
    }

    /// Swap to another registered organism profile.
    ///
    /// Exemplars and novelty statistics survive; seeds, prototypes, bounds,
    /// thresholds and quantization ranges come from the new profile. An
    /// unknown or invalid profile leaves the trainer unchanged.
    pub fn switch_profile(&mut self, name: &str) -> EngineResult<()> {
        let profile = self.registry.get(name)?.clone();
        profile
            .validate()
            .map_err(|err| EngineError::invalid_profile(&profile.name, err.to_string()))?;

        match self.pdc.as_mut() {
            Some(pdc) => pdc.reset_prototypes(&profile)?,
            None => {
                self.pdc = PrototypeClassifier::new(&profile, &self.config.pdc)
                    .map_err(|err| warn!("pdc classifier still unavailable: {}", err))
                    .ok();
            }
        }
        match self.hdc.as_mut() {
            Some(memory) => memory.rederive_seeds(&profile)?,
            None => {
                self.hdc = HdcMemory::new(&profile, &self.config.hdc, self.config.engine.seed)
                    .map_err(|err| warn!("hdc classifier still unavailable: {}", err))
                    .ok();
            }
        }

        info!(
            "switched organism profile '{}' -> '{}'",
            self.profile.name, profile.name
        );
        self.profile = profile;
        Ok(())
    }

    pub fn organism(&self) -> &str {
        &self.profile.name
    }

    pub fn profile(&self) -> &OrganismProfile {
        &self.profile
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    /// Mutable access for registering more profiles at runtime.
    pub fn registry_mut(&mut self) -> &mut ProfileRegistry {
        &mut self.registry
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn hdc(&self) -> Option<&HdcMemory> {
        self.hdc.as_ref()
    }

    pub fn pdc(&self) -> Option<&PrototypeClassifier> {
        self.pdc.as_ref()
    }

    pub fn pseudo_label_count(&self) -> u64 {
        self.pseudo_labels
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
