use phyto_cognition_core::config::ConfigError;
use phyto_cognition_core::{CoTrainer, EngineConfig, ProfileRegistry, TickJournal};
use phyto_shared::{Mailbox, RawSample};

/// Synthetic plant trace: quiet baseline, a touch stimulus, then a stress episode.
fn synthetic_deviation(i: usize) -> f32 {
    let t = i as f32 * 0.05;
    let baseline = 0.8 * (t * 0.9).sin() + 0.3 * (t * 3.1).cos();
    match i {
        150 => baseline + 40.0,
        200..=300 => baseline + 9.0 * (t * 2.2).sin(),
        _ => baseline,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    println!(
        "Loaded config: organism={} rate={} Hz window={} seed={}",
        config.engine.organism,
        config.engine.sample_rate_hz,
        config.engine.window_capacity,
        config.engine.seed
    );

    let mut registry = ProfileRegistry::builtin();
    if let Err(err) = registry.load_file("config/profiles/lichen.toml") {
        eprintln!("Skipping lichen profile: {err}");
    }

    let rate = f64::from(config.engine.sample_rate_hz);
    let mut trainer = CoTrainer::with_registry(config, registry)?;
    let mut journal = TickJournal::create("logs/ticks.jsonl")?.classified_only(true);
    let mailbox = Mailbox::new();

    for i in 0..400 {
        match i {
            120 => {
                mailbox.submit_label("calm")?;
            }
            210 => {
                mailbox.submit_label("stress")?;
            }
            340 => mailbox.request_organism("fungus")?,
            _ => {}
        }

        let sample = RawSample::from_deviation(i as f64 / rate, synthetic_deviation(i));
        let result = trainer.tick(sample, &mailbox);
        journal.record(&result)?;

        if let Some(c) = result.classification.as_ref().filter(|_| i % 25 == 0) {
            println!(
                "tick {:>3} [{}] pdc={} hdc={} rules={} smoothed={} quality={:?} novel={}",
                result.tick,
                result.organism,
                c.pdc.state,
                c.hdc.state,
                c.rules.state,
                c.smoothed,
                c.quality.reason,
                c.novelty.map_or(false, |n| n.is_novel)
            );
        }
    }

    if let Some(hdc) = trainer.hdc() {
        let stats = hdc.learning_stats();
        println!(
            "Replay complete. calibrated={} learned={} rejected={} pseudo-labels={}",
            stats.calibration_complete,
            stats.total_learned,
            stats.rejected,
            trainer.pseudo_label_count()
        );
    }
    println!("Journal written to {}", journal.path().display());
    Ok(())
}

fn load_config() -> Result<EngineConfig, ConfigError> {
    EngineConfig::load_from_file("config/engine.toml").or_else(|err| {
        eprintln!("Falling back to default config: {err}");
        Ok(EngineConfig::default())
    })
}
