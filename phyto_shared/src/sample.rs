use serde::{Deserialize, Serialize};

/// One reading delivered by the acquisition layer.
///
/// The acquisition layer parses and validates the line; the engine assumes every
/// sample it receives is well formed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawSample {
    /// Seconds since the start of the stream.
    pub elapsed: f64,
    /// Raw ADC code.
    pub raw: i32,
    /// ADC code converted to millivolts.
    pub millivolts: f32,
    /// Millivolts relative to the acquisition baseline.
    pub deviation: f32,
}

impl RawSample {
    pub fn new(elapsed: f64, raw: i32, millivolts: f32, deviation: f32) -> Self {
        Self {
            elapsed,
            raw,
            millivolts,
            deviation,
        }
    }

    /// Sample carrying only a deviation value, used by tests and synthetic feeds.
    pub fn from_deviation(elapsed: f64, deviation: f32) -> Self {
        Self {
            elapsed,
            raw: 0,
            millivolts: deviation,
            deviation,
        }
    }
}
