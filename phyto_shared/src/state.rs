//! Physiological state enumeration shared by every classifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of physiological states plus the `Unknown` sentinel.
///
/// Variant order is the enumeration order used for tie-breaking and for the
/// ordering of score maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlantState {
    Resting,
    Calm,
    Active,
    Transition,
    Stimulus,
    Stress,
    /// No classification was possible.
    Unknown,
}

impl PlantState {
    /// Number of classifiable states (excludes `Unknown`).
    pub const COUNT: usize = 6;

    /// All classifiable states in enumeration order.
    pub const KNOWN: [PlantState; PlantState::COUNT] = [
        PlantState::Resting,
        PlantState::Calm,
        PlantState::Active,
        PlantState::Transition,
        PlantState::Stimulus,
        PlantState::Stress,
    ];

    /// Position in [`PlantState::KNOWN`], `None` for `Unknown`.
    pub fn index(self) -> Option<usize> {
        match self {
            PlantState::Resting => Some(0),
            PlantState::Calm => Some(1),
            PlantState::Active => Some(2),
            PlantState::Transition => Some(3),
            PlantState::Stimulus => Some(4),
            PlantState::Stress => Some(5),
            PlantState::Unknown => None,
        }
    }

    /// Inverse of [`PlantState::index`].
    pub fn from_index(idx: usize) -> Option<Self> {
        PlantState::KNOWN.get(idx).copied()
    }

    pub fn is_known(self) -> bool {
        self != PlantState::Unknown
    }

    /// Canonical lowercase name, identical to the serialized form.
    pub fn as_str(self) -> &'static str {
        match self {
            PlantState::Resting => "resting",
            PlantState::Calm => "calm",
            PlantState::Active => "active",
            PlantState::Transition => "transition",
            PlantState::Stimulus => "stimulus",
            PlantState::Stress => "stress",
            PlantState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for PlantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a name does not match any state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStateError {
    pub name: String,
}

impl fmt::Display for ParseStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown plant state '{}'", self.name)
    }
}

impl std::error::Error for ParseStateError {}

impl FromStr for PlantState {
    type Err = ParseStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "resting" => Ok(PlantState::Resting),
            "calm" => Ok(PlantState::Calm),
            "active" => Ok(PlantState::Active),
            "transition" => Ok(PlantState::Transition),
            "stimulus" => Ok(PlantState::Stimulus),
            "stress" => Ok(PlantState::Stress),
            "unknown" => Ok(PlantState::Unknown),
            _ => Err(ParseStateError {
                name: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_round_trips_for_known_states() {
        for (idx, state) in PlantState::KNOWN.iter().enumerate() {
            assert_eq!(state.index(), Some(idx));
            assert_eq!(PlantState::from_index(idx), Some(*state));
        }
        assert_eq!(PlantState::Unknown.index(), None);
        assert_eq!(PlantState::from_index(6), None);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("Stress".parse::<PlantState>(), Ok(PlantState::Stress));
        assert_eq!(" calm ".parse::<PlantState>(), Ok(PlantState::Calm));
        assert!("sleepy".parse::<PlantState>().is_err());
    }

    #[test]
    fn serializes_as_snake_case_name() {
        let json = serde_json::to_string(&PlantState::Transition).unwrap();
        assert_eq!(json, "\"transition\"");
    }

    #[test]
    fn enumeration_order_matches_ord() {
        let mut sorted = PlantState::KNOWN.to_vec();
        sorted.sort();
        assert_eq!(sorted, PlantState::KNOWN.to_vec());
        assert!(PlantState::Stress < PlantState::Unknown);
    }
}
