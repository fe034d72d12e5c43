//! Speed Event Callbacks
//!
//! Holds one callback and threshold per speed event and fires them when a
//! newly decoded fix crosses the configured thresholds.

mod engine;
mod registry;

pub use engine::{EventEngine, FiredEvents};
pub use registry::{CallbackRegistry, SpeedCallback};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Registration errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// Threshold is negative or not a number
    #[error("Invalid threshold {0}: must be a non-negative number")]
    InvalidArgument(f64),

    /// No event with this identifier
    #[error("Unknown event kind: {0}")]
    InvalidEventKind(String),
}

/// Speed events a callback can be registered for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Speed changed by more than the tolerance since the previous sentence
    SpeedDelta,
    /// Speed rose above the threshold
    SpeedRise,
    /// Speed fell below the rise threshold
    SpeedFall,
}

impl EventKind {
    /// All kinds, in slot order
    pub const ALL: [EventKind; 3] = [EventKind::SpeedDelta, EventKind::SpeedRise, EventKind::SpeedFall];

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SpeedDelta => "speed_delta",
            EventKind::SpeedRise => "speed_rise",
            EventKind::SpeedFall => "speed_fall",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<u8> for EventKind {
    type Error = EventError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        EventKind::ALL
            .get(usize::from(id))
            .copied()
            .ok_or_else(|| EventError::InvalidEventKind(id.to_string()))
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| EventError::InvalidEventKind(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_id() {
        assert_eq!(EventKind::try_from(0u8), Ok(EventKind::SpeedDelta));
        assert_eq!(EventKind::try_from(2u8), Ok(EventKind::SpeedFall));
        assert_eq!(
            EventKind::try_from(3u8),
            Err(EventError::InvalidEventKind("3".to_string()))
        );
    }

    #[test]
    fn test_kind_from_name() {
        assert_eq!("speed_rise".parse::<EventKind>(), Ok(EventKind::SpeedRise));
        assert!("speed_stop".parse::<EventKind>().is_err());
    }
}
