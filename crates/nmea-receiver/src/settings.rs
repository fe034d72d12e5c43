//! Receiver Configuration

use crate::error::ReceiverError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::Path;
use nmea_protocol::framing::MAX_SENTENCE_LEN;
use tracing::{info, warn};

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "NMEA";

/// Buffer sizing and decoding options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Bytes drained from the source per intake cycle (default: 512)
    pub intake_capacity: usize,
    /// Ring buffer capacity, larger than the intake size (default: 1024)
    pub ring_capacity: usize,
    /// Longest line handed to the decoder, terminator included (default: 128)
    pub staging_capacity: usize,
    /// Accept any two-letter talker, not only `GP` (default: true)
    pub accept_any_talker: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            intake_capacity: 512,
            ring_capacity: line_buffer::DEFAULT_CAPACITY,
            staging_capacity: line_buffer::DEFAULT_STAGING_CAPACITY,
            accept_any_talker: true,
        }
    }
}

impl ReceiverConfig {
    /// Check buffer sizes against each other
    pub fn validate(&self) -> Result<(), ReceiverError> {
        if self.intake_capacity == 0 {
            return Err(ReceiverError::InvalidConfig(
                "intake_capacity must be greater than zero".to_string(),
            ));
        }
        if self.staging_capacity == 0 {
            return Err(ReceiverError::InvalidConfig(
                "staging_capacity must be greater than zero".to_string(),
            ));
        }
        // A full ring has no free cell for one drained intake buffer
        if self.ring_capacity <= self.intake_capacity {
            return Err(ReceiverError::InvalidConfig(format!(
                "ring_capacity {} must be larger than intake_capacity {}",
                self.ring_capacity, self.intake_capacity
            )));
        }
        if self.staging_capacity < MAX_SENTENCE_LEN {
            warn!(
                "staging_capacity {} is below the {}-byte sentence limit, long sentences will be truncated",
                self.staging_capacity, MAX_SENTENCE_LEN
            );
        }
        Ok(())
    }
}

/// Load settings from an optional file plus `NMEA_`-prefixed environment variables.
///
/// Nested keys use a double underscore, e.g. `NMEA_RECEIVER__RING_CAPACITY`.
pub fn load_settings<T: DeserializeOwned>(path: Option<&Path>) -> Result<T, ReceiverError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        info!("Loading configuration from {}", path.display());
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
