//! Receiver Error Types

use thiserror::Error;

/// Errors reported by a byte source
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying device or file failed
    #[error("Byte source I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Source was closed and will not produce more bytes
    #[error("Byte source disconnected")]
    Disconnected,
}

/// Errors that can occur while wiring or running the receiver
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// Byte source failure
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Ring buffer could not be created
    #[error("Ring buffer error: {0}")]
    Ring(#[from] line_buffer::RingError),

    /// Callback registration rejected
    #[error("Callback registration failed: {0}")]
    Event(#[from] speed_events::EventError),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Configuration values are inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Logging could not be installed
    #[error("Logging setup failed: {0}")]
    Logging(String),
}
