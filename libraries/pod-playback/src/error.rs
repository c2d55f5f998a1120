//! Error types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Why the engine could not (or can no longer) play
///
/// Delivered as data (in `EngineEvent::PlaybackError` and from
/// `Engine::play`), never as a panic across the state machine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureReason {
    /// Load attempted with no URI
    MissingSource,

    /// Environment refused autonomous playback
    Blocked,

    /// Media could not be decoded
    Decode,

    /// Media could not be fetched
    Network,
}

impl FailureReason {
    /// Whether a retry has to load the source again (vs. just calling play)
    pub fn requires_reload(self) -> bool {
        matches!(self, FailureReason::Decode | FailureReason::Network)
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FailureReason::MissingSource => "no media source",
            FailureReason::Blocked => "playback blocked",
            FailureReason::Decode => "media could not be decoded",
            FailureReason::Network => "media could not be fetched",
        };
        f.write_str(text)
    }
}

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Index out of bounds
    #[error("Index out of bounds: {index} (queue length {len})")]
    IndexOutOfBounds { index: usize, len: usize },

    /// Rate outside the allowed set
    #[error("Unsupported playback rate: {0}")]
    InvalidRate(f64),

    /// No episode is selected
    #[error("No current episode")]
    NoCurrentEpisode,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// Invalid operation
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Engine refused a request
    #[error("Engine error: {0}")]
    Engine(FailureReason),

    /// Persistence failure
    #[error("Storage error: {0}")]
    Storage(#[from] pod_storage::StorageError),

    /// The player service is no longer running
    #[error("Player service is not running")]
    ServiceClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
