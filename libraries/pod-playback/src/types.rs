//! Core types for playback management

use crate::error::{FailureReason, PlaybackError};
use chrono::{DateTime, Utc};
use pod_core::types::QueueEntry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing playing
    Stopped,

    /// Currently playing
    Playing,

    /// Paused mid-episode
    Paused,
}

/// Allowed discrete playback rates
pub const ALLOWED_RATES: [f64; 7] = [0.5, 0.75, 1.0, 1.25, 1.5, 1.75, 2.0];

/// A playback rate from [`ALLOWED_RATES`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PlaybackRate(f64);

impl PlaybackRate {
    /// Normal speed
    pub const NORMAL: PlaybackRate = PlaybackRate(1.0);

    /// Validate a rate against the allowed set
    pub fn new(rate: f64) -> Option<Self> {
        ALLOWED_RATES
            .iter()
            .find(|allowed| (**allowed - rate).abs() < 1e-9)
            .map(|allowed| PlaybackRate(*allowed))
    }

    /// Rate as a multiplier
    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for PlaybackRate {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl TryFrom<f64> for PlaybackRate {
    type Error = PlaybackError;

    fn try_from(rate: f64) -> Result<Self, Self::Error> {
        PlaybackRate::new(rate).ok_or(PlaybackError::InvalidRate(rate))
    }
}

impl From<PlaybackRate> for f64 {
    fn from(rate: PlaybackRate) -> Self {
        rate.0
    }
}

impl fmt::Display for PlaybackRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x", self.0)
    }
}

/// Configuration for the playback manager and its timers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Volume used when nothing is persisted (default: 0.75)
    pub volume: f64,

    /// Rate used when nothing is persisted (default: 1.0)
    pub rate: f64,

    /// "Previous" restarts the episode past this position (default: 3 s)
    pub restart_threshold_secs: f64,

    /// Positions below this are not persisted (default: 10 s)
    pub min_progress_secs: f64,

    /// Progress save cadence while playing (default: 10 s)
    pub progress_save_interval_ms: u64,

    /// Sleep timer check cadence while playing (default: 1 s)
    pub sleep_check_interval_ms: u64,

    /// Position sampling cadence while playing (default: 33 ms, ~30 Hz)
    pub frame_interval_ms: u64,

    /// Default skip-forward delta (default: 30 s)
    pub skip_forward_secs: f64,

    /// Default skip-backward delta (default: 15 s)
    pub skip_backward_secs: f64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 0.75,
            rate: 1.0,
            restart_threshold_secs: 3.0,
            min_progress_secs: 10.0,
            progress_save_interval_ms: 10_000,
            sleep_check_interval_ms: 1_000,
            frame_interval_ms: 33,
            skip_forward_secs: 30.0,
            skip_backward_secs: 15.0,
        }
    }
}

/// Read-only view of the playback state for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSnapshot {
    /// Playback status
    pub status: PlaybackStatus,
    /// Queue in playback order
    pub queue: Vec<QueueEntry>,
    /// Index of the current entry
    pub cursor: Option<usize>,
    /// Position in the current episode
    pub position_seconds: f64,
    /// Duration, once the engine reported metadata
    pub duration_seconds: Option<f64>,
    /// Volume in [0, 1]
    pub volume: f64,
    /// Whether muted
    pub muted: bool,
    /// Playback rate
    pub rate: f64,
    /// When the sleep timer pauses playback
    pub sleep_deadline: Option<DateTime<Utc>>,
    /// Last engine failure, cleared on successful (re)start
    pub last_error: Option<FailureReason>,
}

impl PlaybackSnapshot {
    /// Entry at the cursor
    pub fn current(&self) -> Option<&QueueEntry> {
        self.cursor.and_then(|i| self.queue.get(i))
    }
}
