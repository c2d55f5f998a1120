//! Engine events and player notifications

use crate::error::FailureReason;
use crate::types::PlaybackStatus;
use chrono::{DateTime, Utc};
use pod_core::types::EpisodeIdentity;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Load generation
///
/// Every `Engine::load` starts a new generation; events carry the generation
/// they were produced under so late events from an abandoned load can be
/// told apart from current ones.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Generation(u64);

impl Generation {
    /// Wrap a raw counter value
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// The generation after this one
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What the engine observed
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    /// Duration became known
    MetadataReady { duration_seconds: f64 },

    /// Playback position moved
    TimeAdvanced { position_seconds: f64 },

    /// Reached the end of the media
    Ended,

    /// Playback failed
    PlaybackError { reason: FailureReason },
}

/// Event emitted by the engine, tagged with its load generation
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    /// Generation of the load that produced this event
    pub generation: Generation,

    /// Event payload
    pub kind: EngineEventKind,
}

impl EngineEvent {
    /// Create an event
    pub fn new(generation: Generation, kind: EngineEventKind) -> Self {
        Self { generation, kind }
    }

    /// Whether this event ends the load (first one wins)
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EngineEventKind::Ended | EngineEventKind::PlaybackError { .. }
        )
    }
}

/// Notification for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlayerNotification {
    /// Playback status changed
    StateChanged { status: PlaybackStatus },

    /// Current episode changed (`None` when nothing is selected)
    EpisodeChanged { identity: Option<EpisodeIdentity> },

    /// Queue contents or order changed
    QueueChanged { length: usize, cursor: Option<usize> },

    /// Position or duration changed
    PositionChanged {
        position_seconds: f64,
        duration_seconds: Option<f64>,
    },

    /// Volume or mute changed
    VolumeChanged { volume: f64, muted: bool },

    /// Playback rate changed
    RateChanged { rate: f64 },

    /// Sleep timer set or cancelled
    SleepTimerChanged { deadline: Option<DateTime<Utc>> },

    /// Sleep timer fired and paused playback
    SleepTimerExpired,

    /// Episode played to the end for the first time
    EpisodeCompleted { identity: EpisodeIdentity },

    /// Engine failure
    Error { reason: FailureReason, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generations_increase() {
        let first = Generation::default();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 1);
    }

    #[test]
    fn terminal_events() {
        let g = Generation::new(3);
        assert!(EngineEvent::new(g, EngineEventKind::Ended).is_terminal());
        assert!(EngineEvent::new(
            g,
            EngineEventKind::PlaybackError {
                reason: FailureReason::Decode
            }
        )
        .is_terminal());
        assert!(!EngineEvent::new(
            g,
            EngineEventKind::TimeAdvanced {
                position_seconds: 1.0
            }
        )
        .is_terminal());
    }

    #[test]
    fn notification_serializes_tagged() {
        let json = serde_json::to_value(PlayerNotification::StateChanged {
            status: PlaybackStatus::Paused,
        })
        .unwrap();
        assert_eq!(json["type"], "stateChanged");
        assert_eq!(json["status"], "Paused");
    }
}
