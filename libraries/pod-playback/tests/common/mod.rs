//! Shared fixtures for playback integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use pod_core::types::{EpisodeIdentity, QueueEntry};
use pod_playback::{
    Engine, EngineEvent, EngineEventKind, FailureReason, Generation, ManualClock,
    PlaybackConfig, PlaybackEngine, PlaybackManager, PlayerHandle, PlayerNotification,
    PlayerService, SimulatedOutput,
};
use pod_storage::MemoryStore;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

/// Engine call as observed by [`RecordingEngine`]
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Load {
        uri: String,
        start: f64,
        autoplay: bool,
    },
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetRate(f64),
}

/// Engine that records every call and plays nothing
#[derive(Debug, Default)]
pub struct RecordingEngine {
    pub calls: Vec<Call>,
    pub position: Option<f64>,
    pub refuse_play: Option<FailureReason>,
    pub events: VecDeque<EngineEvent>,
    generation: Generation,
}

impl RecordingEngine {
    pub fn loads(&self) -> Vec<(String, f64, bool)> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Load {
                    uri,
                    start,
                    autoplay,
                } => Some((uri.clone(), *start, *autoplay)),
                _ => None,
            })
            .collect()
    }

    pub fn last_load(&self) -> Option<(String, f64, bool)> {
        self.loads().pop()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                Call::Seek(position) => Some(*position),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, wanted: &Call) -> usize {
        self.calls.iter().filter(|call| *call == wanted).count()
    }
}

impl Engine for RecordingEngine {
    fn load(&mut self, media_uri: &str, start_position: f64, autoplay: bool) -> Generation {
        self.generation = self.generation.next();
        self.calls.push(Call::Load {
            uri: media_uri.to_string(),
            start: start_position,
            autoplay,
        });
        self.position = Some(start_position);
        self.generation
    }

    fn play(&mut self) -> Result<(), FailureReason> {
        self.calls.push(Call::Play);
        match self.refuse_play {
            Some(reason) => Err(reason),
            None => Ok(()),
        }
    }

    fn pause(&mut self) {
        self.calls.push(Call::Pause);
    }

    fn seek(&mut self, position_seconds: f64) {
        self.calls.push(Call::Seek(position_seconds));
        self.position = Some(position_seconds);
    }

    fn set_volume(&mut self, volume: f64) {
        self.calls.push(Call::SetVolume(volume));
    }

    fn set_rate(&mut self, rate: f64) {
        self.calls.push(Call::SetRate(rate));
    }

    fn current_position(&self) -> Option<f64> {
        self.position
    }

    fn generation(&self) -> Generation {
        self.generation
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 21, 0, 0).unwrap()
}

pub fn entry(show: &str, episode: u32) -> QueueEntry {
    QueueEntry::new(
        EpisodeIdentity::new(show, 1, episode),
        format!("{show} title"),
        "Season 1",
        format!("Episode {episode}"),
        format!("https://cdn.example/{show}/{episode}.mp3"),
    )
}

/// Manager over a recording engine and in-memory storage
pub struct Harness {
    pub manager: PlaybackManager<RecordingEngine>,
    pub store: Arc<MemoryStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let clock = Arc::new(ManualClock::new(start_time()));
        let manager = PlaybackManager::new(
            RecordingEngine::default(),
            store.clone(),
            clock.clone(),
            PlaybackConfig::default(),
        );
        Self {
            manager,
            store,
            clock,
        }
    }

    pub fn engine(&self) -> &RecordingEngine {
        self.manager.engine()
    }

    pub fn engine_mut(&mut self) -> &mut RecordingEngine {
        self.manager.engine_mut()
    }

    pub fn generation(&self) -> Generation {
        self.manager.engine().generation()
    }

    /// Deliver an event for the current load
    pub fn emit(&mut self, kind: EngineEventKind) {
        let event = EngineEvent::new(self.generation(), kind);
        self.manager.handle_engine_event(event);
    }

    pub fn metadata(&mut self, duration_seconds: f64) {
        self.emit(EngineEventKind::MetadataReady { duration_seconds });
    }

    pub fn ended(&mut self) {
        self.emit(EngineEventKind::Ended);
    }

    pub fn fail(&mut self, reason: FailureReason) {
        self.emit(EngineEventKind::PlaybackError { reason });
    }

    /// Move the engine's playhead and let the manager sample it
    pub fn play_to(&mut self, position_seconds: f64) {
        self.engine_mut().position = Some(position_seconds);
        self.manager.sample_position();
    }

    pub fn cursor_identity(&self) -> Option<EpisodeIdentity> {
        self.manager.current_entry().map(|e| e.identity.clone())
    }
}

// ============================================================================
// SERVICE FIXTURES
// ============================================================================

/// Simulated entry of a given length
pub fn sim_entry(show: &str, episode: u32, seconds: u32) -> QueueEntry {
    let mut entry = entry(show, episode);
    entry.media_uri = format!("sim://{show}/{episode}?duration={seconds}");
    entry
}

/// Spawn a player over a simulated output
pub fn spawn_player(
    store: Arc<MemoryStore>,
    clock: Arc<ManualClock>,
) -> (PlayerHandle, JoinHandle<()>) {
    let (output, signals) = SimulatedOutput::new(60.0);
    let manager = PlaybackManager::new(
        PlaybackEngine::new(output),
        store,
        clock,
        PlaybackConfig::default(),
    );
    PlayerService::spawn(manager, signals)
}

/// Wait (in virtual time) for a matching notification
pub async fn wait_for(
    notifications: &mut broadcast::Receiver<PlayerNotification>,
    matches: impl Fn(&PlayerNotification) -> bool,
) -> PlayerNotification {
    let wait = async {
        loop {
            match notifications.recv().await {
                Ok(notification) if matches(&notification) => return notification,
                Ok(_) | Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => panic!("player stopped"),
            }
        }
    };
    tokio::time::timeout(Duration::from_secs(3600), wait)
        .await
        .expect("timed out waiting for notification")
}
