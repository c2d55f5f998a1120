//! Playback manager - the single owner of playback state
//!
//! Every user intent and every engine event goes through one of the
//! transition methods here. Each transition runs to completion before the
//! next one starts; side effects on the engine and on storage are issued
//! from inside the transition, and observers learn about changes through
//! the notification queue.

use crate::clock::Clock;
use crate::engine::Engine;
use crate::error::{FailureReason, PlaybackError, Result};
use crate::events::{EngineEvent, EngineEventKind, Generation, PlayerNotification};
use crate::queue::Queue;
use crate::sleep::SleepTimer;
use crate::types::{PlaybackConfig, PlaybackRate, PlaybackSnapshot, PlaybackStatus};
use crate::volume::Volume;
use pod_core::types::{EpisodeIdentity, QueueEntry};
use pod_storage::history::EpisodeHistory;
use pod_storage::{settings, PreferenceStore};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// User intents, as accepted by [`PlaybackManager::apply`]
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerIntent {
    /// Append to the queue without starting playback
    Enqueue(QueueEntry),
    /// Make current and play from the resume position
    PlayNow(QueueEntry),
    /// Play or pause
    TogglePlayPause,
    /// Next entry
    SkipToNext,
    /// Restart, or previous entry near the start
    SkipToPrevious,
    /// Jump to a queue index
    SkipToIndex(usize),
    /// Seek forward (default delta when `None`)
    SkipForward(Option<f64>),
    /// Seek backward (default delta when `None`)
    SkipBackward(Option<f64>),
    /// Seek to an absolute position
    SeekTo(f64),
    /// Seek to a fraction of the duration
    SeekToPercent(f64),
    /// Move a queue entry
    Reorder { from: usize, to: usize },
    /// Remove a queue entry
    RemoveFromQueue(usize),
    /// Empty the queue
    ClearQueue { retain_current: bool },
    /// Set the volume
    SetVolume(f64),
    /// Mute or unmute
    ToggleMute,
    /// Set the playback rate
    SetPlaybackRate(f64),
    /// Arm (minutes) or cancel the sleep timer
    SetSleepTimer(Option<u32>),
    /// Forget all progress and completions
    ResetHistory,
}

/// Playback state machine
pub struct PlaybackManager<E: Engine> {
    engine: E,
    store: Arc<dyn PreferenceStore>,
    history: EpisodeHistory,
    clock: Arc<dyn Clock>,
    config: PlaybackConfig,

    status: PlaybackStatus,
    queue: Queue,
    position: f64,
    duration: Option<f64>,
    volume: Volume,
    rate: PlaybackRate,
    sleep: SleepTimer,
    last_error: Option<FailureReason>,

    // Generation of the load backing the current entry, and the generation
    // whose terminal event has already been handled
    generation: Option<Generation>,
    settled: Option<Generation>,

    pending: Vec<PlayerNotification>,
}

impl<E: Engine> PlaybackManager<E> {
    /// Create a manager, restoring volume, rate and history from storage
    pub fn new(
        mut engine: E,
        store: Arc<dyn PreferenceStore>,
        clock: Arc<dyn Clock>,
        config: PlaybackConfig,
    ) -> Self {
        let history = EpisodeHistory::load(Arc::clone(&store));

        let volume = match settings::get_volume(&*store) {
            Ok(Some(volume)) => volume,
            Ok(None) => config.volume,
            Err(e) => {
                warn!("Failed to read volume: {e}");
                config.volume
            }
        };

        let rate = match settings::get_playback_rate(&*store) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Failed to read playback rate: {e}");
                None
            }
        }
        .and_then(PlaybackRate::new)
        .or_else(|| PlaybackRate::new(config.rate))
        .unwrap_or_default();

        let volume = Volume::new(volume);
        engine.set_volume(volume.level());
        engine.set_rate(rate.value());

        debug!(
            "Playback manager ready (volume {:.2}, rate {}, {} completed)",
            volume.level(),
            rate,
            history.completed_count()
        );

        Self {
            engine,
            store,
            history,
            clock,
            config,
            status: PlaybackStatus::Stopped,
            queue: Queue::new(),
            position: 0.0,
            duration: None,
            volume,
            rate,
            sleep: SleepTimer::new(),
            last_error: None,
            generation: None,
            settled: None,
            pending: Vec::new(),
        }
    }

    /// Apply a user intent
    ///
    /// Rejected intents (bad index, unsupported rate) change nothing.
    pub fn apply(&mut self, intent: PlayerIntent) -> Result<()> {
        match intent {
            PlayerIntent::Enqueue(entry) => {
                self.enqueue(entry);
            }
            PlayerIntent::PlayNow(entry) => self.play_now(entry),
            PlayerIntent::TogglePlayPause => self.toggle_play_pause(),
            PlayerIntent::SkipToNext => self.skip_to_next(),
            PlayerIntent::SkipToPrevious => self.skip_to_previous(),
            PlayerIntent::SkipToIndex(index) => return self.skip_to_index(index),
            PlayerIntent::SkipForward(delta) => {
                self.skip_forward(delta.unwrap_or(self.config.skip_forward_secs));
            }
            PlayerIntent::SkipBackward(delta) => {
                self.skip_backward(delta.unwrap_or(self.config.skip_backward_secs));
            }
            PlayerIntent::SeekTo(seconds) => self.seek_to(seconds),
            PlayerIntent::SeekToPercent(fraction) => self.seek_to_percent(fraction),
            PlayerIntent::Reorder { from, to } => return self.reorder(from, to),
            PlayerIntent::RemoveFromQueue(index) => return self.remove_from_queue(index),
            PlayerIntent::ClearQueue { retain_current } => self.clear_queue(retain_current),
            PlayerIntent::SetVolume(volume) => self.set_volume(volume),
            PlayerIntent::ToggleMute => self.toggle_mute(),
            PlayerIntent::SetPlaybackRate(rate) => return self.set_playback_rate(rate),
            PlayerIntent::SetSleepTimer(minutes) => self.set_sleep_timer(minutes),
            PlayerIntent::ResetHistory => return self.reset_history(),
        }
        Ok(())
    }

    // ===== Queue Intents =====

    /// Append an entry without starting playback
    ///
    /// Returns false if the identity is already queued.
    pub fn enqueue(&mut self, entry: QueueEntry) -> bool {
        let identity = entry.identity.clone();
        if !self.queue.enqueue(entry) {
            debug!("{} already queued", identity);
            return false;
        }
        self.emit_queue_changed();
        true
    }

    /// Make an entry current and play it from its resume position
    ///
    /// If the entry is already current and loaded, this only resumes it.
    pub fn play_now(&mut self, entry: QueueEntry) {
        let already_current = self
            .queue
            .current()
            .is_some_and(|current| current.identity == entry.identity);
        if already_current {
            match self.status {
                PlaybackStatus::Playing => return,
                PlaybackStatus::Paused => {
                    self.resume();
                    return;
                }
                PlaybackStatus::Stopped => {}
            }
        } else if self.queue.current().is_some() {
            self.save_progress();
        }

        let identity = entry.identity.clone();
        let queued_before = self.queue.len();
        self.queue.select_or_append(entry);
        if self.queue.len() != queued_before {
            self.emit_queue_changed();
        }

        let resume = self.resume_point(&identity);
        info!("Playing {} from {:.1}s", identity, resume);
        self.start_current(resume, true);
    }

    /// Play, pause, or start the queue
    pub fn toggle_play_pause(&mut self) {
        match self.status {
            PlaybackStatus::Playing => self.pause(),
            PlaybackStatus::Paused => self.resume(),
            PlaybackStatus::Stopped => {
                if self.queue.is_empty() {
                    debug!("Nothing to play");
                    return;
                }
                if self.queue.current().is_none() && self.queue.select(0).is_err() {
                    return;
                }
                let resume = self
                    .queue
                    .current()
                    .map(|entry| self.resume_point(&entry.identity))
                    .unwrap_or(0.0);
                self.start_current(resume, true);
            }
        }
    }

    /// Advance to the next entry (no-op at the end of the queue)
    pub fn skip_to_next(&mut self) {
        if !self.queue.has_next() {
            debug!("No next entry");
            return;
        }
        self.save_progress();
        self.advance();
    }

    /// Restart the current episode, or go back one entry near its start
    pub fn skip_to_previous(&mut self) {
        if self.queue.current().is_none() {
            return;
        }

        self.refresh_position();
        if self.position > self.config.restart_threshold_secs || !self.queue.has_previous() {
            self.seek_to(0.0);
            return;
        }

        self.save_progress();
        if self.queue.retreat().is_some() {
            self.emit_queue_changed();
            self.start_current(0.0, true);
        }
    }

    /// Jump to a queue index and play it from the start
    pub fn skip_to_index(&mut self, index: usize) -> Result<()> {
        if index >= self.queue.len() {
            warn!("Skip to {} rejected (queue length {})", index, self.queue.len());
            return Err(PlaybackError::IndexOutOfBounds {
                index,
                len: self.queue.len(),
            });
        }
        self.save_progress();
        self.queue.select(index)?;
        self.emit_queue_changed();
        self.start_current(0.0, true);
        Ok(())
    }

    /// Move a queue entry; the current entry stays current
    pub fn reorder(&mut self, from: usize, to: usize) -> Result<()> {
        if let Err(e) = self.queue.reorder(from, to) {
            warn!("Reorder {} -> {} rejected: {}", from, to, e);
            return Err(e);
        }
        self.emit_queue_changed();
        Ok(())
    }

    /// Remove a queue entry
    ///
    /// Removing the current entry moves on to whatever takes its place,
    /// keeping the play/pause state. Removing the last entry stops playback.
    pub fn remove_from_queue(&mut self, index: usize) -> Result<()> {
        let removal = match self.queue.remove(index) {
            Ok(removal) => removal,
            Err(e) => {
                warn!("Remove {} rejected: {}", index, e);
                return Err(e);
            }
        };
        debug!("Removed {} from queue", removal.entry.identity);
        self.emit_queue_changed();

        if !removal.was_current {
            return Ok(());
        }

        if self.queue.is_empty() {
            self.stop();
            return Ok(());
        }

        match self.status {
            PlaybackStatus::Stopped => {
                self.position = 0.0;
                self.duration = None;
                self.emit_episode_changed();
            }
            status => {
                let resume = self
                    .queue
                    .current()
                    .map(|entry| self.resume_point(&entry.identity))
                    .unwrap_or(0.0);
                self.start_current(resume, status == PlaybackStatus::Playing);
            }
        }
        Ok(())
    }

    /// Empty the queue, optionally keeping the current entry
    pub fn clear_queue(&mut self, retain_current: bool) {
        let had_current = self.queue.current().is_some();
        self.queue.clear(retain_current);
        self.emit_queue_changed();

        if !(retain_current && had_current) {
            self.stop();
        }
    }

    // ===== Transport Intents =====

    /// Seek forward, clamped to the duration
    pub fn skip_forward(&mut self, delta_seconds: f64) {
        self.refresh_position();
        self.seek_to(self.position + delta_seconds.abs());
    }

    /// Seek backward, clamped to zero
    pub fn skip_backward(&mut self, delta_seconds: f64) {
        self.refresh_position();
        self.seek_to(self.position - delta_seconds.abs());
    }

    /// Seek to an absolute position, clamped to `[0, duration]`
    pub fn seek_to(&mut self, seconds: f64) {
        if self.queue.current().is_none() || self.status == PlaybackStatus::Stopped {
            return;
        }
        if !seconds.is_finite() {
            return;
        }

        let target = self.clamp_position(seconds);
        self.position = target;
        self.engine.seek(target);
        self.emit_position_changed();
    }

    /// Seek to a fraction of the duration (ignored while it is unknown)
    pub fn seek_to_percent(&mut self, fraction: f64) {
        if let Some(duration) = self.duration {
            self.seek_to(duration * fraction.clamp(0.0, 1.0));
        }
    }

    /// Set the volume and persist it
    pub fn set_volume(&mut self, volume: f64) {
        self.volume.set(volume);
        self.engine.set_volume(self.volume.level());

        if let Err(e) = settings::set_volume(&*self.store, self.volume.level()) {
            warn!("Failed to persist volume: {e}");
        }
        self.emit_volume_changed();
    }

    /// Mute, or restore the pre-mute level
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.engine.set_volume(self.volume.level());
        self.emit_volume_changed();
    }

    /// Set the playback rate and persist it
    pub fn set_playback_rate(&mut self, rate: f64) -> Result<()> {
        let rate = PlaybackRate::try_from(rate).map_err(|e| {
            warn!("{e}");
            e
        })?;

        self.rate = rate;
        self.engine.set_rate(rate.value());
        if let Err(e) = settings::set_playback_rate(&*self.store, rate.value()) {
            warn!("Failed to persist playback rate: {e}");
        }
        self.pending.push(PlayerNotification::RateChanged { rate: rate.value() });
        Ok(())
    }

    /// Arm the sleep timer for `minutes`, or cancel it
    pub fn set_sleep_timer(&mut self, minutes: Option<u32>) {
        self.sleep.set(minutes, self.clock.now());
        match self.sleep.deadline() {
            Some(deadline) => info!("Sleep timer set for {}", deadline),
            None => debug!("Sleep timer cancelled"),
        }
        self.pending.push(PlayerNotification::SleepTimerChanged {
            deadline: self.sleep.deadline(),
        });
    }

    /// Forget all progress and completions
    pub fn reset_history(&mut self) -> Result<()> {
        self.history.reset()?;
        info!("Listening history reset");
        Ok(())
    }

    // ===== Engine Events =====

    /// Handle an event from the engine
    ///
    /// Events from any generation other than the current load are ignored,
    /// as is everything after the first terminal event of a generation.
    pub fn handle_engine_event(&mut self, event: EngineEvent) {
        if self.generation != Some(event.generation) {
            debug!("Ignoring {:?} from stale generation {}", event.kind, event.generation);
            return;
        }
        if self.settled == Some(event.generation) {
            debug!("Ignoring {:?} after terminal event", event.kind);
            return;
        }

        match event.kind {
            EngineEventKind::MetadataReady { duration_seconds } => {
                if duration_seconds.is_finite() && duration_seconds >= 0.0 {
                    self.duration = Some(duration_seconds);
                    self.position = self.clamp_position(self.position);
                    self.emit_position_changed();
                }
            }
            EngineEventKind::TimeAdvanced { position_seconds } => {
                if position_seconds.is_finite() {
                    self.position = self.clamp_position(position_seconds);
                    self.emit_position_changed();
                }
            }
            EngineEventKind::Ended => {
                self.save_progress();
                self.settled = Some(event.generation);
                self.on_ended();
            }
            EngineEventKind::PlaybackError { reason } => {
                self.settled = Some(event.generation);
                self.on_error(reason);
            }
        }
    }

    /// Drain and handle everything the engine has queued
    pub fn pump_engine_events(&mut self) {
        while let Some(event) = self.engine.poll_event() {
            self.handle_engine_event(event);
        }
    }

    fn on_ended(&mut self) {
        let Some(current) = self.queue.current().cloned() else {
            return;
        };
        info!("Finished {}", current.identity);

        match self.history.mark_completed(&current.identity) {
            Ok(true) => self.pending.push(PlayerNotification::EpisodeCompleted {
                identity: current.identity.clone(),
            }),
            Ok(false) => {}
            Err(e) => warn!("Failed to persist completion of {}: {e}", current.identity),
        }
        if self.queue.has_next() {
            self.advance();
        } else {
            self.status = PlaybackStatus::Stopped;
            self.position = 0.0;
            self.emit_state_changed();
            self.emit_position_changed();
        }
    }

    fn on_error(&mut self, reason: FailureReason) {
        warn!("Playback error: {reason}");
        self.last_error = Some(reason);

        let status = if self.queue.current().is_some() {
            PlaybackStatus::Paused
        } else {
            PlaybackStatus::Stopped
        };
        if self.status == PlaybackStatus::Playing {
            self.save_progress();
        }
        if self.status != status {
            self.status = status;
            self.emit_state_changed();
        }
        self.pending.push(PlayerNotification::Error {
            reason,
            message: reason.to_string(),
        });
    }

    // ===== Periodic Work =====

    /// Read the engine position while playing
    pub fn sample_position(&mut self) {
        if self.status != PlaybackStatus::Playing {
            return;
        }
        let (Some(generation), Some(position_seconds)) =
            (self.generation, self.engine.current_position())
        else {
            return;
        };
        self.handle_engine_event(EngineEvent::new(
            generation,
            EngineEventKind::TimeAdvanced { position_seconds },
        ));
    }

    /// Pause if the sleep deadline has passed
    ///
    /// Returns true if the timer fired.
    pub fn check_sleep_timer(&mut self) -> bool {
        if self.status != PlaybackStatus::Playing || !self.sleep.is_due(self.clock.now()) {
            return false;
        }

        info!("Sleep timer expired");
        self.sleep.clear();
        self.toggle_play_pause();
        self.pending.push(PlayerNotification::SleepTimerExpired);
        self.pending.push(PlayerNotification::SleepTimerChanged { deadline: None });
        true
    }

    /// Persist the current position as resume progress
    ///
    /// Uses the engine's position when it has one. A position below the
    /// minimum only updates an existing record; it never creates one.
    /// Returns true if a record was written (or at least updated in memory).
    pub fn save_progress(&mut self) -> bool {
        if self.status == PlaybackStatus::Stopped {
            return false;
        }
        let Some(identity) = self.queue.current().map(|e| e.identity.clone()) else {
            return false;
        };

        self.refresh_position();
        if self.position < self.config.min_progress_secs
            && self.history.progress_for(&identity).is_none()
        {
            return false;
        }

        if let Err(e) = self
            .history
            .record_progress(&identity, self.position, self.clock.now())
        {
            warn!("Failed to persist progress for {}: {e}", identity);
        }
        true
    }

    /// Save progress before the process exits
    pub fn shutdown(&mut self) {
        self.save_progress();
        self.engine.pause();
    }

    // ===== Queries =====

    /// Current status
    pub fn status(&self) -> PlaybackStatus {
        self.status
    }

    /// The queue
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Entry at the cursor
    pub fn current_entry(&self) -> Option<&QueueEntry> {
        self.queue.current()
    }

    /// Whether an entry follows the current one
    pub fn has_next(&self) -> bool {
        self.queue.has_next()
    }

    /// Whether an entry precedes the current one
    pub fn has_previous(&self) -> bool {
        self.queue.has_previous()
    }

    /// Position in the current episode
    pub fn position(&self) -> f64 {
        self.position
    }

    /// Duration of the current episode, once known
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    /// Volume state
    pub fn volume(&self) -> Volume {
        self.volume
    }

    /// Playback rate
    pub fn rate(&self) -> PlaybackRate {
        self.rate
    }

    /// Sleep deadline, if armed
    pub fn sleep_deadline(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.sleep.deadline()
    }

    /// Last engine failure
    pub fn last_error(&self) -> Option<FailureReason> {
        self.last_error
    }

    /// Listening history
    pub fn history(&self) -> &EpisodeHistory {
        &self.history
    }

    /// Configuration
    pub fn config(&self) -> &PlaybackConfig {
        &self.config
    }

    /// The engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The engine, mutably (for feeding output signals)
    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Read-only view of the state
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            status: self.status,
            queue: self.queue.entries().to_vec(),
            cursor: self.queue.cursor(),
            position_seconds: self.position,
            duration_seconds: self.duration,
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
            rate: self.rate.value(),
            sleep_deadline: self.sleep.deadline(),
            last_error: self.last_error,
        }
    }

    /// Take all pending notifications
    pub fn drain_notifications(&mut self) -> Vec<PlayerNotification> {
        std::mem::take(&mut self.pending)
    }

    // ===== Internal =====

    /// Where an episode starts: its saved position, or 0 once completed
    fn resume_point(&self, identity: &EpisodeIdentity) -> f64 {
        if self.history.is_completed(identity) {
            return 0.0;
        }
        self.history.resume_position(identity).unwrap_or(0.0)
    }

    fn advance(&mut self) {
        if self.queue.advance().is_some() {
            self.emit_queue_changed();
            self.start_current(0.0, true);
        }
    }

    fn pause(&mut self) {
        self.save_progress();
        self.engine.pause();
        self.status = PlaybackStatus::Paused;
        self.emit_state_changed();
    }

    fn resume(&mut self) {
        if let Some(reason) = self.last_error {
            if reason.requires_reload() {
                debug!("Reloading after {reason}");
                self.start_current(self.position, true);
                return;
            }
        }

        self.settled = None;
        match self.engine.play() {
            Ok(()) => {
                self.last_error = None;
                self.status = PlaybackStatus::Playing;
                self.emit_state_changed();
            }
            Err(reason) => {
                if let Some(generation) = self.generation {
                    self.settled = Some(generation);
                }
                self.on_error(reason);
            }
        }
    }

    fn stop(&mut self) {
        if self.status != PlaybackStatus::Stopped {
            self.save_progress();
        }
        self.engine.pause();
        self.generation = None;
        self.settled = None;
        self.position = 0.0;
        self.duration = None;
        if self.status != PlaybackStatus::Stopped {
            self.status = PlaybackStatus::Stopped;
            self.emit_state_changed();
        }
        self.emit_episode_changed();
    }

    fn start_current(&mut self, start_position: f64, autoplay: bool) {
        let Some(entry) = self.queue.current() else {
            return;
        };
        let uri = entry.media_uri.clone();

        self.position = start_position.max(0.0);
        self.duration = None;
        self.last_error = None;
        self.settled = None;
        self.status = if autoplay {
            PlaybackStatus::Playing
        } else {
            PlaybackStatus::Paused
        };
        self.generation = Some(self.engine.load(&uri, self.position, autoplay));

        self.emit_episode_changed();
        self.emit_state_changed();
        self.emit_position_changed();
    }

    fn refresh_position(&mut self) {
        if self.generation.is_none() || self.settled == self.generation {
            return;
        }
        if let Some(position) = self.engine.current_position() {
            if position.is_finite() {
                self.position = self.clamp_position(position);
            }
        }
    }

    fn clamp_position(&self, seconds: f64) -> f64 {
        let upper = self.duration.unwrap_or(f64::INFINITY);
        seconds.clamp(0.0, upper)
    }

    fn emit_state_changed(&mut self) {
        self.pending.push(PlayerNotification::StateChanged {
            status: self.status,
        });
    }

    fn emit_episode_changed(&mut self) {
        self.pending.push(PlayerNotification::EpisodeChanged {
            identity: self.queue.current().map(|e| e.identity.clone()),
        });
    }

    fn emit_queue_changed(&mut self) {
        self.pending.push(PlayerNotification::QueueChanged {
            length: self.queue.len(),
            cursor: self.queue.cursor(),
        });
    }

    fn emit_position_changed(&mut self) {
        self.pending.push(PlayerNotification::PositionChanged {
            position_seconds: self.position,
            duration_seconds: self.duration,
        });
    }

    fn emit_volume_changed(&mut self) {
        self.pending.push(PlayerNotification::VolumeChanged {
            volume: self.volume.level(),
            muted: self.volume.is_muted(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::engine::MockEngine;
    use mockall::Sequence;
    use pod_storage::MemoryStore;

    fn entry(n: u32) -> QueueEntry {
        QueueEntry::new(
            EpisodeIdentity::new("show", 1, n),
            "Show",
            "Season 1",
            format!("Episode {n}"),
            format!("ep{n}.mp3"),
        )
    }

    fn mock_engine() -> MockEngine {
        let mut engine = MockEngine::new();
        engine.expect_set_volume().return_const(());
        engine.expect_set_rate().return_const(());
        engine.expect_current_position().return_const(None);
        engine
    }

    fn manager(engine: MockEngine) -> PlaybackManager<MockEngine> {
        PlaybackManager::new(
            engine,
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::default()),
            PlaybackConfig::default(),
        )
    }

    #[test]
    fn ended_loads_next_from_start() {
        let mut engine = mock_engine();
        let mut seq = Sequence::new();
        engine
            .expect_load()
            .withf(|uri, start, autoplay| uri == "ep1.mp3" && *start == 0.0 && *autoplay)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Generation::new(1));
        engine
            .expect_load()
            .withf(|uri, start, autoplay| uri == "ep2.mp3" && *start == 0.0 && *autoplay)
            .times(1)
            .in_sequence(&mut seq)
            .return_const(Generation::new(2));

        let mut manager = manager(engine);
        manager.play_now(entry(1));
        manager.enqueue(entry(2));

        manager.handle_engine_event(EngineEvent::new(Generation::new(1), EngineEventKind::Ended));

        assert_eq!(manager.queue().cursor(), Some(1));
        assert_eq!(manager.status(), PlaybackStatus::Playing);
        assert_eq!(manager.position(), 0.0);
        assert!(manager.history().is_completed(&entry(1).identity));
    }

    #[test]
    fn error_pauses_without_retry() {
        let mut engine = mock_engine();
        engine
            .expect_load()
            .times(1)
            .return_const(Generation::new(1));

        let mut manager = manager(engine);
        manager.play_now(entry(1));
        manager.enqueue(entry(2));

        manager.handle_engine_event(EngineEvent::new(
            Generation::new(1),
            EngineEventKind::PlaybackError {
                reason: FailureReason::Network,
            },
        ));
        manager.handle_engine_event(EngineEvent::new(Generation::new(1), EngineEventKind::Ended));

        assert_eq!(manager.status(), PlaybackStatus::Paused);
        assert_eq!(manager.queue().cursor(), Some(0));
        assert_eq!(manager.last_error(), Some(FailureReason::Network));
        assert!(!manager.history().is_completed(&entry(1).identity));
    }

    #[test]
    fn toggle_calls_pause_then_play() {
        let mut engine = mock_engine();
        engine.expect_load().return_const(Generation::new(1));
        let mut seq = Sequence::new();
        engine
            .expect_pause()
            .times(1)
            .in_sequence(&mut seq)
            .return_const(());
        engine
            .expect_play()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));

        let mut manager = manager(engine);
        manager.play_now(entry(1));

        manager.toggle_play_pause();
        assert_eq!(manager.status(), PlaybackStatus::Paused);

        manager.toggle_play_pause();
        assert_eq!(manager.status(), PlaybackStatus::Playing);
    }

    #[test]
    fn refused_play_stays_paused() {
        let mut engine = mock_engine();
        engine.expect_load().return_const(Generation::new(1));
        engine.expect_pause().return_const(());
        engine
            .expect_play()
            .times(1)
            .returning(|| Err(FailureReason::Blocked));

        let mut manager = manager(engine);
        manager.play_now(entry(1));
        manager.toggle_play_pause();
        manager.drain_notifications();

        manager.toggle_play_pause();
        assert_eq!(manager.status(), PlaybackStatus::Paused);
        assert_eq!(manager.last_error(), Some(FailureReason::Blocked));
        assert!(manager
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, PlayerNotification::Error { reason: FailureReason::Blocked, .. })));
    }

    #[test]
    fn unsupported_rate_never_reaches_engine() {
        let mut engine = MockEngine::new();
        engine.expect_set_volume().return_const(());
        engine.expect_set_rate().times(1).return_const(());

        let mut manager = manager(engine);
        assert!(matches!(
            manager.set_playback_rate(1.1),
            Err(PlaybackError::InvalidRate(_))
        ));
        assert_eq!(manager.rate(), PlaybackRate::NORMAL);
    }

    #[test]
    fn enqueue_never_touches_engine() {
        let mut engine = mock_engine();
        engine.expect_load().never();
        engine.expect_play().never();

        let mut manager = manager(engine);
        assert!(manager.enqueue(entry(1)));
        assert_eq!(manager.queue().cursor(), Some(0));
        assert_eq!(manager.status(), PlaybackStatus::Stopped);
    }
}
