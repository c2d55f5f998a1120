//! Engine boundary
//!
//! [`Engine`] is what the playback manager drives. [`PlaybackEngine`] is the
//! standard implementation: it wraps an opaque [`AudioOutput`], tags every
//! load with a [`Generation`], and turns raw output signals into
//! [`EngineEvent`]s. Signals that arrive for an abandoned load are dropped
//! here, before the manager ever sees them.

use crate::error::FailureReason;
use crate::events::{EngineEvent, EngineEventKind, Generation};
use std::collections::VecDeque;
use tracing::{debug, trace, warn};

/// Media engine driven by the playback manager
#[cfg_attr(test, mockall::automock)]
pub trait Engine: Send {
    /// Replace the current source and start a new generation
    ///
    /// With `autoplay`, playback starts as soon as the source can play. An
    /// empty URI emits `PlaybackError { MissingSource }` instead.
    fn load(&mut self, media_uri: &str, start_position: f64, autoplay: bool) -> Generation;

    /// Start or resume playback
    fn play(&mut self) -> Result<(), FailureReason>;

    /// Pause playback (idempotent)
    fn pause(&mut self);

    /// Seek within the current source
    fn seek(&mut self, position_seconds: f64);

    /// Set output volume in [0, 1]
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate
    fn set_rate(&mut self, rate: f64);

    /// Authoritative position, if a source is ready
    fn current_position(&self) -> Option<f64>;

    /// Generation of the most recent load
    fn generation(&self) -> Generation;

    /// Take the next pending event
    fn poll_event(&mut self) -> Option<EngineEvent>;
}

/// Raw signal from an audio output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputSignal {
    /// Duration known
    MetadataLoaded { duration_seconds: f64 },

    /// Enough data buffered to start
    CanPlay,

    /// Coarse native position update
    TimeUpdate { position_seconds: f64 },

    /// Reached the end
    Ended,

    /// Output failed
    Failed { reason: FailureReason },
}

/// Opaque audio device
///
/// Implementations report [`OutputSignal`]s out of band, tagged with the
/// generation passed to `set_source`, and the owner feeds them back through
/// [`PlaybackEngine::handle_signal`].
pub trait AudioOutput: Send {
    /// Point the output at a new source
    fn set_source(&mut self, media_uri: &str, generation: Generation);

    /// Drop the current source
    fn clear_source(&mut self);

    /// Start producing sound
    fn start(&mut self) -> Result<(), FailureReason>;

    /// Stop producing sound, keeping the position
    fn pause(&mut self);

    /// Move to a position
    fn seek(&mut self, position_seconds: f64);

    /// Set volume in [0, 1]
    fn set_volume(&mut self, volume: f64);

    /// Set playback rate
    fn set_rate(&mut self, rate: f64);

    /// Current position, if the output can report one
    fn position(&self) -> Option<f64>;
}

/// [`Engine`] over an [`AudioOutput`]
pub struct PlaybackEngine<O: AudioOutput> {
    output: O,
    generation: Generation,
    has_source: bool,
    metadata_loaded: bool,
    ready: bool,
    playing: bool,
    pending_autoplay: bool,
    pending_seek: Option<f64>,
    native_position: Option<f64>,
    events: VecDeque<EngineEvent>,
}

impl<O: AudioOutput> PlaybackEngine<O> {
    /// Wrap an output
    pub fn new(output: O) -> Self {
        Self {
            output,
            generation: Generation::default(),
            has_source: false,
            metadata_loaded: false,
            ready: false,
            playing: false,
            pending_autoplay: false,
            pending_seek: None,
            native_position: None,
            events: VecDeque::new(),
        }
    }

    /// The wrapped output
    pub fn output(&self) -> &O {
        &self.output
    }

    /// The wrapped output, mutably
    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    /// Whether the output is producing sound
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Feed a raw output signal
    ///
    /// Signals tagged with anything other than the current generation are
    /// dropped.
    pub fn handle_signal(&mut self, generation: Generation, signal: OutputSignal) {
        if generation != self.generation {
            debug!(
                "Dropping {:?} from stale generation {} (current {})",
                signal, generation, self.generation
            );
            return;
        }

        match signal {
            OutputSignal::MetadataLoaded { duration_seconds } => {
                self.metadata_loaded = true;
                if let Some(position) = self.pending_seek.take() {
                    self.output.seek(position);
                }
                self.emit(EngineEventKind::MetadataReady { duration_seconds });
            }
            OutputSignal::CanPlay => {
                self.ready = true;
                if self.pending_autoplay {
                    self.pending_autoplay = false;
                    self.start_output();
                }
            }
            OutputSignal::TimeUpdate { position_seconds } => {
                trace!("Native position {position_seconds:.2}s");
                self.native_position = Some(position_seconds);
            }
            OutputSignal::Ended => {
                self.playing = false;
                self.emit(EngineEventKind::Ended);
            }
            OutputSignal::Failed { reason } => {
                self.playing = false;
                self.pending_autoplay = false;
                self.emit(EngineEventKind::PlaybackError { reason });
            }
        }
    }

    fn start_output(&mut self) {
        match self.output.start() {
            Ok(()) => self.playing = true,
            Err(reason) => {
                warn!("Deferred start failed: {reason}");
                self.emit(EngineEventKind::PlaybackError { reason });
            }
        }
    }

    fn emit(&mut self, kind: EngineEventKind) {
        self.events.push_back(EngineEvent::new(self.generation, kind));
    }
}

impl<O: AudioOutput> Engine for PlaybackEngine<O> {
    fn load(&mut self, media_uri: &str, start_position: f64, autoplay: bool) -> Generation {
        self.generation = self.generation.next();
        self.metadata_loaded = false;
        self.ready = false;
        self.playing = false;
        self.pending_autoplay = false;
        self.pending_seek = None;
        self.native_position = None;

        if media_uri.trim().is_empty() {
            warn!("Load {} has no media source", self.generation);
            self.output.pause();
            self.output.clear_source();
            self.has_source = false;
            self.emit(EngineEventKind::PlaybackError {
                reason: FailureReason::MissingSource,
            });
            return self.generation;
        }

        debug!("Loading {} as {}", media_uri, self.generation);
        self.output.set_source(media_uri, self.generation);
        self.has_source = true;
        self.pending_autoplay = autoplay;
        if start_position > 0.0 && start_position.is_finite() {
            self.pending_seek = Some(start_position);
        }

        self.generation
    }

    fn play(&mut self) -> Result<(), FailureReason> {
        if !self.has_source {
            return Err(FailureReason::MissingSource);
        }
        if self.playing {
            return Ok(());
        }
        if !self.ready {
            self.pending_autoplay = true;
            return Ok(());
        }

        self.output.start()?;
        self.playing = true;
        Ok(())
    }

    fn pause(&mut self) {
        self.pending_autoplay = false;
        self.playing = false;
        self.output.pause();
    }

    fn seek(&mut self, position_seconds: f64) {
        if !self.has_source {
            return;
        }
        if self.metadata_loaded {
            self.output.seek(position_seconds);
        } else {
            self.pending_seek = Some(position_seconds);
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.output.set_volume(volume);
    }

    fn set_rate(&mut self, rate: f64) {
        self.output.set_rate(rate);
    }

    fn current_position(&self) -> Option<f64> {
        if !self.has_source || !self.metadata_loaded {
            return None;
        }
        self.output.position().or(self.native_position)
    }

    fn generation(&self) -> Generation {
        self.generation
    }

    fn poll_event(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeOutput {
        source: Option<(String, Generation)>,
        started: u32,
        paused: u32,
        seeks: Vec<f64>,
        position: Option<f64>,
        start_result: Option<FailureReason>,
    }

    impl AudioOutput for FakeOutput {
        fn set_source(&mut self, media_uri: &str, generation: Generation) {
            self.source = Some((media_uri.to_string(), generation));
        }
        fn clear_source(&mut self) {
            self.source = None;
        }
        fn start(&mut self) -> Result<(), FailureReason> {
            match self.start_result {
                Some(reason) => Err(reason),
                None => {
                    self.started += 1;
                    Ok(())
                }
            }
        }
        fn pause(&mut self) {
            self.paused += 1;
        }
        fn seek(&mut self, position_seconds: f64) {
            self.seeks.push(position_seconds);
        }
        fn set_volume(&mut self, _volume: f64) {}
        fn set_rate(&mut self, _rate: f64) {}
        fn position(&self) -> Option<f64> {
            self.position
        }
    }

    fn drain(engine: &mut PlaybackEngine<FakeOutput>) -> Vec<EngineEvent> {
        std::iter::from_fn(|| engine.poll_event()).collect()
    }

    #[test]
    fn autoplay_waits_for_can_play() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let generation = engine.load("a.mp3", 0.0, true);
        assert_eq!(engine.output().started, 0);

        engine.handle_signal(generation, OutputSignal::CanPlay);
        assert_eq!(engine.output().started, 1);
        assert!(engine.is_playing());
    }

    #[test]
    fn start_position_applied_after_metadata() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let generation = engine.load("a.mp3", 42.0, false);
        assert!(engine.output().seeks.is_empty());

        engine.handle_signal(
            generation,
            OutputSignal::MetadataLoaded {
                duration_seconds: 600.0,
            },
        );
        assert_eq!(engine.output().seeks, vec![42.0]);
        assert_eq!(
            drain(&mut engine),
            vec![EngineEvent::new(
                generation,
                EngineEventKind::MetadataReady {
                    duration_seconds: 600.0
                }
            )]
        );
    }

    #[test]
    fn stale_signals_are_dropped() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let first = engine.load("a.mp3", 0.0, true);
        let second = engine.load("b.mp3", 0.0, true);
        assert_ne!(first, second);

        engine.handle_signal(first, OutputSignal::Ended);
        engine.handle_signal(first, OutputSignal::CanPlay);
        assert!(drain(&mut engine).is_empty());
        assert_eq!(engine.output().started, 0);

        engine.handle_signal(second, OutputSignal::Ended);
        assert_eq!(drain(&mut engine).len(), 1);
    }

    #[test]
    fn empty_uri_reports_missing_source() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let generation = engine.load("  ", 0.0, true);

        assert!(engine.output().source.is_none());
        assert_eq!(
            drain(&mut engine),
            vec![EngineEvent::new(
                generation,
                EngineEventKind::PlaybackError {
                    reason: FailureReason::MissingSource
                }
            )]
        );
        assert_eq!(engine.play(), Err(FailureReason::MissingSource));
    }

    #[test]
    fn blocked_autoplay_becomes_event() {
        let mut engine = PlaybackEngine::new(FakeOutput {
            start_result: Some(FailureReason::Blocked),
            ..FakeOutput::default()
        });
        let generation = engine.load("a.mp3", 0.0, true);
        engine.handle_signal(generation, OutputSignal::CanPlay);

        assert!(!engine.is_playing());
        assert_eq!(
            drain(&mut engine),
            vec![EngineEvent::new(
                generation,
                EngineEventKind::PlaybackError {
                    reason: FailureReason::Blocked
                }
            )]
        );
    }

    #[test]
    fn play_before_ready_is_deferred() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let generation = engine.load("a.mp3", 0.0, false);
        assert_eq!(engine.play(), Ok(()));
        assert_eq!(engine.output().started, 0);

        engine.handle_signal(generation, OutputSignal::CanPlay);
        assert_eq!(engine.output().started, 1);
    }

    #[test]
    fn pause_cancels_pending_autoplay() {
        let mut engine = PlaybackEngine::new(FakeOutput::default());
        let generation = engine.load("a.mp3", 0.0, true);
        engine.pause();
        engine.handle_signal(generation, OutputSignal::CanPlay);
        assert_eq!(engine.output().started, 0);
    }

    #[test]
    fn position_needs_metadata() {
        let mut engine = PlaybackEngine::new(FakeOutput {
            position: Some(12.5),
            ..FakeOutput::default()
        });
        let generation = engine.load("a.mp3", 0.0, false);
        assert_eq!(engine.current_position(), None);

        engine.handle_signal(
            generation,
            OutputSignal::MetadataLoaded {
                duration_seconds: 100.0,
            },
        );
        assert_eq!(engine.current_position(), Some(12.5));
    }
}
