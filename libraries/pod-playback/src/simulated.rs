//! Simulated audio output
//!
//! Plays nothing; advances a virtual playhead on the tokio clock and reports
//! signals the way a real device would. URI conventions:
//!
//! - `?duration=SECS` sets the media length (otherwise the default)
//! - `blocked:` refuses the first start with `Blocked`
//! - `broken:` fails to decode
//! - `offline:` fails to fetch

use crate::engine::{AudioOutput, OutputSignal};
use crate::error::FailureReason;
use crate::events::Generation;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Sending half of an output signal channel
pub type SignalSender = mpsc::UnboundedSender<(Generation, OutputSignal)>;

/// Receiving half of an output signal channel
pub type SignalReceiver = mpsc::UnboundedReceiver<(Generation, OutputSignal)>;

#[derive(Debug)]
struct Source {
    generation: Generation,
    duration: f64,
    refuse_start: Option<FailureReason>,
}

/// Audio output that only keeps time
#[derive(Debug)]
pub struct SimulatedOutput {
    signals: SignalSender,
    default_duration: f64,
    source: Option<Source>,
    volume: f64,
    rate: f64,
    base_position: f64,
    started_at: Option<Instant>,
    epoch: Arc<AtomicU64>,
}

impl SimulatedOutput {
    /// Create an output and the channel its signals arrive on
    pub fn new(default_duration_seconds: f64) -> (Self, SignalReceiver) {
        let (signals, receiver) = mpsc::unbounded_channel();
        let output = Self {
            signals,
            default_duration: default_duration_seconds.max(0.0),
            source: None,
            volume: 1.0,
            rate: 1.0,
            base_position: 0.0,
            started_at: None,
            epoch: Arc::new(AtomicU64::new(0)),
        };
        (output, receiver)
    }

    /// Current volume
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Current rate
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Whether the playhead is moving
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    fn playhead(&self) -> f64 {
        let duration = self.source.as_ref().map_or(0.0, |s| s.duration);
        let elapsed = self
            .started_at
            .map_or(0.0, |started| started.elapsed().as_secs_f64() * self.rate);
        (self.base_position + elapsed).min(duration)
    }

    fn send(&self, generation: Generation, signal: OutputSignal) {
        if self.signals.send((generation, signal)).is_err() {
            debug!("Signal receiver dropped");
        }
    }

    fn cancel_end_timer(&self) -> u64 {
        self.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn arm_end_timer(&self) {
        let Some(source) = &self.source else {
            return;
        };
        let epoch = self.cancel_end_timer();

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime; end of media will not be reported");
            return;
        };

        let remaining = ((source.duration - self.base_position) / self.rate).max(0.0);
        let generation = source.generation;
        let current_epoch = Arc::clone(&self.epoch);
        let signals = self.signals.clone();

        runtime.spawn(async move {
            tokio::time::sleep(Duration::from_secs_f64(remaining)).await;
            if current_epoch.load(Ordering::SeqCst) == epoch {
                let _ = signals.send((generation, OutputSignal::Ended));
            }
        });
    }
}

fn duration_param(uri: &str) -> Option<f64> {
    let (_, query) = uri.split_once('?')?;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "duration")
        .and_then(|(_, value)| value.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d >= 0.0)
}

impl AudioOutput for SimulatedOutput {
    fn set_source(&mut self, media_uri: &str, generation: Generation) {
        self.cancel_end_timer();
        self.started_at = None;
        self.base_position = 0.0;

        let failure = if media_uri.starts_with("broken:") {
            Some(FailureReason::Decode)
        } else if media_uri.starts_with("offline:") {
            Some(FailureReason::Network)
        } else {
            None
        };

        self.source = Some(Source {
            generation,
            duration: duration_param(media_uri).unwrap_or(self.default_duration),
            refuse_start: failure.or_else(|| {
                media_uri
                    .starts_with("blocked:")
                    .then_some(FailureReason::Blocked)
            }),
        });

        if let Some(reason) = failure {
            self.send(generation, OutputSignal::Failed { reason });
            return;
        }

        let duration_seconds = self.source.as_ref().map_or(0.0, |s| s.duration);
        self.send(generation, OutputSignal::MetadataLoaded { duration_seconds });
        self.send(generation, OutputSignal::CanPlay);
    }

    fn clear_source(&mut self) {
        self.cancel_end_timer();
        self.source = None;
        self.started_at = None;
        self.base_position = 0.0;
    }

    fn start(&mut self) -> Result<(), FailureReason> {
        let Some(source) = self.source.as_mut() else {
            return Err(FailureReason::MissingSource);
        };
        match source.refuse_start {
            Some(FailureReason::Blocked) => {
                // Only autonomous starts are refused
                source.refuse_start = None;
                return Err(FailureReason::Blocked);
            }
            Some(reason) => return Err(reason),
            None => {}
        }

        if self.started_at.is_none() {
            self.started_at = Some(Instant::now());
            self.arm_end_timer();
        }
        Ok(())
    }

    fn pause(&mut self) {
        if self.started_at.is_some() {
            self.base_position = self.playhead();
            self.started_at = None;
        }
        self.cancel_end_timer();
    }

    fn seek(&mut self, position_seconds: f64) {
        let duration = self.source.as_ref().map_or(0.0, |s| s.duration);
        self.base_position = position_seconds.clamp(0.0, duration);
        if self.started_at.is_some() {
            self.started_at = Some(Instant::now());
            self.arm_end_timer();
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume;
    }

    fn set_rate(&mut self, rate: f64) {
        if rate <= 0.0 || !rate.is_finite() {
            return;
        }
        let running = self.started_at.is_some();
        if running {
            self.base_position = self.playhead();
            self.started_at = Some(Instant::now());
        }
        self.rate = rate;
        if running {
            self.arm_end_timer();
        }
    }

    fn position(&self) -> Option<f64> {
        self.source.as_ref().map(|_| self.playhead())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_duration() {
        assert_eq!(duration_param("sim://a?duration=90"), Some(90.0));
        assert_eq!(duration_param("sim://a?x=1&duration=2.5"), Some(2.5));
        assert_eq!(duration_param("sim://a"), None);
        assert_eq!(duration_param("sim://a?duration=-1"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn reports_metadata_then_end() {
        let (mut output, mut signals) = SimulatedOutput::new(60.0);
        let generation = Generation::new(1);
        output.set_source("sim://a?duration=5", generation);

        assert_eq!(
            signals.recv().await,
            Some((
                generation,
                OutputSignal::MetadataLoaded {
                    duration_seconds: 5.0
                }
            ))
        );
        assert_eq!(
            signals.recv().await,
            Some((generation, OutputSignal::CanPlay))
        );

        output.start().unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;
        assert!((output.position().unwrap() - 2.0).abs() < 0.01);

        assert_eq!(
            signals.recv().await,
            Some((generation, OutputSignal::Ended))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pause_cancels_end() {
        let (mut output, mut signals) = SimulatedOutput::new(3.0);
        output.set_source("sim://a", Generation::new(1));
        let _ = signals.recv().await;
        let _ = signals.recv().await;

        output.start().unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        output.pause();
        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(signals.try_recv().is_err());
        assert!((output.position().unwrap() - 1.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn blocked_refuses_first_start_only() {
        let (mut output, _signals) = SimulatedOutput::new(3.0);
        output.set_source("blocked:sim://a", Generation::new(1));
        assert_eq!(output.start(), Err(FailureReason::Blocked));
        assert_eq!(output.start(), Ok(()));
    }

    #[tokio::test]
    async fn broken_source_fails() {
        let (mut output, mut signals) = SimulatedOutput::new(3.0);
        output.set_source("broken:sim://a", Generation::new(4));
        assert_eq!(
            signals.recv().await,
            Some((
                Generation::new(4),
                OutputSignal::Failed {
                    reason: FailureReason::Decode
                }
            ))
        );
    }
}
