//! Player service
//!
//! Runs a [`PlaybackManager`] on a tokio task. Intents arrive over a command
//! channel, output signals over the signal channel, and the periodic work
//! (position sampling, sleep checks, progress saves) runs on intervals that
//! are only polled while playing. Everything is handled on the one task, so
//! transitions never interleave.

use crate::engine::{AudioOutput, PlaybackEngine};
use crate::error::{PlaybackError, Result};
use crate::events::PlayerNotification;
use crate::manager::{PlaybackManager, PlayerIntent};
use crate::simulated::SignalReceiver;
use crate::types::{PlaybackSnapshot, PlaybackStatus};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 64;
const NOTIFICATION_BUFFER: usize = 256;

/// Message to the player task
#[derive(Debug)]
pub enum PlayerCommand {
    /// Apply a user intent
    Intent(PlayerIntent),

    /// Reply with a snapshot of the state
    Snapshot(oneshot::Sender<PlaybackSnapshot>),

    /// Save progress and stop the task
    Shutdown,
}

/// Cloneable handle to a running player
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<PlayerCommand>,
    notifications: broadcast::Sender<PlayerNotification>,
}

impl PlayerHandle {
    /// Send an intent
    pub async fn send(&self, intent: PlayerIntent) -> Result<()> {
        self.commands
            .send(PlayerCommand::Intent(intent))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Current state
    pub async fn snapshot(&self) -> Result<PlaybackSnapshot> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(PlayerCommand::Snapshot(tx))
            .await
            .map_err(|_| PlaybackError::ServiceClosed)?;
        rx.await.map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<PlayerNotification> {
        self.notifications.subscribe()
    }

    /// Ask the task to save progress and exit
    pub async fn shutdown(&self) -> Result<()> {
        self.commands
            .send(PlayerCommand::Shutdown)
            .await
            .map_err(|_| PlaybackError::ServiceClosed)
    }
}

/// Player task
pub struct PlayerService<O: AudioOutput> {
    manager: PlaybackManager<PlaybackEngine<O>>,
    commands: mpsc::Receiver<PlayerCommand>,
    signals: SignalReceiver,
    notifications: broadcast::Sender<PlayerNotification>,
}

impl<O: AudioOutput + 'static> PlayerService<O> {
    /// Spawn the task
    pub fn spawn(
        manager: PlaybackManager<PlaybackEngine<O>>,
        signals: SignalReceiver,
    ) -> (PlayerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (notification_tx, _) = broadcast::channel(NOTIFICATION_BUFFER);

        let service = Self {
            manager,
            commands: command_rx,
            signals,
            notifications: notification_tx.clone(),
        };
        let task = tokio::spawn(service.run());

        let handle = PlayerHandle {
            commands: command_tx,
            notifications: notification_tx,
        };
        (handle, task)
    }

    async fn run(mut self) {
        let config = self.manager.config().clone();
        let mut frame = ticker(config.frame_interval_ms);
        let mut sleep_check = ticker(config.sleep_check_interval_ms);
        let mut progress = ticker(config.progress_save_interval_ms);
        let mut was_playing = false;

        info!("Player started");

        loop {
            let playing = self.manager.status() == PlaybackStatus::Playing;
            if playing && !was_playing {
                frame.reset();
                sleep_check.reset();
                progress.reset();
            }
            was_playing = playing;
            let sleep_armed = playing && self.manager.sleep_deadline().is_some();

            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(PlayerCommand::Intent(intent)) => {
                        debug!("Intent: {:?}", intent);
                        if let Err(e) = self.manager.apply(intent) {
                            warn!("Intent rejected: {e}");
                        }
                    }
                    Some(PlayerCommand::Snapshot(reply)) => {
                        let _ = reply.send(self.manager.snapshot());
                    }
                    Some(PlayerCommand::Shutdown) | None => break,
                },

                Some((generation, signal)) = self.signals.recv() => {
                    self.manager.engine_mut().handle_signal(generation, signal);
                }

                _ = frame.tick(), if playing => {
                    self.manager.sample_position();
                }

                _ = sleep_check.tick(), if sleep_armed => {
                    self.manager.check_sleep_timer();
                }

                _ = progress.tick(), if playing => {
                    self.manager.save_progress();
                }
            }

            self.manager.pump_engine_events();
            self.publish();
        }

        self.manager.shutdown();
        self.publish();
        info!("Player stopped");
    }

    fn publish(&mut self) {
        for notification in self.manager.drain_notifications() {
            // No subscribers is fine
            let _ = self.notifications.send(notification);
        }
    }
}

fn ticker(period_ms: u64) -> Interval {
    let mut ticker = interval(Duration::from_millis(period_ms.max(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
