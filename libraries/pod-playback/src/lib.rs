//! Pod Player playback
//!
//! Queue and playback state for an episodic audio player:
//! - Ordered queue of unique episodes with a cursor
//! - Play / pause / skip / seek / rate / volume / mute / sleep timer
//! - Resume progress and completion tracking through `pod-storage`
//! - Generation-tagged engine loads so late events from a previous episode
//!   can never act on the current one
//!
//! [`PlaybackManager`] is a synchronous state machine; [`PlayerService`]
//! runs one on a tokio task and drives its timers.
//!
//! # Example
//!
//! ```rust,no_run
//! use pod_playback::{
//!     PlaybackConfig, PlaybackEngine, PlaybackManager, PlayerIntent, PlayerService,
//!     SimulatedOutput, SystemClock,
//! };
//! use pod_storage::MemoryStore;
//! use std::sync::Arc;
//!
//! # async fn run() -> pod_playback::Result<()> {
//! let (output, signals) = SimulatedOutput::new(1800.0);
//! let manager = PlaybackManager::new(
//!     PlaybackEngine::new(output),
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//!     PlaybackConfig::default(),
//! );
//!
//! let (player, task) = PlayerService::spawn(manager, signals);
//! player.send(PlayerIntent::SetVolume(0.5)).await?;
//! player.shutdown().await?;
//! let _ = task.await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod manager;
pub mod queue;
pub mod service;
pub mod simulated;
pub mod sleep;
pub mod types;
pub mod volume;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{AudioOutput, Engine, OutputSignal, PlaybackEngine};
pub use error::{FailureReason, PlaybackError, Result};
pub use events::{EngineEvent, EngineEventKind, Generation, PlayerNotification};
pub use manager::{PlaybackManager, PlayerIntent};
pub use queue::{Queue, Removal};
pub use service::{PlayerCommand, PlayerHandle, PlayerService};
pub use simulated::{SignalReceiver, SignalSender, SimulatedOutput};
pub use sleep::SleepTimer;
pub use types::{PlaybackConfig, PlaybackRate, PlaybackSnapshot, PlaybackStatus, ALLOWED_RATES};
pub use volume::Volume;
