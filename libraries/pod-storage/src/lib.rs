//! Pod Player Storage
//!
//! Key-value persistence for everything Pod Player keeps across restarts.
//!
//! # Architecture
//!
//! - **Backend**: a [`PreferenceStore`] maps logical keys to JSON values.
//!   [`RedbStore`] is the durable embedded implementation, [`MemoryStore`]
//!   the ephemeral one used by tests.
//! - **Vertical slices**: each feature owns its keys and its typed access:
//!   - [`settings`]: volume and playback rate
//!   - [`history`]: per-episode resume positions and the completion set
//!   - [`favorites`]: the favorites ledger
//!
//! Slices keep an in-memory copy that stays authoritative for the session;
//! a failed write is reported to the caller and the next successful write
//! supersedes it.
//!
//! # Example
//!
//! ```rust
//! use pod_storage::{history::EpisodeHistory, settings, MemoryStore};
//! use pod_core::types::EpisodeIdentity;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! settings::set_volume(&*store, 0.6).unwrap();
//! assert_eq!(settings::get_volume(&*store).unwrap(), Some(0.6));
//!
//! let mut history = EpisodeHistory::load(store.clone());
//! let id = EpisodeIdentity::new("show", 1, 1);
//! history.record_progress(&id, 42.0, chrono::Utc::now()).unwrap();
//! assert_eq!(history.resume_position(&id), Some(42.0));
//! ```

mod error;
mod redb_store;
mod store;

// Vertical slices
pub mod favorites;
pub mod history;
pub mod settings;

pub use error::{Result, StorageError};
pub use redb_store::RedbStore;
pub use store::{MemoryStore, PreferenceStore};
