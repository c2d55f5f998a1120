//! Pod Player Core
//!
//! Platform-agnostic core types, traits, and error handling for Pod Player.
//!
//! This crate provides the building blocks shared by storage and playback:
//! - **Episode identity**: the `(show, season, episode)` triple and its
//!   stable string key used by every persisted map and set
//! - **Entries**: `QueueEntry` (what the queue holds) and `FavoriteEntry`
//!   (what the favorites ledger holds)
//! - **Catalog boundary**: `Show`/`Season`/`CatalogEpisode` and the
//!   `Catalog` trait implemented by the content client
//!
//! # Example
//!
//! ```rust
//! use pod_core::types::{EpisodeIdentity, QueueEntry};
//!
//! let identity = EpisodeIdentity::new("show-42", 1, 3);
//! assert_eq!(identity.key(), "show-42_s1_e3");
//!
//! let entry = QueueEntry::new(
//!     identity.clone(),
//!     "The Show",
//!     "Season One",
//!     "Episode Three",
//!     "https://cdn.example.com/ep3.mp3",
//! );
//! assert_eq!(entry.identity, identity);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

pub use error::{CoreError, Result};
pub use traits::Catalog;
pub use types::{
    CatalogEpisode, EpisodeIdentity, EpisodeSnapshot, FavoriteEntry, QueueEntry, Season, Show,
};
