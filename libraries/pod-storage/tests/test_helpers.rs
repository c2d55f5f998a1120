//! Test helpers and fixtures for storage integration tests
//!
//! These helpers create REAL redb files in a temp directory (not the memory
//! store) so reopen-after-restart behavior is exercised.

#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use pod_core::types::{EpisodeIdentity, EpisodeSnapshot, FavoriteEntry};
use pod_storage::RedbStore;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

/// Test database wrapper that cleans up on drop
pub struct TestDb {
    pub path: PathBuf,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new empty database location
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("prefs").join("pod.redb");
        Self {
            path,
            _temp_dir: temp_dir,
        }
    }

    /// Open the store (simulates a process start)
    pub fn open(&self) -> Arc<RedbStore> {
        Arc::new(RedbStore::open(&self.path).expect("Failed to open store"))
    }
}

/// Test fixture: a favorite entry
pub fn favorite(show: &str, season: u32, episode: u32, added_secs: i64) -> FavoriteEntry {
    FavoriteEntry::new(
        EpisodeIdentity::new(show, season, episode),
        format!("Show {}", show),
        format!("Season {}", season),
        EpisodeSnapshot {
            title: format!("Episode {}", episode),
            description: "fixture".to_string(),
            media_uri: format!("https://cdn.example.com/{}/{}.mp3", season, episode),
        },
        Utc.timestamp_opt(added_secs, 0).unwrap(),
    )
}
