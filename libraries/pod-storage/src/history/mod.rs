//! Listening history: resume positions and completed episodes
//!
//! Both collections live under their own key (`episodeProgress`,
//! `completedEpisodes`) and persist until [`EpisodeHistory::reset`].
//! The in-memory copy is authoritative for the session; every mutation is
//! applied in memory first and then written through.

use chrono::{DateTime, Utc};
use pod_core::types::EpisodeIdentity;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::settings::{
    get_setting, set_setting, SETTING_COMPLETED_EPISODES, SETTING_EPISODE_PROGRESS,
};
use crate::store::PreferenceStore;

/// Persisted resume position for one episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    /// Episode the position belongs to
    pub identity: EpisodeIdentity,

    /// Resume position in seconds
    pub position_seconds: f64,

    /// When the position was last written
    pub last_updated: DateTime<Utc>,
}

/// On-disk value of one progress map entry
///
/// Older data stored bare seconds; both shapes are accepted on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredProgress {
    Full {
        #[serde(rename = "positionSeconds")]
        position_seconds: f64,
        #[serde(rename = "lastUpdated")]
        last_updated: DateTime<Utc>,
    },
    Seconds(f64),
}

/// Resume positions and completion set
pub struct EpisodeHistory {
    store: Arc<dyn PreferenceStore>,
    progress: BTreeMap<String, ProgressRecord>,
    completed: BTreeSet<String>,
}

impl EpisodeHistory {
    /// Load history from the store
    ///
    /// Unreadable or malformed values are logged and treated as empty so a
    /// corrupt entry never blocks playback.
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let progress = match get_setting::<BTreeMap<String, StoredProgress>>(
            store.as_ref(),
            SETTING_EPISODE_PROGRESS,
        ) {
            Ok(map) => map
                .unwrap_or_default()
                .into_iter()
                .filter_map(|(key, stored)| Self::decode_record(key, stored))
                .collect(),
            Err(e) => {
                warn!("Ignoring unreadable episode progress: {}", e);
                BTreeMap::new()
            }
        };

        let completed =
            match get_setting::<BTreeSet<String>>(store.as_ref(), SETTING_COMPLETED_EPISODES) {
                Ok(set) => set.unwrap_or_default(),
                Err(e) => {
                    warn!("Ignoring unreadable completed episodes: {}", e);
                    BTreeSet::new()
                }
            };

        debug!(
            "Loaded history: {} progress records, {} completed",
            progress.len(),
            completed.len()
        );

        Self {
            store,
            progress,
            completed,
        }
    }

    fn decode_record(key: String, stored: StoredProgress) -> Option<(String, ProgressRecord)> {
        let identity = match EpisodeIdentity::parse_key(&key) {
            Ok(identity) => identity,
            Err(e) => {
                warn!("Skipping progress entry: {}", e);
                return None;
            }
        };

        let (position_seconds, last_updated) = match stored {
            StoredProgress::Full {
                position_seconds,
                last_updated,
            } => (position_seconds, last_updated),
            StoredProgress::Seconds(seconds) => (seconds, DateTime::<Utc>::default()),
        };

        if !position_seconds.is_finite() || position_seconds < 0.0 {
            return None;
        }

        Some((
            key,
            ProgressRecord {
                identity,
                position_seconds,
                last_updated,
            },
        ))
    }

    // ===== Progress =====

    /// Progress record for an episode
    pub fn progress_for(&self, identity: &EpisodeIdentity) -> Option<&ProgressRecord> {
        self.progress.get(&identity.key())
    }

    /// Resume position for an episode, if one was recorded
    pub fn resume_position(&self, identity: &EpisodeIdentity) -> Option<f64> {
        self.progress_for(identity).map(|r| r.position_seconds)
    }

    /// All progress records ordered by identity key
    pub fn progress_records(&self) -> impl Iterator<Item = &ProgressRecord> {
        self.progress.values()
    }

    /// Record (create or replace) the resume position for an episode
    ///
    /// The in-memory record is updated even if the write fails.
    pub fn record_progress(
        &mut self,
        identity: &EpisodeIdentity,
        position_seconds: f64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let position_seconds = if position_seconds.is_finite() {
            position_seconds.max(0.0)
        } else {
            0.0
        };

        self.progress.insert(
            identity.key(),
            ProgressRecord {
                identity: identity.clone(),
                position_seconds,
                last_updated: now,
            },
        );
        self.persist_progress()
    }

    /// Forget the resume position for an episode
    pub fn clear_progress(&mut self, identity: &EpisodeIdentity) -> Result<bool> {
        let existed = self.progress.remove(&identity.key()).is_some();
        if existed {
            self.persist_progress()?;
        }
        Ok(existed)
    }

    // ===== Completion =====

    /// Mark an episode fully played
    ///
    /// Idempotent: returns `Ok(false)` without writing if already complete.
    pub fn mark_completed(&mut self, identity: &EpisodeIdentity) -> Result<bool> {
        if !self.completed.insert(identity.key()) {
            return Ok(false);
        }
        self.persist_completed()?;
        Ok(true)
    }

    /// Whether an episode has been fully played
    pub fn is_completed(&self, identity: &EpisodeIdentity) -> bool {
        self.completed.contains(&identity.key())
    }

    /// Identity keys of all completed episodes
    pub fn completed_keys(&self) -> impl Iterator<Item = &str> {
        self.completed.iter().map(String::as_str)
    }

    /// Number of completed episodes
    pub fn completed_count(&self) -> usize {
        self.completed.len()
    }

    // ===== Reset =====

    /// Empty both the completion set and all progress records
    pub fn reset(&mut self) -> Result<()> {
        self.progress.clear();
        self.completed.clear();
        self.persist_progress()?;
        self.persist_completed()
    }

    fn persist_progress(&self) -> Result<()> {
        let stored: BTreeMap<&str, StoredProgress> = self
            .progress
            .iter()
            .map(|(key, record)| {
                (
                    key.as_str(),
                    StoredProgress::Full {
                        position_seconds: record.position_seconds,
                        last_updated: record.last_updated,
                    },
                )
            })
            .collect();
        set_setting(self.store.as_ref(), SETTING_EPISODE_PROGRESS, &stored)
    }

    fn persist_completed(&self) -> Result<()> {
        set_setting(
            self.store.as_ref(),
            SETTING_COMPLETED_EPISODES,
            &self.completed,
        )
    }
}
