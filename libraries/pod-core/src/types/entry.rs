/// Queue and favorites entry types
use crate::types::{CatalogEpisode, EpisodeIdentity, Season, Show};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An episode placed in the playback queue
///
/// Immutable once queued; only its position in the queue changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// Episode identity (queue rejects duplicates by this key)
    pub identity: EpisodeIdentity,

    /// Show title for display
    pub show_title: String,

    /// Season title for display
    pub season_title: String,

    /// Episode title for display
    pub episode_title: String,

    /// Opaque playable URI handed to the engine
    pub media_uri: String,
}

impl QueueEntry {
    /// Create a new queue entry
    pub fn new(
        identity: EpisodeIdentity,
        show_title: impl Into<String>,
        season_title: impl Into<String>,
        episode_title: impl Into<String>,
        media_uri: impl Into<String>,
    ) -> Self {
        Self {
            identity,
            show_title: show_title.into(),
            season_title: season_title.into(),
            episode_title: episode_title.into(),
            media_uri: media_uri.into(),
        }
    }

    /// Build an entry from catalog data
    pub fn from_catalog(show: &Show, season: &Season, episode: &CatalogEpisode) -> Self {
        Self {
            identity: EpisodeIdentity::new(show.id.clone(), season.season, episode.episode),
            show_title: show.title.clone(),
            season_title: season.title.clone(),
            episode_title: episode.title.clone(),
            media_uri: episode.file.clone(),
        }
    }

    /// Whether the entry has something the engine can load
    pub fn has_source(&self) -> bool {
        !self.media_uri.trim().is_empty()
    }
}

/// Episode details captured when an episode is favorited
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeSnapshot {
    /// Episode title
    pub title: String,

    /// Episode description
    #[serde(default)]
    pub description: String,

    /// Playable URI
    pub media_uri: String,
}

impl From<&CatalogEpisode> for EpisodeSnapshot {
    fn from(episode: &CatalogEpisode) -> Self {
        Self {
            title: episode.title.clone(),
            description: episode.description.clone(),
            media_uri: episode.file.clone(),
        }
    }
}

/// A user-starred episode
///
/// Independent of the queue: an episode can be favorited without ever
/// being queued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// Episode identity (ledger key)
    pub identity: EpisodeIdentity,

    /// Show title
    pub show_title: String,

    /// Season title
    pub season_title: String,

    /// Episode details at the time of favoriting
    pub episode: EpisodeSnapshot,

    /// When the favorite was added
    pub added_at: DateTime<Utc>,
}

impl FavoriteEntry {
    /// Create a favorite entry stamped with the given time
    pub fn new(
        identity: EpisodeIdentity,
        show_title: impl Into<String>,
        season_title: impl Into<String>,
        episode: EpisodeSnapshot,
        added_at: DateTime<Utc>,
    ) -> Self {
        Self {
            identity,
            show_title: show_title.into(),
            season_title: season_title.into(),
            episode,
            added_at,
        }
    }

    /// Queue entry for playing this favorite
    pub fn to_queue_entry(&self) -> QueueEntry {
        QueueEntry::new(
            self.identity.clone(),
            self.show_title.clone(),
            self.season_title.clone(),
            self.episode.title.clone(),
            self.episode.media_uri.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_show() -> Show {
        Show {
            id: "s-1".to_string(),
            title: "Deep Dives".to_string(),
            seasons: vec![Season {
                season: 2,
                title: "Second Season".to_string(),
                episodes: vec![CatalogEpisode {
                    episode: 5,
                    title: "Five".to_string(),
                    description: "The fifth one".to_string(),
                    file: "https://cdn.example.com/5.mp3".to_string(),
                }],
            }],
        }
    }

    #[test]
    fn queue_entry_from_catalog() {
        let show = sample_show();
        let season = &show.seasons[0];
        let entry = QueueEntry::from_catalog(&show, season, &season.episodes[0]);

        assert_eq!(entry.identity, EpisodeIdentity::new("s-1", 2, 5));
        assert_eq!(entry.show_title, "Deep Dives");
        assert_eq!(entry.season_title, "Second Season");
        assert_eq!(entry.media_uri, "https://cdn.example.com/5.mp3");
        assert!(entry.has_source());
    }

    #[test]
    fn blank_uri_has_no_source() {
        let entry = QueueEntry::new(EpisodeIdentity::new("a", 1, 1), "A", "S1", "E1", "  ");
        assert!(!entry.has_source());
    }

    #[test]
    fn favorite_round_trips_to_queue_entry() {
        let show = sample_show();
        let episode = &show.seasons[0].episodes[0];
        let favorite = FavoriteEntry::new(
            EpisodeIdentity::new("s-1", 2, 5),
            "Deep Dives",
            "Second Season",
            EpisodeSnapshot::from(episode),
            Utc::now(),
        );

        let entry = favorite.to_queue_entry();
        assert_eq!(entry.episode_title, "Five");
        assert_eq!(entry.media_uri, episode.file);
    }

    #[test]
    fn serializes_camel_case() {
        let entry = QueueEntry::new(EpisodeIdentity::new("a", 1, 2), "A", "S1", "E2", "uri");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["identity"]["showId"], "a");
        assert_eq!(json["mediaUri"], "uri");
    }
}
