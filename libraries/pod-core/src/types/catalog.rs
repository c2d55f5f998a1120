/// Content catalog types
///
/// Shapes returned by the catalog client. Playback only ever reads
/// `CatalogEpisode::file` as an opaque URI.
use crate::types::QueueEntry;
use serde::{Deserialize, Serialize};

/// A show with its seasons
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Show {
    /// Show identifier
    pub id: String,

    /// Show title
    pub title: String,

    /// Seasons in catalog order
    #[serde(default)]
    pub seasons: Vec<Season>,
}

/// A season of a show
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    /// Season number
    pub season: u32,

    /// Season title
    pub title: String,

    /// Episodes in catalog order
    #[serde(default)]
    pub episodes: Vec<CatalogEpisode>,
}

/// An episode as served by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEpisode {
    /// Episode number within the season
    pub episode: u32,

    /// Episode title
    pub title: String,

    /// Episode description
    #[serde(default)]
    pub description: String,

    /// Playable media URI
    pub file: String,
}

impl Show {
    /// Find a season by number
    pub fn season(&self, season_number: u32) -> Option<&Season> {
        self.seasons.iter().find(|s| s.season == season_number)
    }

    /// Build a queue entry for one episode of this show
    pub fn queue_entry(&self, season_number: u32, episode_number: u32) -> Option<QueueEntry> {
        let season = self.season(season_number)?;
        let episode = season.episode(episode_number)?;
        Some(QueueEntry::from_catalog(self, season, episode))
    }

    /// Queue entries for every episode of a season, in catalog order
    pub fn season_entries(&self, season_number: u32) -> Vec<QueueEntry> {
        self.season(season_number)
            .map(|season| {
                season
                    .episodes
                    .iter()
                    .map(|ep| QueueEntry::from_catalog(self, season, ep))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total number of episodes across all seasons
    pub fn episode_count(&self) -> usize {
        self.seasons.iter().map(|s| s.episodes.len()).sum()
    }
}

impl Season {
    /// Find an episode by number
    pub fn episode(&self, episode_number: u32) -> Option<&CatalogEpisode> {
        self.episodes.iter().find(|e| e.episode == episode_number)
    }
}
