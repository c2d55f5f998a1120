/// Episode identity
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Uniquely names an episode across all shows
///
/// Two identities are equal iff show id, season number and episode number
/// all match. The string form returned by [`EpisodeIdentity::key`] is the
/// key used for progress, completion and favorites persistence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeIdentity {
    /// Globally unique show identifier
    pub show_id: String,

    /// Season number within the show
    pub season_number: u32,

    /// Episode number within the season
    pub episode_number: u32,
}

impl EpisodeIdentity {
    /// Create a new episode identity
    pub fn new(show_id: impl Into<String>, season_number: u32, episode_number: u32) -> Self {
        Self {
            show_id: show_id.into(),
            season_number,
            episode_number,
        }
    }

    /// Stable key of the form `{showId}_s{season}_e{episode}`
    pub fn key(&self) -> String {
        format!(
            "{}_s{}_e{}",
            self.show_id, self.season_number, self.episode_number
        )
    }

    /// Parse a key produced by [`EpisodeIdentity::key`]
    ///
    /// The show id may itself contain `_s`/`_e`; the numeric suffixes are
    /// split from the right.
    pub fn parse_key(key: &str) -> Result<Self> {
        let invalid = || CoreError::InvalidIdentityKey(key.to_string());

        let (rest, episode) = key.rsplit_once("_e").ok_or_else(invalid)?;
        let (show_id, season) = rest.rsplit_once("_s").ok_or_else(invalid)?;

        if show_id.is_empty() {
            return Err(invalid());
        }

        let season_number = season.parse::<u32>().map_err(|_| invalid())?;
        let episode_number = episode.parse::<u32>().map_err(|_| invalid())?;

        Ok(Self::new(show_id, season_number, episode_number))
    }
}

impl fmt::Display for EpisodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_s{}_e{}",
            self.show_id, self.season_number, self.episode_number
        )
    }
}
