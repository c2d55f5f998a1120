/// Core traits for Pod Player
use crate::error::Result;
use crate::types::Show;
use async_trait::async_trait;

/// Content catalog client
///
/// Implemented by the HTTP client that serves shows, seasons and episodes.
/// Playback never calls the catalog itself; the presentation layer fetches a
/// show and turns the chosen episode into a `QueueEntry`.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch a show with all its seasons and episodes
    ///
    /// # Errors
    /// Returns `CoreError::NotFound` if the show does not exist, or
    /// `CoreError::Catalog` on transport failures
    async fn fetch_show(&self, id: &str) -> Result<Show>;
}
