mod catalog;
mod entry;
mod ids;

pub use catalog::{CatalogEpisode, Season, Show};
pub use entry::{EpisodeSnapshot, FavoriteEntry, QueueEntry};
pub use ids::EpisodeIdentity;
