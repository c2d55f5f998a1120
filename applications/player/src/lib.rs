/// Pod Player - headless player library
///
/// Configuration, storage bootstrap and the subcommands behind the
/// `pod-player` binary.
pub mod commands;
pub mod config;
pub mod error;

use error::Result;
use pod_storage::{PreferenceStore, RedbStore};
use std::path::Path;
use std::sync::Arc;

/// Open (creating if needed) the preference database
pub fn open_store(path: &Path) -> Result<Arc<dyn PreferenceStore>> {
    let store = RedbStore::open(path)?;
    tracing::debug!("Preference store opened at {}", path.display());
    Ok(Arc::new(store))
}
