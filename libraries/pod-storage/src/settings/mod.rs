//! Playback preferences
//!
//! Generic JSON get/set helpers over a [`PreferenceStore`] plus typed access
//! for the two scalar playback preferences (volume and rate).
//!
//! # Example
//!
//! ```rust
//! use pod_storage::{settings, MemoryStore};
//!
//! let store = MemoryStore::new();
//! settings::set_playback_rate(&store, 1.5).unwrap();
//! assert_eq!(settings::get_playback_rate(&store).unwrap(), Some(1.5));
//! ```

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{Result, StorageError};
use crate::store::PreferenceStore;

// Setting key constants
/// Volume in [0, 1]
pub const SETTING_VOLUME: &str = "volume";

/// Playback rate (one of the discrete allowed rates)
pub const SETTING_PLAYBACK_RATE: &str = "playbackRate";

/// Set of identity keys of fully played episodes
pub const SETTING_COMPLETED_EPISODES: &str = "completedEpisodes";

/// Map identity key -> resume position
pub const SETTING_EPISODE_PROGRESS: &str = "episodeProgress";

/// Ordered list of favorite entries
pub const SETTING_FAVORITES: &str = "favorites";

/// Favorites sort order
pub const SETTING_FAVORITES_SORT: &str = "favoritesSortOrder";

/// Read and deserialize a setting
///
/// Returns `Ok(None)` if the key is absent.
///
/// # Errors
///
/// Returns an error if the backend read fails or the stored JSON does not
/// match `T`
pub fn get_setting<T: DeserializeOwned>(
    store: &dyn PreferenceStore,
    key: &str,
) -> Result<Option<T>> {
    match store.get(key)? {
        Some(value) => {
            let typed = serde_json::from_value(value).map_err(|e| StorageError::serialization(key, e))?;
            Ok(Some(typed))
        }
        None => Ok(None),
    }
}

/// Serialize and write a setting
///
/// # Errors
///
/// Returns an error if serialization or the backend write fails
pub fn set_setting<T: Serialize + ?Sized>(
    store: &dyn PreferenceStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let value = serde_json::to_value(value).map_err(|e| StorageError::serialization(key, e))?;
    store.set(key, &value)
}

/// Delete a setting, returning whether it existed
pub fn delete_setting(store: &dyn PreferenceStore, key: &str) -> Result<bool> {
    store.remove(key)
}

/// Persisted volume, if any
///
/// Out-of-range values are clamped to [0, 1]; non-finite values are ignored.
pub fn get_volume(store: &dyn PreferenceStore) -> Result<Option<f64>> {
    Ok(get_setting::<f64>(store, SETTING_VOLUME)?
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 1.0)))
}

/// Persist volume
pub fn set_volume(store: &dyn PreferenceStore, volume: f64) -> Result<()> {
    set_setting(store, SETTING_VOLUME, &volume)
}

/// Persisted playback rate, if any
///
/// Validation against the allowed rate set is the caller's concern.
pub fn get_playback_rate(store: &dyn PreferenceStore) -> Result<Option<f64>> {
    Ok(get_setting::<f64>(store, SETTING_PLAYBACK_RATE)?.filter(|r| r.is_finite() && *r > 0.0))
}

/// Persist playback rate
pub fn set_playback_rate(store: &dyn PreferenceStore, rate: f64) -> Result<()> {
    set_setting(store, SETTING_PLAYBACK_RATE, &rate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;
    use serde_json::json;

    #[test]
    fn volume_round_trip() {
        let store = MemoryStore::new();
        assert_eq!(get_volume(&store).unwrap(), None);

        set_volume(&store, 0.3).unwrap();
        assert_eq!(get_volume(&store).unwrap(), Some(0.3));
    }

    #[test]
    fn out_of_range_volume_is_clamped_on_read() {
        let store = MemoryStore::new();
        store.set(SETTING_VOLUME, &json!(4.0)).unwrap();
        assert_eq!(get_volume(&store).unwrap(), Some(1.0));

        store.set(SETTING_VOLUME, &json!(-1.0)).unwrap();
        assert_eq!(get_volume(&store).unwrap(), Some(0.0));
    }

    #[test]
    fn wrong_type_is_serialization_error() {
        let store = MemoryStore::new();
        store.set(SETTING_PLAYBACK_RATE, &json!("fast")).unwrap();

        let err = get_playback_rate(&store).unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }

    #[test]
    fn delete_setting_reports_existence() {
        let store = MemoryStore::new();
        set_playback_rate(&store, 1.25).unwrap();
        assert!(delete_setting(&store, SETTING_PLAYBACK_RATE).unwrap());
        assert!(!delete_setting(&store, SETTING_PLAYBACK_RATE).unwrap());
    }
}
