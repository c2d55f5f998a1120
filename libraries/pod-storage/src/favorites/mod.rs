//! Favorites ledger
//!
//! A set of user-starred episodes keyed by [`EpisodeIdentity`], stored as an
//! ordered list under `favorites`. Sorting and grouping are views over the
//! stored list; the chosen sort order is persisted alongside it.

use pod_core::types::{EpisodeIdentity, FavoriteEntry};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::Result;
use crate::settings::{get_setting, set_setting, SETTING_FAVORITES, SETTING_FAVORITES_SORT};
use crate::store::PreferenceStore;

/// Display order of the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Show title A-Z, then season and episode ascending
    TitleAsc,
    /// Show title Z-A, then season and episode descending
    TitleDesc,
    /// Oldest favorite first
    AddedAsc,
    /// Newest favorite first
    #[default]
    AddedDesc,
}

impl SortOrder {
    /// Stable name used in persistence and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::TitleAsc => "title-asc",
            SortOrder::TitleDesc => "title-desc",
            SortOrder::AddedAsc => "added-asc",
            SortOrder::AddedDesc => "added-desc",
        }
    }

    fn compare(self, a: &FavoriteEntry, b: &FavoriteEntry) -> Ordering {
        match self {
            SortOrder::TitleAsc => title_key(a).cmp(&title_key(b)),
            SortOrder::TitleDesc => title_key(b).cmp(&title_key(a)),
            SortOrder::AddedAsc => a
                .added_at
                .cmp(&b.added_at)
                .then_with(|| a.identity.cmp(&b.identity)),
            SortOrder::AddedDesc => b
                .added_at
                .cmp(&a.added_at)
                .then_with(|| b.identity.cmp(&a.identity)),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "title-asc" | "titleAsc" => Ok(SortOrder::TitleAsc),
            "title-desc" | "titleDesc" => Ok(SortOrder::TitleDesc),
            "added-asc" | "addedAsc" => Ok(SortOrder::AddedAsc),
            "added-desc" | "addedDesc" => Ok(SortOrder::AddedDesc),
            other => Err(format!("Unknown sort order: {}", other)),
        }
    }
}

fn title_key(entry: &FavoriteEntry) -> (String, u32, u32) {
    (
        entry.show_title.to_lowercase(),
        entry.identity.season_number,
        entry.identity.episode_number,
    )
}

/// Favorites of one season of one show, in ledger order
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteGroup {
    /// Show identifier
    pub show_id: String,
    /// Show title (from the first entry in the group)
    pub show_title: String,
    /// Season number
    pub season_number: u32,
    /// Season title (from the first entry in the group)
    pub season_title: String,
    /// Entries in ledger sort order
    pub entries: Vec<FavoriteEntry>,
}

/// Persisted set of favorite episodes
pub struct FavoritesLedger {
    store: Arc<dyn PreferenceStore>,
    entries: Vec<FavoriteEntry>,
    sort_order: SortOrder,
}

impl FavoritesLedger {
    /// Load the ledger from the store
    ///
    /// Duplicate identities in stored data are collapsed (first wins).
    pub fn load(store: Arc<dyn PreferenceStore>) -> Self {
        let stored = match get_setting::<Vec<FavoriteEntry>>(store.as_ref(), SETTING_FAVORITES) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable favorites: {}", e);
                Vec::new()
            }
        };

        let mut entries: Vec<FavoriteEntry> = Vec::with_capacity(stored.len());
        for entry in stored {
            if !entries.iter().any(|e| e.identity == entry.identity) {
                entries.push(entry);
            }
        }

        let sort_order = match get_setting::<SortOrder>(store.as_ref(), SETTING_FAVORITES_SORT) {
            Ok(order) => order.unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring unreadable favorites sort order: {}", e);
                SortOrder::default()
            }
        };

        debug!("Loaded {} favorites (sort: {})", entries.len(), sort_order);

        Self {
            store,
            entries,
            sort_order,
        }
    }

    /// Add a favorite
    ///
    /// No-op returning `Ok(false)` if the identity is already present,
    /// regardless of whether the snapshot differs.
    pub fn add(&mut self, entry: FavoriteEntry) -> Result<bool> {
        if self.contains(&entry.identity) {
            return Ok(false);
        }
        self.entries.push(entry);
        self.persist()?;
        Ok(true)
    }

    /// Remove a favorite, returning whether it was present
    pub fn remove(&mut self, identity: &EpisodeIdentity) -> Result<bool> {
        let before = self.entries.len();
        self.entries.retain(|e| &e.identity != identity);
        if self.entries.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Remove every favorite
    pub fn clear_all(&mut self) -> Result<()> {
        self.entries.clear();
        self.persist()
    }

    /// Whether an episode is favorited
    pub fn contains(&self, identity: &EpisodeIdentity) -> bool {
        self.entries.iter().any(|e| &e.identity == identity)
    }

    /// Look up a favorite
    pub fn get(&self, identity: &EpisodeIdentity) -> Option<&FavoriteEntry> {
        self.entries.iter().find(|e| &e.identity == identity)
    }

    /// Number of favorites
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current sort order
    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Change and persist the sort order
    pub fn set_sort_order(&mut self, order: SortOrder) -> Result<()> {
        self.sort_order = order;
        set_setting(self.store.as_ref(), SETTING_FAVORITES_SORT, &order)
    }

    /// Entries in the current sort order
    pub fn entries(&self) -> Vec<&FavoriteEntry> {
        let mut sorted: Vec<&FavoriteEntry> = self.entries.iter().collect();
        let order = self.sort_order;
        sorted.sort_by(|a, b| order.compare(a, b));
        sorted
    }

    /// Entries grouped by `(showId, seasonNumber)`
    ///
    /// Groups appear in the order of their first entry in the sorted view,
    /// and entries keep the sorted order within each group.
    pub fn grouped(&self) -> Vec<FavoriteGroup> {
        let mut groups: Vec<FavoriteGroup> = Vec::new();

        for entry in self.entries() {
            let existing = groups.iter_mut().find(|g| {
                g.show_id == entry.identity.show_id
                    && g.season_number == entry.identity.season_number
            });

            match existing {
                Some(group) => group.entries.push(entry.clone()),
                None => groups.push(FavoriteGroup {
                    show_id: entry.identity.show_id.clone(),
                    show_title: entry.show_title.clone(),
                    season_number: entry.identity.season_number,
                    season_title: entry.season_title.clone(),
                    entries: vec![entry.clone()],
                }),
            }
        }

        groups
    }

    fn persist(&self) -> Result<()> {
        set_setting(self.store.as_ref(), SETTING_FAVORITES, &self.entries)
    }
}
