/// Subcommand implementations
use crate::config::AppConfig;
use crate::error::Result;
use pod_core::types::{EpisodeIdentity, QueueEntry};
use pod_playback::{
    PlaybackEngine, PlaybackManager, PlayerHandle, PlayerIntent, PlayerNotification,
    PlayerService, SimulatedOutput, SystemClock,
};
use pod_storage::favorites::{FavoriteGroup, FavoritesLedger, SortOrder};
use pod_storage::history::{EpisodeHistory, ProgressRecord};
use pod_storage::{settings, PreferenceStore};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, trace, warn};

// ===== prefs =====

/// Everything persisted, for display
#[derive(Debug, Clone)]
pub struct PrefsReport {
    pub volume: Option<f64>,
    pub rate: Option<f64>,
    pub completed: Vec<String>,
    pub progress: Vec<ProgressRecord>,
    pub favorites: usize,
    pub sort_order: SortOrder,
}

pub fn prefs(store: Arc<dyn PreferenceStore>) -> Result<PrefsReport> {
    let volume = settings::get_volume(&*store)?;
    let rate = settings::get_playback_rate(&*store)?;
    let history = EpisodeHistory::load(Arc::clone(&store));
    let favorites = FavoritesLedger::load(store);

    Ok(PrefsReport {
        volume,
        rate,
        completed: history.completed_keys().map(str::to_string).collect(),
        progress: history.progress_records().cloned().collect(),
        favorites: favorites.len(),
        sort_order: favorites.sort_order(),
    })
}

impl fmt::Display for PrefsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.volume {
            Some(volume) => writeln!(f, "volume:        {:.2}", volume)?,
            None => writeln!(f, "volume:        (default)")?,
        }
        match self.rate {
            Some(rate) => writeln!(f, "rate:          {}x", rate)?,
            None => writeln!(f, "rate:          (default)")?,
        }
        writeln!(f, "favorites:     {} ({})", self.favorites, self.sort_order)?;
        writeln!(f, "completed:     {}", self.completed.len())?;
        for key in &self.completed {
            writeln!(f, "  {}", key)?;
        }
        writeln!(f, "in progress:   {}", self.progress.len())?;
        for record in &self.progress {
            writeln!(
                f,
                "  {} at {:.0}s (updated {})",
                record.identity,
                record.position_seconds,
                record.last_updated.format("%Y-%m-%d %H:%M")
            )?;
        }
        Ok(())
    }
}

// ===== reset-history =====

pub fn reset_history(store: Arc<dyn PreferenceStore>) -> Result<usize> {
    let mut history = EpisodeHistory::load(store);
    let cleared = history.completed_count() + history.progress_records().count();
    history.reset()?;
    info!("Cleared {} history entries", cleared);
    Ok(cleared)
}

// ===== favorites =====

/// Favorites grouped by show and season, optionally changing the sort order
pub fn favorites(
    store: Arc<dyn PreferenceStore>,
    sort: Option<SortOrder>,
) -> Result<Vec<FavoriteGroup>> {
    let mut ledger = FavoritesLedger::load(store);
    if let Some(order) = sort {
        if order != ledger.sort_order() {
            ledger.set_sort_order(order)?;
            info!("Favorites sort order set to {}", order);
        }
    }
    Ok(ledger.grouped())
}

// ===== play =====

/// Options for a headless session
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub uris: Vec<String>,
    pub volume: Option<f64>,
    pub rate: Option<f64>,
    pub sleep_minutes: Option<u32>,
    /// Length of sources without a `duration` parameter
    pub default_duration: f64,
}

/// How a session ended
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSummary {
    pub completed: Vec<EpisodeIdentity>,
    pub errors: usize,
    pub interrupted: bool,
    pub slept: bool,
}

/// Queue entry for a bare URI
///
/// The URI doubles as the show id so resume positions stick to it.
pub fn adhoc_entry(uri: &str) -> QueueEntry {
    let title = uri
        .rsplit('/')
        .next()
        .and_then(|segment| segment.split('?').next())
        .filter(|name| !name.is_empty())
        .unwrap_or(uri);

    QueueEntry::new(
        EpisodeIdentity::new(uri, 1, 1),
        "Local files",
        "Ad hoc",
        title,
        uri,
    )
}

/// Play `uris` on a simulated output until the queue ends or `interrupt`
/// resolves
pub async fn play<F>(
    config: &AppConfig,
    store: Arc<dyn PreferenceStore>,
    options: PlayOptions,
    interrupt: F,
) -> Result<SessionSummary>
where
    F: Future<Output = ()>,
{
    let (output, signals) = SimulatedOutput::new(options.default_duration);
    let manager = PlaybackManager::new(
        PlaybackEngine::new(output),
        store,
        Arc::new(SystemClock),
        config.playback.clone(),
    );
    let (player, task) = PlayerService::spawn(manager, signals);
    let mut notifications = player.subscribe();

    if let Some(volume) = options.volume {
        player.send(PlayerIntent::SetVolume(volume)).await?;
    }
    if let Some(rate) = options.rate {
        player.send(PlayerIntent::SetPlaybackRate(rate)).await?;
    }
    for uri in &options.uris {
        player.send(PlayerIntent::Enqueue(adhoc_entry(uri))).await?;
    }
    if options.sleep_minutes.is_some() {
        player
            .send(PlayerIntent::SetSleepTimer(options.sleep_minutes))
            .await?;
    }
    player.send(PlayerIntent::TogglePlayPause).await?;

    let mut summary = SessionSummary::default();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            () = &mut interrupt => {
                info!("Interrupted");
                summary.interrupted = true;
                break;
            }
            notification = notifications.recv() => match notification {
                Ok(notification) => {
                    if !handle_notification(&player, notification, &mut summary).await? {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => debug!("Skipped {} notifications", skipped),
                Err(RecvError::Closed) => break,
            },
        }
    }

    player.shutdown().await?;
    task.await?;
    Ok(summary)
}

/// Log a notification; returns false when the session is over
async fn handle_notification(
    player: &PlayerHandle,
    notification: PlayerNotification,
    summary: &mut SessionSummary,
) -> Result<bool> {
    match notification {
        PlayerNotification::PositionChanged {
            position_seconds,
            duration_seconds,
        } => {
            trace!("{:.1}s / {:?}", position_seconds, duration_seconds);
        }
        PlayerNotification::EpisodeChanged {
            identity: Some(identity),
        } => info!("Now playing {}", identity),
        PlayerNotification::EpisodeCompleted { identity } => {
            info!("Completed {}", identity);
            summary.completed.push(identity);
        }
        PlayerNotification::SleepTimerExpired => {
            info!("Sleep timer expired");
            summary.slept = true;
            return Ok(false);
        }
        PlayerNotification::Error { reason, message } => {
            warn!("Playback error ({:?}): {}", reason, message);
            summary.errors += 1;

            let snapshot = player.snapshot().await?;
            let has_next = snapshot
                .cursor
                .is_some_and(|cursor| cursor + 1 < snapshot.queue.len());
            if !has_next {
                return Ok(false);
            }
            player.send(PlayerIntent::SkipToNext).await?;
        }
        PlayerNotification::StateChanged { status } => {
            debug!("Status {:?}", status);
            if status == pod_playback::PlaybackStatus::Stopped {
                return Ok(false);
            }
        }
        other => debug!("{:?}", other),
    }
    Ok(true)
}
