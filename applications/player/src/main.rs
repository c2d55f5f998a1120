/// Pod Player - headless episodic audio player
use clap::{Parser, Subcommand};
use pod_player::{
    commands::{self, PlayOptions},
    config::AppConfig,
    open_store,
};
use pod_storage::favorites::SortOrder;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pod-player")]
#[command(about = "Pod Player headless episode player", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Preference database path (overrides configuration)
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show persisted preferences and listening history
    Prefs,
    /// Forget all resume positions and completed episodes
    ResetHistory,
    /// List favorites grouped by show and season
    Favorites {
        /// Sort order to use (and remember)
        #[arg(short, long)]
        sort: Option<SortOrder>,
    },
    /// Play media URIs on a simulated output
    Play {
        /// Media URIs, queued in order
        #[arg(required = true)]
        uris: Vec<String>,
        /// Volume in [0, 1]
        #[arg(long)]
        volume: Option<f64>,
        /// Playback rate
        #[arg(long)]
        rate: Option<f64>,
        /// Pause after this many minutes
        #[arg(long)]
        sleep: Option<u32>,
        /// Length in seconds of URIs without a duration parameter
        #[arg(long, default_value_t = 1800.0)]
        duration: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pod_player=info,pod_playback=info,pod_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(database) = cli.database {
        config.storage.database_path = database;
    }
    let store = open_store(&config.storage.database_path)?;

    match cli.command {
        Commands::Prefs => {
            print!("{}", commands::prefs(store)?);
        }
        Commands::ResetHistory => {
            let cleared = commands::reset_history(store)?;
            println!("Cleared {cleared} history entries");
        }
        Commands::Favorites { sort } => {
            let groups = commands::favorites(store, sort)?;
            if groups.is_empty() {
                println!("No favorites");
            }
            for group in groups {
                println!("{} - {}", group.show_title, group.season_title);
                for favorite in group.entries {
                    println!(
                        "  E{:02} {} (added {})",
                        favorite.identity.episode_number,
                        favorite.episode.title,
                        favorite.added_at.format("%Y-%m-%d")
                    );
                }
            }
        }
        Commands::Play {
            uris,
            volume,
            rate,
            sleep,
            duration,
        } => {
            tracing::info!("Starting session with {} episodes", uris.len());
            let options = PlayOptions {
                uris,
                volume,
                rate,
                sleep_minutes: sleep,
                default_duration: duration,
            };
            let interrupt = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for Ctrl-C: {e}");
                    std::future::pending::<()>().await;
                }
            };
            let summary = commands::play(&config, store, options, interrupt).await?;
            println!(
                "Completed {} episodes ({} errors{}{})",
                summary.completed.len(),
                summary.errors,
                if summary.interrupted { ", interrupted" } else { "" },
                if summary.slept { ", sleep timer" } else { "" },
            );
        }
    }

    Ok(())
}
