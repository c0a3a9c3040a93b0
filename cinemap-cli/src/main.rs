use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use cinemap_core::{
    CacheStatus, CatalogSnapshot, CatalogStore, Item, ItemId, MemoryCatalog, Rating, Recommender,
    RecommenderConfig, SelectionMode, UserId,
};
use clap::{Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "cinemap")]
#[command(about = "Movie picks from binary feedback, plus a 2-D map of the catalog")]
#[command(version)]
struct Args {
    /// Catalog snapshot (JSON with `items` and `feedback`)
    #[arg(short, long)]
    catalog: PathBuf,

    /// Engine settings (JSON); missing fields take their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is unset (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Pick the next item to show a user
    Next {
        #[arg(short, long)]
        user: UserId,

        /// uniform or ranked
        #[arg(short, long, default_value = "uniform")]
        mode: SelectionMode,

        /// Seed for reproducible uniform picks
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Liked items that pulled the user toward an item
    Why {
        #[arg(short, long)]
        user: UserId,

        #[arg(short, long)]
        item: ItemId,
    },

    /// Every item in 2-D plus the user's own position
    Map {
        #[arg(short, long)]
        user: UserId,
    },

    /// A user's ratings, most recent first
    History {
        #[arg(short, long)]
        user: UserId,
    },

    /// Catalog and projection cache summary
    Status {
        /// Train the projector before reporting
        #[arg(long)]
        warm: bool,
    },
}

#[derive(Debug, Serialize)]
struct Pick {
    item_id: ItemId,
    title: String,
    mode: SelectionMode,
}

#[derive(Debug, Serialize)]
struct HistoryEntry {
    item_id: ItemId,
    title: String,
    rating: Rating,
}

#[derive(Debug, Serialize)]
struct Status {
    items: usize,
    embedded_items: usize,
    dimension: Option<usize>,
    cache: CacheStatus,
}

/// Exit code for "nothing to return" outcomes (no unseen items, unknown item).
const EXIT_NOT_FOUND: u8 = 2;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            let not_found = e
                .downcast_ref::<cinemap_core::Error>()
                .is_some_and(cinemap_core::Error::is_not_found);
            if not_found {
                ExitCode::from(EXIT_NOT_FOUND)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

/// Stderr logging; RUST_LOG takes precedence over `--log-level`.
fn init_logging(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => RecommenderConfig::default(),
    };
    let store = load_catalog(&args.catalog)?;
    info!(
        "loaded catalog {}: {} items, dimension {:?}",
        args.catalog.display(),
        store.len(),
        store.dimension()
    );

    let recommender = Recommender::new(store, config)?;

    match args.command {
        Command::Next { user, mode, seed } => {
            let item = match seed {
                Some(seed) => {
                    let mut rng = StdRng::seed_from_u64(seed);
                    recommender.pick_next_with_rng(user, mode, &mut rng)?
                }
                None => recommender.pick_next(user, mode)?,
            };
            print_json(&pick(item, mode))
        }
        Command::Why { user, item } => {
            let influences = recommender.rank_influence(user, item)?;
            debug!("{} influencing items for item {}", influences.len(), item);
            print_json(&influences)
        }
        Command::Map { user } => print_json(&recommender.project_space(user)?),
        Command::History { user } => {
            let entries: Vec<HistoryEntry> = recommender
                .store()
                .history(user)
                .into_iter()
                .map(|row| HistoryEntry {
                    rating: row.rating(),
                    item_id: row.item_id,
                    title: row.title,
                })
                .collect();
            print_json(&entries)
        }
        Command::Status { warm } => {
            if warm {
                recommender.cache().ensure(recommender.store())?;
            }
            let store = recommender.store();
            print_json(&Status {
                items: store.len(),
                embedded_items: store.count_items_with_embeddings()?,
                dimension: store.dimension(),
                cache: recommender.cache_status(),
            })
        }
    }
}

fn pick(item: Item, mode: SelectionMode) -> Pick {
    Pick {
        item_id: item.id,
        title: item.title,
        mode,
    }
}

fn load_config(path: &Path) -> Result<RecommenderConfig, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read config {}: {}", path.display(), e))?;
    let config = RecommenderConfig::from_json(&raw)
        .map_err(|e| format!("invalid config {}: {}", path.display(), e))?;
    Ok(config)
}

fn load_catalog(path: &Path) -> Result<MemoryCatalog, Box<dyn std::error::Error>> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("failed to read catalog {}: {}", path.display(), e))?;
    let snapshot: CatalogSnapshot = serde_json::from_str(&raw)
        .map_err(|e| format!("invalid catalog {}: {}", path.display(), e))?;
    Ok(MemoryCatalog::from_snapshot(snapshot)?)
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
