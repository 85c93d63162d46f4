//! Command-line and environment configuration
use clap::{Parser, Subcommand};
use replay_ingest::DEFAULT_BATTLE_NAME;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "replay-stats", version, about = "Extract combat stats from battle replays")]
pub struct Cli {
    /// Vehicle encyclopedia cache (JSON keyed by typeCompDescr)
    #[arg(long, env = "VEHICLE_CACHE_PATH", default_value = "data/vehicles.json", global = true)]
    pub vehicles: PathBuf,

    /// Map cache (JSON keyed by arena id)
    #[arg(long, env = "MAP_CACHE_PATH", default_value = "data/maps_cache.json", global = true)]
    pub maps: PathBuf,

    /// trace, debug, info, warn or error
    #[arg(long, env = "REPLAY_LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print metadata, battle record and derived stats of one replay
    Parse {
        file: PathBuf,
        /// Order stats by account id, then vehicle type
        #[arg(long)]
        sorted: bool,
    },
    /// Store one or more replays and print the upload reports
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, default_value = DEFAULT_BATTLE_NAME)]
        battle_name: String,
    },
    /// Show the raw player/vehicle layout of a replay
    Inspect { file: PathBuf },
}
