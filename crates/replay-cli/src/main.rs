//! Binary entrypoint for replay-stats.
mod commands;
mod config;

use clap::Parser;
use config::{Cli, Command};
use replay_catalog::{MapCatalog, VehicleCatalog};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Parse { file, sorted } => {
            let maps = MapCatalog::load(&cli.maps);
            commands::parse(&file, sorted, &maps)
        }
        Command::Ingest { files, battle_name } => {
            let vehicles = VehicleCatalog::load(&cli.vehicles);
            commands::ingest(&files, &battle_name, &vehicles)
        }
        Command::Inspect { file } => commands::inspect(&file),
    }
}
