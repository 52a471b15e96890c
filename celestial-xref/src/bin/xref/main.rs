//! xref: cross-catalog star identity resolution CLI
//!
//! Resolves star names through the local reference files, falling back to
//! SIMBAD and the Gaia archive, and maintains those files.

mod cli;
mod identity;
mod maintenance;
mod params;
mod sky;

use celestial_xref::XrefConfig;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if cli.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Resolve(args) => identity::resolve(args, &config),
        Commands::Aliases(args) => identity::aliases(args, &config),
        Commands::Params(args) => params::run(args, &config),
        Commands::BatchUpdate(args) => params::batch_update(args, &config),
        Commands::Position(args) => sky::position(args, &config),
        Commands::Cone(args) => sky::cone(args, &config),
        Commands::Rebuild => maintenance::rebuild(&config),
        Commands::Stats => maintenance::stats(&config),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<XrefConfig> {
    let mut config = match &cli.config {
        Some(path) => XrefConfig::from_json_file(path)?,
        None => XrefConfig::default(),
    };
    if let Some(dir) = &cli.reference_dir {
        config.reference_dir = dir.clone();
    }
    if cli.fast {
        config.fast = true;
    }
    Ok(config)
}
