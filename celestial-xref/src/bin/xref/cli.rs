//! CLI argument definitions for xref

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "xref")]
#[command(about = "Cross-catalog star identity resolution and parameter cache")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Reference data directory (overrides the configuration file)
    #[arg(long, global = true)]
    pub reference_dir: Option<PathBuf>,

    /// Skip rate-limit pauses between remote requests
    #[arg(long, global = true)]
    pub fast: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve star names to their full alias sets
    Resolve(ResolveArgs),

    /// Resolve several aliases of one star together, linking their records
    Aliases(AliasesArgs),

    /// Print normalized Gaia parameters for star names
    Params(ParamsArgs),

    /// Prefetch Gaia parameters for many source ids
    BatchUpdate(BatchUpdateArgs),

    /// Look up ICRS positions in SIMBAD
    Position(PositionArgs),

    /// List Gaia sources within a circle on the sky
    Cone(ConeArgs),

    /// Load and rewrite the reference files, applying pending merges
    Rebuild,

    /// Summarize the reference files
    Stats,
}

#[derive(Parser)]
pub struct ResolveArgs {
    /// Star names, e.g. "HD 128620"
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Query SIMBAD even for names on the bad-name list
    #[arg(long)]
    pub check_bad_names: bool,
}

#[derive(Parser)]
pub struct AliasesArgs {
    /// Aliases of a single star
    #[arg(required = true)]
    pub aliases: Vec<String>,
}

#[derive(Parser)]
pub struct ParamsArgs {
    /// Star names
    #[arg(required = true)]
    pub names: Vec<String>,

    /// Print raw cached rows instead of normalized parameters
    #[arg(long)]
    pub raw: bool,
}

#[derive(Parser)]
pub struct BatchUpdateArgs {
    /// Gaia data release number
    #[arg(long, default_value = "2")]
    pub release: u8,

    /// Source ids; defaults to every id of the release in the alias file
    pub ids: Vec<String>,
}

#[derive(Parser)]
pub struct PositionArgs {
    /// Star names
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[derive(Parser)]
pub struct ConeArgs {
    /// Gaia data release number
    #[arg(long, default_value = "2")]
    pub release: u8,

    /// Right ascension of the center (degrees, ICRS)
    #[arg(long, allow_negative_numbers = true)]
    pub ra: f64,

    /// Declination of the center (degrees, ICRS)
    #[arg(long, allow_negative_numbers = true)]
    pub dec: f64,

    /// Search radius (degrees)
    #[arg(long, default_value = "0.01")]
    pub radius: f64,
}
