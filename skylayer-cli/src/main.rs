//! SkyLayer CLI - Command-line interface
//!
//! Queries the HEALPix index, downloads survey tiles and renders views.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::cache::CacheAction;
use commands::config::ConfigCommands;
use commands::fetch::FetchArgs;
use commands::render::RenderArgs;
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "skylayer")]
#[command(version, about = "HEALPix sky survey tiles, streamed on demand", long_about = None)]
struct Cli {
    /// Survey id or title (overrides the config file; "None" disables)
    #[arg(long, global = true)]
    source: Option<String>,

    /// Configuration file (default: ~/.skylayer/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the pixel containing a sky position
    Index {
        /// Resolution level
        #[arg(long)]
        level: u8,
        /// Right ascension in degrees
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,
        /// Declination in degrees
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,
        /// Index for a galactic-frame survey
        #[arg(long)]
        galactic: bool,
    },

    /// Print the four corners of a pixel in degrees
    Corners {
        #[arg(long)]
        level: u8,
        #[arg(long)]
        pix: u64,
    },

    /// Print the eight neighbours of a pixel
    Neighbours {
        #[arg(long)]
        level: u8,
        #[arg(long)]
        pix: u64,
    },

    /// Download one tile and save it as PNG
    Fetch {
        /// Resolution level (ignored with --allsky)
        #[arg(long, default_value = "3")]
        level: u8,
        /// Pixel index
        #[arg(long)]
        pix: u64,
        /// Cut the level-3 cell out of the all-sky composite
        #[arg(long)]
        allsky: bool,
        /// Output PNG path
        #[arg(long)]
        output: PathBuf,
    },

    /// Render a gnomonic view and save it as PNG
    Render {
        /// Right ascension of the view centre in degrees
        #[arg(long, allow_hyphen_values = true)]
        ra: f64,
        /// Declination of the view centre in degrees
        #[arg(long, allow_hyphen_values = true)]
        dec: f64,
        /// Horizontal field of view in degrees
        #[arg(long, default_value = "10")]
        fov: f64,
        /// Tile level (default: chosen from the field of view)
        #[arg(long)]
        level: Option<u8>,
        /// Image width in pixels
        #[arg(long, default_value = "1024")]
        width: u32,
        /// Image height in pixels
        #[arg(long, default_value = "768")]
        height: u32,
        /// Output PNG path
        #[arg(long)]
        output: PathBuf,
    },

    /// List the surveys in the catalog
    Sources,

    /// Manage the disk cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Show or initialize configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        e.exit();
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let options = GlobalOptions {
        source: cli.source,
        config: cli.config,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Index {
            level,
            ra,
            dec,
            galactic,
        } => commands::pixel::run_index(level, ra, dec, galactic),
        Commands::Corners { level, pix } => commands::pixel::run_corners(level, pix),
        Commands::Neighbours { level, pix } => commands::pixel::run_neighbours(level, pix),
        Commands::Fetch {
            level,
            pix,
            allsky,
            output,
        } => commands::fetch::run(
            options,
            FetchArgs {
                level,
                pix,
                allsky,
                output,
            },
        ),
        Commands::Render {
            ra,
            dec,
            fov,
            level,
            width,
            height,
            output,
        } => commands::render::run(
            options,
            RenderArgs {
                ra,
                dec,
                fov,
                level,
                width,
                height,
                output,
            },
        ),
        Commands::Sources => commands::sources::run(&options),
        Commands::Cache { action } => commands::cache::run(options, action),
        Commands::Config { command } => commands::config::run(&options, command),
    }
}
