//! crowdbike CLI - Command-line interface
//!
//! Runs the data logger on the kit and manages its config.ini.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::init::InitArgs;

#[derive(Parser)]
#[command(name = "crowdbike", version)]
#[command(about = "Bike-mounted environmental data logger", long_about = None)]
struct Cli {
    /// Config file (default: ./config.ini)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG is set
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start logging until Ctrl-C
    Run,

    /// Validate the configuration and show the resolved settings
    Check,

    /// Write a new config file
    Init {
        /// Kit number (bike_nr)
        #[arg(long)]
        bike_nr: String,

        /// Operator name (studentname)
        #[arg(long)]
        name: String,

        /// Directory for the CSV data logs (logfile_path)
        #[arg(long, value_name = "DIR")]
        data_dir: PathBuf,

        /// An SDS011 particulate sensor is fitted
        #[arg(long)]
        pm_sensor: bool,

        /// Seconds between records
        #[arg(long)]
        sampling_rate: Option<f64>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    let config = cli.config.as_deref();

    let result = match cli.command {
        Commands::Run => commands::run::run(config, cli.debug),
        Commands::Check => commands::check::run(config),
        Commands::Init {
            bike_nr,
            name,
            data_dir,
            pm_sensor,
            sampling_rate,
            force,
        } => commands::init::run(
            config,
            InitArgs {
                bike_nr,
                name,
                data_dir,
                pm_sensor,
                sampling_rate,
                force,
            },
        ),
    };

    if let Err(e) = result {
        e.exit();
    }
}
