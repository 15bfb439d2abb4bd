//! Command-line frontend and metrics exporter for Satisfactory saves.

mod commands;
mod config;
mod converter;
mod error;
mod pipeline;
mod server;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{ConverterConfig, ExporterConfig};

#[derive(Parser)]
#[command(
    name = "sb",
    about = "Satisfactory Buddy: power metrics from Satisfactory saves",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch a saves directory and serve power metrics over HTTP
    Serve {
        /// Directory containing save files
        #[arg(long, env = "SAVES_DIR")]
        saves_dir: PathBuf,

        /// Directory the converter writes JSON documents into
        #[arg(long, env = "JSON_DIR")]
        json_dir: PathBuf,

        /// Address to listen on
        #[arg(long, default_value = "0.0.0.0:8081")]
        bind: SocketAddr,

        /// Seconds between refreshes
        #[arg(long, default_value_t = 30)]
        interval: u64,

        /// Seconds to wait after the first failed refresh (doubles per failure)
        #[arg(long, default_value_t = 5)]
        retry: u64,

        /// Converter program
        #[arg(long)]
        converter: Option<String>,

        /// Converter argument placed before the save and output paths (repeatable)
        #[arg(long = "converter-arg", allow_hyphen_values = true)]
        converter_args: Vec<String>,

        /// Directory the converter runs in
        #[arg(long)]
        converter_dir: Option<PathBuf>,
    },

    /// Print the power facts derived from a converted save
    Facts {
        /// Path to the JSON save document
        path: PathBuf,
    },

    /// Summarize a converted save
    Inspect {
        /// Path to the JSON save document
        path: PathBuf,
    },

    /// Print the Prometheus exposition for a converted save
    Metrics {
        /// Path to the JSON save document
        path: PathBuf,
    },
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Serve {
            saves_dir,
            json_dir,
            bind,
            interval,
            retry,
            converter,
            converter_args,
            converter_dir,
        } => {
            let mut converter_config = ConverterConfig::default();
            if let Some(program) = converter {
                converter_config = converter_config.with_program(program);
            }
            if !converter_args.is_empty() {
                converter_config = converter_config.with_args(converter_args);
            }
            if let Some(dir) = converter_dir {
                converter_config = converter_config.with_working_dir(dir);
            }

            let config = ExporterConfig::default()
                .with_saves_dir(saves_dir)
                .with_json_dir(json_dir)
                .with_bind(bind)
                .with_refresh_interval(Duration::from_secs(interval))
                .with_initial_retry(Duration::from_secs(retry))
                .with_converter(converter_config);
            commands::serve::run(config)
        }
        Commands::Facts { path } => commands::facts::run(&path),
        Commands::Inspect { path } => commands::inspect::run(&path),
        Commands::Metrics { path } => commands::metrics::run(&path),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init();
}
