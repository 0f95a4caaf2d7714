//! Hub Validate - check a staged dataset folder against a dataset type
//!
//! Usage:
//!   hub-validate ./uploads/temp/42
//!   hub-validate --type steamcsv ./uploads/temp/42

use anyhow::Result;
use clap::Parser;
use hub_common::{
    kinds::{KindRegistry, DEFAULT_KIND},
    logging::{init_logging, LogConfig, LogLevel},
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "hub-validate")]
#[command(author, version, about = "Validate a dataset folder before upload")]
struct Cli {
    /// Folder holding the dataset files
    folder: PathBuf,

    /// Dataset type key; unknown keys fall back to the default type
    #[arg(short = 't', long = "type", default_value = DEFAULT_KIND)]
    dataset_type: String,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let log_config = LogConfig::builder()
        .level(if cli.verbose { LogLevel::Debug } else { LogLevel::Info })
        .log_file_prefix("hub-validate")
        .build();
    init_logging(&log_config)?;

    let registry = KindRegistry::default();
    let kind = registry.get(&cli.dataset_type);

    info!(folder = %cli.folder.display(), dataset_type = kind.type_key(), "Validating dataset folder");

    match kind.validate_folder(&cli.folder) {
        Ok(()) => {
            info!("Dataset folder is valid");
            Ok(ExitCode::SUCCESS)
        },
        Err(e) => {
            error!("{}", e);
            Ok(ExitCode::FAILURE)
        },
    }
}
