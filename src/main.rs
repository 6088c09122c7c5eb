//! SignClip command-line tool
//!
//! Stitch, re-split and annotate sequential sign-language video segments.
//!
//! # Usage
//!
//! ```bash
//! signclip upload TVRI_SB_061119_0052.mp4 --folder batch1
//! signclip stitch TVRI_SB_061119_0052
//! signclip cut TVRI_SB_061119_0052 --start 3 --end 12
//! signclip annotate TVRI_SB_061119_0052 --transcript "selamat pagi" --user ana
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use tracing::info;

use signclip::adapters::tracing_log::init_logging;
use signclip::cli::{commands, Cli};
use signclip::config_initialization::initialize_configuration_hierarchy;
use signclip::DomainError;

/// Main entry point for the SignClip CLI application
#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(e) = run(cli).await {
        report_error(&e, json);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let loaded =
        initialize_configuration_hierarchy(&cli).context("Failed to load configuration")?;
    init_logging(&loaded.settings.logging);
    loaded.log_sources();

    info!("Starting SignClip");
    commands::execute(cli, loaded.settings).await?;
    info!("SignClip completed successfully");
    Ok(())
}

/// Print a failure; in JSON mode stdout gets a machine-readable error object
fn report_error(e: &anyhow::Error, json: bool) {
    if json {
        let kind = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<DomainError>())
            .map(DomainError::kind)
            .unwrap_or("error");
        println!(
            "{}",
            json!({ "error": kind, "message": format!("{:#}", e) })
        );
    } else {
        eprintln!("Error: {:#}", e);
    }
}
