use std::path::PathBuf;

use aip2pdf_core::assemble::{assemble, AssemblyOutcome};
use aip2pdf_core::config::AssembleConfig;
use aip2pdf_core::fetch::HttpFetcher;
use aip2pdf_core::synchronise::synchronise;
use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error, info};

use crate::load_config::{load_assemble_config, load_config};

/// CLI for aip2pdf: mirror the AIP and build printable chart PDFs.
#[derive(Parser)]
#[clap(
    name = "aip2pdf",
    version,
    about = "Mirror the VFR AIP tree locally and assemble one printable PDF per directory"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Mirror the whole tree and rebuild every directory's PDF
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Rebuild the PDF of one already mirrored directory
    Assemble {
        /// Directory holding the page images
        #[clap(long)]
        dir: PathBuf,
        /// Optional YAML config file; only its `assemble` section is read
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => run_sync(config).await,
        Commands::Assemble { dir, config } => run_assemble(dir, config),
    }
}

async fn run_sync(config_path: PathBuf) -> Result<()> {
    let config = load_config(config_path)?;
    config.trace_loaded();

    let fetcher = HttpFetcher::from_config(&config.mirror).map_err(anyhow::Error::msg)?;
    println!("Synchronise starting...");
    match synchronise(&fetcher, &config.mirror, &config.assemble).await {
        Ok(report) => {
            info!(
                folders = report.folders,
                downloaded = report.downloaded,
                unchanged = report.unchanged,
                pdfs = report.pdfs.len(),
                "Synchronise complete"
            );
            match serde_json::to_string(&report) {
                Ok(json) => debug!(report = %json, "Walk report"),
                Err(e) => debug!(error = %e, "Walk report could not be serialised"),
            }
            println!(
                "Synchronise complete: {} folders, {} downloaded, {} unchanged, {} PDFs written.",
                report.folders,
                report.downloaded,
                report.unchanged,
                report.pdfs.len()
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Synchronisation failed");
            eprintln!("[ERROR] Synchronisation failed: {}", e);
            Err(anyhow::Error::msg(e))
        }
    }
}

fn run_assemble(dir: PathBuf, config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => load_assemble_config(path)?,
        None => AssembleConfig::default(),
    };
    config.trace_loaded();

    match assemble(&dir, &config) {
        Ok(AssemblyOutcome::Written { path, pages }) => {
            println!("Wrote {} ({} pages).", path.display(), pages);
            Ok(())
        }
        Ok(AssemblyOutcome::Skipped) => {
            println!("No images to assemble in {}.", dir.display());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, dir = %dir.display(), "Assembly failed");
            eprintln!("[ERROR] Assembly failed: {}", e);
            Err(anyhow::Error::msg(e))
        }
    }
}
