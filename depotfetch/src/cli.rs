//! # depotfetch CLI Interface
//!
//! Command parsing and orchestration for the `depotfetch` binary. Everything
//! that touches the network or decodes a payload lives in [`depotfetch_core`];
//! this module only wires configuration, credentials and the resolver together
//! and reports the outcome.
//!
//! ## How To Use
//! - From the shell: `depotfetch fetch <APP_ID> [--config config.yaml]`.
//! - Programmatically (tests): build a [`Cli`] and call [`run`].
//!
//! ## Extending
//! Add a variant to [`Commands`] and keep any non-trivial logic in `depotfetch-core`.
use crate::credentials::StaticCredentials;
use crate::load_config::{load_config, write_default_config};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use depotfetch_core::resolve::{normalize_title_id, Resolver};
use depotfetch_core::session::Session;
use depotfetch_core::transport::HttpTransport;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI for depotfetch: resolve depot manifests and keys for a title.
#[derive(Parser)]
#[clap(
    name = "depotfetch",
    version,
    about = "Fetch depot manifests and decryption keys for a title and emit a DepotDownloaderMod script"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve manifests and keys for one title id (e.g. `228980` or `228980-dlc`)
    Fetch {
        /// Title id; the first all-digit hyphen-separated segment is used
        app_id: String,
        /// Path to the YAML config file; a default one is generated if missing
        #[clap(long, default_value = "config.yaml")]
        config: PathBuf,
        /// Overrides `output_dir` from the config file
        #[clap(long)]
        output_dir: Option<PathBuf>,
    },
}

/// Async CLI entrypoint shared by `main` and the integration tests.
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Fetch {
            app_id,
            config,
            output_dir,
        } => fetch(&app_id, &config, output_dir).await,
    }
}

async fn fetch(app_id: &str, config_path: &Path, output_dir: Option<PathBuf>) -> Result<()> {
    // Validate before anything else so a bad id never reaches the network.
    let title_id = normalize_title_id(app_id)?;
    tracing::info!(command = "fetch", title_id = %title_id, "Title id accepted");

    if !config_path.exists() {
        write_default_config(config_path)?;
        println!(
            "No config found; wrote defaults to {}. Fill in github_token / gated_api_key if you have them and run again.",
            config_path.display()
        );
        return Ok(());
    }

    let mut config = load_config(config_path)?;
    if let Some(dir) = output_dir {
        config.resolve.output_dir = dir;
    }
    config.resolve.trace_loaded();

    let transport = HttpTransport::new().context("Failed to construct HTTP client")?;
    let session = Session::from_config(Arc::new(transport), &config.resolve)
        .with_credentials(Arc::new(StaticCredentials::new(config.gated_api_key.clone())));
    let resolver = Resolver::new(session, config.resolve.sources.clone());

    match resolver.resolve(&title_id).await {
        Ok(report) => {
            tracing::info!(command = "fetch", ?report, "Resolution complete");
            println!(
                "Resolved {} from {}: {} manifest(s)\n  keys:   {}\n  script: {}",
                report.title_id,
                report.source,
                report.manifests.len(),
                report.key_file.display(),
                report.script.display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(command = "fetch", error = %e, "Resolution failed");
            Err(e).with_context(|| format!("Could not resolve title {title_id}"))
        }
    }
}
