/// `load_config` module: reads the YAML config file, injects secrets from the
/// environment, and maps it onto the core [`ResolveConfig`].
///
/// # Responsibilities
/// - Parse the user's YAML into typed structs (`serde_yaml`)
/// - Fall back to the built-in source order when `sources` is absent
/// - Let `GITHUB_TOKEN` and `DEPOTFETCH_API_KEY` override the file's secrets
/// - Generate a default config file on first run
///
/// # Errors
/// All errors use `anyhow::Error` and surface at the CLI boundary.
use anyhow::{Context, Result};
use depotfetch_core::config::{default_sources, Endpoints, ResolveConfig};
use depotfetch_core::source::SourceDescriptor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

pub const GITHUB_TOKEN_ENV: &str = "GITHUB_TOKEN";
pub const API_KEY_ENV: &str = "DEPOTFETCH_API_KEY";

/// On-disk shape of the config file.
#[derive(Debug, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default)]
    pub github_token: Option<String>,
    #[serde(default)]
    pub gated_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources: Option<Vec<SourceDescriptor>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoints: Option<Endpoints>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            github_token: Some(String::new()),
            gated_api_key: Some(String::new()),
            sources: Some(default_sources()),
            endpoints: None,
        }
    }
}

#[derive(Debug)]
pub struct CliConfig {
    pub resolve: ResolveConfig,
    pub gated_api_key: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, fallback: Option<String>) -> Option<String> {
    non_blank(std::env::var(name).ok()).or_else(|| non_blank(fallback))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref).map_err(|e| {
        error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
        anyhow::anyhow!("Failed to read config file {:?}: {}", path_ref, e)
    })?;

    let raw: FileConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let sources = raw.sources.unwrap_or_else(default_sources);
    if sources.is_empty() {
        anyhow::bail!("Config {:?} lists no sources", path_ref);
    }

    Ok(CliConfig {
        resolve: ResolveConfig {
            output_dir: raw.output_dir,
            sources,
            github_token: env_or(GITHUB_TOKEN_ENV, raw.github_token),
            endpoints: raw.endpoints.unwrap_or_default(),
        },
        gated_api_key: env_or(API_KEY_ENV, raw.gated_api_key),
    })
}

/// Write a config file holding the default source list and empty secrets.
pub fn write_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    let path_ref = path.as_ref();
    let yaml = serde_yaml::to_string(&FileConfig::default())
        .context("Failed to serialise default config")?;
    if let Some(parent) = path_ref.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }
    fs::write(path_ref, yaml)
        .with_context(|| format!("Failed to write default config {:?}", path_ref))?;
    info!(config_path = ?path_ref, "Generated default config file");
    Ok(())
}
