use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::source::{
    EncryptedRecordSource, GatedServiceSource, RepositoryTreeSource, SourceDescriptor,
    ZipBundleSource,
};

/// Base URLs of the GitHub APIs used by repository sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    #[serde(default = "Endpoints::default_api")]
    pub github_api: String,
    #[serde(default = "Endpoints::default_raw")]
    pub github_raw: String,
}

impl Endpoints {
    fn default_api() -> String {
        "https://api.github.com".to_string()
    }

    fn default_raw() -> String {
        "https://raw.githubusercontent.com".to_string()
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: Self::default_api(),
            github_raw: Self::default_raw(),
        }
    }
}

/// Everything one resolution run needs, already merged from file and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    pub output_dir: PathBuf,
    pub sources: Vec<SourceDescriptor>,
    pub github_token: Option<String>,
    #[serde(default)]
    pub endpoints: Endpoints,
}

impl ResolveConfig {
    pub fn trace_loaded(&self) {
        info!(
            output_dir = %self.output_dir.display(),
            sources_count = self.sources.len(),
            github_token_set = self.github_token.is_some(),
            "Loaded ResolveConfig"
        );
        debug!(sources = ?self.sources, "ResolveConfig sources (full debug)");
    }
}

/// The built-in source order, highest priority first.
pub fn default_sources() -> Vec<SourceDescriptor> {
    let tree = |repo: &str| {
        SourceDescriptor::RepositoryTree(RepositoryTreeSource {
            repo: repo.to_string(),
            xor_key_material: false,
        })
    };
    vec![
        SourceDescriptor::GatedService(GatedServiceSource {
            base_url: "https://manifest.morrenus.xyz/api/v1".to_string(),
        }),
        tree("ikun0014/ManifestHub"),
        tree("Auiowu/ManifestAutoUpdate"),
        tree("tymolu233/ManifestAutoUpdate"),
        tree("SteamAutoCracks/ManifestHub"),
        SourceDescriptor::ZipBundle(ZipBundleSource {
            url: "https://api.printedwaste.com/gfk/download/{app_id}".to_string(),
            bearer: Some("dGhpc19pcyBhX3JhbmRvbV90b2tlbg==".to_string()),
        }),
        SourceDescriptor::RepositoryTree(RepositoryTreeSource {
            repo: "sean-who/ManifestAutoUpdate".to_string(),
            xor_key_material: true,
        }),
        SourceDescriptor::EncryptedRecord(EncryptedRecordSource {
            repo: "luckygametools/steam-cfg".to_string(),
        }),
        SourceDescriptor::LocalScript,
    ]
}
