//! Pattern extraction over Lua-style depot scripts.
//!
//! Two statements matter, anywhere in the text and in any order:
//! - `addappid(<depot>[, <mode>, "<hexKey>"])`: a depot and its optional key.
//! - `setManifestid(<depot>, "<manifest>"[, <size>])`: the manifest pinned for a depot.

use std::sync::LazyLock;

use regex::Regex;

static ADDAPPID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"addappid\(\s*(\d+)\s*(?:,\s*\d+\s*,\s*"([0-9a-fA-F]+)"\s*)?\)"#).unwrap()
});

static SET_MANIFEST_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"setManifestid\(\s*(\d+)\s*,\s*"(\d+)"\s*(?:,\s*\d+\s*)?\)"#).unwrap()
});

/// A depot declared by `addappid`. `key` keeps the source's case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDepot {
    pub depot_id: String,
    pub key: Option<String>,
}

/// A manifest reference declared by `setManifestid`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPin {
    pub depot_id: String,
    pub manifest_id: String,
}

impl ManifestPin {
    pub fn file_name(&self) -> String {
        crate::store::manifest_file_name(&self.depot_id, &self.manifest_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptRecords {
    pub depots: Vec<ScriptDepot>,
    pub manifests: Vec<ManifestPin>,
}

pub fn extract(text: &str) -> ScriptRecords {
    let depots = ADDAPPID
        .captures_iter(text)
        .map(|caps| ScriptDepot {
            depot_id: caps[1].to_string(),
            key: caps.get(2).map(|m| m.as_str().to_string()),
        })
        .collect();
    let manifests = SET_MANIFEST_ID
        .captures_iter(text)
        .map(|caps| ManifestPin {
            depot_id: caps[1].to_string(),
            manifest_id: caps[2].to_string(),
        })
        .collect();
    ScriptRecords { depots, manifests }
}
