//! Renders the `{title}.sh` invocation script for DepotDownloaderMod.

use std::io;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::store::{key_file_name, ArtifactStore};

pub const DEPOT_DOWNLOADER: &str = "DepotDownloaderMod";
pub const DEPOT_DOWNLOADER_ARGS: &str = "-max-downloads 256 -verify-all";
pub const SHEBANG: &str = "#!/usr/bin/env bash";

pub fn script_file_name(title_id: &str) -> String {
    format!("{title_id}.sh")
}

/// Split `{depot}_{manifest}.manifest` at the first `_` and the first `.`.
pub fn parse_manifest_name(name: &str) -> Option<(&str, &str)> {
    let (depot_id, rest) = name.split_once('_')?;
    let (manifest_id, _) = rest.split_once('.')?;
    if depot_id.is_empty() || manifest_id.is_empty() {
        return None;
    }
    Some((depot_id, manifest_id))
}

/// Script text: shebang, blank line, one command per parseable manifest name.
pub fn render(title_id: &str, manifests: &[String]) -> String {
    let key_file = key_file_name(title_id);
    let mut script = format!("{SHEBANG}\n\n");
    for manifest in manifests {
        let Some((depot_id, manifest_id)) = parse_manifest_name(manifest) else {
            warn!(manifest = %manifest, "[SCRIPT] Skipping unparseable manifest name");
            continue;
        };
        script.push_str(&format!(
            "{DEPOT_DOWNLOADER} -app {title_id} -depot {depot_id} -manifest {manifest_id} \
             -manifestfile {manifest} -depotkeys {key_file} {DEPOT_DOWNLOADER_ARGS}\n"
        ));
    }
    script
}

/// Serialises script emission so concurrent resolutions never interleave writes.
#[derive(Debug, Default)]
pub struct ScriptEmitter {
    lock: Mutex<()>,
}

impl ScriptEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn emit(
        &self,
        store: &ArtifactStore,
        title_id: &str,
        manifests: &[String],
    ) -> io::Result<PathBuf> {
        let path = {
            let _guard = self.lock.lock().await;
            info!(title_id, "[SCRIPT] Generating download script");
            store
                .write_replace(&script_file_name(title_id), render(title_id, manifests).as_bytes())
                .await?
        };
        mark_executable(&path).await?;
        Ok(path)
    }
}

#[cfg(unix)]
async fn mark_executable(path: &std::path::Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn mark_executable(_path: &std::path::Path) -> io::Result<()> {
    Ok(())
}
