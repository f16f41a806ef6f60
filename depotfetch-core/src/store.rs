//! Artifact store: the on-disk naming contract and idempotent writers.
//!
//! Everything lives flat in one directory:
//! - `{depot}_{manifest}.manifest`: written once, never overwritten.
//! - `{title}.key`: rewritten in full on every successful run.
//! - `{title}.lua` / `{title}.st`: local script inputs.
//!
//! Writes go to a hidden `*.part` file first and are renamed into place, so an
//! interrupted run never leaves a truncated file under its final name.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::contract::DepotKey;

pub const MANIFEST_SUFFIX: &str = ".manifest";

pub fn manifest_file_name(depot_id: &str, manifest_id: &str) -> String {
    format!("{depot_id}_{manifest_id}{MANIFEST_SUFFIX}")
}

pub fn key_file_name(title_id: &str) -> String {
    format!("{title_id}.key")
}

/// Render key lines as `{depot};{key}\n`.
pub fn render_key_file(keys: &[DepotKey]) -> String {
    keys.iter()
        .map(|k| format!("{};{}\n", k.depot_id, k.key))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    /// A file with that name already existed and was left untouched.
    AlreadyPresent,
}

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `name` inside the store. Only the final path component is kept,
    /// so archive- or tree-internal directories are flattened away.
    pub fn path_for(&self, name: &str) -> io::Result<PathBuf> {
        let base = Path::new(name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty() && *n != "." && *n != "..")
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("artifact name {name:?} has no file component"),
                )
            })?;
        Ok(self.root.join(base))
    }

    pub async fn ensure_root(&self) -> io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await
    }

    pub async fn exists(&self, name: &str) -> bool {
        match self.path_for(name) {
            Ok(path) => tokio::fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }

    pub async fn read(&self, name: &str) -> io::Result<Vec<u8>> {
        tokio::fs::read(self.path_for(name)?).await
    }

    /// Write `bytes` under `name` unless a file of that name already exists.
    ///
    /// Presence is decided by name alone; differing content is not detected.
    pub async fn write_once(&self, name: &str, bytes: &[u8]) -> io::Result<WriteOutcome> {
        let path = self.path_for(name)?;
        if tokio::fs::try_exists(&path).await? {
            warn!(path = %path.display(), "[STORE] Artifact already exists, keeping it");
            return Ok(WriteOutcome::AlreadyPresent);
        }
        self.write_atomic(&path, bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "[STORE] Artifact written");
        Ok(WriteOutcome::Written)
    }

    /// Write `bytes` under `name`, replacing any existing file.
    pub async fn write_replace(&self, name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        let path = self.path_for(name)?;
        self.write_atomic(&path, bytes).await?;
        debug!(path = %path.display(), bytes = bytes.len(), "[STORE] Artifact replaced");
        Ok(path)
    }

    /// Rewrite `{title}.key` from this run's keys. Earlier lines are discarded.
    pub async fn write_key_file(&self, title_id: &str, keys: &[DepotKey]) -> io::Result<PathBuf> {
        let path = self
            .write_replace(&key_file_name(title_id), render_key_file(keys).as_bytes())
            .await?;
        info!(path = %path.display(), keys = keys.len(), "[STORE] Key file written");
        Ok(path)
    }

    async fn write_atomic(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        self.ensure_root().await?;
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("artifact");
        let temp = self
            .root
            .join(format!(".{file_name}.{}.part", uuid::Uuid::new_v4()));
        if let Err(e) = tokio::fs::write(&temp, bytes).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        if let Err(e) = tokio::fs::rename(&temp, path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e);
        }
        Ok(())
    }
}
