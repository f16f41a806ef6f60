//! Source descriptors and the adapter dispatch table.
//!
//! A [`SourceDescriptor`] names one fetch strategy plus its parameters. The
//! resolver walks an ordered list of them and calls [`attempt`], which routes
//! to the adapter module for that kind. Every adapter returns the same tagged
//! result: a [`SourceOutcome`] or a [`SourceFailure`].
//!
//! # Extension Points
//! - To add a source kind: add a variant here, an adapter module, and an arm in [`attempt`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::contract::SourceOutcome;
use crate::error::SourceFailure;
use crate::session::Session;

pub mod bundle;
pub mod gated;
pub mod github;
pub mod local;
pub mod record;
pub mod tree;

/// Selects the fetch strategy of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceDescriptor {
    /// Usage-gated manifest service behind a bearer API key.
    GatedService(GatedServiceSource),
    /// GitHub repository with one branch per title.
    RepositoryTree(RepositoryTreeSource),
    /// GitHub repository holding an encrypted structured record per title.
    EncryptedRecord(EncryptedRecordSource),
    /// Single zip download per title.
    ZipBundle(ZipBundleSource),
    /// `{title}.st` / `{title}.lua` already in the output directory.
    LocalScript,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatedServiceSource {
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryTreeSource {
    /// `owner/name`.
    pub repo: String,
    /// Key descriptor values are hex of XOR-obfuscated key text.
    #[serde(default)]
    pub xor_key_material: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedRecordSource {
    pub repo: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZipBundleSource {
    /// `{app_id}` is replaced with the title id.
    pub url: String,
    pub bearer: Option<String>,
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDescriptor::GatedService(s) => write!(f, "gated service {}", s.base_url),
            SourceDescriptor::RepositoryTree(s) => write!(f, "repository {}", s.repo),
            SourceDescriptor::EncryptedRecord(s) => write!(f, "encrypted record {}", s.repo),
            SourceDescriptor::ZipBundle(s) => write!(f, "zip bundle {}", s.url),
            SourceDescriptor::LocalScript => f.write_str("local .lua/.st script"),
        }
    }
}

/// Run the adapter for `source` against `title_id`.
pub async fn attempt(
    session: &Session,
    source: &SourceDescriptor,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    match source {
        SourceDescriptor::GatedService(s) => gated::attempt(session, s, title_id).await,
        SourceDescriptor::RepositoryTree(s) => tree::attempt(session, s, title_id).await,
        SourceDescriptor::EncryptedRecord(s) => record::attempt(session, s, title_id).await,
        SourceDescriptor::ZipBundle(s) => bundle::attempt(session, s, title_id).await,
        SourceDescriptor::LocalScript => local::attempt(session, title_id).await,
    }
}
