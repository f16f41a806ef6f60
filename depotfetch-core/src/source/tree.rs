//! Repository-tree adapter: one branch per title, holding `*.manifest` files
//! and a `Key.vdf` key descriptor.

use std::path::Path;

use tracing::{info, warn};

use crate::contract::{DepotKey, SourceOutcome};
use crate::decode::{keyvalues, xor};
use crate::error::{DecodeError, SourceFailure};
use crate::session::Session;
use crate::source::github;
use crate::source::RepositoryTreeSource;
use crate::store::{WriteOutcome, MANIFEST_SUFFIX};
use crate::transport::{fetch_with_retry, CONTENT_TIMEOUT};

/// Key applied to sources whose descriptor stores XOR-obfuscated keys.
pub const KEY_MATERIAL_XOR: &[u8] = b"Scalping dogs, I'll fuck you";

fn is_key_descriptor(name: &str) -> bool {
    name == "Key.vdf" || name == "key.vdf"
}

/// Final component of a tree path; the store keeps every artifact flat.
fn base_name(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}

pub async fn attempt(
    session: &Session,
    source: &RepositoryTreeSource,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    github::log_rate_limit(session).await;

    let head = github::branch_head(session, &source.repo, title_id).await?;
    info!(repo = %source.repo, sha = %head.sha, "[TREE] Resolved branch head");
    let paths = github::tree_paths(session, &head.tree_url).await?;

    let mut outcome = SourceOutcome::default();
    for path in &paths {
        let Some(name) = base_name(path) else {
            continue;
        };
        if name.ends_with(MANIFEST_SUFFIX) {
            fetch_manifest(session, source, &head.sha, path, name).await?;
            outcome.manifests.push(name.to_string());
        } else if is_key_descriptor(name) {
            let url = github::raw_url(session, &source.repo, &head.sha, path);
            let body = fetch_with_retry(session.transport(), &[url], path, CONTENT_TIMEOUT).await?;
            info!(path = %path, "[TREE] Key descriptor downloaded");
            outcome.keys = parse_key_descriptor(&body, source.xor_key_material)?;
        }
    }

    if outcome.manifests.is_empty() {
        return Err(SourceFailure::empty(format!(
            "branch {title_id} of {} lists no manifests",
            source.repo
        )));
    }
    Ok(outcome)
}

async fn fetch_manifest(
    session: &Session,
    source: &RepositoryTreeSource,
    sha: &str,
    path: &str,
    name: &str,
) -> Result<(), SourceFailure> {
    let store = session.store();
    if store.exists(name).await {
        warn!(path = %path, "[TREE] Manifest already exists");
        return Ok(());
    }
    let url = github::raw_url(session, &source.repo, sha, path);
    let body = fetch_with_retry(session.transport(), &[url], path, CONTENT_TIMEOUT).await?;
    if store.write_once(name, &body).await? == WriteOutcome::Written {
        info!(path = %path, "[TREE] Manifest downloaded");
    }
    Ok(())
}

/// Decode `Key.vdf` into key lines, undoing the XOR obfuscation when flagged.
pub fn parse_key_descriptor(
    body: &[u8],
    xor_key_material: bool,
) -> Result<Vec<DepotKey>, DecodeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DecodeError::MalformedKeyValues(format!("not UTF-8: {e}")))?;
    keyvalues::depot_keys(text)?
        .into_iter()
        .map(|(depot_id, key)| {
            let key = if xor_key_material {
                deobfuscate_key(&key)?
            } else {
                key
            };
            Ok(DepotKey { depot_id, key })
        })
        .collect()
}

fn deobfuscate_key(hex_key: &str) -> Result<String, DecodeError> {
    let raw = hex::decode(hex_key)
        .map_err(|e| DecodeError::InvalidKey(format!("key {hex_key:?} is not hex: {e}")))?;
    let plain = xor::apply(KEY_MATERIAL_XOR, &raw)?;
    String::from_utf8(plain)
        .map_err(|e| DecodeError::InvalidKey(format!("deobfuscated key is not UTF-8: {e}")))
}
