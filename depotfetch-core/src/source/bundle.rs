//! Zip-bundle adapter and the extraction contract shared with the gated service.

use std::io::{Cursor, Read};

use bytes::Bytes;
use tracing::info;

use crate::contract::{HttpRequest, SourceOutcome};
use crate::error::{DecodeError, SourceFailure};
use crate::session::Session;
use crate::source::{local, ZipBundleSource};
use crate::store::{ArtifactStore, MANIFEST_SUFFIX};
use crate::transport::{fetch_checked, BUNDLE_TIMEOUT};

/// Archive members kept on extraction.
pub const BUNDLE_SUFFIXES: &[&str] = &[MANIFEST_SUFFIX, ".st", ".lua", ".key"];

/// Read every wanted member out of an in-memory zip, names flattened to the
/// base file name. Directory entries and other suffixes are dropped.
pub fn read_bundle(archive: &[u8]) -> Result<Vec<(String, Vec<u8>)>, DecodeError> {
    let corrupt = |e: zip::result::ZipError| DecodeError::CorruptPayload(format!("bad zip: {e}"));
    let mut zip = zip::ZipArchive::new(Cursor::new(archive)).map_err(corrupt)?;
    let mut members = Vec::new();
    for i in 0..zip.len() {
        let mut member = zip.by_index(i).map_err(corrupt)?;
        if member.is_dir() {
            continue;
        }
        let name = member.name().to_string();
        if !BUNDLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            continue;
        }
        let Some(base) = name.rsplit(['/', '\\']).next().filter(|b| !b.is_empty()) else {
            continue;
        };
        let base = base.to_string();
        let mut content = Vec::new();
        member
            .read_to_end(&mut content)
            .map_err(|e| DecodeError::CorruptPayload(format!("failed to read {name}: {e}")))?;
        members.push((base, content));
    }
    Ok(members)
}

/// Write the wanted members into the store. Manifests are write-once;
/// scripts and keys replace whatever was there.
pub async fn extract_bundle(
    store: &ArtifactStore,
    archive: &[u8],
) -> Result<Vec<String>, SourceFailure> {
    let members = read_bundle(archive)?;
    let mut written = Vec::with_capacity(members.len());
    for (name, content) in members {
        info!(file = %name, size = content.len(), "[BUNDLE] Extracting file");
        if name.ends_with(MANIFEST_SUFFIX) {
            store.write_once(&name, &content).await?;
        } else {
            store.write_replace(&name, &content).await?;
        }
        written.push(name);
    }
    Ok(written)
}

/// Extract `archive`, then parse the extracted script for this title.
pub async fn extract_and_parse(
    session: &Session,
    archive: &Bytes,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    let extracted = extract_bundle(session.store(), archive).await?;
    info!(files = extracted.len(), "[BUNDLE] Bundle extracted");
    local::attempt(session, title_id).await
}

pub async fn attempt(
    session: &Session,
    source: &ZipBundleSource,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    let url = source.url.replace("{app_id}", title_id);
    let request = HttpRequest::get(url, BUNDLE_TIMEOUT).with_bearer(source.bearer.as_deref());
    let archive = fetch_checked(session.transport(), request).await?;
    extract_and_parse(session, &archive, title_id).await
}
