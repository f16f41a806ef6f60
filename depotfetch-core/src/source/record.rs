//! Encrypted-record adapter: `steamdb2/{title}/00000encrypt.dat`, wrapped in
//! dual-mode AES, then XOR, around a gob-encoded app record carrying both the
//! manifests and the depot keys.

use tracing::info;

use crate::contract::{DepotKey, SourceOutcome};
use crate::decode::{dual_aes, record, xor};
use crate::error::{DecodeError, SourceFailure};
use crate::session::Session;
use crate::source::github;
use crate::source::EncryptedRecordSource;
use crate::transport::{fetch_with_retry, CONTENT_TIMEOUT};

pub const RECORD_FILE: &str = "00000encrypt.dat";
pub const RECORD_DIR: &str = "steamdb2";
pub const RECORD_REF: &str = "main";
pub const RECORD_AES_KEY: &[u8; 16] = b" s  t  e  a  m  ";
pub const RECORD_XOR_KEY: &[u8] = b"hail";

/// Undo both cipher layers and decode the record.
pub fn decode_payload(payload: &[u8]) -> Result<record::AppRecord, DecodeError> {
    let decrypted = dual_aes::decrypt(RECORD_AES_KEY, payload)?;
    let plain = xor::apply(RECORD_XOR_KEY, &decrypted)?;
    record::decode(&plain)
}

pub async fn attempt(
    session: &Session,
    source: &EncryptedRecordSource,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    github::log_rate_limit(session).await;

    let dir = format!("{RECORD_DIR}/{title_id}");
    let path = github::find_content(session, &source.repo, &dir, RECORD_FILE).await?;
    let url = github::raw_url(session, &source.repo, RECORD_REF, &path);
    let payload = fetch_with_retry(session.transport(), &[url], &path, CONTENT_TIMEOUT).await?;
    let app = decode_payload(&payload)?;
    info!(
        repo = %source.repo,
        app_id = app.app_id.as_deref().unwrap_or("?"),
        depots = app.depots.len(),
        "[RECORD] Record decoded"
    );

    let store = session.store();
    let mut outcome = SourceOutcome::default();
    for depot in app.depots {
        let depot = depot.into_depot_record();
        let file_name = depot.manifest_file_name();
        if let Some(bytes) = &depot.manifest_bytes {
            store.write_once(&file_name, bytes).await?;
        }
        if let Some(key) = depot.decryption_key {
            outcome.keys.push(DepotKey::new(depot.depot_id, key));
        }
        outcome.manifests.push(file_name);
    }

    if outcome.manifests.is_empty() {
        return Err(SourceFailure::empty(format!("record for {title_id} has no depots")));
    }
    Ok(outcome)
}
