//! Local-script adapter: reads `{title}.st` (preferred) or `{title}.lua` from
//! the output directory and turns its statements into key lines and manifest
//! references. A reference only counts when its manifest file is on disk.

use tracing::{error, info, warn};

use crate::contract::{DepotKey, SourceOutcome};
use crate::decode::{container, script};
use crate::error::{DecodeError, SourceFailure};
use crate::session::Session;

pub fn container_file_name(title_id: &str) -> String {
    format!("{title_id}.st")
}

pub fn plain_script_file_name(title_id: &str) -> String {
    format!("{title_id}.lua")
}

pub async fn attempt(session: &Session, title_id: &str) -> Result<SourceOutcome, SourceFailure> {
    let store = session.store();
    let st_name = container_file_name(title_id);
    let lua_name = plain_script_file_name(title_id);

    let text = if store.exists(&st_name).await {
        info!(file = %st_name, "[LOCAL] Decoding script container");
        container::decode(&store.read(&st_name).await?)?
    } else if store.exists(&lua_name).await {
        info!(file = %lua_name, "[LOCAL] Reading plaintext script");
        String::from_utf8(store.read(&lua_name).await?).map_err(|e| {
            DecodeError::CorruptPayload(format!("{lua_name} is not UTF-8: {e}"))
        })?
    } else {
        error!(lua = %lua_name, st = %st_name, "[LOCAL] No local script found");
        return Err(SourceFailure::not_found(format!(
            "neither {lua_name} nor {st_name} exists in {}",
            store.root().display()
        )));
    };

    let records = script::extract(&text);
    let mut outcome = SourceOutcome::default();
    for depot in records.depots {
        if let Some(key) = depot.key {
            info!(depot_id = %depot.depot_id, "[LOCAL] Parsed addappid with key");
            outcome.keys.push(DepotKey::new(depot.depot_id, key));
        }
    }
    for pin in records.manifests {
        let file_name = pin.file_name();
        if store.exists(&file_name).await {
            info!(file = %file_name, "[LOCAL] Manifest present");
            outcome.manifests.push(file_name);
        } else {
            warn!(file = %file_name, "[LOCAL] Manifest not found on disk");
        }
    }

    if outcome.manifests.is_empty() {
        return Err(SourceFailure::empty(format!(
            "script for {title_id} references no manifest present on disk"
        )));
    }
    Ok(outcome)
}
