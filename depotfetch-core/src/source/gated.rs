//! Gated-service adapter.
//!
//! Flow per key: health check, usage stats, availability for the title, then
//! the zip download, which goes through the same extraction contract as
//! [`crate::source::bundle`]. A 401 at any authenticated step drops the key via
//! the [`crate::contract::CredentialProvider`] and restarts the flow, at most
//! [`MAX_REAUTH`] times.

use tracing::{info, warn};

use crate::contract::{HttpRequest, SourceOutcome};
use crate::error::{FailureKind, FetchError, SourceFailure};
use crate::session::Session;
use crate::source::{bundle, GatedServiceSource};
use crate::transport::{fetch_checked, fetch_json, BUNDLE_TIMEOUT};

pub const MAX_REAUTH: usize = 2;

pub async fn attempt(
    session: &Session,
    source: &GatedServiceSource,
    title_id: &str,
) -> Result<SourceOutcome, SourceFailure> {
    let Some(credentials) = session.credentials() else {
        return Err(SourceFailure::new(
            FailureKind::Unauthorized,
            "no credential provider configured",
        ));
    };
    let base = source.base_url.trim_end_matches('/');

    if !is_healthy(session, base).await {
        warn!(base_url = %base, "[GATED] Service is down");
        return Err(SourceFailure::new(FailureKind::Unreachable, "service health check failed"));
    }

    for round in 0..MAX_REAUTH {
        let Some(api_key) = credentials.api_key().await else {
            return Err(SourceFailure::new(FailureKind::Unauthorized, "no API key available"));
        };
        match fetch_bundle(session, base, &api_key, title_id).await {
            Ok(archive) => return bundle::extract_and_parse(session, &archive, title_id).await,
            Err(FetchError::Unauthorized { resource }) => {
                warn!(resource = %resource, round, "[GATED] API key unauthorized, invalidating");
                credentials.invalidate().await;
            }
            Err(e) => return Err(e.into()),
        }
    }
    Err(SourceFailure::new(
        FailureKind::Unauthorized,
        format!("API key rejected after {MAX_REAUTH} attempts"),
    ))
}

async fn is_healthy(session: &Session, base: &str) -> bool {
    match fetch_json(session.transport(), &format!("{base}/health"), None).await {
        Ok(json) => json["status"].as_str() == Some("healthy"),
        Err(e) => {
            warn!(error = %e, "[GATED] Health check failed");
            false
        }
    }
}

async fn fetch_bundle(
    session: &Session,
    base: &str,
    api_key: &str,
    title_id: &str,
) -> Result<bytes::Bytes, FetchError> {
    let stats = fetch_json(session.transport(), &format!("{base}/user/stats"), Some(api_key)).await?;
    let uses_left = stats["daily_limit"].as_i64().unwrap_or(0) - stats["daily_usage"].as_i64().unwrap_or(0);
    info!(uses_left, "[GATED] Uses left today");

    let status_url = format!("{base}/status/{title_id}");
    let status = fetch_json(session.transport(), &status_url, Some(api_key)).await?;
    if status["status"].as_str() != Some("available") {
        info!(title_id, "[GATED] Title not available");
        return Err(FetchError::NotFound {
            resource: status_url,
        });
    }

    info!(title_id, "[GATED] Title available, downloading");
    let request =
        HttpRequest::get(format!("{base}/manifest/{title_id}"), BUNDLE_TIMEOUT).with_bearer(Some(api_key));
    fetch_checked(session.transport(), request).await
}
