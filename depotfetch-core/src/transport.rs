//! HTTP transport and the retry layer over it.
//!
//! [`HttpTransport`] is the production [`Transport`], a thin wrapper over a
//! `reqwest::Client`. The free functions below implement the fetch policies the
//! adapters use:
//! - [`fetch_with_retry`]: raw content, 3 rounds across every candidate URL,
//!   any non-200 is an attempt failure.
//! - [`fetch_checked`]: status-aware, 404/401 surface immediately as
//!   `NotFound`/`Unauthorized`, everything else is retried like above.
//! - [`fetch_json`]: single short API call decoded as JSON.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, error, warn};

use crate::contract::{HttpRequest, HttpResponse, Transport};
use crate::error::FetchError;

/// Rounds over the candidate URL list before giving up.
pub const RETRY_ROUNDS: usize = 3;
/// Small JSON/API calls.
pub const API_TIMEOUT: Duration = Duration::from_secs(10);
/// Raw file content (manifests, key descriptors).
pub const CONTENT_TIMEOUT: Duration = Duration::from_secs(30);
/// Zip bundles.
pub const BUNDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// `reqwest`-backed transport.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> reqwest::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("depotfetch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError> {
        let mut builder = self.client.get(&request.url).timeout(request.timeout);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        let response = builder
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_reqwest(&request.url, e))?;
        debug!(url = %request.url, status, bytes = body.len(), "[FETCH] Response received");
        Ok(HttpResponse { status, body })
    }
}

/// Fetch `resource` from any of `urls`, trying every URL once per round.
pub async fn fetch_with_retry(
    transport: &dyn Transport,
    urls: &[String],
    resource: &str,
    timeout: Duration,
) -> Result<Bytes, FetchError> {
    let mut remaining = RETRY_ROUNDS;
    while remaining > 0 {
        for url in urls {
            match transport.send(HttpRequest::get(url.clone(), timeout)).await {
                Ok(response) if response.status == 200 => return Ok(response.body),
                Ok(response) => {
                    error!(resource, status = response.status, "[FETCH] Fetch failed");
                }
                Err(e) => {
                    error!(resource, url = %url, error = %e, "[FETCH] Fetch attempt failed");
                }
            }
        }
        remaining -= 1;
        warn!(resource, remaining, "[FETCH] Retries remaining");
    }
    error!(resource, "[FETCH] Exceeded maximum retry attempts");
    Err(FetchError::UnreachableResource {
        resource: resource.to_string(),
    })
}

/// Status-aware fetch: exactly 200 succeeds, 404 and 401 are reported at once.
pub async fn fetch_checked(
    transport: &dyn Transport,
    request: HttpRequest,
) -> Result<Bytes, FetchError> {
    for round in 1..=RETRY_ROUNDS {
        match transport.send(request.clone()).await {
            Ok(response) => match response.status {
                200 => return Ok(response.body),
                404 => {
                    return Err(FetchError::NotFound {
                        resource: request.url,
                    })
                }
                401 => {
                    return Err(FetchError::Unauthorized {
                        resource: request.url,
                    })
                }
                status => {
                    error!(url = %request.url, status, round, "[FETCH] Unexpected status");
                }
            },
            Err(e) => {
                error!(url = %request.url, error = %e, round, "[FETCH] Fetch attempt failed");
            }
        }
    }
    Err(FetchError::UnreachableResource {
        resource: request.url,
    })
}

/// One API call decoded as JSON; only a 200 counts. Not retried, callers fall through to the next source.
pub async fn fetch_json(
    transport: &dyn Transport,
    url: &str,
    bearer: Option<&str>,
) -> Result<serde_json::Value, FetchError> {
    let request = HttpRequest::get(url, API_TIMEOUT).with_bearer(bearer);
    let response = transport.send(request).await?;
    match response.status {
        200 => {}
        404 => {
            return Err(FetchError::NotFound {
                resource: url.to_string(),
            })
        }
        401 => {
            return Err(FetchError::Unauthorized {
                resource: url.to_string(),
            })
        }
        status => {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            })
        }
    }
    serde_json::from_slice(&response.body).map_err(|e| FetchError::InvalidBody {
        url: url.to_string(),
        detail: e.to_string(),
    })
}
