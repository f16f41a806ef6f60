//! # contract: collaborator interfaces and the records that cross them
//!
//! This module defines the two seams of the pipeline that talk to the outside
//! world, plus the plain data records the adapters hand to the resolver.
//!
//! ## Interface & Extensibility
//! - [`Transport`] performs a single HTTP GET. Retry policy lives in
//!   [`crate::transport`], not in implementors, so a mock transport sees every attempt.
//! - [`CredentialProvider`] supplies (and forgets) the API key of the gated
//!   service. Prompting or storing keys is the implementor's business.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` (`MockTransport`,
//!   `MockCredentialProvider`) behind the `test-export-mocks` feature.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use mockall::automock;

use crate::error::FetchError;

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    /// Sent as `Authorization: Bearer <token>` when present.
    pub bearer: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            bearer: None,
            timeout,
        }
    }

    pub fn with_bearer(mut self, token: Option<&str>) -> Self {
        self.bearer = token.map(str::to_string);
        self
    }
}

/// Status and full body of a completed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Single-attempt HTTP transport.
///
/// Implementors return `Ok` for any response that arrived, whatever its status,
/// and `Err` only when no response arrived (connect error, timeout).
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, FetchError>;
}

/// Supplies the bearer key for the gated service.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// The current key, or `None` when none is available.
    async fn api_key(&self) -> Option<String>;

    /// Drop the current key after the service rejected it.
    async fn invalidate(&self);
}

/// One `{depotId};{decryptionKey}` line of the key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotKey {
    pub depot_id: String,
    pub key: String,
}

impl DepotKey {
    pub fn new(depot_id: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            depot_id: depot_id.into(),
            key: key.into(),
        }
    }
}

/// A depot as decoded from a source, before it is committed to disk.
///
/// `manifest_bytes` is `None` when the manifest is only referenced and must
/// already be on disk; `decryption_key` is `None` when the source carries no key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepotRecord {
    pub depot_id: String,
    pub manifest_id: String,
    pub manifest_bytes: Option<Vec<u8>>,
    /// Lowercase hex.
    pub decryption_key: Option<String>,
}

impl DepotRecord {
    pub fn manifest_file_name(&self) -> String {
        crate::store::manifest_file_name(&self.depot_id, &self.manifest_id)
    }
}

/// What a source produced for one title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOutcome {
    /// Manifest file names present in the artifact directory, in listing order.
    pub manifests: Vec<String>,
    /// Key lines, in source order.
    pub keys: Vec<DepotKey>,
}
