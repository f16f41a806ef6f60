//! Error types shared across the pipeline.
//!
//! Failures are layered: [`FetchError`] for the network, [`DecodeError`] for the
//! format decoders, [`SourceFailure`] as the single tagged failure an adapter
//! hands back to the resolver, and [`ResolveError`] for the handful of outcomes
//! that abort a whole resolution.

use std::fmt;

use thiserror::Error;

/// Transport-level failure for a logical resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Every attempt across every candidate URL failed.
    #[error("unable to download {resource}: retry budget exhausted")]
    UnreachableResource { resource: String },
    #[error("not found: {resource}")]
    NotFound { resource: String },
    #[error("unauthorized: {resource}")]
    Unauthorized { resource: String },
    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {detail}")]
    Connection { url: String, detail: String },
    #[error("invalid response body from {url}: {detail}")]
    InvalidBody { url: String, detail: String },
}

impl FetchError {
    pub(crate) fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Connection {
                url: url.to_string(),
                detail: err.to_string(),
            }
        }
    }
}

/// Failure of one of the format decoders.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("decryption failed: {0}")]
    DecryptionError(String),
    #[error("invalid key: {0}")]
    InvalidKey(String),
    #[error("malformed record: {0}")]
    MalformedRecord(String),
    #[error("container header truncated: got {len} of 12 bytes")]
    TruncatedHeader { len: usize },
    #[error("corrupt container payload: {0}")]
    CorruptPayload(String),
    #[error("malformed key-values document: {0}")]
    MalformedKeyValues(String),
}

/// Coarse classification of why a source did not produce a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The source has nothing for this title.
    NotFound,
    /// Network exhausted its retry budget or returned an unusable status.
    Unreachable,
    /// Credentials were rejected and re-authentication did not help.
    Unauthorized,
    /// Payload arrived but could not be decoded.
    Decode,
    /// Local filesystem error.
    Io,
    /// The source answered but yielded no usable manifest.
    Empty,
    /// The adapter panicked.
    Crashed,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::NotFound => "not found",
            FailureKind::Unreachable => "unreachable",
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::Decode => "decode error",
            FailureKind::Io => "io error",
            FailureKind::Empty => "no manifests",
            FailureKind::Crashed => "adapter crashed",
        };
        f.write_str(label)
    }
}

/// Uniform failure signal returned by every source adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}: {detail}")]
pub struct SourceFailure {
    pub kind: FailureKind,
    pub detail: String,
}

impl SourceFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::NotFound, detail)
    }

    pub fn empty(detail: impl Into<String>) -> Self {
        Self::new(FailureKind::Empty, detail)
    }
}

impl From<FetchError> for SourceFailure {
    fn from(err: FetchError) -> Self {
        let kind = match &err {
            FetchError::NotFound { .. } => FailureKind::NotFound,
            FetchError::Unauthorized { .. } => FailureKind::Unauthorized,
            FetchError::InvalidBody { .. } => FailureKind::Decode,
            FetchError::UnreachableResource { .. }
            | FetchError::Status { .. }
            | FetchError::Timeout { .. }
            | FetchError::Connection { .. } => FailureKind::Unreachable,
        };
        SourceFailure::new(kind, err.to_string())
    }
}

impl From<DecodeError> for SourceFailure {
    fn from(err: DecodeError) -> Self {
        SourceFailure::new(FailureKind::Decode, err.to_string())
    }
}

impl From<std::io::Error> for SourceFailure {
    fn from(err: std::io::Error) -> Self {
        SourceFailure::new(FailureKind::Io, err.to_string())
    }
}

/// Outcomes that abort a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("invalid title id {0:?}: no decimal segment")]
    InvalidTitleId(String),
    #[error("no source could resolve title {title_id}")]
    AllSourcesFailed { title_id: String },
    #[error("failed to write artifacts: {0}")]
    Io(#[from] std::io::Error),
}
