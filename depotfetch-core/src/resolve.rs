//! High-level pipeline: walks the ordered source list for one title until a
//! source yields manifests, then commits the key file and the download script.
//!
//! # Responsibilities
//! - Normalise the title id before anything touches the network
//! - Try sources strictly in configured order, stopping at the first success
//! - Contain every source failure (including a panicking adapter) so the next source still runs
//! - Commit `{title}.key` and `{title}.sh` only for the winning source
//!
//! # Error Handling
//! Only [`ResolveError::InvalidTitleId`], exhaustion of all sources, and a failed
//! final commit abort the run. Per-source failures are logged and skipped.
//!
//! # Navigation
//! - Main entrypoint: [`Resolver::resolve`]
//! - Supporting types: [`ResolveReport`], [`normalize_title_id`].

use std::panic::AssertUnwindSafe;
use std::path::PathBuf;

use futures::FutureExt;
use tracing::{error, info, warn};

use crate::contract::SourceOutcome;
use crate::error::{FailureKind, ResolveError, SourceFailure};
use crate::script::ScriptEmitter;
use crate::session::Session;
use crate::source::{self, SourceDescriptor};

/// Keep the first all-decimal segment of a hyphen-delimited input.
pub fn normalize_title_id(input: &str) -> Result<String, ResolveError> {
    input
        .trim()
        .split('-')
        .find(|segment| !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .ok_or_else(|| ResolveError::InvalidTitleId(input.to_string()))
}

/// What a successful resolution committed.
#[derive(Debug, Clone)]
pub struct ResolveReport {
    pub title_id: String,
    /// Display label of the winning source.
    pub source: String,
    pub manifests: Vec<String>,
    pub key_file: PathBuf,
    pub script: PathBuf,
}

pub struct Resolver {
    session: Session,
    sources: Vec<SourceDescriptor>,
    emitter: ScriptEmitter,
}

impl Resolver {
    pub fn new(session: Session, sources: Vec<SourceDescriptor>) -> Self {
        Self {
            session,
            sources,
            emitter: ScriptEmitter::new(),
        }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    pub async fn resolve(&self, input: &str) -> Result<ResolveReport, ResolveError> {
        let title_id = normalize_title_id(input)?;
        info!(title_id = %title_id, sources = self.sources.len(), "[RESOLVE] Starting resolution");

        for source in &self.sources {
            info!(title_id = %title_id, source = %source, "[RESOLVE] Selected source");
            match self.attempt_contained(source, &title_id).await {
                Ok(outcome) if !outcome.manifests.is_empty() => {
                    return self.commit(&title_id, source, outcome).await;
                }
                Ok(_) => {
                    warn!(title_id = %title_id, source = %source, "[RESOLVE] Source yielded no manifests");
                }
                Err(failure) => {
                    error!(
                        title_id = %title_id,
                        source = %source,
                        kind = %failure.kind,
                        error = %failure.detail,
                        "[RESOLVE] Source failed"
                    );
                }
            }
        }

        error!(title_id = %title_id, "[RESOLVE] Manifest download or generation failed");
        Err(ResolveError::AllSourcesFailed { title_id })
    }

    /// Run one adapter, turning a panic into an ordinary failure.
    async fn attempt_contained(
        &self,
        source: &SourceDescriptor,
        title_id: &str,
    ) -> Result<SourceOutcome, SourceFailure> {
        AssertUnwindSafe(source::attempt(&self.session, source, title_id))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| Err(SourceFailure::new(FailureKind::Crashed, "adapter panicked")))
    }

    async fn commit(
        &self,
        title_id: &str,
        source: &SourceDescriptor,
        outcome: SourceOutcome,
    ) -> Result<ResolveReport, ResolveError> {
        let store = self.session.store();
        let key_file = store.write_key_file(title_id, &outcome.keys).await?;
        let script = self.emitter.emit(store, title_id, &outcome.manifests).await?;
        info!(
            title_id = %title_id,
            source = %source,
            manifests = outcome.manifests.len(),
            "[RESOLVE] Import successful"
        );
        Ok(ResolveReport {
            title_id: title_id.to_string(),
            source: source.to_string(),
            manifests: outcome.manifests,
            key_file,
            script,
        })
    }
}
