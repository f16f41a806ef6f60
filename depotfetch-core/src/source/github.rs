//! GitHub API helpers shared by the repository adapters.

use chrono::{Local, TimeZone};
use tracing::{info, warn};

use crate::error::FetchError;
use crate::session::Session;
use crate::transport::fetch_json;

/// Branch head of a per-title branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub sha: String,
    pub tree_url: String,
}

pub fn raw_url(session: &Session, repo: &str, reference: &str, path: &str) -> String {
    format!(
        "{}/{repo}/{reference}/{path}",
        session.endpoints().github_raw.trim_end_matches('/')
    )
}

fn api_url(session: &Session, path: &str) -> String {
    format!(
        "{}/{path}",
        session.endpoints().github_api.trim_end_matches('/')
    )
}

/// Log the remaining API budget. Never fails the caller.
pub async fn log_rate_limit(session: &Session) {
    if session.github_token().is_some() {
        info!("[GITHUB] Using configured GitHub token");
    }
    let url = api_url(session, "rate_limit");
    match fetch_json(session.transport(), &url, session.github_token()).await {
        Ok(json) => {
            let rate = &json["rate"];
            let remaining = rate["remaining"].as_u64().unwrap_or(0);
            info!(remaining, "[GITHUB] API requests remaining");
            if remaining == 0 {
                let reset = rate["reset"]
                    .as_i64()
                    .and_then(|ts| Local.timestamp_opt(ts, 0).single())
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                warn!(
                    reset = %reset,
                    "[GITHUB] API request limit exhausted; configure a github_token to raise it"
                );
            }
        }
        Err(e) => warn!(error = %e, "[GITHUB] Rate limit check failed"),
    }
}

/// Resolve `branches/{branch}` to its commit sha and tree URL.
pub async fn branch_head(
    session: &Session,
    repo: &str,
    branch: &str,
) -> Result<BranchHead, FetchError> {
    let url = api_url(session, &format!("repos/{repo}/branches/{branch}"));
    let json = fetch_json(session.transport(), &url, session.github_token()).await?;
    let commit = &json["commit"];
    match (commit["sha"].as_str(), commit["commit"]["tree"]["url"].as_str()) {
        (Some(sha), Some(tree_url)) => Ok(BranchHead {
            sha: sha.to_string(),
            tree_url: tree_url.to_string(),
        }),
        _ => Err(FetchError::NotFound { resource: url }),
    }
}

/// Paths of a tree listing, in listing order.
pub async fn tree_paths(session: &Session, tree_url: &str) -> Result<Vec<String>, FetchError> {
    let json = fetch_json(session.transport(), tree_url, session.github_token()).await?;
    let entries = json["tree"].as_array().ok_or_else(|| FetchError::NotFound {
        resource: tree_url.to_string(),
    })?;
    Ok(entries
        .iter()
        .filter_map(|entry| entry["path"].as_str().map(str::to_string))
        .collect())
}

/// Path of the entry called `name` inside `contents/{dir}`.
pub async fn find_content(
    session: &Session,
    repo: &str,
    dir: &str,
    name: &str,
) -> Result<String, FetchError> {
    let url = api_url(session, &format!("repos/{repo}/contents/{dir}"));
    let json = fetch_json(session.transport(), &url, session.github_token()).await?;
    json.as_array()
        .and_then(|items| {
            items
                .iter()
                .find(|item| item["name"].as_str() == Some(name))
                .and_then(|item| item["path"].as_str())
        })
        .map(str::to_string)
        .ok_or(FetchError::NotFound {
            resource: format!("{url}/{name}"),
        })
}
