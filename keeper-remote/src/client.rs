//! Blocking GitHub client.
//!
//! Commit metadata comes from the REST API; file content comes from the raw
//! host at a commit-addressed URL, so content never changes under a fixed
//! commit id even if the branch moves.

use serde::Deserialize;

use keeper_core::{CommitId, CommitInfo, TrackedFile, UpdaterConfig};

use crate::error::{from_ureq, malformed, RemoteError};
use crate::RemoteSource;

/// HTTP implementation of [`RemoteSource`] built from an [`UpdaterConfig`].
pub struct GitHubClient {
    agent: ureq::Agent,
    config: UpdaterConfig,
}

impl GitHubClient {
    /// Build a client whose every request is bounded by `config.timeout()`.
    pub fn new(config: &UpdaterConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.timeout())
            .user_agent(&config.user_agent)
            .build();
        Self {
            agent,
            config: config.clone(),
        }
    }

    fn get_text(&self, url: &str) -> Result<String, RemoteError> {
        tracing::debug!(%url, "GET");
        let response = self.agent.get(url).call().map_err(|e| from_ureq(url, e))?;
        response.into_string().map_err(|e| malformed(url, e))
    }
}

impl RemoteSource for GitHubClient {
    fn latest_commit(&self, branch: &str) -> Result<CommitInfo, RemoteError> {
        let url = self.config.commit_url(branch);
        let body = self.get_text(&url)?;
        parse_commit(&url, &body)
    }

    fn fetch_file(&self, file: &TrackedFile, commit: &CommitId) -> Result<String, RemoteError> {
        let url = self.config.raw_url(commit, file);
        self.get_text(&url)
    }
}

// ---------------------------------------------------------------------------
// Commit payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CommitResponse {
    sha: String,
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
    committer: Committer,
    author: Author,
}

#[derive(Debug, Deserialize)]
struct Committer {
    date: String,
}

#[derive(Debug, Deserialize)]
struct Author {
    name: String,
}

fn parse_commit(url: &str, body: &str) -> Result<CommitInfo, RemoteError> {
    let payload: CommitResponse = serde_json::from_str(body).map_err(|e| malformed(url, e))?;
    if payload.sha.trim().is_empty() {
        return Err(malformed(url, "empty commit sha"));
    }
    let message = payload
        .commit
        .message
        .lines()
        .next()
        .unwrap_or_default()
        .to_owned();
    Ok(CommitInfo {
        id: CommitId(payload.sha),
        message,
        date: payload.commit.committer.date,
        author: payload.commit.author.name,
    })
}
