//! Platform client capability
//!
//! The hosting platform is modeled as a small trait offering the handful of
//! lookups and writes the operations layer needs. Production code uses the
//! reqwest-backed `GitHubClient`; tests swap in fakes.

pub mod client;

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;

pub use client::GitHubClient;

/// An `owner/name` repository reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

impl RepoRef {
    /// Parse an `owner/name` spec
    pub fn parse(spec: &str) -> Result<Self> {
        match spec.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoRef {
                    owner: owner.to_string(),
                    name: name.to_string(),
                })
            }
            _ => bail!("invalid repository spec {spec:?}, expected owner/name"),
        }
    }
}

impl std::fmt::Display for RepoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// A collaborator's permission record on a repository
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionRecord {
    /// Legacy two-ish-valued permission string ("admin", "write", "read", ...)
    pub permission: Option<String>,
    /// Extended role name ("admin", "maintain", "write", "triage", "read")
    pub role_name: Option<String>,
}

/// A pull request created on the caller's behalf
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: String,
}

/// Operations the trust system needs from the hosting platform.
///
/// All calls may block on the network; team member listing paginates
/// sequentially to respect rate limits.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// The actor's permission record, or `None` for 404/anonymous
    async fn repo_permission(&self, repo: &RepoRef, user: &str)
        -> Result<Option<PermissionRecord>>;

    async fn default_branch(&self, repo: &RepoRef) -> Result<String>;

    /// Raw file contents at a ref, or `None` when the file does not exist
    async fn file_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>>;

    /// All member logins of an org team, following pagination
    async fn team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>>;

    async fn post_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()>;

    async fn close_pull_request(&self, repo: &RepoRef, number: u64) -> Result<()>;

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest>;
}
