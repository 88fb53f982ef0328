//! reqwest-backed GitHub REST client
//!
//! One retry policy lives here: 5xx responses are retried with exponential
//! backoff (1s base, factor 2, at most 5 attempts) and then become fatal;
//! 4xx responses are never retried. The outer push-retry loop in the writer
//! is keyed on version divergence and is independent of this layer.
//!
//! The credential is an explicit value passed at construction, not ambient
//! state read deep inside request handling.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};

use super::{GitHubApi, PermissionRecord, PullRequest, RepoRef};
use crate::error::VouchError;

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("vouch/", env!("CARGO_PKG_VERSION"));

const MAX_ATTEMPTS: u32 = 5;
const BACKOFF_BASE: Duration = Duration::from_secs(1);

/// Media type that makes the contents endpoint return the file verbatim
const RAW_CONTENT_ACCEPT: &str = "application/vnd.github.raw+json";

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
    max_attempts: u32,
    backoff_base: Duration,
}

impl GitHubClient {
    pub fn new(token: String) -> Result<Self> {
        Self::with_base_url(token, DEFAULT_BASE_URL.to_string())
    }

    /// Construct against a non-default API endpoint (GHES, test servers)
    pub fn with_base_url(token: String, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()
            .context("failed to create HTTP client")?;
        Ok(GitHubClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            max_attempts: MAX_ATTEMPTS,
            backoff_base: BACKOFF_BASE,
        })
    }

    /// Tune the 5xx retry policy. At least one attempt is always made.
    pub fn with_retry_policy(mut self, max_attempts: u32, backoff_base: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.backoff_base = backoff_base;
        self
    }

    /// Issue a request, retrying 5xx with exponential backoff.
    ///
    /// Returns the final response whatever its status; callers decide how to
    /// treat non-success codes (404 is meaningful on several endpoints).
    async fn request(
        &self,
        method: Method,
        path: &str,
        accept: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Response, VouchError> {
        let url = format!("{}{}", self.base_url, path);
        let mut delay = self.backoff_base;

        for attempt in 1..=self.max_attempts {
            let mut req = self
                .client
                .request(method.clone(), &url)
                .header("Authorization", format!("Bearer {}", self.token))
                .header("Accept", accept.unwrap_or("application/vnd.github+json"));
            if let Some(body) = body {
                req = req.json(body);
            }

            let response = req.send().await.map_err(|e| VouchError::Network {
                method: method.to_string(),
                endpoint: path.to_string(),
                source: e,
            })?;

            let status = response.status();
            if !status.is_server_error() {
                return Ok(response);
            }

            if attempt == self.max_attempts {
                return Err(VouchError::TransientPlatform {
                    method: method.to_string(),
                    endpoint: path.to_string(),
                    status: status.as_u16(),
                    attempts: self.max_attempts,
                });
            }

            warn!(
                %method,
                endpoint = path,
                status = status.as_u16(),
                attempt,
                "platform returned a server error, backing off"
            );
            tokio::time::sleep(delay).await;
            delay *= 2;
        }

        unreachable!("retry loop always returns")
    }

    /// Map a non-success (and non-5xx, those never get here) status to a
    /// permanent platform error.
    async fn expect_success(
        method: &Method,
        path: &str,
        response: Response,
    ) -> Result<Response, VouchError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(VouchError::PermanentPlatform {
            method: method.to_string(),
            endpoint: path.to_string(),
            status: status.as_u16(),
            message,
        })
    }
}

#[derive(Deserialize)]
struct RepoInfo {
    default_branch: String,
}

#[derive(Deserialize)]
struct TeamMember {
    login: String,
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn repo_permission(
        &self,
        repo: &RepoRef,
        user: &str,
    ) -> Result<Option<PermissionRecord>> {
        let path = format!(
            "/repos/{}/{}/collaborators/{}/permission",
            repo.owner, repo.name, user
        );
        let response = self.request(Method::GET, &path, None, None).await?;
        if response.status() == StatusCode::NOT_FOUND {
            // Anonymous or non-collaborator: no elevated permission
            return Ok(None);
        }
        let response = Self::expect_success(&Method::GET, &path, response).await?;
        let record: PermissionRecord = response
            .json()
            .await
            .context("failed to parse permission record")?;
        Ok(Some(record))
    }

    async fn default_branch(&self, repo: &RepoRef) -> Result<String> {
        let path = format!("/repos/{}/{}", repo.owner, repo.name);
        let response = self.request(Method::GET, &path, None, None).await?;
        let response = Self::expect_success(&Method::GET, &path, response).await?;
        let info: RepoInfo = response
            .json()
            .await
            .context("failed to parse repository info")?;
        Ok(info.default_branch)
    }

    async fn file_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>> {
        let mut endpoint = format!("/repos/{}/{}/contents/{}", repo.owner, repo.name, path);
        if let Some(git_ref) = git_ref {
            endpoint.push_str(&format!("?ref={git_ref}"));
        }
        let response = self
            .request(Method::GET, &endpoint, Some(RAW_CONTENT_ACCEPT), None)
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::expect_success(&Method::GET, &endpoint, response).await?;
        let text = response
            .text()
            .await
            .context("failed to read file contents")?;
        Ok(Some(text))
    }

    async fn team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>> {
        const PER_PAGE: usize = 100;
        let mut members = Vec::new();
        let mut page = 1;

        // Sequential pagination; parallel fetches would trip rate limits
        loop {
            let path = format!(
                "/orgs/{org}/teams/{team_slug}/members?per_page={PER_PAGE}&page={page}"
            );
            let response = self.request(Method::GET, &path, None, None).await?;
            let response = Self::expect_success(&Method::GET, &path, response).await?;
            let batch: Vec<TeamMember> = response
                .json()
                .await
                .context("failed to parse team member list")?;
            let batch_len = batch.len();
            members.extend(batch.into_iter().map(|m| m.login));
            if batch_len < PER_PAGE {
                break;
            }
            page += 1;
        }

        debug!(org, team_slug, count = members.len(), "expanded team members");
        Ok(members)
    }

    async fn post_issue_comment(&self, repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        let path = format!(
            "/repos/{}/{}/issues/{}/comments",
            repo.owner, repo.name, number
        );
        let payload = json!({ "body": body });
        let response = self
            .request(Method::POST, &path, None, Some(&payload))
            .await?;
        Self::expect_success(&Method::POST, &path, response).await?;
        Ok(())
    }

    async fn close_pull_request(&self, repo: &RepoRef, number: u64) -> Result<()> {
        let path = format!("/repos/{}/{}/pulls/{}", repo.owner, repo.name, number);
        let payload = json!({ "state": "closed" });
        let response = self
            .request(Method::PATCH, &path, None, Some(&payload))
            .await?;
        Self::expect_success(&Method::PATCH, &path, response).await?;
        Ok(())
    }

    async fn create_pull_request(
        &self,
        repo: &RepoRef,
        head: &str,
        base: &str,
        title: &str,
        body: &str,
    ) -> Result<PullRequest> {
        let path = format!("/repos/{}/{}/pulls", repo.owner, repo.name);
        let payload = json!({
            "title": title,
            "head": head,
            "base": base,
            "body": body,
        });
        let response = self
            .request(Method::POST, &path, None, Some(&payload))
            .await?;
        let response = Self::expect_success(&Method::POST, &path, response).await?;
        let pr: PullRequest = response
            .json()
            .await
            .context("failed to parse pull request response")?;
        Ok(pr)
    }
}
