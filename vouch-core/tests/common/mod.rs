//! Shared fakes for integration tests
//!
//! Each test binary uses a different subset of these.
#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use vouch_core::github::{GitHubApi, PermissionRecord, PullRequest, RepoRef};
use vouch_core::writer::{BotIdentity, GitOps};

/// In-memory platform double; records every write it receives
#[derive(Default)]
pub struct MockGitHub {
    /// user -> permission record for any repo
    pub permissions: HashMap<String, PermissionRecord>,
    /// "owner/name:path@ref" -> file content
    pub files: HashMap<String, String>,
    /// "org/slug" -> member logins
    pub teams: HashMap<String, Vec<String>>,
    pub default_branch: Option<String>,
    pub comments: Mutex<Vec<(u64, String)>>,
    pub closed: Mutex<Vec<u64>>,
    pub pull_requests: Mutex<Vec<(String, String)>>,
}

impl MockGitHub {
    pub fn with_permission(mut self, user: &str, role_name: &str, permission: &str) -> Self {
        self.permissions.insert(
            user.to_string(),
            PermissionRecord {
                permission: Some(permission.to_string()),
                role_name: Some(role_name.to_string()),
            },
        );
        self
    }

    pub fn with_file(mut self, repo: &str, path: &str, git_ref: &str, content: &str) -> Self {
        self.files
            .insert(format!("{repo}:{path}@{git_ref}"), content.to_string());
        self
    }

    pub fn with_team(mut self, org: &str, slug: &str, members: &[&str]) -> Self {
        self.teams.insert(
            format!("{org}/{slug}"),
            members.iter().map(|m| m.to_string()).collect(),
        );
        self
    }
}

#[async_trait]
impl GitHubApi for MockGitHub {
    async fn repo_permission(
        &self,
        _repo: &RepoRef,
        user: &str,
    ) -> Result<Option<PermissionRecord>> {
        Ok(self.permissions.get(user).cloned())
    }

    async fn default_branch(&self, _repo: &RepoRef) -> Result<String> {
        Ok(self
            .default_branch
            .clone()
            .unwrap_or_else(|| "main".to_string()))
    }

    async fn file_contents(
        &self,
        repo: &RepoRef,
        path: &str,
        git_ref: Option<&str>,
    ) -> Result<Option<String>> {
        let key = format!("{repo}:{path}@{}", git_ref.unwrap_or("HEAD"));
        Ok(self.files.get(&key).cloned())
    }

    async fn team_members(&self, org: &str, team_slug: &str) -> Result<Vec<String>> {
        Ok(self
            .teams
            .get(&format!("{org}/{team_slug}"))
            .cloned()
            .unwrap_or_default())
    }

    async fn post_issue_comment(&self, _repo: &RepoRef, number: u64, body: &str) -> Result<()> {
        self.comments
            .lock()
            .unwrap()
            .push((number, body.to_string()));
        Ok(())
    }

    async fn close_pull_request(&self, _repo: &RepoRef, number: u64) -> Result<()> {
        self.closed.lock().unwrap().push(number);
        Ok(())
    }

    async fn create_pull_request(
        &self,
        _repo: &RepoRef,
        head: &str,
        base: &str,
        title: &str,
        _body: &str,
    ) -> Result<PullRequest> {
        self.pull_requests
            .lock()
            .unwrap()
            .push((head.to_string(), title.to_string()));
        let _ = base;
        Ok(PullRequest {
            number: 1,
            html_url: "https://example.invalid/pull/1".to_string(),
        })
    }
}

/// Fake git that simulates a remote with optional push rejections
pub struct FakeGit {
    pub state: Mutex<FakeGitState>,
}

pub struct FakeGitState {
    /// Content of the last commit
    pub head: String,
    /// Content on the remote tip
    pub remote: String,
    /// Staged content, if any
    staged: Option<String>,
    /// Path staged most recently; sync_to_remote rewrites it
    file: Option<PathBuf>,
    /// Number of upcoming pushes to reject as non-fast-forward
    pub reject_pushes: u32,
    pub pushes: u32,
    pub commits: Vec<String>,
    pub branches: Vec<String>,
}

impl FakeGit {
    /// `head` is the content of the local checkout's tip; `remote` the
    /// content currently on the remote (they differ when the checkout is
    /// stale).
    pub fn new(head: &str, remote: &str) -> Self {
        FakeGit {
            state: Mutex::new(FakeGitState {
                head: head.to_string(),
                remote: remote.to_string(),
                staged: None,
                file: None,
                reject_pushes: 0,
                pushes: 0,
                commits: Vec::new(),
                branches: Vec::new(),
            }),
        }
    }

    pub fn rejecting_pushes(self, count: u32) -> Self {
        self.state.lock().unwrap().reject_pushes = count;
        self
    }
}

#[async_trait]
impl GitOps for FakeGit {
    async fn create_branch(&self, name: &str) -> Result<()> {
        self.state.lock().unwrap().branches.push(name.to_string());
        Ok(())
    }

    async fn stage(&self, file: &Path) -> Result<()> {
        let content = std::fs::read_to_string(file)?;
        let mut state = self.state.lock().unwrap();
        state.staged = Some(content);
        state.file = Some(file.to_path_buf());
        Ok(())
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        let state = self.state.lock().unwrap();
        Ok(state.staged.as_deref() != Some(state.head.as_str()))
    }

    async fn commit(&self, message: &str, _identity: &BotIdentity) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let staged = state.staged.take().expect("commit without staged content");
        state.head = staged;
        state.commits.push(message.to_string());
        Ok(())
    }

    async fn push(&self, _branch: Option<&str>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.reject_pushes > 0 {
            state.reject_pushes -= 1;
            bail!("non-fast-forward: remote contains work you do not have locally");
        }
        state.remote = state.head.clone();
        state.pushes += 1;
        Ok(())
    }

    async fn sync_to_remote(&self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        let remote = state.remote.clone();
        if let Some(file) = &state.file {
            std::fs::write(file, &remote)?;
        }
        state.head = remote;
        Ok(())
    }
}
