//! Conflict-safe persistence of the trust file
//!
//! The trust file is a shared mutable resource: concurrent invocations may
//! race on it, and a naive push would silently drop the loser's mutation.
//! The writer commits under a fixed bot identity and pushes inside a bounded
//! retry loop; when the remote has diverged it resynchronizes onto the new
//! tip, asks the caller to recompute the same logical mutation against the
//! fresh content, and tries again. There is no distributed lock.
//!
//! Git itself is behind the `GitOps` trait so the protocol is testable with
//! a fake; the production implementation shells out through
//! `tokio::process::Command`.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::VouchError;

/// Name and email used for every commit the writer creates
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub name: String,
    pub email: String,
}

/// Primitive git operations the writer's protocol is built from
#[async_trait]
pub trait GitOps: Send + Sync {
    async fn create_branch(&self, name: &str) -> Result<()>;
    async fn stage(&self, file: &Path) -> Result<()>;
    /// Whether the index differs from HEAD (the empty-commit check)
    async fn has_staged_changes(&self) -> Result<bool>;
    async fn commit(&self, message: &str, identity: &BotIdentity) -> Result<()>;
    /// Push HEAD; `branch` targets a named branch instead of the current one
    async fn push(&self, branch: Option<&str>) -> Result<()>;
    /// Discard local history and move onto the current remote tip
    async fn sync_to_remote(&self) -> Result<()>;
}

/// Result of a persist call
#[derive(Debug)]
pub struct WriteOutcome {
    /// False when the mutation turned out to be a byte-identical no-op
    pub pushed: bool,
    /// The branch pushed to, in branch mode, for opening a pull request
    pub branch: Option<String>,
}

/// Applies a locally written mutation to the shared remote file
pub struct ConflictSafeWriter<'a> {
    git: &'a dyn GitOps,
    identity: BotIdentity,
    max_attempts: u32,
}

impl<'a> ConflictSafeWriter<'a> {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    pub fn new(git: &'a dyn GitOps, identity: BotIdentity) -> Self {
        ConflictSafeWriter {
            git,
            identity,
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Persist the mutation already written at `file`.
    ///
    /// `reapply` recomputes and rewrites the same logical mutation from
    /// scratch against whatever content currently exists on disk; it runs
    /// after every resynchronization, since the original mutation may be
    /// based on stale content by then.
    pub async fn persist(
        &self,
        file: &Path,
        message: &str,
        branch_mode: bool,
        reapply: &(dyn Fn(&Path) -> Result<()> + Send + Sync),
    ) -> Result<WriteOutcome> {
        let branch = branch_mode.then(|| format!("vouch/update-{}", Uuid::new_v4().simple()));
        if let Some(name) = &branch {
            self.git.create_branch(name).await?;
        }

        let mut last_failure = None;
        for attempt in 1..=self.max_attempts {
            self.git.stage(file).await?;
            if !self.git.has_staged_changes().await? {
                // Byte-identical to head: never create an empty commit. On a
                // retry this means a concurrent writer already applied the
                // same logical mutation.
                debug!(file = %file.display(), attempt, "no staged changes, skipping commit");
                return Ok(WriteOutcome {
                    pushed: false,
                    branch,
                });
            }

            self.git.commit(message, &self.identity).await?;

            match self.git.push(branch.as_deref()).await {
                Ok(()) => {
                    info!(file = %file.display(), attempt, branch = ?branch, "pushed trust file update");
                    return Ok(WriteOutcome {
                        pushed: true,
                        branch,
                    });
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "push rejected, resynchronizing and recomputing mutation"
                    );
                    last_failure = Some(err);
                    self.git.sync_to_remote().await?;
                    reapply(file)?;
                }
            }
        }

        Err(VouchError::DivergedPush {
            attempts: self.max_attempts,
            last: last_failure.unwrap_or_else(|| anyhow!("push never attempted")),
        }
        .into())
    }
}

/// `GitOps` implementation shelling out to the `git` binary
pub struct GitCli {
    workdir: PathBuf,
    remote: String,
    /// Base branch to resynchronize onto; detected from the remote when unset
    base_branch: Option<String>,
}

impl GitCli {
    pub fn new(workdir: PathBuf) -> Self {
        GitCli {
            workdir,
            remote: "origin".to_string(),
            base_branch: None,
        }
    }

    pub fn with_base_branch(mut self, base_branch: Option<String>) -> Self {
        self.base_branch = base_branch;
        self
    }

    async fn run(&self, operation: &str, args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .await
            .map_err(|e| VouchError::Git {
                operation: operation.to_string(),
                stderr: e.to_string(),
            })?;
        Ok(output)
    }

    /// Run git and require a zero exit status
    async fn run_checked(&self, operation: &str, args: &[&str]) -> Result<String> {
        let output = self.run(operation, args).await?;
        if !output.status.success() {
            return Err(VouchError::Git {
                operation: operation.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// The branch to resynchronize onto, e.g. `main`
    async fn resolve_base_branch(&self) -> Result<String> {
        if let Some(base) = &self.base_branch {
            return Ok(base.clone());
        }
        let full = self
            .run_checked(
                "symbolic-ref",
                &["symbolic-ref", "--short", "refs/remotes/origin/HEAD"],
            )
            .await?;
        // "origin/main" -> "main"
        Ok(full
            .strip_prefix(&format!("{}/", self.remote))
            .unwrap_or(&full)
            .to_string())
    }
}

#[async_trait]
impl GitOps for GitCli {
    async fn create_branch(&self, name: &str) -> Result<()> {
        self.run_checked("checkout", &["checkout", "-b", name]).await?;
        Ok(())
    }

    async fn stage(&self, file: &Path) -> Result<()> {
        let path = file.to_string_lossy();
        self.run_checked("add", &["add", "--", &path]).await?;
        Ok(())
    }

    async fn has_staged_changes(&self) -> Result<bool> {
        // Exit 0: index matches HEAD; exit 1: staged changes exist
        let output = self
            .run("diff", &["diff", "--cached", "--quiet"])
            .await?;
        match output.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(VouchError::Git {
                operation: "diff".to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into()),
        }
    }

    async fn commit(&self, message: &str, identity: &BotIdentity) -> Result<()> {
        let name = format!("user.name={}", identity.name);
        let email = format!("user.email={}", identity.email);
        self.run_checked(
            "commit",
            &["-c", &name, "-c", &email, "commit", "-m", message],
        )
        .await?;
        Ok(())
    }

    async fn push(&self, branch: Option<&str>) -> Result<()> {
        match branch {
            Some(branch) => {
                let refspec = format!("HEAD:refs/heads/{branch}");
                self.run_checked("push", &["push", &self.remote, &refspec])
                    .await?;
            }
            None => {
                self.run_checked("push", &["push", &self.remote, "HEAD"])
                    .await?;
            }
        }
        Ok(())
    }

    async fn sync_to_remote(&self) -> Result<()> {
        self.run_checked("fetch", &["fetch", &self.remote]).await?;
        let base = self.resolve_base_branch().await?;
        let target = format!("{}/{}", self.remote, base);
        self.run_checked("reset", &["reset", "--hard", &target])
            .await?;
        Ok(())
    }
}
