//! Operations layer - the entry points behind each inbound event
//!
//! Every operation follows the same shape: load the trust file fresh, gate
//! the actor, mutate in memory, persist through the conflict-safe writer.
//! No state survives between invocations. Outcomes come from closed
//! vocabularies so callers (and CI logs) see exactly one word per run.
//!
//! In dry-run mode every side-effecting step becomes a logged prediction;
//! no file is written and no mutating platform or VCS call is made.

pub mod gate;
pub mod mutate;
pub mod sync;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::authz::{AuthorizationResolver, VouchLookup};
use crate::config::VouchConfig;
use crate::error::VouchError;
use crate::github::{GitHubApi, RepoRef};
use crate::trustfile::{TrustFile, TrustStatus, INIT_TEMPLATE};
use crate::writer::{BotIdentity, ConflictSafeWriter, GitOps};

pub use gate::{gate, GateOutcome};
pub use mutate::{apply_comment, denounce, unvouch, vouch, MutationOutcome};
pub use sync::{sync_codeowners, SyncOutcome};

/// Everything one invocation needs; constructed per run, never persisted
pub struct OpsContext<'a> {
    pub api: &'a dyn GitHubApi,
    pub git: &'a dyn GitOps,
    pub config: &'a VouchConfig,
    /// The repository whose trust list is being managed
    pub repo: RepoRef,
    /// Local checkout containing the trust file
    pub workdir: PathBuf,
    pub dry_run: bool,
}

impl<'a> OpsContext<'a> {
    pub fn trust_file_path(&self) -> PathBuf {
        self.workdir.join(&self.config.trust_file)
    }

    fn default_platform(&self) -> Option<&str> {
        self.config.default_platform.as_deref()
    }

    fn writer(&self) -> ConflictSafeWriter<'a> {
        ConflictSafeWriter::new(
            self.git,
            BotIdentity {
                name: self.config.bot.name.clone(),
                email: self.config.bot.email.clone(),
            },
        )
        .with_max_attempts(self.config.max_push_attempts)
    }
}

/// Pure read of a user's status from the local trust file.
///
/// A missing file is fatal here; only mutation paths auto-initialize. Takes
/// config and workdir directly so callers need no platform client for a
/// local lookup.
pub fn check(config: &VouchConfig, workdir: &Path, username: &str) -> Result<TrustStatus> {
    let path = workdir.join(&config.trust_file);
    let store = load_trust_file(&path)?;
    Ok(store.check(username, config.default_platform.as_deref()))
}

pub(crate) fn load_trust_file(path: &Path) -> Result<TrustFile> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(VouchError::MissingTrustFile {
                path: path.to_path_buf(),
            }
            .into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read trust file at {}", path.display()))
        }
    };
    Ok(TrustFile::parse(&text))
}

/// Read the trust file, or start from the templated header when it does not
/// exist yet. Mutation paths only.
pub(crate) fn load_or_init_trust_file(path: &Path) -> Result<TrustFile> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(TrustFile::parse(&text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "trust file missing, initializing from template");
            Ok(TrustFile::parse(INIT_TEMPLATE))
        }
        Err(e) => {
            Err(e).with_context(|| format!("failed to read trust file at {}", path.display()))
        }
    }
}

/// Decide whether `actor` may mutate this repository's trust list
pub(crate) async fn authorize(ctx: &OpsContext<'_>, actor: &str) -> Result<bool> {
    let lookup = ApiVouchLookup {
        api: ctx.api,
        default_platform: ctx.config.default_platform.clone(),
    };
    let resolver = AuthorizationResolver::new(ctx.api, &lookup);
    resolver.can_manage(actor, &ctx.repo, &ctx.config.authz).await
}

/// Production managers-file lookup: fetch the file over the platform API and
/// check it directly. No collaborator short-circuit applies on this path.
struct ApiVouchLookup<'a> {
    api: &'a dyn GitHubApi,
    default_platform: Option<String>,
}

#[async_trait]
impl VouchLookup for ApiVouchLookup<'_> {
    async fn check_vouched(
        &self,
        user: &str,
        repo: &RepoRef,
        path: &str,
        git_ref: &str,
    ) -> Result<bool> {
        let Some(text) = self.api.file_contents(repo, path, Some(git_ref)).await? else {
            return Err(VouchError::MissingTrustFile { path: path.into() }.into());
        };
        let store = TrustFile::parse(&text);
        Ok(store.check(user, self.default_platform.as_deref()) == TrustStatus::Vouched)
    }
}

/// Persist the trust file produced by `apply`, opening a pull request when
/// branch mode is on. Returns false when the mutation was a byte-identical
/// no-op.
pub(crate) async fn persist(
    ctx: &OpsContext<'_>,
    commit_message: &str,
    apply: &(dyn Fn(&Path) -> Result<()> + Send + Sync),
) -> Result<bool> {
    let path = ctx.trust_file_path();
    apply(&path)?;

    let outcome = ctx
        .writer()
        .persist(
            &path,
            commit_message,
            ctx.config.update_via_pull_request,
            apply,
        )
        .await?;

    if !outcome.pushed {
        return Ok(false);
    }

    if let Some(branch) = &outcome.branch {
        let base = ctx.api.default_branch(&ctx.repo).await?;
        let pr = ctx
            .api
            .create_pull_request(
                &ctx.repo,
                branch,
                &base,
                commit_message,
                "Automated trust list update. Review and merge to apply.",
            )
            .await?;
        info!(number = pr.number, url = %pr.html_url, "opened pull request for trust list update");
    }

    Ok(true)
}
