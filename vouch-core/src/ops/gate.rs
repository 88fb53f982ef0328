//! Gate check: screen a pull request or issue author against the trust file
//!
//! Authors whose repository role already grants write access are exempt and
//! skipped. Otherwise the trust file decides: a vouch passes, an explicit
//! denouncement closes the pull request with an explanatory comment, and an
//! unknown author is allowed - absence of a vouch is not evidence of bad
//! faith.

use anyhow::Result;
use tracing::{debug, info};

use super::{load_trust_file, OpsContext};
use crate::github::PermissionRecord;
use crate::trustfile::{EntryKind, TrustFile};

/// Outcome vocabulary for gate checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Author is exempt from gating (already has write access)
    Skipped,
    /// The trust file vouches for the author
    Vouched,
    /// Author is unknown; the gate is permissive
    Allowed,
    /// Author is denounced; the pull request was (or would be) closed
    Closed,
}

impl std::fmt::Display for GateOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GateOutcome::Skipped => "skipped",
            GateOutcome::Vouched => "vouched",
            GateOutcome::Allowed => "allowed",
            GateOutcome::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

fn has_write_access(record: &PermissionRecord) -> bool {
    let role_writes = record
        .role_name
        .as_deref()
        .map(|r| matches!(r.to_lowercase().as_str(), "admin" | "maintain" | "write"))
        .unwrap_or(false);
    let permission_writes = record
        .permission
        .as_deref()
        .map(|p| matches!(p.to_lowercase().as_str(), "admin" | "write"))
        .unwrap_or(false);
    role_writes || permission_writes
}

/// Check `author` of pull request `number` against the trust file
pub async fn gate(ctx: &OpsContext<'_>, author: &str, number: u64) -> Result<GateOutcome> {
    if let Some(record) = ctx.api.repo_permission(&ctx.repo, author).await? {
        if has_write_access(&record) {
            debug!(author, "author already has write access, skipping gate");
            return Ok(GateOutcome::Skipped);
        }
    }

    // Pure read path: a missing trust file is fatal here
    let store = load_trust_file(&ctx.trust_file_path())?;

    match store.find(author, ctx.default_platform()) {
        Some(entry) if entry.kind == EntryKind::Vouch => {
            info!(author, "author is vouched for");
            Ok(GateOutcome::Vouched)
        }
        None => {
            info!(author, "author is unknown to the trust file, allowing");
            Ok(GateOutcome::Allowed)
        }
        Some(_) => {
            let body = close_comment(&store, ctx, author);
            if ctx.dry_run {
                info!(
                    author,
                    number, "dry-run: would comment on and close pull request"
                );
            } else {
                ctx.api.post_issue_comment(&ctx.repo, number, &body).await?;
                ctx.api.close_pull_request(&ctx.repo, number).await?;
                info!(author, number, "closed pull request from denounced author");
            }
            Ok(GateOutcome::Closed)
        }
    }
}

fn close_comment(store: &TrustFile, ctx: &OpsContext<'_>, author: &str) -> String {
    let reason = store
        .find(author, ctx.default_platform())
        .and_then(|entry| entry.details.clone());
    match reason {
        Some(reason) => format!(
            "Closing: @{author} has been denounced on this project's trust list ({reason})."
        ),
        None => format!("Closing: @{author} has been denounced on this project's trust list."),
    }
}
