//! Codeowners sync: bulk-vouch everyone who owns part of the tree
//!
//! Ownership implies trust, so this path adds owners who are not already
//! vouched - including upgrading a denounced owner. It never removes or
//! unvouches anyone: the absence of an ownership entry cannot prove the
//! absence of an independently granted vouch.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};

use super::{load_or_init_trust_file, persist, OpsContext};
use crate::codeowners;
use crate::error::VouchError;
use crate::trustfile::TrustStatus;

/// Outcome vocabulary for sync operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Updated,
    Unchanged,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncOutcome::Updated => "updated",
            SyncOutcome::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

/// Locations probed when no ownership file path is configured
const CODEOWNERS_LOCATIONS: &[&str] = &["CODEOWNERS", ".github/CODEOWNERS", "docs/CODEOWNERS"];

fn read_codeowners(ctx: &OpsContext<'_>) -> Result<String> {
    if let Some(path) = &ctx.config.codeowners_path {
        let full = ctx.workdir.join(path);
        return std::fs::read_to_string(&full)
            .with_context(|| format!("failed to read ownership file at {}", full.display()));
    }
    for candidate in CODEOWNERS_LOCATIONS {
        let full = ctx.workdir.join(candidate);
        if full.exists() {
            debug!(path = %full.display(), "found ownership file");
            return std::fs::read_to_string(&full)
                .with_context(|| format!("failed to read ownership file at {}", full.display()));
        }
    }
    Err(VouchError::MissingConfig("ownership file (CODEOWNERS)").into())
}

/// Add-only sync of the ownership file's users into the trust list
pub async fn sync_codeowners(ctx: &OpsContext<'_>) -> Result<SyncOutcome> {
    let text = read_codeowners(ctx)?;
    let rules = codeowners::parse(&text);
    let users = codeowners::resolve_users(&rules, ctx.api).await?;
    info!(count = users.len(), "resolved ownership users");

    let default_platform = ctx.default_platform();
    let store = load_or_init_trust_file(&ctx.trust_file_path())?;
    let to_add: Vec<String> = users
        .into_iter()
        .filter(|user| store.check(user, default_platform) != TrustStatus::Vouched)
        .collect();

    if to_add.is_empty() {
        info!("every owner is already vouched for");
        return Ok(SyncOutcome::Unchanged);
    }

    if ctx.dry_run {
        info!(users = ?to_add, "dry-run: would vouch for owners and push");
        return Ok(SyncOutcome::Updated);
    }

    let apply = |file: &Path| -> Result<()> {
        let mut store = load_or_init_trust_file(file)?;
        for user in &to_add {
            store.add(user, default_platform, None);
        }
        std::fs::write(file, store.serialize())
            .with_context(|| format!("failed to write trust file at {}", file.display()))
    };

    let pushed = persist(ctx, "Sync code owners into trust list", &apply).await?;
    Ok(if pushed {
        SyncOutcome::Updated
    } else {
        SyncOutcome::Unchanged
    })
}
