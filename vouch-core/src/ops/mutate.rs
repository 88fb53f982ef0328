//! Mutation operations: comment-driven and direct
//!
//! A mutation either fully lands (one pushed commit reflecting exactly one
//! logical change) or the trust file stays untouched. "Nothing to do" cases
//! - no matching action, unauthorized actor, byte-identical result - are
//! ordinary `Unchanged` outcomes, not errors.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{authorize, load_or_init_trust_file, persist, OpsContext};
use crate::comment::CommentAction;
use crate::trustfile::TrustFile;

/// Outcome vocabulary for mutation operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationOutcome {
    Vouched,
    Denounced,
    Unvouched,
    Unchanged,
}

impl std::fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationOutcome::Vouched => "vouched",
            MutationOutcome::Denounced => "denounced",
            MutationOutcome::Unvouched => "unvouched",
            MutationOutcome::Unchanged => "unchanged",
        };
        write!(f, "{s}")
    }
}

/// One logical change to the trust list
pub(crate) enum Mutation {
    Vouch { user: String, details: Option<String> },
    Denounce { user: String, reason: String },
    Unvouch { user: String },
}

impl Mutation {
    fn apply_to(&self, store: &mut TrustFile, default_platform: Option<&str>) {
        match self {
            Mutation::Vouch { user, details } => {
                store.add(user, default_platform, details.clone())
            }
            Mutation::Denounce { user, reason } => store.denounce(user, reason, default_platform),
            Mutation::Unvouch { user } => store.remove(user, default_platform),
        }
    }

    fn outcome(&self) -> MutationOutcome {
        match self {
            Mutation::Vouch { .. } => MutationOutcome::Vouched,
            Mutation::Denounce { .. } => MutationOutcome::Denounced,
            Mutation::Unvouch { .. } => MutationOutcome::Unvouched,
        }
    }

    fn commit_message(&self) -> String {
        match self {
            Mutation::Vouch { user, .. } => format!("Vouch for {user}"),
            Mutation::Denounce { user, .. } => format!("Denounce {user}"),
            Mutation::Unvouch { user } => format!("Remove vouch for {user}"),
        }
    }
}

/// Handle a free-text comment from `actor`.
///
/// Unauthorized actors and comments without a recognizable action or target
/// all resolve to `Unchanged`.
pub async fn apply_comment(
    ctx: &OpsContext<'_>,
    actor: &str,
    body: &str,
) -> Result<MutationOutcome> {
    let parser = ctx.config.comment_parser()?;
    let request = parser.parse(body);

    let Some(action) = request.action else {
        debug!(actor, "comment matched no action");
        return Ok(MutationOutcome::Unchanged);
    };
    let Some(target) = request.target else {
        warn!(actor, ?action, "comment matched an action but named no target");
        return Ok(MutationOutcome::Unchanged);
    };

    if !authorize(ctx, actor).await? {
        info!(actor, ?action, target, "actor is not allowed to manage the trust list");
        return Ok(MutationOutcome::Unchanged);
    }

    let mutation = match action {
        CommentAction::Vouch => Mutation::Vouch {
            user: target,
            details: (!request.reason.is_empty()).then(|| request.reason.clone()),
        },
        CommentAction::Denounce => Mutation::Denounce {
            user: target,
            reason: request.reason.clone(),
        },
        CommentAction::Unvouch => Mutation::Unvouch { user: target },
    };

    persist_mutation(ctx, &mutation).await
}

/// Vouch for a user directly. When `actor` is given it is authorized first;
/// a local operator invocation passes `None`.
pub async fn vouch(
    ctx: &OpsContext<'_>,
    actor: Option<&str>,
    user: &str,
    details: Option<String>,
) -> Result<MutationOutcome> {
    direct(ctx, actor, Mutation::Vouch {
        user: user.to_string(),
        details,
    })
    .await
}

pub async fn denounce(
    ctx: &OpsContext<'_>,
    actor: Option<&str>,
    user: &str,
    reason: &str,
) -> Result<MutationOutcome> {
    direct(ctx, actor, Mutation::Denounce {
        user: user.to_string(),
        reason: reason.to_string(),
    })
    .await
}

pub async fn unvouch(
    ctx: &OpsContext<'_>,
    actor: Option<&str>,
    user: &str,
) -> Result<MutationOutcome> {
    direct(ctx, actor, Mutation::Unvouch {
        user: user.to_string(),
    })
    .await
}

async fn direct(
    ctx: &OpsContext<'_>,
    actor: Option<&str>,
    mutation: Mutation,
) -> Result<MutationOutcome> {
    if let Some(actor) = actor {
        if !authorize(ctx, actor).await? {
            info!(actor, "actor is not allowed to manage the trust list");
            return Ok(MutationOutcome::Unchanged);
        }
    }
    persist_mutation(ctx, &mutation).await
}

async fn persist_mutation(ctx: &OpsContext<'_>, mutation: &Mutation) -> Result<MutationOutcome> {
    let default_platform = ctx.default_platform();
    let path = ctx.trust_file_path();

    if ctx.dry_run {
        let before = load_or_init_trust_file(&path)?;
        let mut after = before.clone();
        mutation.apply_to(&mut after, default_platform);
        let changed = !path.exists() || after.serialize() != before.serialize();
        info!(
            message = mutation.commit_message(),
            changed,
            "dry-run: would write trust file and push"
        );
        return Ok(if changed {
            mutation.outcome()
        } else {
            MutationOutcome::Unchanged
        });
    }

    let apply = |file: &Path| -> Result<()> {
        let mut store = load_or_init_trust_file(file)?;
        mutation.apply_to(&mut store, default_platform);
        std::fs::write(file, store.serialize())
            .with_context(|| format!("failed to write trust file at {}", file.display()))
    };

    let pushed = persist(ctx, &mutation.commit_message(), &apply).await?;
    Ok(if pushed {
        mutation.outcome()
    } else {
        MutationOutcome::Unchanged
    })
}
