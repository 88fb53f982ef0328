//! Ownership-file handle extraction and team expansion
//!
//! Only the owner handles are consumed here; full path-pattern matching
//! semantics are someone else's problem. Owners containing `/` are org
//! teams and get expanded to member usernames through the platform
//! capability, one team at a time.

use std::collections::BTreeSet;

use anyhow::Result;
use tracing::{debug, warn};

use crate::github::GitHubApi;

/// A single owner reference from an ownership file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Owner {
    User(String),
    Team { org: String, slug: String },
}

impl Owner {
    /// Parse one `@`-prefixed owner token
    fn parse(token: &str) -> Option<Owner> {
        let stripped = token.strip_prefix('@').unwrap_or(token);
        if stripped.is_empty() {
            return None;
        }
        match stripped.split_once('/') {
            Some((org, slug)) if !org.is_empty() && !slug.is_empty() => Some(Owner::Team {
                org: org.to_string(),
                slug: slug.to_string(),
            }),
            Some(_) => None,
            None => Some(Owner::User(stripped.to_string())),
        }
    }
}

/// One ownership rule: a file pattern and its owners
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipRule {
    pub pattern: String,
    pub owners: Vec<Owner>,
}

/// Parse ownership file text. `#` comments and blank lines are ignored;
/// each remaining line is `<pattern> <owner>...`.
pub fn parse(text: &str) -> Vec<OwnershipRule> {
    let mut rules = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let Some(pattern) = tokens.next() else {
            continue;
        };
        let owners: Vec<Owner> = tokens.filter_map(Owner::parse).collect();
        if owners.is_empty() {
            continue;
        }
        rules.push(OwnershipRule {
            pattern: pattern.to_string(),
            owners,
        });
    }
    rules
}

/// Resolve every owner down to a deduplicated set of usernames, expanding
/// teams through the platform. Expansion is sequential by design.
pub async fn resolve_users(rules: &[OwnershipRule], api: &dyn GitHubApi) -> Result<BTreeSet<String>> {
    let mut owners = BTreeSet::new();
    for rule in rules {
        for owner in &rule.owners {
            owners.insert(owner.clone());
        }
    }

    let mut users = BTreeSet::new();
    for owner in owners {
        match owner {
            Owner::User(login) => {
                users.insert(login);
            }
            Owner::Team { org, slug } => {
                debug!(org, team = slug, "expanding team to members");
                let members = api.team_members(&org, &slug).await?;
                if members.is_empty() {
                    warn!(org, team = slug, "team expanded to no members");
                }
                users.extend(members);
            }
        }
    }
    Ok(users)
}
