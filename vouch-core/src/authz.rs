//! Authorization resolver - who may mutate the trust list
//!
//! Two steps. Step 1 checks the actor's own permission record on the target
//! repository against a role set and a legacy permission set. Step 2, only
//! reached on denial and only when a managers file is configured, delegates
//! the decision to another trust list: the actor is allowed iff that list
//! vouches for them. The delegated lookup is an injected capability so the
//! resolver stays testable and free of a dependency cycle back into the
//! store/platform plumbing.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::github::{GitHubApi, RepoRef};

/// Roles treated as managers when the caller supplies no role set
pub const DEFAULT_ROLES: &[&str] = &["admin", "maintain", "write", "triage"];

/// Legacy permissions treated as managers when *both* sets were left unset
pub const DEFAULT_LEGACY_PERMISSIONS: &[&str] = &["admin", "write"];

/// Delegated managers-file configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ManagersConfig {
    /// Repository holding the managers trust file; defaults to the target repo
    #[serde(default)]
    pub repo: Option<String>,

    /// Path of the managers trust file within that repository
    pub path: String,

    /// Git ref to read from; defaults to that repository's default branch
    #[serde(default, rename = "ref")]
    pub git_ref: Option<String>,
}

/// Per-invocation authorization inputs; never persisted
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AuthzConfig {
    /// Role names allowed to manage the list; `None` means the default set
    #[serde(default)]
    pub roles: Option<Vec<String>>,

    /// Legacy permission strings allowed to manage the list.
    ///
    /// Defaulting is deliberately three-way and must not be collapsed: the
    /// default legacy set applies only when the roles were *also* left at
    /// default. An explicit role set with no explicit legacy set yields an
    /// empty legacy set, and an explicit legacy set always wins verbatim.
    #[serde(default)]
    pub legacy_permissions: Option<Vec<String>>,

    #[serde(default)]
    pub managers: Option<ManagersConfig>,
}

impl AuthzConfig {
    /// Resolve the effective role and legacy permission sets, case-folded
    pub fn effective(&self) -> (HashSet<String>, HashSet<String>) {
        let roles_explicit = self.roles.is_some();

        let roles: HashSet<String> = match &self.roles {
            Some(roles) => roles.iter().map(|r| r.to_lowercase()).collect(),
            None => DEFAULT_ROLES.iter().map(|r| r.to_string()).collect(),
        };

        let legacy: HashSet<String> = match &self.legacy_permissions {
            Some(perms) => perms.iter().map(|p| p.to_lowercase()).collect(),
            None if !roles_explicit => DEFAULT_LEGACY_PERMISSIONS
                .iter()
                .map(|p| p.to_string())
                .collect(),
            None => HashSet::new(),
        };

        (roles, legacy)
    }
}

/// Capability for the delegated managers-file lookup.
///
/// Implementations read the trust file at `path` on `git_ref` in `repo` and
/// report whether it vouches for `user`. The lookup is read-only and must
/// not apply the collaborator short-circuit.
#[async_trait]
pub trait VouchLookup: Send + Sync {
    async fn check_vouched(
        &self,
        user: &str,
        repo: &RepoRef,
        path: &str,
        git_ref: &str,
    ) -> Result<bool>;
}

/// Decides whether an actor may mutate the trust list
pub struct AuthorizationResolver<'a> {
    api: &'a dyn GitHubApi,
    lookup: &'a dyn VouchLookup,
}

impl<'a> AuthorizationResolver<'a> {
    pub fn new(api: &'a dyn GitHubApi, lookup: &'a dyn VouchLookup) -> Self {
        AuthorizationResolver { api, lookup }
    }

    pub async fn can_manage(
        &self,
        actor: &str,
        repo: &RepoRef,
        config: &AuthzConfig,
    ) -> Result<bool> {
        let (roles, legacy) = config.effective();

        // Step 1: the actor's own permission record on the target repo.
        // A 404/anonymous result means "no elevated permission", not an error.
        if let Some(record) = self.api.repo_permission(repo, actor).await? {
            let role_allowed = record
                .role_name
                .as_deref()
                .map(|r| roles.contains(&r.to_lowercase()))
                .unwrap_or(false);
            let legacy_allowed = record
                .permission
                .as_deref()
                .map(|p| legacy.contains(&p.to_lowercase()))
                .unwrap_or(false);
            if role_allowed || legacy_allowed {
                debug!(
                    actor,
                    role = ?record.role_name,
                    permission = ?record.permission,
                    "actor allowed by repository permission"
                );
                return Ok(true);
            }
        }

        // Step 2: delegated managers list, only when configured with a path
        let Some(managers) = &config.managers else {
            return Ok(false);
        };
        if managers.path.trim().is_empty() {
            return Ok(false);
        }

        let managers_repo = match &managers.repo {
            Some(spec) => RepoRef::parse(spec)?,
            None => repo.clone(),
        };
        let git_ref = match &managers.git_ref {
            Some(r) => r.clone(),
            None => self.api.default_branch(&managers_repo).await?,
        };

        debug!(
            actor,
            repo = %managers_repo,
            path = %managers.path,
            git_ref = %git_ref,
            "consulting delegated managers list"
        );
        self.lookup
            .check_vouched(actor, &managers_repo, &managers.path, &git_ref)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_defaults_when_both_unset() {
        let (roles, legacy) = AuthzConfig::default().effective();
        for role in ["admin", "maintain", "write", "triage"] {
            assert!(roles.contains(role), "missing default role {role}");
        }
        assert!(legacy.contains("admin"));
        assert!(legacy.contains("write"));
    }

    #[test]
    fn test_explicit_roles_empty_legacy() {
        let config = AuthzConfig {
            roles: Some(vec!["admin".into()]),
            ..Default::default()
        };
        let (roles, legacy) = config.effective();
        assert_eq!(roles.len(), 1);
        assert!(legacy.is_empty());
    }

    #[test]
    fn test_explicit_legacy_wins_verbatim() {
        let config = AuthzConfig {
            roles: Some(vec!["admin".into()]),
            legacy_permissions: Some(vec!["read".into()]),
            ..Default::default()
        };
        let (_, legacy) = config.effective();
        assert_eq!(legacy.len(), 1);
        assert!(legacy.contains("read"));
    }

    #[test]
    fn test_explicit_legacy_with_default_roles() {
        let config = AuthzConfig {
            legacy_permissions: Some(vec![]),
            ..Default::default()
        };
        let (roles, legacy) = config.effective();
        assert_eq!(roles.len(), DEFAULT_ROLES.len());
        assert!(legacy.is_empty());
    }

    #[test]
    fn test_effective_sets_case_folded() {
        let config = AuthzConfig {
            roles: Some(vec!["Admin".into()]),
            legacy_permissions: Some(vec!["Write".into()]),
            ..Default::default()
        };
        let (roles, legacy) = config.effective();
        assert!(roles.contains("admin"));
        assert!(legacy.contains("write"));
    }
}
