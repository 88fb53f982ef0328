//! Configuration for the vouch system
//!
//! Loaded from an optional `.vouch.yml` at the repository root, with every
//! field defaulted so an empty (or absent) file is a valid configuration.
//! `dry_run` is deliberately not part of the file config; it is only ever
//! set from the CLI flag.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::authz::AuthzConfig;
use crate::comment::CommentParser;

/// Default file name for the on-disk configuration
pub const CONFIG_FILE: &str = ".vouch.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VouchConfig {
    /// Path of the trust file, relative to the repository root
    #[serde(default = "default_trust_file")]
    pub trust_file: String,

    /// Platform assumed for entries and lookups that name none
    #[serde(default = "default_platform")]
    pub default_platform: Option<String>,

    #[serde(default)]
    pub keywords: KeywordConfig,

    #[serde(default)]
    pub authz: AuthzConfig,

    /// Push mutations to a new branch and open a pull request instead of
    /// writing to the default branch directly
    #[serde(default)]
    pub update_via_pull_request: bool,

    #[serde(default = "default_max_push_attempts")]
    pub max_push_attempts: u32,

    #[serde(default)]
    pub bot: BotConfig,

    /// Ownership file consumed by the sync path; the usual locations are
    /// probed when unset
    #[serde(default)]
    pub codeowners_path: Option<String>,
}

impl Default for VouchConfig {
    fn default() -> Self {
        VouchConfig {
            trust_file: default_trust_file(),
            default_platform: default_platform(),
            keywords: KeywordConfig::default(),
            authz: AuthzConfig::default(),
            update_via_pull_request: false,
            max_push_attempts: default_max_push_attempts(),
            bot: BotConfig::default(),
            codeowners_path: None,
        }
    }
}

fn default_trust_file() -> String {
    ".vouch".to_string()
}

fn default_platform() -> Option<String> {
    Some("github".to_string())
}

fn default_max_push_attempts() -> u32 {
    3
}

/// Keyword sets driving the comment grammar, with per-action enable flags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordConfig {
    #[serde(default = "default_vouch_keywords")]
    pub vouch: Vec<String>,
    #[serde(default = "default_denounce_keywords")]
    pub denounce: Vec<String>,
    #[serde(default = "default_unvouch_keywords")]
    pub unvouch: Vec<String>,

    #[serde(default = "default_true")]
    pub allow_vouch: bool,
    #[serde(default = "default_true")]
    pub allow_denounce: bool,
    #[serde(default = "default_true")]
    pub allow_unvouch: bool,
}

impl Default for KeywordConfig {
    fn default() -> Self {
        KeywordConfig {
            vouch: default_vouch_keywords(),
            denounce: default_denounce_keywords(),
            unvouch: default_unvouch_keywords(),
            allow_vouch: true,
            allow_denounce: true,
            allow_unvouch: true,
        }
    }
}

fn default_vouch_keywords() -> Vec<String> {
    vec!["vouch".to_string()]
}

fn default_denounce_keywords() -> Vec<String> {
    vec!["denounce".to_string()]
}

fn default_unvouch_keywords() -> Vec<String> {
    vec!["unvouch".to_string()]
}

fn default_true() -> bool {
    true
}

/// Identity used for commits the system creates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_bot_name")]
    pub name: String,
    #[serde(default = "default_bot_email")]
    pub email: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        BotConfig {
            name: default_bot_name(),
            email: default_bot_email(),
        }
    }
}

fn default_bot_name() -> String {
    "vouch-bot".to_string()
}

fn default_bot_email() -> String {
    "vouch-bot@users.noreply.github.com".to_string()
}

impl VouchConfig {
    /// Load configuration from an explicit path, or probe for `.vouch.yml`
    /// under `workdir`, falling back to defaults when absent.
    pub fn load(explicit: Option<&Path>, workdir: &Path) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let candidate = workdir.join(CONFIG_FILE);
                if !candidate.exists() {
                    debug!("no {CONFIG_FILE} found, using defaults");
                    return Ok(VouchConfig::default());
                }
                candidate
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        let config: VouchConfig = serde_yaml_ng::from_str(&text)
            .with_context(|| format!("failed to parse config at {}", path.display()))?;
        debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Build the comment parser for the configured keyword sets
    pub fn comment_parser(&self) -> Result<CommentParser> {
        CommentParser::new(
            &self.keywords.vouch,
            &self.keywords.denounce,
            &self.keywords.unvouch,
            self.keywords.allow_vouch,
            self.keywords.allow_denounce,
            self.keywords.allow_unvouch,
        )
    }
}
