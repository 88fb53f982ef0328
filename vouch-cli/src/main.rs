//! vouch - per-repository trust list management
//!
//! Thin CLI over `vouch-core`: resolves configuration and credentials,
//! builds the per-invocation context, dispatches one operation, prints its
//! one-word outcome on stdout. Logs go to stderr so outcomes stay parseable.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use vouch_core::config::VouchConfig;
use vouch_core::error::VouchError;
use vouch_core::github::{GitHubClient, RepoRef};
use vouch_core::ops::{self, OpsContext};
use vouch_core::writer::GitCli;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "vouch",
    about = "Manage a per-repository trust list of vouched and denounced identities",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Target repository as owner/name; defaults to $GITHUB_REPOSITORY
    #[clap(long, global = true)]
    repo: Option<String>,

    /// Local checkout containing the trust file
    #[clap(long, global = true, default_value = ".")]
    workdir: PathBuf,

    /// Configuration file (defaults to .vouch.yml in the workdir)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    /// Log every side effect as a prediction instead of performing it
    #[clap(long, global = true)]
    dry_run: bool,

    /// Base branch to resynchronize onto (detected from the remote when unset)
    #[clap(long, global = true)]
    base_branch: Option<String>,

    /// Log level (RUST_LOG overrides)
    #[clap(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up a user's status in the local trust file
    Check {
        /// `[platform:]username` to look up
        user: String,
    },

    /// Vouch for a user
    Vouch {
        user: String,
        /// Free-text details stored with the entry
        #[clap(long)]
        details: Option<String>,
        /// Actor to authorize before mutating; omitted means local operator
        #[clap(long)]
        actor: Option<String>,
    },

    /// Denounce a user
    Denounce {
        user: String,
        /// Reason stored with the entry
        #[clap(long, default_value = "")]
        reason: String,
        #[clap(long)]
        actor: Option<String>,
    },

    /// Remove a user's entry from the trust file
    Unvouch {
        user: String,
        #[clap(long)]
        actor: Option<String>,
    },

    /// Apply a free-text comment from an actor
    Comment {
        /// Login of the commenter
        #[clap(long)]
        actor: String,
        /// Comment body; read from stdin when omitted
        #[clap(long)]
        body: Option<String>,
    },

    /// Gate a pull request author against the trust file
    Gate {
        /// Login of the pull request author
        #[clap(long)]
        author: String,
        /// Pull request number
        #[clap(long)]
        number: u64,
    },

    /// Add-only sync of CODEOWNERS users into the trust file
    Sync,
}

fn resolve_repo(flag: Option<&str>) -> Result<RepoRef> {
    let spec = match flag {
        Some(spec) => spec.to_string(),
        None => std::env::var("GITHUB_REPOSITORY").map_err(|_| {
            VouchError::MissingConfig("target repository (--repo or GITHUB_REPOSITORY)")
        })?,
    };
    RepoRef::parse(&spec)
}

fn resolve_token() -> Result<String> {
    std::env::var("GITHUB_TOKEN")
        .or_else(|_| std::env::var("GH_TOKEN"))
        .map_err(|_| VouchError::MissingConfig("credential (GITHUB_TOKEN or GH_TOKEN)").into())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level.to_filter_directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = VouchConfig::load(cli.config.as_deref(), &cli.workdir)?;

    // Pure local read: no credential or repository needed
    if let Command::Check { user } = &cli.command {
        let status = ops::check(&config, &cli.workdir, user)?;
        println!("{status}");
        return Ok(());
    }

    let repo = resolve_repo(cli.repo.as_deref())?;
    let token = resolve_token()?;
    let api = GitHubClient::new(token)?;
    let git = GitCli::new(cli.workdir.clone()).with_base_branch(cli.base_branch.clone());
    let ctx = OpsContext {
        api: &api,
        git: &git,
        config: &config,
        repo,
        workdir: cli.workdir.clone(),
        dry_run: cli.dry_run,
    };

    match cli.command {
        Command::Check { .. } => unreachable!("handled above"),
        Command::Vouch {
            user,
            details,
            actor,
        } => {
            let outcome = ops::vouch(&ctx, actor.as_deref(), &user, details).await?;
            println!("{outcome}");
        }
        Command::Denounce {
            user,
            reason,
            actor,
        } => {
            let outcome = ops::denounce(&ctx, actor.as_deref(), &user, &reason).await?;
            println!("{outcome}");
        }
        Command::Unvouch { user, actor } => {
            let outcome = ops::unvouch(&ctx, actor.as_deref(), &user).await?;
            println!("{outcome}");
        }
        Command::Comment { actor, body } => {
            let body = match body {
                Some(body) => body,
                None => std::io::read_to_string(std::io::stdin())
                    .context("failed to read comment body from stdin")?,
            };
            let outcome = ops::apply_comment(&ctx, &actor, &body).await?;
            println!("{outcome}");
        }
        Command::Gate { author, number } => {
            let outcome = ops::gate(&ctx, &author, number).await?;
            println!("{outcome}");
        }
        Command::Sync => {
            let outcome = ops::sync_codeowners(&ctx).await?;
            println!("{outcome}");
        }
    }

    Ok(())
}
