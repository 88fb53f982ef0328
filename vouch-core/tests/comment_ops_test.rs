//! End-to-end comment handling: parse, authorize, mutate, persist

mod common;

use std::path::PathBuf;

use common::{FakeGit, MockGitHub};
use vouch_core::authz::ManagersConfig;
use vouch_core::config::VouchConfig;
use vouch_core::github::RepoRef;
use vouch_core::ops::{self, MutationOutcome, OpsContext};

const INITIAL: &str = "# Trusted users\n";

struct Fixture {
    _dir: tempfile::TempDir,
    workdir: PathBuf,
    config: VouchConfig,
}

impl Fixture {
    fn new(initial: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().to_path_buf();
        if let Some(initial) = initial {
            std::fs::write(workdir.join(".vouch"), initial).unwrap();
        }
        Fixture {
            _dir: dir,
            workdir,
            config: VouchConfig::default(),
        }
    }

    fn ctx<'a>(&'a self, api: &'a MockGitHub, git: &'a FakeGit, dry_run: bool) -> OpsContext<'a> {
        OpsContext {
            api,
            git,
            config: &self.config,
            repo: RepoRef::parse("acme/widgets").unwrap(),
            workdir: self.workdir.clone(),
            dry_run,
        }
    }

    fn trust_file(&self) -> String {
        std::fs::read_to_string(self.workdir.join(".vouch")).unwrap()
    }
}

#[tokio::test]
async fn test_authorized_vouch_comment_lands() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default().with_permission("maintainer", "maintain", "write");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "maintainer", "vouch @alice solid reviews")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Vouched);
    assert_eq!(fixture.trust_file(), "# Trusted users\nalice solid reviews\n");
    assert_eq!(git.state.lock().unwrap().pushes, 1);
}

#[tokio::test]
async fn test_unauthorized_actor_changes_nothing() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default(); // actor has no permission record
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "driveby", "vouch @accomplice")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Unchanged);
    assert_eq!(fixture.trust_file(), INITIAL);
    assert_eq!(git.state.lock().unwrap().pushes, 0);
}

#[tokio::test]
async fn test_second_line_of_comment_is_never_honored() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default().with_permission("maintainer", "admin", "admin");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "maintainer", "denounce @spammer\n-github:victim injected")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Denounced);
    let content = fixture.trust_file();
    assert!(content.contains("-spammer"));
    assert!(!content.contains("victim"));
}

#[tokio::test]
async fn test_comment_without_action_or_target_is_unchanged() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default().with_permission("maintainer", "admin", "admin");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "maintainer", "thanks for the fix!")
        .await
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Unchanged);

    // An action keyword with no @target must also be a no-op
    let outcome = ops::apply_comment(&ctx, "maintainer", "vouch for whoever wrote this")
        .await
        .unwrap();
    assert_eq!(outcome, MutationOutcome::Unchanged);
    assert_eq!(git.state.lock().unwrap().pushes, 0);
}

#[tokio::test]
async fn test_missing_trust_file_is_initialized_on_mutation() {
    let fixture = Fixture::new(None);
    let api = MockGitHub::default();
    let git = FakeGit::new("", "");

    let ctx = fixture.ctx(&api, &git, false);
    // No actor: a local operator invocation needs no authorization
    let outcome = ops::vouch(&ctx, None, "alice", None).await.unwrap();

    assert_eq!(outcome, MutationOutcome::Vouched);
    let content = fixture.trust_file();
    assert!(content.starts_with('#'), "missing templated header: {content}");
    assert!(content.contains("alice"));
}

#[tokio::test]
async fn test_dry_run_predicts_without_side_effects() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default().with_permission("maintainer", "maintain", "write");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, true);
    let outcome = ops::apply_comment(&ctx, "maintainer", "vouch @alice")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Vouched);
    assert_eq!(fixture.trust_file(), INITIAL, "dry-run wrote the trust file");
    let state = git.state.lock().unwrap();
    assert_eq!(state.pushes, 0);
    assert_eq!(state.commits.len(), 0);
}

#[tokio::test]
async fn test_unvouch_of_absent_user_is_unchanged() {
    let fixture = Fixture::new(Some(INITIAL));
    let api = MockGitHub::default().with_permission("maintainer", "admin", "admin");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "maintainer", "unvouch @ghost")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Unchanged);
    assert_eq!(git.state.lock().unwrap().pushes, 0);
}

#[tokio::test]
async fn test_managers_list_delegates_authority() {
    let mut fixture = Fixture::new(Some(INITIAL));
    fixture.config.authz.managers = Some(ManagersConfig {
        repo: Some("acme/governance".to_string()),
        path: ".vouch".to_string(),
        git_ref: Some("main".to_string()),
    });

    // The actor has no permission on the target repo, but the governance
    // repo's trust file vouches for them.
    let api = MockGitHub::default().with_file("acme/governance", ".vouch", "main", "steward\n");
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::apply_comment(&ctx, "steward", "vouch @alice")
        .await
        .unwrap();

    assert_eq!(outcome, MutationOutcome::Vouched);
    assert!(fixture.trust_file().contains("alice"));
}

#[tokio::test]
async fn test_branch_mode_opens_pull_request() {
    let mut fixture = Fixture::new(Some(INITIAL));
    fixture.config.update_via_pull_request = true;

    let api = MockGitHub::default();
    let git = FakeGit::new(INITIAL, INITIAL);

    let ctx = fixture.ctx(&api, &git, false);
    let outcome = ops::vouch(&ctx, None, "alice", None).await.unwrap();

    assert_eq!(outcome, MutationOutcome::Vouched);
    let state = git.state.lock().unwrap();
    assert_eq!(state.branches.len(), 1);
    assert!(state.branches[0].starts_with("vouch/update-"));

    let prs = api.pull_requests.lock().unwrap();
    assert_eq!(prs.len(), 1);
    assert_eq!(prs[0].0, state.branches[0]);
}
