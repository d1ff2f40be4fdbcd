//! Revert plumbing against real git repositories.
//!
//! Fixtures are built with the `git` CLI in temp directories: a bare
//! origin plus a work clone to seed commits. The service's mirror must end
//! every operation bare.

use std::path::{Path, PathBuf};
use std::process::Command;

use git2::Repository;
use tempfile::TempDir;
use warden_core::{RemediationBackend, RepositoryConfig};
use warden_scm::{revert_strategy, GitRemediationService, RevertStrategy};

fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

struct Fixture {
    _root: TempDir,
    origin: PathBuf,
    work: PathBuf,
    mirror: PathBuf,
}

/// Bare origin + work clone with two commits on `main`:
/// `greeting.txt` goes "one" → "two".
fn make_fixture() -> (Fixture, String, String) {
    let root = tempfile::tempdir().unwrap();
    let origin = root.path().join("origin.git");
    let work = root.path().join("work");
    let mirror = root.path().join("mirror");

    std::fs::create_dir(&origin).unwrap();
    run_git(&origin, &["init", "--bare", "-b", "main"]);

    std::fs::create_dir(&work).unwrap();
    run_git(&work, &["init", "-b", "main"]);
    run_git(&work, &["config", "user.name", "test-user"]);
    run_git(&work, &["config", "user.email", "test@example.com"]);

    std::fs::write(work.join("greeting.txt"), "one\n").unwrap();
    run_git(&work, &["add", "."]);
    run_git(&work, &["commit", "-m", "add greeting"]);
    let first = run_git(&work, &["rev-parse", "HEAD"]);

    std::fs::write(work.join("greeting.txt"), "two\n").unwrap();
    run_git(&work, &["commit", "-am", "change greeting"]);
    let second = run_git(&work, &["rev-parse", "HEAD"]);

    run_git(&work, &["remote", "add", "origin", origin.to_str().unwrap()]);
    run_git(&work, &["push", "origin", "main"]);

    (
        Fixture {
            _root: root,
            origin,
            work,
            mirror,
        },
        first,
        second,
    )
}

fn config(fixture: &Fixture, push_changes: bool) -> RepositoryConfig {
    RepositoryConfig {
        remote_url: fixture.origin.to_str().unwrap().to_string(),
        local_dir: fixture.mirror.clone(),
        push_changes,
        username: None,
        password: None,
        strict_host_key_checking: None,
        lock_wait_secs: 10,
    }
}

#[tokio::test]
async fn revert_single_parent_commit_in_process() {
    let (fixture, _first, second) = make_fixture();
    let service = GitRemediationService::new(config(&fixture, false), None, None);

    let outcome = service.revert_commit(&second, "main").await.unwrap();
    assert!(!outcome.pushed, "push is disabled");

    // The mirror must still be bare, with the revert on its branch tip.
    let mirror = Repository::open(&fixture.mirror).unwrap();
    assert!(mirror.is_bare(), "mirror acquired a working tree");

    let tip = run_git(&fixture.mirror, &["rev-parse", "refs/heads/main"]);
    assert_eq!(tip, outcome.new_commit);
    let message = run_git(&fixture.mirror, &["log", "-1", "--format=%s", "refs/heads/main"]);
    assert_eq!(message, "Revert \"change greeting\"");
    let content = run_git(&fixture.mirror, &["show", "refs/heads/main:greeting.txt"]);
    assert_eq!(content, "one");

    // The remote is untouched when push is disabled.
    let origin_tip = run_git(&fixture.origin, &["rev-parse", "main"]);
    assert_eq!(origin_tip, second);
}

#[tokio::test]
async fn revert_with_push_updates_the_remote() {
    let (fixture, _first, second) = make_fixture();
    let service = GitRemediationService::new(config(&fixture, true), None, None);

    let outcome = service.revert_commit(&second, "main").await.unwrap();
    assert!(outcome.pushed);

    let origin_tip = run_git(&fixture.origin, &["rev-parse", "main"]);
    assert_eq!(origin_tip, outcome.new_commit);

    let mirror = Repository::open(&fixture.mirror).unwrap();
    assert!(mirror.is_bare());
}

#[tokio::test]
async fn second_revert_reuses_the_existing_mirror() {
    let (fixture, _first, second) = make_fixture();
    let service = GitRemediationService::new(config(&fixture, true), None, None);

    let first_outcome = service.revert_commit(&second, "main").await.unwrap();

    // Revert the revert: exercises the open-existing-mirror path and a
    // fresh fetch of the pushed state.
    let second_outcome = service
        .revert_commit(&first_outcome.new_commit, "main")
        .await
        .unwrap();

    let content = run_git(&fixture.mirror, &["show", "refs/heads/main:greeting.txt"]);
    assert_eq!(content, "two");
    let origin_tip = run_git(&fixture.origin, &["rev-parse", "main"]);
    assert_eq!(origin_tip, second_outcome.new_commit);
}

#[tokio::test]
async fn stale_mirror_directory_is_replaced_by_a_fresh_clone() {
    let (fixture, _first, second) = make_fixture();

    // Junk where the mirror should be.
    std::fs::create_dir_all(&fixture.mirror).unwrap();
    std::fs::write(fixture.mirror.join("not-a-repo.txt"), "junk").unwrap();

    let service = GitRemediationService::new(config(&fixture, false), None, None);
    let outcome = service.revert_commit(&second, "main").await.unwrap();

    assert!(!outcome.new_commit.is_empty());
    assert!(!fixture.mirror.join("not-a-repo.txt").exists());
    assert!(Repository::open(&fixture.mirror).unwrap().is_bare());
}

#[tokio::test]
async fn unknown_branch_fails_without_breaking_the_mirror() {
    let (fixture, _first, second) = make_fixture();
    let service = GitRemediationService::new(config(&fixture, false), None, None);

    let err = service.revert_commit(&second, "no-such-branch").await;
    assert!(err.is_err());

    assert!(Repository::open(&fixture.mirror).unwrap().is_bare());
}

#[test]
fn merge_commits_take_the_external_mainline_path() {
    let (fixture, first, _second) = make_fixture();

    // Build a two-parent commit on main.
    run_git(&fixture.work, &["checkout", "-b", "feature", &first]);
    std::fs::write(fixture.work.join("feature.txt"), "feature\n").unwrap();
    run_git(&fixture.work, &["add", "."]);
    run_git(&fixture.work, &["commit", "-m", "feature work"]);
    run_git(&fixture.work, &["checkout", "main"]);
    run_git(
        &fixture.work,
        &["merge", "feature", "--no-ff", "-m", "merge feature"],
    );
    let merge_sha = run_git(&fixture.work, &["rev-parse", "HEAD"]);

    let repo = Repository::open(&fixture.work).unwrap();
    let merge_commit = repo
        .revparse_single(&merge_sha)
        .unwrap()
        .peel_to_commit()
        .unwrap();
    let plain_commit = repo
        .revparse_single(&first)
        .unwrap()
        .peel_to_commit()
        .unwrap();

    assert_eq!(merge_commit.parent_count(), 2);
    assert_eq!(
        revert_strategy(merge_commit.parent_count()),
        RevertStrategy::ExternalMainline,
        "multi-parent commits must not use the in-process revert"
    );
    assert_eq!(
        revert_strategy(plain_commit.parent_count()),
        RevertStrategy::InProcess
    );
}
