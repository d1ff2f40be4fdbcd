//! Bare-mirror plumbing: clone/open, fetch, branch checkout, revert, push.
//!
//! The mirror is a bare repository with no working tree; it exists only for
//! fetch/revert/push. Every operation re-verifies bareness — a non-bare
//! state after a checkout is an invariant violation, not a recoverable
//! error. Callers serialize access through `GitRemediationService`.

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{FetchOptions, FetchPrune, PushOptions, Repository, Signature};
use tracing::{debug, info};
use warden_core::{RepositoryConfig, RevertOutcome, ScmError};

use crate::exec::run_git;
use crate::transport::remote_callbacks;

/// Which revert path a commit takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevertStrategy {
    /// Single parent: in-process revert.
    InProcess,
    /// Merge commit: external `git revert --mainline 1` (the in-process
    /// machinery does not support multi-parent commits).
    ExternalMainline,
}

/// Select the revert path from the commit's parent count.
pub fn revert_strategy(parent_count: usize) -> RevertStrategy {
    if parent_count == 1 {
        RevertStrategy::InProcess
    } else {
        RevertStrategy::ExternalMainline
    }
}

fn transport_err(err: git2::Error) -> ScmError {
    ScmError::Transport(err.to_string())
}

/// Open the local mirror, cloning it first if absent or invalid.
///
/// A directory that exists but is not a usable bare repository is deleted
/// and re-cloned from scratch.
pub fn ensure_mirror(config: &RepositoryConfig) -> Result<Repository, ScmError> {
    match Repository::open_bare(&config.local_dir) {
        Ok(repo) => {
            debug!(dir = %config.local_dir.display(), "Existing local bare mirror found");
            Ok(repo)
        }
        Err(_) => clone_mirror(config),
    }
}

fn clone_mirror(config: &RepositoryConfig) -> Result<Repository, ScmError> {
    info!(remote = %config.remote_url, "Cloning remote repository");

    if config.local_dir.exists() {
        debug!(dir = %config.local_dir.display(), "Removing stale mirror directory");
        std::fs::remove_dir_all(&config.local_dir)?;
    }

    let mut fetch_options = FetchOptions::new();
    fetch_options.remote_callbacks(remote_callbacks(config));

    let repo = RepoBuilder::new()
        .bare(true)
        .fetch_options(fetch_options)
        .clone(&config.remote_url, &config.local_dir)
        .map_err(transport_err)?;

    info!(dir = %config.local_dir.display(), "Cloned remote repository");
    Ok(repo)
}

/// Fetch all branch refs from the remote, pruning refs deleted remotely.
pub fn fetch_refs(repo: &Repository, config: &RepositoryConfig) -> Result<(), ScmError> {
    let mut remote = repo.find_remote("origin").map_err(transport_err)?;
    let mut fetch_options = FetchOptions::new();
    fetch_options.prune(FetchPrune::On);
    fetch_options.remote_callbacks(remote_callbacks(config));

    remote
        .fetch(
            &["+refs/heads/*:refs/heads/*"],
            Some(&mut fetch_options),
            None,
        )
        .map_err(transport_err)?;
    Ok(())
}

/// Point HEAD at a branch and re-verify the mirror is still bare.
pub fn checkout_branch(repo: &Repository, branch: &str) -> Result<(), ScmError> {
    debug!(branch, "Performing checkout of branch");
    let refname = format!("refs/heads/{branch}");
    repo.find_reference(&refname)
        .map_err(|_| ScmError::Transport(format!("branch not found in mirror: {branch}")))?;
    repo.set_head(&refname).map_err(transport_err)?;
    verify_bare(repo)?;
    Ok(())
}

/// Invariant check: the mirror must never acquire a working tree.
pub fn verify_bare(repo: &Repository) -> Result<(), ScmError> {
    if !repo.is_bare() {
        return Err(ScmError::InvariantViolation(format!(
            "repository at {} is no longer bare",
            repo.path().display()
        )));
    }
    Ok(())
}

/// Revert `commit` on the currently checked-out branch.
///
/// Single-parent commits revert in-process; merge commits delegate to the
/// external CLI with the first parent as mainline.
pub fn revert_commit(
    repo: &Repository,
    config: &RepositoryConfig,
    commit: &str,
    branch: &str,
) -> Result<String, ScmError> {
    let target = repo
        .revparse_single(commit)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|_| ScmError::Transport(format!("commit not found in mirror: {commit}")))?;

    match revert_strategy(target.parent_count()) {
        RevertStrategy::InProcess => {
            let refname = format!("refs/heads/{branch}");
            let head = repo
                .head()
                .and_then(|head| head.peel_to_commit())
                .map_err(transport_err)?;

            let mut index = repo
                .revert_commit(&target, &head, 0, None)
                .map_err(transport_err)?;
            if index.has_conflicts() {
                return Err(ScmError::RevertConflict(format!(
                    "reverting {commit} on {branch} does not apply cleanly"
                )));
            }

            let tree_id = index.write_tree_to(repo).map_err(transport_err)?;
            let tree = repo.find_tree(tree_id).map_err(transport_err)?;
            let signature = repo
                .signature()
                .or_else(|_| Signature::now("buildwarden", "warden@buildwarden.dev"))
                .map_err(transport_err)?;
            let summary = target.summary().unwrap_or(commit).to_string();
            let message = format!(
                "Revert \"{summary}\"\n\nThis reverts commit {}.",
                target.id()
            );

            let new_oid = repo
                .commit(Some(&refname), &signature, &signature, &message, &tree, &[&head])
                .map_err(transport_err)?;
            info!(branch, reverted = commit, new_commit = %new_oid, "Reverted commit in-process");
            Ok(new_oid.to_string())
        }
        RevertStrategy::ExternalMainline => {
            // Multi-parent commit: hand over to the CLI.
            run_git(
                &config.local_dir,
                &["revert", commit, "--mainline", "1", "--no-edit"],
            )?;
            let new_oid = tip_of(repo, branch)?;
            info!(branch, reverted = commit, new_commit = %new_oid, "Reverted merge commit via CLI");
            Ok(new_oid)
        }
    }
}

/// Push a branch to the remote with the configured transport.
pub fn push_branch(
    repo: &Repository,
    config: &RepositoryConfig,
    branch: &str,
) -> Result<(), ScmError> {
    let mut remote = repo.find_remote("origin").map_err(transport_err)?;
    let mut push_options = PushOptions::new();
    push_options.remote_callbacks(remote_callbacks(config));

    let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
    remote
        .push(&[refspec], Some(&mut push_options))
        .map_err(transport_err)?;
    Ok(())
}

/// Current tip commit id of a branch.
pub fn tip_of(repo: &Repository, branch: &str) -> Result<String, ScmError> {
    let refname = format!("refs/heads/{branch}");
    let oid = repo
        .refname_to_id(&refname)
        .map_err(transport_err)?;
    Ok(oid.to_string())
}

/// The full revert sequence behind the mirror lock: fetch, checkout,
/// revert, verify bare, optionally push.
pub fn fetch_checkout_revert(
    config: &RepositoryConfig,
    commit: &str,
    branch: &str,
) -> Result<RevertOutcome, ScmError> {
    let repo = ensure_mirror(config)?;
    fetch_refs(&repo, config)?;
    checkout_branch(&repo, branch)?;

    let new_commit = revert_commit(&repo, config, commit, branch)?;
    verify_bare(&repo)?;

    let pushed = if config.push_changes {
        info!(branch, "Pushing changes to remote");
        push_branch(&repo, config, branch)?;
        true
    } else {
        info!(branch, "Skipped pushing changes to remote");
        false
    };
    verify_bare(&repo)?;

    Ok(RevertOutcome { new_commit, pushed })
}
