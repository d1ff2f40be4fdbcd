//! External command execution for the operations the in-process plumbing
//! cannot perform.

use std::path::Path;
use std::process::Command;

use tracing::debug;
use warden_core::ScmError;

/// Run `git` with the given arguments in `working_dir`.
///
/// Returns stdout on success; a non-zero exit surfaces stderr as a
/// transport error.
pub fn run_git(working_dir: &Path, args: &[&str]) -> Result<String, ScmError> {
    debug!(?args, dir = %working_dir.display(), "Running git");
    let output = Command::new("git")
        .args(args)
        .current_dir(working_dir)
        .output()
        .map_err(|e| ScmError::Transport(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScmError::Transport(format!(
            "git {} failed: {}",
            args.join(" "),
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_git_reports_version() {
        let dir = std::env::temp_dir();
        let out = run_git(&dir, &["--version"]).unwrap();
        assert!(out.starts_with("git version"));
    }

    #[test]
    fn run_git_surfaces_failures() {
        let dir = std::env::temp_dir();
        let err = run_git(&dir, &["definitely-not-a-subcommand"]).unwrap_err();
        assert!(matches!(err, ScmError::Transport(_)));
    }
}
