//! System git backend - every operation is one subprocess invocation
//!
//! All pipeline stages run sequentially, one git subprocess at a time.
//! Commands run with an isolated environment so user/global git config
//! cannot change parsing-sensitive output formats.

use crate::core::error::{GitError, PatchlineError, PatchlineResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git
pub struct SystemGit {
  /// Repository working directory
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  ///
  /// Performs one subprocess call to verify the path is inside a work tree.
  pub fn open(path: &Path) -> PatchlineResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(PatchlineError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(PatchlineError::message(format!(
        "Failed to open git repository: {}",
        stderr
      )));
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Repository path this backend operates on
  pub fn path(&self) -> &Path {
    &self.repo_path
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables, whitelists only PATH and HOME
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }

    // Force safe behavior (override user config)
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }

  /// Run a git command and return stdout, or a CommandFailed error
  pub(crate) fn run(&self, args: &[&str]) -> PatchlineResult<String> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .with_context(|| format!("Failed to execute git {}", args.join(" ")))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(PatchlineError::Git(GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: stderr.to_string(),
      }));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }
}
