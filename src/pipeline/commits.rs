//! CommitEnumerator: list commits in the release window per repository
//!
//! The window is `start_ref` exclusive to `end_ref` inclusive, in git's
//! native reverse-chronological order. PatchSynthesizer correlates patch
//! files to these commits by position, so the order must come out of the
//! enumerator untouched.

use crate::core::error::PatchlineResult;
use crate::core::vcs::SystemGit;
use crate::pipeline::tags::construct_tag;
use crate::pipeline::{Commit, Repository, VersionWindow};
use log::{info, warn};

/// Enumerate commits reachable from `end_ref` but not from `start_ref`
pub fn enumerate(git: &SystemGit, start_ref: &str, end_ref: &str) -> PatchlineResult<Vec<Commit>> {
  let records = git.log_range(start_ref, end_ref)?;
  Ok(records.into_iter().map(Commit::from).collect())
}

/// Enumerate commit windows for every eligible repository
///
/// Per-repository problems (analysis disabled, missing path, unknown tag)
/// are soft-skips; the run continues with that repository's list empty.
pub fn enumerate_all(repos: &mut [Repository], window: &VersionWindow) {
  info!("Starting commit enumeration for all configured repositories...");

  for repo in repos.iter_mut() {
    if !repo.config.analyze_commits {
      info!("Skipping commit enumeration for {}: analysis disabled", repo.qualified_name());
      continue;
    }

    if repo.config.path.as_os_str().is_empty() {
      warn!("Skipping commit enumeration for {}: repo path not set", repo.qualified_name());
      continue;
    }

    if !repo.config.path.is_dir() {
      warn!(
        "Skipping commit enumeration for {}: path {} does not exist",
        repo.qualified_name(),
        repo.config.path.display()
      );
      continue;
    }

    let start_ref = construct_tag(&repo.config.tag_prefix, &window.next_newest_id);
    let end_ref = construct_tag(&repo.config.tag_prefix, &window.newest_id);

    let git = match SystemGit::open(&repo.config.path) {
      Ok(git) => git,
      Err(e) => {
        warn!("Skipping commit enumeration for {}: {}", repo.qualified_name(), e);
        continue;
      }
    };

    match enumerate(&git, &start_ref, &end_ref) {
      Ok(commits) => {
        info!(
          "Found {} commits for {} between {} and {}",
          commits.len(),
          repo.qualified_name(),
          start_ref,
          end_ref
        );
        repo.commits = commits;
      }
      Err(e) => {
        warn!(
          "Commit enumeration failed for {} ({}..{}): {}",
          repo.qualified_name(),
          start_ref,
          end_ref,
          e
        );
      }
    }
  }

  info!("Finished commit enumeration for all repositories.");
}
