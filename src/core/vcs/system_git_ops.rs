//! Tag, log-range and format-patch operations for SystemGit

use super::system_git::SystemGit;
use super::{CommitRecord, TagEntry};
use chrono::DateTime;
use log::warn;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Field separator in log records (ASCII unit separator)
const FIELD_SEP: char = '\u{1f}';
/// Record separator between commits (ASCII record separator)
const RECORD_SEP: char = '\u{1e}';

impl SystemGit {
  /// Fetch tags from a remote, pruning stale refs
  pub fn fetch_tags(&self, remote: &str) -> crate::core::error::PatchlineResult<()> {
    self.run(&["fetch", remote, "--tags", "--prune", "--prune-tags"])?;
    Ok(())
  }

  /// Tags reachable from (merged into) the given branch
  pub fn merged_tags(&self, branch: &str) -> crate::core::error::PatchlineResult<HashSet<String>> {
    let stdout = self.run(&["tag", "--merged", branch])?;
    Ok(
      stdout
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect(),
    )
  }

  /// All tags with their creation timestamps, newest first
  ///
  /// Lines that don't carry a parseable iso-strict date are dropped with
  /// a warning.
  pub fn tags_with_dates(&self) -> crate::core::error::PatchlineResult<Vec<TagEntry>> {
    let stdout = self.run(&[
      "for-each-ref",
      "--sort=-creatordate",
      "--format=%(refname:short) %(creatordate:iso-strict)",
      "refs/tags",
    ])?;

    let mut entries = Vec::new();
    for line in stdout.lines() {
      let line = line.trim();
      if line.is_empty() {
        continue;
      }
      let Some((name, date)) = line.rsplit_once(' ') else {
        warn!("Dropping malformed tag line in {}: {}", self.repo_path.display(), line);
        continue;
      };
      match DateTime::parse_from_rfc3339(date) {
        Ok(created) => entries.push(TagEntry {
          name: name.to_string(),
          created,
        }),
        Err(e) => {
          warn!(
            "Dropping tag '{}' with unparseable creatordate '{}': {}",
            name, date, e
          );
        }
      }
    }
    Ok(entries)
  }

  /// Commits reachable from `end_ref` but not `start_ref`, in git's native
  /// reverse-chronological order
  ///
  /// The order is a hard contract: patch files are correlated to commits
  /// by position downstream. Records with the wrong field count are
  /// dropped with a warning.
  pub fn log_range(&self, start_ref: &str, end_ref: &str) -> crate::core::error::PatchlineResult<Vec<CommitRecord>> {
    let range = format!("{}..{}", start_ref, end_ref);
    let format = format!(
      "--pretty=format:%H{sep}%an <%ae>{sep}%aI{sep}%B{rec}",
      sep = FIELD_SEP,
      rec = RECORD_SEP
    );
    let stdout = self.run(&["log", &range, &format])?;

    let mut commits = Vec::new();
    for record in stdout.split(RECORD_SEP) {
      let record = record.trim_matches(|c: char| c == '\n' || c == '\r');
      if record.is_empty() {
        continue;
      }
      let fields: Vec<&str> = record.split(FIELD_SEP).collect();
      if fields.len() != 4 {
        warn!(
          "Dropping malformed log record in {} ({} fields): {:?}",
          self.repo_path.display(),
          fields.len(),
          record.chars().take(60).collect::<String>()
        );
        continue;
      }
      commits.push(CommitRecord {
        id: fields[0].to_string(),
        author: fields[1].to_string(),
        date: fields[2].to_string(),
        message: fields[3].trim().to_string(),
      });
    }
    Ok(commits)
  }

  /// Generate one patch file per commit in `start_ref..end_ref` into
  /// `output_dir`, returning the paths git printed
  pub fn format_patch(
    &self,
    start_ref: &str,
    end_ref: &str,
    output_dir: &Path,
  ) -> crate::core::error::PatchlineResult<Vec<PathBuf>> {
    let range = format!("{}..{}", start_ref, end_ref);
    let out = output_dir.to_string_lossy();
    let stdout = self.run(&["format-patch", &range, "-o", &out])?;

    Ok(
      stdout
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(PathBuf::from)
        .collect(),
    )
  }
}
