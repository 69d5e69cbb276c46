//! TagResolver: find the two most recent qualifying release tags
//!
//! A tag qualifies when it carries the repository's tag prefix AND is
//! reachable from the release branch tip. Prefix-matching tags created on
//! unrelated forks stay out. Ordering is by creation timestamp, with the
//! trailing `_NN` sequence number breaking same-timestamp ties.

use crate::core::config::PatchlineConfig;
use crate::core::error::{ConfigError, PatchlineError, PatchlineResult};
use crate::core::vcs::{SystemGit, TagEntry};
use crate::pipeline::{Repository, VersionWindow};
use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// A parsed candidate tag, transient to resolution
#[derive(Debug, Clone)]
pub struct VersionTag {
  pub name: String,
  pub created: DateTime<FixedOffset>,
  pub sequence: u32,
}

/// Parse the trailing numeric sequence of a tag name (`..._NN`)
///
/// Only a 1-2 digit suffix counts as a sequence; a trailing date segment
/// like `_20240101` is not one. Absent or unparseable sequences default to
/// 0 with a warning; the tag stays valid.
pub fn parse_sequence(name: &str) -> u32 {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  let pattern = PATTERN.get_or_init(|| Regex::new(r"_(\d{1,2})$").expect("static regex"));

  match pattern
    .captures(name)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse::<u32>().ok())
  {
    Some(seq) => seq,
    None => {
      warn!("Tag '{}' has no parseable trailing sequence, defaulting to 0", name);
      0
    }
  }
}

/// Filter to prefix-matching merged tags and parse their sequences
pub fn qualifying_tags(entries: &[TagEntry], merged: &HashSet<String>, prefix: &str) -> Vec<VersionTag> {
  entries
    .iter()
    .filter(|e| e.name.starts_with(prefix))
    .filter(|e| merged.contains(&e.name))
    .map(|e| VersionTag {
      name: e.name.clone(),
      created: e.created,
      sequence: parse_sequence(&e.name),
    })
    .collect()
}

/// Pick (newest, next-newest) by descending (timestamp, sequence)
pub fn pick_latest_two(mut tags: Vec<VersionTag>) -> (Option<String>, Option<String>) {
  tags.sort_by(|a, b| (b.created, b.sequence).cmp(&(a.created, a.sequence)));
  let mut names = tags.into_iter().map(|t| t.name);
  (names.next(), names.next())
}

/// Resolve the two most recent qualifying tags for one repository
///
/// Never raises: any fetch failure, missing ref or empty candidate set
/// yields `(None, None)` and a log entry.
pub fn resolve(git: &SystemGit, branch: &str, remote: &str, tag_prefix: &str) -> (Option<String>, Option<String>) {
  if let Err(e) = git.fetch_tags(remote) {
    error!(
      "Tag fetch from remote '{}' failed in {}: {}",
      remote,
      git.path().display(),
      e
    );
    return (None, None);
  }

  let merged = match git.merged_tags(branch) {
    Ok(merged) => merged,
    Err(e) => {
      error!(
        "Listing tags merged into '{}' failed in {}: {}",
        branch,
        git.path().display(),
        e
      );
      return (None, None);
    }
  };

  let entries = match git.tags_with_dates() {
    Ok(entries) => entries,
    Err(e) => {
      error!("Listing tag dates failed in {}: {}", git.path().display(), e);
      return (None, None);
    }
  };

  let candidates = qualifying_tags(&entries, &merged, tag_prefix);
  if candidates.is_empty() {
    warn!(
      "No tags with prefix '{}' merged into '{}' in {}",
      tag_prefix,
      branch,
      git.path().display()
    );
    return (None, None);
  }

  pick_latest_two(candidates)
}

/// Resolve and store tag pairs for every repository with a usable path
pub fn resolve_all(repos: &mut [Repository]) {
  info!("Resolving release tags for all configured repositories...");
  for repo in repos.iter_mut() {
    if repo.config.path.as_os_str().is_empty() {
      warn!("Repo path missing for {}, skipping tag resolution", repo.qualified_name());
      continue;
    }

    let git = match SystemGit::open(&repo.config.path) {
      Ok(git) => git,
      Err(e) => {
        warn!("Cannot open {} for tag resolution: {}", repo.qualified_name(), e);
        continue;
      }
    };

    let (newest, next_newest) = resolve(&git, &repo.config.local_branch, &repo.config.remote, &repo.config.tag_prefix);
    info!(
      "Resolved tags for {}: newest={:?}, next_newest={:?}",
      repo.qualified_name(),
      newest,
      next_newest
    );
    repo.newest_tag = newest;
    repo.next_newest_tag = next_newest;
  }
}

/// Resolve the global version window from the designated version source
///
/// Unlike per-repository resolution this is all-or-nothing: a missing
/// source repository, path or branch, or fewer than two resolvable tags,
/// aborts the run before any other repository is touched.
pub fn resolve_version_window(config: &PatchlineConfig) -> PatchlineResult<VersionWindow> {
  let source_name = &config.release.version_source;
  let source = config.find_repo(source_name).ok_or_else(|| {
    PatchlineError::Config(ConfigError::VersionSource {
      name: source_name.clone(),
      reason: "no [[repos]] entry with this name".to_string(),
    })
  })?;

  if source.path.as_os_str().is_empty() || source.local_branch.is_empty() {
    return Err(PatchlineError::Config(ConfigError::VersionSource {
      name: source_name.clone(),
      reason: "path or local_branch missing".to_string(),
    }));
  }

  let git = SystemGit::open(&source.path).map_err(|e| {
    PatchlineError::Config(ConfigError::VersionSource {
      name: source_name.clone(),
      reason: e.to_string(),
    })
  })?;

  let (newest, next_newest) = resolve(&git, &source.local_branch, &source.remote, &source.tag_prefix);
  let (Some(newest), Some(next_newest)) = (newest, next_newest) else {
    return Err(PatchlineError::with_help(
      format!("Could not resolve two release tags for version source '{}'", source_name),
      "The version source needs at least two prefix-matching tags merged into its release branch.",
    ));
  };
  info!("Source tags resolved: newest='{}', next-newest='{}'", newest, next_newest);

  let newest_id = extract_version_identifier(&newest, &source.tag_prefix);
  let next_newest_id = extract_version_identifier(&next_newest, &source.tag_prefix);
  let (Some(newest_id), Some(next_newest_id)) = (newest_id, next_newest_id) else {
    return Err(PatchlineError::message(format!(
      "Identifier extraction failed from source tags '{}' / '{}'",
      newest, next_newest
    )));
  };
  info!("Global version ids: newest='{}', next-newest='{}'", newest_id, next_newest_id);

  Ok(VersionWindow {
    newest_id,
    next_newest_id,
    newest_tag: newest,
  })
}

/// Strip a repository's tag prefix to obtain the version identifier
pub fn extract_version_identifier(tag: &str, prefix: &str) -> Option<String> {
  match tag.strip_prefix(prefix) {
    Some(id) if !id.is_empty() => Some(id.to_string()),
    _ => {
      warn!("Tag '{}' does not carry expected prefix '{}'", tag, prefix);
      None
    }
  }
}

/// Construct a concrete tag name from a repository prefix and a version id
pub fn construct_tag(prefix: &str, version_id: &str) -> String {
  format!("{}{}", prefix, version_id)
}
