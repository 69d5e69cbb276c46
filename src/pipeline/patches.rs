//! PatchSynthesizer: one patch artifact per commit, correlated by position
//!
//! `git format-patch` numbers files 0001-, 0002-, … per repository. Each
//! repository stages into its own subdirectory so identical filenames from
//! different repositories cannot collide. Correlation to commits is purely
//! positional, guarded by a hard count invariant: when the file count and
//! the commit count disagree the repository's assignment is abandoned
//! outright rather than risking a patch landing on the wrong commit.

use crate::core::config::PatchSettings;
use crate::core::error::{PatchlineResult, ResultExt};
use crate::core::vcs::SystemGit;
use crate::pipeline::markers::ModuleTag;
use crate::pipeline::tags::construct_tag;
use crate::pipeline::{normalize_path, Repository, SpecialCommitMap, VersionWindow};
use log::{debug, error, info, warn};
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Sort value for patch files whose name carries no 4-digit sequence
const UNSEQUENCED: u32 = 9999;

/// Outcome of patch processing for one repository
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepoPatchStatus {
  /// Patch paths were assigned to every commit in the window
  Assigned { commits: usize },
  /// File count and commit count disagreed; nothing was assigned
  CorrelationMismatch { patches: usize, commits: usize },
  /// Repository did not take part in patch generation
  Skipped { reason: String },
}

/// Everything the synthesizer hands downstream
#[derive(Debug, Default)]
pub struct SynthesisOutput {
  /// Special commit id → archive-relative patch path
  pub special_map: SpecialCommitMap,
  /// Archive-relative patch path → staged file on disk
  pub patch_index: BTreeMap<String, PathBuf>,
  /// Per-repository outcome, in configuration order
  pub statuses: Vec<(String, RepoPatchStatus)>,
}

/// Build the archive-relative path for a patch file
///
/// `{parent}/{relative_path}/{file_name}` with empty segments omitted and
/// forward slashes throughout.
pub fn archive_path(parent: Option<&str>, relative_path: Option<&str>, file_name: &str) -> String {
  [parent.unwrap_or(""), relative_path.unwrap_or(""), file_name]
    .iter()
    .filter(|segment| !segment.is_empty())
    .map(|segment| segment.replace('\\', "/"))
    .collect::<Vec<_>>()
    .join("/")
}

/// Parse the 4-digit sequence prefix of a format-patch filename
fn patch_sequence(file_name: &str) -> u32 {
  static PATTERN: OnceLock<Regex> = OnceLock::new();
  let pattern = PATTERN.get_or_init(|| Regex::new(r"^(\d{4})-.*\.patch$").expect("static regex"));

  match pattern
    .captures(file_name)
    .and_then(|c| c.get(1))
    .and_then(|m| m.as_str().parse::<u32>().ok())
  {
    Some(seq) => seq,
    None => {
      warn!(
        "Could not extract sequence number from patch filename '{}', sorting it last",
        file_name
      );
      UNSEQUENCED
    }
  }
}

/// Sort patch files ascending by their embedded sequence number
fn sort_patch_files(mut files: Vec<PathBuf>) -> Vec<PathBuf> {
  files.sort_by_key(|path| {
    path
      .file_name()
      .map(|name| patch_sequence(&name.to_string_lossy()))
      .unwrap_or(UNSEQUENCED)
  });
  files
}

/// Replace path separators so a repository name becomes one directory level
fn slug(name: &str) -> String {
  name.replace(['/', '\\'], "_")
}

/// Correlate sorted patch files to the repository's enumerated commits
///
/// On success every commit receives its archive path, special commits are
/// recorded into `special_map`, and every patch lands in `patch_index`.
/// On a count mismatch nothing is assigned for this repository.
fn correlate_and_assign(
  repo: &mut Repository,
  patch_files: Vec<PathBuf>,
  special_paths: &HashSet<String>,
  special_map: &mut SpecialCommitMap,
  patch_index: &mut BTreeMap<String, PathBuf>,
) -> RepoPatchStatus {
  let sorted = sort_patch_files(patch_files);

  if sorted.len() != repo.commits.len() {
    error!(
      "CRITICAL: patch file count ({}) does not match commit count ({}) for repository '{}'. \
       The 1:1 positional correlation no longer holds; abandoning patch assignment for this repository.",
      sorted.len(),
      repo.commits.len(),
      repo.qualified_name()
    );
    return RepoPatchStatus::CorrelationMismatch {
      patches: sorted.len(),
      commits: repo.commits.len(),
    };
  }

  let is_special_source = special_paths.contains(&normalize_path(&repo.config.path));
  let parent = repo.config.parent.clone();
  let relative_path = repo.config.relative_path.clone();

  for (patch_file, commit) in sorted.into_iter().zip(repo.commits.iter_mut()) {
    let file_name = patch_file
      .file_name()
      .map(|n| n.to_string_lossy().to_string())
      .unwrap_or_default();
    let path = archive_path(parent.as_deref(), relative_path.as_deref(), &file_name);

    commit.patch_path = Some(path.clone());
    patch_index.insert(path.clone(), patch_file);

    if is_special_source && ModuleTag::matches_any(&commit.message) {
      debug!("Recorded special commit patch mapping: {} -> {}", commit.id, path);
      special_map.insert(commit.id.clone(), path);
    }
  }

  RepoPatchStatus::Assigned {
    commits: repo.commits.len(),
  }
}

/// Generate and correlate patches for every eligible repository
///
/// Staging-directory creation failure is fatal for the whole run; every
/// other problem is repository-scoped.
pub fn synthesize(
  repos: &mut [Repository],
  window: &VersionWindow,
  patch_cfg: &PatchSettings,
  child_aggregator: Option<&str>,
  special_paths: &HashSet<String>,
) -> PatchlineResult<SynthesisOutput> {
  // git resolves a relative `-o` directory against its `-C <repo>` path,
  // not our cwd; the staging root must be absolute before any format-patch
  let staging_root = if patch_cfg.staging_dir.is_absolute() {
    patch_cfg.staging_dir.clone()
  } else {
    env::current_dir()
      .context("Failed to determine current directory for patch staging")?
      .join(&patch_cfg.staging_dir)
  };

  info!("Starting patch generation into {}", staging_root.display());

  fs::create_dir_all(&staging_root)
    .with_context(|| format!("Failed to create staging directory {}", staging_root.display()))?;

  let mut output = SynthesisOutput::default();

  for repo in repos.iter_mut() {
    let name = repo.qualified_name();
    let status = synthesize_repo(repo, window, &staging_root, patch_cfg, child_aggregator, special_paths, &mut output)?;
    if let RepoPatchStatus::Skipped { reason } = &status {
      debug!("Skipped patch generation for {}: {}", name, reason);
    }
    output.statuses.push((name, status));
  }

  info!(
    "Finished patch generation: {} special commit patches, {} patches total",
    output.special_map.len(),
    output.patch_index.len()
  );
  Ok(output)
}

fn synthesize_repo(
  repo: &mut Repository,
  window: &VersionWindow,
  staging_root: &Path,
  patch_cfg: &PatchSettings,
  child_aggregator: Option<&str>,
  special_paths: &HashSet<String>,
  output: &mut SynthesisOutput,
) -> PatchlineResult<RepoPatchStatus> {
  let skipped = |reason: &str| RepoPatchStatus::Skipped {
    reason: reason.to_string(),
  };

  if !repo.config.generate_patch {
    return Ok(skipped("patch generation disabled"));
  }

  // Children of the aggregator only receive patches via remapping
  if child_aggregator.is_some() && repo.config.parent.as_deref() == child_aggregator {
    info!(
      "Skipping patch generation for child repo {} of aggregator '{}'",
      repo.qualified_name(),
      child_aggregator.unwrap_or_default()
    );
    return Ok(skipped("child of aggregator"));
  }

  if patch_cfg.exclude.as_deref() == Some(repo.qualified_name().as_str()) {
    info!("Skipping patch generation for excluded repo {}", repo.qualified_name());
    return Ok(skipped("explicitly excluded"));
  }

  if repo.config.path.as_os_str().is_empty() || !repo.config.path.is_dir() {
    warn!(
      "Skipping patch generation for {}: invalid or missing path '{}'",
      repo.qualified_name(),
      repo.config.path.display()
    );
    return Ok(skipped("invalid repository path"));
  }

  let start_ref = construct_tag(&repo.config.tag_prefix, &window.next_newest_id);
  let end_ref = construct_tag(&repo.config.tag_prefix, &window.newest_id);

  let staging_subdir = staging_root.join(slug(&repo.qualified_name()));
  fs::create_dir_all(&staging_subdir)
    .with_context(|| format!("Failed to create staging directory {}", staging_subdir.display()))?;

  let git = match SystemGit::open(&repo.config.path) {
    Ok(git) => git,
    Err(e) => {
      warn!("Skipping patch generation for {}: {}", repo.qualified_name(), e);
      return Ok(skipped("repository not openable"));
    }
  };

  let patch_files = match git.format_patch(&start_ref, &end_ref, &staging_subdir) {
    Ok(files) => files,
    Err(e) => {
      warn!(
        "format-patch failed for {} ({}..{}): {}",
        repo.qualified_name(),
        start_ref,
        end_ref,
        e
      );
      return Ok(skipped("format-patch failed"));
    }
  };

  if patch_files.is_empty() {
    warn!(
      "No patch files generated for {} in range {}..{}",
      repo.qualified_name(),
      start_ref,
      end_ref
    );
    return Ok(skipped("no patches in range"));
  }

  info!(
    "Correlating {} patches to {} commits for {}",
    patch_files.len(),
    repo.commits.len(),
    repo.qualified_name()
  );

  Ok(correlate_and_assign(
    repo,
    patch_files,
    special_paths,
    &mut output.special_map,
    &mut output.patch_index,
  ))
}

/// Resolve a staged file for an archive path, used by the packager
pub fn staged_file<'a>(patch_index: &'a BTreeMap<String, PathBuf>, archive_path: &str) -> Option<&'a Path> {
  patch_index.get(archive_path).map(PathBuf::as_path)
}
