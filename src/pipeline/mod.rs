//! The version-resolution, commit-enumeration, patch-synthesis and
//! cross-repository remapping pipeline
//!
//! Stages run strictly in order, each one reading and mutating the shared
//! `Vec<Repository>` passed by reference:
//!
//! 1. **tags**: resolve the two most recent qualifying release tags
//! 2. **commits**: enumerate the commit window per repository
//! 3. **patches**: turn commit windows into ordered patch artifacts
//! 4. **remap**: re-attribute special aggregator commits onto child repos

pub mod commits;
pub mod markers;
pub mod patches;
pub mod remap;
pub mod tags;

use crate::core::config::RepoConfig;
use crate::core::vcs::CommitRecord;
use markers::ModuleTag;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// A commit inside the release window
///
/// Created by the enumerator; the synthesizer fills in `patch_path`, the
/// remapper may override it and add module tags.
#[derive(Debug, Clone, Serialize)]
pub struct Commit {
  pub id: String,
  pub author: String,
  pub date: String,
  pub message: String,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub modules: Vec<ModuleTag>,
  pub patch_path: Option<String>,
}

impl From<CommitRecord> for Commit {
  fn from(record: CommitRecord) -> Self {
    Self {
      id: record.id,
      author: record.author,
      date: record.date,
      message: record.message,
      modules: Vec::new(),
      patch_path: None,
    }
  }
}

/// A configured repository plus the mutable state it owns for one run
#[derive(Debug, Clone)]
pub struct Repository {
  pub config: RepoConfig,
  pub newest_tag: Option<String>,
  pub next_newest_tag: Option<String>,
  pub commits: Vec<Commit>,
}

impl Repository {
  pub fn new(config: RepoConfig) -> Self {
    Self {
      config,
      newest_tag: None,
      next_newest_tag: None,
      commits: Vec::new(),
    }
  }

  /// "parent/name" when a parent exists, otherwise just the name
  pub fn qualified_name(&self) -> String {
    self.config.qualified_name()
  }
}

/// Build run state for every configured repository
pub fn build_repositories(config: &crate::core::config::PatchlineConfig) -> Vec<Repository> {
  config.repos.iter().cloned().map(Repository::new).collect()
}

/// The two global version identifiers driving the run
#[derive(Debug, Clone, Serialize)]
pub struct VersionWindow {
  /// Identifier stripped from the newest version-source tag
  pub newest_id: String,
  /// Identifier stripped from the next-newest version-source tag
  pub next_newest_id: String,
  /// Full name of the newest version-source tag
  pub newest_tag: String,
}

/// Special commit id → archive-relative patch path
///
/// Ordered map so iteration (and the resulting report) is deterministic.
pub type SpecialCommitMap = BTreeMap<String, String>;

/// Normalize a path for set membership: forward slashes only
pub fn normalize_path(path: &std::path::Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

/// Resolve configured special-source repository names to a path set
pub fn special_source_paths(repos: &[Repository], names: &[String]) -> HashSet<String> {
  repos
    .iter()
    .filter(|r| names.iter().any(|n| n == &r.config.name))
    .map(|r| normalize_path(&r.config.path))
    .collect()
}
