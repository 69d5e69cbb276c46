//! JSON run report: the annotated commit lists handed to downstream tooling

use crate::core::error::{PatchlineResult, ResultExt};
use crate::pipeline::patches::RepoPatchStatus;
use crate::pipeline::{Commit, Repository, SpecialCommitMap, VersionWindow};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Per-repository section of the report
#[derive(Debug, Serialize)]
pub struct RepoReport {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub parent: Option<String>,
  pub newest_tag: Option<String>,
  pub next_newest_tag: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub patch_status: Option<RepoPatchStatus>,
  pub commits: Vec<Commit>,
}

/// The full run report
#[derive(Debug, Serialize)]
pub struct RunReport {
  pub version: VersionWindow,
  pub repositories: Vec<RepoReport>,
  pub special_commits: SpecialCommitMap,
}

impl RunReport {
  /// Snapshot the pipeline state after remapping
  pub fn build(
    repos: &[Repository],
    window: &VersionWindow,
    special_map: &SpecialCommitMap,
    statuses: &[(String, RepoPatchStatus)],
  ) -> Self {
    let repositories = repos
      .iter()
      .map(|repo| {
        let qualified = repo.qualified_name();
        RepoReport {
          name: repo.config.name.clone(),
          parent: repo.config.parent.clone(),
          newest_tag: repo.newest_tag.clone(),
          next_newest_tag: repo.next_newest_tag.clone(),
          patch_status: statuses
            .iter()
            .find(|(name, _)| name == &qualified)
            .map(|(_, status)| status.clone()),
          commits: repo.commits.clone(),
        }
      })
      .collect();

    Self {
      version: window.clone(),
      repositories,
      special_commits: special_map.clone(),
    }
  }

  /// Write the report as pretty-printed JSON
  pub fn write(&self, path: &Path) -> PatchlineResult<()> {
    let json = serde_json::to_string_pretty(self)?;
    fs::write(path, json).with_context(|| format!("Failed to write report to {}", path.display()))?;
    Ok(())
  }
}
