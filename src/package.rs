//! Assemble the package directory: staged patches laid out by archive path
//!
//! The final handoff is a directory tree whose structure mirrors the
//! archive-relative patch paths computed by the synthesizer. Zipping and
//! deployment stay with external tooling.

use crate::core::error::{PatchlineResult, ResultExt};
use crate::pipeline::Repository;
use crate::ui::progress::FileProgress;
use log::{error, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Outcome of the packaging step
#[derive(Debug, Default)]
pub struct PackageSummary {
  pub copied: usize,
  pub missing: usize,
}

/// Copy every referenced staged patch into `out_dir/<archive_path>`
///
/// A missing staged file is logged and skipped; the rest of the package
/// still assembles.
pub fn assemble_package(
  repos: &[Repository],
  patch_index: &BTreeMap<String, PathBuf>,
  out_dir: &Path,
) -> PatchlineResult<PackageSummary> {
  info!("Assembling package directory at {}", out_dir.display());
  fs::create_dir_all(out_dir).with_context(|| format!("Failed to create package directory {}", out_dir.display()))?;

  let referenced: Vec<&str> = repos
    .iter()
    .flat_map(|r| r.commits.iter())
    .filter_map(|c| c.patch_path.as_deref())
    .collect();

  let mut progress = FileProgress::new(referenced.len(), "Packaging patches");
  let mut summary = PackageSummary::default();
  // Remapped child commits can share one special patch; copy each path once
  let mut seen: std::collections::HashSet<&str> = std::collections::HashSet::new();

  for archive_path in referenced {
    progress.inc();
    if !seen.insert(archive_path) {
      continue;
    }

    let Some(staged) = patch_index.get(archive_path) else {
      error!("No staged file recorded for archive path '{}', skipping", archive_path);
      summary.missing += 1;
      continue;
    };

    if !staged.is_file() {
      error!("Staged patch file not found: {}, skipping", staged.display());
      summary.missing += 1;
      continue;
    }

    let target = out_dir.join(archive_path);
    if let Some(parent) = target.parent() {
      fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::copy(staged, &target).with_context(|| format!("Failed to copy patch to {}", target.display()))?;
    summary.copied += 1;
  }

  info!(
    "Packaging complete: {} patches copied, {} missing",
    summary.copied, summary.missing
  );
  Ok(summary)
}

/// Delete the staging tree; called exactly once, after packaging
pub fn cleanup_staging(staging_dir: &Path) {
  if staging_dir.is_dir() {
    match fs::remove_dir_all(staging_dir) {
      Ok(()) => info!("Removed staging directory {}", staging_dir.display()),
      Err(e) => error!("Failed to remove staging directory {}: {}", staging_dir.display(), e),
    }
  }
}
