//! Patch generation and correlation against real repositories

use anyhow::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use tempfile::TempDir;

use patchline::core::config::PatchSettings;
use patchline::core::vcs::SystemGit;
use patchline::package::cleanup_staging;
use patchline::pipeline::patches::{self, RepoPatchStatus};
use patchline::pipeline::{commits, VersionWindow};

use crate::helpers::{repository, TestRepo};

fn window() -> VersionWindow {
  VersionWindow {
    newest_id: "20260201_00".to_string(),
    next_newest_id: "20260101_00".to_string(),
    newest_tag: "REL_20260201_00".to_string(),
  }
}

fn two_commit_repo() -> Result<TestRepo> {
  let repo = TestRepo::new()?;
  repo.commit_file("base.txt", "base", "base commit")?;
  repo.tag("REL_20260101_00")?;
  repo.commit_file("a.txt", "a", "first change")?;
  repo.commit_file("b.txt", "b", "second change")?;
  repo.tag("REL_20260201_00")?;
  Ok(repo)
}

#[test]
fn test_format_patch_count_matches_enumeration() -> Result<()> {
  let repo = two_commit_repo()?;
  let out = TempDir::new()?;

  let git = SystemGit::open(&repo.path)?;
  let commits = commits::enumerate(&git, "REL_20260101_00", "REL_20260201_00")?;
  let patch_files = git.format_patch("REL_20260101_00", "REL_20260201_00", out.path())?;

  assert_eq!(patch_files.len(), commits.len());
  assert!(patch_files.iter().all(|p| p.is_file()));
  Ok(())
}

#[test]
fn test_synthesize_assigns_patch_paths() -> Result<()> {
  let repo = two_commit_repo()?;
  let staging = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging.path().join("staging"),
    exclude: None,
  };

  let mut repos = vec![repository("core", None, &repo, "REL_")];
  let git = SystemGit::open(&repo.path)?;
  repos[0].commits = commits::enumerate(&git, "REL_20260101_00", "REL_20260201_00")?;

  let output = patches::synthesize(&mut repos, &window(), &patch_cfg, None, &HashSet::new())?;

  assert!(matches!(
    output.statuses[0].1,
    RepoPatchStatus::Assigned { commits: 2 }
  ));
  // Newest commit pairs with the lowest-numbered patch file
  assert!(repos[0].commits[0]
    .patch_path
    .as_deref()
    .is_some_and(|p| p.starts_with("0001-")));
  assert!(repos[0].commits[1]
    .patch_path
    .as_deref()
    .is_some_and(|p| p.starts_with("0002-")));

  // Every assigned path resolves to a staged file on disk
  for commit in &repos[0].commits {
    let archive_path = commit.patch_path.as_deref().unwrap();
    let staged = patches::staged_file(&output.patch_index, archive_path).unwrap();
    assert!(staged.is_file());
  }
  Ok(())
}

#[test]
fn test_relative_staging_dir_stays_out_of_the_repo() -> Result<()> {
  // A relative staging dir must resolve against our cwd, not land inside
  // the repository checkout via git's -C handling
  let repo = two_commit_repo()?;
  let rel = PathBuf::from(format!("staging-reltest-{}", std::process::id()));
  let patch_cfg = PatchSettings {
    staging_dir: rel.clone(),
    exclude: None,
  };

  let mut repos = vec![repository("core", None, &repo, "REL_")];
  let git = SystemGit::open(&repo.path)?;
  repos[0].commits = commits::enumerate(&git, "REL_20260101_00", "REL_20260201_00")?;

  let output = patches::synthesize(&mut repos, &window(), &patch_cfg, None, &HashSet::new());
  let result = output.map(|output| {
    assert!(matches!(
      output.statuses[0].1,
      RepoPatchStatus::Assigned { commits: 2 }
    ));
    assert!(!repo.path.join(&rel).exists());
    for staged in output.patch_index.values() {
      assert!(staged.is_absolute());
      assert!(staged.is_file());
    }
  });

  cleanup_staging(&rel);
  result?;
  Ok(())
}

#[test]
fn test_synthesize_skips_excluded_repo() -> Result<()> {
  let repo = two_commit_repo()?;
  let staging = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging.path().join("staging"),
    exclude: Some("core".to_string()),
  };

  let mut repos = vec![repository("core", None, &repo, "REL_")];
  let git = SystemGit::open(&repo.path)?;
  repos[0].commits = commits::enumerate(&git, "REL_20260101_00", "REL_20260201_00")?;

  let output = patches::synthesize(&mut repos, &window(), &patch_cfg, None, &HashSet::new())?;

  assert!(matches!(output.statuses[0].1, RepoPatchStatus::Skipped { .. }));
  assert!(output.patch_index.is_empty());
  assert!(repos[0].commits.iter().all(|c| c.patch_path.is_none()));
  // The excluded repo never stages anything
  let mut entries = std::fs::read_dir(&patch_cfg.staging_dir)?;
  assert!(entries.next().is_none());
  Ok(())
}

#[test]
fn test_synthesize_skips_child_of_aggregator() -> Result<()> {
  let repo = two_commit_repo()?;
  let staging = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging.path().join("staging"),
    exclude: None,
  };

  let mut repos = vec![repository("child", Some("agg"), &repo, "REL_")];
  let output = patches::synthesize(&mut repos, &window(), &patch_cfg, Some("agg"), &HashSet::new())?;

  assert!(matches!(output.statuses[0].1, RepoPatchStatus::Skipped { .. }));
  assert!(output.patch_index.is_empty());
  Ok(())
}

#[test]
fn test_synthesize_empty_window_is_skipped() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file("base.txt", "base", "only commit")?;
  repo.tag("REL_20260101_00")?;
  repo.tag("REL_20260201_00")?;

  let staging = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging.path().join("staging"),
    exclude: None,
  };

  let mut repos = vec![repository("core", None, &repo, "REL_")];
  let output = patches::synthesize(&mut repos, &window(), &patch_cfg, None, &HashSet::new())?;

  assert!(matches!(output.statuses[0].1, RepoPatchStatus::Skipped { .. }));
  Ok(())
}
