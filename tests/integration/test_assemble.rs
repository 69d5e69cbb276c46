//! End-to-end pipeline: tags, commits, patches, remapping, package, report

use anyhow::Result;
use tempfile::TempDir;

use patchline::core::config::PatchSettings;
use patchline::core::vcs::SystemGit;
use patchline::package::{assemble_package, cleanup_staging};
use patchline::pipeline::markers::ModuleTag;
use patchline::pipeline::patches::RepoPatchStatus;
use patchline::pipeline::{commits, patches, remap, special_source_paths, VersionWindow};
use patchline::report::RunReport;

use crate::helpers::{repository, TestRepo};

#[test]
fn test_full_pipeline_with_remapping() -> Result<()> {
  // Special-source repository: one plain commit, one marker commit that
  // belongs to the aggregator's child
  let platform = TestRepo::new()?;
  platform.commit_file("base.txt", "base", "base commit")?;
  platform.tag("REL_20260101_00")?;
  platform.commit_file("core.c", "code", "plain platform change")?;
  let marker_commit = platform.commit_file("sdk.c", "code", "[topic] sdk: fix child build")?;
  platform.tag("REL_20260201_00")?;

  // Child repository of the aggregator: enumerated but never patched directly
  let child = TestRepo::new()?;
  child.commit_file("base.txt", "base", "base commit")?;
  child.tag("REL_20260101_00")?;
  let child_commit = child.commit_file("app.c", "code", "child feature work")?;
  child.tag("REL_20260201_00")?;

  let window = VersionWindow {
    newest_id: "20260201_00".to_string(),
    next_newest_id: "20260101_00".to_string(),
    newest_tag: "REL_20260201_00".to_string(),
  };

  let mut repos = vec![
    repository("platform", None, &platform, "REL_"),
    repository("child", Some("agg"), &child, "REL_"),
  ];
  repos[0].config.relative_path = Some("platform".to_string());

  commits::enumerate_all(&mut repos, &window);
  assert_eq!(repos[0].commits.len(), 2);
  assert_eq!(repos[1].commits.len(), 1);

  let staging_root = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging_root.path().join("staging"),
    exclude: None,
  };
  let special_paths = special_source_paths(&repos, &["platform".to_string()]);
  let synthesis = patches::synthesize(&mut repos, &window, &patch_cfg, Some("agg"), &special_paths)?;

  assert!(matches!(synthesis.statuses[0].1, RepoPatchStatus::Assigned { commits: 2 }));
  assert!(matches!(synthesis.statuses[1].1, RepoPatchStatus::Skipped { .. }));
  assert_eq!(synthesis.special_map.len(), 1);
  let special_patch = synthesis.special_map.get(&marker_commit).cloned().unwrap();
  assert!(special_patch.starts_with("platform/"));

  remap::remap(&mut repos, &synthesis.special_map, "agg", &special_paths);

  // The special commit left its source repository
  assert_eq!(repos[0].commits.len(), 1);
  assert!(repos[0].commits.iter().all(|c| c.id != marker_commit));

  // The child commit carries the special patch and its module tag
  let remapped = &repos[1].commits[0];
  assert_eq!(remapped.id, child_commit);
  assert_eq!(remapped.patch_path.as_deref(), Some(special_patch.as_str()));
  assert_eq!(remapped.modules, vec![ModuleTag::Sdk]);

  // Package assembles every referenced patch at its archive path
  let out = TempDir::new()?;
  let summary = assemble_package(&repos, &synthesis.patch_index, out.path())?;
  assert_eq!(summary.missing, 0);
  assert_eq!(summary.copied, 2);
  assert!(out.path().join(&special_patch).is_file());
  let platform_patch = repos[0].commits[0].patch_path.as_deref().unwrap();
  assert!(out.path().join(platform_patch).is_file());

  // Report captures the remapped state as valid JSON
  let report_path = out.path().join("report.json");
  RunReport::build(&repos, &window, &synthesis.special_map, &synthesis.statuses).write(&report_path)?;
  let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&report_path)?)?;
  assert_eq!(parsed["version"]["newest_id"], "20260201_00");
  assert_eq!(parsed["special_commits"][&marker_commit], special_patch);

  cleanup_staging(&patch_cfg.staging_dir);
  assert!(!patch_cfg.staging_dir.exists());
  Ok(())
}

#[test]
fn test_pipeline_without_aggregator_children() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file("base.txt", "base", "base commit")?;
  repo.tag("REL_20260101_00")?;
  repo.commit_file("a.txt", "a", "standalone change")?;
  repo.tag("REL_20260201_00")?;

  let window = VersionWindow {
    newest_id: "20260201_00".to_string(),
    next_newest_id: "20260101_00".to_string(),
    newest_tag: "REL_20260201_00".to_string(),
  };

  let mut repos = vec![repository("solo", None, &repo, "REL_")];
  commits::enumerate_all(&mut repos, &window);

  let staging_root = TempDir::new()?;
  let patch_cfg = PatchSettings {
    staging_dir: staging_root.path().join("staging"),
    exclude: None,
  };
  let synthesis = patches::synthesize(&mut repos, &window, &patch_cfg, None, &Default::default())?;

  // No aggregator configured: remapping is a no-op and the lone patch packages
  remap::remap(&mut repos, &synthesis.special_map, "agg", &Default::default());
  assert_eq!(repos[0].commits.len(), 1);

  let out = TempDir::new()?;
  let summary = assemble_package(&repos, &synthesis.patch_index, out.path())?;
  assert_eq!(summary.copied, 1);
  assert_eq!(summary.missing, 0);
  Ok(())
}

#[test]
fn test_version_source_enumeration_matches_format_patch() -> Result<()> {
  // The version-source repository itself flows through the same window
  let repo = TestRepo::new()?;
  repo.commit_file("base.txt", "base", "base commit")?;
  repo.tag("REL_20260101_00")?;
  repo.commit_file("a.txt", "a", "windowed change")?;
  repo.tag("REL_20260201_00")?;

  let git = SystemGit::open(&repo.path)?;
  let commits = commits::enumerate(&git, "REL_20260101_00", "REL_20260201_00")?;
  let staging = TempDir::new()?;
  let files = git.format_patch("REL_20260101_00", "REL_20260201_00", staging.path())?;

  assert_eq!(commits.len(), files.len());
  Ok(())
}
