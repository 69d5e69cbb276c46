//! Tag resolution against real repositories

use anyhow::Result;

use patchline::core::vcs::SystemGit;
use patchline::pipeline::tags;

use crate::helpers::TestRepo;

#[test]
fn test_resolve_returns_two_newest_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file_at("a.txt", "a", "first", "2026-01-01T10:00:00")?;
  repo.tag_at("REL_20260101_00", "2026-01-01T10:05:00")?;
  repo.commit_file_at("b.txt", "b", "second", "2026-02-01T10:00:00")?;
  repo.tag_at("REL_20260201_00", "2026-02-01T10:05:00")?;
  repo.commit_file_at("c.txt", "c", "third", "2026-03-01T10:00:00")?;
  repo.tag_at("REL_20260301_00", "2026-03-01T10:05:00")?;

  let git = SystemGit::open(&repo.path)?;
  let (newest, next_newest) = tags::resolve(&git, "main", "origin", "REL_");

  assert_eq!(newest.as_deref(), Some("REL_20260301_00"));
  assert_eq!(next_newest.as_deref(), Some("REL_20260201_00"));
  Ok(())
}

#[test]
fn test_resolve_excludes_unmerged_tags() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file_at("a.txt", "a", "first", "2026-01-01T10:00:00")?;
  repo.tag_at("REL_20260101_00", "2026-01-01T10:05:00")?;
  repo.commit_file_at("b.txt", "b", "second", "2026-02-01T10:00:00")?;
  repo.tag_at("REL_20260201_00", "2026-02-01T10:05:00")?;

  // Newer tag on a fork that main never merged
  repo.checkout_new_branch("hotfix")?;
  repo.commit_file_at("h.txt", "h", "hotfix work", "2026-03-01T10:00:00")?;
  repo.tag_at("REL_20260301_00", "2026-03-01T10:05:00")?;
  repo.checkout("main")?;

  let git = SystemGit::open(&repo.path)?;
  let (newest, next_newest) = tags::resolve(&git, "main", "origin", "REL_");

  assert_eq!(newest.as_deref(), Some("REL_20260201_00"));
  assert_eq!(next_newest.as_deref(), Some("REL_20260101_00"));
  Ok(())
}

#[test]
fn test_resolve_breaks_timestamp_ties_by_sequence() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file_at("a.txt", "a", "first", "2026-01-01T10:00:00")?;
  repo.tag_at("REL_20260101_00", "2026-01-01T10:05:00")?;
  repo.commit_file_at("b.txt", "b", "respin", "2026-01-01T11:00:00")?;
  // Same creatordate as the next tag, higher sequence wins
  repo.tag_at("REL_20260101_02", "2026-01-01T12:00:00")?;
  repo.tag_at("REL_20260101_01", "2026-01-01T12:00:00")?;

  let git = SystemGit::open(&repo.path)?;
  let (newest, next_newest) = tags::resolve(&git, "main", "origin", "REL_");

  assert_eq!(newest.as_deref(), Some("REL_20260101_02"));
  assert_eq!(next_newest.as_deref(), Some("REL_20260101_01"));
  Ok(())
}

#[test]
fn test_resolve_filters_by_prefix() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file_at("a.txt", "a", "first", "2026-01-01T10:00:00")?;
  repo.tag_at("REL_20260101_00", "2026-01-01T10:05:00")?;
  repo.tag_at("OTHER_20260401_00", "2026-04-01T10:05:00")?;

  let git = SystemGit::open(&repo.path)?;
  let (newest, next_newest) = tags::resolve(&git, "main", "origin", "REL_");

  assert_eq!(newest.as_deref(), Some("REL_20260101_00"));
  assert_eq!(next_newest, None);
  Ok(())
}

#[test]
fn test_resolve_empty_repository_yields_none() -> Result<()> {
  let repo = TestRepo::new()?;
  repo.commit_file("a.txt", "a", "first")?;

  let git = SystemGit::open(&repo.path)?;
  let (newest, next_newest) = tags::resolve(&git, "main", "origin", "REL_");

  assert_eq!(newest, None);
  assert_eq!(next_newest, None);
  Ok(())
}
