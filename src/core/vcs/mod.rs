pub mod system_git;
mod system_git_ops;

pub use system_git::SystemGit;

use chrono::{DateTime, FixedOffset};

/// A raw commit record parsed from `git log`
#[derive(Debug, Clone)]
pub struct CommitRecord {
  pub id: String,
  pub author: String,
  pub date: String,
  pub message: String,
}

/// A tag ref with its creation timestamp
#[derive(Debug, Clone)]
pub struct TagEntry {
  pub name: String,
  pub created: DateTime<FixedOffset>,
}
