//! Patchline configuration (patchline.toml) parsing and validation

use crate::core::error::{ConfigError, PatchlineError, PatchlineResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for patchline
/// Searched in order: patchline.toml, .patchline.toml, .config/patchline.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchlineConfig {
  pub release: ReleaseSettings,
  #[serde(default)]
  pub patch: PatchSettings,
  #[serde(default)]
  pub repos: Vec<RepoConfig>,
}

/// Release-wide settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReleaseSettings {
  /// Name of the repository whose tags define the global version window
  pub version_source: String,

  /// Aggregator whose children receive remapped patches instead of their own
  #[serde(default)]
  pub child_aggregator: Option<String>,

  /// Names of repositories whose commits may be "special" (belong to a child)
  #[serde(default)]
  pub special_sources: Vec<String>,
}

/// Patch staging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchSettings {
  /// Directory where per-repository patch files are staged
  #[serde(default = "default_staging_dir")]
  pub staging_dir: PathBuf,

  /// Qualified name ("parent/name" or "name") of one repository excluded
  /// from patch generation
  #[serde(default)]
  pub exclude: Option<String>,
}

fn default_staging_dir() -> PathBuf {
  PathBuf::from(".patchline/staging")
}

impl Default for PatchSettings {
  fn default() -> Self {
    Self {
      staging_dir: default_staging_dir(),
      exclude: None,
    }
  }
}

/// A single repository taking part in the release
///
/// Read-only after load; the per-run mutable state (resolved tags, commit
/// list) lives on [`crate::pipeline::Repository`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
  /// Repository name (may contain slashes for manifest-style entries)
  pub name: String,

  /// Aggregator this repository belongs to; None means top-level
  #[serde(default)]
  pub parent: Option<String>,

  /// Filesystem path of the checkout
  pub path: PathBuf,

  /// Prefix shared by this repository's release tags
  #[serde(default)]
  pub tag_prefix: String,

  /// Remote to fetch tags from
  #[serde(default = "default_remote")]
  pub remote: String,

  /// Branch release tags must be merged into
  pub local_branch: String,

  /// Branch pushed to on the remote, when it differs from local_branch
  #[serde(default)]
  pub remote_branch: Option<String>,

  /// Whether to enumerate commits for this repository
  #[serde(default = "default_true")]
  pub analyze_commits: bool,

  /// Whether to generate patch files for this repository
  #[serde(default = "default_true")]
  pub generate_patch: bool,

  /// Path of this repository inside its aggregator, used for archive paths
  #[serde(default)]
  pub relative_path: Option<String>,
}

fn default_remote() -> String {
  "origin".to_string()
}

fn default_true() -> bool {
  true
}

impl RepoConfig {
  /// "parent/name" when a parent exists, otherwise just the name
  pub fn qualified_name(&self) -> String {
    match &self.parent {
      Some(parent) => format!("{}/{}", parent, self.name),
      None => self.name.clone(),
    }
  }
}

impl PatchlineConfig {
  /// Find config file in search order: patchline.toml, .patchline.toml, .config/patchline.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("patchline.toml"),
      path.join(".patchline.toml"),
      path.join(".config").join("patchline.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config from patchline.toml (searches multiple locations)
  pub fn load(path: &Path) -> PatchlineResult<Self> {
    let config_path = Self::find_config_path(path).ok_or_else(|| {
      PatchlineError::Config(ConfigError::NotFound {
        search_root: path.to_path_buf(),
      })
    })?;

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: PatchlineConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;

    config
      .validate()
      .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    Ok(config)
  }

  /// Validate the configuration before any repository is touched
  pub fn validate(&self) -> PatchlineResult<()> {
    if self.release.version_source.is_empty() {
      return Err(PatchlineError::Config(ConfigError::MissingField {
        field: "release.version_source".to_string(),
      }));
    }

    if self.repos.is_empty() {
      return Err(PatchlineError::with_help(
        "No repositories configured",
        "Add at least one [[repos]] entry to patchline.toml",
      ));
    }

    for repo in &self.repos {
      if repo.name.is_empty() {
        return Err(PatchlineError::Config(ConfigError::MissingField {
          field: "repos.name".to_string(),
        }));
      }
      if repo.local_branch.is_empty() {
        return Err(PatchlineError::Config(ConfigError::MissingField {
          field: format!("local_branch for repo '{}'", repo.name),
        }));
      }
    }

    Ok(())
  }

  /// Find a repository by name
  pub fn find_repo(&self, name: &str) -> Option<&RepoConfig> {
    self.repos.iter().find(|r| r.name == name)
  }
}
