//! Module markers identifying "special" commits
//!
//! A special commit lives in an aggregator repository but logically belongs
//! to a dependent child module. It announces which module via a fixed
//! marker substring in its message. The marker set is a closed enum, not a
//! string-keyed table, so every match site is exhaustive.

use serde::Serialize;
use std::fmt;

/// The module a special commit belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleTag {
  Hypervisor,
  Sdk,
  Tee,
}

impl ModuleTag {
  /// All known tags, in a fixed scan order
  pub const ALL: [ModuleTag; 3] = [ModuleTag::Hypervisor, ModuleTag::Sdk, ModuleTag::Tee];

  /// The message substring announcing this module
  pub fn marker(self) -> &'static str {
    match self {
      ModuleTag::Hypervisor => "] hypervisor: ",
      ModuleTag::Sdk => "] sdk: ",
      ModuleTag::Tee => "] tee: ",
    }
  }

  /// Whether a commit message carries any module marker
  pub fn matches_any(message: &str) -> bool {
    Self::ALL.iter().any(|tag| message.contains(tag.marker()))
  }

  /// All module tags whose marker appears in the message, in scan order
  pub fn tags_in(message: &str) -> Vec<ModuleTag> {
    Self::ALL
      .iter()
      .copied()
      .filter(|tag| message.contains(tag.marker()))
      .collect()
  }
}

impl fmt::Display for ModuleTag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      ModuleTag::Hypervisor => "hypervisor",
      ModuleTag::Sdk => "sdk",
      ModuleTag::Tee => "tee",
    };
    write!(f, "{}", name)
  }
}
