//! CrossRepoRemapper: re-attribute special aggregator commits onto children
//!
//! Special commits are discovered in the aggregator's source repositories,
//! every child commit is mapped to the full set of them, patch paths and
//! module tags propagate onto the children, and only then are the special
//! commits removed from their source lists so they are not emitted twice.
//!
//! The child-to-special mapping is deliberately a full cross-product, not a
//! causal correlation: every child commit maps to every special commit in
//! the run. Downstream consumers depend on that shape, so it is preserved
//! as-is rather than narrowed by timestamp or ordering heuristics.

use crate::pipeline::markers::ModuleTag;
use crate::pipeline::{normalize_path, Repository, SpecialCommitMap};
use log::{debug, info, warn};
use std::collections::{HashMap, HashSet};

/// Child commit id → ordered special commit ids discovered in the run
type ChildToSpecialMap = HashMap<String, Vec<String>>;

/// Propagate special-commit patches and module tags onto child repositories
///
/// Mutates commit lists in place. Source-side removal happens last, after
/// every piece of information has been captured from the original lists.
pub fn remap(
  repos: &mut [Repository],
  special_map: &SpecialCommitMap,
  child_aggregator: &str,
  special_paths: &HashSet<String>,
) {
  info!("Starting cross-repository remapping for aggregator '{}'", child_aggregator);

  let has_children = repos
    .iter()
    .any(|r| r.config.parent.as_deref() == Some(child_aggregator));
  if !has_children {
    warn!(
      "No child repositories found with parent '{}', skipping remapping",
      child_aggregator
    );
    return;
  }

  // Authoritative scan of the unmutated source lists. This runs against the
  // same classification rule the synthesizer used, so ids line up even for
  // repositories whose patch assignment was abandoned.
  let mut special_ids: Vec<String> = Vec::new();
  let mut special_messages: HashMap<String, String> = HashMap::new();
  for repo in repos.iter() {
    if !special_paths.contains(&normalize_path(&repo.config.path)) {
      continue;
    }
    for commit in &repo.commits {
      if ModuleTag::matches_any(&commit.message) {
        info!("Found special commit in {}: {}", repo.qualified_name(), commit.id);
        special_ids.push(commit.id.clone());
        special_messages.insert(commit.id.clone(), commit.message.clone());
      }
    }
  }

  if special_ids.is_empty() {
    info!("No special commits found in any source repository, nothing to remap");
    return;
  }

  // Every child commit maps to the entire special id list
  let mut child_map: ChildToSpecialMap = HashMap::new();
  for repo in repos.iter() {
    if repo.config.parent.as_deref() != Some(child_aggregator) {
      continue;
    }
    for commit in &repo.commits {
      child_map.insert(commit.id.clone(), special_ids.clone());
    }
  }
  info!(
    "Mapped {} child commits to {} special commits",
    child_map.len(),
    special_ids.len()
  );

  // Link patch paths (first resolvable special id) and accumulate module
  // tags (every matching special id)
  let mut linked = 0usize;
  let mut unlinked = 0usize;
  for repo in repos.iter_mut() {
    if repo.config.parent.as_deref() != Some(child_aggregator) {
      continue;
    }
    let repo_name = repo.qualified_name();
    for commit in repo.commits.iter_mut() {
      let Some(ids) = child_map.get(&commit.id) else {
        continue;
      };

      commit.patch_path = ids.iter().find_map(|id| special_map.get(id).cloned());

      for id in ids {
        if let Some(message) = special_messages.get(id) {
          for tag in ModuleTag::tags_in(message) {
            if !commit.modules.contains(&tag) {
              commit.modules.push(tag);
            }
          }
        }
      }

      match &commit.patch_path {
        Some(path) => {
          debug!("Linked patch '{}' to child commit {} ({})", path, commit.id, repo_name);
          linked += 1;
        }
        None => {
          warn!(
            "Child commit {} ({}) has special commit ids but none with a resolvable patch path",
            commit.id, repo_name
          );
          unlinked += 1;
        }
      }
    }
  }
  info!("Linked patches for {} child commits, {} left unlinked", linked, unlinked);

  // Removal is irreversible for the run and must come last
  let id_set: HashSet<&String> = special_ids.iter().collect();
  for repo in repos.iter_mut() {
    if !special_paths.contains(&normalize_path(&repo.config.path)) {
      continue;
    }
    let before = repo.commits.len();
    repo.commits.retain(|c| !id_set.contains(&c.id));
    let removed = before - repo.commits.len();
    if removed > 0 {
      info!(
        "Removed {} special commits from source repo {}",
        removed,
        repo.qualified_name()
      );
    }
  }
}
