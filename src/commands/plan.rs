use serde::Serialize;
use std::env;

use crate::core::config::PatchlineConfig;
use crate::core::error::PatchlineResult;
use crate::pipeline::{build_repositories, commits, tags, Commit, VersionWindow};

#[derive(Debug, Serialize)]
struct PlanRepo {
  name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  parent: Option<String>,
  analyzed: bool,
  commit_count: usize,
  commits: Vec<Commit>,
}

#[derive(Debug, Serialize)]
struct Plan {
  version: VersionWindow,
  repositories: Vec<PlanRepo>,
}

/// Run the plan command: tag resolution plus commit enumeration, no patches
pub fn run_plan(json: bool) -> PatchlineResult<()> {
  let current_dir = env::current_dir()?;
  let config = PatchlineConfig::load(&current_dir)?;

  let window = tags::resolve_version_window(&config)?;
  let mut repos = build_repositories(&config);
  tags::resolve_all(&mut repos);
  commits::enumerate_all(&mut repos, &window);

  let plan = Plan {
    version: window,
    repositories: repos
      .iter()
      .map(|r| PlanRepo {
        name: r.config.name.clone(),
        parent: r.config.parent.clone(),
        analyzed: r.config.analyze_commits,
        commit_count: r.commits.len(),
        commits: r.commits.clone(),
      })
      .collect(),
  };

  if json {
    println!("{}", serde_json::to_string_pretty(&plan)?);
    return Ok(());
  }

  println!(
    "Release window: {} -> {}\n",
    plan.version.next_newest_id, plan.version.newest_id
  );
  for repo in &plan.repositories {
    let qualified = match &repo.parent {
      Some(parent) => format!("{}/{}", parent, repo.name),
      None => repo.name.clone(),
    };
    if !repo.analyzed {
      println!("  {} (analysis disabled)", qualified);
      continue;
    }
    println!("  {} ({} commits)", qualified, repo.commit_count);
    for commit in &repo.commits {
      let subject = commit.message.lines().next().unwrap_or("");
      println!("    {} {}", &commit.id[..commit.id.len().min(12)], subject);
    }
  }

  Ok(())
}
