use serde::Serialize;
use std::env;

use crate::core::config::PatchlineConfig;
use crate::core::error::PatchlineResult;
use crate::pipeline::{build_repositories, tags};

#[derive(Debug, Serialize)]
struct TagRow {
  name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  parent: Option<String>,
  newest_tag: Option<String>,
  next_newest_tag: Option<String>,
}

/// Run the tags command
pub fn run_tags(json: bool) -> PatchlineResult<()> {
  let current_dir = env::current_dir()?;
  let config = PatchlineConfig::load(&current_dir)?;

  let mut repos = build_repositories(&config);
  tags::resolve_all(&mut repos);

  let rows: Vec<TagRow> = repos
    .iter()
    .map(|r| TagRow {
      name: r.config.name.clone(),
      parent: r.config.parent.clone(),
      newest_tag: r.newest_tag.clone(),
      next_newest_tag: r.next_newest_tag.clone(),
    })
    .collect();

  if json {
    println!("{}", serde_json::to_string_pretty(&rows)?);
    return Ok(());
  }

  println!("Release tags ({} repositories):\n", rows.len());
  for row in &rows {
    let qualified = match &row.parent {
      Some(parent) => format!("{}/{}", parent, row.name),
      None => row.name.clone(),
    };
    println!("  {}", qualified);
    println!("    newest:      {}", row.newest_tag.as_deref().unwrap_or("-"));
    println!("    next-newest: {}", row.next_newest_tag.as_deref().unwrap_or("-"));
  }

  Ok(())
}
