use std::env;
use std::path::PathBuf;

use crate::core::config::PatchlineConfig;
use crate::core::error::PatchlineResult;
use crate::package::{assemble_package, cleanup_staging};
use crate::pipeline::{build_repositories, commits, patches, remap, special_source_paths, tags};
use crate::report::RunReport;

/// Run the assemble command: the full pipeline, package and report
pub fn run_assemble(out: Option<PathBuf>, report: Option<PathBuf>, keep_staging: bool) -> PatchlineResult<()> {
  let current_dir = env::current_dir()?;
  let config = PatchlineConfig::load(&current_dir)?;

  let window = tags::resolve_version_window(&config)?;
  println!(
    "Release window: {} -> {}",
    window.next_newest_id, window.newest_id
  );

  let mut repos = build_repositories(&config);
  tags::resolve_all(&mut repos);
  commits::enumerate_all(&mut repos, &window);

  let special_paths = special_source_paths(&repos, &config.release.special_sources);
  let synthesis = patches::synthesize(
    &mut repos,
    &window,
    &config.patch,
    config.release.child_aggregator.as_deref(),
    &special_paths,
  )?;

  if let Some(aggregator) = config.release.child_aggregator.as_deref() {
    remap::remap(&mut repos, &synthesis.special_map, aggregator, &special_paths);
  }

  let out_dir = out.unwrap_or_else(|| PathBuf::from(format!("patches-{}", window.newest_id)));
  let summary = assemble_package(&repos, &synthesis.patch_index, &out_dir)?;

  let report_path = report.unwrap_or_else(|| out_dir.join("report.json"));
  RunReport::build(&repos, &window, &synthesis.special_map, &synthesis.statuses).write(&report_path)?;

  if keep_staging {
    println!("Staging directory retained at {}", config.patch.staging_dir.display());
  } else {
    cleanup_staging(&config.patch.staging_dir);
  }

  println!(
    "\n✅ Package assembled at {} ({} patches copied, {} missing)",
    out_dir.display(),
    summary.copied,
    summary.missing
  );
  println!("   Report written to {}", report_path.display());

  Ok(())
}
