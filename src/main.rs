use clap::{Parser, Subcommand};
use std::path::PathBuf;

use patchline::commands;
use patchline::core::error::{print_error, PatchlineError};

/// Assemble versioned release patch sets across git repositories
#[derive(Parser)]
#[command(name = "patchline")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct Cli {
  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Resolve and show the two most recent release tags per repository
  Tags {
    /// Output results in JSON format
    #[arg(long)]
    json: bool,
  },

  /// Preview the release window and per-repository commit lists
  Plan {
    /// Output the plan in JSON format (useful for CI/automation)
    #[arg(long)]
    json: bool,
  },

  /// Run the full pipeline: tags, commits, patches, remapping, package
  Assemble {
    /// Package output directory (default: patches-<version>)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Report file path (default: <out>/report.json)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Keep the patch staging directory after packaging
    #[arg(long)]
    keep_staging: bool,
  },
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  let cli = Cli::parse();

  let result = match cli.command {
    Commands::Tags { json } => commands::run_tags(json),
    Commands::Plan { json } => commands::run_plan(json),
    Commands::Assemble {
      out,
      report,
      keep_staging,
    } => commands::run_assemble(out, report, keep_staging),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: PatchlineError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
