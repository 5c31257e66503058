mod archive;
mod changelog;
mod commands;
mod core;
mod sync;
mod ui;
mod version;
mod wrappers;

use crate::commands::changed::ChangedOptions;
use crate::core::config::Context;
use crate::core::error::{print_error, CadenceError};
use crate::sync::UpdateAction;
use crate::ui::Output;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Keep package metadata, manifests and changelogs in sync
#[derive(Parser)]
#[command(name = "cadence")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(styles = get_styles())]
struct CadenceCli {
  /// Component directory to operate on
  #[arg(long, global = true, default_value = ".")]
  dir: PathBuf,

  /// Compute and report everything without writing a single file
  #[arg(long, global = true)]
  pretend: bool,

  /// Only record result messages, do not echo them
  #[arg(long, global = true)]
  quiet: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Synchronize the generated manifests from the component descriptor
  Update {
    /// Show a diff against the on-disk files instead of writing
    #[arg(long, conflicts_with = "print")]
    diff: bool,
    /// Print the resulting file contents instead of writing
    #[arg(long)]
    print: bool,
    /// Stage the updated files with git
    #[arg(long)]
    commit: bool,
  },

  /// Record a change log entry in every changelog representation
  Changed {
    /// The log entry to record
    log: String,
    /// Do not touch the XML manifest
    #[arg(long)]
    no_package: bool,
    /// Do not touch the plain CHANGES file
    #[arg(long)]
    no_changes: bool,
    /// Stage and commit the touched files with git
    #[arg(long)]
    commit: bool,
  },

  /// Set the release and/or API version across all component files
  SetVersion {
    /// New release version
    #[arg(long)]
    release: Option<String>,
    /// New API version
    #[arg(long)]
    api: Option<String>,
    /// Stage the updated files with git
    #[arg(long)]
    commit: bool,
  },

  /// Set the release and/or API stability in the XML manifest
  SetState {
    /// New release stability (devel, alpha, beta, stable)
    #[arg(long)]
    release: Option<String>,
    /// New API stability (devel, alpha, beta, stable)
    #[arg(long)]
    api: Option<String>,
    /// Stage the updated file with git
    #[arg(long)]
    commit: bool,
  },

  /// Open the next version in the changelog and component files
  #[command(disable_version_flag = true)]
  NextVersion {
    /// The next version number
    version: String,
    /// Initial change log note for the next version
    note: String,
    /// Stability of the next release
    #[arg(long)]
    release_stability: Option<String>,
    /// API stability of the next release
    #[arg(long)]
    api_stability: Option<String>,
    /// Stage and commit the touched files with git
    #[arg(long)]
    commit: bool,
  },

  /// Replace the version sentinels in CHANGES and the source file
  Sentinel {
    /// Version literal for the CHANGES header
    changes_version: String,
    /// Version literal for the source sentinel; defaults to the same
    app_version: Option<String>,
    /// Stage the touched files with git
    #[arg(long)]
    commit: bool,
  },

  /// Timestamp the current release and synchronize the change log
  Timestamp {
    /// Stage and commit the touched files with git
    #[arg(long)]
    commit: bool,
  },

  /// Build a development snapshot archive of the component
  Snapshot {
    /// Directory for the resulting source archive
    #[arg(short = 'Z', long)]
    archivedir: Option<PathBuf>,
    /// Keep the manifest version instead of a dev-stamped one
    #[arg(long)]
    keep_version: bool,
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
  let cli = CadenceCli::parse();

  let ctx = match Context::build(&cli.dir, cli.pretend) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };
  let mut output = Output::new(cli.quiet);

  let result = match cli.command {
    Commands::Update { diff, print, commit } => {
      let action = if diff {
        UpdateAction::Diff
      } else if print {
        UpdateAction::Print
      } else {
        UpdateAction::Update
      };
      commands::run_update(&ctx, action, commit, &mut output)
    }
    Commands::Changed {
      log,
      no_package,
      no_changes,
      commit,
    } => commands::run_changed(
      &ctx,
      &log,
      &ChangedOptions {
        no_package,
        no_changes,
        commit,
      },
      &mut output,
    ),
    Commands::SetVersion { release, api, commit } => {
      commands::run_set_version(&ctx, release.as_deref(), api.as_deref(), commit, &mut output)
    }
    Commands::SetState { release, api, commit } => {
      commands::run_set_state(&ctx, release.as_deref(), api.as_deref(), commit, &mut output)
    }
    Commands::NextVersion {
      version,
      note,
      release_stability,
      api_stability,
      commit,
    } => commands::run_next_version(
      &ctx,
      &version,
      &note,
      release_stability.as_deref(),
      api_stability.as_deref(),
      commit,
      &mut output,
    ),
    Commands::Sentinel {
      changes_version,
      app_version,
      commit,
    } => {
      let app = app_version.as_deref().unwrap_or(&changes_version);
      commands::run_sentinel(&ctx, &changes_version, app, commit, &mut output)
    }
    Commands::Timestamp { commit } => commands::run_timestamp(&ctx, commit, &mut output),
    Commands::Snapshot {
      archivedir,
      keep_version,
    } => commands::run_snapshot(&ctx, archivedir, keep_version, &mut output),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: CadenceError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
