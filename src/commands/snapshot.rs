//! Snapshot command implementation
//!
//! Builds a development snapshot archive from the persisted manifest.

use crate::archive::{self, ArchiveOptions};
use crate::core::config::Context;
use crate::core::error::{CadenceError, CadenceResult};
use crate::ui::Output;
use crate::wrappers::PACKAGE_XML_FILE;
use chrono::Utc;
use std::path::PathBuf;

/// Run the snapshot command
pub fn run_snapshot(
  ctx: &Context,
  archive_dir: Option<PathBuf>,
  keep_version: bool,
  output: &mut Output,
) -> CadenceResult<()> {
  let destination = archive_dir
    .or_else(|| ctx.config.archive.destination.clone())
    .ok_or_else(|| {
      CadenceError::with_help(
        "No archive directory given",
        "Pass --archivedir or set [archive] destination in cadence.toml",
      )
    })?;

  let manifest_path = ctx.component_dir.join(PACKAGE_XML_FILE);

  if ctx.pretend {
    output.ok(format!(
      "Would generate a snapshot of {} in {} now.",
      manifest_path.display(),
      destination.display()
    ));
    return Ok(());
  }

  let outcome = archive::build(&manifest_path, &destination, &ArchiveOptions { keep_version }, &Utc::now())?;
  output.raw(&outcome.output);

  match outcome.archive {
    Some(path) => {
      output.ok(format!("Generated snapshot {}", path.display()));
      Ok(())
    }
    None => {
      output.fail(format!(
        "Generating snapshot failed with:\n\n{}",
        outcome.errors.join("\n")
      ));
      Err(CadenceError::ManifestValidationFailed {
        warnings: outcome.errors,
      })
    }
  }
}
