//! Changed command implementation
//!
//! Records one change log entry in every changelog representation: the
//! structured store (migrating legacy manifest history on first use), the
//! XML manifest's current notes and history, and the plain CHANGES text.

use crate::changelog::{self, MigrationOutcome};
use crate::core::config::Context;
use crate::core::error::CadenceResult;
use crate::core::vcs::CommitHelper;
use crate::ui::Output;
use crate::wrappers::{EntryState, Wrapper, WrapperCache, CHANGELOG_YML_FILE, CHANGES_FILE, PACKAGE_XML_FILE};

#[derive(Debug, Clone, Default)]
pub struct ChangedOptions {
  /// Leave the XML manifest alone
  pub no_package: bool,
  /// Leave the plain CHANGES file alone
  pub no_changes: bool,
  /// Stage and commit the touched files
  pub commit: bool,
}

/// Run the changed command
pub fn run_changed(ctx: &Context, log: &str, options: &ChangedOptions, output: &mut Output) -> CadenceResult<()> {
  let mut cache = WrapperCache::new(&ctx.component_dir);
  let descriptor = cache.descriptor()?.data().clone();
  let current_version = descriptor.version.release.clone();

  let mut helper = options
    .commit
    .then(|| CommitHelper::new(&ctx.component_dir, ctx.pretend));

  let store_path = cache.doc_dir().join(CHANGELOG_YML_FILE);
  let xml_exists = ctx.component_dir.join(PACKAGE_XML_FILE).exists();

  // First use: reconstruct the store from the manifest history.
  if !store_path.exists() && xml_exists {
    let history = cache.package_xml()?.changelog.clone();
    let outcome = changelog::migrate_legacy(cache.changelog_yml()?.store_mut(), &history);
    if let MigrationOutcome::Migrated(_) = outcome {
      if ctx.pretend {
        output.ok(format!("Would create {} now.", store_path.display()));
      } else {
        output.ok(format!("Created {}.", store_path.display()));
      }
    }
  }

  // Record the note against the current version; the very first entry of
  // a component takes its state from the descriptor.
  let first_entry = cache.changelog_yml()?.store().is_empty();
  let state = first_entry.then(|| EntryState {
    release: descriptor.state.release.as_str().to_string(),
    api: descriptor.state.api.as_str().to_string(),
  });
  changelog::append_note(cache.changelog_yml()?.store_mut(), &current_version, log, state);
  if ctx.pretend {
    output.ok(format!("Would add change log entry to {} now.", store_path.display()));
  } else {
    cache.changelog_yml()?.save()?;
    output.ok(format!(
      "Added new note to version {} of {}.",
      current_version,
      store_path.display()
    ));
  }
  if let Some(helper) = helper.as_mut() {
    helper.add(&store_path, &ctx.component_dir)?;
  }

  // Project the store into the XML manifest.
  if !options.no_package && xml_exists {
    let store = cache.changelog_yml()?.store().clone();
    let xml = cache.package_xml()?;
    changelog::update_manifest(&store, &current_version, xml);
    let xml_path = xml.path().to_path_buf();
    if ctx.pretend {
      output.ok(format!("Would update {} now.", xml_path.display()));
    } else {
      cache.package_xml()?.save()?;
      output.ok(format!("Updated {}.", xml_path.display()));
    }
    if let Some(helper) = helper.as_mut() {
      helper.add(&xml_path, &ctx.component_dir)?;
    }
  }

  // Refresh the plain-text rendering when the component keeps one.
  if !options.no_changes && cache.doc_dir().join(CHANGES_FILE).exists() {
    let store = cache.changelog_yml()?.store().clone();
    let rendered = changelog::render_changes(&store);
    let changes = cache.changes()?;
    changes.set_content(rendered);
    let changes_path = changes.path().to_path_buf();
    if ctx.pretend {
      output.ok(format!("Would update {} now.", changes_path.display()));
    } else {
      cache.changes()?.save()?;
      output.ok(format!("Updated {}.", changes_path.display()));
    }
    if let Some(helper) = helper.as_mut() {
      helper.add(&changes_path, &ctx.component_dir)?;
    }
  }

  if let Some(helper) = helper.as_mut() {
    helper.commit(log)?;
  }
  if let Some(helper) = &helper {
    for message in helper.messages() {
      output.ok(message.clone());
    }
  }
  Ok(())
}
