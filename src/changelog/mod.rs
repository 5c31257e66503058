//! Changelog and release-notes engine
//!
//! State machine over a component's release history. A component is in one
//! of three states: no changelog file at all, legacy history kept only
//! inside package.xml, or a structured changelog.yml store. The engine
//! migrates forward, mutates the store, and projects it back into the XML
//! manifest and the plain CHANGES rendering.
//!
//! All operations take their collaborators as explicit parameters; the
//! engine holds no state of its own.

use crate::core::error::{CadenceError, CadenceResult};
use crate::wrappers::changes::header_block;
use crate::wrappers::package_xml::{PackageXmlWrapper, ReleaseEntry};
use crate::wrappers::{ChangelogEntry, ChangelogStore, EntryState};
use std::path::Path;

/// Result of a legacy-history migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationOutcome {
  /// The store already existed; nothing was done.
  AlreadyStructured,
  /// Entries reconstructed from the manifest history.
  Migrated(usize),
}

/// Reconstruct the structured store from the manifest's release history.
///
/// Idempotent: running it against an already-populated store is a no-op
/// reported as such.
pub fn migrate_legacy(store: &mut ChangelogStore, history: &[ReleaseEntry]) -> MigrationOutcome {
  if !store.is_empty() {
    return MigrationOutcome::AlreadyStructured;
  }
  let mut count = 0;
  for release in history {
    if release.version_release.is_empty() {
      continue;
    }
    store.insert(
      &release.version_release,
      ChangelogEntry {
        api: (!release.version_api.is_empty()).then(|| release.version_api.clone()),
        state: EntryState {
          release: release.stability_release.clone(),
          api: release.stability_api.clone(),
        },
        date: (!release.date.is_empty()).then(|| release.date.clone()),
        notes: release.notes.clone(),
      },
    );
    count += 1;
  }
  MigrationOutcome::Migrated(count)
}

/// Add a note to a version, creating the entry when the version is new.
///
/// A new entry copies its state from the newest existing entry unless an
/// override is given. The store is re-sorted after the mutation.
pub fn append_note(store: &mut ChangelogStore, version: &str, text: &str, state: Option<EntryState>) {
  if let Some(entry) = store.get_mut(version) {
    if !entry.notes.is_empty() && !entry.notes.ends_with('\n') {
      entry.notes.push('\n');
    }
    entry.notes.push_str(text);
    if let Some(state) = state {
      entry.state = state;
    }
    store.sort();
    return;
  }

  let template = store.latest().map(|(_, e)| e.clone()).unwrap_or_default();
  store.insert(
    version,
    ChangelogEntry {
      api: template.api.clone(),
      state: state.unwrap_or(template.state),
      date: template.date,
      notes: format!("\n{}", text),
    },
  );
}

/// Open the next release: clone the current version's entry under the new
/// version with a fresh initial note and optional stability overrides.
///
/// The current descriptor version must already be a key in the store.
pub fn advance_version(
  store: &mut ChangelogStore,
  current_version: &str,
  new_version: &str,
  initial_note: &str,
  release_stability: Option<&str>,
  api_stability: Option<&str>,
  store_path: &Path,
) -> CadenceResult<()> {
  let Some(current) = store.get(current_version) else {
    return Err(CadenceError::UnknownCurrentVersion {
      version: current_version.to_string(),
      file: store_path.to_path_buf(),
    });
  };
  let mut next = current.clone();
  next.notes = format!("\n{}", initial_note);
  if let Some(stability) = release_stability {
    next.state.release = stability.to_string();
  }
  if let Some(stability) = api_stability {
    next.state.api = stability.to_string();
  }
  store.insert(new_version, next);
  Ok(())
}

/// Stamp today's date on the given version's entry.
pub fn timestamp(store: &mut ChangelogStore, version: &str, today: &str) -> bool {
  match store.get_mut(version) {
    Some(entry) => {
      entry.date = Some(today.to_string());
      true
    }
    None => false,
  }
}

/// Rename the current version key and/or update its API version.
pub fn set_version(store: &mut ChangelogStore, current: &str, release: Option<&str>, api: Option<&str>) -> bool {
  let key = match release {
    Some(new_release) => {
      if !store.rename(current, new_release) {
        return false;
      }
      new_release
    }
    None => current,
  };
  if let Some(api) = api {
    match store.get_mut(key) {
      Some(entry) => entry.api = Some(api.to_string()),
      None => return false,
    }
  }
  true
}

/// Deterministic plain-text rendering, most recent version first.
///
/// Re-rendering unchanged data is byte-identical, which is what makes the
/// diff mode of the synchronizer meaningful.
pub fn render_changes(store: &ChangelogStore) -> String {
  let sections: Vec<String> = store
    .iter()
    .map(|(version, entry)| format!("{}\n\n{}\n", header_block(version), entry.notes.trim()))
    .collect();
  sections.join("\n\n")
}

/// Project the store back into the XML manifest: current date and notes,
/// plus the full per-release history.
pub fn update_manifest(store: &ChangelogStore, current_version: &str, xml: &mut PackageXmlWrapper) {
  if let Some(entry) = store.get(current_version) {
    if let Some(date) = &entry.date {
      xml.date = date.clone();
    }
    xml.notes = entry.notes.trim().to_string();
    if let Some(api) = &entry.api {
      xml.version_api = api.clone();
    }
  }

  let fallback_api = xml.version_api.clone();
  let license = xml.license.clone();
  let license_uri = xml.license_uri.clone();
  xml.changelog = store
    .iter()
    .map(|(version, entry)| ReleaseEntry {
      version_release: version.to_string(),
      version_api: entry.api.clone().unwrap_or_else(|| fallback_api.clone()),
      stability_release: entry.state.release.clone(),
      stability_api: entry.state.api.clone(),
      date: entry.date.clone().unwrap_or_default(),
      license: license.clone(),
      license_uri: license_uri.clone(),
      notes: entry.notes.trim().to_string(),
    })
    .collect();
}
