//! The structured changelog store (changelog.yml)
//!
//! A version-keyed map ordered descending by version comparison, not by
//! insertion. The store re-sorts after every mutation so the newest release
//! always renders first.

use crate::core::error::{CadenceError, CadenceResult};
use crate::version;
use crate::wrappers::{Wrapper, WrapperKind};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the changelog store inside the doc directory.
pub const CHANGELOG_YML_FILE: &str = "changelog.yml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryState {
  pub release: String,
  pub api: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangelogEntry {
  /// API version of this release, when tracked separately
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub api: Option<String>,
  pub state: EntryState,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub date: Option<String>,
  #[serde(default)]
  pub notes: String,
}

/// Ordered, version-keyed changelog entries.
#[derive(Debug, Clone, Default)]
pub struct ChangelogStore {
  entries: Vec<(String, ChangelogEntry)>,
}

impl ChangelogStore {
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  #[allow(dead_code)]
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn contains(&self, version: &str) -> bool {
    self.entries.iter().any(|(v, _)| v == version)
  }

  pub fn get(&self, version: &str) -> Option<&ChangelogEntry> {
    self.entries.iter().find(|(v, _)| v == version).map(|(_, e)| e)
  }

  pub fn get_mut(&mut self, version: &str) -> Option<&mut ChangelogEntry> {
    self.entries.iter_mut().find(|(v, _)| v == version).map(|(_, e)| e)
  }

  /// Newest entry after sorting.
  pub fn latest(&self) -> Option<(&str, &ChangelogEntry)> {
    self.entries.first().map(|(v, e)| (v.as_str(), e))
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &ChangelogEntry)> {
    self.entries.iter().map(|(v, e)| (v.as_str(), e))
  }

  /// Insert or replace an entry, then restore descending version order.
  pub fn insert(&mut self, version: &str, entry: ChangelogEntry) {
    if let Some(existing) = self.get_mut(version) {
      *existing = entry;
    } else {
      self.entries.push((version.to_string(), entry));
    }
    self.sort();
  }

  /// Rename a version key in place, then re-sort.
  pub fn rename(&mut self, old: &str, new: &str) -> bool {
    let Some(slot) = self.entries.iter_mut().find(|(v, _)| v == old) else {
      return false;
    };
    slot.0 = new.to_string();
    self.sort();
    true
  }

  /// Descending by version comparison; ties keep their relative order.
  pub fn sort(&mut self) {
    self.entries.sort_by(|(a, _), (b, _)| version::compare(b, a));
  }
}

/// Wrapper around the changelog.yml store file.
#[derive(Debug)]
pub struct ChangelogYmlWrapper {
  path: PathBuf,
  store: ChangelogStore,
}

impl ChangelogYmlWrapper {
  /// Load the store, or start empty when the file does not exist yet.
  pub fn load(doc_dir: &Path) -> CadenceResult<Self> {
    let path = doc_dir.join(CHANGELOG_YML_FILE);
    if !path.exists() {
      return Ok(Self {
        path,
        store: ChangelogStore::default(),
      });
    }
    let content = fs::read_to_string(&path)?;
    let mapping: serde_yaml::Mapping = serde_yaml::from_str(&content)?;

    let mut store = ChangelogStore::default();
    for (key, value) in mapping {
      let version = yaml_key_to_string(&key)
        .ok_or_else(|| CadenceError::message(format!("Unsupported changelog key in {}", path.display())))?;
      let entry: ChangelogEntry = serde_yaml::from_value(value)?;
      store.entries.push((version, entry));
    }
    Ok(Self { path, store })
  }

  pub fn store(&self) -> &ChangelogStore {
    &self.store
  }

  pub fn store_mut(&mut self) -> &mut ChangelogStore {
    &mut self.store
  }
}

impl Wrapper for ChangelogYmlWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::ChangelogYml
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    let mut mapping = serde_yaml::Mapping::new();
    for (version, entry) in &self.store.entries {
      mapping.insert(
        serde_yaml::Value::String(version.clone()),
        serde_yaml::to_value(entry)?,
      );
    }
    Ok(serde_yaml::to_string(&mapping)?)
  }
}

/// Version keys that look numeric (`1.0`) deserialize as YAML numbers.
fn yaml_key_to_string(key: &serde_yaml::Value) -> Option<String> {
  match key {
    serde_yaml::Value::String(s) => Some(s.clone()),
    serde_yaml::Value::Number(n) => Some(n.to_string()),
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn entry(state: &str, notes: &str) -> ChangelogEntry {
    ChangelogEntry {
      api: None,
      state: EntryState {
        release: state.to_string(),
        api: state.to_string(),
      },
      date: Some("2026-08-06".to_string()),
      notes: notes.to_string(),
    }
  }

  #[test]
  fn test_iteration_is_descending_by_version() {
    let mut store = ChangelogStore::default();
    store.insert("1.0.0", entry("stable", "first"));
    store.insert("2.0.0", entry("stable", "second"));
    store.insert("1.5.0", entry("stable", "between"));

    let versions: Vec<&str> = store.iter().map(|(v, _)| v).collect();
    assert_eq!(versions, vec!["2.0.0", "1.5.0", "1.0.0"]);
  }

  #[test]
  fn test_prereleases_sort_below_their_release() {
    let mut store = ChangelogStore::default();
    store.insert("2.0.0", entry("stable", ""));
    store.insert("2.0.0rc1", entry("beta", ""));
    store.insert("2.0.0alpha1", entry("alpha", ""));

    let versions: Vec<&str> = store.iter().map(|(v, _)| v).collect();
    assert_eq!(versions, vec!["2.0.0", "2.0.0rc1", "2.0.0alpha1"]);
  }

  #[test]
  fn test_rename_resorts() {
    let mut store = ChangelogStore::default();
    store.insert("1.0.0", entry("stable", "old"));
    store.insert("1.1.0", entry("stable", "current"));

    assert!(store.rename("1.0.0", "2.0.0"));
    assert_eq!(store.latest().unwrap().0, "2.0.0");
    assert!(!store.rename("9.9.9", "1.2.3"));
  }

  #[test]
  fn test_round_trip_through_file() {
    let tmp = TempDir::new().unwrap();
    let mut wrapper = ChangelogYmlWrapper::load(tmp.path()).unwrap();
    wrapper.store_mut().insert("1.0.0", entry("stable", "\nInitial release."));
    wrapper.store_mut().insert("1.1.0", entry("beta", "\nSecond."));
    wrapper.save().unwrap();

    let reloaded = ChangelogYmlWrapper::load(tmp.path()).unwrap();
    let versions: Vec<&str> = reloaded.store().iter().map(|(v, _)| v).collect();
    assert_eq!(versions, vec!["1.1.0", "1.0.0"]);
    assert_eq!(reloaded.store().get("1.1.0").unwrap().state.release, "beta");
    assert_eq!(reloaded.store().get("1.0.0").unwrap().notes, "\nInitial release.");
  }

  #[test]
  fn test_numeric_looking_keys_survive() {
    let tmp = TempDir::new().unwrap();
    fs::write(
      tmp.path().join(CHANGELOG_YML_FILE),
      "1.0:\n  state:\n    release: stable\n    api: stable\n  notes: legacy\n",
    )
    .unwrap();
    let wrapper = ChangelogYmlWrapper::load(tmp.path()).unwrap();
    assert_eq!(wrapper.store().len(), 1);
    let (version, entry) = wrapper.store().iter().next().unwrap();
    assert_eq!(version, "1.0");
    assert_eq!(entry.notes, "legacy");
  }
}
