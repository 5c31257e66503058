//! File wrappers for the canonical descriptor and its derived manifests
//!
//! One wrapper per file kind, created lazily on first request within a
//! synchronization session and memoized for the rest of it. The cache is
//! owned by whoever drives the session; nothing else mutates a handle once
//! it has been obtained.

pub mod changelog_yml;
pub mod changes;
pub mod composer_json;
pub mod descriptor;
pub mod package_xml;
pub mod sentinel;

pub use changelog_yml::{ChangelogEntry, ChangelogStore, ChangelogYmlWrapper, EntryState, CHANGELOG_YML_FILE};
pub use changes::{ChangesWrapper, CHANGES_FILE};
pub use composer_json::{ComposerAuthor, ComposerJsonWrapper, ComposerManifest, ComposerRepository, COMPOSER_JSON_FILE};
pub use descriptor::{ComponentDescriptor, ComponentType, DescriptorWrapper, DESCRIPTOR_FILE};
pub use package_xml::{PackageXmlWrapper, PACKAGE_XML_FILE};
pub use sentinel::SentinelWrapper;

use crate::core::error::{CadenceError, CadenceResult};
use similar::TextDiff;
use std::fs;
use std::path::{Path, PathBuf};

/// The fixed set of file kinds a session can hand out wrappers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
  /// component.yml, the canonical descriptor
  Descriptor,
  /// package.xml, the generated XML manifest
  PackageXml,
  /// composer.json, the generated JSON manifest
  ComposerJson,
  /// changelog.yml, the structured changelog store
  ChangelogYml,
  /// CHANGES, the rendered plain-text changelog
  Changes,
  /// the source file carrying the version sentinel
  Sentinel,
}

/// Common contract of all file wrappers.
pub trait Wrapper {
  fn kind(&self) -> WrapperKind;

  /// Absolute path of the backing file.
  fn path(&self) -> &Path;

  fn exists_on_disk(&self) -> bool {
    self.path().exists()
  }

  /// The textual form that `save` would write.
  fn render(&self) -> CadenceResult<String>;

  /// Line diff of the in-memory state against the on-disk content.
  ///
  /// `None` when both are identical; a missing file diffs against empty.
  fn diff(&self) -> CadenceResult<Option<String>> {
    let new = self.render()?;
    let old = if self.exists_on_disk() {
      fs::read_to_string(self.path())?
    } else {
      String::new()
    };
    if old == new {
      return Ok(None);
    }
    let diff = TextDiff::from_lines(old.as_str(), new.as_str()).unified_diff().to_string();
    Ok(Some(diff))
  }

  /// Persist the in-memory state, creating parent directories as needed.
  fn save(&self) -> CadenceResult<()> {
    let rendered = self.render()?;
    if let Some(parent) = self.path().parent() {
      fs::create_dir_all(parent).map_err(|source| CadenceError::PersistenceFailed {
        file: self.path().to_path_buf(),
        source,
      })?;
    }
    fs::write(self.path(), rendered).map_err(|source| CadenceError::PersistenceFailed {
      file: self.path().to_path_buf(),
      source,
    })
  }

  /// Path relative to the component directory, for messages.
  fn local_path(&self, base: &Path) -> PathBuf {
    self
      .path()
      .strip_prefix(base)
      .map(Path::to_path_buf)
      .unwrap_or_else(|_| self.path().to_path_buf())
  }
}

/// Lazily constructed, session-scoped cache of file wrappers.
///
/// Handles are created through an explicit factory match on [`WrapperKind`]
/// and remembered in first-request order so `save_all` persists files
/// deterministically.
pub struct WrapperCache {
  component_dir: PathBuf,
  doc_dir: PathBuf,
  descriptor: Option<DescriptorWrapper>,
  package_xml: Option<PackageXmlWrapper>,
  composer_json: Option<ComposerJsonWrapper>,
  changelog_yml: Option<ChangelogYmlWrapper>,
  changes: Option<ChangesWrapper>,
  sentinel: Option<SentinelWrapper>,
  order: Vec<WrapperKind>,
}

impl WrapperCache {
  pub fn new(component_dir: &Path) -> Self {
    Self {
      component_dir: component_dir.to_path_buf(),
      doc_dir: resolve_doc_dir(component_dir),
      descriptor: None,
      package_xml: None,
      composer_json: None,
      changelog_yml: None,
      changes: None,
      sentinel: None,
      order: Vec::new(),
    }
  }

  #[allow(dead_code)]
  pub fn component_dir(&self) -> &Path {
    &self.component_dir
  }

  pub fn doc_dir(&self) -> &Path {
    &self.doc_dir
  }

  /// The canonical descriptor. The descriptor is always required;
  /// requesting it without a backing file is an error.
  pub fn descriptor(&mut self) -> CadenceResult<&mut DescriptorWrapper> {
    if self.descriptor.is_none() {
      let wrapper = DescriptorWrapper::load(&self.component_dir)?;
      self.descriptor = Some(wrapper);
      self.order.push(WrapperKind::Descriptor);
    }
    Ok(self.descriptor.as_mut().expect("just materialized"))
  }

  pub fn package_xml(&mut self) -> CadenceResult<&mut PackageXmlWrapper> {
    if self.package_xml.is_none() {
      let wrapper = PackageXmlWrapper::load(&self.component_dir)?;
      self.package_xml = Some(wrapper);
      self.order.push(WrapperKind::PackageXml);
    }
    Ok(self.package_xml.as_mut().expect("just materialized"))
  }

  pub fn composer_json(&mut self) -> CadenceResult<&mut ComposerJsonWrapper> {
    if self.composer_json.is_none() {
      let wrapper = ComposerJsonWrapper::new(&self.component_dir);
      self.composer_json = Some(wrapper);
      self.order.push(WrapperKind::ComposerJson);
    }
    Ok(self.composer_json.as_mut().expect("just materialized"))
  }

  pub fn changelog_yml(&mut self) -> CadenceResult<&mut ChangelogYmlWrapper> {
    if self.changelog_yml.is_none() {
      let wrapper = ChangelogYmlWrapper::load(&self.doc_dir)?;
      self.changelog_yml = Some(wrapper);
      self.order.push(WrapperKind::ChangelogYml);
    }
    Ok(self.changelog_yml.as_mut().expect("just materialized"))
  }

  pub fn changes(&mut self) -> CadenceResult<&mut ChangesWrapper> {
    if self.changes.is_none() {
      let wrapper = ChangesWrapper::load(&self.doc_dir)?;
      self.changes = Some(wrapper);
      self.order.push(WrapperKind::Changes);
    }
    Ok(self.changes.as_mut().expect("just materialized"))
  }

  pub fn sentinel(&mut self) -> CadenceResult<&mut SentinelWrapper> {
    if self.sentinel.is_none() {
      let wrapper = SentinelWrapper::load(&self.component_dir)?;
      self.sentinel = Some(wrapper);
      self.order.push(WrapperKind::Sentinel);
    }
    Ok(self.sentinel.as_mut().expect("just materialized"))
  }

  /// Kind-generic access for callers that only need the common contract.
  #[allow(dead_code)] // contract surface, exercised through the typed accessors
  pub fn get(&mut self, kind: WrapperKind) -> CadenceResult<&dyn Wrapper> {
    match kind {
      WrapperKind::Descriptor => Ok(self.descriptor()?),
      WrapperKind::PackageXml => Ok(self.package_xml()?),
      WrapperKind::ComposerJson => Ok(self.composer_json()?),
      WrapperKind::ChangelogYml => Ok(self.changelog_yml()?),
      WrapperKind::Changes => Ok(self.changes()?),
      WrapperKind::Sentinel => Ok(self.sentinel()?),
    }
  }

  /// All materialized wrappers in first-request order.
  pub fn materialized(&self) -> Vec<&dyn Wrapper> {
    self
      .order
      .iter()
      .filter_map(|kind| self.lookup(*kind))
      .collect()
  }

  fn lookup(&self, kind: WrapperKind) -> Option<&dyn Wrapper> {
    match kind {
      WrapperKind::Descriptor => self.descriptor.as_ref().map(|w| w as &dyn Wrapper),
      WrapperKind::PackageXml => self.package_xml.as_ref().map(|w| w as &dyn Wrapper),
      WrapperKind::ComposerJson => self.composer_json.as_ref().map(|w| w as &dyn Wrapper),
      WrapperKind::ChangelogYml => self.changelog_yml.as_ref().map(|w| w as &dyn Wrapper),
      WrapperKind::Changes => self.changes.as_ref().map(|w| w as &dyn Wrapper),
      WrapperKind::Sentinel => self.sentinel.as_ref().map(|w| w as &dyn Wrapper),
    }
  }

  /// Persist every materialized wrapper, in the order first requested.
  ///
  /// A failure on one file does not roll back files already written; the
  /// error names the file that failed.
  pub fn save_all(&self) -> CadenceResult<Vec<PathBuf>> {
    let mut written = Vec::new();
    for wrapper in self.materialized() {
      wrapper.save()?;
      written.push(wrapper.path().to_path_buf());
    }
    Ok(written)
  }
}

/// Documentation directory of a component: `doc/`, falling back to `docs/`,
/// defaulting to `doc/` when neither exists yet.
fn resolve_doc_dir(component_dir: &Path) -> PathBuf {
  let doc = component_dir.join("doc");
  if doc.is_dir() {
    return doc;
  }
  let docs = component_dir.join("docs");
  if docs.is_dir() {
    return docs;
  }
  doc
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::fs;
  use tempfile::TempDir;

  fn write_minimal_descriptor(dir: &Path) {
    fs::write(
      dir.join(DESCRIPTOR_FILE),
      r#"---
id: Skeleton
name: Skeleton
type: library
full: Example skeleton component
description: A component used to exercise the wrapper cache.
version:
  release: 1.0.0
  api: 1.0.0
state:
  release: stable
  api: stable
license:
  identifier: BSD-2-Clause
authors:
  - name: Jane Maintainer
    user: jane
    email: jane@example.org
    active: true
    role: lead
dependencies:
  required:
    php: ^7.4
"#,
    )
    .unwrap();
  }

  #[test]
  fn test_descriptor_is_required() {
    let tmp = TempDir::new().unwrap();
    let mut cache = WrapperCache::new(tmp.path());
    let err = cache.descriptor().unwrap_err();
    assert!(matches!(err, CadenceError::MissingDescriptor { .. }));
  }

  #[test]
  fn test_other_kinds_are_created_on_demand() {
    let tmp = TempDir::new().unwrap();
    let mut cache = WrapperCache::new(tmp.path());
    assert!(cache.package_xml().is_ok());
    assert!(cache.changelog_yml().is_ok());
    assert!(cache.changes().is_ok());
  }

  #[test]
  fn test_handles_are_memoized_in_request_order() {
    let tmp = TempDir::new().unwrap();
    write_minimal_descriptor(tmp.path());

    let mut cache = WrapperCache::new(tmp.path());
    cache.descriptor().unwrap();
    cache.changes().unwrap();
    cache.descriptor().unwrap(); // second request must not re-register

    let kinds: Vec<WrapperKind> = cache.materialized().iter().map(|w| w.kind()).collect();
    assert_eq!(kinds, vec![WrapperKind::Descriptor, WrapperKind::Changes]);
  }

  #[test]
  fn test_doc_dir_resolution_prefers_existing() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join("docs")).unwrap();
    let cache = WrapperCache::new(tmp.path());
    assert!(cache.doc_dir().ends_with("docs"));

    let tmp = TempDir::new().unwrap();
    let cache = WrapperCache::new(tmp.path());
    assert!(cache.doc_dir().ends_with("doc"));
  }
}
