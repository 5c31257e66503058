//! The generated JSON package manifest (composer.json)
//!
//! Derived wholesale from the descriptor on every synchronization pass;
//! nothing in this file is hand-authored.

use crate::core::error::CadenceResult;
use crate::wrappers::{Wrapper, WrapperKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File name of the generated JSON manifest.
pub const COMPOSER_JSON_FILE: &str = "composer.json";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerManifest {
  pub name: String,
  pub description: String,
  #[serde(rename = "type")]
  pub package_type: String,
  pub homepage: String,
  pub license: String,
  pub authors: Vec<ComposerAuthor>,
  pub version: String,
  /// Generation date, stamped on every pass
  pub time: String,
  pub repositories: Vec<ComposerRepository>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub require: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub suggest: BTreeMap<String, String>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub replace: BTreeMap<String, String>,
  pub autoload: ComposerAutoload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerAuthor {
  pub name: String,
  pub email: String,
  pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposerRepository {
  #[serde(rename = "type")]
  pub repository_type: String,
  pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposerAutoload {
  #[serde(rename = "psr-0", default, skip_serializing_if = "BTreeMap::is_empty")]
  pub psr0: BTreeMap<String, String>,
}

/// Wrapper around composer.json.
#[derive(Debug)]
pub struct ComposerJsonWrapper {
  path: PathBuf,
  manifest: ComposerManifest,
}

impl ComposerJsonWrapper {
  pub fn new(component_dir: &Path) -> Self {
    Self {
      path: component_dir.join(COMPOSER_JSON_FILE),
      manifest: ComposerManifest::default(),
    }
  }

  /// Replace the in-memory manifest with a freshly derived one.
  pub fn set(&mut self, manifest: ComposerManifest) {
    self.manifest = manifest;
  }

  #[allow(dead_code)]
  pub fn manifest(&self) -> &ComposerManifest {
    &self.manifest
  }
}

impl Wrapper for ComposerJsonWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::ComposerJson
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    let mut rendered = serde_json::to_string_pretty(&self.manifest)?;
    rendered.push('\n');
    Ok(rendered)
  }
}
