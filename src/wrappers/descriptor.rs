//! The canonical component descriptor (component.yml)
//!
//! Single source of truth for a package's identity, version, stability,
//! license, authors and dependencies. Everything else under the component
//! directory is a projection of this file.

use crate::core::error::{CadenceError, CadenceResult};
use crate::version;
use crate::wrappers::{Wrapper, WrapperKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the canonical descriptor.
pub const DESCRIPTOR_FILE: &str = "component.yml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
  pub id: String,
  pub name: String,
  #[serde(rename = "type")]
  pub component_type: ComponentType,
  /// One-line summary (historic key name)
  pub full: String,
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub homepage: Option<String>,
  pub version: VersionPair,
  pub state: StatePair,
  pub license: License,
  #[serde(default)]
  pub authors: Vec<Author>,
  #[serde(default)]
  pub dependencies: Dependencies,
}

impl ComponentDescriptor {
  /// Check the descriptor invariants the synchronizer relies on.
  ///
  /// Any violation aborts a pass before a single file is written.
  pub fn validate(&self) -> CadenceResult<()> {
    if self.id.is_empty() {
      return Err(CadenceError::message("Descriptor field 'id' must not be empty"));
    }
    version::validate(&self.version.release)
      .map_err(|_| CadenceError::message(format!("Invalid release version: '{}'", self.version.release)))?;
    version::validate(&self.version.api)
      .map_err(|_| CadenceError::message(format!("Invalid api version: '{}'", self.version.api)))?;
    if self.license.identifier.is_empty() {
      return Err(CadenceError::message("Descriptor field 'license.identifier' must not be empty"));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentType {
  Library,
  Application,
  Theme,
  Other,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionPair {
  pub release: String,
  pub api: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatePair {
  pub release: Stability,
  pub api: Stability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stability {
  Devel,
  Alpha,
  Beta,
  Stable,
}

impl Stability {
  pub fn as_str(self) -> &'static str {
    match self {
      Stability::Devel => "devel",
      Stability::Alpha => "alpha",
      Stability::Beta => "beta",
      Stability::Stable => "stable",
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct License {
  pub identifier: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uri: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Author {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub user: Option<String>,
  pub email: String,
  #[serde(default = "default_active")]
  pub active: bool,
  pub role: String,
}

fn default_active() -> bool {
  true
}

/// Dependency tree: `required`/`optional` → dependency type → entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dependencies {
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub required: DependencyGroup,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub optional: DependencyGroup,
}

/// One group keyed by dependency type (`php`, `pear`, `ext`).
pub type DependencyGroup = BTreeMap<String, DependencySet>;

/// The value under a dependency-type key: `php` carries a bare constraint,
/// `pear`/`ext` carry name → constraint maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencySet {
  Constraint(String),
  Packages(BTreeMap<String, DependencyConstraint>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyConstraint {
  Version(String),
  Detailed {
    version: String,
    #[serde(flatten)]
    extra: BTreeMap<String, serde_yaml::Value>,
  },
}

impl DependencyConstraint {
  pub fn version(&self) -> &str {
    match self {
      DependencyConstraint::Version(v) => v,
      DependencyConstraint::Detailed { version, .. } => version,
    }
  }
}

/// Wrapper around the canonical descriptor file.
#[derive(Debug)]
pub struct DescriptorWrapper {
  path: PathBuf,
  data: ComponentDescriptor,
}

impl DescriptorWrapper {
  /// Load the descriptor; the file is required.
  pub fn load(component_dir: &Path) -> CadenceResult<Self> {
    let path = component_dir.join(DESCRIPTOR_FILE);
    if !path.exists() {
      return Err(CadenceError::MissingDescriptor { path });
    }
    let content = fs::read_to_string(&path)?;
    let data: ComponentDescriptor = serde_yaml::from_str(&content)?;
    Ok(Self { path, data })
  }

  pub fn data(&self) -> &ComponentDescriptor {
    &self.data
  }

  #[allow(dead_code)]
  pub fn data_mut(&mut self) -> &mut ComponentDescriptor {
    &mut self.data
  }

  /// Update the release and/or API version.
  pub fn set_version(&mut self, release: Option<&str>, api: Option<&str>) {
    if let Some(release) = release {
      self.data.version.release = release.to_string();
    }
    if let Some(api) = api {
      self.data.version.api = api.to_string();
    }
  }
}

impl Wrapper for DescriptorWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::Descriptor
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    Ok(serde_yaml::to_string(&self.data)?)
  }
}
