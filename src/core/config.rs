//! Configuration for cadence
//!
//! Searched in order: cadence.toml, .cadence.toml, .config/cadence.toml,
//! starting at the component directory and walking up. Everything has a
//! default so components without a config file still synchronize; the
//! config mostly carries the channel/vendor naming context.

#![allow(dead_code)]

use crate::core::error::{CadenceResult, ResultExt};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CadenceConfig {
  #[serde(default)]
  pub naming: NamingConfig,
  #[serde(default)]
  pub archive: ArchiveConfig,
}

/// Channel and vendor naming applied to generated manifests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamingConfig {
  /// PEAR channel host written into package.xml
  #[serde(default = "default_channel")]
  pub channel: String,

  /// Composer vendor prefix (`vendor/package`)
  #[serde(default = "default_vendor")]
  pub vendor: String,

  /// Class/package prefix applied to library components
  #[serde(default)]
  pub package_prefix: Option<String>,

  /// Composer repository URL; defaults to https://<channel>
  #[serde(default)]
  pub repository_url: Option<String>,

  /// Homepage used when the descriptor declares none
  #[serde(default)]
  pub default_homepage: Option<String>,

  /// Stability branch suffix for sentinel literals (e.g. "git")
  #[serde(default)]
  pub branch: Option<String>,
}

fn default_channel() -> String {
  "pear.example.org".to_string()
}

fn default_vendor() -> String {
  "example".to_string()
}

impl Default for NamingConfig {
  fn default() -> Self {
    Self {
      channel: default_channel(),
      vendor: default_vendor(),
      package_prefix: None,
      repository_url: None,
      default_homepage: None,
      branch: None,
    }
  }
}

impl NamingConfig {
  /// Prefix for library package names; derived from the vendor unless
  /// configured explicitly.
  pub fn package_prefix(&self) -> String {
    match &self.package_prefix {
      Some(prefix) => prefix.clone(),
      None => {
        let mut chars = self.vendor.chars();
        match chars.next() {
          Some(first) => format!("{}{}_", first.to_uppercase(), chars.as_str()),
          None => "_".to_string(),
        }
      }
    }
  }

  pub fn repository_url(&self) -> String {
    self
      .repository_url
      .clone()
      .unwrap_or_else(|| format!("https://{}", self.channel))
  }

  pub fn default_homepage(&self) -> String {
    self
      .default_homepage
      .clone()
      .unwrap_or_else(|| format!("https://{}", self.channel))
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArchiveConfig {
  /// Default destination for generated source archives
  #[serde(default)]
  pub destination: Option<PathBuf>,
}

impl CadenceConfig {
  /// Find a config file near the component, walking up the directory tree.
  pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
      for candidate in ["cadence.toml", ".cadence.toml"] {
        let path = dir.join(candidate);
        if path.exists() {
          return Some(path);
        }
      }
      let path = dir.join(".config").join("cadence.toml");
      if path.exists() {
        return Some(path);
      }
      current = dir.parent();
    }
    None
  }

  /// Load the nearest config, falling back to defaults when none exists.
  pub fn load(start: &Path) -> CadenceResult<Self> {
    let Some(config_path) = Self::find_config_path(start) else {
      return Ok(Self::default());
    };
    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config: CadenceConfig = toml_edit::de::from_str(&content)
      .with_context(|| format!("Failed to parse config from {}", config_path.display()))?;
    Ok(config)
  }

  /// Save config to cadence.toml (default location)
  pub fn save(&self, dir: &Path) -> CadenceResult<()> {
    let config_path = dir.join("cadence.toml");
    let content = toml_edit::ser::to_string_pretty(self).context("Failed to serialize config to TOML")?;
    fs::write(&config_path, content)
      .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
    Ok(())
  }
}

/// Everything an operation needs to know about its surroundings, built once
/// in main and passed by reference. No process-wide mutable state.
#[derive(Debug, Clone)]
pub struct Context {
  /// Component directory (absolute path)
  pub component_dir: PathBuf,

  /// Loaded (or default) configuration
  pub config: CadenceConfig,

  /// Compute and report, but never write
  pub pretend: bool,
}

impl Context {
  pub fn build(component_dir: &Path, pretend: bool) -> CadenceResult<Self> {
    let component_dir = component_dir
      .canonicalize()
      .with_context(|| format!("Component directory not found: {}", component_dir.display()))?;
    let config = CadenceConfig::load(&component_dir)?;
    Ok(Self {
      component_dir,
      config,
      pretend,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn test_defaults_without_config_file() {
    let tmp = TempDir::new().unwrap();
    let config = CadenceConfig::load(tmp.path()).unwrap();
    assert_eq!(config.naming.channel, "pear.example.org");
    assert_eq!(config.naming.vendor, "example");
    assert_eq!(config.naming.package_prefix(), "Example_");
    assert_eq!(config.naming.repository_url(), "https://pear.example.org");
  }

  #[test]
  fn test_config_found_in_parent_directory() {
    let tmp = TempDir::new().unwrap();
    fs::write(
      tmp.path().join("cadence.toml"),
      "[naming]\nchannel = \"pear.acme.io\"\nvendor = \"acme\"\npackage_prefix = \"Acme_\"\n",
    )
    .unwrap();
    let nested = tmp.path().join("framework").join("Http");
    fs::create_dir_all(&nested).unwrap();

    let config = CadenceConfig::load(&nested).unwrap();
    assert_eq!(config.naming.channel, "pear.acme.io");
    assert_eq!(config.naming.package_prefix(), "Acme_");
  }

  #[test]
  fn test_save_round_trip() {
    let tmp = TempDir::new().unwrap();
    let mut config = CadenceConfig::default();
    config.naming.vendor = "acme".to_string();
    config.save(tmp.path()).unwrap();

    let loaded = CadenceConfig::load(tmp.path()).unwrap();
    assert_eq!(loaded.naming.vendor, "acme");
  }
}
