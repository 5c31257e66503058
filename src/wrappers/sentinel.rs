//! The source-embedded version sentinel
//!
//! Some components carry their version as a literal inside a source file
//! (an `Application.php` or `Bundle.php`). The wrapper locates the single
//! recognizable `version = '…'` assignment and rewrites only the quoted
//! literal, leaving every other byte untouched.

use crate::core::error::{CadenceError, CadenceResult};
use crate::wrappers::{Wrapper, WrapperKind};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Candidate sentinel files, relative to the component directory.
const SENTINEL_CANDIDATES: [&str; 2] = ["lib/Application.php", "lib/Bundle.php"];

#[derive(Debug)]
pub struct SentinelWrapper {
  path: PathBuf,
  content: String,
}

impl SentinelWrapper {
  /// The sentinel file of a component, when it has one.
  pub fn locate(component_dir: &Path) -> Option<PathBuf> {
    SENTINEL_CANDIDATES
      .iter()
      .map(|candidate| component_dir.join(candidate))
      .find(|p| p.exists())
  }

  /// Pick the first existing candidate file; a component without one gets
  /// a handle whose rewrite reports the pattern as not found.
  pub fn load(component_dir: &Path) -> CadenceResult<Self> {
    let path = Self::locate(component_dir).unwrap_or_else(|| component_dir.join(SENTINEL_CANDIDATES[0]));
    let content = if path.exists() {
      fs::read_to_string(&path)?
    } else {
      String::new()
    };
    Ok(Self { path, content })
  }

  pub fn content(&self) -> &str {
    &self.content
  }

  /// Rewrite the version literal in place.
  ///
  /// Only the quoted literal of the first `version = '…'` assignment
  /// changes; rewriting with the same literal again is a no-op.
  pub fn replace(&mut self, literal: &str) -> CadenceResult<()> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let re = PATTERN
      .get_or_init(|| Regex::new(r#"(?i)(\$?version\s*=\s*)(['"])[^'"]*(['"])"#).expect("static pattern"));
    if !re.is_match(&self.content) {
      return Err(CadenceError::SentinelPatternNotFound {
        file: self.path.clone(),
      });
    }
    self.content = re
      .replacen(&self.content, 1, |caps: &Captures<'_>| {
        format!("{}{}{}{}", &caps[1], &caps[2], literal, &caps[3])
      })
      .into_owned();
    Ok(())
  }
}

impl Wrapper for SentinelWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::Sentinel
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    Ok(self.content.clone())
  }
}
