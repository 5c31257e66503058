//! The plain-text changelog (CHANGES)
//!
//! Rendered from the structured store, newest release first, with the
//! dashed header convention. Sentinel-style operations rewrite or prepend
//! only the topmost header and leave the history untouched.

use crate::core::error::{CadenceError, CadenceResult};
use crate::wrappers::{Wrapper, WrapperKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// File name of the plain changelog inside the doc directory.
pub const CHANGES_FILE: &str = "CHANGES";

#[derive(Debug)]
pub struct ChangesWrapper {
  path: PathBuf,
  content: String,
}

impl ChangesWrapper {
  pub fn load(doc_dir: &Path) -> CadenceResult<Self> {
    let path = doc_dir.join(CHANGES_FILE);
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

  /// Replace the whole file with a fresh rendering.
  pub fn set_content(&mut self, content: String) {
    self.content = content;
  }

  /// Prepend a new version header, pushing the old content down.
  pub fn extend(&mut self, literal: &str) {
    self.content = format!("{}\n\n\n\n{}", header_block(literal), self.content);
  }

  /// Rewrite the topmost version header in place.
  ///
  /// Fails when the file carries no recognizable header to replace.
  pub fn replace_header(&mut self, literal: &str) -> CadenceResult<()> {
    static PATTERN: OnceLock<regex::Regex> = OnceLock::new();
    let re = PATTERN.get_or_init(|| regex::Regex::new(r"\A-+\n[^\n]+\n-+").expect("static pattern"));
    if !re.is_match(&self.content) {
      return Err(CadenceError::SentinelPatternNotFound {
        file: self.path.clone(),
      });
    }
    self.content = re.replace(&self.content, header_block(literal)).into_owned();
    Ok(())
  }
}

/// The dashed header of one version section.
pub fn header_block(literal: &str) -> String {
  let line = "-".repeat(literal.len() + 1);
  format!("{}\nv{}\n{}", line, literal, line)
}

impl Wrapper for ChangesWrapper {
  fn kind(&self) -> WrapperKind {
    WrapperKind::Changes
  }

  fn path(&self) -> &Path {
    &self.path
  }

  fn render(&self) -> CadenceResult<String> {
    Ok(self.content.clone())
  }
}
