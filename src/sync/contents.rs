//! Installable content discovery
//!
//! Walks the component source tree and produces the file list written into
//! the manifest's contents section. The walker sits behind a small trait so
//! tests can substitute a fixed listing.

use crate::core::error::CadenceResult;
use crate::wrappers::composer_json::COMPOSER_JSON_FILE;
use crate::wrappers::package_xml::{ContentFile, PACKAGE_XML_FILE};
use std::path::Path;
use walkdir::WalkDir;

/// Collaborator producing the installable file list for a directory.
pub trait ContentWalker {
  fn walk(&self, component_dir: &Path) -> CadenceResult<Vec<ContentFile>>;
}

/// Filesystem-backed walker with the conventional role mapping.
#[derive(Debug, Default)]
pub struct WalkdirWalker;

impl ContentWalker for WalkdirWalker {
  fn walk(&self, component_dir: &Path) -> CadenceResult<Vec<ContentFile>> {
    let mut files = Vec::new();
    // Depth 0 is the component directory itself; its name must not be
    // able to filter the whole walk.
    let walker = WalkDir::new(component_dir)
      .follow_links(false)
      .sort_by_file_name()
      .into_iter()
      .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry.file_name().to_string_lossy().as_ref()));

    for entry in walker {
      let entry = entry.map_err(|e| crate::core::error::CadenceError::message(format!("Walk error: {}", e)))?;
      if !entry.file_type().is_file() {
        continue;
      }
      let Ok(relative) = entry.path().strip_prefix(component_dir) else {
        continue;
      };
      let path = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
      if is_excluded(&path) {
        continue;
      }
      files.push(ContentFile {
        role: role_for(&path).to_string(),
        path,
      });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
  }
}

fn is_hidden(name: &str) -> bool {
  name.starts_with('.')
}

/// Generated top-level artifacts never list themselves; including them
/// would make the first and second pass disagree about the content list.
fn is_excluded(path: &str) -> bool {
  path == PACKAGE_XML_FILE
    || path == COMPOSER_JSON_FILE
    || path == "cadence.toml"
    || path.starts_with("vendor/")
    || path.starts_with("node_modules/")
}

/// Role of a file, decided by its top-level directory.
fn role_for(path: &str) -> &'static str {
  let top = path.split('/').next().unwrap_or("");
  match top {
    "lib" => "php",
    "doc" | "docs" => "doc",
    "test" | "tests" => "test",
    "bin" => "script",
    "migration" | "data" => "data",
    _ if path.ends_with(".php") => "php",
    _ => "data",
  }
}
