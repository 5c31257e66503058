//! Source archive builder
//!
//! Turns a validated package.xml into a distributable .tgz. The builder
//! stamps date/time, rewrites the version to a development-snapshot form
//! unless told to keep it, and collects validation warnings into an
//! ordered list instead of failing with a single opaque message.

use crate::core::error::{CadenceError, CadenceResult};
use crate::version;
use crate::wrappers::package_xml::PackageXmlWrapper;
use crate::wrappers::Wrapper;
use chrono::{DateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct ArchiveOptions {
  /// Keep the manifest version instead of stamping a snapshot version
  pub keep_version: bool,
}

/// Result of one archive build.
#[derive(Debug)]
pub struct ArchiveOutcome {
  /// Path of the generated archive; `None` when validation failed
  pub archive: Option<PathBuf>,
  /// Ordered human-readable validation warnings
  pub errors: Vec<String>,
  /// Raw diagnostic output of the generation step
  pub output: String,
}

/// One validator finding; warnings can arrive without a message.
#[derive(Debug, Clone, Default)]
struct ValidationWarning {
  message: Option<String>,
}

/// Build a source archive from the manifest at `manifest_path`.
///
/// Fails fast when the manifest does not exist. Validation failures are
/// not errors: they come back as `ArchiveOutcome { archive: None, .. }`
/// with every warning preserved in order.
pub fn build(
  manifest_path: &Path,
  destination: &Path,
  options: &ArchiveOptions,
  now: &DateTime<Utc>,
) -> CadenceResult<ArchiveOutcome> {
  if !manifest_path.exists() {
    return Err(CadenceError::ManifestMissing {
      path: manifest_path.to_path_buf(),
    });
  }
  let component_dir = manifest_path
    .parent()
    .map(Path::to_path_buf)
    .unwrap_or_else(|| PathBuf::from("."));

  let mut manifest = PackageXmlWrapper::load(&component_dir)?;

  if !options.keep_version {
    manifest.version_release = version::snapshot_version(&manifest.version_release, now);
  }
  manifest.date = now.format("%Y-%m-%d").to_string();
  manifest.time = Some(now.format("%H:%M:%S").to_string());

  let warnings = validate(&manifest);
  if !warnings.is_empty() {
    let errors: Vec<String> = warnings
      .into_iter()
      .map(|w| w.message.unwrap_or_else(|| "Unknown Error".to_string()))
      .collect();
    return Ok(ArchiveOutcome {
      archive: None,
      errors,
      output: String::new(),
    });
  }

  fs::create_dir_all(destination)?;
  let destination = destination.canonicalize()?;

  // The generation step runs with the destination as working directory;
  // the guard restores the previous directory on every exit path.
  let archive_name = format!("{}-{}.tgz", manifest.name, manifest.version_release);
  let mut output = String::new();
  let archive_path = {
    let _cwd = ScopedChdir::enter(&destination)?;
    write_archive(&manifest, &component_dir, Path::new(&archive_name), &mut output)?;
    destination.join(&archive_name)
  };
  output.push_str(&format!("Generated archive {}\n", archive_path.display()));

  Ok(ArchiveOutcome {
    archive: Some(archive_path),
    errors: Vec::new(),
    output,
  })
}

/// Manifest checks mirroring what the archive format requires.
fn validate(manifest: &PackageXmlWrapper) -> Vec<ValidationWarning> {
  let mut warnings = Vec::new();
  let mut warn = |message: &str| {
    warnings.push(ValidationWarning {
      message: Some(message.to_string()),
    });
  };

  if manifest.name.is_empty() {
    warn("Missing package name");
  }
  if manifest.channel.is_empty() {
    warn("Missing channel");
  }
  if manifest.summary.is_empty() {
    warn("Missing summary");
  }
  if manifest.description.is_empty() {
    warn("Missing description");
  }
  if manifest.version_release.is_empty() || version::validate(&manifest.version_release).is_err() {
    warn("Invalid or missing release version");
  }
  if manifest.version_api.is_empty() {
    warn("Missing api version");
  }
  if manifest.stability_release.is_empty() || manifest.stability_api.is_empty() {
    warn("Missing stability");
  }
  if manifest.license.is_empty() {
    warn("Missing license");
  }
  if !manifest.authors.iter().any(|a| a.role == "lead") {
    warn("Package must have at least one lead");
  }
  if manifest.contents.is_empty() {
    warn("Package contains no files");
  }
  warnings
}

/// Write `package.xml` plus the content tree into a gzip'd tarball.
///
/// Layout follows the installer convention: the manifest at the archive
/// root, the files below a `<name>-<version>/` prefix.
fn write_archive(
  manifest: &PackageXmlWrapper,
  component_dir: &Path,
  archive_name: &Path,
  output: &mut String,
) -> CadenceResult<()> {
  let file = fs::File::create(archive_name)?;
  let encoder = GzEncoder::new(file, Compression::default());
  let mut builder = tar::Builder::new(encoder);

  let rendered = manifest.render()?;
  append_bytes(&mut builder, "package.xml", rendered.as_bytes())?;

  let prefix = format!("{}-{}", manifest.name, manifest.version_release);
  for content in &manifest.contents {
    let source = component_dir.join(&content.path);
    if !source.is_file() {
      output.push_str(&format!("Skipping missing file {}\n", content.path));
      continue;
    }
    let data = fs::read(&source)?;
    append_bytes(&mut builder, &format!("{}/{}", prefix, content.path), &data)?;
  }

  let encoder = builder.into_inner().map_err(CadenceError::Io)?;
  encoder.finish().map_err(CadenceError::Io)?;
  Ok(())
}

fn append_bytes<W: std::io::Write>(builder: &mut tar::Builder<W>, path: &str, data: &[u8]) -> CadenceResult<()> {
  let mut header = tar::Header::new_gnu();
  header.set_size(data.len() as u64);
  header.set_mode(0o644);
  header.set_mtime(0);
  header.set_cksum();
  builder.append_data(&mut header, path, data).map_err(CadenceError::Io)
}

/// RAII working-directory switch; restores the original directory on drop,
/// including error paths.
struct ScopedChdir {
  original: PathBuf,
}

impl ScopedChdir {
  fn enter(dir: &Path) -> CadenceResult<Self> {
    let original = env::current_dir()?;
    env::set_current_dir(dir)?;
    Ok(Self { original })
  }
}

impl Drop for ScopedChdir {
  fn drop(&mut self) {
    let _ = env::set_current_dir(&self.original);
  }
}
