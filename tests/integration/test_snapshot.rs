//! Tests for the `snapshot` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_snapshot_builds_dev_stamped_archive() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  run_cadence(&component.path, &["snapshot", "--archivedir", "build"])?;

  let archives: Vec<String> = std::fs::read_dir(component.path.join("build"))?
    .filter_map(|e| e.ok())
    .map(|e| e.file_name().to_string_lossy().into_owned())
    .collect();
  assert_eq!(archives.len(), 1);
  assert!(archives[0].starts_with("Acme_Http-1.0.0dev"));
  assert!(archives[0].ends_with(".tgz"));
  Ok(())
}

#[test]
fn test_snapshot_keep_version() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  run_cadence(&component.path, &["snapshot", "--archivedir", "build", "--keep-version"])?;

  assert!(component.file_exists("build/Acme_Http-1.0.0.tgz"));
  Ok(())
}

#[test]
fn test_snapshot_without_manifest_fails_fast() -> Result<()> {
  let component = TestComponent::new()?;

  let output = run_cadence_raw(&component.path, &["snapshot", "--archivedir", "build"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("still lacks a package.xml"));
  Ok(())
}

#[test]
fn test_snapshot_invalid_manifest_reports_warnings() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  // Break the manifest: no summary, no lead.
  let package_xml = component.read_file("package.xml")?;
  let broken = package_xml
    .replace("<summary>HTTP client library</summary>\n", "")
    .replace(
      " <lead>\n  <name>Jane Maintainer</name>\n  <user>jane</user>\n  <email>jane@example.org</email>\n  <active>yes</active>\n </lead>\n",
      "",
    );
  component.write_file("package.xml", &broken)?;

  let output = run_cadence_raw(&component.path, &["snapshot", "--archivedir", "build"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Missing summary"));
  assert!(stderr.contains("lead"));
  assert!(!component.file_exists("build/Acme_Http-1.0.0.tgz"));
  Ok(())
}

#[test]
fn test_snapshot_pretend_only_reports() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  let output = run_cadence(&component.path, &["--pretend", "snapshot", "--archivedir", "build"])?;
  let lines = stdout_lines(&output);
  assert!(lines.iter().any(|l| l.starts_with("Would generate a snapshot of ")));
  assert!(!component.file_exists("build"));
  Ok(())
}
