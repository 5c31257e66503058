//! Tests for the `changed` command and changelog migration

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_changed_creates_store_and_records_note() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  let output = run_cadence(&component.path, &["changed", "[jan] Fixed request retries."])?;

  let lines = stdout_lines(&output);
  assert!(lines.iter().any(|l| l.starts_with("Created ")));
  assert!(lines.iter().any(|l| l.contains("Added new note to version 1.0.0")));

  let store = component.read_file("doc/changelog.yml")?;
  assert!(store.contains("1.0.0"));
  assert!(store.contains("[jan] Fixed request retries."));
  assert!(store.contains("release: stable"));

  let package_xml = component.read_file("package.xml")?;
  assert!(package_xml.contains("[jan] Fixed request retries."));
  assert!(package_xml.contains("<changelog>"));

  let changes = component.read_file("doc/CHANGES")?;
  assert!(changes.starts_with("------\nv1.0.0\n------"));
  assert!(changes.contains("[jan] Fixed request retries."));
  Ok(())
}

#[test]
fn test_changed_migrates_legacy_manifest_history() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  // Seed a legacy history inside package.xml only.
  let package_xml = component.read_file("package.xml")?;
  let with_history = package_xml.replace(
    "</package>",
    r#" <changelog>
  <release>
   <version>
    <release>0.9.0</release>
    <api>0.9.0</api>
   </version>
   <stability>
    <release>beta</release>
    <api>beta</api>
   </stability>
   <date>2025-12-01</date>
   <license>BSD-2-Clause</license>
   <notes>
* Beta release.
   </notes>
  </release>
 </changelog>
</package>"#,
  );
  component.write_file("package.xml", &with_history)?;

  run_cadence(&component.path, &["changed", "Stable release."])?;

  let store = component.read_file("doc/changelog.yml")?;
  assert!(store.contains("0.9.0"));
  assert!(store.contains("* Beta release."));
  assert!(store.contains("Stable release."));

  // 1.0.0 must iterate before 0.9.0
  let pos_new = store.find("1.0.0:").unwrap();
  let pos_old = store.find("0.9.0:").unwrap();
  assert!(pos_new < pos_old);
  Ok(())
}

#[test]
fn test_changed_appends_to_existing_entry() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;
  run_cadence(&component.path, &["changed", "First note."])?;
  run_cadence(&component.path, &["changed", "Second note."])?;

  let store = component.read_file("doc/changelog.yml")?;
  assert!(store.contains("First note."));
  assert!(store.contains("Second note."));

  let first = store.find("First note.").unwrap();
  let second = store.find("Second note.").unwrap();
  assert!(first < second);
  Ok(())
}

#[test]
fn test_changed_pretend_mode_writes_nothing() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  let output = run_cadence(&component.path, &["--pretend", "changed", "A note."])?;

  let lines = stdout_lines(&output);
  assert!(lines.iter().any(|l| l.starts_with("Would create ")));
  assert!(lines.iter().any(|l| l.contains("Would add change log entry")));
  assert!(!component.file_exists("doc/changelog.yml"));
  Ok(())
}

#[test]
fn test_changed_no_flags_limit_the_targets() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;
  let package_before = component.read_file("package.xml")?;
  let changes_before = component.read_file("doc/CHANGES")?;

  run_cadence(
    &component.path,
    &["changed", "A quiet note.", "--no-package", "--no-changes"],
  )?;

  assert!(component.read_file("doc/changelog.yml")?.contains("A quiet note."));
  assert_eq!(component.read_file("package.xml")?, package_before);
  assert_eq!(component.read_file("doc/CHANGES")?, changes_before);
  Ok(())
}
