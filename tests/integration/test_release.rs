//! Tests for the release lifecycle commands

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_set_version_updates_all_files() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  let output = run_cadence(
    &component.path,
    &["set-version", "--release", "1.1.0", "--api", "1.1.0"],
  )?;

  let lines = stdout_lines(&output);
  assert!(
    lines
      .iter()
      .any(|l| l.starts_with("Set release version \"1.1.0\" and api version \"1.1.0\" in "))
  );

  assert!(component.read_file("component.yml")?.contains("release: 1.1.0"));
  assert!(component.read_file("package.xml")?.contains("<release>1.1.0</release>"));
  assert!(component.read_file("composer.json")?.contains("\"version\": \"1.1.0\""));
  assert!(
    component
      .read_file("lib/Application.php")?
      .contains("public $version = '1.1';")
  );
  Ok(())
}

#[test]
fn test_set_version_pretend_leaves_files_alone() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;
  let descriptor_before = component.read_file("component.yml")?;

  let output = run_cadence(
    &component.path,
    &["--pretend", "set-version", "--release", "1.1.0", "--api", "1.1.0"],
  )?;

  let lines = stdout_lines(&output);
  assert!(
    lines
      .iter()
      .any(|l| l.starts_with("Would set release version \"1.1.0\" and api version \"1.1.0\" in ") && l.ends_with(" now."))
  );
  assert_eq!(component.read_file("component.yml")?, descriptor_before);
  Ok(())
}

#[test]
fn test_set_state_touches_only_the_manifest() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  run_cadence(&component.path, &["set-state", "--release", "beta", "--api", "beta"])?;

  let package_xml = component.read_file("package.xml")?;
  assert!(package_xml.contains("<release>beta</release>"));
  assert!(package_xml.contains("<api>beta</api>"));
  // The descriptor keeps its own state
  assert!(component.read_file("component.yml")?.contains("release: stable"));
  Ok(())
}

#[test]
fn test_next_version_requires_current_changelog_entry() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;

  let output = run_cadence_raw(
    &component.path,
    &["next-version", "1.1.0", "Next development cycle."],
  )?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Current version 1.0.0 not found"));
  Ok(())
}

#[test]
fn test_next_version_advances_the_component() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;
  run_cadence(&component.path, &["changed", "First stable release."])?;

  let output = run_cadence(
    &component.path,
    &[
      "next-version",
      "1.1.0",
      "Next development cycle.",
      "--release-stability",
      "devel",
    ],
  )?;

  let lines = stdout_lines(&output);
  assert!(lines.iter().any(|l| {
    l.starts_with("Added next version \"1.1.0\" with the initial note \"Next development cycle.\" to ")
      && l.ends_with(" Release stability: \"devel\".")
  }));

  assert!(component.read_file("component.yml")?.contains("release: 1.1.0"));

  let store = component.read_file("doc/changelog.yml")?;
  let pos_new = store.find("1.1.0:").unwrap();
  let pos_old = store.find("1.0.0:").unwrap();
  assert!(pos_new < pos_old);
  assert!(store.contains("Next development cycle."));
  assert!(store.contains("release: devel"));

  let changes = component.read_file("doc/CHANGES")?;
  assert!(changes.starts_with("------\nv1.1.0\n------"));
  assert!(changes.contains("v1.0.0"));

  assert!(
    component
      .read_file("lib/Application.php")?
      .contains("public $version = '1.1';")
  );
  Ok(())
}

#[test]
fn test_sentinel_rewrites_changes_and_application() -> Result<()> {
  let component = TestComponent::new()?;

  run_cadence(&component.path, &["sentinel", "5.0-git"])?;

  let changes = component.read_file("doc/CHANGES")?;
  assert!(changes.starts_with("--------\nv5.0-git\n--------"));
  assert!(changes.contains("First release."));

  assert_eq!(
    component.read_file("lib/Application.php")?,
    "class Application {\npublic $version = '5.0-git';\n}\n"
  );
  Ok(())
}

#[test]
fn test_sentinel_pretend_mirrors_real_messages() -> Result<()> {
  let component = TestComponent::new()?;

  let pretend = run_cadence(&component.path, &["--pretend", "sentinel", "5.0-git"])?;
  let pretend_lines = stdout_lines(&pretend);
  assert_eq!(pretend_lines.len(), 2);
  for line in &pretend_lines {
    assert!(line.starts_with("Would replace sentinel in "));
    assert!(line.ends_with("with \"5.0-git\" now."));
  }
  // Nothing was written
  assert!(component.read_file("doc/CHANGES")?.starts_with("------\nv1.0.0\n------"));

  let real = run_cadence(&component.path, &["sentinel", "5.0-git"])?;
  let real_lines = stdout_lines(&real);
  assert_eq!(real_lines.len(), 2);
  for (pretend_line, real_line) in pretend_lines.iter().zip(&real_lines) {
    assert_eq!(
      pretend_line.strip_prefix("Would").unwrap(),
      real_line.strip_prefix("Did").unwrap()
    );
  }
  Ok(())
}

#[test]
fn test_timestamp_stamps_store_and_manifest() -> Result<()> {
  let component = TestComponent::new()?;
  run_cadence(&component.path, &["update"])?;
  run_cadence(&component.path, &["changed", "First stable release."])?;

  let output = run_cadence(&component.path, &["timestamp"])?;
  let lines = stdout_lines(&output);
  assert!(
    lines
      .iter()
      .any(|l| l.starts_with("Marked ") && l.contains("with current timestamp"))
  );

  let store = component.read_file("doc/changelog.yml")?;
  assert!(store.contains("date:"));

  // The stamped date flows into the manifest
  let package_xml = component.read_file("package.xml")?;
  let date_line = package_xml
    .lines()
    .find(|l| l.trim_start().starts_with("<date>"))
    .unwrap()
    .to_string();
  let stamped = store
    .lines()
    .find(|l| l.trim_start().starts_with("date:"))
    .unwrap()
    .trim_start()
    .trim_start_matches("date:")
    .trim()
    .trim_matches(|c| c == '\'' || c == '"')
    .to_string();
  assert!(date_line.contains(&stamped));
  Ok(())
}
