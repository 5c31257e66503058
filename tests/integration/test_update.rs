//! Tests for the `update` command

use crate::helpers::*;
use anyhow::Result;

#[test]
fn test_update_generates_manifests() -> Result<()> {
  let component = TestComponent::new()?;

  run_cadence(&component.path, &["update"])?;

  assert!(component.file_exists("package.xml"));
  assert!(component.file_exists("composer.json"));

  let package_xml = component.read_file("package.xml")?;
  assert!(package_xml.contains("<name>Acme_Http</name>"));
  assert!(package_xml.contains("<channel>pear.acme.io</channel>"));
  assert!(package_xml.contains("<summary>HTTP client library</summary>"));
  assert!(package_xml.contains("<release>1.0.0</release>"));
  assert!(package_xml.contains("<name>Acme_Exception</name>"));
  assert!(package_xml.contains("<extension>"));
  assert!(package_xml.contains("<min>7.4.0</min>"));
  assert!(package_xml.contains("name=\"lib/Http.php\" role=\"php\""));

  let composer = component.read_file("composer.json")?;
  assert!(composer.contains("\"name\": \"acme/http\""));
  assert!(composer.contains("\"pear-pear.acme.io/Acme_Exception\": \"^2\""));
  assert!(composer.contains("\"ext-hash\": \"*\""));
  Ok(())
}

#[test]
fn test_second_pass_produces_empty_diff() -> Result<()> {
  let component = TestComponent::new()?;

  run_cadence(&component.path, &["update"])?;
  let output = run_cadence(&component.path, &["update", "--diff"])?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(
    stdout.trim().is_empty(),
    "expected empty diff after a fresh update, got:\n{}",
    stdout
  );
  Ok(())
}

#[test]
fn test_print_mode_writes_nothing() -> Result<()> {
  let component = TestComponent::new()?;

  let output = run_cadence(&component.path, &["update", "--print"])?;

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("<name>Acme_Http</name>"));
  assert!(stdout.contains("\"name\": \"acme/http\""));
  assert!(!component.file_exists("package.xml"));
  assert!(!component.file_exists("composer.json"));
  Ok(())
}

#[test]
fn test_pretend_mode_mirrors_real_messages() -> Result<()> {
  let component = TestComponent::new()?;

  let pretend = run_cadence(&component.path, &["--pretend", "update"])?;
  assert!(!component.file_exists("package.xml"));

  let real = run_cadence(&component.path, &["update"])?;
  assert!(component.file_exists("package.xml"));

  let pretend_targets: Vec<String> = stdout_lines(&pretend)
    .into_iter()
    .filter_map(|line| {
      line
        .strip_prefix("Would update ")
        .and_then(|rest| rest.strip_suffix(" now."))
        .map(String::from)
    })
    .collect();
  let real_targets: Vec<String> = stdout_lines(&real)
    .into_iter()
    .filter_map(|line| {
      line
        .strip_prefix("Updated ")
        .and_then(|rest| rest.strip_suffix('.'))
        .map(String::from)
    })
    .collect();

  assert!(!pretend_targets.is_empty());
  assert_eq!(pretend_targets, real_targets);
  Ok(())
}

#[test]
fn test_unknown_dependency_type_aborts_before_writing() -> Result<()> {
  let component = TestComponent::new()?;
  component.write_file(
    "component.yml",
    r#"---
id: Http
name: Http
type: library
full: HTTP client library
description: A lean HTTP client.
version:
  release: 1.0.0
  api: 1.0.0
state:
  release: stable
  api: stable
license:
  identifier: BSD-2-Clause
authors:
  - name: Jane Maintainer
    email: jane@example.org
    role: lead
dependencies:
  required:
    bogus:
      something: '*'
"#,
  )?;

  let output = run_cadence_raw(&component.path, &["update"])?;
  assert!(!output.status.success());
  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("Unknown dependency type: bogus"));
  assert!(!component.file_exists("package.xml"));
  Ok(())
}
