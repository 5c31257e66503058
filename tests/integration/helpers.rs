//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A component directory with descriptor, sources and docs
pub struct TestComponent {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestComponent {
  /// Create a component fixture with the conventional layout
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().canonicalize()?;

    std::fs::create_dir_all(path.join("lib"))?;
    std::fs::create_dir_all(path.join("doc"))?;

    std::fs::write(
      path.join("cadence.toml"),
      r#"[naming]
channel = "pear.acme.io"
vendor = "acme"
package_prefix = "Acme_"
"#,
    )?;

    std::fs::write(
      path.join("component.yml"),
      r#"---
id: Http
name: Http
type: library
full: HTTP client library
description: A lean HTTP client with pluggable transports.
version:
  release: 1.0.0
  api: 1.0.0
state:
  release: stable
  api: stable
license:
  identifier: BSD-2-Clause
  uri: http://www.opensource.org/licenses/bsd-license.php
authors:
  - name: Jane Maintainer
    user: jane
    email: jane@example.org
    active: true
    role: lead
dependencies:
  required:
    php: ^7.4
    pear:
      pear.acme.io/Acme_Exception: ^2
    ext:
      hash: '*'
"#,
    )?;

    std::fs::write(path.join("lib/Http.php"), "<?php\nclass Http {}\n")?;
    std::fs::write(
      path.join("lib/Application.php"),
      "class Application {\npublic $version = '0.0.0';\n}\n",
    )?;
    std::fs::write(
      path.join("doc/CHANGES"),
      "------\nv1.0.0\n------\n\nFirst release.\n",
    )?;

    Ok(Self { _root: root, path })
  }

  pub fn file_exists(&self, relative: &str) -> bool {
    self.path.join(relative).exists()
  }

  pub fn read_file(&self, relative: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(relative))?)
  }

  pub fn write_file(&self, relative: &str, content: &str) -> Result<()> {
    let full = self.path.join(relative);
    if let Some(parent) = full.parent() {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, content)?;
    Ok(())
  }
}

/// Run the cadence CLI and require success
pub fn run_cadence(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = run_cadence_raw(cwd, args)?;
  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "cadence command failed: cadence {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }
  Ok(output)
}

/// Run the cadence CLI without asserting the exit status
pub fn run_cadence_raw(cwd: &Path, args: &[&str]) -> Result<Output> {
  let cadence_bin = env!("CARGO_BIN_EXE_cadence");
  Command::new(cadence_bin)
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run cadence")
}

/// Stdout of a finished command as lines
pub fn stdout_lines(output: &Output) -> Vec<String> {
  String::from_utf8_lossy(&output.stdout)
    .lines()
    .map(String::from)
    .collect()
}
