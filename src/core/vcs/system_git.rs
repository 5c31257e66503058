//! System git backend - zero dependencies, subprocess based
//!
//! Uses git porcelain commands with an isolated environment. Only the
//! operations the release flows need exist here: stage, commit, tag.

use crate::core::error::{CadenceResult, GitError};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Git backend using system git (zero crate dependencies)
#[derive(Debug)]
pub struct SystemGit {
  /// Repository working directory
  repo_path: PathBuf,
}

impl SystemGit {
  /// Open a git repository
  pub fn open(path: &Path) -> CadenceResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .map_err(|e| GitError::CommandFailed {
        command: "git rev-parse --show-toplevel".to_string(),
        stderr: e.to_string(),
      })
      .map_err(crate::core::error::CadenceError::Git)?;

    if !output.status.success() {
      return Err(
        crate::core::error::CadenceError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }),
      );
    }

    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  pub fn add(&self, file: &Path) -> CadenceResult<()> {
    self.run(&["add", &file.to_string_lossy()])
  }

  pub fn commit(&self, message: &str) -> CadenceResult<()> {
    self.run(&["commit", "-m", message])
  }

  #[allow(dead_code)] // used through CommitHelper::tag
  pub fn tag(&self, name: &str, message: &str) -> CadenceResult<()> {
    self.run(&["tag", "-f", "-m", message, name])
  }

  fn run(&self, args: &[&str]) -> CadenceResult<()> {
    let output = self
      .git_cmd()
      .args(args)
      .output()
      .map_err(|e| GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr: e.to_string(),
      })
      .map_err(crate::core::error::CadenceError::Git)?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(
        crate::core::error::CadenceError::Git(GitError::CommandFailed {
          command: format!("git {}", args.join(" ")),
          stderr: stderr.to_string(),
        }),
      );
    }
    Ok(())
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables, whitelists PATH and HOME
  fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.repo_path);

    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd
  }
}

/// Staging/commit collaborator handed to release operations.
///
/// In pretend mode nothing runs; the helper records the commands it would
/// have run so pretend output mirrors a real run line for line.
#[derive(Debug)]
pub struct CommitHelper {
  repo_dir: PathBuf,
  pretend: bool,
  messages: Vec<String>,
}

impl CommitHelper {
  pub fn new(repo_dir: &Path, pretend: bool) -> Self {
    Self {
      repo_dir: repo_dir.to_path_buf(),
      pretend,
      messages: Vec::new(),
    }
  }

  /// Stage one file; `base_dir` only shapes the reported path.
  pub fn add(&mut self, file: &Path, base_dir: &Path) -> CadenceResult<()> {
    let display = if file.is_absolute() {
      file.to_path_buf()
    } else {
      base_dir.join(file)
    };
    if self.pretend {
      self.messages.push(format!("Would run \"git add {}\" now.", display.display()));
      return Ok(());
    }
    SystemGit::open(&self.repo_dir)?.add(&display)?;
    self.messages.push(format!("Ran \"git add {}\".", display.display()));
    Ok(())
  }

  pub fn commit(&mut self, message: &str) -> CadenceResult<()> {
    if self.pretend {
      self
        .messages
        .push(format!("Would run \"git commit -m \"{}\"\" now.", message));
      return Ok(());
    }
    SystemGit::open(&self.repo_dir)?.commit(message)?;
    self.messages.push(format!("Ran \"git commit -m \"{}\"\".", message));
    Ok(())
  }

  #[allow(dead_code)] // release tagging is driven by external tooling for now
  pub fn tag(&mut self, name: &str, message: &str, dir: &Path) -> CadenceResult<()> {
    if self.pretend {
      self
        .messages
        .push(format!("Would run \"git tag -f -m \"{}\" {}\" in {} now.", message, name, dir.display()));
      return Ok(());
    }
    SystemGit::open(dir)?.tag(name, message)?;
    self
      .messages
      .push(format!("Ran \"git tag -f -m \"{}\" {}\" in {}.", message, name, dir.display()));
    Ok(())
  }

  pub fn messages(&self) -> &[String] {
    &self.messages
  }
}
