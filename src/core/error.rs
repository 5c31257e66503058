//! Error types for cadence with contextual messages and exit codes
//!
//! Expected failures (missing files, malformed constraints, unknown
//! dependency types) are values of this enum so callers can match on them.
//! Panics are reserved for programmer errors.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid input, missing files)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Validation failure (manifest validation, malformed descriptor)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for cadence
#[derive(Debug)]
pub enum CadenceError {
  /// The canonical descriptor (component.yml) does not exist
  MissingDescriptor { path: PathBuf },

  /// A dependency constraint expression could not be parsed
  MalformedConstraint { constraint: String, reason: String },

  /// A dependency type outside the closed set {php, pear, ext}
  UnknownDependencyType { dep_type: String },

  /// The current descriptor version is not a key in the changelog store
  UnknownCurrentVersion { version: String, file: PathBuf },

  /// No recognizable version literal in the sentinel file
  SentinelPatternNotFound { file: PathBuf },

  /// No generated XML manifest at the expected path
  ManifestMissing { path: PathBuf },

  /// Manifest validation produced warnings; the archive was not built
  ManifestValidationFailed { warnings: Vec<String> },

  /// Writing a derived file failed; already-written files are not rolled back
  PersistenceFailed { file: PathBuf, source: io::Error },

  /// Git operation errors
  Git(GitError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl CadenceError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    CadenceError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    CadenceError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      CadenceError::Message { message, context, help } => CadenceError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      CadenceError::MissingDescriptor { .. }
      | CadenceError::ManifestMissing { .. }
      | CadenceError::UnknownCurrentVersion { .. }
      | CadenceError::SentinelPatternNotFound { .. }
      | CadenceError::Message { .. } => ExitCode::User,
      CadenceError::MalformedConstraint { .. }
      | CadenceError::UnknownDependencyType { .. }
      | CadenceError::ManifestValidationFailed { .. } => ExitCode::Validation,
      CadenceError::Git(_) | CadenceError::Io(_) | CadenceError::PersistenceFailed { .. } => ExitCode::System,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      CadenceError::MissingDescriptor { path } => Some(format!(
        "Every component needs a component.yml descriptor. Expected it at: {}",
        path.display()
      )),
      CadenceError::UnknownDependencyType { .. } => {
        Some("Supported dependency types are 'php', 'pear' and 'ext'.".to_string())
      }
      CadenceError::UnknownCurrentVersion { .. } => {
        Some("Run `cadence changed` first so the current version has a changelog entry.".to_string())
      }
      CadenceError::ManifestMissing { .. } => {
        Some("Run `cadence update` to generate the package.xml manifest.".to_string())
      }
      CadenceError::Git(e) => e.help_message(),
      CadenceError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for CadenceError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CadenceError::MissingDescriptor { path } => {
        write!(f, "{} is missing.", path.display())
      }
      CadenceError::MalformedConstraint { constraint, reason } => {
        write!(f, "Malformed version constraint '{}': {}", constraint, reason)
      }
      CadenceError::UnknownDependencyType { dep_type } => {
        write!(f, "Unknown dependency type: {}", dep_type)
      }
      CadenceError::UnknownCurrentVersion { version, file } => {
        write!(f, "Current version {} not found in {}", version, file.display())
      }
      CadenceError::SentinelPatternNotFound { file } => {
        write!(f, "No version sentinel found in {}", file.display())
      }
      CadenceError::ManifestMissing { path } => {
        write!(f, "The component still lacks a package.xml file at \"{}\"!", path.display())
      }
      CadenceError::ManifestValidationFailed { warnings } => {
        write!(f, "Manifest validation failed with:\n\n{}", warnings.join("\n"))
      }
      CadenceError::PersistenceFailed { file, source } => {
        write!(f, "Failed to write {}: {}", file.display(), source)
      }
      CadenceError::Git(e) => write!(f, "{}", e),
      CadenceError::Io(e) => write!(f, "I/O error: {}", e),
      CadenceError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for CadenceError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      CadenceError::Io(e) => Some(e),
      CadenceError::PersistenceFailed { source, .. } => Some(source),
      _ => None,
    }
  }
}

impl From<io::Error> for CadenceError {
  fn from(err: io::Error) -> Self {
    CadenceError::Io(err)
  }
}

impl From<String> for CadenceError {
  fn from(msg: String) -> Self {
    CadenceError::message(msg)
  }
}

impl From<&str> for CadenceError {
  fn from(msg: &str) -> Self {
    CadenceError::message(msg)
  }
}

impl From<serde_yaml::Error> for CadenceError {
  fn from(err: serde_yaml::Error) -> Self {
    CadenceError::message(format!("YAML error: {}", err))
  }
}

impl From<serde_json::Error> for CadenceError {
  fn from(err: serde_json::Error) -> Self {
    CadenceError::message(format!("JSON error: {}", err))
  }
}

impl From<toml_edit::de::Error> for CadenceError {
  fn from(err: toml_edit::de::Error) -> Self {
    CadenceError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<toml_edit::ser::Error> for CadenceError {
  fn from(err: toml_edit::ser::Error) -> Self {
    CadenceError::message(format!("TOML serialization error: {}", err))
  }
}

impl From<regex::Error> for CadenceError {
  fn from(err: regex::Error) -> Self {
    CadenceError::message(format!("Pattern error: {}", err))
  }
}

impl From<std::string::FromUtf8Error> for CadenceError {
  fn from(err: std::string::FromUtf8Error) -> Self {
    CadenceError::message(format!("UTF-8 conversion error: {}", err))
  }
}

impl From<chrono::ParseError> for CadenceError {
  fn from(err: chrono::ParseError) -> Self {
    CadenceError::message(format!("Date parse error: {}", err))
  }
}

/// Convert anyhow::Error to CadenceError (integration test helpers use anyhow)
impl From<anyhow::Error> for CadenceError {
  fn from(err: anyhow::Error) -> Self {
    CadenceError::message(err.to_string())
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "Initialize the repository first or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { .. } => None,
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// Result type alias for cadence
pub type CadenceResult<T> = Result<T, CadenceError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> CadenceResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> CadenceResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<CadenceError>,
{
  fn context(self, ctx: impl Into<String>) -> CadenceResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> CadenceResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &CadenceError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
