//! Core plumbing for cadence operations
//!
//! - **config**: cadence.toml parsing and the per-run Context
//! - **error**: error types with contextual help messages and exit codes
//! - **vcs**: git staging/commit/tag collaborator (SystemGit, CommitHelper)

pub mod config;
pub mod error;
pub mod vcs;
