//! Version control abstraction
//!
//! Operations never talk to git directly; they hand changed files to a
//! [`CommitHelper`] which stages, commits and tags — or, in pretend mode,
//! only reports what it would run.

mod system_git;

pub use system_git::{CommitHelper, SystemGit};
