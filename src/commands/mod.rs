//! CLI commands for cadence
//!
//! This module contains all user-facing command implementations:
//!
//! ## Synchronization
//! - **update**: Sync derived manifests from the descriptor (update/diff/print)
//!
//! ## Changelog
//! - **changed**: Record a change log entry across all changelog representations
//!
//! ## Release lifecycle
//! - **release**: set-version, set-state, next-version, sentinel and timestamp
//!
//! ## Distribution
//! - **snapshot**: Build a development snapshot archive
//!
//! All commands accept `&Context` built once in main; pretend mode is part
//! of the context and produces the same message shapes as a real run.

pub mod changed;
pub mod release;
pub mod snapshot;
pub mod update;

pub use changed::run_changed;
pub use release::{run_next_version, run_sentinel, run_set_state, run_set_version, run_timestamp};
pub use snapshot::run_snapshot;
pub use update::run_update;
