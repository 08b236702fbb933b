// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # branchwave-observability
//!
//! Logging setup shared by the branchwave binaries and tests.
//!
//! Library crates only emit `tracing` events; this crate installs the
//! subscriber that decides what is printed and where, with per-crate debug
//! flag support.
//!
//! ## Features
//! - `file-logging`: JSON log files in a timestamped run folder, with
//!   retention of the most recent runs

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known branchwave crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "branchwave",
    "branchwave-geometry",
    "branchwave-analysis",
    "branchwave-config",
    "branchwave-experiment",
    "branchwave-observability",
];

/// Tracing target of a crate name (`branchwave-geometry` -> `branchwave_geometry`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
