// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! # ensemble-observability
//!
//! Logging infrastructure shared by the ensemble crates and the
//! `ensemble-node` binary, with per-crate debug flag support.
//!
//! ## Features
//! - `file-logging`: daily-rolling log files in a per-run folder

/// Crate version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod cli;
pub mod init;

// Re-export commonly used items
pub use cli::*;
pub use init::*;

/// Known ensemble crate names for debug flags
pub const KNOWN_CRATES: &[&str] = &[
    "ensemble-neural",
    "ensemble-plasticity",
    "ensemble-config",
    "ensemble-runtime",
    "ensemble-node",
];

/// Tracing target for a crate name (`ensemble-runtime` -> `ensemble_runtime`)
pub fn crate_target(crate_name: &str) -> String {
    crate_name.replace('-', "_")
}
