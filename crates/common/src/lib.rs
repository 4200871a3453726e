//! VoxReel Common Utilities
//!
//! Shared infrastructure for all VoxReel crates:
//! - Error types, result aliases, and non-fatal notices
//! - Per-run context (scratch directory, cancellation)
//! - Tracing/logging initialization
//! - Configuration loading

pub mod config;
pub mod context;
pub mod error;
pub mod logging;

pub use config::*;
pub use context::*;
pub use error::*;
