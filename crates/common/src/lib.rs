//! Photomark Common Utilities
//!
//! Shared infrastructure for all Photomark crates:
//! - Error types and result aliases
//! - SHA-256 hex digests
//! - Run clock for durations and timestamps
//! - Tracing/logging initialization
//! - Configuration loading

pub mod clock;
pub mod config;
pub mod digest;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use digest::{sha256_hex, to_hex};
pub use error::*;
