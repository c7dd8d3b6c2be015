//! Common utilities for pairbench
//!
//! Shared code used across the pairbench crates.

pub mod error;

pub use error::{Error, Result};
