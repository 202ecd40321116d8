//! Shared types and error definitions used across all faceswap crates.

pub mod error;
pub mod types;

pub use error::{Error, Result};
