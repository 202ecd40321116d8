//! Metric names for the face-swap plugin.
//!
//! Crates emit through the `metrics` facade behind their optional `metrics`
//! feature; without an installed recorder every call is a no-op.
//!
//! ```rust,ignore
//! use faceswap_metrics::{counter, faceswap};
//!
//! counter!(faceswap::JOBS_CREATED_TOTAL).increment(1);
//! ```

mod definitions;

pub use definitions::*;

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};
