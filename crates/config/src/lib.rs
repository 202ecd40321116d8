//! Configuration loading, validation, and env substitution.
//!
//! The plugin reads a single file (`config.json` by default). JSON is the
//! canonical format; `.toml`, `.yaml` and `.yml` are accepted too.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{DEFAULT_CONFIG_FILE, load_config, parse_config, read_config},
    schema::{BeArtConfig, FaceSwapConfig, MediaConfig},
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
