use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    env_subst::substitute_env,
    error::{Error, Result},
    schema::FaceSwapConfig,
    validate::{Severity, validate},
};

/// File name looked up next to the binary when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Load, env-substitute, parse and validate the config at `path`.
///
/// A missing file is an error: the plugin refuses to start without one.
pub fn load_config(path: &Path) -> Result<FaceSwapConfig> {
    let config = read_config(path)?;

    let result = validate(&config);
    for diag in &result.diagnostics {
        match diag.severity {
            Severity::Error => {
                warn!(path = %diag.path, "config error: {}", diag.message)
            },
            Severity::Warning => {
                warn!(path = %diag.path, "config warning: {}", diag.message)
            },
            Severity::Info => debug!(path = %diag.path, "{}", diag.message),
        }
    }
    if let Some(first) = result.first_error() {
        return Err(Error::invalid(format!("{}: {}", first.path, first.message)));
    }

    info!(
        path = %path.display(),
        trigger = %config.trigger_prefix,
        "loaded config"
    );
    Ok(config)
}

/// Read, env-substitute and parse `path` without validating it.
pub fn read_config(path: &Path) -> Result<FaceSwapConfig> {
    if !path.exists() {
        return Err(Error::Missing {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| Error::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&substitute_env(&raw), path)
}

/// Parse config text, choosing the format from the file extension.
pub fn parse_config(raw: &str, path: &Path) -> Result<FaceSwapConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match ext {
        "json" => serde_json::from_str(raw).map_err(|e| Error::parse(path, e)),
        "toml" => toml::from_str(raw).map_err(|e| Error::parse(path, e)),
        "yaml" | "yml" => serde_yaml::from_str(raw).map_err(|e| Error::parse(path, e)),
        other => Err(Error::UnsupportedFormat {
            ext: other.to_string(),
        }),
    }
}
