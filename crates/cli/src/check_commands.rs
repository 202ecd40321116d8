use std::path::Path;

use anyhow::Result;

use faceswap_config::{Severity, read_config, validate};

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Validate the config file and print its diagnostics to stderr.
///
/// Returns the number of errors found.
pub fn check(path: &Path, verbose: bool) -> Result<usize> {
    eprintln!("Checking {}\n", path.display());

    let config = read_config(path)?;
    let result = validate(&config);

    let mut shown = 0;
    for d in &result.diagnostics {
        if d.severity == Severity::Info && !verbose {
            continue;
        }

        let (color, label) = match d.severity {
            Severity::Error => (RED, "error"),
            Severity::Warning => (YELLOW, "warning"),
            Severity::Info => (CYAN, "info"),
        };

        if d.path.is_empty() {
            eprintln!("  {BOLD}{color}{label}{RESET} {}", d.message);
        } else {
            eprintln!("  {BOLD}{color}{label}{RESET} {}: {}", d.path, d.message);
        }
        shown += 1;
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);

    if shown > 0 {
        eprintln!();
    }

    if errors == 0 && warnings == 0 {
        eprintln!("No issues found. Trigger phrase: {}", config.trigger_prefix);
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    Ok(errors)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"trigger_prefix": "", "beart": {"poll_max_attempts": 0}}"#)
            .unwrap();
        assert_eq!(check(&path, true).unwrap(), 2);
    }

    #[test]
    fn clean_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"trigger_prefix": "换脸"}"#).unwrap();
        assert_eq!(check(&path, false).unwrap(), 0);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check(&dir.path().join("config.json"), false).is_err());
    }
}
