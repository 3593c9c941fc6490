//! Compiler configuration, loaded from an optional `al.toml`.

use std::path::Path;

use serde::Deserialize;

/// Tunables for a single `compile` run. All fields have defaults, so a
/// project with no `al.toml` compiles with the same behavior as one with an
/// empty file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// Upper bound on parser `synchronize()` iterations before the internal
    /// recovery-limit diagnostic fires. Mirrors the core's own ~1000 cap;
    /// exposed here so pathological fixtures can be capped tighter in tests.
    pub max_sync_iterations: usize,
    /// Promote warning-severity diagnostics (e.g. unreachable match arms) to
    /// errors, failing the build on what would otherwise just be noise.
    pub warnings_as_errors: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_sync_iterations: 1000,
            warnings_as_errors: false,
        }
    }
}

impl CompilerConfig {
    /// Parse a config from the contents of an `al.toml` file.
    pub fn from_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("failed to parse al.toml: {e}"))
    }

    /// Read and parse `al.toml` at `path`.
    pub fn from_file(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))?;
        Self::from_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = CompilerConfig::from_str("").unwrap();
        assert_eq!(cfg.max_sync_iterations, 1000);
        assert!(!cfg.warnings_as_errors);
    }

    #[test]
    fn overrides_apply() {
        let cfg = CompilerConfig::from_str("warnings_as_errors = true\nmax_sync_iterations = 50\n").unwrap();
        assert!(cfg.warnings_as_errors);
        assert_eq!(cfg.max_sync_iterations, 50);
    }

    #[test]
    fn malformed_toml_is_an_error() {
        assert!(CompilerConfig::from_str("not = [valid").is_err());
    }
}
