//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::EngineConfig;
use std::path::Path;

/// Name of the configuration file looked up by [`load_config`].
pub const CONFIG_FILE: &str = "cinder.toml";

/// Loads and validates a `cinder.toml` configuration from a directory.
///
/// Reads `<dir>/cinder.toml`, parses it, and validates its values.
/// Environment overrides are not applied; call
/// [`EngineConfig::apply_env`] afterwards.
pub fn load_config(dir: &Path) -> Result<EngineConfig, ConfigError> {
    let config_path = dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Parses and validates a `cinder.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<EngineConfig, ConfigError> {
    let config: EngineConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that configuration values are usable.
fn validate_config(config: &EngineConfig) -> Result<(), ConfigError> {
    let engine = &config.engine;
    let dialect = &engine.default_dialect;
    if dialect.is_empty() {
        return Err(ConfigError::ValidationError(
            "engine.default_dialect must not be empty".to_string(),
        ));
    }
    if !dialect
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ConfigError::ValidationError(format!(
            "engine.default_dialect '{dialect}' is not a valid dialect name"
        )));
    }
    if engine
        .cachedir
        .as_ref()
        .is_some_and(|dir| dir.as_os_str().is_empty())
    {
        return Err(ConfigError::ValidationError(
            "engine.cachedir must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CompilePolicy, RenderMode};
    use std::path::PathBuf;

    #[test]
    fn parse_empty_config() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.engine.mode, RenderMode::Fast);
        assert_eq!(config.engine.default_dialect, "path");
    }

    #[test]
    fn parse_full_config() {
        let toml = r#"
[engine]
mode = "diagnostic"
auto_reload = true
cachedir = "/var/cache/cinder"
default_dialect = "expr"
compile_policy = "exclusive"
write_source = false
"#;
        let config = load_config_from_str(toml).unwrap();
        let e = &config.engine;
        assert_eq!(e.mode, RenderMode::Diagnostic);
        assert!(e.auto_reload);
        assert_eq!(e.cachedir, Some(PathBuf::from("/var/cache/cinder")));
        assert_eq!(e.default_dialect, "expr");
        assert_eq!(e.compile_policy, CompilePolicy::Exclusive);
        assert_eq!(e.write_source, Some(false));
    }

    #[test]
    fn partial_section_keeps_defaults() {
        let config = load_config_from_str("[engine]\nauto_reload = true\n").unwrap();
        assert!(config.engine.auto_reload);
        assert_eq!(config.engine.compile_policy, CompilePolicy::Shared);
        assert_eq!(config.engine.default_dialect, "path");
    }

    #[test]
    fn unknown_mode_errors() {
        let err = load_config_from_str("[engine]\nmode = \"verbose\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn empty_dialect_errors() {
        let err = load_config_from_str("[engine]\ndefault_dialect = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn bad_dialect_name_errors() {
        let err = load_config_from_str("[engine]\ndefault_dialect = \"a b\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn empty_cachedir_errors() {
        let err = load_config_from_str("[engine]\ncachedir = \"\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn invalid_toml_errors() {
        let toml = "this is not valid toml {{{}}}";
        let err = load_config_from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[engine]\nmode = \"diagnostic\"\n").unwrap();
        let config = load_config(dir.path()).unwrap();
        assert_eq!(config.engine.mode, RenderMode::Diagnostic);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::IoError(_)));
    }
}
