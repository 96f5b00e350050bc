//! Configuration types deserialized from `cinder.toml`.

use std::path::PathBuf;

use serde::Deserialize;

pub use cinder_cache::CompilePolicy;

use crate::error::ConfigError;

/// The top-level engine configuration parsed from `cinder.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    /// Settings under `[engine]`.
    #[serde(default)]
    pub engine: EngineSection,
}

/// How render failures are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    /// Execution errors propagate unmodified.
    #[default]
    Fast,
    /// Execution errors are enriched with the failing template construct.
    Diagnostic,
}

/// The `[engine]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Error reporting mode.
    pub mode: RenderMode,
    /// Re-check a file-bound template's mtime before every render.
    pub auto_reload: bool,
    /// Directory for persisted artifacts; `None` disables persistence.
    pub cachedir: Option<PathBuf>,
    /// Expression dialect used when a construct names none.
    pub default_dialect: String,
    /// Behavior when several threads miss on the same cache key.
    pub compile_policy: CompilePolicy,
    /// Write `<filename>.source` listings after compiling a file-bound
    /// template. Unset means "only in diagnostic mode".
    pub write_source: Option<bool>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            mode: RenderMode::Fast,
            auto_reload: false,
            cachedir: None,
            default_dialect: "path".to_string(),
            compile_policy: CompilePolicy::Shared,
            write_source: None,
        }
    }
}

/// Environment variable that switches to diagnostic mode when truthy.
pub const ENV_DEBUG: &str = "CINDER_DEBUG";

/// Environment variable that toggles `auto_reload`.
pub const ENV_AUTO_RELOAD: &str = "CINDER_AUTO_RELOAD";

impl EngineConfig {
    /// Applies `CINDER_DEBUG` and `CINDER_AUTO_RELOAD` from the process environment.
    ///
    /// Values are matched case-insensitively after trimming. `y`, `yes`, `t`,
    /// `true`, `on` and `1` enable a flag; the empty string, `n`, `no`, `f`,
    /// `false`, `off` and `0` disable it. Any other value is rejected with
    /// [`ConfigError::InvalidEnv`] rather than read as false, so a typo never
    /// silently turns diagnostics or reloading off.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Applies environment overrides using `lookup` to read variables.
    ///
    /// Unset variables leave the configuration unchanged. Values follow the
    /// rules of [`apply_env`](Self::apply_env).
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_DEBUG) {
            self.engine.mode = if parse_flag(ENV_DEBUG, &value)? {
                RenderMode::Diagnostic
            } else {
                RenderMode::Fast
            };
        }
        if let Some(value) = lookup(ENV_AUTO_RELOAD) {
            self.engine.auto_reload = parse_flag(ENV_AUTO_RELOAD, &value)?;
        }
        Ok(())
    }

    /// Derives the options new templates are created with.
    pub fn template_options(&self) -> TemplateOptions {
        let e = &self.engine;
        TemplateOptions {
            mode: e.mode,
            auto_reload: e.auto_reload,
            cachedir: e.cachedir.clone(),
            default_dialect: e.default_dialect.clone(),
            compile_policy: e.compile_policy,
            write_source: e.write_source.unwrap_or(e.mode == RenderMode::Diagnostic),
        }
    }
}

/// Parses a boolean environment value.
fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "" | "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

/// Resolved settings for one template.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateOptions {
    /// Error reporting mode.
    pub mode: RenderMode,
    /// Re-check the file's mtime before every render.
    pub auto_reload: bool,
    /// Directory for persisted artifacts.
    pub cachedir: Option<PathBuf>,
    /// Expression dialect used when a construct names none.
    pub default_dialect: String,
    /// Concurrent-compile behavior.
    pub compile_policy: CompilePolicy,
    /// Write `<filename>.source` listings after compiling.
    pub write_source: bool,
}

impl Default for TemplateOptions {
    fn default() -> Self {
        EngineConfig::default().template_options()
    }
}

impl TemplateOptions {
    /// Sets the render mode.
    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets `auto_reload`.
    pub fn with_auto_reload(mut self, auto_reload: bool) -> Self {
        self.auto_reload = auto_reload;
        self
    }

    /// Enables artifact persistence under `cachedir`.
    pub fn with_cachedir(mut self, cachedir: impl Into<PathBuf>) -> Self {
        self.cachedir = Some(cachedir.into());
        self
    }

    /// Sets the default expression dialect.
    pub fn with_default_dialect(mut self, dialect: impl Into<String>) -> Self {
        self.default_dialect = dialect.into();
        self
    }

    /// Sets the compile policy.
    pub fn with_compile_policy(mut self, policy: CompilePolicy) -> Self {
        self.compile_policy = policy;
        self
    }

    /// Enables or disables `<filename>.source` listings.
    pub fn with_write_source(mut self, write_source: bool) -> Self {
        self.write_source = write_source;
        self
    }
}
