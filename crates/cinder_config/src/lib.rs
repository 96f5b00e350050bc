//! Parsing and validation of `cinder.toml` engine configuration.
//!
//! This crate reads the engine configuration file, applies environment
//! overrides, and produces a strongly-typed [`EngineConfig`] from which
//! per-template [`TemplateOptions`] are derived.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use types::*;
