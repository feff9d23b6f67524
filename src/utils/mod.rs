//! Configuration utilities.

/// TOML configuration schema, validation and hot reloading.
pub mod toml_config;

pub use toml_config::{ConfigError, DelveConfig, DelveConfigManager};
