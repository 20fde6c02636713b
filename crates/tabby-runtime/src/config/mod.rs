//! Configuration for the tabby runtime.
//!
//! Configuration is layered with figment: built-in defaults, then an
//! optional TOML/YAML file, then `TABBY_*` environment variables. See
//! [`ConfigLoader`] for the search rules.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, LogFormat, LogLevel, LogOutput, LogRotation, LoggingConfig, SpanEventConfig,
    TabbyConfig,
};
pub use validation::validate_config;
