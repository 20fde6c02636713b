//! Tabby Runtime - configuration, logging and the bot loop.
//!
//! This crate provides:
//! - Layered configuration ([`ConfigLoader`]: defaults, TOML/YAML files, `TABBY_*` env)
//! - Logging setup ([`logging::init_from_config`], [`LoggingBuilder`])
//! - The [`Bot`], which owns the API caller, the dispatcher and the receive loop
//!
//! ```rust,ignore
//! use tabby_runtime::{Bot, config::load_config, logging};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging);
//!
//!     let (out_tx, out_rx) = tokio::sync::mpsc::channel(64);
//!     let (in_tx, in_rx) = tokio::sync::mpsc::channel(64);
//!     let mut bot = Bot::new(config.bot, out_tx);
//!     bot.dispatcher_mut().on_group_message(echo);
//!
//!     // Hand `out_rx` and `in_tx` to the WebSocket transport.
//!     bot.run(in_rx).await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod logging;

pub use bot::Bot;
pub use config::{BotConfig, ConfigError, ConfigLoader, ConfigResult, LoggingConfig, TabbyConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

pub use tracing;
pub use tracing_subscriber;

/// The logging macros, for applications that do not depend on `tracing`.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
