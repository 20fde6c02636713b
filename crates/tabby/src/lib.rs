//! # Tabby
//!
//! A client for the NapCat flavour of OneBot v11: it decodes gateway events,
//! correlates API calls with their responses and routes messages to
//! handlers and clap-parsed commands.
//!
//! ## Architecture
//!
//! ```text
//!            inbound frames                       ┌─▶ all-events handlers
//! transport ───────────────▶ Bot ──▶ Dispatcher ──┼─▶ CommandCenter ──▶ Command (clap)
//!     ▲                       │                   └─▶ group / private / notice / request / meta
//!     │   outbound frames     ▼
//!     └──────────────── ApiClient ◀── echo-matched responses
//! ```
//!
//! - **tabby-core**: CQ codec, events, API types and the response correlator
//! - **tabby-framework**: handlers, the dispatcher and the command center
//! - **tabby-runtime**: configuration, logging and the bot loop
//! - **tabby-ext-napcat**: NapCat-only actions (`napcat` feature)
//!
//! The WebSocket transport is left to the application; the bot only needs a
//! channel in each direction.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabby::prelude::*;
//!
//! #[derive(Parser, Debug)]
//! struct Echo {
//!     words: Vec<String>,
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = tabby::runtime::config::load_config()?;
//!     tabby::runtime::logging::init_from_config(&config.logging);
//!
//!     let (out_tx, out_rx) = tokio::sync::mpsc::channel(64);
//!     let (in_tx, in_rx) = tokio::sync::mpsc::channel(64);
//!     let mut bot = Bot::new(config.bot, out_tx);
//!     bot.dispatcher_mut()
//!         .command(on_command::<Echo>("echo").handler(|res: ParseResult<Echo>| async move {
//!             res.args.map(|echo| echo.words.join(" "))
//!         }));
//!
//!     // Connect `out_rx` / `in_tx` to the gateway socket here.
//!     bot.run(in_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `napcat` *(default)*: NapCat extension actions
//! - `toml-config` *(default)* / `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines

pub use tabby_core as core;
#[cfg(feature = "napcat")]
pub use tabby_ext_napcat as napcat;
pub use tabby_framework as framework;
pub use tabby_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use tabby::prelude::*;
/// ```
pub mod prelude {
    pub use tabby_core::prelude::*;
    pub use tabby_core::{
        ApiError, ApiResult, MessageEvent, MetaEvent, NoticeEvent, RequestEvent,
    };

    pub use tabby_framework::clap::{self, Parser};
    pub use tabby_framework::{
        DispatchMode, Dispatcher, EventContext, FromContext, ParseResult, on_command,
    };

    pub use tabby_runtime::{Bot, TabbyConfig};

    #[cfg(feature = "napcat")]
    pub use tabby_ext_napcat::NapcatApi;
}
