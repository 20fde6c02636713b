//! # Tabby Framework
//!
//! Event handling on top of `tabby-core`:
//!
//! - [`Dispatcher`]: per-audience handler lists, run serially or concurrently
//! - [`Handler`]: Axum-style handlers whose parameters implement [`FromContext`]
//! - [`CommandCenter`]: routes message text to clap-parsed [`Command`]s
//!
//! ```rust,ignore
//! use clap::Parser;
//! use tabby_framework::{DispatchMode, Dispatcher, ParseResult, on_command};
//!
//! #[derive(Parser, Debug)]
//! struct Echo {
//!     words: Vec<String>,
//! }
//!
//! let mut dispatcher = Dispatcher::new(DispatchMode::Serial);
//! dispatcher.commands_mut().set_global_prefix("/");
//! dispatcher.command(on_command::<Echo>("echo").handler(|res: ParseResult<Echo>| async move {
//!     res.args.map(|echo| echo.words.join(" "))
//! }));
//! ```

pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod extractor;
pub mod handler;

pub use command::{Command, CommandBuilder, CommandCenter, NameMode, ParseResult, on_command};
pub use context::EventContext;
pub use dispatcher::{DispatchMode, Dispatcher};
pub use error::{ExtractError, ExtractResult};
pub use extractor::FromContext;
pub use handler::{BoxedHandler, HandleResponse, Handler, into_handler};

/// Re-exported so command grammars can derive [`clap::Parser`] without a
/// direct dependency.
pub use clap;
