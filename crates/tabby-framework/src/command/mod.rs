//! Command parsing system using clap.
//!
//! Commands are matched against the raw CQ string of a message:
//!
//! 1. The first word (text before the first CQ code and the first space) is
//!    the candidate; an optional global prefix such as `/` is stripped.
//! 2. Prefix-mode commands are tried in registration order; otherwise the
//!    candidate must equal an exact-mode name.
//! 3. The rest of the message is tokenized with [`tokenize`], so CQ codes
//!    survive as arguments, and parsed by the command's clap grammar.
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::Parser;
//! use tabby_framework::{CommandCenter, ParseResult, on_command};
//!
//! #[derive(Parser, Debug)]
//! struct Echo {
//!     words: Vec<String>,
//! }
//!
//! let mut commands = CommandCenter::new();
//! commands.set_global_prefix("/");
//! commands.register(on_command::<Echo>("echo").handler(|res: ParseResult<Echo>| async move {
//!     res.args.map(|echo| echo.words.join(" "))
//! }));
//! ```

mod center;
mod definition;
pub mod split;

pub use center::CommandCenter;
pub use definition::{Command, CommandBuilder, NameMode, ParseResult, on_command};
pub use split::{command_candidate, tokenize};
