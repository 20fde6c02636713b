use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use clap::Parser;
use futures::future::BoxFuture;
use tabby_core::{Event, MessageEvent};
use tracing::debug;

use super::split::tokenize;
use crate::context::EventContext;
use crate::handler::HandleResponse;

/// How a command name is matched against the start of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NameMode {
    /// The first word must equal the name.
    #[default]
    Exact,
    /// The first word must start with the name; the rest of the word
    /// becomes part of the arguments.
    Prefix,
}

// ============================================================================
// ParseResult
// ============================================================================

/// Outcome of parsing a message against a command grammar.
///
/// When clap refuses the arguments, [`args`](Self::args) is `None` and
/// [`error`](Self::error) holds the reason. Help requests are reported the
/// same way, with the help text in [`stdout`](Self::stdout) and exit code 0.
#[derive(Debug)]
pub struct ParseResult<T> {
    pub args: Option<T>,
    pub error: Option<clap::Error>,
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    /// The arguments as tokenized, without the command name.
    pub tokens: Vec<String>,
    pub ctx: Arc<EventContext>,
}

impl<T: Parser> ParseResult<T> {
    fn parse(name: &str, tokens: Vec<String>, ctx: Arc<EventContext>) -> Self {
        let argv = std::iter::once(name.to_owned()).chain(tokens.iter().cloned());
        match T::try_parse_from(argv) {
            Ok(args) => Self {
                args: Some(args),
                error: None,
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
                tokens,
                ctx,
            },
            Err(err) => {
                let rendered = err.render().to_string();
                let (stdout, stderr) = if err.use_stderr() {
                    (String::new(), rendered)
                } else {
                    (rendered, String::new())
                };
                Self {
                    args: None,
                    exit_code: err.exit_code(),
                    error: Some(err),
                    stdout,
                    stderr,
                    tokens,
                    ctx,
                }
            }
        }
    }
}

impl<T> ParseResult<T> {
    pub fn event(&self) -> &Event {
        self.ctx.event()
    }

    /// The message that triggered the command.
    pub fn message(&self) -> Option<&MessageEvent> {
        self.ctx.event().as_message()
    }

    /// Whatever clap printed: help text, or the error report.
    pub fn output(&self) -> &str {
        if self.stdout.is_empty() {
            &self.stderr
        } else {
            &self.stdout
        }
    }
}

// ============================================================================
// Command
// ============================================================================

type Preprocess = Arc<dyn Fn(&str) -> String + Send + Sync>;
type Runner = Arc<dyn Fn(Arc<EventContext>, Vec<String>) -> BoxFuture<'static, ()> + Send + Sync>;

/// A registered command: its name, how to match it and what to run.
///
/// Built with [`on_command`].
#[derive(Clone)]
pub struct Command {
    name: String,
    mode: NameMode,
    split_by_space_only: bool,
    preprocess: Option<Preprocess>,
    stop_propagation: bool,
    run: Runner,
}

impl Command {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> NameMode {
        self.mode
    }

    /// Runs the command on what follows its name in the message.
    pub async fn execute(&self, ctx: Arc<EventContext>, remainder: &str) {
        let remainder = match &self.preprocess {
            Some(preprocess) => preprocess(remainder),
            None => remainder.to_owned(),
        };
        let tokens = tokenize(&remainder, self.split_by_space_only);
        debug!(command = %self.name, args = ?tokens, "Running command");
        (self.run)(Arc::clone(&ctx), tokens).await;
        if self.stop_propagation {
            ctx.prevent_default();
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("split_by_space_only", &self.split_by_space_only)
            .field("stop_propagation", &self.stop_propagation)
            .finish_non_exhaustive()
    }
}

// ----------------------------------------------------------------------------
// Builder
// ----------------------------------------------------------------------------

/// Starts a command definition parsed by the clap grammar `T`.
///
/// `name` doubles as `argv[0]`, so it appears in usage and help output.
///
/// # Example
///
/// ```rust,ignore
/// use clap::Parser;
/// use tabby_framework::{on_command, ParseResult};
///
/// #[derive(Parser, Debug)]
/// struct Roll {
///     /// Number of sides
///     #[arg(default_value_t = 6)]
///     sides: u32,
/// }
///
/// let roll = on_command::<Roll>("roll")
///     .stop_propagation(true)
///     .handler(|res: ParseResult<Roll>| async move {
///         match res.args {
///             Some(roll) => format!("rolling d{}", roll.sides),
///             None => res.output().to_owned(),
///         }
///     });
/// ```
pub fn on_command<T>(name: impl Into<String>) -> CommandBuilder<T>
where
    T: Parser + Send + 'static,
{
    CommandBuilder {
        name: name.into(),
        mode: NameMode::Exact,
        split_by_space_only: false,
        preprocess: None,
        stop_propagation: false,
        _marker: PhantomData,
    }
}

/// Builder for [`Command`]s.
pub struct CommandBuilder<T> {
    name: String,
    mode: NameMode,
    split_by_space_only: bool,
    preprocess: Option<Preprocess>,
    stop_propagation: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T> CommandBuilder<T>
where
    T: Parser + Send + 'static,
{
    /// Sets how the name is matched.
    pub fn mode(mut self, mode: NameMode) -> Self {
        self.mode = mode;
        self
    }

    /// Matches the name as a prefix of the first word.
    pub fn prefix(self) -> Self {
        self.mode(NameMode::Prefix)
    }

    /// Splits on spaces only, keeping CQ codes glued to adjacent text.
    pub fn split_by_space_only(mut self, enabled: bool) -> Self {
        self.split_by_space_only = enabled;
        self
    }

    /// Rewrites the text after the command name before it is tokenized.
    pub fn preprocess<P>(mut self, preprocess: P) -> Self
    where
        P: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.preprocess = Some(Arc::new(preprocess));
        self
    }

    /// Marks the event default-prevented once the callback returns.
    pub fn stop_propagation(mut self, enabled: bool) -> Self {
        self.stop_propagation = enabled;
        self
    }

    /// Finishes the definition with the callback to run on every match.
    pub fn handler<F, Fut>(self, callback: F) -> Command
    where
        F: Fn(ParseResult<T>) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: HandleResponse,
    {
        let name = self.name.clone();
        let run: Runner = Arc::new(
            move |ctx: Arc<EventContext>, tokens: Vec<String>| -> BoxFuture<'static, ()> {
                let result = ParseResult::<T>::parse(&name, tokens, Arc::clone(&ctx));
                let response = callback(result);
                Box::pin(async move {
                    response.await.into_response(ctx).await;
                })
            },
        );
        Command {
            name: self.name,
            mode: self.mode,
            split_by_space_only: self.split_by_space_only,
            preprocess: self.preprocess,
            stop_propagation: self.stop_propagation,
            run,
        }
    }
}
