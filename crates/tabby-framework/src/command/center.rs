use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use tabby_core::message::{escape, unescape};
use tracing::{trace, warn};

use super::definition::{Command, NameMode};
use super::split::command_candidate;
use crate::context::EventContext;

/// Routes message text to registered commands.
#[derive(Debug, Clone, Default)]
pub struct CommandCenter {
    global_prefix: Option<String>,
    commands: HashMap<String, Command>,
    prefix_commands: Vec<Command>,
}

impl CommandCenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a command. Exact names are unique; a later registration
    /// replaces an earlier one. Prefix commands are tried in registration
    /// order.
    pub fn register(&mut self, command: Command) {
        match command.mode() {
            NameMode::Exact => {
                if let Some(old) = self.commands.insert(command.name().to_owned(), command) {
                    warn!(command = %old.name(), "Command registered twice, replacing");
                }
            }
            NameMode::Prefix => self.prefix_commands.push(command),
        }
    }

    /// Sets a prefix such as `/` that is stripped from the first word before
    /// matching. An empty prefix is ignored.
    pub fn set_global_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        if !prefix.is_empty() {
            self.global_prefix = Some(prefix);
        }
    }

    pub fn global_prefix(&self) -> Option<&str> {
        self.global_prefix.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty() && self.prefix_commands.is_empty()
    }

    /// Finds the command a raw CQ string invokes, along with the text after
    /// the matched name.
    pub fn find<'a>(&'a self, raw: &'a str) -> Option<(&'a Command, &'a str)> {
        let candidate = command_candidate(raw);
        if candidate.is_empty() {
            return None;
        }
        let (skipped, name) = match &self.global_prefix {
            Some(prefix) if candidate.starts_with(prefix.as_str()) => {
                (prefix.len(), &candidate[prefix.len()..])
            }
            _ => (0, candidate),
        };

        for command in &self.prefix_commands {
            let escaped = escape(command.name());
            if name.starts_with(escaped.as_str()) {
                return Some((command, &raw[skipped + escaped.len()..]));
            }
        }

        self.commands
            .get(unescape(name).as_str())
            .map(|command| (command, &raw[skipped + name.len()..]))
    }

    /// Runs the command the event's message invokes, if any. Returns `true`
    /// when a command ran.
    pub async fn handle(&self, ctx: &Arc<EventContext>) -> bool {
        let Some((command, remainder)) = self.resolve(ctx) else {
            return false;
        };
        command.execute(Arc::clone(ctx), &remainder).await;
        true
    }

    /// Like [`find`](Self::find), but reads the message from an event and
    /// returns owned values.
    pub fn resolve(&self, ctx: &EventContext) -> Option<(Command, String)> {
        if self.is_empty() {
            return None;
        }
        let msg = ctx.event().as_message()?;
        let raw = if msg.raw_message.is_empty() {
            Cow::Owned(msg.message.to_cq_string())
        } else {
            Cow::Borrowed(msg.raw_message.as_str())
        };
        let (command, remainder) = self.find(&raw)?;
        trace!(command = %command.name(), "Matched command");
        Some((command.clone(), remainder.to_owned()))
    }
}
