//! Event dispatcher for the tabby framework.
//!
//! The [`Dispatcher`] fans each event out to handlers registered per
//! audience, in three phases:
//!
//! 1. handlers registered with [`on_event`](Dispatcher::on_event)
//! 2. the [`CommandCenter`], for message events
//! 3. handlers for the event's audience: group messages, private messages,
//!    notices, requests or meta events
//!
//! The bot's own `message_sent` posts only reach phase 1.
//!
//! In [`DispatchMode::Serial`] handlers are awaited one at a time and the
//! event stops as soon as one of them calls
//! [`prevent_default`](EventContext::prevent_default). In
//! [`DispatchMode::Concurrent`] every handler is spawned as its own task and
//! prevent-default has no effect.
//!
//! ```rust,ignore
//! use tabby_framework::{DispatchMode, Dispatcher};
//!
//! let mut dispatcher = Dispatcher::new(DispatchMode::Serial);
//! dispatcher
//!     .on_event(|ctx: Arc<EventContext>| async move { tracing::debug!(?ctx, "event") })
//!     .on_group_message(|msg: MessageEvent| async move { format!("echo: {}", msg.message) });
//! ```

use std::sync::Arc;

use tabby_core::{ApiClient, Event, EventCategory};
use tracing::{Instrument, Level, debug, span};

use crate::command::{Command, CommandCenter};
use crate::context::EventContext;
use crate::handler::{BoxedHandler, Handler, into_handler};

/// How handlers of one event are run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DispatchMode {
    /// One after another, on the dispatching task.
    #[default]
    Serial,
    /// Each on its own task.
    Concurrent,
}

#[derive(Default, Clone)]
struct Handlers {
    all: Vec<BoxedHandler>,
    group_message: Vec<BoxedHandler>,
    private_message: Vec<BoxedHandler>,
    notice: Vec<BoxedHandler>,
    meta: Vec<BoxedHandler>,
    request: Vec<BoxedHandler>,
}

/// The central event dispatcher.
#[derive(Default, Clone)]
pub struct Dispatcher {
    mode: DispatchMode,
    handlers: Handlers,
    commands: CommandCenter,
}

impl Dispatcher {
    /// Creates a new, empty dispatcher.
    pub fn new(mode: DispatchMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    // ─── Registration ─────────────────────────────────────────────────────────

    /// Adds a handler that sees every event.
    pub fn on_event<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.all.push(into_handler(handler));
        self
    }

    pub fn on_group_message<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.group_message.push(into_handler(handler));
        self
    }

    pub fn on_private_message<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.private_message.push(into_handler(handler));
        self
    }

    pub fn on_notice<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.notice.push(into_handler(handler));
        self
    }

    pub fn on_meta<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.meta.push(into_handler(handler));
        self
    }

    pub fn on_request<F, T>(&mut self, handler: F) -> &mut Self
    where
        F: Handler<T>,
        T: 'static,
    {
        self.handlers.request.push(into_handler(handler));
        self
    }

    /// Registers a command with the nested [`CommandCenter`].
    pub fn command(&mut self, command: Command) -> &mut Self {
        self.commands.register(command);
        self
    }

    pub fn commands(&self) -> &CommandCenter {
        &self.commands
    }

    pub fn commands_mut(&mut self) -> &mut CommandCenter {
        &mut self.commands
    }

    /// Returns the number of registered handlers, commands excluded.
    pub fn handler_count(&self) -> usize {
        let h = &self.handlers;
        h.all.len()
            + h.group_message.len()
            + h.private_message.len()
            + h.notice.len()
            + h.meta.len()
            + h.request.len()
    }

    // ─── Dispatch ─────────────────────────────────────────────────────────────

    /// Dispatches one event and returns its context.
    ///
    /// In concurrent mode this returns once every handler has been spawned.
    pub async fn dispatch(&self, event: Arc<Event>, api: ApiClient) -> Arc<EventContext> {
        let category = event.category();
        let span = span!(Level::DEBUG, "dispatch", post_type = %event.post_type, ?category);
        let ctx = Arc::new(EventContext::new(event, api));
        self.run(&ctx, category).instrument(span).await;
        ctx
    }

    async fn run(&self, ctx: &Arc<EventContext>, category: EventCategory) {
        if !self.run_phase(&self.handlers.all, ctx).await {
            return;
        }

        if matches!(
            category,
            EventCategory::GroupMessage | EventCategory::PrivateMessage | EventCategory::OtherMessage
        ) {
            match self.mode {
                DispatchMode::Serial => {
                    if self.commands.handle(ctx).await && ctx.is_default_prevented() {
                        debug!("Command stopped propagation");
                        return;
                    }
                }
                DispatchMode::Concurrent => {
                    if let Some((command, remainder)) = self.commands.resolve(ctx) {
                        let ctx = Arc::clone(ctx);
                        tokio::spawn(async move { command.execute(ctx, &remainder).await });
                    }
                }
            }
        }

        let audience = match category {
            EventCategory::GroupMessage => &self.handlers.group_message,
            EventCategory::PrivateMessage => &self.handlers.private_message,
            EventCategory::Notice => &self.handlers.notice,
            EventCategory::Request => &self.handlers.request,
            EventCategory::Meta => &self.handlers.meta,
            EventCategory::OtherMessage | EventCategory::SentMessage | EventCategory::Unknown => {
                return;
            }
        };
        self.run_phase(audience, ctx).await;
    }

    /// Runs one handler list. Returns `false` if the event was stopped.
    async fn run_phase(&self, handlers: &[BoxedHandler], ctx: &Arc<EventContext>) -> bool {
        for handler in handlers {
            match self.mode {
                DispatchMode::Serial => {
                    handler(Arc::clone(ctx)).await;
                    if ctx.is_default_prevented() {
                        debug!("Handler stopped propagation");
                        return false;
                    }
                }
                DispatchMode::Concurrent => {
                    tokio::spawn(handler(Arc::clone(ctx)));
                }
            }
        }
        true
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("mode", &self.mode)
            .field("handler_count", &self.handler_count())
            .field("commands", &self.commands)
            .finish()
    }
}
