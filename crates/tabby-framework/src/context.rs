//! Per-event context handed to handlers.
//!
//! One [`EventContext`] is created per dispatched event and shared, behind an
//! `Arc`, by every handler that sees the event. It carries:
//!
//! - the decoded [`Event`] and the [`ApiClient`] to answer it with
//! - the default-prevented flag; in serial dispatch, setting it stops the
//!   event from reaching later handlers
//! - typed state, one value per type, shared by all handlers of the event
//!
//! ```rust,ignore
//! async fn handle(ctx: Arc<EventContext>) {
//!     if let Some(msg) = ctx.event().as_message() {
//!         ctx.set_state(msg.plain_text());
//!         ctx.prevent_default();
//!     }
//! }
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use tabby_core::{ApiClient, Event};

use crate::error::{ExtractError, ExtractResult};

/// The context object passed to handlers during event processing.
pub struct EventContext {
    event: Arc<Event>,
    api: ApiClient,
    /// Set by any handler that calls [`EventContext::prevent_default`].
    prevented: AtomicBool,
    state: Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>,
}

impl EventContext {
    /// Creates the context for one event.
    pub fn new(event: Arc<Event>, api: ApiClient) -> Self {
        Self {
            event,
            api,
            prevented: AtomicBool::new(false),
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the event being dispatched.
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Returns a clone of the event `Arc`.
    pub fn event_arc(&self) -> Arc<Event> {
        Arc::clone(&self.event)
    }

    /// Returns the API client of the bot that received the event.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Stops the event from reaching later handlers.
    ///
    /// Only honored in serial dispatch; concurrent handlers are all started
    /// before any of them runs.
    pub fn prevent_default(&self) {
        self.prevented.store(true, Ordering::SeqCst);
    }

    /// Returns `true` once a handler has called [`prevent_default`](Self::prevent_default).
    pub fn is_default_prevented(&self) -> bool {
        self.prevented.load(Ordering::SeqCst)
    }

    /// Stores a value in the context. Only one value per type can be
    /// stored; subsequent calls overwrite.
    pub fn set_state<T: Send + Sync + 'static>(&self, value: T) {
        self.state.lock().insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a cloned value from the context.
    pub fn get_state<T: Clone + 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref::<T>())
            .cloned()
    }

    /// Like [`get_state`](Self::get_state), but fails with
    /// [`ExtractError::StateNotFound`].
    pub fn require_state<T: Clone + 'static>(&self) -> ExtractResult<T> {
        self.get_state::<T>()
            .ok_or(ExtractError::StateNotFound(std::any::type_name::<T>()))
    }

    /// Returns `true` if a value of type `T` is stored.
    pub fn has_state<T: 'static>(&self) -> bool {
        self.state.lock().contains_key(&TypeId::of::<T>())
    }

    /// Removes and returns a stored value.
    pub fn take_state<T: 'static>(&self) -> Option<T> {
        self.state
            .lock()
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }
}

impl std::fmt::Debug for EventContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventContext")
            .field("post_type", &self.event.post_type)
            .field("prevented", &self.is_default_prevented())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tabby_core::ChannelApiCaller;
    use tokio::sync::mpsc;

    /// A context over `frame` whose API calls go nowhere.
    pub(crate) fn context(frame: &str) -> Arc<EventContext> {
        let (tx, _rx) = mpsc::channel(1);
        let api = ApiClient::new(Arc::new(ChannelApiCaller::new(tx)));
        let event = Event::from_slice(frame.as_bytes()).unwrap();
        Arc::new(EventContext::new(Arc::new(event), api))
    }

    #[test]
    fn test_state_roundtrip() {
        let ctx = context(r#"{"post_type":"meta_event","meta_event_type":"lifecycle"}"#);
        assert!(!ctx.has_state::<u32>());
        ctx.set_state(7u32);
        assert_eq!(ctx.get_state::<u32>(), Some(7));
        ctx.set_state(8u32);
        assert_eq!(ctx.take_state::<u32>(), Some(8));
        assert!(ctx.require_state::<u32>().is_err());
    }

    #[test]
    fn test_prevent_default() {
        let ctx = context(r#"{"post_type":"notice","notice_type":"friend_add"}"#);
        assert!(!ctx.is_default_prevented());
        ctx.prevent_default();
        assert!(ctx.is_default_prevented());
    }
}
