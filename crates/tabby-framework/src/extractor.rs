//! Extractor system for the tabby framework.
//!
//! This module provides the [`FromContext`] trait, which defines how types
//! can be extracted from an [`EventContext`] for use as handler parameters.

use std::sync::Arc;

use tabby_core::{ApiClient, Event, MessageEvent, MetaEvent, NoticeEvent, RequestEvent};

use crate::context::EventContext;
use crate::error::ExtractError;

/// A trait for types that can be extracted from an [`EventContext`].
///
/// If extraction fails the handler is skipped for that event.
///
/// # Example
///
/// ```rust,ignore
/// use tabby_framework::{EventContext, ExtractError, FromContext};
///
/// struct SenderName(String);
///
/// impl FromContext for SenderName {
///     fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
///         ctx.event()
///             .as_group_message()
///             .and_then(|msg| msg.as_group())
///             .map(|group| SenderName(group.sender.display_name().to_owned()))
///             .ok_or_else(|| ExtractError::custom("not a group message"))
///     }
/// }
/// ```
pub trait FromContext: Sized {
    /// Attempts to extract this type from the given context.
    fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError>;
}

/// The whole context, for handlers of the form `|ctx: Arc<EventContext>| async {..}`.
impl FromContext for Arc<EventContext> {
    fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
        Ok(Arc::clone(ctx))
    }
}

impl FromContext for Arc<Event> {
    fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
        Ok(ctx.event_arc())
    }
}

impl FromContext for ApiClient {
    fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
        Ok(ctx.api().clone())
    }
}

/// Implementation for `Option<T>` where `T: FromContext`.
///
/// This allows handlers to have optional parameters that may or may not
/// be extractable from the context.
impl<T: FromContext> FromContext for Option<T> {
    fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
        Ok(T::from_context(ctx).ok())
    }
}

macro_rules! impl_from_event {
    ($ty:ty, $accessor:ident, $expected:literal) => {
        impl FromContext for $ty {
            fn from_context(ctx: &Arc<EventContext>) -> Result<Self, ExtractError> {
                ctx.event()
                    .$accessor()
                    .cloned()
                    .ok_or_else(|| ExtractError::EventKindMismatch {
                        expected: $expected,
                        got: ctx.event().post_type.clone(),
                    })
            }
        }
    };
}

impl_from_event!(MessageEvent, as_message, "message");
impl_from_event!(NoticeEvent, as_notice, "notice");
impl_from_event!(RequestEvent, as_request, "request");
impl_from_event!(MetaEvent, as_meta, "meta_event");
