//! Handler system for the tabby framework.
//!
//! Handlers are plain async functions. Their parameters are extracted from
//! the [`EventContext`] via [`FromContext`], and their return value is
//! processed via [`HandleResponse`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tabby_framework::EventContext;
//! use tabby_core::{ApiClient, MessageEvent};
//!
//! // The whole context
//! async fn log_all(ctx: Arc<EventContext>) {
//!     tracing::info!(post_type = %ctx.event().post_type, "event");
//! }
//!
//! // Extractors; skipped for events that are not messages
//! async fn echo(msg: MessageEvent, api: ApiClient) -> tabby_core::ApiResult<()> {
//!     msg.reply(&api, msg.message.clone(), true).await.map(|_| ())
//! }
//!
//! // Returning a String replies with it
//! async fn pong(_msg: MessageEvent) -> String {
//!     "pong".into()
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use tabby_core::Chain;
use tracing::{error, warn};

use crate::context::EventContext;
use crate::extractor::FromContext;

// ============================================================================
// HandleResponse - Handle handler return values
// ============================================================================

/// A trait for types that can handle handler return values.
#[async_trait]
pub trait HandleResponse: Send {
    /// Consume this value after the handler returned it.
    async fn into_response(self, ctx: Arc<EventContext>);
}

/// Implementation for `()` - no response needed.
#[async_trait]
impl HandleResponse for () {
    async fn into_response(self, _ctx: Arc<EventContext>) {}
}

/// Implementation for `Chain` - replies to the message event.
#[async_trait]
impl HandleResponse for Chain {
    async fn into_response(self, ctx: Arc<EventContext>) {
        let Some(msg) = ctx.event().as_message() else {
            warn!(post_type = %ctx.event().post_type, "Handler replied to a non-message event");
            return;
        };
        if let Err(e) = msg.reply(ctx.api(), self, false).await {
            error!("Failed to send reply: {e}");
        }
    }
}

/// Implementation for `String` - replies with the text, sent literally.
#[async_trait]
impl HandleResponse for String {
    async fn into_response(self, ctx: Arc<EventContext>) {
        Chain::new().text(self).into_response(ctx).await;
    }
}

/// Implementation for `Option<T>` where T implements HandleResponse.
///
/// On Some, the inner value's response is handled. On None, no action is taken.
#[async_trait]
impl<T: HandleResponse> HandleResponse for Option<T> {
    async fn into_response(self, ctx: Arc<EventContext>) {
        if let Some(t) = self {
            t.into_response(ctx).await;
        }
    }
}

/// Implementation for `Result<T, E>` where T implements HandleResponse.
///
/// On Ok, the inner value's response is handled. On Err, the error is logged.
#[async_trait]
impl<T: HandleResponse, E: std::fmt::Display + Send> HandleResponse for Result<T, E> {
    async fn into_response(self, ctx: Arc<EventContext>) {
        match self {
            Ok(t) => t.into_response(ctx).await,
            Err(e) => {
                error!("Handler error: {e}");
            }
        }
    }
}

// ============================================================================
// Handler Trait
// ============================================================================

/// The core trait for event handlers.
///
/// Automatically implemented for async functions that take 0-8 parameters
/// implementing [`FromContext`] and return a [`HandleResponse`].
#[async_trait]
pub trait Handler<T>: Clone + Send + Sync + 'static {
    /// Call the handler with the given context.
    async fn call(self, ctx: Arc<EventContext>);
}

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn Fn(Arc<EventContext>) -> BoxFuture<'static, ()> + Send + Sync>;

/// Convert a handler function into a boxed handler.
pub fn into_handler<F, T>(f: F) -> BoxedHandler
where
    F: Handler<T> + Send + Sync + 'static,
    T: 'static,
{
    Arc::new(move |ctx| f.clone().call(ctx))
}

/// Macro to generate Handler implementations for functions with different arities.
macro_rules! impl_handler {
    (
        $($ty:ident),*
    ) => {
        #[allow(non_snake_case)]
        #[async_trait]
        impl<F, Fut, Res, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: FnOnce($($ty,)*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future<Output = Res> + Send + 'static,
            Res: HandleResponse + 'static,
            $( $ty: FromContext + Send + 'static, )*
        {
            async fn call(self, ctx: Arc<EventContext>) {
                $(
                    let Ok($ty) = $ty::from_context(&ctx) else { return };
                )*

                let res = (self)($($ty,)*).await;
                res.into_response(ctx).await;
            }
        }
    };
}

impl_handler!();
impl_handler!(T1);
impl_handler!(T1, T2);
impl_handler!(T1, T2, T3);
impl_handler!(T1, T2, T3, T4);
impl_handler!(T1, T2, T3, T4, T5);
impl_handler!(T1, T2, T3, T4, T5, T6);
impl_handler!(T1, T2, T3, T4, T5, T6, T7);
impl_handler!(T1, T2, T3, T4, T5, T6, T7, T8);

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::context::tests::context;
    use tabby_core::{MessageEvent, NoticeEvent};

    const GROUP_MESSAGE: &str = r#"{"post_type":"message","message_type":"group","group_id":1,"user_id":2,"message":"hi"}"#;

    #[tokio::test]
    async fn test_extractor_skips_mismatched_kind() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        let handler = into_handler(move |_notice: NoticeEvent| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        handler(context(GROUP_MESSAGE)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_context_and_event_extractors() {
        let handler = into_handler(|ctx: Arc<EventContext>, msg: MessageEvent| async move {
            ctx.set_state(msg.raw_message.len() + msg.message.len());
        });
        let ctx = context(GROUP_MESSAGE);
        handler(Arc::clone(&ctx)).await;
        assert_eq!(ctx.get_state::<usize>(), Some(1));
    }

    #[tokio::test]
    async fn test_result_error_is_swallowed() {
        let handler = into_handler(|| async { Err::<(), _>("boom") });
        handler(context(GROUP_MESSAGE)).await;
    }
}
