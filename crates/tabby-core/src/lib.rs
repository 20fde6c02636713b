//! # Tabby Core
//!
//! The protocol core of the tabby NapCat client.
//!
//! This crate knows how to talk OneBot v11 but owns no socket: it consumes
//! inbound frames and produces outbound ones, leaving transport to the
//! caller.
//!
//! ## Modules
//!
//! - **Message** ([`message`]): typed segments, [`Chain`] and the CQ-code
//!   codec
//! - **Events** ([`event`]): classification and decoding of inbound frames
//!   into the closed [`Event`] hierarchy
//! - **API** ([`api`]): request/response correlation ([`ChannelApiCaller`]),
//!   the per-caller [`ActionRegistry`] and the typed [`ApiClient`]
//! - **Domain records** ([`qq`]): ids, users, members and groups
//!
//! ## Data Flow
//!
//! ```text
//!            ┌──────────── frame has "echo" ───────────▶ ChannelApiCaller::resolve_response
//! inbound ───┤
//!            └──────────── otherwise ──────────────────▶ Event::from_slice
//!
//! ApiClient::send_group_msg ─▶ ChannelApiCaller::call ─▶ {"action","params","echo"} ─▶ outbound
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tabby_core::{ApiClient, ChannelApiCaller, Chain, Event};
//! use tokio::sync::mpsc;
//!
//! let (outbound, _wire) = mpsc::channel(64);
//! let caller = Arc::new(ChannelApiCaller::new(outbound));
//! let api = ApiClient::new(caller.clone());
//!
//! let event = Event::from_slice(frame)?;
//! if let Some(msg) = event.as_message() {
//!     msg.reply(&api, Chain::new().text("pong"), true).await?;
//! }
//! ```

pub mod api;
pub mod error;
pub mod event;
pub mod message;
pub mod qq;

pub use api::{
    ActionRegistry, ApiCaller, ApiClient, ApiResponse, ChannelApiCaller, Extension, MessageTarget,
    Payload, RawResponse, ResponseFactory,
};
pub use error::{
    ApiError, ApiResult, CodecError, CodecResult, EventError, EventParseError, RegistryError,
};
pub use event::{
    Event, EventCategory, EventKind, MessageEvent, MessageKind, MetaEvent, MetaKind, NoticeEvent,
    NoticeKind, RequestEvent, RequestKind,
};
pub use message::{Chain, Segment};
pub use qq::{GroupId, MessageId, UserId};

/// Prelude for common imports.
pub mod prelude {
    pub use super::api::{ApiClient, MessageTarget};
    pub use super::event::{Event, EventCategory, EventKind, MessageKind, NoticeKind, RequestKind};
    pub use super::message::{Chain, Segment};
    pub use super::qq::{GroupId, MessageId, UserId};
}
