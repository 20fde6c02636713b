//! Action calls: envelopes, correlation and the typed client.

pub mod action;
mod caller;
mod client;
mod registry;
mod response;

pub use caller::{ApiCaller, ChannelApiCaller, DEFAULT_API_TIMEOUT};
pub use client::{ApiClient, MessageTarget};
pub use registry::{ActionRegistry, BUILTIN_OWNER, Extension, ResponseFactory};
pub use response::*;
