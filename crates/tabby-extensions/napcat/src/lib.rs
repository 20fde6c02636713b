//! # NapCat extension for tabby
//!
//! NapCat speaks OneBot v11 plus a set of its own actions. This crate adds
//! typed access to them:
//!
//! - [`extension()`] registers the actions' response types with a client
//! - [`NapcatApi`] adds one method per action to [`ApiClient`](tabby_core::ApiClient)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tabby_ext_napcat::NapcatApi;
//!
//! bot.register_extension(tabby_ext_napcat::extension())?;
//!
//! let pending = bot.api().get_group_system_msg().await?;
//! for request in &pending.join_requests {
//!     tracing::info!(group = %request.group_id, user = %request.requester_uin, "join request");
//! }
//! ```

pub mod action;
mod api;
pub mod model;

pub use api::{EXTENSION_NAME, NapcatApi, extension};
pub use model::{DownloadRequest, DownloadedFile, FileInfo, GroupSystemMessages, GroupSystemRequest};
