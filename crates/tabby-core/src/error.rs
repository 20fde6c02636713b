//! Unified error types for the tabby protocol core.
//!
//! Every fallible operation in this crate returns one of the enums below.
//! Event decode markers ([`EventError`]) are not failures: they ride on the
//! decoded [`Event`](crate::event::Event) and are handed to dispatch.

use thiserror::Error;

// =============================================================================
// Codec Errors
// =============================================================================

/// Errors produced while decoding a CQ-code string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// A `[CQ:` span was opened but never closed.
    #[error("invalid CQ string: unterminated `[CQ:` span at byte {offset}")]
    Unterminated {
        /// Byte offset of the opening `[CQ:`.
        offset: usize,
    },

    /// A known segment type carried fields that do not fit its schema.
    #[error("invalid message: `{kind}` segment: {reason}")]
    InvalidSegment {
        /// The segment type tag.
        kind: String,
        /// Why the fields were rejected.
        reason: String,
    },
}

// =============================================================================
// Event Errors
// =============================================================================

/// Failures that prevent an inbound frame from becoming an event at all.
#[derive(Debug, Error)]
pub enum EventParseError {
    /// The frame is not valid JSON, or a field has the wrong type.
    #[error("malformed event frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame is valid JSON but not an object.
    #[error("malformed event frame: expected a JSON object")]
    NotAnObject,
}

/// Non-fatal decode markers attached to an event whose discriminators were
/// not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EventError {
    /// Unrecognized `post_type`.
    #[error("unknown event: post_type `{0}`")]
    UnknownEvent(String),
    /// Unrecognized `message_type`.
    #[error("unknown message event: message_type `{0}`")]
    UnknownMessageEvent(String),
    /// Unrecognized `notice_type` (or notify `sub_type`).
    #[error("unknown notice event: `{0}`")]
    UnknownNoticeEvent(String),
    /// Unrecognized `request_type`.
    #[error("unknown request event: request_type `{0}`")]
    UnknownRequestEvent(String),
    /// Unrecognized `meta_event_type`.
    #[error("unknown meta event: meta_event_type `{0}`")]
    UnknownMetaEvent(String),
}

// =============================================================================
// API Errors
// =============================================================================

/// Error type for API calls.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The transport sink is closed or the connection dropped while waiting.
    #[error("bot is not connected")]
    NotConnected,

    /// No response arrived within the configured window.
    #[error("API call `{action}` timed out (echo {echo})")]
    Timeout {
        /// The action that was called.
        action: String,
        /// The correlation token of the call.
        echo: String,
    },

    /// The gateway answered with a non-zero `retcode`.
    #[error("API error ({retcode}): {message}")]
    Api {
        /// The numeric result code.
        retcode: i64,
        /// `message` or `wording` from the envelope, if any.
        message: String,
    },

    /// A response arrived whose echo matches no pending call.
    #[error("unknown response: echo `{echo}`")]
    UnknownResponse {
        /// The unmatched correlation token.
        echo: String,
    },

    /// A frame carrying `echo` could not be read as a response envelope.
    #[error("invalid response envelope: {0}")]
    InvalidEnvelope(String),

    /// The response payload did not match the schema registered for the action.
    #[error("failed to decode `{action}` response: {source}")]
    Decode {
        /// The action whose payload failed to decode.
        action: String,
        /// The underlying serde error.
        #[source]
        source: serde_json::Error,
    },

    /// A payload was requested as a different type than the one it holds.
    #[error("type assertion failed: payload is `{actual}`, requested `{requested}`")]
    TypeMismatch {
        /// Type name of the stored payload.
        actual: &'static str,
        /// Type name that was requested.
        requested: &'static str,
    },

    /// The operation is not available for this event or target.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),

    /// Building the outbound request failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Conflicts rejected by [`ActionRegistry`](crate::api::ActionRegistry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An extension with this name is already registered.
    #[error("extension `{0}` already registered")]
    ExtensionAlreadyRegistered(String),

    /// The action is built in or owned by another extension.
    #[error("action `{action}` already registered by `{owner}`")]
    ActionAlreadyRegistered {
        /// The conflicting action.
        action: String,
        /// The current owner (`builtin` or an extension name).
        owner: String,
    },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for API calls.
pub type ApiResult<T> = Result<T, ApiError>;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
