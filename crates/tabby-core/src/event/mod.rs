//! Inbound events as closed sum types.
//!
//! ```text
//! Event { time, self_id, post_type, kind, error }
//! └── EventKind (post_type)
//!     ├── Message(MessageEvent)  ── MessageKind  { Private, Group, Unknown }
//!     ├── Notice(NoticeEvent)    ── NoticeKind   { GroupUpload, GroupBan, Poke, … }
//!     ├── Request(RequestEvent)  ── RequestKind  { Friend, Group, Unknown }
//!     ├── Meta(MetaEvent)        ── MetaKind     { Lifecycle, Heartbeat, Unknown }
//!     └── Unknown
//! ```
//!
//! # Parsing
//!
//! [`Event::from_slice`] parses the frame once into a [`Value`], reads the
//! discriminators and decodes each level from that same value. An
//! unrecognized discriminator yields the nearest known ancestor and an
//! [`EventError`] in [`Event::error`]; only malformed JSON is a hard error.
//!
//! ```rust,ignore
//! let event = Event::from_slice(frame)?;
//! if let Some(msg) = event.as_group_message() {
//!     println!("{} said {}", msg.user_id, msg.message);
//! }
//! ```

pub mod message;
pub mod meta;
pub mod notice;
pub mod request;

use serde::Deserialize;
use serde_json::Value;

pub use message::*;
pub use meta::*;
pub use notice::*;
pub use request::*;

use crate::api::ApiClient;
use crate::error::{ApiResult, EventError, EventParseError};
use crate::qq::UserId;

// ============================================================================
// Event (Root Level)
// ============================================================================

/// A decoded inbound event.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Unix timestamp when the event occurred.
    pub time: i64,
    /// The bot account.
    pub self_id: UserId,
    pub post_type: String,
    pub kind: EventKind,
    /// Set when a discriminator was not recognized.
    pub error: Option<EventError>,
    /// The frame as received.
    pub raw: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Message(MessageEvent),
    Notice(NoticeEvent),
    Request(RequestEvent),
    Meta(MetaEvent),
    Unknown,
}

/// Coarse classification of an [`Event`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventCategory {
    GroupMessage,
    PrivateMessage,
    OtherMessage,
    /// A message the bot account sent itself (`message_sent`).
    SentMessage,
    Notice,
    Request,
    Meta,
    Unknown,
}

#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    time: i64,
    #[serde(default)]
    self_id: UserId,
    #[serde(default)]
    post_type: String,
}

impl Event {
    /// Decodes a raw frame.
    pub fn from_slice(frame: &[u8]) -> Result<Self, EventParseError> {
        Self::from_value(serde_json::from_slice(frame)?)
    }

    /// Decodes an already parsed frame.
    pub fn from_value(raw: Value) -> Result<Self, EventParseError> {
        if !raw.is_object() {
            return Err(EventParseError::NotAnObject);
        }
        let header = Header::deserialize(&raw)?;
        let (kind, error) = match header.post_type.as_str() {
            "message" | "message_sent" => {
                let (event, error) = MessageEvent::resolve(&raw)?;
                (EventKind::Message(event), error)
            }
            "notice" => {
                let (event, error) = NoticeEvent::resolve(&raw)?;
                (EventKind::Notice(event), error)
            }
            "request" => {
                let (event, error) = RequestEvent::resolve(&raw)?;
                (EventKind::Request(event), error)
            }
            "meta_event" => {
                let (event, error) = MetaEvent::resolve(&raw)?;
                (EventKind::Meta(event), error)
            }
            other => (
                EventKind::Unknown,
                Some(EventError::UnknownEvent(other.to_owned())),
            ),
        };
        Ok(Self {
            time: header.time,
            self_id: header.self_id,
            post_type: header.post_type,
            kind,
            error,
            raw,
        })
    }

    pub fn category(&self) -> EventCategory {
        match &self.kind {
            EventKind::Message(_) if self.is_self_sent() => EventCategory::SentMessage,
            EventKind::Message(msg) => match msg.kind {
                MessageKind::Group(_) => EventCategory::GroupMessage,
                MessageKind::Private(_) => EventCategory::PrivateMessage,
                MessageKind::Unknown => EventCategory::OtherMessage,
            },
            EventKind::Notice(_) => EventCategory::Notice,
            EventKind::Request(_) => EventCategory::Request,
            EventKind::Meta(_) => EventCategory::Meta,
            EventKind::Unknown => EventCategory::Unknown,
        }
    }

    /// Whether this is the bot's own outgoing message echoed back.
    pub fn is_self_sent(&self) -> bool {
        self.post_type == "message_sent"
    }

    pub fn as_message(&self) -> Option<&MessageEvent> {
        match &self.kind {
            EventKind::Message(msg) => Some(msg),
            _ => None,
        }
    }

    /// The message event, if it was posted in a group.
    pub fn as_group_message(&self) -> Option<&MessageEvent> {
        self.as_message().filter(|msg| msg.as_group().is_some())
    }

    /// The message event, if it is a private chat.
    pub fn as_private_message(&self) -> Option<&MessageEvent> {
        self.as_message().filter(|msg| msg.as_private().is_some())
    }

    pub fn as_notice(&self) -> Option<&NoticeEvent> {
        match &self.kind {
            EventKind::Notice(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn as_request(&self) -> Option<&RequestEvent> {
        match &self.kind {
            EventKind::Request(request) => Some(request),
            _ => None,
        }
    }

    pub fn as_meta(&self) -> Option<&MetaEvent> {
        match &self.kind {
            EventKind::Meta(meta) => Some(meta),
            _ => None,
        }
    }

    /// Applies a quick operation (such as `{"reply": ..}` or
    /// `{"approve": true}`) to this event.
    pub async fn quick_operation(&self, api: &ApiClient, operation: Value) -> ApiResult<()> {
        api.handle_quick_operation(self.raw.clone(), operation)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qq::GroupId;

    #[test]
    fn test_parse_group_message() {
        let frame = br#"{
            "time": 1700000000,
            "self_id": 123,
            "post_type": "message",
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 9,
            "group_id": 42,
            "user_id": 10001,
            "message": "[CQ:at,qq=123] hi",
            "raw_message": "[CQ:at,qq=123] hi",
            "font": 0,
            "sender": {"user_id": 10001, "nickname": "neko"}
        }"#;
        let event = Event::from_slice(frame).unwrap();
        assert_eq!(event.self_id, UserId(123));
        assert_eq!(event.category(), EventCategory::GroupMessage);
        assert!(event.as_private_message().is_none());
        let msg = event.as_group_message().unwrap();
        assert_eq!(msg.group_id(), Some(GroupId(42)));
        assert_eq!(msg.message.mentioned_users(), vec![UserId(123)]);
    }

    #[test]
    fn test_message_sent_post_type() {
        let event = Event::from_slice(
            br#"{"post_type":"message_sent","message_type":"private","user_id":1,"message":[]}"#,
        )
        .unwrap();
        assert!(event.is_self_sent());
        assert_eq!(event.category(), EventCategory::SentMessage);
        assert!(event.as_private_message().is_some());
    }

    #[test]
    fn test_unknown_post_type() {
        let event = Event::from_slice(br#"{"time":1,"self_id":2,"post_type":"x"}"#).unwrap();
        assert_eq!(event.kind, EventKind::Unknown);
        assert_eq!(event.error, Some(EventError::UnknownEvent("x".into())));
        assert_eq!(event.category(), EventCategory::Unknown);
    }

    #[test]
    fn test_unknown_nested_keeps_ancestor() {
        let event =
            Event::from_slice(br#"{"post_type":"request","request_type":"x","flag":"f"}"#).unwrap();
        assert_eq!(event.as_request().map(|r| r.flag.as_str()), Some("f"));
        assert!(matches!(event.error, Some(EventError::UnknownRequestEvent(_))));
    }

    #[test]
    fn test_malformed_frames() {
        assert!(matches!(
            Event::from_slice(b"{not json"),
            Err(EventParseError::Json(_))
        ));
        assert!(matches!(
            Event::from_slice(b"[1,2]"),
            Err(EventParseError::NotAnObject)
        ));
        assert!(matches!(
            Event::from_slice(br#"{"post_type":"message","message_type":"private","user_id":"abc"}"#),
            Err(EventParseError::Json(_))
        ));
    }
}
