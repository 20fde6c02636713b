//! Message events (`post_type = "message"` / `"message_sent"`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult, EventError};
use crate::message::{Chain, Segment};
use crate::qq::{AnonymousData, GroupId, GroupUser, MessageId, User, UserId};

/// Fields shared by every message event, plus the variant selected by
/// `message_type`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageEvent {
    #[serde(default)]
    pub message_type: String,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub message_id: MessageId,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub message: Chain,
    #[serde(default)]
    pub raw_message: String,
    #[serde(default)]
    pub font: i32,
    #[serde(skip)]
    pub kind: MessageKind,
}

/// Concrete message event, keyed by `message_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MessageKind {
    Private(PrivateMessage),
    Group(GroupMessage),
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrivateMessage {
    #[serde(default)]
    pub sender: User,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupMessage {
    #[serde(default)]
    pub group_id: GroupId,
    /// Set when the message was sent anonymously.
    #[serde(default)]
    pub anonymous: Option<AnonymousData>,
    #[serde(default)]
    pub sender: GroupUser,
}

impl MessageEvent {
    pub(crate) fn resolve(value: &Value) -> Result<(Self, Option<EventError>), serde_json::Error> {
        let mut event = Self::deserialize(value)?;
        let mut error = None;
        event.kind = match event.message_type.as_str() {
            "private" => MessageKind::Private(PrivateMessage::deserialize(value)?),
            "group" => MessageKind::Group(GroupMessage::deserialize(value)?),
            other => {
                error = Some(EventError::UnknownMessageEvent(other.to_owned()));
                MessageKind::Unknown
            }
        };
        Ok((event, error))
    }

    pub fn as_private(&self) -> Option<&PrivateMessage> {
        match &self.kind {
            MessageKind::Private(private) => Some(private),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupMessage> {
        match &self.kind {
            MessageKind::Group(group) => Some(group),
            _ => None,
        }
    }

    /// The group the message was posted in, if any.
    pub fn group_id(&self) -> Option<GroupId> {
        self.as_group().map(|group| group.group_id)
    }

    /// Replies in the same conversation, optionally quoting this message.
    ///
    /// # Errors
    /// [`ApiError::Unsupported`] for an unrecognized message kind, otherwise
    /// whatever the send call returns.
    pub async fn reply(
        &self,
        api: &ApiClient,
        mut chain: Chain,
        quote: bool,
    ) -> ApiResult<MessageId> {
        if quote {
            chain.set_reply_to(self.message_id.get());
        }
        match &self.kind {
            MessageKind::Private(_) => api.send_private_msg(self.user_id, chain).await,
            MessageKind::Group(group) => api.send_group_msg(group.group_id, chain).await,
            MessageKind::Unknown => Err(ApiError::Unsupported("reply to an unknown message kind")),
        }
    }

    /// Replies with a CQ string. With `auto_escape` the text is sent
    /// literally and `quote` has no effect.
    pub async fn reply_string(
        &self,
        api: &ApiClient,
        text: &str,
        auto_escape: bool,
        quote: bool,
    ) -> ApiResult<MessageId> {
        let text = if quote && !auto_escape {
            format!("[CQ:reply,id={}]{text}", self.message_id)
        } else {
            text.to_owned()
        };
        match &self.kind {
            MessageKind::Private(_) => {
                api.send_private_msg_string(self.user_id, &text, auto_escape)
                    .await
            }
            MessageKind::Group(group) => {
                api.send_group_msg_string(group.group_id, &text, auto_escape)
                    .await
            }
            MessageKind::Unknown => Err(ApiError::Unsupported("reply to an unknown message kind")),
        }
    }

    /// Replies in a group, mentioning the sender.
    ///
    /// # Errors
    /// [`ApiError::Unsupported`] unless this is a group message.
    pub async fn reply_at(
        &self,
        api: &ApiClient,
        mut chain: Chain,
        quote: bool,
    ) -> ApiResult<MessageId> {
        let Some(group) = self.as_group() else {
            return Err(ApiError::Unsupported("reply_at outside a group"));
        };
        chain.prepend(Segment::at(group.sender.user.user.user_id.get()));
        if quote {
            chain.set_reply_to(self.message_id.get());
        }
        api.send_group_msg(group.group_id, chain).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_message() {
        let value = json!({
            "message_type": "group",
            "sub_type": "normal",
            "message_id": 7,
            "user_id": 10001,
            "group_id": 42,
            "message": [{"type": "text", "data": {"text": "/ping"}}],
            "raw_message": "/ping",
            "font": 0,
            "sender": {"user_id": 10001, "nickname": "neko", "role": "admin"}
        });
        let (event, error) = MessageEvent::resolve(&value).unwrap();
        assert!(error.is_none());
        assert_eq!(event.group_id(), Some(GroupId(42)));
        let group = event.as_group().unwrap();
        assert!(group.sender.role.is_admin());
        assert!(group.anonymous.is_none());
        assert_eq!(event.message.first_text(), Some("/ping"));
    }

    #[test]
    fn test_cq_string_message() {
        let value = json!({
            "message_type": "private",
            "user_id": 5,
            "message": "hi[CQ:face,id=1]",
            "sender": {"user_id": 5, "nickname": "a", "sex": "female", "age": 18}
        });
        let (event, _) = MessageEvent::resolve(&value).unwrap();
        assert_eq!(event.message.len(), 2);
        assert_eq!(event.as_private().unwrap().sender.age, 18);
    }

    #[test]
    fn test_unknown_kind() {
        let (event, error) =
            MessageEvent::resolve(&json!({"message_type": "guild", "user_id": 1})).unwrap();
        assert_eq!(event.kind, MessageKind::Unknown);
        assert_eq!(error, Some(EventError::UnknownMessageEvent("guild".into())));
    }
}
