//! Response envelopes and payload types.
//!
//! Every inbound frame carrying `echo` is an [`ApiResponse`]. Its `data`
//! field is decoded into the type registered for the action and stored as a
//! type-erased [`Payload`]; typed access goes through
//! [`ApiResponse::data`] and [`ApiResponse::into_data`].

use std::any::{Any, type_name};
use std::fmt;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{ApiError, ApiResult};
use crate::message::Chain;
use crate::message::de as lenient;
use crate::qq::{
    BasicFriend, BasicUser, BasicUserWithAvatar, DetailedGroupUser, Friend, Group, GroupUser,
    MessageId, User,
};

// ============================================================================
// Payload
// ============================================================================

/// A decoded response payload of any registered type.
pub struct Payload {
    value: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Payload {
    /// Wraps a decoded value.
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Type name of the stored value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrows the value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Takes the value out if it is a `T`.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let type_name = self.type_name;
        self.value
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|value| Self { value, type_name })
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Envelope
// ============================================================================

/// A successful, decoded action response.
#[derive(Debug)]
pub struct ApiResponse {
    /// `ok` or `async`.
    pub status: String,
    /// Always 0 for a successful response.
    pub retcode: i64,
    /// The correlation token of the call.
    pub echo: String,
    /// The decoded `data` field.
    pub data: Payload,
}

impl ApiResponse {
    /// Borrows the payload as `T`, or `None` if it holds another type.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// Takes the payload as `T`.
    pub fn into_data<T: Any>(self) -> ApiResult<T> {
        self.data.downcast::<T>().map_err(|payload| ApiError::TypeMismatch {
            actual: payload.type_name(),
            requested: type_name::<T>(),
        })
    }
}

/// The response envelope as it arrives, before `data` is decoded.
#[derive(Debug, Clone, Deserialize)]
pub struct RawResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub retcode: i64,
    #[serde(deserialize_with = "lenient::string")]
    pub echo: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub wording: Option<String>,
}

impl RawResponse {
    /// Reads an envelope out of an already parsed frame.
    pub fn from_value(frame: Value) -> ApiResult<Self> {
        serde_json::from_value(frame).map_err(|err| ApiError::InvalidEnvelope(err.to_string()))
    }

    /// The error text the gateway attached, if any.
    pub fn error_message(&self) -> String {
        self.message
            .iter()
            .chain(self.wording.iter())
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_default()
    }
}

// ============================================================================
// Response Data Types
// ============================================================================

/// Data of actions that return nothing. Whatever the gateway puts in `data`
/// is ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Void;

impl<'de> Deserialize<'de> for Void {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        IgnoredAny::deserialize(deserializer)?;
        Ok(Void)
    }
}

/// `send_*_msg` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageIdData {
    #[serde(deserialize_with = "lenient::number")]
    pub message_id: MessageId,
}

/// `get_forward_msg` response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageOnlyData {
    #[serde(default)]
    pub message: Chain,
}

/// Sender of a fetched message; its shape depends on `message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageSender {
    Private(Friend),
    Group(GroupUser),
    Other(BasicUser),
}

impl MessageSender {
    /// The basic identity shared by every sender shape.
    pub fn user(&self) -> &BasicUser {
        match self {
            MessageSender::Private(friend) => &friend.friend.user,
            MessageSender::Group(member) => &member.user.user,
            MessageSender::Other(user) => user,
        }
    }
}

#[derive(Deserialize)]
struct RawMessageData {
    #[serde(default)]
    message_id: MessageId,
    #[serde(default)]
    real_id: i64,
    #[serde(default)]
    time: i64,
    #[serde(default)]
    message_type: String,
    #[serde(default)]
    message: Chain,
    #[serde(default)]
    sender: Value,
}

/// `get_msg` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawMessageData")]
pub struct MessageData {
    pub message_id: MessageId,
    pub real_id: i64,
    pub time: i64,
    pub message_type: String,
    pub message: Chain,
    pub sender: MessageSender,
}

impl TryFrom<RawMessageData> for MessageData {
    type Error = serde_json::Error;

    fn try_from(raw: RawMessageData) -> Result<Self, Self::Error> {
        let sender = match raw.message_type.as_str() {
            "private" => MessageSender::Private(serde_json::from_value(raw.sender)?),
            "group" => MessageSender::Group(serde_json::from_value(raw.sender)?),
            _ => MessageSender::Other(serde_json::from_value(raw.sender)?),
        };
        Ok(Self {
            message_id: raw.message_id,
            real_id: raw.real_id,
            time: raw.time,
            message_type: raw.message_type,
            message: raw.message,
            sender,
        })
    }
}

pub type LoginInfo = BasicUser;
pub type StrangerInfo = User;
pub type FriendList = Vec<BasicFriend>;
pub type GroupInfo = Group;
pub type GroupList = Vec<Group>;
pub type GroupMemberInfo = DetailedGroupUser;
pub type GroupMemberList = Vec<DetailedGroupUser>;

/// Current holder of the talkative honor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurrentTalkative {
    #[serde(flatten)]
    pub user: BasicUserWithAvatar,
    pub day_count: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HonorListEntry {
    #[serde(flatten)]
    pub user: BasicUserWithAvatar,
    pub description: String,
}

/// `get_group_honor_info` response. Lists not requested are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupHonorInfo {
    pub group_id: i64,
    pub current_talkative: Option<CurrentTalkative>,
    pub talkative_list: Vec<HonorListEntry>,
    pub performer_list: Vec<HonorListEntry>,
    pub legend_list: Vec<HonorListEntry>,
    pub strong_newbie_list: Vec<HonorListEntry>,
    pub emotion_list: Vec<HonorListEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Cookies {
    pub cookies: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsrfToken {
    #[serde(alias = "csrf_token")]
    pub token: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub cookies: String,
    #[serde(alias = "token")]
    pub csrf_token: i64,
}

/// `get_record` / `get_image` response: a local path to the file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePath {
    pub file: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct YesOrNo {
    pub yes: bool,
}

/// Gateway health, returned by `get_status` and carried by heartbeats.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerStatus {
    pub online: bool,
    pub good: bool,
    /// Implementation-specific statistics.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionInfo {
    pub app_name: String,
    pub app_version: String,
    pub protocol_version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_downcast() {
        let payload = Payload::new(MessageIdData {
            message_id: MessageId(5),
        });
        assert!(payload.downcast_ref::<Void>().is_none());
        assert_eq!(
            payload.downcast_ref::<MessageIdData>().map(|d| d.message_id),
            Some(MessageId(5))
        );
        let payload = payload.downcast::<Value>().unwrap_err();
        assert!(payload.downcast::<MessageIdData>().is_ok());
    }

    #[test]
    fn test_into_data_type_mismatch() {
        let response = ApiResponse {
            status: "ok".into(),
            retcode: 0,
            echo: "1".into(),
            data: Payload::new(Void),
        };
        assert_eq!(response.data::<Void>(), Some(&Void));
        let err = response.into_data::<YesOrNo>().unwrap_err();
        assert!(matches!(err, ApiError::TypeMismatch { .. }));
    }

    #[test]
    fn test_raw_response_numeric_echo() {
        let raw = RawResponse::from_value(json!({
            "status": "failed", "retcode": 1400, "echo": 12, "data": null, "wording": "bad"
        }))
        .unwrap();
        assert_eq!(raw.echo, "12");
        assert_eq!(raw.error_message(), "bad");
        assert!(RawResponse::from_value(json!({"status": "ok"})).is_err());
    }

    #[test]
    fn test_void_ignores_data() {
        assert_eq!(serde_json::from_value::<Void>(json!({"x": 1})).unwrap(), Void);
        assert_eq!(serde_json::from_value::<Void>(Value::Null).unwrap(), Void);
    }

    #[test]
    fn test_message_data_sender_shape() {
        let data: MessageData = serde_json::from_value(json!({
            "message_id": 1,
            "real_id": 2,
            "time": 3,
            "message_type": "group",
            "message": "hi[CQ:face,id=1]",
            "sender": {"user_id": 10001, "nickname": "neko", "card": "cat", "role": "owner"}
        }))
        .unwrap();
        assert_eq!(data.message.len(), 2);
        let MessageSender::Group(member) = &data.sender else {
            panic!("expected group sender");
        };
        assert_eq!(member.display_name(), "cat");
        assert_eq!(data.sender.user().nickname, "neko");
    }
}
