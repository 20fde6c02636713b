//! Notice events (`post_type = "notice"`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventError;
use crate::qq::{GroupId, MessageId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NoticeEvent {
    #[serde(default)]
    pub notice_type: String,
    #[serde(default)]
    pub sub_type: String,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(skip)]
    pub kind: NoticeKind,
}

/// Concrete notice, keyed by `notice_type` and, for `notify`, `sub_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum NoticeKind {
    GroupUpload(GroupUpload),
    GroupAdmin(GroupNotice),
    GroupIncrease(GroupOperation),
    GroupDecrease(GroupOperation),
    GroupBan(GroupBan),
    GroupRecall(GroupRecall),
    FriendRecall(FriendRecall),
    FriendAdd,
    Poke(GroupNotify),
    LuckyKing(GroupNotify),
    Honor(GroupHonor),
    #[default]
    Unknown,
}

/// A notice scoped to a group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNotice {
    pub group_id: GroupId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadedFile {
    pub id: String,
    pub name: String,
    pub size: i64,
    pub busid: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupUpload {
    pub group_id: GroupId,
    pub file: UploadedFile,
}

/// Member joined or left; `operator_id` is whoever approved or kicked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupOperation {
    pub group_id: GroupId,
    pub operator_id: UserId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupBan {
    #[serde(flatten)]
    pub operation: GroupOperation,
    /// Seconds; 0 when the ban is lifted.
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRecall {
    #[serde(flatten)]
    pub operation: GroupOperation,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FriendRecall {
    pub message_id: MessageId,
}

/// `notify` notices aimed at a member: pokes and red packet luck.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupNotify {
    /// 0 for a poke in a private chat.
    pub group_id: GroupId,
    pub target_id: UserId,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HonorType {
    Talkative,
    Performer,
    Emotion,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupHonor {
    pub group_id: GroupId,
    pub honor_type: HonorType,
}

impl NoticeEvent {
    pub(crate) fn resolve(value: &Value) -> Result<(Self, Option<EventError>), serde_json::Error> {
        let mut event = Self::deserialize(value)?;
        let kind = match (event.notice_type.as_str(), event.sub_type.as_str()) {
            ("group_upload", _) => NoticeKind::GroupUpload(GroupUpload::deserialize(value)?),
            ("group_admin", _) => NoticeKind::GroupAdmin(GroupNotice::deserialize(value)?),
            ("group_increase", _) => {
                NoticeKind::GroupIncrease(GroupOperation::deserialize(value)?)
            }
            ("group_decrease", _) => {
                NoticeKind::GroupDecrease(GroupOperation::deserialize(value)?)
            }
            ("group_ban", _) => NoticeKind::GroupBan(GroupBan::deserialize(value)?),
            ("group_recall", _) => NoticeKind::GroupRecall(GroupRecall::deserialize(value)?),
            ("friend_recall", _) => NoticeKind::FriendRecall(FriendRecall::deserialize(value)?),
            ("friend_add", _) => NoticeKind::FriendAdd,
            ("notify", "poke") => NoticeKind::Poke(GroupNotify::deserialize(value)?),
            ("notify", "lucky_king") => NoticeKind::LuckyKing(GroupNotify::deserialize(value)?),
            ("notify", "honor") => NoticeKind::Honor(GroupHonor::deserialize(value)?),
            ("notify", sub_type) => {
                let error = EventError::UnknownNoticeEvent(format!("notify.{sub_type}"));
                return Ok((event, Some(error)));
            }
            (notice_type, _) => {
                let error = EventError::UnknownNoticeEvent(notice_type.to_owned());
                return Ok((event, Some(error)));
            }
        };
        event.kind = kind;
        Ok((event, None))
    }

    /// The group this notice belongs to, if any.
    pub fn group_id(&self) -> Option<GroupId> {
        match &self.kind {
            NoticeKind::GroupUpload(upload) => Some(upload.group_id),
            NoticeKind::GroupAdmin(notice) => Some(notice.group_id),
            NoticeKind::GroupIncrease(op) | NoticeKind::GroupDecrease(op) => Some(op.group_id),
            NoticeKind::GroupBan(ban) => Some(ban.operation.group_id),
            NoticeKind::GroupRecall(recall) => Some(recall.operation.group_id),
            NoticeKind::Poke(notify) | NoticeKind::LuckyKing(notify) => {
                Some(notify.group_id).filter(|id| id.get() != 0)
            }
            NoticeKind::Honor(honor) => Some(honor.group_id),
            NoticeKind::FriendRecall(_) | NoticeKind::FriendAdd | NoticeKind::Unknown => None,
        }
    }
}
