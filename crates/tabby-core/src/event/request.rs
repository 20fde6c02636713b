//! Request events (`post_type = "request"`).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ApiClient;
use crate::error::{ApiError, ApiResult, EventError};
use crate::qq::{GroupId, UserId};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestEvent {
    #[serde(default)]
    pub request_type: String,
    #[serde(default)]
    pub user_id: UserId,
    #[serde(default)]
    pub comment: String,
    /// Token identifying the request when answering it.
    #[serde(default)]
    pub flag: String,
    #[serde(skip)]
    pub kind: RequestKind,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestKind {
    Friend,
    Group(GroupRequest),
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupRequest {
    /// `add` for a join request, `invite` for an invitation of the bot.
    pub sub_type: String,
    pub group_id: GroupId,
}

impl RequestEvent {
    pub(crate) fn resolve(value: &Value) -> Result<(Self, Option<EventError>), serde_json::Error> {
        let mut event = Self::deserialize(value)?;
        let mut error = None;
        event.kind = match event.request_type.as_str() {
            "friend" => RequestKind::Friend,
            "group" => RequestKind::Group(GroupRequest::deserialize(value)?),
            other => {
                error = Some(EventError::UnknownRequestEvent(other.to_owned()));
                RequestKind::Unknown
            }
        };
        Ok((event, error))
    }

    /// Accepts the request. `remark` only applies to friend requests.
    pub async fn approve(&self, api: &ApiClient, remark: &str) -> ApiResult<()> {
        match &self.kind {
            RequestKind::Friend => api.set_friend_add_request(&self.flag, true, remark).await,
            RequestKind::Group(group) => {
                api.set_group_add_request(&self.flag, &group.sub_type, true, "")
                    .await
            }
            RequestKind::Unknown => Err(ApiError::Unsupported("approve an unknown request")),
        }
    }

    /// Declines the request with a reason.
    pub async fn reject(&self, api: &ApiClient, reason: &str) -> ApiResult<()> {
        match &self.kind {
            RequestKind::Friend => api.set_friend_add_request(&self.flag, false, reason).await,
            RequestKind::Group(group) => {
                api.set_group_add_request(&self.flag, &group.sub_type, false, reason)
                    .await
            }
            RequestKind::Unknown => Err(ApiError::Unsupported("reject an unknown request")),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::api::ChannelApiCaller;

    #[test]
    fn test_group_request() {
        let (event, error) = RequestEvent::resolve(&json!({
            "request_type": "group",
            "sub_type": "invite",
            "group_id": 42,
            "user_id": 1,
            "comment": "join us",
            "flag": "f1"
        }))
        .unwrap();
        assert!(error.is_none());
        assert_eq!(
            event.kind,
            RequestKind::Group(GroupRequest {
                sub_type: "invite".into(),
                group_id: GroupId(42)
            })
        );
    }

    #[tokio::test]
    async fn test_friend_approve_params() {
        let (event, _) = RequestEvent::resolve(&json!({
            "request_type": "friend", "user_id": 1, "flag": "f2"
        }))
        .unwrap();
        let (tx, mut rx) = mpsc::channel(4);
        let caller = Arc::new(ChannelApiCaller::new(tx));
        let api = ApiClient::new(caller.clone());
        let task = tokio::spawn(async move { event.approve(&api, "pal").await });

        let request: Value = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(request["action"], "set_friend_add_request");
        assert_eq!(
            request["params"],
            json!({"flag": "f2", "approve": true, "remark": "pal"})
        );
        caller
            .resolve_response(json!({"status": "ok", "retcode": 0, "echo": request["echo"]}))
            .unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_unknown_request_unsupported() {
        let (event, error) = RequestEvent::resolve(&json!({"request_type": "x"})).unwrap();
        assert!(error.is_some());
        let (tx, _rx) = mpsc::channel(1);
        let api = ApiClient::new(Arc::new(ChannelApiCaller::new(tx)));
        assert!(matches!(
            event.reject(&api, "").await,
            Err(ApiError::Unsupported(_))
        ));
    }
}
