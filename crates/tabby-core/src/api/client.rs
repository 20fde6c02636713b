//! Typed API surface.
//!
//! [`ApiClient`] is a cheap, cloneable handle over an [`ApiCaller`] with one
//! async method per built-in action.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tabby_core::{ApiClient, Chain};
//!
//! async fn greet(api: &ApiClient) -> tabby_core::ApiResult<()> {
//!     let id = api
//!         .send_private_msg(10001.into(), Chain::new().text("Hello!"))
//!         .await?;
//!     api.delete_msg_no_response(id).await
//! }
//! ```

use std::any::Any;
use std::sync::Arc;

use serde_json::{Value, json};

use super::action;
use super::caller::ApiCaller;
use super::registry::Extension;
use super::response::{
    ApiResponse, Cookies, Credentials, CsrfToken, FilePath, FriendList, GroupHonorInfo, GroupInfo,
    GroupList, GroupMemberInfo, GroupMemberList, LoginInfo, MessageData, MessageIdData,
    MessageOnlyData, ServerStatus, StrangerInfo, VersionInfo, Void, YesOrNo,
};
use crate::error::{ApiResult, RegistryError};
use crate::message::Chain;
use crate::qq::{AnonymousData, GroupId, MessageId, UserId};

/// Destination of a [`send_msg`](ApiClient::send_msg) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageTarget {
    Private(UserId),
    Group(GroupId),
}

impl MessageTarget {
    fn params(self, message: Value, auto_escape: bool) -> Value {
        let mut params = match self {
            MessageTarget::Private(user_id) => {
                json!({ "message_type": "private", "user_id": user_id })
            }
            MessageTarget::Group(group_id) => {
                json!({ "message_type": "group", "group_id": group_id })
            }
        };
        params["message"] = message;
        if auto_escape {
            params["auto_escape"] = Value::Bool(true);
        }
        params
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Typed handle for calling gateway actions.
#[derive(Clone)]
pub struct ApiClient {
    caller: Arc<dyn ApiCaller>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient").finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Wraps a caller.
    pub fn new(caller: Arc<dyn ApiCaller>) -> Self {
        Self { caller }
    }

    /// Calls any action and returns the raw decoded response.
    pub async fn call(&self, action: &str, params: Value) -> ApiResult<ApiResponse> {
        self.caller.call(action, params).await
    }

    /// Calls any action and takes its payload as `T`.
    pub async fn call_as<T: Any>(&self, action: &str, params: Value) -> ApiResult<T> {
        self.call(action, params).await?.into_data()
    }

    /// Sends any action without waiting for a response.
    pub async fn call_no_response(&self, action: &str, params: Value) -> ApiResult<()> {
        self.caller.call_no_response(action, params).await
    }

    /// Registers extra actions for this client's caller.
    pub fn register_extension(&self, extension: Extension) -> Result<(), RegistryError> {
        self.caller.registry().register_extension(extension)
    }

    async fn call_void(&self, action: &str, params: Value) -> ApiResult<()> {
        self.call_as::<Void>(action, params).await.map(|_| ())
    }

    async fn call_message_id(&self, action: &str, params: Value) -> ApiResult<MessageId> {
        self.call_as::<MessageIdData>(action, params)
            .await
            .map(|data| data.message_id)
    }
}

macro_rules! impl_api {
    // No return value
    ($(#[$meta:meta])* $name:ident => $action:expr, ($($arg:ident: $typ:ty),*) $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<()> {
            self.call_void($action, json!({ $(stringify!($arg): $arg),* })).await
        }
    };
    // Returns the registered response type
    ($(#[$meta:meta])* $name:ident => $action:expr, ($($arg:ident: $typ:ty),*) -> $ret:ty $(,)?) => {
        $(#[$meta])*
        pub async fn $name(&self, $($arg: $typ),*) -> ApiResult<$ret> {
            self.call_as::<$ret>($action, json!({ $(stringify!($arg): $arg),* })).await
        }
    };
}

// =========================================================================
// Message APIs
// =========================================================================

impl ApiClient {
    /// Sends a private message.
    pub async fn send_private_msg(&self, user_id: UserId, message: Chain) -> ApiResult<MessageId> {
        self.call_message_id(
            action::SEND_PRIVATE_MSG,
            json!({ "user_id": user_id, "message": message }),
        )
        .await
    }

    /// Sends a private message given as a CQ string, or as literal text when
    /// `auto_escape` is set.
    pub async fn send_private_msg_string(
        &self,
        user_id: UserId,
        message: &str,
        auto_escape: bool,
    ) -> ApiResult<MessageId> {
        self.call_message_id(
            action::SEND_PRIVATE_MSG,
            json!({ "user_id": user_id, "message": message, "auto_escape": auto_escape }),
        )
        .await
    }

    /// Sends a group message.
    pub async fn send_group_msg(&self, group_id: GroupId, message: Chain) -> ApiResult<MessageId> {
        self.call_message_id(
            action::SEND_GROUP_MSG,
            json!({ "group_id": group_id, "message": message }),
        )
        .await
    }

    /// Sends a group message given as a CQ string, or as literal text when
    /// `auto_escape` is set.
    pub async fn send_group_msg_string(
        &self,
        group_id: GroupId,
        message: &str,
        auto_escape: bool,
    ) -> ApiResult<MessageId> {
        self.call_message_id(
            action::SEND_GROUP_MSG,
            json!({ "group_id": group_id, "message": message, "auto_escape": auto_escape }),
        )
        .await
    }

    /// Sends a message to either a user or a group.
    pub async fn send_msg(&self, target: MessageTarget, message: Chain) -> ApiResult<MessageId> {
        let params = target.params(serde_json::to_value(message)?, false);
        self.call_message_id(action::SEND_MSG, params).await
    }

    /// String variant of [`send_msg`](Self::send_msg).
    pub async fn send_msg_string(
        &self,
        target: MessageTarget,
        message: &str,
        auto_escape: bool,
    ) -> ApiResult<MessageId> {
        let params = target.params(Value::String(message.to_owned()), auto_escape);
        self.call_message_id(action::SEND_MSG, params).await
    }

    impl_api!(
        /// Recalls a message.
        delete_msg => action::DELETE_MSG,
        (message_id: MessageId)
    );

    /// Recalls a message without waiting for the result.
    pub async fn delete_msg_no_response(&self, message_id: MessageId) -> ApiResult<()> {
        self.call_no_response(action::DELETE_MSG, json!({ "message_id": message_id }))
            .await
    }

    impl_api!(
        /// Fetches a message by id.
        get_msg => action::GET_MSG,
        (message_id: MessageId) -> MessageData
    );

    /// Fetches the content of a merged forward message.
    pub async fn get_forward_msg(&self, id: &str) -> ApiResult<Chain> {
        self.call_as::<MessageOnlyData>(action::GET_FORWARD_MSG, json!({ "id": id }))
            .await
            .map(|data| data.message)
    }

    impl_api!(
        /// Sends profile likes.
        send_like => action::SEND_LIKE,
        (user_id: UserId, times: u32)
    );

    /// Sends profile likes without waiting for the result.
    pub async fn send_like_no_response(&self, user_id: UserId, times: u32) -> ApiResult<()> {
        self.call_no_response(action::SEND_LIKE, json!({ "user_id": user_id, "times": times }))
            .await
    }
}

// =========================================================================
// Group Management APIs
// =========================================================================

impl ApiClient {
    impl_api!(
        /// Kicks a member from a group.
        set_group_kick => action::SET_GROUP_KICK,
        (group_id: GroupId, user_id: UserId, reject_add_request: bool)
    );

    /// Kicks a member without waiting for the result.
    pub async fn set_group_kick_no_response(
        &self,
        group_id: GroupId,
        user_id: UserId,
        reject_add_request: bool,
    ) -> ApiResult<()> {
        self.call_no_response(
            action::SET_GROUP_KICK,
            json!({ "group_id": group_id, "user_id": user_id, "reject_add_request": reject_add_request }),
        )
        .await
    }

    impl_api!(
        /// Mutes a member for `duration` seconds; 0 lifts the mute.
        set_group_ban => action::SET_GROUP_BAN,
        (group_id: GroupId, user_id: UserId, duration: u32)
    );

    impl_api!(
        /// Mutes an anonymous sender.
        set_group_anonymous_ban => action::SET_GROUP_ANONYMOUS_BAN,
        (group_id: GroupId, anonymous: &AnonymousData, duration: u32)
    );

    impl_api!(
        /// Mutes or unmutes the whole group.
        set_group_whole_ban => action::SET_GROUP_WHOLE_BAN,
        (group_id: GroupId, enable: bool)
    );

    impl_api!(
        /// Grants or revokes admin.
        set_group_admin => action::SET_GROUP_ADMIN,
        (group_id: GroupId, user_id: UserId, enable: bool)
    );

    impl_api!(
        /// Allows or forbids anonymous chat.
        set_group_anonymous => action::SET_GROUP_ANONYMOUS,
        (group_id: GroupId, enable: bool)
    );

    /// Allows or forbids anonymous chat without waiting for the result.
    pub async fn set_group_anonymous_no_response(
        &self,
        group_id: GroupId,
        enable: bool,
    ) -> ApiResult<()> {
        self.call_no_response(
            action::SET_GROUP_ANONYMOUS,
            json!({ "group_id": group_id, "enable": enable }),
        )
        .await
    }

    impl_api!(
        /// Sets a member's group card.
        set_group_card => action::SET_GROUP_CARD,
        (group_id: GroupId, user_id: UserId, card: &str)
    );

    impl_api!(
        /// Renames a group.
        set_group_name => action::SET_GROUP_NAME,
        (group_id: GroupId, group_name: &str)
    );

    impl_api!(
        /// Leaves, or as owner dismisses, a group.
        set_group_leave => action::SET_GROUP_LEAVE,
        (group_id: GroupId, is_dismiss: bool)
    );

    impl_api!(
        /// Sets a member's special title; `duration` in seconds, -1 for permanent.
        set_group_special_title => action::SET_GROUP_SPECIAL_TITLE,
        (group_id: GroupId, user_id: UserId, special_title: &str, duration: i64)
    );

    // =========================================================================
    // Request APIs
    // =========================================================================

    impl_api!(
        /// Answers a friend request.
        set_friend_add_request => action::SET_FRIEND_ADD_REQUEST,
        (flag: &str, approve: bool, remark: &str)
    );

    impl_api!(
        /// Answers a group join request or invitation.
        set_group_add_request => action::SET_GROUP_ADD_REQUEST,
        (flag: &str, sub_type: &str, approve: bool, reason: &str)
    );
}

// =========================================================================
// Information APIs
// =========================================================================

impl ApiClient {
    impl_api!(
        /// Gets the bot account.
        get_login_info => action::GET_LOGIN_INFO,
        () -> LoginInfo
    );

    impl_api!(
        get_stranger_info => action::GET_STRANGER_INFO,
        (user_id: UserId, no_cache: bool) -> StrangerInfo
    );

    impl_api!(
        get_friend_list => action::GET_FRIEND_LIST,
        () -> FriendList
    );

    impl_api!(
        get_group_info => action::GET_GROUP_INFO,
        (group_id: GroupId, no_cache: bool) -> GroupInfo
    );

    impl_api!(
        get_group_list => action::GET_GROUP_LIST,
        () -> GroupList
    );

    impl_api!(
        get_group_member_info => action::GET_GROUP_MEMBER_INFO,
        (group_id: GroupId, user_id: UserId, no_cache: bool) -> GroupMemberInfo
    );

    impl_api!(
        get_group_member_list => action::GET_GROUP_MEMBER_LIST,
        (group_id: GroupId) -> GroupMemberList
    );

    /// Gets group honors. `honor_type` is `talkative`, `performer`, `legend`,
    /// `strong_newbie`, `emotion` or `all`.
    pub async fn get_group_honor_info(
        &self,
        group_id: GroupId,
        honor_type: &str,
    ) -> ApiResult<GroupHonorInfo> {
        self.call_as(
            action::GET_GROUP_HONOR_INFO,
            json!({ "group_id": group_id, "type": honor_type }),
        )
        .await
    }

    // =========================================================================
    // Credential APIs
    // =========================================================================

    impl_api!(
        get_cookies => action::GET_COOKIES,
        (domain: &str) -> Cookies
    );

    impl_api!(
        get_csrf_token => action::GET_CSRF_TOKEN,
        () -> CsrfToken
    );

    impl_api!(
        get_credentials => action::GET_CREDENTIALS,
        (domain: &str) -> Credentials
    );

    // =========================================================================
    // File APIs
    // =========================================================================

    impl_api!(
        /// Downloads a received voice record, converted to `out_format`.
        get_record => action::GET_RECORD,
        (file: &str, out_format: &str) -> FilePath
    );

    impl_api!(
        /// Downloads a received image.
        get_image => action::GET_IMAGE,
        (file: &str) -> FilePath
    );

    impl_api!(
        can_send_image => action::CAN_SEND_IMAGE,
        () -> YesOrNo
    );

    impl_api!(
        can_send_record => action::CAN_SEND_RECORD,
        () -> YesOrNo
    );

    // =========================================================================
    // System APIs
    // =========================================================================

    impl_api!(
        get_status => action::GET_STATUS,
        () -> ServerStatus
    );

    impl_api!(
        get_version_info => action::GET_VERSION_INFO,
        () -> VersionInfo
    );

    impl_api!(
        /// Restarts the gateway after `delay` milliseconds.
        set_restart => action::SET_RESTART,
        (delay: u32)
    );

    impl_api!(
        clean_cache => action::CLEAN_CACHE,
        ()
    );

    impl_api!(
        /// Applies a quick operation to the event in `context`.
        handle_quick_operation => action::HANDLE_QUICK_OPERATION,
        (context: Value, operation: Value)
    );
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc;

    use super::*;
    use crate::api::ChannelApiCaller;
    use crate::error::ApiError;

    fn client() -> (ApiClient, Arc<ChannelApiCaller>, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(16);
        let caller = Arc::new(ChannelApiCaller::new(tx));
        (ApiClient::new(caller.clone()), caller, rx)
    }

    async fn answer(
        caller: &ChannelApiCaller,
        rx: &mut mpsc::Receiver<Vec<u8>>,
        data: Value,
    ) -> Value {
        let request: Value = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        caller
            .resolve_response(json!({"status": "ok", "retcode": 0, "echo": request["echo"], "data": data}))
            .unwrap();
        request
    }

    #[tokio::test]
    async fn test_send_group_msg() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move {
            api.send_group_msg(GroupId(42), Chain::new().text("hi")).await
        });
        let request = answer(&caller, &mut rx, json!({"message_id": 5})).await;
        assert_eq!(request["action"], "send_group_msg");
        assert_eq!(
            request["params"],
            json!({"group_id": 42, "message": [{"type": "text", "data": {"text": "hi"}}]})
        );
        assert_eq!(task.await.unwrap().unwrap(), MessageId(5));
    }

    #[tokio::test]
    async fn test_send_msg_target() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move {
            api.send_msg_string(MessageTarget::Private(UserId(7)), "[x]", true)
                .await
        });
        let request = answer(&caller, &mut rx, json!({"message_id": 1})).await;
        assert_eq!(
            request["params"],
            json!({"message_type": "private", "user_id": 7, "message": "[x]", "auto_escape": true})
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_void_action_params() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move {
            api.set_group_add_request("flag-1", "add", false, "no").await
        });
        let request = answer(&caller, &mut rx, Value::Null).await;
        assert_eq!(
            request["params"],
            json!({"flag": "flag-1", "sub_type": "add", "approve": false, "reason": "no"})
        );
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_call_as_wrong_type() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move { api.call_as::<YesOrNo>("get_status", Value::Null).await });
        answer(&caller, &mut rx, json!({"online": true, "good": true})).await;
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::TypeMismatch { .. }));
    }

    #[tokio::test]
    async fn test_fire_and_forget() {
        let (api, _caller, mut rx) = client();
        api.delete_msg_no_response(MessageId(3)).await.unwrap();
        let request: Value = serde_json::from_slice(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(request["params"], json!({"message_id": 3}));
    }
}
