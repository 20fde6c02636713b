use std::any::Any;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tabby_core::{ApiClient, ApiError, ApiResult, Extension, ResponseFactory};
use tracing::trace;

use crate::action;
use crate::model::{DownloadRequest, DownloadedFile, FileInfo, GroupSystemMessages};

pub const EXTENSION_NAME: &str = "napcat";

/// The NapCat actions and their response types, for
/// [`ApiClient::register_extension`].
pub fn extension() -> Extension {
    Extension::new(EXTENSION_NAME)
        .with_action(action::SET_QQ_AVATAR, ResponseFactory::of::<Value>())
        .with_action(
            action::GET_GROUP_SYSTEM_MSG,
            ResponseFactory::of::<GroupSystemMessages>(),
        )
        .with_action(action::GET_FILE, ResponseFactory::of::<FileInfo>())
        .with_action(action::DOWNLOAD_FILE, ResponseFactory::of::<DownloadedFile>())
}

/// NapCat actions on [`ApiClient`].
///
/// Works whether or not [`extension()`] is registered; registering it lets
/// the caller decode responses before they reach the handler.
#[async_trait]
pub trait NapcatApi {
    /// Sets the bot's avatar from a path, URL or `base64://` string.
    async fn set_qq_avatar(&self, file: &str) -> ApiResult<()>;

    async fn get_group_system_msg(&self) -> ApiResult<GroupSystemMessages>;

    async fn get_file(&self, file_id: &str) -> ApiResult<FileInfo>;

    /// Makes the gateway download a file into its cache.
    async fn download_file(&self, request: &DownloadRequest) -> ApiResult<DownloadedFile>;
}

#[async_trait]
impl NapcatApi for ApiClient {
    async fn set_qq_avatar(&self, file: &str) -> ApiResult<()> {
        self.call(action::SET_QQ_AVATAR, json!({ "file": file }))
            .await
            .map(|_| ())
    }

    async fn get_group_system_msg(&self) -> ApiResult<GroupSystemMessages> {
        call_typed(self, action::GET_GROUP_SYSTEM_MSG, Value::Null).await
    }

    async fn get_file(&self, file_id: &str) -> ApiResult<FileInfo> {
        call_typed(self, action::GET_FILE, json!({ "file_id": file_id })).await
    }

    async fn download_file(&self, request: &DownloadRequest) -> ApiResult<DownloadedFile> {
        let params = serde_json::to_value(request)?;
        call_typed(self, action::DOWNLOAD_FILE, params).await
    }
}

/// Calls `action` and takes the payload as `T`, decoding it here when the
/// caller left it as raw JSON.
async fn call_typed<T>(api: &ApiClient, action: &str, params: Value) -> ApiResult<T>
where
    T: DeserializeOwned + Any,
{
    let response = api.call(action, params).await?;
    if let Some(raw) = response.data::<Value>() {
        trace!(action = %action, "Decoding unregistered NapCat response");
        return serde_json::from_value(raw.clone()).map_err(|source| ApiError::Decode {
            action: action.to_owned(),
            source,
        });
    }
    response.into_data()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tabby_core::{ApiCaller, ChannelApiCaller};
    use tokio::sync::mpsc;

    use super::*;

    fn client() -> (ApiClient, Arc<ChannelApiCaller>, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(4);
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

    #[test]
    fn test_extension_registration() {
        let (api, caller, _rx) = client();
        api.register_extension(extension()).unwrap();
        assert_eq!(
            caller.registry().owner(action::GET_FILE).as_deref(),
            Some(EXTENSION_NAME)
        );
        assert!(api.register_extension(extension()).is_err());
    }

    #[tokio::test]
    async fn test_get_file_registered() {
        let (api, caller, mut rx) = client();
        api.register_extension(extension()).unwrap();
        let task = tokio::spawn(async move { api.get_file("abc").await });
        let request = answer(
            &caller,
            &mut rx,
            json!({"file": "/cache/abc", "file_size": 3, "file_name": "abc.txt"}),
        )
        .await;
        assert_eq!(request["action"], "get_file");
        assert_eq!(request["params"], json!({"file_id": "abc"}));
        let info = task.await.unwrap().unwrap();
        assert_eq!(info.file_name, "abc.txt");
        assert_eq!(info.file_size, 3);
    }

    #[tokio::test]
    async fn test_system_msg_unregistered() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move { api.get_group_system_msg().await });
        answer(
            &caller,
            &mut rx,
            json!({"InvitedRequest": [], "join_requests": [{"request_id": 1, "group_id": 5}]}),
        )
        .await;
        let messages = task.await.unwrap().unwrap();
        assert!(messages.invited_requests.is_empty());
        assert_eq!(messages.join_requests[0].group_id, tabby_core::GroupId(5));
    }

    #[tokio::test]
    async fn test_download_and_avatar() {
        let (api, caller, mut rx) = client();
        let task = tokio::spawn(async move {
            api.set_qq_avatar("base64://AAAA").await?;
            api.download_file(&DownloadRequest::url("https://x/y").thread_count(2))
                .await
        });
        let request = answer(&caller, &mut rx, Value::Null).await;
        assert_eq!(request["params"], json!({"file": "base64://AAAA"}));
        let request = answer(&caller, &mut rx, json!({"file": "/cache/y"})).await;
        assert_eq!(
            request["params"],
            json!({"url": "https://x/y", "thread_count": 2})
        );
        assert_eq!(task.await.unwrap().unwrap().file, "/cache/y");
    }
}
