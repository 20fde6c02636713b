//! Request/response correlation.
//!
//! Every outbound call is tagged with a fresh numeric `echo`. The gateway
//! copies it into its response, which arrives on the same socket as events;
//! the runtime hands such frames to [`ChannelApiCaller::resolve_response`],
//! which routes them to the waiting future.
//!
//! ```text
//! call("get_status") ──▶ {"action":"get_status","params":{},"echo":"7"} ──▶ sink
//!        ▲                                                                   │
//!        └──── pending[7] ◀── resolve_response({"echo":"7","retcode":0,..}) ◀┘
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use super::registry::ActionRegistry;
use super::response::{ApiResponse, RawResponse};
use crate::error::{ApiError, ApiResult};

/// Default time to wait for a response.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_millis(30_000);

// =============================================================================
// ApiCaller trait
// =============================================================================

/// Issues actions against the gateway.
#[async_trait]
pub trait ApiCaller: Send + Sync {
    /// Calls an action and waits for its decoded response.
    ///
    /// # Errors
    /// [`ApiError::NotConnected`] if the sink is closed or the connection
    /// drops while waiting, [`ApiError::Timeout`] if no response arrives in
    /// time, [`ApiError::Api`] for a non-zero `retcode` and
    /// [`ApiError::Decode`] if `data` does not fit the registered type.
    async fn call(&self, action: &str, params: Value) -> ApiResult<ApiResponse>;

    /// Sends an action without waiting for a response.
    ///
    /// Send failures are logged, not returned.
    async fn call_no_response(&self, action: &str, params: Value) -> ApiResult<()>;

    /// The registry used to decode responses of this caller.
    fn registry(&self) -> &ActionRegistry;
}

// =============================================================================
// ChannelApiCaller
// =============================================================================

#[derive(Serialize)]
struct Request<'a> {
    action: &'a str,
    params: Value,
    echo: String,
}

/// [`ApiCaller`] writing request frames into an mpsc sink.
///
/// The transport drains the sink and writes each frame to the socket.
pub struct ChannelApiCaller {
    /// Outbound frames.
    sink: mpsc::Sender<Vec<u8>>,
    /// Pending calls: echo → response channel.
    pending: Mutex<HashMap<u64, oneshot::Sender<RawResponse>>>,
    /// Last echo handed out.
    echo_counter: AtomicU64,
    api_timeout: Duration,
    registry: ActionRegistry,
}

impl ChannelApiCaller {
    /// Creates a caller writing into `sink`, with the default timeout.
    pub fn new(sink: mpsc::Sender<Vec<u8>>) -> Self {
        Self::with_timeout(sink, DEFAULT_API_TIMEOUT)
    }

    /// Creates a caller with a custom response timeout.
    pub fn with_timeout(sink: mpsc::Sender<Vec<u8>>, api_timeout: Duration) -> Self {
        Self {
            sink,
            pending: Mutex::new(HashMap::new()),
            echo_counter: AtomicU64::new(0),
            api_timeout,
            registry: ActionRegistry::new(),
        }
    }

    /// Returns the number of calls still waiting for a response.
    pub fn pending_call_count(&self) -> usize {
        self.pending.lock().len()
    }

    fn next_echo(&self) -> u64 {
        self.echo_counter.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn encode(action: &str, params: Value, echo: u64) -> ApiResult<Vec<u8>> {
        let request = Request {
            action,
            params,
            echo: echo.to_string(),
        };
        Ok(serde_json::to_vec(&request)?)
    }

    /// Routes a response frame to its waiting call.
    ///
    /// A response whose echo matches no pending call (for example one that
    /// arrives after its call timed out) is logged and reported as
    /// [`ApiError::UnknownResponse`].
    pub fn resolve_response(&self, frame: Value) -> ApiResult<()> {
        let response = RawResponse::from_value(frame)?;
        let echo: u64 = response.echo.trim().parse().map_err(|_| {
            ApiError::InvalidEnvelope(format!("echo `{}` is not a call id", response.echo))
        })?;

        let Some(tx) = self.pending.lock().remove(&echo) else {
            warn!(echo = %echo, "Received API response for unknown echo (timed out?)");
            return Err(ApiError::UnknownResponse {
                echo: response.echo,
            });
        };
        trace!(echo = %echo, retcode = response.retcode, "Resolved API response");
        let _ = tx.send(response);
        Ok(())
    }

    /// Fails every pending call with [`ApiError::NotConnected`].
    pub fn on_disconnect(&self) {
        let mut pending = self.pending.lock();
        if !pending.is_empty() {
            debug!(
                count = pending.len(),
                "Clearing pending API calls due to disconnect"
            );
            pending.clear();
        }
    }

    fn finish(&self, action: &str, response: RawResponse) -> ApiResult<ApiResponse> {
        if response.retcode != 0 {
            return Err(ApiError::Api {
                retcode: response.retcode,
                message: response.error_message(),
            });
        }
        let RawResponse {
            status, echo, data, ..
        } = response;
        let data = self
            .registry
            .factory(action)
            .decode(data)
            .map_err(|source| ApiError::Decode {
                action: action.to_owned(),
                source,
            })?;
        Ok(ApiResponse {
            status,
            retcode: 0,
            echo,
            data,
        })
    }
}

#[async_trait]
impl ApiCaller for ChannelApiCaller {
    async fn call(&self, action: &str, params: Value) -> ApiResult<ApiResponse> {
        let echo = self.next_echo();
        let frame = Self::encode(action, params, echo)?;

        // Register before sending so a fast response is never missed.
        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(echo, tx);

        debug!(action = %action, echo = %echo, "Calling API");
        if self.sink.send(frame).await.is_err() {
            self.pending.lock().remove(&echo);
            return Err(ApiError::NotConnected);
        }

        match timeout(self.api_timeout, rx).await {
            Ok(Ok(response)) => self.finish(action, response),
            Ok(Err(_)) => Err(ApiError::NotConnected),
            Err(_) => {
                self.pending.lock().remove(&echo);
                warn!(action = %action, echo = %echo, "API call timed out");
                Err(ApiError::Timeout {
                    action: action.to_owned(),
                    echo: echo.to_string(),
                })
            }
        }
    }

    async fn call_no_response(&self, action: &str, params: Value) -> ApiResult<()> {
        let echo = self.next_echo();
        let frame = Self::encode(action, params, echo)?;

        debug!(action = %action, echo = %echo, "Calling API without response");
        if let Err(err) = self.sink.send(frame).await {
            warn!(action = %action, echo = %echo, error = %err, "Failed to send API request");
        }
        Ok(())
    }

    fn registry(&self) -> &ActionRegistry {
        &self.registry
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::api::response::{MessageIdData, Void};
    use crate::qq::MessageId;
    use serde_json::json;

    fn caller(timeout: Duration) -> (Arc<ChannelApiCaller>, mpsc::Receiver<Vec<u8>>) {
        let (tx, rx) = mpsc::channel(16);
        (Arc::new(ChannelApiCaller::with_timeout(tx, timeout)), rx)
    }

    async fn next_request(rx: &mut mpsc::Receiver<Vec<u8>>) -> Value {
        serde_json::from_slice(&rx.recv().await.unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let task = tokio::spawn({
            let caller = caller.clone();
            async move {
                caller
                    .call("send_private_msg", json!({"user_id": 1, "message": "hi"}))
                    .await
            }
        });

        let request = next_request(&mut rx).await;
        assert_eq!(request["action"], "send_private_msg");
        assert_eq!(request["echo"], "1");
        caller
            .resolve_response(json!({
                "status": "ok", "retcode": 0, "echo": "1", "data": {"message_id": 77}
            }))
            .unwrap();

        let response = task.await.unwrap().unwrap();
        assert_eq!(
            response.into_data::<MessageIdData>().unwrap().message_id,
            MessageId(77)
        );
        assert_eq!(caller.pending_call_count(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_calls_answered_out_of_order() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let tasks: Vec<_> = (0..20)
            .map(|n| {
                let caller = caller.clone();
                tokio::spawn(async move { caller.call("custom_action", json!({"n": n})).await })
            })
            .collect();

        let mut requests = Vec::new();
        for _ in 0..20 {
            requests.push(next_request(&mut rx).await);
        }
        requests.sort_by_key(|request| request["echo"].as_str().unwrap().parse::<u64>().unwrap());
        for request in requests.iter().rev() {
            caller
                .resolve_response(json!({
                    "status": "ok", "retcode": 0, "echo": request["echo"], "data": request["params"]
                }))
                .unwrap();
        }

        for (n, task) in tasks.into_iter().enumerate() {
            let response = task.await.unwrap().unwrap();
            assert_eq!(response.data::<Value>(), Some(&json!({"n": n})));
        }
        assert_eq!(caller.pending_call_count(), 0);
    }

    #[tokio::test]
    async fn test_echo_strictly_increasing() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        caller.call_no_response("clean_cache", Value::Null).await.unwrap();
        caller.call_no_response("clean_cache", Value::Null).await.unwrap();
        assert_eq!(next_request(&mut rx).await["echo"], "1");
        assert_eq!(next_request(&mut rx).await["echo"], "2");
        assert_eq!(caller.pending_call_count(), 0);
    }

    #[tokio::test]
    async fn test_nonzero_retcode() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let task = tokio::spawn({
            let caller = caller.clone();
            async move { caller.call("delete_msg", json!({"message_id": 1})).await }
        });
        let request = next_request(&mut rx).await;
        caller
            .resolve_response(json!({
                "status": "failed", "retcode": 1400, "echo": request["echo"], "message": "no such msg"
            }))
            .unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::Api { retcode: 1400, ref message } if message == "no such msg"));
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let task = tokio::spawn({
            let caller = caller.clone();
            async move { caller.call("get_group_info", json!({"group_id": 1})).await }
        });
        let request = next_request(&mut rx).await;
        caller
            .resolve_response(json!({
                "status": "ok", "retcode": 0, "echo": request["echo"], "data": {"group_id": "x"}
            }))
            .unwrap();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::Decode { ref action, .. } if action == "get_group_info"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_then_late_response() {
        let (caller, mut rx) = caller(Duration::from_millis(500));
        let err = caller.call("clean_cache", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout { ref echo, .. } if echo == "1"));
        assert_eq!(caller.pending_call_count(), 0);

        let request = next_request(&mut rx).await;
        let late = caller.resolve_response(json!({"retcode": 0, "echo": request["echo"]}));
        assert!(matches!(late, Err(ApiError::UnknownResponse { .. })));
    }

    #[tokio::test]
    async fn test_unknown_echo() {
        let (caller, _rx) = caller(DEFAULT_API_TIMEOUT);
        let err = caller
            .resolve_response(json!({"retcode": 0, "echo": "999"}))
            .unwrap_err();
        assert!(matches!(err, ApiError::UnknownResponse { ref echo } if echo == "999"));
        let err = caller
            .resolve_response(json!({"retcode": 0, "echo": "abc"}))
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidEnvelope(_)));
    }

    #[tokio::test]
    async fn test_disconnect_fails_waiters() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let task = tokio::spawn({
            let caller = caller.clone();
            async move { caller.call("get_status", Value::Null).await }
        });
        next_request(&mut rx).await;
        caller.on_disconnect();
        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, ApiError::NotConnected));
    }

    #[tokio::test]
    async fn test_closed_sink() {
        let (caller, rx) = caller(DEFAULT_API_TIMEOUT);
        drop(rx);
        let err = caller.call("get_status", Value::Null).await.unwrap_err();
        assert!(matches!(err, ApiError::NotConnected));
        assert_eq!(caller.pending_call_count(), 0);
        assert!(caller.call_no_response("clean_cache", Value::Null).await.is_ok());
    }

    #[tokio::test]
    async fn test_void_response() {
        let (caller, mut rx) = caller(DEFAULT_API_TIMEOUT);
        let task = tokio::spawn({
            let caller = caller.clone();
            async move { caller.call("clean_cache", Value::Null).await }
        });
        let request = next_request(&mut rx).await;
        caller
            .resolve_response(json!({"status": "ok", "retcode": 0, "echo": request["echo"], "data": null}))
            .unwrap();
        let response = task.await.unwrap().unwrap();
        assert!(response.data::<Void>().is_some());
    }
}
