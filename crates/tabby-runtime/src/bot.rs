//! The bot: one gateway connection's API client, dispatcher and receive loop.
//!
//! The transport is not part of the bot. It hands inbound frames over an
//! `mpsc` channel and drains outbound frames from another:
//!
//! ```text
//!             inbound Vec<u8>                      outbound Vec<u8>
//! transport ───────────────▶ receive loop          caller ─────────────▶ transport
//!                              │  echo present ──▶ ChannelApiCaller::resolve_response
//!                              │  otherwise
//!                              ▼
//!                      Event::from_value ──▶ dispatch worker ──▶ Dispatcher
//! ```
//!
//! The receive loop never awaits a handler, so a handler waiting on an API
//! call cannot hold up the response it waits for.
//!
//! ```rust,ignore
//! let (out_tx, out_rx) = mpsc::channel(64);
//! let (in_tx, in_rx) = mpsc::channel(64);
//! let mut bot = Bot::new(config.bot, out_tx);
//! bot.dispatcher_mut().on_group_message(echo);
//! // ... connect the transport to `out_rx` / `in_tx` ...
//! bot.run(in_rx).await?;
//! ```

use std::sync::Arc;

use serde_json::Value;
use tabby_core::{ApiClient, ApiError, ChannelApiCaller, Event, Extension, UserId};
use tabby_framework::Dispatcher;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::BotConfig;
use crate::error::{RuntimeError, RuntimeResult};

/// A bot bound to one gateway connection.
pub struct Bot {
    config: BotConfig,
    caller: Arc<ChannelApiCaller>,
    api: ApiClient,
    dispatcher: Dispatcher,
    shutdown: CancellationToken,
}

impl Bot {
    /// Creates a bot whose API calls are written to `outbound`.
    pub fn new(config: BotConfig, outbound: mpsc::Sender<Vec<u8>>) -> Self {
        let caller = Arc::new(ChannelApiCaller::with_timeout(
            outbound,
            config.api_timeout(),
        ));
        let api = ApiClient::new(caller.clone());
        let mut dispatcher = Dispatcher::new(config.dispatch_mode());
        if let Some(prefix) = &config.command_prefix {
            dispatcher.commands_mut().set_global_prefix(prefix.as_str());
        }
        Self {
            config,
            caller,
            api,
            dispatcher,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> UserId {
        self.config.id
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Returns the API client; clones stay usable while the bot runs.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handlers and commands must be registered before [`run`](Self::run).
    pub fn dispatcher_mut(&mut self) -> &mut Dispatcher {
        &mut self.dispatcher
    }

    /// Registers API actions beyond the OneBot built-ins.
    pub fn register_extension(&self, extension: Extension) -> RuntimeResult<()> {
        let name = extension.name().to_owned();
        self.api.register_extension(extension)?;
        info!(bot_id = %self.config.id, extension = %name, "Registered API extension");
        Ok(())
    }

    /// Returns a token that stops [`run`](Self::run) when cancelled.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Processes inbound frames until `inbound` closes or the shutdown token
    /// is cancelled.
    ///
    /// On return, pending API calls fail with [`ApiError::NotConnected`] and
    /// events already received have been dispatched.
    pub async fn run(self, mut inbound: mpsc::Receiver<Vec<u8>>) -> RuntimeResult<()> {
        let Self {
            config,
            caller,
            api,
            dispatcher,
            shutdown,
        } = self;
        info!(bot_id = %config.id, mode = ?dispatcher.mode(), "Bot started");

        let (events_tx, mut events_rx) = mpsc::unbounded_channel::<Event>();
        let dispatcher = Arc::new(dispatcher);
        let worker = tokio::spawn(async move {
            while let Some(event) = events_rx.recv().await {
                dispatcher.dispatch(Arc::new(event), api.clone()).await;
            }
        });

        let receiver = Receiver {
            caller: &caller,
            events: events_tx,
            debug: config.debug,
        };
        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    debug!("Shutdown requested");
                    break;
                }
                frame = inbound.recv() => match frame {
                    Some(frame) => receiver.receive(&frame),
                    None => {
                        debug!("Inbound channel closed");
                        break;
                    }
                },
            }
        }

        caller.on_disconnect();
        drop(receiver);
        worker
            .await
            .map_err(|e| RuntimeError::Worker(e.to_string()))?;
        info!(bot_id = %config.id, "Bot stopped");
        Ok(())
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot")
            .field("id", &self.config.id)
            .field("url", &self.config.url())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Receive loop
// =============================================================================

struct Receiver<'a> {
    caller: &'a ChannelApiCaller,
    events: mpsc::UnboundedSender<Event>,
    debug: bool,
}

impl Receiver<'_> {
    /// Routes one frame. Never blocks.
    fn receive(&self, frame: &[u8]) {
        if self.debug {
            debug!(frame = %String::from_utf8_lossy(frame), "Received frame");
        }
        let value: Value = match serde_json::from_slice(frame) {
            Ok(value) => value,
            Err(e) => {
                warn!("Dropping malformed frame: {e}");
                return;
            }
        };

        if value.get("echo").is_some() {
            match self.caller.resolve_response(value) {
                Ok(()) | Err(ApiError::UnknownResponse { .. }) => {}
                Err(e) => warn!("Failed to handle API response: {e}"),
            }
            return;
        }

        match Event::from_value(value) {
            Ok(event) => {
                if let Some(err) = &event.error {
                    debug!(error = %err, "Dispatching event of unknown kind");
                }
                let _ = self.events.send(event);
            }
            Err(e) => warn!("Failed to parse event: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tabby_core::{MessageEvent, NoticeEvent};

    use super::*;

    struct Harness {
        bot: Bot,
        inbound: mpsc::Sender<Vec<u8>>,
        inbound_rx: mpsc::Receiver<Vec<u8>>,
        outbound: mpsc::Receiver<Vec<u8>>,
    }

    fn harness(config: BotConfig) -> Harness {
        let (out_tx, outbound) = mpsc::channel(8);
        let (inbound, inbound_rx) = mpsc::channel(8);
        Harness {
            bot: Bot::new(config, out_tx),
            inbound,
            inbound_rx,
            outbound,
        }
    }

    fn frame(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[tokio::test]
    async fn test_events_reach_handlers() {
        let Harness {
            mut bot,
            inbound,
            inbound_rx,
            ..
        } = harness(BotConfig::default());
        let (seen_tx, mut seen) = mpsc::unbounded_channel();
        bot.dispatcher_mut().on_notice(move |notice: NoticeEvent| {
            let seen_tx = seen_tx.clone();
            async move {
                let _ = seen_tx.send(notice.user_id);
            }
        });
        let shutdown = bot.shutdown_token();
        let running = tokio::spawn(bot.run(inbound_rx));

        inbound.send(b"not json".to_vec()).await.unwrap();
        inbound
            .send(frame(json!({"post_type":"notice","notice_type":"friend_add","user_id":7})))
            .await
            .unwrap();
        assert_eq!(seen.recv().await, Some(UserId(7)));

        shutdown.cancel();
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_handler_call_is_answered_while_handler_waits() {
        let config = BotConfig {
            command_prefix: Some("/".into()),
            ..BotConfig::default()
        };
        let Harness {
            mut bot,
            inbound,
            inbound_rx,
            mut outbound,
        } = harness(config);
        let (seen_tx, mut seen) = mpsc::unbounded_channel();
        bot.dispatcher_mut()
            .on_private_message(move |_msg: MessageEvent, api: ApiClient| {
                let seen_tx = seen_tx.clone();
                async move {
                    let info = api.get_login_info().await;
                    let _ = seen_tx.send(info.map(|info| info.nickname));
                }
            });
        let running = tokio::spawn(bot.run(inbound_rx));

        inbound
            .send(frame(json!({
                "post_type": "message",
                "message_type": "private",
                "user_id": 1,
                "message": "hi",
            })))
            .await
            .unwrap();

        let request: Value = serde_json::from_slice(&outbound.recv().await.unwrap()).unwrap();
        assert_eq!(request["action"], "get_login_info");
        inbound
            .send(frame(json!({
                "status": "ok",
                "retcode": 0,
                "echo": request["echo"],
                "data": {"user_id": 10001, "nickname": "tabby"},
            })))
            .await
            .unwrap();

        assert_eq!(seen.recv().await.unwrap().unwrap(), "tabby");
        drop(inbound);
        running.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_closing_inbound_fails_pending_calls() {
        let Harness {
            bot,
            inbound,
            inbound_rx,
            mut outbound,
        } = harness(BotConfig::default());
        let api = bot.api().clone();
        let running = tokio::spawn(bot.run(inbound_rx));

        let call = tokio::spawn(async move { api.get_status().await });
        outbound.recv().await.unwrap();
        drop(inbound);

        running.await.unwrap().unwrap();
        assert!(matches!(call.await.unwrap(), Err(ApiError::NotConnected)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_call_times_out() {
        let config = BotConfig {
            api_timeout_ms: 50,
            ..BotConfig::default()
        };
        let Harness {
            bot, mut outbound, ..
        } = harness(config);
        let result = tokio::time::timeout(Duration::from_secs(1), async {
            let (_, call) = tokio::join!(outbound.recv(), bot.api().clean_cache());
            call
        })
        .await
        .unwrap();
        assert!(matches!(result, Err(ApiError::Timeout { .. })));
    }

    #[test]
    fn test_register_extension_conflict() {
        let Harness { bot, .. } = harness(BotConfig::default());
        let builtin = Extension::new("shadow").with_action(
            "send_msg",
            tabby_core::ResponseFactory::of::<Value>(),
        );
        assert!(matches!(
            bot.register_extension(builtin),
            Err(RuntimeError::Registry(_))
        ));
        assert!(
            bot.register_extension(Extension::new("fresh").with_action(
                "fresh_action",
                tabby_core::ResponseFactory::of::<Value>()
            ))
            .is_ok()
        );
    }
}
