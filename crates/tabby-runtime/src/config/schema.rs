//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tabby_core::UserId;
use tabby_framework::DispatchMode;

/// Root configuration structure.
///
/// ```toml
/// [bot]
/// host = "localhost"
/// port = 3001
/// token = "secret"
/// id = 10001
/// command_prefix = "/"
///
/// [logging]
/// level = "debug"
/// filters = { tabby_core = "trace" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TabbyConfig {
    /// Connection and dispatch settings.
    #[serde(default)]
    pub bot: BotConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Settings of one bot connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Gateway host.
    pub host: String,
    /// Gateway port.
    pub port: u16,
    /// WebSocket path on the gateway.
    pub endpoint: String,
    /// Access token, sent as `Authorization: Bearer <token>`.
    pub token: Option<String>,
    /// QQ account the bot logs in as.
    pub id: UserId,
    /// Log every raw frame.
    pub debug: bool,
    /// Run each handler on its own task.
    pub concurrent: bool,
    /// How long an API call waits for its response, in milliseconds.
    pub api_timeout_ms: u64,
    /// Prefix stripped from command names, e.g. `/`.
    pub command_prefix: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3001,
            endpoint: "/".to_string(),
            token: None,
            id: UserId::default(),
            debug: false,
            concurrent: false,
            api_timeout_ms: 30_000,
            command_prefix: None,
        }
    }
}

impl BotConfig {
    /// Returns the gateway WebSocket URL.
    pub fn url(&self) -> String {
        format!("ws://{}:{}{}", self.host, self.port, self.endpoint)
    }

    /// Returns the `Authorization` header value, if a token is set.
    pub fn authorization(&self) -> Option<String> {
        self.token.as_ref().map(|token| format!("Bearer {token}"))
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_millis(self.api_timeout_ms)
    }

    pub fn dispatch_mode(&self) -> DispatchMode {
        if self.concurrent {
            DispatchMode::Concurrent
        } else {
            DispatchMode::Serial
        }
    }
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// When a log file is rotated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Base level; `RUST_LOG` takes precedence when set.
    pub level: LogLevel,
    pub format: LogFormat,
    pub output: LogOutput,
    /// Log file, for [`LogOutput::File`].
    pub file_path: Option<PathBuf>,
    pub rotation: LogRotation,
    /// Per-target levels, e.g. `tabby_core = "trace"`.
    pub filters: HashMap<String, LogLevel>,
    pub span_events: SpanEventConfig,
    pub thread_ids: bool,
    /// Include file and line of each log site.
    pub file_location: bool,
}
