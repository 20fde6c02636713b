//! Meta Events
//!
//! # Hierarchy
//!
//! ```text
//! MetaEvent { meta_event_type, sub_type, kind }
//! └── MetaKind (meta_event_type dispatch)
//!     ├── Lifecycle
//!     └── Heartbeat(Heartbeat)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::ServerStatus;
use crate::error::EventError;

// ============================================================================
// MetaEvent
// ============================================================================

/// Meta event container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaEvent {
    #[serde(default)]
    pub meta_event_type: String,
    /// Lifecycle sub-type (`enable`, `disable`, `connect`).
    #[serde(default)]
    pub sub_type: String,
    #[serde(skip)]
    pub kind: MetaKind,
}

/// Meta event kind dispatch based on `meta_event_type`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum MetaKind {
    Lifecycle,
    Heartbeat(Heartbeat),
    #[default]
    Unknown,
}

// ============================================================================
// Heartbeat
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Heartbeat {
    pub status: ServerStatus,
    /// Heartbeat interval in milliseconds.
    pub interval: i64,
}

impl MetaEvent {
    pub(crate) fn resolve(value: &Value) -> Result<(Self, Option<EventError>), serde_json::Error> {
        let mut event = Self::deserialize(value)?;
        let mut error = None;
        event.kind = match event.meta_event_type.as_str() {
            "lifecycle" => MetaKind::Lifecycle,
            "heartbeat" => MetaKind::Heartbeat(Heartbeat::deserialize(value)?),
            other => {
                error = Some(EventError::UnknownMetaEvent(other.to_owned()));
                MetaKind::Unknown
            }
        };
        Ok((event, error))
    }

    pub fn is_heartbeat(&self) -> bool {
        matches!(self.kind, MetaKind::Heartbeat(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_heartbeat() {
        let (event, error) = MetaEvent::resolve(&json!({
            "meta_event_type": "heartbeat",
            "status": {"online": true, "good": true, "stat": {"packet_received": 3}},
            "interval": 5000
        }))
        .unwrap();
        assert!(error.is_none());
        let MetaKind::Heartbeat(heartbeat) = &event.kind else {
            panic!("expected heartbeat");
        };
        assert_eq!(heartbeat.interval, 5000);
        assert!(heartbeat.status.online);
        assert!(heartbeat.status.extra.contains_key("stat"));
    }

    #[test]
    fn test_lifecycle_and_unknown() {
        let (event, _) =
            MetaEvent::resolve(&json!({"meta_event_type": "lifecycle", "sub_type": "connect"}))
                .unwrap();
        assert_eq!(event.kind, MetaKind::Lifecycle);
        assert_eq!(event.sub_type, "connect");

        let (_, error) = MetaEvent::resolve(&json!({"meta_event_type": "x"})).unwrap();
        assert_eq!(error, Some(EventError::UnknownMetaEvent("x".into())));
    }
}
