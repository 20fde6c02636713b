//! Response and request types of the NapCat actions.

use serde::{Deserialize, Deserializer, Serialize};
use tabby_core::{GroupId, UserId};

/// Pending group requests, from `get_group_system_msg`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSystemMessages {
    /// Invitations of the bot into groups.
    #[serde(alias = "InvitedRequest", alias = "invited_request")]
    pub invited_requests: Vec<GroupSystemRequest>,
    /// Users asking to join groups the bot manages.
    pub join_requests: Vec<GroupSystemRequest>,
}

/// One entry of [`GroupSystemMessages`].
///
/// Invitations fill the `invitor_*` fields, join requests the
/// `requester_*` fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSystemRequest {
    #[serde(deserialize_with = "lenient_i64")]
    pub request_id: i64,
    pub group_id: GroupId,
    pub group_name: String,
    pub checked: bool,
    /// Who handled the request, 0 while unhandled.
    pub actor: UserId,
    pub invitor_uin: UserId,
    pub invitor_nick: String,
    pub requester_uin: UserId,
    pub requester_nick: String,
    pub message: String,
}

/// A file known to the gateway, from `get_file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileInfo {
    /// Local path on the gateway host.
    pub file: String,
    pub url: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub file_size: u64,
    pub file_name: String,
    /// File content, when the gateway inlines it.
    pub base64: Option<String>,
}

/// Result of `download_file`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadedFile {
    /// Where the gateway stored the file.
    pub file: String,
}

/// Parameters of `download_file`.
///
/// ```rust,ignore
/// let request = DownloadRequest::url("https://example.com/a.png")
///     .name("a.png")
///     .header("Referer: https://example.com");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_count: Option<u32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
}

impl DownloadRequest {
    /// Downloads from a URL.
    pub fn url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            ..Self::default()
        }
    }

    /// Stores inline content.
    pub fn base64(content: impl Into<String>) -> Self {
        Self {
            base64: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn thread_count(mut self, count: u32) -> Self {
        self.thread_count = Some(count);
        self
    }

    /// Adds a request header, formatted `Name: value`.
    pub fn header(mut self, header: impl Into<String>) -> Self {
        self.headers.push(header.into());
        self
    }
}

// NapCat reports some numbers as strings.

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString<T> {
    Number(T),
    String(String),
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match NumberOrString::<i64>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match NumberOrString::<u64>::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_system_messages_alias() {
        let messages: GroupSystemMessages = serde_json::from_value(json!({
            "InvitedRequest": [{
                "request_id": "7",
                "invitor_uin": 10,
                "invitor_nick": "alice",
                "group_id": 100,
                "group_name": "g",
                "checked": false,
                "actor": 0
            }],
            "join_requests": [{
                "request_id": 8,
                "requester_uin": 11,
                "requester_nick": "bob",
                "message": "let me in",
                "group_id": 100,
                "checked": true,
                "actor": 1
            }]
        }))
        .unwrap();
        assert_eq!(messages.invited_requests[0].request_id, 7);
        assert_eq!(messages.invited_requests[0].invitor_uin, UserId(10));
        assert_eq!(messages.join_requests[0].requester_nick, "bob");
        assert!(messages.join_requests[0].checked);
    }

    #[test]
    fn test_file_size_as_string() {
        let info: FileInfo =
            serde_json::from_value(json!({"file": "/tmp/a", "file_size": "1024", "file_name": "a"}))
                .unwrap();
        assert_eq!(info.file_size, 1024);
        assert_eq!(info.base64, None);
    }

    #[test]
    fn test_download_request_params() {
        let request = DownloadRequest::url("https://example.com/a.png")
            .name("a.png")
            .header("Referer: x");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"url": "https://example.com/a.png", "name": "a.png", "headers": ["Referer: x"]})
        );
    }
}
