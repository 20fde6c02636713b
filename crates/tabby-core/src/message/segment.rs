//! Message segment types.
//!
//! A segment is one unit of message content: plain text, an image, a mention
//! and so on. Every segment has a type tag and a data object whose shape is
//! fully determined by the tag. Tags this crate does not know decode to
//! [`Segment::Unknown`], which keeps the raw key/value pairs in their original
//! order so they survive a decode/encode cycle untouched.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabby_core::message::Segment;
//!
//! let text = Segment::text("Hello, ");
//! let at = Segment::at(10001000);
//! let face = Segment::face(178);
//! ```

use std::fmt;

use serde::de::{self, DeserializeOwned};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use super::Chain;
use super::de as lenient;
use crate::error::{CodecError, CodecResult};
use crate::qq::{MessageId, UserId};

// ============================================================================
// Segment Enum
// ============================================================================

/// A single message segment.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// Plain text content.
    Text(TextData),
    /// QQ emoji/face.
    Face(FaceData),
    /// Image.
    Image(ImageData),
    /// Voice record.
    Record(RecordData),
    /// Video.
    Video(VideoData),
    /// @mention someone.
    At(AtData),
    /// Rock-paper-scissors magic emoji.
    Rps(MagicData),
    /// Dice magic emoji.
    Dice(MagicData),
    /// Window shake.
    Shake(ShakeData),
    /// Poke.
    Poke(PokeData),
    /// Send the message anonymously (send only).
    Anonymous(AnonymousSegmentData),
    /// Link share.
    Share(ShareData),
    /// Contact recommendation.
    Contact(ContactData),
    /// Location.
    Location(LocationData),
    /// Music share.
    Music(MusicData),
    /// Quote of another message.
    Reply(ReplyData),
    /// Reference to a merged forward message (receive only).
    Forward(ForwardData),
    /// Forward node, used to build merged forward messages.
    Node(NodeData),
    /// XML card.
    Xml(XmlData),
    /// JSON card.
    Json(JsonData),
    /// Uploaded file.
    File(FileData),
    /// A segment type this crate does not model.
    Unknown {
        /// The raw type tag.
        kind: String,
        /// The raw fields, in wire order.
        data: Map<String, Value>,
    },
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Text(data) => write!(f, "{}", data.text),
            Segment::Face(data) => write!(f, "[表情:{}]", data.id),
            Segment::Image(data) => write!(f, "[图片:{}]", data.file),
            Segment::Record(data) => write!(f, "[语音:{}]", data.file),
            Segment::Video(data) => write!(f, "[视频:{}]", data.file),
            Segment::At(data) if data.is_all() => write!(f, "@全体成员"),
            Segment::At(data) => write!(f, "@{}", data.qq),
            Segment::Rps(_) => write!(f, "[猜拳]"),
            Segment::Dice(_) => write!(f, "[骰子]"),
            Segment::Shake(_) => write!(f, "[窗口抖动]"),
            Segment::Poke(data) => write!(f, "[戳一戳:{}]", data.poke_type),
            Segment::Anonymous(_) => write!(f, "[匿名]"),
            Segment::Share(data) => write!(f, "[分享:{}]", data.title),
            Segment::Contact(data) => write!(f, "[推荐{}:{}]", data.contact_type, data.id),
            Segment::Location(data) => write!(f, "[位置:{},{}]", data.lat, data.lon),
            Segment::Music(data) => write!(f, "[音乐:{}]", data.kind()),
            Segment::Reply(data) => write!(f, "[回复:{}]", data.id),
            Segment::Forward(data) => write!(f, "[合并转发:{}]", data.id),
            Segment::Node(_) => write!(f, "[转发节点]"),
            Segment::Xml(_) => write!(f, "[XML消息]"),
            Segment::Json(_) => write!(f, "[JSON消息]"),
            Segment::File(data) => write!(f, "[文件:{}]", data.file),
            Segment::Unknown { kind, .. } => write!(f, "[{kind}]"),
        }
    }
}

// ============================================================================
// Tag / Data Mapping
// ============================================================================

fn decode_data<T: DeserializeOwned>(kind: &str, data: Map<String, Value>) -> CodecResult<T> {
    serde_json::from_value(Value::Object(data)).map_err(|err| CodecError::InvalidSegment {
        kind: kind.to_owned(),
        reason: err.to_string(),
    })
}

fn encode_data<T: Serialize>(data: &T) -> Map<String, Value> {
    match serde_json::to_value(data) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

impl Segment {
    /// Returns the wire type tag of this segment.
    pub fn kind(&self) -> &str {
        match self {
            Segment::Text(_) => "text",
            Segment::Face(_) => "face",
            Segment::Image(_) => "image",
            Segment::Record(_) => "record",
            Segment::Video(_) => "video",
            Segment::At(_) => "at",
            Segment::Rps(_) => "rps",
            Segment::Dice(_) => "dice",
            Segment::Shake(_) => "shake",
            Segment::Poke(_) => "poke",
            Segment::Anonymous(_) => "anonymous",
            Segment::Share(_) => "share",
            Segment::Contact(_) => "contact",
            Segment::Location(_) => "location",
            Segment::Music(_) => "music",
            Segment::Reply(_) => "reply",
            Segment::Forward(_) => "forward",
            Segment::Node(_) => "node",
            Segment::Xml(_) => "xml",
            Segment::Json(_) => "json",
            Segment::File(_) => "file",
            Segment::Unknown { kind, .. } => kind,
        }
    }

    /// Builds a segment from its type tag and raw fields.
    ///
    /// Field values may be native JSON or their string forms. Unknown tags
    /// are kept as [`Segment::Unknown`].
    pub fn from_parts(kind: &str, data: Map<String, Value>) -> CodecResult<Self> {
        Ok(match kind {
            "text" => Segment::Text(decode_data(kind, data)?),
            "face" => Segment::Face(decode_data(kind, data)?),
            "image" => Segment::Image(decode_data(kind, data)?),
            "record" => Segment::Record(decode_data(kind, data)?),
            "video" => Segment::Video(decode_data(kind, data)?),
            "at" => Segment::At(decode_data(kind, data)?),
            "rps" => Segment::Rps(decode_data(kind, data)?),
            "dice" => Segment::Dice(decode_data(kind, data)?),
            "shake" => Segment::Shake(decode_data(kind, data)?),
            "poke" => Segment::Poke(decode_data(kind, data)?),
            "anonymous" => Segment::Anonymous(decode_data(kind, data)?),
            "share" => Segment::Share(decode_data(kind, data)?),
            "contact" => Segment::Contact(decode_data(kind, data)?),
            "location" => Segment::Location(decode_data(kind, data)?),
            "music" => Segment::Music(decode_data(kind, data)?),
            "reply" => Segment::Reply(decode_data(kind, data)?),
            "forward" => Segment::Forward(decode_data(kind, data)?),
            "node" => Segment::Node(decode_data(kind, data)?),
            "xml" => Segment::Xml(decode_data(kind, data)?),
            "json" => Segment::Json(decode_data(kind, data)?),
            "file" => Segment::File(decode_data(kind, data)?),
            _ => Segment::Unknown {
                kind: kind.to_owned(),
                data,
            },
        })
    }

    /// Returns the data object of this segment in declared field order,
    /// with omitted defaults left out.
    pub fn to_data(&self) -> Map<String, Value> {
        match self {
            Segment::Text(data) => encode_data(data),
            Segment::Face(data) => encode_data(data),
            Segment::Image(data) => encode_data(data),
            Segment::Record(data) => encode_data(data),
            Segment::Video(data) => encode_data(data),
            Segment::At(data) => encode_data(data),
            Segment::Rps(data) | Segment::Dice(data) => encode_data(data),
            Segment::Shake(data) => encode_data(data),
            Segment::Poke(data) => encode_data(data),
            Segment::Anonymous(data) => encode_data(data),
            Segment::Share(data) => encode_data(data),
            Segment::Contact(data) => encode_data(data),
            Segment::Location(data) => encode_data(data),
            Segment::Music(data) => encode_data(data),
            Segment::Reply(data) => encode_data(data),
            Segment::Forward(data) => encode_data(data),
            Segment::Node(data) => encode_data(data),
            Segment::Xml(data) => encode_data(data),
            Segment::Json(data) => encode_data(data),
            Segment::File(data) => encode_data(data),
            Segment::Unknown { data, .. } => data.clone(),
        }
    }

    /// Returns the text if this is a text segment.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text(data) => Some(&data.text),
            _ => None,
        }
    }

    /// Checks if this is a text segment.
    pub fn is_text(&self) -> bool {
        matches!(self, Segment::Text(_))
    }
}

// ============================================================================
// Serialization / Deserialization
// ============================================================================

impl Serialize for Segment {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Segment", 2)?;
        state.serialize_field("type", self.kind())?;
        state.serialize_field("data", &self.to_data())?;
        state.end()
    }
}

#[derive(Deserialize)]
struct RawSegment {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<Map<String, Value>>,
}

impl<'de> Deserialize<'de> for Segment {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawSegment::deserialize(deserializer)?;
        Segment::from_parts(&raw.kind, raw.data.unwrap_or_default()).map_err(de::Error::custom)
    }
}

// ============================================================================
// Segment Builder Methods
// ============================================================================

impl Segment {
    // --------------------------------
    // Text
    // --------------------------------

    /// Creates a plain text segment.
    pub fn text(text: impl Into<String>) -> Self {
        Segment::Text(TextData { text: text.into() })
    }

    // --------------------------------
    // Face
    // --------------------------------

    /// Creates a QQ face/emoji segment.
    pub fn face(id: i32) -> Self {
        Segment::Face(FaceData { id })
    }

    // --------------------------------
    // Media
    // --------------------------------

    /// Creates an image segment from a file path or URL.
    pub fn image(file: impl Into<String>) -> Self {
        Segment::Image(ImageData {
            file: file.into(),
            ..Default::default()
        })
    }

    /// Creates a flash image segment.
    pub fn flash_image(file: impl Into<String>) -> Self {
        Segment::Image(ImageData {
            file: file.into(),
            image_type: Some("flash".to_owned()),
            ..Default::default()
        })
    }

    /// Creates a voice record segment.
    pub fn record(file: impl Into<String>) -> Self {
        Segment::Record(RecordData {
            file: file.into(),
            ..Default::default()
        })
    }

    /// Creates a video segment.
    pub fn video(file: impl Into<String>) -> Self {
        Segment::Video(VideoData {
            file: file.into(),
            ..Default::default()
        })
    }

    /// Creates a file segment.
    pub fn file(file: impl Into<String>, name: impl Into<String>) -> Self {
        Segment::File(FileData {
            file: file.into(),
            name: Some(name.into()),
            url: None,
        })
    }

    // --------------------------------
    // At
    // --------------------------------

    /// Creates an @mention segment for a specific user.
    pub fn at(qq: i64) -> Self {
        Segment::At(AtData { qq: qq.to_string() })
    }

    /// Creates an @all segment to mention everyone.
    pub fn at_all() -> Self {
        Segment::At(AtData {
            qq: AtData::ALL.to_owned(),
        })
    }

    // --------------------------------
    // Magic Emojis
    // --------------------------------

    /// Creates a rock-paper-scissors segment.
    pub fn rps() -> Self {
        Segment::Rps(MagicData::default())
    }

    /// Creates a dice segment.
    pub fn dice() -> Self {
        Segment::Dice(MagicData::default())
    }

    /// Creates a window shake segment.
    pub fn shake() -> Self {
        Segment::Shake(ShakeData {})
    }

    /// Creates a poke segment.
    pub fn poke(poke_type: impl Into<String>, id: impl Into<String>) -> Self {
        Segment::Poke(PokeData {
            poke_type: poke_type.into(),
            id: id.into(),
            name: None,
        })
    }

    /// Creates an anonymous marker. With `ignore` set the message is sent
    /// normally when anonymity is unavailable.
    pub fn anonymous(ignore: bool) -> Self {
        Segment::Anonymous(AnonymousSegmentData { ignore })
    }

    // --------------------------------
    // Cards
    // --------------------------------

    /// Creates a link share segment.
    pub fn share(url: impl Into<String>, title: impl Into<String>) -> Self {
        Segment::Share(ShareData {
            url: url.into(),
            title: title.into(),
            content: None,
            image: None,
        })
    }

    /// Creates a friend recommendation segment.
    pub fn contact_qq(id: i64) -> Self {
        Segment::Contact(ContactData {
            contact_type: ContactKind::Qq,
            id,
        })
    }

    /// Creates a group recommendation segment.
    pub fn contact_group(id: i64) -> Self {
        Segment::Contact(ContactData {
            contact_type: ContactKind::Group,
            id,
        })
    }

    /// Creates a location segment.
    pub fn location(lat: f64, lon: f64) -> Self {
        Segment::Location(LocationData {
            lat,
            lon,
            title: None,
            content: None,
        })
    }

    /// Creates a music share segment for a platform track.
    pub fn music(music: MusicData) -> Self {
        Segment::Music(music)
    }

    /// Creates a custom music share segment.
    pub fn music_custom(
        url: impl Into<String>,
        audio: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Segment::Music(MusicData::Custom {
            url: url.into(),
            audio: audio.into(),
            title: title.into(),
            content: None,
            image: None,
        })
    }

    /// Creates an XML card segment.
    pub fn xml(data: impl Into<String>) -> Self {
        Segment::Xml(XmlData { data: data.into() })
    }

    /// Creates a JSON card segment.
    pub fn json(data: impl Into<String>) -> Self {
        Segment::Json(JsonData { data: data.into() })
    }

    // --------------------------------
    // Reply / Forward
    // --------------------------------

    /// Creates a reply segment quoting the given message.
    pub fn reply(id: i64) -> Self {
        Segment::Reply(ReplyData { id: MessageId(id) })
    }

    /// Creates a forward reference segment.
    pub fn forward(id: impl Into<String>) -> Self {
        Segment::Forward(ForwardData { id: id.into() })
    }

    /// Creates a forward node referring to an existing message.
    pub fn node(id: impl Into<String>) -> Self {
        Segment::Node(NodeData::Reference(NodeReference { id: id.into() }))
    }

    /// Creates a forward node with custom content.
    pub fn node_custom(
        user_id: i64,
        nickname: impl Into<String>,
        content: impl Into<Chain>,
    ) -> Self {
        Segment::Node(NodeData::Custom(CustomNode {
            user_id: UserId(user_id),
            nickname: nickname.into(),
            content: content.into(),
        }))
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::text(text)
    }
}

impl From<String> for Segment {
    fn from(text: String) -> Self {
        Segment::text(text)
    }
}

// ============================================================================
// Segment Data Types
// ============================================================================

fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Text segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextData {
    /// Text content.
    #[serde(deserialize_with = "lenient::string")]
    pub text: String,
}

/// Face segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FaceData {
    /// Face id.
    #[serde(deserialize_with = "lenient::number")]
    pub id: i32,
}

/// Image segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageData {
    /// File name, path, URL or base64 payload.
    pub file: String,
    /// `flash` for flash images.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub image_type: Option<String>,
    /// Preview text shown in conversation lists.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Download URL (receive only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub cache: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub proxy: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub timeout: Option<i32>,
}

/// Record segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    pub file: String,
    /// Voice changer flag.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub magic: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub cache: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub proxy: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub timeout: Option<i32>,
}

/// Video segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoData {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub cache: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub proxy: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub timeout: Option<i32>,
}

/// File segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileData {
    pub file: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// At segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AtData {
    /// QQ number, or `all`.
    #[serde(deserialize_with = "lenient::string")]
    pub qq: String,
}

impl AtData {
    /// The `qq` value that mentions everyone.
    pub const ALL: &'static str = "all";

    /// Checks if this mentions everyone.
    pub fn is_all(&self) -> bool {
        self.qq == Self::ALL
    }

    /// Returns the mentioned user, unless this mentions everyone.
    pub fn user_id(&self) -> Option<UserId> {
        self.qq.parse().ok()
    }
}

/// Rps and dice segment data. `result` is only present on received segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MagicData {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient::option_number"
    )]
    pub result: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShakeData {}

/// Poke segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PokeData {
    #[serde(rename = "type", deserialize_with = "lenient::string")]
    pub poke_type: String,
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Anonymous segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnonymousSegmentData {
    /// Send normally if anonymity is unavailable.
    #[serde(
        default,
        skip_serializing_if = "is_false",
        deserialize_with = "lenient::boolean"
    )]
    pub ignore: bool,
}

/// Share segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareData {
    pub url: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Target of a contact recommendation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactKind {
    #[default]
    Qq,
    Group,
}

impl fmt::Display for ContactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContactKind::Qq => "qq",
            ContactKind::Group => "group",
        })
    }
}

/// Contact segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactData {
    #[serde(rename = "type")]
    pub contact_type: ContactKind,
    #[serde(deserialize_with = "lenient::number")]
    pub id: i64,
}

/// Location segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(deserialize_with = "lenient::number")]
    pub lat: f64,
    #[serde(deserialize_with = "lenient::number")]
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Music segment data, keyed by the `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MusicData {
    #[serde(rename = "qq")]
    Qq {
        #[serde(deserialize_with = "lenient::string")]
        id: String,
    },
    #[serde(rename = "163")]
    NetEase {
        #[serde(deserialize_with = "lenient::string")]
        id: String,
    },
    #[serde(rename = "xm")]
    Xiami {
        #[serde(deserialize_with = "lenient::string")]
        id: String,
    },
    #[serde(rename = "custom")]
    Custom {
        url: String,
        audio: String,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
}

impl MusicData {
    /// Returns the wire `type` value.
    pub fn kind(&self) -> &'static str {
        match self {
            MusicData::Qq { .. } => "qq",
            MusicData::NetEase { .. } => "163",
            MusicData::Xiami { .. } => "xm",
            MusicData::Custom { .. } => "custom",
        }
    }
}

/// Reply segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplyData {
    #[serde(deserialize_with = "lenient::number")]
    pub id: MessageId,
}

/// Forward segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForwardData {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
}

/// Node segment data.
///
/// A node with `content` is a custom node; a node with only `id` refers to
/// an existing message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NodeData {
    Custom(CustomNode),
    Reference(NodeReference),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomNode {
    #[serde(deserialize_with = "lenient::number")]
    pub user_id: UserId,
    #[serde(deserialize_with = "lenient::string")]
    pub nickname: String,
    pub content: Chain,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeReference {
    #[serde(deserialize_with = "lenient::string")]
    pub id: String,
}

/// XML segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct XmlData {
    pub data: String,
}

/// JSON segment data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JsonData {
    pub data: String,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_segment_serialize() {
        let json = serde_json::to_string(&Segment::text("Hello")).unwrap();
        assert_eq!(json, r#"{"type":"text","data":{"text":"Hello"}}"#);

        let json = serde_json::to_string(&Segment::face(178)).unwrap();
        assert_eq!(json, r#"{"type":"face","data":{"id":178}}"#);

        let json = serde_json::to_string(&Segment::at(10001000)).unwrap();
        assert_eq!(json, r#"{"type":"at","data":{"qq":"10001000"}}"#);
    }

    #[test]
    fn test_segment_deserialize_lenient() {
        let seg: Segment =
            serde_json::from_value(json!({"type": "face", "data": {"id": "178"}})).unwrap();
        assert_eq!(seg, Segment::face(178));

        let seg: Segment =
            serde_json::from_value(json!({"type": "reply", "data": {"id": 42}})).unwrap();
        assert_eq!(seg, Segment::reply(42));

        let seg: Segment = serde_json::from_value(json!({"type": "shake"})).unwrap();
        assert_eq!(seg, Segment::shake());
    }

    #[test]
    fn test_omit_defaults() {
        let data = Segment::image("a.png").to_data();
        assert_eq!(data.len(), 1);
        assert!(Segment::anonymous(false).to_data().is_empty());
        assert_eq!(Segment::anonymous(true).to_data()["ignore"], json!(true));
    }

    #[test]
    fn test_unknown_segment_keeps_fields() {
        let seg: Segment = serde_json::from_value(
            json!({"type": "mface", "data": {"z": "1", "a": "2", "m": "3"}}),
        )
        .unwrap();
        let Segment::Unknown { kind, data } = &seg else {
            panic!("expected unknown segment");
        };
        assert_eq!(kind, "mface");
        assert_eq!(data.keys().collect::<Vec<_>>(), ["z", "a", "m"]);
        assert_eq!(
            serde_json::to_value(&seg).unwrap(),
            json!({"type": "mface", "data": {"z": "1", "a": "2", "m": "3"}})
        );
    }

    #[test]
    fn test_invalid_known_segment() {
        let mut data = Map::new();
        data.insert("id".into(), Value::String("smile".into()));
        let err = Segment::from_parts("face", data).unwrap_err();
        assert!(matches!(err, CodecError::InvalidSegment { ref kind, .. } if kind == "face"));
    }

    #[test]
    fn test_music_variants() {
        let seg: Segment =
            serde_json::from_value(json!({"type": "music", "data": {"type": "163", "id": 28949129}}))
                .unwrap();
        assert_eq!(
            seg,
            Segment::music(MusicData::NetEase {
                id: "28949129".into()
            })
        );
        let custom = Segment::music_custom("u", "a", "t").to_data();
        assert_eq!(custom.keys().collect::<Vec<_>>(), ["type", "url", "audio", "title"]);
    }

    #[test]
    fn test_node_variants() {
        let reference: Segment =
            serde_json::from_value(json!({"type": "node", "data": {"id": "123"}})).unwrap();
        assert_eq!(reference, Segment::node("123"));

        let custom: Segment = serde_json::from_value(json!({
            "type": "node",
            "data": {
                "user_id": "10001",
                "nickname": "neko",
                "content": [{"type": "text", "data": {"text": "hi"}}]
            }
        }))
        .unwrap();
        assert_eq!(custom, Segment::node_custom(10001, "neko", "hi"));
    }

    #[test]
    fn test_display() {
        assert_eq!(Segment::at_all().to_string(), "@全体成员");
        assert_eq!(Segment::face(1).to_string(), "[表情:1]");
    }
}
