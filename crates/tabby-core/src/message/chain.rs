//! Message chains.
//!
//! A [`Chain`] is an ordered list of [`Segment`]s. It serializes to the
//! OneBot array form and deserializes from either the array form or a CQ
//! string, so event payloads decode the same way whatever format the gateway
//! is configured to post.
//!
//! # Example
//!
//! ```rust,ignore
//! use tabby_core::message::Chain;
//!
//! let msg = Chain::new()
//!     .text("Hello, ")
//!     .at(10001000)
//!     .text("! Check this out: ")
//!     .image("http://example.com/image.jpg");
//!
//! assert_eq!(msg.plain_text(), "Hello, ! Check this out: ");
//! ```

use std::fmt;

use serde::de::{self, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::segment::{ImageData, Segment};
use super::cq;
use crate::error::CodecResult;
use crate::qq::UserId;

// ============================================================================
// Chain
// ============================================================================

/// An ordered sequence of message segments.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Chain {
    /// The segments that make up this message.
    pub segments: Vec<Segment>,
}

// ============================================================================
// Serialization / Deserialization
// ============================================================================

impl Serialize for Chain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.segments.serialize(serializer)
    }
}

struct ChainVisitor;

impl<'de> Visitor<'de> for ChainVisitor {
    type Value = Chain;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a segment array or a CQ string")
    }

    fn visit_str<E>(self, value: &str) -> Result<Chain, E>
    where
        E: de::Error,
    {
        cq::decode(value).map_err(E::custom)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Chain, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut segments = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(segment) = seq.next_element()? {
            segments.push(segment);
        }
        Ok(Chain { segments })
    }
}

impl<'de> Deserialize<'de> for Chain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ChainVisitor)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl Chain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a chain from its CQ string.
    pub fn from_cq_string(input: &str) -> CodecResult<Self> {
        cq::decode(input)
    }

    /// Appends a text segment.
    pub fn text(self, text: impl Into<String>) -> Self {
        self.segment(Segment::text(text))
    }

    /// Appends a face segment.
    pub fn face(self, id: i32) -> Self {
        self.segment(Segment::face(id))
    }

    /// Appends an image segment.
    pub fn image(self, file: impl Into<String>) -> Self {
        self.segment(Segment::image(file))
    }

    /// Appends a record segment.
    pub fn record(self, file: impl Into<String>) -> Self {
        self.segment(Segment::record(file))
    }

    /// Appends an @mention segment.
    pub fn at(self, qq: i64) -> Self {
        self.segment(Segment::at(qq))
    }

    /// Appends an @all segment.
    pub fn at_all(self) -> Self {
        self.segment(Segment::at_all())
    }

    /// Appends a reply segment.
    pub fn reply(self, id: i64) -> Self {
        self.segment(Segment::reply(id))
    }

    /// Appends an arbitrary segment.
    pub fn segment(mut self, segment: Segment) -> Self {
        self.segments.push(segment);
        self
    }

    /// Appends a segment in place.
    pub fn push(&mut self, segment: impl Into<Segment>) -> &mut Self {
        self.segments.push(segment.into());
        self
    }

    /// Inserts a segment at the front.
    pub fn prepend(&mut self, segment: impl Into<Segment>) -> &mut Self {
        self.segments.insert(0, segment.into());
        self
    }

    /// Appends every segment of another chain.
    pub fn append_chain(&mut self, other: Chain) -> &mut Self {
        self.segments.extend(other.segments);
        self
    }

    /// Quotes the given message by prepending a reply segment.
    pub fn set_reply_to(&mut self, message_id: i64) -> &mut Self {
        self.prepend(Segment::reply(message_id))
    }

    /// Marks the chain to be sent anonymously.
    pub fn set_send_as_anonymous(&mut self, ignore_failure: bool) -> &mut Self {
        self.prepend(Segment::anonymous(ignore_failure))
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl Chain {
    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Checks if the chain has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Iterates over the segments.
    pub fn iter(&self) -> std::slice::Iter<'_, Segment> {
        self.segments.iter()
    }

    /// Encodes the chain as a CQ string.
    pub fn to_cq_string(&self) -> String {
        cq::encode(&self.segments)
    }

    /// Returns the first segment with the given type tag.
    pub fn first_of_type(&self, kind: &str) -> Option<&Segment> {
        self.segments.iter().find(|seg| seg.kind() == kind)
    }

    /// Returns every segment with the given type tag.
    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |seg| seg.kind() == kind)
    }

    /// Returns the text of the first text segment.
    pub fn first_text(&self) -> Option<&str> {
        self.segments.iter().find_map(Segment::as_text)
    }

    /// Returns the first image.
    pub fn first_image(&self) -> Option<&ImageData> {
        self.segments.iter().find_map(|seg| match seg {
            Segment::Image(data) => Some(data),
            _ => None,
        })
    }

    /// Concatenates all text segments.
    pub fn plain_text(&self) -> String {
        self.segments.iter().filter_map(Segment::as_text).collect()
    }

    /// Checks if the chain contains only text segments.
    pub fn is_plain_text(&self) -> bool {
        self.segments.iter().all(Segment::is_text)
    }

    /// Returns every user mentioned individually.
    pub fn mentioned_users(&self) -> Vec<UserId> {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::At(data) => data.user_id(),
                _ => None,
            })
            .collect()
    }

    /// Checks if the chain mentions everyone.
    pub fn mentions_all(&self) -> bool {
        self.segments
            .iter()
            .any(|seg| matches!(seg, Segment::At(data) if data.is_all()))
    }

    /// Returns the quoted message id, if any.
    pub fn reply_to(&self) -> Option<i64> {
        self.segments.iter().find_map(|seg| match seg {
            Segment::Reply(data) => Some(data.id.get()),
            _ => None,
        })
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

// ============================================================================
// From implementations
// ============================================================================

impl From<Vec<Segment>> for Chain {
    fn from(segments: Vec<Segment>) -> Self {
        Self { segments }
    }
}

impl From<Segment> for Chain {
    fn from(segment: Segment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for Chain {
    fn from(text: &str) -> Self {
        Segment::text(text).into()
    }
}

impl From<String> for Chain {
    fn from(text: String) -> Self {
        Segment::text(text).into()
    }
}

impl FromIterator<Segment> for Chain {
    fn from_iter<T: IntoIterator<Item = Segment>>(iter: T) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Chain {
    type Item = Segment;
    type IntoIter = std::vec::IntoIter<Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.into_iter()
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Segment;
    type IntoIter = std::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
