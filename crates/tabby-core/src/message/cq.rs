//! CQ-code wire form.
//!
//! A chain travels as one flat string: text runs are escaped in place and
//! every other segment becomes a bracketed span.
//!
//! ```text
//! Hello [CQ:face,id=178] World [CQ:at,qq=10001000]
//! ```
//!
//! [`encode`] and [`decode`] map between that string and a [`Chain`].

use serde_json::{Map, Value};

use super::{Chain, NodeData, Segment};
use crate::error::{CodecError, CodecResult};

const OPEN: &str = "[CQ:";

// ============================================================================
// Escaping
// ============================================================================

/// Escapes text or a field value for the CQ wire form.
///
/// Escapes: `&` → `&amp;`, `[` → `&#91;`, `]` → `&#93;`, `,` → `&#44;`
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '[' => out.push_str("&#91;"),
            ']' => out.push_str("&#93;"),
            ',' => out.push_str("&#44;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Reverses [`escape`] in a single pass.
pub fn unescape(input: &str) -> String {
    const ENTITIES: [(&str, char); 4] =
        [("&amp;", '&'), ("&#91;", '['), ("&#93;", ']'), ("&#44;", ',')];

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES
            .iter()
            .find(|(entity, _)| rest.starts_with(entity))
        {
            Some((entity, ch)) => {
                out.push(*ch);
                rest = &rest[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

// ============================================================================
// Encoding
// ============================================================================

fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(number) => Some(number.to_string()),
        nested => Some(nested.to_string()),
    }
}

fn push_field(out: &mut String, key: &str, value: &str) {
    out.push(',');
    out.push_str(&escape(key));
    out.push('=');
    out.push_str(&escape(value));
}

/// Appends the wire form of one segment to `out`.
pub fn encode_segment(segment: &Segment, out: &mut String) {
    if let Segment::Text(data) = segment {
        out.push_str(&escape(&data.text));
        return;
    }

    out.push_str(OPEN);
    out.push_str(&escape(segment.kind()));
    match segment {
        Segment::Node(NodeData::Custom(node)) => {
            push_field(out, "user_id", &node.user_id.to_string());
            push_field(out, "nickname", &node.nickname);
            push_field(out, "content", &encode(&node.content));
        }
        _ => {
            for (key, value) in &segment.to_data() {
                if let Some(value) = stringify(value) {
                    push_field(out, key, &value);
                }
            }
        }
    }
    out.push(']');
}

/// Encodes a sequence of segments into its CQ string.
pub fn encode<'a>(segments: impl IntoIterator<Item = &'a Segment>) -> String {
    let mut out = String::new();
    for segment in segments {
        encode_segment(segment, &mut out);
    }
    out
}

// ============================================================================
// Decoding
// ============================================================================

/// Decodes a CQ string into a chain.
///
/// Fails with [`CodecError::Unterminated`] when a `[CQ:` span has no closing
/// `]`, and with [`CodecError::InvalidSegment`] when a known segment type
/// carries fields that do not fit it.
pub fn decode(input: &str) -> CodecResult<Chain> {
    let mut segments = Vec::new();
    let mut rest = input;
    let mut offset = 0;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::text(unescape(&rest[..start])));
        }
        let body_start = start + OPEN.len();
        let Some(len) = rest[body_start..].find(']') else {
            return Err(CodecError::Unterminated {
                offset: offset + start,
            });
        };
        segments.push(decode_span(&rest[body_start..body_start + len])?);

        let consumed = body_start + len + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    if !rest.is_empty() {
        segments.push(Segment::text(unescape(rest)));
    }

    Ok(Chain::from(segments))
}

fn decode_span(body: &str) -> CodecResult<Segment> {
    let mut parts = body.split(',');
    let kind = unescape(parts.next().unwrap_or_default().trim());
    if kind.is_empty() {
        return Err(CodecError::InvalidSegment {
            kind,
            reason: "missing segment type".to_owned(),
        });
    }

    let mut data = Map::new();
    for part in parts.filter(|part| !part.is_empty()) {
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        data.insert(unescape(key), Value::String(unescape(value)));
    }
    Segment::from_parts(&kind, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{ImageData, MusicData};

    #[test]
    fn test_escape_round_trip() {
        for s in ["a&b", "[x],y", "&amp;", "&#91;&#44;", "plain", "&&[[]],,", ""] {
            assert_eq!(unescape(&escape(s)), s);
        }
        assert_eq!(escape("a,[b]&"), "a&#44;&#91;b&#93;&amp;");
    }

    #[test]
    fn test_unescape_single_pass() {
        assert_eq!(unescape("&amp;#91;"), "&#91;");
        assert_eq!(unescape("&unknown; &"), "&unknown; &");
    }

    #[test]
    fn test_encode_field_order_and_omission() {
        let image = Segment::Image(ImageData {
            file: "a,b.png".into(),
            image_type: Some("flash".into()),
            cache: Some(0),
            ..Default::default()
        });
        assert_eq!(
            encode([&image]),
            "[CQ:image,file=a&#44;b.png,type=flash,cache=0]"
        );
        assert_eq!(encode([&Segment::anonymous(false)]), "[CQ:anonymous]");
        assert_eq!(encode([&Segment::text("[hi]")]), "&#91;hi&#93;");
    }

    #[test]
    fn test_decode_mixed() {
        let chain = decode("Hello [CQ:face,id=178] World [CQ:at,qq=10001000]").unwrap();
        assert_eq!(
            chain.segments,
            vec![
                Segment::text("Hello "),
                Segment::face(178),
                Segment::text(" World "),
                Segment::at(10001000),
            ]
        );
    }

    #[test]
    fn test_decode_coerces_fields() {
        let chain = decode("[CQ:location,lat=39.9,lon=116.3][CQ:anonymous,ignore=1]").unwrap();
        let Segment::Location(loc) = &chain.segments[0] else {
            panic!("expected location");
        };
        assert_eq!(loc.lat, 39.9);
        assert_eq!(chain.segments[1], Segment::anonymous(true));

        let chain = decode("[CQ:music,type=qq,id=123]").unwrap();
        assert_eq!(
            chain.segments[0],
            Segment::music(MusicData::Qq { id: "123".into() })
        );
    }

    #[test]
    fn test_decode_unterminated() {
        assert_eq!(
            decode("ok [CQ:face,id=1").unwrap_err(),
            CodecError::Unterminated { offset: 3 }
        );
        assert_eq!(
            decode("[CQ:face,id=1]x[CQ:at").unwrap_err(),
            CodecError::Unterminated { offset: 15 }
        );
    }

    #[test]
    fn test_unknown_segment_passthrough() {
        let wire = "[CQ:mface,z=1,a=&#44;,m=3]";
        let chain = decode(wire).unwrap();
        assert_eq!(chain.segments[0].kind(), "mface");
        assert_eq!(encode(&chain.segments), wire);
    }

    #[test]
    fn test_round_trip() {
        let wire = "hi &amp; bye[CQ:reply,id=7][CQ:image,file=x.png,url=http://a/b?c=1&amp;d=2]";
        assert_eq!(encode(&decode(wire).unwrap().segments), wire);
    }

    #[test]
    fn test_text_commas_escaped() {
        assert_eq!(
            encode([&Segment::text("Hello, w=orld!&?")]),
            "Hello&#44; w=orld!&amp;?"
        );

        let chain = Chain::new()
            .text("a, b")
            .face(178)
            .text(",[x], y&")
            .at(10001000);
        let wire = chain.to_cq_string();
        assert_eq!(
            wire,
            "a&#44; b[CQ:face,id=178]&#44;&#91;x&#93;&#44; y&amp;[CQ:at,qq=10001000]"
        );
        assert_eq!(decode(&wire).unwrap(), chain);
    }

    #[test]
    fn test_node_recursion() {
        let inner = Chain::new().text("a,b").face(1);
        let node = Segment::node_custom(10001, "neko", inner.clone());
        let wire = encode([&node]);
        assert_eq!(
            wire,
            "[CQ:node,user_id=10001,nickname=neko,content=a&amp;#44;b&#91;CQ:face&#44;id=1&#93;]"
        );
        let decoded = decode(&wire).unwrap();
        assert_eq!(decoded.segments, vec![node]);
    }
}
