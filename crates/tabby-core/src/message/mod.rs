//! Message content: segments, chains and the CQ-code wire form.
//!
//! - [`Segment`]: one typed unit of content, or [`Segment::Unknown`] for
//!   types this crate does not model
//! - [`Chain`]: an ordered list of segments
//! - [`cq`]: encoding and decoding of the flat CQ string form

mod chain;
pub mod cq;
pub(crate) mod de;
mod segment;

pub use chain::Chain;
pub use cq::{escape, unescape};
pub use segment::{
    AnonymousSegmentData, AtData, ContactData, ContactKind, CustomNode, FaceData, FileData,
    ForwardData, ImageData, JsonData, LocationData, MagicData, MusicData, NodeData,
    NodeReference, PokeData, RecordData, ReplyData, Segment, ShakeData, ShareData, TextData,
    VideoData, XmlData,
};
