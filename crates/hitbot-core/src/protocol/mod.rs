//! Protocol module containing the event message types and the frame codec.

pub mod frame;
pub mod messages;

pub use frame::{classify, decode_frame, encode_event, Frame, FrameKind, FrameParseError};
pub use messages::*;
