mod buffering;
mod decoder;
mod sse_parser;

pub use buffering::FrameBuffer;
pub use decoder::Utf8Decoder;
pub use sse_parser::{parse_payload, parse_record, Frame, DONE_MARKER};
