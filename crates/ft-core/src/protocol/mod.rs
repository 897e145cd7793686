pub mod frame;

pub use frame::{
    encode_offset, encode_plain, encode_png, encode_q7, encode_tiles, parse_frame, FrameError,
    FrameKind, Offset, ParsedFrame, DEFAULT_PORT, HEADER_RESERVE, MAX_DATAGRAM_SIZE,
};
