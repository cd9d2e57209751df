//! Protocol module - wire format, masking, and frame encode/decode.
//!
//! This module implements RFC 6455 data framing:
//! - 2/4/10-byte header encoding/decoding plus the optional masking key
//! - XOR masking with a per-frame random key
//! - Stateless `encode`/`decode` of single frames
//! - Frame buffer for splitting a byte stream into frames

mod frame;
mod frame_buffer;
mod mask;
mod wire_format;

pub use frame::{
    decode, decode_with, encode, encode_into, encode_with_key, EncodeOptions, Frame,
    TruncationPolicy,
};
pub use frame_buffer::{FrameBuffer, DEFAULT_BUFFER_CAPACITY};
pub use mask::{apply_mask, generate_mask_key};
pub use wire_format::{
    bits, decode_header, encode_header_into, opcode, FrameMetadata, LengthClass,
    LENGTH_16_MARKER, LENGTH_64_MARKER, MASK_KEY_SIZE, MAX_EXTENDED_16_LENGTH, MAX_HEADER_SIZE,
    MAX_INLINE_LENGTH, MIN_HEADER_SIZE,
};
