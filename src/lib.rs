//! # wsframe
//!
//! RFC 6455 WebSocket data framing for Rust.
//!
//! This crate encodes application payloads into WebSocket frames and decodes
//! received frames back into payload plus framing metadata. It runs after
//! the opening handshake and leaves connection lifecycle, fragment
//! reassembly, extensions and protocol-compliance checks to the caller.
//!
//! ## Layers
//!
//! - **Codec** ([`protocol`]): stateless `encode` / `decode` of one frame
//! - **Stream splitting** ([`FrameBuffer`]): complete frames out of partial reads
//! - **Async I/O** ([`stream`]): `FrameReader` / `FrameWriter` over tokio
//!
//! ## Example
//!
//! ```
//! use wsframe::{decode, encode, EncodeOptions};
//!
//! let bytes = encode(b"ping?", &EncodeOptions::default().with_mask(true)).unwrap();
//! let (payload, meta) = decode(&bytes).unwrap();
//!
//! assert_eq!(&payload[..], b"ping?");
//! assert!(meta.has_mask);
//! assert_eq!(meta.payload_offset, 6);
//! ```

pub mod error;
pub mod protocol;
pub mod stream;

pub use error::{FrameError, Result};
pub use protocol::{
    decode, decode_with, encode, encode_into, EncodeOptions, Frame, FrameBuffer, FrameMetadata,
    TruncationPolicy,
};
pub use stream::{FrameReader, FrameWriter};
