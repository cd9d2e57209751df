//! Frame encoding and decoding.
//!
//! [`encode`] turns a payload plus [`EncodeOptions`] into wire bytes;
//! [`decode`] turns wire bytes back into the payload and its
//! [`FrameMetadata`]. Both are stateless and perform no protocol checks:
//! reserved bits, opcodes and the mask direction are carried as given.
//!
//! # Example
//!
//! ```
//! use wsframe::protocol::{decode, encode, EncodeOptions};
//!
//! let bytes = encode(b"Hi", &EncodeOptions::default()).unwrap();
//! assert_eq!(bytes, [0x81, 0x02, b'H', b'i']);
//!
//! let (payload, meta) = decode(&bytes).unwrap();
//! assert_eq!(&payload[..], b"Hi");
//! assert_eq!(meta.opcode, 1);
//! assert_eq!(meta.header_length, 2);
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use super::mask::{apply_mask, generate_mask_key};
use super::wire_format::{opcode, FrameMetadata, MASK_KEY_SIZE};
use crate::error::{FrameError, Result};

/// Options controlling how a payload is framed.
///
/// Deserializable so hosts can keep framing defaults in their own config;
/// missing fields take the defaults below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Opcode; only the low 4 bits are written. Default: 1 (text).
    pub opcode: u8,
    /// Final fragment flag. Default: true.
    pub fin: bool,
    /// Mask the payload with a fresh random key. Default: false.
    pub mask: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            opcode: opcode::TEXT,
            fin: true,
            mask: false,
        }
    }
}

impl EncodeOptions {
    /// Final, unmasked text frame.
    pub fn text() -> Self {
        Self::default()
    }

    /// Final, unmasked binary frame.
    pub fn binary() -> Self {
        Self::default().with_opcode(opcode::BINARY)
    }

    /// Set the opcode.
    pub fn with_opcode(mut self, opcode: u8) -> Self {
        self.opcode = opcode;
        self
    }

    /// Set the FIN flag.
    pub fn with_fin(mut self, fin: bool) -> Self {
        self.fin = fin;
        self
    }

    /// Enable or disable masking.
    pub fn with_mask(mut self, mask: bool) -> Self {
        self.mask = mask;
        self
    }
}

/// What [`decode_with`] does when the input holds fewer payload bytes than
/// the header declares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// Fail with `TruncatedFrame`.
    #[default]
    Reject,
    /// Return the payload bytes that are present. `FrameMetadata::length`
    /// still holds the declared length, so callers can spot the shortfall.
    Clip,
}

/// A decoded frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded header.
    pub metadata: FrameMetadata,
    /// Unmasked payload bytes.
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame from metadata and payload.
    pub fn new(metadata: FrameMetadata, payload: Bytes) -> Self {
        Self { metadata, payload }
    }

    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get a clone of the payload as Bytes (cheap, zero-copy).
    #[inline]
    pub fn payload_bytes(&self) -> Bytes {
        self.payload.clone()
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the opcode.
    #[inline]
    pub fn opcode(&self) -> u8 {
        self.metadata.opcode
    }

    /// Check if this is the final fragment.
    #[inline]
    pub fn is_fin(&self) -> bool {
        self.metadata.fin
    }

    /// Check if the frame arrived masked.
    #[inline]
    pub fn is_masked(&self) -> bool {
        self.metadata.has_mask
    }

    /// Check if this is a control frame.
    #[inline]
    pub fn is_control(&self) -> bool {
        self.metadata.is_control()
    }

    /// Check if fewer payload bytes are held than the header declared.
    /// Only possible after decoding with [`TruncationPolicy::Clip`].
    #[inline]
    pub fn is_truncated(&self) -> bool {
        (self.payload.len() as u64) < self.metadata.length
    }
}

/// Encode `payload` as a single frame.
///
/// When `options.mask` is set a fresh key is drawn for this call; a failing
/// random source yields `RandomnessUnavailable`. Unmasked encoding is
/// deterministic and cannot fail.
pub fn encode(payload: &[u8], options: &EncodeOptions) -> Result<Vec<u8>> {
    encode_keyed_by(payload, options, generate_mask_key)
}

/// Encode `payload` with a caller-supplied masking key.
///
/// The key is used only when `options.mask` is set. Meant for known-answer
/// tests and for callers that bring their own entropy source.
///
/// # Example
///
/// ```
/// use wsframe::protocol::{encode_with_key, EncodeOptions};
///
/// let options = EncodeOptions::default().with_mask(true);
/// let bytes = encode_with_key(b"Hello", &options, [0x37, 0xfa, 0x21, 0x3d]);
/// assert_eq!(
///     bytes,
///     [0x81, 0x85, 0x37, 0xfa, 0x21, 0x3d, 0x7f, 0x9f, 0x4d, 0x51, 0x58]
/// );
/// ```
pub fn encode_with_key(
    payload: &[u8],
    options: &EncodeOptions,
    key: [u8; MASK_KEY_SIZE],
) -> Vec<u8> {
    let mask_key = options.mask.then_some(key);
    build_frame(payload, options, mask_key)
}

/// Encode `payload` and append the frame to `buf`.
pub fn encode_into(buf: &mut BytesMut, payload: &[u8], options: &EncodeOptions) -> Result<()> {
    encode_into_keyed_by(buf, payload, options, generate_mask_key)
}

/// Decode the frame at the start of `frame` with the default
/// [`TruncationPolicy::Reject`].
///
/// Bytes past the end of the declared payload are ignored.
pub fn decode(frame: &[u8]) -> Result<(Bytes, FrameMetadata)> {
    decode_with(frame, TruncationPolicy::default())
}

/// Decode the frame at the start of `frame` with an explicit truncation
/// policy.
///
/// A frame too short to hold its own header (including the masking key)
/// fails with `TruncatedFrame` under either policy.
pub fn decode_with(frame: &[u8], policy: TruncationPolicy) -> Result<(Bytes, FrameMetadata)> {
    let metadata = FrameMetadata::decode(frame)?;
    let body = &frame[metadata.payload_offset..];

    let take = if body.len() as u64 >= metadata.length {
        metadata.length as usize
    } else {
        match policy {
            TruncationPolicy::Reject => {
                return Err(FrameError::TruncatedFrame {
                    needed: metadata.frame_length(),
                    available: frame.len(),
                });
            }
            TruncationPolicy::Clip => {
                tracing::debug!(
                    "Clipping truncated frame: declared {} payload bytes, {} present",
                    metadata.length,
                    body.len()
                );
                body.len()
            }
        }
    };

    let mut payload = BytesMut::from(&body[..take]);
    if let Some(key) = metadata.mask_key {
        apply_mask(&mut payload, key);
    }

    tracing::trace!(
        opcode = metadata.opcode,
        length = metadata.length,
        masked = metadata.has_mask,
        "decoded frame"
    );

    Ok((payload.freeze(), metadata))
}

fn encode_keyed_by<F>(payload: &[u8], options: &EncodeOptions, key_source: F) -> Result<Vec<u8>>
where
    F: FnOnce() -> Result<[u8; MASK_KEY_SIZE]>,
{
    let mask_key = masking_key(options, key_source)?;
    Ok(build_frame(payload, options, mask_key))
}

fn encode_into_keyed_by<F>(
    buf: &mut BytesMut,
    payload: &[u8],
    options: &EncodeOptions,
    key_source: F,
) -> Result<()>
where
    F: FnOnce() -> Result<[u8; MASK_KEY_SIZE]>,
{
    let mask_key = masking_key(options, key_source)?;
    let metadata = FrameMetadata::new(options.fin, options.opcode, payload.len() as u64, mask_key);
    buf.reserve(metadata.payload_offset + payload.len());
    write_frame(buf, &metadata, payload);
    Ok(())
}

/// `key_source` is only consulted for masked frames.
fn masking_key<F>(options: &EncodeOptions, key_source: F) -> Result<Option<[u8; MASK_KEY_SIZE]>>
where
    F: FnOnce() -> Result<[u8; MASK_KEY_SIZE]>,
{
    if options.mask {
        Ok(Some(key_source()?))
    } else {
        Ok(None)
    }
}

fn build_frame(
    payload: &[u8],
    options: &EncodeOptions,
    mask_key: Option<[u8; MASK_KEY_SIZE]>,
) -> Vec<u8> {
    let metadata = FrameMetadata::new(options.fin, options.opcode, payload.len() as u64, mask_key);
    let mut buf = Vec::with_capacity(metadata.payload_offset + payload.len());
    write_frame(&mut buf, &metadata, payload);
    buf
}

fn write_frame<B>(buf: &mut B, metadata: &FrameMetadata, payload: &[u8])
where
    B: BufMut + AsMut<[u8]>,
{
    metadata.encode_into(buf);
    let start = buf.as_mut().len();
    buf.put_slice(payload);
    if let Some(key) = metadata.mask_key {
        apply_mask(&mut buf.as_mut()[start..], key);
    }

    tracing::trace!(
        opcode = metadata.opcode,
        length = metadata.length,
        masked = metadata.has_mask,
        "encoded frame"
    );
}
