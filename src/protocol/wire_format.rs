//! Wire format encoding and decoding.
//!
//! Implements the RFC 6455 base framing header:
//! ```text
//! ┌─────┬──────┬──────┬──────┬────────┬──────┬───────┬─────────────┬────────────┐
//! │ FIN │ RSV1 │ RSV2 │ RSV3 │ OPCODE │ MASK │ LEN7  │ LEN16/LEN64 │ MASK KEY   │
//! │ 1   │ 1    │ 1    │ 1    │ 4 bits │ 1    │ 7 bits│ 0, 2 or 8 B │ 0 or 4 B   │
//! └─────┴──────┴──────┴──────┴────────┴──────┴───────┴─────────────┴────────────┘
//! ```
//!
//! Extended lengths are Big Endian. The header is 2, 4 or 10 bytes long,
//! followed by the 4-byte masking key when the MASK bit is set.

use bytes::BufMut;

use crate::error::{FrameError, Result};

/// Smallest possible header (two fixed bytes, no extended length).
pub const MIN_HEADER_SIZE: usize = 2;

/// Largest possible header, not counting the masking key.
pub const MAX_HEADER_SIZE: usize = 10;

/// Masking key size in bytes.
pub const MASK_KEY_SIZE: usize = 4;

/// Largest length that fits directly in the 7-bit length field.
pub const MAX_INLINE_LENGTH: u64 = 125;

/// Largest length carried by the 16-bit extended field.
pub const MAX_EXTENDED_16_LENGTH: u64 = u16::MAX as u64;

/// LEN7 marker announcing a 16-bit extended length.
pub const LENGTH_16_MARKER: u8 = 126;

/// LEN7 marker announcing a 64-bit extended length.
pub const LENGTH_64_MARKER: u8 = 127;

/// Bit masks for the two fixed header bytes.
pub mod bits {
    /// Byte 0: final fragment.
    pub const FIN: u8 = 0b1000_0000;
    /// Byte 0: reserved bit 1 (extensions).
    pub const RSV1: u8 = 0b0100_0000;
    /// Byte 0: reserved bit 2 (extensions).
    pub const RSV2: u8 = 0b0010_0000;
    /// Byte 0: reserved bit 3 (extensions).
    pub const RSV3: u8 = 0b0001_0000;
    /// Byte 0: opcode nibble.
    pub const OPCODE: u8 = 0b0000_1111;

    /// Byte 1: payload is masked.
    pub const MASK: u8 = 0b1000_0000;
    /// Byte 1: 7-bit length field.
    pub const LENGTH: u8 = 0b0111_1111;

    /// Check if a specific bit is set.
    #[inline]
    pub fn has_bit(byte: u8, bit: u8) -> bool {
        byte & bit != 0
    }
}

/// Opcode values named by RFC 6455.
///
/// These are plain constants for callers. The codec itself never interprets
/// an opcode; any value 0-15 is carried through unchanged.
pub mod opcode {
    /// Continuation of a fragmented message.
    pub const CONTINUATION: u8 = 0x0;
    /// UTF-8 text data.
    pub const TEXT: u8 = 0x1;
    /// Binary data.
    pub const BINARY: u8 = 0x2;
    /// Connection close.
    pub const CLOSE: u8 = 0x8;
    /// Ping.
    pub const PING: u8 = 0x9;
    /// Pong.
    pub const PONG: u8 = 0xA;

    /// Check if an opcode falls in the control range (0x8-0xF).
    #[inline]
    pub fn is_control(opcode: u8) -> bool {
        opcode & 0x08 != 0
    }
}

/// Which header size a payload length requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthClass {
    /// 0..=125, stored in the 7-bit field.
    Inline,
    /// 126..=65535, stored as u16 after the marker 126.
    Extended16,
    /// 65536 and up, stored as u64 after the marker 127.
    Extended64,
}

impl LengthClass {
    /// Pick the smallest length class able to carry `length`.
    #[inline]
    pub fn for_length(length: u64) -> Self {
        if length <= MAX_INLINE_LENGTH {
            LengthClass::Inline
        } else if length <= MAX_EXTENDED_16_LENGTH {
            LengthClass::Extended16
        } else {
            LengthClass::Extended64
        }
    }

    /// Header length (without masking key) for this class: 2, 4 or 10.
    #[inline]
    pub fn header_length(self) -> usize {
        match self {
            LengthClass::Inline => 2,
            LengthClass::Extended16 => 4,
            LengthClass::Extended64 => MAX_HEADER_SIZE,
        }
    }
}

/// Framing metadata of a single frame.
///
/// Produced by the decoder; also used by the encoder to lay out a header.
/// Reserved bits and opcode are carried as-is, with no protocol checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameMetadata {
    /// Final fragment flag.
    pub fin: bool,
    /// Reserved bit 1.
    pub rsv1: bool,
    /// Reserved bit 2.
    pub rsv2: bool,
    /// Reserved bit 3.
    pub rsv3: bool,
    /// Opcode, 0-15.
    pub opcode: u8,
    /// MASK bit.
    pub has_mask: bool,
    /// Declared payload length in bytes.
    pub length: u64,
    /// Offset of the first payload byte within the raw frame.
    pub payload_offset: usize,
    /// Header length without the masking key: 2, 4 or 10.
    pub header_length: usize,
    /// Masking key, present iff `has_mask`.
    pub mask_key: Option<[u8; MASK_KEY_SIZE]>,
}

impl FrameMetadata {
    /// Lay out metadata for an outgoing frame.
    ///
    /// Only the low 4 bits of `opcode` are kept; higher bits are dropped.
    /// Reserved bits are cleared and the header uses the smallest length
    /// class for `length`.
    pub fn new(fin: bool, opcode: u8, length: u64, mask_key: Option<[u8; MASK_KEY_SIZE]>) -> Self {
        let header_length = LengthClass::for_length(length).header_length();
        let has_mask = mask_key.is_some();
        Self {
            fin,
            rsv1: false,
            rsv2: false,
            rsv3: false,
            opcode: opcode & bits::OPCODE,
            has_mask,
            length,
            payload_offset: payload_offset(header_length, has_mask),
            header_length,
            mask_key,
        }
    }

    /// Total frame size: header, masking key and declared payload.
    ///
    /// Saturates at `u64::MAX` when the declared length leaves no room for
    /// the header, so it is only exact for lengths below
    /// `u64::MAX - payload_offset`.
    #[inline]
    pub fn frame_length(&self) -> u64 {
        (self.payload_offset as u64).saturating_add(self.length)
    }

    /// Check if the opcode falls in the control range.
    #[inline]
    pub fn is_control(&self) -> bool {
        opcode::is_control(self.opcode)
    }

    /// Write the header (and masking key, if any) into `buf`.
    ///
    /// The length field is written from `self.length` using the smallest
    /// length class; `header_length` and `payload_offset` are not consulted.
    pub fn encode_into<B: BufMut>(&self, buf: &mut B) {
        let mut first = self.opcode & bits::OPCODE;
        if self.fin {
            first |= bits::FIN;
        }
        if self.rsv1 {
            first |= bits::RSV1;
        }
        if self.rsv2 {
            first |= bits::RSV2;
        }
        if self.rsv3 {
            first |= bits::RSV3;
        }
        buf.put_u8(first);

        let mask_bit = if self.mask_key.is_some() { bits::MASK } else { 0 };
        match LengthClass::for_length(self.length) {
            LengthClass::Inline => buf.put_u8(mask_bit | self.length as u8),
            LengthClass::Extended16 => {
                buf.put_u8(mask_bit | LENGTH_16_MARKER);
                buf.put_u16(self.length as u16);
            }
            LengthClass::Extended64 => {
                buf.put_u8(mask_bit | LENGTH_64_MARKER);
                buf.put_u64(self.length);
            }
        }

        if let Some(key) = self.mask_key {
            buf.put_slice(&key);
        }
    }

    /// Decode the header at the start of `buf`.
    ///
    /// Needs `payload_offset` bytes: the fixed header, any extended length
    /// and the masking key. Returns `TruncatedFrame` if fewer are present.
    /// Payload bytes are not required. Non-minimal length encodings are
    /// accepted and reported as sent.
    ///
    /// # Example
    ///
    /// ```
    /// use wsframe::protocol::FrameMetadata;
    ///
    /// let meta = FrameMetadata::decode(&[0x81, 0x02, b'H', b'i']).unwrap();
    /// assert!(meta.fin);
    /// assert_eq!(meta.opcode, 1);
    /// assert_eq!(meta.length, 2);
    /// assert_eq!(meta.payload_offset, 2);
    /// ```
    pub fn decode(buf: &[u8]) -> Result<Self> {
        ensure_available(buf, MIN_HEADER_SIZE)?;

        let first = buf[0];
        let second = buf[1];
        let has_mask = bits::has_bit(second, bits::MASK);

        let (length, header_length) = match second & bits::LENGTH {
            LENGTH_16_MARKER => {
                ensure_available(buf, 4)?;
                (u16::from_be_bytes([buf[2], buf[3]]) as u64, 4)
            }
            LENGTH_64_MARKER => {
                ensure_available(buf, MAX_HEADER_SIZE)?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(&buf[2..MAX_HEADER_SIZE]);
                (u64::from_be_bytes(raw), MAX_HEADER_SIZE)
            }
            inline => (inline as u64, MIN_HEADER_SIZE),
        };

        let payload_offset = payload_offset(header_length, has_mask);
        let mask_key = if has_mask {
            ensure_available(buf, payload_offset)?;
            let mut key = [0u8; MASK_KEY_SIZE];
            key.copy_from_slice(&buf[header_length..payload_offset]);
            Some(key)
        } else {
            None
        };

        Ok(Self {
            fin: bits::has_bit(first, bits::FIN),
            rsv1: bits::has_bit(first, bits::RSV1),
            rsv2: bits::has_bit(first, bits::RSV2),
            rsv3: bits::has_bit(first, bits::RSV3),
            opcode: first & bits::OPCODE,
            has_mask,
            length,
            payload_offset,
            header_length,
            mask_key,
        })
    }
}

#[inline]
fn payload_offset(header_length: usize, has_mask: bool) -> usize {
    if has_mask {
        header_length + MASK_KEY_SIZE
    } else {
        header_length
    }
}

#[inline]
fn ensure_available(buf: &[u8], needed: usize) -> Result<()> {
    if buf.len() < needed {
        return Err(FrameError::TruncatedFrame {
            needed: needed as u64,
            available: buf.len(),
        });
    }
    Ok(())
}

/// Encode a frame header into `buf` (standalone function).
#[inline]
pub fn encode_header_into<B: BufMut>(buf: &mut B, metadata: &FrameMetadata) {
    metadata.encode_into(buf);
}

/// Decode a frame header from bytes (standalone function).
#[inline]
pub fn decode_header(buf: &[u8]) -> Result<FrameMetadata> {
    FrameMetadata::decode(buf)
}
