//! Frame buffer for accumulating partial reads.
//!
//! Uses `bytes::BytesMut` for zero-copy buffer management.
//! Implements a state machine for handling fragmented frames:
//! - `WaitingForHeader`: header size is variable (2-14 bytes), so each push
//!   retries the header parse until it stops reporting truncation
//! - `WaitingForPayload`: header parsed, need N more payload bytes
//!
//! Each wire frame is yielded on its own. Continuation frames are not
//! merged into messages.
//!
//! # Example
//!
//! ```
//! use wsframe::protocol::{encode, EncodeOptions, FrameBuffer};
//!
//! let bytes = encode(b"hello", &EncodeOptions::default()).unwrap();
//!
//! let mut buffer = FrameBuffer::new();
//! assert!(buffer.push(&bytes[..3]).unwrap().is_empty());
//!
//! let frames = buffer.push(&bytes[3..]).unwrap();
//! assert_eq!(frames[0].payload(), b"hello");
//! ```

use bytes::{Bytes, BytesMut};

use super::mask::apply_mask;
use super::wire_format::FrameMetadata;
use super::Frame;
use crate::error::{FrameError, Result};

/// Default initial buffer capacity (64 KiB).
pub const DEFAULT_BUFFER_CAPACITY: usize = 64 * 1024;

/// State machine for frame parsing.
#[derive(Debug, Clone)]
enum State {
    /// Waiting for a complete header (2-14 bytes).
    WaitingForHeader,
    /// Header parsed, waiting for payload bytes.
    WaitingForPayload {
        metadata: FrameMetadata,
        remaining: usize,
    },
}

/// Buffer for accumulating incoming bytes and extracting complete frames.
///
/// All data is stored in a single `BytesMut` buffer to minimize allocations.
/// Payloads are unmasked in place before being handed out.
#[derive(Debug)]
pub struct FrameBuffer {
    /// Accumulated bytes from socket reads.
    buffer: BytesMut,
    /// Current parsing state.
    state: State,
}

impl FrameBuffer {
    /// Create a new frame buffer with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Create a new frame buffer with a custom initial capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
            state: State::WaitingForHeader,
        }
    }

    /// Push data into the buffer and extract all complete frames.
    ///
    /// Partial data is kept for the next push.
    ///
    /// # Errors
    ///
    /// Returns `LengthOverflow` if a header declares a payload larger than
    /// this platform can address.
    pub fn push(&mut self, data: &[u8]) -> Result<Vec<Frame>> {
        self.buffer.extend_from_slice(data);

        let mut frames = Vec::new();
        while let Some(frame) = self.next_frame()? {
            frames.push(frame);
        }

        Ok(frames)
    }

    /// Try to extract a single frame from the buffered bytes.
    ///
    /// Returns:
    /// - `Ok(Some(frame))` if a complete frame was extracted
    /// - `Ok(None)` if more data is needed
    /// - `Err(...)` if the declared length cannot be buffered
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        match &self.state {
            State::WaitingForHeader => {
                let metadata = match FrameMetadata::decode(&self.buffer) {
                    Ok(metadata) => metadata,
                    Err(FrameError::TruncatedFrame { .. }) => return Ok(None),
                    Err(e) => return Err(e),
                };

                let remaining = usize::try_from(metadata.length)
                    .map_err(|_| FrameError::LengthOverflow(metadata.length))?;

                // Consume header and masking key
                let _ = self.buffer.split_to(metadata.payload_offset);

                if remaining == 0 {
                    return Ok(Some(Frame::new(metadata, Bytes::new())));
                }

                self.state = State::WaitingForPayload {
                    metadata,
                    remaining,
                };

                // Try to get payload immediately
                self.next_frame()
            }

            State::WaitingForPayload {
                metadata,
                remaining,
            } => {
                if self.buffer.len() < *remaining {
                    return Ok(None);
                }

                let metadata = *metadata;
                let mut payload = self.buffer.split_to(*remaining);
                if let Some(key) = metadata.mask_key {
                    apply_mask(&mut payload, key);
                }

                self.state = State::WaitingForHeader;

                Ok(Some(Frame::new(metadata, payload.freeze())))
            }
        }
    }

    /// Append data to the buffer without extracting frames.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Get the number of buffered bytes.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Check if the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Check if a frame has been started but not finished.
    pub fn is_mid_frame(&self) -> bool {
        !self.buffer.is_empty() || matches!(self.state, State::WaitingForPayload { .. })
    }

    /// Clear the buffer and reset state.
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.state = State::WaitingForHeader;
    }

    #[cfg(test)]
    fn state_name(&self) -> &'static str {
        match &self.state {
            State::WaitingForHeader => "WaitingForHeader",
            State::WaitingForPayload { .. } => "WaitingForPayload",
        }
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{encode, encode_with_key, opcode, EncodeOptions};

    fn make_frame_bytes(op: u8, payload: &[u8]) -> Vec<u8> {
        encode(payload, &EncodeOptions::default().with_opcode(op)).unwrap()
    }

    #[test]
    fn test_single_complete_frame() {
        let mut buffer = FrameBuffer::new();
        let frames = buffer.push(&make_frame_bytes(opcode::TEXT, b"hello")).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].opcode(), opcode::TEXT);
        assert_eq!(frames[0].payload(), b"hello");
        assert!(buffer.is_empty());
        assert!(!buffer.is_mid_frame());
    }

    #[test]
    fn test_multiple_frames_in_one_push() {
        let mut buffer = FrameBuffer::new();

        let mut combined = Vec::new();
        combined.extend(make_frame_bytes(opcode::TEXT, b"first"));
        combined.extend(make_frame_bytes(opcode::BINARY, b"second"));
        combined.extend(make_frame_bytes(opcode::PING, b""));

        let frames = buffer.push(&combined).unwrap();

        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(frames[1].opcode(), opcode::BINARY);
        assert_eq!(frames[2].opcode(), opcode::PING);
        assert!(frames[2].payload().is_empty());
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_fragmented_extended_header() {
        let mut buffer = FrameBuffer::new();
        let payload = vec![0x11; 300];
        let frame_bytes = make_frame_bytes(opcode::BINARY, &payload);

        // Fixed bytes present, 16-bit length still missing
        let frames = buffer.push(&frame_bytes[..3]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert!(buffer.is_mid_frame());

        let frames = buffer.push(&frame_bytes[3..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), &payload[..]);
    }

    #[test]
    fn test_fragmented_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = b"this is a longer payload that will be fragmented";
        let frame_bytes = make_frame_bytes(opcode::TEXT, payload);

        let frames = buffer.push(&frame_bytes[..12]).unwrap();
        assert!(frames.is_empty());
        assert_eq!(buffer.state_name(), "WaitingForPayload");

        let frames = buffer.push(&frame_bytes[12..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), payload);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_masked_frame_split_inside_key() {
        let options = EncodeOptions::default().with_mask(true);
        let frame_bytes = encode_with_key(b"secret", &options, [0xA1, 0xB2, 0xC3, 0xD4]);

        let mut buffer = FrameBuffer::new();
        assert!(buffer.push(&frame_bytes[..4]).unwrap().is_empty());
        assert_eq!(buffer.state_name(), "WaitingForHeader");

        let frames = buffer.push(&frame_bytes[4..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"secret");
        assert!(frames[0].is_masked());
        assert_eq!(frames[0].metadata.mask_key, Some([0xA1, 0xB2, 0xC3, 0xD4]));
    }

    #[test]
    fn test_large_payload() {
        let mut buffer = FrameBuffer::new();
        let payload = vec![0xAB; 1024 * 1024];
        let frames = buffer.push(&make_frame_bytes(opcode::BINARY, &payload)).unwrap();

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].metadata.header_length, 10);
        assert_eq!(frames[0].payload_len(), 1024 * 1024);
        assert!(frames[0].payload().iter().all(|&b| b == 0xAB));
    }

    #[test]
    fn test_continuation_frames_not_merged() {
        let mut buffer = FrameBuffer::new();
        let mut data = encode(b"part1", &EncodeOptions::text().with_fin(false)).unwrap();
        let options = EncodeOptions::default().with_opcode(opcode::CONTINUATION);
        data.extend(encode(b"part2", &options).unwrap());

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 2);
        assert!(!frames[0].is_fin());
        assert_eq!(frames[1].opcode(), opcode::CONTINUATION);
        assert!(frames[1].is_fin());
    }

    #[test]
    fn test_clear_resets_state() {
        let mut buffer = FrameBuffer::new();
        let frame_bytes = make_frame_bytes(opcode::TEXT, b"test");

        buffer.push(&frame_bytes[..3]).unwrap();
        assert_eq!(buffer.state_name(), "WaitingForPayload");
        assert_eq!(buffer.len(), 1);

        buffer.clear();

        assert_eq!(buffer.state_name(), "WaitingForHeader");
        assert!(buffer.is_empty());
        assert!(!buffer.is_mid_frame());
    }

    #[test]
    fn test_mixed_complete_and_partial() {
        let mut buffer = FrameBuffer::new();

        let frame1 = make_frame_bytes(opcode::TEXT, b"first");
        let frame2 = make_frame_bytes(opcode::BINARY, b"second");

        let mut data = frame1.clone();
        data.extend_from_slice(&frame2[..1]);

        let frames = buffer.push(&data).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"first");
        assert_eq!(buffer.state_name(), "WaitingForHeader");

        let frames = buffer.push(&frame2[1..]).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload(), b"second");
    }

    #[test]
    fn test_byte_at_a_time() {
        let mut buffer = FrameBuffer::new();
        let options = EncodeOptions::default().with_mask(true);
        let frame_bytes = encode(&[0x42; 200], &options).unwrap();

        let mut all_frames = Vec::new();
        for byte in &frame_bytes {
            all_frames.extend(buffer.push(&[*byte]).unwrap());
        }

        assert_eq!(all_frames.len(), 1);
        assert_eq!(all_frames[0].payload(), &[0x42; 200][..]);
    }
}
