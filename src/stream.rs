//! Async frame reader and writer over tokio I/O.
//!
//! Thin adapters that put the codec on top of an `AsyncRead` / `AsyncWrite`
//! (typically the socket left over after the HTTP upgrade). They do not
//! answer pings, track close handshakes or merge fragments; every wire
//! frame is handed to the caller as-is.
//!
//! # Example
//!
//! ```
//! use wsframe::{EncodeOptions, FrameReader, FrameWriter};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> wsframe::Result<()> {
//! let (client, server) = tokio::io::duplex(1024);
//! let mut writer = FrameWriter::with_options(client, EncodeOptions::default().with_mask(true));
//! let mut reader = FrameReader::new(server);
//!
//! writer.write_frame(b"hello").await?;
//! let frame = reader.read_frame().await?.unwrap();
//! assert_eq!(frame.payload(), b"hello");
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{FrameError, Result};
use crate::protocol::{encode_into, EncodeOptions, Frame, FrameBuffer};

/// Default size of a single read from the underlying reader (64 KiB).
pub const DEFAULT_READ_CHUNK: usize = 64 * 1024;

/// Reads frames from an `AsyncRead`.
#[derive(Debug)]
pub struct FrameReader<R> {
    reader: R,
    buffer: FrameBuffer,
    chunk: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    /// Create a reader with the default read chunk size.
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_READ_CHUNK)
    }

    /// Create a reader that pulls at most `chunk_size` bytes per read.
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            buffer: FrameBuffer::new(),
            chunk: vec![0u8; chunk_size.max(1)],
        }
    }

    /// Read the next frame.
    ///
    /// Returns `Ok(None)` on a clean end of stream (between frames) and
    /// `ConnectionClosed` if the stream ends inside a frame.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            if let Some(frame) = self.buffer.next_frame()? {
                return Ok(Some(frame));
            }

            let n = self.reader.read(&mut self.chunk).await?;
            if n == 0 {
                if self.buffer.is_mid_frame() {
                    tracing::warn!(
                        "Stream closed mid-frame with {} bytes buffered",
                        self.buffer.len()
                    );
                    return Err(FrameError::ConnectionClosed);
                }
                return Ok(None);
            }

            self.buffer.extend(&self.chunk[..n]);
        }
    }

    /// Get a reference to the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Consume the frame reader, returning the underlying reader.
    ///
    /// Bytes already buffered but not yet returned as frames are dropped.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Writes frames to an `AsyncWrite`.
#[derive(Debug)]
pub struct FrameWriter<W> {
    writer: W,
    buf: BytesMut,
    options: EncodeOptions,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Create a writer producing final, unmasked text frames by default.
    pub fn new(writer: W) -> Self {
        Self::with_options(writer, EncodeOptions::default())
    }

    /// Create a writer with custom default framing options.
    pub fn with_options(writer: W, options: EncodeOptions) -> Self {
        Self {
            writer,
            buf: BytesMut::new(),
            options,
        }
    }

    /// Default options used by [`write_frame`](Self::write_frame).
    pub fn options(&self) -> &EncodeOptions {
        &self.options
    }

    /// Encode `payload` with the writer's options and write it out.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let options = self.options;
        self.write_frame_with(payload, &options).await
    }

    /// Encode `payload` with explicit options and write it out.
    ///
    /// Masked frames draw a fresh key per call.
    pub async fn write_frame_with(
        &mut self,
        payload: &[u8],
        options: &EncodeOptions,
    ) -> Result<()> {
        self.buf.clear();
        encode_into(&mut self.buf, payload, options)?;
        self.writer.write_all(&self.buf).await?;
        Ok(())
    }

    /// Flush the underlying writer.
    pub async fn flush(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }

    /// Get a reference to the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Consume the frame writer, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
