//! Framed I/O.
//!
//! Every logical unit on the wire is a 4-byte big-endian length prefix
//! followed by exactly that many payload bytes. Partial frames are never
//! returned to callers.

#![allow(clippy::missing_errors_doc)]

use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Error, Result};

/// Size of the length prefix.
const PREFIX_LEN: usize = 4;

/// Length-prefixed frame stream.
pub struct FramedStream<S> {
    stream: S,
    write_buffer: BytesMut,
    max_frame_size: usize,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream that rejects frames above `max_frame_size`.
    pub fn new(stream: S, max_frame_size: usize) -> Self {
        Self {
            stream,
            write_buffer: BytesMut::with_capacity(PREFIX_LEN + 256),
            max_frame_size,
        }
    }

    /// Reads one complete frame payload.
    pub async fn read_frame(&mut self) -> Result<Vec<u8>> {
        let len = self.stream.read_u32().await? as usize;
        if len > self.max_frame_size {
            return Err(Error::FrameTooLarge {
                len,
                max: self.max_frame_size,
            });
        }

        let mut payload = vec![0u8; len];
        self.stream.read_exact(&mut payload).await?;
        Ok(payload)
    }

    /// Writes one frame and flushes.
    pub async fn write_frame(&mut self, payload: &[u8]) -> Result<()> {
        let len = u32::try_from(payload.len()).map_err(|_| Error::FrameTooLarge {
            len: payload.len(),
            max: u32::MAX as usize,
        })?;

        self.write_buffer.clear();
        self.write_buffer.reserve(PREFIX_LEN + payload.len());
        self.write_buffer.put_u32(len);
        self.write_buffer.extend_from_slice(payload);

        self.stream.write_all(&self.write_buffer).await?;
        self.stream.flush().await?;
        Ok(())
    }

    /// Gets a reference to the underlying stream.
    pub const fn get_ref(&self) -> &S {
        &self.stream
    }

    /// Gets a mutable reference to the underlying stream.
    pub const fn get_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Consumes the framed stream and returns the inner stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}
