//! Streaming decode over a [`tokio::io::AsyncRead`].
//!
//! There's no fixed frame length to read up front the way the pack's
//! length-prefixed protocol framing does it (see e.g. crazyscot-qcp's
//! `ProtocolMessage::from_reader_async_framed`, which reads a header that
//! names the payload size before reading the payload itself): a msgpack
//! structure's own nested headers are the only way to know how long it is.
//! So instead of "read N more, then read exactly that many bytes", this
//! reader re-probes the bytes it already has with [`Reader::try_skip`] after
//! every chunk, and only asks for more once that probe reports
//! [`Outcome::OutOfBuffer`].

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::context::SerializationContext;
use crate::converter::Convert;
use crate::error::{Error, ErrorKind};
use crate::format::Outcome;
use crate::io::{Position, SegmentedBuffer};
use crate::reader::Reader;

const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

/// Wraps an [`AsyncRead`] with the [`SegmentedBuffer`] a synchronous
/// [`Reader`] walks, growing it one chunk at a time until a full msgpack
/// structure is available.
///
/// Never holds a [`Reader`] across an `.await`: every probe builds one from
/// `head`, reads its outcome and its resulting [`Position`], and lets it drop
/// before the next read. Only one such rental is ever outstanding, and it is
/// always released (by copying its position back out, see
/// [`Reader::into_position`]) before this type's own async methods return.
pub struct AsyncReader<R> {
    inner: R,
    buf: SegmentedBuffer,
    head: Position,
    chunk_size: usize,
}

impl<R: AsyncRead + Unpin> AsyncReader<R> {
    /// Wrap `inner` with an empty buffer and the default chunk size.
    pub fn new(inner: R) -> Self {
        Self { inner, buf: SegmentedBuffer::new(), head: Position::ZERO, chunk_size: DEFAULT_CHUNK_SIZE }
    }

    /// Set how many bytes are requested from the underlying stream per
    /// `poll_read`, when the buffered data so far isn't enough.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Decode one value, awaiting more bytes from the underlying stream as
    /// needed. An end-of-stream reached mid-structure is reported as an
    /// error; use [`Self::try_read_value`] to distinguish a clean end from a
    /// truncated one.
    pub async fn read_value<T: Convert>(&mut self, ctx: &SerializationContext<'_>) -> Result<T, Error> {
        self.try_read_value(ctx).await?.ok_or_else(|| {
            ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(self.head),
                reason: "stream ended before a complete structure was received",
            }
            .into()
        })
    }

    /// Decode one value, or `None` if the stream ends cleanly (no bytes
    /// buffered or pending mid-structure) before another one arrives.
    pub async fn try_read_value<T: Convert>(&mut self, ctx: &SerializationContext<'_>) -> Result<Option<T>, Error> {
        let end = match self.next_structure_end(ctx).await? {
            Some(end) => end,
            None => return Ok(None),
        };
        let mut r = Reader::bounded(&self.buf, self.head, end);
        let value = ctx.converters().resolve::<T>().read(&mut r, ctx)?;
        self.head = r.into_position();
        self.head = self.buf.compact_before(self.head);
        Ok(Some(value))
    }

    async fn next_structure_end(&mut self, ctx: &SerializationContext<'_>) -> Result<Option<Position>, Error> {
        loop {
            if ctx.is_cancelled() {
                return Err(ErrorKind::Cancelled.into());
            }
            let (probe, end) = {
                let mut r = Reader::new(&self.buf, self.head);
                let probe = r.try_skip(ctx);
                (probe, r.position())
            };
            match probe {
                Outcome::Value(()) => return Ok(Some(end)),
                Outcome::Err(e) => return Err(e),
                Outcome::OutOfBuffer => {
                    if !self.fill_more().await? {
                        return if self.buf.remaining_len(self.head) == Some(0) {
                            Ok(None)
                        } else {
                            Err(ErrorKind::InvalidFormat {
                                byte_offset: self.buf.byte_offset(self.head),
                                reason: "stream ended before a complete structure was received",
                            }
                            .into())
                        };
                    }
                }
            }
        }
    }

    /// Read one chunk from the underlying stream into the buffer. Returns
    /// `false` on a clean end-of-stream (zero bytes read).
    async fn fill_more(&mut self) -> Result<bool, Error> {
        let mut chunk = BytesMut::zeroed(self.chunk_size);
        let n = self.inner.read(&mut chunk).await?;
        if n == 0 {
            return Ok(false);
        }
        chunk.truncate(n);
        self.buf.push_segment(chunk.freeze());
        Ok(true)
    }
}
