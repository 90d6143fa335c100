//! Streaming encode over a [`tokio::io::AsyncWrite`].
//!
//! Grounded on the pack's chunked-flush style (ebkalderon's `Chunker`, which
//! accumulates into a fixed-capacity buffer and only calls through to the
//! underlying sink once that buffer fills): values are encoded synchronously
//! into an in-memory scratch [`VecSink`], and only flushed to the async
//! stream once the scratch buffer crosses a high-water mark, so a run of
//! small values costs one `poll_write` instead of one per value.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::context::SerializationContext;
use crate::converter::Convert;
use crate::error::Error;
use crate::io::{Sink, VecSink};
use crate::writer::Writer;

const DEFAULT_HIGH_WATER_MARK: usize = 64 * 1024;

/// Wraps an [`AsyncWrite`] with a scratch buffer that a synchronous
/// [`Writer`] encodes into; flushed to the stream once it grows past a
/// configurable high-water mark, or on an explicit [`Self::flush`].
pub struct AsyncWriter<W> {
    inner: W,
    scratch: VecSink,
    high_water_mark: usize,
}

impl<W: AsyncWrite + Unpin> AsyncWriter<W> {
    /// Wrap `inner` with an empty scratch buffer and the default high-water
    /// mark (64 KiB).
    pub fn new(inner: W) -> Self {
        Self { inner, scratch: VecSink::new(), high_water_mark: DEFAULT_HIGH_WATER_MARK }
    }

    /// Set the scratch buffer size that triggers an automatic flush.
    pub fn with_high_water_mark(mut self, bytes: usize) -> Self {
        self.high_water_mark = bytes;
        self
    }

    /// Encode `value` into the scratch buffer, flushing to the underlying
    /// stream first if it's already at or past the high-water mark.
    pub async fn write_value<T: Convert>(&mut self, ctx: &SerializationContext<'_>, value: &T) -> Result<(), Error> {
        if self.scratch.len() >= self.high_water_mark {
            self.flush().await?;
        }
        ctx.converters().resolve::<T>().write(&mut Writer::new(&mut self.scratch), value, ctx)
    }

    /// Write every buffered byte out to the underlying stream.
    pub async fn flush(&mut self) -> Result<(), Error> {
        if self.scratch.is_empty() {
            return Ok(());
        }
        let pending = core::mem::replace(&mut self.scratch, VecSink::new());
        self.inner.write_all(pending.as_slice()).await?;
        self.inner.flush().await?;
        Ok(())
    }

    /// Flush, then shut the underlying stream down.
    pub async fn shutdown(mut self) -> Result<(), Error> {
        self.flush().await?;
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::converter::ConverterCache;

    #[tokio::test]
    async fn buffers_until_the_high_water_mark_then_flushes() {
        // positive fixints encode as a single raw byte each; the third write
        // should trigger a flush of the first two before it's itself buffered.
        let io = tokio_test::io::Builder::new().write(&[1, 2]).write(&[3]).build();
        let mut writer = AsyncWriter::new(io).with_high_water_mark(2);
        let opts = SerializerOptions::default();
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        writer.write_value(&ctx, &1u8).await.unwrap();
        writer.write_value(&ctx, &2u8).await.unwrap();
        writer.write_value(&ctx, &3u8).await.unwrap();
        writer.flush().await.unwrap();
    }

    #[tokio::test]
    async fn shutdown_flushes_pending_bytes() {
        let io = tokio_test::io::Builder::new().write(&[42]).build();
        let mut writer = AsyncWriter::new(io);
        let opts = SerializerOptions::default();
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        writer.write_value(&ctx, &42u8).await.unwrap();
        writer.shutdown().await.unwrap();
    }
}
