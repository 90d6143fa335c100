//! The streaming layer: [`AsyncReader`]/[`AsyncWriter`] adapt
//! [`crate::serializer::Serializer`] to `tokio::io::{AsyncRead, AsyncWrite}`
//! pipes instead of whole in-memory buffers.
//!
//! Neither adapter type does its own cancellation bookkeeping; both take the
//! caller's [`crate::context::SerializationContext`], so a long-running
//! stream can be cancelled from the outside (`ctx.cancel()`) and have that
//! checked at the start of every read/write loop iteration, same as the
//! synchronous converters check it at every [`crate::context::SerializationContext::depth_step`].

mod reader;
mod writer;

pub use reader::AsyncReader;
pub use writer::AsyncWriter;

use tokio::io::{AsyncRead, AsyncWrite};

use crate::converter::Convert;
use crate::error::Error;
use crate::serializer::Serializer;

impl Serializer {
    /// Encode `value` to an async stream, going through the writer's scratch
    /// buffer and high-water-mark flush policy rather than one `poll_write`
    /// per value.
    pub async fn serialize_async<T: Convert>(
        &self,
        writer: &mut AsyncWriter<impl AsyncWrite + Unpin>,
        value: &T,
    ) -> Result<(), Error> {
        let ctx = self.context();
        writer.write_value(&ctx, value).await
    }

    /// Decode one value from an async stream, awaiting more bytes until a
    /// whole structure is buffered.
    pub async fn deserialize_async<T: Convert>(
        &self,
        reader: &mut AsyncReader<impl AsyncRead + Unpin>,
    ) -> Result<T, Error> {
        let ctx = self.context();
        reader.read_value(&ctx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;

    #[tokio::test]
    async fn serializer_round_trips_through_the_async_adapters() {
        let serializer = Serializer::new(SerializerOptions::default());
        let mut sink = Vec::new();
        {
            let mut w = AsyncWriter::new(&mut sink);
            serializer.serialize_async(&mut w, &7u32).await.unwrap();
            w.flush().await.unwrap();
        }
        let mut r = AsyncReader::new(sink.as_slice());
        let value: u32 = serializer.deserialize_async(&mut r).await.unwrap();
        assert_eq!(value, 7);
    }
}
