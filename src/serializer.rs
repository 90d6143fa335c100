//! The top-level entry point: an immutable [`SerializerOptions`] paired with
//! a shared [`ConverterCache`], exposing the whole-buffer and streaming
//! `serialize`/`deserialize` operations.
//!
//! An immutable builder plus a single long-lived value, minus the separate
//! byte-level `Serializer` trait some frameworks need — here a single [`Serializer`] value
//! serves every `T: Convert`, dispatching to the right [`Converter`] through
//! the shape-keyed cache instead of a generated per-field call chain.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::config::SerializerOptions;
use crate::context::SerializationContext;
use crate::converter::{Convert, Converter, ConverterCache};
use crate::error::Error;
use crate::io::{Position, SegmentedBuffer, Sink, VecSink};
use crate::reader::Reader;
use crate::writer::Writer;

/// Owns a policy set and the converter cache built against it. Cheap to
/// construct; expensive-to-build converters are memoized the first time each
/// shape is used and reused for the serializer's whole lifetime.
pub struct Serializer {
    options: SerializerOptions,
    cache: ConverterCache,
}

impl Serializer {
    /// Start a serializer with a fixed policy set and an empty converter
    /// cache.
    pub fn new(options: SerializerOptions) -> Self {
        Self { options, cache: ConverterCache::new() }
    }

    /// The policy set this serializer was built with.
    pub fn options(&self) -> &SerializerOptions {
        &self.options
    }

    pub(crate) fn context(&self) -> SerializationContext<'_> {
        SerializationContext::new(&self.options, &self.cache)
    }

    /// Encode `value` into a freshly allocated buffer.
    pub fn serialize<T: Convert>(&self, value: &T) -> Result<Vec<u8>, Error> {
        let mut sink = VecSink::new();
        self.serialize_into(&mut sink, value)?;
        Ok(sink.into_vec())
    }

    /// Encode `value` into a caller-supplied sink, for callers that already
    /// own a buffer (e.g. to append several values back to back, or to reuse
    /// one allocation across many calls).
    pub fn serialize_into<T: Convert>(&self, sink: &mut impl Sink, value: &T) -> Result<(), Error> {
        let ctx = self.context();
        self.cache.resolve::<T>().write(&mut Writer::new(sink), value, &ctx)
    }

    /// Decode a `T` from a complete, in-memory buffer. An incomplete buffer
    /// (one that ends mid-structure) is reported as a format error, since no
    /// more bytes are ever coming for a whole-buffer call.
    pub fn deserialize<T: Convert>(&self, bytes: &[u8]) -> Result<T, Error> {
        let buf = SegmentedBuffer::from_bytes(bytes.to_vec());
        self.deserialize_from(&buf)
    }

    /// Decode a `T` from the start of a caller-owned [`SegmentedBuffer`],
    /// e.g. one assembled incrementally by a pipe reader.
    pub fn deserialize_from<T: Convert>(&self, buf: &SegmentedBuffer) -> Result<T, Error> {
        let ctx = self.context();
        let mut r = Reader::new(buf, Position::ZERO);
        self.cache.resolve::<T>().read(&mut r, &ctx)
    }

    /// Override the converter the cache would otherwise build for `T`.
    ///
    /// Must be called before the first `serialize`/`deserialize` call that
    /// would touch `T` (directly or as a member/element/value of another
    /// type); once a shape's converter has been built and cached, later
    /// registrations for it are ignored by anything that already holds the
    /// old one.
    pub fn register_converter<T: 'static>(&self, converter: Rc<dyn Converter<T>>) {
        self.cache.insert(converter);
    }

    /// Override the converter a [`crate::shape::UnionModel`] type would
    /// otherwise build from its own `ENTRIES`, e.g. to remap aliases at
    /// runtime instead of at compile time. Same timing caveat as
    /// [`Self::register_converter`]; implemented in terms of it since a union
    /// mapping is, once built, just another `Converter<U>`.
    pub fn register_union_mapping<U: 'static>(&self, converter: Rc<dyn Converter<U>>) {
        self.register_converter(converter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DefaultValuePolicy;
    use crate::converter::UintConverter;
    use crate::error::ErrorKind;

    #[test]
    fn round_trips_a_primitive() {
        let serializer = Serializer::new(SerializerOptions::default());
        let bytes = serializer.serialize(&42u32).unwrap();
        assert_eq!(serializer.deserialize::<u32>(&bytes).unwrap(), 42);
    }

    #[test]
    fn round_trips_a_nullable_primitive() {
        let serializer = Serializer::new(SerializerOptions::default());
        let bytes = serializer.serialize(&Some(7u8)).unwrap();
        assert_eq!(serializer.deserialize::<Option<u8>>(&bytes).unwrap(), Some(7u8));
    }

    #[test]
    fn truncated_buffer_is_a_format_error_not_a_panic() {
        let serializer = Serializer::new(SerializerOptions::default());
        let bytes = serializer.serialize(&0x1_0000u32).unwrap();
        let err = serializer.deserialize::<u32>(&bytes[..bytes.len() - 1]).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidFormat { .. }));
    }

    #[test]
    fn registered_converter_overrides_the_default() {
        struct AlwaysZero;
        impl Converter<u32> for AlwaysZero {
            fn write(&self, w: &mut Writer<'_>, _value: &u32, _ctx: &SerializationContext) -> Result<(), Error> {
                w.write_u32(0);
                Ok(())
            }
            fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<u32, Error> {
                UintConverter::<u32>::default().read(r, ctx)
            }
        }
        let serializer = Serializer::new(SerializerOptions::default());
        serializer.register_converter::<u32>(Rc::new(AlwaysZero));
        let bytes = serializer.serialize(&99u32).unwrap();
        assert_eq!(serializer.deserialize::<u32>(&bytes).unwrap(), 0);
    }

    #[test]
    fn options_flow_through_to_converters() {
        let serializer =
            Serializer::new(SerializerOptions::default().with_serialize_default_values(DefaultValuePolicy::Always));
        assert_eq!(serializer.options().serialize_default_values, DefaultValuePolicy::Always);
    }
}
