//! The `Option<T>` wrapper converter: `None` as `nil`, `Some` delegated to
//! the inner converter.

use alloc::rc::Rc;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::Error;
use crate::format::TokenKind;
use crate::reader::Reader;
use crate::writer::Writer;

/// Wraps a `Converter<T>` into a `Converter<Option<T>>`.
pub struct NullableConverter<T> {
    inner: Rc<dyn Converter<T>>,
}

impl<T> NullableConverter<T> {
    /// Wrap `inner` so a `None` becomes `nil` and vice versa.
    pub fn new(inner: Rc<dyn Converter<T>>) -> Self {
        Self { inner }
    }
}

impl<T> Converter<Option<T>> for NullableConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &Option<T>, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        match value {
            None => {
                w.write_nil();
                Ok(())
            }
            Some(inner) => self.inner.write(w, inner, ctx),
        }
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<Option<T>, Error> {
        let _guard = ctx.depth_step()?;
        if matches!(r.try_peek_kind(), crate::format::Outcome::Value(TokenKind::Nil)) {
            r.read_nil()?;
            return Ok(None);
        }
        self.inner.read(r, ctx).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::converter::UintConverter;
    use crate::io::{Position, SegmentedBuffer, VecSink};

    #[test]
    fn none_round_trips_as_nil() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = NullableConverter::new(Rc::new(UintConverter::<u32>::default()) as Rc<dyn Converter<u32>>);
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &None, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), None);
    }

    #[test]
    fn some_round_trips_through_inner_converter() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = NullableConverter::new(Rc::new(UintConverter::<u32>::default()) as Rc<dyn Converter<u32>>);
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &Some(9u32), &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), Some(9u32));
    }
}
