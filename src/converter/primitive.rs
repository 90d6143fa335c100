//! Built-in converters for msgpack scalars. These never allocate and work in
//! every feature configuration, unlike the collection/object converters.

use core::marker::PhantomData;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

/// A `()` that round-trips as a `nil` token.
#[derive(Debug, Default, Clone, Copy)]
pub struct NilConverter;

impl Converter<()> for NilConverter {
    fn write(&self, w: &mut Writer<'_>, _value: &(), ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        w.write_nil();
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        r.read_nil()
    }
}

/// A `bool` that round-trips as a `true`/`false` token.
#[derive(Debug, Default, Clone, Copy)]
pub struct BoolConverter;

impl Converter<bool> for BoolConverter {
    fn write(&self, w: &mut Writer<'_>, value: &bool, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        w.write_bool(*value);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<bool, Error> {
        let _guard = ctx.depth_step()?;
        r.read_bool()
    }
}

/// One unsigned integer width's [`Writer`]/[`Reader`] pair, so
/// [`UintConverter`] need be generic only once.
pub trait UintIo: Copy {
    /// Write `self` using the shortest exact unsigned form.
    fn write(self, w: &mut Writer<'_>);
    /// Read a token, coercing it into `Self`.
    fn read(r: &mut Reader<'_>) -> Result<Self, Error>;
}

macro_rules! impl_uint_io {
    ($ty:ty, $write:ident, $read:ident) => {
        impl UintIo for $ty {
            fn write(self, w: &mut Writer<'_>) {
                w.$write(self);
            }
            fn read(r: &mut Reader<'_>) -> Result<Self, Error> {
                r.$read()
            }
        }
    };
}

impl_uint_io!(u8, write_u8, read_u8);
impl_uint_io!(u16, write_u16, read_u16);
impl_uint_io!(u32, write_u32, read_u32);
impl_uint_io!(u64, write_u64, read_u64);

/// The converter for every unsigned integer width.
#[derive(Debug, Clone, Copy)]
pub struct UintConverter<T>(PhantomData<fn() -> T>);

impl<T> Default for UintConverter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: UintIo> Converter<T> for UintConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &T, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        value.write(w);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<T, Error> {
        let _guard = ctx.depth_step()?;
        T::read(r)
    }
}

/// One signed integer width's [`Writer`]/[`Reader`] pair, so
/// [`IntConverter`] need be generic only once.
pub trait IntIo: Copy {
    /// Write `self` using the shortest exact signed form.
    fn write(self, w: &mut Writer<'_>);
    /// Read a token, coercing it into `Self`.
    fn read(r: &mut Reader<'_>) -> Result<Self, Error>;
}

macro_rules! impl_int_io {
    ($ty:ty, $write:ident, $read:ident) => {
        impl IntIo for $ty {
            fn write(self, w: &mut Writer<'_>) {
                w.$write(self);
            }
            fn read(r: &mut Reader<'_>) -> Result<Self, Error> {
                r.$read()
            }
        }
    };
}

impl_int_io!(i8, write_i8, read_i8);
impl_int_io!(i16, write_i16, read_i16);
impl_int_io!(i32, write_i32, read_i32);
impl_int_io!(i64, write_i64, read_i64);

/// The converter for every signed integer width.
#[derive(Debug, Clone, Copy)]
pub struct IntConverter<T>(PhantomData<fn() -> T>);

impl<T> Default for IntConverter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: IntIo> Converter<T> for IntConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &T, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        value.write(w);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<T, Error> {
        let _guard = ctx.depth_step()?;
        T::read(r)
    }
}

/// One float width's [`Writer`]/[`Reader`] pair, so [`FloatConverter`] need
/// be generic only once.
pub trait FloatIo: Copy {
    /// Write `self` as its native-width token.
    fn write(self, w: &mut Writer<'_>);
    /// Read a token, widening `float32` if `Self` is `f64`.
    fn read(r: &mut Reader<'_>) -> Result<Self, Error>;
}

impl FloatIo for f32 {
    fn write(self, w: &mut Writer<'_>) {
        w.write_f32(self);
    }
    fn read(r: &mut Reader<'_>) -> Result<Self, Error> {
        r.read_f32()
    }
}

impl FloatIo for f64 {
    fn write(self, w: &mut Writer<'_>) {
        w.write_f64(self);
    }
    fn read(r: &mut Reader<'_>) -> Result<Self, Error> {
        r.read_f64()
    }
}

/// The converter for both float widths.
#[derive(Debug, Clone, Copy)]
pub struct FloatConverter<T>(PhantomData<fn() -> T>);

impl<T> Default for FloatConverter<T> {
    fn default() -> Self {
        Self(PhantomData)
    }
}

impl<T: FloatIo> Converter<T> for FloatConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &T, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        value.write(w);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<T, Error> {
        let _guard = ctx.depth_step()?;
        T::read(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::format::{decode_header, DecodedHeader};
    use crate::io::{Position, SegmentedBuffer, VecSink};

    #[test]
    fn uint_converter_round_trips() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = UintConverter::<u16>::default();
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &4000u16, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), 4000u16);
    }

    #[test]
    fn bool_converter_writes_single_token() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = BoolConverter;
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &true, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let (header, _) = decode_header(&buf, Position::ZERO).unwrap();
        assert_eq!(header, DecodedHeader::Bool(true));
    }
}
