//! Converters for owned `String` and `Vec<u8>`, the allocating counterparts
//! to [`Reader::read_string`]/[`Reader::read_binary`]'s borrow-when-possible
//! API.

use alloc::string::String;
use alloc::vec::Vec;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

/// Converts `String`, always allocating on read (the borrowing fast path is
/// only available through [`Reader::read_string`] directly).
#[derive(Debug, Default, Clone, Copy)]
pub struct StringConverter;

impl Converter<String> for StringConverter {
    fn write(&self, w: &mut Writer<'_>, value: &String, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        w.write_string(value);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<String, Error> {
        let _guard = ctx.depth_step()?;
        Ok(r.read_string(ctx)?.into_owned())
    }
}

/// Converts `Vec<u8>`, always allocating on read.
#[derive(Debug, Default, Clone, Copy)]
pub struct BinaryConverter;

impl Converter<Vec<u8>> for BinaryConverter {
    fn write(&self, w: &mut Writer<'_>, value: &Vec<u8>, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        w.write_binary(value);
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<Vec<u8>, Error> {
        let _guard = ctx.depth_step()?;
        Ok(r.read_binary()?.into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::io::{Position, SegmentedBuffer, VecSink};

    #[test]
    fn string_round_trips() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = StringConverter;
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &String::from("hi"), &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), "hi");
    }
}
