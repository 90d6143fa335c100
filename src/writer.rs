//! The synchronous cursor a converter writes one msgpack structure through.

use crate::format;
use crate::io::Sink;

#[cfg(feature = "alloc")]
use crate::context::SerializationContext;

/// A cursor over a [`Sink`] that writes exactly one msgpack structure per
/// top-level call.
pub struct Writer<'a> {
    sink: &'a mut dyn Sink,
}

impl<'a> Writer<'a> {
    /// Wrap a sink for writing.
    pub fn new(sink: &'a mut impl Sink) -> Self {
        Self { sink }
    }

    /// The number of bytes written through this sink so far.
    pub fn len(&self) -> usize {
        self.sink.len()
    }

    /// Whether nothing has been written yet.
    pub fn is_empty(&self) -> bool {
        self.sink.is_empty()
    }

    /// Borrow at least `min_len` bytes of scratch space, for callers that
    /// already hold an encoded fragment (e.g. a pre-encoded member name).
    pub fn get_span(&mut self, min_len: usize) -> &mut [u8] {
        self.sink.get_span(min_len)
    }

    /// Commit `len` bytes of the span most recently returned by
    /// [`Self::get_span`].
    pub fn advance(&mut self, len: usize) {
        self.sink.advance(len)
    }

    /// Write a `nil` token.
    pub fn write_nil(&mut self) {
        format::write_nil(self.sink);
    }

    /// Write a `bool` token.
    pub fn write_bool(&mut self, value: bool) {
        format::write_bool(self.sink, value);
    }

    /// Write an unsigned integer using the shortest exact representation.
    pub fn write_u64(&mut self, value: u64) {
        format::write_u64(self.sink, value);
    }

    /// Write a signed integer using the shortest exact representation.
    pub fn write_i64(&mut self, value: i64) {
        format::write_i64(self.sink, value);
    }

    /// Write an `f32` token.
    pub fn write_f32(&mut self, value: f32) {
        format::write_f32(self.sink, value);
    }

    /// Write an `f64` token.
    pub fn write_f64(&mut self, value: f64) {
        format::write_f64(self.sink, value);
    }

    /// Write a complete UTF-8 string token.
    pub fn write_string(&mut self, value: &str) {
        format::write_str(self.sink, value.as_bytes());
    }

    /// Write a complete binary token.
    pub fn write_binary(&mut self, value: &[u8]) {
        format::write_bin(self.sink, value);
    }

    /// Write an array header of `len` elements.
    pub fn write_array_header(&mut self, len: u32) {
        format::write_array_header(self.sink, len);
    }

    /// Write a map header of `len` pairs.
    pub fn write_map_header(&mut self, len: u32) {
        format::write_map_header(self.sink, len);
    }

    /// Write a complete extension token.
    pub fn write_extension(&mut self, type_code: i8, payload: &[u8]) {
        format::write_extension(self.sink, type_code, payload);
    }

    /// Splice in an already-encoded msgpack structure verbatim, e.g. bytes
    /// previously captured by [`crate::reader::Reader::read_raw`].
    pub fn write_raw(&mut self, bytes: &[u8]) {
        let span = self.sink.get_span(bytes.len());
        span.copy_from_slice(bytes);
        let len = bytes.len();
        self.advance(len);
    }
}

macro_rules! impl_uint_writer {
    ($write:ident, $ty:ty) => {
        impl<'a> Writer<'a> {
            #[doc = concat!("Write a `", stringify!($ty), "` using the shortest exact unsigned representation.")]
            pub fn $write(&mut self, value: $ty) {
                self.write_u64(value as u64);
            }
        }
    };
}

macro_rules! impl_int_writer {
    ($write:ident, $ty:ty) => {
        impl<'a> Writer<'a> {
            #[doc = concat!("Write an `", stringify!($ty), "` using the shortest exact signed representation.")]
            pub fn $write(&mut self, value: $ty) {
                self.write_i64(value as i64);
            }
        }
    };
}

impl_uint_writer!(write_u8, u8);
impl_uint_writer!(write_u16, u16);
impl_uint_writer!(write_u32, u32);
impl_int_writer!(write_i8, i8);
impl_int_writer!(write_i16, i16);
impl_int_writer!(write_i32, i32);

/// A fixed-width msgpack scalar tag a [`Writer::write_primitive_array`]
/// element can carry, paired with its payload width in bytes.
pub trait FixedWidthTag: bytemuck::Pod {
    /// The leading byte every element is tagged with (not the shortest-form
    /// tag a scalar `write_*` would choose — the accelerated path commits to
    /// one fixed width for the whole array).
    const TAG: u8;
}

impl FixedWidthTag for u16 {
    const TAG: u8 = format::token::prefix::UINT16;
}
impl FixedWidthTag for u32 {
    const TAG: u8 = format::token::prefix::UINT32;
}
impl FixedWidthTag for u64 {
    const TAG: u8 = format::token::prefix::UINT64;
}
impl FixedWidthTag for i16 {
    const TAG: u8 = format::token::prefix::INT16;
}
impl FixedWidthTag for i32 {
    const TAG: u8 = format::token::prefix::INT32;
}
impl FixedWidthTag for i64 {
    const TAG: u8 = format::token::prefix::INT64;
}
impl FixedWidthTag for f32 {
    const TAG: u8 = format::token::prefix::FLOAT32;
}
impl FixedWidthTag for f64 {
    const TAG: u8 = format::token::prefix::FLOAT64;
}

#[cfg(feature = "alloc")]
impl<'a> Writer<'a> {
    /// Write a contiguous primitive array as an array header followed by one
    /// individually-tagged token per element (msgpack has no native
    /// fixed-width array format), committing every element to `T`'s full
    /// width instead of the shortest form a scalar `write_*` would pick.
    ///
    /// When acceleration is permitted, the byte-swap from native to
    /// big-endian is done as a single pass over the whole buffer via
    /// [`bytemuck::cast_slice`] rather than per element.
    pub fn write_primitive_array<T: FixedWidthTag>(&mut self, ctx: &SerializationContext, values: &[T]) {
        self.write_array_header(values.len() as u32);
        if ctx.options().disable_hardware_acceleration {
            for value in values {
                let mut bytes = bytemuck::bytes_of(value).to_vec();
                if cfg!(target_endian = "little") {
                    bytes.reverse();
                }
                self.sink.write_bytes(&[T::TAG]);
                self.sink.write_bytes(&bytes);
            }
            return;
        }
        let width = core::mem::size_of::<T>();
        let stride = 1 + width;
        let raw: &[u8] = bytemuck::cast_slice(values);
        let span = self.sink.get_span(values.len() * stride);
        for (out, chunk) in span.chunks_exact_mut(stride).zip(raw.chunks_exact(width)) {
            out[0] = T::TAG;
            out[1..].copy_from_slice(chunk);
            if cfg!(target_endian = "little") {
                out[1..].reverse();
            }
        }
        let written = span.len();
        self.advance(written);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{decode_header, DecodedHeader};
    use crate::io::{Position, SegmentedBuffer, VecSink};

    #[test]
    fn writes_scalars_in_order() {
        let mut sink = VecSink::new();
        {
            let mut w = Writer::new(&mut sink);
            w.write_u32(42);
            w.write_nil();
        }
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let (header, next) = decode_header(&buf, Position::ZERO).unwrap();
        assert_eq!(header, DecodedHeader::UInt(42));
        let (header, _) = decode_header(&buf, next).unwrap();
        assert_eq!(header, DecodedHeader::Nil);
    }

    #[test]
    fn raw_span_round_trips_with_get_span() {
        let mut sink = VecSink::new();
        {
            let mut w = Writer::new(&mut sink);
            let span = w.get_span(3);
            span.copy_from_slice(&[1, 2, 3]);
            w.advance(3);
        }
        assert_eq!(sink.as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn primitive_array_matches_element_by_element_encoding() {
        use crate::config::SerializerOptions;
        use crate::context::SerializationContext;
        use crate::converter::ConverterCache;

        let values: [u32; 3] = [1, 0x0100, 0x00010000];
        let opts_fast = SerializerOptions::default();
        let opts_slow = SerializerOptions::default().with_disable_hardware_acceleration(true);
        let cache = ConverterCache::new();

        let mut fast_sink = VecSink::new();
        Writer::new(&mut fast_sink).write_primitive_array(&SerializationContext::new(&opts_fast, &cache), &values);

        let mut slow_sink = VecSink::new();
        Writer::new(&mut slow_sink).write_primitive_array(&SerializationContext::new(&opts_slow, &cache), &values);

        assert_eq!(fast_sink.as_slice(), slow_sink.as_slice());

        let buf = SegmentedBuffer::from_bytes(fast_sink.into_vec());
        let (header, next) = decode_header(&buf, Position::ZERO).unwrap();
        assert_eq!(header, DecodedHeader::Array { len: 3 });
        let (header, next) = decode_header(&buf, next).unwrap();
        assert_eq!(header, DecodedHeader::UInt(1));
        let (header, _) = decode_header(&buf, next).unwrap();
        assert_eq!(header, DecodedHeader::UInt(0x0100));
    }
}
