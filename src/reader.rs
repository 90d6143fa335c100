//! The synchronous cursor a converter reads one msgpack structure through.

#[cfg(feature = "alloc")]
use alloc::borrow::Cow;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::context::SerializationContext;
use crate::error::{Error, ErrorKind};
use crate::format::{self, DecodedHeader, Outcome, TokenKind};
use crate::io::{Position, SegmentedBuffer};

/// A cursor over a [`SegmentedBuffer`] that reads exactly one msgpack
/// structure per call, advancing as it goes.
///
/// `end` bounds the reader to a sub-window of the buffer (used when a caller
/// has already located a structure's byte span, e.g. via [`Reader::read_raw`]
/// or the async layer's buffered-reader rental); `None` means "read until the
/// buffer runs out."
pub struct Reader<'a> {
    buf: &'a SegmentedBuffer,
    end: Option<Position>,
    consumed: Position,
}

impl<'a> Reader<'a> {
    /// Create a reader starting at `start`, unbounded.
    pub fn new(buf: &'a SegmentedBuffer, start: Position) -> Self {
        Self { buf, end: None, consumed: start }
    }

    /// Create a reader bounded to `[start, end)`.
    pub fn bounded(buf: &'a SegmentedBuffer, start: Position, end: Position) -> Self {
        Self { buf, end: Some(end), consumed: start }
    }

    /// The position the next read will start from.
    pub fn position(&self) -> Position {
        self.consumed
    }

    /// Copy this reader's consumed position back into the caller's own state.
    /// The idiom the async layer uses to make progress visible across an
    /// `await` point ("returning" the reader).
    pub fn into_position(self) -> Position {
        self.consumed
    }

    fn within_bound(&self, pos: Position) -> bool {
        match self.end {
            Some(end) => pos <= end,
            None => true,
        }
    }

    fn decode(&self) -> Outcome<(DecodedHeader, Position)> {
        if let Some(end) = self.end {
            if self.consumed >= end {
                return Outcome::OutOfBuffer;
            }
        }
        format::try_decode_header(self.buf, self.consumed)
    }

    fn commit(&mut self, pos: Position) -> Result<(), Error> {
        if !self.within_bound(pos) {
            return Err(ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(pos),
                reason: "structure extends past the reader's bound",
            }
            .into());
        }
        self.consumed = pos;
        Ok(())
    }

    fn into_result<T>(&self, outcome: Outcome<T>) -> Result<T, Error> {
        outcome.into_result(self.consumed, self.buf)
    }

    /// The byte offset the next read will start from, for error construction
    /// by callers that peek before committing to a read.
    pub fn byte_offset(&self) -> u64 {
        self.buf.byte_offset(self.consumed)
    }

    /// The kind of the next token, without consuming it.
    pub fn peek_kind(&self) -> Result<TokenKind, Error> {
        self.into_result(self.try_peek_kind())
    }

    /// The kind of the next token, without consuming it, tolerating an
    /// incomplete buffer.
    pub fn try_peek_kind(&self) -> Outcome<TokenKind> {
        self.decode().map(|(header, _)| header.kind())
    }
}

macro_rules! expect_kind {
    ($self:ident, $header:expr, $next:expr, $pat:pat => $out:expr) => {
        match $header {
            $pat => {
                $self.commit($next)?;
                Ok($out)
            }
            other => Err(ErrorKind::InvalidFormat {
                byte_offset: $self.buf.byte_offset($self.consumed),
                reason: wrong_kind_reason(other.kind()),
            }
            .into()),
        }
    };
}

fn wrong_kind_reason(found: TokenKind) -> &'static str {
    match found {
        TokenKind::Nil => "found nil where a different token was expected",
        TokenKind::Bool => "found bool where a different token was expected",
        TokenKind::UInt | TokenKind::Int => "found integer where a different token was expected",
        TokenKind::F32 | TokenKind::F64 => "found float where a different token was expected",
        TokenKind::Str => "found string where a different token was expected",
        TokenKind::Bin => "found binary where a different token was expected",
        TokenKind::Array => "found array where a different token was expected",
        TokenKind::Map => "found map where a different token was expected",
        TokenKind::Extension => "found extension where a different token was expected",
    }
}

fn out_of_range(value: i128, to: &'static str) -> Error {
    ErrorKind::OutOfRange { from: value, to }.into()
}

impl<'a> Reader<'a> {
    /// Consume a `nil` token.
    pub fn read_nil(&mut self) -> Result<(), Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        expect_kind!(self, header, next, DecodedHeader::Nil => ())
    }

    /// Consume a `bool` token.
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        expect_kind!(self, header, next, DecodedHeader::Bool(v) => v)
    }

    fn read_raw_uint(&mut self) -> Result<(u64, Position), Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        match header {
            DecodedHeader::UInt(v) => Ok((v, next)),
            DecodedHeader::Int(v) if v >= 0 => Ok((v as u64, next)),
            other => Err(ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(self.consumed),
                reason: wrong_kind_reason(other.kind()),
            }
            .into()),
        }
    }

    fn read_raw_int(&mut self) -> Result<(i64, Position), Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        match header {
            DecodedHeader::Int(v) => Ok((v, next)),
            DecodedHeader::UInt(v) if v <= i64::MAX as u64 => Ok((v as i64, next)),
            DecodedHeader::UInt(v) => Err(out_of_range(v as i128, "i64")),
            other => Err(ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(self.consumed),
                reason: wrong_kind_reason(other.kind()),
            }
            .into()),
        }
    }

    /// Consume an `f32` token. Only an exact `float32` wire token is
    /// accepted; widening a `float64` would silently lose precision.
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        expect_kind!(self, header, next, DecodedHeader::F32(v) => v)
    }

    /// Consume an `f64` token, widening a `float32` token if present.
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        match header {
            DecodedHeader::F64(v) => {
                self.commit(next)?;
                Ok(v)
            }
            DecodedHeader::F32(v) => {
                self.commit(next)?;
                Ok(v as f64)
            }
            other => Err(ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(self.consumed),
                reason: wrong_kind_reason(other.kind()),
            }
            .into()),
        }
    }

    /// Consume an array header, returning its element count.
    pub fn read_array_header(&mut self) -> Result<u32, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        expect_kind!(self, header, next, DecodedHeader::Array { len } => len)
    }

    /// Consume a map header, returning its pair count.
    pub fn read_map_header(&mut self) -> Result<u32, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        expect_kind!(self, header, next, DecodedHeader::Map { len } => len)
    }
}

macro_rules! impl_uint_reader {
    ($read:ident, $try_read:ident, $ty:ty, $name:literal) => {
        impl<'a> Reader<'a> {
            #[doc = concat!("Consume an unsigned integer token, coercing into `", $name, "`.")]
            pub fn $read(&mut self) -> Result<$ty, Error> {
                let (value, next) = self.read_raw_uint()?;
                let coerced = <$ty>::try_from(value).map_err(|_| out_of_range(value as i128, $name))?;
                self.commit(next)?;
                Ok(coerced)
            }

            #[doc = concat!("Tolerant variant of [`Reader::", stringify!($read), "`].")]
            pub fn $try_read(&mut self) -> Outcome<$ty> {
                match self.decode() {
                    Outcome::Value(_) => Outcome::Value(match self.$read() {
                        Ok(v) => v,
                        Err(e) => return Outcome::Err(e),
                    }),
                    Outcome::OutOfBuffer => Outcome::OutOfBuffer,
                    Outcome::Err(e) => Outcome::Err(e),
                }
            }
        }
    };
}

macro_rules! impl_int_reader {
    ($read:ident, $try_read:ident, $ty:ty, $name:literal) => {
        impl<'a> Reader<'a> {
            #[doc = concat!("Consume a signed integer token, coercing into `", $name, "`.")]
            pub fn $read(&mut self) -> Result<$ty, Error> {
                let (value, next) = self.read_raw_int()?;
                let coerced = <$ty>::try_from(value).map_err(|_| out_of_range(value as i128, $name))?;
                self.commit(next)?;
                Ok(coerced)
            }

            #[doc = concat!("Tolerant variant of [`Reader::", stringify!($read), "`].")]
            pub fn $try_read(&mut self) -> Outcome<$ty> {
                match self.decode() {
                    Outcome::Value(_) => Outcome::Value(match self.$read() {
                        Ok(v) => v,
                        Err(e) => return Outcome::Err(e),
                    }),
                    Outcome::OutOfBuffer => Outcome::OutOfBuffer,
                    Outcome::Err(e) => Outcome::Err(e),
                }
            }
        }
    };
}

impl_uint_reader!(read_u8, try_read_u8, u8, "u8");
impl_uint_reader!(read_u16, try_read_u16, u16, "u16");
impl_uint_reader!(read_u32, try_read_u32, u32, "u32");
impl_uint_reader!(read_u64, try_read_u64, u64, "u64");
impl_int_reader!(read_i8, try_read_i8, i8, "i8");
impl_int_reader!(read_i16, try_read_i16, i16, "i16");
impl_int_reader!(read_i32, try_read_i32, i32, "i32");
impl_int_reader!(read_i64, try_read_i64, i64, "i64");

#[cfg(feature = "alloc")]
impl<'a> Reader<'a> {
    /// Consume a UTF-8 string token, borrowing it directly when it lies
    /// within a single segment and the intern-strings policy is off (or
    /// finds no match), copying otherwise.
    pub fn read_string(&mut self, ctx: &SerializationContext) -> Result<Cow<'a, str>, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        let len = match header {
            DecodedHeader::Str { len } => len,
            other => {
                return Err(ErrorKind::InvalidFormat {
                    byte_offset: self.buf.byte_offset(self.consumed),
                    reason: wrong_kind_reason(other.kind()),
                }
                .into())
            }
        };
        let payload_end = self.payload_end(next, len as usize)?;
        let bytes = self.raw_payload(next, len as usize)?;
        self.commit(payload_end)?;
        let decoded =
            core::str::from_utf8(&bytes).map_err(|_| ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(next),
                reason: "string payload is not valid UTF-8",
            })?;
        if ctx.options().intern_strings {
            return Ok(Cow::Owned(ctx.intern(decoded)));
        }
        match bytes {
            Cow::Borrowed(b) => Ok(Cow::Borrowed(core::str::from_utf8(b).unwrap())),
            Cow::Owned(_) => Ok(Cow::Owned(decoded.into())),
        }
    }

    /// Consume a binary token.
    pub fn read_binary(&mut self) -> Result<Cow<'a, [u8]>, Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        let len = match header {
            DecodedHeader::Bin { len } => len,
            other => {
                return Err(ErrorKind::InvalidFormat {
                    byte_offset: self.buf.byte_offset(self.consumed),
                    reason: wrong_kind_reason(other.kind()),
                }
                .into())
            }
        };
        let payload_end = self.payload_end(next, len as usize)?;
        let bytes = self.raw_payload(next, len as usize)?;
        self.commit(payload_end)?;
        Ok(bytes)
    }

    /// Consume an extension token, returning its type code and payload.
    pub fn read_extension(&mut self) -> Result<(i8, Cow<'a, [u8]>), Error> {
        let outcome = self.decode();
        let (header, next) = self.into_result(outcome)?;
        let (type_code, len) = match header {
            DecodedHeader::Extension { type_code, len } => (type_code, len),
            other => {
                return Err(ErrorKind::InvalidFormat {
                    byte_offset: self.buf.byte_offset(self.consumed),
                    reason: wrong_kind_reason(other.kind()),
                }
                .into())
            }
        };
        let payload_end = self.payload_end(next, len as usize)?;
        let bytes = self.raw_payload(next, len as usize)?;
        self.commit(payload_end)?;
        Ok((type_code, bytes))
    }

    fn payload_end(&self, after_header: Position, len: usize) -> Result<Position, Error> {
        self.buf.advance(after_header, len).ok_or_else(|| ErrorKind::InvalidFormat {
            byte_offset: self.buf.byte_offset(after_header),
            reason: "payload extends past the end of the buffer",
        }.into())
    }

    fn raw_payload(&self, after_header: Position, len: usize) -> Result<Cow<'a, [u8]>, Error> {
        if let Some(slice) = self.buf.contiguous_slice(after_header, len) {
            Ok(Cow::Borrowed(slice))
        } else {
            let copied = self.buf.copy_range(after_header, len).ok_or_else(|| ErrorKind::InvalidFormat {
                byte_offset: self.buf.byte_offset(after_header),
                reason: "payload extends past the end of the buffer",
            })?;
            Ok(Cow::Owned(copied))
        }
    }

    /// Walk exactly one structure of unknown shape, discarding it.
    pub fn skip(&mut self, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        match self.peek_kind()? {
            TokenKind::Nil => self.read_nil(),
            TokenKind::Bool => self.read_bool().map(|_| ()),
            TokenKind::UInt => self.read_u64().map(|_| ()),
            TokenKind::Int => self.read_i64().map(|_| ()),
            TokenKind::F32 => self.read_f32().map(|_| ()),
            TokenKind::F64 => self.read_f64().map(|_| ()),
            TokenKind::Str => self.read_string(ctx).map(|_| ()),
            TokenKind::Bin => self.read_binary().map(|_| ()),
            TokenKind::Extension => self.read_extension().map(|_| ()),
            TokenKind::Array => {
                let len = self.read_array_header()?;
                for _ in 0..len {
                    self.skip(ctx)?;
                }
                Ok(())
            }
            TokenKind::Map => {
                let len = self.read_map_header()?;
                for _ in 0..len * 2 {
                    self.skip(ctx)?;
                }
                Ok(())
            }
        }
    }

    /// Tolerant variant of [`Self::skip`]: probe whether one full structure is
    /// buffered at the current position, without treating an incomplete
    /// buffer as an error.
    ///
    /// On [`Outcome::OutOfBuffer`] this reader must be discarded rather than
    /// retried in place — sub-structures it already stepped past before
    /// running out of bytes are not rolled back. The streaming reader builds
    /// a fresh [`Reader`] from its last known-good position for every probe,
    /// so an abandoned partial advance here is harmless.
    pub fn try_skip(&mut self, ctx: &SerializationContext) -> Outcome<()> {
        let _guard = match ctx.depth_step() {
            Ok(g) => g,
            Err(e) => return Outcome::Err(e),
        };
        let (header, next) = match self.decode() {
            Outcome::Value(v) => v,
            Outcome::OutOfBuffer => return Outcome::OutOfBuffer,
            Outcome::Err(e) => return Outcome::Err(e),
        };
        match header {
            DecodedHeader::Nil
            | DecodedHeader::Bool(_)
            | DecodedHeader::UInt(_)
            | DecodedHeader::Int(_)
            | DecodedHeader::F32(_)
            | DecodedHeader::F64(_) => {
                self.consumed = next;
                Outcome::Value(())
            }
            DecodedHeader::Str { len } | DecodedHeader::Bin { len } | DecodedHeader::Extension { len, .. } => {
                match self.buf.advance(next, len as usize) {
                    Some(end) => {
                        self.consumed = end;
                        Outcome::Value(())
                    }
                    None => Outcome::OutOfBuffer,
                }
            }
            DecodedHeader::Array { len } => {
                self.consumed = next;
                for _ in 0..len {
                    match self.try_skip(ctx) {
                        Outcome::Value(()) => {}
                        other => return other,
                    }
                }
                Outcome::Value(())
            }
            DecodedHeader::Map { len } => {
                self.consumed = next;
                for _ in 0..len * 2 {
                    match self.try_skip(ctx) {
                        Outcome::Value(()) => {}
                        other => return other,
                    }
                }
                Outcome::Value(())
            }
        }
    }

    /// Consume an array written by
    /// [`crate::writer::Writer::write_primitive_array`]: every element tagged
    /// at `T`'s full width rather than the shortest form the scalar `read_*`
    /// methods would accept. Every element's tag must match `T::TAG` exactly
    /// — the bulk writer never mixes widths within one array.
    pub fn read_primitive_array<T: crate::writer::FixedWidthTag>(&mut self) -> Result<Vec<T>, Error> {
        let len = self.read_array_header()? as usize;
        let width = core::mem::size_of::<T>();
        let stride = 1 + width;
        let start = self.consumed;
        let payload_end = self.payload_end(start, len * stride)?;
        let bytes = self.raw_payload(start, len * stride)?;
        let mut values: Vec<T> = alloc::vec![<T as bytemuck::Zeroable>::zeroed(); len];
        let raw: &mut [u8] = bytemuck::cast_slice_mut(&mut values);
        for (i, (out, chunk)) in raw.chunks_exact_mut(width).zip(bytes.chunks_exact(stride)).enumerate() {
            if chunk[0] != T::TAG {
                return Err(ErrorKind::InvalidFormat {
                    byte_offset: self.buf.byte_offset(start) + (i * stride) as u64,
                    reason: "primitive array element tag does not match the array's fixed width",
                }
                .into());
            }
            out.copy_from_slice(&chunk[1..]);
            if cfg!(target_endian = "little") {
                out.reverse();
            }
        }
        self.commit(payload_end)?;
        Ok(values)
    }

    /// Return the raw encoded bytes of the next structure without parsing
    /// inside it, advancing past it.
    pub fn read_raw(&mut self, ctx: &SerializationContext) -> Result<Vec<u8>, Error> {
        let start = self.consumed;
        self.skip(ctx)?;
        let len = (self.buf.byte_offset(self.consumed) - self.buf.byte_offset(start)) as usize;
        self.buf.copy_range(start, len).ok_or_else(|| {
            ErrorKind::InvalidFormat { byte_offset: self.buf.byte_offset(start), reason: "raw span out of buffer" }
                .into()
        })
    }
}
