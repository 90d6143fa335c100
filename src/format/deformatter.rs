//! Pure decoding functions over a [`SegmentedBuffer`]: each reads exactly one
//! token's header and reports how far the cursor moved. Payload bytes for
//! `Str`/`Bin`/`Extension` are addressed by the caller via the returned
//! length, not copied here.

use super::token::{prefix::*, TokenKind};
use crate::error::{Error, ErrorKind};
use crate::io::{Position, SegmentedBuffer};

/// The header of one decoded msgpack token.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedHeader {
    Nil,
    Bool(bool),
    UInt(u64),
    Int(i64),
    F32(f32),
    F64(f64),
    Str { len: u32 },
    Bin { len: u32 },
    Array { len: u32 },
    Map { len: u32 },
    Extension { type_code: i8, len: u32 },
}

impl DecodedHeader {
    /// The [`TokenKind`] this header belongs to.
    pub fn kind(&self) -> TokenKind {
        match self {
            DecodedHeader::Nil => TokenKind::Nil,
            DecodedHeader::Bool(_) => TokenKind::Bool,
            DecodedHeader::UInt(_) => TokenKind::UInt,
            DecodedHeader::Int(_) => TokenKind::Int,
            DecodedHeader::F32(_) => TokenKind::F32,
            DecodedHeader::F64(_) => TokenKind::F64,
            DecodedHeader::Str { .. } => TokenKind::Str,
            DecodedHeader::Bin { .. } => TokenKind::Bin,
            DecodedHeader::Array { .. } => TokenKind::Array,
            DecodedHeader::Map { .. } => TokenKind::Map,
            DecodedHeader::Extension { .. } => TokenKind::Extension,
        }
    }
}

/// The three-valued outcome of a decode attempt against a possibly-incomplete
/// buffer: success, not-enough-bytes-yet, or a genuine format violation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Value(T),
    OutOfBuffer,
    Err(Error),
}

impl<T> Outcome<T> {
    /// Collapse `OutOfBuffer` into a format error, for callers (the
    /// whole-buffer synchronous API) that know no more bytes are coming.
    pub fn into_result(self, pos: Position, buf: &SegmentedBuffer) -> Result<T, Error> {
        match self {
            Outcome::Value(v) => Ok(v),
            Outcome::Err(e) => Err(e),
            Outcome::OutOfBuffer => Err(out_of_buffer_error(pos, buf)),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Value(v) => Outcome::Value(f(v)),
            Outcome::OutOfBuffer => Outcome::OutOfBuffer,
            Outcome::Err(e) => Outcome::Err(e),
        }
    }
}

fn out_of_buffer_error(pos: Position, buf: &SegmentedBuffer) -> Error {
    ErrorKind::InvalidFormat { byte_offset: buf.byte_offset(pos), reason: "unexpected end of buffer" }.into()
}

fn format_error(pos: Position, buf: &SegmentedBuffer, reason: &'static str) -> Error {
    ErrorKind::InvalidFormat { byte_offset: buf.byte_offset(pos), reason }.into()
}

/// Pull `n` trailing bytes (after the leading byte) into a stack buffer.
fn take_trailing(buf: &SegmentedBuffer, pos: Position, n: usize) -> Outcome<([u8; 16], Position)> {
    debug_assert!(n <= 16);
    let after_lead = match buf.advance(pos, 1) {
        Some(p) => p,
        None => return Outcome::OutOfBuffer,
    };
    let mut out = [0u8; 16];
    if let Some(slice) = buf.contiguous_slice(after_lead, n) {
        out[..n].copy_from_slice(slice);
    } else {
        match buf.copy_range(after_lead, n) {
            Some(bytes) => out[..n].copy_from_slice(&bytes),
            None => return Outcome::OutOfBuffer,
        }
    }
    let next = match buf.advance(after_lead, n) {
        Some(p) => p,
        None => return Outcome::OutOfBuffer,
    };
    Outcome::Value((out, next))
}

/// Decode the header of the token at `pos`, tolerating an incomplete buffer.
pub fn try_decode_header(buf: &SegmentedBuffer, pos: Position) -> Outcome<(DecodedHeader, Position)> {
    let lead = match buf.peek_byte(pos) {
        Some(b) => b,
        None => return Outcome::OutOfBuffer,
    };
    let kind = match TokenKind::of_leading_byte(lead) {
        Some(k) => k,
        None => return Outcome::Err(format_error(pos, buf, "unrecognized msgpack leading byte")),
    };

    macro_rules! trailing {
        ($n:expr, $f:expr) => {
            match take_trailing(buf, pos, $n) {
                Outcome::Value((bytes, next)) => Outcome::Value(($f(bytes), next)),
                Outcome::OutOfBuffer => Outcome::OutOfBuffer,
                Outcome::Err(e) => Outcome::Err(e),
            }
        };
    }

    match (kind, lead) {
        (TokenKind::Nil, _) => Outcome::Value((DecodedHeader::Nil, buf.advance(pos, 1).unwrap())),
        (TokenKind::Bool, FALSE) => Outcome::Value((DecodedHeader::Bool(false), buf.advance(pos, 1).unwrap())),
        (TokenKind::Bool, TRUE) => Outcome::Value((DecodedHeader::Bool(true), buf.advance(pos, 1).unwrap())),
        (TokenKind::Bool, _) => unreachable!(),
        (TokenKind::UInt, b) if b <= POSFIXINT_HIGH => {
            Outcome::Value((DecodedHeader::UInt(b as u64), buf.advance(pos, 1).unwrap()))
        }
        (TokenKind::UInt, UINT8) => trailing!(1, |b: [u8; 16]| DecodedHeader::UInt(b[0] as u64)),
        (TokenKind::UInt, UINT16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::UInt(u16::from_be_bytes([b[0], b[1]]) as u64))
        }
        (TokenKind::UInt, UINT32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::UInt(u32::from_be_bytes(b[..4].try_into().unwrap()) as u64))
        }
        (TokenKind::UInt, UINT64) => {
            trailing!(8, |b: [u8; 16]| DecodedHeader::UInt(u64::from_be_bytes(b[..8].try_into().unwrap())))
        }
        (TokenKind::Int, b) if b >= NEGFIXINT_LOW => {
            Outcome::Value((DecodedHeader::Int(b as i8 as i64), buf.advance(pos, 1).unwrap()))
        }
        (TokenKind::Int, INT8) => trailing!(1, |b: [u8; 16]| DecodedHeader::Int(b[0] as i8 as i64)),
        (TokenKind::Int, INT16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Int(i16::from_be_bytes([b[0], b[1]]) as i64))
        }
        (TokenKind::Int, INT32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::Int(i32::from_be_bytes(b[..4].try_into().unwrap()) as i64))
        }
        (TokenKind::Int, INT64) => {
            trailing!(8, |b: [u8; 16]| DecodedHeader::Int(i64::from_be_bytes(b[..8].try_into().unwrap())))
        }
        (TokenKind::F32, _) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::F32(f32::from_be_bytes(b[..4].try_into().unwrap())))
        }
        (TokenKind::F64, _) => {
            trailing!(8, |b: [u8; 16]| DecodedHeader::F64(f64::from_be_bytes(b[..8].try_into().unwrap())))
        }
        (TokenKind::Str, b) if (FIXSTR_MASK..=FIXSTR_HIGH).contains(&b) => {
            Outcome::Value((DecodedHeader::Str { len: (b & 0x1f) as u32 }, buf.advance(pos, 1).unwrap()))
        }
        (TokenKind::Str, STR8) => trailing!(1, |b: [u8; 16]| DecodedHeader::Str { len: b[0] as u32 }),
        (TokenKind::Str, STR16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Str { len: u16::from_be_bytes([b[0], b[1]]) as u32 })
        }
        (TokenKind::Str, STR32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::Str { len: u32::from_be_bytes(b[..4].try_into().unwrap()) })
        }
        (TokenKind::Bin, BIN8) => trailing!(1, |b: [u8; 16]| DecodedHeader::Bin { len: b[0] as u32 }),
        (TokenKind::Bin, BIN16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Bin { len: u16::from_be_bytes([b[0], b[1]]) as u32 })
        }
        (TokenKind::Bin, BIN32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::Bin { len: u32::from_be_bytes(b[..4].try_into().unwrap()) })
        }
        (TokenKind::Array, b) if (FIXARRAY_MASK..=FIXARRAY_HIGH).contains(&b) => {
            Outcome::Value((DecodedHeader::Array { len: (b & 0x0f) as u32 }, buf.advance(pos, 1).unwrap()))
        }
        (TokenKind::Array, ARRAY16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Array { len: u16::from_be_bytes([b[0], b[1]]) as u32 })
        }
        (TokenKind::Array, ARRAY32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::Array { len: u32::from_be_bytes(b[..4].try_into().unwrap()) })
        }
        (TokenKind::Map, b) if (FIXMAP_MASK..=FIXMAP_HIGH).contains(&b) => {
            Outcome::Value((DecodedHeader::Map { len: (b & 0x0f) as u32 }, buf.advance(pos, 1).unwrap()))
        }
        (TokenKind::Map, MAP16) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Map { len: u16::from_be_bytes([b[0], b[1]]) as u32 })
        }
        (TokenKind::Map, MAP32) => {
            trailing!(4, |b: [u8; 16]| DecodedHeader::Map { len: u32::from_be_bytes(b[..4].try_into().unwrap()) })
        }
        (TokenKind::Extension, FIXEXT1) => {
            trailing!(1, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[0] as i8, len: 1 })
        }
        (TokenKind::Extension, FIXEXT2) => {
            trailing!(1, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[0] as i8, len: 2 })
        }
        (TokenKind::Extension, FIXEXT4) => {
            trailing!(1, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[0] as i8, len: 4 })
        }
        (TokenKind::Extension, FIXEXT8) => {
            trailing!(1, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[0] as i8, len: 8 })
        }
        (TokenKind::Extension, FIXEXT16) => {
            trailing!(1, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[0] as i8, len: 16 })
        }
        (TokenKind::Extension, EXT8) => {
            trailing!(2, |b: [u8; 16]| DecodedHeader::Extension { type_code: b[1] as i8, len: b[0] as u32 })
        }
        (TokenKind::Extension, EXT16) => trailing!(3, |b: [u8; 16]| DecodedHeader::Extension {
            type_code: b[2] as i8,
            len: u16::from_be_bytes([b[0], b[1]]) as u32,
        }),
        (TokenKind::Extension, EXT32) => trailing!(5, |b: [u8; 16]| DecodedHeader::Extension {
            type_code: b[4] as i8,
            len: u32::from_be_bytes(b[..4].try_into().unwrap()),
        }),
        _ => Outcome::Err(format_error(pos, buf, "unrecognized msgpack leading byte")),
    }
}

/// Decode the header of the token at `pos`, treating an incomplete buffer as
/// a format error (for the whole-buffer synchronous API, where no more bytes
/// will ever arrive).
pub fn decode_header(buf: &SegmentedBuffer, pos: Position) -> Result<(DecodedHeader, Position), Error> {
    try_decode_header(buf, pos).into_result(pos, buf)
}
