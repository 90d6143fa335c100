//! Pure encoding functions: each writes exactly one token to a [`Sink`] using
//! the shortest msgpack representation that holds the value.

use super::token::prefix::*;
use crate::io::Sink;

/// Write the `nil` token.
pub fn write_nil(sink: &mut (impl Sink + ?Sized)) {
    sink.write_bytes(&[NIL]);
}

/// Write a `bool` token.
pub fn write_bool(sink: &mut (impl Sink + ?Sized), value: bool) {
    sink.write_bytes(&[if value { TRUE } else { FALSE }]);
}

/// Write an unsigned integer using the shortest representation that holds it
/// exactly (positive fixint, uint8, uint16, uint32, or uint64).
pub fn write_u64(sink: &mut (impl Sink + ?Sized), value: u64) {
    if value <= POSFIXINT_HIGH as u64 {
        sink.write_bytes(&[value as u8]);
    } else if value <= u8::MAX as u64 {
        sink.write_bytes(&[UINT8, value as u8]);
    } else if value <= u16::MAX as u64 {
        let mut buf = [UINT16, 0, 0];
        buf[1..].copy_from_slice(&(value as u16).to_be_bytes());
        sink.write_bytes(&buf);
    } else if value <= u32::MAX as u64 {
        let mut buf = [UINT32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&(value as u32).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [UINT64, 0, 0, 0, 0, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&value.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write a signed integer using the shortest representation that holds it
/// exactly, preferring the unsigned forms for non-negative values.
pub fn write_i64(sink: &mut (impl Sink + ?Sized), value: i64) {
    if value >= 0 {
        write_u64(sink, value as u64);
        return;
    }
    if value >= NEGFIXINT_LOW as i8 as i64 {
        sink.write_bytes(&[value as i8 as u8]);
    } else if value >= i8::MIN as i64 {
        sink.write_bytes(&[INT8, value as i8 as u8]);
    } else if value >= i16::MIN as i64 {
        let mut buf = [INT16, 0, 0];
        buf[1..].copy_from_slice(&(value as i16).to_be_bytes());
        sink.write_bytes(&buf);
    } else if value >= i32::MIN as i64 {
        let mut buf = [INT32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&(value as i32).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [INT64, 0, 0, 0, 0, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&value.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write an `f32` token.
pub fn write_f32(sink: &mut (impl Sink + ?Sized), value: f32) {
    let mut buf = [FLOAT32, 0, 0, 0, 0];
    buf[1..].copy_from_slice(&value.to_be_bytes());
    sink.write_bytes(&buf);
}

/// Write an `f64` token.
pub fn write_f64(sink: &mut (impl Sink + ?Sized), value: f64) {
    let mut buf = [FLOAT64, 0, 0, 0, 0, 0, 0, 0, 0];
    buf[1..].copy_from_slice(&value.to_be_bytes());
    sink.write_bytes(&buf);
}

/// Write the length prefix for a UTF-8 string (`fixstr`/`str8`/`str16`/`str32`
/// depending on length), without the payload.
pub fn write_str_header(sink: &mut (impl Sink + ?Sized), len: u32) {
    if len <= 31 {
        sink.write_bytes(&[FIXSTR_MASK | len as u8]);
    } else if len <= u8::MAX as u32 {
        sink.write_bytes(&[STR8, len as u8]);
    } else if len <= u16::MAX as u32 {
        let mut buf = [STR16, 0, 0];
        buf[1..].copy_from_slice(&(len as u16).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [STR32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&len.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write a complete UTF-8 string token (header + payload).
pub fn write_str(sink: &mut (impl Sink + ?Sized), bytes: &[u8]) {
    write_str_header(sink, bytes.len() as u32);
    sink.write_bytes(bytes);
}

/// Write the length prefix for a binary blob (`bin8`/`bin16`/`bin32`).
pub fn write_bin_header(sink: &mut (impl Sink + ?Sized), len: u32) {
    if len <= u8::MAX as u32 {
        sink.write_bytes(&[BIN8, len as u8]);
    } else if len <= u16::MAX as u32 {
        let mut buf = [BIN16, 0, 0];
        buf[1..].copy_from_slice(&(len as u16).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [BIN32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&len.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write a complete binary token (header + payload).
pub fn write_bin(sink: &mut (impl Sink + ?Sized), bytes: &[u8]) {
    write_bin_header(sink, bytes.len() as u32);
    sink.write_bytes(bytes);
}

/// Write an array header of `len` elements (`fixarray`/`array16`/`array32`).
pub fn write_array_header(sink: &mut (impl Sink + ?Sized), len: u32) {
    if len <= 15 {
        sink.write_bytes(&[FIXARRAY_MASK | len as u8]);
    } else if len <= u16::MAX as u32 {
        let mut buf = [ARRAY16, 0, 0];
        buf[1..].copy_from_slice(&(len as u16).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [ARRAY32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&len.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write a map header of `len` pairs (`fixmap`/`map16`/`map32`).
pub fn write_map_header(sink: &mut (impl Sink + ?Sized), len: u32) {
    if len <= 15 {
        sink.write_bytes(&[FIXMAP_MASK | len as u8]);
    } else if len <= u16::MAX as u32 {
        let mut buf = [MAP16, 0, 0];
        buf[1..].copy_from_slice(&(len as u16).to_be_bytes());
        sink.write_bytes(&buf);
    } else {
        let mut buf = [MAP32, 0, 0, 0, 0];
        buf[1..].copy_from_slice(&len.to_be_bytes());
        sink.write_bytes(&buf);
    }
}

/// Write a complete extension token: type code, length prefix, and payload.
/// Uses `fixext1/2/4/8/16` when the payload length matches one of those
/// fixed sizes, otherwise `ext8/16/32`.
pub fn write_extension(sink: &mut (impl Sink + ?Sized), type_code: i8, payload: &[u8]) {
    let len = payload.len();
    match len {
        1 => sink.write_bytes(&[FIXEXT1, type_code as u8]),
        2 => sink.write_bytes(&[FIXEXT2, type_code as u8]),
        4 => sink.write_bytes(&[FIXEXT4, type_code as u8]),
        8 => sink.write_bytes(&[FIXEXT8, type_code as u8]),
        16 => sink.write_bytes(&[FIXEXT16, type_code as u8]),
        _ if len <= u8::MAX as usize => sink.write_bytes(&[EXT8, len as u8, type_code as u8]),
        _ if len <= u16::MAX as usize => {
            let mut buf = [EXT16, 0, 0, type_code as u8];
            buf[1..3].copy_from_slice(&(len as u16).to_be_bytes());
            sink.write_bytes(&buf);
        }
        _ => {
            let mut buf = [EXT32, 0, 0, 0, 0, type_code as u8];
            buf[1..5].copy_from_slice(&(len as u32).to_be_bytes());
            sink.write_bytes(&buf);
        }
    }
    sink.write_bytes(payload);
}
