//! A lossy, best-effort msgpack → JSON renderer for logs and debugging.
//!
//! Not a full JSON encoder: several msgpack values have no JSON counterpart
//! (binary payloads, extension tokens, non-finite floats, non-string map
//! keys) and are rendered as marked placeholder text instead of erroring —
//! the point of [`convert_to_json`] is to produce something a human can read
//! out of arbitrary wire bytes for a log line, not a round-trippable value.
//! A malformed or over-deep structure renders as an inline `$error` object
//! rather than propagating a [`crate::error::Error`]; this is the one
//! operation in the crate that never fails.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write as _;

use crate::config::SerializerOptions;
use crate::context::SerializationContext;
use crate::converter::ConverterCache;
use crate::error::Error;
use crate::format::TokenKind;
use crate::io::{Position, SegmentedBuffer};
use crate::reader::Reader;

/// Render every top-level msgpack value found in `bytes` as JSON text.
///
/// A single top-level value renders as one JSON value; more than one value
/// concatenated back to back (as a streaming sender emits them) renders as a
/// JSON array of them, matching what [`crate::async_io::AsyncReader`] would
/// decode as a sequence of separate calls. Empty input renders as `null`.
pub fn convert_to_json(bytes: &[u8]) -> String {
    let buf = SegmentedBuffer::from_bytes(bytes.to_vec());
    let opts = SerializerOptions::default();
    let cache = ConverterCache::new();
    let ctx = SerializationContext::new(&opts, &cache);
    let mut r = Reader::new(&buf, Position::ZERO);

    let mut values = Vec::new();
    while buf.remaining_len(r.position()) != Some(0) {
        let mut out = String::new();
        match render_value(&mut r, &ctx, &mut out) {
            Ok(()) => values.push(out),
            Err(e) => {
                values.push(json_error_placeholder(&e));
                break;
            }
        }
    }

    match values.len() {
        0 => String::from("null"),
        1 => values.into_iter().next().expect("length checked above"),
        _ => {
            let mut joined = String::from("[");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    joined.push(',');
                }
                joined.push_str(v);
            }
            joined.push(']');
            joined
        }
    }
}

fn render_value(r: &mut Reader<'_>, ctx: &SerializationContext, out: &mut String) -> Result<(), Error> {
    let _guard = ctx.depth_step()?;
    match r.peek_kind()? {
        TokenKind::Nil => {
            r.read_nil()?;
            out.push_str("null");
        }
        TokenKind::Bool => out.push_str(if r.read_bool()? { "true" } else { "false" }),
        TokenKind::UInt => {
            let _ = write!(out, "{}", r.read_u64()?);
        }
        TokenKind::Int => {
            let _ = write!(out, "{}", r.read_i64()?);
        }
        TokenKind::F32 => render_float(out, r.read_f32()? as f64),
        TokenKind::F64 => render_float(out, r.read_f64()?),
        TokenKind::Str => write_json_string(out, &r.read_string(ctx)?),
        TokenKind::Bin => {
            let payload = r.read_binary()?;
            out.push_str("{\"$bin\":\"");
            write_hex(out, &payload);
            out.push_str("\"}");
        }
        TokenKind::Extension => {
            let (type_code, payload) = r.read_extension()?;
            let _ = write!(out, "{{\"$ext\":{type_code},\"data\":\"");
            write_hex(out, &payload);
            out.push_str("\"}");
        }
        TokenKind::Array => {
            let len = r.read_array_header()?;
            out.push('[');
            for i in 0..len {
                if i > 0 {
                    out.push(',');
                }
                render_value(r, ctx, out)?;
            }
            out.push(']');
        }
        TokenKind::Map => {
            let len = r.read_map_header()?;
            out.push('{');
            for i in 0..len {
                if i > 0 {
                    out.push(',');
                }
                render_map_key(r, ctx, out)?;
                out.push(':');
                render_value(r, ctx, out)?;
            }
            out.push('}');
        }
    }
    Ok(())
}

/// JSON object keys must be strings; a msgpack map key of any other kind is
/// rendered to text first and used as the key, the same lossy treatment any
/// other non-JSON-representable value gets.
fn render_map_key(r: &mut Reader<'_>, ctx: &SerializationContext, out: &mut String) -> Result<(), Error> {
    if r.peek_kind()? == TokenKind::Str {
        write_json_string(out, &r.read_string(ctx)?);
        return Ok(());
    }
    let mut key_text = String::new();
    render_value(r, ctx, &mut key_text)?;
    write_json_string(out, &key_text);
    Ok(())
}

fn render_float(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("\"NaN\"");
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "\"Infinity\"" } else { "\"-Infinity\"" });
    } else {
        let _ = write!(out, "{value}");
    }
}

fn write_json_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

fn write_hex(out: &mut String, bytes: &[u8]) {
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
}

fn json_error_placeholder(err: &Error) -> String {
    let mut message = String::new();
    let _ = write!(message, "{err}");
    let mut out = String::from("{\"$error\":");
    write_json_string(&mut out, &message);
    out.push('}');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{write_array_header, write_bin, write_f64, write_map_header, write_nil, write_str, write_u64};
    use crate::io::VecSink;

    #[test]
    fn empty_input_renders_as_null() {
        assert_eq!(convert_to_json(&[]), "null");
    }

    #[test]
    fn renders_scalars() {
        let mut sink = VecSink::new();
        write_u64(&mut sink, 7);
        assert_eq!(convert_to_json(sink.as_slice()), "7");
    }

    #[test]
    fn renders_an_array_of_strings() {
        let mut sink = VecSink::new();
        write_array_header(&mut sink, 2);
        write_str(&mut sink, b"a");
        write_str(&mut sink, b"b\"c");
        assert_eq!(convert_to_json(sink.as_slice()), r#"["a","b\"c"]"#);
    }

    #[test]
    fn renders_a_map_with_string_keys() {
        let mut sink = VecSink::new();
        write_map_header(&mut sink, 1);
        write_str(&mut sink, b"k");
        write_u64(&mut sink, 1);
        assert_eq!(convert_to_json(sink.as_slice()), r#"{"k":1}"#);
    }

    #[test]
    fn binary_renders_as_a_marked_hex_placeholder() {
        let mut sink = VecSink::new();
        write_bin(&mut sink, &[0xde, 0xad]);
        assert_eq!(convert_to_json(sink.as_slice()), r#"{"$bin":"dead"}"#);
    }

    #[test]
    fn non_finite_float_renders_as_a_marked_string() {
        let mut sink = VecSink::new();
        write_f64(&mut sink, f64::NAN);
        assert_eq!(convert_to_json(sink.as_slice()), "\"NaN\"");
    }

    #[test]
    fn concatenated_top_level_values_render_as_an_array() {
        let mut sink = VecSink::new();
        write_u64(&mut sink, 1);
        write_nil(&mut sink);
        assert_eq!(convert_to_json(sink.as_slice()), "[1,null]");
    }

    #[test]
    fn truncated_input_renders_an_error_placeholder_instead_of_panicking() {
        let rendered = convert_to_json(&[0xcc]);
        assert!(rendered.contains("$error"));
    }
}
