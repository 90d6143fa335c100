//! The converter for [`UnionModel`] types: a 2-element `[alias|nil, inner]`
//! array wrapping whichever registered sub-shape the runtime value actually
//! is.

use alloc::string::String;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::{ContextualError, Error, ErrorKind};
use crate::format::{Outcome, TokenKind};
use crate::reader::Reader;
use crate::shape::{UnionAlias, UnionModel};
use crate::writer::Writer;

/// Converts any [`UnionModel`] type by locating the registered entry whose
/// `matches` predicate accepts the runtime value (write) or whose `alias`
/// equals the wire alias (read).
pub struct UnionConverter<U> {
    _marker: core::marker::PhantomData<fn() -> U>,
}

impl<U: UnionModel> Default for UnionConverter<U> {
    fn default() -> Self {
        Self { _marker: core::marker::PhantomData }
    }
}

impl<U: UnionModel> UnionConverter<U> {
    /// A converter for `U`. Stateless; `U::ENTRIES` supplies everything it
    /// needs.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<U: UnionModel> Converter<U> for UnionConverter<U> {
    fn write(&self, w: &mut Writer<'_>, value: &U, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        let entry = U::ENTRIES
            .iter()
            .find(|e| (e.matches)(value))
            .ok_or_else(|| ErrorKind::UnknownSubtype { declared_type: core::any::type_name::<U>() })?;
        w.write_array_header(2);
        match entry.alias {
            None => w.write_nil(),
            Some(UnionAlias::Integer(n)) => w.write_i64(n),
            Some(UnionAlias::Text(s)) => w.write_string(s),
        }
        (entry.write_inner)(value, w, ctx).map_err(|e| e.enclose(&union_entry_label(entry.alias)))
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<U, Error> {
        let _guard = ctx.depth_step()?;
        let offset = r.byte_offset();
        let len = r.read_array_header()?;
        if len != 2 {
            return Err(
                ErrorKind::InvalidFormat { byte_offset: offset, reason: "union envelope must have exactly 2 elements" }.into(),
            );
        }
        let wire_alias = match r.try_peek_kind() {
            Outcome::Value(TokenKind::Nil) => {
                r.read_nil()?;
                None
            }
            Outcome::Value(TokenKind::Str) => Some(WireAlias::Text(r.read_string(ctx)?.into_owned())),
            _ => Some(WireAlias::Integer(r.read_i64()?)),
        };
        let entry = match &wire_alias {
            None => U::ENTRIES.iter().find(|e| e.alias.is_none()),
            Some(WireAlias::Integer(n)) => U::ENTRIES.iter().find(|e| e.alias == Some(UnionAlias::Integer(*n))),
            Some(WireAlias::Text(s)) => {
                U::ENTRIES.iter().find(|e| matches!(e.alias, Some(UnionAlias::Text(t)) if t == s.as_str()))
            }
        };
        let entry = entry.ok_or_else(|| ErrorKind::UnknownAlias {
            alias: match &wire_alias {
                None => 0,
                Some(WireAlias::Integer(n)) => *n,
                Some(WireAlias::Text(_)) => -1,
            },
        })?;
        (entry.read_inner)(r, ctx).map_err(|e| e.enclose(&union_entry_label(entry.alias)))
    }
}

enum WireAlias {
    Integer(i64),
    Text(String),
}

fn union_entry_label(alias: Option<UnionAlias>) -> String {
    match alias {
        None => String::from("<base>"),
        Some(UnionAlias::Integer(n)) => alloc::format!("<{n}>"),
        Some(UnionAlias::Text(s)) => alloc::format!("<{s}>"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SerializerOptions;
    use crate::converter::UintConverter;
    use crate::io::{Position, SegmentedBuffer, VecSink};
    use crate::shape::{HasShape, Shape, ShapeKind};
    use core::any::TypeId;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Shape2D {
        Circle(u32),
        Square(u32),
    }

    impl HasShape for Shape2D {
        fn shape() -> Shape {
            Shape { id: TypeId::of::<Shape2D>(), name: "Shape2D", kind: ShapeKind::Union }
        }
    }

    fn circle_matches(v: &Shape2D) -> bool {
        matches!(v, Shape2D::Circle(_))
    }
    fn circle_write(v: &Shape2D, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), Error> {
        let Shape2D::Circle(radius) = v else { unreachable!() };
        UintConverter::<u32>::default().write(w, radius, ctx)
    }
    fn circle_read(r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<Shape2D, Error> {
        Ok(Shape2D::Circle(UintConverter::<u32>::default().read(r, ctx)?))
    }

    fn square_matches(v: &Shape2D) -> bool {
        matches!(v, Shape2D::Square(_))
    }
    fn square_write(v: &Shape2D, w: &mut Writer<'_>, ctx: &SerializationContext) -> Result<(), Error> {
        let Shape2D::Square(side) = v else { unreachable!() };
        UintConverter::<u32>::default().write(w, side, ctx)
    }
    fn square_read(r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<Shape2D, Error> {
        Ok(Shape2D::Square(UintConverter::<u32>::default().read(r, ctx)?))
    }

    impl UnionModel for Shape2D {
        const ENTRIES: &'static [crate::shape::UnionEntry<Self>] = &[
            crate::shape::UnionEntry {
                alias: None,
                matches: circle_matches,
                write_inner: circle_write,
                read_inner: circle_read,
            },
            crate::shape::UnionEntry {
                alias: Some(UnionAlias::Text("square")),
                matches: square_matches,
                write_inner: square_write,
                read_inner: square_read,
            },
        ];
    }

    #[test]
    fn base_entry_round_trips_with_nil_alias() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = UnionConverter::<Shape2D>::new();
        let value = Shape2D::Circle(5);
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &value, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), value);
    }

    #[test]
    fn text_alias_round_trips() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = UnionConverter::<Shape2D>::new();
        let value = Shape2D::Square(8);
        let mut sink = VecSink::new();
        conv.write(&mut Writer::new(&mut sink), &value, &ctx).unwrap();
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert_eq!(conv.read(&mut r, &ctx).unwrap(), value);
    }

    #[test]
    fn unknown_text_alias_is_rejected() {
        let opts = SerializerOptions::default();
        let cache = crate::converter::ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let conv = UnionConverter::<Shape2D>::new();
        let mut sink = VecSink::new();
        {
            let mut w = Writer::new(&mut sink);
            w.write_array_header(2);
            w.write_string("triangle");
            w.write_u32(1);
        }
        let buf = SegmentedBuffer::from_bytes(sink.into_vec());
        let mut r = Reader::new(&buf, Position::ZERO);
        assert!(matches!(conv.read(&mut r, &ctx).unwrap_err().kind(), ErrorKind::UnknownAlias { alias: -1 }));
    }
}
