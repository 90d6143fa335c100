//! The reference-preservation wrapper: turns a `Converter<T>` into a
//! `Converter<Rc<T>>` that shares identity across a round-trip instead of
//! duplicating the payload for every `Rc` pointing at the same value.

use alloc::rc::Rc;

use super::Converter;
use crate::context::{ReferenceLookup, SerializationContext};
use crate::error::{Error, ErrorKind};
use crate::format::{self, Outcome, TokenKind};
use crate::io::{Position, SegmentedBuffer, VecSink};
use crate::reader::Reader;
use crate::writer::Writer;

/// Wraps a `Converter<T>` into a `Converter<Rc<T>>`. Only meaningful when
/// [`crate::config::SerializerOptions::preserve_references`] is on; applying
/// it otherwise still works but always takes the "first encounter" path.
///
/// A wrapped read is unambiguous: the shapes this wrapper applies to (object,
/// enumerable, dictionary, union) always lead with a map/array header, never
/// an extension token, so peeking [`TokenKind::Extension`] reliably means
/// "this is a back-reference, not real payload."
pub struct ReferencePreservingConverter<T> {
    inner: Rc<dyn Converter<T>>,
}

impl<T: 'static> ReferencePreservingConverter<T> {
    /// Wrap `inner` so repeat encounters of the same `Rc` identity become
    /// back-reference extension tokens instead of duplicated payloads.
    pub fn new(inner: Rc<dyn Converter<T>>) -> Self {
        Self { inner }
    }
}

impl<T: 'static> Converter<Rc<T>> for ReferencePreservingConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &Rc<T>, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        if !ctx.options().preserve_references() {
            return self.inner.write(w, value, ctx);
        }
        let identity = Rc::as_ptr(value) as usize;
        match ctx.note_reference_for_write(identity) {
            ReferenceLookup::First(_) => self.inner.write(w, value, ctx),
            ReferenceLookup::Repeat(id) => {
                let mut payload = VecSink::new();
                format::write_u64(&mut payload, id as u64);
                w.write_extension(ctx.options().object_reference_extension_type(), payload.as_slice());
                Ok(())
            }
        }
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<Rc<T>, Error> {
        let _guard = ctx.depth_step()?;
        if !ctx.options().preserve_references() {
            return Ok(Rc::new(self.inner.read(r, ctx)?));
        }
        if matches!(r.try_peek_kind(), Outcome::Value(TokenKind::Extension)) {
            let offset = r.byte_offset();
            let (type_code, payload) = r.read_extension()?;
            if type_code != ctx.options().object_reference_extension_type() {
                return Err(ErrorKind::InvalidFormat {
                    byte_offset: offset,
                    reason: "extension token where a back-reference was expected did not carry the configured type code",
                }
                .into());
            }
            let buf = SegmentedBuffer::from_bytes(payload.into_owned());
            let id = Reader::new(&buf, Position::ZERO).read_u32()?;
            return ctx.get_read_slot::<T>(id).ok_or_else(|| {
                ErrorKind::InvalidFormat { byte_offset: offset, reason: "back-reference to an id not yet materialized" }.into()
            });
        }
        let id = ctx.reserve_read_slot();
        let value = Rc::new(self.inner.read(r, ctx)?);
        ctx.fill_read_slot(id, value.clone());
        Ok(value)
    }
}
