//! The converter for [`EnumerableModel`] types: an array header followed by
//! each element through its own converter.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::any::{Any, TypeId};

use super::Converter;
use crate::context::SerializationContext;
use crate::error::{ContextualError, Error, ErrorKind};
use crate::reader::Reader;
use crate::shape::EnumerableModel;
use crate::writer::Writer;

/// Converts any [`EnumerableModel`] type via its element converter, taking
/// the hardware-accelerated bulk path automatically when `C::Element` is one
/// of [`crate::writer::FixedWidthTag`]'s primitive types.
pub struct EnumerableConverter<C: EnumerableModel> {
    element: Rc<dyn Converter<C::Element>>,
}

impl<C: EnumerableModel> EnumerableConverter<C> {
    /// Build a converter for `C`, delegating each element to `element`.
    pub fn new(element: Rc<dyn Converter<C::Element>>) -> Self {
        Self { element }
    }

    /// Try the bulk primitive-array path. `C::Element` is a single concrete
    /// type per monomorphization, but this `impl` is generic over every `C`,
    /// so a runtime `TypeId` check stands in for the static type test the
    /// compiler can't express here.
    fn try_write_primitive_bulk(&self, w: &mut Writer<'_>, ctx: &SerializationContext, elements: &[&C::Element]) -> bool {
        macro_rules! try_tag {
            ($t:ty) => {
                if TypeId::of::<C::Element>() == TypeId::of::<$t>() {
                    let values: Vec<$t> = elements
                        .iter()
                        .map(|e| *(*e as &dyn Any).downcast_ref::<$t>().expect("TypeId match guarantees this downcast"))
                        .collect();
                    w.write_primitive_array(ctx, &values);
                    return true;
                }
            };
        }
        try_tag!(u16);
        try_tag!(u32);
        try_tag!(u64);
        try_tag!(i16);
        try_tag!(i32);
        try_tag!(i64);
        try_tag!(f32);
        try_tag!(f64);
        false
    }

    /// Mirror of [`Self::try_write_primitive_bulk`] for reads: consumes the
    /// whole array and returns `Some` when `C::Element` matched, leaving the
    /// reader untouched and returning `None` otherwise so the caller falls
    /// back to the element-by-element path.
    fn try_read_primitive_bulk(&self, r: &mut Reader<'_>) -> Result<Option<C>, Error> {
        macro_rules! try_tag {
            ($t:ty) => {
                if TypeId::of::<C::Element>() == TypeId::of::<$t>() {
                    let raw: Vec<$t> = r.read_primitive_array::<$t>()?;
                    let mut elements = Vec::with_capacity(raw.len());
                    for value in raw {
                        let boxed: Box<dyn Any> = Box::new(value);
                        elements.push(*boxed.downcast::<C::Element>().expect("TypeId match guarantees this downcast"));
                    }
                    return Ok(Some(C::from_elements(elements)));
                }
            };
        }
        try_tag!(u16);
        try_tag!(u32);
        try_tag!(u64);
        try_tag!(i16);
        try_tag!(i32);
        try_tag!(i64);
        try_tag!(f32);
        try_tag!(f64);
        Ok(None)
    }
}

impl<C: EnumerableModel> Converter<C> for EnumerableConverter<C> {
    fn write(&self, w: &mut Writer<'_>, value: &C, ctx: &SerializationContext) -> Result<(), Error> {
        let _guard = ctx.depth_step()?;
        let elements = value.elements();
        if self.try_write_primitive_bulk(w, ctx, &elements) {
            return Ok(());
        }
        w.write_array_header(elements.len() as u32);
        for (index, element) in elements.into_iter().enumerate() {
            self.element.write(w, element, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}]")))?;
        }
        Ok(())
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<C, Error> {
        let _guard = ctx.depth_step()?;
        if let Some(value) = self.try_read_primitive_bulk(r)? {
            return Ok(value);
        }
        let len = r.read_array_header()?;
        if len as u64 > usize::MAX as u64 {
            return Err(ErrorKind::OutOfRange { from: len as i128, to: "usize" }.into());
        }
        let mut elements = Vec::with_capacity(len as usize);
        for index in 0..len {
            elements.push(self.element.read(r, ctx).map_err(|e| e.enclose(&alloc::format!("[{index}]")))?);
        }
        Ok(C::from_elements(elements))
    }
}
