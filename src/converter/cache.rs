//! The shape-keyed converter cache: builds each `Converter<T>` at most once
//! per shape identity and hands out a forwarding placeholder to whoever asks
//! again while the build for a recursive shape is still in flight.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use core::any::{Any, TypeId};
use core::cell::RefCell;
use core::marker::PhantomData;

use super::Converter;
use crate::context::SerializationContext;
use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

type Slot = Rc<RefCell<Option<Rc<dyn Any>>>>;

/// Per-serializer cache of built converters, keyed by the Rust type's
/// [`TypeId`].
///
/// Shared by every call a serializer instance makes; building is one-shot per
/// shape for the cache's whole lifetime (not per-call), since converters are
/// stateless and safe to reuse across unrelated values.
#[derive(Default)]
pub struct ConverterCache {
    slots: RefCell<BTreeMap<TypeId, Slot>>,
}

impl ConverterCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self { slots: RefCell::new(BTreeMap::new()) }
    }

    /// Get the converter for `T`, building it via `build` on first request.
    ///
    /// A request that arrives while `T`'s own build is already in flight
    /// (i.e. `build` recursively asked for `T` again, the recursive-shape
    /// case) gets a [`DelayedConverter`] that forwards to the real converter
    /// once this call finishes installing it.
    pub fn get_or_build<T: 'static>(&self, build: impl FnOnce(&Self) -> Rc<dyn Converter<T>>) -> Rc<dyn Converter<T>> {
        let id = TypeId::of::<T>();
        if let Some(slot) = self.slots.borrow().get(&id) {
            return match slot.borrow().as_ref() {
                Some(any) => downcast_converter(any),
                None => Rc::new(DelayedConverter::<T> { slot: slot.clone(), _marker: PhantomData }),
            };
        }
        let slot: Slot = Rc::new(RefCell::new(None));
        self.slots.borrow_mut().insert(id, slot.clone());
        let converter = build(self);
        *slot.borrow_mut() = Some(erase_converter(converter.clone()));
        converter
    }

    /// Install `converter` as the cache's entry for `T`, overriding whatever
    /// [`Self::get_or_build`] would otherwise construct. Used by explicit
    /// registration (see `crate::serializer::Serializer::register_converter`)
    /// to replace the automatic shape-based converter for one type.
    pub fn insert<T: 'static>(&self, converter: Rc<dyn Converter<T>>) {
        let id = TypeId::of::<T>();
        let slot: Slot = Rc::new(RefCell::new(Some(erase_converter(converter))));
        self.slots.borrow_mut().insert(id, slot);
    }
}

fn erase_converter<T: 'static>(converter: Rc<dyn Converter<T>>) -> Rc<dyn Any> {
    Rc::new(converter)
}

fn downcast_converter<T: 'static>(any: &Rc<dyn Any>) -> Rc<dyn Converter<T>> {
    any.clone()
        .downcast::<Rc<dyn Converter<T>>>()
        .map(|rc| (*rc).clone())
        .unwrap_or_else(|_| unreachable!("converter cache slot held the wrong type for its own key"))
}

/// Forwards to the real converter for `T` once the cache slot that was
/// in-flight when this placeholder was handed out finishes building.
///
/// Never observed outside the (recursive) build that produced it: by the
/// time a top-level `serialize`/`deserialize` call actually drives a
/// converter's `write`/`read`, every slot involved has resolved.
pub struct DelayedConverter<T> {
    slot: Slot,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> DelayedConverter<T> {
    fn resolved(&self) -> Rc<dyn Converter<T>> {
        let guard = self.slot.borrow();
        let any = guard.as_ref().expect(
            "delayed converter resolved before its cache slot finished building \
             (a converter invoked write/read during its own construction)",
        );
        downcast_converter(any)
    }
}

impl<T: 'static> Converter<T> for DelayedConverter<T> {
    fn write(&self, w: &mut Writer<'_>, value: &T, ctx: &SerializationContext) -> Result<(), Error> {
        self.resolved().write(w, value, ctx)
    }

    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<T, Error> {
        self.resolved().read(r, ctx)
    }
}
