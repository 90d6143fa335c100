//! Per-call state: remaining recursion depth, cancellation, string interning,
//! and (when the policy is on) the reference-preservation table.
//!
//! Every field here uses interior mutability so a [`SerializationContext`] can
//! be threaded through converters as a shared reference: `depth_step` must be
//! callable while another borrow of the context (e.g. a child converter
//! invocation) is still in scope, which a `&mut self` API would forbid.

#[cfg(feature = "alloc")]
use alloc::boxed::Box;
#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;
#[cfg(feature = "alloc")]
use alloc::rc::Rc;
#[cfg(feature = "alloc")]
use alloc::string::String;
#[cfg(feature = "alloc")]
use core::any::Any;
use core::cell::Cell;
#[cfg(feature = "alloc")]
use core::cell::RefCell;

use crate::config::SerializerOptions;
use crate::error::{Error, ErrorKind};

/// The outcome of looking up an object's identity in the write-side
/// reference table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceLookup {
    /// First time this identity is seen; the caller should serialize the
    /// value in full under this id.
    First(u32),
    /// This identity was already serialized; the caller should emit a
    /// back-reference instead.
    Repeat(u32),
}

/// Per-call context threaded through every converter invocation.
pub struct SerializationContext<'a> {
    options: &'a SerializerOptions,
    #[cfg(feature = "alloc")]
    cache: &'a crate::converter::ConverterCache,
    depth_remaining: Cell<u32>,
    cancelled: Cell<bool>,
    #[cfg(feature = "alloc")]
    interned: RefCell<BTreeMap<String, String>>,
    #[cfg(feature = "alloc")]
    write_seen: RefCell<BTreeMap<usize, u32>>,
    #[cfg(feature = "alloc")]
    read_slots: RefCell<alloc::vec::Vec<Option<Rc<dyn Any>>>>,
    #[cfg(feature = "alloc")]
    user_context: RefCell<BTreeMap<String, i64>>,
}

impl<'a> SerializationContext<'a> {
    /// Start a new per-call context from a serializer's immutable options and
    /// its shared converter cache.
    #[cfg(feature = "alloc")]
    pub fn new(options: &'a SerializerOptions, cache: &'a crate::converter::ConverterCache) -> Self {
        Self {
            options,
            cache,
            depth_remaining: Cell::new(options.max_depth()),
            cancelled: Cell::new(false),
            interned: RefCell::new(BTreeMap::new()),
            write_seen: RefCell::new(BTreeMap::new()),
            read_slots: RefCell::new(alloc::vec::Vec::new()),
            user_context: RefCell::new(options.starting_context.clone()),
        }
    }

    /// Start a new per-call context from a serializer's immutable options.
    #[cfg(not(feature = "alloc"))]
    pub fn new(options: &'a SerializerOptions) -> Self {
        Self { options, depth_remaining: Cell::new(options.max_depth()), cancelled: Cell::new(false) }
    }

    /// The options this context was built from.
    pub fn options(&self) -> &SerializerOptions {
        self.options
    }

    /// The shared converter cache a recursive converter uses to fetch the
    /// converter for a member/element/value type, rather than closing over
    /// one directly (which would make [`crate::shape::MemberDescriptor`]
    /// hold closures instead of plain `fn` pointers).
    #[cfg(feature = "alloc")]
    pub fn converters(&self) -> &'a crate::converter::ConverterCache {
        self.cache
    }

    /// Signal that the in-flight call should stop at the next checkpoint.
    pub fn cancel(&self) {
        self.cancelled.set(true);
    }

    /// Whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }

    /// Step one level deeper into a recursive structure. MUST be called
    /// before a converter produces/consumes anything but an immediate nil.
    /// The depth budget is restored when the returned guard drops.
    pub fn depth_step(&self) -> Result<DepthGuard<'_, 'a>, Error> {
        if self.cancelled.get() {
            return Err(ErrorKind::Cancelled.into());
        }
        let remaining = self.depth_remaining.get();
        if remaining == 0 {
            return Err(ErrorKind::DepthExceeded { limit: self.options.max_depth() }.into());
        }
        self.depth_remaining.set(remaining - 1);
        Ok(DepthGuard { ctx: self })
    }
}

/// RAII guard returned by [`SerializationContext::depth_step`]; restores the
/// depth budget on drop so the caller never has to do it explicitly.
pub struct DepthGuard<'ctx, 'a> {
    ctx: &'ctx SerializationContext<'a>,
}

impl core::fmt::Debug for DepthGuard<'_, '_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DepthGuard").finish()
    }
}

impl Drop for DepthGuard<'_, '_> {
    fn drop(&mut self) {
        self.ctx.depth_remaining.set(self.ctx.depth_remaining.get() + 1);
    }
}

#[cfg(feature = "alloc")]
impl<'a> SerializationContext<'a> {
    /// Canonicalize a just-decoded string against ones already seen this
    /// call, so repeated byte-equal payloads share one allocation.
    pub fn intern(&self, s: &str) -> String {
        let mut table = self.interned.borrow_mut();
        if let Some(existing) = table.get(s) {
            return existing.clone();
        }
        let owned = String::from(s);
        table.insert(owned.clone(), owned.clone());
        owned
    }

    /// Look up `ptr` (an object's address, used as its identity) in the
    /// write-side reference table, assigning it the next id on first sight.
    pub fn note_reference_for_write(&self, ptr: usize) -> ReferenceLookup {
        let mut seen = self.write_seen.borrow_mut();
        if let Some(&id) = seen.get(&ptr) {
            return ReferenceLookup::Repeat(id);
        }
        let id = seen.len() as u32;
        seen.insert(ptr, id);
        ReferenceLookup::First(id)
    }

    /// Reserve the next read-side reference slot, to be filled in once the
    /// value currently being deserialized finishes construction.
    pub fn reserve_read_slot(&self) -> u32 {
        let mut slots = self.read_slots.borrow_mut();
        slots.push(None);
        (slots.len() - 1) as u32
    }

    /// Fill a previously reserved read-side slot.
    pub fn fill_read_slot(&self, id: u32, value: Rc<dyn Any>) {
        let mut slots = self.read_slots.borrow_mut();
        slots[id as usize] = Some(value);
    }

    /// Fetch a previously materialized value from the read-side reference
    /// table, downcast to its concrete type.
    pub fn get_read_slot<T: 'static>(&self, id: u32) -> Option<Rc<T>> {
        let slots = self.read_slots.borrow();
        let any = slots.get(id as usize)?.as_ref()?.clone();
        any.downcast::<T>().ok()
    }

    /// Read a value out of the user-populated context table, seeded from
    /// [`crate::config::SerializerOptions::with_context_value`] and mutable
    /// for the rest of the call by any converter that runs afterward.
    pub fn context_value(&self, key: &str) -> Option<i64> {
        self.user_context.borrow().get(key).copied()
    }

    /// Set (or overwrite) a value in the user-populated context table.
    /// Converters use this to pass state to siblings/descendants further
    /// along in the same call, e.g. a running counter or a feature flag
    /// flipped partway through a document.
    pub fn set_context_value(&self, key: impl Into<String>, value: i64) {
        self.user_context.borrow_mut().insert(key.into(), value);
    }
}

#[cfg(not(feature = "alloc"))]
impl<'a> SerializationContext<'a> {
    /// `no_std` builds without `alloc` cannot intern (no owned strings); the
    /// caller receives its input back unchanged.
    pub fn intern<'s>(&self, s: &'s str) -> &'s str {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterCache;

    #[test]
    fn depth_step_restores_on_drop() {
        let opts = SerializerOptions::default().with_max_depth(2);
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        {
            let _a = ctx.depth_step().unwrap();
            let _b = ctx.depth_step().unwrap();
            assert!(ctx.depth_step().is_err());
        }
        assert!(ctx.depth_step().is_ok());
    }

    #[test]
    fn cancellation_short_circuits_depth_step() {
        let opts = SerializerOptions::default();
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        ctx.cancel();
        assert!(matches!(ctx.depth_step().unwrap_err().kind(), ErrorKind::Cancelled));
    }

    #[test]
    fn interning_returns_the_same_content_for_repeated_strings() {
        let opts = SerializerOptions::default();
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        let a = ctx.intern("hello");
        let b = ctx.intern("hello");
        assert_eq!(a, b);
    }

    #[test]
    fn user_context_is_seeded_from_options_and_mutable_afterward() {
        let opts = SerializerOptions::default().with_context_value("schema_version", 3);
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        assert_eq!(ctx.context_value("schema_version"), Some(3));
        assert_eq!(ctx.context_value("missing"), None);
        ctx.set_context_value("schema_version", 4);
        assert_eq!(ctx.context_value("schema_version"), Some(4));
    }

    #[test]
    fn write_side_reference_table_distinguishes_identities() {
        let opts = SerializerOptions::default();
        let cache = ConverterCache::new();
        let ctx = SerializationContext::new(&opts, &cache);
        assert_eq!(ctx.note_reference_for_write(0x1000), ReferenceLookup::First(0));
        assert_eq!(ctx.note_reference_for_write(0x1000), ReferenceLookup::Repeat(0));
        assert_eq!(ctx.note_reference_for_write(0x2000), ReferenceLookup::First(1));
    }
}
