//! The shape-provider interface: narrow traits a caller implements for their
//! own types so the converter framework can read and write them without a
//! derive macro walking fields at compile time.
//!
//! This plays the role a `Serialize`/`Deserialize` trait pair plays elsewhere,
//! one level removed: instead of a type implementing the conversion
//! directly, it describes its *shape* once (kind, members, constructor) and
//! [`crate::converter`] builds and caches the converter that walks it. The
//! per-kind `*Model` traits exist so that description can stay free of
//! closures — every hook is a plain `fn` pointer, which keeps a [`Shape`]
//! `'static`, `Copy`, and cheap to use as a cache key.

use core::any::TypeId;

#[cfg(feature = "alloc")]
use alloc::boxed::Box;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;
#[cfg(feature = "alloc")]
use core::any::Any;
#[cfg(feature = "alloc")]
use core::marker::PhantomData;

use crate::context::SerializationContext;
use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

/// The width of an enum shape's underlying integer representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntWidth {
    W8,
    W16,
    W32,
    W64,
}

/// Which conversion strategy a shape requires.
///
/// Carries no type-specific functions — those live on the `*Model` trait the
/// concrete type implements and are looked up through ordinary generic
/// dispatch once the converter framework already knows the Rust type. `Shape`
/// itself only has to identify and classify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    /// A scalar msgpack primitive: nil, bool, an integer or float width.
    Primitive,
    /// An `Option<T>`-shaped wrapper: nil on `None`, the inner shape otherwise.
    Nullable,
    /// A fixed set of named integer values.
    Enum {
        /// The underlying integer width values are encoded at.
        underlying: IntWidth,
    },
    /// A homogeneous, finite sequence (see [`EnumerableModel`]).
    Enumerable,
    /// A homogeneous key/value collection (see [`DictionaryModel`]).
    Dictionary,
    /// A fixed set of named, independently-typed members (see [`ObjectModel`]).
    Object,
    /// A closed set of alternative sub-shapes (see [`UnionModel`]).
    Union,
}

/// The static description of a type's layout, as returned by [`HasShape::shape`].
///
/// `id` is the cache key the converter framework keys its cache on; two
/// shapes with the same `id` are assumed identical.
#[derive(Debug, Clone, Copy)]
pub struct Shape {
    /// Uniquely identifies this shape for converter-cache purposes.
    pub id: TypeId,
    /// A human-readable name, used only in diagnostics.
    pub name: &'static str,
    /// Which conversion strategy applies.
    pub kind: ShapeKind,
}

/// A type that can describe its own layout.
///
/// Implemented by hand for primitives inside this crate; user types either
/// implement it directly or get it from their own code generator — no derive
/// macro ships with this crate.
pub trait HasShape: 'static {
    /// The static description of `Self`'s layout.
    fn shape() -> Shape;
}

//------------------------------------------------------------------------------
// Object
//------------------------------------------------------------------------------

/// One member of an [`ObjectModel`] type: a name, an explicit integer key (for
/// array layout), and the plain-`fn` hooks the object converter calls to move
/// a value in or out of `O`.
#[cfg(feature = "alloc")]
pub struct MemberDescriptor<O> {
    /// The member's name, used as the map-layout key and in error paths.
    pub name: &'static str,
    /// The member's explicit position, present only when the shape assigns
    /// one; array layout requires every serialized member to have one.
    pub explicit_key: Option<u32>,
    /// Whether a read that never sees this member is an error.
    pub required: bool,
    /// Whether `unused-data-packet` retention should target this member
    /// instead of treating it as an ordinary value.
    pub is_unused_data_sink: bool,
    /// Write this member's current value.
    pub write: fn(&O, &mut Writer<'_>, &SerializationContext) -> Result<(), Error>,
    /// Read one value and store it into the partial builder at this member's
    /// slot.
    pub read_into: fn(&mut PartialObject<O>, &mut Reader<'_>, &SerializationContext) -> Result<(), Error>,
    /// Whether this member's current value equals its declared default
    /// (consulted by [`crate::config::DefaultValuePolicy::Never`]).
    pub is_default: fn(&O) -> bool,
}

/// Type-erased, slot-indexed storage an object converter fills in while
/// reading, before handing it to [`ObjectModel::build`].
#[cfg(feature = "alloc")]
pub struct PartialObject<O> {
    slots: Vec<Option<Box<dyn Any>>>,
    _marker: PhantomData<fn() -> O>,
}

#[cfg(feature = "alloc")]
impl<O: ObjectModel> PartialObject<O> {
    /// An empty builder with one unset slot per declared member.
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(O::MEMBERS.len());
        slots.resize_with(O::MEMBERS.len(), || None);
        Self { slots, _marker: PhantomData }
    }

    /// Store a just-read value at `index`.
    pub fn set<T: 'static>(&mut self, index: usize, value: T) {
        self.slots[index] = Some(Box::new(value));
    }

    /// Take the value stored at `index`, if any was set.
    pub fn take<T: 'static>(&mut self, index: usize) -> Option<T> {
        self.slots[index].take().and_then(|boxed| boxed.downcast::<T>().ok()).map(|boxed| *boxed)
    }

    /// Whether `index` has been filled.
    pub fn is_set(&self, index: usize) -> bool {
        self.slots[index].is_some()
    }
}

#[cfg(feature = "alloc")]
impl<O: ObjectModel> Default for PartialObject<O> {
    fn default() -> Self {
        Self::new()
    }
}

/// A type with a fixed set of named, independently-typed members.
#[cfg(feature = "alloc")]
pub trait ObjectModel: HasShape + Sized + 'static {
    /// Members in declaration order. The object converter's array-layout
    /// decision and iteration order both follow this slice.
    const MEMBERS: &'static [MemberDescriptor<Self>];

    /// The index into [`Self::MEMBERS`] of the unused-data sink member, if
    /// this type declares one.
    const UNUSED_DATA_SINK: Option<usize> = None;

    /// Construct the final instance from a builder populated by reads.
    fn build(partial: PartialObject<Self>) -> Result<Self, Error>;

    /// Unused-data-packet entries captured by an earlier read into
    /// [`Self::UNUSED_DATA_SINK`], to be merged back into a later write.
    /// Types with no sink member (the default) have nothing to merge.
    fn unused_data(&self) -> Option<&[crate::converter::UnusedDataEntry]> {
        None
    }
}

//------------------------------------------------------------------------------
// Enumerable
//------------------------------------------------------------------------------

/// A homogeneous, finite sequence type (`Vec<T>`, arrays, sets treated as
/// ordered for wire purposes).
#[cfg(feature = "alloc")]
pub trait EnumerableModel: HasShape + Sized + 'static {
    /// The element type every item converts through.
    type Element: 'static;

    /// The number of elements, written as the array header length.
    fn len(&self) -> usize;

    /// Whether there are no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow every element in iteration order.
    fn elements(&self) -> Vec<&Self::Element>;

    /// Build an instance from elements read in order.
    fn from_elements(elements: Vec<Self::Element>) -> Self;
}

//------------------------------------------------------------------------------
// Dictionary
//------------------------------------------------------------------------------

/// A homogeneous key/value collection.
#[cfg(feature = "alloc")]
pub trait DictionaryModel: HasShape + Sized + 'static {
    /// The key type every entry's key converts through.
    type Key: 'static;
    /// The value type every entry's value converts through.
    type Value: 'static;

    /// The number of entries, written as the map header length.
    fn len(&self) -> usize;

    /// Whether there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow every entry in iteration order.
    fn entries(&self) -> Vec<(&Self::Key, &Self::Value)>;

    /// Build an instance from entries read in order.
    fn from_entries(entries: Vec<(Self::Key, Self::Value)>) -> Self;
}

//------------------------------------------------------------------------------
// Union
//------------------------------------------------------------------------------

/// A union's wire alias: the first element of the `[alias, inner]` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnionAlias {
    /// An integer alias.
    Integer(i64),
    /// A string alias.
    Text(&'static str),
}

/// One alternative a [`UnionModel`] type may hold.
///
/// `alias` of `None` marks the distinguished "base" entry, written with a
/// `nil` wire alias instead of an explicit tag.
#[cfg(feature = "alloc")]
pub struct UnionEntry<O> {
    /// The wire alias this entry is registered under, or `None` for the base
    /// entry.
    pub alias: Option<UnionAlias>,
    /// Whether the current runtime value is this entry's sub-shape.
    pub matches: fn(&O) -> bool,
    /// Write the inner structure for this entry (the second array element).
    pub write_inner: fn(&O, &mut Writer<'_>, &SerializationContext) -> Result<(), Error>,
    /// Read the inner structure for this entry and construct the full union
    /// value from it.
    pub read_inner: fn(&mut Reader<'_>, &SerializationContext) -> Result<O, Error>,
}

/// A closed set of alternative sub-shapes sharing one wire envelope.
#[cfg(feature = "alloc")]
pub trait UnionModel: HasShape + Sized + 'static {
    /// Registered alternatives, checked against the runtime value in order on
    /// write, and against the wire alias on read.
    const ENTRIES: &'static [UnionEntry<Self>];
}
