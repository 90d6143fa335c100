//! The composition engine: turns a type's [`crate::shape::Shape`] into a
//! cached graph of `Converter<T>` implementations, each responsible for
//! reading or writing exactly one msgpack structure for its `T`.

use crate::context::SerializationContext;
use crate::error::Error;
use crate::reader::Reader;
use crate::writer::Writer;

/// An immutable, stateless operation pair bound to a specific type `T`.
///
/// A `write` call MUST emit exactly one msgpack structure; a `read` call MUST
/// consume exactly one. Implementations that recurse into other converters
/// (objects, collections, unions) get those converters from the context
/// rather than closing over them, so the same converter instance can be
/// shared across calls and cached by shape identity.
pub trait Converter<T> {
    /// Write `value` as one msgpack structure.
    fn write(&self, w: &mut Writer<'_>, value: &T, ctx: &SerializationContext) -> Result<(), Error>;

    /// Read one msgpack structure as a `T`.
    fn read(&self, r: &mut Reader<'_>, ctx: &SerializationContext) -> Result<T, Error>;
}

#[cfg(feature = "alloc")]
mod cache;
#[cfg(feature = "alloc")]
mod convert;
#[cfg(feature = "alloc")]
mod dictionary;
#[cfg(feature = "alloc")]
mod enumerable;
#[cfg(feature = "alloc")]
mod object;
mod primitive;
#[cfg(feature = "alloc")]
mod reference;
#[cfg(feature = "alloc")]
mod union;

#[cfg(feature = "alloc")]
pub use cache::{ConverterCache, DelayedConverter};
#[cfg(feature = "alloc")]
pub use convert::Convert;
#[cfg(feature = "alloc")]
pub use dictionary::DictionaryConverter;
#[cfg(feature = "alloc")]
pub use enumerable::EnumerableConverter;
#[cfg(feature = "alloc")]
pub use object::{ObjectConverter, UnusedDataEntry, UnusedDataKey};
pub use primitive::{BoolConverter, FloatConverter, IntConverter, NilConverter, UintConverter};
#[cfg(feature = "alloc")]
pub use reference::ReferencePreservingConverter;
#[cfg(feature = "alloc")]
pub use union::UnionConverter;

#[cfg(feature = "alloc")]
mod nullable;
#[cfg(feature = "alloc")]
pub use nullable::NullableConverter;

#[cfg(feature = "alloc")]
mod string;
#[cfg(feature = "alloc")]
pub use string::{BinaryConverter, StringConverter};
