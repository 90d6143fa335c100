#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

//! # shapepack
//!
//! A high-throughput MessagePack codec built around a shape-driven converter
//! framework: instead of a derive macro walking your types at compile time,
//! you describe each type's layout once (by implementing a handful of narrow
//! traits — see [`shape`]) and a lazily-built, cached graph of
//! [`converter::Converter`]s does the rest, including recursive types,
//! polymorphic unions, and reference-preserving round-trips.
//!
//! ## Serializing data structures
//!
//! ```
//! use shapepack::config::SerializerOptions;
//! use shapepack::serializer::Serializer;
//!
//! let serializer = Serializer::new(SerializerOptions::default());
//! let bytes = serializer.serialize(&42u32).unwrap();
//! let value: u32 = serializer.deserialize(&bytes).unwrap();
//! assert_eq!(value, 42);
//! ```
//!
//! User-defined `struct`s and `enum`s implement [`shape::HasShape`] plus the
//! matching `*Model` trait for their kind (object, enumerable, dictionary,
//! union) so the framework can read and write their members without a
//! generated impl. See `tests/` for end-to-end examples of each layout.
//!
//! ## `no_std` and embedded
//!
//! The format primitives and the reader/writer cursors work without `std` or
//! even `alloc` for scalar types. Object/enumerable/dictionary converters,
//! string interning, and reference preservation need the `alloc` feature; the
//! async streaming layer needs `std` (it is built on `tokio`).

#[cfg(feature = "alloc")]
extern crate alloc;

pub mod config;
pub mod context;
pub mod converter;
pub mod error;
pub mod format;
pub mod io;
pub mod reader;
pub mod shape;
pub mod writer;

#[cfg(feature = "alloc")]
pub mod diagnostics;
#[cfg(feature = "alloc")]
pub mod serializer;

#[cfg(feature = "std")]
pub mod async_io;

pub use converter::Converter;
pub use error::{Error, ErrorKind};

extern crate self as shapepack;
