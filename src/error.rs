//! The error types produced by the codec's readers, writers and converters.

#[cfg(feature = "alloc")]
use alloc::string::String;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;
use core::fmt;

/// The cause of the error that occurred during (de)serialization.
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    InvalidFormat { byte_offset: u64, reason: &'static str },
    OutOfRange { from: i128, to: &'static str },
    DepthExceeded { limit: u32 },
    Cancelled,
    MissingRequiredMember { name: &'static str },
    UnknownSubtype { declared_type: &'static str },
    UnknownAlias { alias: i64 },
    #[cfg(feature = "std")]
    IO(std::io::ErrorKind),
}

/// The cause and location of the error that occurred during (de)serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    item: Item,
}

/// The member/index chain leading to the value that caused the error.
///
/// Built up one frame at a time as the error bubbles out of nested converters,
/// innermost first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Item {
    #[cfg(not(feature = "alloc"))]
    name: Option<&'static str>,
    #[cfg(feature = "alloc")]
    path: Vec<String>,
}

/// Enables errors to trace the serialized data structure's hierarchy.
pub trait ContextualError: Sized {
    /// Annotate the error with the member/item that's being (de)serialized.
    #[cfg(not(feature = "alloc"))]
    fn enclose(self, ident: &'static str) -> Self;

    /// Annotate the error with the member/item that's being (de)serialized.
    #[cfg(feature = "alloc")]
    fn enclose(self, ident: &str) -> Self;
}

//------------------------------------------------------------------------------
// Error implementations
//------------------------------------------------------------------------------

impl Error {
    /// The kind of failure that occurred.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The member/index chain leading to the failing value, if any.
    pub fn item(&self) -> &Item {
        &self.item
    }

    /// The byte offset the failure was detected at, if the kind carries one.
    pub fn byte_offset(&self) -> Option<u64> {
        match self.kind {
            ErrorKind::InvalidFormat { byte_offset, .. } => Some(byte_offset),
            _ => None,
        }
    }
}

impl ContextualError for Error {
    #[cfg(not(feature = "alloc"))]
    fn enclose(self, ident: &'static str) -> Self {
        Self { kind: self.kind, item: self.item.enclose(ident) }
    }

    #[cfg(feature = "alloc")]
    fn enclose(self, ident: &str) -> Self {
        Self { kind: self.kind, item: self.item.enclose(ident) }
    }
}

impl core::error::Error for Error {}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.item.is_empty() {
            write!(f, "{}: {}", self.item, self.kind)
        } else {
            write!(f, "{}", self.kind)
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(value: ErrorKind) -> Self {
        Self { kind: value, item: Item::default() }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        ErrorKind::IO(value.kind()).into()
    }
}

//------------------------------------------------------------------------------
// ErrorKind implementations
//------------------------------------------------------------------------------

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use ErrorKind::*;
        match self {
            InvalidFormat { byte_offset, reason } => {
                write!(f, "invalid msgpack at byte {byte_offset}: {reason}")
            }
            OutOfRange { from, to } => write!(f, "value {from} does not fit in {to}"),
            DepthExceeded { limit } => write!(f, "recursion exceeded the configured depth limit of {limit}"),
            Cancelled => write!(f, "the operation was cancelled"),
            MissingRequiredMember { name } => write!(f, "missing required member \"{name}\""),
            UnknownSubtype { declared_type } => {
                write!(f, "no union alias registered for the runtime subtype of {declared_type}")
            }
            UnknownAlias { alias } => write!(f, "no union member registered for alias {alias}"),
            #[cfg(feature = "std")]
            IO(kind) => write!(f, "{kind}"),
        }
    }
}

//------------------------------------------------------------------------------
// Item implementations
//------------------------------------------------------------------------------

impl Item {
    /// Check if there are any member/item annotations recorded.
    #[cfg(not(feature = "alloc"))]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }

    /// Check if there are any member/item annotations recorded.
    #[cfg(feature = "alloc")]
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }

    /// Annotate the item with the member/item that's being (de)serialized.
    #[cfg(not(feature = "alloc"))]
    pub fn enclose(self, ident: &'static str) -> Self {
        Self { name: Some(self.name.unwrap_or(ident)) }
    }

    /// Annotate the item with the member/item that's being (de)serialized.
    #[cfg(feature = "alloc")]
    pub fn enclose(mut self, ident: &str) -> Self {
        self.path.push(ident.into());
        self
    }
}

impl fmt::Display for Item {
    #[cfg(not(feature = "alloc"))]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name {
            Some(name) => write!(f, "{name}"),
            None => Ok(()),
        }
    }

    #[cfg(feature = "alloc")]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for ident in self.path.iter().rev() {
            if !first {
                write!(f, ".")?;
            }
            write!(f, "{ident}")?;
            first = false;
        }
        Ok(())
    }
}
