//! The segmented buffer a [`crate::reader::Reader`] walks and the append-only
//! sink a [`crate::writer::Writer`] fills.

mod segment;
mod sink;

pub use segment::{Position, SegmentedBuffer};
pub use sink::{Sink, VecSink};
