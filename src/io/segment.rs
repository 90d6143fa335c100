//! An ordered sequence of immutable byte segments with stable, cheap positions.
//!
//! This is the buffer a [`crate::reader::Reader`] walks. Segments arrive one at
//! a time (e.g. one per pipe read in the async layer) and are never mutated or
//! removed once appended, so a [`Position`] captured before a later append
//! remains valid: growth never invalidates an existing position.

use alloc::vec::Vec;
use bytes::Bytes;

/// A position inside a [`SegmentedBuffer`]: a segment index plus a byte offset
/// into that segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub(crate) segment: usize,
    pub(crate) offset: usize,
}

impl Position {
    /// The position at the very start of the buffer.
    pub const ZERO: Position = Position { segment: 0, offset: 0 };
}

/// An ordered, append-only sequence of byte segments.
///
/// Reads never copy unless they straddle a segment boundary.
#[derive(Debug, Default)]
pub struct SegmentedBuffer {
    segments: Vec<Bytes>,
}

impl SegmentedBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self { segments: Vec::new() }
    }

    /// Create a buffer holding a single segment.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let mut buffer = Self::new();
        buffer.push_segment(bytes);
        buffer
    }

    /// Append a new segment. Existing [`Position`]s remain valid.
    pub fn push_segment(&mut self, bytes: impl Into<Bytes>) {
        let bytes = bytes.into();
        if !bytes.is_empty() {
            self.segments.push(bytes);
        }
    }

    /// The total number of bytes between `from` (inclusive) and the end of the
    /// buffer, or `None` if `from` is past everything currently buffered.
    pub fn remaining_len(&self, from: Position) -> Option<u64> {
        if from.segment > self.segments.len() {
            return None;
        }
        if from.segment == self.segments.len() {
            return if from.offset == 0 { Some(0) } else { None };
        }
        let mut total = (self.segments[from.segment].len() - from.offset) as u64;
        for seg in &self.segments[from.segment + 1..] {
            total += seg.len() as u64;
        }
        Some(total)
    }

    /// The absolute byte offset of `pos` from the start of the buffer. Used
    /// only for error reporting.
    pub fn byte_offset(&self, pos: Position) -> u64 {
        let mut total = 0u64;
        for seg in &self.segments[..pos.segment.min(self.segments.len())] {
            total += seg.len() as u64;
        }
        total + pos.offset as u64
    }

    /// Advance `pos` by `n` bytes, returning the new position, or `None` if
    /// fewer than `n` bytes are currently buffered from `pos`.
    pub fn advance(&self, mut pos: Position, mut n: usize) -> Option<Position> {
        while n > 0 {
            let seg = self.segments.get(pos.segment)?;
            let available = seg.len() - pos.offset;
            if n < available {
                pos.offset += n;
                return Some(pos);
            }
            n -= available;
            pos.segment += 1;
            pos.offset = 0;
        }
        Some(pos)
    }

    /// Borrow `len` bytes starting at `pos` if they lie entirely within one
    /// segment. Returns `None` both when the data is out of buffer and when it
    /// straddles a segment boundary (in which case [`Self::copy_range`] must be
    /// used instead).
    pub fn contiguous_slice(&self, pos: Position, len: usize) -> Option<&[u8]> {
        let seg = self.segments.get(pos.segment)?;
        let end = pos.offset.checked_add(len)?;
        if end <= seg.len() {
            Some(&seg[pos.offset..end])
        } else {
            None
        }
    }

    /// Materialize `len` bytes starting at `pos`, copying across segment
    /// boundaries as necessary. Returns `None` if fewer than `len` bytes are
    /// buffered from `pos`.
    pub fn copy_range(&self, pos: Position, len: usize) -> Option<Vec<u8>> {
        if let Some(slice) = self.contiguous_slice(pos, len) {
            return Some(slice.to_vec());
        }
        let mut out = Vec::with_capacity(len);
        let mut cur = pos;
        while out.len() < len {
            let seg = self.segments.get(cur.segment)?;
            let available = seg.len() - cur.offset;
            let take = available.min(len - out.len());
            out.extend_from_slice(&seg[cur.offset..cur.offset + take]);
            cur.offset += take;
            if cur.offset == seg.len() {
                cur.segment += 1;
                cur.offset = 0;
            }
        }
        Some(out)
    }

    /// Read a single byte at `pos` without advancing.
    pub fn peek_byte(&self, pos: Position) -> Option<u8> {
        self.segments.get(pos.segment).map(|seg| seg[pos.offset])
    }

    /// Drop every segment that lies entirely before `pos`, rewriting `pos` (and
    /// any position callers track relative to it) to segment `0`. Used by the
    /// async layer to bound memory growth once bytes are consumed and will
    /// never be revisited.
    pub fn compact_before(&mut self, pos: Position) -> Position {
        if pos.segment == 0 {
            return pos;
        }
        self.segments.drain(0..pos.segment);
        Position { segment: 0, offset: pos.offset }
    }
}
