//! Line-oriented editing buffer.
//!
//! Holds the authoritative source as ordered line records that the
//! editable view mutates, and joins them back into source text.

mod buffer;

pub use buffer::LineBuffer;
