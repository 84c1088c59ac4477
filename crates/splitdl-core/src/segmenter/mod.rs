//! Range math and segment planning.
//!
//! Splits the bytes still missing from a download into contiguous segments,
//! one per fetch worker, and renders their HTTP Range header values.

mod range;

pub use range::{plan_segments, Segment};
