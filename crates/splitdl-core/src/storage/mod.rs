//! Destination file lifecycle.
//!
//! Opens the destination in resume or fresh mode, derives a free name when
//! the requested one is taken, and hands out a cloneable writer supporting
//! concurrent positioned writes (pwrite) to disjoint regions.

mod naming;
mod writer;

pub use naming::claim_unique;
pub use writer::{OpenedStore, StorageWriter};
