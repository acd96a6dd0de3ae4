//! Logic Module - Admission engine and its stores
//!
//! ## Layout
//! - `storage/` - Photo slot persistence (filesystem, in-memory)
//! - `threshold` - Durable admission threshold
//! - `similarity/` - Image decoding and similarity scoring
//! - `admission/` - Admission engine (score, decide, replace)

pub mod storage;
pub mod threshold;
pub mod similarity;
pub mod admission;

#[cfg(test)]
pub(crate) mod test_support;
