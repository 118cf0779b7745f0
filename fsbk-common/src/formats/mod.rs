//! FSBK soundbank binary format
//!
//! A soundbank is one little-endian file read directly by the playback
//! engine:
//!
//! ```text
//! header                  (magic, sample count, section offsets, data size)
//! instrument descriptors  (256 x 4 bytes)
//! region table            (sample count x region record)
//! sample headers          (split layout only, sample count x 16 bytes)
//! sample data             (encoded samples, each 16-byte aligned)
//! ```
//!
//! Section offsets are relative to the first byte after the header.
//!
//! Fixed-size records implement the [`BinarySerializable`] trait for
//! consistent serialization/deserialization.

pub mod header;
pub mod instrument;
pub mod region;
pub mod sample;
mod serialization;
pub mod soundbank;

pub use header::*;
pub use instrument::*;
pub use region::*;
pub use sample::*;
pub use serialization::BinarySerializable;
pub use soundbank::*;
