//! Shared types for FSBK soundbanks
//!
//! This crate provides the binary format shared between:
//! - `fsbk-export` (soundbank builder)
//! - playback-side tooling that reads `.sbk` files back
//!
//! # Modules
//!
//! - [`formats`] - Header, instrument, region and sample records plus the
//!   soundbank image writer/reader
//! - [`envelope`] - PS1 ADSR register packing

pub mod envelope;
pub mod formats;

pub use envelope::{AdsrRegisters, EnvelopeError, RawEnvelope, SimpleEnvelope};

pub use formats::{
    BinarySerializable, FSBK_MAGIC, FormatError, INSTRUMENT_SLOTS, InstrumentDescriptor,
    MAX_REGIONS_PER_INSTRUMENT, NO_LOOP, PackedRegion, ParsedSoundbank, RegionLayout,
    RegionRecord, SampleFormat, SampleHeader, Section, SectionLayout, SoundbankHeader,
    SoundbankImage, SplitRegion,
};
