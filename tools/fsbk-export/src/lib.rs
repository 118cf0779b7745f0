//! fsbk-export library
//!
//! Builds FSBK soundbanks from an instrument definition table and the WAV
//! samples it references. The `fsbk-export` binary is a thin CLI over
//! [`export_soundbank`].

pub mod arena;
pub mod config;
pub mod definition;
pub mod encoder;
pub mod pipeline;
pub mod tables;
pub mod wav;

pub use arena::{ArenaStats, SampleArena};
pub use config::{
    BuildConfig, ConfigError, ConfigFile, ConfigOverrides, EnvelopeScheme, OutputFormat,
};
pub use definition::{DefinitionError, DefinitionReader, DefinitionRow, RowEnvelope};
pub use encoder::{EncodedSample, encode_sample};
pub use pipeline::{
    BuildError, BuildReport, BuiltSoundbank, SkippedRow, build_from_reader, build_soundbank,
    export_soundbank,
};
pub use tables::{FinalTables, TableBuilder, TableError};
pub use wav::{LoopPoints, WavError, WaveAsset};
