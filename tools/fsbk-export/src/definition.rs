//! Instrument definition table parser
//!
//! One region per line, fields joined by a single delimiter:
//!
//! ```text
//! # simple: id;key_min;key_max;delay;attack;hold;decay;sustain;release;volume;panning;path
//! 0;0;59;0;5;0;200;49152;300;127;127;piano_low.wav
//!
//! # raw: id;key_min;key_max;attack_mode;attack_shift;attack_step;decay_shift;sustain_level;
//! #      sustain_mode;sustain_direction;sustain_shift;sustain_step;release_step;release_mode;
//! #      release_shift;volume;panning;path
//! ```
//!
//! Lines starting with `#` and blank lines are skipped. Integers are decimal
//! or `0x` hex. The path is everything after the last integer field, relative
//! to the definition file's directory.

use std::io::BufRead;
use std::path::PathBuf;

use fsbk_common::{RawEnvelope, SimpleEnvelope};

use crate::config::EnvelopeScheme;

/// Highest instrument id
pub const MAX_INSTRUMENT_ID: u64 = 255;
/// Highest MIDI key
pub const MAX_KEY: u64 = 127;

#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("failed to read definition table")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected {expected} fields, found {found}")]
    FieldCount {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: {field} '{value}' is not an integer")]
    InvalidInteger {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("line {line}: {field} = {value} is out of range (max {max})")]
    OutOfRange {
        line: usize,
        field: &'static str,
        value: u64,
        max: u64,
    },

    #[error("line {line}: key_min {key_min} is above key_max {key_max}")]
    InvertedKeyRange {
        line: usize,
        key_min: u8,
        key_max: u8,
    },

    #[error("line {line}: missing sample path")]
    MissingPath { line: usize },

    #[error("line {line}: not valid UTF-8")]
    InvalidUtf8 { line: usize },
}

impl DefinitionError {
    /// Line the error refers to; `None` for read failures
    pub fn line(&self) -> Option<usize> {
        match self {
            DefinitionError::Io(_) => None,
            DefinitionError::FieldCount { line, .. }
            | DefinitionError::InvalidInteger { line, .. }
            | DefinitionError::OutOfRange { line, .. }
            | DefinitionError::InvertedKeyRange { line, .. }
            | DefinitionError::MissingPath { line }
            | DefinitionError::InvalidUtf8 { line } => Some(*line),
        }
    }

    /// Whether the rest of the table can still be read
    pub fn is_row_error(&self) -> bool {
        !matches!(self, DefinitionError::Io(_))
    }
}

/// Envelope fields of one row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEnvelope {
    Simple(SimpleEnvelope),
    Raw(RawEnvelope),
}

/// One parsed definition row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionRow {
    /// 1-based line number in the table
    pub line: usize,
    pub instrument: u8,
    pub key_min: u8,
    pub key_max: u8,
    pub envelope: RowEnvelope,
    /// Volume (simple) or volume multiplier (raw)
    pub volume: u16,
    /// 0 = left, 127 = middle, 254 = right
    pub panning: u16,
    /// Sample path as written in the table
    pub sample_path: PathBuf,
}

const SIMPLE_FIELDS: [&str; 11] = [
    "instrument",
    "key_min",
    "key_max",
    "delay",
    "attack",
    "hold",
    "decay",
    "sustain",
    "release",
    "volume",
    "panning",
];

const RAW_FIELDS: [&str; 17] = [
    "instrument",
    "key_min",
    "key_max",
    "attack_mode",
    "attack_shift",
    "attack_step",
    "decay_shift",
    "sustain_level",
    "sustain_mode",
    "sustain_direction",
    "sustain_shift",
    "sustain_step",
    "release_step",
    "release_mode",
    "release_shift",
    "volume",
    "panning",
];

impl EnvelopeScheme {
    fn field_names(self) -> &'static [&'static str] {
        match self {
            EnvelopeScheme::Simple => &SIMPLE_FIELDS,
            EnvelopeScheme::Raw => &RAW_FIELDS,
        }
    }

    /// Fields per row, including the path
    pub fn field_count(self) -> usize {
        self.field_names().len() + 1
    }
}

/// Parse `0x`-prefixed hex or decimal
fn parse_integer(text: &str) -> Option<u64> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

/// Integer fields of one row, parsed in order
struct FieldCursor<'a> {
    line: usize,
    lenient: bool,
    names: &'static [&'static str],
    values: &'a [&'a str],
    index: usize,
}

impl FieldCursor<'_> {
    fn next(&mut self, max: u64) -> Result<u64, DefinitionError> {
        let field = self.names[self.index];
        let text = self.values[self.index];
        self.index += 1;

        let value = match parse_integer(text) {
            Some(value) => value,
            None if self.lenient => 0,
            None => {
                return Err(DefinitionError::InvalidInteger {
                    line: self.line,
                    field,
                    value: text.trim().to_string(),
                });
            }
        };
        if value > max {
            return Err(DefinitionError::OutOfRange {
                line: self.line,
                field,
                value,
                max,
            });
        }
        Ok(value)
    }

    fn u8(&mut self, max: u64) -> Result<u8, DefinitionError> {
        self.next(max).map(|v| v as u8)
    }

    fn u16(&mut self) -> Result<u16, DefinitionError> {
        self.next(u16::MAX as u64).map(|v| v as u16)
    }

    fn u32(&mut self) -> Result<u32, DefinitionError> {
        self.next(u32::MAX as u64).map(|v| v as u32)
    }
}

/// Parse a single record line
pub fn parse_row(
    text: &str,
    line: usize,
    scheme: EnvelopeScheme,
    delimiter: char,
    lenient: bool,
) -> Result<DefinitionRow, DefinitionError> {
    let expected = scheme.field_count();
    let fields: Vec<&str> = text.splitn(expected, delimiter).collect();
    if fields.len() != expected {
        return Err(DefinitionError::FieldCount {
            line,
            expected,
            found: fields.len(),
        });
    }

    let path = fields[expected - 1].trim();
    if path.is_empty() {
        return Err(DefinitionError::MissingPath { line });
    }

    let mut cursor = FieldCursor {
        line,
        lenient,
        names: scheme.field_names(),
        values: &fields[..expected - 1],
        index: 0,
    };

    let instrument = cursor.u8(MAX_INSTRUMENT_ID)?;
    let key_min = cursor.u8(MAX_KEY)?;
    let key_max = cursor.u8(MAX_KEY)?;
    if key_min > key_max {
        return Err(DefinitionError::InvertedKeyRange {
            line,
            key_min,
            key_max,
        });
    }

    let envelope = match scheme {
        EnvelopeScheme::Simple => RowEnvelope::Simple(SimpleEnvelope {
            delay: cursor.u16()?,
            attack: cursor.u16()?,
            hold: cursor.u16()?,
            decay: cursor.u16()?,
            sustain: cursor.u16()?,
            release: cursor.u16()?,
        }),
        // Register widths are checked when packing
        EnvelopeScheme::Raw => RowEnvelope::Raw(RawEnvelope {
            attack_mode: cursor.u32()?,
            attack_shift: cursor.u32()?,
            attack_step: cursor.u32()?,
            decay_shift: cursor.u32()?,
            sustain_level: cursor.u32()?,
            sustain_mode: cursor.u32()?,
            sustain_direction: cursor.u32()?,
            sustain_shift: cursor.u32()?,
            sustain_step: cursor.u32()?,
            release_step: cursor.u32()?,
            release_mode: cursor.u32()?,
            release_shift: cursor.u32()?,
        }),
    };

    Ok(DefinitionRow {
        line,
        instrument,
        key_min,
        key_max,
        envelope,
        volume: cursor.u16()?,
        panning: cursor.u16()?,
        sample_path: PathBuf::from(path),
    })
}

/// Lazy row reader over a definition table
pub struct DefinitionReader<R> {
    source: R,
    scheme: EnvelopeScheme,
    delimiter: char,
    lenient: bool,
    line: usize,
    buf: Vec<u8>,
}

impl<R: BufRead> DefinitionReader<R> {
    pub fn new(source: R, scheme: EnvelopeScheme, delimiter: char) -> Self {
        Self {
            source,
            scheme,
            delimiter,
            lenient: false,
            line: 0,
            buf: Vec::new(),
        }
    }

    /// Read unparseable integers as 0 instead of failing the row
    pub fn lenient(mut self, lenient: bool) -> Self {
        self.lenient = lenient;
        self
    }
}

impl<R: BufRead> Iterator for DefinitionReader<R> {
    type Item = Result<DefinitionRow, DefinitionError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buf.clear();
            match self.source.read_until(b'\n', &mut self.buf) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }
            self.line += 1;

            // Comments are skipped whatever their encoding
            let bytes = self.buf.trim_ascii();
            if bytes.is_empty() || bytes.starts_with(b"#") {
                continue;
            }

            let text = match std::str::from_utf8(&self.buf) {
                Ok(text) => text.trim_end_matches(['\n', '\r']),
                Err(_) => return Some(Err(DefinitionError::InvalidUtf8 { line: self.line })),
            };

            return Some(parse_row(
                text,
                self.line,
                self.scheme,
                self.delimiter,
                self.lenient,
            ));
        }
    }
}
