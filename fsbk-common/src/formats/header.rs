//! Soundbank header and region layout selection
//!
//! # Layout
//! ```text
//! 0x00: magic "FSBK"
//! 0x04: sample_count u32 LE
//! 0x08: instrument_offset u32 LE
//! 0x0C: region_offset u32 LE
//! 0x10: sample_header_offset u32 LE   (split layout only)
//! ....: sample_data_offset u32 LE
//! ....: sample_data_size u32 LE
//! ```
//!
//! The header does not say which layout it uses; readers are configured
//! with the same [`RegionLayout`] the bank was built with.

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use super::{PackedRegion, SplitRegion};

/// File magic
pub const FSBK_MAGIC: [u8; 4] = *b"FSBK";

/// How region records carry their sample and envelope data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionLayout {
    /// Regions reference a separate sample header table and keep
    /// millisecond envelope fields
    #[default]
    Split,
    /// Regions embed sample offset/rate and packed ADSR registers
    Packed,
}

impl RegionLayout {
    /// Whether the bank has a standalone sample header table
    pub fn has_sample_headers(self) -> bool {
        matches!(self, RegionLayout::Split)
    }

    /// Serialized header size in bytes
    pub fn header_size(self) -> usize {
        match self {
            RegionLayout::Split => 28,
            RegionLayout::Packed => 24,
        }
    }

    /// Size of one region record in bytes
    pub fn region_record_size(self) -> usize {
        match self {
            RegionLayout::Split => SplitRegion::SIZE,
            RegionLayout::Packed => PackedRegion::SIZE,
        }
    }
}

impl fmt::Display for RegionLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionLayout::Split => write!(f, "split"),
            RegionLayout::Packed => write!(f, "packed"),
        }
    }
}

impl FromStr for RegionLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "split" => Ok(RegionLayout::Split),
            "packed" => Ok(RegionLayout::Packed),
            other => Err(format!(
                "unknown region layout '{}' (expected split or packed)",
                other
            )),
        }
    }
}

/// Soundbank header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundbankHeader {
    pub sample_count: u32,
    pub instrument_offset: u32,
    pub region_offset: u32,
    /// Present only in the split layout
    pub sample_header_offset: Option<u32>,
    pub sample_data_offset: u32,
    pub sample_data_size: u32,
}

impl SoundbankHeader {
    /// Layout implied by the presence of a sample header table
    pub fn layout(&self) -> RegionLayout {
        if self.sample_header_offset.is_some() {
            RegionLayout::Split
        } else {
            RegionLayout::Packed
        }
    }

    /// Serialized size in bytes
    pub fn size(&self) -> usize {
        self.layout().header_size()
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.size());
        bytes.extend_from_slice(&FSBK_MAGIC);
        bytes.extend_from_slice(&self.sample_count.to_le_bytes());
        bytes.extend_from_slice(&self.instrument_offset.to_le_bytes());
        bytes.extend_from_slice(&self.region_offset.to_le_bytes());
        if let Some(offset) = self.sample_header_offset {
            bytes.extend_from_slice(&offset.to_le_bytes());
        }
        bytes.extend_from_slice(&self.sample_data_offset.to_le_bytes());
        bytes.extend_from_slice(&self.sample_data_size.to_le_bytes());
        bytes
    }

    /// Read header from bytes
    ///
    /// Returns `None` if the slice is too short or the magic is wrong.
    pub fn from_bytes(bytes: &[u8], layout: RegionLayout) -> Option<Self> {
        if bytes.len() < layout.header_size() || bytes[0..4] != FSBK_MAGIC {
            return None;
        }

        let word = |i: usize| {
            let at = 4 + i * 4;
            u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
        };

        Some(match layout {
            RegionLayout::Split => Self {
                sample_count: word(0),
                instrument_offset: word(1),
                region_offset: word(2),
                sample_header_offset: Some(word(3)),
                sample_data_offset: word(4),
                sample_data_size: word(5),
            },
            RegionLayout::Packed => Self {
                sample_count: word(0),
                instrument_offset: word(1),
                region_offset: word(2),
                sample_header_offset: None,
                sample_data_offset: word(3),
                sample_data_size: word(4),
            },
        })
    }
}
