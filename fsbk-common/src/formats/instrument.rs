//! Instrument descriptor table
//!
//! One descriptor per instrument id slot. The playback engine finds all
//! regions of instrument N with one lookup plus a bounded linear scan of
//! `regions[start_index..start_index + region_count]`.
//!
//! # Layout
//! ```text
//! 0x00: start_index u16 LE
//! 0x02: region_count u16 LE
//! ```

/// Number of instrument slots (ids 0-255)
pub const INSTRUMENT_SLOTS: usize = 256;

/// Maximum regions the engine scans per instrument
pub const MAX_REGIONS_PER_INSTRUMENT: usize = 16;

/// Instrument descriptor (4 bytes)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(C)]
pub struct InstrumentDescriptor {
    /// Index of the instrument's first region in the region table
    pub start_index: u16,
    /// Number of regions (0 for unused slots)
    pub region_count: u16,
}

impl InstrumentDescriptor {
    pub const SIZE: usize = 4;

    pub fn new(start_index: u16, region_count: u16) -> Self {
        Self {
            start_index,
            region_count,
        }
    }

    /// Region table index range covered by this instrument
    pub fn region_range(&self) -> std::ops::Range<usize> {
        let start = self.start_index as usize;
        start..start + self.region_count as usize
    }

    /// Write descriptor to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..2].copy_from_slice(&self.start_index.to_le_bytes());
        bytes[2..4].copy_from_slice(&self.region_count.to_le_bytes());
        bytes
    }

    /// Read descriptor from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            start_index: u16::from_le_bytes([bytes[0], bytes[1]]),
            region_count: u16::from_le_bytes([bytes[2], bytes[3]]),
        })
    }
}
