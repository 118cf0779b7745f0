//! Region records
//!
//! A region binds a key range and an envelope to one sample. The record
//! layout depends on the bank's [`RegionLayout`].
//!
//! # Split layout (20 bytes)
//! ```text
//! 0x00: sample_index u16      index into the sample header table
//! 0x02: delay u16             ms
//! 0x04: attack u16            ms
//! 0x06: hold u16              ms
//! 0x08: decay u16             ms
//! 0x0A: sustain u16           0 = silent, 65535 = full
//! 0x0C: release u16           ms
//! 0x0E: volume u16
//! 0x10: panning u16           0 = left, 127 = middle, 254 = right
//! 0x12: key_min u8
//! 0x13: key_max u8
//! ```
//!
//! # Packed layout (24 bytes)
//! ```text
//! 0x00: sample_start u32      byte offset into the sample data section
//! 0x04: sample_rate u32
//! 0x08: loop_start u32        relative byte offset, NO_LOOP if one-shot
//! 0x0C: adsr1 u16
//! 0x0E: adsr2 u16
//! 0x10: volume u16            volume multiplier
//! 0x12: panning u16
//! 0x14: key_min u8
//! 0x15: key_max u8
//! 0x16: format u8             SampleFormat tag
//! 0x17: reserved u8
//! ```

use super::{RegionLayout, SampleFormat};
use crate::envelope::{AdsrRegisters, SimpleEnvelope};

/// Region record referencing the sample header table (20 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRegion {
    pub sample_index: u16,
    pub envelope: SimpleEnvelope,
    pub volume: u16,
    pub panning: u16,
    pub key_min: u8,
    pub key_max: u8,
}

impl SplitRegion {
    pub const SIZE: usize = 20;

    /// Write record to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let env = &self.envelope;
        let words = [
            self.sample_index,
            env.delay,
            env.attack,
            env.hold,
            env.decay,
            env.sustain,
            env.release,
            self.volume,
            self.panning,
        ];

        let mut bytes = [0u8; Self::SIZE];
        for (i, word) in words.iter().enumerate() {
            bytes[i * 2..i * 2 + 2].copy_from_slice(&word.to_le_bytes());
        }
        bytes[18] = self.key_min;
        bytes[19] = self.key_max;
        bytes
    }

    /// Read record from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let word = |i: usize| u16::from_le_bytes([bytes[i * 2], bytes[i * 2 + 1]]);
        Some(Self {
            sample_index: word(0),
            envelope: SimpleEnvelope {
                delay: word(1),
                attack: word(2),
                hold: word(3),
                decay: word(4),
                sustain: word(5),
                release: word(6),
            },
            volume: word(7),
            panning: word(8),
            key_min: bytes[18],
            key_max: bytes[19],
        })
    }
}

/// Region record with embedded sample location and ADSR registers (24 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedRegion {
    pub sample_start: u32,
    pub sample_rate: u32,
    pub loop_start: u32,
    pub adsr: AdsrRegisters,
    pub volume: u16,
    pub panning: u16,
    pub key_min: u8,
    pub key_max: u8,
    pub format: SampleFormat,
}

impl PackedRegion {
    pub const SIZE: usize = 24;

    /// Write record to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.sample_start.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.loop_start.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.adsr.adsr1.to_le_bytes());
        bytes[14..16].copy_from_slice(&self.adsr.adsr2.to_le_bytes());
        bytes[16..18].copy_from_slice(&self.volume.to_le_bytes());
        bytes[18..20].copy_from_slice(&self.panning.to_le_bytes());
        bytes[20] = self.key_min;
        bytes[21] = self.key_max;
        bytes[22] = self.format.tag() as u8;
        bytes
    }

    /// Read record from bytes
    ///
    /// Returns `None` if the slice is too short or the format tag is unknown.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u32_at =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        let u16_at = |i: usize| u16::from_le_bytes([bytes[i], bytes[i + 1]]);
        Some(Self {
            sample_start: u32_at(0),
            sample_rate: u32_at(4),
            loop_start: u32_at(8),
            adsr: AdsrRegisters {
                adsr1: u16_at(12),
                adsr2: u16_at(14),
            },
            volume: u16_at(16),
            panning: u16_at(18),
            key_min: bytes[20],
            key_max: bytes[21],
            format: SampleFormat::from_tag(bytes[22] as u16)?,
        })
    }
}

/// A region record in either layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRecord {
    Split(SplitRegion),
    Packed(PackedRegion),
}

impl RegionRecord {
    pub fn layout(&self) -> RegionLayout {
        match self {
            RegionRecord::Split(_) => RegionLayout::Split,
            RegionRecord::Packed(_) => RegionLayout::Packed,
        }
    }

    /// Inclusive MIDI key range
    pub fn key_range(&self) -> (u8, u8) {
        match self {
            RegionRecord::Split(r) => (r.key_min, r.key_max),
            RegionRecord::Packed(r) => (r.key_min, r.key_max),
        }
    }

    /// Whether this region plays for `key`
    pub fn covers(&self, key: u8) -> bool {
        let (min, max) = self.key_range();
        (min..=max).contains(&key)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            RegionRecord::Split(r) => r.to_bytes().to_vec(),
            RegionRecord::Packed(r) => r.to_bytes().to_vec(),
        }
    }

    pub fn from_bytes(bytes: &[u8], layout: RegionLayout) -> Option<Self> {
        match layout {
            RegionLayout::Split => SplitRegion::from_bytes(bytes).map(RegionRecord::Split),
            RegionLayout::Packed => PackedRegion::from_bytes(bytes).map(RegionRecord::Packed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::NO_LOOP;

    fn split_region() -> SplitRegion {
        SplitRegion {
            sample_index: 2,
            envelope: SimpleEnvelope {
                delay: 0,
                attack: 10,
                hold: 0,
                decay: 200,
                sustain: 40000,
                release: 300,
            },
            volume: 100,
            panning: 127,
            key_min: 48,
            key_max: 59,
        }
    }

    #[test]
    fn test_split_region_layout() {
        let bytes = split_region().to_bytes();
        assert_eq!(&bytes[0..2], &[2, 0]);
        assert_eq!(&bytes[10..12], &40000u16.to_le_bytes());
        assert_eq!(&bytes[18..20], &[48, 59]);
        assert_eq!(SplitRegion::from_bytes(&bytes), Some(split_region()));
    }

    #[test]
    fn test_packed_region_layout() {
        let region = PackedRegion {
            sample_start: 0x40,
            sample_rate: 11025,
            loop_start: NO_LOOP,
            adsr: AdsrRegisters {
                adsr1: 0x80FF,
                adsr2: 0x1FC0,
            },
            volume: 0x3FFF,
            panning: 127,
            key_min: 0,
            key_max: 127,
            format: SampleFormat::Pcm16,
        };
        let bytes = region.to_bytes();
        assert_eq!(&bytes[12..14], &[0xFF, 0x80]);
        assert_eq!(bytes[22], 1);
        assert_eq!(bytes[23], 0);

        let decoded = RegionRecord::from_bytes(&bytes, RegionLayout::Packed).unwrap();
        assert_eq!(decoded, RegionRecord::Packed(region));
    }

    #[test]
    fn test_covers() {
        let record = RegionRecord::Split(split_region());
        assert!(record.covers(48));
        assert!(record.covers(59));
        assert!(!record.covers(60));
        assert_eq!(record.to_bytes().len(), RegionLayout::Split.region_record_size());
    }
}
