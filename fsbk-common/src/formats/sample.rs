//! Sample header table (split layout)
//!
//! # Layout
//! ```text
//! 0x00: sample_start u32 LE   byte offset into the sample data section
//! 0x04: sample_rate u32 LE    Hz at MIDI key 60
//! 0x08: loop_start u32 LE     byte offset relative to sample_start, NO_LOOP if one-shot
//! 0x0C: format u16 LE         SampleFormat tag
//! 0x0E: reserved u16
//! ```

/// Loop offset value for samples that do not loop
pub const NO_LOOP: u32 = u32::MAX;

/// Encoding of a sample's bytes in the sample data section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u16)]
pub enum SampleFormat {
    /// PS1 SPU-ADPCM blocks
    #[default]
    SpuAdpcm = 0,
    /// Signed little-endian 16-bit PCM
    Pcm16 = 1,
}

impl SampleFormat {
    /// Format tag as stored in the file
    pub fn tag(self) -> u16 {
        self as u16
    }

    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(SampleFormat::SpuAdpcm),
            1 => Some(SampleFormat::Pcm16),
            _ => None,
        }
    }
}

/// Sample header (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct SampleHeader {
    pub sample_start: u32,
    pub sample_rate: u32,
    pub loop_start: u32,
    pub format: SampleFormat,
    pub _reserved: u16,
}

impl SampleHeader {
    pub const SIZE: usize = 16;

    pub fn new(
        sample_start: u32,
        sample_rate: u32,
        loop_start: Option<u32>,
        format: SampleFormat,
    ) -> Self {
        Self {
            sample_start,
            sample_rate,
            loop_start: loop_start.unwrap_or(NO_LOOP),
            format,
            _reserved: 0,
        }
    }

    /// Loop offset, or `None` for one-shot samples
    pub fn loop_offset(&self) -> Option<u32> {
        (self.loop_start != NO_LOOP).then_some(self.loop_start)
    }

    /// Write header to bytes
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut bytes = [0u8; Self::SIZE];
        bytes[0..4].copy_from_slice(&self.sample_start.to_le_bytes());
        bytes[4..8].copy_from_slice(&self.sample_rate.to_le_bytes());
        bytes[8..12].copy_from_slice(&self.loop_start.to_le_bytes());
        bytes[12..14].copy_from_slice(&self.format.tag().to_le_bytes());
        // _reserved bytes stay 0
        bytes
    }

    /// Read header from bytes
    ///
    /// Returns `None` if the slice is too short or the format tag is unknown.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < Self::SIZE {
            return None;
        }
        let u32_at =
            |i: usize| u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Some(Self {
            sample_start: u32_at(0),
            sample_rate: u32_at(4),
            loop_start: u32_at(8),
            format: SampleFormat::from_tag(u16::from_le_bytes([bytes[12], bytes[13]]))?,
            _reserved: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = SampleHeader::new(4096, 22050, Some(320), SampleFormat::SpuAdpcm);
        let decoded = SampleHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.loop_offset(), Some(320));
    }

    #[test]
    fn test_one_shot_header() {
        let header = SampleHeader::new(0, 44100, None, SampleFormat::Pcm16);
        let bytes = header.to_bytes();
        assert_eq!(&bytes[8..12], &[0xFF; 4]);
        assert_eq!(&bytes[12..14], &[1, 0]);
        assert_eq!(header.loop_offset(), None);
    }

    #[test]
    fn test_unknown_format_tag() {
        let mut bytes = SampleHeader::new(0, 8000, None, SampleFormat::Pcm16).to_bytes();
        bytes[12] = 7;
        assert!(SampleHeader::from_bytes(&bytes).is_none());
    }
}
