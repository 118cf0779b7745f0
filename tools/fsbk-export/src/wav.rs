//! WAV sample loading
//!
//! Walks the RIFF chunk list and keeps the three chunks a soundbank needs:
//! `fmt ` (rate, channels, bit depth), `data` (PCM) and `smpl` (first loop
//! region). Only the first chunk of each kind counts; anything else is
//! skipped by its declared length.

use std::path::{Path, PathBuf};

/// Size of the fixed `smpl` chunk header before the loop records
const SMPL_HEADER_SIZE: usize = 36;
/// Offset of the loop count inside the `smpl` header
const SMPL_LOOP_COUNT: usize = 28;
/// Size of one `smpl` loop record
const SMPL_LOOP_SIZE: usize = 24;

#[derive(Debug, thiserror::Error)]
pub enum WavError {
    #[error("sample not found: {}", .0.display())]
    AssetNotFound(PathBuf),

    #[error("failed to read {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not a RIFF file")]
    NotRiff,

    #[error("RIFF file is not WAVE")]
    NotWave,

    #[error("unsupported format: {channels} channel(s), {bits}-bit (need mono 16-bit)")]
    UnsupportedFormat { channels: u16, bits: u16 },

    #[error("no fmt chunk")]
    MissingFormat,

    #[error("no data chunk")]
    MissingData,

    #[error("{0} chunk is truncated")]
    Truncated(&'static str),
}

/// Loop region in sample frames, both ends inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopPoints {
    pub start: u32,
    pub end: u32,
}

/// Decoded mono 16-bit sample
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveAsset {
    pub sample_rate: u32,
    pub samples: Vec<i16>,
    pub loop_points: Option<LoopPoints>,
}

impl WaveAsset {
    /// Load and parse a WAV file
    pub fn load(path: &Path) -> Result<Self, WavError> {
        let data = std::fs::read(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                WavError::AssetNotFound(path.to_path_buf())
            } else {
                WavError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        Self::parse(&data)
    }

    /// Parse WAV bytes
    pub fn parse(data: &[u8]) -> Result<Self, WavError> {
        if data.len() < 12 || &data[0..4] != b"RIFF" {
            return Err(WavError::NotRiff);
        }
        if &data[8..12] != b"WAVE" {
            return Err(WavError::NotWave);
        }

        let mut format: Option<(u16, u32, u16)> = None;
        let mut samples: Option<Vec<i16>> = None;
        let mut loop_points: Option<Option<LoopPoints>> = None;

        let mut offset = 12;
        while offset + 8 <= data.len() {
            let chunk_id = &data[offset..offset + 4];
            let chunk_size = read_u32(data, offset + 4) as usize;
            let body_start = offset + 8;
            let body = &data[body_start..body_start.saturating_add(chunk_size).min(data.len())];

            match chunk_id {
                b"fmt " if format.is_none() => {
                    if body.len() < 16 {
                        return Err(WavError::Truncated("fmt"));
                    }
                    let channels = read_u16(body, 2);
                    let sample_rate = read_u32(body, 4);
                    let bits = read_u16(body, 14);
                    format = Some((channels, sample_rate, bits));
                }
                b"data" if samples.is_none() => {
                    samples = Some(
                        body.chunks_exact(2)
                            .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
                            .collect(),
                    );
                }
                b"smpl" if loop_points.is_none() => {
                    loop_points = Some(parse_smpl(body)?);
                }
                _ => {}
            }

            offset = body_start.saturating_add(chunk_size);
            if !chunk_size.is_multiple_of(2) {
                offset = offset.saturating_add(1); // Padding byte
            }
        }

        let (channels, sample_rate, bits) = format.ok_or(WavError::MissingFormat)?;
        if channels != 1 || bits != 16 {
            return Err(WavError::UnsupportedFormat { channels, bits });
        }
        let samples = samples.ok_or(WavError::MissingData)?;

        Ok(Self {
            sample_rate,
            samples,
            loop_points: loop_points.flatten(),
        })
    }

    /// Samples used downstream: a loop end trims the tail after it
    pub fn effective_len(&self) -> usize {
        match self.loop_points {
            Some(points) => (points.end as usize)
                .saturating_add(1)
                .min(self.samples.len()),
            None => self.samples.len(),
        }
    }

    /// Loop start if it lies inside the effective length
    pub fn loop_start(&self) -> Option<usize> {
        self.loop_points
            .map(|points| points.start as usize)
            .filter(|&start| start < self.effective_len())
    }
}

/// First loop region of a `smpl` chunk, if any
fn parse_smpl(body: &[u8]) -> Result<Option<LoopPoints>, WavError> {
    if body.len() < SMPL_HEADER_SIZE {
        return Err(WavError::Truncated("smpl"));
    }
    if read_u32(body, SMPL_LOOP_COUNT) == 0 {
        return Ok(None);
    }
    if body.len() < SMPL_HEADER_SIZE + SMPL_LOOP_SIZE {
        return Err(WavError::Truncated("smpl"));
    }
    // Loop record: cue id, type, start, end, fraction, play count
    Ok(Some(LoopPoints {
        start: read_u32(body, SMPL_HEADER_SIZE + 8),
        end: read_u32(body, SMPL_HEADER_SIZE + 12),
    }))
}

fn read_u16(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}
