//! Test asset generation for fsbk-export integration tests
//!
//! Writes WAV fixtures with hound and appends `smpl` loop chunks by hand
//! (hound does not write sampler metadata).

#![allow(dead_code)]

use std::f32::consts::TAU;
use std::path::Path;

/// Sine tone at `freq` Hz, half amplitude
pub fn sine(sample_count: usize, sample_rate: u32, freq: f32) -> Vec<i16> {
    (0..sample_count)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            ((TAU * freq * t).sin() * 16000.0) as i16
        })
        .collect()
}

/// Write a mono 16-bit WAV
pub fn generate_mono_wav(path: &Path, sample_rate: u32, samples: &[i16]) -> hound::Result<()> {
    write_wav(path, 1, 16, sample_rate, samples)
}

/// Write an interleaved stereo 16-bit WAV
pub fn generate_stereo_wav(path: &Path, sample_rate: u32, frames: usize) -> hound::Result<()> {
    let samples = sine(frames * 2, sample_rate * 2, 440.0);
    write_wav(path, 2, 16, sample_rate, &samples)
}

/// Write a mono 8-bit WAV
pub fn generate_8bit_wav(path: &Path, sample_rate: u32, frames: usize) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 8,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..frames {
        writer.write_sample((i % 100) as i8)?;
    }
    writer.finalize()
}

fn write_wav(
    path: &Path,
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    samples: &[i16],
) -> hound::Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()
}

/// Append a `smpl` chunk with one forward loop and patch the RIFF size
pub fn append_loop(path: &Path, start: u32, end: u32) -> std::io::Result<()> {
    let mut data = std::fs::read(path)?;

    // 36-byte sampler header, loop count at offset 28
    let mut body = vec![0u8; 36];
    body[28..32].copy_from_slice(&1u32.to_le_bytes());
    // Loop record: cue id, type, start, end, fraction, play count
    let mut record = [0u8; 24];
    record[8..12].copy_from_slice(&start.to_le_bytes());
    record[12..16].copy_from_slice(&end.to_le_bytes());
    body.extend_from_slice(&record);

    data.extend_from_slice(b"smpl");
    data.extend_from_slice(&(body.len() as u32).to_le_bytes());
    data.extend_from_slice(&body);

    let riff_size = (data.len() - 8) as u32;
    data[4..8].copy_from_slice(&riff_size.to_le_bytes());
    std::fs::write(path, data)
}

/// Simple-profile definition row
pub fn simple_row(instrument: u8, key_min: u8, key_max: u8, path: &str) -> String {
    format!(
        "{};{};{};0;5;0;200;49152;300;127;127;{}\n",
        instrument, key_min, key_max, path
    )
}

/// Raw-profile definition row with a typical piano-like envelope
pub fn raw_row(instrument: u8, key_min: u8, key_max: u8, path: &str) -> String {
    format!(
        "{};{};{};0;0;0;4;10;1;1;20;0;0;1;14;0x3FFF;127;{}\n",
        instrument, key_min, key_max, path
    )
}
