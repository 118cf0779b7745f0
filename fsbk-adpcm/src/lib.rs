//! fsbk-adpcm: PS1 SPU-ADPCM codec for FSBK soundbanks
//!
//! **This is a pure codec** - it turns mono 16-bit PCM into the block stream
//! the PS1 sound processor plays directly from sound RAM, and back. Soundbank
//! headers (sample offsets, rates, loop offsets) are handled by the caller
//! (fsbk-common's sample and region records).
//!
//! # Block Format
//!
//! ```text
//! Block (16 bytes, repeats):
//!   0x00: shift (bits 0-3) | filter (bits 4-6)
//!   0x01: flags (bit 0: loop end, bit 1: loop repeat, bit 2: loop start)
//!   0x02: 28 residual nibbles (14 bytes, low nibble first)
//! ```
//!
//! Each block predicts its samples from the previous two decoded samples with
//! one of five fixed filters, so the encoder carries decoder state across
//! blocks and always quantizes against the reconstructed signal.
//!
//! # Looping
//!
//! Loops are expressed in the stream itself: the block holding the loop start
//! sample carries `LOOP_START`, and the final block carries
//! `LOOP_END | LOOP_REPEAT`. Without a loop the final block only carries
//! `LOOP_END`, which stops the voice. Loop playback therefore restarts at a
//! block boundary; the caller stores the block's byte offset.
//!
//! # Usage
//!
//! ```
//! use fsbk_adpcm::{decode_spu, encode_spu, encoded_len};
//!
//! let samples: Vec<i16> = vec![0; 1000];
//! let adpcm = encode_spu(&samples, None);
//! assert_eq!(adpcm.len(), encoded_len(samples.len()));
//!
//! // Decoding yields whole blocks (padded with silence)
//! let decoded = decode_spu(&adpcm).unwrap();
//! assert!(decoded.len() >= samples.len());
//! ```

mod decode;
mod encode;

pub use decode::{decode_block, decode_spu};
pub use encode::{encode_block, encode_spu, loop_block_offset};

// =============================================================================
// Constants
// =============================================================================

/// Samples encoded per block
pub const SPU_BLOCK_SAMPLES: usize = 28;

/// Bytes per block (2 header bytes + 14 nibble bytes)
pub const SPU_BLOCK_SIZE: usize = 16;

/// Largest usable shift value (smallest quantization step)
pub const SPU_MAX_SHIFT: u8 = 12;

/// Prediction filter coefficients (positive, negative), scaled by 64
pub const SPU_FILTERS: [(i32, i32); 5] = [(0, 0), (60, 0), (115, -52), (98, -55), (122, -60)];

/// Block flags
pub mod spu_flags {
    /// End of sample data - voice stops, or jumps to the loop address with REPEAT
    pub const LOOP_END: u8 = 0b0000_0001;
    /// Jump to the loop address instead of stopping
    pub const LOOP_REPEAT: u8 = 0b0000_0010;
    /// Latch this block's address as the loop address
    pub const LOOP_START: u8 = 0b0000_0100;
}

/// Number of bytes `encode_spu` produces for `sample_count` samples.
///
/// Always at least one block, so an empty sample still terminates the voice.
#[inline]
pub const fn encoded_len(sample_count: usize) -> usize {
    let blocks = sample_count.div_ceil(SPU_BLOCK_SAMPLES);
    if blocks == 0 {
        SPU_BLOCK_SIZE
    } else {
        blocks * SPU_BLOCK_SIZE
    }
}

// =============================================================================
// Error Type
// =============================================================================

/// Errors that can occur during SPU-ADPCM decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdpcmError {
    /// Data length is not a whole number of blocks
    PartialBlock(usize),
}

impl core::fmt::Display for AdpcmError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AdpcmError::PartialBlock(len) => {
                write!(f, "{} bytes is not a multiple of the 16-byte block size", len)
            }
        }
    }
}

impl std::error::Error for AdpcmError {}

// =============================================================================
// Helper Functions
// =============================================================================

/// Clamp value to 16-bit signed range
#[inline]
pub(crate) fn clamp_i16(v: i32) -> i32 {
    v.clamp(-32768, 32767)
}

/// Filter prediction from the two previous decoded samples
#[inline]
pub(crate) fn predict(filter: usize, prev1: i32, prev2: i32) -> i32 {
    let (f0, f1) = SPU_FILTERS[filter];
    (prev1 * f0 + prev2 * f1 + 32) >> 6
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_sine(freq: f32, sample_rate: u32, duration_sec: f32) -> Vec<i16> {
        let num_samples = (sample_rate as f32 * duration_sec) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (f32::sin(t * freq * std::f32::consts::TAU) * 16000.0) as i16
            })
            .collect()
    }

    #[test]
    fn test_roundtrip_silence() {
        let original = vec![0i16; 22050];
        let encoded = encode_spu(&original, None);
        let decoded = decode_spu(&encoded).unwrap();

        assert!(decoded[..original.len()].iter().all(|&s| s == 0));
    }

    #[test]
    fn test_roundtrip_sine_error() {
        let original = generate_sine(440.0, 22050, 1.0);
        let encoded = encode_spu(&original, None);
        let decoded = decode_spu(&encoded).unwrap();

        let max_error = original
            .iter()
            .zip(&decoded)
            .map(|(&a, &b)| (a as i32 - b as i32).abs())
            .max()
            .unwrap_or(0);
        assert!(max_error < 1500, "Sine max error too high: {}", max_error);
    }

    #[test]
    fn test_encoded_len_matches_output() {
        for len in [0, 1, 27, 28, 29, 56, 1000] {
            let samples: Vec<i16> = (0..len).map(|i| (i as i16).wrapping_mul(91)).collect();
            assert_eq!(encode_spu(&samples, None).len(), encoded_len(len), "len {}", len);
        }
    }

    #[test]
    fn test_compression_ratio() {
        let original = generate_sine(440.0, 44100, 2.0);
        let encoded = encode_spu(&original, None);
        let ratio = (original.len() * 2) as f64 / encoded.len() as f64;

        // 56 bytes of PCM per 16-byte block
        assert!((ratio - 3.5).abs() < 0.01, "Unexpected ratio {:.3}", ratio);
    }
}
