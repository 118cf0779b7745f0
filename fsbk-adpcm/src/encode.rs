//! SPU-ADPCM encoder implementation
//!
//! This module handles encoding PCM samples to SPU block data.
//! Note: This is a pure codec - no headers are written. The caller stores
//! the sample offset, rate and loop offset in the soundbank tables.

use crate::{
    SPU_BLOCK_SAMPLES, SPU_BLOCK_SIZE, SPU_FILTERS, SPU_MAX_SHIFT, clamp_i16, encoded_len,
    predict, spu_flags,
};

/// Quantize one block with a fixed filter and shift.
///
/// Returns the nibbles, the squared reconstruction error and the decoder
/// state after the block.
fn quantize_block(
    samples: &[i16],
    filter: usize,
    shift: u8,
    mut prev1: i32,
    mut prev2: i32,
) -> ([i8; SPU_BLOCK_SAMPLES], i64, i32, i32) {
    let mut nibbles = [0i8; SPU_BLOCK_SAMPLES];
    let mut total_error = 0i64;

    for (i, nibble) in nibbles.iter_mut().enumerate() {
        // Short final blocks are padded with silence
        let sample = samples.get(i).copied().unwrap_or(0) as i32;
        let predicted = predict(filter, prev1, prev2);
        let residual = sample - predicted;

        // Round to the nearest step of 4096 >> shift
        let quantized = (((residual << shift) + 2048) >> 12).clamp(-8, 7);
        let reconstructed = clamp_i16(((quantized << 12) >> shift) + predicted);

        let error = (sample - reconstructed) as i64;
        total_error += error * error;

        *nibble = quantized as i8;
        prev2 = prev1;
        prev1 = reconstructed;
    }

    (nibbles, total_error, prev1, prev2)
}

/// Encode one block of up to 28 samples
///
/// Tries every filter/shift pair and keeps the one with lowest squared error.
/// Flags are left clear; `encode_spu` sets them for the whole stream.
///
/// # Arguments
/// * `samples` - Input samples (up to 28, shorter input is zero padded)
/// * `prev1`, `prev2` - Decoder history (updated to the reconstructed signal)
pub fn encode_block(samples: &[i16], prev1: &mut i32, prev2: &mut i32) -> [u8; SPU_BLOCK_SIZE] {
    let mut best: Option<(usize, u8, [i8; SPU_BLOCK_SAMPLES], i64, i32, i32)> = None;

    for filter in 0..SPU_FILTERS.len() {
        for shift in 0..=SPU_MAX_SHIFT {
            let (nibbles, error, p1, p2) = quantize_block(samples, filter, shift, *prev1, *prev2);
            if best.as_ref().is_none_or(|b| error < b.3) {
                best = Some((filter, shift, nibbles, error, p1, p2));
            }
        }
    }

    let mut block = [0u8; SPU_BLOCK_SIZE];
    if let Some((filter, shift, nibbles, _, p1, p2)) = best {
        block[0] = (shift & 0x0F) | ((filter as u8 & 0x07) << 4);
        for (i, &n) in nibbles.iter().enumerate() {
            block[2 + i / 2] |= (n as u8 & 0x0F) << ((i & 1) * 4);
        }
        *prev1 = p1;
        *prev2 = p2;
    }
    block
}

/// Byte offset (relative to the sample start) of the block holding `loop_start`
#[inline]
pub fn loop_block_offset(loop_start: usize) -> usize {
    (loop_start / SPU_BLOCK_SAMPLES) * SPU_BLOCK_SIZE
}

/// Encode PCM samples to SPU-ADPCM block data
///
/// # Arguments
/// * `samples` - Input PCM samples (mono, 16-bit)
/// * `loop_start` - Sample index playback returns to after the final block.
///   `None`, or an index past the end, produces a one-shot sample.
///
/// # Returns
/// Encoded blocks, `encoded_len(samples.len())` bytes long
pub fn encode_spu(samples: &[i16], loop_start: Option<usize>) -> Vec<u8> {
    let len = encoded_len(samples.len());
    let mut output = Vec::with_capacity(len);
    let (mut prev1, mut prev2) = (0i32, 0i32);

    for chunk_start in (0..len / SPU_BLOCK_SIZE).map(|b| b * SPU_BLOCK_SAMPLES) {
        let chunk_end = (chunk_start + SPU_BLOCK_SAMPLES).min(samples.len());
        let chunk = samples.get(chunk_start..chunk_end).unwrap_or(&[]);
        output.extend_from_slice(&encode_block(chunk, &mut prev1, &mut prev2));
    }

    let last_flags = output.len() - SPU_BLOCK_SIZE + 1;
    match loop_start.filter(|&start| start < samples.len()) {
        Some(start) => {
            output[loop_block_offset(start) + 1] |= spu_flags::LOOP_START;
            output[last_flags] |= spu_flags::LOOP_END | spu_flags::LOOP_REPEAT;
        }
        None => output[last_flags] |= spu_flags::LOOP_END,
    }

    output
}
