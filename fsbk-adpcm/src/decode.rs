//! SPU-ADPCM decoder implementation
//!
//! Mirrors the sound processor's block decoding. Used to verify encoder
//! output; the builder itself never decodes.

use crate::{AdpcmError, SPU_BLOCK_SIZE, SPU_FILTERS, clamp_i16, predict};

/// Decode a single 16-byte block (28 samples) onto `output`
///
/// Out-of-range filter and shift values behave like the hardware:
/// filters 5-7 act as filter 0, shifts 13-15 act as shift 9.
pub fn decode_block(
    block: &[u8; SPU_BLOCK_SIZE],
    prev1: &mut i32,
    prev2: &mut i32,
    output: &mut Vec<i16>,
) {
    let shift = match block[0] & 0x0F {
        s @ 0..=12 => s,
        _ => 9,
    };
    let filter = match (block[0] >> 4) & 0x07 {
        f if (f as usize) < SPU_FILTERS.len() => f as usize,
        _ => 0,
    };

    for &byte in &block[2..] {
        for nibble in [byte & 0x0F, byte >> 4] {
            // Sign-extend 4-bit to 32-bit
            let residual = (((nibble as i32) << 28) >> 28) << 12 >> shift;
            let sample = clamp_i16(residual + predict(filter, *prev1, *prev2));
            *prev2 = *prev1;
            *prev1 = sample;
            output.push(sample as i16);
        }
    }
}

/// Decode SPU-ADPCM block data to PCM
///
/// Returns every sample in every block, including the silent padding of a
/// short final block. Loop flags are ignored.
///
/// # Errors
/// Returns `AdpcmError::PartialBlock` if the data is not whole blocks
pub fn decode_spu(data: &[u8]) -> Result<Vec<i16>, AdpcmError> {
    if !data.len().is_multiple_of(SPU_BLOCK_SIZE) {
        return Err(AdpcmError::PartialBlock(data.len()));
    }

    let mut output = Vec::with_capacity(data.len() / SPU_BLOCK_SIZE * 28);
    let (mut prev1, mut prev2) = (0i32, 0i32);

    for chunk in data.chunks_exact(SPU_BLOCK_SIZE) {
        let mut block = [0u8; SPU_BLOCK_SIZE];
        block.copy_from_slice(chunk);
        decode_block(&block, &mut prev1, &mut prev2, &mut output);
    }

    Ok(output)
}
