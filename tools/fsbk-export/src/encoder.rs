//! Sample encoding for the selected output format

use fsbk_common::SampleFormat;

use crate::config::OutputFormat;

/// Encoded sample ready for the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedSample {
    pub bytes: Vec<u8>,
    pub format: SampleFormat,
    /// Loop start in bytes from the start of `bytes`
    pub loop_offset: Option<u32>,
}

impl EncodedSample {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Encode the first `effective_len` samples of `pcm`
///
/// SPU-ADPCM carries the loop in its block flags, so the loop offset is the
/// start of the block holding `loop_start`. PCM16 data is copied verbatim
/// and the loop offset is only reported for the sample header.
pub fn encode_sample(
    pcm: &[i16],
    effective_len: usize,
    loop_start: Option<usize>,
    format: OutputFormat,
) -> EncodedSample {
    let pcm = &pcm[..effective_len.min(pcm.len())];
    let loop_start = loop_start.filter(|&start| start < pcm.len());

    let (bytes, loop_offset) = match format {
        OutputFormat::Psx => (
            fsbk_adpcm::encode_spu(pcm, loop_start),
            loop_start.map(|start| fsbk_adpcm::loop_block_offset(start) as u32),
        ),
        OutputFormat::Pcm16 => (
            pcm.iter().flat_map(|s| s.to_le_bytes()).collect(),
            loop_start.map(|start| (start * 2) as u32),
        ),
    };

    EncodedSample {
        bytes,
        format: format.sample_format(),
        loop_offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsbk_adpcm::{SPU_BLOCK_SIZE, spu_flags};

    fn ramp(n: usize) -> Vec<i16> {
        (0..n).map(|i| (i as i16).wrapping_mul(97)).collect()
    }

    #[test]
    fn test_pcm16_passthrough() {
        let pcm = [1i16, -1, 0x1234, 7];
        let encoded = encode_sample(&pcm, 3, None, OutputFormat::Pcm16);
        assert_eq!(encoded.bytes, vec![1, 0, 0xFF, 0xFF, 0x34, 0x12]);
        assert_eq!(encoded.format, SampleFormat::Pcm16);
        assert_eq!(encoded.loop_offset, None);
    }

    #[test]
    fn test_pcm16_loop_offset() {
        let encoded = encode_sample(&ramp(100), 60, Some(20), OutputFormat::Pcm16);
        assert_eq!(encoded.len(), 120);
        assert_eq!(encoded.loop_offset, Some(40));
    }

    #[test]
    fn test_psx_block_count() {
        let encoded = encode_sample(&ramp(100), 56, None, OutputFormat::Psx);
        assert_eq!(encoded.len(), 2 * SPU_BLOCK_SIZE);
        assert_eq!(encoded.format, SampleFormat::SpuAdpcm);
    }

    #[test]
    fn test_psx_loop_flags() {
        let encoded = encode_sample(&ramp(100), 84, Some(30), OutputFormat::Psx);
        assert_eq!(encoded.loop_offset, Some(16));

        let loop_block = &encoded.bytes[16..32];
        assert_ne!(loop_block[1] & spu_flags::LOOP_START, 0);
        let last = &encoded.bytes[encoded.len() - SPU_BLOCK_SIZE..];
        assert_ne!(last[1] & spu_flags::LOOP_END, 0);
        assert_ne!(last[1] & spu_flags::LOOP_REPEAT, 0);
    }

    #[test]
    fn test_loop_start_outside_effective_len() {
        let encoded = encode_sample(&ramp(50), 10, Some(10), OutputFormat::Pcm16);
        assert_eq!(encoded.loop_offset, None);
    }
}
