//! PS1 ADSR envelope registers
//!
//! The sound processor takes a voice envelope as two 16-bit registers:
//!
//! ```text
//! ADSR1: attack_mode(15) | attack_shift(14-10) | attack_step(9-8) | decay_shift(7-4) | sustain_level(3-0)
//! ADSR2: sustain_mode(15) | sustain_dir(14) | sustain_shift(13-8) | sustain_step(7-6) | release_mode(5) | release_shift(4-0)
//! ```
//!
//! [`RawEnvelope`] carries the register fields one by one and packs them
//! with width checks. [`SimpleEnvelope`] carries millisecond timings and a
//! linear sustain level; [`SimpleEnvelope::to_raw`] maps it onto register
//! fields for banks that store registers.

/// Register field that does not fit its bit width
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EnvelopeError {
    #[error("envelope field {field} = {value} does not fit in {bits} bit(s) (max {max})")]
    FieldOutOfRange {
        field: &'static str,
        value: u32,
        bits: u32,
        max: u32,
    },
}

/// Packed ADSR1/ADSR2 register pair
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdsrRegisters {
    pub adsr1: u16,
    pub adsr2: u16,
}

impl AdsrRegisters {
    /// Split the registers back into fields (`release_step` reads as 0)
    pub fn unpack(&self) -> RawEnvelope {
        let field =
            |word: u16, shift: u32, bits: u32| ((word >> shift) & ((1 << bits) - 1)) as u32;
        RawEnvelope {
            attack_mode: field(self.adsr1, 15, 1),
            attack_shift: field(self.adsr1, 10, 5),
            attack_step: field(self.adsr1, 8, 2),
            decay_shift: field(self.adsr1, 4, 4),
            sustain_level: field(self.adsr1, 0, 4),
            sustain_mode: field(self.adsr2, 15, 1),
            sustain_direction: field(self.adsr2, 14, 1),
            sustain_shift: field(self.adsr2, 8, 6),
            sustain_step: field(self.adsr2, 6, 2),
            release_step: 0,
            release_mode: field(self.adsr2, 5, 1),
            release_shift: field(self.adsr2, 0, 5),
        }
    }
}

/// Envelope given as individual register fields
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawEnvelope {
    /// 0 = linear, 1 = exponential
    pub attack_mode: u32,
    pub attack_shift: u32,
    pub attack_step: u32,
    pub decay_shift: u32,
    pub sustain_level: u32,
    /// 0 = linear, 1 = exponential
    pub sustain_mode: u32,
    /// 0 = increase, 1 = decrease
    pub sustain_direction: u32,
    pub sustain_shift: u32,
    pub sustain_step: u32,
    /// Accepted for table compatibility; the hardware release step is fixed
    pub release_step: u32,
    /// 0 = linear, 1 = exponential
    pub release_mode: u32,
    pub release_shift: u32,
}

/// Place `value` at `shift` after checking it fits in `bits`
fn put(
    word: &mut u16,
    field: &'static str,
    value: u32,
    shift: u32,
    bits: u32,
) -> Result<(), EnvelopeError> {
    let max = (1u32 << bits) - 1;
    if value > max {
        return Err(EnvelopeError::FieldOutOfRange {
            field,
            value,
            bits,
            max,
        });
    }
    *word |= (value << shift) as u16;
    Ok(())
}

impl RawEnvelope {
    /// Pack into ADSR1/ADSR2
    ///
    /// # Errors
    /// Returns `EnvelopeError::FieldOutOfRange` naming the first field that
    /// does not fit its register bits.
    pub fn pack(&self) -> Result<AdsrRegisters, EnvelopeError> {
        let mut adsr1 = 0u16;
        put(&mut adsr1, "attack_mode", self.attack_mode, 15, 1)?;
        put(&mut adsr1, "attack_shift", self.attack_shift, 10, 5)?;
        put(&mut adsr1, "attack_step", self.attack_step, 8, 2)?;
        put(&mut adsr1, "decay_shift", self.decay_shift, 4, 4)?;
        put(&mut adsr1, "sustain_level", self.sustain_level, 0, 4)?;

        let mut adsr2 = 0u16;
        put(&mut adsr2, "sustain_mode", self.sustain_mode, 15, 1)?;
        put(&mut adsr2, "sustain_direction", self.sustain_direction, 14, 1)?;
        put(&mut adsr2, "sustain_shift", self.sustain_shift, 8, 6)?;
        put(&mut adsr2, "sustain_step", self.sustain_step, 6, 2)?;
        put(&mut adsr2, "release_mode", self.release_mode, 5, 1)?;
        put(&mut adsr2, "release_shift", self.release_shift, 0, 5)?;

        Ok(AdsrRegisters { adsr1, adsr2 })
    }
}

/// Envelope given as millisecond timings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimpleEnvelope {
    pub delay: u16,
    pub attack: u16,
    pub hold: u16,
    pub decay: u16,
    /// 0 = silent, 65535 = full level
    pub sustain: u16,
    pub release: u16,
}

/// Envelope time at rate 0: a linear sweep of the full range (32767) at the
/// largest step (7 << 11) takes 32767 / 14336 ticks of 1/44100 s.
/// Every 4 rate units double the time.
const BASE_ENV_TIME: f64 = 32767.0 / 14336.0 / 44100.0;

/// Attacks longer than this use the exponential curve
const EXP_ATTACK_MS: u16 = 100;

/// Convert milliseconds to a PS1 envelope rate (0-127, lower = faster)
fn ms_to_rate(ms: u16) -> u32 {
    if ms == 0 {
        return 0;
    }
    let seconds = ms as f64 / 1000.0;
    let rate = 4.0 * (seconds / BASE_ENV_TIME).log2();
    rate.round().clamp(0.0, 127.0) as u32
}

impl SimpleEnvelope {
    /// Map timings onto register fields
    ///
    /// Delay and hold have no register equivalent and are dropped. Sustain
    /// holds its level (linear, increase, slowest shift) until key-off.
    pub fn to_raw(&self) -> RawEnvelope {
        let attack_rate = ms_to_rate(self.attack);
        RawEnvelope {
            attack_mode: u32::from(self.attack > EXP_ATTACK_MS),
            attack_shift: attack_rate / 4,
            attack_step: attack_rate % 4,
            decay_shift: (ms_to_rate(self.decay) / 4).min(15),
            sustain_level: ((self.sustain as f64 / 65535.0) * 15.0).round() as u32,
            sustain_mode: 0,
            sustain_direction: 0,
            sustain_shift: 31,
            sustain_step: 0,
            release_step: 0,
            release_mode: 1,
            release_shift: (ms_to_rate(self.release) / 4).min(31),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_bit_positions() {
        let env = RawEnvelope {
            attack_mode: 1,
            attack_shift: 0b10101,
            attack_step: 0b11,
            decay_shift: 0b0110,
            sustain_level: 0b1001,
            sustain_mode: 1,
            sustain_direction: 1,
            sustain_shift: 0b100001,
            sustain_step: 0b10,
            release_step: 3,
            release_mode: 1,
            release_shift: 0b10011,
        };
        let regs = env.pack().unwrap();

        assert_eq!(regs.adsr1, 0b1_10101_11_0110_1001);
        assert_eq!(regs.adsr2, 0b1_1_100001_10_1_10011);
        assert_eq!(regs.unpack(), RawEnvelope { release_step: 0, ..env });
    }

    #[test]
    fn test_pack_rejects_wide_field() {
        let env = RawEnvelope {
            decay_shift: 16,
            ..Default::default()
        };
        assert_eq!(
            env.pack(),
            Err(EnvelopeError::FieldOutOfRange {
                field: "decay_shift",
                value: 16,
                bits: 4,
                max: 15,
            })
        );
    }

    #[test]
    fn test_pack_rejects_mode_flag() {
        let env = RawEnvelope {
            release_mode: 2,
            ..Default::default()
        };
        let err = env.pack().unwrap_err();
        assert!(err.to_string().contains("release_mode"));
    }

    #[test]
    fn test_ms_to_rate() {
        assert_eq!(ms_to_rate(0), 0);
        // Doubling the time adds 4 rate units
        assert_eq!(ms_to_rate(200), ms_to_rate(100) + 4);
        assert!(ms_to_rate(u16::MAX) <= 127);
    }

    #[test]
    fn test_simple_to_raw_always_packs() {
        let extremes = [
            SimpleEnvelope::default(),
            SimpleEnvelope {
                delay: u16::MAX,
                attack: u16::MAX,
                hold: u16::MAX,
                decay: u16::MAX,
                sustain: u16::MAX,
                release: u16::MAX,
            },
        ];
        for env in extremes {
            assert!(env.to_raw().pack().is_ok(), "{:?}", env);
        }
    }

    #[test]
    fn test_simple_to_raw_sustain_level() {
        let full = SimpleEnvelope {
            sustain: u16::MAX,
            ..Default::default()
        };
        assert_eq!(full.to_raw().sustain_level, 15);
        assert_eq!(SimpleEnvelope::default().to_raw().sustain_level, 0);
    }

    #[test]
    fn test_simple_to_raw_attack_mode() {
        let slow = SimpleEnvelope {
            attack: 500,
            ..Default::default()
        };
        assert_eq!(slow.to_raw().attack_mode, 1);
        assert_eq!(SimpleEnvelope::default().to_raw().attack_mode, 0);
    }
}
