//! Output mixer routing.
//!
//! The CS47L63 output mixer sums up to four sources, each through its own
//! attenuator. The sum is not limited, so a route is clip-safe only when the
//! linear gains of its routed slots add up to at most unity. This is a
//! configuration-time property: presets are checked in tests, nothing is
//! enforced when a route is applied.
//!
//! Gain maths is fixed-point Q16 (`65536 == 1.0`), no floats.

/// Mixer input slots per output channel.
pub const MIXER_SLOTS: usize = 4;

/// Unity gain in Q16.
pub const UNITY_Q16: u32 = 1 << 16;

/// `round(65536 × 10^(-r/20))` for `r` in `0..20` dB.
const DB_FRACTION_Q16: [u32; 20] = [
    65536, 58409, 52057, 46396, 41350, 36854, 32846, 29274, 26090, 23253, 20724, 18471, 16462,
    14672, 13076, 11654, 10387, 9257, 8250, 7353,
];

/// Signal feeding a mixer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MixerSource {
    /// Slot unused.
    #[default]
    None,
    /// Serial port RX channel 1 (I2S left).
    PcmRx1,
    /// Serial port RX channel 2 (I2S right).
    PcmRx2,
    /// On-chip tone generator.
    ToneGenerator,
    /// On-chip comfort-noise generator.
    NoiseGenerator,
}

impl core::fmt::Display for MixerSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::PcmRx1 => write!(f, "PCM RX1"),
            Self::PcmRx2 => write!(f, "PCM RX2"),
            Self::ToneGenerator => write!(f, "tone generator"),
            Self::NoiseGenerator => write!(f, "noise generator"),
        }
    }
}

/// Mixer volume value out of range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError;

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Mixer volume out of range")
    }
}

/// Mixer slot gain in whole dB, `-64..=+16`.
///
/// Register encoding: `code = dB + 64` (0x00 = −64 dB, 0x40 = 0 dB,
/// 0x50 = +16 dB).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixVolume(i8);

impl MixVolume {
    /// Lowest gain.
    pub const MIN_DB: i8 = -64;
    /// Highest gain.
    pub const MAX_DB: i8 = 16;
    /// 0 dB.
    pub const UNITY: Self = Self(0);

    /// Create a volume, clamping into `-64..=16` dB.
    pub const fn new(db: i8) -> Self {
        if db < Self::MIN_DB {
            Self(Self::MIN_DB)
        } else if db > Self::MAX_DB {
            Self(Self::MAX_DB)
        } else {
            Self(db)
        }
    }

    /// Create a volume, rejecting out-of-range values.
    pub const fn try_new(db: i8) -> Result<Self, OutOfRangeError> {
        if db < Self::MIN_DB || db > Self::MAX_DB {
            Err(OutOfRangeError)
        } else {
            Ok(Self(db))
        }
    }

    /// Gain in dB.
    pub const fn db(self) -> i8 {
        self.0
    }

    /// 7-bit register code.
    pub const fn code(self) -> u8 {
        // 0 <= db + 64 <= 80 after construction
        #[allow(clippy::arithmetic_side_effects, clippy::cast_sign_loss)]
        let code = (self.0 as i16 + 64) as u8;
        code
    }

    /// Linear gain in Q16.
    pub fn gain_q16(self) -> u32 {
        let db = self.0.unsigned_abs();
        let whole_decades = db / 20;
        let fraction = DB_FRACTION_Q16
            .get(usize::from(db % 20))
            .copied()
            .unwrap_or(UNITY_Q16);
        if self.0 >= 0 {
            // +x dB == 1 / (-x dB); x <= 16 so no decades apply
            let unity_sq = u64::from(UNITY_Q16).saturating_mul(u64::from(UNITY_Q16));
            let gain = unity_sq.checked_div(u64::from(fraction)).unwrap_or(0);
            u32::try_from(gain).unwrap_or(u32::MAX)
        } else {
            let divisor = 10u32.saturating_pow(u32::from(whole_decades));
            fraction.checked_div(divisor).unwrap_or(0)
        }
    }
}

impl Default for MixVolume {
    fn default() -> Self {
        Self::UNITY
    }
}

impl core::fmt::Display for MixVolume {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} dB", self.0)
    }
}

/// One mixer input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerSlot {
    /// Routed signal.
    pub source: MixerSource,
    /// Attenuation applied to it.
    pub volume: MixVolume,
}

impl MixerSlot {
    /// Unused slot.
    pub const EMPTY: Self = Self {
        source: MixerSource::None,
        volume: MixVolume::UNITY,
    };

    /// Create a slot.
    pub const fn new(source: MixerSource, volume: MixVolume) -> Self {
        Self { source, volume }
    }
}

/// Complete routing of one output mixer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MixerRoute {
    slots: [MixerSlot; MIXER_SLOTS],
}

impl MixerRoute {
    /// PCM RX1, PCM RX2, tone and noise, each at −21 dB.
    pub const ALL_SOURCES: Self = {
        let vol = MixVolume::new(-21);
        Self::new([
            MixerSlot::new(MixerSource::PcmRx1, vol),
            MixerSlot::new(MixerSource::PcmRx2, vol),
            MixerSlot::new(MixerSource::ToneGenerator, vol),
            MixerSlot::new(MixerSource::NoiseGenerator, vol),
        ])
    };

    /// PCM RX1 and tone at −15 dB, nothing else routed.
    pub const PCM_AND_TONE: Self = Self::new([
        MixerSlot::new(MixerSource::PcmRx1, MixVolume::new(-15)),
        MixerSlot::new(MixerSource::ToneGenerator, MixVolume::new(-15)),
        MixerSlot::EMPTY,
        MixerSlot::EMPTY,
    ]);

    /// Create a route.
    pub const fn new(slots: [MixerSlot; MIXER_SLOTS]) -> Self {
        Self { slots }
    }

    /// Slots in register order.
    pub const fn slots(&self) -> &[MixerSlot; MIXER_SLOTS] {
        &self.slots
    }

    /// `true` when `source` feeds at least one slot.
    pub fn routes(&self, source: MixerSource) -> bool {
        self.slots.iter().any(|slot| slot.source == source)
    }

    /// Sum of the linear gains of all routed slots, Q16.
    pub fn summed_gain_q16(&self) -> u32 {
        self.slots
            .iter()
            .filter(|slot| slot.source != MixerSource::None)
            .fold(0u32, |acc, slot| acc.saturating_add(slot.volume.gain_q16()))
    }

    /// Full-scale inputs on every routed slot cannot exceed full-scale output.
    pub fn is_clip_safe(&self) -> bool {
        self.summed_gain_q16() <= UNITY_Q16
    }
}

impl Default for MixerRoute {
    fn default() -> Self {
        Self::ALL_SOURCES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_codes() {
        assert_eq!(MixVolume::new(-64).code(), 0x00);
        assert_eq!(MixVolume::new(-21).code(), 0x2B);
        assert_eq!(MixVolume::UNITY.code(), 0x40);
        assert_eq!(MixVolume::new(16).code(), 0x50);
    }

    #[test]
    fn volume_clamps() {
        assert_eq!(MixVolume::new(-100).db(), -64);
        assert_eq!(MixVolume::new(100).db(), 16);
        assert_eq!(MixVolume::try_new(17), Err(OutOfRangeError));
        assert_eq!(MixVolume::try_new(-21), Ok(MixVolume::new(-21)));
    }

    #[test]
    fn gain_reference_points() {
        assert_eq!(MixVolume::UNITY.gain_q16(), 65536);
        assert_eq!(MixVolume::new(-20).gain_q16(), 6553);
        assert_eq!(MixVolume::new(-21).gain_q16(), 5840);
        // +6 dB ≈ 2.0
        let plus6 = MixVolume::new(6).gain_q16();
        assert!((130_000..=131_100).contains(&plus6), "got {plus6}");
    }

    #[test]
    fn presets_are_clip_safe() {
        assert!(MixerRoute::ALL_SOURCES.is_clip_safe());
        assert!(MixerRoute::PCM_AND_TONE.is_clip_safe());
    }

    #[test]
    fn pcm_and_tone_leaves_noise_unrouted() {
        let route = MixerRoute::PCM_AND_TONE;
        assert!(route.routes(MixerSource::PcmRx1));
        assert!(route.routes(MixerSource::ToneGenerator));
        assert!(!route.routes(MixerSource::NoiseGenerator));
        assert!(!route.routes(MixerSource::PcmRx2));
        assert_eq!(route.slots()[2], MixerSlot::EMPTY);
        assert_eq!(route.slots()[3], MixerSlot::EMPTY);
    }

    #[test]
    fn four_hot_slots_clip() {
        let hot = MixerSlot::new(MixerSource::PcmRx1, MixVolume::new(-3));
        let route = MixerRoute::new([hot; MIXER_SLOTS]);
        assert!(!route.is_clip_safe());
    }

    #[test]
    fn unused_slots_do_not_count() {
        let route = MixerRoute::new([
            MixerSlot::new(MixerSource::PcmRx1, MixVolume::UNITY),
            MixerSlot::new(MixerSource::None, MixVolume::new(16)),
            MixerSlot::EMPTY,
            MixerSlot::EMPTY,
        ]);
        assert_eq!(route.summed_gain_q16(), UNITY_Q16);
        assert!(route.is_clip_safe());
        assert!(!route.routes(MixerSource::ToneGenerator));
    }
}
