//! CS47L63 signal routing table.
//!
//! Builds the ordered register table that turns a clocked codec into a
//! playing one:
//!
//! ```text
//! ASP1 (I2S slave) ─ RX1 ─┐
//!                  ─ RX2 ─┤
//! TONE1 generator  ───────┼─> OUT1L mixer (4 inputs, per-input attenuation) ─> OUT1L
//! NOISE generator  ───────┘
//! ```
//!
//! Order matters: the serial port is configured before its channels are
//! enabled, every mixer input before the output driver is enabled.

use platform::{MixerRoute, MixerSource, RegisterConfigEntry};

use super::registers::{
    ASP1_BCLK_MSTR, ASP1_CONTROL2, ASP1_CONTROL3, ASP1_DOUT_HIZ_CTRL_SHIFT, ASP1_ENABLES1,
    ASP1_FMT_SHIFT, ASP1_FSYNC_MSTR, ASP1_RX1_EN, ASP1_RX2_EN, ASP1_RX_WIDTH_SHIFT,
    ASP1_TX_WIDTH_SHIFT, COMFORT_NOISE_GENERATOR, NOISE_GEN_GAIN_0DB, NOISE_GEN_GAIN_MASK,
    OUT1L_EN, OUT1L_INPUT1, OUT1L_INPUT2, OUT1L_INPUT3, OUT1L_INPUT4, OUT1L_MIX_VOL_SHIFT,
    OUTPUT_ENABLE_1, SRC_ASP1_RX1, SRC_ASP1_RX2, SRC_NOISE_GEN, SRC_NONE, SRC_TONE1_GEN,
};

/// Entries in a routing table.
pub const ROUTING_TABLE_LEN: usize = 9;

/// ASP1 frame format (`ASP1_FMT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AspFormat {
    /// DSP mode A.
    DspA,
    /// DSP mode B.
    DspB,
    /// Philips I2S.
    I2s,
    /// Left justified.
    LeftJustified,
}

impl AspFormat {
    const fn code(self) -> u32 {
        match self {
            Self::DspA => 0b000,
            Self::DspB => 0b001,
            Self::I2s => 0b010,
            Self::LeftJustified => 0b011,
        }
    }
}

/// ASP1 serial port settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AspConfig {
    /// RX slot width in bits.
    pub rx_width: u8,
    /// TX slot width in bits.
    pub tx_width: u8,
    /// Frame format.
    pub format: AspFormat,
    /// Codec drives BCLK / FSYNC.
    pub clock_master: bool,
    /// Enable RX channel 1.
    pub rx1: bool,
    /// Enable RX channel 2.
    pub rx2: bool,
}

impl AspConfig {
    /// 16-bit I2S slave, RX1 only.
    pub const AUDIO_DK: Self = Self {
        rx_width: 16,
        tx_width: 16,
        format: AspFormat::I2s,
        clock_master: false,
        rx1: true,
        rx2: false,
    };
}

/// Full routing description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Routing {
    /// Serial port settings.
    pub asp: AspConfig,
    /// Noise generator gain code, applied with the generator disabled.
    pub noise_gain: u32,
    /// OUT1L mixer.
    pub mixer: MixerRoute,
}

/// `OUT1L_SRCn` code for `source`.
pub const fn source_code(source: MixerSource) -> u32 {
    match source {
        MixerSource::None => SRC_NONE,
        MixerSource::PcmRx1 => SRC_ASP1_RX1,
        MixerSource::PcmRx2 => SRC_ASP1_RX2,
        MixerSource::ToneGenerator => SRC_TONE1_GEN,
        MixerSource::NoiseGenerator => SRC_NOISE_GEN,
    }
}

impl Routing {
    /// Audio DK demo: all four sources on OUT1L at −21 dB, noise pre-raised
    /// to 0 dB.
    pub const AUDIO_DK: Self = Self::new(MixerRoute::ALL_SOURCES);

    /// Audio DK with a locally derived MCK: PCM RX1 and tone only, at −15 dB.
    pub const AUDIO_DK_DERIVED: Self = Self::new(MixerRoute::PCM_AND_TONE);

    /// Audio DK serial port and noise gain with a custom mixer.
    pub const fn new(mixer: MixerRoute) -> Self {
        Self {
            asp: AspConfig::AUDIO_DK,
            noise_gain: NOISE_GEN_GAIN_0DB,
            mixer,
        }
    }

    /// Ordered register table.
    #[allow(clippy::arithmetic_side_effects)] // constant field shifts
    pub const fn entries(&self) -> [RegisterConfigEntry; ROUTING_TABLE_LEN] {
        let asp = self.asp;
        let mut control2 = ((asp.rx_width as u32) << ASP1_RX_WIDTH_SHIFT)
            | ((asp.tx_width as u32) << ASP1_TX_WIDTH_SHIFT)
            | (asp.format.code() << ASP1_FMT_SHIFT);
        if asp.clock_master {
            control2 |= ASP1_BCLK_MSTR | ASP1_FSYNC_MSTR;
        }

        let mut enables = 0;
        if asp.rx1 {
            enables |= ASP1_RX1_EN;
        }
        if asp.rx2 {
            enables |= ASP1_RX2_EN;
        }

        let slots = self.mixer.slots();
        [
            RegisterConfigEntry::new(ASP1_CONTROL2, control2),
            RegisterConfigEntry::new(ASP1_CONTROL3, 0b00 << ASP1_DOUT_HIZ_CTRL_SHIFT),
            RegisterConfigEntry::new(ASP1_ENABLES1, enables),
            RegisterConfigEntry::new(
                COMFORT_NOISE_GENERATOR,
                self.noise_gain & NOISE_GEN_GAIN_MASK,
            ),
            RegisterConfigEntry::new(OUT1L_INPUT1, mixer_input(&slots[0])),
            RegisterConfigEntry::new(OUT1L_INPUT2, mixer_input(&slots[1])),
            RegisterConfigEntry::new(OUT1L_INPUT3, mixer_input(&slots[2])),
            RegisterConfigEntry::new(OUT1L_INPUT4, mixer_input(&slots[3])),
            RegisterConfigEntry::new(OUTPUT_ENABLE_1, OUT1L_EN),
        ]
    }
}

#[allow(clippy::arithmetic_side_effects)] // 7-bit code << 16
const fn mixer_input(slot: &platform::MixerSlot) -> u32 {
    ((slot.volume.code() as u32) << OUT1L_MIX_VOL_SHIFT) | source_code(slot.source)
}

/// Routing table for the Audio DK demo.
pub const AUDIO_DK_ROUTING: [RegisterConfigEntry; ROUTING_TABLE_LEN] = Routing::AUDIO_DK.entries();

/// Routing table for the Audio DK demo with a derived MCK.
pub const AUDIO_DK_DERIVED_ROUTING: [RegisterConfigEntry; ROUTING_TABLE_LEN] =
    Routing::AUDIO_DK_DERIVED.entries();

#[cfg(test)]
mod tests {
    use super::*;
    use platform::mixer::{MixVolume, MixerSlot};

    #[test]
    fn audio_dk_table_matches_register_values() {
        let expected = [
            (ASP1_CONTROL2, (0x10 << 24) | (0x10 << 16) | (0b010 << 8)),
            (ASP1_CONTROL3, 0),
            (ASP1_ENABLES1, 1 << 16),
            (COMFORT_NOISE_GENERATOR, 0x13),
            (OUT1L_INPUT1, (0x2B << 16) | 0x20),
            (OUT1L_INPUT2, (0x2B << 16) | 0x21),
            (OUT1L_INPUT3, (0x2B << 16) | 0x0C),
            (OUT1L_INPUT4, (0x2B << 16) | 0x04),
            (OUTPUT_ENABLE_1, 1 << 1),
        ];
        let got: Vec<(u32, u32)> = AUDIO_DK_ROUTING
            .iter()
            .map(|e| (e.address, e.value))
            .collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn output_enable_is_last() {
        let table = Routing::new(MixerRoute::PCM_AND_TONE).entries();
        assert_eq!(table.last().map(|e| e.address), Some(OUTPUT_ENABLE_1));
    }

    #[test]
    fn derived_table_routes_pcm_and_tone_at_minus_15_db() {
        let mixer: Vec<(u32, u32)> = AUDIO_DK_DERIVED_ROUTING[4..8]
            .iter()
            .map(|e| (e.address, e.value))
            .collect();
        assert_eq!(
            mixer,
            [
                (OUT1L_INPUT1, (0x31 << 16) | SRC_ASP1_RX1),
                (OUT1L_INPUT2, (0x31 << 16) | SRC_TONE1_GEN),
                (OUT1L_INPUT3, (0x40 << 16) | SRC_NONE),
                (OUT1L_INPUT4, (0x40 << 16) | SRC_NONE),
            ]
        );
        // Serial port, noise gain and output enable match the bypass table.
        assert_eq!(AUDIO_DK_DERIVED_ROUTING[..4], AUDIO_DK_ROUTING[..4]);
        assert_eq!(AUDIO_DK_DERIVED_ROUTING[8], AUDIO_DK_ROUTING[8]);
    }

    #[test]
    fn empty_mixer_slot_encodes_source_none() {
        let route = MixerRoute::new([
            MixerSlot::new(MixerSource::PcmRx1, MixVolume::UNITY),
            MixerSlot::EMPTY,
            MixerSlot::EMPTY,
            MixerSlot::EMPTY,
        ]);
        let table = Routing::new(route).entries();
        assert_eq!(table[4].value, (0x40 << 16) | 0x20);
        assert_eq!(table[5].value & 0xFF, SRC_NONE);
    }

    #[test]
    fn clock_master_sets_both_master_bits() {
        let mut routing = Routing::AUDIO_DK;
        routing.asp.clock_master = true;
        routing.asp.rx2 = true;
        let table = routing.entries();
        let master = ASP1_BCLK_MSTR | ASP1_FSYNC_MSTR;
        assert_eq!(table[0].value & master, master);
        assert_eq!(table[2].value, ASP1_RX1_EN | ASP1_RX2_EN);
    }
}
