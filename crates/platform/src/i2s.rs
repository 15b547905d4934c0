//! I2S serial audio bus abstraction (nRF5340 I2S0).
//!
//! The peripheral is modelled as a set of abstract configuration fields plus
//! two tasks. A driver implementing [`I2sRegisters`] maps each [`I2sField`]
//! onto the corresponding `CONFIG.*` / `TXD` / `RXD` register.
//!
//! # Clock routing
//!
//! ```text
//! AudioClockBypass:  HFCLKAUDIO ──(CLKSRC=ACLK, BYPASS)──> MCK
//! Derived:           HFCLK 32M  ──(CLKSRC=PCLK32M, MCKFREQ)──> MCK
//!
//! LRCK = MCK / RATIO
//! BCLK = LRCK × SWIDTH × 2
//! ```
//!
//! The EasyDMA pointer is only handed to the peripheral after the reference
//! clock domain is running. The bus configurator enforces nothing itself; the
//! sequencer checks [`SerialBusConfig::reference_domain`] beforehand.

use crate::clock::{ClockDomain, HfclkAudioFreq};

/// Maximum value of the 14-bit `RXTXD.MAXCNT` field (32-bit words).
pub const MAX_BUFFER_WORDS: u16 = 0x3FFF;

// ── Field value types ────────────────────────────────────────────────────────

/// MCK source (`CONFIG.CLKCONFIG.CLKSRC`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockSource {
    /// 32 MHz peripheral clock.
    Pclk32m,
    /// Audio PLL clock (`HFCLKAUDIO`).
    Aclk,
}

/// Bus role (`CONFIG.MODE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusRole {
    /// This side generates SCK / LRCK.
    Master,
    /// The far side generates SCK / LRCK.
    Slave,
}

/// Frame format (`CONFIG.FORMAT`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameFormat {
    /// Philips I2S (one-SCK delay after LRCK edge).
    I2s,
    /// Left/right justified, no delay.
    Aligned,
}

/// Sample alignment within the half-frame (`CONFIG.ALIGN`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Alignment {
    /// MSB first, left aligned.
    Left,
    /// Right aligned.
    Right,
}

/// Sample width (`CONFIG.SWIDTH`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleWidth {
    /// 8-bit samples.
    Bits8,
    /// 16-bit samples.
    Bits16,
    /// 24-bit samples.
    Bits24,
}

impl SampleWidth {
    /// Width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Bits8 => 8,
            Self::Bits16 => 16,
            Self::Bits24 => 24,
        }
    }
}

/// Channels carried in the TX buffer (`CONFIG.CHANNELS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChannelMask {
    /// Interleaved left/right.
    Stereo,
    /// Left only; right slot repeats left.
    Left,
    /// Right only; left slot repeats right.
    Right,
}

/// MCK / LRCK ratio (`CONFIG.RATIO`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MckRatio {
    /// 32×
    X32,
    /// 48×
    X48,
    /// 64×
    X64,
    /// 96×
    X96,
    /// 128×
    X128,
    /// 192×
    X192,
    /// 256×
    X256,
    /// 384×
    X384,
    /// 512×
    X512,
}

impl MckRatio {
    /// Divisor applied to MCK to obtain LRCK.
    pub const fn divisor(self) -> u32 {
        match self {
            Self::X32 => 32,
            Self::X48 => 48,
            Self::X64 => 64,
            Self::X96 => 96,
            Self::X128 => 128,
            Self::X192 => 192,
            Self::X256 => 256,
            Self::X384 => 384,
            Self::X512 => 512,
        }
    }
}

/// Locally divided MCK (`CONFIG.MCKFREQ`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MckFreq {
    /// Raw `MCKFREQ` register value.
    pub code: u32,
    /// Nominal resulting frequency.
    pub nominal_hz: u32,
}

impl MckFreq {
    /// `32MDIV8`: 4 MHz.
    pub const DIV8: Self = Self {
        code: 0x2000_0000,
        nominal_hz: 4_000_000,
    };
}

/// Where MCK comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitClockRouting {
    /// `HFCLKAUDIO` routed straight through to MCK.
    AudioClockBypass {
        /// Audio oscillator setting the MCK is taken from.
        aclk: HfclkAudioFreq,
    },
    /// MCK divided down from the 32 MHz peripheral clock.
    Derived {
        /// Divider setting.
        mck: MckFreq,
    },
}

// ── Register-level interface ─────────────────────────────────────────────────

/// One abstract I2S configuration write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2sField {
    /// `CONFIG.CLKCONFIG`
    ClockConfig {
        /// MCK source.
        source: ClockSource,
        /// Pass the source straight through as MCK.
        bypass: bool,
    },
    /// `CONFIG.MCKFREQ`
    MckFreq(u32),
    /// `CONFIG.MCKEN`
    MckEnable(bool),
    /// `CONFIG.RATIO`
    Ratio(MckRatio),
    /// `CONFIG.MODE`
    Mode(BusRole),
    /// `CONFIG.FORMAT`
    Format(FrameFormat),
    /// `CONFIG.ALIGN`
    Align(Alignment),
    /// `CONFIG.SWIDTH`
    SampleWidth(SampleWidth),
    /// `CONFIG.CHANNELS`
    Channels(ChannelMask),
    /// `CONFIG.TXEN`
    TxEnable(bool),
    /// `CONFIG.RXEN`
    RxEnable(bool),
    /// `ENABLE`
    Enable(bool),
    /// `TXD.PTR` + `RXTXD.MAXCNT`
    TxBuffer {
        /// Data RAM address of the first sample.
        address: usize,
        /// Length in 32-bit words.
        words: u16,
    },
}

/// I2S task trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2sTask {
    /// `TASKS_START`: begin streaming; the TX buffer loops until stopped.
    Start,
    /// `TASKS_STOP`
    Stop,
}

/// I2S peripheral register access. Writes cannot fail.
pub trait I2sRegisters {
    /// Write one configuration field.
    fn write(&mut self, field: I2sField);

    /// Trigger a task.
    fn trigger(&mut self, task: I2sTask);
}

// ── Configuration ────────────────────────────────────────────────────────────

/// I2S bus errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// Sample buffer is empty, not a whole number of 32-bit words, or longer
    /// than `MAXCNT` allows.
    InvalidBuffer {
        /// Buffer length in 16-bit samples.
        samples: usize,
    },
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidBuffer { samples } => {
                write!(f, "I2S buffer of {samples} samples cannot be streamed")
            }
        }
    }
}

/// EasyDMA transmit buffer handed to the peripheral.
///
/// The peripheral replays it from the start each time it is exhausted, so
/// the descriptor carries `looping = true` and the content never changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BufferDescriptor {
    /// Address of the first sample.
    pub address: usize,
    /// Length in 32-bit words (`MAXCNT`).
    pub words: u16,
    /// Replayed continuously.
    pub looping: bool,
}

impl BufferDescriptor {
    /// Describe a static 16-bit sample buffer.
    ///
    /// Two 16-bit samples pack into each 32-bit EasyDMA word, so the sample
    /// count must be even. The buffer must live in data RAM on target.
    pub fn from_static(samples: &'static [i16]) -> Result<Self, BusError> {
        let invalid = BusError::InvalidBuffer {
            samples: samples.len(),
        };
        if samples.is_empty() || samples.len() % 2 != 0 {
            return Err(invalid);
        }
        let words = u16::try_from(samples.len() / 2).map_err(|_| invalid)?;
        if words > MAX_BUFFER_WORDS {
            return Err(invalid);
        }
        Ok(Self {
            address: samples.as_ptr() as usize,
            words,
            looping: true,
        })
    }
}

/// Complete I2S bus configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialBusConfig {
    /// MCK source.
    pub routing: BitClockRouting,
    /// Master or slave.
    pub role: BusRole,
    /// Frame format.
    pub format: FrameFormat,
    /// Sample alignment.
    pub align: Alignment,
    /// Sample width.
    pub width: SampleWidth,
    /// Channel mask.
    pub channels: ChannelMask,
    /// MCK / LRCK ratio.
    pub ratio: MckRatio,
    /// Looping TX buffer.
    pub buffer: BufferDescriptor,
}

impl SerialBusConfig {
    /// Audio DK default: `HFCLKAUDIO` 12.288 MHz bypassed to MCK, master,
    /// I2S, left aligned, 16-bit mono-left, 256× → 48 kHz.
    pub const fn audio_dk_bypass(buffer: BufferDescriptor) -> Self {
        Self {
            routing: BitClockRouting::AudioClockBypass {
                aclk: HfclkAudioFreq::MHZ_12_288,
            },
            role: BusRole::Master,
            format: FrameFormat::I2s,
            align: Alignment::Left,
            width: SampleWidth::Bits16,
            channels: ChannelMask::Left,
            ratio: MckRatio::X256,
            buffer,
        }
    }

    /// MCK divided from the 32 MHz peripheral clock (4 MHz, 96× → ~41.7 kHz).
    ///
    /// Runs without the audio oscillator at the cost of a non-standard rate.
    pub const fn audio_dk_derived(buffer: BufferDescriptor) -> Self {
        Self {
            routing: BitClockRouting::Derived { mck: MckFreq::DIV8 },
            ratio: MckRatio::X96,
            ..Self::audio_dk_bypass(buffer)
        }
    }

    /// Clock domain MCK is taken from. It must be running before the bus
    /// is configured.
    pub const fn reference_domain(&self) -> ClockDomain {
        match self.routing {
            BitClockRouting::AudioClockBypass { .. } => ClockDomain::HfclkAudio,
            BitClockRouting::Derived { .. } => ClockDomain::Hfclk,
        }
    }

    /// Nominal MCK frequency in Hz. This is the codec FLL reference.
    pub const fn master_clock_hz(&self) -> u32 {
        match self.routing {
            BitClockRouting::AudioClockBypass { aclk } => aclk.nominal_hz,
            BitClockRouting::Derived { mck } => mck.nominal_hz,
        }
    }

    /// LRCK (frame rate) in Hz.
    pub const fn frame_rate_hz(&self) -> u32 {
        // divisor() is never zero
        #[allow(clippy::arithmetic_side_effects)]
        let hz = self.master_clock_hz() / self.ratio.divisor();
        hz
    }

    /// SCK (bit clock) in Hz.
    pub const fn bit_clock_hz(&self) -> u32 {
        self.frame_rate_hz()
            .saturating_mul(self.width.bits())
            .saturating_mul(2)
    }
}
