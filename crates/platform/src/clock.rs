//! Oscillator clock domains of the nRF5340 application core.
//!
//! Two domains feed the audio chain:
//!
//! ```text
//! HFCLK      (128 MHz, DIV1)  -> CPU / peripheral bus
//! HFCLKAUDIO (12.288 MHz)     -> I2S MCK (bypass) -> CS47L63 MCLK1 -> FLL1
//! ```
//!
//! A domain is only usable once its oscillator has been started **and** the
//! running status has been observed. Starting is asynchronous on silicon: the
//! `TASKS_*START` trigger returns immediately and `*STAT` flips later.
//!
//! # Sources
//!
//! - nRF5340 Product Specification v1.3, §5.4 (CLOCK: Clock control)
//! - nRF5340 PS §5.4.2.2: HFCLKAUDIO frequency
//!   `f = 32 MHz × (4 + FREQUENCY / 2^16) / 12`

/// Oscillator clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockDomain {
    /// High-frequency core/peripheral clock.
    Hfclk,
    /// Audio-grade high-frequency clock feeding the I2S master clock.
    HfclkAudio,
}

impl core::fmt::Display for ClockDomain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Hfclk => write!(f, "HFCLK"),
            Self::HfclkAudio => write!(f, "HFCLKAUDIO"),
        }
    }
}

/// Observed lifecycle of a clock domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockState {
    /// Oscillator off (reset state).
    #[default]
    Stopped,
    /// Start requested, running status not yet observed.
    Starting,
    /// Running status observed; consumers may rely on the clock.
    Running,
}

/// HFCLK divider (`HFCLKCTRL.HCLK`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HfclkDivider {
    /// 128 MHz.
    #[default]
    Div1,
    /// 64 MHz.
    Div2,
}

impl HfclkDivider {
    /// Resulting core clock frequency in Hz.
    pub const fn hz(self) -> u32 {
        match self {
            Self::Div1 => 128_000_000,
            Self::Div2 => 64_000_000,
        }
    }
}

/// HFCLKAUDIO frequency selector (`HFCLKAUDIO.FREQUENCY`).
///
/// `code` is the 16-bit register value; `nominal_hz` is the audio-family rate
/// the code approximates. The FLL ratio is computed from the nominal rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HfclkAudioFreq {
    /// Raw `FREQUENCY` register value.
    pub code: u16,
    /// Nominal frequency the code selects.
    pub nominal_hz: u32,
}

impl HfclkAudioFreq {
    /// 12.288 MHz: 48 kHz family (256 × 48 kHz).
    pub const MHZ_12_288: Self = Self {
        code: 0x9BA6,
        nominal_hz: 12_288_000,
    };

    /// 11.2896 MHz: 44.1 kHz family (256 × 44.1 kHz).
    pub const MHZ_11_2896: Self = Self {
        code: 0x3BCD,
        nominal_hz: 11_289_600,
    };

    /// Frequency actually synthesised for `code`, truncated to whole Hz.
    ///
    /// `32 MHz × (4 × 2^16 + code) / (12 × 2^16)`
    pub const fn synthesized_hz(self) -> u32 {
        const BASE_HZ: u64 = 32_000_000;
        const SCALE: u64 = 1 << 16;
        #[allow(clippy::arithmetic_side_effects)] // max 32e6 × 327_679 < 2^44
        let hz = BASE_HZ * (4 * SCALE + self.code as u64) / (12 * SCALE);
        #[allow(clippy::cast_possible_truncation)] // result < 14 MHz
        let hz = hz as u32;
        hz
    }
}

impl Default for HfclkAudioFreq {
    fn default() -> Self {
        Self::MHZ_12_288
    }
}

/// Non-success status code returned by a clock configuration primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockStatus(pub u32);

/// Clock tree errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockError {
    /// Divider / selector write rejected; carries the primitive's status code.
    ConfigurationFailed(u32),
    /// Running status never observed within the poll budget.
    ReadyTimeout(ClockDomain),
    /// Domain still reported running after the stop poll budget.
    StopTimeout(ClockDomain),
}

impl core::fmt::Display for ClockError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConfigurationFailed(code) => {
                write!(f, "Clock configuration rejected (status {code:#x})")
            }
            Self::ReadyTimeout(domain) => write!(f, "{domain} did not start in time"),
            Self::StopTimeout(domain) => write!(f, "{domain} did not stop in time"),
        }
    }
}

/// Clock-domain control primitive.
///
/// Thin wrapper over the CLOCK peripheral. `start`/`stop` only *request* the
/// transition; callers poll [`is_running`](Self::is_running) to observe it.
pub trait ClockPrimitive {
    /// Program the HFCLK divider. Only meaningful for [`ClockDomain::Hfclk`].
    fn set_divider(&mut self, domain: ClockDomain, divider: HfclkDivider)
        -> Result<(), ClockStatus>;

    /// Program the oscillator frequency selector. Only meaningful for
    /// [`ClockDomain::HfclkAudio`].
    fn set_frequency_selector(&mut self, domain: ClockDomain, freq: HfclkAudioFreq);

    /// Trigger the oscillator start task.
    fn start(&mut self, domain: ClockDomain);

    /// Trigger the oscillator stop task.
    fn stop(&mut self, domain: ClockDomain);

    /// Sample the running status.
    fn is_running(&mut self, domain: ClockDomain) -> bool;
}
