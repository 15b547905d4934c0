//! Audio codec abstractions.
//!
//! Two layers:
//!
//! - [`RegisterBus`]: raw 32-bit register transport (SPI control port on the
//!   CS47L63). Everything above it is expressed as register reads/writes.
//! - [`CodecDevice`]: the operations the bring-up sequencer needs: open the
//!   control port, clock the codec from an FLL, apply a routing table and
//!   drive the output/generator controls.
//!
//! # FLL / SYSCLK ordering
//!
//! ```text
//! Disabled --configure_fll--> Configuring --enable_fll + lock--> Locked
//!                                                                 │
//!                           enable_system_clock (requires Locked) ┘
//!
//! disable_system_clock  must precede  disable_fll
//! ```
//!
//! Implementations reject out-of-order calls with [`CodecError::FllNotLocked`]
//! and [`CodecError::SystemClockEnabled`] instead of touching the device.

use embedded_hal_async::delay::DelayNs;

use crate::poll::PollBudget;
use crate::register_table::RegisterConfigTable;

/// Codec errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecError {
    /// Parameters cannot be realised (e.g. FLL ratio out of range).
    ConfigurationFailed,
    /// Register transport reported an error.
    TransportFailed,
    /// Device-ID register did not identify the expected part.
    UnexpectedDevice {
        /// Value read from the device-ID register.
        id: u32,
    },
    /// FLL lock status never asserted within the poll budget.
    LockTimeout,
    /// System clock requested before the FLL locked.
    FllNotLocked,
    /// FLL disable requested while the system clock still runs from it.
    SystemClockEnabled,
    /// Control port not opened.
    NotOpen,
}

impl core::fmt::Display for CodecError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ConfigurationFailed => write!(f, "Codec configuration out of range"),
            Self::TransportFailed => write!(f, "Codec register transport failed"),
            Self::UnexpectedDevice { id } => write!(f, "Unexpected codec device ID {id:#x}"),
            Self::LockTimeout => write!(f, "Codec FLL did not lock"),
            Self::FllNotLocked => write!(f, "Codec FLL not locked"),
            Self::SystemClockEnabled => write!(f, "Codec system clock still enabled"),
            Self::NotOpen => write!(f, "Codec control port not open"),
        }
    }
}

/// 32-bit register transport.
pub trait RegisterBus {
    /// Write `value` to `address`.
    async fn write_register(&mut self, address: u32, value: u32) -> Result<(), CodecError>;

    /// Read `address`.
    async fn read_register(&mut self, address: u32) -> Result<u32, CodecError>;

    /// Read-modify-write: bits in `mask` take their value from `value`, the
    /// rest are preserved.
    async fn update_register(
        &mut self,
        address: u32,
        mask: u32,
        value: u32,
    ) -> Result<(), CodecError> {
        let current = self.read_register(address).await?;
        let next = (current & !mask) | (value & mask);
        self.write_register(address, next).await
    }
}

impl<T: RegisterBus> RegisterBus for &mut T {
    async fn write_register(&mut self, address: u32, value: u32) -> Result<(), CodecError> {
        T::write_register(self, address, value).await
    }

    async fn read_register(&mut self, address: u32) -> Result<u32, CodecError> {
        T::read_register(self, address).await
    }
}

/// Frequency-locked loop instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FllId {
    /// FLL1 (SYSCLK source).
    Fll1,
    /// FLL2.
    Fll2,
}

impl core::fmt::Display for FllId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Fll1 => write!(f, "FLL1"),
            Self::Fll2 => write!(f, "FLL2"),
        }
    }
}

/// FLL reference input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FllReference {
    /// MCLK1 pin (driven by the I2S MCK).
    MasterClock1,
    /// MCLK2 pin.
    MasterClock2,
    /// ASP1 bit clock.
    SerialPortBitClock,
}

/// FLL lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FllState {
    /// Off.
    #[default]
    Disabled,
    /// Ratio programmed and/or enabled, lock not yet observed.
    Configuring,
    /// Lock observed.
    Locked,
}

/// On-chip signal generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Generator {
    /// Sine tone generator.
    Tone,
    /// Comfort-noise generator.
    Noise,
}

impl core::fmt::Display for Generator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Tone => write!(f, "tone"),
            Self::Noise => write!(f, "noise"),
        }
    }
}

/// Codec operations used by the bring-up sequencer.
///
/// Every method fails with [`CodecError::NotOpen`] before
/// [`open_communication`](Self::open_communication) succeeds.
pub trait CodecDevice {
    /// Initialise the control port and confirm the device identity.
    async fn open_communication(&mut self) -> Result<(), CodecError>;

    /// Program the FLL ratio for `input_hz` on `reference` → `output_hz`.
    async fn configure_fll(
        &mut self,
        fll: FllId,
        reference: FllReference,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), CodecError>;

    /// Enable a configured FLL.
    async fn enable_fll(&mut self, fll: FllId) -> Result<(), CodecError>;

    /// Poll the FLL lock status within `budget`.
    async fn wait_for_fll_lock<D: DelayNs>(
        &mut self,
        fll: FllId,
        budget: PollBudget,
        delay: &mut D,
    ) -> Result<(), CodecError>;

    /// Enable SYSCLK from the locked FLL.
    async fn enable_system_clock(&mut self) -> Result<(), CodecError>;

    /// Write a register table in order; the first failure aborts.
    async fn apply_register_table(
        &mut self,
        table: RegisterConfigTable<'_>,
    ) -> Result<(), CodecError>;

    /// Mute or unmute the output path.
    async fn set_output_muted(&mut self, muted: bool) -> Result<(), CodecError>;

    /// Start or stop an on-chip generator.
    async fn set_generator_enabled(
        &mut self,
        generator: Generator,
        enabled: bool,
    ) -> Result<(), CodecError>;

    /// Disable the output driver.
    async fn disable_output_stage(&mut self) -> Result<(), CodecError>;

    /// Disable SYSCLK.
    async fn disable_system_clock(&mut self) -> Result<(), CodecError>;

    /// Disable an FLL. Requires SYSCLK to be disabled first.
    async fn disable_fll(&mut self, fll: FllId) -> Result<(), CodecError>;

    /// Current FLL lifecycle state.
    fn fll_state(&self, fll: FllId) -> FllState;
}
