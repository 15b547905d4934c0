//! CS47L63 codec driver
//!
//! Generic over [`RegisterBus`] so it runs unchanged against the SPI control
//! port ([`SpiRegisterBus`](super::SpiRegisterBus)) or a host mock.
//!
//! The driver keeps a shadow of the clocking state so that out-of-order
//! requests are refused before any register is touched:
//!
//! - SYSCLK can only be enabled once FLL1 has been observed locked.
//! - FLL1 can only be disabled once SYSCLK is off.

use embedded_hal_async::delay::DelayNs;
use platform::register_table::write_table;
use platform::{
    CodecDevice, CodecError, FllId, FllReference, FllState, Generator, PollBudget, RegisterBus,
    RegisterConfigTable,
};

use super::fll::FllRatio;
use super::registers::{
    COMFORT_NOISE_GENERATOR, DEVID, DEVID_CS47L63, FLL1_CONTROL1, FLL1_LOCK_STS, FLL2_CONTROL1,
    FLL2_LOCK_STS, FLL_CONTROL2_OFFSET, FLL_CONTROL3_OFFSET, FLL_CTRL_UPD, FLL_EN, FLL_HOLD,
    IRQ1_STS_6, NOISE_GEN_EN, OUT1L_EN, OUT1L_MUTE, OUT1L_VOLUME_1, OUT1L_VOL_MASK, OUT_VU,
    OUTPUT_ENABLE_1, REVID, SYSCLK_EN, SYSTEM_CLOCK1, TONE1_EN, TONE_GENERATOR1,
};

/// `FLLn_CONTROL1` address of `fll`.
const fn fll_base(fll: FllId) -> u32 {
    match fll {
        FllId::Fll1 => FLL1_CONTROL1,
        FllId::Fll2 => FLL2_CONTROL1,
    }
}

/// Lock status bit of `fll` in `IRQ1_STS_6`.
const fn fll_lock_mask(fll: FllId) -> u32 {
    match fll {
        FllId::Fll1 => FLL1_LOCK_STS,
        FllId::Fll2 => FLL2_LOCK_STS,
    }
}

/// CS47L63 codec driver.
pub struct Cs47l63<B> {
    bus: B,
    open: bool,
    revision: u32,
    fll1: FllState,
    fll2: FllState,
    sysclk_enabled: bool,
}

impl<B: RegisterBus> Cs47l63<B> {
    /// Create a driver. Nothing is sent until
    /// [`open_communication`](CodecDevice::open_communication).
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            open: false,
            revision: 0,
            fll1: FllState::Disabled,
            fll2: FllState::Disabled,
            sysclk_enabled: false,
        }
    }

    /// Borrow the register bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Release the register bus.
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// `REVID` read during open.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// `true` while SYSCLK is enabled.
    pub fn is_system_clock_enabled(&self) -> bool {
        self.sysclk_enabled
    }

    /// Set the OUT1L digital volume register code, with the update strobe.
    ///
    /// `code` is `OUT1L_VOL` (0x00 = −64 dB, 0x80 = 0 dB, 0.5 dB steps).
    pub async fn set_output_volume(&mut self, code: u8) -> Result<(), CodecError> {
        self.ensure_open()?;
        self.bus
            .update_register(
                OUT1L_VOLUME_1,
                OUT_VU | OUT1L_VOL_MASK,
                OUT_VU | u32::from(code),
            )
            .await
    }

    fn ensure_open(&self) -> Result<(), CodecError> {
        if self.open {
            Ok(())
        } else {
            Err(CodecError::NotOpen)
        }
    }

    fn fll_state_mut(&mut self, fll: FllId) -> &mut FllState {
        match fll {
            FllId::Fll1 => &mut self.fll1,
            FllId::Fll2 => &mut self.fll2,
        }
    }

    async fn is_locked(&mut self, fll: FllId) -> Result<bool, CodecError> {
        let status = self.bus.read_register(IRQ1_STS_6).await?;
        Ok(status & fll_lock_mask(fll) != 0)
    }
}

impl<B: RegisterBus> CodecDevice for Cs47l63<B> {
    async fn open_communication(&mut self) -> Result<(), CodecError> {
        let id = self.bus.read_register(DEVID).await?;
        if id != DEVID_CS47L63 {
            error!("CS47L63: unexpected DEVID {}", id);
            return Err(CodecError::UnexpectedDevice { id });
        }
        self.revision = self.bus.read_register(REVID).await?;
        self.open = true;
        info!("CS47L63 detected, revision {}", self.revision);
        Ok(())
    }

    async fn configure_fll(
        &mut self,
        fll: FllId,
        reference: FllReference,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), CodecError> {
        self.ensure_open()?;
        let ratio = FllRatio::compute(input_hz, output_hz).map_err(|e| {
            error!("{}: no ratio for {} Hz -> {} Hz", fll, input_hz, output_hz);
            e
        })?;

        let base = fll_base(fll);
        self.bus.update_register(base, FLL_HOLD, FLL_HOLD).await?;
        self.bus
            .write_register(
                base.saturating_add(FLL_CONTROL2_OFFSET),
                ratio.control2(reference),
            )
            .await?;
        self.bus
            .write_register(base.saturating_add(FLL_CONTROL3_OFFSET), ratio.control3())
            .await?;
        *self.fll_state_mut(fll) = FllState::Configuring;

        debug!(
            "{}: N={} THETA={} LAMBDA={} DIV={}",
            fll, ratio.n, ratio.theta, ratio.lambda, ratio.refclk_div
        );
        Ok(())
    }

    async fn enable_fll(&mut self, fll: FllId) -> Result<(), CodecError> {
        self.ensure_open()?;
        if self.fll_state(fll) == FllState::Disabled {
            return Err(CodecError::ConfigurationFailed);
        }
        self.bus
            .update_register(
                fll_base(fll),
                FLL_EN | FLL_HOLD | FLL_CTRL_UPD,
                FLL_EN | FLL_CTRL_UPD,
            )
            .await?;
        info!("{} enabled", fll);
        Ok(())
    }

    async fn wait_for_fll_lock<D: DelayNs>(
        &mut self,
        fll: FllId,
        budget: PollBudget,
        delay: &mut D,
    ) -> Result<(), CodecError> {
        self.ensure_open()?;
        for attempt in 1..=budget.max_attempts {
            if self.is_locked(fll).await? {
                *self.fll_state_mut(fll) = FllState::Locked;
                info!("{} locked after {} polls", fll, attempt);
                return Ok(());
            }
            budget.pause(delay).await;
        }
        error!("{} not locked after {} polls", fll, budget.max_attempts);
        Err(CodecError::LockTimeout)
    }

    async fn enable_system_clock(&mut self) -> Result<(), CodecError> {
        self.ensure_open()?;
        if self.fll1 != FllState::Locked {
            return Err(CodecError::FllNotLocked);
        }
        self.bus
            .update_register(SYSTEM_CLOCK1, SYSCLK_EN, SYSCLK_EN)
            .await?;
        self.sysclk_enabled = true;
        info!("SYSCLK enabled");
        Ok(())
    }

    async fn apply_register_table(
        &mut self,
        table: RegisterConfigTable<'_>,
    ) -> Result<(), CodecError> {
        self.ensure_open()?;
        write_table(&mut self.bus, table).await.map_err(|e| {
            error!(
                "Register table entry {} of {} failed (addr {})",
                e.index,
                table.len(),
                e.address
            );
            e.error
        })?;
        info!("Applied {} register writes", table.len());
        Ok(())
    }

    async fn set_output_muted(&mut self, muted: bool) -> Result<(), CodecError> {
        self.ensure_open()?;
        let mute = if muted { OUT1L_MUTE } else { 0 };
        self.bus
            .update_register(OUT1L_VOLUME_1, OUT_VU | OUT1L_MUTE, OUT_VU | mute)
            .await
    }

    async fn set_generator_enabled(
        &mut self,
        generator: Generator,
        enabled: bool,
    ) -> Result<(), CodecError> {
        self.ensure_open()?;
        let (address, mask) = match generator {
            Generator::Tone => (TONE_GENERATOR1, TONE1_EN),
            Generator::Noise => (COMFORT_NOISE_GENERATOR, NOISE_GEN_EN),
        };
        let value = if enabled { mask } else { 0 };
        self.bus.update_register(address, mask, value).await
    }

    async fn disable_output_stage(&mut self) -> Result<(), CodecError> {
        self.ensure_open()?;
        self.bus
            .update_register(OUTPUT_ENABLE_1, OUT1L_EN, 0)
            .await
    }

    async fn disable_system_clock(&mut self) -> Result<(), CodecError> {
        self.ensure_open()?;
        self.bus.update_register(SYSTEM_CLOCK1, SYSCLK_EN, 0).await?;
        self.sysclk_enabled = false;
        Ok(())
    }

    async fn disable_fll(&mut self, fll: FllId) -> Result<(), CodecError> {
        self.ensure_open()?;
        if fll == FllId::Fll1 && self.sysclk_enabled {
            return Err(CodecError::SystemClockEnabled);
        }
        self.bus
            .update_register(fll_base(fll), FLL_EN | FLL_HOLD, 0)
            .await?;
        *self.fll_state_mut(fll) = FllState::Disabled;
        Ok(())
    }

    fn fll_state(&self, fll: FllId) -> FllState {
        match fll {
            FllId::Fll1 => self.fll1,
            FllId::Fll2 => self.fll2,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::audio::cs47l63::registers::{FLL1_CONTROL2, FLL1_CONTROL3};
    use embassy_time::Duration;
    use platform::mocks::{MockDelay, MockRegisterBus};

    fn codec_bus() -> MockRegisterBus {
        let mut bus = MockRegisterBus::new();
        bus.preset(DEVID, DEVID_CS47L63).preset(REVID, 0xA1);
        bus
    }

    async fn locked(bus: &mut MockRegisterBus) -> Cs47l63<&mut MockRegisterBus> {
        bus.status_bit(IRQ1_STS_6, FLL1_LOCK_STS, Some(0));
        let mut codec = Cs47l63::new(bus);
        let mut delay = MockDelay::new();
        codec.open_communication().await.unwrap();
        codec
            .configure_fll(FllId::Fll1, FllReference::MasterClock1, 12_288_000, 49_152_000)
            .await
            .unwrap();
        codec.enable_fll(FllId::Fll1).await.unwrap();
        codec
            .wait_for_fll_lock(FllId::Fll1, PollBudget::FLL_LOCK, &mut delay)
            .await
            .unwrap();
        codec
    }

    #[tokio::test]
    async fn open_checks_device_id() {
        let mut bus = codec_bus();
        let mut codec = Cs47l63::new(&mut bus);
        codec.open_communication().await.unwrap();
        assert_eq!(codec.revision(), 0xA1);
    }

    #[tokio::test]
    async fn open_rejects_wrong_device() {
        let mut bus = MockRegisterBus::new();
        bus.preset(DEVID, 0x4_7A35);
        let mut codec = Cs47l63::new(&mut bus);
        assert_eq!(
            codec.open_communication().await,
            Err(CodecError::UnexpectedDevice { id: 0x4_7A35 })
        );
        assert_eq!(codec.set_output_muted(true).await, Err(CodecError::NotOpen));
    }

    #[tokio::test]
    async fn open_surfaces_transport_failure() {
        let mut bus = codec_bus();
        bus.fail_reads();
        let mut codec = Cs47l63::new(&mut bus);
        assert_eq!(
            codec.open_communication().await,
            Err(CodecError::TransportFailed)
        );
    }

    #[tokio::test]
    async fn fll_bring_up_programs_ratio_and_enables() {
        let mut bus = codec_bus();
        let codec = locked(&mut bus).await;
        assert_eq!(codec.fll_state(FllId::Fll1), FllState::Locked);
        drop(codec);

        assert_eq!(bus.writes_to(FLL1_CONTROL2), [4]);
        assert_eq!(bus.writes_to(FLL1_CONTROL3), [1 << 16]);
        assert_eq!(
            bus.writes_to(FLL1_CONTROL1),
            [FLL_HOLD, FLL_EN | FLL_CTRL_UPD]
        );
    }

    #[tokio::test]
    async fn lock_timeout_is_bounded() {
        let mut bus = codec_bus();
        bus.status_bit(IRQ1_STS_6, FLL1_LOCK_STS, None);
        let mut codec = Cs47l63::new(&mut bus);
        let mut delay = MockDelay::new();
        codec.open_communication().await.unwrap();
        codec
            .configure_fll(FllId::Fll1, FllReference::MasterClock1, 12_288_000, 49_152_000)
            .await
            .unwrap();
        codec.enable_fll(FllId::Fll1).await.unwrap();

        let budget = PollBudget::new(Duration::from_millis(1), 7);
        assert_eq!(
            codec.wait_for_fll_lock(FllId::Fll1, budget, &mut delay).await,
            Err(CodecError::LockTimeout)
        );
        assert_eq!(codec.fll_state(FllId::Fll1), FllState::Configuring);
        assert_eq!(codec.bus().reads_of(IRQ1_STS_6), 7);
        assert_eq!(delay.total_ms(), 7);
    }

    #[tokio::test]
    async fn system_clock_requires_lock() {
        let mut bus = codec_bus();
        let mut codec = Cs47l63::new(&mut bus);
        codec.open_communication().await.unwrap();
        assert_eq!(
            codec.enable_system_clock().await,
            Err(CodecError::FllNotLocked)
        );
        assert!(codec.bus().writes_to(SYSTEM_CLOCK1).is_empty());
    }

    #[tokio::test]
    async fn fll_disable_refused_while_sysclk_runs() {
        let mut bus = codec_bus();
        let mut codec = locked(&mut bus).await;
        assert!(!codec.is_system_clock_enabled());
        codec.enable_system_clock().await.unwrap();
        assert!(codec.is_system_clock_enabled());
        let writes_before = codec.bus().writes().len();

        assert_eq!(
            codec.disable_fll(FllId::Fll1).await,
            Err(CodecError::SystemClockEnabled)
        );
        assert_eq!(codec.bus().writes().len(), writes_before);

        codec.disable_system_clock().await.unwrap();
        assert!(!codec.is_system_clock_enabled());
        codec.disable_fll(FllId::Fll1).await.unwrap();
        assert_eq!(codec.fll_state(FllId::Fll1), FllState::Disabled);
        assert_eq!(codec.bus().register(SYSTEM_CLOCK1) & SYSCLK_EN, 0);
        assert_eq!(codec.bus().register(FLL1_CONTROL1) & FLL_EN, 0);
    }

    #[tokio::test]
    async fn mute_and_volume_writes_carry_update_strobe() {
        let mut bus = codec_bus();
        let mut codec = Cs47l63::new(&mut bus);
        codec.open_communication().await.unwrap();
        codec.set_output_muted(false).await.unwrap();
        codec.set_output_muted(true).await.unwrap();
        codec.set_output_volume(0x80).await.unwrap();
        drop(codec);

        let writes = bus.writes_to(OUT1L_VOLUME_1);
        assert_eq!(writes.len(), 3);
        assert!(writes.iter().all(|v| v & OUT_VU != 0));
        assert_eq!(writes.first().map(|v| v & OUT1L_MUTE), Some(0));
        assert_eq!(writes.get(1).map(|v| v & OUT1L_MUTE), Some(OUT1L_MUTE));
    }

    #[tokio::test]
    async fn generators_toggle_their_enable_bits() {
        let mut bus = codec_bus();
        bus.preset(COMFORT_NOISE_GENERATOR, 0x13);
        let mut codec = Cs47l63::new(&mut bus);
        codec.open_communication().await.unwrap();

        codec.set_generator_enabled(Generator::Noise, true).await.unwrap();
        assert_eq!(codec.bus().register(COMFORT_NOISE_GENERATOR), 0x13 | NOISE_GEN_EN);
        codec.set_generator_enabled(Generator::Tone, true).await.unwrap();
        assert_eq!(codec.bus().register(TONE_GENERATOR1), TONE1_EN);
        codec.set_generator_enabled(Generator::Noise, false).await.unwrap();
        assert_eq!(codec.bus().register(COMFORT_NOISE_GENERATOR), 0x13);
    }
}
