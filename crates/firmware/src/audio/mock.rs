//! Mock codec for host-side testing
//!
//! Implements [`CodecDevice`] without any register traffic. Records every call
//! (including failing ones) for assertion in tests, and enforces the same
//! clock-ordering rules as the hardware driver.

use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use platform::{
    CodecDevice, CodecError, FllId, FllReference, FllState, Generator, PollBudget,
    RegisterConfigTable,
};

/// Recorded call capacity. Calls past this are dropped.
pub const MAX_CALLS: usize = 64;

/// One recorded [`CodecDevice`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CodecCall {
    /// `open_communication`
    Open,
    /// `configure_fll`
    ConfigureFll {
        /// FLL instance.
        fll: FllId,
        /// Reference input.
        reference: FllReference,
        /// Reference frequency.
        input_hz: u32,
        /// Target frequency.
        output_hz: u32,
    },
    /// `enable_fll`
    EnableFll(FllId),
    /// `wait_for_fll_lock`
    WaitForLock(FllId),
    /// `enable_system_clock`
    EnableSystemClock,
    /// `apply_register_table`
    ApplyTable {
        /// Table length.
        entries: usize,
    },
    /// `set_output_muted`
    SetMuted(bool),
    /// `set_generator_enabled`
    SetGenerator(Generator, bool),
    /// `disable_output_stage`
    DisableOutput,
    /// `disable_system_clock`
    DisableSystemClock,
    /// `disable_fll`
    DisableFll(FllId),
}

/// Discriminant used to select which call should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecOp {
    /// `open_communication`
    Open,
    /// `configure_fll`
    ConfigureFll,
    /// `enable_fll`
    EnableFll,
    /// `wait_for_fll_lock`
    WaitForLock,
    /// `enable_system_clock`
    EnableSystemClock,
    /// `apply_register_table`
    ApplyTable,
    /// `set_output_muted`
    SetMuted,
    /// `set_generator_enabled`
    SetGenerator,
    /// `disable_output_stage`
    DisableOutput,
    /// `disable_system_clock`
    DisableSystemClock,
    /// `disable_fll`
    DisableFll,
}

impl CodecCall {
    /// Operation this call belongs to.
    pub fn op(&self) -> CodecOp {
        match self {
            Self::Open => CodecOp::Open,
            Self::ConfigureFll { .. } => CodecOp::ConfigureFll,
            Self::EnableFll(_) => CodecOp::EnableFll,
            Self::WaitForLock(_) => CodecOp::WaitForLock,
            Self::EnableSystemClock => CodecOp::EnableSystemClock,
            Self::ApplyTable { .. } => CodecOp::ApplyTable,
            Self::SetMuted(_) => CodecOp::SetMuted,
            Self::SetGenerator(..) => CodecOp::SetGenerator,
            Self::DisableOutput => CodecOp::DisableOutput,
            Self::DisableSystemClock => CodecOp::DisableSystemClock,
            Self::DisableFll(_) => CodecOp::DisableFll,
        }
    }
}

/// Mock codec: records all calls for test assertions.
#[derive(Debug, Default)]
pub struct MockCodec {
    calls: Vec<CodecCall, MAX_CALLS>,
    failure: Option<(CodecOp, CodecError)>,
    never_locks: bool,
    open: bool,
    fll1: FllState,
    fll2: FllState,
    /// SYSCLK currently enabled.
    pub system_clock: bool,
    /// Output driver currently enabled (set by a successful table apply).
    pub output_enabled: bool,
    /// Output currently muted.
    pub muted: bool,
    /// Tone generator running.
    pub tone: bool,
    /// Noise generator running.
    pub noise: bool,
}

impl MockCodec {
    /// Create a mock with every call succeeding.
    pub fn new() -> Self {
        Self {
            muted: true,
            ..Self::default()
        }
    }

    /// Every call of `op` fails with `error` (the call is still recorded).
    pub fn fail_on(mut self, op: CodecOp, error: CodecError) -> Self {
        self.failure = Some((op, error));
        self
    }

    /// `wait_for_fll_lock` always times out.
    pub fn never_locks(mut self) -> Self {
        self.never_locks = true;
        self
    }

    /// Recorded calls, in order.
    pub fn calls(&self) -> &[CodecCall] {
        &self.calls
    }

    /// Recorded operations, in order.
    pub fn ops(&self) -> impl Iterator<Item = CodecOp> + '_ {
        self.calls.iter().map(CodecCall::op)
    }

    fn record(&mut self, call: CodecCall) -> Result<(), CodecError> {
        let _ = self.calls.push(call);
        match self.failure {
            Some((op, error)) if op == call.op() => Err(error),
            _ => Ok(()),
        }
    }

    fn record_open(&mut self, call: CodecCall) -> Result<(), CodecError> {
        self.record(call)?;
        if self.open {
            Ok(())
        } else {
            Err(CodecError::NotOpen)
        }
    }

    fn fll_mut(&mut self, fll: FllId) -> &mut FllState {
        match fll {
            FllId::Fll1 => &mut self.fll1,
            FllId::Fll2 => &mut self.fll2,
        }
    }
}

impl CodecDevice for MockCodec {
    async fn open_communication(&mut self) -> Result<(), CodecError> {
        self.record(CodecCall::Open)?;
        self.open = true;
        Ok(())
    }

    async fn configure_fll(
        &mut self,
        fll: FllId,
        reference: FllReference,
        input_hz: u32,
        output_hz: u32,
    ) -> Result<(), CodecError> {
        self.record_open(CodecCall::ConfigureFll {
            fll,
            reference,
            input_hz,
            output_hz,
        })?;
        *self.fll_mut(fll) = FllState::Configuring;
        Ok(())
    }

    async fn enable_fll(&mut self, fll: FllId) -> Result<(), CodecError> {
        self.record_open(CodecCall::EnableFll(fll))?;
        if self.fll_state(fll) == FllState::Disabled {
            return Err(CodecError::ConfigurationFailed);
        }
        Ok(())
    }

    async fn wait_for_fll_lock<D: DelayNs>(
        &mut self,
        fll: FllId,
        budget: PollBudget,
        delay: &mut D,
    ) -> Result<(), CodecError> {
        self.record_open(CodecCall::WaitForLock(fll))?;
        if self.never_locks {
            for _ in 0..budget.max_attempts {
                budget.pause(delay).await;
            }
            return Err(CodecError::LockTimeout);
        }
        *self.fll_mut(fll) = FllState::Locked;
        Ok(())
    }

    async fn enable_system_clock(&mut self) -> Result<(), CodecError> {
        self.record_open(CodecCall::EnableSystemClock)?;
        if self.fll1 != FllState::Locked {
            return Err(CodecError::FllNotLocked);
        }
        self.system_clock = true;
        Ok(())
    }

    async fn apply_register_table(
        &mut self,
        table: RegisterConfigTable<'_>,
    ) -> Result<(), CodecError> {
        self.record_open(CodecCall::ApplyTable {
            entries: table.len(),
        })?;
        self.output_enabled = true;
        Ok(())
    }

    async fn set_output_muted(&mut self, muted: bool) -> Result<(), CodecError> {
        self.record_open(CodecCall::SetMuted(muted))?;
        self.muted = muted;
        Ok(())
    }

    async fn set_generator_enabled(
        &mut self,
        generator: Generator,
        enabled: bool,
    ) -> Result<(), CodecError> {
        self.record_open(CodecCall::SetGenerator(generator, enabled))?;
        match generator {
            Generator::Tone => self.tone = enabled,
            Generator::Noise => self.noise = enabled,
        }
        Ok(())
    }

    async fn disable_output_stage(&mut self) -> Result<(), CodecError> {
        self.record_open(CodecCall::DisableOutput)?;
        self.output_enabled = false;
        Ok(())
    }

    async fn disable_system_clock(&mut self) -> Result<(), CodecError> {
        self.record_open(CodecCall::DisableSystemClock)?;
        self.system_clock = false;
        Ok(())
    }

    async fn disable_fll(&mut self, fll: FllId) -> Result<(), CodecError> {
        self.record_open(CodecCall::DisableFll(fll))?;
        if fll == FllId::Fll1 && self.system_clock {
            return Err(CodecError::SystemClockEnabled);
        }
        *self.fll_mut(fll) = FllState::Disabled;
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
    use platform::mocks::MockDelay;

    async fn opened() -> MockCodec {
        let mut codec = MockCodec::new();
        codec.open_communication().await.unwrap();
        codec
    }

    #[tokio::test]
    async fn calls_before_open_are_refused() {
        let mut codec = MockCodec::new();
        assert_eq!(codec.set_output_muted(false).await, Err(CodecError::NotOpen));
        assert_eq!(codec.calls(), [CodecCall::SetMuted(false)]);
    }

    #[tokio::test]
    async fn lock_then_system_clock() {
        let mut codec = opened().await;
        let mut delay = MockDelay::new();
        assert_eq!(
            codec.enable_system_clock().await,
            Err(CodecError::FllNotLocked)
        );
        codec
            .configure_fll(FllId::Fll1, FllReference::MasterClock1, 12_288_000, 49_152_000)
            .await
            .unwrap();
        codec.enable_fll(FllId::Fll1).await.unwrap();
        codec
            .wait_for_fll_lock(FllId::Fll1, PollBudget::FLL_LOCK, &mut delay)
            .await
            .unwrap();
        codec.enable_system_clock().await.unwrap();
        assert!(codec.system_clock);
        assert_eq!(delay.calls(), 0);
    }

    #[tokio::test]
    async fn never_locks_spends_the_budget() {
        let mut codec = opened().await.never_locks();
        let mut delay = MockDelay::new();
        let result = codec
            .wait_for_fll_lock(FllId::Fll1, PollBudget::FLL_LOCK, &mut delay)
            .await;
        assert_eq!(result, Err(CodecError::LockTimeout));
        assert_eq!(delay.total_ms(), 250);
    }

    #[tokio::test]
    async fn failure_is_recorded_and_returned() {
        let mut codec = opened()
            .await
            .fail_on(CodecOp::SetGenerator, CodecError::TransportFailed);
        assert_eq!(
            codec.set_generator_enabled(Generator::Tone, true).await,
            Err(CodecError::TransportFailed)
        );
        assert!(!codec.tone);
        assert_eq!(
            codec.calls().last(),
            Some(&CodecCall::SetGenerator(Generator::Tone, true))
        );
    }
}
