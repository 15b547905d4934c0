//! Bring-up / demonstration / teardown sequencer.
//!
//! Walks the Audio DK dependency graph forward, holds it while the demo runs,
//! then walks it back:
//!
//! ```text
//!  Uninitialized ─► ClocksReady ─► BusReady ─► CodecClockLocked ─► CodecConfigured
//!   (or ShutDown)   HFCLK          I2S         open, FLL, lock,     routing table
//!                   HFCLKAUDIO     master      SYSCLK
//!                                                                        │
//!  ShutDown ◄─ ShuttingDown ◄──────────────────────────────────── DemoRunning
//!             output → SYSCLK → FLL → I2S → HFCLKAUDIO → HFCLK
//! ```
//!
//! Every forward step that succeeds pushes a [`BringupStep`]. Teardown pops
//! them, so it undoes exactly what was applied no matter where bring-up or the
//! demo stopped. Any bring-up failure lands in [`BringupState::BringupFailed`]
//! with nothing undone; call [`BringupSequencer::teardown`] to unwind.
//! Teardown also stops an oscillator whose start was requested but never
//! observed, without reporting it as a step.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use heapless::Vec;
use platform::i2s::BufferDescriptor;
use platform::{
    BusError, ClockDomain, ClockError, ClockPrimitive, CodecDevice, CodecError, FllId,
    FllReference, I2sRegisters, PollBudget, RegisterConfigTable, SerialBusConfig,
};

use crate::audio::cs47l63::{AUDIO_DK_DERIVED_ROUTING, AUDIO_DK_ROUTING};
use crate::clocks::{ClockTree, ClockTreeConfig};
use crate::demo::{hold, DemoAction, DemoScript};
use crate::i2s::I2sConfigurator;

/// Transition log capacity.
pub const MAX_TRANSITIONS: usize = 48;

/// Forward steps that have an inverse.
const MAX_STEPS: usize = 8;

// ── States ───────────────────────────────────────────────────────────────────

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupState {
    /// Nothing started.
    #[default]
    Uninitialized,
    /// `HFCLK` and `HFCLKAUDIO` running.
    ClocksReady,
    /// I2S streaming as master.
    BusReady,
    /// Codec FLL locked, SYSCLK enabled.
    CodecClockLocked,
    /// Routing table applied.
    CodecConfigured,
    /// Demo script in progress (or aborted).
    DemoRunning,
    /// Teardown in progress.
    ShuttingDown,
    /// Teardown finished. Bring-up may be restarted.
    ShutDown,
    /// A bring-up step failed. Nothing has been undone.
    BringupFailed,
}

impl core::fmt::Display for BringupState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::ClocksReady => write!(f, "ClocksReady"),
            Self::BusReady => write!(f, "BusReady"),
            Self::CodecClockLocked => write!(f, "CodecClockLocked"),
            Self::CodecConfigured => write!(f, "CodecConfigured"),
            Self::DemoRunning => write!(f, "DemoRunning"),
            Self::ShuttingDown => write!(f, "ShuttingDown"),
            Self::ShutDown => write!(f, "ShutDown"),
            Self::BringupFailed => write!(f, "BringupFailed"),
        }
    }
}

/// Successfully applied forward step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BringupStep {
    /// `HFCLK` observed running.
    CoreClockStarted,
    /// `HFCLKAUDIO` observed running.
    AudioClockStarted,
    /// I2S configured and started.
    BusStarted,
    /// Codec FLL enabled (lock not required).
    FllEnabled(FllId),
    /// Codec SYSCLK enabled.
    SystemClockEnabled,
    /// Routing table fully applied; output driver enabled.
    RoutingApplied,
}

impl BringupStep {
    const fn inverse(self) -> TeardownStep {
        match self {
            Self::CoreClockStarted => TeardownStep::CoreClockStopped,
            Self::AudioClockStarted => TeardownStep::AudioClockStopped,
            Self::BusStarted => TeardownStep::BusStopped,
            Self::FllEnabled(fll) => TeardownStep::FllDisabled(fll),
            Self::SystemClockEnabled => TeardownStep::SystemClockDisabled,
            Self::RoutingApplied => TeardownStep::OutputDisabled,
        }
    }
}

/// One teardown action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TeardownStep {
    /// Codec output driver disabled.
    OutputDisabled,
    /// Codec SYSCLK disabled.
    SystemClockDisabled,
    /// Codec FLL disabled.
    FllDisabled(FllId),
    /// I2S stopped and disabled.
    BusStopped,
    /// `HFCLKAUDIO` stopped.
    AudioClockStopped,
    /// `HFCLK` stopped.
    CoreClockStopped,
}

impl core::fmt::Display for TeardownStep {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutputDisabled => write!(f, "output disabled"),
            Self::SystemClockDisabled => write!(f, "SYSCLK disabled"),
            Self::FllDisabled(fll) => write!(f, "{fll} disabled"),
            Self::BusStopped => write!(f, "I2S stopped"),
            Self::AudioClockStopped => write!(f, "HFCLKAUDIO stopped"),
            Self::CoreClockStopped => write!(f, "HFCLK stopped"),
        }
    }
}

/// Transition log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transition {
    /// State entered.
    Entered(BringupState),
    /// Demo action applied.
    Demo(DemoAction),
    /// Teardown step attempted.
    Teardown(TeardownStep),
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Sequencer errors. The first failure wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequencerError {
    /// Clock domain failure.
    Clock(ClockError),
    /// I2S configuration failure.
    Bus(BusError),
    /// Codec bring-up failure.
    Codec(CodecError),
    /// Routing table stopped part way; earlier entries are applied.
    PartialApplication(CodecError),
    /// Demo action failure.
    Demo(CodecError),
    /// Operation not valid in this state.
    InvalidState(BringupState),
}

impl core::fmt::Display for SequencerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Clock(e) => write!(f, "Clock: {e}"),
            Self::Bus(e) => write!(f, "I2S: {e}"),
            Self::Codec(e) => write!(f, "Codec: {e}"),
            Self::PartialApplication(e) => write!(f, "Routing partially applied: {e}"),
            Self::Demo(e) => write!(f, "Demo: {e}"),
            Self::InvalidState(s) => write!(f, "Not valid in state {s}"),
        }
    }
}

impl From<ClockError> for SequencerError {
    fn from(e: ClockError) -> Self {
        Self::Clock(e)
    }
}

impl From<BusError> for SequencerError {
    fn from(e: BusError) -> Self {
        Self::Bus(e)
    }
}

impl From<CodecError> for SequencerError {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

/// Outcome of a teardown: steps attempted and those that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    steps: Vec<TeardownStep, MAX_STEPS>,
    failures: Vec<(TeardownStep, SequencerError), MAX_STEPS>,
}

impl TeardownReport {
    /// Steps attempted, in order.
    pub fn steps(&self) -> &[TeardownStep] {
        &self.steps
    }

    /// Failed steps and their errors.
    pub fn failures(&self) -> &[(TeardownStep, SequencerError)] {
        &self.failures
    }

    /// `true` when every step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ── Configuration ────────────────────────────────────────────────────────────

/// Sequencer settings.
#[derive(Debug, Clone, Copy)]
pub struct BringupConfig<'a> {
    /// Oscillator settings.
    pub clocks: ClockTreeConfig,
    /// I2S settings.
    pub bus: SerialBusConfig,
    /// Codec FLL driving SYSCLK.
    pub fll: FllId,
    /// FLL reference input (fed by the I2S MCK).
    pub reference: FllReference,
    /// FLL output frequency.
    pub fll_output_hz: u32,
    /// FLL lock poll budget.
    pub lock_poll: PollBudget,
    /// Codec routing register table.
    pub routing: RegisterConfigTable<'a>,
    /// Demo script.
    pub demo: DemoScript<'a>,
    /// Pause after each teardown step.
    pub settle: Duration,
}

impl BringupConfig<'static> {
    /// Audio DK with MCK bypassed from `HFCLKAUDIO` (48 kHz), all four mixer
    /// inputs at −21 dB.
    pub const fn audio_dk_bypass(buffer: BufferDescriptor) -> Self {
        Self::audio_dk(
            SerialBusConfig::audio_dk_bypass(buffer),
            RegisterConfigTable::new(&AUDIO_DK_ROUTING),
        )
    }

    /// Audio DK with MCK divided from the 32 MHz peripheral clock, PCM and
    /// tone at −15 dB.
    pub const fn audio_dk_derived(buffer: BufferDescriptor) -> Self {
        Self::audio_dk(
            SerialBusConfig::audio_dk_derived(buffer),
            RegisterConfigTable::new(&AUDIO_DK_DERIVED_ROUTING),
        )
    }

    /// Audio DK codec, clocks and demo around a custom bus setup and
    /// routing table.
    pub const fn audio_dk(bus: SerialBusConfig, routing: RegisterConfigTable<'static>) -> Self {
        Self {
            clocks: ClockTreeConfig::audio_dk(),
            bus,
            fll: FllId::Fll1,
            reference: FllReference::MasterClock1,
            fll_output_hz: 49_152_000,
            lock_poll: PollBudget::FLL_LOCK,
            routing,
            demo: DemoScript::DEFAULT,
            settle: Duration::from_millis(500),
        }
    }
}

// ── Sequencer ────────────────────────────────────────────────────────────────

/// Owns the clock tree, I2S, codec and delay, and runs the lifecycle.
pub struct BringupSequencer<'a, C, R, K, D> {
    clocks: ClockTree<C>,
    bus: I2sConfigurator<R>,
    codec: K,
    delay: D,
    config: BringupConfig<'a>,
    state: BringupState,
    applied: Vec<BringupStep, MAX_STEPS>,
    transitions: Vec<Transition, MAX_TRANSITIONS>,
}

impl<'a, C, R, K, D> BringupSequencer<'a, C, R, K, D>
where
    C: ClockPrimitive,
    R: I2sRegisters,
    K: CodecDevice,
    D: DelayNs,
{
    /// Assemble a sequencer. Nothing is touched until
    /// [`bring_up`](Self::bring_up).
    pub fn new(clock: C, i2s: R, codec: K, delay: D, config: BringupConfig<'a>) -> Self {
        Self {
            clocks: ClockTree::new(clock, config.clocks),
            bus: I2sConfigurator::new(i2s),
            codec,
            delay,
            config,
            state: BringupState::Uninitialized,
            applied: Vec::new(),
            transitions: Vec::new(),
        }
    }

    /// Current state.
    pub fn state(&self) -> BringupState {
        self.state
    }

    /// Transition log since the last [`bring_up`](Self::bring_up).
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Forward steps currently applied, oldest first.
    pub fn applied(&self) -> &[BringupStep] {
        &self.applied
    }

    /// Clock tree.
    pub fn clocks(&self) -> &ClockTree<C> {
        &self.clocks
    }

    /// I2S configurator.
    pub fn bus(&self) -> &I2sConfigurator<R> {
        &self.bus
    }

    /// Codec.
    pub fn codec(&self) -> &K {
        &self.codec
    }

    /// Delay provider.
    pub fn delay(&self) -> &D {
        &self.delay
    }

    /// Settings in use.
    pub fn config(&self) -> &BringupConfig<'a> {
        &self.config
    }

    /// Release every owned part.
    pub fn into_parts(self) -> (C, R, K, D) {
        (
            self.clocks.into_inner(),
            self.bus.into_inner(),
            self.codec,
            self.delay,
        )
    }

    fn enter(&mut self, state: BringupState) {
        self.state = state;
        self.log(Transition::Entered(state));
        info!("Bring-up state: {}", state);
    }

    fn log(&mut self, transition: Transition) {
        if self.transitions.push(transition).is_err() {
            warn!("Transition log full");
        }
    }

    fn push_step(&mut self, step: BringupStep) {
        // Capacity covers every step; a full stack means a step is pushed twice.
        if self.applied.push(step).is_err() {
            error!("Bring-up step stack full");
        }
    }

    fn fail(&mut self, error: SequencerError) -> SequencerError {
        error!("Bring-up failed in {}: {}", self.state, error);
        self.state = BringupState::BringupFailed;
        self.log(Transition::Entered(BringupState::BringupFailed));
        error
    }

    /// Run every forward step up to [`BringupState::CodecConfigured`].
    ///
    /// Valid from `Uninitialized` or `ShutDown`. On failure the state becomes
    /// `BringupFailed` and already applied steps stay applied.
    pub async fn bring_up(&mut self) -> Result<(), SequencerError> {
        match self.state {
            BringupState::Uninitialized | BringupState::ShutDown => {}
            other => return Err(SequencerError::InvalidState(other)),
        }
        self.transitions.clear();
        self.applied.clear();

        self.forward().await.map_err(|e| self.fail(e))
    }

    async fn forward(&mut self) -> Result<(), SequencerError> {
        // Clocks
        self.clocks
            .start_domain(ClockDomain::Hfclk, &mut self.delay)
            .await?;
        self.push_step(BringupStep::CoreClockStarted);
        self.clocks
            .start_domain(ClockDomain::HfclkAudio, &mut self.delay)
            .await?;
        self.push_step(BringupStep::AudioClockStarted);
        self.enter(BringupState::ClocksReady);

        // Bus
        let bus = self.config.bus;
        if !self.clocks.is_ready(bus.reference_domain()) {
            return Err(SequencerError::InvalidState(self.state));
        }
        self.bus.configure_and_start(&bus)?;
        self.push_step(BringupStep::BusStarted);
        self.enter(BringupState::BusReady);

        // Codec clocking
        let fll = self.config.fll;
        self.codec.open_communication().await?;
        self.codec
            .configure_fll(
                fll,
                self.config.reference,
                bus.master_clock_hz(),
                self.config.fll_output_hz,
            )
            .await?;
        self.codec.enable_fll(fll).await?;
        self.push_step(BringupStep::FllEnabled(fll));
        self.codec
            .wait_for_fll_lock(fll, self.config.lock_poll, &mut self.delay)
            .await?;
        self.codec.enable_system_clock().await?;
        self.push_step(BringupStep::SystemClockEnabled);
        self.enter(BringupState::CodecClockLocked);

        // Routing
        self.codec
            .apply_register_table(self.config.routing)
            .await
            .map_err(SequencerError::PartialApplication)?;
        self.push_step(BringupStep::RoutingApplied);
        self.enter(BringupState::CodecConfigured);
        Ok(())
    }

    /// Run the demo script. Valid from `CodecConfigured`.
    ///
    /// The first failing action aborts the script; the state stays
    /// `DemoRunning` so [`teardown`](Self::teardown) can follow.
    pub async fn run_demo(&mut self) -> Result<(), SequencerError> {
        if self.state != BringupState::CodecConfigured {
            return Err(SequencerError::InvalidState(self.state));
        }
        self.enter(BringupState::DemoRunning);

        let script = self.config.demo;
        hold(&mut self.delay, script.lead_in).await;
        for step in script.steps {
            info!("Demo: {}", step.action);
            step.action.apply(&mut self.codec).await.map_err(|e| {
                error!("Demo step '{}' failed: {}", step.action, e);
                SequencerError::Demo(e)
            })?;
            self.log(Transition::Demo(step.action));
            hold(&mut self.delay, step.dwell).await;
        }
        Ok(())
    }

    /// Undo every applied forward step in reverse order.
    ///
    /// Valid from any state between `ClocksReady` and `DemoRunning`, and from
    /// `BringupFailed`. Step failures are collected, never propagated; each
    /// step is followed by the settle delay. A clock domain whose readiness
    /// wait timed out is not an applied step, but its start request is
    /// cancelled first.
    pub async fn teardown(&mut self) -> Result<TeardownReport, SequencerError> {
        match self.state {
            BringupState::Uninitialized
            | BringupState::ShuttingDown
            | BringupState::ShutDown => return Err(SequencerError::InvalidState(self.state)),
            _ => {}
        }
        self.enter(BringupState::ShuttingDown);

        if let Err(e) = self.clocks.stop_pending(&mut self.delay).await {
            warn!("Teardown: pending clock start not cancelled: {}", e);
        }

        let mut report = TeardownReport::default();
        while let Some(applied) = self.applied.pop() {
            let step = applied.inverse();
            self.log(Transition::Teardown(step));
            let _ = report.steps.push(step);
            if let Err(e) = self.undo(step).await {
                warn!("Teardown: {} failed: {}", step, e);
                let _ = report.failures.push((step, e));
            } else {
                info!("Teardown: {}", step);
            }
            hold(&mut self.delay, self.config.settle).await;
        }

        self.enter(BringupState::ShutDown);
        Ok(report)
    }

    async fn undo(&mut self, step: TeardownStep) -> Result<(), SequencerError> {
        match step {
            TeardownStep::OutputDisabled => self.codec.disable_output_stage().await?,
            TeardownStep::SystemClockDisabled => self.codec.disable_system_clock().await?,
            TeardownStep::FllDisabled(fll) => self.codec.disable_fll(fll).await?,
            TeardownStep::BusStopped => self.bus.stop(),
            TeardownStep::AudioClockStopped => {
                self.clocks
                    .stop_domain(ClockDomain::HfclkAudio, &mut self.delay)
                    .await?;
            }
            TeardownStep::CoreClockStopped => {
                self.clocks
                    .stop_domain(ClockDomain::Hfclk, &mut self.delay)
                    .await?;
            }
        }
        Ok(())
    }

    /// Bring up, run the demo, tear down.
    ///
    /// A bring-up failure returns immediately with nothing undone. A demo
    /// failure still tears down and is then returned.
    pub async fn run(&mut self) -> Result<TeardownReport, SequencerError> {
        self.bring_up().await?;
        let demo = self.run_demo().await;
        let report = self.teardown().await?;
        demo.map(|()| report)
    }
}
