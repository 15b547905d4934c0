//! Integration test: bring-up failure points and their teardown.
//!
//! Tests that:
//!   1. An FLL that never locks times out after exactly `max_attempts` status
//!      reads and `max_attempts × interval` of delay
//!   2. A routing table write failure stops the table at that entry and is
//!      reported as a partial application
//!   3. Oscillator failures stop bring-up before the I2S is touched, and a
//!      start that never completed is still cancelled at teardown
//!   4. For every failure point, teardown is the exact reverse of the steps
//!      that had succeeded
//!
//! Run with: cargo test -p firmware --test integration_failures

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use firmware::audio::cs47l63::registers::{
    DEVID, DEVID_CS47L63, FLL1_LOCK_STS, IRQ1_STS_6, REVID, SYSTEM_CLOCK1,
};
use firmware::audio::cs47l63::AUDIO_DK_ROUTING;
use firmware::audio::mock::CodecOp;
use firmware::audio::waveform::SINE_750HZ_48K;
use firmware::{
    BringupConfig, BringupSequencer, BringupState, BringupStep, Cs47l63, MockCodec,
    SequencerError, TeardownStep,
};
use platform::i2s::BufferDescriptor;
use platform::mocks::{HwEvent, HwLog, MockClock, MockDelay, MockI2s, MockRegisterBus};
use platform::{ClockDomain, ClockError, ClockState, CodecError, FllId, PollBudget};

/// Codec writes before the routing table: FLL hold, CONTROL2, CONTROL3,
/// FLL enable, SYSCLK enable.
const PRE_TABLE_WRITES: usize = 5;

fn config() -> BringupConfig<'static> {
    BringupConfig::audio_dk_bypass(BufferDescriptor::from_static(&SINE_750HZ_48K).unwrap())
}

fn codec_bus(lock_after: Option<u32>) -> MockRegisterBus {
    let mut bus = MockRegisterBus::new();
    bus.preset(DEVID, DEVID_CS47L63)
        .preset(REVID, 0x01)
        .status_bit(IRQ1_STS_6, FLL1_LOCK_STS, lock_after);
    bus
}

fn with_codec<K: platform::CodecDevice>(
    clock: MockClock,
    log: &HwLog,
    codec: K,
) -> BringupSequencer<'static, MockClock, MockI2s, K, MockDelay> {
    let i2s = MockI2s::gated(log.clone(), clock.probe(), ClockDomain::HfclkAudio);
    BringupSequencer::new(clock, i2s, codec, MockDelay::new(), config())
}

// -- Scenario B: FLL never locks -------------------------------------------

#[tokio::test]
async fn fll_lock_timeout_is_bounded() {
    let log = HwLog::new();
    let codec = Cs47l63::new(codec_bus(None));
    let mut seq = with_codec(MockClock::new(log.clone()), &log, codec);

    assert_eq!(
        seq.bring_up().await,
        Err(SequencerError::Codec(CodecError::LockTimeout))
    );
    assert_eq!(seq.state(), BringupState::BringupFailed);

    let budget = PollBudget::FLL_LOCK;
    assert_eq!(
        seq.codec().bus().reads_of(IRQ1_STS_6),
        budget.max_attempts as usize
    );
    assert_eq!(
        seq.delay().total_ns(),
        budget.worst_case().as_micros() * 1_000
    );
    assert!(seq.codec().bus().writes_to(SYSTEM_CLOCK1).is_empty());

    let report = seq.teardown().await.unwrap();
    assert!(report.is_clean());
    assert_eq!(
        report.steps(),
        [
            TeardownStep::FllDisabled(FllId::Fll1),
            TeardownStep::BusStopped,
            TeardownStep::AudioClockStopped,
            TeardownStep::CoreClockStopped,
        ]
    );
    assert_eq!(seq.state(), BringupState::ShutDown);
}

// -- Scenario C: routing table entry 3 fails -------------------------------

#[tokio::test]
async fn routing_entry_failure_is_partial_application() {
    let log = HwLog::new();
    let mut bus = codec_bus(Some(0));
    bus.fail_write_number(PRE_TABLE_WRITES + 3);
    let mut seq = with_codec(MockClock::new(log.clone()), &log, Cs47l63::new(bus));

    assert_eq!(
        seq.bring_up().await,
        Err(SequencerError::PartialApplication(CodecError::TransportFailed))
    );
    assert_eq!(seq.state(), BringupState::BringupFailed);

    let writes = seq.codec().bus().writes();
    let table_writes = &writes[PRE_TABLE_WRITES..];
    let expected: Vec<(u32, u32)> = AUDIO_DK_ROUTING[..2]
        .iter()
        .map(|e| (e.address, e.value))
        .collect();
    assert_eq!(table_writes, &expected[..]);
    for entry in &AUDIO_DK_ROUTING[2..] {
        assert!(
            seq.codec().bus().writes_to(entry.address).is_empty(),
            "entry at {:#x} must not be written",
            entry.address
        );
    }

    let report = seq.teardown().await.unwrap();
    assert_eq!(
        report.steps(),
        [
            TeardownStep::SystemClockDisabled,
            TeardownStep::FllDisabled(FllId::Fll1),
            TeardownStep::BusStopped,
            TeardownStep::AudioClockStopped,
            TeardownStep::CoreClockStopped,
        ]
    );
}

// -- Clock failures ----------------------------------------------------------

#[tokio::test]
async fn audio_clock_timeout_stops_before_i2s() {
    let log = HwLog::new();
    let clock = MockClock::new(log.clone()).never_starts(ClockDomain::HfclkAudio);
    let mut seq = with_codec(clock, &log, MockCodec::new());

    assert_eq!(
        seq.bring_up().await,
        Err(SequencerError::Clock(ClockError::ReadyTimeout(
            ClockDomain::HfclkAudio
        )))
    );
    assert!(seq.bus().inner().fields().is_empty());
    assert!(seq.codec().calls().is_empty());
    assert_eq!(seq.applied(), [BringupStep::CoreClockStarted]);

    let report = seq.teardown().await.unwrap();
    assert_eq!(report.steps(), [TeardownStep::CoreClockStopped]);

    // The audio start was requested, so it is cancelled before HFCLK stops.
    assert_eq!(
        seq.clocks().state(ClockDomain::HfclkAudio),
        ClockState::Stopped
    );
    let audio_stop = log
        .position(|e| *e == HwEvent::ClockStop(ClockDomain::HfclkAudio))
        .unwrap();
    let core_stop = log
        .position(|e| *e == HwEvent::ClockStop(ClockDomain::Hfclk))
        .unwrap();
    assert!(audio_stop < core_stop);
}

#[tokio::test]
async fn rejected_divider_starts_nothing() {
    let log = HwLog::new();
    let clock = MockClock::new(log.clone()).with_divider_status(0x0BAD);
    let mut seq = with_codec(clock, &log, MockCodec::new());

    assert_eq!(
        seq.bring_up().await,
        Err(SequencerError::Clock(ClockError::ConfigurationFailed(0x0BAD)))
    );
    assert!(log
        .position(|e| matches!(e, HwEvent::ClockStart(_)))
        .is_none());

    let report = seq.teardown().await.unwrap();
    assert!(report.steps().is_empty());
}

#[tokio::test]
async fn wrong_device_id_fails_open() {
    let log = HwLog::new();
    let mut bus = MockRegisterBus::new();
    bus.preset(DEVID, 0x0004_8A63);
    let mut seq = with_codec(MockClock::new(log.clone()), &log, Cs47l63::new(bus));

    assert_eq!(
        seq.bring_up().await,
        Err(SequencerError::Codec(CodecError::UnexpectedDevice {
            id: 0x0004_8A63
        }))
    );
    assert!(seq.codec().bus().writes().is_empty());
}

// -- Teardown mirrors every failure point ----------------------------------

#[tokio::test]
async fn teardown_reverses_applied_steps_at_every_failure_point() {
    use TeardownStep::{
        AudioClockStopped, BusStopped, CoreClockStopped, FllDisabled, SystemClockDisabled,
    };

    let base = [BusStopped, AudioClockStopped, CoreClockStopped];
    let cases: [(CodecOp, &[TeardownStep]); 6] = [
        (CodecOp::Open, &base),
        (CodecOp::ConfigureFll, &base),
        (CodecOp::EnableFll, &base),
        (
            CodecOp::WaitForLock,
            &[FllDisabled(FllId::Fll1), BusStopped, AudioClockStopped, CoreClockStopped],
        ),
        (
            CodecOp::EnableSystemClock,
            &[FllDisabled(FllId::Fll1), BusStopped, AudioClockStopped, CoreClockStopped],
        ),
        (
            CodecOp::ApplyTable,
            &[
                SystemClockDisabled,
                FllDisabled(FllId::Fll1),
                BusStopped,
                AudioClockStopped,
                CoreClockStopped,
            ],
        ),
    ];

    for (op, expected) in cases {
        let log = HwLog::new();
        let (codec, error) = match op {
            CodecOp::WaitForLock => (MockCodec::new().never_locks(), CodecError::LockTimeout),
            _ => (
                MockCodec::new().fail_on(op, CodecError::TransportFailed),
                CodecError::TransportFailed,
            ),
        };
        let mut seq = with_codec(MockClock::new(log.clone()), &log, codec);

        let err = seq.bring_up().await.unwrap_err();
        let expected_err = if op == CodecOp::ApplyTable {
            SequencerError::PartialApplication(error)
        } else {
            SequencerError::Codec(error)
        };
        assert_eq!(err, expected_err, "failure at {op:?}");
        assert_eq!(seq.codec().ops().last(), Some(op), "failure at {op:?}");
        let applied: Vec<TeardownStep> = seq
            .applied()
            .iter()
            .rev()
            .map(|step| match step {
                BringupStep::CoreClockStarted => CoreClockStopped,
                BringupStep::AudioClockStarted => AudioClockStopped,
                BringupStep::BusStarted => BusStopped,
                BringupStep::FllEnabled(fll) => FllDisabled(*fll),
                BringupStep::SystemClockEnabled => SystemClockDisabled,
                BringupStep::RoutingApplied => TeardownStep::OutputDisabled,
            })
            .collect();

        let report = seq.teardown().await.unwrap();
        assert_eq!(report.steps(), expected, "failure at {op:?}");
        assert_eq!(report.steps(), &applied[..], "failure at {op:?}");
        assert!(report.is_clean(), "failure at {op:?}");
        assert_eq!(seq.bus().inner().unclocked_writes(), 0);
        assert!(!seq.codec().system_clock);
    }
}
