// Desktop tooling binary: unwrap/expect acceptable outside embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::print_stdout)]
#![allow(missing_docs)]

//! Desktop simulator: runs bring-up, demo and teardown against host mocks
//! with real-time delays, logging through `tracing`.
//!
//! ```bash
//! cargo run -p firmware --bin audio_dk_sim --features emulator -- --dwell-ms 200
//! RUST_LOG=debug cargo run -p firmware --bin audio_dk_sim --features emulator -- --never-lock
//! ```

use anyhow::{anyhow, Result};
use clap::{Parser, ValueEnum};
use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use firmware::audio::cs47l63::registers::{DEVID, DEVID_CS47L63, FLL1_LOCK_STS, IRQ1_STS_6, REVID};
use firmware::audio::waveform::SINE_750HZ_48K;
use firmware::demo::AUDIO_DK_STEPS;
use firmware::{BringupConfig, BringupSequencer, Cs47l63, DemoScript, Transition};
use platform::i2s::BufferDescriptor;
use platform::mocks::{HwLog, MockClock, MockI2s, MockRegisterBus};
use platform::ClockDomain;
use tracing_subscriber::EnvFilter;

/// Codec writes issued before the routing table: FLL hold, CONTROL2,
/// CONTROL3, FLL enable, SYSCLK enable.
const PRE_TABLE_WRITES: usize = 5;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Topology {
    /// MCK bypassed from HFCLKAUDIO (48 kHz)
    Bypass,
    /// MCK divided from the 32 MHz peripheral clock (~41.7 kHz)
    Derived,
}

#[derive(Parser)]
#[command(name = "audio_dk_sim")]
#[command(about = "Audio DK bring-up / demo / teardown simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// Polls before each oscillator reports running
    #[arg(long, default_value_t = 3)]
    start_latency: u32,
    /// Status reads before the codec FLL reports lock
    #[arg(long, default_value_t = 5)]
    lock_polls: u32,
    /// FLL never locks (exercises the lock timeout)
    #[arg(long)]
    never_lock: bool,
    /// Fail the Nth routing table entry (1-based)
    #[arg(long)]
    fail_entry: Option<usize>,
    /// Dwell per demo step and lead-in, in ms (default: 2 s lead-in, 3 s steps)
    #[arg(long)]
    dwell_ms: Option<u64>,
    /// Settle after each teardown step, in ms
    #[arg(long, default_value_t = 500)]
    settle_ms: u64,
    /// MCK topology
    #[arg(long, value_enum, default_value_t = Topology::Bypass)]
    topology: Topology,
}

/// Real-time delay on the tokio timer.
struct TokioDelay;

impl DelayNs for TokioDelay {
    async fn delay_ns(&mut self, ns: u32) {
        tokio::time::sleep(std::time::Duration::from_nanos(u64::from(ns))).await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        tokio::time::sleep(std::time::Duration::from_millis(u64::from(ms))).await;
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut regs = MockRegisterBus::new();
    regs.preset(DEVID, DEVID_CS47L63).preset(REVID, 0xA1).status_bit(
        IRQ1_STS_6,
        FLL1_LOCK_STS,
        (!cli.never_lock).then_some(cli.lock_polls),
    );
    if let Some(entry) = cli.fail_entry {
        regs.fail_write_number(PRE_TABLE_WRITES + entry);
    }

    let log = HwLog::new();
    let clock = MockClock::new(log.clone())
        .with_start_latency(ClockDomain::Hfclk, cli.start_latency)
        .with_start_latency(ClockDomain::HfclkAudio, cli.start_latency);
    let i2s = MockI2s::gated(log.clone(), clock.probe(), ClockDomain::HfclkAudio);

    let buffer = BufferDescriptor::from_static(&SINE_750HZ_48K).map_err(|e| anyhow!("{e}"))?;
    let mut config = match cli.topology {
        Topology::Bypass => BringupConfig::audio_dk_bypass(buffer),
        Topology::Derived => BringupConfig::audio_dk_derived(buffer),
    };
    config.settle = Duration::from_millis(cli.settle_ms);

    let mut steps = AUDIO_DK_STEPS;
    if let Some(ms) = cli.dwell_ms {
        for step in &mut steps {
            step.dwell = Duration::from_millis(ms);
        }
        config.demo = DemoScript::new(Duration::from_millis(ms), &steps);
    } else {
        config.demo = DemoScript::new(DemoScript::DEFAULT.lead_in, &steps);
    }

    let mut seq = BringupSequencer::new(clock, i2s, Cs47l63::new(regs), TokioDelay, config);

    let outcome = match seq.bring_up().await {
        Ok(()) => {
            let demo = seq.run_demo().await;
            let report = seq.teardown().await.map_err(|e| anyhow!("{e}"))?;
            tracing::info!(
                "Teardown: {} steps, {} failures",
                report.steps().len(),
                report.failures().len()
            );
            demo.map_err(|e| anyhow!("{e}"))
        }
        Err(e) => {
            tracing::error!("Bring-up failed: {e}; unwinding");
            seq.teardown().await.map_err(|e| anyhow!("{e}"))?;
            Err(anyhow!("{e}"))
        }
    };

    for transition in seq.transitions() {
        match transition {
            Transition::Entered(state) => tracing::debug!("→ {state}"),
            Transition::Demo(action) => tracing::debug!("  demo: {action}"),
            Transition::Teardown(step) => tracing::debug!("  teardown: {step}"),
        }
    }
    tracing::info!(
        "{} hardware events, {} I2S writes while unclocked",
        log.events().len(),
        seq.bus().inner().unclocked_writes()
    );

    outcome
}
