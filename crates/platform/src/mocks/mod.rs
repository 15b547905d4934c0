//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits for use
//! in unit and integration tests and in the desktop simulator.
//!
//! Clock and I2S mocks share a [`HwLog`] so tests can assert on the global
//! ordering of hardware operations (e.g. no I2S write before the audio clock
//! is observed running).

#![cfg(any(test, feature = "std"))]

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal_async::delay::DelayNs;

use crate::clock::{ClockDomain, ClockPrimitive, ClockStatus, HfclkAudioFreq, HfclkDivider};
use crate::codec::{CodecError, RegisterBus};
use crate::i2s::{I2sField, I2sRegisters, I2sTask};

// ── Shared hardware event log ────────────────────────────────────────────────

/// One observable hardware operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwEvent {
    /// HFCLK divider programmed.
    ClockDivider(ClockDomain, HfclkDivider),
    /// Oscillator frequency selector programmed.
    ClockFrequency(ClockDomain, HfclkAudioFreq),
    /// Oscillator start task triggered.
    ClockStart(ClockDomain),
    /// Oscillator stop task triggered.
    ClockStop(ClockDomain),
    /// I2S configuration field written.
    I2s(I2sField),
    /// I2S task triggered.
    I2sTask(I2sTask),
}

/// Shared, ordered log of [`HwEvent`]s.
#[derive(Debug, Clone, Default)]
pub struct HwLog(Rc<RefCell<Vec<HwEvent>>>);

impl HwLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: HwEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of all events so far.
    pub fn events(&self) -> Vec<HwEvent> {
        self.0.borrow().clone()
    }

    /// Index of the first event matching `pred`.
    pub fn position(&self, pred: impl Fn(&HwEvent) -> bool) -> Option<usize> {
        self.0.borrow().iter().position(pred)
    }
}

// ── Clock ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
struct DomainModel {
    running: bool,
    /// Remaining `is_running` polls before a pending start/stop takes effect.
    pending: Option<u32>,
    start_latency: u32,
    stop_latency: u32,
    never_starts: bool,
    polls: u32,
}

#[derive(Debug, Default)]
struct ClockModel {
    hfclk: DomainModel,
    hfclk_audio: DomainModel,
}

impl ClockModel {
    fn domain(&mut self, domain: ClockDomain) -> &mut DomainModel {
        match domain {
            ClockDomain::Hfclk => &mut self.hfclk,
            ClockDomain::HfclkAudio => &mut self.hfclk_audio,
        }
    }
}

/// Mock CLOCK peripheral.
///
/// A started domain reports running only after `start_latency` unsuccessful
/// polls; a stopped one keeps reporting running for `stop_latency` polls.
#[derive(Debug, Default)]
pub struct MockClock {
    model: Rc<RefCell<ClockModel>>,
    log: HwLog,
    divider_status: Option<u32>,
}

impl MockClock {
    /// Create a clock whose domains start on the first poll.
    pub fn new(log: HwLog) -> Self {
        Self {
            model: Rc::default(),
            log,
            divider_status: None,
        }
    }

    /// Number of `false` polls after a start before `domain` reports running.
    pub fn with_start_latency(self, domain: ClockDomain, polls: u32) -> Self {
        self.model.borrow_mut().domain(domain).start_latency = polls;
        self
    }

    /// Number of `true` polls after a stop before `domain` reports stopped.
    pub fn with_stop_latency(self, domain: ClockDomain, polls: u32) -> Self {
        self.model.borrow_mut().domain(domain).stop_latency = polls;
        self
    }

    /// `domain` never reports running.
    pub fn never_starts(self, domain: ClockDomain) -> Self {
        self.model.borrow_mut().domain(domain).never_starts = true;
        self
    }

    /// `set_divider` returns `status` instead of succeeding.
    pub fn with_divider_status(mut self, status: u32) -> Self {
        self.divider_status = Some(status);
        self
    }

    /// Read-only view of the domain states, for other mocks.
    pub fn probe(&self) -> ClockProbe {
        ClockProbe(Rc::clone(&self.model))
    }

    /// Number of `is_running` polls issued for `domain`.
    pub fn polls(&self, domain: ClockDomain) -> u32 {
        self.model.borrow_mut().domain(domain).polls
    }
}

impl ClockPrimitive for MockClock {
    fn set_divider(
        &mut self,
        domain: ClockDomain,
        divider: HfclkDivider,
    ) -> Result<(), ClockStatus> {
        if let Some(status) = self.divider_status {
            return Err(ClockStatus(status));
        }
        self.log.push(HwEvent::ClockDivider(domain, divider));
        Ok(())
    }

    fn set_frequency_selector(&mut self, domain: ClockDomain, freq: HfclkAudioFreq) {
        self.log.push(HwEvent::ClockFrequency(domain, freq));
    }

    fn start(&mut self, domain: ClockDomain) {
        self.log.push(HwEvent::ClockStart(domain));
        let mut model = self.model.borrow_mut();
        let d = model.domain(domain);
        d.pending = (!d.running).then_some(d.start_latency);
    }

    fn stop(&mut self, domain: ClockDomain) {
        self.log.push(HwEvent::ClockStop(domain));
        let mut model = self.model.borrow_mut();
        let d = model.domain(domain);
        d.pending = d.running.then_some(d.stop_latency);
    }

    fn is_running(&mut self, domain: ClockDomain) -> bool {
        let mut model = self.model.borrow_mut();
        let d = model.domain(domain);
        d.polls = d.polls.saturating_add(1);
        match d.pending {
            Some(0) => {
                if d.running || !d.never_starts {
                    d.running = !d.running;
                    d.pending = None;
                }
            }
            Some(n) => d.pending = Some(n.saturating_sub(1)),
            None => {}
        }
        d.running
    }
}

/// Shared read-only view of [`MockClock`] state.
#[derive(Debug, Clone)]
pub struct ClockProbe(Rc<RefCell<ClockModel>>);

impl ClockProbe {
    /// Whether `domain` has been observed running.
    pub fn is_running(&self, domain: ClockDomain) -> bool {
        self.0.borrow_mut().domain(domain).running
    }
}

// ── I2S ──────────────────────────────────────────────────────────────────────

/// Mock I2S peripheral.
///
/// Records every field write and task trigger. When constructed with a
/// [`ClockProbe`], counts writes issued while the gating domain is stopped.
#[derive(Debug, Default)]
pub struct MockI2s {
    log: HwLog,
    gate: Option<(ClockProbe, ClockDomain)>,
    fields: Vec<I2sField>,
    tasks: Vec<I2sTask>,
    unclocked_writes: usize,
}

impl MockI2s {
    /// Create a mock that does not check its clock.
    pub fn new(log: HwLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Create a mock that counts writes made while `domain` is not running.
    pub fn gated(log: HwLog, probe: ClockProbe, domain: ClockDomain) -> Self {
        Self {
            log,
            gate: Some((probe, domain)),
            ..Self::default()
        }
    }

    /// All fields written, in order.
    pub fn fields(&self) -> &[I2sField] {
        &self.fields
    }

    /// All tasks triggered, in order.
    pub fn tasks(&self) -> &[I2sTask] {
        &self.tasks
    }

    /// Writes or triggers issued while the gating clock was stopped.
    pub fn unclocked_writes(&self) -> usize {
        self.unclocked_writes
    }

    /// Peripheral is enabled and the last task was `Start`.
    pub fn is_streaming(&self) -> bool {
        let enabled = self
            .fields
            .iter()
            .rev()
            .find_map(|f| match f {
                I2sField::Enable(on) => Some(*on),
                _ => None,
            })
            .unwrap_or(false);
        enabled && self.tasks.last() == Some(&I2sTask::Start)
    }

    fn check_clock(&mut self) {
        if let Some((probe, domain)) = &self.gate {
            if !probe.is_running(*domain) {
                self.unclocked_writes = self.unclocked_writes.saturating_add(1);
            }
        }
    }
}

impl I2sRegisters for MockI2s {
    fn write(&mut self, field: I2sField) {
        self.check_clock();
        self.log.push(HwEvent::I2s(field));
        self.fields.push(field);
    }

    fn trigger(&mut self, task: I2sTask) {
        self.check_clock();
        self.log.push(HwEvent::I2sTask(task));
        self.tasks.push(task);
    }
}

// ── Codec register bus ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
struct StatusBit {
    address: u32,
    mask: u32,
    /// Reads of `address` before the bit asserts; `None` never asserts.
    after_reads: Option<u32>,
}

/// Mock 32-bit register bus with a backing register file.
#[derive(Debug, Default)]
pub struct MockRegisterBus {
    registers: BTreeMap<u32, u32>,
    writes: Vec<(u32, u32)>,
    reads: Vec<u32>,
    write_attempts: usize,
    fail_write: Option<usize>,
    fail_reads: bool,
    status_bits: Vec<StatusBit>,
}

impl MockRegisterBus {
    /// Create a bus with every register reading zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Preload a register value (not recorded as a write).
    pub fn preset(&mut self, address: u32, value: u32) -> &mut Self {
        self.registers.insert(address, value);
        self
    }

    /// The `n`th write attempt (1-based) fails with
    /// [`CodecError::TransportFailed`] and is not applied.
    pub fn fail_write_number(&mut self, n: usize) -> &mut Self {
        self.fail_write = Some(n);
        self
    }

    /// Every read fails with [`CodecError::TransportFailed`].
    pub fn fail_reads(&mut self) -> &mut Self {
        self.fail_reads = true;
        self
    }

    /// Bits `mask` of `address` read as set once `address` has been read
    /// `after_reads` times. `None` keeps them clear forever.
    pub fn status_bit(&mut self, address: u32, mask: u32, after_reads: Option<u32>) -> &mut Self {
        self.status_bits.push(StatusBit {
            address,
            mask,
            after_reads,
        });
        self
    }

    /// Successful writes, in order.
    pub fn writes(&self) -> &[(u32, u32)] {
        &self.writes
    }

    /// Values written to `address`, in order.
    pub fn writes_to(&self, address: u32) -> Vec<u32> {
        self.writes
            .iter()
            .filter(|(a, _)| *a == address)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Number of reads of `address`.
    pub fn reads_of(&self, address: u32) -> usize {
        self.reads.iter().filter(|a| **a == address).count()
    }

    /// Current value of `address`.
    pub fn register(&self, address: u32) -> u32 {
        self.registers.get(&address).copied().unwrap_or(0)
    }
}

impl RegisterBus for MockRegisterBus {
    async fn write_register(&mut self, address: u32, value: u32) -> Result<(), CodecError> {
        self.write_attempts = self.write_attempts.saturating_add(1);
        if self.fail_write == Some(self.write_attempts) {
            return Err(CodecError::TransportFailed);
        }
        self.registers.insert(address, value);
        self.writes.push((address, value));
        Ok(())
    }

    async fn read_register(&mut self, address: u32) -> Result<u32, CodecError> {
        if self.fail_reads {
            return Err(CodecError::TransportFailed);
        }
        let prior_reads = self.reads_of(address);
        self.reads.push(address);
        let mut value = self.register(address);
        for bit in self.status_bits.iter().filter(|b| b.address == address) {
            let asserted = bit
                .after_reads
                .is_some_and(|n| prior_reads >= n as usize);
            if asserted {
                value |= bit.mask;
            } else {
                value &= !bit.mask;
            }
        }
        Ok(value)
    }
}

// ── Delay ────────────────────────────────────────────────────────────────────

/// Delay provider that returns immediately and accumulates requested time.
#[derive(Debug, Default, Clone)]
pub struct MockDelay {
    total_ns: u64,
    calls: usize,
}

impl MockDelay {
    /// Create a delay with nothing accumulated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total requested delay in nanoseconds.
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }

    /// Total requested delay in milliseconds.
    pub fn total_ms(&self) -> u64 {
        self.total_ns / 1_000_000
    }

    /// Number of delay requests.
    pub fn calls(&self) -> usize {
        self.calls
    }
}

impl DelayNs for MockDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.total_ns = self.total_ns.saturating_add(u64::from(ns));
        self.calls = self.calls.saturating_add(1);
    }

    async fn delay_us(&mut self, us: u32) {
        self.total_ns = self
            .total_ns
            .saturating_add(u64::from(us).saturating_mul(1_000));
        self.calls = self.calls.saturating_add(1);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.total_ns = self
            .total_ns
            .saturating_add(u64::from(ms).saturating_mul(1_000_000));
        self.calls = self.calls.saturating_add(1);
    }
}
