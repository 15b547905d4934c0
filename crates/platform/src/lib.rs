//! Hardware Abstraction Layer (HAL) for the Audio DK signal chain
//!
//! This crate provides trait-based abstractions for every hardware block the
//! bring-up sequencer touches, enabling development and testing without the
//! development kit attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: bring-up / demo / teardown sequencer)
//!         ↓
//! Device drivers (firmware crate: clock tree, I2S configurator, CS47L63)
//!         ↓
//! Platform HAL (this crate - trait abstractions + domain types)
//!         ↓
//! Hardware Layer (SoC register access, SPI control port)
//! ```
//!
//! # Abstractions
//!
//! - [`ClockPrimitive`] - start/stop/poll the `HFCLK` and `HFCLKAUDIO` domains
//! - [`I2sRegisters`] - abstract field writes into the I2S peripheral
//! - [`RegisterBus`] - 32-bit codec register transport
//! - [`CodecDevice`] - codec clocking, routing and output control
//!
//! # Features
//!
//! - `std`: Enable host mocks ([`mocks`])
//! - `defmt`: Enable `defmt::Format` derives on all types
//!
//! # Example
//!
//! ```no_run
//! use platform::{ClockDomain, ClockPrimitive};
//!
//! fn kick<C: ClockPrimitive>(clock: &mut C) {
//!     clock.start(ClockDomain::HfclkAudio);
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors: callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed

pub mod clock;
pub mod codec;
pub mod i2s;
pub mod mixer;
pub mod poll;
pub mod register_table;

pub mod mocks;

// Re-export main traits
pub use clock::{ClockDomain, ClockError, ClockPrimitive, ClockState, ClockStatus};
pub use codec::{CodecDevice, CodecError, FllId, FllReference, FllState, Generator, RegisterBus};
pub use i2s::{BufferDescriptor, BusError, I2sField, I2sRegisters, I2sTask, SerialBusConfig};

// Re-export configuration types
pub use mixer::{MixVolume, MixerRoute, MixerSlot, MixerSource};
pub use poll::PollBudget;
pub use register_table::{RegisterConfigEntry, RegisterConfigTable};
