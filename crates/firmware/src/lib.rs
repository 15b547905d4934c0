//! Audio DK bring-up firmware
//!
//! Brings up the nRF5340 Audio DK signal chain (SoC clocks, I2S master, and
//! the CS47L63 codec), runs a scripted mute / noise / tone demonstration, then
//! tears everything down in reverse dependency order.
//!
//! # Architecture
//!
//! ```text
//! BringupSequencer (bringup)          forward: clocks → bus → FLL → routing
//!         ↓                           reverse: routing → FLL → bus → clocks
//! ClockTree · I2sConfigurator · Cs47l63 (clocks, i2s, audio)
//!         ↓
//! Platform HAL traits (ClockPrimitive, I2sRegisters, RegisterBus)
//! ```
//!
//! # Features
//!
//! - `defmt` - Log through defmt (target builds)
//! - `tracing` - Log through tracing (desktop builds)
//! - `std` - Enable host mocks from the platform crate
//! - `emulator` - Desktop simulator binary (`audio_dk_sim`)
//!
//! # Examples
//!
//! ## Simulator
//!
//! ```bash
//! cargo run -p firmware --bin audio_dk_sim --features emulator -- --fast
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Critical correctness: deny these
#![deny(clippy::await_holding_lock)] // holding a blocking Mutex across .await is a bug
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline (allow println in tests via clippy.toml)
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
#![allow(async_fn_in_trait)] // Embassy no_std: single-threaded, Send bounds not needed
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]

#[macro_use]
mod fmt;

pub mod audio;
pub mod bringup;
pub mod clocks;
pub mod demo;
pub mod i2s;

// Re-export key types
pub use audio::cs47l63::{Cs47l63, SpiRegisterBus};
pub use audio::MockCodec;
pub use bringup::{
    BringupConfig, BringupSequencer, BringupState, BringupStep, SequencerError, TeardownReport,
    TeardownStep, Transition,
};
pub use clocks::{ClockTree, ClockTreeConfig};
pub use demo::{DemoAction, DemoScript, DemoStep};
pub use i2s::I2sConfigurator;
