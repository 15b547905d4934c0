//! Audio subsystem: codec driver, mock, and test waveform
//!
//! # Structure
//!
//! - `cs47l63/`: CS47L63 codec (`Cs47l63` driver over SPI or any [`platform::RegisterBus`])
//! - `mock`: `MockCodec` for sequencer tests
//! - `waveform`: looping sine buffer streamed over I2S
//!
//! # Dependency Injection
//!
//! The sequencer targets the [`platform::CodecDevice`] trait.
//! Concrete types are injected at the call site:
//!
//! ```rust,ignore
//! // Hardware:
//! BringupSequencer::new(clocks, i2s, Cs47l63::new(SpiRegisterBus::new(spi)), delay, config);
//! // Tests:
//! BringupSequencer::new(clocks, i2s, MockCodec::new(), delay, config);
//! ```

pub mod cs47l63;
pub mod mock;
pub mod waveform;

pub use mock::MockCodec;
