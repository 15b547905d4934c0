//! CS47L63 audio codec (Cirrus Logic)
//!
//! - `registers`: register map subset
//! - `fll`: FLL ratio calculation
//! - `routing`: ASP1 / mixer / output register table
//! - `driver`: [`Cs47l63`], generic over [`platform::RegisterBus`]
//! - `spi`: [`SpiRegisterBus`], the SPI control-port framing

pub mod fll;
pub mod registers;
pub mod routing;

mod driver;
mod spi;

pub use driver::Cs47l63;
pub use routing::{Routing, AUDIO_DK_DERIVED_ROUTING, AUDIO_DK_ROUTING};
pub use spi::SpiRegisterBus;
