//! CS47L63 register map (subset used for bring-up, routing and demo control)
//!
//! Source: Cirrus Logic CS47L63 Datasheet DS1249F1, §5 Register Map
//!
//! # Key Control-Port Constraints
//!
//! ## 32-bit registers, 32-bit addresses
//! Every register is 32 bits wide and register addresses are byte addresses
//! spaced by 4. The SPI frame is `address (4 bytes, MSB first, bit 31 = read)`
//! + `padding (4 bytes)` + `data (4 bytes, MSB first)`.
//!
//! ## Volume update strobe
//! Output volume and mute only take effect when `OUT_VU` is written as 1 in
//! the same write. A mute/unmute written without it is latched but silent.
//!
//! ## FLL reconfiguration
//! The FLL ratio registers are shadowed. New values are only applied on a
//! write with `FLLn_CTRL_UPD` set; `FLLn_HOLD` freezes the loop meanwhile.

// ---------------------------------------------------------------------------
// Register addresses
// ---------------------------------------------------------------------------

/// Device ID (read-only).
pub const DEVID: u32 = 0x0000;

/// Revision ID (read-only). Bits 7:4 = area revision, 3:0 = metal revision.
pub const REVID: u32 = 0x0004;

/// System clock control: SYSCLK enable, source, frequency.
pub const SYSTEM_CLOCK1: u32 = 0x1400;

/// FLL1 control block base (`FLL1_CONTROL1`).
pub const FLL1_CONTROL1: u32 = 0x1C00;

/// FLL1 control 2: reference source, divider, integer multiplier.
pub const FLL1_CONTROL2: u32 = 0x1C04;

/// FLL1 control 3: fractional multiplier `THETA / LAMBDA`.
pub const FLL1_CONTROL3: u32 = 0x1C08;

/// FLL2 control block base (`FLL2_CONTROL1`).
pub const FLL2_CONTROL1: u32 = 0x1C80;

/// Offset of `FLLn_CONTROL2` from the block base.
pub const FLL_CONTROL2_OFFSET: u32 = 0x04;

/// Offset of `FLLn_CONTROL3` from the block base.
pub const FLL_CONTROL3_OFFSET: u32 = 0x08;

/// Raw (unlatched) interrupt status 6: FLL lock status bits.
pub const IRQ1_STS_6: u32 = 0x0001_8028;

/// Output enable: OUT1L driver.
pub const OUTPUT_ENABLE_1: u32 = 0x4804;

/// OUT1L digital volume: volume, mute, update strobe.
pub const OUT1L_VOLUME_1: u32 = 0x4808;

/// ASP1 enables: RX/TX channel enables.
pub const ASP1_ENABLES1: u32 = 0x6000;

/// ASP1 control 2: slot widths, format, clock master/inversion.
pub const ASP1_CONTROL2: u32 = 0x6008;

/// ASP1 control 3: DOUT tri-state control.
pub const ASP1_CONTROL3: u32 = 0x600C;

/// OUT1L mixer input 1. Inputs 2–4 follow at 4-byte spacing.
pub const OUT1L_INPUT1: u32 = 0x8B00;

/// OUT1L mixer input 2.
pub const OUT1L_INPUT2: u32 = 0x8B04;

/// OUT1L mixer input 3.
pub const OUT1L_INPUT3: u32 = 0x8B08;

/// OUT1L mixer input 4.
pub const OUT1L_INPUT4: u32 = 0x8B0C;

/// Tone generator 1 control.
pub const TONE_GENERATOR1: u32 = 0x0001_3000;

/// Comfort noise generator control: enable + gain.
pub const COMFORT_NOISE_GENERATOR: u32 = 0x0001_3800;

// ---------------------------------------------------------------------------
// Register field values
// ---------------------------------------------------------------------------

/// `DEVID` value of the CS47L63.
pub const DEVID_CS47L63: u32 = 0x0004_7A63;

/// `SYSTEM_CLOCK1.SYSCLK_EN`
pub const SYSCLK_EN: u32 = 1 << 6;

/// `FLLn_CONTROL1.FLLn_EN`
pub const FLL_EN: u32 = 1 << 0;

/// `FLLn_CONTROL1.FLLn_HOLD`: freeze the loop while reprogramming.
pub const FLL_HOLD: u32 = 1 << 1;

/// `FLLn_CONTROL1.FLLn_CTRL_UPD`: apply shadowed ratio registers.
pub const FLL_CTRL_UPD: u32 = 1 << 2;

/// `FLLn_CONTROL2.FLLn_REFCLK_SRC` shift (bits 27:24).
pub const FLL_REFCLK_SRC_SHIFT: u32 = 24;

/// `FLLn_CONTROL2.FLLn_REFCLK_DIV` shift (bits 17:16, 0..=3 → ÷1/2/4/8).
pub const FLL_REFCLK_DIV_SHIFT: u32 = 16;

/// `FLLn_CONTROL2.FLLn_N` mask (bits 9:0).
pub const FLL_N_MASK: u32 = 0x3FF;

/// `FLLn_CONTROL3.FLLn_LAMBDA` shift (bits 31:16).
pub const FLL_LAMBDA_SHIFT: u32 = 16;

/// FLL reference: MCLK1 pin.
pub const FLL_SRC_MCLK1: u32 = 0x0;

/// FLL reference: MCLK2 pin.
pub const FLL_SRC_MCLK2: u32 = 0x1;

/// FLL reference: ASP1 BCLK.
pub const FLL_SRC_ASP1_BCLK: u32 = 0x8;

/// `IRQ1_STS_6.FLL1_LOCK_STS1`
pub const FLL1_LOCK_STS: u32 = 1 << 15;

/// `IRQ1_STS_6.FLL2_LOCK_STS1`
pub const FLL2_LOCK_STS: u32 = 1 << 19;

/// `OUTPUT_ENABLE_1.OUT1L_EN`
pub const OUT1L_EN: u32 = 1 << 1;

/// `OUT1L_VOLUME_1.OUT_VU`: volume update strobe.
pub const OUT_VU: u32 = 1 << 9;

/// `OUT1L_VOLUME_1.OUT1L_MUTE`
pub const OUT1L_MUTE: u32 = 1 << 8;

/// `OUT1L_VOLUME_1.OUT1L_VOL` mask (bits 7:0).
pub const OUT1L_VOL_MASK: u32 = 0xFF;

/// `ASP1_ENABLES1.ASP1_RX1_EN`
pub const ASP1_RX1_EN: u32 = 1 << 16;

/// `ASP1_ENABLES1.ASP1_RX2_EN`
pub const ASP1_RX2_EN: u32 = 1 << 17;

/// `ASP1_CONTROL2.ASP1_RX_WIDTH` shift (bits 31:24, slot width in bits).
pub const ASP1_RX_WIDTH_SHIFT: u32 = 24;

/// `ASP1_CONTROL2.ASP1_TX_WIDTH` shift (bits 23:16, slot width in bits).
pub const ASP1_TX_WIDTH_SHIFT: u32 = 16;

/// `ASP1_CONTROL2.ASP1_FMT` shift (bits 10:8).
pub const ASP1_FMT_SHIFT: u32 = 8;

/// `ASP1_CONTROL2.ASP1_BCLK_MSTR`: codec drives BCLK.
pub const ASP1_BCLK_MSTR: u32 = 1 << 4;

/// `ASP1_CONTROL2.ASP1_FSYNC_MSTR`: codec drives FSYNC.
pub const ASP1_FSYNC_MSTR: u32 = 1 << 0;

/// `ASP1_CONTROL3.ASP1_DOUT_HIZ_CTRL` shift (bits 1:0).
pub const ASP1_DOUT_HIZ_CTRL_SHIFT: u32 = 0;

/// `OUT1L_INPUTn.OUT1LMIX_VOLn` shift (bits 22:16, `code = dB + 64`).
pub const OUT1L_MIX_VOL_SHIFT: u32 = 16;

/// `TONE_GENERATOR1.TONE1_EN`
pub const TONE1_EN: u32 = 1 << 0;

/// `COMFORT_NOISE_GENERATOR.NOISE_GEN_EN`
pub const NOISE_GEN_EN: u32 = 1 << 5;

/// `COMFORT_NOISE_GENERATOR.NOISE_GEN_GAIN` mask (bits 4:0, 6 dB steps).
pub const NOISE_GEN_GAIN_MASK: u32 = 0x1F;

/// Noise generator gain code for 0 dB (reset value 0x00 is −114 dB).
pub const NOISE_GEN_GAIN_0DB: u32 = 0x13;

// ---------------------------------------------------------------------------
// Mixer source codes (`OUT1L_SRCn`)
// ---------------------------------------------------------------------------

/// Slot unused.
pub const SRC_NONE: u32 = 0x00;

/// Comfort noise generator.
pub const SRC_NOISE_GEN: u32 = 0x04;

/// Tone generator 1.
pub const SRC_TONE1_GEN: u32 = 0x0C;

/// ASP1 RX channel 1.
pub const SRC_ASP1_RX1: u32 = 0x20;

/// ASP1 RX channel 2.
pub const SRC_ASP1_RX2: u32 = 0x21;
