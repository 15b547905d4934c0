//! Property tests for the CS47L63 FLL ratio search.
//!
//! Run with: cargo test -p firmware --test fll_proptest

#![allow(
    clippy::unwrap_used,
    clippy::arithmetic_side_effects,
    clippy::cast_possible_truncation
)]

use firmware::audio::cs47l63::fll::{FllRatio, MAX_DIVIDED_REF_HZ, MAX_N};
use proptest::prelude::*;

const SYSCLK_HZ: u32 = 49_152_000;

proptest! {
    /// Every accepted ratio reproduces the requested output exactly and
    /// respects the loop limits.
    #[test]
    fn accepted_ratios_are_exact(input_hz in 1_000_000u32..=108_000_000) {
        if let Ok(r) = FllRatio::compute(input_hz, SYSCLK_HZ) {
            prop_assert_eq!(r.output_hz(input_hz), u64::from(SYSCLK_HZ));
            prop_assert!(r.refclk_div <= 3);
            prop_assert!(input_hz >> r.refclk_div <= MAX_DIVIDED_REF_HZ);
            prop_assert!((1..=MAX_N).contains(&r.n));
            prop_assert!(r.theta < r.lambda);
            prop_assert!(r.lambda <= 0xFFFF);
        }
    }

    /// The smallest usable divider is chosen.
    #[test]
    fn divider_is_minimal(input_hz in 1_000_000u32..=108_000_000) {
        if let Ok(r) = FllRatio::compute(input_hz, SYSCLK_HZ) {
            if r.refclk_div > 0 {
                let finer = r.refclk_div - 1;
                let divided = input_hz >> finer;
                prop_assert!(
                    divided > MAX_DIVIDED_REF_HZ || divided << finer != input_hz
                );
            }
        }
    }

    /// 48 kHz-family master clocks up to 12.288 MHz always yield a ratio.
    #[test]
    fn audio_master_clocks_are_accepted(mult in 1u32..=8) {
        let mclk = 1_536_000 * mult;
        prop_assert!(FllRatio::compute(mclk, SYSCLK_HZ).is_ok());
    }
}
