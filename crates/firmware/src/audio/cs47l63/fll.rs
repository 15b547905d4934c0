//! CS47L63 FLL ratio calculation.
//!
//! # FLL Formula
//!
//!   F_REF'  = F_REF / REFCLK_DIV              (REFCLK_DIV ∈ {1, 2, 4, 8})
//!   F_OUT   = F_REF' × (N + THETA / LAMBDA)
//!
//! Constraints:
//!   F_REF'         ≤ 13.5 MHz
//!   1 ≤ N          ≤ 1023
//!   THETA, LAMBDA  ≤ 0xFFFF (THETA / LAMBDA reduced by gcd)
//!
//! # Audio DK
//!
//!   MCLK1 12.288 MHz → ÷1 → N = 4, THETA = 0        → 49.152 MHz (exact)
//!   MCK    4.000 MHz → ÷1 → N = 12, THETA/LAMBDA = 36/125 → 49.152 MHz (exact)

use platform::{CodecError, FllReference};

use super::registers::{
    FLL_LAMBDA_SHIFT, FLL_N_MASK, FLL_REFCLK_DIV_SHIFT, FLL_REFCLK_SRC_SHIFT, FLL_SRC_ASP1_BCLK,
    FLL_SRC_MCLK1, FLL_SRC_MCLK2,
};

/// Highest divided reference frequency the loop accepts.
pub const MAX_DIVIDED_REF_HZ: u32 = 13_500_000;

/// Largest integer multiplier.
pub const MAX_N: u32 = 1023;

/// Resolved FLL ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FllRatio {
    /// `REFCLK_DIV` register code (0..=3 → ÷1/2/4/8).
    pub refclk_div: u32,
    /// Integer multiplier.
    pub n: u32,
    /// Fractional numerator.
    pub theta: u32,
    /// Fractional denominator.
    pub lambda: u32,
}

impl FllRatio {
    /// Compute the ratio taking `input_hz` to exactly `output_hz`.
    pub fn compute(input_hz: u32, output_hz: u32) -> Result<Self, CodecError> {
        if input_hz == 0 || output_hz == 0 {
            return Err(CodecError::ConfigurationFailed);
        }

        let (refclk_div, divided) = (0u32..=3)
            .find_map(|code| {
                let divided = input_hz.checked_shr(code)?;
                (divided <= MAX_DIVIDED_REF_HZ && divided.checked_shl(code) == Some(input_hz))
                    .then_some((code, divided))
            })
            .ok_or(CodecError::ConfigurationFailed)?;

        let n = output_hz
            .checked_div(divided)
            .ok_or(CodecError::ConfigurationFailed)?;
        if !(1..=MAX_N).contains(&n) {
            return Err(CodecError::ConfigurationFailed);
        }

        let remainder = output_hz
            .checked_rem(divided)
            .ok_or(CodecError::ConfigurationFailed)?;
        let (theta, lambda) = if remainder == 0 {
            (0, 1)
        } else {
            let g = gcd(remainder, divided);
            (
                remainder.checked_div(g).unwrap_or(0),
                divided.checked_div(g).unwrap_or(0),
            )
        };
        if theta > 0xFFFF || lambda > 0xFFFF || lambda == 0 {
            return Err(CodecError::ConfigurationFailed);
        }

        Ok(Self {
            refclk_div,
            n,
            theta,
            lambda,
        })
    }

    /// Output frequency this ratio produces from `input_hz`, truncated.
    pub fn output_hz(&self, input_hz: u32) -> u64 {
        let divided = u64::from(input_hz.checked_shr(self.refclk_div).unwrap_or(0));
        let whole = divided.saturating_mul(u64::from(self.n));
        let frac = divided
            .saturating_mul(u64::from(self.theta))
            .checked_div(u64::from(self.lambda))
            .unwrap_or(0);
        whole.saturating_add(frac)
    }

    /// `FLLn_CONTROL2` value for `reference`.
    #[allow(clippy::arithmetic_side_effects)] // field codes bounded by compute()
    pub fn control2(&self, reference: FllReference) -> u32 {
        (reference_code(reference) << FLL_REFCLK_SRC_SHIFT)
            | (self.refclk_div << FLL_REFCLK_DIV_SHIFT)
            | (self.n & FLL_N_MASK)
    }

    /// `FLLn_CONTROL3` value.
    #[allow(clippy::arithmetic_side_effects)] // lambda <= 0xFFFF
    pub fn control3(&self) -> u32 {
        (self.lambda << FLL_LAMBDA_SHIFT) | (self.theta & 0xFFFF)
    }
}

/// `FLLn_REFCLK_SRC` code.
pub const fn reference_code(reference: FllReference) -> u32 {
    match reference {
        FllReference::MasterClock1 => FLL_SRC_MCLK1,
        FllReference::MasterClock2 => FLL_SRC_MCLK2,
        FllReference::SerialPortBitClock => FLL_SRC_ASP1_BCLK,
    }
}

fn gcd(mut a: u32, mut b: u32) -> u32 {
    while b != 0 {
        let r = a.checked_rem(b).unwrap_or(0);
        a = b;
        b = r;
    }
    a
}
