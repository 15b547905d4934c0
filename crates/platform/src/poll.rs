//! Bounded status polling.
//!
//! Every "wait until ready" loop in the bring-up path is bounded: a status
//! that never asserts turns into a timeout error instead of a hang.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;

/// How often and how many times a status condition is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PollBudget {
    /// Pause after each unsuccessful sample.
    pub interval: Duration,
    /// Maximum number of samples before giving up. `0` never samples.
    pub max_attempts: u32,
}

impl PollBudget {
    /// Oscillator start/stop: 1 ms interval, up to 1 s.
    pub const CLOCK_READY: Self = Self::new(Duration::from_millis(1), 1_000);

    /// Codec FLL lock: 1 ms interval, up to 250 ms.
    pub const FLL_LOCK: Self = Self::new(Duration::from_millis(1), 250);

    /// Create a budget.
    pub const fn new(interval: Duration, max_attempts: u32) -> Self {
        Self {
            interval,
            max_attempts,
        }
    }

    /// Total time spent pausing when every sample fails.
    pub fn worst_case(&self) -> Duration {
        Duration::from_ticks(
            self.interval
                .as_ticks()
                .saturating_mul(u64::from(self.max_attempts)),
        )
    }

    /// Pause for one poll interval.
    pub async fn pause<D: DelayNs>(&self, delay: &mut D) {
        let us = u32::try_from(self.interval.as_micros()).unwrap_or(u32::MAX);
        delay.delay_us(us).await;
    }

    /// Sample `ready` until it returns `true`, pausing after each miss.
    ///
    /// Returns the 1-based attempt on which the condition held, or `None`
    /// once `max_attempts` samples have all failed.
    pub async fn poll<D, F>(&self, delay: &mut D, mut ready: F) -> Option<u32>
    where
        D: DelayNs,
        F: FnMut() -> bool,
    {
        for attempt in 1..=self.max_attempts {
            if ready() {
                return Some(attempt);
            }
            self.pause(delay).await;
        }
        None
    }
}

impl Default for PollBudget {
    fn default() -> Self {
        Self::CLOCK_READY
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::mocks::MockDelay;

    #[tokio::test]
    async fn ready_on_first_sample_does_not_pause() {
        let mut delay = MockDelay::new();
        let got = PollBudget::CLOCK_READY.poll(&mut delay, || true).await;
        assert_eq!(got, Some(1));
        assert_eq!(delay.total_ns(), 0);
    }

    #[tokio::test]
    async fn ready_after_misses_pauses_once_per_miss() {
        let mut delay = MockDelay::new();
        let mut left = 3;
        let got = PollBudget::CLOCK_READY
            .poll(&mut delay, || {
                if left == 0 {
                    true
                } else {
                    left -= 1;
                    false
                }
            })
            .await;
        assert_eq!(got, Some(4));
        assert_eq!(delay.total_ns(), 3_000_000);
    }

    #[tokio::test]
    async fn exhausted_budget_samples_exactly_max_attempts() {
        let mut delay = MockDelay::new();
        let budget = PollBudget::new(Duration::from_millis(2), 5);
        let mut samples = 0u32;
        let got = budget
            .poll(&mut delay, || {
                samples += 1;
                false
            })
            .await;
        assert_eq!(got, None);
        assert_eq!(samples, 5);
        assert_eq!(delay.total_ns(), 10_000_000);
        assert_eq!(budget.worst_case(), Duration::from_millis(10));
    }

    #[tokio::test]
    async fn zero_attempts_never_samples() {
        let mut delay = MockDelay::new();
        let budget = PollBudget::new(Duration::from_millis(1), 0);
        let got = budget.poll(&mut delay, || true).await;
        assert_eq!(got, None);
    }
}
