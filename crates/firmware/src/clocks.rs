//! Clock tree controller for the nRF5340 `HFCLK` / `HFCLKAUDIO` domains.
//!
//! Starting a domain is a three-step affair: program the divider / frequency
//! selector, trigger the start task, then poll the running status. Only after
//! the status has been observed is the domain reported [`ClockState::Running`]
//! and may consumers (I2S MCK, codec MCLK1) rely on it.
//!
//! Both polls are bounded by [`ClockTreeConfig::poll`]; an oscillator that
//! never reports running yields [`ClockError::ReadyTimeout`] instead of a hang.

use embedded_hal_async::delay::DelayNs;
use platform::clock::{HfclkAudioFreq, HfclkDivider};
use platform::{ClockDomain, ClockError, ClockPrimitive, ClockState, PollBudget};

/// Clock tree settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockTreeConfig {
    /// `HFCLK` divider.
    pub divider: HfclkDivider,
    /// `HFCLKAUDIO` frequency selector.
    pub audio: HfclkAudioFreq,
    /// Start / stop status poll budget.
    pub poll: PollBudget,
}

impl ClockTreeConfig {
    /// Audio DK: HFCLK at 128 MHz, HFCLKAUDIO at 12.288 MHz, 1 ms polls.
    pub const fn audio_dk() -> Self {
        Self {
            divider: HfclkDivider::Div1,
            audio: HfclkAudioFreq::MHZ_12_288,
            poll: PollBudget::CLOCK_READY,
        }
    }
}

impl Default for ClockTreeConfig {
    fn default() -> Self {
        Self::audio_dk()
    }
}

/// Tracks and drives the two oscillator domains.
pub struct ClockTree<C> {
    clock: C,
    config: ClockTreeConfig,
    hfclk: ClockState,
    hfclk_audio: ClockState,
}

impl<C: ClockPrimitive> ClockTree<C> {
    /// Wrap a clock primitive. Both domains start out [`ClockState::Stopped`].
    pub fn new(clock: C, config: ClockTreeConfig) -> Self {
        Self {
            clock,
            config,
            hfclk: ClockState::Stopped,
            hfclk_audio: ClockState::Stopped,
        }
    }

    /// Last observed state of `domain`.
    pub fn state(&self, domain: ClockDomain) -> ClockState {
        match domain {
            ClockDomain::Hfclk => self.hfclk,
            ClockDomain::HfclkAudio => self.hfclk_audio,
        }
    }

    /// `true` once `domain` has been observed running.
    pub fn is_ready(&self, domain: ClockDomain) -> bool {
        self.state(domain) == ClockState::Running
    }

    /// Settings in use.
    pub fn config(&self) -> &ClockTreeConfig {
        &self.config
    }

    /// Borrow the underlying primitive.
    pub fn inner(&self) -> &C {
        &self.clock
    }

    /// Release the underlying primitive.
    pub fn into_inner(self) -> C {
        self.clock
    }

    fn set_state(&mut self, domain: ClockDomain, state: ClockState) {
        match domain {
            ClockDomain::Hfclk => self.hfclk = state,
            ClockDomain::HfclkAudio => self.hfclk_audio = state,
        }
    }

    /// Configure and start `domain`, returning once it is observed running.
    ///
    /// A rejected divider write aborts before the start task is triggered.
    /// On [`ClockError::ReadyTimeout`] the domain stays
    /// [`ClockState::Starting`].
    pub async fn start_domain<D: DelayNs>(
        &mut self,
        domain: ClockDomain,
        delay: &mut D,
    ) -> Result<(), ClockError> {
        match domain {
            ClockDomain::Hfclk => {
                self.clock
                    .set_divider(domain, self.config.divider)
                    .map_err(|status| {
                        error!("{} divider rejected: status {}", domain, status.0);
                        ClockError::ConfigurationFailed(status.0)
                    })?;
            }
            ClockDomain::HfclkAudio => {
                self.clock.set_frequency_selector(domain, self.config.audio);
            }
        }

        self.clock.start(domain);
        self.set_state(domain, ClockState::Starting);

        let budget = self.config.poll;
        let clock = &mut self.clock;
        match budget.poll(delay, || clock.is_running(domain)).await {
            Some(attempts) => {
                self.set_state(domain, ClockState::Running);
                info!("{} running after {} polls", domain, attempts);
                Ok(())
            }
            None => {
                error!("{} not running after {} polls", domain, budget.max_attempts);
                Err(ClockError::ReadyTimeout(domain))
            }
        }
    }

    /// Stop `domain`, returning once it is observed stopped.
    ///
    /// On [`ClockError::StopTimeout`] the recorded state is left unchanged.
    pub async fn stop_domain<D: DelayNs>(
        &mut self,
        domain: ClockDomain,
        delay: &mut D,
    ) -> Result<(), ClockError> {
        self.clock.stop(domain);

        let budget = self.config.poll;
        let clock = &mut self.clock;
        match budget.poll(delay, || !clock.is_running(domain)).await {
            Some(_) => {
                self.set_state(domain, ClockState::Stopped);
                info!("{} stopped", domain);
                Ok(())
            }
            None => {
                warn!("{} still running after stop", domain);
                Err(ClockError::StopTimeout(domain))
            }
        }
    }

    /// Stop every domain left [`ClockState::Starting`] by a readiness
    /// timeout. The start task was triggered, so the oscillator may still
    /// come up later.
    pub async fn stop_pending<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), ClockError> {
        for domain in [ClockDomain::HfclkAudio, ClockDomain::Hfclk] {
            if self.state(domain) == ClockState::Starting {
                warn!("{} start still requested, stopping", domain);
                self.stop_domain(domain, delay).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use embassy_time::Duration;
    use platform::mocks::{HwEvent, HwLog, MockClock, MockDelay};

    fn tree(clock: MockClock) -> ClockTree<MockClock> {
        ClockTree::new(clock, ClockTreeConfig::audio_dk())
    }

    #[tokio::test]
    async fn hfclk_sets_divider_then_starts() {
        let log = HwLog::new();
        let mut clocks = tree(MockClock::new(log.clone()));
        let mut delay = MockDelay::new();

        assert!(!clocks.is_ready(ClockDomain::Hfclk));
        clocks
            .start_domain(ClockDomain::Hfclk, &mut delay)
            .await
            .unwrap();
        assert!(clocks.is_ready(ClockDomain::Hfclk));
        assert_eq!(
            log.events(),
            [
                HwEvent::ClockDivider(ClockDomain::Hfclk, HfclkDivider::Div1),
                HwEvent::ClockStart(ClockDomain::Hfclk),
            ]
        );
    }

    #[tokio::test]
    async fn audio_clock_programs_frequency_and_waits() {
        let log = HwLog::new();
        let clock = MockClock::new(log.clone()).with_start_latency(ClockDomain::HfclkAudio, 5);
        let mut clocks = tree(clock);
        let mut delay = MockDelay::new();

        clocks
            .start_domain(ClockDomain::HfclkAudio, &mut delay)
            .await
            .unwrap();
        assert_eq!(clocks.state(ClockDomain::HfclkAudio), ClockState::Running);
        assert_eq!(clocks.inner().polls(ClockDomain::HfclkAudio), 6);
        assert_eq!(delay.total_ms(), 5);
        assert_eq!(
            log.events().first(),
            Some(&HwEvent::ClockFrequency(
                ClockDomain::HfclkAudio,
                HfclkAudioFreq::MHZ_12_288
            ))
        );
    }

    #[tokio::test]
    async fn rejected_divider_does_not_start() {
        let log = HwLog::new();
        let mut clocks = tree(MockClock::new(log.clone()).with_divider_status(0x0BAD));
        let mut delay = MockDelay::new();

        let err = clocks
            .start_domain(ClockDomain::Hfclk, &mut delay)
            .await
            .unwrap_err();
        assert_eq!(err, ClockError::ConfigurationFailed(0x0BAD));
        assert!(log.events().is_empty());
        assert_eq!(clocks.state(ClockDomain::Hfclk), ClockState::Stopped);
    }

    #[tokio::test]
    async fn oscillator_that_never_runs_times_out() {
        let clock = MockClock::new(HwLog::new()).never_starts(ClockDomain::HfclkAudio);
        let config = ClockTreeConfig {
            poll: PollBudget::new(Duration::from_millis(1), 20),
            ..ClockTreeConfig::audio_dk()
        };
        let mut clocks = ClockTree::new(clock, config);
        let mut delay = MockDelay::new();

        let err = clocks
            .start_domain(ClockDomain::HfclkAudio, &mut delay)
            .await
            .unwrap_err();
        assert_eq!(err, ClockError::ReadyTimeout(ClockDomain::HfclkAudio));
        assert_eq!(clocks.state(ClockDomain::HfclkAudio), ClockState::Starting);
        assert_eq!(clocks.inner().polls(ClockDomain::HfclkAudio), 20);
        assert_eq!(delay.total_ms(), 20);
    }

    #[tokio::test]
    async fn stop_waits_for_not_running() {
        let log = HwLog::new();
        let clock = MockClock::new(log.clone()).with_stop_latency(ClockDomain::Hfclk, 3);
        let mut clocks = tree(clock);
        let mut delay = MockDelay::new();

        clocks
            .start_domain(ClockDomain::Hfclk, &mut delay)
            .await
            .unwrap();
        clocks
            .stop_domain(ClockDomain::Hfclk, &mut delay)
            .await
            .unwrap();
        assert_eq!(clocks.state(ClockDomain::Hfclk), ClockState::Stopped);
        assert!(!clocks.inner().probe().is_running(ClockDomain::Hfclk));
        assert_eq!(log.events().last(), Some(&HwEvent::ClockStop(ClockDomain::Hfclk)));
    }

    #[tokio::test]
    async fn stop_that_never_settles_times_out() {
        let clock = MockClock::new(HwLog::new()).with_stop_latency(ClockDomain::HfclkAudio, 50);
        let config = ClockTreeConfig {
            poll: PollBudget::new(Duration::from_millis(1), 10),
            ..ClockTreeConfig::audio_dk()
        };
        let mut clocks = ClockTree::new(clock, config);
        let mut delay = MockDelay::new();

        clocks
            .start_domain(ClockDomain::HfclkAudio, &mut delay)
            .await
            .unwrap();
        let err = clocks
            .stop_domain(ClockDomain::HfclkAudio, &mut delay)
            .await
            .unwrap_err();
        assert_eq!(err, ClockError::StopTimeout(ClockDomain::HfclkAudio));
        assert_eq!(clocks.state(ClockDomain::HfclkAudio), ClockState::Running);
        assert!(clocks.inner().probe().is_running(ClockDomain::HfclkAudio));
    }

    #[tokio::test]
    async fn pending_start_is_stopped() {
        let log = HwLog::new();
        let clock = MockClock::new(log.clone()).never_starts(ClockDomain::HfclkAudio);
        let config = ClockTreeConfig {
            poll: PollBudget::new(Duration::from_millis(1), 4),
            ..ClockTreeConfig::audio_dk()
        };
        let mut clocks = ClockTree::new(clock, config);
        let mut delay = MockDelay::new();

        clocks
            .start_domain(ClockDomain::Hfclk, &mut delay)
            .await
            .unwrap();
        assert!(clocks
            .start_domain(ClockDomain::HfclkAudio, &mut delay)
            .await
            .is_err());

        clocks.stop_pending(&mut delay).await.unwrap();
        assert_eq!(clocks.state(ClockDomain::HfclkAudio), ClockState::Stopped);
        // Only the pending domain is touched.
        assert_eq!(clocks.state(ClockDomain::Hfclk), ClockState::Running);
        assert_eq!(
            log.events().last(),
            Some(&HwEvent::ClockStop(ClockDomain::HfclkAudio))
        );
    }
}
