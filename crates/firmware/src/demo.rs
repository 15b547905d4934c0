//! Scripted output demonstration.
//!
//! With the codec routed and the I2S sine streaming, the demo walks the
//! output through every source combination:
//!
//! ```text
//! lead-in 2 s → unmute → +noise → +tone → −noise → −tone → mute → 2 s
//!                 3 s      3 s      3 s      3 s      3 s
//! ```
//!
//! Each step applies one [`DemoAction`] and then dwells. A failing action
//! aborts the script; the caller is still responsible for teardown.

use embassy_time::Duration;
use embedded_hal_async::delay::DelayNs;
use platform::{CodecDevice, CodecError, Generator};

/// One codec control change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DemoAction {
    /// Clear the output mute.
    UnmuteOutput,
    /// Start the noise generator.
    EnableNoise,
    /// Start the tone generator.
    EnableTone,
    /// Stop the noise generator.
    DisableNoise,
    /// Stop the tone generator.
    DisableTone,
    /// Set the output mute.
    MuteOutput,
}

impl core::fmt::Display for DemoAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnmuteOutput => write!(f, "unmute output"),
            Self::EnableNoise => write!(f, "noise on"),
            Self::EnableTone => write!(f, "tone on"),
            Self::DisableNoise => write!(f, "noise off"),
            Self::DisableTone => write!(f, "tone off"),
            Self::MuteOutput => write!(f, "mute output"),
        }
    }
}

impl DemoAction {
    /// Issue the action to `codec`.
    pub async fn apply<C: CodecDevice>(self, codec: &mut C) -> Result<(), CodecError> {
        match self {
            Self::UnmuteOutput => codec.set_output_muted(false).await,
            Self::EnableNoise => codec.set_generator_enabled(Generator::Noise, true).await,
            Self::EnableTone => codec.set_generator_enabled(Generator::Tone, true).await,
            Self::DisableNoise => codec.set_generator_enabled(Generator::Noise, false).await,
            Self::DisableTone => codec.set_generator_enabled(Generator::Tone, false).await,
            Self::MuteOutput => codec.set_output_muted(true).await,
        }
    }
}

/// An action and the time to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DemoStep {
    /// Control change.
    pub action: DemoAction,
    /// Hold time after the change.
    pub dwell: Duration,
}

impl DemoStep {
    /// Create a step.
    pub const fn new(action: DemoAction, dwell: Duration) -> Self {
        Self { action, dwell }
    }
}

/// Ordered demo steps preceded by a lead-in pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoScript<'a> {
    /// Pause before the first step.
    pub lead_in: Duration,
    /// Steps in order.
    pub steps: &'a [DemoStep],
}

/// Audio DK demo steps.
pub const AUDIO_DK_STEPS: [DemoStep; 6] = [
    DemoStep::new(DemoAction::UnmuteOutput, Duration::from_millis(3000)),
    DemoStep::new(DemoAction::EnableNoise, Duration::from_millis(3000)),
    DemoStep::new(DemoAction::EnableTone, Duration::from_millis(3000)),
    DemoStep::new(DemoAction::DisableNoise, Duration::from_millis(3000)),
    DemoStep::new(DemoAction::DisableTone, Duration::from_millis(3000)),
    DemoStep::new(DemoAction::MuteOutput, Duration::from_millis(2000)),
];

impl<'a> DemoScript<'a> {
    /// Audio DK demo: 2 s lead-in, then [`AUDIO_DK_STEPS`].
    pub const DEFAULT: DemoScript<'static> = DemoScript {
        lead_in: Duration::from_millis(2000),
        steps: &AUDIO_DK_STEPS,
    };

    /// Create a script.
    pub const fn new(lead_in: Duration, steps: &'a [DemoStep]) -> Self {
        Self { lead_in, steps }
    }

    /// Sum of the lead-in and every dwell.
    pub fn duration(&self) -> Duration {
        self.steps
            .iter()
            .fold(self.lead_in, |total, step| {
                Duration::from_ticks(total.as_ticks().saturating_add(step.dwell.as_ticks()))
            })
    }
}

/// Sleep for `duration` on `delay`, saturating at `u32::MAX` ms.
pub async fn hold<D: DelayNs>(delay: &mut D, duration: Duration) {
    let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
    delay.delay_ms(ms).await;
}
