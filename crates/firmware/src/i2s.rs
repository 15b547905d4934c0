//! I2S bus configurator.
//!
//! Programs the I2S peripheral as bus master from a [`SerialBusConfig`] and
//! arms it to stream a looping TX buffer. The codec's ASP1 port is the slave
//! on the other end and takes its MCLK1 from the MCK this module enables.
//!
//! Write order:
//!
//! ```text
//! CLKCONFIG → [MCKFREQ] → MCKEN → RATIO → MODE → FORMAT → ALIGN → SWIDTH
//!   → CHANNELS → TXEN → RXEN → ENABLE → TXD.PTR/MAXCNT → TASKS_START
//! ```
//!
//! The peripheral has no failure path; only the buffer descriptor is
//! validated, before the first write.

use platform::i2s::{BitClockRouting, ClockSource, MAX_BUFFER_WORDS};
use platform::{BusError, I2sField, I2sRegisters, I2sTask, SerialBusConfig};

/// Drives an [`I2sRegisters`] implementation.
pub struct I2sConfigurator<R> {
    regs: R,
    streaming: bool,
}

impl<R: I2sRegisters> I2sConfigurator<R> {
    /// Wrap the peripheral.
    pub fn new(regs: R) -> Self {
        Self {
            regs,
            streaming: false,
        }
    }

    /// `true` between [`configure_and_start`](Self::configure_and_start) and
    /// [`stop`](Self::stop).
    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Borrow the underlying peripheral.
    pub fn inner(&self) -> &R {
        &self.regs
    }

    /// Release the underlying peripheral.
    pub fn into_inner(self) -> R {
        self.regs
    }

    /// Program every field and start streaming.
    ///
    /// The MCK reference domain must already be running.
    pub fn configure_and_start(&mut self, config: &SerialBusConfig) -> Result<(), BusError> {
        let buffer = config.buffer;
        if buffer.words == 0 || buffer.words > MAX_BUFFER_WORDS {
            return Err(BusError::InvalidBuffer {
                samples: usize::from(buffer.words).saturating_mul(2),
            });
        }

        match config.routing {
            BitClockRouting::AudioClockBypass { .. } => {
                self.regs.write(I2sField::ClockConfig {
                    source: ClockSource::Aclk,
                    bypass: true,
                });
            }
            BitClockRouting::Derived { mck } => {
                self.regs.write(I2sField::ClockConfig {
                    source: ClockSource::Pclk32m,
                    bypass: false,
                });
                self.regs.write(I2sField::MckFreq(mck.code));
            }
        }
        self.regs.write(I2sField::MckEnable(true));
        self.regs.write(I2sField::Ratio(config.ratio));
        self.regs.write(I2sField::Mode(config.role));
        self.regs.write(I2sField::Format(config.format));
        self.regs.write(I2sField::Align(config.align));
        self.regs.write(I2sField::SampleWidth(config.width));
        self.regs.write(I2sField::Channels(config.channels));
        self.regs.write(I2sField::TxEnable(true));
        self.regs.write(I2sField::RxEnable(false));
        self.regs.write(I2sField::Enable(true));
        self.regs.write(I2sField::TxBuffer {
            address: buffer.address,
            words: buffer.words,
        });
        self.regs.trigger(I2sTask::Start);
        self.streaming = true;

        info!(
            "I2S streaming: MCK {} Hz, LRCK {} Hz, BCLK {} Hz, {} words",
            config.master_clock_hz(),
            config.frame_rate_hz(),
            config.bit_clock_hz(),
            buffer.words
        );
        Ok(())
    }

    /// Stop streaming and disable the peripheral.
    pub fn stop(&mut self) {
        self.regs.trigger(I2sTask::Stop);
        self.regs.write(I2sField::Enable(false));
        self.streaming = false;
        info!("I2S stopped");
    }
}
