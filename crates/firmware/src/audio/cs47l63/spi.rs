//! CS47L63 SPI control port
//!
//! Frame layout (datasheet §4.13.2):
//!
//! ```text
//! write: [A31..A0] [pad ×4] [D31..D0]          one SPI write, CS low throughout
//! read:  [1|A30..A0] [pad ×4]  then  [D31..D0]  one transaction, write then read
//! ```
//!
//! All fields are big-endian. Bit 31 of the address word selects a read.

use embedded_hal::spi::Operation;
use embedded_hal_async::spi::SpiDevice;
use platform::{CodecError, RegisterBus};

/// Read flag in the address word.
const READ_FLAG: u32 = 0x8000_0000;

/// Padding bytes between address and data.
const PAD_LEN: usize = 4;

/// Header: address word + padding.
const HEADER_LEN: usize = 4 + PAD_LEN;

/// Register bus over an async [`SpiDevice`] (CS managed by the device).
pub struct SpiRegisterBus<D> {
    spi: D,
}

impl<D: SpiDevice> SpiRegisterBus<D> {
    /// Wrap an SPI device.
    pub fn new(spi: D) -> Self {
        Self { spi }
    }

    /// Release the SPI device.
    pub fn into_inner(self) -> D {
        self.spi
    }
}

fn header(address: u32) -> [u8; HEADER_LEN] {
    let mut frame = [0u8; HEADER_LEN];
    let (addr, _pad) = frame.split_at_mut(4);
    addr.copy_from_slice(&address.to_be_bytes());
    frame
}

impl<D: SpiDevice> RegisterBus for SpiRegisterBus<D> {
    async fn write_register(&mut self, address: u32, value: u32) -> Result<(), CodecError> {
        let mut frame = [0u8; HEADER_LEN + 4];
        let (head, data) = frame.split_at_mut(HEADER_LEN);
        head.copy_from_slice(&header(address & !READ_FLAG));
        data.copy_from_slice(&value.to_be_bytes());
        self.spi
            .write(&frame)
            .await
            .map_err(|_| CodecError::TransportFailed)
    }

    async fn read_register(&mut self, address: u32) -> Result<u32, CodecError> {
        let head = header(address | READ_FLAG);
        let mut data = [0u8; 4];
        self.spi
            .transaction(&mut [Operation::Write(&head), Operation::Read(&mut data)])
            .await
            .map_err(|_| CodecError::TransportFailed)?;
        Ok(u32::from_be_bytes(data))
    }
}
