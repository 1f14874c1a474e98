//! Host-side stand-ins for the bus, the delay and the chip.

use alloc::vec::Vec;
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::{self, ErrorKind, ErrorType, Operation, SpiDevice};

use super::{Channel, FRAME_LEN};

/// Accumulates requested delays instead of sleeping.
#[derive(Debug, Default)]
pub(crate) struct FakeDelay {
    elapsed_ns: u64,
}

impl FakeDelay {
    pub(crate) fn elapsed_ms(&self) -> u64 {
        self.elapsed_ns / 1_000_000
    }
}

impl DelayNs for FakeDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BusFault;

impl spi::Error for BusFault {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Answers X/Y conversions from a script of contacts. `None` is an untouched panel, which
/// reads as 0 on both axes. The last entry repeats once the script runs out.
#[derive(Debug)]
pub(crate) struct FakePanel {
    script: Vec<Option<(u16, u16)>>,
    position: usize,
    /// Control bytes in the order they were received.
    pub(crate) commands: Vec<u8>,
    /// Fail every exchange from this index on.
    pub(crate) fail_from: Option<usize>,
    /// Value returned for channels other than X and Y.
    pub(crate) aux_value: u16,
}

impl FakePanel {
    pub(crate) fn new(script: Vec<Option<(u16, u16)>>) -> Self {
        Self {
            script,
            position: 0,
            commands: Vec::new(),
            fail_from: None,
            aux_value: 0,
        }
    }

    pub(crate) fn touched_at(raw_x: u16, raw_y: u16) -> Self {
        Self::new(alloc::vec![Some((raw_x, raw_y))])
    }

    pub(crate) fn idle() -> Self {
        Self::new(alloc::vec![None])
    }

    /// Completed X/Y sample pairs.
    pub(crate) fn samples_taken(&self) -> usize {
        self.position
    }

    fn current(&self) -> Option<(u16, u16)> {
        let last = self.script.len().saturating_sub(1);
        self.script.get(self.position.min(last)).copied().flatten()
    }

    pub(crate) fn exchange(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), BusFault> {
        if self.fail_from.is_some_and(|n| self.commands.len() >= n) {
            return Err(BusFault);
        }
        let command = write[0];
        self.commands.push(command);

        let value = if command == super::encode(Channel::X) {
            self.current().map_or(0, |(x, _)| x)
        } else if command == super::encode(Channel::Y) {
            let y = self.current().map_or(0, |(_, y)| y);
            self.position += 1;
            y
        } else {
            self.aux_value
        };

        read[..FRAME_LEN].copy_from_slice(&response(value));
        Ok(())
    }
}

/// Response frame carrying `value`, with garbage in the first byte.
pub(crate) fn response(value: u16) -> [u8; FRAME_LEN] {
    [0xA5, (value >> 4) as u8, ((value & 0x0F) << 4) as u8]
}

impl ErrorType for FakePanel {
    type Error = BusFault;
}

impl SpiDevice for FakePanel {
    fn transaction(&mut self, operations: &mut [Operation<'_, u8>]) -> Result<(), Self::Error> {
        for op in operations {
            if let Operation::Transfer(read, write) = op {
                self.exchange(read, write)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::spi::SpiDevice for FakePanel {
    async fn transaction(
        &mut self,
        operations: &mut [Operation<'_, u8>],
    ) -> Result<(), Self::Error> {
        for op in operations {
            if let Operation::Transfer(read, write) = op {
                self.exchange(read, write)?;
            }
        }
        Ok(())
    }
}

#[cfg(feature = "async")]
impl embedded_hal_async::delay::DelayNs for FakeDelay {
    async fn delay_ns(&mut self, ns: u32) {
        self.elapsed_ns += u64::from(ns);
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.elapsed_ns += u64::from(ms) * 1_000_000;
    }
}
