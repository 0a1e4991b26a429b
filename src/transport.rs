// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Bus access used by the driver.
//!
//! The driver never talks to a bus directly; it goes through a
//! [`BusTransport`]. An implementation for the Linux `/dev/i2c-*` character
//! devices is provided on top of `i2cdev`. Anything else (a mock, a USB
//! bridge, a bit-banged bus) only has to provide the three transactions.

use i2cdev::core::{I2CMessage, I2CTransfer};
use i2cdev::linux::{LinuxI2CBus, LinuxI2CError, LinuxI2CMessage};
use std::error::Error;

/// Two-wire bus transactions needed by the ENS160 driver.
///
/// Implementations decide how transactions block and time out; the driver
/// performs no retries and surfaces the first error it gets.
pub trait BusTransport {
    /// Error reported when a transaction does not complete
    type Error: Error + 'static;

    /// Writes `register` and, after a repeated start with the bus still held,
    /// fills `buffer` from the device.
    fn write_read(&mut self, address: u8, register: u8, buffer: &mut [u8])
        -> Result<(), Self::Error>;

    /// Writes `bytes` in a single transaction. The first byte is the register address.
    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Bare read without addressing a register.
    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error>;

    /// Whether the device has to acknowledge a bare read before it is identified.
    fn requires_presence_check(&self) -> bool {
        false
    }
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    type Error = T::Error;

    fn write_read(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        (**self).write_read(address, register, buffer)
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        (**self).write(address, bytes)
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read(address, buffer)
    }

    fn requires_presence_check(&self) -> bool {
        (**self).requires_presence_check()
    }
}

/// Linux I2C adapter, e.g. `/dev/i2c-1` on a Raspberry Pi.
///
/// Uses `I2C_RDWR` so the register write and the following read go out as one
/// combined transaction with a repeated start.
impl BusTransport for LinuxI2CBus {
    type Error = LinuxI2CError;

    fn write_read(
        &mut self,
        address: u8,
        register: u8,
        buffer: &mut [u8],
    ) -> Result<(), Self::Error> {
        let register = [register];
        let mut messages = [
            LinuxI2CMessage::write(&register).with_address(address.into()),
            LinuxI2CMessage::read(buffer).with_address(address.into()),
        ];
        self.transfer(&mut messages)?;
        Ok(())
    }

    fn write(&mut self, address: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let mut messages = [LinuxI2CMessage::write(bytes).with_address(address.into())];
        self.transfer(&mut messages)?;
        Ok(())
    }

    fn read(&mut self, address: u8, buffer: &mut [u8]) -> Result<(), Self::Error> {
        let mut messages = [LinuxI2CMessage::read(buffer).with_address(address.into())];
        self.transfer(&mut messages)?;
        Ok(())
    }

    /// The kernel adapter does not tell an absent device from a misbehaving
    /// one, so a bare read is done first.
    fn requires_presence_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use super::BusTransport;
    use std::io;

    /// One transaction as seen on the wire.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Transaction {
        WriteRead { address: u8, register: u8, len: usize },
        Write { address: u8, bytes: Vec<u8> },
        Read { address: u8, len: usize },
    }

    /// In-memory device: a 256 byte register file behind a fixed address.
    ///
    /// Every transaction is recorded, including failed ones.
    pub struct FakeBus {
        pub address: u8,
        pub registers: [u8; 256],
        pub transactions: Vec<Transaction>,
        /// Fail every transaction from this index on
        pub fail_from: Option<usize>,
        pub presence_check: bool,
    }

    impl FakeBus {
        pub fn new(address: u8) -> Self {
            FakeBus {
                address,
                registers: [0; 256],
                transactions: Vec::new(),
                fail_from: None,
                presence_check: false,
            }
        }

        pub fn with(mut self, register: u8, bytes: &[u8]) -> Self {
            self.set(register, bytes);
            self
        }

        pub fn set(&mut self, register: u8, bytes: &[u8]) {
            let start = register as usize;
            self.registers[start..start + bytes.len()].copy_from_slice(bytes);
        }

        pub fn failing(mut self) -> Self {
            self.fail_from = Some(0);
            self
        }

        pub fn writes(&self) -> Vec<Vec<u8>> {
            self.transactions
                .iter()
                .filter_map(|t| match t {
                    Transaction::Write { bytes, .. } => Some(bytes.clone()),
                    _ => None,
                })
                .collect()
        }

        fn record(&mut self, address: u8, transaction: Transaction) -> io::Result<()> {
            self.transactions.push(transaction);
            let failed = self
                .fail_from
                .map_or(false, |from| self.transactions.len() > from);
            if failed || address != self.address {
                Err(io::Error::new(io::ErrorKind::Other, "no acknowledge"))
            } else {
                Ok(())
            }
        }
    }

    impl BusTransport for FakeBus {
        type Error = io::Error;

        fn write_read(&mut self, address: u8, register: u8, buffer: &mut [u8]) -> io::Result<()> {
            let len = buffer.len();
            self.record(
                address,
                Transaction::WriteRead {
                    address,
                    register,
                    len,
                },
            )?;
            let start = register as usize;
            buffer.copy_from_slice(&self.registers[start..start + len]);
            Ok(())
        }

        fn write(&mut self, address: u8, bytes: &[u8]) -> io::Result<()> {
            self.record(
                address,
                Transaction::Write {
                    address,
                    bytes: bytes.to_vec(),
                },
            )?;
            if let Some((register, data)) = bytes.split_first() {
                self.set(*register, data);
            }
            Ok(())
        }

        fn read(&mut self, address: u8, buffer: &mut [u8]) -> io::Result<()> {
            let len = buffer.len();
            self.record(address, Transaction::Read { address, len })?;
            buffer.iter_mut().for_each(|b| *b = 0);
            Ok(())
        }

        fn requires_presence_check(&self) -> bool {
            self.presence_check
        }
    }
}
