//! Register transport.
//!
//! Single-byte register reads and writes addressed by [`ChipHandle`]. Writes
//! that fail with a transient bus condition are repeated once; reads are
//! never repeated because their callers poll with their own budget.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use crate::chip::ChipHandle;
use crate::error::{TransportError, TransportErrorKind};

/// Byte-register access to the chips on the board.
pub trait RegisterTransport {
    /// Write `value` to `reg` on `chip`.
    fn write(&mut self, chip: ChipHandle, reg: u8, value: u8) -> Result<(), TransportError>;

    /// Read `reg` from `chip`.
    fn read(&mut self, chip: ChipHandle, reg: u8) -> Result<u8, TransportError>;
}

impl<T: RegisterTransport + ?Sized> RegisterTransport for &mut T {
    fn write(&mut self, chip: ChipHandle, reg: u8, value: u8) -> Result<(), TransportError> {
        (**self).write(chip, reg, value)
    }

    fn read(&mut self, chip: ChipHandle, reg: u8) -> Result<u8, TransportError> {
        (**self).read(chip, reg)
    }
}

/// Classify an I2C error for the retry policy.
///
/// A missing acknowledge (remote I/O) or a lost arbitration (bus busy) may
/// go away on a second attempt; anything else will not.
pub fn classify(kind: ErrorKind) -> TransportErrorKind {
    match kind {
        ErrorKind::NoAcknowledge(_) | ErrorKind::ArbitrationLoss => TransportErrorKind::Transient,
        _ => TransportErrorKind::Permanent,
    }
}

/// [`RegisterTransport`] over a blocking `embedded-hal` I2C bus.
#[derive(Debug)]
pub struct I2cTransport<I> {
    i2c: I,
}

impl<I: I2c> I2cTransport<I> {
    /// Take ownership of the bus.
    pub fn new(i2c: I) -> Self {
        Self { i2c }
    }

    /// Give the bus back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: I2c> RegisterTransport for I2cTransport<I> {
    fn write(&mut self, chip: ChipHandle, reg: u8, value: u8) -> Result<(), TransportError> {
        let kind = match self.i2c.write(chip.address, &[reg, value]) {
            Ok(()) => return Ok(()),
            Err(e) => classify(e.kind()),
        };
        let kind = match kind {
            TransportErrorKind::Transient => match self.i2c.write(chip.address, &[reg, value]) {
                Ok(()) => return Ok(()),
                Err(e) => classify(e.kind()),
            },
            TransportErrorKind::Permanent => kind,
        };
        warn!("i2c write failed: {} reg {} value {}", chip.role, reg, value);
        Err(TransportError::new(chip.role, reg, kind))
    }

    fn read(&mut self, chip: ChipHandle, reg: u8) -> Result<u8, TransportError> {
        let mut buf = [0u8; 1];
        match self.i2c.write_read(chip.address, &[reg], &mut buf) {
            Ok(()) => {
                let [value] = buf;
                Ok(value)
            }
            Err(e) => Err(TransportError::new(chip.role, reg, classify(e.kind()))),
        }
    }
}
