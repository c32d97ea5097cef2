//! Register level access to the sensor.
//!
//! The driver only needs three primitives. [`I2cBus`] provides them on top
//! of an `embedded-hal` 1.0 [`I2c`], [`LegacyI2cBus`] on top of the
//! `embedded-hal` 0.2 blocking traits. Any other transport can implement
//! [`Bus`] directly.

use embedded_hal_02::blocking::i2c::{Write, WriteRead};
use embedded_hal_1::i2c::I2c;

/// Byte oriented register access for a single device.
pub trait Bus {
    type Error;

    /// Read one register.
    fn read_byte(&mut self, register: u8) -> Result<u8, Self::Error>;

    /// Read consecutive registers starting at `register` into `buf`.
    ///
    /// Returns how many bytes were actually filled.
    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write one register.
    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Self::Error>;
}

/// [`Bus`] over an `embedded-hal` 1.0 I²C peripheral.
#[derive(Debug)]
pub struct I2cBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        I2cBus { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Bus for I2cBus<I2C> {
    type Error = I2C::Error;

    fn read_byte(&mut self, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.i2c.write_read(self.address, &[register], buf)?;
        Ok(buf.len())
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }
}

/// [`Bus`] over an `embedded-hal` 0.2 blocking I²C peripheral.
#[derive(Debug)]
pub struct LegacyI2cBus<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> LegacyI2cBus<I2C> {
    pub fn new(i2c: I2C, address: u8) -> Self {
        LegacyI2cBus { i2c, address }
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Bus for LegacyI2cBus<I2C>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    type Error = E;

    fn read_byte(&mut self, register: u8) -> Result<u8, E> {
        let mut buf = [0u8];
        self.i2c.write_read(self.address, &[register], &mut buf)?;
        Ok(buf[0])
    }

    fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, E> {
        self.i2c.write_read(self.address, &[register], buf)?;
        Ok(buf.len())
    }

    fn write_byte(&mut self, register: u8, value: u8) -> Result<(), E> {
        self.i2c.write(self.address, &[register, value])
    }
}
