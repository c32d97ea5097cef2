//! BMP085 Digital pressure sensor.
//!
//! Temperature resolution: 0.1 C
//! Pressure resolution: 1 Pa (reported in hPa)

use embedded_hal_02::blocking::i2c::{Write, WriteRead};
use embedded_hal_1::delay::DelayNs;
use embedded_hal_1::i2c::I2c;

use crate::bus::{Bus, I2cBus, LegacyI2cBus};
use crate::calibration::{self, CalibrationCoefficients};
use crate::compensation::{self, CompensationError, Temperature};

// BMP085, BMP180 address.
pub const BMP085_I2CADDR: u8 = 0x77;

const BMP085_CONTROL: u8 = 0xF4;
const BMP085_DATA_MSB: u8 = 0xF6;
const BMP085_DATA_LSB: u8 = 0xF7;
const BMP085_DATA_XLSB: u8 = 0xF8;

const BMP085_READTEMPCMD: u8 = 0x2E;
const BMP085_READPRESSURECMD: u8 = 0x34;

const TEMPERATURE_CONVERSION_US: u32 = 4_500;

/// BMP085 errors
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// Bus transport error
    Bus(E),
    /// Calibration block was incomplete
    Calibration,
    /// Arithmetic fault while compensating a raw reading
    Compensation(CompensationError),
    /// Pressure requested before any temperature reading
    StaleState,
    /// No calibration data is available (probably forgot to call `Bmp085::init`)
    NoCalibrationData,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Error::Bus(err)
    }
}

/// Hardware pressure sampling accuracy modes.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Oversampling {
    UltraLowPower = 0,
    Standard,
    HighResolution,
    UltraHighResolution,
}

impl Default for Oversampling {
    fn default() -> Self {
        Oversampling::UltraLowPower
    }
}

impl Oversampling {
    /// The `oss` value used by the datasheet formulas.
    pub fn bits(self) -> u8 {
        self as u8
    }

    fn control(self) -> u8 {
        BMP085_READPRESSURECMD + (self.bits() << 6)
    }

    /// Maximum conversion time from the datasheet
    pub fn conversion_time_us(self) -> u32 {
        match self {
            Oversampling::UltraLowPower => 4_500,
            Oversampling::Standard => 7_500,
            Oversampling::HighResolution => 13_500,
            Oversampling::UltraHighResolution => 25_500,
        }
    }
}

#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    pub oversampling: Oversampling,
}

/// Measurement data
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurements {
    /// temperature in degrees celsius
    pub temperature: f32,
    /// pressure in hectopascals
    pub pressure: f32,
}

/// BMP085, or BMP180.
#[derive(Debug)]
pub struct Bmp085<B> {
    bus: B,
    config: Config,
    calibration: Option<CalibrationCoefficients>,
    b5: Option<i32>,
}

impl<I2C: I2c> Bmp085<I2cBus<I2C>> {
    /// Create device driver instance.
    pub fn new(i2c: I2C, address: u8, config: Config) -> Self {
        Self::with_bus(I2cBus::new(i2c, address), config)
    }

    /// Create device driver instance at `0x77` with the default config.
    pub fn new_default(i2c: I2C) -> Self {
        Self::new(i2c, BMP085_I2CADDR, Config::default())
    }

    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

impl<I2C, E> Bmp085<LegacyI2cBus<I2C>>
where
    I2C: Write<Error = E> + WriteRead<Error = E>,
{
    /// Create device driver instance on an `embedded-hal` 0.2 bus.
    pub fn new_legacy(i2c: I2C, address: u8, config: Config) -> Self {
        Self::with_bus(LegacyI2cBus::new(i2c, address), config)
    }

    pub fn release(self) -> I2C {
        self.bus.release()
    }
}

impl<B: Bus> Bmp085<B> {
    pub fn with_bus(bus: B, config: Config) -> Self {
        Bmp085 {
            bus,
            config,
            calibration: None,
            b5: None,
        }
    }

    /// Read calibration data from the EEPROM of BMP085.
    pub fn init(&mut self) -> Result<(), Error<B::Error>> {
        let calibration = calibration::load(&mut self.bus)?;
        #[cfg(feature = "defmt")]
        defmt::debug!("bmp085 calibration: {}", calibration);
        self.calibration = Some(calibration);
        Ok(())
    }

    pub fn calibration(&self) -> Option<&CalibrationCoefficients> {
        self.calibration.as_ref()
    }

    pub fn oversampling(&self) -> Oversampling {
        self.config.oversampling
    }

    /// Only the pressure conversion is affected.
    pub fn set_oversampling(&mut self, oversampling: Oversampling) {
        self.config.oversampling = oversampling;
    }

    /// Calculate true temperature in degrees celsius, resolution is 0.1C
    ///
    /// Also refreshes the term [`Self::get_pressure`] depends on.
    pub fn get_temperature<D: DelayNs>(&mut self, delay: &mut D) -> Result<f32, Error<B::Error>> {
        let calibration = self.calibration_data()?;
        let ut = self.get_ut(delay)?;
        let temperature: Temperature =
            compensation::temperature(&calibration, ut).map_err(compensation_failed::<B::Error>)?;
        self.b5 = Some(temperature.b5);
        Ok(temperature.celsius())
    }

    /// Calculate true pressure in Pa.
    ///
    /// Uses the temperature term from the latest [`Self::get_temperature`].
    pub fn get_pressure_pa<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, Error<B::Error>> {
        let calibration = self.calibration_data()?;
        let b5 = match self.b5 {
            Some(b5) => b5,
            None => return Err(Error::StaleState),
        };
        let oversampling = self.config.oversampling;
        let up = self.get_up(delay)?;
        compensation::pressure(&calibration, b5, up, oversampling).map_err(compensation_failed)
    }

    /// Calculate true pressure in hPa.
    pub fn get_pressure<D: DelayNs>(&mut self, delay: &mut D) -> Result<f32, Error<B::Error>> {
        let pa = self.get_pressure_pa(delay)?;
        Ok(pa as f32 / 100.0)
    }

    /// Temperature followed by pressure, both from the same sample period.
    pub fn measure<D: DelayNs>(&mut self, delay: &mut D) -> Result<Measurements, Error<B::Error>> {
        let temperature = self.get_temperature(delay)?;
        let pressure = self.get_pressure(delay)?;
        Ok(Measurements {
            temperature,
            pressure,
        })
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    fn calibration_data(&self) -> Result<CalibrationCoefficients, Error<B::Error>> {
        self.calibration.ok_or(Error::NoCalibrationData)
    }

    /// read uncompensated temperature value
    fn get_ut<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, Error<B::Error>> {
        self.bus.write_byte(BMP085_CONTROL, BMP085_READTEMPCMD)?;
        delay.delay_us(TEMPERATURE_CONVERSION_US);

        let msb = self.bus.read_byte(BMP085_DATA_MSB)? as i32;
        let lsb = self.bus.read_byte(BMP085_DATA_LSB)? as i32;
        let ut = (msb << 8) + lsb;
        #[cfg(feature = "defmt")]
        defmt::debug!("bmp085 UT: {}", ut);
        Ok(ut)
    }

    /// read uncompensated pressure value
    fn get_up<D: DelayNs>(&mut self, delay: &mut D) -> Result<i32, Error<B::Error>> {
        let oversampling = self.config.oversampling;
        self.bus.write_byte(BMP085_CONTROL, oversampling.control())?;
        delay.delay_us(oversampling.conversion_time_us());

        let msb = self.bus.read_byte(BMP085_DATA_MSB)? as i32;
        let lsb = self.bus.read_byte(BMP085_DATA_LSB)? as i32;
        let xlsb = self.bus.read_byte(BMP085_DATA_XLSB)? as i32;
        let up = ((msb << 16) + (lsb << 8) + xlsb) >> (8 - oversampling.bits());
        #[cfg(feature = "defmt")]
        defmt::debug!("bmp085 UP: {} (oss {})", up, oversampling.bits());
        Ok(up)
    }
}

fn compensation_failed<E>(err: CompensationError) -> Error<E> {
    #[cfg(feature = "defmt")]
    defmt::warn!("bmp085 compensation failed: {}", err);
    Error::Compensation(err)
}
