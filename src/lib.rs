//! Platform-agnostic driver for the BMP085 barometric pressure sensor.
//!
//! The register compatible BMP180 works as well. The driver reads the
//! factory calibration once, then turns raw conversions into temperature
//! (°C) and pressure (hPa) with the datasheet's fixed-point compensation.
//!
//! ```ignore
//! let mut bmp = Bmp085::new_default(i2c);
//! bmp.init()?;
//! let celsius = bmp.get_temperature(&mut delay)?;
//! let hpa = bmp.get_pressure(&mut delay)?;
//! ```

#![no_std]

mod altitude;
mod bmp085;
pub mod bus;
pub mod calibration;
pub mod compensation;

pub use crate::altitude::{altitude, sea_level_pressure, SEA_LEVEL_PRESSURE_HPA};
pub use crate::bmp085::{Bmp085, Config, Error, Measurements, Oversampling, BMP085_I2CADDR};
pub use crate::calibration::CalibrationCoefficients;
pub use crate::compensation::{CompensationError, Temperature};
