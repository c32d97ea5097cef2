//! Fixed-point compensation, datasheet section 3.5.
//!
//! Everything runs in `i64`. Right shifts are arithmetic and divisions
//! truncate toward zero, which reproduces the reference integer output
//! exactly. Corrupt calibration can still push the pressure terms past
//! `i64`, or the result past `i32`; the pressure path is checked and
//! reports [`CompensationError::Overflow`] instead.

use core::convert::TryFrom;

use crate::bmp085::Oversampling;
use crate::calibration::CalibrationCoefficients;

/// Arithmetic fault in the compensation formulas, caused by corrupt
/// calibration data or a faulty sensor.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompensationError {
    /// `X1 + MD` is zero in the temperature formula
    TemperatureDivisor,
    /// `B4` is zero in the pressure formula
    PressureDivisor,
    /// An intermediate or the final pressure does not fit its integer type
    Overflow,
}

fn mul(a: i64, b: i64) -> Result<i64, CompensationError> {
    a.checked_mul(b).ok_or(CompensationError::Overflow)
}

fn add(a: i64, b: i64) -> Result<i64, CompensationError> {
    a.checked_add(b).ok_or(CompensationError::Overflow)
}

fn div(a: i64, b: i64) -> Result<i64, CompensationError> {
    a.checked_div(b).ok_or(CompensationError::Overflow)
}

/// Compensated temperature together with the `B5` term pressure needs.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Temperature {
    pub b5: i32,
    /// temperature in 0.1 °C
    pub deci_celsius: i32,
}

impl Temperature {
    pub fn celsius(&self) -> f32 {
        self.deci_celsius as f32 / 10.0
    }
}

/// Calculate true temperature from the uncompensated value `ut`.
pub fn temperature(
    calib: &CalibrationCoefficients,
    ut: i32,
) -> Result<Temperature, CompensationError> {
    let x1 = ((ut as i64 - calib.ac6 as i64) * calib.ac5 as i64) >> 15;
    let divisor = x1 + calib.md as i64;
    if divisor == 0 {
        return Err(CompensationError::TemperatureDivisor);
    }
    let x2 = ((calib.mc as i64) << 11) / divisor;
    let b5 = x1 + x2;

    Ok(Temperature {
        b5: b5 as i32,
        deci_celsius: ((b5 + 8) >> 4) as i32,
    })
}

/// Calculate true pressure in Pa from the uncompensated value `up`.
///
/// `b5` must come from a temperature conversion of the same sample period.
pub fn pressure(
    calib: &CalibrationCoefficients,
    b5: i32,
    up: i32,
    oversampling: Oversampling,
) -> Result<i32, CompensationError> {
    let oss = oversampling.bits();
    let ac1 = calib.ac1 as i64;
    let ac2 = calib.ac2 as i64;
    let ac3 = calib.ac3 as i64;
    let ac4 = calib.ac4 as i64;
    let b1 = calib.b1 as i64;
    let b2 = calib.b2 as i64;

    let b6 = b5 as i64 - 4000;
    let b6_sq = mul(b6, b6)? >> 12;
    let x1 = mul(b2, b6_sq)? >> 11;
    let x2 = mul(ac2, b6)? >> 11;
    let x3 = add(x1, x2)?;
    let b3 = div(add(mul(add(mul(ac1, 4)?, x3)?, 1i64 << oss)?, 2)?, 4)?;

    let x1 = mul(ac3, b6)? >> 13;
    let x2 = mul(b1, b6_sq)? >> 16;
    let x3 = add(add(x1, x2)?, 2)? >> 2;
    let b4 = mul(ac4, add(x3, 32768)?)? >> 15;
    if b4 == 0 {
        return Err(CompensationError::PressureDivisor);
    }

    let b7 = mul(add(up as i64, -b3)?, 50000i64 >> oss)?;
    // the two orders truncate differently, keep both
    let p = if b7 < 0x8000_0000 {
        div(mul(b7, 2)?, b4)?
    } else {
        mul(div(b7, b4)?, 2)?
    };

    let x1 = mul(p >> 8, p >> 8)?;
    let x1 = mul(x1, 3038)? >> 16;
    let x2 = mul(-7357, p)? >> 16;
    let p = add(p, add(add(x1, x2)?, 3791)? >> 4)?;

    i32::try_from(p).map_err(|_| CompensationError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn datasheet() -> CalibrationCoefficients {
        CalibrationCoefficients {
            ac1: 408,
            ac2: -72,
            ac3: -14383,
            ac4: 32741,
            ac5: 32757,
            ac6: 23153,
            b1: 6190,
            b2: 4,
            mb: -32768,
            mc: -8711,
            md: 2868,
        }
    }

    #[test]
    fn datasheet_temperature() {
        let t = temperature(&datasheet(), 27898).unwrap();
        // the datasheet prints B5 = 2399 after rounding X2 down, C division
        // truncates to 2400; both give 150
        assert_eq!(t.b5, 2400);
        assert_eq!(t.deci_celsius, 150);
        assert_eq!(t.celsius(), 15.0);
    }

    #[test]
    fn datasheet_pressure() {
        let p = pressure(&datasheet(), 2400, 23843, Oversampling::UltraLowPower).unwrap();
        assert_eq!(p, 69964);
    }

    #[test]
    fn temperature_divisor_zero() {
        let calib = CalibrationCoefficients {
            ac5: 0,
            md: 0,
            ..datasheet()
        };
        assert_eq!(
            temperature(&calib, 27898),
            Err(CompensationError::TemperatureDivisor)
        );
    }

    #[test]
    fn pressure_divisor_zero() {
        let calib = CalibrationCoefficients {
            ac4: 0,
            ..datasheet()
        };
        assert_eq!(
            pressure(&calib, 2400, 23843, Oversampling::UltraLowPower),
            Err(CompensationError::PressureDivisor)
        );
    }

    #[test]
    fn oversampling_scales_consistently() {
        // the same physical pressure sampled at a higher setting gives
        // `up << oss`, which must land on the same Pa value
        let calib = datasheet();
        let base = pressure(&calib, 2400, 23843, Oversampling::UltraLowPower).unwrap();
        let high = pressure(&calib, 2400, 23843 << 3, Oversampling::UltraHighResolution).unwrap();
        assert!((base - high).abs() <= 2, "{} vs {}", base, high);
    }

    #[test]
    fn corrupt_calibration_overflows_pressure_tail() {
        // AC4 = 1, B2 = 0x7FFF, MC = 0x8000, MD = 1, the rest zero
        let bytes = [
            0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0x7F, 0xFF, 0, 0, 0x80, 0x00, 0, 1,
        ];
        let calib = CalibrationCoefficients::from_bytes(&bytes);
        let t = temperature(&calib, 27898).unwrap();
        assert_eq!(t.b5, -67108864);
        assert_eq!(
            pressure(&calib, t.b5, 23843, Oversampling::UltraLowPower),
            Err(CompensationError::Overflow)
        );
    }

    #[test]
    fn pressure_out_of_i32_range() {
        let calib = CalibrationCoefficients {
            ac1: -32768,
            ac4: 1,
            ..Default::default()
        };
        assert_eq!(
            pressure(&calib, 4000, 65535, Oversampling::UltraLowPower),
            Err(CompensationError::Overflow)
        );
    }
}
