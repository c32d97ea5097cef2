//! Factory calibration stored in the BMP085 EEPROM.

use crate::bmp085::Error;
use crate::bus::Bus;

pub const BMP085_CAL_AC1: u8 = 0xAA; // R   Calibration data (16 bits)
pub const BMP085_CAL_AC2: u8 = 0xAC; // R   Calibration data (16 bits)
pub const BMP085_CAL_AC3: u8 = 0xAE; // R   Calibration data (16 bits)
pub const BMP085_CAL_AC4: u8 = 0xB0; // R   Calibration data (16 bits, unsigned)
pub const BMP085_CAL_AC5: u8 = 0xB2; // R   Calibration data (16 bits, unsigned)
pub const BMP085_CAL_AC6: u8 = 0xB4; // R   Calibration data (16 bits, unsigned)
pub const BMP085_CAL_B1: u8 = 0xB6; // R   Calibration data (16 bits)
pub const BMP085_CAL_B2: u8 = 0xB8; // R   Calibration data (16 bits)
pub const BMP085_CAL_MB: u8 = 0xBA; // R   Calibration data (16 bits)
pub const BMP085_CAL_MC: u8 = 0xBC; // R   Calibration data (16 bits)
pub const BMP085_CAL_MD: u8 = 0xBE; // R   Calibration data (16 bits)

/// 0xAA..=0xBF
pub const CALIBRATION_LEN: usize = 22;

/// Whether the byte at `address` is the two's-complement high byte of a
/// signed calibration word.
///
/// High bytes sit at even addresses. AC4, AC5 and AC6 (0xB0..=0xB5) are
/// unsigned.
pub const fn is_signed_register(address: u8) -> bool {
    address % 2 == 0 && !matches!(address, BMP085_CAL_AC4..=0xB5)
}

/// The 11 calibration words, named as in the datasheet.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CalibrationCoefficients {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl CalibrationCoefficients {
    /// Parse the raw calibration block read from 0xAA.
    pub fn from_bytes(bytes: &[u8; CALIBRATION_LEN]) -> Self {
        let word = |register: u8| -> i32 {
            let offset = (register - BMP085_CAL_AC1) as usize;
            let high = if is_signed_register(register) {
                bytes[offset] as i8 as i32
            } else {
                bytes[offset] as i32
            };
            (high << 8) + bytes[offset + 1] as i32
        };

        CalibrationCoefficients {
            ac1: word(BMP085_CAL_AC1) as i16,
            ac2: word(BMP085_CAL_AC2) as i16,
            ac3: word(BMP085_CAL_AC3) as i16,
            ac4: word(BMP085_CAL_AC4) as u16,
            ac5: word(BMP085_CAL_AC5) as u16,
            ac6: word(BMP085_CAL_AC6) as u16,
            b1: word(BMP085_CAL_B1) as i16,
            b2: word(BMP085_CAL_B2) as i16,
            mb: word(BMP085_CAL_MB) as i16,
            mc: word(BMP085_CAL_MC) as i16,
            md: word(BMP085_CAL_MD) as i16,
        }
    }
}

/// Read the whole calibration block in one transfer.
pub fn load<B: Bus>(bus: &mut B) -> Result<CalibrationCoefficients, Error<B::Error>> {
    let mut bytes = [0u8; CALIBRATION_LEN];
    let read = bus.read_block(BMP085_CAL_AC1, &mut bytes)?;
    if read < CALIBRATION_LEN {
        return Err(Error::Calibration);
    }
    Ok(CalibrationCoefficients::from_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Sample coefficients from the datasheet, section 3.5.
    const DATASHEET: [u8; CALIBRATION_LEN] = [
        0x01, 0x98, 0xFF, 0xB8, 0xC7, 0xD1, 0x7F, 0xE5, 0x7F, 0xF5, 0x5A, 0x71, 0x18, 0x2E, 0x00,
        0x04, 0x80, 0x00, 0xDD, 0xF9, 0x0B, 0x34,
    ];

    struct BlockBus {
        data: [u8; CALIBRATION_LEN],
        available: usize,
    }

    impl Bus for BlockBus {
        type Error = ();

        fn read_byte(&mut self, register: u8) -> Result<u8, ()> {
            Ok(self.data[(register - BMP085_CAL_AC1) as usize])
        }

        fn read_block(&mut self, register: u8, buf: &mut [u8]) -> Result<usize, ()> {
            assert_eq!(register, BMP085_CAL_AC1);
            let n = self.available.min(buf.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            Ok(n)
        }

        fn write_byte(&mut self, _register: u8, _value: u8) -> Result<(), ()> {
            Err(())
        }
    }

    #[test]
    fn signed_registers() {
        assert!(is_signed_register(0xAA));
        assert!(is_signed_register(0xAC));
        assert!(is_signed_register(0xAE));
        assert!(!is_signed_register(0xAB));
        for address in 0xB0..=0xB5 {
            assert!(!is_signed_register(address), "{:#x}", address);
        }
        assert!(is_signed_register(0xB6));
        assert!(is_signed_register(0xBE));
        assert!(!is_signed_register(0xBF));
    }

    #[test]
    fn parse_datasheet_sample() {
        let calib = CalibrationCoefficients::from_bytes(&DATASHEET);
        assert_eq!(
            calib,
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
        );
    }

    #[test]
    fn unsigned_words_keep_high_bit() {
        let calib = CalibrationCoefficients::from_bytes(&[0xFF; CALIBRATION_LEN]);
        assert_eq!(calib.ac4, 0xFFFF);
        assert_eq!(calib.ac5, 0xFFFF);
        assert_eq!(calib.ac6, 0xFFFF);
        assert_eq!(calib.ac1, -1);
        assert_eq!(calib.md, -1);
    }

    #[test]
    fn zero_block_is_valid() {
        let mut bus = BlockBus {
            data: [0; CALIBRATION_LEN],
            available: CALIBRATION_LEN,
        };
        assert_eq!(load(&mut bus).unwrap(), CalibrationCoefficients::default());
    }

    #[test]
    fn load_is_deterministic() {
        let mut bus = BlockBus {
            data: DATASHEET,
            available: CALIBRATION_LEN,
        };
        let first = load(&mut bus).unwrap();
        let second = load(&mut bus).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn short_block_is_calibration_error() {
        let mut bus = BlockBus {
            data: DATASHEET,
            available: CALIBRATION_LEN - 1,
        };
        assert!(matches!(load(&mut bus), Err(Error::Calibration)));
    }
}
