//! Barometric altitude, datasheet section 3.6.

use num_traits::Float;

/// Standard atmosphere at sea level, in hPa.
pub const SEA_LEVEL_PRESSURE_HPA: f32 = 1013.25;

/// Calculate absolute altitude in meters
pub fn altitude(pressure_hpa: f32, sea_level_hpa: f32) -> f32 {
    44330.0 * (1.0 - Float::powf(pressure_hpa / sea_level_hpa, 1.0 / 5.255))
}

/// Calculate pressure at sea level in hPa
pub fn sea_level_pressure(pressure_hpa: f32, altitude_m: f32) -> f32 {
    pressure_hpa / Float::powf(1.0 - altitude_m / 44330.0, 5.255)
}
