use crate::crc;
use crate::{Error, TemperatureUnits};

/// Unprocessed measurement as delivered by the device.
///
/// Only produced by a read whose two data words both passed checksum
/// verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawMeasurement {
    temperature: u16,
    humidity: u16,
    temperature_crc: u8,
    humidity_crc: u8,
}

impl RawMeasurement {
    const FULL_SCALE: f32 = 65535.0;

    /// Parse `[t_msb, t_lsb, t_crc, rh_msb, rh_lsb, rh_crc]`, verifying each
    /// word against its check byte.
    pub(crate) fn from_bytes(bytes: [u8; 6]) -> Result<Self, Error> {
        let [t_msb, t_lsb, t_crc, h_msb, h_lsb, h_crc] = bytes;
        let temperature = crc::verify([t_msb, t_lsb, t_crc])?;
        let humidity = crc::verify([h_msb, h_lsb, h_crc])?;

        Ok(Self {
            temperature,
            humidity,
            temperature_crc: t_crc,
            humidity_crc: h_crc,
        })
    }

    /// Raw temperature code.
    pub fn temperature(&self) -> u16 {
        self.temperature
    }

    /// Raw relative humidity code.
    pub fn humidity(&self) -> u16 {
        self.humidity
    }

    /// Check byte received with the temperature code.
    pub fn temperature_crc(&self) -> u8 {
        self.temperature_crc
    }

    /// Check byte received with the humidity code.
    pub fn humidity_crc(&self) -> u8 {
        self.humidity_crc
    }

    /// Temperature in the requested units.
    pub fn temperature_in(&self, units: TemperatureUnits) -> f32 {
        let ratio = f32::from(self.temperature) / Self::FULL_SCALE;
        match units {
            TemperatureUnits::Celsius => -45.0 + 175.0 * ratio,
            TemperatureUnits::Fahrenheit => -49.0 + 315.0 * ratio,
        }
    }

    /// Relative humidity in percent.
    pub fn relative_humidity(&self) -> f32 {
        100.0 * f32::from(self.humidity) / Self::FULL_SCALE
    }
}

/// Measurement converted to engineering units.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    temperature: f32,
    humidity: f32,
    units: TemperatureUnits,
}

impl Measurement {
    pub(crate) fn new(raw: &RawMeasurement, units: TemperatureUnits) -> Self {
        Self {
            temperature: raw.temperature_in(units),
            humidity: raw.relative_humidity(),
            units,
        }
    }

    /// Temperature in [`Measurement::units`].
    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f32 {
        self.humidity
    }

    /// Units of [`Measurement::temperature`].
    pub fn units(&self) -> TemperatureUnits {
        self.units
    }
}

#[cfg(test)]
mod tests {
    use assert_approx_eq::assert_approx_eq;

    use super::*;

    #[test]
    fn parse_verified_words() {
        let raw = RawMeasurement::from_bytes([0x64, 0x00, 0x57, 0x00, 0x8f, 0xd5]).unwrap();
        assert_eq!(raw.temperature(), 0x6400);
        assert_eq!(raw.humidity(), 0x008f);
        assert_eq!(raw.temperature_crc(), 0x57);
        assert_eq!(raw.humidity_crc(), 0xd5);
    }

    #[test]
    fn reject_either_corrupted_word() {
        let bad_temperature = RawMeasurement::from_bytes([0x64, 0x00, 0x58, 0x00, 0x8f, 0xd5]);
        assert_eq!(bad_temperature, Err(Error::Crc));

        let bad_humidity = RawMeasurement::from_bytes([0x64, 0x00, 0x57, 0x00, 0x8f, 0xd4]);
        assert_eq!(bad_humidity, Err(Error::Crc));
    }

    #[test]
    fn convert_to_engineering_units() {
        let raw = RawMeasurement::from_bytes([0x64, 0x00, 0x57, 0x00, 0x8f, 0xd5]).unwrap();
        assert_approx_eq!(raw.temperature_in(TemperatureUnits::Celsius), 23.3604, 1e-3);
        assert_approx_eq!(raw.temperature_in(TemperatureUnits::Fahrenheit), 74.0487, 1e-3);
        assert_approx_eq!(raw.relative_humidity(), 0.2182, 1e-3);
    }

    #[test]
    fn conversion_range_limits() {
        let low = RawMeasurement::from_bytes([0x00, 0x00, 0x81, 0x00, 0x00, 0x81]).unwrap();
        assert_approx_eq!(low.temperature_in(TemperatureUnits::Celsius), -45.0, 1e-4);
        assert_approx_eq!(low.temperature_in(TemperatureUnits::Fahrenheit), -49.0, 1e-4);
        assert_approx_eq!(low.relative_humidity(), 0.0, 1e-4);

        let high = RawMeasurement::from_bytes([0xff, 0xff, 0xac, 0xff, 0xff, 0xac]).unwrap();
        assert_approx_eq!(high.temperature_in(TemperatureUnits::Celsius), 130.0, 1e-4);
        assert_approx_eq!(high.temperature_in(TemperatureUnits::Fahrenheit), 266.0, 1e-4);
        assert_approx_eq!(high.relative_humidity(), 100.0, 1e-4);
    }

    #[test]
    fn measurement_keeps_units() {
        let raw = RawMeasurement::from_bytes([0x64, 0x00, 0x57, 0x00, 0x8f, 0xd5]).unwrap();
        let m = Measurement::new(&raw, TemperatureUnits::Fahrenheit);
        assert_eq!(m.units(), TemperatureUnits::Fahrenheit);
        assert_approx_eq!(m.temperature(), 74.0487, 1e-3);
        assert_approx_eq!(m.humidity(), 0.2182, 1e-3);
    }
}
