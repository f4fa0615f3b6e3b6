//! This is a platform-agnostic Rust driver for the SHT30 temperature and
//! humidity sensor, talking to a register-level two-wire (TWI/I2C) controller
//! and using the [`embedded-hal`] traits for timing.
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//!
//! For further details of the device architecture and operation, please refer
//! to the official [`Datasheet`].
//!
//! [`Datasheet`]: https://sensirion.com/media/documents/213E6A3B/63A5A569/Datasheet_SHT3x_DIS.pdf

#![doc(html_root_url = "https://docs.rs/sht30/latest")]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), no_std)]

mod registers;
pub use registers::*;

mod measurement;
pub use measurement::*;

pub mod bus;
pub use bus::{BusState, Control, Peripheral, Twi};

pub mod blocking;

mod crc;

#[cfg(test)]
mod sim;

use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};

/// ADDR pin logic level representation.
#[derive(Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddrPin {
    /// ADDR tied to GND (default).
    #[default]
    Low,
    /// ADDR tied to VDD.
    High,
}

impl From<AddrPin> for u8 {
    fn from(connection: AddrPin) -> Self {
        match connection {
            AddrPin::Low => 0x44,
            AddrPin::High => 0x45,
        }
    }
}

/// Outcome of a driver operation.
///
/// The set is closed: every bus transaction and every sensor operation fails
/// with exactly one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The current driver configuration does not allow the operation.
    #[error("operation not valid for the current configuration")]
    Config,

    /// The device has no measurement data available.
    #[error("no measurement data available")]
    NoData,

    /// A received data word did not match its check byte.
    #[error("checksum mismatch")]
    Crc,

    /// The device declined an address or data byte.
    #[error("not acknowledged: {0}")]
    Nack(NoAcknowledgeSource),

    /// The controller did not confirm a start or repeated start condition.
    #[error("start condition not confirmed by the controller")]
    Start,

    /// The controller reported a bus fault.
    #[error("bus error")]
    Bus,

    /// A caller supplied argument is out of range.
    #[error("invalid parameter")]
    Param,

    /// The controller did not signal completion in time.
    #[error("timed out waiting for the bus")]
    Timeout,
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {
            Error::Nack(source) => ErrorKind::NoAcknowledge(source),
            Error::Bus => ErrorKind::Bus,
            Error::Start => ErrorKind::ArbitrationLoss,
            _ => ErrorKind::Other,
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Config => defmt::write!(f, "Config"),
            Error::NoData => defmt::write!(f, "NoData"),
            Error::Crc => defmt::write!(f, "Crc"),
            Error::Nack(NoAcknowledgeSource::Address) => defmt::write!(f, "Nack(Address)"),
            Error::Nack(NoAcknowledgeSource::Data) => defmt::write!(f, "Nack(Data)"),
            Error::Nack(NoAcknowledgeSource::Unknown) => defmt::write!(f, "Nack(Unknown)"),
            Error::Start => defmt::write!(f, "Start"),
            Error::Bus => defmt::write!(f, "Bus"),
            Error::Param => defmt::write!(f, "Param"),
            Error::Timeout => defmt::write!(f, "Timeout"),
        }
    }
}
