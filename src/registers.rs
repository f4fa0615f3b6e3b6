#![allow(missing_docs)]
use bilge::prelude::*;

/// Device commands. Every command is sent as a big-endian 16-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Single shot measurement, clock stretching disabled.
    SingleShot(Resolution),

    /// Single shot measurement, clock stretching enabled.
    SingleShotClockStretch(Resolution),

    /// Start periodic acquisition.
    Periodic(MeasurementFrequency, Resolution),

    /// Fetch the latest periodic measurement.
    FetchData,

    /// Stop periodic acquisition.
    Break,

    /// Soft reset.
    SoftReset,

    /// Turn the heater on.
    HeaterEnable,

    /// Turn the heater off.
    HeaterDisable,

    /// Read the status register.
    ReadStatus,

    /// Clear the status register alert flags.
    ClearStatus,
}

impl From<Command> for u16 {
    fn from(cmd: Command) -> Self {
        use MeasurementFrequency::*;
        use Resolution::*;

        match cmd {
            Command::SingleShot(High) => 0x2400,
            Command::SingleShot(Medium) => 0x240b,
            Command::SingleShot(Low) => 0x2416,
            Command::SingleShotClockStretch(High) => 0x2c06,
            Command::SingleShotClockStretch(Medium) => 0x2c0d,
            Command::SingleShotClockStretch(Low) => 0x2c10,
            Command::Periodic(Mps0_5, High) => 0x2032,
            Command::Periodic(Mps0_5, Medium) => 0x2024,
            Command::Periodic(Mps0_5, Low) => 0x202f,
            Command::Periodic(Mps1, High) => 0x2130,
            Command::Periodic(Mps1, Medium) => 0x2126,
            Command::Periodic(Mps1, Low) => 0x212d,
            Command::Periodic(Mps2, High) => 0x2236,
            Command::Periodic(Mps2, Medium) => 0x2220,
            Command::Periodic(Mps2, Low) => 0x222b,
            Command::Periodic(Mps4, High) => 0x2334,
            Command::Periodic(Mps4, Medium) => 0x2322,
            Command::Periodic(Mps4, Low) => 0x2329,
            Command::Periodic(Mps10, High) => 0x2737,
            Command::Periodic(Mps10, Medium) => 0x2721,
            Command::Periodic(Mps10, Low) => 0x272a,
            Command::FetchData => 0xe000,
            Command::Break => 0x3093,
            Command::SoftReset => 0x30a2,
            Command::HeaterEnable => 0x306d,
            Command::HeaterDisable => 0x3066,
            Command::ReadStatus => 0xf32d,
            Command::ClearStatus => 0x3041,
        }
    }
}

impl From<Command> for [u8; 2] {
    fn from(cmd: Command) -> Self {
        u16::from(cmd).to_be_bytes()
    }
}

/// Status register.
#[bitsize(16)]
#[derive(DebugBits, FromBits, PartialEq)]
pub struct Status {
    /// Checksum of the last write transfer failed.
    pub write_checksum: bool,

    /// Last command was not processed.
    pub command: bool,

    reserved2_3: u2,

    /// A reset was detected since the last clear.
    pub system_reset: bool,

    reserved5_9: u5,

    /// Temperature tracking alert.
    pub temperature_alert: bool,

    /// Humidity tracking alert.
    pub humidity_alert: bool,

    reserved12: bool,

    /// Heater is on.
    pub heater: bool,

    reserved14: bool,

    /// At least one alert is pending.
    pub alert_pending: bool,
}

#[cfg(feature = "defmt")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u16:#06x})", self.value)
    }
}

/// Temperature units reported by [`crate::blocking::Sht30::read`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TemperatureUnits {
    /// Degrees Celsius (default).
    #[default]
    Celsius,

    /// Degrees Fahrenheit.
    Fahrenheit,
}

/// Data acquisition mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataMode {
    /// Single shot measurement without clock stretching. The driver holds the
    /// bus for the maximum measurement duration before reading (default).
    #[default]
    SingleShot,

    /// Single shot measurement with clock stretching. The device holds SCL low
    /// until the measurement is ready.
    ClockStretchSingleShot,

    /// Periodic acquisition at the configured `MeasurementFrequency`. Results
    /// are fetched from the device's buffer.
    Continuous,
}

/// Periodic acquisition rate in measurements per second.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementFrequency {
    /// 0.5 measurements per second.
    Mps0_5,

    /// 1 measurement per second (default).
    #[default]
    Mps1,

    /// 2 measurements per second.
    Mps2,

    /// 4 measurements per second.
    Mps4,

    /// 10 measurements per second.
    Mps10,
}

/// Measurement repeatability.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    /// Low repeatability.
    Low,

    /// Medium repeatability.
    Medium,

    /// High repeatability (default).
    #[default]
    High,
}

impl Resolution {
    /// Maximum single shot measurement duration in microseconds.
    pub fn max_duration_us(self) -> u32 {
        match self {
            Resolution::Low => 4_500,
            Resolution::Medium => 6_500,
            Resolution::High => 15_500,
        }
    }
}
