//! Sht30 Blocking API

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::NoAcknowledgeSource;
#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::sensor;
#[cfg(feature = "embedded-sensors-hal")]
use embedded_sensors_hal::temperature::{DegreesCelsius, TemperatureSensor};

use super::{
    AddrPin, Command, DataMode, Error, Measurement, MeasurementFrequency, Peripheral, RawMeasurement, Resolution,
    Status, TemperatureUnits, Twi,
};
use crate::crc;

/// SHT30 blocking device driver
pub struct Sht30<P: Peripheral, DELAY: DelayNs> {
    /// The transaction engine over the concrete controller
    twi: Twi<P, DELAY>,

    /// The I2C address.
    pub(crate) addr: u8,

    units: TemperatureUnits,
    mode: DataMode,
    frequency: MeasurementFrequency,
    resolution: Resolution,

    /// Whether the device is running periodic acquisition.
    periodic: bool,

    /// Outcome of the most recent operation.
    last_result: Result<(), Error>,
}

impl<P: Peripheral, DELAY: DelayNs> Sht30<P, DELAY> {
    const SOFT_RESET_TIME_US: u32 = 1_500;
    const BREAK_TIME_US: u32 = 1_000;

    /// Create a new SHT30 instance.
    pub fn new_blocking(peripheral: P, delay: DELAY, addr: AddrPin) -> Self {
        Self {
            twi: Twi::new(peripheral, delay),
            addr: addr.into(),
            units: TemperatureUnits::default(),
            mode: DataMode::default(),
            frequency: MeasurementFrequency::default(),
            resolution: Resolution::default(),
            periodic: false,
            last_result: Ok(()),
        }
    }

    /// Create a new SHT30 instance with ADDR tied to GND, resulting in an
    /// instance responding to address `0x44`.
    pub fn new_blocking_with_addr_low(peripheral: P, delay: DELAY) -> Self {
        Self::new_blocking(peripheral, delay, AddrPin::Low)
    }

    /// Create a new SHT30 instance with ADDR tied to VDD, resulting in an
    /// instance responding to address `0x45`.
    pub fn new_blocking_with_addr_high(peripheral: P, delay: DELAY) -> Self {
        Self::new_blocking(peripheral, delay, AddrPin::High)
    }

    /// Destroy the driver instance, return the peripheral.
    pub fn destroy(self) -> P {
        self.twi.destroy().0
    }

    /// Set units for temperature
    pub fn set_temperature_units(&mut self, units: TemperatureUnits) {
        self.units = units;
    }

    /// Set data acquisition mode
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.mode = mode;
    }

    /// Set periodic measurement frequency
    pub fn set_measurement_frequency(&mut self, frequency: MeasurementFrequency) {
        self.frequency = frequency;
    }

    /// Set measurement resolution
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
    }

    /// Bound every wait on the bus to `timeout_us`.
    pub fn set_timeout(&mut self, timeout_us: u32) {
        self.twi.set_timeout(timeout_us);
    }

    /// Temperature units applied by [`Sht30::read`].
    pub fn temperature_units(&self) -> TemperatureUnits {
        self.units
    }

    /// Configured acquisition mode.
    pub fn data_mode(&self) -> DataMode {
        self.mode
    }

    /// Periodic acquisition rate used by [`Sht30::start_periodic`].
    pub fn measurement_frequency(&self) -> MeasurementFrequency {
        self.frequency
    }

    /// Configured measurement repeatability.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Whether periodic acquisition was started and not stopped since.
    pub fn is_periodic(&self) -> bool {
        self.periodic
    }

    /// Outcome of the most recent operation.
    pub fn last_result(&self) -> Result<(), Error> {
        self.last_result
    }

    /// Read a measurement converted to the configured temperature units.
    ///
    /// # Errors
    ///
    /// See [`Sht30::read_raw`].
    pub fn read(&mut self) -> Result<Measurement, Error> {
        let result = self.measure().map(|raw| Measurement::new(&raw, self.units));
        self.record(result)
    }

    /// Read an unprocessed measurement using the configured mode.
    ///
    /// # Errors
    ///
    /// `Error::Config` when the mode does not match the acquisition state of
    /// the device, `Error::NoData` when no periodic sample is ready,
    /// `Error::Crc` when either word fails its checksum, or any bus error.
    pub fn read_raw(&mut self) -> Result<RawMeasurement, Error> {
        let result = self.measure();
        self.record(result)
    }

    /// Read the status register
    ///
    /// # Errors
    ///
    /// `Error::Crc` when the status word fails its checksum, or any bus error.
    pub fn read_status(&mut self) -> Result<Status, Error> {
        let mut data = [0; 3];
        let result = self
            .write_read(Command::ReadStatus, 0, &mut data)
            .and_then(|()| crc::verify(data))
            .map(Status::from);
        self.record(result)
    }

    /// Clear the status register alert flags
    ///
    /// # Errors
    ///
    /// Any bus error.
    pub fn clear_status(&mut self) -> Result<(), Error> {
        let result = self.write(Command::ClearStatus);
        self.record(result)
    }

    /// Soft reset the device.
    ///
    /// Only the command itself is checked; the device does not answer while
    /// it restarts.
    ///
    /// # Errors
    ///
    /// Any bus error.
    pub fn soft_reset(&mut self) -> Result<(), Error> {
        let result = self.write(Command::SoftReset);
        if result.is_ok() {
            self.periodic = false;
            self.twi.delay_us(Self::SOFT_RESET_TIME_US);
        }
        self.record(result)
    }

    /// Start periodic acquisition at the configured frequency and
    /// resolution.
    ///
    /// # Errors
    ///
    /// `Error::Config` unless the mode is [`DataMode::Continuous`], or any bus
    /// error.
    pub fn start_periodic(&mut self) -> Result<(), Error> {
        let result = if self.mode == DataMode::Continuous {
            self.write(Command::Periodic(self.frequency, self.resolution))
        } else {
            Err(Error::Config)
        };
        if result.is_ok() {
            self.periodic = true;
        }
        self.record(result)
    }

    /// Stop periodic acquisition.
    ///
    /// # Errors
    ///
    /// Any bus error.
    pub fn stop_periodic(&mut self) -> Result<(), Error> {
        let result = self.write(Command::Break);
        if result.is_ok() {
            self.periodic = false;
            self.twi.delay_us(Self::BREAK_TIME_US);
        }
        self.record(result)
    }

    /// Turn the internal heater on or off.
    ///
    /// # Errors
    ///
    /// Any bus error.
    pub fn set_heater(&mut self, on: bool) -> Result<(), Error> {
        let cmd = if on {
            Command::HeaterEnable
        } else {
            Command::HeaterDisable
        };
        let result = self.write(cmd);
        self.record(result)
    }

    fn measure(&mut self) -> Result<RawMeasurement, Error> {
        let mut data = [0; 6];

        match (self.mode, self.periodic) {
            (DataMode::SingleShot, false) => {
                let wait = self.resolution.max_duration_us();
                self.write_read(Command::SingleShot(self.resolution), wait, &mut data)?;
            }
            (DataMode::ClockStretchSingleShot, false) => {
                self.write_read(Command::SingleShotClockStretch(self.resolution), 0, &mut data)?;
            }
            (DataMode::Continuous, true) => {
                // The device declines its read header until a sample is ready.
                self.write_read(Command::FetchData, 0, &mut data)
                    .map_err(|e| match e {
                        Error::Nack(NoAcknowledgeSource::Address) => Error::NoData,
                        e => e,
                    })?;
            }
            _ => return Err(Error::Config),
        }

        RawMeasurement::from_bytes(data)
    }

    fn write(&mut self, cmd: Command) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("sht30 command {=u16:#06x}", u16::from(cmd));

        let bytes: [u8; 2] = cmd.into();
        self.twi.transmit(self.addr, &bytes, true)
    }

    fn write_read(&mut self, cmd: Command, pause_us: u32, read: &mut [u8]) -> Result<(), Error> {
        #[cfg(feature = "defmt")]
        defmt::trace!("sht30 command {=u16:#06x}", u16::from(cmd));

        let bytes: [u8; 2] = cmd.into();
        self.twi.write_pause_read(self.addr, &bytes, pause_us, read)
    }

    fn record<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        self.last_result = result.as_ref().map(|_| ()).map_err(|e| *e);
        result
    }
}

#[cfg(feature = "embedded-sensors-hal")]
impl sensor::Error for Error {
    fn kind(&self) -> sensor::ErrorKind {
        sensor::ErrorKind::Other
    }
}

#[cfg(feature = "embedded-sensors-hal")]
impl<P: Peripheral, DELAY: DelayNs> sensor::ErrorType for Sht30<P, DELAY> {
    type Error = Error;
}

#[cfg(feature = "embedded-sensors-hal")]
impl<P: Peripheral, DELAY: DelayNs> TemperatureSensor for Sht30<P, DELAY> {
    fn temperature(&mut self) -> Result<DegreesCelsius, Self::Error> {
        self.read_raw().map(|raw| raw.temperature_in(TemperatureUnits::Celsius))
    }
}
