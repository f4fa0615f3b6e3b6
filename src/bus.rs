//! Two-wire bus transaction engine.
//!
//! [`Twi`] drives a register-level controller through the [`Peripheral`]
//! capability: every start, address, data and stop phase is issued as a
//! [`Control`] action, followed by a bounded wait on the completion flag and a
//! check of the reported [`BusState`].

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{self, NoAcknowledgeSource, Operation, SevenBitAddress};

use crate::Error;

/// Control actions the engine asks the controller to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Control {
    /// Drive a start (or repeated start) condition.
    Start,

    /// Drive a stop condition.
    Stop,

    /// Shift out the byte held in the data register.
    Transmit,

    /// Shift in a byte and acknowledge it.
    ReceiveAck,

    /// Shift in a byte and answer with not-acknowledge.
    ReceiveNack,

    /// Answer the peer with not-acknowledge without shifting in a byte.
    Nack,
}

/// Master mode bus state reported by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    /// A start condition has been transmitted.
    StartSent,

    /// A repeated start condition has been transmitted.
    RepeatedStartSent,

    /// SLA+W transmitted, ACK received.
    AddressWriteAck,

    /// SLA+W transmitted, NACK received.
    AddressWriteNack,

    /// Data byte transmitted, ACK received.
    DataSentAck,

    /// Data byte transmitted, NACK received.
    DataSentNack,

    /// Arbitration lost in SLA or data.
    ArbitrationLost,

    /// SLA+R transmitted, ACK received.
    AddressReadAck,

    /// SLA+R transmitted, NACK received.
    AddressReadNack,

    /// Data byte received, ACK returned.
    DataReceivedAck,

    /// Data byte received, NACK returned.
    DataReceivedNack,

    /// NACK returned with no data byte transferred. Never decoded from a
    /// status code; controllers that support [`Control::Nack`] report it.
    NackSent,

    /// No relevant state information available.
    NoInfo,

    /// Illegal start or stop condition detected on the bus.
    BusError,

    /// Any other status code.
    Unknown(u8),
}

impl From<u8> for BusState {
    fn from(status: u8) -> Self {
        match status & 0xf8 {
            0x08 => BusState::StartSent,
            0x10 => BusState::RepeatedStartSent,
            0x18 => BusState::AddressWriteAck,
            0x20 => BusState::AddressWriteNack,
            0x28 => BusState::DataSentAck,
            0x30 => BusState::DataSentNack,
            0x38 => BusState::ArbitrationLost,
            0x40 => BusState::AddressReadAck,
            0x48 => BusState::AddressReadNack,
            0x50 => BusState::DataReceivedAck,
            0x58 => BusState::DataReceivedNack,
            0xf8 => BusState::NoInfo,
            0x00 => BusState::BusError,
            code => BusState::Unknown(code),
        }
    }
}

/// Register-level control surface of a two-wire controller.
///
/// Construction and initialization of the controller (clock, pins, enable)
/// are the implementor's business.
pub trait Peripheral {
    /// Start the given control action. Returns immediately.
    fn begin(&mut self, control: Control);

    /// Whether the last control action has completed.
    fn is_complete(&mut self) -> bool;

    /// Current bus state.
    fn status(&mut self) -> BusState;

    /// Load the data register.
    fn write_data(&mut self, byte: u8);

    /// Read the data register.
    fn read_data(&mut self) -> u8;
}

impl<T: Peripheral + ?Sized> Peripheral for &mut T {
    fn begin(&mut self, control: Control) {
        T::begin(self, control)
    }

    fn is_complete(&mut self) -> bool {
        T::is_complete(self)
    }

    fn status(&mut self) -> BusState {
        T::status(self)
    }

    fn write_data(&mut self, byte: u8) {
        T::write_data(self, byte)
    }

    fn read_data(&mut self) -> u8 {
        T::read_data(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Write,
    Read,
}

/// Blocking transaction engine over a [`Peripheral`].
pub struct Twi<P: Peripheral, DELAY: DelayNs> {
    /// The concrete controller.
    peripheral: P,

    /// The concrete [`embedded_hal::delay::DelayNs`] implementation
    delay: DELAY,

    /// Upper bound on every wait for the completion flag.
    timeout_us: u32,
}

impl<P: Peripheral, DELAY: DelayNs> Twi<P, DELAY> {
    /// Default bound on a single wait. Covers the longest clock stretch of a
    /// high repeatability measurement.
    pub const DEFAULT_TIMEOUT_US: u32 = 25_000;
    const POLL_INTERVAL_US: u32 = 1;

    /// Create a new engine with the default timeout.
    pub fn new(peripheral: P, delay: DELAY) -> Self {
        Self {
            peripheral,
            delay,
            timeout_us: Self::DEFAULT_TIMEOUT_US,
        }
    }

    /// Use a different bound for each wait.
    #[must_use]
    pub fn with_timeout(mut self, timeout_us: u32) -> Self {
        self.timeout_us = timeout_us;
        self
    }

    /// Change the bound for each wait.
    pub fn set_timeout(&mut self, timeout_us: u32) {
        self.timeout_us = timeout_us;
    }

    /// Current bound for each wait, in microseconds.
    pub fn timeout_us(&self) -> u32 {
        self.timeout_us
    }

    /// Destroy the engine, return the peripheral and the delay.
    pub fn destroy(self) -> (P, DELAY) {
        (self.peripheral, self.delay)
    }

    pub(crate) fn delay_us(&mut self, us: u32) {
        self.delay.delay_us(us);
    }

    /// Write `bytes` to `address`, optionally ending with a stop condition.
    ///
    /// Every byte must be acknowledged; the first one that is not aborts the
    /// transfer.
    ///
    /// # Errors
    ///
    /// `Error::Start`, `Error::Nack`, `Error::Bus` or `Error::Timeout`
    pub fn transmit(&mut self, address: SevenBitAddress, bytes: &[u8], stop: bool) -> Result<(), Error> {
        let result = match self.start(address, Direction::Write) {
            Ok(()) => self.send(bytes),
            Err(e) => Err(e),
        };
        self.release_on_error(result)?;

        if stop {
            self.stop()?;
        }
        Ok(())
    }

    /// Read `buf.len()` bytes from `address`, optionally ending with a stop
    /// condition.
    ///
    /// Every byte but the last is acknowledged. An empty `buf` drives
    /// not-acknowledge straight away and stores nothing. On failure `buf` is
    /// zeroed.
    ///
    /// # Errors
    ///
    /// `Error::Start`, `Error::Nack`, `Error::Bus` or `Error::Timeout`
    pub fn receive(&mut self, address: SevenBitAddress, buf: &mut [u8], stop: bool) -> Result<(), Error> {
        let result = match self.start(address, Direction::Read) {
            Ok(()) => self.fill(buf, true),
            Err(e) => Err(e),
        };
        if result.is_err() {
            buf.fill(0);
        }
        self.release_on_error(result)?;

        if stop {
            self.stop()?;
        }
        Ok(())
    }

    /// Write `write`, then read into `read` after a repeated start.
    ///
    /// The read phase is only attempted if every written byte was
    /// acknowledged.
    ///
    /// # Errors
    ///
    /// See [`Twi::transmit`] and [`Twi::receive`].
    pub fn write_then_read(&mut self, address: SevenBitAddress, write: &[u8], read: &mut [u8]) -> Result<(), Error> {
        self.write_pause_read(address, write, 0, read)
    }

    /// Like [`Twi::write_then_read`], holding the bus for `pause_us` between
    /// the two phases.
    ///
    /// # Errors
    ///
    /// See [`Twi::transmit`] and [`Twi::receive`].
    pub fn write_pause_read(
        &mut self,
        address: SevenBitAddress,
        write: &[u8],
        pause_us: u32,
        read: &mut [u8],
    ) -> Result<(), Error> {
        self.transmit(address, write, false)?;

        if pause_us > 0 {
            self.delay.delay_us(pause_us);
        }

        self.receive(address, read, true)
    }

    fn execute(&mut self, control: Control) -> Result<BusState, Error> {
        self.peripheral.begin(control);
        self.wait()?;
        Ok(self.peripheral.status())
    }

    fn wait(&mut self) -> Result<(), Error> {
        let mut waited = 0;

        while !self.peripheral.is_complete() {
            if waited >= self.timeout_us {
                #[cfg(feature = "defmt")]
                defmt::warn!("bus wait timed out after {=u32} us", waited);
                return Err(Error::Timeout);
            }

            self.delay.delay_us(Self::POLL_INTERVAL_US);
            waited += Self::POLL_INTERVAL_US;
        }

        Ok(())
    }

    fn start(&mut self, address: SevenBitAddress, direction: Direction) -> Result<(), Error> {
        match self.execute(Control::Start)? {
            BusState::StartSent | BusState::RepeatedStartSent => {}
            BusState::BusError => return Err(Error::Bus),
            _state => {
                #[cfg(feature = "defmt")]
                defmt::warn!("start not confirmed: {}", _state);
                return Err(Error::Start);
            }
        }

        let (header, expected) = match direction {
            Direction::Write => (address << 1, BusState::AddressWriteAck),
            Direction::Read => ((address << 1) | 1, BusState::AddressReadAck),
        };

        self.peripheral.write_data(header);
        match self.execute(Control::Transmit)? {
            state if state == expected => Ok(()),
            BusState::BusError => Err(Error::Bus),
            _state => {
                #[cfg(feature = "defmt")]
                defmt::warn!("address {=u8:#04x} declined: {}", header, _state);
                Err(Error::Nack(NoAcknowledgeSource::Address))
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<(), Error> {
        for &byte in bytes {
            self.peripheral.write_data(byte);

            match self.execute(Control::Transmit)? {
                BusState::DataSentAck => {}
                BusState::DataSentNack => return Err(Error::Nack(NoAcknowledgeSource::Data)),
                _state => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("byte {=u8:#04x} not delivered: {}", byte, _state);
                    return Err(Error::Bus);
                }
            }
        }

        Ok(())
    }

    fn fill(&mut self, buf: &mut [u8], nack_last: bool) -> Result<(), Error> {
        if buf.is_empty() {
            if nack_last {
                match self.execute(Control::Nack)? {
                    BusState::NackSent => {}
                    _ => return Err(Error::Bus),
                }
            }
            return Ok(());
        }

        let last = buf.len() - 1;
        for (i, byte) in buf.iter_mut().enumerate() {
            let (control, expected) = if nack_last && i == last {
                (Control::ReceiveNack, BusState::DataReceivedNack)
            } else {
                (Control::ReceiveAck, BusState::DataReceivedAck)
            };

            match self.execute(control)? {
                state if state == expected => *byte = self.peripheral.read_data(),
                BusState::DataReceivedAck | BusState::DataReceivedNack => {
                    return Err(Error::Nack(NoAcknowledgeSource::Data));
                }
                _state => {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("receive of byte {=usize} failed: {}", i, _state);
                    return Err(Error::Bus);
                }
            }
        }

        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        self.peripheral.begin(Control::Stop);
        self.wait()
    }

    /// After a NACK or a bus fault, hand the bus back so the next transaction
    /// starts from idle. A failing stop must not mask the original error.
    fn release_on_error(&mut self, result: Result<(), Error>) -> Result<(), Error> {
        if let Err(Error::Nack(_) | Error::Bus) = result {
            let _ = self.stop();
        }
        result
    }

    fn run(&mut self, address: SevenBitAddress, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        let mut current = None;

        for i in 0..operations.len() {
            let read_follows = matches!(operations.get(i + 1), Some(Operation::Read(_)));

            match &mut operations[i] {
                Operation::Write(bytes) => {
                    if current != Some(Direction::Write) {
                        self.start(address, Direction::Write)?;
                        current = Some(Direction::Write);
                    }
                    self.send(&bytes[..])?;
                }
                Operation::Read(buf) => {
                    if current != Some(Direction::Read) {
                        self.start(address, Direction::Read)?;
                        current = Some(Direction::Read);
                    }
                    self.fill(&mut buf[..], !read_follows)?;
                }
            }
        }

        Ok(())
    }
}

impl<P: Peripheral, DELAY: DelayNs> i2c::ErrorType for Twi<P, DELAY> {
    type Error = Error;
}

impl<P: Peripheral, DELAY: DelayNs> i2c::I2c for Twi<P, DELAY> {
    fn transaction(&mut self, address: SevenBitAddress, operations: &mut [Operation<'_>]) -> Result<(), Error> {
        if address > 0x7f {
            return Err(Error::Param);
        }

        if operations.is_empty() {
            return Ok(());
        }

        let result = self.run(address, operations);
        self.release_on_error(result)?;
        self.stop()
    }
}
