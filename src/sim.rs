//! Simulated controller with a single scripted peer, for unit tests.

use std::collections::VecDeque;

use crate::bus::{BusState, Control, Peripheral};
use crate::crc;

/// Bus activity as seen by the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Event {
    Start,
    RepeatedStart,
    Address(u8),
    Write(u8),
    Receive { ack: bool },
    Nack,
    Stop,
}

/// One-shot misbehaviour, except `Stall` which never clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fault {
    NackWriteAddress,
    NackReadAddress,
    /// NACK the n-th data byte written in a transaction.
    NackByte(usize),
    BusErrorOnStart,
    /// Bus error while writing the n-th data byte of a transaction.
    BusErrorOnByte(usize),
    /// Bus error while receiving the n-th byte of a transaction.
    BusErrorOnReceive(usize),
    ArbitrationLost,
    Stall,
}

pub(crate) struct Sim {
    address: u8,
    data: u8,
    state: BusState,
    owned: bool,
    header_pending: bool,
    written: usize,
    received: usize,
    response: VecDeque<u8>,
    faults: Vec<Fault>,
    pub(crate) events: Vec<Event>,
    /// Number of data register reads.
    pub(crate) reads: usize,
}

impl Sim {
    pub(crate) fn new(address: u8) -> Self {
        Self {
            address,
            data: 0,
            state: BusState::NoInfo,
            owned: false,
            header_pending: false,
            written: 0,
            received: 0,
            response: VecDeque::new(),
            faults: Vec::new(),
            events: Vec::new(),
            reads: 0,
        }
    }

    /// Queue bytes the peer shifts out on subsequent reads.
    pub(crate) fn respond(&mut self, bytes: &[u8]) {
        self.response.extend(bytes);
    }

    /// Queue a data word followed by its check byte.
    pub(crate) fn respond_word(&mut self, word: u16) {
        let [msb, lsb] = word.to_be_bytes();
        self.respond(&[msb, lsb, crc::checksum([msb, lsb])]);
    }

    pub(crate) fn fault(&mut self, fault: Fault) {
        self.faults.push(fault);
    }

    /// Every data byte written to the peer, in order.
    pub(crate) fn written(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Write(byte) => Some(*byte),
                _ => None,
            })
            .collect()
    }

    fn take(&mut self, fault: Fault) -> bool {
        match self.faults.iter().position(|f| *f == fault) {
            Some(index) => {
                self.faults.remove(index);
                true
            }
            None => false,
        }
    }

    fn start(&mut self) {
        if self.take(Fault::BusErrorOnStart) {
            self.state = BusState::BusError;
            return;
        }

        if self.take(Fault::ArbitrationLost) {
            self.owned = false;
            self.state = BusState::ArbitrationLost;
            return;
        }

        if self.owned {
            self.events.push(Event::RepeatedStart);
            self.state = BusState::RepeatedStartSent;
        } else {
            self.events.push(Event::Start);
            self.state = BusState::StartSent;
        }

        self.owned = true;
        self.header_pending = true;
        self.written = 0;
        self.received = 0;
    }

    fn transmit(&mut self) {
        let byte = self.data;

        if self.header_pending {
            self.header_pending = false;
            self.events.push(Event::Address(byte));

            let ours = byte >> 1 == self.address;
            self.state = if byte & 1 == 1 {
                if ours && !self.take(Fault::NackReadAddress) {
                    BusState::AddressReadAck
                } else {
                    BusState::AddressReadNack
                }
            } else if ours && !self.take(Fault::NackWriteAddress) {
                BusState::AddressWriteAck
            } else {
                BusState::AddressWriteNack
            };
            return;
        }

        let index = self.written;
        self.written += 1;

        if self.take(Fault::BusErrorOnByte(index)) {
            self.state = BusState::BusError;
            return;
        }

        self.events.push(Event::Write(byte));
        self.state = if self.take(Fault::NackByte(index)) {
            BusState::DataSentNack
        } else {
            BusState::DataSentAck
        };
    }

    fn receive(&mut self, ack: bool) {
        let index = self.received;
        self.received += 1;

        if self.take(Fault::BusErrorOnReceive(index)) {
            self.state = BusState::BusError;
            return;
        }

        self.events.push(Event::Receive { ack });
        self.data = self.response.pop_front().unwrap_or(0xff);
        self.state = if ack {
            BusState::DataReceivedAck
        } else {
            BusState::DataReceivedNack
        };
    }
}

impl Peripheral for Sim {
    fn begin(&mut self, control: Control) {
        match control {
            Control::Start => self.start(),
            Control::Transmit => self.transmit(),
            Control::ReceiveAck => self.receive(true),
            Control::ReceiveNack => self.receive(false),
            Control::Nack => {
                self.events.push(Event::Nack);
                self.state = BusState::NackSent;
            }
            Control::Stop => {
                self.events.push(Event::Stop);
                self.owned = false;
                self.state = BusState::NoInfo;
            }
        }
    }

    fn is_complete(&mut self) -> bool {
        !self.faults.contains(&Fault::Stall)
    }

    fn status(&mut self) -> BusState {
        self.state
    }

    fn write_data(&mut self, byte: u8) {
        self.data = byte;
    }

    fn read_data(&mut self) -> u8 {
        self.reads += 1;
        self.data
    }
}
