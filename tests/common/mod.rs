#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};
use tm1637_thermometer::{AdcRegisters, Channel, DataLine, Thermometer, Tm1637};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Clk(bool),
    Dio(bool),
    Release,
    Reclaim(bool),
    Sample(bool),
}

#[derive(Default)]
pub struct Bus {
    pub events: Vec<Event>,
    pub nack: bool,
    pub delay_ns: u64,
    dio_latch: bool,
    dio_input: bool,
}

impl Bus {
    pub fn is_released(&self) -> bool {
        self.dio_input
    }
}

pub type SharedBus = Rc<RefCell<Bus>>;

pub struct MockClk(pub SharedBus);

impl ErrorType for MockClk {
    type Error = Infallible;
}

impl OutputPin for MockClk {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Clk(false));
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.borrow_mut().events.push(Event::Clk(true));
        Ok(())
    }
}

/// Data pin with an AVR-style port latch: writes while released only move the pull-up.
pub struct MockDio(pub SharedBus);

impl MockDio {
    fn write(&mut self, level: bool) {
        let mut bus = self.0.borrow_mut();
        bus.dio_latch = level;
        if !bus.dio_input {
            bus.events.push(Event::Dio(level));
        }
    }
}

impl ErrorType for MockDio {
    type Error = Infallible;
}

impl OutputPin for MockDio {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.write(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.write(true);
        Ok(())
    }
}

impl InputPin for MockDio {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        let mut bus = self.0.borrow_mut();
        // a released line is pulled low by an acknowledging display
        let level = if bus.dio_input { bus.nack } else { bus.dio_latch };
        bus.events.push(Event::Sample(level));
        Ok(level)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}

impl DataLine for MockDio {
    fn release(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        bus.dio_input = true;
        bus.dio_latch = true;
        bus.events.push(Event::Release);
        Ok(())
    }

    fn reclaim(&mut self) -> Result<(), Self::Error> {
        let mut bus = self.0.borrow_mut();
        if bus.dio_input {
            bus.dio_input = false;
            let level = bus.dio_latch;
            bus.events.push(Event::Reclaim(level));
        }
        Ok(())
    }
}

pub struct MockDelay(pub SharedBus);

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.borrow_mut().delay_ns += u64::from(ns);
    }
}

pub type MockDisplay = Tm1637<MockClk, MockDio, MockDelay>;
pub type MockThermometer = Thermometer<MockAdc, MockClk, MockDio, MockDelay>;

pub fn display() -> (MockDisplay, SharedBus) {
    let bus = SharedBus::default();
    let display = Tm1637::new(
        MockClk(bus.clone()),
        MockDio(bus.clone()),
        MockDelay(bus.clone()),
    );
    (display, bus)
}

pub fn take_events(bus: &SharedBus) -> Vec<Event> {
    core::mem::take(&mut bus.borrow_mut().events)
}

/// Reassemble start..stop frames from pin activity, the way a logic analyzer would.
///
/// Bits are taken on rising clock edges, LSB first; every ninth edge is the ACK slot.
pub fn decode(events: &[Event]) -> Vec<Vec<u8>> {
    let mut frames = Vec::new();
    let mut frame: Option<Vec<u8>> = None;
    let mut clk = false;
    let mut dio = false;
    let mut released = false;
    let mut bits = 0u8;
    let mut byte = 0u8;

    for event in events {
        match *event {
            Event::Clk(level) => {
                if !clk && level {
                    if let Some(frame) = frame.as_mut() {
                        if bits == 8 {
                            frame.push(byte);
                            bits = 0;
                            byte = 0;
                        } else {
                            if dio {
                                byte |= 1 << bits;
                            }
                            bits += 1;
                        }
                    }
                }
                clk = level;
            }
            Event::Dio(level) => {
                if clk && !released {
                    if dio && !level {
                        frame = Some(Vec::new());
                        bits = 0;
                        byte = 0;
                    } else if !dio && level {
                        if let Some(done) = frame.take() {
                            frames.push(done);
                        }
                    }
                }
                dio = level;
            }
            Event::Release => released = true,
            Event::Reclaim(level) => {
                released = false;
                dio = level;
            }
            Event::Sample(_) => {}
        }
    }
    frames
}

/// Data level on each rising clock edge before the ACK window opens.
pub fn data_bits(events: &[Event]) -> Vec<bool> {
    let mut clk = false;
    let mut dio = false;
    let mut bits = Vec::new();
    for event in events {
        match *event {
            Event::Clk(level) => {
                if !clk && level {
                    bits.push(dio);
                }
                clk = level;
            }
            Event::Dio(level) => dio = level,
            Event::Release => break,
            _ => {}
        }
    }
    bits
}

/// Segment byte last written to `position`, from decoded frames.
pub fn segments_at(frames: &[Vec<u8>], position: u8) -> Option<u8> {
    frames
        .iter()
        .rev()
        .find(|frame| frame.len() == 2 && frame[0] == 0xC0 | position)
        .map(|frame| frame[1])
}

struct Source {
    queue: VecDeque<u16>,
    last: u16,
}

impl Source {
    fn next(&mut self) -> u16 {
        if let Some(value) = self.queue.pop_front() {
            self.last = value;
        }
        self.last
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdcOp {
    Select(Channel),
    Start,
    Poll,
    ReadLow,
    ReadHigh,
}

/// Converter that reports busy for `busy_polls` polls per conversion.
pub struct MockAdc {
    pub ops: Vec<AdcOp>,
    pub busy_polls: u8,
    signal: Source,
    reference: Source,
    selected: Option<Channel>,
    remaining: u8,
    result: u16,
    low_read: bool,
}

impl MockAdc {
    pub fn new(signal: &[u16], reference: &[u16]) -> Self {
        Self {
            ops: Vec::new(),
            busy_polls: 2,
            signal: Source {
                queue: signal.iter().copied().collect(),
                last: 0,
            },
            reference: Source {
                queue: reference.iter().copied().collect(),
                last: 0,
            },
            selected: None,
            remaining: 0,
            result: 0,
            low_read: false,
        }
    }

    pub fn constant(signal: u16, reference: u16) -> Self {
        Self::new(&[signal], &[reference])
    }

    pub fn conversions(&self) -> usize {
        self.ops.iter().filter(|op| **op == AdcOp::Start).count()
    }
}

impl AdcRegisters for MockAdc {
    type Error = Infallible;

    fn select(&mut self, channel: Channel) -> Result<(), Self::Error> {
        self.ops.push(AdcOp::Select(channel));
        self.selected = Some(channel);
        Ok(())
    }

    fn start_conversion(&mut self) -> Result<(), Self::Error> {
        self.ops.push(AdcOp::Start);
        self.result = match self.selected.expect("no channel selected") {
            Channel::Signal => self.signal.next(),
            Channel::Reference => self.reference.next(),
        };
        self.remaining = self.busy_polls;
        Ok(())
    }

    fn is_converting(&mut self) -> Result<bool, Self::Error> {
        self.ops.push(AdcOp::Poll);
        if self.remaining > 0 {
            self.remaining -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read_low(&mut self) -> Result<u8, Self::Error> {
        assert_eq!(self.remaining, 0, "read before conversion finished");
        self.ops.push(AdcOp::ReadLow);
        self.low_read = true;
        Ok(self.result.to_le_bytes()[0])
    }

    fn read_high(&mut self) -> Result<u8, Self::Error> {
        assert!(self.low_read, "ADCH read before ADCL");
        self.ops.push(AdcOp::ReadHigh);
        self.low_read = false;
        Ok(self.result.to_le_bytes()[1])
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdcFault;

/// Converter whose status register cannot be read.
pub struct FaultyAdc;

impl AdcRegisters for FaultyAdc {
    type Error = AdcFault;

    fn select(&mut self, _channel: Channel) -> Result<(), Self::Error> {
        Ok(())
    }

    fn start_conversion(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn is_converting(&mut self) -> Result<bool, Self::Error> {
        Err(AdcFault)
    }

    fn read_low(&mut self) -> Result<u8, Self::Error> {
        Ok(0)
    }

    fn read_high(&mut self) -> Result<u8, Self::Error> {
        Ok(0)
    }
}
