//! Bit-banged TM1637 two-wire display bus.
//!
//! The bus looks like I2C but has no addressing and shifts bits LSB first:
//!
//! ```txt
//! CLK ‾‾‾‾‾‾‾\__/‾‾\__/‾‾\ ... __/‾‾\__/‾‾(ack)‾‾\_____/‾‾‾‾
//! DIO ‾‾‾\___X b0 X b1 X  ... X b7 X  released  X___/‾‾‾‾‾
//!        start                                     stop
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin, PinState};

use crate::constants::*;

/// Data pin that can be handed to the display for the ACK window and taken back.
pub trait DataLine: OutputPin + InputPin {
    /// Stop driving the line and let the pull-up take it high.
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Drive the line again at the last level written.
    fn reclaim(&mut self) -> Result<(), Self::Error>;
}

/// Open-drain pin with an external or internal pull-up.
///
/// Writing high already releases such a pin, so no direction switch is needed.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P> OpenDrain<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn destroy(self) -> P {
        self.pin
    }
}

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

impl<P: OutputPin + InputPin> DataLine for OpenDrain<P> {
    fn release(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn reclaim(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Last display control state sent to the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayConfig {
    enabled: bool,
    brightness: u8,
}

impl DisplayConfig {
    /// Brightness above [`MAX_BRIGHTNESS`] is clamped.
    pub const fn new(enabled: bool, brightness: u8) -> Self {
        Self {
            enabled,
            brightness: if brightness > MAX_BRIGHTNESS {
                MAX_BRIGHTNESS
            } else {
                brightness
            },
        }
    }

    pub const fn enabled(&self) -> bool {
        self.enabled
    }

    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    pub const fn with_enabled(self, enabled: bool) -> Self {
        Self::new(enabled, self.brightness)
    }

    pub const fn with_brightness(self, brightness: u8) -> Self {
        Self::new(self.enabled, brightness)
    }

    pub const fn control_byte(&self) -> u8 {
        let on = if self.enabled {
            command::display::ON
        } else {
            command::display::OFF
        };
        command::SET_DISPLAY | on | self.brightness
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self::new(true, MAX_BRIGHTNESS)
    }
}

pub struct Tm1637<CLK, DIO, D> {
    clk: CLK,
    dio: DIO,
    delay: D,
    bit_delay_us: u32,
    config: DisplayConfig,
    position1: u8, // host byte for the colon bit
    missed_acks: u16,
}

impl<CLK, DIO, D, E> Tm1637<CLK, DIO, D>
where
    CLK: OutputPin<Error = E>,
    DIO: DataLine<Error = E>,
    D: DelayNs,
{
    pub fn new(clk: CLK, dio: DIO, delay: D) -> Self {
        Self {
            clk,
            dio,
            delay,
            bit_delay_us: DEFAULT_BIT_DELAY_US,
            config: DisplayConfig::default(),
            position1: 0xFF,
            missed_acks: 0,
        }
    }

    pub fn destroy(self) -> (CLK, DIO, D) {
        (self.clk, self.dio, self.delay)
    }

    /// Drive both lines low and send the first display control command.
    ///
    /// Call once, before anything else.
    pub fn init(&mut self, enabled: bool, brightness: u8) -> Result<(), E> {
        self.clk.set_low()?;
        self.dio.set_low()?;
        self.dio.reclaim()?;
        self.send_config(DisplayConfig::new(enabled, brightness))
    }

    pub fn config(&self) -> DisplayConfig {
        self.config
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<(), E> {
        self.send_config(self.config.with_enabled(enabled))
    }

    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), E> {
        self.send_config(self.config.with_brightness(brightness))
    }

    /// Write a raw segment pattern to one position.
    ///
    /// Only the low two bits of `position` are used.
    pub fn write_segments(&mut self, position: u8, segments: u8) -> Result<(), E> {
        let address = position & (NUM_POSITIONS - 1);

        #[cfg(feature = "defmt")]
        defmt::trace!("segments {=u8:#x} -> position {=u8}", segments, address);

        self.send_command(command::SET_DATA | command::data::FIXED_ADDRESS)?;
        self.start()?;
        self.write_byte(command::SET_ADDRESS | address)?;
        self.write_byte(segments)?;
        self.stop()
    }

    /// Digits above 9 are shown blank.
    pub fn write_digit(&mut self, position: u8, digit: u8) -> Result<(), E> {
        let segments = NUMBERS.get(digit as usize).copied().unwrap_or(BLANK);

        if position == 1 {
            self.write_position1(segments | (self.position1 & COLON_MASK))
        } else {
            self.write_segments(position, segments)
        }
    }

    pub fn set_colon(&mut self, on: bool) -> Result<(), E> {
        let segments = if on {
            self.position1 | COLON_MASK
        } else {
            self.position1 & !COLON_MASK
        };
        self.write_position1(segments)
    }

    pub fn colon(&self) -> bool {
        self.position1 & COLON_MASK != 0
    }

    /// Blank every position. Colon and control state are kept.
    pub fn clear_all(&mut self) -> Result<(), E> {
        for position in 0..NUM_POSITIONS {
            self.write_segments(position, BLANK)?;
        }
        Ok(())
    }

    /// Bytes the display did not acknowledge, saturating.
    pub fn missed_acks(&self) -> u16 {
        self.missed_acks
    }

    pub fn reset_missed_acks(&mut self) {
        self.missed_acks = 0;
    }

    pub fn bit_delay_us(&self) -> u32 {
        self.bit_delay_us
    }

    /// Retune the half-clock delay for a different core clock.
    pub fn set_bit_delay_us(&mut self, us: u32) {
        self.bit_delay_us = us;
    }

    /// Start, one byte, stop.
    pub fn send_command(&mut self, value: u8) -> Result<(), E> {
        #[cfg(feature = "defmt")]
        defmt::trace!("command {=u8:#x}", value);

        self.start()?;
        self.write_byte(value)?;
        self.stop()
    }

    pub fn start(&mut self) -> Result<(), E> {
        self.dio.reclaim()?;
        self.dio.set_high()?;
        self.clk.set_high()?;
        self.bit_delay();
        self.dio.set_low()
    }

    pub fn stop(&mut self) -> Result<(), E> {
        self.clk.set_low()?;
        self.bit_delay();
        self.dio.set_low()?;
        self.bit_delay();
        self.clk.set_high()?;
        self.bit_delay();
        self.dio.set_high()
    }

    /// Shift out one byte LSB first and clock in the ACK bit.
    ///
    /// Returns `true` if the display pulled DIO low. The data line is driven
    /// again when this returns, whatever the answer and even on a pin error.
    pub fn write_byte(&mut self, value: u8) -> Result<bool, E> {
        let mut value = value;
        for _ in 0..8 {
            self.clk.set_low()?;
            self.bit_delay();
            self.dio.set_state(PinState::from(value & 0x01 != 0))?;
            self.clk.set_high()?;
            self.bit_delay();
            value >>= 1;
        }

        self.clk.set_low()?;
        self.dio.release()?;
        let ack = match self.ack_window() {
            Ok(ack) => ack,
            Err(err) => {
                self.dio.reclaim()?;
                return Err(err);
            }
        };
        self.dio.reclaim()?;

        if !ack {
            self.missed_acks = self.missed_acks.saturating_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!("no ack from display ({=u16} missed)", self.missed_acks);
        }

        Ok(ack)
    }

    /// Sample the released line and clock the ninth pulse. CLK ends low.
    fn ack_window(&mut self) -> Result<bool, E> {
        self.bit_delay();

        let ack = self.dio.is_low()?;
        if ack {
            // hold it low so the display letting go does not look like a stop
            self.dio.set_low()?;
            self.dio.reclaim()?;
        }
        self.bit_delay();
        self.clk.set_high()?;
        self.bit_delay();
        self.clk.set_low()?;
        self.bit_delay();
        Ok(ack)
    }

    /// Stored only once sent, so the colon mirror matches the device.
    fn write_position1(&mut self, segments: u8) -> Result<(), E> {
        self.write_segments(1, segments)?;
        self.position1 = segments;
        Ok(())
    }

    fn send_config(&mut self, config: DisplayConfig) -> Result<(), E> {
        self.send_command(config.control_byte())?;
        self.config = config;
        Ok(())
    }

    fn bit_delay(&mut self) {
        self.delay.delay_us(self.bit_delay_us);
    }
}
