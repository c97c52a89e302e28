//! Sign recovery and rendering of a reading.
//!
//! The LM35 cannot output below 0 V, so its ground pin sits one diode drop
//! above the board ground. Vout minus the GND pin voltage is then positive
//! above 0 °C and negative below it. The magnitude is kept in millivolts,
//! which at 10 mV/°C reads as tenths of a degree on a colon-split display.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::adc::{Acquisition, AdcRegisters, AveragedSample};
use crate::constants::*;
use crate::display::{DataLine, Tm1637};
use crate::error::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Sign {
    AboveZero,
    BelowZero,
}

impl Sign {
    /// Glyph shown in the rightmost position.
    pub const fn glyph(self) -> u8 {
        match self {
            Sign::AboveZero => DEGREE,
            Sign::BelowZero => MINUS,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TemperatureReading {
    pub sign: Sign,
    pub magnitude: u16,
}

impl TemperatureReading {
    /// Equal voltages count as below zero.
    pub const fn from_millivolts(signal: u16, reference: u16) -> Self {
        if signal > reference {
            Self {
                sign: Sign::AboveZero,
                magnitude: signal - reference,
            }
        } else {
            Self {
                sign: Sign::BelowZero,
                magnitude: reference - signal,
            }
        }
    }

    pub fn from_samples(signal: AveragedSample, reference: AveragedSample) -> Self {
        Self::from_millivolts(signal.millivolts, reference.millivolts)
    }

    pub const fn digits(&self) -> DigitTriple {
        DigitTriple::from_magnitude(self.magnitude)
    }
}

/// Base 10 split of a magnitude.
///
/// `hundreds` is not reduced mod 10: a magnitude of 1000 or more gives a
/// value above 9, which the display shows blank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DigitTriple {
    pub hundreds: u8,
    pub tens: u8,
    pub ones: u8,
}

impl DigitTriple {
    pub const fn from_magnitude(magnitude: u16) -> Self {
        let hundreds = magnitude / 100;
        Self {
            hundreds: if hundreds > u8::MAX as u16 {
                u8::MAX
            } else {
                hundreds as u8
            },
            tens: ((magnitude % 100) / 10) as u8,
            ones: (magnitude % 10) as u8,
        }
    }

    /// Digits in display order, positions 0 to 2.
    pub const fn as_array(&self) -> [u8; 3] {
        [self.hundreds, self.tens, self.ones]
    }
}

/// Sign glyph at position 3 first, then the digits at positions 0 to 2.
pub fn render<CLK, DIO, D, E>(
    display: &mut Tm1637<CLK, DIO, D>,
    reading: &TemperatureReading,
) -> Result<(), E>
where
    CLK: OutputPin<Error = E>,
    DIO: DataLine<Error = E>,
    D: DelayNs,
{
    display.write_segments(SIGN_POSITION, reading.sign.glyph())?;
    for (position, digit) in (0u8..).zip(reading.digits().as_array()) {
        display.write_digit(position, digit)?;
    }
    Ok(())
}

pub struct Thermometer<ADC, CLK, DIO, D> {
    acquisition: Acquisition<ADC>,
    display: Tm1637<CLK, DIO, D>,
}

impl<ADC, CLK, DIO, D, E> Thermometer<ADC, CLK, DIO, D>
where
    ADC: AdcRegisters,
    CLK: OutputPin<Error = E>,
    DIO: DataLine<Error = E>,
    D: DelayNs,
{
    /// The display should already be initialised.
    pub fn new(acquisition: Acquisition<ADC>, display: Tm1637<CLK, DIO, D>) -> Self {
        Self {
            acquisition,
            display,
        }
    }

    pub fn destroy(self) -> (Acquisition<ADC>, Tm1637<CLK, DIO, D>) {
        (self.acquisition, self.display)
    }

    pub fn acquisition(&mut self) -> &mut Acquisition<ADC> {
        &mut self.acquisition
    }

    pub fn display(&mut self) -> &mut Tm1637<CLK, DIO, D> {
        &mut self.display
    }

    pub fn measure(&mut self) -> Result<TemperatureReading, Error<E, ADC::Error>> {
        let (signal, reference) = self.acquisition.average_pair().map_err(Error::Adc)?;
        let reading = TemperatureReading::from_samples(signal, reference);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "signal {=u16} mV, reference {=u16} mV -> {}",
            signal.millivolts,
            reference.millivolts,
            reading
        );

        Ok(reading)
    }

    /// One cycle: measure, then show the result.
    pub fn update(&mut self) -> Result<TemperatureReading, Error<E, ADC::Error>> {
        let reading = self.measure()?;
        render(&mut self.display, &reading).map_err(Error::Display)?;
        Ok(reading)
    }
}
