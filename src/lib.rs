#![no_std]

pub mod adc;
mod constants;
pub mod display;
mod error;
pub mod thermometer;

pub use adc::{
    scale_millivolts, Acquisition, AdcRegisters, AveragedSample, Channel, RawSample, ScaledSample,
};
pub use constants::*;
pub use display::{DataLine, DisplayConfig, OpenDrain, Tm1637};
pub use error::Error;
pub use thermometer::{render, DigitTriple, Sign, TemperatureReading, Thermometer};
