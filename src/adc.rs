//! Differential sampling of the LM35 through its ground-return diode.

use crate::constants::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// Sensor Vout, which includes the diode drop.
    Signal,
    /// Sensor GND pin, the diode drop alone.
    Reference,
}

/// Register-level access to a 10-bit successive approximation converter
///
/// The result must be read low byte first: on AVR, reading ADCL locks the
/// result registers until ADCH is read.
pub trait AdcRegisters {
    type Error;

    /// Route `channel` to the converter input and enable it.
    fn select(&mut self, channel: Channel) -> Result<(), Self::Error>;

    /// Start a single conversion.
    fn start_conversion(&mut self) -> Result<(), Self::Error>;

    /// `true` while the start-conversion flag is still set.
    fn is_converting(&mut self) -> Result<bool, Self::Error>;

    fn read_low(&mut self) -> Result<u8, Self::Error>;

    fn read_high(&mut self) -> Result<u8, Self::Error>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub channel: Channel,
    pub value: u16,
}

impl RawSample {
    /// Bits above the converter resolution are dropped.
    pub const fn new(channel: Channel, value: u16) -> Self {
        Self {
            channel,
            value: value & ADC_MAX,
        }
    }
}

/// Sample in millivolts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScaledSample {
    pub channel: Channel,
    pub millivolts: u16,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AveragedSample {
    pub channel: Channel,
    pub millivolts: u16,
}

/// `raw * 1000 / 1024 * vref`, with the divide done as a shift before the
/// reference multiply. For whole-volt references this is bit-exact with
/// `((raw * 1000) >> 10) * volts`.
pub const fn scale_millivolts(raw: u16, reference_mv: u16) -> u16 {
    let per_mille = ((raw & ADC_MAX) as u32 * 1000) >> ADC_RESOLUTION_BITS;
    (per_mille * reference_mv as u32 / 1000) as u16
}

pub struct Acquisition<ADC> {
    adc: ADC,
    reference_mv: u16,
}

impl<ADC: AdcRegisters> Acquisition<ADC> {
    pub fn new(adc: ADC, reference_mv: u16) -> Self {
        Self { adc, reference_mv }
    }

    pub fn destroy(self) -> ADC {
        self.adc
    }

    pub fn reference_mv(&self) -> u16 {
        self.reference_mv
    }

    /// Run one conversion on `channel`.
    ///
    /// Busy-waits on the converter with no timeout.
    pub fn sample(&mut self, channel: Channel) -> Result<RawSample, ADC::Error> {
        self.adc.select(channel)?;
        self.adc.start_conversion()?;
        while self.adc.is_converting()? {}

        let low = self.adc.read_low()?;
        let high = self.adc.read_high()?;
        Ok(RawSample::new(channel, u16::from_le_bytes([low, high])))
    }

    pub fn scale(&self, raw: RawSample) -> ScaledSample {
        ScaledSample {
            channel: raw.channel,
            millivolts: scale_millivolts(raw.value, self.reference_mv),
        }
    }

    pub fn average_of_16(&mut self, channel: Channel) -> Result<AveragedSample, ADC::Error> {
        let mut sum = 0u32;
        for _ in 0..SAMPLES_PER_AVERAGE {
            let raw = self.sample(channel)?;
            sum += u32::from(self.scale(raw).millivolts);
        }
        Ok(AveragedSample {
            channel,
            millivolts: (sum >> AVERAGE_SHIFT) as u16,
        })
    }

    /// Average both channels with their conversions interleaved, so the two
    /// means cover the same window.
    ///
    /// Returns `(signal, reference)`.
    pub fn average_pair(&mut self) -> Result<(AveragedSample, AveragedSample), ADC::Error> {
        let mut signal = 0u32;
        let mut reference = 0u32;
        for _ in 0..SAMPLES_PER_AVERAGE {
            let raw = self.sample(Channel::Signal)?;
            signal += u32::from(self.scale(raw).millivolts);
            let raw = self.sample(Channel::Reference)?;
            reference += u32::from(self.scale(raw).millivolts);
        }
        Ok((
            AveragedSample {
                channel: Channel::Signal,
                millivolts: (signal >> AVERAGE_SHIFT) as u16,
            },
            AveragedSample {
                channel: Channel::Reference,
                millivolts: (reference >> AVERAGE_SHIFT) as u16,
            },
        ))
    }
}
