#![no_std]
#![no_main]

use attiny_hal as hal;
use core::convert::Infallible;
use embedded_hal::delay::DelayNs;
use hal::prelude::*;
use panic_halt as _;
use tm1637_thermometer::{
    Acquisition, AdcRegisters, Channel, Error, OpenDrain, Thermometer, Tm1637,
    DEFAULT_REFERENCE_MV,
};

type Delay = hal::delay::Delay<hal::clock::MHz1>;

const BRIGHTNESS: u8 = 5;

const ADMUX_MUX0: u8 = 1 << 0;
const ADMUX_MUX1: u8 = 1 << 1;
const ADCSRA_ADSC: u8 = 1 << 6;
const ADCSRA_ADEN: u8 = 1 << 7;

/// ADC2 (PB4) carries LM35 Vout, ADC3 (PB3) the LM35 GND pin. Vcc reference.
struct TinyAdc {
    adc: hal::pac::ADC,
    high: u8,
}

impl AdcRegisters for TinyAdc {
    type Error = Infallible;

    fn select(&mut self, channel: Channel) -> Result<(), Self::Error> {
        let mux = match channel {
            Channel::Signal => ADMUX_MUX1,
            Channel::Reference => ADMUX_MUX1 | ADMUX_MUX0,
        };
        self.adc.admux.write(|w| unsafe { w.bits(mux) });
        self.adc
            .adcsra
            .modify(|r, w| unsafe { w.bits(r.bits() | ADCSRA_ADEN) });
        Ok(())
    }

    fn start_conversion(&mut self) -> Result<(), Self::Error> {
        self.adc
            .adcsra
            .modify(|r, w| unsafe { w.bits(r.bits() | ADCSRA_ADSC) });
        Ok(())
    }

    fn is_converting(&mut self) -> Result<bool, Self::Error> {
        Ok(self.adc.adcsra.read().bits() & ADCSRA_ADSC != 0)
    }

    // the PAC reads ADCL and ADCH together
    fn read_low(&mut self) -> Result<u8, Self::Error> {
        let [low, high] = self.adc.adc.read().bits().to_le_bytes();
        self.high = high;
        Ok(low)
    }

    fn read_high(&mut self) -> Result<u8, Self::Error> {
        Ok(self.high)
    }
}

#[avr_device::entry]
fn main() -> ! {
    let dp = hal::Peripherals::take().unwrap();
    let pins = hal::pins!(dp);

    let _lm35_vout = pins.pb4.into_floating_input();
    let _lm35_gnd = pins.pb3.into_floating_input();

    let mut display = Tm1637::new(
        pins.pb1.into_output(),
        OpenDrain::new(pins.pb0.into_opendrain_high()),
        Delay::new(),
    );
    display.init(true, BRIGHTNESS).unwrap_infallible();

    let adc = TinyAdc {
        adc: dp.ADC,
        high: 0,
    };
    let mut thermometer = Thermometer::new(Acquisition::new(adc, DEFAULT_REFERENCE_MV), display);

    let mut delay = Delay::new();
    loop {
        match thermometer.update() {
            Ok(_reading) => {}
            Err(Error::Display(never) | Error::Adc(never)) => match never {},
        }
        delay.delay_ms(1000);
    }
}
