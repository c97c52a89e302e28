#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<PinE, AdcE> {
    /// Display clock or data pin error
    Display(PinE),
    /// Converter register access error
    Adc(AdcE),
}

impl<PinE, AdcE> Error<PinE, AdcE> {
    pub fn as_str(&self) -> &'static str {
        match self {
            Error::Display(_) => "Display pin error",
            Error::Adc(_) => "ADC error",
        }
    }
}
