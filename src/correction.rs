//! Temperature correction factor, read with `HRT` and written with `HST`.
//!
//! The chip corrects its output as
//! `Vo = Vb + dT'·(T - Tb)² + dT·(T - Tb)`, using the `1` terms below `Tb` and the `2`
//! terms above it.

use strum::EnumCount;
use strum_macros::EnumCount as EnumCountMacro;

use crate::{error::ValidationError, units::ConversionFactors};

/// Position of each value in the six word `HRT` / `HST` payload.
#[derive(Debug, Copy, Clone, EnumCountMacro, PartialEq, Eq, PartialOrd, Ord)]
#[repr(usize)]
pub enum CorrectionWord {
    /// Second order coefficient below Tb.
    Dt1Slope = 0,
    /// Second order coefficient above Tb.
    Dt2Slope = 1,
    /// First order coefficient below Tb.
    Dt1 = 2,
    /// First order coefficient above Tb.
    Dt2 = 3,
    /// Reference voltage.
    Vb = 4,
    /// Reference temperature.
    Tb = 5,
}

pub type CorrectionWords = [u16; CorrectionWord::COUNT];

/// Temperature correction factor in physical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureCorrection {
    /// dT1' in mV/°C².
    pub dt1_slope: f64,
    /// dT2' in mV/°C².
    pub dt2_slope: f64,
    /// dT1 in mV/°C.
    pub dt1: f64,
    /// dT2 in mV/°C.
    pub dt2: f64,
    /// Reference voltage in volts.
    pub vb: f64,
    /// Reference temperature in °C.
    pub tb: f64,
}

impl TemperatureCorrection {
    pub fn from_words(words: &CorrectionWords, factors: &ConversionFactors) -> Self {
        use CorrectionWord as CW;
        Self {
            dt1_slope: factors.raw_to_second_coefficient(words[CW::Dt1Slope as usize]),
            dt2_slope: factors.raw_to_second_coefficient(words[CW::Dt2Slope as usize]),
            dt1: factors.raw_to_first_coefficient(words[CW::Dt1 as usize]),
            dt2: factors.raw_to_first_coefficient(words[CW::Dt2 as usize]),
            vb: factors.raw_to_voltage(words[CW::Vb as usize]),
            tb: factors.raw_to_temperature(words[CW::Tb as usize]),
        }
    }

    /// Check the caller settable values against what the chip can encode.
    ///
    /// `vb` is not checked here: the chip's own value is written back unchanged.
    pub fn validate(&self, factors: &ConversionFactors) -> Result<(), ValidationError> {
        let slope = factors.second_coefficient_range();
        let first = factors.first_coefficient_range();

        first.check("dT1", self.dt1)?;
        first.check("dT2", self.dt2)?;
        slope.check("dT1'", self.dt1_slope)?;
        slope.check("dT2'", self.dt2_slope)?;
        factors.temperature_range().check("Tb", self.tb)?;
        Ok(())
    }

    /// Generate the `HST` payload.
    pub fn to_words(&self, factors: &ConversionFactors) -> CorrectionWords {
        use CorrectionWord as CW;

        let mut words: CorrectionWords = [0x00; CW::COUNT];
        words[CW::Dt1Slope as usize] = factors.second_coefficient_to_raw(self.dt1_slope);
        words[CW::Dt2Slope as usize] = factors.second_coefficient_to_raw(self.dt2_slope);
        words[CW::Dt1 as usize] = factors.first_coefficient_to_raw(self.dt1);
        words[CW::Dt2 as usize] = factors.first_coefficient_to_raw(self.dt2);
        words[CW::Vb as usize] = factors.voltage_to_raw(self.vb);
        words[CW::Tb as usize] = factors.temperature_to_raw(self.tb);
        words
    }
}
