//! Conversion between raw 16-bit words and physical units.
//!
//! The chip reports and accepts everything as unsigned words. Voltage, current and the
//! correction coefficients are a straight scale factor, temperature follows an affine law
//! which runs backwards (a larger word is a colder sensor).

use crate::error::ValidationError;

/// Scale factors for converting raw words to standard units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConversionFactors {
    /// Volts per unit.
    pub voltage: f64,
    /// Amps per unit.
    pub current: f64,
    /// mV/°C per unit, for the first order correction terms dT1 / dT2.
    pub first_coefficient: f64,
    /// mV/°C² per unit, for the second order correction terms dT1' / dT2'.
    pub second_coefficient: f64,
    /// Temperature law: `T = (raw * temperature_slope - temperature_offset) / temperature_divisor`.
    pub temperature_slope: f64,
    pub temperature_offset: f64,
    pub temperature_divisor: f64,
}

impl Default for ConversionFactors {
    fn default() -> Self {
        Self::HAMAMATSU
    }
}

impl ConversionFactors {
    /// Factors published for the chip.
    pub const HAMAMATSU: ConversionFactors = ConversionFactors {
        voltage: 1.812e-3,
        current: 4.98e-3,
        first_coefficient: 5.225e-2,
        second_coefficient: 1.507e-3,
        temperature_slope: 1.907e-5,
        temperature_offset: 1.035,
        temperature_divisor: -5.5e-3,
    };

    #[inline]
    pub fn raw_to_voltage(&self, raw: u16) -> f64 {
        raw as f64 * self.voltage
    }

    #[inline]
    pub fn voltage_to_raw(&self, volts: f64) -> u16 {
        to_word(volts / self.voltage)
    }

    #[inline]
    pub fn raw_to_current(&self, raw: u16) -> f64 {
        raw as f64 * self.current
    }

    #[inline]
    pub fn current_to_raw(&self, amps: f64) -> u16 {
        to_word(amps / self.current)
    }

    #[inline]
    pub fn raw_to_first_coefficient(&self, raw: u16) -> f64 {
        raw as f64 * self.first_coefficient
    }

    #[inline]
    pub fn first_coefficient_to_raw(&self, value: f64) -> u16 {
        to_word(value / self.first_coefficient)
    }

    #[inline]
    pub fn raw_to_second_coefficient(&self, raw: u16) -> f64 {
        raw as f64 * self.second_coefficient
    }

    #[inline]
    pub fn second_coefficient_to_raw(&self, value: f64) -> u16 {
        to_word(value / self.second_coefficient)
    }

    /// Raw sensor word to °C.
    #[inline]
    pub fn raw_to_temperature(&self, raw: u16) -> f64 {
        (raw as f64 * self.temperature_slope - self.temperature_offset) / self.temperature_divisor
    }

    /// °C to raw sensor word.
    #[inline]
    pub fn temperature_to_raw(&self, celsius: f64) -> u16 {
        to_word(
            (celsius * self.temperature_divisor + self.temperature_offset) / self.temperature_slope,
        )
    }

    /// Reference voltage range the chip can encode.
    pub fn voltage_range(&self) -> ParameterRange {
        ParameterRange::from_raw(0x0000, 0xFFFF, |raw| self.raw_to_voltage(raw))
    }

    /// Range of the second order correction terms.
    pub fn second_coefficient_range(&self) -> ParameterRange {
        ParameterRange::from_raw(0x03E8, 0xFC18, |raw| self.raw_to_second_coefficient(raw))
    }

    /// Range of the first order correction terms.
    pub fn first_coefficient_range(&self) -> ParameterRange {
        ParameterRange::from_raw(0x0000, 0x0FFF, |raw| self.raw_to_first_coefficient(raw))
    }

    /// Range of the correction base temperature.
    pub fn temperature_range(&self) -> ParameterRange {
        ParameterRange::from_raw(0x0000, 0xFFFF, |raw| self.raw_to_temperature(raw))
    }
}

/// Round to the nearest word. Callers validate against a [`ParameterRange`] first, the clamp
/// only absorbs floating point error at the edges.
fn to_word(raw: f64) -> u16 {
    raw.round().clamp(0.0, u16::MAX as f64) as u16
}

/// Inclusive range of physical values which map onto a raw word range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRange {
    pub min: f64,
    pub max: f64,
}

impl ParameterRange {
    /// Map the raw bounds through `convert`. The ends are ordered afterwards, so decreasing
    /// laws such as temperature still give `min <= max`.
    pub fn from_raw(low: u16, high: u16, convert: impl Fn(u16) -> f64) -> Self {
        let (a, b) = (convert(low), convert(high));
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Check `value`, naming it `parameter` in the error.
    pub fn check(&self, parameter: &'static str, value: f64) -> Result<f64, ValidationError> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(ValidationError {
                parameter,
                value,
                min: self.min,
                max: self.max,
            })
        }
    }
}
