//! Session configuration.

use fugit::MillisDurationU32;

use crate::units::ConversionFactors;

/// Default baud rate of the chip.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// How long to wait for a complete response frame by default.
pub const DEFAULT_RESPONSE_TIMEOUT: MillisDurationU32 = MillisDurationU32::millis(1000);

/// Settings for one [`HvChip`](crate::chip::HvChip) session.
///
/// The baud rate is only recorded here, the port itself is opened by the caller with
/// 8 data bits, even parity and 1 stop bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChipConfig {
    pub baud_rate: u32,
    /// Upper bound on waiting for a response frame.
    pub response_timeout: MillisDurationU32,
    pub factors: ConversionFactors,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            factors: ConversionFactors::default(),
        }
    }
}

impl ChipConfig {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_response_timeout(mut self, timeout: MillisDurationU32) -> Self {
        self.response_timeout = timeout;
        self
    }

    pub fn with_factors(mut self, factors: ConversionFactors) -> Self {
        self.factors = factors;
        self
    }

    /// The response timeout as a std duration.
    pub fn response_timeout_std(&self) -> core::time::Duration {
        core::time::Duration::from_millis(self.response_timeout.to_millis() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ChipConfig::default();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.response_timeout.to_millis(), 1000);
        assert_eq!(config.factors, ConversionFactors::HAMAMATSU);
    }

    #[test]
    fn builder() {
        let config = ChipConfig::default()
            .with_baud_rate(38400)
            .with_response_timeout(MillisDurationU32::millis(250));
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.response_timeout_std(), core::time::Duration::from_millis(250));
    }
}
