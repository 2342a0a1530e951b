//! This module contains the values the HV chip reports back.

use core::fmt;

use modular_bitfield::prelude::*;

/// Raw layout of the status byte, as sent by `HGS` and in the first `HPO` word.
///
/// Bits 2, 3, 4 and 6 are set when something is *wrong*, see [`Status`] for the decoded view.
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusBits {
    pub high_voltage_on: bool,
    pub overcurrent_protection: bool,
    pub current_out_of_specification: bool,
    pub sensor_disconnected: bool,
    pub sensor_out_of_specification: bool,
    #[skip]
    unused_5: B1,
    pub temperature_conversion_ineffective: bool,
    #[skip]
    unused_7: B1,
}

/// Decoded status byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub high_voltage_on: bool,
    pub overcurrent_protection: bool,
    pub current_in_specification: bool,
    pub sensor_connected: bool,
    pub sensor_in_specification: bool,
    pub temperature_conversion_effective: bool,
}

impl From<StatusBits> for Status {
    fn from(bits: StatusBits) -> Self {
        Self {
            high_voltage_on: bits.high_voltage_on(),
            overcurrent_protection: bits.overcurrent_protection(),
            current_in_specification: !bits.current_out_of_specification(),
            sensor_connected: !bits.sensor_disconnected(),
            sensor_in_specification: !bits.sensor_out_of_specification(),
            temperature_conversion_effective: !bits.temperature_conversion_ineffective(),
        }
    }
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        StatusBits::from_bytes([value]).into()
    }
}

impl From<u16> for Status {
    /// Only the low byte carries status.
    fn from(value: u16) -> Self {
        Status::from(value.to_le_bytes()[0])
    }
}

/// Everything `HPO` reports in one go.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonitoringInfo {
    /// The status word as received.
    pub status_raw: u16,
    pub status: Status,
    /// Output voltage setting in volts.
    pub voltage_set: f64,
    /// Measured output voltage in volts.
    pub voltage_monitored: f64,
    /// Measured output current.
    pub current_monitored: f64,
    /// Sensor temperature in °C.
    pub temperature: f64,
}

/// Over-current protection setting, as reported by the power function word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverCurrentProtection {
    AutomaticRestoration,
    NotInUse,
    ErrorInResponseData,
}

impl fmt::Display for OverCurrentProtection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::AutomaticRestoration => "Automatic Restoration",
            Self::NotInUse => "Not in use",
            Self::ErrorInResponseData => "Error in Response Data",
        })
    }
}

/// Output voltage control setting, as reported by the power function word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputVoltageControl {
    Effectiveness,
    Invalid,
    ErrorInResponseData,
}

impl fmt::Display for OutputVoltageControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Effectiveness => "Effectiveness",
            Self::Invalid => "Invalid",
            Self::ErrorInResponseData => "Error in Response Data",
        })
    }
}

/// Decoded power function word.
///
/// | raw | over-current protection | output voltage control |
/// |-----|-------------------------|------------------------|
/// | 0   | Not in use              | Invalid                |
/// | 1   | Automatic Restoration   | Invalid                |
/// | 2   | Not in use              | Effectiveness          |
/// | 3   | Automatic Restoration   | Effectiveness          |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerFunction {
    pub raw: u16,
    pub over_current_protection: OverCurrentProtection,
    pub output_voltage_control: OutputVoltageControl,
}

impl PowerFunction {
    const OCP_BIT: u16 = 0x01;
    const OVC_BIT: u16 = 0x02;

    /// The code to send with `HSC` for the requested combination.
    pub const fn code(over_current_protection: bool, output_voltage_control: bool) -> u16 {
        let mut code = 0;
        if over_current_protection {
            code |= Self::OCP_BIT;
        }
        if output_voltage_control {
            code |= Self::OVC_BIT;
        }
        code
    }

    /// Whether over-current protection is on, if the chip gave a usable answer.
    pub fn over_current_protection_enabled(&self) -> Option<bool> {
        match self.over_current_protection {
            OverCurrentProtection::AutomaticRestoration => Some(true),
            OverCurrentProtection::NotInUse => Some(false),
            OverCurrentProtection::ErrorInResponseData => None,
        }
    }

    /// Whether output voltage control is on, if the chip gave a usable answer.
    pub fn output_voltage_control_enabled(&self) -> Option<bool> {
        match self.output_voltage_control {
            OutputVoltageControl::Effectiveness => Some(true),
            OutputVoltageControl::Invalid => Some(false),
            OutputVoltageControl::ErrorInResponseData => None,
        }
    }
}

impl From<u16> for PowerFunction {
    fn from(raw: u16) -> Self {
        use OutputVoltageControl as OVC;
        use OverCurrentProtection as OCP;
        let (over_current_protection, output_voltage_control) = match raw {
            0 => (OCP::NotInUse, OVC::Invalid),
            1 => (OCP::AutomaticRestoration, OVC::Invalid),
            2 => (OCP::NotInUse, OVC::Effectiveness),
            3 => (OCP::AutomaticRestoration, OVC::Effectiveness),
            _ => (OCP::ErrorInResponseData, OVC::ErrorInResponseData),
        };
        Self {
            raw,
            over_current_protection,
            output_voltage_control,
        }
    }
}

/// Used to be less ambiguous and whether something is on or off.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum State {
    /// Disabled.
    #[default]
    Off,
    /// Enabled.
    On,
}

impl State {
    /// The flag byte `HCM` expects.
    pub(crate) const fn flag(&self) -> &'static [u8] {
        match self {
            State::Off => b"0",
            State::On => b"1",
        }
    }
}

impl From<State> for bool {
    fn from(value: State) -> Self {
        match value {
            State::Off => false,
            State::On => true,
        }
    }
}

impl From<bool> for State {
    fn from(value: bool) -> Self {
        match value {
            true => State::On,
            false => State::Off,
        }
    }
}
