//! This module is used to define the commands understood by the HV chip.
//!
//! Each command is a three letter ASCII code. Requests carry the code in upper case and
//! the chip echoes it back in lower case. The catalog below records how many DATA bytes
//! the chip sends back for every command, which fixes the total size of every response.

use core::fmt;

use strum_macros::{EnumIter, EnumString, IntoStaticStr};

/// Bytes of framing around the DATA segment: STX + CMD(3) + ETX + CHK(2) + CR.
pub const FRAME_OVERHEAD: usize = 8;

/// Length of a command code.
pub const CODE_LEN: usize = 3;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, EnumIter, EnumString, IntoStaticStr)]
#[strum(ascii_case_insensitive)]
pub enum Command {
    /// Error sentinel. Only ever seen as an echo, its single word is a device error code.
    #[strum(serialize = "HXX")]
    Error,
    /// __R__ - Monitoring info: status, set voltage, output voltage, output current, temperature.
    #[strum(serialize = "HPO")]
    GetMonitoringInfo,
    /// __W__ - Temperature correction factor setting.
    ///
    /// Six words: dT1', dT2', dT1, dT2, Vb, Tb.
    #[strum(serialize = "HST")]
    SetTemperatureCorrection,
    /// __R__ - Temperature correction factor read, same layout as [`Command::SetTemperatureCorrection`].
    #[strum(serialize = "HRT")]
    GetTemperatureCorrection,
    /// __W__ - High voltage output off.
    #[strum(serialize = "HOF")]
    HighVoltageOff,
    /// __W__ - High voltage output on.
    #[strum(serialize = "HON")]
    HighVoltageOn,
    /// __W__ - Switch temperature compensation mode. Payload is a single `'0'` or `'1'` byte.
    #[strum(serialize = "HCM")]
    SetCompensationMode,
    /// __W__ - Power supply reset.
    #[strum(serialize = "HRE")]
    Reset,
    /// __W__ - Temporary reference voltage setting.
    #[strum(serialize = "HBV")]
    SetReferenceVoltage,
    /// __R__ - Sensor temperature.
    #[strum(serialize = "HGT")]
    GetTemperature,
    /// __R__ - Output voltage.
    #[strum(serialize = "HGV")]
    GetOutputVoltage,
    /// __R__ - Output current.
    #[strum(serialize = "HGC")]
    GetOutputCurrent,
    /// __R__ - Status byte.
    #[strum(serialize = "HGS")]
    GetStatus,
    /// __W__ - Power function setting (over-current protection / output voltage control).
    #[strum(serialize = "HSC")]
    SetPowerFunction,
    /// __R__ - Power function read.
    #[strum(serialize = "HRC")]
    GetPowerFunction,
}

impl Command {
    /// Number of DATA bytes (not words) in the chip's response to this command.
    pub const fn data_size(&self) -> usize {
        match self {
            Command::Error => 4,
            Command::GetMonitoringInfo => 20,
            Command::SetTemperatureCorrection => 24,
            Command::GetTemperatureCorrection => 24,
            Command::HighVoltageOff => 0,
            Command::HighVoltageOn => 0,
            Command::SetCompensationMode => 0,
            Command::Reset => 0,
            Command::SetReferenceVoltage => 0,
            Command::GetTemperature => 4,
            Command::GetOutputVoltage => 4,
            Command::GetOutputCurrent => 4,
            Command::GetStatus => 4,
            Command::SetPowerFunction => 0,
            Command::GetPowerFunction => 4,
        }
    }

    /// Total length of the response frame for this command.
    pub const fn frame_size(&self) -> usize {
        FRAME_OVERHEAD + self.data_size()
    }

    /// The upper case code sent in requests, e.g. `"HGV"`.
    pub fn code(&self) -> &'static str {
        self.into()
    }

    /// Upper case code as raw bytes.
    pub fn code_bytes(&self) -> [u8; CODE_LEN] {
        let mut out = [0u8; CODE_LEN];
        out.copy_from_slice(self.code().as_bytes());
        out
    }

    /// Lower case code the chip echoes in its response.
    pub fn echo_bytes(&self) -> [u8; CODE_LEN] {
        let mut out = self.code_bytes();
        out.make_ascii_lowercase();
        out
    }

    /// Look up a code as found on the wire, in either case.
    pub fn from_code(code: &[u8]) -> Option<Self> {
        let code = core::str::from_utf8(code).ok()?;
        code.parse().ok()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn frame_size_is_overhead_plus_data() {
        for command in Command::iter() {
            assert_eq!(command.frame_size(), 8 + command.data_size());
        }
        assert_eq!(Command::GetMonitoringInfo.frame_size(), 28);
        assert_eq!(Command::HighVoltageOn.frame_size(), 8);
    }

    #[test]
    fn codes_parse_in_either_case() {
        assert_eq!("HGV".parse::<Command>().unwrap(), Command::GetOutputVoltage);
        assert_eq!("hgv".parse::<Command>().unwrap(), Command::GetOutputVoltage);
        assert_eq!("hXx".parse::<Command>().unwrap(), Command::Error);
        assert!("HZZ".parse::<Command>().is_err());
        assert_eq!(Command::from_code(b"hsc"), Some(Command::SetPowerFunction));
        assert_eq!(Command::from_code(&[0xFF, b'g', b'v']), None);
    }

    #[test]
    fn every_code_is_three_letters_and_round_trips() {
        for command in Command::iter() {
            assert_eq!(command.code().len(), CODE_LEN);
            assert_eq!(Command::from_code(&command.code_bytes()), Some(command));
            assert_eq!(Command::from_code(&command.echo_bytes()), Some(command));
        }
    }

    #[test]
    fn echo_is_lower_case() {
        assert_eq!(&Command::GetStatus.echo_bytes(), b"hgs");
        assert_eq!(&Command::GetStatus.code_bytes(), b"HGS");
        assert_eq!(Command::GetStatus.to_string(), "HGS");
    }
}
