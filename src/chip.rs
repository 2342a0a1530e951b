use std::time::Instant;

use embedded_io::{Error as _, ErrorKind};
use tracing::{debug, info, trace, warn};

use crate::{
    command::{Command, FRAME_OVERHEAD},
    config::ChipConfig,
    correction::{CorrectionWord, CorrectionWords, TemperatureCorrection},
    error::{DeviceError, Error, FrameError, Result},
    frame::{self, Frame, FrameRecognizer, Payload, WORD_CHARS, Words},
    types::{MonitoringInfo, PowerFunction, State, Status},
};

/// You can create a HvChip using any interface which implements [embedded_io::Read] & [embedded_io::Write].
///
/// The session owns the interface for its whole life and only ever has one request in flight:
/// every method writes a request and then waits for the matching response before returning.
/// Methods take `&mut self`, so sharing a chip between threads needs a mutex around it.
/// Call [`HvChip::release`] to get the interface back.
///
/// For it's methods, "get" reads a value back from the chip and "set" changes a setting.
pub struct HvChip<S: embedded_io::Read + embedded_io::Write> {
    interface: S,
    config: ChipConfig,
}

impl<S: embedded_io::Read + embedded_io::Write> HvChip<S> {
    /// Create a new HvChip with the default configuration.
    pub fn new(interface: S) -> Self {
        Self::with_config(interface, ChipConfig::default())
    }

    pub fn with_config(interface: S, config: ChipConfig) -> Self {
        Self { interface, config }
    }

    pub fn config(&self) -> &ChipConfig {
        &self.config
    }

    /// End the session and hand back the interface.
    pub fn release(self) -> S {
        self.interface
    }

    /// Return the output voltage in volts.
    pub fn get_output_voltage(&mut self) -> Result<f64, S::Error> {
        let [raw] = self.query(Command::GetOutputVoltage)?;
        Ok(self.config.factors.raw_to_voltage(raw))
    }

    /// Return the output current in amps.
    pub fn get_output_current(&mut self) -> Result<f64, S::Error> {
        let [raw] = self.query(Command::GetOutputCurrent)?;
        Ok(self.config.factors.raw_to_current(raw))
    }

    /// Return the sensor temperature in °C.
    pub fn get_temperature(&mut self) -> Result<f64, S::Error> {
        let [raw] = self.query(Command::GetTemperature)?;
        Ok(self.config.factors.raw_to_temperature(raw))
    }

    /// Return the decoded status byte.
    pub fn get_status(&mut self) -> Result<Status, S::Error> {
        let [raw] = self.query(Command::GetStatus)?;
        Ok(Status::from(raw))
    }

    /// Return status, set and monitored voltage, monitored current and temperature at once.
    pub fn get_monitoring_info(&mut self) -> Result<MonitoringInfo, S::Error> {
        let words: [u16; 5] = self.query(Command::GetMonitoringInfo)?;
        let [status_raw, voltage_set, voltage_monitored, current_monitored, temperature] = words;
        let factors = &self.config.factors;
        Ok(MonitoringInfo {
            status_raw,
            status: Status::from(status_raw),
            voltage_set: factors.raw_to_voltage(voltage_set),
            voltage_monitored: factors.raw_to_voltage(voltage_monitored),
            current_monitored: factors.raw_to_current(current_monitored),
            temperature: factors.raw_to_temperature(temperature),
        })
    }

    /// Switch the high voltage output on or off.
    pub fn set_high_voltage_output(&mut self, state: impl Into<State>) -> Result<(), S::Error> {
        let state = state.into();
        let command = match state {
            State::On => Command::HighVoltageOn,
            State::Off => Command::HighVoltageOff,
        };
        info!(?state, "switching high voltage output");
        self.transact(command, Payload::Empty)?;
        Ok(())
    }

    /// Set the temporary reference voltage, in volts.
    ///
    /// Values outside what a word can encode are rejected before anything is sent.
    pub fn set_reference_voltage(&mut self, voltage: f64) -> Result<(), S::Error> {
        let factors = self.config.factors;
        factors.voltage_range().check("reference voltage", voltage)?;
        let raw = factors.voltage_to_raw(voltage);

        info!(voltage, raw, "setting reference voltage");
        self.transact(Command::SetReferenceVoltage, Payload::Word(raw))?;
        Ok(())
    }

    /// Read back the temperature correction factor.
    pub fn get_temperature_correction_factor(
        &mut self,
    ) -> Result<TemperatureCorrection, S::Error> {
        let words: CorrectionWords = self.query(Command::GetTemperatureCorrection)?;
        Ok(TemperatureCorrection::from_words(&words, &self.config.factors))
    }

    /// Write a new temperature correction factor.
    ///
    /// The chip's current reference voltage Vb is read first and written back unchanged.
    /// All five parameters are validated before either request is sent.
    pub fn set_temperature_correction_factor(
        &mut self,
        dt1_slope: f64,
        dt2_slope: f64,
        dt1: f64,
        dt2: f64,
        tb: f64,
    ) -> Result<(), S::Error> {
        let factors = self.config.factors;
        let requested = TemperatureCorrection {
            dt1_slope,
            dt2_slope,
            dt1,
            dt2,
            vb: 0.0,
            tb,
        };
        requested.validate(&factors)?;

        let current: CorrectionWords = self.query(Command::GetTemperatureCorrection)?;
        let mut words = requested.to_words(&factors);
        words[CorrectionWord::Vb as usize] = current[CorrectionWord::Vb as usize];

        info!(?requested, ?words, "setting temperature correction factor");
        self.transact(Command::SetTemperatureCorrection, Payload::Words(&words))?;
        Ok(())
    }

    /// Enable or disable temperature compensation.
    pub fn set_temperature_compensation_mode(
        &mut self,
        enabled: impl Into<State>,
    ) -> Result<(), S::Error> {
        let state = enabled.into();
        info!(?state, "switching temperature compensation mode");
        self.transact(Command::SetCompensationMode, Payload::Raw(state.flag()))?;
        Ok(())
    }

    /// Reset the power supply.
    pub fn reset_power_supply(&mut self) -> Result<(), S::Error> {
        info!("resetting power supply");
        self.transact(Command::Reset, Payload::Empty)?;
        Ok(())
    }

    /// Read the over-current protection and output voltage control settings.
    pub fn read_power_function(&mut self) -> Result<PowerFunction, S::Error> {
        let [raw] = self.query(Command::GetPowerFunction)?;
        let function = PowerFunction::from(raw);
        if function.over_current_protection_enabled().is_none() {
            warn!(raw, "power function word out of range");
        }
        Ok(function)
    }

    /// Turn over-current protection on or off, leaving output voltage control as it is.
    pub fn set_over_current_protection(&mut self, on: impl Into<State>) -> Result<(), S::Error> {
        let state: State = on.into();
        let on = bool::from(state);
        let current = self.read_power_function()?;
        let Some(output_voltage_control) = current.output_voltage_control_enabled() else {
            return Err(Error::StateQuery {
                function: "output voltage control",
                raw: current.raw,
            });
        };
        self.write_power_function(on, output_voltage_control)
    }

    /// Turn output voltage control on or off, leaving over-current protection as it is.
    pub fn set_output_voltage_control_function(
        &mut self,
        on: impl Into<State>,
    ) -> Result<(), S::Error> {
        let state: State = on.into();
        let on = bool::from(state);
        let current = self.read_power_function()?;
        let Some(over_current_protection) = current.over_current_protection_enabled() else {
            return Err(Error::StateQuery {
                function: "over-current protection",
                raw: current.raw,
            });
        };
        self.write_power_function(over_current_protection, on)
    }

    fn write_power_function(
        &mut self,
        over_current_protection: bool,
        output_voltage_control: bool,
    ) -> Result<(), S::Error> {
        let code = PowerFunction::code(over_current_protection, output_voltage_control);
        info!(over_current_protection, output_voltage_control, code, "setting power function");
        self.transact(Command::SetPowerFunction, Payload::Word(code))?;
        Ok(())
    }

    /// Send `command` without a payload and return exactly `N` response words.
    fn query<const N: usize>(&mut self, command: Command) -> Result<[u16; N], S::Error> {
        let words = self.transact(command, Payload::Empty)?;
        let words: [u16; N] = words
            .as_slice()
            .try_into()
            .map_err(|_| FrameError::LengthMismatch {
                command,
                expected: FRAME_OVERHEAD + N * WORD_CHARS,
                actual: FRAME_OVERHEAD + words.len() * WORD_CHARS,
            })?;
        Ok(words)
    }

    /// Send one request and wait for its response.
    ///
    /// The response must echo `command` (in lower case) or be an `hxx` error frame, which is
    /// turned into [`Error::Device`]. Nothing is retried.
    pub fn transact(&mut self, command: Command, payload: Payload<'_>) -> Result<Words, S::Error> {
        let request = frame::encode(command, payload)?;
        debug!(%command, tx = %request.escape_ascii(), "sending request");

        self.interface.write_all(&request).map_err(Error::Serial)?;
        self.interface.flush().map_err(Error::Serial)?;

        let raw = self.read_frame()?;
        debug!(%command, rx = %raw.escape_ascii(), "received response");

        let (echo, words) = frame::decode(&raw)?;
        if echo == Command::Error {
            let code = words
                .first()
                .copied()
                .ok_or(FrameError::Truncated { len: raw.len() })?;
            let err = DeviceError::from_code(code);
            warn!(%command, %err, "device reported an error");
            return Err(err.into());
        }
        if echo != command {
            return Err(FrameError::UnexpectedCommand {
                expected: command,
                actual: echo,
            }
            .into());
        }
        Ok(words)
    }

    /// Read bytes until a whole frame (STX .. ETX .. CR) has arrived.
    ///
    /// Gives up with [`Error::Timeout`] once the configured response timeout has passed.
    /// Bytes are read one at a time so nothing past the CR is consumed.
    pub fn read_frame(&mut self) -> Result<Frame, S::Error> {
        let deadline = Instant::now() + self.config.response_timeout_std();
        let mut recognizer = FrameRecognizer::new();
        let mut byte = [0u8; 1];

        loop {
            if Instant::now() >= deadline {
                warn!(
                    received = %recognizer.bytes().escape_ascii(),
                    state = ?recognizer.state(),
                    "timed out waiting for response"
                );
                return Err(Error::Timeout {
                    waited_ms: self.config.response_timeout.to_millis(),
                });
            }

            match self.interface.read(&mut byte) {
                Ok(0) => {}
                Ok(_) => {
                    if recognizer.push(byte[0])? {
                        return Ok(recognizer.into_frame());
                    }
                }
                // Ports with a read timeout report it as an error, keep polling until the deadline.
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::Interrupted) => {
                    trace!("no data yet");
                }
                Err(e) => return Err(Error::Serial(e)),
            }
        }
    }
}
