use std::env;

use fugit::MillisDurationU32;
use hv_chip::{chip::HvChip, config::ChipConfig};
use inquire::Select;
use serialport::{DataBits, Parity, SerialPort, StopBits};
use tracing_subscriber::EnvFilter;

// Configuration constants - adjust these for your setup
const BAUD_RATE: u32 = hv_chip::config::DEFAULT_BAUD_RATE;
// Short port timeout, the session keeps polling until its own response timeout.
const SERIAL_TIMEOUT_MS: u64 = 50;
const RESPONSE_TIMEOUT_MS: u32 = 1000;
const REFERENCE_VOLTAGE_V: f64 = 54.0;
const STABILIZATION_DELAY_MS: u64 = 1000;

pub struct PortWrapper(Box<dyn SerialPort>);

#[derive(Debug)]
pub struct IoError(std::io::Error);

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.0)
    }
}

impl embedded_io::Error for IoError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self.0.kind() {
            std::io::ErrorKind::NotFound => embedded_io::ErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => embedded_io::ErrorKind::PermissionDenied,
            std::io::ErrorKind::BrokenPipe => embedded_io::ErrorKind::BrokenPipe,
            std::io::ErrorKind::InvalidInput => embedded_io::ErrorKind::InvalidInput,
            std::io::ErrorKind::InvalidData => embedded_io::ErrorKind::InvalidData,
            // A read that found no data yet, the session keeps polling.
            std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => {
                embedded_io::ErrorKind::TimedOut
            }
            std::io::ErrorKind::Interrupted => embedded_io::ErrorKind::Interrupted,
            std::io::ErrorKind::Unsupported => embedded_io::ErrorKind::Unsupported,
            std::io::ErrorKind::OutOfMemory => embedded_io::ErrorKind::OutOfMemory,
            _ => embedded_io::ErrorKind::Other,
        }
    }
}

impl embedded_io::ErrorType for PortWrapper {
    type Error = IoError;
}

impl embedded_io::Read for PortWrapper {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        std::io::Read::read(&mut self.0, buf).map_err(IoError)
    }
}

impl embedded_io::Write for PortWrapper {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        std::io::Write::write(&mut self.0, buf).map_err(IoError)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        std::io::Write::flush(&mut self.0).map_err(IoError)
    }
}

fn main() {
    // RUST_LOG=hv_chip=debug shows every frame on the wire
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Get serial port from command line arg or interactive selection
    let port_name = env::args().nth(1).unwrap_or_else(|| {
        let ports = serialport::available_ports().expect("Failed to enumerate serial ports");

        if ports.is_empty() {
            eprintln!("No serial ports found!");
            std::process::exit(1);
        }

        let port_names: Vec<String> = ports.iter().map(|p| p.port_name.clone()).collect();

        Select::new("Select a serial port:", port_names)
            .prompt()
            .expect("Failed to select port")
    });

    println!("Using port: {}", port_name);

    let port = serialport::new(&port_name, BAUD_RATE)
        .data_bits(DataBits::Eight)
        .parity(Parity::Even)
        .stop_bits(StopBits::One)
        .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
        .open()
        .expect("Failed to open serial port");

    let config = ChipConfig::default()
        .with_baud_rate(BAUD_RATE)
        .with_response_timeout(MillisDurationU32::millis(RESPONSE_TIMEOUT_MS));
    let mut chip = HvChip::with_config(PortWrapper(port), config);

    let status = chip.get_status().unwrap();
    println!("Status: {:#?}", status);

    let correction = chip.get_temperature_correction_factor().unwrap();
    println!("Temperature correction: {:#?}", correction);

    let function = chip.read_power_function().unwrap();
    println!(
        "Over-current protection: {}, output voltage control: {}",
        function.over_current_protection, function.output_voltage_control
    );

    chip.set_temperature_compensation_mode(true).unwrap();
    println!("Temperature compensation enabled");

    chip.set_reference_voltage(REFERENCE_VOLTAGE_V).unwrap();
    println!("Set reference voltage to {}V", REFERENCE_VOLTAGE_V);

    chip.set_high_voltage_output(true).unwrap();
    println!("High voltage output enabled");

    std::thread::sleep(std::time::Duration::from_millis(STABILIZATION_DELAY_MS));

    let info = chip.get_monitoring_info().unwrap();
    println!("Monitoring info: {:#?}", info);
    println!(
        "Output: {:.3}V, {:.5}A at {:.2}°C",
        chip.get_output_voltage().unwrap(),
        chip.get_output_current().unwrap(),
        chip.get_temperature().unwrap()
    );

    chip.set_high_voltage_output(false).unwrap();
    println!("High voltage output disabled");

    match chip.set_over_current_protection(true) {
        Ok(()) => println!("Over-current protection enabled"),
        Err(e) => eprintln!("Could not enable over-current protection: {}", e),
    }

    let _port = chip.release();
}
