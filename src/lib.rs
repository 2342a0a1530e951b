//! This crate provides an interface for communicating with and controlling high voltage power supply chips
//! that speak the framed ASCII protocol used by the Hamamatsu C11204 family, such as MPPC bias supplies.
//!
//! Every exchange is a request from the host and a single response from the chip:
//!
//! ```text
//! STX | CMD | DATA | ETX | CHK | CR
//! ```
//!
//! The command code is three ASCII letters, upper case going out and lower case coming back.
//! Data is sent as four digit hex words and converted to volts, amps and °C by [`units`].
//! An `hxx` response carries a device error code instead, surfaced as [`error::Error::Device`].
//!
//! The serial port used for chip comms should be configured like so:
//! * Default baud rate: 9600
//! * Data bits: 8
//! * Stop bits: 1
//! * Parity: Even
//!
//! A [`chip::HvChip`] owns its port and only ever has one request in flight. Its methods take
//! `&mut self`; wrap it in a `Mutex` to share it between threads.

pub mod chip;
pub mod command;
pub mod config;
pub mod correction;
pub mod error;
pub mod frame;
pub mod types;
pub mod units;

#[cfg(test)]
mod mock_serial;
