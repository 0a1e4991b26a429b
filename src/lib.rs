// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! ENS160 driver implementing the register level I2C operations of the
//! ScioSense ENS160 digital metal-oxide multi-gas sensor.
//!
//! Operations taken from the [ENS160 datasheet](https://www.sciosense.com/wp-content/uploads/documents/SC-001224-DS-9-ENS160-Datasheet.pdf)
//!
//! The sensor reports an air quality index (AQI-UBA), TVOC, ethanol and
//! equivalent CO2, and takes ambient temperature and humidity as inputs to
//! compensate its readings.
//!
//! All operations return a [`Result`] carrying an [`Ens160Error`]. Code
//! ported from the Arduino/mbed libraries that expects `0`/`-1` on failure can
//! use [`compat::SentinelEns160`] instead.
//!
//! The driver logs through the [`log`](https://docs.rs/log) facade: transactions
//! at `trace`, configuration changes at `debug`, failures at `warn`.
//!
//! ## Basic Example
//!
//! Initializing the sensor and obtaining measurements
//!
//!```no_run
//!use ens160_i2c::{Address, Ens160, OperatingMode, DEFAULT_I2C_BUS};
//!use std::thread;
//!use std::time::Duration;
//!
//!fn main() {
//!    // Open the I2C adapter
//!    let mut ens = Ens160::open(DEFAULT_I2C_BUS, Address::High).unwrap();
//!    ens.initialize().unwrap();
//!
//!    ens.set_operating_mode(OperatingMode::Idle).unwrap();
//!    thread::sleep(Duration::from_millis(50));
//!    ens.set_operating_mode(OperatingMode::Standard).unwrap();
//!    ens.set_temperature_compensation_celsius(22.5).unwrap();
//!    ens.set_humidity_compensation(45).unwrap();
//!
//!    loop {
//!        match ens.data_ready() {
//!            Ok(true) => match ens.measure() {
//!                Ok(m) => println!("AQI: {} TVOC: {} ppb eCO2: {} ppm", m.aqi, m.tvoc, m.eco2),
//!                Err(e) => println!("Error obtaining measurements. More details: {}", e),
//!            },
//!            Ok(false) => {}
//!            Err(e) => {
//!                println!(
//!                    "Error reading status. More details: {}. Waiting 10 seconds for recovering",
//!                    e
//!                );
//!                thread::sleep(Duration::from_secs(10));
//!            }
//!        }
//!        thread::sleep(Duration::from_secs(1));
//!    }
//!}
//!```
//!

/// Sentinel based front end
pub mod compat;
/// ENS160 driver and its error type
pub mod ens160;
/// Register map and bit-field codecs
pub mod registers;
/// Bus capability the driver runs on
pub mod transport;

pub use crate::ens160::{Ens160, Ens160Error, Measurement, Result, DEFAULT_I2C_BUS};
pub use crate::registers::{
    Address, AppVersion, Command, DeviceStatus, InterruptConfig, InterruptDrive,
    InterruptPolarity, OperatingMode, ValidityFlag, DEVICE_ID,
};
pub use crate::transport::BusTransport;
