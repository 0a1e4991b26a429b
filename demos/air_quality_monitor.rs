// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Polls an ENS160 on one thread and prints the latest reading on another.
//!
//! The polling thread is the only bus owner. Both threads share the last
//! reading through a mutex; the driver itself keeps no state.
//!
//! Usage: `air_quality_monitor [--bus /dev/i2c-1] [--low]`

use ens160_i2c::{Address, Ens160, Measurement, OperatingMode, ValidityFlag, DEFAULT_I2C_BUS};
use std::env;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const DISPLAY_INTERVAL: Duration = Duration::from_secs(1);

/// Last values seen by the polling thread.
#[derive(Debug, Default, Clone, Copy)]
struct LatestReading {
    measurement: Measurement,
    validity: Option<ValidityFlag>,
    updated: Option<Instant>,
}

fn parse_args() -> (String, Address) {
    let args: Vec<String> = env::args().collect();
    let mut bus = DEFAULT_I2C_BUS.to_string();
    let mut address = Address::High;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bus" if i + 1 < args.len() => {
                bus = args[i + 1].clone();
                i += 1;
            }
            "--low" => address = Address::Low,
            other => log::warn!("ignoring argument {}", other),
        }
        i += 1;
    }
    (bus, address)
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let (bus, address) = parse_args();
    log::info!("opening {} at {:#04x}", bus, u8::from(address));
    let mut ens = Ens160::open(&bus, address)?;
    ens.initialize()?;

    // the device needs to pass through idle before it starts measuring
    ens.set_operating_mode(OperatingMode::Idle)?;
    thread::sleep(Duration::from_millis(50));
    ens.set_operating_mode(OperatingMode::Standard)?;
    ens.set_temperature_compensation_celsius(22.0)?;
    ens.set_humidity_compensation(45)?;

    let latest = Arc::new(Mutex::new(LatestReading::default()));
    let running = Arc::new(AtomicBool::new(true));

    let poller = {
        let latest = Arc::clone(&latest);
        let running = Arc::clone(&running);
        thread::spawn(move || {
            while running.load(Ordering::Relaxed) {
                match ens.data_ready() {
                    Ok(true) => {
                        let validity = ens.get_validity_flag().ok();
                        match ens.measure() {
                            Ok(measurement) => {
                                if let Ok(mut guard) = latest.lock() {
                                    *guard = LatestReading {
                                        measurement,
                                        validity,
                                        updated: Some(Instant::now()),
                                    };
                                }
                            }
                            Err(e) => log::warn!("measurement failed: {}", e),
                        }
                    }
                    Ok(false) => {}
                    Err(e) => log::warn!("status read failed: {}", e),
                }
                thread::sleep(POLL_INTERVAL);
            }
            if let Err(e) = ens.set_operating_mode(OperatingMode::DeepSleep) {
                log::warn!("could not put sensor to sleep: {}", e);
            }
        })
    };

    for _ in 0..60 {
        thread::sleep(DISPLAY_INTERVAL);
        let reading = match latest.lock() {
            Ok(guard) => *guard,
            Err(_) => break,
        };
        match (reading.updated, reading.validity) {
            (Some(at), validity) => println!(
                "AQI: {}  eCO2: {} ppm  TVOC: {} ppb  ({}, {:.1}s old)",
                reading.measurement.aqi,
                reading.measurement.eco2,
                reading.measurement.tvoc,
                validity.map_or("status unknown".to_string(), |v| v.to_string()),
                at.elapsed().as_secs_f32()
            ),
            (None, _) => println!("waiting for first reading"),
        }
    }

    running.store(false, Ordering::Relaxed);
    if poller.join().is_err() {
        log::error!("polling thread panicked");
    }
    Ok(())
}
