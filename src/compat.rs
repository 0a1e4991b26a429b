// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Sentinel flavoured front end for callers written against the classic
//! Arduino/mbed style ENS160 API.
//!
//! Failures collapse into in-band values:
//!
//! | Getter | On failure |
//! |---|---|
//! | AQI, TVOC, ethanol, eCO2, part id, app version | `0` |
//! | temperature, humidity | `-1.0` |
//! | operating mode, interrupt polarity | `-1` |
//! | validity flag | `0xFF` |
//! | boolean queries and all setters | `false` |
//!
//! A zero eCO2 reading and a failed read look the same here. Use
//! [`Ens160`] directly when that matters.

use crate::ens160::{Ens160, Ens160Error};
use crate::registers::{InterruptConfig, InterruptDrive, InterruptPolarity};
use crate::transport::BusTransport;

/// Returned by [`SentinelEns160::get_validity_flag`] when the status read fails.
pub const VALIDITY_ERROR: u8 = 0xFF;

pub struct SentinelEns160<T: BusTransport> {
    inner: Ens160<T>,
}

impl<T: BusTransport> From<Ens160<T>> for SentinelEns160<T> {
    fn from(inner: Ens160<T>) -> Self {
        SentinelEns160 { inner }
    }
}

impl<T: BusTransport> SentinelEns160<T> {
    pub fn into_inner(self) -> Ens160<T> {
        self.inner
    }

    pub fn init(&mut self) -> bool {
        self.inner.initialize().is_ok()
    }

    pub fn is_connected(&mut self) -> bool {
        self.inner.identify()
    }

    pub fn get_unique_id(&mut self) -> u16 {
        self.inner.get_unique_id().unwrap_or(0)
    }

    /// Accepts 0x00, 0x01, 0x02 and 0xF0 only.
    pub fn set_operating_mode(&mut self, mode: u8) -> bool {
        self.inner.set_operating_mode_raw(mode).is_ok()
    }

    /// Raw mode byte, -1 when the read fails.
    pub fn get_operating_mode(&mut self) -> i16 {
        match self.inner.get_operating_mode() {
            Ok(mode) => i16::from(u8::from(mode)),
            Err(Ens160Error::InvalidMode(raw)) => i16::from(raw),
            Err(_) => -1,
        }
    }

    pub fn get_app_ver(&mut self) -> u32 {
        self.inner.get_app_version().map_or(0, |v| v.as_u32())
    }

    pub fn configure_interrupt(&mut self, value: u8) -> bool {
        self.inner
            .configure_interrupt(InterruptConfig(value))
            .is_ok()
    }

    pub fn enable_interrupt(&mut self, enable: bool) -> bool {
        self.inner.enable_interrupt(enable).is_ok()
    }

    pub fn set_interrupt_polarity(&mut self, active_high: bool) -> bool {
        let polarity = if active_high {
            InterruptPolarity::ActiveHigh
        } else {
            InterruptPolarity::ActiveLow
        };
        self.inner.set_interrupt_polarity(polarity).is_ok()
    }

    /// 1 for active high, 0 for active low, -1 when the read fails.
    pub fn get_interrupt_polarity(&mut self) -> i8 {
        match self.inner.get_interrupt_polarity() {
            Ok(InterruptPolarity::ActiveHigh) => 1,
            Ok(InterruptPolarity::ActiveLow) => 0,
            Err(_) => -1,
        }
    }

    pub fn set_interrupt_drive(&mut self, push_pull: bool) -> bool {
        let drive = if push_pull {
            InterruptDrive::PushPull
        } else {
            InterruptDrive::OpenDrain
        };
        self.inner.set_interrupt_drive(drive).is_ok()
    }

    pub fn set_data_interrupt(&mut self, enable: bool) -> bool {
        self.inner.set_data_interrupt(enable).is_ok()
    }

    pub fn set_gpr_interrupt(&mut self, enable: bool) -> bool {
        self.inner.set_gpr_interrupt(enable).is_ok()
    }

    pub fn set_temp_compensation(&mut self, kelvin: f32) -> bool {
        self.inner.set_temperature_compensation(kelvin).is_ok()
    }

    pub fn set_temp_compensation_celsius(&mut self, celsius: f32) -> bool {
        self.inner.set_temperature_compensation_celsius(celsius).is_ok()
    }

    pub fn set_rh_compensation(&mut self, humidity: u16) -> bool {
        self.inner.set_humidity_compensation(humidity).is_ok()
    }

    /// `true` on success, like every other setter here.
    pub fn set_rh_compensation_float(&mut self, humidity: f32) -> bool {
        self.inner.set_humidity_compensation_float(humidity).is_ok()
    }

    pub fn check_data_status(&mut self) -> bool {
        self.inner.data_ready().unwrap_or(false)
    }

    pub fn check_gpr_status(&mut self) -> bool {
        self.inner.gpr_data_ready().unwrap_or(false)
    }

    /// Validity bits (0..=3) or [`VALIDITY_ERROR`].
    pub fn get_flags(&mut self) -> u8 {
        self.get_validity_flag()
    }

    pub fn get_validity_flag(&mut self) -> u8 {
        self.inner
            .get_validity_flag()
            .map_or(VALIDITY_ERROR, |flag| flag.bits())
    }

    pub fn check_operation_status(&mut self) -> bool {
        self.inner.operation_active().unwrap_or(false)
    }

    pub fn get_operation_error(&mut self) -> bool {
        self.inner.operation_error().unwrap_or(false)
    }

    pub fn get_aqi(&mut self) -> u8 {
        self.inner.get_aqi().unwrap_or(0)
    }

    pub fn get_tvoc(&mut self) -> u16 {
        self.inner.get_tvoc().unwrap_or(0)
    }

    pub fn get_etoh(&mut self) -> u16 {
        self.inner.get_ethanol().unwrap_or(0)
    }

    pub fn get_eco2(&mut self) -> u16 {
        self.inner.get_eco2().unwrap_or(0)
    }

    pub fn get_temp_kelvin(&mut self) -> f32 {
        self.inner.get_temperature_kelvin().unwrap_or(-1.0)
    }

    pub fn get_temp_celsius(&mut self) -> f32 {
        self.inner.get_temperature_celsius().unwrap_or(-1.0)
    }

    pub fn get_rh(&mut self) -> f32 {
        self.inner.get_humidity().unwrap_or(-1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::Address;
    use crate::transport::fake::FakeBus;

    const ADDR: u8 = 0x52;

    fn sentinel(bus: &mut FakeBus) -> SentinelEns160<&mut FakeBus> {
        SentinelEns160::from(Ens160::new(bus, Address::Low))
    }

    #[test]
    fn failed_reads_map_to_sentinels() {
        let mut bus = FakeBus::new(ADDR).failing();
        {
            let mut sensor = sentinel(&mut bus);
            assert_eq!(sensor.get_aqi(), 0);
            assert_eq!(sensor.get_tvoc(), 0);
            assert_eq!(sensor.get_etoh(), 0);
            assert_eq!(sensor.get_eco2(), 0);
            assert_eq!(sensor.get_unique_id(), 0);
            assert_eq!(sensor.get_app_ver(), 0);
            assert_eq!(sensor.get_temp_kelvin(), -1.0);
            assert_eq!(sensor.get_temp_celsius(), -1.0);
            assert_eq!(sensor.get_rh(), -1.0);
            assert_eq!(sensor.get_operating_mode(), -1);
            assert_eq!(sensor.get_interrupt_polarity(), -1);
            assert_eq!(sensor.get_flags(), VALIDITY_ERROR);
            assert!(!sensor.check_data_status());
            assert!(!sensor.check_gpr_status());
            assert!(!sensor.check_operation_status());
            assert!(!sensor.get_operation_error());
            assert!(!sensor.is_connected());
            assert!(!sensor.init());
        }
        // one transaction per getter, no retries
        assert_eq!(bus.transactions.len(), 18);
    }

    #[test]
    fn setters_report_success_consistently() {
        let mut bus = FakeBus::new(ADDR);
        {
            let mut sensor = sentinel(&mut bus);
            assert!(sensor.set_operating_mode(0x02));
            assert!(!sensor.set_operating_mode(0x03));
            assert!(sensor.set_temp_compensation_celsius(25.0));
            assert!(sensor.set_rh_compensation(40));
            assert!(sensor.set_rh_compensation_float(40.5));
            assert!(sensor.configure_interrupt(0x00));
            assert!(sensor.set_interrupt_polarity(true));
            assert_eq!(sensor.get_interrupt_polarity(), 1);
        }

        let mut bus = FakeBus::new(ADDR).failing();
        let mut sensor = sentinel(&mut bus);
        assert!(!sensor.set_rh_compensation_float(40.5));
        assert!(!sensor.set_temp_compensation_celsius(25.0));
    }

    #[test]
    fn readings_pass_through() {
        let mut bus = FakeBus::new(ADDR)
            .with(0x00, &[0x60, 0x01])
            .with(0x10, &[0x01])
            .with(0x20, &[0b1000_1011])
            .with(0x24, &[0xE8, 0x03]);
        let mut sensor = sentinel(&mut bus);
        assert!(sensor.init());
        assert_eq!(sensor.get_operating_mode(), 0x01);
        assert_eq!(sensor.get_eco2(), 1000);
        assert_eq!(sensor.get_validity_flag(), 2);
        assert!(sensor.check_data_status());
        assert!(sensor.check_gpr_status());
    }
}
