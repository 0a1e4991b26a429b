// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

use crate::registers::{
    decode_humidity, decode_temperature, encode_humidity, encode_temperature, Address,
    AppVersion, Command, DeviceStatus, InterruptConfig, InterruptDrive, InterruptPolarity,
    OperatingMode, Register, ValidityFlag, AQI_MASK, DEVICE_ID, KELVIN_OFFSET,
};
use crate::transport::BusTransport;
use i2cdev::linux::{LinuxI2CBus, LinuxI2CError};
use log::{debug, trace, warn};
use std::error::Error;
use std::path::Path;

/// Default I2C adapter on a Raspberry Pi.
pub const DEFAULT_I2C_BUS: &str = "/dev/i2c-1";

/// Longest payload written in one transaction (the general purpose write bank).
const MAX_WRITE_LEN: usize = 8;

///
/// ENS160 error enum, generic over the error of the
/// underlying bus. Bus when a transaction did not complete,
/// InvalidMode when an operating mode value is not one of
/// the four defined modes, NotIdentified when the device answers
/// with a foreign part id.
///
#[derive(Debug, thiserror::Error)]
pub enum Ens160Error<E: Error + 'static> {
    /// The bus transaction did not complete
    #[error("bus transaction failed: {0}")]
    Bus(#[source] E),
    /// Operating mode rejected before touching the bus, or an unknown mode read back
    #[error("invalid operating mode {0:#04x}")]
    InvalidMode(u8),
    /// The device acknowledged but is not an ENS160
    #[error("unexpected part id {found:#06x}, expected 0x0160")]
    NotIdentified { found: u16 },
}

/// Result of every fallible driver operation.
pub type Result<T, E> = std::result::Result<T, Ens160Error<E>>;

/// One reading of the gas outputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Measurement {
    pub aqi: u8,
    pub tvoc: u16,
    pub eco2: u16,
}

/// ENS160 Struct, wraps a bus transport
/// and the device address and has the ENS160
/// register operations implemented on top.
///
/// The struct holds no sensor state: every getter goes to the device.
/// It does no locking either, so when several threads share one sensor
/// they have to serialize access themselves (e.g. with a `Mutex`).
///
pub struct Ens160<T: BusTransport> {
    bus: T,
    address: u8,
}

impl Ens160<LinuxI2CBus> {
    /// Opens a Linux I2C adapter such as [`DEFAULT_I2C_BUS`].
    ///
    /// Only the adapter is opened, nothing is sent to the sensor.
    /// If fails, return an LinuxI2CError from i2cdev
    ///
    pub fn open<P: AsRef<Path>>(path: P, address: Address) -> std::result::Result<Self, LinuxI2CError> {
        let bus = LinuxI2CBus::new(path)?;
        Ok(Ens160::new(bus, address))
    }
}

impl<T: BusTransport> Ens160<T> {
    /// Binds the driver to `bus` and `address`. Performs no I/O.
    pub fn new(bus: T, address: Address) -> Self {
        Ens160 {
            bus,
            address: address.into(),
        }
    }

    /// 7-bit bus address of the sensor.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Gives the bus back.
    pub fn release(self) -> T {
        self.bus
    }

    fn read_register(&mut self, register: Register, buffer: &mut [u8]) -> Result<(), T::Error> {
        trace!("read {:?} ({} bytes)", register, buffer.len());
        self.bus
            .write_read(self.address, register.address(), buffer)
            .map_err(|e| {
                warn!("reading {:?} failed: {}", register, e);
                Ens160Error::Bus(e)
            })
    }

    /// Register address and payload go out as one transaction.
    fn write_register(&mut self, register: Register, data: &[u8]) -> Result<(), T::Error> {
        debug_assert!(data.len() <= MAX_WRITE_LEN);
        trace!("write {:?} {:02x?}", register, data);
        let mut frame = [0u8; MAX_WRITE_LEN + 1];
        frame[0] = register.address();
        frame[1..=data.len()].copy_from_slice(data);
        self.bus
            .write(self.address, &frame[..=data.len()])
            .map_err(|e| {
                warn!("writing {:?} failed: {}", register, e);
                Ens160Error::Bus(e)
            })
    }

    fn read_u8(&mut self, register: Register) -> Result<u8, T::Error> {
        let mut buffer = [0u8; 1];
        self.read_register(register, &mut buffer)?;
        Ok(buffer[0])
    }

    fn read_u16(&mut self, register: Register) -> Result<u16, T::Error> {
        let mut buffer = [0u8; 2];
        self.read_register(register, &mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    fn write_u16(&mut self, register: Register, value: u16) -> Result<(), T::Error> {
        self.write_register(register, &value.to_le_bytes())
    }

    /// Checks that something acknowledges the configured address.
    ///
    /// The payload of the bare read is ignored.
    pub fn probe(&mut self) -> Result<(), T::Error> {
        let mut buffer = [0u8; 1];
        self.bus.read(self.address, &mut buffer).map_err(|e| {
            warn!("no device at {:#04x}: {}", self.address, e);
            Ens160Error::Bus(e)
        })
    }

    /// Reads the 16 bit part identifier.
    pub fn get_unique_id(&mut self) -> Result<u16, T::Error> {
        self.read_u16(Register::PartId)
    }

    /// True when the device reports the ENS160 part id.
    /// A failed read counts as not identified.
    pub fn identify(&mut self) -> bool {
        matches!(self.get_unique_id(), Ok(DEVICE_ID))
    }

    /// Presence check (when the transport asks for it) followed by the
    /// part id check.
    ///
    /// Register contents are meaningless until this succeeded.
    pub fn initialize(&mut self) -> Result<(), T::Error> {
        if self.bus.requires_presence_check() {
            self.probe()?;
        }
        let found = self.get_unique_id()?;
        if found != DEVICE_ID {
            warn!("device at {:#04x} reports part id {:#06x}", self.address, found);
            return Err(Ens160Error::NotIdentified { found });
        }
        debug!("ENS160 found at {:#04x}", self.address);
        Ok(())
    }

    /// Writes the operating mode.
    ///
    /// Does not wait for or verify the transition; read it back with
    /// [`Ens160::get_operating_mode`] once the device had time to switch.
    pub fn set_operating_mode(&mut self, mode: OperatingMode) -> Result<(), T::Error> {
        debug!("setting operating mode {:?}", mode);
        self.write_register(Register::OpMode, &[mode.into()])
    }

    /// Same as [`Ens160::set_operating_mode`] for an untyped value.
    ///
    /// Anything but 0x00, 0x01, 0x02 and 0xF0 is rejected without bus access.
    pub fn set_operating_mode_raw(&mut self, value: u8) -> Result<(), T::Error> {
        let mode = OperatingMode::try_from(value).map_err(|value| {
            warn!("rejecting operating mode {:#04x}", value);
            Ens160Error::InvalidMode(value)
        })?;
        self.set_operating_mode(mode)
    }

    pub fn get_operating_mode(&mut self) -> Result<OperatingMode, T::Error> {
        let value = self.read_u8(Register::OpMode)?;
        OperatingMode::try_from(value).map_err(Ens160Error::InvalidMode)
    }

    /// Overwrites the whole interrupt configuration.
    pub fn configure_interrupt(&mut self, config: InterruptConfig) -> Result<(), T::Error> {
        self.write_register(Register::Config, &[config.bits()])
    }

    pub fn get_interrupt_config(&mut self) -> Result<InterruptConfig, T::Error> {
        Ok(InterruptConfig(self.read_u8(Register::Config)?))
    }

    /// Read-modify-write of `CONFIG`. Nothing is written when the read fails.
    fn update_interrupt_config<F>(&mut self, update: F) -> Result<(), T::Error>
    where
        F: FnOnce(InterruptConfig) -> InterruptConfig,
    {
        let current = self.get_interrupt_config()?;
        self.configure_interrupt(update(current))
    }

    pub fn enable_interrupt(&mut self, enable: bool) -> Result<(), T::Error> {
        self.update_interrupt_config(|config| config.enabled(enable))
    }

    pub fn set_interrupt_polarity(&mut self, polarity: InterruptPolarity) -> Result<(), T::Error> {
        self.update_interrupt_config(|config| config.polarity(polarity))
    }

    pub fn get_interrupt_polarity(&mut self) -> Result<InterruptPolarity, T::Error> {
        Ok(self.get_interrupt_config()?.get_polarity())
    }

    pub fn set_interrupt_drive(&mut self, drive: InterruptDrive) -> Result<(), T::Error> {
        self.update_interrupt_config(|config| config.drive(drive))
    }

    /// Routes "new data in the data registers" to the interrupt pin.
    pub fn set_data_interrupt(&mut self, enable: bool) -> Result<(), T::Error> {
        self.update_interrupt_config(|config| config.data_ready(enable))
    }

    /// Routes "new data in the general purpose read registers" to the interrupt pin.
    pub fn set_gpr_interrupt(&mut self, enable: bool) -> Result<(), T::Error> {
        self.update_interrupt_config(|config| config.gpr_ready(enable))
    }

    /// Sends a system command. The device only acts on it in idle mode.
    pub fn send_command(&mut self, command: Command) -> Result<(), T::Error> {
        debug!("sending command {:?}", command);
        self.write_register(Register::Command, &[command as u8])
    }

    /// Reads the firmware version from `GPR_READ4..6`.
    ///
    /// The registers only hold it after [`Command::GetAppVersion`] was sent
    /// in idle mode.
    pub fn get_app_version(&mut self) -> Result<AppVersion, T::Error> {
        let mut buffer = [0u8; 3];
        self.read_register(Register::GprRead4, &mut buffer)?;
        Ok(AppVersion::from_bytes(buffer))
    }

    /// Ambient temperature used by the sensor for compensation, in Kelvin.
    ///
    /// Stored as Kelvin x64 truncated to 16 bits; see
    /// [`encode_temperature`](crate::registers::encode_temperature) for how
    /// out of range values end up.
    pub fn set_temperature_compensation(&mut self, kelvin: f32) -> Result<(), T::Error> {
        let raw = encode_temperature(kelvin);
        debug!("temperature compensation {} K (raw {:#06x})", kelvin, raw);
        self.write_u16(Register::TempIn, raw)
    }

    pub fn set_temperature_compensation_celsius(&mut self, celsius: f32) -> Result<(), T::Error> {
        self.set_temperature_compensation(celsius + KELVIN_OFFSET)
    }

    /// Relative humidity used by the sensor for compensation, in whole percent.
    ///
    /// Stored as %RH x512 in 16 bits, so values from 128 on wrap around.
    pub fn set_humidity_compensation(&mut self, percent: u16) -> Result<(), T::Error> {
        let raw = encode_humidity(percent);
        debug!("humidity compensation {} % (raw {:#06x})", percent, raw);
        self.write_u16(Register::RhIn, raw)
    }

    /// Truncates to whole percent, then behaves like [`Ens160::set_humidity_compensation`].
    pub fn set_humidity_compensation_float(&mut self, percent: f32) -> Result<(), T::Error> {
        self.set_humidity_compensation(percent as u16)
    }

    /// Reads back `TEMP_IN` in Kelvin.
    pub fn get_temperature_compensation(&mut self) -> Result<f32, T::Error> {
        Ok(decode_temperature(self.read_u16(Register::TempIn)?))
    }

    /// Reads back `RH_IN` in percent.
    pub fn get_humidity_compensation(&mut self) -> Result<f32, T::Error> {
        Ok(decode_humidity(self.read_u16(Register::RhIn)?))
    }

    /// Air quality index according to UBA (1 excellent .. 5 unhealthy).
    pub fn get_aqi(&mut self) -> Result<u8, T::Error> {
        Ok(self.read_u8(Register::DataAqi)? & AQI_MASK)
    }

    /// Total volatile organic compounds in ppb.
    pub fn get_tvoc(&mut self) -> Result<u16, T::Error> {
        self.read_u16(Register::DataTvoc)
    }

    /// Ethanol concentration in ppb, read from the TVOC register.
    pub fn get_ethanol(&mut self) -> Result<u16, T::Error> {
        self.read_u16(Register::DataEtoh)
    }

    /// Equivalent CO2 in ppm.
    pub fn get_eco2(&mut self) -> Result<u16, T::Error> {
        self.read_u16(Register::DataEco2)
    }

    /// Temperature the sensor used in its calculations, in Kelvin.
    pub fn get_temperature_kelvin(&mut self) -> Result<f32, T::Error> {
        Ok(decode_temperature(self.read_u16(Register::DataT)?))
    }

    pub fn get_temperature_celsius(&mut self) -> Result<f32, T::Error> {
        Ok(self.get_temperature_kelvin()? - KELVIN_OFFSET)
    }

    /// Relative humidity the sensor used in its calculations, in percent.
    pub fn get_humidity(&mut self) -> Result<f32, T::Error> {
        Ok(decode_humidity(self.read_u16(Register::DataRh)?))
    }

    /// AQI, TVOC and eCO2 in one go. Stops at the first failed read.
    pub fn measure(&mut self) -> Result<Measurement, T::Error> {
        Ok(Measurement {
            aqi: self.get_aqi()?,
            tvoc: self.get_tvoc()?,
            eco2: self.get_eco2()?,
        })
    }

    /// Reads and decodes `DEVICE_STATUS`. Every call goes to the bus.
    pub fn get_status(&mut self) -> Result<DeviceStatus, T::Error> {
        Ok(DeviceStatus::from(self.read_u8(Register::DeviceStatus)?))
    }

    /// New data is waiting in the data registers.
    pub fn data_ready(&mut self) -> Result<bool, T::Error> {
        Ok(self.get_status()?.new_data)
    }

    /// New data is waiting in the general purpose read registers.
    pub fn gpr_data_ready(&mut self) -> Result<bool, T::Error> {
        Ok(self.get_status()?.new_gpr_data)
    }

    /// An operating mode is running.
    pub fn operation_active(&mut self) -> Result<bool, T::Error> {
        Ok(self.get_status()?.operating)
    }

    /// The device flagged an invalid operating mode.
    pub fn operation_error(&mut self) -> Result<bool, T::Error> {
        Ok(self.get_status()?.error)
    }

    pub fn get_validity_flag(&mut self) -> Result<ValidityFlag, T::Error> {
        Ok(self.get_status()?.validity)
    }
}
