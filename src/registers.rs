// Copyright 2024, F. Stan
//
// Licensed under the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>,
// This file may not be copied, modified, or distributed
// except according to those terms.

//! ENS160 register map and bit-field codecs.
//!
//! Everything in here is pure: bytes in, typed values out (and back). The
//! driver in [`crate::ens160`] is the only place that touches the bus.
//!
//! Register addresses and field layouts follow the ENS160 datasheet
//! (sections 8.3 "Register description" and 9 "Host interface").

use std::fmt;

/// Part identifier reported by every ENS160 in the `PART_ID` register.
pub const DEVICE_ID: u16 = 0x0160;

/// Offset between Celsius and Kelvin.
pub const KELVIN_OFFSET: f32 = 273.15;

/// Fixed-point factor of the temperature registers (1/64 K resolution).
pub const TEMPERATURE_SCALE: f32 = 64.0;

/// Fixed-point factor of the humidity registers (1/512 %RH resolution).
pub const HUMIDITY_SCALE: f32 = 512.0;

/// I2C address of the sensor, selected by the level of the ADDR pin.
///
/// Only these two addresses exist on the part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Address {
    /// ADDR pin pulled low
    Low = 0x52,
    /// ADDR pin pulled high (breakout board default)
    #[default]
    High = 0x53,
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address as u8
    }
}

/// How the host may access a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

/// Named ENS160 registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Register {
    /// Device identity, 0x0160 little-endian
    PartId,
    /// Operating mode, see [`OperatingMode`]
    OpMode,
    /// Interrupt pin configuration, see [`InterruptConfig`]
    Config,
    /// Additional system commands, see [`Command`]
    Command,
    /// Host supplied ambient temperature (Kelvin x64)
    TempIn,
    /// Host supplied relative humidity (%RH x512)
    RhIn,
    /// Device status flags, see [`DeviceStatus`]
    DeviceStatus,
    /// Air quality index according to UBA
    DataAqi,
    /// TVOC concentration in ppb
    DataTvoc,
    /// Ethanol concentration in ppb.
    ///
    /// The datasheet describes this as a "virtual mirror" of the
    /// ethanol-calibrated TVOC value, so it shares the TVOC address.
    DataEtoh,
    /// Equivalent CO2 concentration in ppm
    DataEco2,
    /// Temperature used in calculations (Kelvin x64)
    DataT,
    /// Relative humidity used in calculations (%RH x512)
    DataRh,
    /// Data integrity checksum
    DataMisr,
    /// General purpose write registers
    GprWrite,
    /// General purpose read registers
    GprRead0,
    /// General purpose read registers, offset 4 (firmware version after `GET_APPVER`)
    GprRead4,
}

impl Register {
    /// Register address on the bus.
    pub const fn address(self) -> u8 {
        match self {
            Register::PartId => 0x00,
            Register::OpMode => 0x10,
            Register::Config => 0x11,
            Register::Command => 0x12,
            Register::TempIn => 0x13,
            Register::RhIn => 0x15,
            Register::DeviceStatus => 0x20,
            Register::DataAqi => 0x21,
            Register::DataTvoc | Register::DataEtoh => 0x22,
            Register::DataEco2 => 0x24,
            Register::DataT => 0x30,
            Register::DataRh => 0x32,
            Register::DataMisr => 0x38,
            Register::GprWrite => 0x40,
            Register::GprRead0 => 0x48,
            Register::GprRead4 => 0x4C,
        }
    }

    /// Number of bytes transferred when the register is accessed as a unit.
    pub const fn width(self) -> usize {
        match self {
            Register::OpMode
            | Register::Config
            | Register::Command
            | Register::DeviceStatus
            | Register::DataAqi
            | Register::DataMisr => 1,
            Register::PartId
            | Register::TempIn
            | Register::RhIn
            | Register::DataTvoc
            | Register::DataEtoh
            | Register::DataEco2
            | Register::DataT
            | Register::DataRh => 2,
            Register::GprRead4 => 3,
            Register::GprWrite | Register::GprRead0 => 8,
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Register::OpMode
            | Register::Config
            | Register::Command
            | Register::TempIn
            | Register::RhIn
            | Register::GprWrite => Access::ReadWrite,
            _ => Access::ReadOnly,
        }
    }
}

/// Operating modes accepted by the `OP_MODE` register.
///
/// The intended sequence is `DeepSleep -> Idle -> Standard`; `Reset` is a
/// one-shot command that brings the device back to its boot state. Nothing
/// here enforces that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OperatingMode {
    /// Low power standby
    DeepSleep = 0x00,
    /// Low power, accepts commands
    Idle = 0x01,
    /// Gas sensing
    Standard = 0x02,
    /// Reset the device
    Reset = 0xF0,
}

impl TryFrom<u8> for OperatingMode {
    type Error = u8;

    /// Accepts exactly the four defined mode values and hands back anything else.
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(OperatingMode::DeepSleep),
            0x01 => Ok(OperatingMode::Idle),
            0x02 => Ok(OperatingMode::Standard),
            0xF0 => Ok(OperatingMode::Reset),
            other => Err(other),
        }
    }
}

impl From<OperatingMode> for u8 {
    fn from(mode: OperatingMode) -> u8 {
        mode as u8
    }
}

/// Commands for the `COMMAND` register. Only executed while the device is idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// No operation
    Nop = 0x00,
    /// Copy the firmware version into `GPR_READ4..6`
    GetAppVersion = 0x0E,
    /// Clear the general purpose read registers
    ClearGpr = 0xCC,
}

/// Validity of the measurement outputs, bits 2-3 of `DEVICE_STATUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityFlag {
    Normal,
    WarmUp,
    InitialStartup,
    InvalidOutput,
}

impl ValidityFlag {
    /// Decodes the two-bit field value (0..=3). Higher bits are ignored.
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => ValidityFlag::Normal,
            1 => ValidityFlag::WarmUp,
            2 => ValidityFlag::InitialStartup,
            _ => ValidityFlag::InvalidOutput,
        }
    }

    pub const fn bits(self) -> u8 {
        match self {
            ValidityFlag::Normal => 0,
            ValidityFlag::WarmUp => 1,
            ValidityFlag::InitialStartup => 2,
            ValidityFlag::InvalidOutput => 3,
        }
    }
}

impl fmt::Display for ValidityFlag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ValidityFlag::Normal => fmt::Display::fmt("normal operation", f),
            ValidityFlag::WarmUp => fmt::Display::fmt("warm-up phase", f),
            ValidityFlag::InitialStartup => fmt::Display::fmt("initial start-up phase", f),
            ValidityFlag::InvalidOutput => fmt::Display::fmt("invalid output", f),
        }
    }
}

/// Decoded `DEVICE_STATUS` byte.
///
/// ```text
/// bit 7     6     5..4  3..2      1       0
///     STATAS STATER  -  VALIDITY  NEWDAT  NEWGPR
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceStatus {
    /// An operating mode is running
    pub operating: bool,
    /// An invalid operating mode was selected
    pub error: bool,
    pub validity: ValidityFlag,
    /// New data in the data registers, cleared when they are read
    pub new_data: bool,
    /// New data in the general purpose read registers, cleared when they are read
    pub new_gpr_data: bool,
}

impl DeviceStatus {
    pub const OPERATING: u8 = 1 << 7;
    pub const ERROR: u8 = 1 << 6;
    pub const VALIDITY_MASK: u8 = 0b0000_1100;
    pub const VALIDITY_SHIFT: u8 = 2;
    pub const NEW_DATA: u8 = 1 << 1;
    pub const NEW_GPR_DATA: u8 = 1 << 0;
}

impl From<u8> for DeviceStatus {
    fn from(byte: u8) -> Self {
        DeviceStatus {
            operating: byte & DeviceStatus::OPERATING != 0,
            error: byte & DeviceStatus::ERROR != 0,
            validity: ValidityFlag::from_bits(
                (byte & DeviceStatus::VALIDITY_MASK) >> DeviceStatus::VALIDITY_SHIFT,
            ),
            new_data: byte & DeviceStatus::NEW_DATA != 0,
            new_gpr_data: byte & DeviceStatus::NEW_GPR_DATA != 0,
        }
    }
}

/// Level of the interrupt pin when asserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptPolarity {
    #[default]
    ActiveLow,
    ActiveHigh,
}

/// Output stage of the interrupt pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterruptDrive {
    #[default]
    OpenDrain,
    PushPull,
}

/// Contents of the `CONFIG` register.
///
/// Each setter only touches its own bit, so a value read from the device
/// can be adjusted and written back without disturbing reserved bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptConfig(pub u8);

impl InterruptConfig {
    /// INTEn: interrupt pin enabled
    pub const ENABLE: u8 = 1 << 0;
    /// INTDAT: assert on new data in the data registers
    pub const DATA_READY: u8 = 1 << 1;
    /// INTGPR: assert on new data in the general purpose read registers
    pub const GPR_READY: u8 = 1 << 3;
    /// INT_CFG: 0 open drain, 1 push/pull
    pub const DRIVE: u8 = 1 << 5;
    /// INTPOL: 0 active low, 1 active high
    pub const POLARITY: u8 = 1 << 6;

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Sets or clears the bits in `mask`, leaving everything else as is.
    pub const fn with(self, mask: u8, on: bool) -> Self {
        if on {
            InterruptConfig(self.0 | mask)
        } else {
            InterruptConfig(self.0 & !mask)
        }
    }

    pub const fn enabled(self, on: bool) -> Self {
        self.with(Self::ENABLE, on)
    }

    pub const fn data_ready(self, on: bool) -> Self {
        self.with(Self::DATA_READY, on)
    }

    pub const fn gpr_ready(self, on: bool) -> Self {
        self.with(Self::GPR_READY, on)
    }

    pub const fn drive(self, drive: InterruptDrive) -> Self {
        self.with(Self::DRIVE, matches!(drive, InterruptDrive::PushPull))
    }

    pub const fn polarity(self, polarity: InterruptPolarity) -> Self {
        self.with(Self::POLARITY, matches!(polarity, InterruptPolarity::ActiveHigh))
    }

    pub const fn is_enabled(self) -> bool {
        self.0 & Self::ENABLE != 0
    }

    pub const fn get_polarity(self) -> InterruptPolarity {
        if self.0 & Self::POLARITY != 0 {
            InterruptPolarity::ActiveHigh
        } else {
            InterruptPolarity::ActiveLow
        }
    }

    pub const fn get_drive(self) -> InterruptDrive {
        if self.0 & Self::DRIVE != 0 {
            InterruptDrive::PushPull
        } else {
            InterruptDrive::OpenDrain
        }
    }
}

/// Firmware version copied into `GPR_READ4..6` by [`Command::GetAppVersion`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct AppVersion {
    pub major: u8,
    pub minor: u8,
    pub release: u8,
}

impl AppVersion {
    pub const fn from_bytes(bytes: [u8; 3]) -> Self {
        AppVersion {
            major: bytes[0],
            minor: bytes[1],
            release: bytes[2],
        }
    }

    /// The 24 bit little-endian form, major in the low byte.
    pub const fn as_u32(self) -> u32 {
        self.major as u32 | (self.minor as u32) << 8 | (self.release as u32) << 16
    }
}

impl fmt::Display for AppVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.release)
    }
}

/// Mask of the AQI field in `DATA_AQI`.
pub const AQI_MASK: u8 = 0x03;

/// Converts Kelvin to the x64 fixed-point register value.
///
/// The product is truncated toward zero and wrapped to 16 bits; temperatures
/// above 1023.98 K wrap around and negative inputs encode as 0.
pub fn encode_temperature(kelvin: f32) -> u16 {
    (kelvin * TEMPERATURE_SCALE) as i64 as u16
}

/// Converts an x64 fixed-point register value to Kelvin.
pub fn decode_temperature(raw: u16) -> f32 {
    f32::from(raw) / TEMPERATURE_SCALE
}

/// Converts whole percent relative humidity to the x512 fixed-point register value.
///
/// Wraps at 16 bits, so inputs of 128 or more do not survive.
pub fn encode_humidity(percent: u16) -> u16 {
    percent.wrapping_mul(HUMIDITY_SCALE as u16)
}

/// Converts an x512 fixed-point register value to percent relative humidity.
pub fn decode_humidity(raw: u16) -> f32 {
    f32::from(raw) / HUMIDITY_SCALE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operating_mode_accepts_only_defined_values() {
        assert_eq!(OperatingMode::try_from(0x00u8), Ok(OperatingMode::DeepSleep));
        assert_eq!(OperatingMode::try_from(0x01u8), Ok(OperatingMode::Idle));
        assert_eq!(OperatingMode::try_from(0x02u8), Ok(OperatingMode::Standard));
        assert_eq!(OperatingMode::try_from(0xF0u8), Ok(OperatingMode::Reset));
        for value in (0x03u8..=0xFF).filter(|v| *v != 0xF0) {
            assert_eq!(OperatingMode::try_from(value), Err(value));
        }
    }

    #[test]
    fn status_byte_decoding() {
        let status = DeviceStatus::from(0b1000_0010);
        assert!(status.operating);
        assert!(!status.error);
        assert!(status.new_data);
        assert!(!status.new_gpr_data);
        assert_eq!(status.validity, ValidityFlag::Normal);

        let status = DeviceStatus::from(0b0100_1101);
        assert!(!status.operating);
        assert!(status.error);
        assert!(!status.new_data);
        assert!(status.new_gpr_data);
        assert_eq!(status.validity, ValidityFlag::InvalidOutput);
    }

    #[test]
    fn validity_flag_mapping() {
        assert_eq!(ValidityFlag::from_bits(0b00), ValidityFlag::Normal);
        assert_eq!(ValidityFlag::from_bits(0b01), ValidityFlag::WarmUp);
        assert_eq!(ValidityFlag::from_bits(0b10), ValidityFlag::InitialStartup);
        assert_eq!(ValidityFlag::from_bits(0b11), ValidityFlag::InvalidOutput);
        assert_eq!(
            DeviceStatus::from(0b0000_0100).validity,
            ValidityFlag::WarmUp
        );
        assert_eq!(
            DeviceStatus::from(0b0000_1000).validity,
            ValidityFlag::InitialStartup
        );
    }

    #[test]
    fn interrupt_config_keeps_unrelated_bits() {
        let config = InterruptConfig(0xFF).polarity(InterruptPolarity::ActiveLow);
        assert_eq!(config.bits(), 0xFF & !InterruptConfig::POLARITY);

        let config = InterruptConfig(0x00)
            .enabled(true)
            .data_ready(true)
            .drive(InterruptDrive::PushPull);
        assert_eq!(config.bits(), 0b0010_0011);
        assert_eq!(config.get_drive(), InterruptDrive::PushPull);
        assert_eq!(config.get_polarity(), InterruptPolarity::ActiveLow);

        assert_eq!(InterruptConfig(0x00).gpr_ready(true).bits(), 0b0000_1000);
    }

    #[test]
    fn temperature_fixed_point() {
        // 25 C from the datasheet example
        assert_eq!(encode_temperature(298.15), 19081);
        for celsius in [-40.0f32, -0.5, 0.0, 21.3, 25.0, 37.77, 85.0] {
            let raw = encode_temperature(celsius + KELVIN_OFFSET);
            let back = decode_temperature(raw) - KELVIN_OFFSET;
            assert!(
                (back - celsius).abs() <= 1.0 / TEMPERATURE_SCALE,
                "{} C came back as {} C",
                celsius,
                back
            );
        }
    }

    #[test]
    fn humidity_fixed_point() {
        assert_eq!(encode_humidity(50), 0x6400);
        for percent in [0u16, 1, 45, 100, 127] {
            let back = decode_humidity(encode_humidity(percent));
            assert!((back - f32::from(percent)).abs() <= 1.0 / HUMIDITY_SCALE);
        }
        assert!((decode_humidity(0x6500) - 50.5).abs() <= 1.0 / HUMIDITY_SCALE);
        // 128 * 512 does not fit into 16 bits
        assert_eq!(encode_humidity(128), 0);
    }

    #[test]
    fn app_version_layout() {
        let version = AppVersion::from_bytes([5, 4, 6]);
        assert_eq!(version.as_u32(), 0x0006_0405);
        assert_eq!(version.to_string(), "5.4.6");
    }

    #[test]
    fn shared_tvoc_and_ethanol_address() {
        assert_eq!(Register::DataTvoc.address(), Register::DataEtoh.address());
        assert_eq!(Register::GprRead4.width(), 3);
        assert_eq!(Register::DeviceStatus.access(), Access::ReadOnly);
        assert_eq!(Register::TempIn.access(), Access::ReadWrite);
    }
}
