//! Register maps and device constants for the CCS811 (Pmod AQS) and HDC1080 (Pmod HYGRO).

#[cfg(feature = "defmt")]
use defmt::Format;

/// I²C address of the CCS811, selected by its ADDR pin
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Ccs811Addr {
    /// ADDR pin low (0x5A)
    Addr5A,
    /// ADDR pin high (0x5B), the Pmod AQS wiring
    #[default]
    Addr5B,
}
impl Ccs811Addr {
    /// Get the 7-bit I²C address
    pub const fn as_u8(self) -> u8 {
        match self {
            Ccs811Addr::Addr5A => 0x5A,
            Ccs811Addr::Addr5B => 0x5B,
        }
    }
}

/// I²C address of the HDC1080
///
/// Fixed in the chip, which has no address pins, so `Hdc1080::new` takes no address.
pub const HDC1080_I2C_ADDR: u8 = 0x40;

// CCS811 registers, all 1 byte except when stated otherwise

/// CCS811 status register
pub const CCS811_STATUS: u8 = 0x00;
/// CCS811 measurement mode register
pub const CCS811_MEAS_MODE: u8 = 0x01;
/// CCS811 algorithm result register (8 bytes)
pub const CCS811_ALG_RESULT_DATA: u8 = 0x02;
/// CCS811 environmental data register (4 bytes)
pub const CCS811_ENV_DATA: u8 = 0x05;
/// CCS811 NTC register (4 bytes)
pub const CCS811_NTC: u8 = 0x06;
/// CCS811 interrupt thresholds register (5 bytes)
pub const CCS811_THRESHOLDS: u8 = 0x10;
/// CCS811 hardware ID register
pub const CCS811_HW_ID: u8 = 0x20;
/// CCS811 extended error ID register
pub const CCS811_ERROR_ID: u8 = 0xE0;
/// CCS811 bootloader command: start application (no payload)
pub const CCS811_APP_START: u8 = 0xF4;
/// CCS811 software reset register (4 bytes)
pub const CCS811_SW_RESET: u8 = 0xFF;

/// Value of the CCS811 hardware ID register
pub const CCS811_HW_ID_CODE: u8 = 0x81;
/// Unlock sequence that must be written to the software reset register
pub const CCS811_RESET_SEQUENCE: [u8; 4] = [0x11, 0xE5, 0x72, 0x8A];
/// Wait after software reset and after application start
pub const CCS811_SETTLE_TIME_MS: u32 = 100;

pub(crate) const CCS811_ALG_RESULT_LEN: usize = 8;
pub(crate) const CCS811_ALG_RESULT_ERROR_BYTE: usize = 5;
pub(crate) const CCS811_NTC_LEN: usize = 4;
pub(crate) const CCS811_ENV_DATA_LEN: usize = 4;
pub(crate) const CCS811_THRESHOLDS_LEN: usize = 5;

/// Reference resistor in series with the NTC on the Pmod AQS, in ohms
pub const CCS811_REF_RESISTOR: f64 = 100_000.0;
pub(crate) const NTC_BETA: f64 = 3380.0;
pub(crate) const NTC_NOMINAL_CELSIUS: f64 = 25.0;
pub(crate) const KELVIN_OFFSET: f64 = 273.15;

/// Environmental data temperature step (1/512 °C)
pub(crate) const ENV_TEMP_STEP: f32 = 0.001953125;
/// Environmental data temperature offset (the wire value 0 is -25 °C)
pub(crate) const ENV_TEMP_OFFSET: i32 = 25;
pub(crate) const ENV_TEMP_FRACTION_MASK: i32 = 0x1FF;
pub(crate) const ENV_TEMP_FRACTION_BITS: i32 = 9;
pub(crate) const ENV_TEMP_MIN_WHOLE: i32 = -25;
pub(crate) const ENV_TEMP_MAX_WHOLE: i32 = 102;
pub(crate) const ENV_HUMIDITY_MAX: u8 = 100;

/// Hysteresis used when a threshold configuration does not set one
pub const DEFAULT_THRESHOLD_HYSTERESIS: u8 = 50;
pub(crate) const THRESHOLD_NIBBLE_MASK: u16 = 0xF;

pub(crate) const STATUS_FIELD_LSBIT_ERROR: u8 = 0;
pub(crate) const STATUS_FIELD_LSBIT_DATA_READY: u8 = 3;
pub(crate) const STATUS_FIELD_LSBIT_APP_VALID: u8 = 4;
pub(crate) const STATUS_FIELD_LSBIT_FW_MODE: u8 = 7;

pub(crate) const MEAS_MODE_FIELD_LSBIT_INT_THRESH: u8 = 2;
pub(crate) const MEAS_MODE_FIELD_LSBIT_INT_DATARDY: u8 = 3;
pub(crate) const MEAS_MODE_FIELD_LSBIT_DRIVE_MODE: u8 = 4;
pub(crate) const MEAS_MODE_FIELD_WIDTH_DRIVE_MODE: u8 = 3;

pub(crate) const ERROR_ID_FIELD_LSBIT_WRITE_REG_INVALID: u8 = 0;
pub(crate) const ERROR_ID_FIELD_LSBIT_READ_REG_INVALID: u8 = 1;
pub(crate) const ERROR_ID_FIELD_LSBIT_MEASMODE_INVALID: u8 = 2;
pub(crate) const ERROR_ID_FIELD_LSBIT_MAX_RESISTANCE: u8 = 3;
pub(crate) const ERROR_ID_FIELD_LSBIT_HEATER_FAULT: u8 = 4;
pub(crate) const ERROR_ID_FIELD_LSBIT_HEATER_SUPPLY: u8 = 5;

// HDC1080 registers

/// HDC1080 temperature register; writing the pointer triggers a conversion
pub const HDC1080_TEMPERATURE: u8 = 0x00;
/// HDC1080 humidity register; writing the pointer triggers a conversion
pub const HDC1080_HUMIDITY: u8 = 0x01;
/// HDC1080 configuration register
pub const HDC1080_CONFIG: u8 = 0x02;
/// HDC1080 device ID register (2 bytes)
pub const HDC1080_DEVICE_ID: u8 = 0xFE;

/// Value of the HDC1080 device ID register
pub const HDC1080_DEVICE_ID_CODE: u16 = 0x5449;
/// Configuration: non-sequential acquisition (temperature and humidity read separately)
pub const HDC1080_CONFIG_SINGLE_ACQUISITION: u8 = 0x00;
/// Conversion time covering both temperature (6.5 ms) and humidity (6.35 ms)
pub const HDC1080_CONVERSION_TIME_MS: u32 = 7;
