use crate::hw_def::*;

use core::{fmt, marker::PhantomData};

#[cfg(feature = "defmt")]
use defmt::Format;

/// Marker for drivers using the blocking `embedded-hal` traits
#[derive(Debug)]
pub struct Blocking;

/// Marker for drivers using the `embedded-hal-async` traits
#[derive(Debug)]
pub struct Async;

/// CCS811 air-quality sensor driver (Pmod AQS)
///
/// `Mode` is [`Blocking`] or [`Async`]; use the `blocking::Ccs811` or `asynchronous::Ccs811`
/// aliases rather than naming it.
#[derive(Debug)]
pub struct Ccs811<Bus, Delay, Mode> {
    pub(crate) bus: Bus,
    pub(crate) delay: Delay,
    pub(crate) i2c_addr: Ccs811Addr,
    pub(crate) state: InitState,
    pub(crate) status: StatusRegister,
    pub(crate) meas_mode: MeasurementMode,
    pub(crate) reading: AirQualityReading,
    pub(crate) temperature_offset: f32,
    pub(crate) _mode: PhantomData<Mode>,
}

/// HDC1080 humidity and temperature sensor driver (Pmod HYGRO)
///
/// Always addressed at [`HDC1080_I2C_ADDR`]; the chip has no address select.
#[derive(Debug)]
pub struct Hdc1080<Bus, Delay, Mode> {
    pub(crate) bus: Bus,
    pub(crate) delay: Delay,
    pub(crate) _mode: PhantomData<Mode>,
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// I²C communication error
    I2c(E),
    /// Invalid input data provided
    InvalidInputData,
    /// The hardware ID register did not hold the expected value
    DeviceIdentityMismatch {
        /// expected ID
        expected: u16,
        /// ID read from the device
        found: u16,
    },
    /// After reset the device was not in boot mode, or had no valid application
    InvalidBootState(StatusRegister),
    /// The device reported an error after the application was started
    DeviceError(ErrorId),
    /// Application start did not take effect
    StillInBootMode(StatusRegister),
    /// A numeric conversion got degenerate input (e.g. a zero reference voltage)
    Computation,
    /// The device has not been brought up with `initialize()`
    NotInitialized,
}

/// Progress through the CCS811 bootloader-to-application sequence
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum InitState {
    /// reset sent (or nothing done yet)
    #[default]
    Reset,
    /// hardware ID matched, bootloader with a valid application confirmed
    BootVerified,
    /// application firmware running
    AppStarted,
    /// data-ready interrupt disabled
    InterruptsConfigured,
    /// measuring in the 1 s constant power mode
    Active,
}

/// CCS811 status register snapshot
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StatusRegister {
    raw: u8,
    /// an error occurred, details in the error ID register
    pub error: bool,
    /// a new sample is ready in the algorithm result register
    pub data_ready: bool,
    /// a valid application firmware is loaded
    pub app_valid: bool,
    /// firmware is in application mode (else boot mode)
    pub fw_mode: bool,
}
impl From<u8> for StatusRegister {
    fn from(raw: u8) -> Self {
        Self {
            raw,
            error: (raw >> STATUS_FIELD_LSBIT_ERROR) & 1 != 0,
            data_ready: (raw >> STATUS_FIELD_LSBIT_DATA_READY) & 1 != 0,
            app_valid: (raw >> STATUS_FIELD_LSBIT_APP_VALID) & 1 != 0,
            fw_mode: (raw >> STATUS_FIELD_LSBIT_FW_MODE) & 1 != 0,
        }
    }
}
impl StatusRegister {
    /// Get the raw status byte
    pub fn raw(&self) -> u8 {
        self.raw
    }
}
impl fmt::Display for StatusRegister {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusRegister {{ 0x{:02x}; ", self.raw)?;
        if self.error {
            write!(f, "error ")?;
        }
        if self.data_ready {
            write!(f, "data_ready ")?;
        }
        if self.app_valid {
            write!(f, "app_valid ")?;
        }
        if self.fw_mode {
            write!(f, "fw_mode ")?;
        }
        write!(f, "}}")
    }
}

/// CCS811 measurement drive mode
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DriveMode {
    /// measurements disabled
    #[default]
    Idle = 0,
    /// constant power, a measurement every second
    ConstantPower1s = 1,
    /// pulse heating, a measurement every 10 seconds
    Pulse10s = 2,
    /// low power pulse heating, a measurement every 60 seconds
    LowPowerPulse60s = 3,
    /// constant power, raw data every 250 ms
    ConstantPower250ms = 4,
}

/// CCS811 measurement mode register value
///
/// Value type: the `with_*` methods return a modified copy.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct MeasurementMode {
    /// interrupt only when eCO2 crosses a threshold
    pub int_thresh: bool,
    /// interrupt when new data is ready
    pub int_datardy: bool,
    /// measurement drive mode
    pub drive_mode: DriveMode,
}
impl MeasurementMode {
    /// Copy with the data-ready interrupt enabled or disabled
    pub fn with_data_ready_interrupt(self, enabled: bool) -> Self {
        Self { int_datardy: enabled, ..self }
    }
    /// Copy with the threshold interrupt enabled or disabled
    pub fn with_threshold_interrupt(self, enabled: bool) -> Self {
        Self { int_thresh: enabled, ..self }
    }
    /// Copy with a different drive mode
    pub fn with_drive_mode(self, drive_mode: DriveMode) -> Self {
        Self { drive_mode, ..self }
    }
}
impl From<MeasurementMode> for u8 {
    fn from(mode: MeasurementMode) -> Self {
        let drive_mask = (1u8 << MEAS_MODE_FIELD_WIDTH_DRIVE_MODE) - 1;
        ((mode.int_thresh as u8) << MEAS_MODE_FIELD_LSBIT_INT_THRESH)
            | ((mode.int_datardy as u8) << MEAS_MODE_FIELD_LSBIT_INT_DATARDY)
            | (((mode.drive_mode as u8) & drive_mask) << MEAS_MODE_FIELD_LSBIT_DRIVE_MODE)
    }
}

/// CCS811 error ID register snapshot
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct ErrorId {
    raw: u8,
    /// write to an invalid register address
    pub write_reg_invalid: bool,
    /// read from an invalid register address
    pub read_reg_invalid: bool,
    /// unsupported measurement mode requested
    pub measmode_invalid: bool,
    /// sensor resistance reached its maximum
    pub max_resistance: bool,
    /// heater current out of range
    pub heater_fault: bool,
    /// heater voltage out of range
    pub heater_supply: bool,
}
impl From<u8> for ErrorId {
    fn from(raw: u8) -> Self {
        Self {
            raw,
            write_reg_invalid: (raw >> ERROR_ID_FIELD_LSBIT_WRITE_REG_INVALID) & 1 != 0,
            read_reg_invalid: (raw >> ERROR_ID_FIELD_LSBIT_READ_REG_INVALID) & 1 != 0,
            measmode_invalid: (raw >> ERROR_ID_FIELD_LSBIT_MEASMODE_INVALID) & 1 != 0,
            max_resistance: (raw >> ERROR_ID_FIELD_LSBIT_MAX_RESISTANCE) & 1 != 0,
            heater_fault: (raw >> ERROR_ID_FIELD_LSBIT_HEATER_FAULT) & 1 != 0,
            heater_supply: (raw >> ERROR_ID_FIELD_LSBIT_HEATER_SUPPLY) & 1 != 0,
        }
    }
}
impl ErrorId {
    /// Get the raw error ID byte
    pub fn raw(&self) -> u8 {
        self.raw
    }
}
impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ErrorId {{ 0x{:02x}; ", self.raw)?;
        if self.write_reg_invalid {
            write!(f, "write_reg_invalid ")?;
        }
        if self.read_reg_invalid {
            write!(f, "read_reg_invalid ")?;
        }
        if self.measmode_invalid {
            write!(f, "measmode_invalid ")?;
        }
        if self.max_resistance {
            write!(f, "max_resistance ")?;
        }
        if self.heater_fault {
            write!(f, "heater_fault ")?;
        }
        if self.heater_supply {
            write!(f, "heater_supply ")?;
        }
        write!(f, "}}")
    }
}

/// eCO2 and TVOC from the CCS811 algorithm result register
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct AirQualityReading {
    /// equivalent CO2 in ppm
    pub eco2: u16,
    /// total volatile organic compounds in ppb
    pub tvoc: u16,
}
impl From<&[u8; CCS811_ALG_RESULT_LEN]> for AirQualityReading {
    fn from(buf: &[u8; CCS811_ALG_RESULT_LEN]) -> Self {
        Self {
            eco2: u16::from_be_bytes([buf[0], buf[1]]),
            tvoc: u16::from_be_bytes([buf[2], buf[3]]),
        }
    }
}

/// Result code of an algorithm result read: 0 when the status had no error, else byte 5
pub(crate) fn algorithm_result_code(buf: &[u8; CCS811_ALG_RESULT_LEN], status: StatusRegister) -> u8 {
    if status.error {
        buf[CCS811_ALG_RESULT_ERROR_BYTE]
    } else {
        0
    }
}

/// eCO2 interrupt thresholds
///
/// Only the low nibble of each threshold byte reaches the device.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ThresholdConfig {
    /// boundary between the low and medium ranges
    pub low_medium: u16,
    /// boundary between the medium and high ranges
    pub medium_high: u16,
    /// hysteresis applied around the boundaries
    pub hysteresis: u8,
}
impl ThresholdConfig {
    /// Thresholds with the default hysteresis
    pub fn new(low_medium: u16, medium_high: u16) -> Self {
        Self {
            low_medium,
            medium_high,
            hysteresis: DEFAULT_THRESHOLD_HYSTERESIS,
        }
    }
    /// Copy with a different hysteresis
    pub fn with_hysteresis(self, hysteresis: u8) -> Self {
        Self { hysteresis, ..self }
    }
    /// Encode for the thresholds register
    pub fn to_bytes(&self) -> [u8; CCS811_THRESHOLDS_LEN] {
        let nibble = |v: u16| (v & THRESHOLD_NIBBLE_MASK) as u8;
        [
            nibble(self.low_medium >> 8),
            nibble(self.low_medium),
            nibble(self.medium_high >> 8),
            nibble(self.medium_high),
            self.hysteresis,
        ]
    }
}

/// Encode humidity (%) and temperature (°C) for the environmental data register
///
/// Returns `None` when either value does not fit the wire format. The fractional humidity
/// byte is always 0.
pub fn encode_environmental_data(humidity_percent: u8, temperature: f32) -> Option<[u8; CCS811_ENV_DATA_LEN]> {
    if humidity_percent > ENV_HUMIDITY_MAX || !temperature.is_finite() {
        return None;
    }
    let whole = libm::floorf(temperature);
    let fraction = temperature - whole;
    let whole = whole as i32;
    if !(ENV_TEMP_MIN_WHOLE..=ENV_TEMP_MAX_WHOLE).contains(&whole) {
        return None;
    }
    let conv = ((whole + ENV_TEMP_OFFSET) << ENV_TEMP_FRACTION_BITS)
        | ((fraction / ENV_TEMP_STEP) as i32 & ENV_TEMP_FRACTION_MASK);
    let [temp_msb, temp_lsb] = (conv as u16).to_be_bytes();
    Some([humidity_percent << 1, 0x00, temp_msb, temp_lsb])
}

/// Estimate the temperature from the CCS811 NTC register contents
///
/// Single-point Beta model around 25 °C. Returns `None` for a zero reference or NTC voltage.
pub fn ntc_to_centigrade(buf: &[u8; CCS811_NTC_LEN], offset: f32) -> Option<f32> {
    let vref = u16::from_be_bytes([buf[0], buf[1]]);
    let vntc = u16::from_be_bytes([buf[2], buf[3]]);
    if vref == 0 || vntc == 0 {
        return None;
    }
    let rntc = vntc as f64 * CCS811_REF_RESISTOR / vref as f64;
    let inv_t = libm::log(rntc / CCS811_REF_RESISTOR) / NTC_BETA + 1.0 / (NTC_NOMINAL_CELSIUS + KELVIN_OFFSET);
    let centigrade = (1.0 / inv_t - KELVIN_OFFSET) as f32 - offset;
    centigrade.is_finite().then_some(centigrade)
}

/// Temperature and relative humidity from the HDC1080
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HumidityTempReading {
    /// degrees centigrade
    pub centigrade: f32,
    /// relative humidity in percent
    pub humidity_percent: f32,
}

/// Convert a raw HDC1080 temperature to degrees centigrade
pub fn raw_temp_to_centigrade(raw: u16) -> f32 {
    raw as f32 / 65536.0 * 165.0 - 40.0
}

/// Convert a raw HDC1080 humidity to relative humidity in percent
pub fn raw_rel_humid_to_percent(raw: u16) -> f32 {
    raw as f32 / 65536.0 * 100.0
}

pub(crate) fn check_ccs811_hw_id<E>(found: u8) -> Result<(), Error<E>> {
    if found != CCS811_HW_ID_CODE {
        crate::fmt::warn!("ccs811: hw id {} != {}", found, CCS811_HW_ID_CODE);
        return Err(Error::DeviceIdentityMismatch {
            expected: CCS811_HW_ID_CODE as u16,
            found: found as u16,
        });
    }
    Ok(())
}

pub(crate) fn check_boot_status<E>(status: StatusRegister) -> Result<(), Error<E>> {
    if status.fw_mode || !status.app_valid {
        crate::fmt::warn!("ccs811: not in boot mode or no valid application, status={}", status.raw());
        return Err(Error::InvalidBootState(status));
    }
    Ok(())
}

pub(crate) fn check_hdc1080_device_id<E>(found: u16) -> Result<(), Error<E>> {
    if found != HDC1080_DEVICE_ID_CODE {
        crate::fmt::warn!("hdc1080: device id {} != {}", found, HDC1080_DEVICE_ID_CODE);
        return Err(Error::DeviceIdentityMismatch {
            expected: HDC1080_DEVICE_ID_CODE,
            found,
        });
    }
    Ok(())
}

impl<Bus, Delay, Mode> Ccs811<Bus, Delay, Mode> {
    pub(crate) fn with_mode(bus: Bus, delay: Delay, i2c_addr: Ccs811Addr) -> Self {
        Self {
            bus,
            delay,
            i2c_addr,
            state: InitState::Reset,
            status: StatusRegister::default(),
            meas_mode: MeasurementMode::default(),
            reading: AirQualityReading::default(),
            temperature_offset: 0.0,
            _mode: PhantomData,
        }
    }

    pub(crate) fn ensure_active<E>(&self) -> Result<(), Error<E>> {
        match self.state {
            InitState::Active => Ok(()),
            _ => Err(Error::NotInitialized),
        }
    }

    /// Get the progress of the bootloader-to-application sequence
    pub fn state(&self) -> InitState {
        self.state
    }

    /// Get the status register as of the last status read
    pub fn status(&self) -> StatusRegister {
        self.status
    }

    /// Get the measurement mode last written to the device
    pub fn measurement_mode(&self) -> MeasurementMode {
        self.meas_mode
    }

    /// Get the last eCO2 and TVOC values
    pub fn reading(&self) -> AirQualityReading {
        self.reading
    }

    /// Get the last TVOC value in ppb
    pub fn tvoc(&self) -> u16 {
        self.reading.tvoc
    }

    /// Get the last eCO2 value in ppm
    pub fn eco2(&self) -> u16 {
        self.reading.eco2
    }

    /// Set the calibration offset subtracted from NTC temperature estimates
    pub fn set_temperature_offset(&mut self, offset: f32) {
        self.temperature_offset = offset;
    }

    /// Get the calibration offset subtracted from NTC temperature estimates
    pub fn temperature_offset(&self) -> f32 {
        self.temperature_offset
    }

    /// Destroy the driver, returning the bus and delay
    pub fn destroy(self) -> (Bus, Delay) {
        (self.bus, self.delay)
    }
}

impl<Bus, Delay, Mode> Hdc1080<Bus, Delay, Mode> {
    pub(crate) fn with_mode(bus: Bus, delay: Delay) -> Self {
        Self {
            bus,
            delay,
            _mode: PhantomData,
        }
    }

    /// Destroy the driver, returning the bus and delay
    pub fn destroy(self) -> (Bus, Delay) {
        (self.bus, self.delay)
    }
}
