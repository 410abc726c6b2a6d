//! Blocking drivers, built on the `embedded-hal` I²C and delay traits.

use crate::fmt::{debug, trace};
use crate::hw_def::*;
use crate::transport::BusTransport;
use crate::types::*;

use embedded_hal::delay::DelayNs;

/// Blocking CCS811 driver
pub type Ccs811<Bus, Delay> = crate::types::Ccs811<Bus, Delay, Blocking>;

/// Blocking HDC1080 driver
pub type Hdc1080<Bus, Delay> = crate::types::Hdc1080<Bus, Delay, Blocking>;

impl<Bus, Delay, E> crate::types::Ccs811<Bus, Delay, Blocking>
where
    Bus: BusTransport<Error = E>,
    Delay: DelayNs,
{
    /// Create a new CCS811 driver instance
    pub fn new(bus: Bus, delay: Delay, i2c_addr: Ccs811Addr) -> Self {
        Self::with_mode(bus, delay, i2c_addr)
    }

    /// Reset the device, start its application firmware and begin 1 s measurements
    ///
    /// Stops at the first failed check. Any error means the device is not usable until
    /// `initialize()` succeeds from the start.
    pub fn initialize(&mut self) -> Result<(), Error<E>> {
        let addr = self.i2c_addr.as_u8();
        // the reset clears the device registers, so drop the cached copies too
        self.state = InitState::Reset;
        self.status = StatusRegister::default();
        self.meas_mode = MeasurementMode::default();

        self.bus.write(addr, CCS811_SW_RESET, &CCS811_RESET_SEQUENCE).map_err(Error::I2c)?;
        self.delay.delay_ms(CCS811_SETTLE_TIME_MS);

        let hw_id = self.bus.read8(addr, CCS811_HW_ID).map_err(Error::I2c)?;
        check_ccs811_hw_id::<E>(hw_id)?;
        let status = self.refresh_status()?;
        check_boot_status::<E>(status)?;
        self.state = InitState::BootVerified;

        self.bus.write_byte(addr, CCS811_APP_START).map_err(Error::I2c)?;
        self.delay.delay_ms(CCS811_SETTLE_TIME_MS);

        let hw_id = self.bus.read8(addr, CCS811_HW_ID).map_err(Error::I2c)?;
        debug!("ccs811: hw id after app start {}", hw_id);
        let status = self.refresh_status()?;
        if status.error {
            let error_id = match self.read_error_id() {
                Ok(error_id) => error_id,
                Err(_) => {
                    crate::fmt::warn!("ccs811: error id read failed");
                    ErrorId::default()
                }
            };
            crate::fmt::warn!("ccs811: error after app start, error id={}", error_id.raw());
            return Err(Error::DeviceError(error_id));
        }
        if !status.fw_mode {
            crate::fmt::warn!("ccs811: still in boot mode, status={}", status.raw());
            return Err(Error::StillInBootMode(status));
        }
        self.state = InitState::AppStarted;

        // interrupt and drive mode changes must be separate writes
        self.write_meas_mode(self.meas_mode.with_data_ready_interrupt(false))?;
        self.state = InitState::InterruptsConfigured;
        self.write_meas_mode(self.meas_mode.with_drive_mode(DriveMode::ConstantPower1s))?;
        self.state = InitState::Active;
        Ok(())
    }

    fn refresh_status(&mut self) -> Result<StatusRegister, Error<E>> {
        let raw = self.bus.read8(self.i2c_addr.as_u8(), CCS811_STATUS).map_err(Error::I2c)?;
        self.status = StatusRegister::from(raw);
        trace!("ccs811: status {}", raw);
        Ok(self.status)
    }

    fn write_meas_mode(&mut self, mode: MeasurementMode) -> Result<(), Error<E>> {
        self.bus
            .write8(self.i2c_addr.as_u8(), CCS811_MEAS_MODE, mode.into())
            .map_err(Error::I2c)?;
        self.meas_mode = mode;
        Ok(())
    }

    /// Read the status register and return its error flag
    pub fn read_status(&mut self) -> Result<bool, Error<E>> {
        Ok(self.refresh_status()?.error)
    }

    /// Read and decode the error ID register
    pub fn read_error_id(&mut self) -> Result<ErrorId, Error<E>> {
        let raw = self.bus.read8(self.i2c_addr.as_u8(), CCS811_ERROR_ID).map_err(Error::I2c)?;
        Ok(ErrorId::from(raw))
    }

    /// Read the status register and return whether a new sample is ready
    pub fn available(&mut self) -> Result<bool, Error<E>> {
        self.ensure_active::<E>()?;
        Ok(self.refresh_status()?.data_ready)
    }

    /// Read eCO2 and TVOC if a new sample is ready
    ///
    /// Returns `None` when no sample is ready. Otherwise stores the new values (see
    /// [`reading()`](Self::reading)) and returns 0, or the device's error byte when the
    /// status had its error flag set.
    pub fn read_data(&mut self) -> Result<Option<u8>, Error<E>> {
        if !self.available()? {
            return Ok(None);
        }
        let mut buf = [0u8; CCS811_ALG_RESULT_LEN];
        self.bus
            .read(self.i2c_addr.as_u8(), CCS811_ALG_RESULT_DATA, &mut buf)
            .map_err(Error::I2c)?;
        self.reading = AirQualityReading::from(&buf);
        Ok(Some(algorithm_result_code(&buf, self.status)))
    }

    /// Write humidity (%) and temperature (°C) used by the device for compensation
    pub fn set_environmental_data(&mut self, humidity_percent: u8, temperature: f32) -> Result<(), Error<E>> {
        self.ensure_active::<E>()?;
        let buf = encode_environmental_data(humidity_percent, temperature).ok_or(Error::<E>::InvalidInputData)?;
        self.bus
            .write(self.i2c_addr.as_u8(), CCS811_ENV_DATA, &buf)
            .map_err(Error::I2c)
    }

    fn read_ntc(&mut self) -> Result<[u8; CCS811_NTC_LEN], Error<E>> {
        self.ensure_active::<E>()?;
        let mut buf = [0u8; CCS811_NTC_LEN];
        self.bus.read(self.i2c_addr.as_u8(), CCS811_NTC, &mut buf).map_err(Error::I2c)?;
        trace!("ccs811: ntc {} {} {} {}", buf[0], buf[1], buf[2], buf[3]);
        Ok(buf)
    }

    /// Estimate the temperature in °C from the NTC, minus the temperature offset
    pub fn calculate_temperature(&mut self) -> Result<f32, Error<E>> {
        let buf = self.read_ntc()?;
        ntc_to_centigrade(&buf, self.temperature_offset).ok_or(Error::Computation)
    }

    /// Set the temperature offset so the NTC estimate matches a known temperature
    ///
    /// Returns the new offset.
    pub fn calibrate_temperature_offset(&mut self, reference_centigrade: f32) -> Result<f32, Error<E>> {
        let buf = self.read_ntc()?;
        let estimate = ntc_to_centigrade(&buf, 0.0).ok_or(Error::<E>::Computation)?;
        self.temperature_offset = estimate - reference_centigrade;
        Ok(self.temperature_offset)
    }

    /// Write the eCO2 interrupt thresholds
    pub fn set_thresholds(&mut self, thresholds: ThresholdConfig) -> Result<(), Error<E>> {
        self.ensure_active::<E>()?;
        self.bus
            .write(self.i2c_addr.as_u8(), CCS811_THRESHOLDS, &thresholds.to_bytes())
            .map_err(Error::I2c)
    }

    /// Enable the data-ready interrupt
    pub fn enable_interrupt(&mut self) -> Result<(), Error<E>> {
        self.ensure_active::<E>()?;
        self.write_meas_mode(self.meas_mode.with_data_ready_interrupt(true))
    }

    /// Change the measurement drive mode
    pub fn set_drive_mode(&mut self, drive_mode: DriveMode) -> Result<(), Error<E>> {
        self.ensure_active::<E>()?;
        self.write_meas_mode(self.meas_mode.with_drive_mode(drive_mode))
    }
}

impl<Bus, Delay, E> crate::types::Hdc1080<Bus, Delay, Blocking>
where
    Bus: BusTransport<Error = E>,
    Delay: DelayNs,
{
    /// Create a new HDC1080 driver instance
    pub fn new(bus: Bus, delay: Delay) -> Self {
        Self::with_mode(bus, delay)
    }

    /// Check the device ID and select non-sequential acquisition
    pub fn initialize(&mut self) -> Result<(), Error<E>> {
        let mut buf = [0u8; 2];
        self.bus
            .read(HDC1080_I2C_ADDR, HDC1080_DEVICE_ID, &mut buf)
            .map_err(Error::I2c)?;
        check_hdc1080_device_id::<E>(u16::from_be_bytes(buf))?;
        self.bus
            .write8(HDC1080_I2C_ADDR, HDC1080_CONFIG, HDC1080_CONFIG_SINGLE_ACQUISITION)
            .map_err(Error::I2c)
    }

    fn convert(&mut self, register: u8) -> Result<u16, Error<E>> {
        self.bus.write_byte(HDC1080_I2C_ADDR, register).map_err(Error::I2c)?;
        self.delay.delay_ms(HDC1080_CONVERSION_TIME_MS);
        let mut buf = [0u8; 2];
        self.bus.read(HDC1080_I2C_ADDR, register, &mut buf).map_err(Error::I2c)?;
        let raw = u16::from_be_bytes(buf);
        trace!("hdc1080: register {} raw {}", register, raw);
        Ok(raw)
    }

    /// Trigger a temperature conversion and return degrees centigrade
    pub fn read_temperature(&mut self) -> Result<f32, Error<E>> {
        Ok(raw_temp_to_centigrade(self.convert(HDC1080_TEMPERATURE)?))
    }

    /// Trigger a humidity conversion and return relative humidity in percent
    pub fn read_humidity(&mut self) -> Result<f32, Error<E>> {
        Ok(raw_rel_humid_to_percent(self.convert(HDC1080_HUMIDITY)?))
    }

    /// Convert temperature, then humidity
    pub fn read(&mut self) -> Result<HumidityTempReading, Error<E>> {
        let centigrade = self.read_temperature()?;
        let humidity_percent = self.read_humidity()?;
        Ok(HumidityTempReading {
            centigrade,
            humidity_percent,
        })
    }
}
