//! This is a platform-agnostic Rust driver for the two sensors of the Digilent Pmod AQS and
//! Pmod HYGRO boards, sharing one I²C bus: the ams CCS811 gas sensor (eCO2 and TVOC) and the
//! TI HDC1080 humidity and temperature sensor, using the [`embedded-hal`] or
//! [`embedded-hal-async`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//! [`embedded-hal-async`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal-async
//!
//! This driver allows you to:
//! - Bring the CCS811 from its bootloader into application mode with 1 s measurements.
//! - Read eCO2 and TVOC when a new sample is ready.
//! - Write humidity and temperature for environmental compensation.
//! - Estimate the temperature from the CCS811's NTC input, with a calibration offset.
//! - Write eCO2 interrupt thresholds, change the drive mode, enable the data-ready interrupt.
//! - Read the CCS811 status and error ID registers.
//! - Check the HDC1080 device ID and trigger temperature and humidity conversions.
//! - blocking API support.
//! - async API support.
//!
//! This driver does not support the following device features:
//! - CCS811 firmware update (app erase/data/verify).
//! - CCS811 baseline save/restore and raw data reads.
//! - HDC1080 heater, resolution settings and combined (sequential) acquisition.
//!
//! ## Features
//!
//! - `async`: Enables async API.
//! - `blocking`: Enables blocking API.
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## Bus sharing
//!
//! Each driver owns whatever bus handle it is given and never locks. To put both sensors on
//! one bus, hand each driver a shared-bus device such as `embedded_hal_bus::i2c::RefCellDevice`.
//! A conversion is a trigger write, a wait and a read; when the bus is shared across threads
//! or tasks, keep other traffic off it for the whole operation.
//!
//! ## Errors
//!
//! `initialize()` returns an error instead of giving up on the device; a failed CCS811
//! bring-up should be retried from `initialize()`, never from a later step.
//!
//! Datasheets:
//!   [CCS811](https://www.sciosense.com/wp-content/uploads/documents/SC-001232-DS-3-CCS811B-Datasheet-Revision-2.pdf)
//!   [HDC1080](https://www.ti.com/lit/ds/symlink/hdc1080.pdf)
//!
//! ## Blocking Example:
//!
//! ```ignore
//! use core::cell::RefCell;
//! use embedded_hal_bus::i2c::RefCellDevice;
//! use pmod_env::{blocking::{Ccs811, Hdc1080}, Ccs811Addr};
//!
//! // Platform-specific
//! let i2c = /* embedded_hal::i2c::I2c instance */;
//! let delay = /* embedded_hal::delay::DelayNs instance */;
//!
//! let bus = RefCell::new(i2c);
//! let mut aqs = Ccs811::new(RefCellDevice::new(&bus), delay.clone(), Ccs811Addr::Addr5B);
//! let mut hygro = Hdc1080::new(RefCellDevice::new(&bus), delay);
//! aqs.initialize().unwrap();
//! hygro.initialize().unwrap();
//!
//! loop {
//!     let reading = hygro.read().unwrap();
//!     aqs.set_environmental_data(reading.humidity_percent as u8, reading.centigrade).unwrap();
//!     if let Some(0) = aqs.read_data().unwrap() {
//!         println!("{} ppm eCO2, {} ppb TVOC", aqs.eco2(), aqs.tvoc());
//!     }
//!     sleep_secs(5);
//! }
//! ```
//!
//! ## Async Example:
//!
//! ```ignore
//! use pmod_env::{asynchronous::Hdc1080};
//!
//! let mut hygro = Hdc1080::new(i2c, delay);
//! hygro.initialize().await.unwrap();
//! println!("{:0.1} °C", hygro.read_temperature().await.unwrap());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), no_std)]

#[cfg(not(any(feature = "async", feature = "blocking")))]
compile_error!("At least one of \"async\" and \"blocking\" features must be enabled");

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod fmt;
mod hw_def;
mod types;

#[cfg(feature = "async")]
pub mod asynchronous;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod transport;

#[cfg(test)]
mod bus_log;

pub use crate::{hw_def::*, types::*};
