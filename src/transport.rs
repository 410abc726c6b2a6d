//! Register-level operations on an I²C bus, keyed by device address.
//!
//! Both drivers talk to their chip only through [`BusTransport`] (or [`AsyncBusTransport`]).
//! Every `embedded-hal` I²C implementation gets them for free, including the shared-bus
//! devices from `embedded-hal-bus`, so one physical bus can be handed to both drivers.
//!
//! A trigger write and its paired read are separate bus operations. When the bus is shared
//! between threads or tasks, the caller must keep other traffic off the bus for the whole
//! driver operation, not just for each transfer.

/// Largest payload of a block write (the SMBus block limit)
pub const MAX_BLOCK_LEN: usize = 32;

/// Blocking register access
#[cfg(feature = "blocking")]
pub trait BusTransport {
    /// Transport error
    type Error;

    /// Write a single raw byte
    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), Self::Error>;

    /// Write `bytes` starting at `register`
    ///
    /// # Panics
    ///
    /// The provided implementation panics if `bytes` is longer than [`MAX_BLOCK_LEN`].
    fn write(&mut self, addr: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes starting at `register`
    fn read(&mut self, addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Read one register byte
    fn read8(&mut self, addr: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read(addr, register, &mut buf)?;
        Ok(buf[0])
    }

    /// Write one register byte
    fn write8(&mut self, addr: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write(addr, register, &[value])
    }
}

#[cfg(feature = "blocking")]
impl<T: embedded_hal::i2c::I2c> BusTransport for T {
    type Error = T::Error;

    fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write(self, addr, &[value])
    }

    fn write(&mut self, addr: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let (frame, len) = block_frame(register, bytes);
        embedded_hal::i2c::I2c::write(self, addr, &frame[..len])
    }

    fn read(&mut self, addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal::i2c::I2c::write_read(self, addr, &[register], buf)
    }
}

/// Async register access
#[cfg(feature = "async")]
#[allow(async_fn_in_trait)]
pub trait AsyncBusTransport {
    /// Transport error
    type Error;

    /// Write a single raw byte
    async fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), Self::Error>;

    /// Write `bytes` starting at `register`
    ///
    /// # Panics
    ///
    /// The provided implementation panics if `bytes` is longer than [`MAX_BLOCK_LEN`].
    async fn write(&mut self, addr: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error>;

    /// Read `buf.len()` bytes starting at `register`
    async fn read(&mut self, addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Read one register byte
    async fn read8(&mut self, addr: u8, register: u8) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read(addr, register, &mut buf).await?;
        Ok(buf[0])
    }

    /// Write one register byte
    async fn write8(&mut self, addr: u8, register: u8, value: u8) -> Result<(), Self::Error> {
        self.write(addr, register, &[value]).await
    }
}

#[cfg(feature = "async")]
impl<T: embedded_hal_async::i2c::I2c> AsyncBusTransport for T {
    type Error = T::Error;

    async fn write_byte(&mut self, addr: u8, value: u8) -> Result<(), Self::Error> {
        embedded_hal_async::i2c::I2c::write(self, addr, &[value]).await
    }

    async fn write(&mut self, addr: u8, register: u8, bytes: &[u8]) -> Result<(), Self::Error> {
        let (frame, len) = block_frame(register, bytes);
        embedded_hal_async::i2c::I2c::write(self, addr, &frame[..len]).await
    }

    async fn read(&mut self, addr: u8, register: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        embedded_hal_async::i2c::I2c::write_read(self, addr, &[register], buf).await
    }
}

// Register pointer followed by the payload, sent as one write.
fn block_frame(register: u8, bytes: &[u8]) -> ([u8; MAX_BLOCK_LEN + 1], usize) {
    // We are heapless, so have to have an upper bound
    assert!(bytes.len() <= MAX_BLOCK_LEN);
    let mut frame = [0u8; MAX_BLOCK_LEN + 1];
    frame[0] = register;
    frame[1..=bytes.len()].copy_from_slice(bytes);
    (frame, bytes.len() + 1)
}
