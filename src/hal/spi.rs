//! SPI Bus Abstractions
//!
//! Register-level SPI access plus [`ConverterBus`], which runs the fixed
//! chip-select framed exchanges the AD7791 understands.
//!
//! Every exchange follows the same shape: pull chip-select low, flush both
//! FIFOs, shift the frame out, wait for the same number of bytes to come
//! back, then release chip-select. The wait is bounded by
//! [`BusConfig::timeout_us`].

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::{SPI_CLOCK_DIVIDER, SPI_DUMMY_BYTE, SPI_RESET_BYTE, SPI_RESET_LEN, SPI_TIMEOUT_US};
use crate::types::{ReadWidth, RegisterWrite};

/// Longest frame the converter uses
const MAX_FRAME: usize = 4;

/// SPI controller options applied by [`SpiPort::enable`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SpiOptions {
    /// Master mode
    pub master: bool,
    /// Full-duplex: every TX byte clocks in one RX byte
    pub full_duplex: bool,
    /// Drive the controller's own chip-select output
    pub chip_select_output: bool,
    /// Overwrite the oldest RX byte on overflow instead of dropping new ones
    pub rx_overwrite: bool,
    /// Shift zeros when the TX FIFO runs dry
    pub zero_pad: bool,
    /// Start a transfer on each TX FIFO write
    pub start_on_tx_write: bool,
    /// Clock idles high
    pub clock_idle_high: bool,
    /// Sample on the trailing clock edge
    pub sample_trailing_edge: bool,
}

impl SpiOptions {
    /// Settings for the AD7791: mode 3, master, full-duplex
    pub const AD7791: Self = Self {
        master: true,
        full_duplex: true,
        chip_select_output: true,
        rx_overwrite: true,
        zero_pad: true,
        start_on_tx_write: true,
        clock_idle_high: true,
        sample_trailing_edge: true,
    };
}

impl Default for SpiOptions {
    fn default() -> Self {
        Self::AD7791
    }
}

/// Register-level access to one SPI controller
pub trait SpiPort {
    /// Turn off the internal pull-ups on the bus pins
    fn disable_pullups(&mut self);

    /// Hand the bus pins to the SPI function
    fn route_pins(&mut self);

    /// Set the serial clock divider
    fn set_clock_divider(&mut self, divider: u8);

    /// Configure and enable the controller
    fn enable(&mut self, options: SpiOptions);

    /// Clear both TX and RX FIFOs
    fn flush_fifos(&mut self);

    /// Push one byte into the TX FIFO
    fn transmit(&mut self, byte: u8);

    /// Pop one byte from the RX FIFO
    fn receive(&mut self) -> u8;

    /// Bytes currently waiting in the RX FIFO
    fn rx_level(&mut self) -> u8;
}

/// Converter bus settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BusConfig {
    /// Serial clock divider
    pub clock_divider: u8,
    /// Controller options
    pub options: SpiOptions,
    /// Longest wait for a frame to complete, in microseconds
    pub timeout_us: u32,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            clock_divider: SPI_CLOCK_DIVIDER,
            options: SpiOptions::AD7791,
            timeout_us: SPI_TIMEOUT_US,
        }
    }
}

/// Converter bus error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusError<E> {
    /// The RX FIFO did not fill before the timeout
    Timeout {
        /// Bytes the frame should have produced
        expected: u8,
        /// Bytes seen when the wait gave up
        received: u8,
    },
    /// Driving the chip-select pin failed
    ChipSelect(E),
}

impl<E> From<E> for BusError<E> {
    fn from(other: E) -> Self {
        Self::ChipSelect(other)
    }
}

impl<E: fmt::Debug> fmt::Display for BusError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout { expected, received } => {
                write!(f, "bus timeout: {received} of {expected} bytes received")
            }
            Self::ChipSelect(e) => write!(f, "chip-select error: {e:?}"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for BusError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Timeout { expected, received } => {
                defmt::write!(f, "Timeout({}/{})", received, expected);
            }
            Self::ChipSelect(_) => defmt::write!(f, "ChipSelect"),
        }
    }
}

/// Bus operation result
pub type BusResult<T, E> = Result<T, BusError<E>>;

/// Framed register access to the converter on one SPI controller
pub struct ConverterBus<S, CS, D> {
    spi: S,
    cs: CS,
    delay: D,
    config: BusConfig,
}

impl<S, CS, D> ConverterBus<S, CS, D>
where
    S: SpiPort,
    CS: OutputPin,
    D: DelayNs,
{
    /// Create a bus with the default configuration
    pub fn new(spi: S, cs: CS, delay: D) -> Self {
        Self::with_config(spi, cs, delay, BusConfig::default())
    }

    /// Create a bus with an explicit configuration
    pub fn with_config(spi: S, cs: CS, delay: D, config: BusConfig) -> Self {
        Self {
            spi,
            cs,
            delay,
            config,
        }
    }

    /// Release the controller, chip-select pin and delay
    pub fn release(self) -> (S, CS, D) {
        (self.spi, self.cs, self.delay)
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Bring up the SPI controller and park chip-select high
    pub fn init(&mut self) -> BusResult<(), CS::Error> {
        self.spi.disable_pullups();
        self.spi.route_pins();
        self.spi.set_clock_divider(self.config.clock_divider);
        self.spi.enable(self.config.options);
        self.cs.set_high()?;

        dev_info!("converter bus up, divider {}", self.config.clock_divider);
        Ok(())
    }

    /// Write a converter register, or reset the converter
    ///
    /// For [`RegisterWrite::Reset`] the address and data are ignored and
    /// four 0xFF bytes are sent instead.
    pub fn write_register(
        &mut self,
        address: u8,
        data: u8,
        op: RegisterWrite,
    ) -> BusResult<(), CS::Error> {
        match op {
            RegisterWrite::Register => self.frame(&[address, data], |_| ()),
            RegisterWrite::Reset => self.frame(&[SPI_RESET_BYTE; SPI_RESET_LEN], |_| ()),
        }
    }

    /// Reset the converter's serial interface
    pub fn reset_device(&mut self) -> BusResult<(), CS::Error> {
        self.write_register(0, 0, RegisterWrite::Reset)
    }

    /// Read a converter register
    ///
    /// The first byte clocked back echoes the address phase and is thrown
    /// away. A [`ReadWidth::FourByte`] read assembles the remaining three
    /// bytes big-endian, so only the low 24 bits can be set.
    pub fn read_register(&mut self, address: u8, width: ReadWidth) -> BusResult<u32, CS::Error> {
        let mut tx = [SPI_DUMMY_BYTE; MAX_FRAME];
        tx[0] = address;

        self.frame(&tx[..width.frame_len()], |spi| {
            // junk byte from the address phase
            let _ = spi.receive();
            match width {
                ReadWidth::OneByte => u32::from(spi.receive()),
                ReadWidth::FourByte => {
                    let hi = spi.receive();
                    let mid = spi.receive();
                    let lo = spi.receive();
                    u32::from_be_bytes([0, hi, mid, lo])
                }
            }
        })
    }

    /// Run one chip-select framed exchange
    ///
    /// Chip-select is released on every path out, timeouts included. If both
    /// the exchange and the release fail, the exchange error is returned.
    fn frame<T>(&mut self, tx: &[u8], read: impl FnOnce(&mut S) -> T) -> BusResult<T, CS::Error> {
        self.cs.set_low()?;
        self.spi.flush_fifos();

        for &byte in tx {
            self.spi.transmit(byte);
        }

        // frames never exceed MAX_FRAME bytes
        #[allow(clippy::cast_possible_truncation)]
        let res = self.wait_rx(tx.len() as u8).map(|()| read(&mut self.spi));
        let released = self.cs.set_high();

        if let Err(BusError::Timeout { expected, received }) = &res {
            dev_warn!("converter frame timed out, {}/{} bytes", received, expected);
        }

        // an exchange failure outranks a failed release
        let value = res?;
        released?;
        Ok(value)
    }

    /// Poll the RX FIFO level until `expected` bytes have arrived
    fn wait_rx(&mut self, expected: u8) -> BusResult<(), CS::Error> {
        let mut waited_us = 0;
        loop {
            let received = self.spi.rx_level();
            if received >= expected {
                return Ok(());
            }
            if waited_us >= self.config.timeout_us {
                return Err(BusError::Timeout { expected, received });
            }
            self.delay.delay_us(1);
            waited_us += 1;
        }
    }
}
