//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the CN0216 demo hardware.
//! Pin mappings, bus speeds, buffer sizes and framing bytes are centralized here.

use crate::types::DataBits;

/// Host console baud rate
pub const UART_BAUD_RATE: u32 = 9_600;

/// Host console character length
pub const UART_DATA_BITS: DataBits = DataBits::Eight;

/// Transmit ring capacity in bytes
pub const UART_TX_BUFFER_SIZE: usize = 1024;

/// Receive ring capacity in bytes
pub const UART_RX_BUFFER_SIZE: usize = 16;

/// SPI1 clock divider in master mode
pub const SPI_CLOCK_DIVIDER: u8 = 9;

/// Byte shifted out to clock in a register value
pub const SPI_DUMMY_BYTE: u8 = 0xAA;

/// Byte repeated to reset the converter's serial interface
pub const SPI_RESET_BYTE: u8 = 0xFF;

/// Number of reset bytes in a reset frame
pub const SPI_RESET_LEN: usize = 4;

/// Longest wait for the receive FIFO to fill, in microseconds
pub const SPI_TIMEOUT_US: u32 = 10_000;

/// Carriage return, completes a console command
pub const ASCII_CR: u8 = b'\r';

/// Line feed, completes a console command on its own or after a CR
pub const ASCII_LF: u8 = b'\n';

/// Backspace, erases the last received character
pub const ASCII_BS: u8 = 0x08;

/// Ctrl-C, requests the running operation to stop
pub const ASCII_ETX: u8 = 0x03;

/// Whether received characters are echoed by default
pub const UART_ECHO_DEFAULT: bool = true;

/// AD7791 reference voltage in millivolts
pub const AD7791_VREF_MV: u32 = 5_000;

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the CN0216 schematic

    /// SPI1 MISO
    pub const SPI1_MISO: &str = "P0.0";

    /// SPI1 SCLK
    pub const SPI1_SCLK: &str = "P0.1";

    /// SPI1 MOSI
    pub const SPI1_MOSI: &str = "P0.2";

    /// AD7791 chip select (active low)
    pub const AD7791_CS: &str = "P0.3";

    /// UART RXD
    pub const UART_RX: &str = "P0.6";

    /// UART TXD
    pub const UART_TX: &str = "P0.7";
}
