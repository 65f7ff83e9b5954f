//! Serial Console
//!
//! Interrupt-driven UART console for the host link. Foreground code queues
//! bytes into a transmit ring and the UART interrupt drains it one byte at a
//! time; received bytes go the other way through a small line discipline.

mod link;
mod ring;

use core::fmt;

use crate::config::{UART_BAUD_RATE, UART_DATA_BITS, UART_ECHO_DEFAULT};
use crate::types::DataBits;

pub use link::SerialLink;
pub use ring::{RxRing, Submit, TxRing};

/// Serial console error
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SerialError {
    /// The transmit ring is full
    NoSpace,
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSpace => write!(f, "transmit buffer full"),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for SerialError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NoSpace => defmt::write!(f, "NoSpace"),
        }
    }
}

/// Serial operation result
pub type SerialResult<T> = Result<T, SerialError>;

/// Console line settings
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Character length
    pub data_bits: DataBits,
    /// Echo received characters back to the host
    pub echo: bool,
}

impl SerialConfig {
    /// Settings with the given baud rate and character length
    #[must_use]
    pub const fn new(baud_rate: u32, data_bits: DataBits) -> Self {
        Self {
            baud_rate,
            data_bits,
            echo: UART_ECHO_DEFAULT,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self::new(UART_BAUD_RATE, UART_DATA_BITS)
    }
}
