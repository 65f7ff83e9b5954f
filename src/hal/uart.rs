//! UART Peripheral Abstraction
//!
//! The raw register operations the serial console needs from the UART.
//! Nothing here buffers; see [`crate::serial`] for that.

use crate::types::DataBits;

/// Interrupt cause reported by the UART
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UartEvent {
    /// A received character is waiting in the receive register
    RxReady,
    /// The transmit register has emptied
    TxEmpty,
}

#[cfg(feature = "embedded")]
impl defmt::Format for UartEvent {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::RxReady => defmt::write!(f, "RX"),
            Self::TxEmpty => defmt::write!(f, "TX-EMPTY"),
        }
    }
}

/// Modem control outputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ModemControl {
    /// Data terminal ready
    pub dtr: bool,
    /// Request to send
    pub rts: bool,
}

impl ModemControl {
    /// DTR asserted, RTS released
    pub const DTR: Self = Self {
        dtr: true,
        rts: false,
    };
}

/// UART interrupt sources
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct UartInterrupts {
    /// Receive buffer full
    pub rx_ready: bool,
    /// Transmit buffer empty
    pub tx_empty: bool,
}

impl UartInterrupts {
    /// Both receive and transmit sources
    pub const RX_TX: Self = Self {
        rx_ready: true,
        tx_empty: true,
    };
}

/// Register-level access to one UART
pub trait UartPort {
    /// Hand the RX/TX pins to the UART function
    fn route_pins(&mut self);

    /// Program baud rate and frame format (no parity, one stop bit)
    fn configure(&mut self, baud_rate: u32, data_bits: DataBits);

    /// Drive the modem control outputs
    fn set_modem_control(&mut self, control: ModemControl);

    /// Select which conditions raise the UART interrupt
    fn enable_interrupts(&mut self, sources: UartInterrupts);

    /// Write the transmit register
    fn transmit(&mut self, byte: u8);

    /// Read the receive register
    fn receive(&mut self) -> u8;

    /// Highest-priority pending interrupt cause, if any
    ///
    /// Reading the cause acknowledges a [`UartEvent::TxEmpty`].
    fn pending(&mut self) -> Option<UartEvent>;
}
