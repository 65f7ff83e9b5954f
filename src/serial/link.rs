//! UART console link
//!
//! [`SerialLink`] is shared between foreground code and the UART interrupt
//! handler. Everything the two sides touch (both rings, the console flags
//! and the UART itself) sits behind one critical-section mutex.

use core::cell::RefCell;
use core::fmt;

use critical_section::Mutex;
use heapless::{Deque, Vec};

use super::ring::{RxRing, Submit, TxRing};
use super::{SerialConfig, SerialResult};
use crate::config::{
    ASCII_BS, ASCII_CR, ASCII_ETX, ASCII_LF, UART_DATA_BITS, UART_ECHO_DEFAULT,
    UART_RX_BUFFER_SIZE, UART_TX_BUFFER_SIZE,
};
use crate::hal::irq::{InterruptLine, MaskGuard};
use crate::hal::uart::{ModemControl, UartEvent, UartInterrupts, UartPort};
use crate::types::WriteMode;

/// State owned jointly by the foreground and the interrupt handler
struct LinkState<U, const TX: usize, const RX: usize> {
    uart: U,
    tx: TxRing<TX>,
    rx: RxRing<RX>,
    /// Lengths of completed lines waiting at the front of `rx`, oldest first
    lines: Deque<usize, RX>,
    /// Bytes of `rx` covered by `lines`
    completed: usize,
    /// Significant bits of a received character
    char_mask: u8,
    echo: bool,
    after_cr: bool,
    interrupt_requested: bool,
}

impl<U: UartPort, const TX: usize, const RX: usize> LinkState<U, TX, RX> {
    fn enqueue(&mut self, byte: u8) -> SerialResult<()> {
        if let Submit::TransmitNow(byte) = self.tx.submit(byte)? {
            self.uart.transmit(byte);
        }
        Ok(())
    }

    fn on_tx_empty(&mut self) {
        if let Some(byte) = self.tx.complete() {
            self.uart.transmit(byte);
        }
    }

    fn on_rx(&mut self, byte: u8) {
        let byte = byte & self.char_mask;
        let after_cr = core::mem::replace(&mut self.after_cr, byte == ASCII_CR);

        match byte {
            // second half of a CR LF pair
            ASCII_LF if after_cr => {}
            ASCII_CR | ASCII_LF => self.end_line(),
            ASCII_ETX => self.interrupt_requested = true,
            ASCII_BS => {
                // completed lines are not editable
                if self.rx.len() > self.completed && self.rx.pop_back().is_some() && self.echo {
                    // echo is best-effort
                    let _ = self.enqueue(ASCII_BS);
                }
            }
            _ => {
                if self.rx.push(byte) {
                    if self.echo {
                        let _ = self.enqueue(byte);
                    }
                } else {
                    dev_warn!("console rx overrun, dropped {=u8:#x}", byte);
                }
            }
        }
    }

    fn end_line(&mut self) {
        let len = self.rx.len() - self.completed;
        if self.lines.push_back(len).is_err() {
            dev_warn!("console line queue full, {} bytes left open", len);
            return;
        }
        self.completed += len;

        if self.echo {
            let _ = self.enqueue(ASCII_CR);
            let _ = self.enqueue(ASCII_LF);
        }
    }

    fn take_line(&mut self) -> Option<Vec<u8, RX>> {
        let len = self.lines.pop_front()?;
        self.completed -= len;

        let mut line = Vec::new();
        for _ in 0..len {
            if let Some(byte) = self.rx.pop() {
                let _ = line.push(byte);
            }
        }
        Some(line)
    }

    fn take_byte(&mut self) -> Option<u8> {
        let byte = self.rx.pop()?;
        // a raw read consumes line boundaries as it passes them
        while self.lines.front() == Some(&0) {
            self.lines.pop_front();
        }
        if let Some(front) = self.lines.front_mut() {
            *front -= 1;
            self.completed -= 1;
            if *front == 0 {
                self.lines.pop_front();
            }
        }
        Some(byte)
    }
}

/// Interrupt-driven UART console
///
/// Holds a transmit ring of `TX` bytes and a receive ring of `RX` bytes.
/// All methods take `&self`, so the link can live in a `static` and be used
/// from both `main` and the UART interrupt handler, which must call
/// [`SerialLink::on_interrupt`].
pub struct SerialLink<
    U,
    L,
    const TX: usize = UART_TX_BUFFER_SIZE,
    const RX: usize = UART_RX_BUFFER_SIZE,
> {
    irq: L,
    state: Mutex<RefCell<LinkState<U, TX, RX>>>,
}

impl<U, L, const TX: usize, const RX: usize> SerialLink<U, L, TX, RX> {
    /// Create an idle link with empty rings
    pub const fn new(uart: U, irq: L) -> Self {
        Self {
            irq,
            state: Mutex::new(RefCell::new(LinkState {
                uart,
                tx: TxRing::new(),
                rx: RxRing::new(),
                lines: Deque::new(),
                completed: 0,
                char_mask: UART_DATA_BITS.mask(),
                echo: UART_ECHO_DEFAULT,
                after_cr: false,
                interrupt_requested: false,
            })),
        }
    }
}

impl<U, L, const TX: usize, const RX: usize> SerialLink<U, L, TX, RX>
where
    U: UartPort,
    L: InterruptLine,
{
    fn with_state<R>(&self, f: impl FnOnce(&mut LinkState<U, TX, RX>) -> R) -> R {
        critical_section::with(|cs| f(&mut self.state.borrow_ref_mut(cs)))
    }

    /// Configure the UART and unmask its interrupt
    ///
    /// Call once, before any other method.
    pub fn init(&self, config: &SerialConfig) {
        self.with_state(|st| {
            st.uart.route_pins();
            st.uart.configure(config.baud_rate, config.data_bits);
            st.uart.set_modem_control(ModemControl::DTR);
            st.uart.enable_interrupts(UartInterrupts::RX_TX);
            st.char_mask = config.data_bits.mask();
            st.echo = config.echo;
        });
        self.irq.enable();

        dev_info!(
            "console up at {} baud, {} data bits",
            config.baud_rate,
            config.data_bits
        );
    }

    /// Write one byte
    ///
    /// [`WriteMode::Direct`] always succeeds. The buffered modes fail with
    /// [`SerialError::NoSpace`](super::SerialError::NoSpace) when the
    /// transmit ring is full, and leave the ring untouched in that case.
    pub fn write_byte(&self, byte: u8, mode: WriteMode) -> SerialResult<()> {
        if !mode.is_buffered() {
            self.with_state(|st| st.uart.transmit(byte));
            return Ok(());
        }

        let _masked = (mode == WriteMode::BufferedAtomic).then(|| MaskGuard::new(&self.irq));
        self.with_state(|st| st.enqueue(byte))
    }

    /// Write bytes in order, stopping at the first failure
    ///
    /// Nothing after the failing byte is queued.
    pub fn write_bytes(&self, bytes: &[u8]) -> SerialResult<()> {
        bytes
            .iter()
            .try_for_each(|&byte| self.write_byte(byte, WriteMode::BufferedAtomic))
    }

    /// Write a string, stopping at the first failure
    pub fn write_str(&self, text: &str) -> SerialResult<()> {
        self.write_bytes(text.as_bytes())
    }

    /// Read the UART receive register directly
    ///
    /// Does not check that a byte is actually waiting.
    pub fn read_byte(&self) -> u8 {
        self.with_state(|st| st.uart.receive())
    }

    /// UART interrupt handler body
    ///
    /// Services every pending cause: a transmit-empty moves the next queued
    /// byte into the UART (or marks the link idle), a received byte goes
    /// through the console line discipline.
    pub fn on_interrupt(&self) {
        self.with_state(|st| {
            while let Some(event) = st.uart.pending() {
                dev_trace!("uart event {}", event);
                match event {
                    UartEvent::TxEmpty => st.on_tx_empty(),
                    UartEvent::RxReady => {
                        let byte = st.uart.receive();
                        st.on_rx(byte);
                    }
                }
            }
        });
    }

    /// Turn echo of received characters on or off
    pub fn set_echo(&self, echo: bool) {
        self.with_state(|st| st.echo = echo);
    }

    /// Take the oldest completed line
    ///
    /// A line ends at CR, LF or CR LF. The terminator is not part of the
    /// line, and bytes received after it stay queued for the next line.
    pub fn take_command(&self) -> Option<Vec<u8, RX>> {
        self.with_state(|st| {
            let line = st.take_line()?;
            dev_debug!("console command, {} bytes", line.len());
            Some(line)
        })
    }

    /// True once per Ctrl-C received
    pub fn take_interrupt_request(&self) -> bool {
        self.with_state(|st| core::mem::take(&mut st.interrupt_requested))
    }

    /// Take the oldest received byte
    pub fn read_buffered(&self) -> Option<u8> {
        self.with_state(LinkState::take_byte)
    }

    /// Bytes waiting in the transmit ring, not counting the one in flight
    pub fn tx_pending(&self) -> usize {
        self.with_state(|st| st.tx.len())
    }

    /// True while a byte is shifting out of the UART
    pub fn is_transmitting(&self) -> bool {
        self.with_state(|st| st.tx.is_busy())
    }

    /// Bytes waiting in the receive ring
    pub fn rx_pending(&self) -> usize {
        self.with_state(|st| st.rx.len())
    }

    /// Received bytes dropped because the receive ring was full
    pub fn rx_overruns(&self) -> u32 {
        self.with_state(|st| st.rx.overruns())
    }
}

impl<U, L, const TX: usize, const RX: usize> fmt::Write for &SerialLink<U, L, TX, RX>
where
    U: UartPort,
    L: InterruptLine,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        SerialLink::write_str(*self, s).map_err(|_| fmt::Error)
    }
}
