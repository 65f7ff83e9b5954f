//! Simulated hardware shared by the integration tests
//!
//! Every simulated peripheral is a cheap handle around shared state, so a
//! test can move one clone into a driver and keep another to drive and
//! inspect the "hardware".

#![allow(dead_code)]

use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, MutexGuard};

use cn0216_firmware::hal::irq::InterruptLine;
use cn0216_firmware::hal::spi::{SpiOptions, SpiPort};
use cn0216_firmware::hal::uart::{ModemControl, UartEvent, UartInterrupts, UartPort};
use cn0216_firmware::types::DataBits;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, OutputPin};

// =============================================================================
// Interrupt line
// =============================================================================

#[derive(Debug, Default)]
pub struct LineState {
    pub enabled: bool,
    /// Every enable (true) / disable (false) call, in order
    pub history: Vec<bool>,
}

#[derive(Clone, Debug, Default)]
pub struct SimLine(Arc<Mutex<LineState>>);

impl SimLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MutexGuard<'_, LineState> {
        self.0.lock().unwrap()
    }
}

impl InterruptLine for SimLine {
    fn enable(&self) {
        let mut st = self.state();
        st.enabled = true;
        st.history.push(true);
    }

    fn disable(&self) {
        let mut st = self.state();
        st.enabled = false;
        st.history.push(false);
    }

    fn is_enabled(&self) -> bool {
        self.state().enabled
    }
}

// =============================================================================
// UART
// =============================================================================

#[derive(Debug, Default)]
pub struct UartWire {
    /// Bytes that finished shifting out, in order
    pub sent: Vec<u8>,
    /// Byte currently shifting out
    pub in_flight: Option<u8>,
    /// Transmit-empty interrupt waiting to be acknowledged
    pub tx_empty: bool,
    /// Bytes waiting to be received
    pub incoming: VecDeque<u8>,
    /// Transmit register written while a byte was still in flight
    pub collisions: usize,
    pub pins_routed: bool,
    pub config: Option<(u32, DataBits)>,
    pub modem: Option<ModemControl>,
    pub sources: Option<UartInterrupts>,
    /// Interrupt line state seen by each transmit, when watching a line
    pub line_at_transmit: Vec<bool>,
    watch: Option<SimLine>,
}

#[derive(Clone, Debug, Default)]
pub struct SimUart(Arc<Mutex<UartWire>>);

impl SimUart {
    pub fn new() -> Self {
        Self::default()
    }

    /// A UART that records the line state every time it transmits
    pub fn watching(line: &SimLine) -> Self {
        let uart = Self::default();
        uart.wire().watch = Some(line.clone());
        uart
    }

    pub fn wire(&self) -> MutexGuard<'_, UartWire> {
        self.0.lock().unwrap()
    }

    /// Finish shifting out the byte in flight, raising transmit-empty
    pub fn tick(&self) -> bool {
        let mut w = self.wire();
        match w.in_flight.take() {
            Some(byte) => {
                w.sent.push(byte);
                w.tx_empty = true;
                true
            }
            None => false,
        }
    }

    pub fn sent(&self) -> Vec<u8> {
        self.wire().sent.clone()
    }

    pub fn in_flight(&self) -> Option<u8> {
        self.wire().in_flight
    }

    /// Everything transmitted so far, including the byte in flight
    pub fn transmitted(&self) -> Vec<u8> {
        let w = self.wire();
        let mut all = w.sent.clone();
        all.extend(w.in_flight);
        all
    }

    pub fn inject(&self, bytes: &[u8]) {
        self.wire().incoming.extend(bytes.iter().copied());
    }
}

impl UartPort for SimUart {
    fn route_pins(&mut self) {
        self.wire().pins_routed = true;
    }

    fn configure(&mut self, baud_rate: u32, data_bits: DataBits) {
        self.wire().config = Some((baud_rate, data_bits));
    }

    fn set_modem_control(&mut self, control: ModemControl) {
        self.wire().modem = Some(control);
    }

    fn enable_interrupts(&mut self, sources: UartInterrupts) {
        self.wire().sources = Some(sources);
    }

    fn transmit(&mut self, byte: u8) {
        let mut w = self.wire();
        if let Some(line) = w.watch.clone() {
            let enabled = line.is_enabled();
            w.line_at_transmit.push(enabled);
        }
        if let Some(previous) = w.in_flight.replace(byte) {
            w.collisions += 1;
            w.sent.push(previous);
        }
    }

    fn receive(&mut self) -> u8 {
        self.wire().incoming.pop_front().unwrap_or(0)
    }

    fn pending(&mut self) -> Option<UartEvent> {
        let mut w = self.wire();
        if !w.incoming.is_empty() {
            Some(UartEvent::RxReady)
        } else if w.tx_empty {
            w.tx_empty = false;
            Some(UartEvent::TxEmpty)
        } else {
            None
        }
    }
}

// =============================================================================
// SPI bus, chip select and delay
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusEvent {
    CsLow,
    CsHigh,
    Flush,
    Tx(u8),
    Rx(u8),
}

#[derive(Debug, Default)]
pub struct BusWire {
    pub events: Vec<BusEvent>,
    /// Bytes the device clocks back, one per byte sent
    pub responses: VecDeque<u8>,
    pub rx_fifo: VecDeque<u8>,
    /// Stop answering after this many bytes
    pub answer_limit: Option<usize>,
    pub answered: usize,
    pub pullups_disabled: bool,
    pub pins_routed: bool,
    pub divider: Option<u8>,
    pub options: Option<SpiOptions>,
    pub cs_high: bool,
    pub delay_ns: u64,
}

#[derive(Clone, Debug, Default)]
pub struct SimBus(Arc<Mutex<BusWire>>);

impl SimBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A device that answers with `responses`, then zeros
    pub fn answering(responses: &[u8]) -> Self {
        let bus = Self::default();
        bus.respond(responses);
        bus
    }

    /// A device that never clocks anything back
    pub fn silent() -> Self {
        let bus = Self::default();
        bus.wire().answer_limit = Some(0);
        bus
    }

    pub fn wire(&self) -> MutexGuard<'_, BusWire> {
        self.0.lock().unwrap()
    }

    pub fn respond(&self, responses: &[u8]) {
        self.wire().responses.extend(responses.iter().copied());
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.wire().events.clone()
    }

    /// Bytes shifted out, in order
    pub fn sent(&self) -> Vec<u8> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                BusEvent::Tx(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// Bytes shifted out, split into chip-select frames
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<u8>> = None;
        for event in self.events() {
            match event {
                BusEvent::CsLow => current = Some(Vec::new()),
                BusEvent::CsHigh => frames.extend(current.take()),
                BusEvent::Tx(b) => {
                    if let Some(frame) = current.as_mut() {
                        frame.push(b);
                    }
                }
                _ => {}
            }
        }
        frames
    }

    pub fn cs_is_high(&self) -> bool {
        self.wire().cs_high
    }

    pub fn spi(&self) -> SimSpi {
        SimSpi(self.clone())
    }

    pub fn cs(&self) -> SimCs {
        SimCs(self.clone())
    }

    pub fn delay(&self) -> SimDelay {
        SimDelay(self.clone())
    }
}

#[derive(Clone, Debug)]
pub struct SimSpi(SimBus);

impl SpiPort for SimSpi {
    fn disable_pullups(&mut self) {
        self.0.wire().pullups_disabled = true;
    }

    fn route_pins(&mut self) {
        self.0.wire().pins_routed = true;
    }

    fn set_clock_divider(&mut self, divider: u8) {
        self.0.wire().divider = Some(divider);
    }

    fn enable(&mut self, options: SpiOptions) {
        self.0.wire().options = Some(options);
    }

    fn flush_fifos(&mut self) {
        let mut w = self.0.wire();
        w.rx_fifo.clear();
        w.events.push(BusEvent::Flush);
    }

    fn transmit(&mut self, byte: u8) {
        let mut w = self.0.wire();
        w.events.push(BusEvent::Tx(byte));
        if w.answer_limit.map_or(true, |limit| w.answered < limit) {
            let reply = w.responses.pop_front().unwrap_or(0);
            w.rx_fifo.push_back(reply);
            w.answered += 1;
        }
    }

    fn receive(&mut self) -> u8 {
        let mut w = self.0.wire();
        let byte = w.rx_fifo.pop_front().unwrap_or(0);
        w.events.push(BusEvent::Rx(byte));
        byte
    }

    fn rx_level(&mut self) -> u8 {
        u8::try_from(self.0.wire().rx_fifo.len()).unwrap_or(u8::MAX)
    }
}

#[derive(Clone, Debug)]
pub struct SimCs(SimBus);

impl ErrorType for SimCs {
    type Error = Infallible;
}

impl OutputPin for SimCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut w = self.0.wire();
        w.cs_high = false;
        w.events.push(BusEvent::CsLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        let mut w = self.0.wire();
        w.cs_high = true;
        w.events.push(BusEvent::CsHigh);
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct SimDelay(SimBus);

impl SimDelay {
    pub fn elapsed_ns(&self) -> u64 {
        self.0.wire().delay_ns
    }
}

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.0.wire().delay_ns += u64::from(ns);
    }
}

/// A chip-select pin whose driver has failed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PinFault;

impl digital::Error for PinFault {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct BrokenCs;

impl ErrorType for BrokenCs {
    type Error = PinFault;
}

impl OutputPin for BrokenCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}

/// A chip-select pin that asserts fine but fails to release
#[derive(Clone, Debug)]
pub struct StuckCs(SimBus);

impl SimBus {
    pub fn stuck_cs(&self) -> StuckCs {
        StuckCs(self.clone())
    }
}

impl ErrorType for StuckCs {
    type Error = PinFault;
}

impl OutputPin for StuckCs {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        let mut w = self.0.wire();
        w.cs_high = false;
        w.events.push(BusEvent::CsLow);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        Err(PinFault)
    }
}
