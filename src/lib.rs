//! CN0216 Weigh-Scale Demo Firmware Library
//!
//! Peripheral driver layer for the ADuCM360-based CN0216 evaluation demo.
//! The MCU talks to the host over a UART console and samples an AD7791
//! 24-bit sigma-delta converter over SPI.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    APPLICATION LAYER                         │
//! │        Console output / commands   │   Weight sampling       │
//! ├─────────────────────────────────────────────────────────────┤
//! │                      DRIVER LAYER                            │
//! │   SerialLink (buffered UART)  │  Ad7791 over ConverterBus    │
//! ├─────────────────────────────────────────────────────────────┤
//! │                 HARDWARE ABSTRACTION TRAITS                  │
//! │   UartPort  │  SpiPort  │  InterruptLine  │  embedded-hal    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The chip-specific register access lives behind the traits in [`hal`],
//! so every driver here runs unchanged against a simulated backend on the
//! host.
//!
//! # Design Principles
//!
//! - **Owned state**: buffers live inside driver structs, never in loose globals
//! - **Bounded waits**: every hardware poll has a timeout
//! - **No unsafe in driver code**: all unsafe isolated in the NVIC binding
//! - **Explicit error handling**: all fallible operations return `Result`

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

#[macro_use]
mod log;

/// Hardware Abstraction Layer
///
/// Traits describing the UART, SPI and interrupt controller collaborators,
/// plus the framed converter bus built on top of them.
pub mod hal;

/// Serial Console
///
/// Interrupt-driven UART transmit/receive buffering.
pub mod serial;

/// Peripheral Drivers
///
/// High-level drivers for external ICs (AD7791).
pub mod drivers;

/// Shared types used across modules
pub mod types;

/// System configuration and constants
pub mod config;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::drivers::ad7791::Ad7791;
    pub use crate::hal::irq::InterruptLine;
    pub use crate::hal::spi::{BusConfig, BusError, ConverterBus, SpiPort};
    pub use crate::hal::uart::UartPort;
    pub use crate::serial::{SerialConfig, SerialError, SerialLink};

    // Common traits
    pub use embedded_hal::delay::DelayNs;
    pub use embedded_hal::digital::OutputPin;

    // Error handling
    pub use core::result::Result;
}
