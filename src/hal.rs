//! Hardware Abstraction Layer
//!
//! The drivers in this crate only sequence calls into the peripherals. The
//! register pokes themselves sit behind the traits defined here, which a
//! board crate implements for the ADuCM360 and the tests implement with
//! simulated hardware.

pub mod irq;
pub mod spi;
pub mod uart;
