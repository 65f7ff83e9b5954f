//! Interrupt Controller Lines
//!
//! A single peripheral interrupt line that can be masked around critical
//! sequences, and the Cortex-M NVIC binding for it.

/// One interrupt source at the interrupt controller
///
/// Methods take `&self` so the same line can be shared between foreground
/// code and the handler it guards.
pub trait InterruptLine {
    /// Unmask the line
    fn enable(&self);

    /// Mask the line
    fn disable(&self);

    /// Whether the line is currently unmasked
    fn is_enabled(&self) -> bool;
}

impl<L: InterruptLine + ?Sized> InterruptLine for &L {
    fn enable(&self) {
        (**self).enable();
    }

    fn disable(&self) {
        (**self).disable();
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

/// Masks a line for as long as it is alive
///
/// Dropping the guard puts the line back the way it was found, so a line
/// that was never enabled stays disabled.
#[must_use = "the line is unmasked again as soon as the guard is dropped"]
pub struct MaskGuard<'a, L: InterruptLine> {
    line: &'a L,
    was_enabled: bool,
}

impl<'a, L: InterruptLine> MaskGuard<'a, L> {
    /// Mask `line` until the guard is dropped
    pub fn new(line: &'a L) -> Self {
        let was_enabled = line.is_enabled();
        line.disable();
        Self { line, was_enabled }
    }
}

impl<L: InterruptLine> Drop for MaskGuard<'_, L> {
    fn drop(&mut self) {
        if self.was_enabled {
            self.line.enable();
        }
    }
}

/// An NVIC interrupt line
#[cfg(feature = "embedded")]
#[derive(Clone, Copy, Debug)]
pub struct NvicLine<I> {
    irq: I,
}

#[cfg(feature = "embedded")]
impl<I: cortex_m::interrupt::InterruptNumber> NvicLine<I> {
    /// Wrap an interrupt number from the device crate
    #[must_use]
    pub const fn new(irq: I) -> Self {
        Self { irq }
    }
}

#[cfg(feature = "embedded")]
#[allow(unsafe_code)]
impl<I: cortex_m::interrupt::InterruptNumber> InterruptLine for NvicLine<I> {
    fn enable(&self) {
        // SAFETY: the only handler behind this line is SerialLink::on_interrupt,
        // which takes its own critical section before touching shared state
        unsafe { cortex_m::peripheral::NVIC::unmask(self.irq) }
    }

    fn disable(&self) {
        cortex_m::peripheral::NVIC::mask(self.irq);
    }

    fn is_enabled(&self) -> bool {
        cortex_m::peripheral::NVIC::is_enabled(self.irq)
    }
}
