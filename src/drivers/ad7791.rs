//! AD7791 Sigma-Delta Converter Driver
//!
//! The AD7791 is a 24-bit, single-channel sigma-delta ADC. On the CN0216
//! board it digitizes the load-cell bridge output.
//!
//! Every access starts with a write to the communications register, which
//! selects the target register and the direction. The bytes that follow are
//! the register contents, so one [`ConverterBus`] frame covers a whole access.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::hal::spi::{BusResult, ConverterBus, SpiPort};
use crate::types::{ReadWidth, RegisterWrite};

/// Communications register fields
mod comm {
    pub const RS_SHIFT: u8 = 4;
    pub const READ: u8 = 1 << 3;
    pub const CH_MASK: u8 = 0b11;
}

/// On-chip register, as selected by the RS bits
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// Status on read, communications on write
    Status,
    /// Mode register
    Mode,
    /// Filter register
    Filter,
    /// 24-bit conversion result
    Data,
}

impl Register {
    const fn select(self) -> u8 {
        match self {
            Self::Status => 0,
            Self::Mode => 1,
            Self::Filter => 2,
            Self::Data => 3,
        }
    }
}

/// Analog input selection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Channel {
    /// AIN(+) to AIN(-)
    #[default]
    Differential,
    /// AIN(-) to AIN(-), for offset checks
    Short,
    /// Supply monitor
    VddMonitor,
}

impl Channel {
    const fn bits(self) -> u8 {
        match self {
            Self::Differential => 0b00,
            Self::Short => 0b10,
            Self::VddMonitor => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Option<Self> {
        match bits & comm::CH_MASK {
            0b00 => Some(Self::Differential),
            0b10 => Some(Self::Short),
            0b11 => Some(Self::VddMonitor),
            _ => None,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Channel {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Differential => defmt::write!(f, "AIN"),
            Self::Short => defmt::write!(f, "SHORT"),
            Self::VddMonitor => defmt::write!(f, "VDD"),
        }
    }
}

/// Build the communications byte for an access
#[must_use]
pub const fn comm_byte(register: Register, read: bool, channel: Channel) -> u8 {
    let rw = if read { comm::READ } else { 0 };
    (register.select() << comm::RS_SHIFT) | rw | channel.bits()
}

/// Status register contents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Status(u8);

impl Status {
    /// Wrap a raw status byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw status byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// A new conversion result is waiting (RDY is active low)
    #[must_use]
    pub const fn is_ready(self) -> bool {
        self.0 & 0x80 == 0
    }

    /// The last result was clamped or the reference is missing
    #[must_use]
    pub const fn has_error(self) -> bool {
        self.0 & 0x40 != 0
    }

    /// Channel the last result belongs to
    #[must_use]
    pub const fn channel(self) -> Option<Channel> {
        Channel::from_bits(self.0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Status {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Status({=u8:#x})", self.0);
    }
}

/// Conversion mode (MD bits)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Conversion {
    /// Convert back to back
    #[default]
    Continuous,
    /// One conversion, then power down
    Single,
    /// Powered down
    PowerDown,
}

impl Conversion {
    const fn bits(self) -> u8 {
        match self {
            Self::Continuous => 0b00,
            Self::Single => 0b10,
            Self::PowerDown => 0b11,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b10 => Self::Single,
            0b11 => Self::PowerDown,
            _ => Self::Continuous,
        }
    }
}

/// Input coding of the conversion result
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Polarity {
    /// Offset binary, zero volts at mid-scale
    #[default]
    Bipolar,
    /// Straight binary, zero volts at code zero
    Unipolar,
}

/// Mode register contents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Mode {
    /// Conversion mode
    pub conversion: Conversion,
    /// Burnout current sources on
    pub burnout: bool,
    /// Result coding
    pub polarity: Polarity,
    /// Input buffer on
    pub buffered: bool,
}

impl Mode {
    /// Encode as a register byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        let mut bits = self.conversion.bits() << 6;
        if self.burnout {
            bits |= 1 << 3;
        }
        if matches!(self.polarity, Polarity::Unipolar) {
            bits |= 1 << 2;
        }
        if self.buffered {
            bits |= 1 << 1;
        }
        bits
    }

    /// Decode a register byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            conversion: Conversion::from_bits(bits >> 6),
            burnout: bits & (1 << 3) != 0,
            polarity: if bits & (1 << 2) != 0 {
                Polarity::Unipolar
            } else {
                Polarity::Bipolar
            },
            buffered: bits & (1 << 1) != 0,
        }
    }
}

/// Output update rate (FS bits)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UpdateRate {
    /// 120 Hz
    Hz120,
    /// 100 Hz
    Hz100,
    /// 33.3 Hz
    Hz33,
    /// 20 Hz, 80 dB rejection of 60 Hz
    Hz20,
    /// 16.6 Hz, simultaneous 50/60 Hz rejection
    #[default]
    Hz16_6,
    /// 16.7 Hz, 80 dB rejection of 50 Hz
    Hz16_7,
    /// 13.3 Hz
    Hz13,
    /// 9.5 Hz
    Hz9_5,
}

impl UpdateRate {
    const fn bits(self) -> u8 {
        match self {
            Self::Hz120 => 0,
            Self::Hz100 => 1,
            Self::Hz33 => 2,
            Self::Hz20 => 3,
            Self::Hz16_6 => 4,
            Self::Hz16_7 => 5,
            Self::Hz13 => 6,
            Self::Hz9_5 => 7,
        }
    }

    const fn from_bits(bits: u8) -> Self {
        match bits & 0b111 {
            0 => Self::Hz120,
            1 => Self::Hz100,
            2 => Self::Hz33,
            3 => Self::Hz20,
            4 => Self::Hz16_6,
            5 => Self::Hz16_7,
            6 => Self::Hz13,
            _ => Self::Hz9_5,
        }
    }
}

/// Filter register contents
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Filter {
    /// Master clock divider, 0 to 3 (divide by 1, 2, 4, 8)
    pub clock_divider: u8,
    /// Output update rate
    pub rate: UpdateRate,
}

impl Filter {
    /// Encode as a register byte
    #[must_use]
    pub const fn bits(self) -> u8 {
        ((self.clock_divider & 0b11) << 4) | self.rate.bits()
    }

    /// Decode a register byte
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        Self {
            clock_divider: (bits >> 4) & 0b11,
            rate: UpdateRate::from_bits(bits),
        }
    }
}

/// One 24-bit conversion result
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sample {
    code: u32,
}

impl Sample {
    /// Full-scale code + 1
    pub const FULL_SCALE: u32 = 1 << 24;

    /// Wrap a raw code, keeping the low 24 bits
    #[must_use]
    pub const fn from_code(code: u32) -> Self {
        Self {
            code: code & (Self::FULL_SCALE - 1),
        }
    }

    /// Raw 24-bit code
    #[must_use]
    pub const fn code(self) -> u32 {
        self.code
    }

    /// Signed offset from the zero-volt code
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn offset(self, polarity: Polarity) -> i32 {
        match polarity {
            Polarity::Unipolar => self.code as i32,
            Polarity::Bipolar => self.code as i32 - (1 << 23),
        }
    }

    /// Input voltage in millivolts for the given reference
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn millivolts(self, vref_mv: u32, polarity: Polarity) -> f32 {
        let span = match polarity {
            Polarity::Unipolar => Self::FULL_SCALE,
            Polarity::Bipolar => Self::FULL_SCALE / 2,
        };
        self.offset(polarity) as f32 * vref_mv as f32 / span as f32
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Sample {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Sample({=u32:#x})", self.code);
    }
}

/// AD7791 driver
pub struct Ad7791<S, CS, D> {
    bus: ConverterBus<S, CS, D>,
    channel: Channel,
}

impl<S, CS, D> Ad7791<S, CS, D>
where
    S: SpiPort,
    CS: OutputPin,
    D: DelayNs,
{
    /// Create a driver on the differential input
    pub fn new(bus: ConverterBus<S, CS, D>) -> Self {
        Self::with_channel(bus, Channel::default())
    }

    /// Create a driver on a specific input
    pub fn with_channel(bus: ConverterBus<S, CS, D>, channel: Channel) -> Self {
        Self { bus, channel }
    }

    /// Release the underlying bus
    pub fn release(self) -> ConverterBus<S, CS, D> {
        self.bus
    }

    /// Selected input
    #[must_use]
    pub const fn channel(&self) -> Channel {
        self.channel
    }

    /// Select the input used by subsequent accesses
    pub fn set_channel(&mut self, channel: Channel) {
        self.channel = channel;
    }

    /// Bring up the bus and reset the converter
    pub fn init(&mut self) -> BusResult<(), CS::Error> {
        self.bus.init()?;
        self.reset()
    }

    /// Reset the serial interface and all registers to power-on defaults
    pub fn reset(&mut self) -> BusResult<(), CS::Error> {
        dev_debug!("ad7791 reset");
        self.bus.reset_device()
    }

    /// Read the status register
    pub fn status(&mut self) -> BusResult<Status, CS::Error> {
        let bits = self.read_u8(Register::Status)?;
        Ok(Status::from_bits(bits))
    }

    /// Write the mode register
    pub fn set_mode(&mut self, mode: Mode) -> BusResult<(), CS::Error> {
        self.write_u8(Register::Mode, mode.bits())
    }

    /// Read the mode register
    pub fn mode(&mut self) -> BusResult<Mode, CS::Error> {
        Ok(Mode::from_bits(self.read_u8(Register::Mode)?))
    }

    /// Write the filter register
    pub fn set_filter(&mut self, filter: Filter) -> BusResult<(), CS::Error> {
        self.write_u8(Register::Filter, filter.bits())
    }

    /// Read the filter register
    pub fn filter(&mut self) -> BusResult<Filter, CS::Error> {
        Ok(Filter::from_bits(self.read_u8(Register::Filter)?))
    }

    /// Read the data register
    pub fn read_data(&mut self) -> BusResult<Sample, CS::Error> {
        let comm = comm_byte(Register::Data, true, self.channel);
        let code = self.bus.read_register(comm, ReadWidth::FourByte)?;
        Ok(Sample::from_code(code))
    }

    /// Poll status up to `max_polls` times and read the result once ready
    ///
    /// Returns `None` if no conversion finished in time.
    pub fn read_when_ready(&mut self, max_polls: u32) -> BusResult<Option<Sample>, CS::Error> {
        for _ in 0..max_polls {
            let status = self.status()?;
            if status.is_ready() {
                if status.has_error() {
                    dev_warn!("ad7791 result flagged: {}", status);
                }
                return self.read_data().map(Some);
            }
        }
        Ok(None)
    }

    fn read_u8(&mut self, register: Register) -> BusResult<u8, CS::Error> {
        let comm = comm_byte(register, true, self.channel);
        let value = self.bus.read_register(comm, ReadWidth::OneByte)?;
        // one-byte reads never set more than the low byte
        #[allow(clippy::cast_possible_truncation)]
        let byte = value as u8;
        Ok(byte)
    }

    fn write_u8(&mut self, register: Register, value: u8) -> BusResult<(), CS::Error> {
        let comm = comm_byte(register, false, self.channel);
        self.bus.write_register(comm, value, RegisterWrite::Register)
    }
}
