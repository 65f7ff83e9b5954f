//! Shared types used across the CN0216 firmware
//!
//! Small enums that select how the serial console and the converter bus
//! frame each operation.

use core::fmt;

/// How a single byte is handed to the UART
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write the transmit register immediately, bypassing the buffer
    Direct,
    /// Queue behind the byte in flight, or transmit now if idle
    Buffered,
    /// Like `Buffered`, with the UART interrupt line masked for the duration
    #[default]
    BufferedAtomic,
}

impl WriteMode {
    /// Whether this mode goes through the transmit ring
    #[must_use]
    pub const fn is_buffered(self) -> bool {
        !matches!(self, Self::Direct)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for WriteMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Direct => defmt::write!(f, "DIRECT"),
            Self::Buffered => defmt::write!(f, "BUF"),
            Self::BufferedAtomic => defmt::write!(f, "BUF-ATOMIC"),
        }
    }
}

/// UART character length
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum DataBits {
    /// 5-bit characters
    Five,
    /// 6-bit characters
    Six,
    /// 7-bit characters
    Seven,
    /// 8-bit characters
    #[default]
    Eight,
}

impl DataBits {
    /// Number of data bits per character
    #[must_use]
    pub const fn count(self) -> u8 {
        match self {
            Self::Five => 5,
            Self::Six => 6,
            Self::Seven => 7,
            Self::Eight => 8,
        }
    }

    /// Parse from a bit count
    #[must_use]
    pub const fn from_count(bits: u8) -> Option<Self> {
        match bits {
            5 => Some(Self::Five),
            6 => Some(Self::Six),
            7 => Some(Self::Seven),
            8 => Some(Self::Eight),
            _ => None,
        }
    }

    /// Mask covering the significant bits of a character
    #[must_use]
    pub const fn mask(self) -> u8 {
        0xFF >> (8 - self.count())
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for DataBits {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}", self.count());
    }
}

/// Kind of write frame sent to the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegisterWrite {
    /// Address byte followed by one data byte
    Register,
    /// Four 0xFF bytes that force the converter back to its reset state
    Reset,
}

impl RegisterWrite {
    /// Bytes shifted out for this frame
    #[must_use]
    pub const fn frame_len(self) -> usize {
        match self {
            Self::Register => 2,
            Self::Reset => 4,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for RegisterWrite {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Register => defmt::write!(f, "REG"),
            Self::Reset => defmt::write!(f, "RESET"),
        }
    }
}

/// Width of a register read from the converter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReadWidth {
    /// Address byte plus one dummy byte, one byte of data back
    OneByte,
    /// Address byte plus three dummy bytes, 24 bits of data back
    FourByte,
}

impl ReadWidth {
    /// Bytes exchanged on the bus, address included
    #[must_use]
    pub const fn frame_len(self) -> usize {
        match self {
            Self::OneByte => 2,
            Self::FourByte => 4,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for ReadWidth {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::OneByte => defmt::write!(f, "1B"),
            Self::FourByte => defmt::write!(f, "4B"),
        }
    }
}
