//! Enumerated settings of the scope.
//!
//! Every enum has exactly one table. The position in the table is the index the scope writes into
//! the waveform descriptor, the string is what the scope accepts and returns for commands.

use std::fmt::Display;

use benchlink::InstrumentError;

/// An enum whose variants are listed in a single index table.
pub(crate) trait IndexTable: Sized + Copy + PartialEq + 'static {
    /// Variants with their command string, in descriptor index order.
    const TABLE: &'static [(Self, &'static str)];

    /// Look up the variant for a descriptor index.
    fn from_index(idx: i64) -> Option<Self> {
        usize::try_from(idx)
            .ok()
            .and_then(|idx| Self::TABLE.get(idx))
            .map(|(variant, _)| *variant)
    }

    /// Command string of the variant.
    fn as_str(&self) -> &'static str {
        Self::TABLE
            .iter()
            .find(|(variant, _)| variant == self)
            .map_or("", |(_, s)| *s)
    }

    /// Parse a response from the scope, ignoring case and surrounding whitespace.
    fn from_cmd_str(value: &str) -> Result<Self, InstrumentError> {
        let value_trimmed = value.trim();
        Self::TABLE
            .iter()
            .find(|(_, s)| s.eq_ignore_ascii_case(value_trimmed))
            .map(|(variant, _)| *variant)
            .ok_or_else(|| InstrumentError::ResponseParseError(value.to_string()))
    }
}

/// Output width of transferred samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// One byte per sample.
    Byte,
    /// One 16 bit word per sample.
    Word,
}

impl IndexTable for SampleFormat {
    const TABLE: &'static [(Self, &'static str)] =
        &[(SampleFormat::Byte, "BYTE"), (SampleFormat::Word, "WORD")];
}

impl SampleFormat {
    /// The width that is needed to transfer samples of an ADC with the given bit depth.
    pub fn for_bit_depth(bit_depth: u8) -> Self {
        if bit_depth > 8 {
            SampleFormat::Word
        } else {
            SampleFormat::Byte
        }
    }
}

/// Order of the two bytes in a transferred word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ByteOrder {
    /// Least significant byte first.
    #[default]
    Lsb,
    /// Most significant byte first.
    Msb,
}

impl IndexTable for ByteOrder {
    const TABLE: &'static [(Self, &'static str)] =
        &[(ByteOrder::Lsb, "LSB"), (ByteOrder::Msb, "MSB")];
}

/// Vertical input coupling of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)] // names as used by the scope
pub enum Coupling {
    /// Direct coupling.
    DC,
    /// Alternating current coupling.
    AC,
    /// Input grounded.
    GND,
}

impl IndexTable for Coupling {
    const TABLE: &'static [(Self, &'static str)] = &[
        (Coupling::DC, "DC"),
        (Coupling::AC, "AC"),
        (Coupling::GND, "GND"),
    ];
}

/// Bandwidth limit of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BandwidthLimit {
    /// Full bandwidth.
    Off,
    /// Limited to 20 MHz.
    Mhz20,
    /// Limited to 200 MHz.
    Mhz200,
}

impl IndexTable for BandwidthLimit {
    const TABLE: &'static [(Self, &'static str)] = &[
        (BandwidthLimit::Off, "OFF"),
        (BandwidthLimit::Mhz20, "20M"),
        (BandwidthLimit::Mhz200, "200M"),
    ];
}

macro_rules! display_from_table {
    ($($enum:ty),*) => {
        $(
            impl Display for $enum {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    write!(f, "{}", self.as_str())
                }
            }
        )*
    };
}

display_from_table!(SampleFormat, ByteOrder, Coupling, BandwidthLimit);
