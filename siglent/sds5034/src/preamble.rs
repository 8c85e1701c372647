//! Decoding of the binary waveform descriptor, i.e., the preamble of a waveform transfer.
//!
//! The scope answers `WAV:PREamble?` with a block of 346 bytes. All fields sit at fixed offsets
//! and are little-endian. The layout is declared once in [`layout`], every field being a typed
//! [`Field`] with its name and offset. The minimum block length follows from the declared fields.

use std::marker::PhantomData;

use log::{debug, warn};

use crate::{
    BandwidthLimit, ByteOrder, Coupling, DecodeError, SampleFormat, settings::IndexTable,
};

/// Time per division in seconds, indexed by the timebase field of the descriptor.
pub const TIMEBASE_TABLE: [f64; 39] = [
    200e-12, 500e-12, 1e-9, 2e-9, 5e-9, 10e-9, 20e-9, 50e-9, 100e-9, 200e-9, 500e-9, 1e-6, 2e-6,
    5e-6, 10e-6, 20e-6, 50e-6, 100e-6, 200e-6, 500e-6, 1e-3, 2e-3, 5e-3, 10e-3, 20e-3, 50e-3,
    100e-3, 200e-3, 500e-3, 1.0, 2.0, 5.0, 10.0, 20.0, 50.0, 100.0, 200.0, 500.0, 1000.0,
];

/// Codes per division above this value are reported 16 times too large by some models.
const CODES_PER_DIV_QUIRK_LIMIT: f64 = 256.0;

/// A value that can be read from the descriptor at a fixed offset.
pub trait Decode: Sized {
    /// Number of bytes the value occupies.
    const LEN: usize;

    /// Decode the value from exactly [`Self::LEN`] bytes.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! decode_le {
    ($($ty:ty),*) => {
        $(
            impl Decode for $ty {
                const LEN: usize = std::mem::size_of::<$ty>();

                fn decode(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(bytes);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

decode_le!(i16, i32, f32, f64);

/// A NUL padded text field of 16 bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text16(pub String);

impl Decode for Text16 {
    const LEN: usize = 16;

    fn decode(bytes: &[u8]) -> Self {
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Text16(String::from_utf8_lossy(&bytes[..end]).trim_end().to_string())
    }
}

/// One field of the descriptor, i.e., its name, its offset, and how it is decoded.
#[derive(Debug)]
pub struct Field<T: Decode> {
    /// Name of the field, used in error messages.
    pub name: &'static str,
    /// Byte offset of the field from the start of the payload.
    pub offset: usize,
    kind: PhantomData<fn() -> T>,
}

impl<T: Decode> Clone for Field<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: Decode> Copy for Field<T> {}

impl<T: Decode> Field<T> {
    /// Declare a new field.
    pub const fn new(name: &'static str, offset: usize) -> Self {
        Field {
            name,
            offset,
            kind: PhantomData,
        }
    }

    /// First byte after the field.
    pub const fn end(&self) -> usize {
        self.offset + T::LEN
    }

    /// Read the field from the block.
    pub fn read(&self, block: &[u8]) -> Result<T, DecodeError> {
        block
            .get(self.offset..self.end())
            .map(T::decode)
            .ok_or(DecodeError::TooShort {
                len: block.len(),
                min: self.end(),
            })
    }
}

impl Field<i32> {
    /// Read a count, which must not be negative.
    fn read_count(&self, block: &[u8]) -> Result<usize, DecodeError> {
        let value = self.read(block)?;
        usize::try_from(value).map_err(|_| DecodeError::NegativeCount {
            field: self.name,
            offset: self.offset,
            value: value.into(),
        })
    }
}

impl Field<i16> {
    /// Read an index and look it up in the table of the enum.
    fn read_enum<E: IndexTable>(&self, block: &[u8]) -> Result<E, DecodeError> {
        let index = self.read(block)?;
        E::from_index(index.into()).ok_or(DecodeError::IndexOutOfRange {
            field: self.name,
            offset: self.offset,
            index: index.into(),
            len: E::TABLE.len(),
        })
    }

    /// Read an index into the timebase table.
    fn read_timebase(&self, block: &[u8]) -> Result<f64, DecodeError> {
        let index = self.read(block)?;
        timebase_from_index(index).ok_or(DecodeError::IndexOutOfRange {
            field: self.name,
            offset: self.offset,
            index: index.into(),
            len: TIMEBASE_TABLE.len(),
        })
    }
}

impl Field<f32> {
    /// Read a value that must be finite and strictly positive.
    fn read_positive(&self, block: &[u8]) -> Result<f64, DecodeError> {
        let value = f64::from(self.read(block)?);
        if !(value.is_finite() && value > 0.0) {
            return Err(DecodeError::InvalidValue {
                field: self.name,
                offset: self.offset,
                value,
            });
        }
        Ok(value)
    }
}

/// Largest end of all given fields.
pub const fn span(ends: &[usize]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < ends.len() {
        if ends[i] > max {
            max = ends[i];
        }
        i += 1;
    }
    max
}

/// The layout of the descriptor block.
pub mod layout {
    #![allow(missing_docs)]

    use super::{Field, Text16, span};

    pub const DESCRIPTOR_NAME: Field<Text16> = Field::new("descriptor_name", 0);
    pub const TEMPLATE_NAME: Field<Text16> = Field::new("template_name", 16);
    pub const COMM_TYPE: Field<i16> = Field::new("sample_format", 32);
    pub const COMM_ORDER: Field<i16> = Field::new("byte_order", 34);
    pub const WAVE_DESC_LENGTH: Field<i32> = Field::new("descriptor_block_length_bytes", 36);
    pub const WAVE_ARRAY_LENGTH: Field<i32> = Field::new("sample_array_length_bytes", 60);
    pub const INSTRUMENT_NAME: Field<Text16> = Field::new("instrument_name", 76);
    pub const WAVE_ARRAY_COUNT: Field<i32> = Field::new("sample_count", 116);
    pub const FIRST_POINT: Field<i32> = Field::new("first_sample_offset", 132);
    pub const DATA_INTERVAL: Field<i32> = Field::new("sample_stride", 136);
    pub const READ_FRAMES: Field<i32> = Field::new("frames_read_this_transfer", 144);
    pub const SUM_FRAMES: Field<i32> = Field::new("frames_total_acquired", 148);
    pub const VERTICAL_GAIN: Field<f32> = Field::new("raw_vertical_gain", 156);
    pub const VERTICAL_OFFSET: Field<f32> = Field::new("raw_vertical_offset", 160);
    pub const CODES_PER_DIV: Field<f32> = Field::new("codes_per_division", 164);
    pub const ADC_BIT: Field<i16> = Field::new("adc_bit_depth", 172);
    pub const FRAME_INDEX: Field<i16> = Field::new("sequence_frame_index", 174);
    pub const HORIZONTAL_INTERVAL: Field<f32> = Field::new("sample_interval_seconds", 176);
    pub const HORIZONTAL_OFFSET: Field<f64> = Field::new("trigger_delay_seconds", 180);
    pub const TIMEBASE: Field<i16> = Field::new("time_per_division", 324);
    pub const COUPLING: Field<i16> = Field::new("vertical_coupling", 326);
    pub const PROBE: Field<f32> = Field::new("probe_attenuation_factor", 328);
    pub const FIXED_VERTICAL_GAIN: Field<i16> = Field::new("fixed_vertical_gain_code", 332);
    pub const BANDWIDTH_LIMIT: Field<i16> = Field::new("bandwidth_limit", 334);

    /// Minimum length of a descriptor block that can be decoded.
    pub const MIN_LEN: usize = span(&[
        DESCRIPTOR_NAME.end(),
        TEMPLATE_NAME.end(),
        COMM_TYPE.end(),
        COMM_ORDER.end(),
        WAVE_DESC_LENGTH.end(),
        WAVE_ARRAY_LENGTH.end(),
        INSTRUMENT_NAME.end(),
        WAVE_ARRAY_COUNT.end(),
        FIRST_POINT.end(),
        DATA_INTERVAL.end(),
        READ_FRAMES.end(),
        SUM_FRAMES.end(),
        VERTICAL_GAIN.end(),
        VERTICAL_OFFSET.end(),
        CODES_PER_DIV.end(),
        ADC_BIT.end(),
        FRAME_INDEX.end(),
        HORIZONTAL_INTERVAL.end(),
        HORIZONTAL_OFFSET.end(),
        TIMEBASE.end(),
        COUPLING.end(),
        PROBE.end(),
        FIXED_VERTICAL_GAIN.end(),
        BANDWIDTH_LIMIT.end(),
    ]);
}

/// Look up the time per division for an index of the descriptor.
pub fn timebase_from_index(index: i16) -> Option<f64> {
    usize::try_from(index)
        .ok()
        .and_then(|idx| TIMEBASE_TABLE.get(idx))
        .copied()
}

/// The decoded waveform descriptor of one channel.
///
/// Vertical values are given as stored in the block and, for gain and offset, also multiplied
/// with the probe attenuation.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveformDescriptor {
    /// Name of the descriptor, starts with `WAVEDESC`.
    pub descriptor_name: String,
    /// Name of the template, starts with `WAVEACE`.
    pub template_name: String,
    /// Width of the transferred samples.
    pub sample_format: SampleFormat,
    /// Byte order of transferred words.
    pub byte_order: ByteOrder,
    /// Length of the descriptor block in bytes.
    pub descriptor_block_length_bytes: usize,
    /// Length of the sample array in bytes, as transferred with the current settings.
    pub sample_array_length_bytes: usize,
    /// Name of the instrument.
    pub instrument_name: String,
    /// Total number of samples of the acquisition.
    pub sample_count: usize,
    /// Offset of the first transferred sample in the trace buffer.
    pub first_sample_offset: usize,
    /// Interval between transferred points.
    pub sample_stride: usize,
    /// Sequence frames transferred this time.
    pub frames_read_this_transfer: usize,
    /// Sequence frames acquired.
    pub frames_total_acquired: usize,
    /// Vertical gain in volts per division, without probe attenuation.
    pub raw_vertical_gain: f64,
    /// Vertical offset in volts, without probe attenuation.
    pub raw_vertical_offset: f64,
    /// ADC codes per vertical division.
    pub codes_per_division: f64,
    /// Resolution of the ADC in bits.
    pub adc_bit_depth: u8,
    /// Index of the sequence frame.
    pub sequence_frame_index: i16,
    /// Time between two samples in seconds.
    pub sample_interval_seconds: f64,
    /// Time between trigger and first sample in seconds.
    pub trigger_delay_seconds: f64,
    /// Horizontal scale in seconds per division.
    pub time_per_division_seconds: f64,
    /// Input coupling.
    pub vertical_coupling: Coupling,
    /// Probe attenuation factor.
    pub probe_attenuation_factor: f64,
    /// Enumerated vertical scale.
    pub fixed_vertical_gain_code: i16,
    /// Bandwidth limit.
    pub bandwidth_limit: BandwidthLimit,
    /// Channel the descriptor belongs to, 1 to 4.
    pub channel_id: u8,
    /// Vertical gain in volts per division including the probe attenuation.
    pub vertical_gain: f64,
    /// Vertical offset in volts including the probe attenuation.
    pub vertical_offset: f64,
}

/// Decode a descriptor block.
///
/// The block is the payload of the response, i.e., without the `#` framing. The channel is not
/// taken from the block, but from `current_channel`, which is only called once the block itself
/// decoded without error.
pub fn decode_descriptor<F, E>(block: &[u8], current_channel: F) -> Result<WaveformDescriptor, E>
where
    F: FnOnce() -> Result<u8, E>,
    E: From<DecodeError>,
{
    use layout::*;

    if block.len() < MIN_LEN {
        return Err(DecodeError::TooShort {
            len: block.len(),
            min: MIN_LEN,
        }
        .into());
    }

    let mut codes_per_division = CODES_PER_DIV.read_positive(block)?;
    if codes_per_division > CODES_PER_DIV_QUIRK_LIMIT {
        warn!("Descriptor reports {codes_per_division} codes per division, dividing by 16");
        codes_per_division /= 16.0;
    }

    let adc_bit = ADC_BIT.read(block)?;
    let adc_bit_depth = u8::try_from(adc_bit).map_err(|_| DecodeError::InvalidValue {
        field: ADC_BIT.name,
        offset: ADC_BIT.offset,
        value: adc_bit.into(),
    })?;

    let raw_vertical_gain = f64::from(VERTICAL_GAIN.read(block)?);
    let raw_vertical_offset = f64::from(VERTICAL_OFFSET.read(block)?);
    let probe_attenuation_factor = f64::from(PROBE.read(block)?);

    let mut descriptor = WaveformDescriptor {
        descriptor_name: DESCRIPTOR_NAME.read(block)?.0,
        template_name: TEMPLATE_NAME.read(block)?.0,
        sample_format: COMM_TYPE.read_enum(block)?,
        byte_order: COMM_ORDER.read_enum(block)?,
        descriptor_block_length_bytes: WAVE_DESC_LENGTH.read_count(block)?,
        sample_array_length_bytes: WAVE_ARRAY_LENGTH.read_count(block)?,
        instrument_name: INSTRUMENT_NAME.read(block)?.0,
        sample_count: WAVE_ARRAY_COUNT.read_count(block)?,
        first_sample_offset: FIRST_POINT.read_count(block)?,
        sample_stride: DATA_INTERVAL.read_count(block)?,
        frames_read_this_transfer: READ_FRAMES.read_count(block)?,
        frames_total_acquired: SUM_FRAMES.read_count(block)?,
        raw_vertical_gain,
        raw_vertical_offset,
        codes_per_division,
        adc_bit_depth,
        sequence_frame_index: FRAME_INDEX.read(block)?,
        sample_interval_seconds: HORIZONTAL_INTERVAL.read_positive(block)?,
        trigger_delay_seconds: HORIZONTAL_OFFSET.read(block)?,
        time_per_division_seconds: TIMEBASE.read_timebase(block)?,
        vertical_coupling: COUPLING.read_enum(block)?,
        probe_attenuation_factor,
        fixed_vertical_gain_code: FIXED_VERTICAL_GAIN.read(block)?,
        bandwidth_limit: BANDWIDTH_LIMIT.read_enum(block)?,
        channel_id: 0,
        vertical_gain: raw_vertical_gain * probe_attenuation_factor,
        vertical_offset: raw_vertical_offset * probe_attenuation_factor,
    };
    descriptor.channel_id = current_channel()?;

    debug!(
        "Decoded descriptor of C{}: {} samples, {} bit, {} s/div",
        descriptor.channel_id,
        descriptor.sample_count,
        descriptor.adc_bit_depth,
        descriptor.time_per_division_seconds
    );
    Ok(descriptor)
}
