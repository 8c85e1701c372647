//! Decoding of raw sample bytes into ADC codes, and planning of paged transfers.

use benchlink::InstrumentError;

use crate::{ByteOrder, TransferError, WaveformError};

/// Signed ADC codes of one transfer, together with the bit depth they were recorded with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleCodes {
    /// The codes in transfer order.
    pub codes: Vec<i32>,
    /// Resolution of the ADC in bits.
    pub bit_depth: u8,
}

impl SampleCodes {
    /// Number of samples.
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether there are no samples.
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// The codes as floating point values that are ready to be scaled to volts.
    ///
    /// In 10 bit mode, the scope reports codes per division for the 8 bit range. The codes are
    /// therefore divided by 4.
    pub fn calibrated(&self) -> impl Iterator<Item = f64> + '_ {
        let divisor = if self.bit_depth == 10 { 4.0 } else { 1.0 };
        self.codes.iter().map(move |&c| f64::from(c) / divisor)
    }
}

/// Decode raw samples that were transferred with the least significant byte first.
///
/// With a bit depth of up to 8 bits, every byte is one sample. With more bits, every sample is a
/// 16 bit word, left aligned, and is shifted right by `16 - bit_depth`. Codes above
/// `2^(bit_depth - 1) - 1` are negative and get `2^bit_depth` subtracted.
///
/// # Arguments
/// * `raw` - The concatenated payloads of all pages.
/// * `bit_depth` - Resolution of the ADC, 1 to 16 bits.
pub fn decode_samples(raw: &[u8], bit_depth: u8) -> Result<SampleCodes, WaveformError> {
    decode_samples_ordered(raw, bit_depth, ByteOrder::Lsb)
}

/// Decode raw samples like [`decode_samples`], but with the given byte order of words.
pub fn decode_samples_ordered(
    raw: &[u8],
    bit_depth: u8,
    order: ByteOrder,
) -> Result<SampleCodes, WaveformError> {
    if !(1..=16).contains(&bit_depth) {
        return Err(InstrumentError::IntValueOutOfRange {
            value: bit_depth.into(),
            min: 1,
            max: 16,
        }
        .into());
    }

    let unsigned: Vec<u32> = if bit_depth <= 8 {
        raw.iter().map(|&b| u32::from(b)).collect()
    } else {
        if raw.len() % 2 != 0 {
            return Err(TransferError::MisalignedWords { len: raw.len() }.into());
        }
        let shift = 16 - bit_depth;
        raw.chunks_exact(2)
            .map(|w| {
                let word = match order {
                    ByteOrder::Lsb => u16::from_le_bytes([w[0], w[1]]),
                    ByteOrder::Msb => u16::from_be_bytes([w[0], w[1]]),
                };
                u32::from(word >> shift)
            })
            .collect()
    };

    let threshold = (1u32 << (bit_depth - 1)) - 1;
    let full_scale = 1i32 << bit_depth;
    let codes = unsigned
        .into_iter()
        .map(|c| {
            // c < 2^16, the cast is lossless
            let c = c as i32;
            if c > threshold as i32 { c - full_scale } else { c }
        })
        .collect();

    Ok(SampleCodes { codes, bit_depth })
}

/// One positioned read of a paged transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Zero-based index of the page.
    pub index: usize,
    /// Start point of the page in the trace buffer.
    pub offset: usize,
    /// Number of points in the page.
    pub len: usize,
}

/// Split a transfer of `count` points starting at `start_point` into pages of at most
/// `max_page_size` points.
///
/// Returns no pages if `max_page_size` is zero.
pub fn plan_pages(start_point: usize, count: usize, max_page_size: usize) -> Vec<Page> {
    if max_page_size == 0 {
        return Vec::new();
    }
    (0..count.div_ceil(max_page_size))
        .map(|index| {
            let done = index * max_page_size;
            Page {
                index,
                offset: start_point + done,
                len: max_page_size.min(count - done),
            }
        })
        .collect()
}
