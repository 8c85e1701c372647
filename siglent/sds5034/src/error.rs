//! Errors of the waveform acquisition pipeline.

use benchlink::InstrumentError;
use thiserror::Error;

/// The waveform descriptor block could not be decoded.
///
/// Decoding never returns a partially filled descriptor, any of these errors rejects the whole
/// block.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum DecodeError {
    /// The block ends before the last field that is decoded.
    #[error("Descriptor block has {len} bytes, at least {min} bytes are required")]
    TooShort {
        /// Length of the block received.
        len: usize,
        /// Minimum length of a block.
        min: usize,
    },
    /// An enumerated field holds an index that is not in its table.
    #[error(
        "Field '{field}' at offset {offset} holds index {index}, but its table only has {len} entries"
    )]
    IndexOutOfRange {
        /// Name of the field.
        field: &'static str,
        /// Byte offset of the field in the block.
        offset: usize,
        /// Index that was read.
        index: i64,
        /// Number of entries in the table.
        len: usize,
    },
    /// A count or length field is negative.
    #[error("Field '{field}' at offset {offset} holds the negative count {value}")]
    NegativeCount {
        /// Name of the field.
        field: &'static str,
        /// Byte offset of the field in the block.
        offset: usize,
        /// Value that was read.
        value: i64,
    },
    /// A calibration field holds a value that cannot be used for scaling.
    #[error("Field '{field}' at offset {offset} holds the invalid value {value}")]
    InvalidValue {
        /// Name of the field.
        field: &'static str,
        /// Byte offset of the field in the block.
        offset: usize,
        /// Value that was read.
        value: f64,
    },
}

/// A binary transfer from the instrument was not framed as expected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransferError {
    /// No `#` marker was found at the start of a block.
    #[error("No block marker '#' found in the first {scanned} bytes of the response")]
    MissingMarker {
        /// Number of bytes that were searched.
        scanned: usize,
    },
    /// The digits after the marker do not form a valid length header.
    #[error("Invalid block header: {header:?}")]
    InvalidHeader {
        /// The header bytes as far as they were read, lossily converted.
        header: String,
    },
    /// The payload is shorter than the header declares.
    #[error("Block declares {expected} payload bytes, but only {received} bytes were received")]
    Truncated {
        /// Declared payload length.
        expected: usize,
        /// Number of payload bytes available.
        received: usize,
    },
    /// A page payload does not hold the number of points that was requested.
    #[error("Page payload has {received} bytes, but {expected} bytes were requested")]
    LengthMismatch {
        /// Number of bytes of the requested points.
        expected: usize,
        /// Number of bytes received.
        received: usize,
    },
    /// A payload of 16 bit words has an odd number of bytes.
    #[error("Word payload of {len} bytes is not a multiple of two")]
    MisalignedWords {
        /// Length of the payload.
        len: usize,
    },
    /// Reading one page of samples failed. Pages read before are discarded.
    #[error("Transfer of page {page} (offset {offset}) of channel {channel} failed: {source}")]
    Page {
        /// Channel the page was read from.
        channel: u8,
        /// Zero-based index of the page.
        page: usize,
        /// Start point of the page.
        offset: usize,
        /// The framing or transport error of the page.
        source: Box<TransferError>,
    },
    /// The transport failed while a block was read.
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}

/// The error type returned by all waveform operations of the driver.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WaveformError {
    /// See [`DecodeError`].
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// See [`TransferError`].
    #[error(transparent)]
    Transfer(#[from] TransferError),
    /// The instrument is in a state that does not allow the requested acquisition.
    #[error("Cannot acquire channel {channel}: {reason}")]
    ProtocolState {
        /// Channel that was requested.
        channel: u8,
        /// Description of the offending state.
        reason: String,
    },
    /// Transport failures and invalid arguments, see [`InstrumentError`].
    #[error(transparent)]
    Instrument(#[from] InstrumentError),
}
