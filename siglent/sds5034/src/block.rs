//! IEEE 488.2 definite-length blocks.
//!
//! Binary responses of the scope, i.e., descriptors and sample pages, are framed as `#`, one digit
//! `n`, `n` decimal digits with the payload length, and the payload. The scope terminates the
//! block with `"\n\n"`, and may send protocol artifacts before the `#`.

use std::io::ErrorKind;

use benchlink::{InstrumentError, InstrumentInterface};
use log::{debug, warn};

use crate::TransferError;

/// Number of bytes that are searched for the `#` marker when reading from a stream.
pub const MAX_MARKER_SCAN: usize = 64;

/// Number of bytes the scope appends to a block.
pub const DEFAULT_TRAILER_LEN: usize = 2;

/// Locate the block in a received buffer and return its payload.
///
/// Anything before the `#` marker and after the declared payload, such as the trailing
/// terminator, is ignored.
pub fn split_block(buf: &[u8]) -> Result<&[u8], TransferError> {
    let marker = buf
        .iter()
        .position(|&b| b == b'#')
        .ok_or(TransferError::MissingMarker { scanned: buf.len() })?;
    let rest = &buf[marker + 1..];

    let nof_digits = match rest.first() {
        Some(&digit) => header_digit_count(digit)?,
        None => return Err(invalid_header(&buf[marker..])),
    };
    let digits = rest
        .get(1..=nof_digits)
        .ok_or_else(|| invalid_header(&buf[marker..]))?;
    let len = parse_length(digits)?;

    let payload = &rest[nof_digits + 1..];
    if payload.len() < len {
        return Err(TransferError::Truncated {
            expected: len,
            received: payload.len(),
        });
    }
    Ok(&payload[..len])
}

/// Read one block from the interface and return its payload.
///
/// At most [`MAX_MARKER_SCAN`] bytes are skipped while looking for the marker. A header that
/// declares more than `max_len` payload bytes is rejected before anything is allocated.
///
/// After the payload, up to `trailer_len` bytes of trailer are drained, see [`drain_trailer`].
pub fn read_block<T: InstrumentInterface + ?Sized>(
    intf: &mut T,
    trailer_len: usize,
    max_len: usize,
) -> Result<Vec<u8>, TransferError> {
    let mut byte = [0u8];
    let mut skipped = 0;
    loop {
        if skipped == MAX_MARKER_SCAN {
            return Err(TransferError::MissingMarker { scanned: skipped });
        }
        intf.read_exact(&mut byte)?;
        if byte[0] == b'#' {
            break;
        }
        skipped += 1;
    }
    if skipped > 0 {
        debug!("Skipped {skipped} bytes before block marker");
    }

    intf.read_exact(&mut byte)?;
    let nof_digits = header_digit_count(byte[0])?;
    let digits = intf.read_bytes(nof_digits)?;
    let len = parse_length(&digits)?;
    if len > max_len {
        warn!("Block declares {len} payload bytes, at most {max_len} are accepted");
        let mut header = vec![b'#', byte[0]];
        header.extend_from_slice(&digits);
        return Err(invalid_header(&header));
    }

    let payload = intf.read_bytes(len)?;
    drain_trailer(intf, trailer_len)?;
    debug!("Read block with {len} payload bytes");
    Ok(payload)
}

/// Discard the terminator that may follow a block.
///
/// Reads up to `trailer_len` bytes. If no more bytes arrive, i.e., the read times out or the
/// stream ends, the block simply had no trailer. A byte that is not part of the terminator ends
/// the drain with a warning. Without a trailer, this waits for one read timeout of the
/// interface, so set `trailer_len` to 0 for instruments that never send one.
pub fn drain_trailer<T: InstrumentInterface + ?Sized>(
    intf: &mut T,
    trailer_len: usize,
) -> Result<(), TransferError> {
    let terminator = intf.get_terminator().as_bytes().to_vec();
    let mut byte = [0u8];
    for drained in 0..trailer_len {
        match intf.read_exact(&mut byte) {
            Ok(()) if terminator.contains(&byte[0]) => {}
            Ok(()) => {
                warn!("Discarded unexpected byte {:#04x} after block", byte[0]);
                return Ok(());
            }
            Err(err) if is_end_of_response(&err) => {
                debug!("Block ended after {drained} of {trailer_len} trailer bytes");
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

/// Whether a read failed only because the instrument had nothing more to send.
fn is_end_of_response(err: &InstrumentError) -> bool {
    match err {
        InstrumentError::Timeout(_) => true,
        InstrumentError::Io(io) => matches!(
            io.kind(),
            ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::UnexpectedEof
        ),
        _ => false,
    }
}

/// Number of length digits announced by the byte after the marker.
fn header_digit_count(digit: u8) -> Result<usize, TransferError> {
    match digit {
        b'1'..=b'9' => Ok(usize::from(digit - b'0')),
        _ => Err(invalid_header(&[b'#', digit])),
    }
}

fn parse_length(digits: &[u8]) -> Result<usize, TransferError> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return Err(invalid_header(digits));
    }
    digits
        .iter()
        .try_fold(0usize, |acc, d| {
            acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
        })
        .ok_or_else(|| invalid_header(digits))
}

fn invalid_header(header: &[u8]) -> TransferError {
    TransferError::InvalidHeader {
        header: String::from_utf8_lossy(header).into_owned(),
    }
}
