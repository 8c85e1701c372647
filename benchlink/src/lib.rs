//! Benchlink: blocking transports for SCPI bench instruments
//!
//! Benchlink provides the plumbing that instrument drivers in this workspace sit on: the
//! [`InstrumentInterface`] trait, the [`InstrumentError`] error type that drivers propagate, and
//! a few implementations of the trait.
//!
//! # Available interfaces
//! - [`Instrument`]: any port that implements [`std::io::Read`] and [`std::io::Write`].
//! - [`TcpIpInterface`]: a shortcut to open an [`Instrument`] on a [`std::net::TcpStream`], e.g.,
//!   the raw SCPI socket most LAN enabled oscilloscopes and power supplies expose.
//! - [`LoopbackInterface`]: a scripted instrument to test drivers without hardware.
//!
//! # Text and binary responses
//!
//! SCPI instruments answer most queries with a single line of text, which
//! [`InstrumentInterface::query`] reads up to the terminator. Bulk data, such as waveform
//! samples, arrives as binary payloads that can contain any byte, including the terminator. For
//! those, drivers read the exact number of bytes they expect with
//! [`InstrumentInterface::read_exact`] or [`InstrumentInterface::read_bytes`].
//!
//! # Blocking model
//!
//! Every call blocks until the instrument answered or the timeout of the interface elapsed. A
//! timeout is always returned as an error and never retried. One interface is one session with
//! the instrument: drivers keep it behind an `Arc<Mutex<_>>` so handles can be cloned, but
//! sequences of commands that depend on each other must still be serialized by the caller.
//!
//! # License
//!
//! Licensed under either of
//!
//! - Apache License, Version 2.0 ([LICENSE-APACHE](http://www.apache.org/licenses/LICENSE-2.0))
//! - MIT license ([LICENSE-MIT](http://opensource.org/licenses/MIT))
//!
//! at your option.

#![warn(missing_docs)]

mod instrument;
mod loopback;
mod tcp_ip;

pub use instrument::Instrument;
pub use loopback::{LoopbackInterface, LoopbackReply};
pub use tcp_ip::TcpIpInterface;

use std::time::{Duration, Instant};

use thiserror::Error;

/// The error enum for all instruments.
///
/// Every command sent to or query read from an instrument returns this error as the alternative.
/// Drivers can wrap it into their own error types with `#[from]`, such that the `?` operator
/// propagates transport failures without further ado.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum InstrumentError {
    /// The channel requested does not exist on the instrument.
    #[error(
        "Channel with index {idx} is out of range. Number of channels available: {nof_channels}"
    )]
    ChannelIndexOutOfRange {
        /// Index of the channel that is out of range.
        idx: usize,
        /// Total number of channels.
        nof_channels: usize,
    },
    /// A given float value is out of the specified range.
    #[error("Float value {value} is out of range. Allowed range is [{min}, {max}]")]
    FloatValueOutOfRange {
        /// The value that is out of range.
        value: f64,
        /// The minimum value that is allowed.
        min: f64,
        /// The maximum value that is allowed.
        max: f64,
    },
    /// A given integer value is out of the specified range.
    #[error("Integer value {value} is out of range. Allowed range is [{min}, {max}]")]
    IntValueOutOfRange {
        /// The value that is out of range.
        value: i64,
        /// The minimum value that is allowed.
        min: i64,
        /// The maximum value that is allowed.
        max: i64,
    },
    /// An argument was passed that the instrument cannot accept. The message is shown to the
    /// user as is.
    #[error("{0}")]
    InvalidArgument(String),
    /// Error when reading from/writing to an interface. See [`std::io::Error`] for more details.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The instrument answered, but not with the acknowledgment that was expected. The response
    /// received is returned in the error.
    #[error("Instrument did not acknowledge the command sent, but responded with: {0}")]
    NotAcknowledged(String),
    /// Instrument response could not be parsed because it was unexpected by the driver. This
    /// error contains the response that was received from the instrument.
    #[error("Response from instrument could not be parsed. Response was: {0}")]
    ResponseParseError(String),
    /// No terminator arrived before the timeout elapsed.
    #[error(
        "Timeout occured while waiting for a response from the instrument. Timeout was set to {0:?}."
    )]
    Timeout(Duration),
    /// Timeout occurred while waiting for a response to a query. The error contains the query
    /// that was sent and the timeout that was exceeded.
    #[error(
        "Timeout occured while waiting for a response to query: {query}. Timeout was set to {timeout:?}."
    )]
    TimeoutQuery {
        /// The query that timed out.
        query: String,
        /// The timeout that was set.
        timeout: Duration,
    },
}

/// The `InstrumentInterface` trait defines how drivers talk to an instrument.
///
/// Implementors only have to provide [`read_exact`](InstrumentInterface::read_exact) and
/// [`write_raw`](InstrumentInterface::write_raw). Everything else, i.e., sending terminated
/// commands, reading lines, querying, and reading binary payloads, is built on top of these two
/// by default.
pub trait InstrumentInterface {
    /// Read a line and check that it equals the expected acknowledgment.
    ///
    /// # Arguments
    /// * `ack` - The acknowledgment string, without terminator.
    fn check_acknowledgment(&mut self, ack: &str) -> Result<(), InstrumentError> {
        let resp = self.read_until_terminator()?;
        if resp != ack {
            return Err(InstrumentError::NotAcknowledged(resp));
        }
        Ok(())
    }

    /// Get the terminator that is appended to commands and ends responses.
    fn get_terminator(&self) -> &str {
        "\n"
    }

    /// Get the timeout after which waiting for a terminator is given up.
    fn get_timeout(&self) -> Duration {
        Duration::from_secs(3)
    }

    /// Send a query and read back a single line of response.
    ///
    /// The response is trimmed of the terminator and surrounding whitespace. If no terminator
    /// arrives in time, a [`InstrumentError::TimeoutQuery`] containing the query is returned.
    ///
    /// # Arguments
    /// * `cmd` - The query to send, without terminator.
    fn query(&mut self, cmd: &str) -> Result<String, InstrumentError> {
        self.sendcmd(cmd)?;
        match self.read_until_terminator() {
            Err(InstrumentError::Timeout(timeout)) => Err(InstrumentError::TimeoutQuery {
                query: cmd.to_string(),
                timeout,
            }),
            other => other,
        }
    }

    /// Fill the whole buffer with bytes from the instrument.
    ///
    /// This blocks until the buffer is full or the underlying port fails, e.g., because its
    /// read timeout elapsed.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError>;

    /// Read exactly `n` bytes from the instrument and return them.
    ///
    /// Use this for binary payloads of known length.
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>, InstrumentError> {
        let mut buf = vec![0; n];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read bytes until the response ends with the terminator.
    ///
    /// Returns the trimmed response. Bytes that are not valid UTF-8 are replaced. If the timeout
    /// elapses before the terminator was seen, [`InstrumentError::Timeout`] is returned.
    fn read_until_terminator(&mut self) -> Result<String, InstrumentError> {
        let timeout = self.get_timeout();
        let terminator = self.get_terminator().as_bytes().to_vec();
        let mut response = Vec::new();
        let mut single_buf = [0u8];

        let tic = Instant::now();
        while tic.elapsed() < timeout {
            self.read_exact(&mut single_buf)?;
            response.push(single_buf[0]);
            if response.ends_with(&terminator) {
                response.truncate(response.len() - terminator.len());
                return Ok(String::from_utf8_lossy(&response).trim().to_string());
            }
        }
        Err(InstrumentError::Timeout(timeout))
    }

    /// Send a command to the instrument.
    ///
    /// The terminator is appended and the result is written with
    /// [`write_raw`](InstrumentInterface::write_raw).
    ///
    /// # Arguments
    /// * `cmd` - The command to send, without terminator.
    fn sendcmd(&mut self, cmd: &str) -> Result<(), InstrumentError> {
        let cmd = format!("{cmd}{}", self.get_terminator());
        self.write(&cmd)
    }

    /// Set the terminator of the interface.
    ///
    /// # Arguments
    /// * `_terminator` - The new terminator, e.g., `"\r\n"`.
    fn set_terminator(&mut self, _terminator: &str) {}

    /// Write a string as is, without appending the terminator.
    fn write(&mut self, data: &str) -> Result<(), InstrumentError> {
        self.write_raw(data.as_bytes())
    }

    /// Write raw bytes to the instrument and flush.
    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError>;
}
