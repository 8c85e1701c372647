//! The generic [`Instrument`] interface.
//!
//! It wraps any port that implements [`std::io::Read`] and [`std::io::Write`], such as a
//! [`std::net::TcpStream`] or an in-memory buffer.

use std::time::Duration;

use crate::{InstrumentError, InstrumentInterface};

/// A general instrument interface that can be built with any port that implements
/// [`std::io::Read`] and [`std::io::Write`].
///
/// # Example
///
/// Wrapping a raw socket by hand. For this common case, [`crate::TcpIpInterface`] does the same
/// and also sets the socket timeouts.
///
/// ```no_run
/// use std::{net::TcpStream, time::Duration};
///
/// use benchlink::Instrument;
///
/// let stream = TcpStream::connect("192.168.10.2:5025").unwrap();
/// let interface = Instrument::new(stream, Duration::from_secs(3));
/// ```
pub struct Instrument<P: std::io::Read + std::io::Write> {
    port: P,
    terminator: String,
    timeout: Duration,
}

impl<P: std::io::Read + std::io::Write> Instrument<P> {
    /// Create a new [`Instrument`] on the given port with `"\n"` as the terminator.
    ///
    /// # Arguments
    /// * `port` - The port to read from and write to.
    /// * `timeout` - How long to wait for a terminator when reading a line.
    pub fn new(port: P, timeout: Duration) -> Self {
        Self {
            port,
            terminator: "\n".to_string(),
            timeout,
        }
    }

    /// Change the timeout for reading lines.
    ///
    /// This does not touch timeouts configured on the port itself.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }
}

impl<P: std::io::Read + std::io::Write> InstrumentInterface for Instrument<P> {
    fn get_terminator(&self) -> &str {
        self.terminator.as_str()
    }

    fn get_timeout(&self) -> Duration {
        self.timeout
    }

    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), InstrumentError> {
        self.port.read_exact(buf)?;
        Ok(())
    }

    fn set_terminator(&mut self, terminator: &str) {
        self.terminator = terminator.to_string();
    }

    fn write_raw(&mut self, data: &[u8]) -> Result<(), InstrumentError> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }
}
