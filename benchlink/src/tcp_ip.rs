//! Blocking TCP/IP connections to instruments using [`std::net::TcpStream`].

use std::{
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use crate::{Instrument, InstrumentError};

/// Shortcut to open an [`Instrument`] on a TCP socket.
///
/// Most LAN enabled SCPI instruments listen on a raw socket, often port 5025.
#[derive(Debug)]
pub struct TcpIpInterface {}

impl TcpIpInterface {
    /// Connect to an instrument with a timeout of three seconds.
    ///
    /// The terminator is `"\n"` and can be changed with `set_terminator`.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address, e.g., `"192.168.10.2:5025"`.
    pub fn try_new<A: ToSocketAddrs>(
        sock_addr: A,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        Self::try_new_with_timeout(sock_addr, Duration::from_secs(3))
    }

    /// Connect to an instrument with a custom timeout.
    ///
    /// The timeout is set as read and write timeout on the socket and used when waiting for a
    /// terminator. Large binary transfers need a timeout that covers the whole transfer.
    ///
    /// # Arguments
    /// * `sock_addr` - Socket address.
    /// * `timeout` - Timeout for reading and writing.
    pub fn try_new_with_timeout<A: ToSocketAddrs>(
        sock_addr: A,
        timeout: Duration,
    ) -> Result<Instrument<TcpStream>, InstrumentError> {
        let stream = TcpStream::connect(sock_addr)?;
        stream.set_write_timeout(Some(timeout))?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_nodelay(true)?;
        Ok(Instrument::new(stream, timeout))
    }
}
