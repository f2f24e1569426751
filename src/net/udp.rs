//! UDP datagram I/O (§4.3: no connection state, bind once, send/recv by
//! explicit peer address each call).

use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::error::TransportError;

/// A bound UDP socket exposing the connectionless send/recv pair §4.3
/// names.
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Binds `0.0.0.0:port` (§6's default 8889).
    pub fn bind(port: u16) -> Result<Self, TransportError> {
        let addr = format!("0.0.0.0:{port}");
        let socket = UdpSocket::bind(&addr).map_err(|source| TransportError::FatalInit { addr, source })?;
        socket.set_nonblocking(true).ok();
        Ok(Self { socket })
    }

    pub fn send_to(&self, data: &[u8], ip: &str, port: u16) -> Result<usize, TransportError> {
        let addr = format!("{ip}:{port}");
        self.socket.send_to(data, addr).map_err(TransportError::from)
    }

    /// Returns `Ok(None)` on `WouldBlock` (no datagram ready), matching
    /// the recv_tcp convention of reporting absence of data as a
    /// non-error.
    pub fn recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>, TransportError> {
        match self.socket.recv_from(buf) {
            Ok((n, src)) => Ok(Some((n, src))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(TransportError::from(e)),
        }
    }
}
