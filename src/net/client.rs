//! A single TCP client slot (§3 `TcpClient`).

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::Instant;

/// One occupied slot in [`super::NetMgr`]'s client table.
pub struct TcpClient {
    stream: TcpStream,
    addr: String,
    pub(super) last_active: Instant,
    rx_bytes: u64,
    tx_bytes: u64,
}

impl TcpClient {
    pub(super) fn new(stream: TcpStream, addr: String) -> Self {
        Self {
            stream,
            addr,
            last_active: Instant::now(),
            rx_bytes: 0,
            tx_bytes: 0,
        }
    }

    pub(super) fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        let n = self.stream.write(data)?;
        self.tx_bytes += n as u64;
        self.last_active = Instant::now();
        Ok(n)
    }

    pub(super) fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.read(buf) {
            Ok(n) => {
                if n > 0 {
                    self.rx_bytes += n as u64;
                    self.last_active = Instant::now();
                }
                Ok(n)
            }
            Err(e) => Err(e),
        }
    }

    pub(super) fn close(self) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }

    pub(super) fn status(&self, idx: usize) -> ClientStatus {
        ClientStatus {
            idx,
            addr: self.addr.clone(),
            rx_bytes: self.rx_bytes,
            tx_bytes: self.tx_bytes,
            idle_for: self.last_active.elapsed(),
        }
    }
}

/// A read-only snapshot of a client slot, for the admin surface.
#[derive(Debug, Clone)]
pub struct ClientStatus {
    pub idx: usize,
    pub addr: String,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub idle_for: std::time::Duration,
}
