//! Network manager (C3): TCP multi-client acceptor, idle-timeout reaper,
//! broadcast/unicast send, and UDP datagram I/O.

mod client;
mod udp;

pub use client::{ClientStatus, TcpClient};
pub use udp::UdpEndpoint;

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::config::MAX_CLIENT_NUM;
use crate::error::TransportError;

/// How long a client may sit idle before the reaper closes its slot (§4.3).
pub const CONN_TIMEOUT: Duration = Duration::from_secs(30);
/// How often the reaper thread scans the slot table.
pub const REAP_INTERVAL: Duration = Duration::from_secs(5);
/// Blocking-read timeout used by the TCP-client-mode worker thread
/// (`run_tcp_client_worker`). Accepted TCP-server slots are non-blocking
/// from `accept()` onward (§4.3) and are never given a read timeout, so
/// `recv_tcp` polls and returns `Ok(0)` immediately rather than blocking
/// for this long; the forwarder's own fan-out sleep is what paces that
/// direction instead.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(1);

/// Operating mode selected at construction (§3 `NetMgr`).
pub enum Mode {
    TcpServer { listener: TcpListener },
    TcpClient { peer_addr: String },
    Udp,
}

/// Owns the fixed-size client slot table plus, depending on mode, a TCP
/// listener or an outbound peer address.
pub struct NetMgr {
    mode: parking_lot::Mutex<Option<Mode>>,
    clients: parking_lot::Mutex<Vec<Option<TcpClient>>>,
}

impl NetMgr {
    /// Binds a TCP listener on `0.0.0.0:port` (§6's default 8888). Bind
    /// failure is fatal to construction, per §4.3/§7's `FatalInitError`.
    pub fn new_tcp_server(port: u16) -> Result<Self, TransportError> {
        let addr = format!("0.0.0.0:{port}");
        let listener = TcpListener::bind(&addr).map_err(|source| TransportError::FatalInit {
            addr: addr.clone(),
            source,
        })?;
        listener.set_nonblocking(true).ok();

        Ok(Self {
            mode: parking_lot::Mutex::new(Some(Mode::TcpServer { listener })),
            clients: parking_lot::Mutex::new((0..MAX_CLIENT_NUM).map(|_| None).collect()),
        })
    }

    /// Configures outbound TCP-client mode, keeping a single connection to
    /// `peer_addr` alive from a dedicated worker thread.
    pub fn new_tcp_client(peer_addr: String) -> Self {
        Self {
            mode: parking_lot::Mutex::new(Some(Mode::TcpClient { peer_addr })),
            clients: parking_lot::Mutex::new((0..MAX_CLIENT_NUM).map(|_| None).collect()),
        }
    }

    /// Runs the accept loop until `running` is false. One thread owns this
    /// call for the lifetime of the process (§5).
    pub fn run_acceptor(&self, running: &AtomicBool) {
        let listener = {
            let mode = self.mode.lock();
            match mode.as_ref() {
                Some(Mode::TcpServer { listener }) => listener.try_clone().ok(),
                _ => None,
            }
        };
        let Some(listener) = listener else { return };

        while running.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if let Err(e) = self.accept_client(stream, addr.to_string()) {
                        log::warn!("rejecting new connection from {addr}: {e}");
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(50));
                }
                Err(e) => {
                    log::warn!("accept failed: {e}");
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    }

    fn accept_client(&self, stream: TcpStream, addr: String) -> Result<(), TransportError> {
        stream.set_nonblocking(true)?;

        let mut clients = self.clients.lock();
        let slot = clients.iter().position(|c| c.is_none());
        match slot {
            Some(idx) => {
                clients[idx] = Some(TcpClient::new(stream, addr));
                log::info!("client accepted into slot {idx}");
                Ok(())
            }
            None => {
                drop(clients);
                let _ = stream.shutdown(std::net::Shutdown::Both);
                Err(TransportError::TableFull)
            }
        }
    }

    /// Runs the idle-timeout reaper until `running` is false (§4.3).
    pub fn run_reaper(&self, running: &AtomicBool) {
        while running.load(Ordering::Relaxed) {
            std::thread::sleep(REAP_INTERVAL);
            if !running.load(Ordering::Relaxed) {
                break;
            }
            let mut clients = self.clients.lock();
            for slot in clients.iter_mut() {
                let expired = slot
                    .as_ref()
                    .map(|c| c.last_active.elapsed() > CONN_TIMEOUT)
                    .unwrap_or(false);
                if expired {
                    if let Some(c) = slot.take() {
                        c.close();
                        log::info!("reaped idle client");
                    }
                }
            }
        }
    }

    /// Sends `data` to every connected client, per §4.3/§8's broadcast
    /// atomicity property. Returns the number of successful sends.
    pub fn broadcast_tcp(&self, data: &[u8]) -> usize {
        let mut clients = self.clients.lock();
        let mut sent = 0;
        for slot in clients.iter_mut() {
            let should_close = if let Some(client) = slot.as_mut() {
                match client.send(data) {
                    Ok(_) => {
                        sent += 1;
                        false
                    }
                    Err(e) if would_block(&e) => false,
                    Err(_) => true,
                }
            } else {
                false
            };
            if should_close {
                if let Some(c) = slot.take() {
                    c.close();
                }
            }
        }
        sent
    }

    /// Unicast send to a single slot.
    pub fn send_tcp(&self, idx: usize, data: &[u8]) -> Result<usize, TransportError> {
        let mut clients = self.clients.lock();
        let client = clients
            .get_mut(idx)
            .and_then(|c| c.as_mut())
            .ok_or(TransportError::NotConnected(idx))?;
        client.send(data).map_err(TransportError::from)
    }

    /// Unicast recv from a single slot; the slot's socket is non-blocking,
    /// so this returns immediately. `Ok(0)` means no data was ready; a
    /// hard failure evicts the slot.
    pub fn recv_tcp(&self, idx: usize, buf: &mut [u8]) -> Result<usize, TransportError> {
        let mut clients = self.clients.lock();
        let should_close;
        let result = {
            let client = clients
                .get_mut(idx)
                .and_then(|c| c.as_mut())
                .ok_or(TransportError::NotConnected(idx))?;
            match client.recv(buf) {
                Ok(0) => {
                    should_close = true;
                    Ok(0)
                }
                Ok(n) => {
                    should_close = false;
                    Ok(n)
                }
                Err(e) if would_block(&e) => {
                    should_close = false;
                    Ok(0)
                }
                Err(e) => {
                    should_close = true;
                    Err(TransportError::from(e))
                }
            }
        };
        if should_close {
            if let Some(c) = clients[idx].take() {
                c.close();
            }
        }
        result
    }

    /// Snapshot of every occupied slot, for the admin surface.
    pub fn status(&self) -> Vec<ClientStatus> {
        self.clients
            .lock()
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| c.as_ref().map(|c| c.status(idx)))
            .collect()
    }

    /// Runs the single-connection TCP client worker until `running` is
    /// false: connect with backoff while disconnected, hold the
    /// connection once established.
    pub fn run_tcp_client_worker(self: &Arc<Self>, running: &AtomicBool, mut on_data: impl FnMut(&[u8])) {
        let peer_addr = {
            let mode = self.mode.lock();
            match mode.as_ref() {
                Some(Mode::TcpClient { peer_addr }) => peer_addr.clone(),
                _ => return,
            }
        };

        let mut buf = [0u8; 4096];
        while running.load(Ordering::Relaxed) {
            let stream = match TcpStream::connect(&peer_addr) {
                Ok(s) => s,
                Err(e) => {
                    log::warn!("connect to {peer_addr} failed: {e}, retrying in 3s");
                    std::thread::sleep(Duration::from_secs(3));
                    continue;
                }
            };
            stream.set_read_timeout(Some(RECV_TIMEOUT)).ok();
            let mut stream = stream;
            while running.load(Ordering::Relaxed) {
                match stream.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => on_data(&buf[..n]),
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock || e.kind() == io::ErrorKind::TimedOut => {}
                    Err(_) => break,
                }
            }
        }
    }
}

fn would_block(e: &TransportError) -> bool {
    matches!(e, TransportError::Io(io_err) if io_err.kind() == io::ErrorKind::WouldBlock)
}
