//! Serial device manager (C2): owns every configured UART, multiplexes
//! read readiness with `mio` the way
//! `examples/original_source/src/uart/uart_mgr.h`'s `epoll_fd` does, and
//! exposes per-device statistics and hot reconfiguration.

mod dev;

pub use dev::{UartDev, UartStatus};

use std::io::{self, Read, Write};
use std::time::Duration;

use mio::unix::SourceFd;
use mio::{Events, Interest, Poll, Token};

use crate::config::{UartConfig, MAX_UART};
use crate::error::DeviceError;

/// Scratch buffer size for a single readiness-driven read, mirroring
/// `BUF_SIZE` in the original source.
pub const BUF_SIZE: usize = 512;

const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// One byte delivered by the event loop, tagged with the slot it came from.
pub struct UartReadEvent {
    pub idx: usize,
    pub modbus_enable: bool,
    pub data: Vec<u8>,
}

/// Owns up to [`MAX_UART`] serial devices and the readiness selector that
/// multiplexes reads across all of them.
pub struct UartMgr {
    slots: Vec<parking_lot::Mutex<Option<UartDev>>>,
    poll: parking_lot::Mutex<Poll>,
}

impl UartMgr {
    /// Opens every `enable`d entry in `configs`, skipping (and logging) any
    /// that fail to open — a single bad device never aborts the manager.
    pub fn new(configs: &[UartConfig]) -> Result<Self, DeviceError> {
        let poll = Poll::new().map_err(DeviceError::SelectorError)?;
        let mgr = Self {
            slots: (0..MAX_UART).map(|_| parking_lot::Mutex::new(None)).collect(),
            poll: parking_lot::Mutex::new(poll),
        };

        for config in configs {
            if !config.enable {
                continue;
            }
            match mgr.open_slot(config) {
                Ok(()) => {}
                Err(e) => log::warn!("uart {}: {e}", config.idx),
            }
        }

        Ok(mgr)
    }

    fn open_slot(&self, config: &UartConfig) -> Result<(), DeviceError> {
        if config.idx >= MAX_UART {
            return Err(DeviceError::IndexOutOfRange(config.idx));
        }

        let dev = UartDev::open(config)?;

        {
            let poll = self.poll.lock();
            poll.registry()
                .register(
                    &mut SourceFd(&dev.as_raw_fd()),
                    Token(config.idx),
                    Interest::READABLE,
                )
                .map_err(DeviceError::SelectorError)?;
        }

        let mut slot = self.slots[config.idx].lock();
        if let Some(old) = slot.take() {
            drop(old);
        }
        *slot = Some(dev);
        Ok(())
    }

    fn close_slot(&self, idx: usize) {
        let mut slot = self.slots[idx].lock();
        if let Some(dev) = slot.take() {
            let poll = self.poll.lock();
            let _ = poll.registry().deregister(&mut SourceFd(&dev.as_raw_fd()));
        }
    }

    /// Replaces slot `idx`'s live parameters, per §4.2's `set_config`:
    /// opens the device if it wasn't, closes and deregisters it if
    /// `enable` is now false, reconfigures in place otherwise.
    pub fn set_config(&self, config: &UartConfig) -> Result<(), DeviceError> {
        if config.idx >= MAX_UART {
            return Err(DeviceError::IndexOutOfRange(config.idx));
        }

        if !config.enable {
            self.close_slot(config.idx);
            return Ok(());
        }

        let already_open = self.slots[config.idx].lock().is_some();
        if already_open {
            let mut slot = self.slots[config.idx].lock();
            if let Some(dev) = slot.as_mut() {
                return dev.reconfigure(config);
            }
            Ok(())
        } else {
            self.open_slot(config)
        }
    }

    /// A snapshot copy of a slot's statistics and config, safe to read
    /// while the serial loop concurrently updates counters (§5's
    /// word-sized-load tolerance for torn reads).
    pub fn get_status(&self, idx: usize) -> Option<UartStatus> {
        self.slots.get(idx)?.lock().as_ref().map(UartDev::status)
    }

    /// Runs the readiness-driven read loop until `running` is false. Each
    /// ready device yields at most one [`UartReadEvent`] per poll cycle,
    /// handed to `on_read`.
    pub fn run(&self, running: &std::sync::atomic::AtomicBool, mut on_read: impl FnMut(UartReadEvent)) {
        let mut events = Events::with_capacity(MAX_UART);
        let mut buf = [0u8; BUF_SIZE];

        while running.load(std::sync::atomic::Ordering::Relaxed) {
            let poll_result = {
                let mut poll = self.poll.lock();
                poll.poll(&mut events, Some(POLL_TIMEOUT))
            };
            if let Err(e) = poll_result {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                log::error!("uart selector poll failed: {e}");
                continue;
            }

            for event in events.iter() {
                let idx = event.token().0;
                let Some(slot) = self.slots.get(idx) else {
                    continue;
                };
                let mut guard = slot.lock();
                let Some(dev) = guard.as_mut() else {
                    continue;
                };

                match dev.port.read(&mut buf) {
                    Ok(0) => {}
                    Ok(n) => {
                        dev.rx_bytes += n as u64;
                        let modbus_enable = dev.config.modbus_enable;
                        on_read(UartReadEvent {
                            idx,
                            modbus_enable,
                            data: buf[..n].to_vec(),
                        });
                    }
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => {}
                    Err(e) => {
                        dev.err_count += 1;
                        log::warn!("uart {idx} read error: {e}");
                    }
                }
            }
        }
    }

    /// Synchronous write to an open slot, per §4.2 (no partial-write
    /// retry loop; the caller sees the native return count).
    pub fn write(&self, idx: usize, data: &[u8]) -> Result<usize, DeviceError> {
        let mut slot = self
            .slots
            .get(idx)
            .ok_or(DeviceError::IndexOutOfRange(idx))?
            .lock();
        let dev = slot.as_mut().ok_or(DeviceError::IndexOutOfRange(idx))?;
        match dev.port.write(data) {
            Ok(n) => {
                dev.tx_bytes += n as u64;
                Ok(n)
            }
            Err(e) => {
                dev.err_count += 1;
                Err(DeviceError::ConfigureFailed {
                    path: dev.config.dev_path.clone(),
                    source: e,
                })
            }
        }
    }

    /// True iff the uart at `idx` is open and modbus-enabled.
    pub fn is_modbus_enabled(&self, idx: usize) -> bool {
        self.slots
            .get(idx)
            .and_then(|slot| slot.lock().as_ref().map(|dev| dev.config.modbus_enable))
            .unwrap_or(false)
    }

    /// True iff the uart at `idx` is currently open.
    pub fn is_open(&self, idx: usize) -> bool {
        self.slots
            .get(idx)
            .map(|slot| slot.lock().is_some())
            .unwrap_or(false)
    }
}
