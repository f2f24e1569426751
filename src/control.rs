//! Shared control surface (C5): the process-wide running flag and the
//! handles the admin surface reaches the rest of the core through.
//!
//! §9 warns against cyclic back-references between the forwarder and the
//! managers; this is the single shared root every worker is constructed
//! from instead, matching the `Arc`-rooted-context shape the teacher uses
//! for `hermit-sync`-protected globals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::net::NetMgr;
use crate::uart::UartMgr;

/// Root handed to every worker thread at construction (§9's recommended
/// replacement for `g_uart_mgr`/`g_net_mgr`/`g_running`).
pub struct GatewayControl {
    running: AtomicBool,
    pub uart_mgr: Arc<UartMgr>,
    pub net_mgr: Arc<NetMgr>,
}

impl GatewayControl {
    pub fn new(uart_mgr: Arc<UartMgr>, net_mgr: Arc<NetMgr>) -> Self {
        Self {
            running: AtomicBool::new(true),
            uart_mgr,
            net_mgr,
        }
    }

    pub fn running_flag(&self) -> &AtomicBool {
        &self.running
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Flipped by the SIGINT handler; every core loop observes this at its
    /// next suspension point (§5).
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }
}
