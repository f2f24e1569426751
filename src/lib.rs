//! Serial-to-network gateway: bridges RS-232/RS-485 serial ports to TCP
//! clients, with optional Modbus-TCP ↔ Modbus-RTU translation.

#![warn(rust_2018_idioms)]

pub mod admin;
pub mod config;
pub mod control;
pub mod error;
pub mod forwarder;
pub mod logging;
pub mod modbus;
pub mod net;
pub mod uart;
