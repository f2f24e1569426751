//! Modbus codec (C1): CRC16, RTU byte-stream parser, MBAP parser,
//! RTU↔TCP conversion, and exception frame construction.
//!
//! The streaming parser in [`rtu`] is the primary state machine used by the
//! serial side of the forwarder; the whole-buffer parser in [`tcp`] is the
//! documented secondary variant used for inbound network frames, where a
//! full receive is already in hand before conversion.

pub mod convert;
pub mod crc;
pub mod frame;
pub mod rtu;
pub mod tcp;

pub use convert::{build_exception, rtu_to_tcp, tcp_to_rtu};
pub use crc::crc16;
pub use frame::{RtuFrame, TcpFrame};
pub use rtu::{ParseOutcome, RtuParser};
pub use tcp::parse_tcp_data;

/// Upper bound on a single Modbus frame's total size, mirroring
/// `MODBUS_MAX_FRAME_LEN` in the original source.
pub const MAX_FRAME_LEN: usize = 256;
