//! Error taxonomy for the gateway.
//!
//! Mirrors the kinds laid out in spec.md §7: codec faults are per-frame and
//! never tear anything down, device/transport faults are scoped to a single
//! slot, and only configuration and bind/listen failures are fatal to the
//! process.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Faults raised while parsing or converting Modbus frames (§4.1).
///
/// Every variant here is a per-frame drop: the caller logs it and moves on,
/// it never closes a connection or a UART.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("CRC16 input was empty")]
    InvalidInput,
    #[error("MBAP header shorter than 7 bytes (got {0})")]
    ShortHeader(usize),
    #[error("MBAP protocol id was {0}, expected 0")]
    BadProtocolId(u16),
    #[error("MBAP length field {claimed} does not match total frame length {actual}")]
    LengthMismatch { claimed: u16, actual: usize },
    #[error("MBAP data length {data_len} runs past the end of a {total}-byte buffer")]
    OutOfBounds { data_len: usize, total: usize },
    #[error("unsupported Modbus function code 0x{0:02X}")]
    BadFunc(u8),
    #[error("CRC mismatch: frame claimed 0x{claimed:04X}, computed 0x{computed:04X}")]
    CrcMismatch { claimed: u16, computed: u16 },
}

/// Faults raised while opening or (re)configuring a serial device (§4.2).
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to open serial device {path}: {source}")]
    OpenFailed { path: String, source: io::Error },
    #[error("failed to apply serial parameters to {path}: {source}")]
    ConfigureFailed { path: String, source: io::Error },
    #[error("uart index {0} is out of range")]
    IndexOutOfRange(usize),
    #[error("failed to register uart fd with the readiness selector: {0}")]
    SelectorError(io::Error),
}

/// Faults raised by the network manager (§4.3). All but `FatalInit` are
/// scoped to a single client slot or a single send/recv call.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("client slot {0} is not connected")]
    NotConnected(usize),
    #[error("client table is full, rejecting new connection")]
    TableFull,
    #[error("socket operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("failed to bind/listen on {addr}: {source}")]
    FatalInit { addr: String, source: io::Error },
}

/// Faults raised while loading and validating the configuration file (C6).
///
/// Always fatal to process init, per §7's *ConfigError* policy.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file {path} as YAML: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("uart index {0} is out of range (must be < {1})")]
    IndexOutOfRange(usize, usize),
    #[error("duplicate uart index {0}")]
    DuplicateIndex(usize),
    #[error("dev_path {path:?} is used by more than one enabled uart (indices {first} and {second})")]
    DuplicateDevPath {
        path: String,
        first: usize,
        second: usize,
    },
    #[error("uart {idx}: databit must be one of 5, 6, 7, 8 (got {value})")]
    InvalidDataBit { idx: usize, value: u8 },
    #[error("uart {idx}: stopbit must be 1 or 2 (got {value})")]
    InvalidStopBit { idx: usize, value: u8 },
    #[error("uart {idx}: parity must be one of N, E, O (got {value:?})")]
    InvalidParity { idx: usize, value: char },
}

/// Top-level error returned from process initialization; anything that
/// reaches `main` is fatal and maps to a non-zero exit code (§6).
#[derive(Debug, Error)]
pub enum FatalInitError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to initialize the serial device manager: {0}")]
    Device(#[from] DeviceError),
    #[error("failed to install the SIGINT handler: {0}")]
    SignalHandler(io::Error),
    #[error("failed to install the logger: {0}")]
    Logger(String),
}
