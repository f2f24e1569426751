//! Configuration data model and loader (C6).
//!
//! Grounded in `examples/original_source/src/uart/uart_mgr.c`'s YAML event
//! parser: the wire format is a top-level `uart_list` sequence of mappings
//! with exactly the field names reproduced below. The parser itself is
//! swapped for `serde_yaml`, the idiomatic choice the rest of the pack
//! converges on (see `examples/other_examples/manifests/aljen-modbus-relay`).

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;

/// Maximum number of UART slots a manager can hold (`MAX_UART_NUM` in the
/// original source).
pub const MAX_UART: usize = 17;

/// Maximum number of simultaneously connected TCP clients.
pub const MAX_CLIENT_NUM: usize = 4;

fn default_tcp_port() -> u16 {
    8888
}

fn default_udp_port() -> u16 {
    8889
}

fn default_log_path() -> PathBuf {
    PathBuf::from("/var/log/serial-gateway.log")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_frame_timeout_ms() -> u64 {
    100
}

/// One UART's static configuration (§3 `UartConfig`).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UartConfig {
    pub idx: usize,
    pub dev_path: String,
    pub baudrate: u32,
    pub databit: u8,
    pub stopbit: u8,
    pub parity: char,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub flow_ctrl: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub enable: bool,
    #[serde(deserialize_with = "bool_from_int_or_bool")]
    pub modbus_enable: bool,
}

/// The config file accepts both YAML booleans and the original source's
/// `0`/`1` integers for these fields, since `examples/original_source`
/// writes them as integers.
fn bool_from_int_or_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrInt {
        Bool(bool),
        Int(i64),
    }

    match BoolOrInt::deserialize(deserializer)? {
        BoolOrInt::Bool(b) => Ok(b),
        BoolOrInt::Int(i) => Ok(i != 0),
    }
}

/// Top-level configuration document (C6, new in SPEC_FULL).
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    pub uart_list: Vec<UartConfig>,
    #[serde(default = "default_tcp_port")]
    pub tcp_port: u16,
    #[serde(default = "default_udp_port")]
    pub udp_port: u16,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_frame_timeout_ms")]
    pub frame_timeout_ms: u64,
}

impl GatewayConfig {
    /// Validates the invariants spec.md §3 places on the `UartConfig` set:
    /// indices in range and unique, enabled devices never sharing a path,
    /// and each entry's field values within their legal domains.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen_idx: HashMap<usize, usize> = HashMap::new();
        let mut seen_path: HashMap<&str, usize> = HashMap::new();

        for (pos, uart) in self.uart_list.iter().enumerate() {
            if uart.idx >= MAX_UART {
                return Err(ConfigError::IndexOutOfRange(uart.idx, MAX_UART));
            }
            if seen_idx.contains_key(&uart.idx) {
                return Err(ConfigError::DuplicateIndex(uart.idx));
            }
            seen_idx.insert(uart.idx, pos);

            if !matches!(uart.databit, 5 | 6 | 7 | 8) {
                return Err(ConfigError::InvalidDataBit {
                    idx: uart.idx,
                    value: uart.databit,
                });
            }
            if !matches!(uart.stopbit, 1 | 2) {
                return Err(ConfigError::InvalidStopBit {
                    idx: uart.idx,
                    value: uart.stopbit,
                });
            }
            if !matches!(uart.parity, 'N' | 'E' | 'O') {
                return Err(ConfigError::InvalidParity {
                    idx: uart.idx,
                    value: uart.parity,
                });
            }

            if uart.enable {
                if let Some(&other_idx) = seen_path.get(uart.dev_path.as_str()) {
                    return Err(ConfigError::DuplicateDevPath {
                        path: uart.dev_path.clone(),
                        first: other_idx,
                        second: uart.idx,
                    });
                }
                seen_path.insert(uart.dev_path.as_str(), uart.idx);
            }
        }

        Ok(())
    }
}

/// Loads and validates a [`GatewayConfig`] from a YAML file at `path`.
pub fn load_config(path: impl AsRef<Path>) -> Result<GatewayConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: GatewayConfig =
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    config.validate()?;
    Ok(config)
}

/// Maps a `baudrate` value to a value the serial manager recognizes,
/// falling back to 115200 for anything not in the closed lookup table
/// (§3, §4.2). Unknown values are accepted here and resolved at the point
/// the serial manager opens the device, not at config-validation time.
pub fn normalize_baudrate(baudrate: u32) -> u32 {
    const KNOWN: &[u32] = &[
        50, 75, 110, 134, 150, 200, 300, 600, 1200, 1800, 2400, 4800, 9600, 19200, 38400, 57600,
        115200, 230400, 460800, 500000, 576000, 921600, 1000000,
    ];
    if KNOWN.contains(&baudrate) {
        baudrate
    } else {
        115200
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uart(idx: usize, dev_path: &str, enable: bool) -> UartConfig {
        UartConfig {
            idx,
            dev_path: dev_path.to_string(),
            baudrate: 115200,
            databit: 8,
            stopbit: 1,
            parity: 'N',
            flow_ctrl: false,
            enable,
            modbus_enable: false,
        }
    }

    #[test]
    fn parses_minimal_document() {
        let yaml = r#"
uart_list:
  - idx: 0
    dev_path: /dev/ttyS0
    baudrate: 115200
    databit: 8
    stopbit: 1
    parity: N
    flow_ctrl: 0
    enable: true
    modbus_enable: true
"#;
        let config: GatewayConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.uart_list.len(), 1);
        assert_eq!(config.tcp_port, 8888);
        assert_eq!(config.udp_port, 8889);
        assert!(config.uart_list[0].modbus_enable);
        config.validate().unwrap();
    }

    #[test]
    fn rejects_duplicate_idx() {
        let config = GatewayConfig {
            uart_list: vec![uart(0, "/dev/ttyS0", true), uart(0, "/dev/ttyS1", true)],
            tcp_port: 8888,
            udp_port: 8889,
            log_path: default_log_path(),
            log_level: default_log_level(),
            frame_timeout_ms: 100,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateIndex(0))
        ));
    }

    #[test]
    fn rejects_shared_dev_path_between_enabled_entries() {
        let config = GatewayConfig {
            uart_list: vec![uart(0, "/dev/ttyS0", true), uart(1, "/dev/ttyS0", true)],
            tcp_port: 8888,
            udp_port: 8889,
            log_path: default_log_path(),
            log_level: default_log_level(),
            frame_timeout_ms: 100,
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateDevPath { .. })
        ));
    }

    #[test]
    fn allows_shared_dev_path_when_one_entry_disabled() {
        let config = GatewayConfig {
            uart_list: vec![uart(0, "/dev/ttyS0", true), uart(1, "/dev/ttyS0", false)],
            tcp_port: 8888,
            udp_port: 8889,
            log_path: default_log_path(),
            log_level: default_log_level(),
            frame_timeout_ms: 100,
        };
        config.validate().unwrap();
    }

    #[test]
    fn unknown_baudrate_falls_back_to_115200() {
        assert_eq!(normalize_baudrate(123456), 115200);
        assert_eq!(normalize_baudrate(9600), 9600);
    }
}
