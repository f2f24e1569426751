//! Per-slot runtime record (§3 `UartDev`).

use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits, TTYPort};

use crate::config::UartConfig;
use crate::error::DeviceError;

fn data_bits(n: u8) -> DataBits {
    match n {
        5 => DataBits::Five,
        6 => DataBits::Six,
        7 => DataBits::Seven,
        _ => DataBits::Eight,
    }
}

fn stop_bits(n: u8) -> StopBits {
    match n {
        2 => StopBits::Two,
        _ => StopBits::One,
    }
}

fn parity(c: char) -> Parity {
    match c {
        'E' => Parity::Even,
        'O' => Parity::Odd,
        _ => Parity::None,
    }
}

fn flow_control(enabled: bool) -> FlowControl {
    if enabled {
        FlowControl::Hardware
    } else {
        FlowControl::None
    }
}

fn open_port(config: &UartConfig) -> Result<TTYPort, DeviceError> {
    let baud = crate::config::normalize_baudrate(config.baudrate);

    let builder = serialport::new(&config.dev_path, baud)
        .data_bits(data_bits(config.databit))
        .stop_bits(stop_bits(config.stopbit))
        .parity(parity(config.parity))
        .flow_control(flow_control(config.flow_ctrl))
        .timeout(Duration::from_millis(0));

    let mut port = builder.open_native().map_err(|e| DeviceError::OpenFailed {
        path: config.dev_path.clone(),
        source: std::io::Error::new(std::io::ErrorKind::Other, e),
    })?;

    port.clear(serialport::ClearBuffer::All)
        .map_err(|e| DeviceError::ConfigureFailed {
            path: config.dev_path.clone(),
            source: std::io::Error::new(std::io::ErrorKind::Other, e),
        })?;

    Ok(port)
}

/// A single open (or about-to-be-opened) serial device plus its
/// statistics, exclusively owned by [`super::UartMgr`].
pub struct UartDev {
    pub(super) port: TTYPort,
    pub config: UartConfig,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_count: u64,
}

impl UartDev {
    pub(super) fn open(config: &UartConfig) -> Result<Self, DeviceError> {
        let port = open_port(config)?;
        Ok(Self {
            port,
            config: config.clone(),
            rx_bytes: 0,
            tx_bytes: 0,
            err_count: 0,
        })
    }

    pub(super) fn reconfigure(&mut self, config: &UartConfig) -> Result<(), DeviceError> {
        let baud = crate::config::normalize_baudrate(config.baudrate);
        self.port
            .set_baud_rate(baud)
            .and_then(|_| self.port.set_data_bits(data_bits(config.databit)))
            .and_then(|_| self.port.set_stop_bits(stop_bits(config.stopbit)))
            .and_then(|_| self.port.set_parity(parity(config.parity)))
            .and_then(|_| self.port.set_flow_control(flow_control(config.flow_ctrl)))
            .map_err(|e| DeviceError::ConfigureFailed {
                path: config.dev_path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::Other, e),
            })?;
        self.config = config.clone();
        Ok(())
    }

    pub(super) fn as_raw_fd(&self) -> RawFd {
        self.port.as_raw_fd()
    }

    pub fn status(&self) -> UartStatus {
        UartStatus {
            idx: self.config.idx,
            dev_path: self.config.dev_path.clone(),
            modbus_enable: self.config.modbus_enable,
            rx_bytes: self.rx_bytes,
            tx_bytes: self.tx_bytes,
            err_count: self.err_count,
        }
    }
}

/// A read-only snapshot of a slot, safe to hand to the admin surface.
#[derive(Debug, Clone)]
pub struct UartStatus {
    pub idx: usize,
    pub dev_path: String,
    pub modbus_enable: bool,
    pub rx_bytes: u64,
    pub tx_bytes: u64,
    pub err_count: u64,
}
