//! Forwarding core (C4): wires C1–C3 together with the bit-exact header
//! shaping spec.md §4.4/§6 specifies in each direction.

use std::time::Duration;

use crate::control::GatewayControl;
use crate::modbus::{self, RtuFrame};

/// Fixed transaction id used for the synthetic/promoted outbound MBAP
/// envelope (§4.4: "fixed transaction id 0x0001").
const OUTBOUND_TRANSACTION_ID: [u8; 2] = [0x00, 0x01];
/// Function code stamped on the non-Modbus synthetic wrapper (§6).
const SYNTHETIC_FUNC_CODE: u8 = 0x03;
/// Sleep between network→serial fan-out passes (§4.4).
const FANOUT_SLEEP: Duration = Duration::from_millis(10);

/// Shapes one serial read into its outbound wire form (§4.4, §6).
///
/// `idx` is the originating UART's configured index (the MBAP unit id);
/// `raw` is exactly what the serial device manager read this cycle.
pub fn shape_outbound(idx: usize, modbus_enable: bool, raw: &[u8]) -> Vec<u8> {
    let l = raw.len();
    let unit_id = idx as u8;

    if modbus_enable && l >= 4 {
        // Strip the leading addr/func and the trailing two CRC bytes;
        // promote the serial payload's own function code byte.
        let data = &raw[2..l - 2];
        let length = (l - 2) as u16;
        let mut out = Vec::with_capacity(7 + 1 + data.len());
        out.extend_from_slice(&OUTBOUND_TRANSACTION_ID);
        out.extend_from_slice(&[0x00, 0x00]);
        out.extend_from_slice(&length.to_be_bytes());
        out.push(unit_id);
        out.push(raw[1]);
        out.extend_from_slice(data);
        out
    } else {
        // Synthetic MBAP wrapper; length field is a single truncated byte
        // per §9's documented known limitation for payloads over 255 bytes.
        let mut out = Vec::with_capacity(8 + l);
        out.extend_from_slice(&OUTBOUND_TRANSACTION_ID);
        out.extend_from_slice(&[0x00, 0x00]);
        out.push(0x00);
        out.push(l as u8);
        out.push(unit_id);
        out.push(SYNTHETIC_FUNC_CODE);
        out.extend_from_slice(raw);
        out
    }
}

/// Shapes a network-sourced RTU frame into what gets written to the
/// target UART, per the wire formats in §6.
pub fn shape_inbound(frame: &RtuFrame, modbus_enable: bool) -> Vec<u8> {
    if modbus_enable {
        frame.to_wire_bytes()
    } else {
        frame.data.clone()
    }
}

/// Runs the serial→network direction: every byte read from an enabled
/// UART is shaped and broadcast to all connected TCP clients. Blocks
/// until `control`'s running flag clears.
pub fn run_serial_to_network(control: &GatewayControl) {
    control.uart_mgr.run(control.running_flag(), |event| {
        let wire = shape_outbound(event.idx, event.modbus_enable, &event.data);
        control.net_mgr.broadcast_tcp(&wire);
    });
}

/// Runs the network→serial direction: polls every client slot for
/// inbound MBAP frames, converts to RTU, and routes by slave address to
/// the matching UART. Runs until `control`'s running flag clears.
pub fn run_network_to_serial(control: &GatewayControl) {
    use crate::config::MAX_CLIENT_NUM;

    let mut buf = [0u8; 4096];
    while control.is_running() {
        for idx in 0..MAX_CLIENT_NUM {
            match control.net_mgr.recv_tcp(idx, &mut buf) {
                Ok(0) => continue,
                Ok(n) => handle_inbound(control, &buf[..n]),
                Err(_) => continue,
            }
        }
        std::thread::sleep(FANOUT_SLEEP);
    }
}

fn handle_inbound(control: &GatewayControl, data: &[u8]) {
    let tcp_frame = match modbus::parse_tcp_data(data) {
        Ok(frame) => frame,
        Err(e) => {
            log::debug!("dropping inbound frame: {e}");
            return;
        }
    };

    let rtu_frame = match modbus::tcp_to_rtu(&tcp_frame) {
        Ok(frame) => frame,
        Err(e) => {
            log::debug!("dropping inbound frame during conversion: {e}");
            return;
        }
    };

    let uart_idx = rtu_frame.slave_addr as usize;
    if !control.uart_mgr.is_open(uart_idx) {
        log::debug!("dropping frame routed to unopened uart {uart_idx}");
        return;
    }

    let modbus_enable = control.uart_mgr.is_modbus_enabled(uart_idx);
    let wire = shape_inbound(&rtu_frame, modbus_enable);
    if let Err(e) = control.uart_mgr.write(uart_idx, &wire) {
        log::warn!("uart {uart_idx} write failed: {e}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_modbus_pass_through_matches_wire_format() {
        let raw = b"hello!";
        let wire = shape_outbound(3, false, raw);
        let mut expected = vec![0x00, 0x01, 0x00, 0x00, 0x00, raw.len() as u8, 0x03, 0x03];
        expected.extend_from_slice(raw);
        assert_eq!(wire, expected);
    }

    #[test]
    fn modbus_enabled_strips_addr_func_and_crc() {
        // addr func data... crc_lo crc_hi
        let raw = [0x01u8, 0x03, 0xAA, 0xBB, 0xCC, 0xDD];
        let wire = shape_outbound(7, true, &raw);
        let expected_len = (raw.len() - 2) as u16;
        assert_eq!(&wire[0..4], &[0x00, 0x01, 0x00, 0x00]);
        assert_eq!(&wire[4..6], &expected_len.to_be_bytes());
        assert_eq!(wire[6], 7);
        assert_eq!(wire[7], 0x03);
        assert_eq!(&wire[8..], &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn inbound_modbus_enabled_includes_framing() {
        let frame = RtuFrame {
            slave_addr: 0x11,
            func_code: 0x06,
            data: vec![0x00, 0x01],
            crc: 0xBEEF,
        };
        let wire = shape_inbound(&frame, true);
        assert_eq!(wire, frame.to_wire_bytes());
    }

    #[test]
    fn inbound_non_modbus_strips_framing() {
        let frame = RtuFrame {
            slave_addr: 0x11,
            func_code: 0x06,
            data: vec![0x00, 0x01],
            crc: 0xBEEF,
        };
        let wire = shape_inbound(&frame, false);
        assert_eq!(wire, frame.data);
    }
}
