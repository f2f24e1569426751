//! RTU ↔ TCP conversion and exception-frame construction (§4.1).

use crate::error::CodecError;
use crate::modbus::crc::crc16;
use crate::modbus::frame::{RtuFrame, TcpFrame};

/// Converts an RTU frame (CRC already verified by the caller) into a TCP
/// frame under the given transaction id. The CRC is dropped; MBAP framing
/// carries length instead.
pub fn rtu_to_tcp(rtu: &RtuFrame, transaction_id: u16) -> TcpFrame {
    TcpFrame {
        transaction_id,
        protocol_id: 0,
        length: 2 + rtu.data.len() as u16,
        slave_addr: rtu.slave_addr,
        func_code: rtu.func_code,
        data: rtu.data.clone(),
    }
}

/// Converts a TCP frame into an RTU frame, computing a fresh CRC. No
/// addressing policy is applied here; the forwarder decides whether
/// `slave_addr` maps to a live UART.
pub fn tcp_to_rtu(tcp: &TcpFrame) -> Result<RtuFrame, CodecError> {
    let mut check = Vec::with_capacity(2 + tcp.data.len());
    check.push(tcp.slave_addr);
    check.push(tcp.func_code);
    check.extend_from_slice(&tcp.data);
    let crc = crc16(&check)?;

    Ok(RtuFrame {
        slave_addr: tcp.slave_addr,
        func_code: tcp.func_code,
        data: tcp.data.clone(),
        crc,
    })
}

/// Builds a Modbus exception response frame (func code with the high bit
/// set, single-byte exception code payload, freshly computed CRC).
pub fn build_exception(slave_addr: u8, func_code: u8, exception_code: u8) -> RtuFrame {
    let func_code = func_code | 0x80;
    let data = vec![exception_code];
    let crc = crc16(&[slave_addr, func_code, exception_code])
        .expect("three-byte input is never empty");

    RtuFrame {
        slave_addr,
        func_code,
        data,
        crc,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tcp_rtu_tcp_round_trip_preserves_fields() {
        let original = TcpFrame {
            transaction_id: 0x1234,
            protocol_id: 0,
            length: 6,
            slave_addr: 0x11,
            func_code: 0x03,
            data: vec![0x00, 0x00, 0x00, 0x0A],
        };

        let rtu = tcp_to_rtu(&original).unwrap();
        let back = rtu_to_tcp(&rtu, original.transaction_id);

        assert_eq!(back.slave_addr, original.slave_addr);
        assert_eq!(back.func_code, original.func_code);
        assert_eq!(back.data, original.data);
        assert_eq!(back.length, original.length);
        assert_eq!(back.protocol_id, original.protocol_id);
        assert_eq!(back.transaction_id, original.transaction_id);
    }

    #[test]
    fn exception_frame_sets_high_bit_and_valid_crc() {
        let frame = build_exception(0x05, 0x03, 0x02);
        assert_eq!(frame.func_code, 0x83);
        assert_eq!(frame.data, vec![0x02]);
        let wire = frame.to_wire_bytes();
        assert!(crate::modbus::crc::verify(&wire));
    }
}
