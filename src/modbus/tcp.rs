//! Whole-buffer MBAP parsing (§4.1, `parse_tcp_data`).
//!
//! The streaming RTU parser in [`crate::modbus::rtu`] is the primary
//! Modbus state machine; this module is the other documented variant
//! (whole-buffer rather than byte-streaming), used by the forwarder for
//! inbound network frames where the full datagram is already in hand.

use crate::error::CodecError;
use crate::modbus::frame::TcpFrame;

const MBAP_HEADER_LEN: usize = 7;

/// Parses a single MBAP-prefixed PDU out of `buf`.
///
/// `buf` must contain exactly one frame; trailing bytes beyond the declared
/// length are rejected as a length mismatch rather than silently ignored,
/// since the gateway never pipelines more than one PDU per receive.
pub fn parse_tcp_data(buf: &[u8]) -> Result<TcpFrame, CodecError> {
    if buf.len() < MBAP_HEADER_LEN {
        return Err(CodecError::ShortHeader(buf.len()));
    }

    let transaction_id = u16::from_be_bytes([buf[0], buf[1]]);
    let protocol_id = u16::from_be_bytes([buf[2], buf[3]]);
    let length = u16::from_be_bytes([buf[4], buf[5]]);

    if protocol_id != 0 {
        return Err(CodecError::BadProtocolId(protocol_id));
    }

    // The length field covers everything from the unit id onward, so the
    // whole buffer must be exactly 6 (transaction+protocol+length) bytes
    // longer than it.
    if length as usize + 6 != buf.len() {
        return Err(CodecError::LengthMismatch {
            claimed: length,
            actual: buf.len(),
        });
    }

    let slave_addr = buf[6];
    if buf.len() < MBAP_HEADER_LEN + 1 {
        return Err(CodecError::ShortHeader(buf.len()));
    }
    let func_code = buf[7];

    let data_len = (length as usize).saturating_sub(2);
    let data_start = 8;
    let data_end = data_start + data_len;
    if data_end > buf.len() {
        return Err(CodecError::OutOfBounds {
            data_len,
            total: buf.len(),
        });
    }

    Ok(TcpFrame {
        transaction_id,
        protocol_id,
        length,
        slave_addr,
        func_code,
        data: buf[data_start..data_end].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_frame() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        let frame = parse_tcp_data(&buf).unwrap();
        assert_eq!(frame.transaction_id, 1);
        assert_eq!(frame.protocol_id, 0);
        assert_eq!(frame.length, 6);
        assert_eq!(frame.slave_addr, 1);
        assert_eq!(frame.func_code, 3);
        assert_eq!(frame.data, vec![0x00, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn rejects_bad_protocol_id() {
        // §8: protocol_id=1 -> BadProtocolId
        let buf = [0x00, 0x01, 0x00, 0x01, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(parse_tcp_data(&buf), Err(CodecError::BadProtocolId(1)));
    }

    #[test]
    fn rejects_length_mismatch() {
        // §8: claims 7, has 6 -> LengthMismatch
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01];
        assert_eq!(
            parse_tcp_data(&buf),
            Err(CodecError::LengthMismatch {
                claimed: 7,
                actual: 12
            })
        );
    }

    #[test]
    fn rejects_short_header() {
        let buf = [0x00, 0x01, 0x00, 0x00, 0x00];
        assert_eq!(parse_tcp_data(&buf), Err(CodecError::ShortHeader(5)));
    }

    #[test]
    fn round_trips_to_wire_bytes() {
        let buf = [0x00, 0x05, 0x00, 0x00, 0x00, 0x06, 0x03, 0x10, 0xDE, 0xAD, 0xBE, 0xEF];
        let frame = parse_tcp_data(&buf).unwrap();
        assert_eq!(frame.to_wire_bytes(), buf);
    }
}
