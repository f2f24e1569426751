//! Frame value types (§3: `ModbusRTUFrame`, `ModbusTCPFrame`).

/// A parsed or about-to-be-sent Modbus RTU frame.
///
/// `crc` is only meaningful for a frame that came off the wire (or is about
/// to go on it); frames produced purely as an intermediate TCP→RTU step
/// carry a freshly computed CRC, never a stale one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtuFrame {
    pub slave_addr: u8,
    pub func_code: u8,
    pub data: Vec<u8>,
    pub crc: u16,
}

impl RtuFrame {
    /// Serializes as it would appear on the wire: addr, func, data, then
    /// CRC low byte first (§4.1's byte-swapped register).
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(4 + self.data.len());
        out.push(self.slave_addr);
        out.push(self.func_code);
        out.extend_from_slice(&self.data);
        out.extend_from_slice(&self.crc.to_le_bytes());
        out
    }
}

/// A parsed or about-to-be-sent Modbus TCP (MBAP + PDU) frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpFrame {
    pub transaction_id: u16,
    pub protocol_id: u16,
    pub length: u16,
    pub slave_addr: u8,
    pub func_code: u8,
    pub data: Vec<u8>,
}

impl TcpFrame {
    /// Serializes the full MBAP-prefixed PDU.
    pub fn to_wire_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(7 + self.data.len());
        out.extend_from_slice(&self.transaction_id.to_be_bytes());
        out.extend_from_slice(&self.protocol_id.to_be_bytes());
        out.extend_from_slice(&self.length.to_be_bytes());
        out.push(self.slave_addr);
        out.push(self.func_code);
        out.extend_from_slice(&self.data);
        out
    }
}
