//! Wire frame decoder
//!
//! The capture device emits fixed 11-byte little-endian records:
//!
//! ```text
//! | id_raw: u16 | header: u8 | payload: [u8; 8] |
//! header bit 0    = rtr
//! header bits 1-4 = length
//! header bits 5-7 = reserved (ignored)
//! ```

use crate::types::{Frame, FrameError, PAYLOAD_LEN, WIRE_FRAME_LEN};
use byteorder::{ByteOrder, LittleEndian};

const RTR_MASK: u8 = 0b0000_0001;
const LENGTH_SHIFT: u8 = 1;
const LENGTH_MASK: u8 = 0b1111;

/// Frame decoder - turns one wire record into a [`Frame`]
pub struct FrameDecoder;

impl FrameDecoder {
    /// Decode exactly one 11-byte wire record.
    ///
    /// The identifier is taken as-is. Callers needing strict 11-bit validation
    /// must check `frame.id <= 0x7FF` themselves.
    pub fn decode(raw: &[u8]) -> Result<Frame, FrameError> {
        if raw.len() != WIRE_FRAME_LEN {
            return Err(FrameError::WrongLength {
                expected: WIRE_FRAME_LEN,
                actual: raw.len(),
            });
        }

        let id = LittleEndian::read_u16(&raw[0..2]);
        let header = raw[2];
        let mut data = [0u8; PAYLOAD_LEN];
        data.copy_from_slice(&raw[3..WIRE_FRAME_LEN]);

        Ok(Frame {
            id,
            rtr: header & RTR_MASK != 0,
            length: (header >> LENGTH_SHIFT) & LENGTH_MASK,
            data,
        })
    }
}

impl Frame {
    /// Encode this frame back into its 11-byte wire layout (reserved bits zero)
    pub fn to_bytes(&self) -> [u8; WIRE_FRAME_LEN] {
        let mut raw = [0u8; WIRE_FRAME_LEN];
        LittleEndian::write_u16(&mut raw[0..2], self.id);
        raw[2] = (self.rtr as u8 & RTR_MASK) | ((self.length & LENGTH_MASK) << LENGTH_SHIFT);
        raw[3..].copy_from_slice(&self.data);
        raw
    }
}

impl TryFrom<&[u8]> for Frame {
    type Error = FrameError;

    fn try_from(raw: &[u8]) -> Result<Self, Self::Error> {
        FrameDecoder::decode(raw)
    }
}
