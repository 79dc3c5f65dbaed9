//! Bitfield extraction primitives
//!
//! Small total functions shared by the identifier decoders: nibble extraction,
//! two's-complement reinterpretation of a byte, little-endian composition of
//! two bytes and single-bit flag tests.

use byteorder::{ByteOrder, LittleEndian};

/// Extract the high or low 4 bits of a byte
pub fn unsigned_nibble(byte: u8, high: bool) -> u8 {
    if high {
        byte >> 4
    } else {
        byte & 0x0F
    }
}

/// Reinterpret an unsigned byte as a signed two's-complement value.
///
/// Equivalent to `((value + 128) mod 256) - 128`.
pub fn signed_byte_wrap(value: u8) -> i8 {
    value as i8
}

/// Compose a 16-bit value from its low and high bytes
pub fn combine_le(low_byte: u8, high_byte: u8) -> u16 {
    LittleEndian::read_u16(&[low_byte, high_byte])
}

/// Test a single bit of a byte (bit 0 = LSB)
pub fn bit(byte: u8, index: u8) -> bool {
    (byte >> index) & 0x01 != 0
}

/// Round to a fixed number of decimals the way the value would print.
///
/// Goes through the decimal representation so that e.g. 2.675 rounds on its
/// exact binary value instead of the scaled product.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}
