//! Core types for the CAN capture decoder library
//!
//! This module defines the fundamental values that flow through the pipeline:
//! raw frames reconstructed from the serial wire format, the decoded records the
//! registry emits for them, and the error taxonomy shared by every stage.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::messages::VehicleMessage;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Size of one wire record: 2 id bytes, 1 header byte, 8 payload bytes
pub const WIRE_FRAME_LEN: usize = 11;

/// Size of the payload slot carried by every frame
pub const PAYLOAD_LEN: usize = 8;

/// A CAN frame as reconstructed from one 11-byte wire record.
///
/// `length` is metadata reported by the capture device. The payload slot is
/// always 8 bytes wide regardless of its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Frame {
    /// Raw identifier as sent by the device (not range-checked to 11 bits)
    pub id: u16,
    /// Remote-transmission-request flag
    pub rtr: bool,
    /// Declared payload length (0-15)
    pub length: u8,
    /// Payload bytes, copied verbatim
    pub data: [u8; PAYLOAD_LEN],
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "CANFrame(id=0x{:03X}, rtr={}, length={}, data=",
            self.id, self.rtr as u8, self.length
        )?;
        for (i, byte) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02x}", byte)?;
        }
        write!(f, ")")
    }
}

/// A frame together with the moment the capture session received it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedFrame {
    pub received_at: Timestamp,
    pub frame: Frame,
}

impl CapturedFrame {
    /// Stamp a frame with the current time
    pub fn now(frame: Frame) -> Self {
        Self {
            received_at: Utc::now(),
            frame,
        }
    }
}

/// Errors raised while turning raw bytes into a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Expected {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// Errors that can occur during capture and decoding
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Malformed chunk: {0}")]
    Frame(#[from] FrameError),

    #[error("Payload of 0x{id:03X} too short: byte {index} requested, {len} available")]
    PayloadTooShort { id: u16, index: usize, len: usize },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Field value types produced by the identifier decoders
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer value (raw counters, signed bytes)
    Integer(i64),
    /// Floating-point value (after scaling/offset)
    Float(f64),
    /// Boolean value (single-bit flags)
    Boolean(bool),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Boolean(v) => write!(f, "{}", if *v { "true" } else { "false" }),
        }
    }
}

impl FieldValue {
    /// Convert field value to f64 for plotting and tabulation
    pub fn as_f64(&self) -> f64 {
        match self {
            FieldValue::Integer(v) => *v as f64,
            FieldValue::Float(v) => *v,
            FieldValue::Boolean(v) => {
                if *v {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Boolean(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Integer(v)
    }
}

/// Outcome of running one frame through the decoder registry.
///
/// Every frame maps to exactly one record. Nothing is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedRecord {
    /// A registered decoder produced a typed message
    Decoded { id: u16, message: VehicleMessage },
    /// No decoder is registered for this identifier
    Unrecognized { frame: Frame },
    /// A registered decoder could not process the payload
    DecodeError { id: u16, reason: String },
}

impl DecodedRecord {
    /// Identifier of the frame this record came from
    pub fn id(&self) -> u16 {
        match self {
            DecodedRecord::Decoded { id, .. } => *id,
            DecodedRecord::Unrecognized { frame } => frame.id,
            DecodedRecord::DecodeError { id, .. } => *id,
        }
    }

    /// Message name tag, e.g. "ABS_WheelSpeed"
    pub fn name(&self) -> Option<&'static str> {
        match self {
            DecodedRecord::Decoded { message, .. } => Some(message.name()),
            _ => None,
        }
    }

    /// All decoded fields keyed by their stable names (empty for non-decoded records)
    pub fn fields(&self) -> Vec<(&'static str, FieldValue)> {
        match self {
            DecodedRecord::Decoded { message, .. } => message.fields(),
            _ => Vec::new(),
        }
    }

    /// Look up a single field by key
    pub fn get(&self, key: &str) -> Option<FieldValue> {
        self.fields()
            .into_iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value)
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, DecodedRecord::Decoded { .. })
    }
}

impl fmt::Display for DecodedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodedRecord::Decoded { id, message } => {
                write!(f, "0x{:03X} {}", id, message.name())?;
                for (key, value) in message.fields() {
                    write!(f, " {}={}", key, value)?;
                }
                Ok(())
            }
            DecodedRecord::Unrecognized { frame } => write!(f, "unrecognized {}", frame),
            DecodedRecord::DecodeError { id, reason } => {
                write!(f, "0x{:03X} decode error: {}", id, reason)
            }
        }
    }
}
