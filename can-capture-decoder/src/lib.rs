//! CAN Capture Decoder Library
//!
//! Decodes CAN frames captured over a serial link into typed vehicle messages.
//!
//! # Architecture
//!
//! Data flows through the library in one direction:
//!
//! ```text
//! ByteSource → CaptureSession → Frame → DecoderRegistry → DecodedRecord
//! ```
//!
//! - [`FrameDecoder`] turns one 11-byte wire record into a [`Frame`]
//! - [`bits`] holds the nibble/sign/endianness primitives the decoders share
//! - [`DecoderRegistry`] maps identifiers to [`MessageDecoder`] strategies
//! - [`CaptureSession`] reads a byte source, tolerating timeouts and malformed
//!   chunks, until end of stream or cancellation
//!
//! The library does NOT:
//! - Open or configure serial ports
//! - Define a storage format for captured frames
//! - Plot or display anything
//!
//! # Example Usage
//!
//! ```
//! use can_capture_decoder::{
//!     CaptureConfig, CaptureSession, DecoderRegistry, DecodingIterator, ScriptedSource,
//! };
//!
//! let wire = vec![0x16, 0x03, 0x10, 0, 0, 0x00, 0x40, 0, 0, 0, 0];
//! let source = ScriptedSource::new(vec![wire, vec![1, 2, 3]]);
//! let session = CaptureSession::new(source, CaptureConfig::new());
//! let registry = DecoderRegistry::with_known_decoders();
//!
//! for item in DecodingIterator::new(session, &registry) {
//!     match item {
//!         Ok((_, record)) => println!("{}", record),
//!         Err(e) => eprintln!("Skipped: {}", e),
//!     }
//! }
//! ```

// Public modules
pub mod bits;
pub mod config;
pub mod frame;
pub mod histogram;
pub mod message_decoder;
pub mod messages;
pub mod registry;
pub mod session;
pub mod source;
pub mod types;

// Re-export main types for convenience
pub use config::CaptureConfig;
pub use frame::FrameDecoder;
pub use histogram::IdHistogram;
pub use message_decoder::{MessageDecoder, Payload};
pub use messages::VehicleMessage;
pub use registry::{DecoderRegistry, DecodingIterator};
pub use session::{CancelToken, CaptureSession, CaptureStats, CaptureSummary};
pub use source::{ByteSource, ReaderSource, ScriptedSource};
pub use types::{
    CapturedFrame, DecodedRecord, DecoderError, FieldValue, Frame, FrameError, Result,
    Timestamp, PAYLOAD_LEN, WIRE_FRAME_LEN,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
