//! Identifier decoder registry
//!
//! Maps a CAN identifier to the [`MessageDecoder`] that understands it. The
//! registry is built once and only read afterwards, so it can be shared across
//! threads by reference without locking.
//!
//! Every frame handed to [`DecoderRegistry::decode`] yields exactly one
//! [`DecodedRecord`]:
//! 1. Registered identifier, decoder succeeds → `Decoded`
//! 2. Registered identifier, decoder fails → `DecodeError`
//! 3. Unknown identifier → `Unrecognized` (raw frame preserved)

use crate::message_decoder::{MessageDecoder, Payload};
use crate::types::{CapturedFrame, DecodedRecord, Frame, Result};
use std::collections::HashMap;

/// Read-only lookup table from identifier to decoder
#[derive(Debug, Clone, Default)]
pub struct DecoderRegistry {
    decoders: HashMap<u16, MessageDecoder>,
}

impl DecoderRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every known decoder
    pub fn with_known_decoders() -> Self {
        let mut registry = Self::new();
        for decoder in MessageDecoder::ALL {
            registry.register(decoder);
        }
        registry
    }

    /// Register a decoder under its identifier, replacing any previous one
    pub fn register(&mut self, decoder: MessageDecoder) -> Option<MessageDecoder> {
        log::debug!("Registering {} (ID 0x{:03X})", decoder.name(), decoder.id());
        self.decoders.insert(decoder.id(), decoder)
    }

    /// Find the decoder for an identifier
    pub fn lookup(&self, id: u16) -> Option<MessageDecoder> {
        self.decoders.get(&id).copied()
    }

    /// Registered identifiers in ascending order
    pub fn known_ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.decoders.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.decoders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decoders.is_empty()
    }

    /// Decode a frame. Never fails: faults become `DecodeError` records.
    pub fn decode(&self, frame: &Frame) -> DecodedRecord {
        match self.lookup(frame.id) {
            Some(decoder) => self.run(decoder, frame.id, &frame.data),
            None => {
                log::trace!("Unknown CAN ID: 0x{:03X}, keeping raw frame", frame.id);
                DecodedRecord::Unrecognized { frame: *frame }
            }
        }
    }

    /// Decode a payload of arbitrary length for a known identifier.
    ///
    /// Returns `None` when no decoder is registered, since there is no frame
    /// to preserve.
    pub fn decode_payload(&self, id: u16, data: &[u8]) -> Option<DecodedRecord> {
        self.lookup(id).map(|decoder| self.run(decoder, id, data))
    }

    fn run(&self, decoder: MessageDecoder, id: u16, data: &[u8]) -> DecodedRecord {
        match decoder.decode(&Payload::new(id, data)) {
            Ok(message) => {
                log::debug!("Decoded {} (ID 0x{:03X})", message.name(), id);
                DecodedRecord::Decoded { id, message }
            }
            Err(e) => {
                log::warn!("Failed to decode 0x{:03X} as {}: {}", id, decoder.name(), e);
                DecodedRecord::DecodeError {
                    id,
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Iterator that decodes captured frames into records
///
/// Wraps any frame iterator (a live capture session or a replayed archive).
/// Frame-level errors such as malformed chunks pass through unchanged so the
/// caller still sees an account of every input chunk.
pub struct DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CapturedFrame>>,
{
    frame_iter: I,
    registry: &'a DecoderRegistry,
}

impl<'a, I> DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CapturedFrame>>,
{
    pub fn new(frame_iter: I, registry: &'a DecoderRegistry) -> Self {
        Self {
            frame_iter,
            registry,
        }
    }
}

impl<'a, I> Iterator for DecodingIterator<'a, I>
where
    I: Iterator<Item = Result<CapturedFrame>>,
{
    type Item = Result<(CapturedFrame, DecodedRecord)>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.frame_iter.next()?;
        Some(item.map(|captured| {
            let record = self.registry.decode(&captured.frame);
            (captured, record)
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{EngineRpm, VehicleMessage};
    use crate::types::{DecoderError, FieldValue, FrameError};

    fn frame(id: u16, data: [u8; 8]) -> Frame {
        Frame {
            id,
            rtr: false,
            length: 8,
            data,
        }
    }

    #[test]
    fn test_known_ids() {
        let registry = DecoderRegistry::with_known_decoders();
        assert_eq!(
            registry.known_ids(),
            vec![0x153, 0x1F0, 0x1F3, 0x1F5, 0x316, 0x329, 0x545, 0x613, 0x615]
        );
        assert_eq!(registry.lookup(0x316), Some(MessageDecoder::DmeRpm));
        assert_eq!(registry.lookup(0x7FF), None);
    }

    #[test]
    fn test_decode_known_frame() {
        let registry = DecoderRegistry::with_known_decoders();
        let record = registry.decode(&frame(0x316, [0, 0, 0x00, 0x40, 0, 0, 0, 0]));
        assert_eq!(
            record,
            DecodedRecord::Decoded {
                id: 0x316,
                message: VehicleMessage::EngineRpm(EngineRpm { rpm: 2560.0 }),
            }
        );
        assert_eq!(record.name(), Some("DME_RPM"));
        assert_eq!(record.get("RPM"), Some(FieldValue::Float(2560.0)));
    }

    #[test]
    fn test_unknown_id_is_preserved() {
        let registry = DecoderRegistry::with_known_decoders();
        let raw = frame(0x7FF, [9, 8, 7, 6, 5, 4, 3, 2]);
        let record = registry.decode(&raw);
        assert_eq!(record, DecodedRecord::Unrecognized { frame: raw });
    }

    #[test]
    fn test_empty_registry_recognizes_nothing() {
        let registry = DecoderRegistry::new();
        assert!(registry.is_empty());
        let record = registry.decode(&frame(0x316, [0; 8]));
        assert!(matches!(record, DecodedRecord::Unrecognized { .. }));
    }

    #[test]
    fn test_register_replaces_previous() {
        let mut registry = DecoderRegistry::new();
        assert_eq!(registry.register(MessageDecoder::IkeClimate), None);
        assert_eq!(
            registry.register(MessageDecoder::IkeClimate),
            Some(MessageDecoder::IkeClimate)
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_short_payload_becomes_decode_error() {
        let registry = DecoderRegistry::with_known_decoders();
        let record = registry.decode_payload(0x1F0, &[1, 2, 3]).unwrap();
        match record {
            DecodedRecord::DecodeError { id, reason } => {
                assert_eq!(id, 0x1F0);
                assert!(reason.contains("byte 3"), "reason: {}", reason);
            }
            other => panic!("expected decode error, got {:?}", other),
        }
        assert!(registry.decode_payload(0x7FF, &[0; 8]).is_none());
    }

    #[test]
    fn test_decode_is_idempotent() {
        let registry = DecoderRegistry::with_known_decoders();
        for id in registry.known_ids() {
            let f = frame(id, [0x80, 0x12, 0x34, 0x81, 0xFE, 0x7F, 0x05, 0xAA]);
            assert_eq!(registry.decode(&f), registry.decode(&f));
        }
    }

    #[test]
    fn test_decoding_iterator_passes_errors_through() {
        let registry = DecoderRegistry::with_known_decoders();
        let items: Vec<Result<CapturedFrame>> = vec![
            Ok(CapturedFrame::now(frame(0x615, [0x80, 0, 0, 129, 0, 0, 0, 0]))),
            Err(DecoderError::Frame(FrameError::WrongLength {
                expected: 11,
                actual: 5,
            })),
            Ok(CapturedFrame::now(frame(0x123, [0; 8]))),
        ];

        let out: Vec<_> = DecodingIterator::new(items.into_iter(), &registry).collect();
        assert_eq!(out.len(), 3);

        let (_, first) = out[0].as_ref().unwrap();
        assert_eq!(first.get("OutsideTemp_C"), Some(FieldValue::Integer(-1)));
        assert_eq!(first.get("AC_On"), Some(FieldValue::Boolean(true)));

        assert!(matches!(out[1], Err(DecoderError::Frame(_))));

        let (_, third) = out[2].as_ref().unwrap();
        assert!(matches!(third, DecodedRecord::Unrecognized { .. }));
    }
}
