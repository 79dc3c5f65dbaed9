//! Run summaries printed at the end of a capture or replay

use can_capture_decoder::{CaptureStats, DecodedRecord};
use std::collections::HashMap;

/// Outcome counts over a sequence of decoded records
#[derive(Debug, Default)]
pub struct DecodeReport {
    pub decoded: usize,
    pub unrecognized: usize,
    pub decode_errors: usize,
    pub by_message: HashMap<&'static str, usize>,
}

impl DecodeReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, record: &DecodedRecord) {
        match record {
            DecodedRecord::Decoded { message, .. } => {
                self.decoded += 1;
                *self.by_message.entry(message.name()).or_insert(0) += 1;
            }
            DecodedRecord::Unrecognized { .. } => self.unrecognized += 1,
            DecodedRecord::DecodeError { .. } => self.decode_errors += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.decoded + self.unrecognized + self.decode_errors
    }

    pub fn print_summary(&self) {
        println!("\n=== DECODING SUMMARY ===");
        println!("Records: {}", self.total());
        println!("Decoded: {}", self.decoded);
        println!("Unrecognized: {}", self.unrecognized);
        println!("Decode errors: {}", self.decode_errors);

        if !self.by_message.is_empty() {
            println!("\nMessages:");
            let mut sorted: Vec<_> = self.by_message.iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (name, count) in sorted {
                println!("  {}: {}", name, count);
            }
        }
    }
}

pub fn print_capture_stats(stats: &CaptureStats) {
    println!("\n=== CAPTURE SUMMARY ===");
    println!("Frames: {}", stats.frames);
    println!("Malformed chunks: {}", stats.malformed);
    println!("Empty reads: {}", stats.timeouts);
    if stats.filtered > 0 {
        println!("Filtered out: {}", stats.filtered);
    }
}
