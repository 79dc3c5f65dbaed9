//! Frame archive (JSON Lines)
//!
//! One `CapturedFrame` per line. Lines are flushed as they are written so an
//! interrupted capture keeps everything up to the last complete frame.

use anyhow::{Context, Result};
use can_capture_decoder::CapturedFrame;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Streaming archive sink
pub struct ArchiveWriter<W: Write> {
    writer: W,
    written: usize,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Open an archive for appending, creating it if needed
    pub fn create(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open archive: {:?}", path))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ArchiveWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0 }
    }

    pub fn append(&mut self, frame: &CapturedFrame) -> Result<()> {
        serde_json::to_writer(&mut self.writer, frame).context("Failed to serialize frame")?;
        self.writer.write_all(b"\n")?;
        self.writer.flush().context("Failed to flush archive")?;
        self.written += 1;
        Ok(())
    }

    /// Frames written through this writer
    pub fn written(&self) -> usize {
        self.written
    }
}

/// Read every frame from an archive, skipping blank lines
pub fn read_archive(path: &Path) -> Result<Vec<CapturedFrame>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open archive: {:?}", path))?;
    read_frames(BufReader::new(file)).with_context(|| format!("Failed to read archive: {:?}", path))
}

fn read_frames<R: BufRead>(reader: R) -> Result<Vec<CapturedFrame>> {
    let mut frames = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: CapturedFrame = serde_json::from_str(&line)
            .with_context(|| format!("Invalid frame on line {}", index + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;
    use can_capture_decoder::Frame;

    fn captured(id: u16) -> CapturedFrame {
        CapturedFrame::now(Frame {
            id,
            rtr: false,
            length: 8,
            data: [1, 2, 3, 4, 5, 6, 7, 8],
        })
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");

        let mut writer = ArchiveWriter::create(&path).unwrap();
        writer.append(&captured(0x316)).unwrap();
        writer.append(&captured(0x1F0)).unwrap();
        assert_eq!(writer.written(), 2);
        drop(writer);

        let frames = read_archive(&path).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].frame.id, 0x316);
        assert_eq!(frames[1].frame.data, [1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_create_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frames.jsonl");

        ArchiveWriter::create(&path).unwrap().append(&captured(1)).unwrap();
        ArchiveWriter::create(&path).unwrap().append(&captured(2)).unwrap();

        assert_eq!(read_archive(&path).unwrap().len(), 2);
    }

    #[test]
    fn test_invalid_line_reports_line_number() {
        let input = "\n{not json}\n";
        let err = read_frames(input.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }
}
