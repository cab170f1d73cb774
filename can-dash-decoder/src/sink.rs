//! Decode event log sink
//!
//! Append-only text recorder for successfully decoded frames. The header line
//! is written once when the sink is created, then one pipe-separated line per
//! record, flushed immediately:
//!
//! ```text
//! TIMESTAMP | CAN_ID | DLC | DATA | SIGNAL | VALUE | STATUS
//! 2026-10-19 14:31:02 | 0x101 | 2 | 13 88 | Motor_RPM | 5000.00 rpm | OK
//! ```

use crate::types::{Frame, Result};
use chrono::Local;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Header line emitted once per sink
pub const LOG_HEADER: &str = "TIMESTAMP | CAN_ID | DLC | DATA | SIGNAL | VALUE | STATUS";

/// One decoded frame handed to the sink
#[derive(Debug, Clone, Copy)]
pub struct DecodeRecord<'a> {
    pub frame: &'a Frame,
    pub signal_name: &'a str,
    pub value: f64,
    pub unit: &'a str,
    pub warning: bool,
}

/// Destination of decode records
pub trait FrameLogSink: Send {
    /// Append one record; failures are reported by the sink itself
    fn record(&mut self, record: &DecodeRecord<'_>);
}

/// Sink that discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl FrameLogSink for NullSink {
    fn record(&mut self, _record: &DecodeRecord<'_>) {}
}

/// Text sink writing to any `Write` implementation
pub struct TextLogSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> TextLogSink<W> {
    /// Wrap a writer and emit the header line
    pub fn new(mut writer: W) -> Result<Self> {
        writeln!(writer, "{}", LOG_HEADER)?;
        writer.flush()?;
        Ok(Self { writer })
    }

    /// Recover the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_record(&mut self, record: &DecodeRecord<'_>) -> std::io::Result<()> {
        let frame = record.frame;
        let timestamp = frame.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");

        write!(self.writer, "{} | 0x{:03X} | {} | ", timestamp, frame.can_id, frame.dlc)?;
        for byte in frame.declared_data() {
            write!(self.writer, "{:02X} ", byte)?;
        }
        writeln!(
            self.writer,
            "| {} | {:.2} {} | {}",
            record.signal_name,
            record.value,
            record.unit,
            if record.warning { "WARNING" } else { "OK" }
        )?;
        self.writer.flush()
    }
}

impl<W: Write + Send> FrameLogSink for TextLogSink<W> {
    fn record(&mut self, record: &DecodeRecord<'_>) {
        if let Err(e) = self.write_record(record) {
            log::warn!("Failed to write decode log record: {}", e);
        }
    }
}

impl TextLogSink<BufWriter<File>> {
    /// Create (truncate) a log file and write the header
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

/// Open a file sink, falling back to a no-op sink if the file cannot be created
pub fn open_file_sink(path: &Path) -> Box<dyn FrameLogSink> {
    match TextLogSink::<BufWriter<File>>::create(path) {
        Ok(sink) => {
            log::info!("Logging decoded frames to {:?}", path);
            Box::new(sink)
        }
        Err(e) => {
            log::warn!("Cannot open decode log {:?} ({}), logging disabled", path, e);
            Box::new(NullSink)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<'a>(frame: &'a Frame, warning: bool) -> DecodeRecord<'a> {
        DecodeRecord {
            frame,
            signal_name: "Motor_RPM",
            value: 5000.0,
            unit: "rpm",
            warning,
        }
    }

    #[test]
    fn test_header_written_once() {
        let mut sink = TextLogSink::new(Vec::new()).unwrap();
        let frame = Frame::new(0x101, &[0x13, 0x88]);
        sink.record(&record(&frame, false));
        sink.record(&record(&frame, false));

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], LOG_HEADER);
        assert_eq!(text.matches("TIMESTAMP").count(), 1);
    }

    #[test]
    fn test_record_format() {
        let mut sink = TextLogSink::new(Vec::new()).unwrap();
        let frame = Frame::new(0x101, &[0x13, 0x88]);
        sink.record(&record(&frame, false));
        sink.record(&record(&frame, true));

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        // Drop the local-time timestamp column
        let (_, ok_line) = lines[1].split_once(" | ").unwrap();
        assert_eq!(ok_line, "0x101 | 2 | 13 88 | Motor_RPM | 5000.00 rpm | OK");

        let (_, warn_line) = lines[2].split_once(" | ").unwrap();
        assert!(warn_line.ends_with("| WARNING"));
    }

    #[test]
    fn test_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("can_log.txt");

        let mut sink = open_file_sink(&path);
        let frame = Frame::new(0x103, &[0xFF]);
        sink.record(&DecodeRecord {
            frame: &frame,
            signal_name: "Battery_SOC",
            value: 255.0,
            unit: "%",
            warning: true,
        });

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(LOG_HEADER));
        assert!(text.contains("| 0x103 | 1 | FF | Battery_SOC | 255.00 % | WARNING"));
    }

    #[test]
    fn test_unopenable_path_degrades_to_noop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("can_log.txt");

        let mut sink = open_file_sink(&path);
        let frame = Frame::new(0x101, &[0x13, 0x88]);
        sink.record(&record(&frame, false));
        assert!(!path.exists());
    }
}
