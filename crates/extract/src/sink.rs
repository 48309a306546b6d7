// ABOUTME: Append-only record sinks that persist one JSON value per call.
// ABOUTME: JsonLinesSink writes newline-delimited JSON to any writer or an appended file.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::ScrapeError;

/// Destination for serialized records.
pub trait RecordSink {
    fn write_record(&mut self, record: &serde_json::Value) -> Result<(), ScrapeError>;

    /// Push buffered output down to the underlying writer.
    fn flush(&mut self) -> Result<(), ScrapeError> {
        Ok(())
    }
}

/// Writes each record as a single line of JSON.
pub struct JsonLinesSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl JsonLinesSink<BufWriter<std::fs::File>> {
    /// Open `path` for appending, creating it if needed.
    pub fn append_to(path: impl AsRef<Path>) -> Result<Self, ScrapeError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                ScrapeError::sink(
                    format!("Open {}", path.display()),
                    Some(anyhow::Error::new(e)),
                )
            })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_record(&mut self, record: &serde_json::Value) -> Result<(), ScrapeError> {
        serde_json::to_writer(&mut self.writer, record)
            .map_err(|e| ScrapeError::sink("Serialize", Some(anyhow::Error::new(e))))?;
        self.writer
            .write_all(b"\n")
            .map_err(|e| ScrapeError::sink("Write", Some(anyhow::Error::new(e))))
    }

    fn flush(&mut self) -> Result<(), ScrapeError> {
        self.writer
            .flush()
            .map_err(|e| ScrapeError::sink("Flush", Some(anyhow::Error::new(e))))
    }
}

/// In-memory sink, mostly for tests and embedding.
impl RecordSink for Vec<serde_json::Value> {
    fn write_record(&mut self, record: &serde_json::Value) -> Result<(), ScrapeError> {
        self.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_json_lines_one_record_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.write_record(&json!({"index": {"_id": 1}})).unwrap();
        sink.write_record(&json!({"title": "Dune"})).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert_eq!(out, "{\"index\":{\"_id\":1}}\n{\"title\":\"Dune\"}\n");
    }

    #[test]
    fn test_append_to_keeps_existing_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        std::fs::write(&path, "{\"old\":true}\n").unwrap();

        let mut sink = JsonLinesSink::append_to(&path).unwrap();
        sink.write_record(&json!({"new": true})).unwrap();
        sink.flush().unwrap();
        drop(sink);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"old\":true}\n{\"new\":true}\n");
    }

    #[test]
    fn test_append_to_missing_directory_is_sink_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = JsonLinesSink::append_to(dir.path().join("nope").join("out.json"))
            .err()
            .unwrap();
        assert_eq!(err.code, crate::error::ErrorCode::Sink);
    }

    #[test]
    fn test_vec_sink_collects_values() {
        let mut sink: Vec<serde_json::Value> = Vec::new();
        sink.write_record(&json!(1)).unwrap();
        sink.write_record(&json!(2)).unwrap();
        assert_eq!(sink, vec![json!(1), json!(2)]);
    }
}
