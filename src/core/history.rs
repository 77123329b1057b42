//! Run history: append-only log of every run in a session
//!
//! Export formats are byte-compatible with the history files written by the
//! desktop device:
//! - text: `(0, 2, 'red', 'green')\n` per run
//! - JSON: `[[0, 2, "red", "green"], [1, 1, "green", "green"]]`

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use log::info;
use serde::Serialize;
use sha2::{Sha256, Digest};
use crate::error::{MerminError, Result};
use crate::types::{ExportFormat, RunRecord};

/// Ordered, append-only sequence of run records
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunHistoryLog {
    records: Vec<RunRecord>,
}

impl RunHistoryLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record, returning its 0-based position
    pub fn append(&mut self, record: RunRecord) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }

    /// Record at `index`
    pub fn get(&self, index: usize) -> Result<RunRecord> {
        self.records
            .get(index)
            .copied()
            .ok_or(MerminError::IndexOutOfRange { index, len: self.records.len() })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Iterate records, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &RunRecord> {
        self.records.iter()
    }

    /// Serialize every record in insertion order
    pub fn export(&self, format: ExportFormat) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.export_to(format, &mut buf)?;
        Ok(buf)
    }

    /// Serialize into an arbitrary writer
    pub fn export_to<W: Write>(&self, format: ExportFormat, writer: &mut W) -> Result<()> {
        match format {
            ExportFormat::PlainText => {
                for record in &self.records {
                    writeln!(writer, "{}", record)?;
                }
            }
            ExportFormat::Json => {
                let mut ser = serde_json::Serializer::with_formatter(writer, SpacedFormatter);
                self.records.serialize(&mut ser)?;
            }
        }
        Ok(())
    }

    /// Export by format tag ("text", "txt", "json")
    pub fn export_as(&self, tag: &str) -> Result<Vec<u8>> {
        self.export(tag.parse()?)
    }

    /// Write the export to a file
    pub fn save(&self, path: impl AsRef<Path>, format: ExportFormat) -> Result<()> {
        let path = path.as_ref();
        let mut writer = BufWriter::new(File::create(path)?);
        self.export_to(format, &mut writer)?;
        writer.flush()?;
        info!("Saved {} runs as {} to {}", self.len(), format, path.display());
        Ok(())
    }

    /// Hex SHA-256 of the text export
    ///
    /// Two logs share a fingerprint only if they hold the same runs in the
    /// same order.
    pub fn fingerprint(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        self.export_to(ExportFormat::PlainText, &mut hasher)?;
        let digest = hasher.finalize();
        Ok(digest.iter().map(|b| format!("{:02x}", b)).collect())
    }

    /// Reload a JSON export
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let records: Vec<RunRecord> = serde_json::from_slice(bytes)?;
        Ok(Self { records })
    }
}

impl<'a> IntoIterator for &'a RunHistoryLog {
    type Item = &'a RunRecord;
    type IntoIter = std::slice::Iter<'a, RunRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Compact JSON with `", "` between array items
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DetectorSetting, Outcome, OutcomePair};
    use pretty_assertions::assert_eq;

    fn record(s1: i64, s2: i64, a: Outcome, b: Outcome) -> RunRecord {
        RunRecord::new(
            DetectorSetting::new(s1).unwrap(),
            DetectorSetting::new(s2).unwrap(),
            OutcomePair::new(a, b),
        )
    }

    fn sample_log() -> RunHistoryLog {
        let mut log = RunHistoryLog::new();
        log.append(record(0, 2, Outcome::Zero, Outcome::One));
        log.append(record(1, 1, Outcome::One, Outcome::One));
        log
    }

    #[test]
    fn test_append_returns_position() {
        let mut log = RunHistoryLog::new();
        assert!(log.is_empty());
        assert_eq!(log.append(record(0, 0, Outcome::One, Outcome::One)), 0);
        assert_eq!(log.append(record(2, 1, Outcome::Zero, Outcome::Zero)), 1);
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_get_out_of_range() {
        let log = sample_log();
        assert_eq!(log.get(1).unwrap(), record(1, 1, Outcome::One, Outcome::One));
        match log.get(2) {
            Err(MerminError::IndexOutOfRange { index, len }) => {
                assert_eq!(index, 2);
                assert_eq!(len, 2);
            }
            other => panic!("expected IndexOutOfRange, got {:?}", other),
        }
    }

    #[test]
    fn test_plain_text_export() {
        let text = String::from_utf8(sample_log().export(ExportFormat::PlainText).unwrap()).unwrap();
        assert_eq!(text, "(0, 2, 'red', 'green')\n(1, 1, 'green', 'green')\n");
    }

    #[test]
    fn test_json_export() {
        let json = String::from_utf8(sample_log().export(ExportFormat::Json).unwrap()).unwrap();
        assert_eq!(json, r#"[[0, 2, "red", "green"], [1, 1, "green", "green"]]"#);
    }

    #[test]
    fn test_empty_exports() {
        let log = RunHistoryLog::new();
        assert_eq!(log.export(ExportFormat::PlainText).unwrap(), b"");
        assert_eq!(log.export(ExportFormat::Json).unwrap(), b"[]");
    }

    #[test]
    fn test_export_as_unknown_tag() {
        assert!(matches!(
            sample_log().export_as("csv"),
            Err(MerminError::UnsupportedFormat(_))
        ));
        assert_eq!(
            sample_log().export_as("json").unwrap(),
            sample_log().export(ExportFormat::Json).unwrap()
        );
    }

    #[test]
    fn test_json_reload() {
        let log = sample_log();
        let bytes = log.export(ExportFormat::Json).unwrap();
        assert_eq!(RunHistoryLog::from_json(&bytes).unwrap(), log);
        assert!(RunHistoryLog::from_json(br#"[[5, 0, "red", "red"]]"#).is_err());
    }

    #[test]
    fn test_fingerprint_tracks_content_and_order() {
        let a = sample_log();
        let mut b = RunHistoryLog::new();
        b.append(record(1, 1, Outcome::One, Outcome::One));
        b.append(record(0, 2, Outcome::Zero, Outcome::One));

        assert_eq!(a.fingerprint().unwrap(), sample_log().fingerprint().unwrap());
        assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
        assert_eq!(a.fingerprint().unwrap().len(), 64);
    }
}
