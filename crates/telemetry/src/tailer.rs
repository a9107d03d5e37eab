//! Incremental capture log reader.
//!
//! Each call to [`LogTailer::poll`] is one pass over the newly appended part of
//! the log. The caller owns the cadence and sleeps one poll interval between
//! passes, re-opening the file every time so truncation and rotation are
//! noticed promptly.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::error::TailError;

/// Column names the tailer resolves from the log header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSpec {
    /// Milliseconds between presented frames, matched case-insensitively.
    pub metric: String,
    /// Substring tried when no column matches `metric` exactly.
    pub metric_fallback: String,
    /// Optional dropped-frame flag column; rows with `1` are ignored.
    pub dropped: Option<String>,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            metric: "MsBetweenPresents".to_string(),
            metric_fallback: "msbetweenpresent".to_string(),
            dropped: Some("Dropped".to_string()),
        }
    }
}

impl ColumnSpec {
    fn resolve_metric(&self, columns: &[String]) -> Option<usize> {
        let wanted = self.metric.to_ascii_lowercase();
        let fallback = self.metric_fallback.to_ascii_lowercase();
        columns
            .iter()
            .position(|c| c.to_ascii_lowercase() == wanted)
            .or_else(|| {
                if fallback.is_empty() {
                    return None;
                }
                columns
                    .iter()
                    .position(|c| c.to_ascii_lowercase().contains(&fallback))
            })
    }

    fn resolve_dropped(&self, columns: &[String]) -> Option<usize> {
        let wanted = self.dropped.as_deref()?;
        columns.iter().position(|c| c.eq_ignore_ascii_case(wanted))
    }
}

/// Tailer position and header state for one log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogCursor {
    /// Byte offset just past the last fully consumed line.
    pub offset: u64,
    /// Parsed header columns, once seen.
    pub header: Option<Vec<String>>,
    /// Index of the frame-time column.
    pub metric_index: Option<usize>,
    /// Index of the dropped-frame flag column, if the log has one.
    pub dropped_index: Option<usize>,
}

/// Result of one tailing pass.
#[derive(Debug, Clone, PartialEq)]
pub enum TailPoll {
    /// FPS samples from the rows completed since the last pass, in order.
    Samples(Vec<f64>),
    /// Nothing new: file missing, unchanged, header only, or only skipped rows.
    NoData,
}

enum LineKind {
    Header,
    Data,
}

/// Tails one append-only capture log.
#[derive(Debug)]
pub struct LogTailer {
    path: PathBuf,
    columns: ColumnSpec,
    cursor: LogCursor,
}

impl LogTailer {
    /// Create a tailer positioned at the start of `path`.
    ///
    /// The file does not have to exist yet.
    pub fn new(path: impl Into<PathBuf>, columns: ColumnSpec) -> Self {
        Self {
            path: path.into(),
            columns,
            cursor: LogCursor::default(),
        }
    }

    /// Path being tailed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current cursor.
    pub fn cursor(&self) -> &LogCursor {
        &self.cursor
    }

    /// Run one pass over whatever was appended since the previous pass.
    ///
    /// # Errors
    ///
    /// [`TailError::MissingColumn`] when the header lacks the frame-time
    /// column (fatal for this log), [`TailError::Io`] for read failures other
    /// than the file being absent.
    pub fn poll(&mut self) -> Result<TailPoll, TailError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(path = ?self.path, "Capture log not present yet");
                return Ok(TailPoll::NoData);
            }
            Err(e) => return Err(self.io_error(e)),
        };

        let size = file.metadata().map_err(|e| self.io_error(e))?.len();
        if size < self.cursor.offset {
            info!(
                path = ?self.path,
                size,
                offset = self.cursor.offset,
                "Capture log shrank, rewinding cursor"
            );
            self.cursor.offset = 0;
        }
        if size == self.cursor.offset {
            return Ok(TailPoll::NoData);
        }

        file.seek(SeekFrom::Start(self.cursor.offset))
            .map_err(|e| self.io_error(e))?;
        let mut buf = Vec::new();
        file.take(size.saturating_sub(self.cursor.offset))
            .read_to_end(&mut buf)
            .map_err(|e| self.io_error(e))?;

        // A trailing partial line stays unconsumed until its newline arrives.
        let Some(last_newline) = buf.iter().rposition(|b| *b == b'\n') else {
            return Ok(TailPoll::NoData);
        };
        buf.truncate(last_newline.saturating_add(1));

        let mut samples = Vec::new();
        let mut skipped = 0usize;
        let mut consumed: u64 = 0;

        for raw in buf.split_inclusive(|b| *b == b'\n') {
            let line_start = self.cursor.offset.saturating_add(consumed);
            let text = String::from_utf8_lossy(raw);
            let line = text.trim_end_matches(['\n', '\r']);

            consumed = consumed.saturating_add(raw.len() as u64);

            if line.trim().is_empty() {
                continue;
            }
            if (line_start == 0 || self.cursor.header.is_none())
                && let LineKind::Header = self.take_header(line)?
            {
                continue;
            }
            match self.parse_row(line) {
                Some(fps) => samples.push(fps),
                None => skipped = skipped.saturating_add(1),
            }
        }

        self.cursor.offset = self.cursor.offset.saturating_add(consumed);
        trace!(
            path = ?self.path,
            offset = self.cursor.offset,
            samples = samples.len(),
            skipped,
            "Tail pass complete"
        );

        if samples.is_empty() {
            Ok(TailPoll::NoData)
        } else {
            Ok(TailPoll::Samples(samples))
        }
    }

    /// Handle the first line of the file.
    ///
    /// Without a known header the line must resolve the frame-time column.
    /// After a rewind the line is re-resolved when it names the column and
    /// treated as a data row otherwise.
    fn take_header(&mut self, line: &str) -> Result<LineKind, TailError> {
        let columns = split_row(line);
        let metric_index = self.columns.resolve_metric(&columns);

        match (metric_index, self.cursor.header.is_some()) {
            (Some(metric_index), _) => {
                self.cursor.dropped_index = self.columns.resolve_dropped(&columns);
                self.cursor.metric_index = Some(metric_index);
                debug!(
                    path = ?self.path,
                    metric_index,
                    dropped_index = ?self.cursor.dropped_index,
                    "Resolved capture log header"
                );
                self.cursor.header = Some(columns);
                Ok(LineKind::Header)
            }
            (None, true) => Ok(LineKind::Data),
            (None, false) => Err(TailError::MissingColumn {
                path: self.path.clone(),
                column: self.columns.metric.clone(),
                header: line.to_string(),
            }),
        }
    }

    fn parse_row(&self, line: &str) -> Option<f64> {
        let fields = split_row(line);

        if let Some(dropped) = self.cursor.dropped_index {
            if fields.get(dropped).is_some_and(|f| f == "1") {
                return None;
            }
        }

        let ms: f64 = fields.get(self.cursor.metric_index?)?.parse().ok()?;
        if !ms.is_finite() || ms <= 0.0 {
            return None;
        }
        Some(1000.0 / ms)
    }

    fn io_error(&self, source: std::io::Error) -> TailError {
        TailError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Split a CSV row into trimmed fields.
///
/// A field opening with `"` runs to the matching quote and may contain
/// commas; `""` inside it is a literal quote.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.next_if_eq(&'"').is_some() {
                    field.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            ',' if !quoted => fields.push(std::mem::take(&mut field).trim().to_string()),
            _ => field.push(c),
        }
    }
    fields.push(field.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_row_trims_and_unquotes() {
        let fields = split_row(" a ,\"b\", 1.5 ,");
        assert_eq!(fields, vec!["a", "b", "1.5", ""]);
    }

    #[test]
    fn split_row_keeps_commas_and_quotes_inside_quoted_fields() {
        let fields = split_row("\"My, Game.exe\",42,\"say \"\"hi\"\"\",16.0");
        assert_eq!(fields, vec!["My, Game.exe", "42", "say \"hi\"", "16.0"]);
    }

    #[test]
    fn resolve_metric_prefers_exact_match() {
        let spec = ColumnSpec::default();
        let columns = split_row("msBetweenPresentsAvg,MSBETWEENPRESENTS");
        assert_eq!(spec.resolve_metric(&columns), Some(1));
    }

    #[test]
    fn resolve_metric_falls_back_to_substring() {
        let spec = ColumnSpec::default();
        let columns = split_row("Application,TimeInSeconds,msBetweenPresent(ms)");
        assert_eq!(spec.resolve_metric(&columns), Some(2));
    }

    #[test]
    fn resolve_dropped_is_optional() {
        let spec = ColumnSpec {
            dropped: None,
            ..ColumnSpec::default()
        };
        let columns = split_row("MsBetweenPresents,Dropped");
        assert_eq!(spec.resolve_dropped(&columns), None);
        assert_eq!(ColumnSpec::default().resolve_dropped(&columns), Some(1));
    }
}
