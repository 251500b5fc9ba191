//! Record sources for replay.
//!
//! A source yields readings in recording order. [`CsvSource`] streams a CSV
//! file with a header row containing `timestamp, sensor_id, x, y, z` (any
//! order, extra columns ignored); [`MemorySource`] replays typed readings.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use vibewatch_core::error::CoreError;
use vibewatch_core::reading::Reading;
use vibewatch_core::types::{DbId, Timestamp};

use crate::error::{ReplayError, SourceError};

pub const REQUIRED_COLUMNS: [&str; 5] = ["timestamp", "sensor_id", "x", "y", "z"];

/// One record pulled from a source.
#[derive(Debug)]
pub struct SourceRow {
    /// 1-based data row number, header excluded.
    pub row: usize,
    /// `Err` for a row that could not be turned into a reading; the replay
    /// skips it and carries on.
    pub reading: Result<Reading, CoreError>,
}

#[async_trait]
pub trait RecordSource: Send {
    /// Display name, e.g. the file name.
    fn name(&self) -> &str;

    /// Check that the source is usable and prepare it for reading.
    async fn validate(&mut self) -> Result<(), ReplayError>;

    /// Number of records, known after [`validate`](Self::validate).
    fn total_records(&self) -> usize;

    /// Next record in order, or `None` once exhausted.
    async fn next_record(&mut self) -> Result<Option<SourceRow>, SourceError>;
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    timestamp: usize,
    sensor_id: usize,
    x: usize,
    y: usize,
    z: usize,
}

impl ColumnIndex {
    fn from_header(line: &str) -> Result<Self, ReplayError> {
        let headers: Vec<String> = parse_csv_line(line.trim_start_matches('\u{feff}'))
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();
        let position = |name: &str| headers.iter().position(|h| h == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ReplayError::Validation(format!(
                "missing required column(s): {}; expected {}",
                missing.join(", "),
                REQUIRED_COLUMNS.join(", ")
            )));
        }

        // All present, checked above.
        let at = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            timestamp: at("timestamp"),
            sensor_id: at("sensor_id"),
            x: at("x"),
            y: at("y"),
            z: at("z"),
        })
    }
}

/// Streams readings from a CSV file.
pub struct CsvSource {
    path: PathBuf,
    name: String,
    columns: Option<ColumnIndex>,
    lines: Option<Lines<BufReader<File>>>,
    total: usize,
    row: usize,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            path,
            name,
            columns: None,
            lines: None,
            total: 0,
            row: 0,
        }
    }

    async fn open(&self) -> Result<Lines<BufReader<File>>, SourceError> {
        let file = File::open(&self.path).await.map_err(|e| self.io_error(e))?;
        Ok(BufReader::new(file).lines())
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        if source.kind() == std::io::ErrorKind::InvalidData {
            SourceError::Malformed {
                name: self.name.clone(),
                reason: source.to_string(),
            }
        } else {
            SourceError::Io {
                name: self.name.clone(),
                source,
            }
        }
    }

    fn parse_row(&self, columns: ColumnIndex, line: &str) -> Result<Reading, CoreError> {
        let values = parse_csv_line(line);
        let field = |idx: usize| values.get(idx).map(|v| v.trim()).unwrap_or("");
        let number = |idx: usize, column: &str| {
            field(idx).parse::<f64>().map_err(|_| {
                CoreError::Input(format!("row {}: {column} '{}' is not a number", self.row, field(idx)))
            })
        };

        let sensor_id = parse_sensor_id(field(columns.sensor_id)).ok_or_else(|| {
            CoreError::Input(format!(
                "row {}: sensor_id '{}' is not an integer",
                self.row,
                field(columns.sensor_id)
            ))
        })?;
        let x = number(columns.x, "x")?;
        let y = number(columns.y, "y")?;
        let z = number(columns.z, "z")?;
        let timestamp = parse_timestamp(field(columns.timestamp)).unwrap_or_else(Utc::now);

        let reading = Reading::new(sensor_id, timestamp, x, y, z);
        reading.validate()?;
        Ok(reading)
    }
}

#[async_trait]
impl RecordSource for CsvSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&mut self) -> Result<(), ReplayError> {
        let mut lines = self.open().await?;
        let header = lines
            .next_line()
            .await
            .map_err(|e| self.io_error(e))?
            .ok_or_else(|| ReplayError::Validation(format!("{} is empty", self.name)))?;
        let columns = ColumnIndex::from_header(&header)?;

        let mut total = 0;
        while let Some(line) = lines.next_line().await.map_err(|e| self.io_error(e))? {
            if !line.trim().is_empty() {
                total += 1;
            }
        }

        // Reopen positioned after the header for streaming.
        let mut lines = self.open().await?;
        lines.next_line().await.map_err(|e| self.io_error(e))?;

        tracing::debug!(source = %self.name, total, "CSV source validated");
        self.columns = Some(columns);
        self.lines = Some(lines);
        self.total = total;
        self.row = 0;
        Ok(())
    }

    fn total_records(&self) -> usize {
        self.total
    }

    async fn next_record(&mut self) -> Result<Option<SourceRow>, SourceError> {
        let (Some(columns), Some(lines)) = (self.columns, self.lines.as_mut()) else {
            return Err(SourceError::Malformed {
                name: self.name.clone(),
                reason: "source was not validated".into(),
            });
        };

        let line = loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => break line,
                Ok(None) => return Ok(None),
                Err(e) => return Err(self.io_error(e)),
            }
        };

        self.row += 1;
        Ok(Some(SourceRow {
            row: self.row,
            reading: self.parse_row(columns, &line),
        }))
    }
}

/// Split one CSV line, honouring double quotes and `""` escapes.
fn parse_csv_line(line: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match (in_quotes, ch) {
            (true, '"') if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            (true, '"') => in_quotes = false,
            (false, '"') => in_quotes = true,
            (false, ',') => result.push(std::mem::take(&mut current)),
            _ => current.push(ch),
        }
    }
    result.push(current);
    result
}

/// Integer sensor ids, also accepting integral floats such as `"3.0"`.
fn parse_sensor_id(value: &str) -> Option<DbId> {
    value.parse::<DbId>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as DbId)
    })
}

/// RFC 3339, or naive ISO-8601 interpreted as UTC. `None` if empty or
/// unparsable.
pub fn parse_timestamp(value: &str) -> Option<Timestamp> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .map(|naive| naive.and_utc())
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// Replays a fixed list of readings.
pub struct MemorySource {
    name: String,
    records: VecDeque<Reading>,
    total: usize,
    row: usize,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, records: Vec<Reading>) -> Self {
        let total = records.len();
        Self {
            name: name.into(),
            records: records.into(),
            total,
            row: 0,
        }
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&mut self) -> Result<(), ReplayError> {
        Ok(())
    }

    fn total_records(&self) -> usize {
        self.total
    }

    async fn next_record(&mut self) -> Result<Option<SourceRow>, SourceError> {
        Ok(self.records.pop_front().map(|reading| {
            self.row += 1;
            SourceRow {
                row: self.row,
                reading: reading.validate().map(|()| reading),
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn csv_line_handles_quotes() {
        assert_eq!(parse_csv_line(r#"a,"b,c","say ""hi""""#), vec!["a", "b,c", r#"say "hi""#]);
        assert_eq!(parse_csv_line("1,,3"), vec!["1", "", "3"]);
    }

    #[test]
    fn header_lookup_reports_missing_columns() {
        let columns = ColumnIndex::from_header("z,y,x,sensor_id,timestamp,extra").unwrap();
        assert_eq!((columns.z, columns.timestamp), (0, 4));

        let err = ColumnIndex::from_header("timestamp,sensor_id,x").unwrap_err();
        assert_matches!(err, ReplayError::Validation(msg) if msg.contains("y, z"));
    }

    #[test]
    fn timestamps_accept_rfc3339_and_naive() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01T12:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T14:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01 12:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2026-03-01T12:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("yesterday"), None);
    }

    #[test]
    fn sensor_ids_accept_integral_floats() {
        assert_eq!(parse_sensor_id("7"), Some(7));
        assert_eq!(parse_sensor_id("7.0"), Some(7));
        assert_eq!(parse_sensor_id("7.5"), None);
        assert_eq!(parse_sensor_id("seven"), None);
    }

    #[tokio::test]
    async fn memory_source_flags_non_finite_readings() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let mut source = MemorySource::new(
            "mem",
            vec![Reading::new(1, at, 0.0, 9.8, 0.0), Reading::new(1, at, f64::INFINITY, 9.8, 0.0)],
        );
        source.validate().await.unwrap();
        assert_eq!(source.total_records(), 2);

        assert!(source.next_record().await.unwrap().unwrap().reading.is_ok());
        let second = source.next_record().await.unwrap().unwrap();
        assert_eq!(second.row, 2);
        assert_matches!(second.reading, Err(CoreError::Input(_)));
        assert!(source.next_record().await.unwrap().is_none());
    }
}
