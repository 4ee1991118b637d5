use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Timestamp layouts carrying an explicit offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Timestamp layouts without an offset; these are recorded in UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("Failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read CSV {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
}

/// One flow file reduced to UTC-keyed values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizedSeries {
    pub points: BTreeMap<DateTime<Utc>, f64>,
    pub rows_read: usize,
    pub rows_dropped: usize,
}

/// Parse a timestamp cell into a UTC instant.
///
/// Offset-carrying values are converted to UTC. Naive values are taken to be
/// UTC already and get a zero offset attached without any shift.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    let zulu;
    let with_offset = match raw.strip_suffix(['Z', 'z']) {
        Some(stripped) => {
            zulu = format!("{stripped}+00:00");
            zulu.as_str()
        }
        None => raw,
    };
    for fmt in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(with_offset, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Parse a flow cell in MW. Blank and non-finite values are rejected.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Load one flow CSV from disk
pub fn read_series(path: &Path) -> Result<NormalizedSeries, SeriesError> {
    let file = File::open(path).map_err(|source| SeriesError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_series_from(file, &path.display().to_string())
}

/// Load a two-column `timestamp,value` CSV.
///
/// The first column is the timestamp, the second the value; further columns
/// are ignored. A header row is optional: it fails to parse and is dropped
/// like any other bad row. When a timestamp repeats, the later row wins.
pub fn read_series_from<R: Read>(reader: R, source: &str) -> Result<NormalizedSeries, SeriesError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut series = NormalizedSeries::default();
    for (line, record) in rdr.records().enumerate() {
        series.rows_read += 1;
        let record = match record {
            Ok(r) => r,
            Err(e) if e.is_io_error() => {
                return Err(SeriesError::Csv {
                    path: source.to_string(),
                    source: e,
                })
            }
            Err(e) => {
                debug!(%source, line = line + 1, error = %e, "dropping unreadable row");
                series.rows_dropped += 1;
                continue;
            }
        };

        let ts = record.get(0).and_then(parse_timestamp);
        let value = record.get(1).and_then(parse_value);
        match (ts, value) {
            (Some(ts), Some(value)) => {
                series.points.insert(ts, value);
            }
            _ => {
                debug!(%source, line = line + 1, "dropping row with bad timestamp or value");
                series.rows_dropped += 1;
            }
        }
    }

    Ok(series)
}
