/// Historical readings upload: schema validation and row parsing.
///
/// The header row is checked against `model::REQUIRED_COLUMNS` before any
/// data row is read, so a file missing a column fails with
/// `LoadError::Schema` and never reaches analysis. Extra columns are ignored
/// and column order is free.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::model::{COL_CITY, COL_TEMPERATURE, COL_TIMESTAMP, LoadError, REQUIRED_COLUMNS, Reading};

/// Naive layouts accepted for the `timestamp` column, tried in order after
/// RFC 3339.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Schema validation
// ---------------------------------------------------------------------------

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub timestamp: usize,
    pub city: usize,
    pub temperature: usize,
}

/// Checks that every required column is present in `headers`.
///
/// Header names are compared after trimming whitespace. On failure the
/// error lists every missing column in canonical order.
pub fn validate_headers<'a, I>(headers: I) -> Result<ColumnLayout, LoadError>
where
    I: IntoIterator<Item = &'a str>,
{
    let names: Vec<&str> = headers.into_iter().map(str::trim).collect();
    let position = |col: &str| names.iter().position(|h| *h == col);

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| position(**col).is_none())
        .map(|col| col.to_string())
        .collect();

    match (position(COL_TIMESTAMP), position(COL_CITY), position(COL_TEMPERATURE)) {
        (Some(timestamp), Some(city), Some(temperature)) => Ok(ColumnLayout {
            timestamp,
            city,
            temperature,
        }),
        _ => Err(LoadError::Schema { missing }),
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate a historical readings CSV from disk.
pub fn load_readings_file(path: &Path) -> Result<Vec<Reading>, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load_readings(file)
}

/// Load and validate historical readings from any CSV source.
///
/// Rows are returned in file order. A header-only file is rejected: there
/// is nothing to analyze.
pub fn load_readings<R: Read>(source: R) -> Result<Vec<Reading>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let layout = validate_headers(headers.iter())?;

    let mut readings = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let line = i + 1;
        let record = record.map_err(csv_error)?;
        readings.push(parse_record(&record, layout, line)?);
    }

    if readings.is_empty() {
        return Err(LoadError::FileFormat {
            line: None,
            message: "no data rows".to_string(),
        });
    }

    Ok(readings)
}

fn parse_record(
    record: &csv::StringRecord,
    layout: ColumnLayout,
    line: usize,
) -> Result<Reading, LoadError> {
    let field = |idx: usize, name: &str| {
        record.get(idx).ok_or_else(|| LoadError::FileFormat {
            line: Some(line),
            message: format!("missing value for {}", name),
        })
    };

    let raw_timestamp = field(layout.timestamp, COL_TIMESTAMP)?;
    let timestamp = parse_timestamp(raw_timestamp).ok_or_else(|| LoadError::FileFormat {
        line: Some(line),
        message: format!("unparseable timestamp '{}'", raw_timestamp),
    })?;

    let city = field(layout.city, COL_CITY)?;
    if city.is_empty() {
        return Err(LoadError::FileFormat {
            line: Some(line),
            message: "empty city".to_string(),
        });
    }

    let raw_temperature = field(layout.temperature, COL_TEMPERATURE)?;
    let temperature = raw_temperature
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .ok_or_else(|| LoadError::FileFormat {
            line: Some(line),
            message: format!("unparseable temperature '{}'", raw_temperature),
        })?;

    Ok(Reading {
        timestamp,
        city: city.to_string(),
        temperature,
    })
}

/// Parse a `timestamp` cell. Offsets are dropped, keeping wall-clock time.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn csv_error(err: csv::Error) -> LoadError {
    // csv counts the header as line 1; data rows start at line 2.
    let line = err
        .position()
        .map(|p| p.line() as usize)
        .filter(|l| *l > 1)
        .map(|l| l - 1);
    LoadError::FileFormat {
        line,
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
