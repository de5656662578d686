//! GPS reference tables: a header row followed by `id, lat, lng[, altitude]`
//! rows, either as CSV text or as a JSON array of row arrays (the shape a
//! spreadsheet export with positional headers produces).

use std::path::Path;

use foundation::GeoPoint;
use overlay::ReferencePoint;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{FormatError, read_file};

#[derive(Debug, Default)]
pub struct GpsTable {
    pub points: Vec<ReferencePoint>,
    /// Rows that could not be used, in table order.
    pub skipped: Vec<FormatError>,
}

impl GpsTable {
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let mut table = GpsTable::default();
        // Row 0 is the header.
        for (i, row) in rows.iter().enumerate().skip(1) {
            match parse_row(i, row) {
                Ok(Some(point)) => table.points.push(point),
                Ok(None) => debug!(row = i + 1, "blank coordinates, skipping"),
                Err(e) => {
                    warn!("skipping gps row: {e}");
                    table.skipped.push(e);
                }
            }
        }
        info!(
            points = table.points.len(),
            skipped = table.skipped.len(),
            "gps table parsed"
        );
        table
    }

    pub fn from_csv_str(s: &str) -> Self {
        Self::from_rows(&csv_rows(s))
    }

    pub fn from_json_str(s: &str) -> Result<Self, FormatError> {
        Ok(Self::from_rows(&json_rows(s)?))
    }

    /// `.json` files are read as row arrays, everything else as CSV.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, FormatError> {
        let path = path.as_ref();
        let text = read_file(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Ok(Self::from_csv_str(&text))
        }
    }
}

/// `Ok(None)` for rows whose latitude or longitude cell is blank.
fn parse_row(index: usize, row: &[String]) -> Result<Option<ReferencePoint>, FormatError> {
    let row_no = index + 1;
    if row.len() < 3 {
        return Err(FormatError::MissingColumns {
            row: row_no,
            found: row.len(),
        });
    }
    let (lat_cell, lng_cell) = (row[1].trim(), row[2].trim());
    if lat_cell.is_empty() || lng_cell.is_empty() {
        return Ok(None);
    }

    let lat = parse_coordinate(lat_cell, row_no)?;
    let lng = parse_coordinate(lng_cell, row_no)?;
    if GeoPoint::try_new(lat, lng).is_none() {
        return Err(FormatError::InvalidCoordinate {
            row: row_no,
            value: format!("{lat_cell}, {lng_cell}"),
        });
    }

    let id = match row[0].trim() {
        "" => index.to_string(),
        id => id.to_string(),
    };
    let mut point = ReferencePoint::new(id, lat, lng);
    if let Some(alt) = row.get(3).and_then(|c| parse_coordinate(c.trim(), row_no).ok()) {
        point = point.with_altitude(alt);
    }
    Ok(Some(point))
}

/// Keep digits, `.` and `-`, then read the longest numeric prefix.
/// `"N 34.85°"` reads as `34.85`.
pub fn parse_coordinate(cell: &str, row: usize) -> Result<f64, FormatError> {
    let cleaned: String = cell
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect();
    (1..=cleaned.len())
        .rev()
        .find_map(|end| cleaned[..end].parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .ok_or_else(|| FormatError::InvalidCoordinate {
            row,
            value: cell.to_string(),
        })
}

/// Comma-separated rows with double-quoted fields (`""` escapes a quote).
/// Blank lines are dropped.
pub fn csv_rows(s: &str) -> Vec<Vec<String>> {
    s.trim_start_matches('\u{feff}')
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(split_csv_line)
        .collect()
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// A JSON array of row arrays. Strings are taken as-is, numbers are
/// stringified and `null` becomes an empty cell.
pub fn json_rows(s: &str) -> Result<Vec<Vec<String>>, FormatError> {
    let rows: Vec<Vec<Value>> = serde_json::from_str(s)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|v| match v {
                    Value::String(s) => s,
                    Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect()
        })
        .collect())
}
