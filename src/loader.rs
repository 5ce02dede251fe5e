// Raw-row acquisition: CSV/JSON text in, untyped rows out.
//
// Everything past this boundary works on `RawRecord`s regardless of
// which format produced them. Parse failures stay here; the pipeline
// itself never errors.
use crate::types::RawRecord;
use csv::ReaderBuilder;
use log::{debug, warn};
use serde_json::Value;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV parse failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON parse failed: {0}")]
    Json(#[from] serde_json::Error),
}

// Mirror the dynamic typing the rest of the pipeline expects from JSON
// input: numeric-looking cells become numbers, everything else stays
// text. Grouped values like "1,000" are not numeric-looking and remain
// strings until value coercion.
fn type_cell(cell: &str) -> Value {
    let trimmed = cell.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(f) if f.is_finite() => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(cell.to_string())),
        _ => Value::String(cell.to_string()),
    }
}

/// Parse CSV text with a header row into raw records, skipping fully
/// empty lines. Column order is preserved in each record.
pub fn parse_csv_text(text: &str) -> Result<Vec<RawRecord>, LoadError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        let mut row = RawRecord::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            row.insert(header.to_string(), type_cell(cell));
        }
        rows.push(row);
    }
    debug!("parsed {} CSV row(s)", rows.len());
    Ok(rows)
}

/// Parse a JSON array of objects into raw records. Key order within
/// each object is preserved.
pub fn parse_json_text(text: &str) -> Result<Vec<RawRecord>, LoadError> {
    let rows: Vec<RawRecord> = serde_json::from_str(text)?;
    debug!("parsed {} JSON row(s)", rows.len());
    Ok(rows)
}

/// Load raw rows from a file, dispatching on the `.json` extension
/// (anything else is treated as CSV).
pub fn load_rows_from_path(path: &str) -> Result<Vec<RawRecord>, LoadError> {
    let text = std::fs::read_to_string(path)?;
    let is_json = Path::new(path)
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    if is_json {
        parse_json_text(&text)
    } else {
        parse_csv_text(&text)
    }
}

/// The auto-load fallback chain: `data/piecework.json`, then
/// `data/piecework.csv`, then an empty batch. A missing or unreadable
/// source is not an error; the next candidate is tried.
pub fn auto_load() -> Vec<RawRecord> {
    for candidate in ["data/piecework.json", "data/piecework.csv"] {
        match load_rows_from_path(candidate) {
            Ok(rows) if !rows.is_empty() => {
                debug!("auto-loaded {} row(s) from {}", rows.len(), candidate);
                return rows;
            }
            Ok(_) => debug!("{} is empty, trying next source", candidate),
            Err(e) => warn!("could not auto-load {}: {}", candidate, e),
        }
    }
    Vec::new()
}
