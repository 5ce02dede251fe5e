// Row normalization and filtering.
//
// `normalize_rows` turns heterogeneous raw rows into canonical records;
// `filter_rows` selects the active view. Both are pure and total: no
// input shape can make them panic.
use crate::schema::detect_schema;
use crate::types::{
    CanonicalRecord, DateSource, FilterParams, MonthKey, NormalizeReport, RawRecord,
    SectionFilter, YearFilter,
};
use crate::util::{parse_date_flexible, to_number, to_text};
use chrono::{Datelike, Local, NaiveDate};
use log::{debug, warn};
use serde_json::Value;

fn field<'a>(row: &'a RawRecord, key: &Option<String>) -> &'a Value {
    key.as_deref()
        .and_then(|k| row.get(k))
        .unwrap_or(&Value::Null)
}

fn first_of_month(year: i32, month: u32) -> NaiveDate {
    // Out-of-range year/month values are carried as-is in the record;
    // only the calendar date needs a total fallback.
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

/// Normalize a raw batch into canonical records plus a report stating
/// how dates were resolved and what was dropped.
///
/// Date resolution, in priority order:
/// 1. explicit year + month columns,
/// 2. a detected date column (rows whose value fails to parse fall
///    through to 3 and are counted in `invalid_dates`),
/// 3. the current processing date (degraded mode, flagged via
///    `DateSource::CurrentDate`).
///
/// Rows whose trimmed section is empty carry no analytical meaning and
/// are dropped.
pub fn normalize_rows(rows: &[RawRecord]) -> (Vec<CanonicalRecord>, NormalizeReport) {
    let schema = detect_schema(rows);

    let date_source = if schema.year.is_some() && schema.month.is_some() {
        DateSource::YearMonth
    } else if schema.date.is_some() {
        DateSource::DateColumn
    } else {
        DateSource::CurrentDate
    };

    let today = Local::now().date_naive();
    let mut invalid_dates = 0usize;
    let mut dropped_sections = 0usize;
    let mut records: Vec<CanonicalRecord> = Vec::with_capacity(rows.len());

    for row in rows {
        let section = to_text(field(row, &schema.section)).trim().to_string();
        if section.is_empty() {
            dropped_sections += 1;
            continue;
        }

        let (year, month) = match date_source {
            DateSource::YearMonth => (
                to_number(field(row, &schema.year)) as i32,
                to_number(field(row, &schema.month)) as u32,
            ),
            DateSource::DateColumn => {
                let raw = to_text(field(row, &schema.date));
                match parse_date_flexible(&raw) {
                    Some(d) => (d.year(), d.month()),
                    None => {
                        invalid_dates += 1;
                        (today.year(), today.month())
                    }
                }
            }
            DateSource::CurrentDate => (today.year(), today.month()),
        };

        records.push(CanonicalRecord {
            section,
            amount: to_number(field(row, &schema.amount)),
            count: to_number(field(row, &schema.count)),
            average: to_number(field(row, &schema.average)),
            year,
            month,
            date: first_of_month(year, month),
            month_key: MonthKey::new(year, month),
        });
    }

    if date_source == DateSource::CurrentDate && !rows.is_empty() {
        warn!("no year/month or date column detected; substituting the current date");
    }
    debug!(
        "normalized {} of {} row(s) ({} empty-section, {} invalid date(s))",
        records.len(),
        rows.len(),
        dropped_sections,
        invalid_dates
    );

    let report = NormalizeReport {
        total_rows: rows.len(),
        kept_rows: records.len(),
        dropped_sections,
        invalid_dates,
        date_source,
    };
    (records, report)
}

/// Convenience wrapper for callers that only need the records.
pub fn normalize(rows: &[RawRecord]) -> Vec<CanonicalRecord> {
    normalize_rows(rows).0
}

/// Select the records matching the given filter. Pure predicate
/// selection: relative order is preserved and the input is untouched.
/// The month range is inclusive on both ends; a swapped range yields an
/// empty result.
pub fn filter_rows(records: &[CanonicalRecord], params: &FilterParams) -> Vec<CanonicalRecord> {
    records
        .iter()
        .filter(|r| {
            let year_ok = match params.year {
                YearFilter::All => true,
                YearFilter::Only(y) => r.year == y,
            };
            let section_ok = match &params.section {
                SectionFilter::All => true,
                SectionFilter::Named(s) => r.section == *s,
            };
            let month_ok = r.month >= params.month_from && r.month <= params.month_to;
            year_ok && section_ok && month_ok
        })
        .cloned()
        .collect()
}
