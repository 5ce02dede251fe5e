use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use std::fmt;
use tabled::Tabled;

/// A raw row as it arrives from the CSV or JSON boundary: source column
/// name -> untyped scalar. The `serde_json` map preserves column order,
/// which schema detection relies on (first matching key wins).
pub type RawRecord = serde_json::Map<String, serde_json::Value>;

/// Which source column supplies each canonical field. `None` means the
/// dataset has no usable column for that field; `section` and `amount`
/// are filled with their literal fallbacks at detection time, so they
/// may name a column that does not exist in any row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    pub year: Option<String>,
    pub month: Option<String>,
    pub date: Option<String>,
    pub section: Option<String>,
    pub amount: Option<String>,
    pub count: Option<String>,
    pub average: Option<String>,
}

/// A (year, month) bucket. The derived ordering is chronological by
/// construction, independent of the rendered string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        MonthKey { year, month }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-01", self.year, self.month)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The normalized unit of analysis. Derived, immutable, and replaced
/// wholesale whenever a new raw batch is imported.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalRecord {
    pub section: String,
    pub amount: f64,
    pub count: f64,
    pub average: f64,
    pub year: i32,
    pub month: u32,
    pub date: NaiveDate,
    #[serde(rename = "monthKey")]
    pub month_key: MonthKey,
}

/// How the normalizer resolved year/month for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Explicit year + month columns.
    YearMonth,
    /// Parsed from a detected date column.
    DateColumn,
    /// No temporal column at all; the processing date was substituted.
    /// Degraded mode: derived periods say nothing about the data.
    CurrentDate,
}

#[derive(Debug, Clone)]
pub struct NormalizeReport {
    pub total_rows: usize,
    pub kept_rows: usize,
    pub dropped_sections: usize,
    pub invalid_dates: usize,
    pub date_source: DateSource,
}

impl NormalizeReport {
    pub fn is_degraded(&self) -> bool {
        self.date_source == DateSource::CurrentDate || self.invalid_dates > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum YearFilter {
    #[default]
    All,
    Only(i32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum SectionFilter {
    #[default]
    All,
    Named(String),
}

/// Active filter parameters, owned by the menu loop and passed into the
/// filter engine on every change. The month range is inclusive on both
/// ends; a swapped range (`month_from > month_to`) selects nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterParams {
    pub year: YearFilter,
    pub section: SectionFilter,
    pub month_from: u32,
    pub month_to: u32,
}

impl Default for FilterParams {
    fn default() -> Self {
        FilterParams {
            year: YearFilter::All,
            section: SectionFilter::All,
            month_from: 1,
            month_to: 12,
        }
    }
}

/// Headline figures for the current filtered view.
#[derive(Debug, Clone, PartialEq)]
pub struct Kpi {
    pub sections: usize,
    pub total_amount: f64,
    pub count: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesPoint {
    pub x: MonthKey,
    pub y: f64,
}

/// One named trend line, dense-aligned: `y` has one entry per month in
/// `x`, zero-filled where the section has no records.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSeries {
    pub name: String,
    pub x: Vec<MonthKey>,
    pub y: Vec<f64>,
}

/// Per-section rollup; `value` is a total, a mean average, or a mean
/// headcount depending on which aggregator produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStat {
    pub section: String,
    pub value: f64,
}

/// Trend annotations derived from the monthly total series.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiBadges {
    pub mom_pct: f64,
    pub avg_per_month: f64,
    pub first: Option<MonthKey>,
    pub last: Option<MonthKey>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct MonthlyTotalRow {
    #[serde(rename = "Month")]
    #[tabled(rename = "Month")]
    pub month: String,
    #[serde(rename = "TotalAmount")]
    #[tabled(rename = "TotalAmount")]
    pub total_amount: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct SectionStatRow {
    #[serde(rename = "Section")]
    #[tabled(rename = "Section")]
    pub section: String,
    #[serde(rename = "Value")]
    #[tabled(rename = "Value")]
    pub value: String,
}
