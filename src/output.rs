// Console tables and CSV serialization of computed views.
use crate::types::{
    MonthlyTotalRow, SectionSeries, SectionStat, SectionStatRow, SeriesPoint,
};
use crate::util::format_number;
use serde::Serialize;
use std::error::Error;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

/// Serialize rows to CSV text (header row included). This is the export
/// path: the caller decides where the text goes.
pub fn to_csv_string<T: Serialize>(rows: &[T]) -> Result<String, Box<dyn Error>> {
    let mut bytes = Vec::new();
    {
        let mut wtr = csv::Writer::from_writer(&mut bytes);
        for r in rows {
            wtr.serialize(r)?;
        }
        wtr.flush()?;
    }
    Ok(String::from_utf8(bytes)?)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn monthly_total_rows(points: &[SeriesPoint]) -> Vec<MonthlyTotalRow> {
    points
        .iter()
        .map(|p| MonthlyTotalRow {
            month: p.x.to_string(),
            total_amount: format_number(p.y, 2),
        })
        .collect()
}

pub fn section_stat_rows(stats: &[SectionStat], decimals: usize) -> Vec<SectionStatRow> {
    stats
        .iter()
        .map(|s| SectionStatRow {
            section: s.section.clone(),
            value: format_number(s.value, decimals),
        })
        .collect()
}

/// Render the per-section trend lines as one matrix: a header of month
/// keys, one row per section. This is the console stand-in for the
/// multi-line chart, so it leans on the dense alignment of the series.
pub fn trend_matrix(series: &[SectionSeries]) -> Option<String> {
    let first = series.first()?;
    let mut builder = Builder::default();

    let mut header: Vec<String> = vec!["Section".to_string()];
    header.extend(first.x.iter().map(|m| m.to_string()));
    builder.push_record(header);

    for s in series {
        let mut row: Vec<String> = vec![s.name.clone()];
        row.extend(s.y.iter().map(|y| format_number(*y, 0)));
        builder.push_record(row);
    }

    Some(builder.build().with(Style::markdown()).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MonthKey;

    #[test]
    fn csv_string_includes_header_and_rows() {
        let rows = vec![SectionStatRow {
            section: "A".into(),
            value: "1,000.00".into(),
        }];
        let text = to_csv_string(&rows).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Section,Value"));
        assert_eq!(lines.next(), Some("A,\"1,000.00\""));
    }

    #[test]
    fn empty_export_is_empty_text() {
        let rows: Vec<SectionStatRow> = Vec::new();
        assert_eq!(to_csv_string(&rows).unwrap(), "");
    }

    #[test]
    fn monthly_rows_carry_formatted_amounts() {
        let points = vec![SeriesPoint {
            x: MonthKey::new(2024, 1),
            y: 1234.5,
        }];
        let rows = monthly_total_rows(&points);
        assert_eq!(rows[0].month, "2024-01-01");
        assert_eq!(rows[0].total_amount, "1,234.50");
    }

    #[test]
    fn trend_matrix_is_none_without_series() {
        assert_eq!(trend_matrix(&[]), None);
    }

    #[test]
    fn trend_matrix_has_one_row_per_section() {
        let series = vec![
            SectionSeries {
                name: "A".into(),
                x: vec![MonthKey::new(2024, 1), MonthKey::new(2024, 2)],
                y: vec![1.0, 0.0],
            },
            SectionSeries {
                name: "B".into(),
                x: vec![MonthKey::new(2024, 1), MonthKey::new(2024, 2)],
                y: vec![0.0, 2.0],
            },
        ];
        let table = trend_matrix(&series).unwrap();
        assert!(table.contains("2024-01-01"));
        assert!(table.contains("| A "));
        assert!(table.contains("| B "));
    }
}
