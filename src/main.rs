// Entry point and high-level console flow.
//
// This is the "rendering layer": it owns the canonical dataset and the
// active filter, and re-runs the pure pipeline (filter -> aggregate)
// whenever either changes. The pipeline modules themselves are
// stateless and re-entrant.
mod loader;
mod output;
mod reports;
mod schema;
mod transform;
mod types;
mod util;

use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::Mutex;
use types::{
    CanonicalRecord, FilterParams, NormalizeReport, RawRecord, SectionFilter, YearFilter,
};

// In-memory app state: the dataset is normalized once per import, while
// the dashboard can be re-rendered many times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| {
    Mutex::new(AppState {
        records: Vec::new(),
        report: None,
        filter: FilterParams::default(),
    })
});

struct AppState {
    records: Vec<CanonicalRecord>,
    report: Option<NormalizeReport>,
    filter: FilterParams,
}

/// Read a single line of input after printing a prompt.
fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

fn read_choice() -> String {
    read_line("Enter choice: ")
}

/// Replace the dataset wholesale with a freshly normalized batch and
/// re-seed the month-range filter from the data.
fn set_dataset(rows: Vec<RawRecord>) {
    let (records, report) = transform::normalize_rows(&rows);

    println!(
        "Processing dataset... ({} rows loaded, {} kept)",
        util::format_int(report.total_rows as i64),
        util::format_int(report.kept_rows as i64)
    );
    if report.dropped_sections > 0 {
        println!(
            "Note: {} rows dropped (empty section).",
            util::format_int(report.dropped_sections as i64)
        );
    }
    if report.invalid_dates > 0 {
        println!(
            "Note: {} rows had unparseable dates; the current month was substituted.",
            util::format_int(report.invalid_dates as i64)
        );
    }
    if report.date_source == types::DateSource::CurrentDate && report.kept_rows > 0 {
        println!("Warning: no year/month or date column found. Periods reflect the current date, not the data.");
    }
    println!();

    let (month_from, month_to) = reports::month_bounds(&records);
    let mut state = APP_STATE.lock().unwrap();
    state.records = records;
    state.report = Some(report);
    state.filter = FilterParams {
        month_from,
        month_to,
        ..FilterParams::default()
    };
}

/// Option [1]: auto-load from the data/ directory (JSON first, then CSV).
fn handle_auto_load() {
    let rows = loader::auto_load();
    if rows.is_empty() {
        println!("No auto-load data found (tried data/piecework.json, data/piecework.csv).\n");
        return;
    }
    set_dataset(rows);
}

/// Option [2]: import a CSV or JSON file by path.
fn handle_import() {
    let path = read_line("File to import (.csv or .json): ");
    if path.is_empty() {
        println!("Nothing imported.\n");
        return;
    }
    match loader::load_rows_from_path(&path) {
        Ok(rows) => set_dataset(rows),
        Err(e) => eprintln!("Failed to import file: {}\n", e),
    }
}

/// Option [3]: adjust the year/section/month-range filter. Blank input
/// keeps the current value.
fn handle_set_filter() {
    let mut state = APP_STATE.lock().unwrap();

    let year = read_line("Year filter ('all' or a year, blank to keep): ");
    match year.as_str() {
        "" => {}
        "all" => state.filter.year = YearFilter::All,
        other => match other.parse::<i32>() {
            Ok(y) => state.filter.year = YearFilter::Only(y),
            Err(_) => println!("Not a year: {}", other),
        },
    }

    let section = read_line("Section filter ('all' or a section name, blank to keep): ");
    match section.as_str() {
        "" => {}
        "all" => state.filter.section = SectionFilter::All,
        other => state.filter.section = SectionFilter::Named(other.to_string()),
    }

    let from = read_line("Month from (1-12, blank to keep): ");
    if let Ok(m) = from.parse::<u32>() {
        state.filter.month_from = m;
    }
    let to = read_line("Month to (1-12, blank to keep): ");
    if let Ok(m) = to.parse::<u32>() {
        state.filter.month_to = m;
    }
    if state.filter.month_from > state.filter.month_to {
        println!("Note: month range is swapped; it will match nothing until adjusted.");
    }
    println!();
}

/// Option [4]: render KPIs and all aggregate tables for the current
/// filtered view.
fn handle_dashboard() {
    let (records, report, filter) = {
        let state = APP_STATE.lock().unwrap();
        (
            state.records.clone(),
            state.report.clone(),
            state.filter.clone(),
        )
    };
    if records.is_empty() {
        println!("Error: No data loaded. Load or import a dataset first.\n");
        return;
    }

    let rows = transform::filter_rows(&records, &filter);
    let kpi = reports::kpi_from_rows(&rows);
    let monthly = reports::monthly_total_series(&rows);
    let badges = reports::kpi_badges(&monthly);

    println!("Piece Work Dashboard");
    println!("{}", describe_filter(&filter));
    if report.as_ref().is_some_and(|r| r.is_degraded()) {
        println!("(degraded periods: some or all dates were substituted at load time)");
    }
    println!();
    println!(
        "Sections: {}   Total amount: {}   People/records: {}",
        util::format_int(kpi.sections as i64),
        util::format_number(kpi.total_amount, 2),
        util::format_number(kpi.count, 0)
    );
    let span = match (badges.first, badges.last) {
        (Some(a), Some(b)) => format!("{} - {}", a, b),
        _ => "-".to_string(),
    };
    println!(
        "MoM: {}{}%   avg/mo: {}   span: {}\n",
        if badges.mom_pct >= 0.0 { "+" } else { "" },
        util::format_number(badges.mom_pct, 1),
        util::format_number(badges.avg_per_month, 0),
        span
    );

    println!("Monthly totals (filtered)");
    output::preview_table_rows(&output::monthly_total_rows(&monthly), 24);

    println!("Last 12 months (all data)");
    let last12 = reports::last_twelve_months_series(&records);
    output::preview_table_rows(&output::monthly_total_rows(&last12), 12);

    println!("Monthly trend per section (filtered)");
    match output::trend_matrix(&reports::section_line_series(&rows)) {
        Some(table) => println!("{}\n", table),
        None => println!("(no rows)\n"),
    }

    println!("Total amount per section");
    output::preview_table_rows(&output::section_stat_rows(&reports::section_totals(&rows), 2), 20);

    println!("Average per head per section");
    output::preview_table_rows(
        &output::section_stat_rows(&reports::section_averages(&rows), 2),
        20,
    );

    println!("Average headcount per section");
    output::preview_table_rows(
        &output::section_stat_rows(&reports::section_people_share(&rows), 1),
        20,
    );
}

/// Option [5]: focus the filter on the latest (year, month) in the
/// dataset, keeping months 1 through the latest month of that year.
fn handle_jump_to_latest() {
    let mut state = APP_STATE.lock().unwrap();
    match reports::latest_period(&state.records) {
        Some((year, month)) => {
            state.filter.year = YearFilter::Only(year);
            state.filter.month_from = 1;
            state.filter.month_to = month;
            println!("Filter set to year {}, months 1-{}.\n", year, month);
        }
        None => println!("No data loaded.\n"),
    }
}

/// Option [6]: back to all/all with the data's month bounds.
fn handle_reset_filter() {
    let mut state = APP_STATE.lock().unwrap();
    let (month_from, month_to) = reports::month_bounds(&state.records);
    state.filter = FilterParams {
        month_from,
        month_to,
        ..FilterParams::default()
    };
    println!("Filter reset.\n");
}

/// Option [7]: write the filtered canonical view to piecework_export.csv.
fn handle_export() {
    let (records, filter) = {
        let state = APP_STATE.lock().unwrap();
        (state.records.clone(), state.filter.clone())
    };
    if records.is_empty() {
        println!("Error: No data loaded. Load or import a dataset first.\n");
        return;
    }
    let rows = transform::filter_rows(&records, &filter);
    let path = "piecework_export.csv";
    let result = output::to_csv_string(&rows)
        .and_then(|text| std::fs::write(path, text).map_err(Into::into));
    match result {
        Ok(()) => println!(
            "Exported {} row(s) to {}.\n",
            util::format_int(rows.len() as i64),
            path
        ),
        Err(e) => eprintln!("Export failed: {}\n", e),
    }
}

fn describe_filter(filter: &FilterParams) -> String {
    let year = match filter.year {
        YearFilter::All => "all years".to_string(),
        YearFilter::Only(y) => format!("year {}", y),
    };
    let section = match &filter.section {
        SectionFilter::All => "all sections".to_string(),
        SectionFilter::Named(s) => format!("section '{}'", s),
    };
    format!(
        "({}, {}, months {}-{})",
        year, section, filter.month_from, filter.month_to
    )
}

fn main() {
    env_logger::init();

    loop {
        println!("Piece Work Report");
        println!("[1] Auto-load data (data/piecework.json or .csv)");
        println!("[2] Import a CSV/JSON file");
        println!("[3] Set filters");
        println!("[4] Show dashboard");
        println!("[5] Jump to latest period");
        println!("[6] Reset filters");
        println!("[7] Export filtered view to CSV");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_auto_load(),
            "2" => handle_import(),
            "3" => handle_set_filter(),
            "4" => handle_dashboard(),
            "5" => handle_jump_to_latest(),
            "6" => handle_reset_filter(),
            "7" => handle_export(),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-7.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_text_flows_through_the_whole_pipeline() {
        let csv = "Year,month,Section,Amount\n2024,1,A,\"1,000\"\n2024,2,A,500\n";
        let rows = loader::parse_csv_text(csv).unwrap();
        let records = transform::normalize(&rows);
        assert_eq!(records.len(), 2);

        let filtered = transform::filter_rows(
            &records,
            &FilterParams {
                year: YearFilter::Only(2024),
                month_from: 2,
                month_to: 2,
                ..FilterParams::default()
            },
        );
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].amount, 500.0);

        let series = reports::monthly_total_series(&records);
        assert_eq!(series[0].x.to_string(), "2024-01-01");
        assert_eq!(series[0].y, 1000.0);

        let text = output::to_csv_string(&filtered).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("section,amount,count,average,year,month,date,monthKey")
        );
        assert_eq!(lines.next(), Some("A,500.0,0.0,0.0,2024,2,2024-02-01,2024-02-01"));
    }

    #[test]
    fn filter_description_covers_both_forms() {
        assert_eq!(
            describe_filter(&FilterParams::default()),
            "(all years, all sections, months 1-12)"
        );
        let p = FilterParams {
            year: YearFilter::Only(2024),
            section: SectionFilter::Named("A".into()),
            month_from: 2,
            month_to: 5,
        };
        assert_eq!(describe_filter(&p), "(year 2024, section 'A', months 2-5)");
    }
}
