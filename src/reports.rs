// Aggregators over canonical records.
//
// All functions here are pure and deterministic. They consume the
// filtered view (except `latest_period` and `last_twelve_months_series`,
// which scan the full set) and return zeroed/empty results for empty
// input, never panicking.
use crate::types::{CanonicalRecord, Kpi, KpiBadges, MonthKey, SectionSeries, SectionStat, SeriesPoint};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Headline summary of the filtered view. When every record has a zero
/// headcount, the record count stands in for it.
pub fn kpi_from_rows(rows: &[CanonicalRecord]) -> Kpi {
    let total_amount: f64 = rows.iter().map(|r| r.amount).sum();
    let total_count: f64 = rows.iter().map(|r| r.count).sum();
    let sections: HashSet<&str> = rows.iter().map(|r| r.section.as_str()).collect();
    Kpi {
        sections: sections.len(),
        total_amount,
        count: if total_count != 0.0 {
            total_count
        } else {
            rows.len() as f64
        },
    }
}

/// Total amount per month, chronologically sorted.
pub fn monthly_total_series(rows: &[CanonicalRecord]) -> Vec<SeriesPoint> {
    let mut by_month: BTreeMap<MonthKey, f64> = BTreeMap::new();
    for r in rows {
        *by_month.entry(r.month_key).or_insert(0.0) += r.amount;
    }
    by_month
        .into_iter()
        .map(|(x, y)| SeriesPoint { x, y })
        .collect()
}

/// One trend line per section, dense-aligned on the sorted union of all
/// month keys so multi-section charts share a single x axis. Sections
/// come out alphabetically; months a section has no records for are 0.
pub fn section_line_series(rows: &[CanonicalRecord]) -> Vec<SectionSeries> {
    let months: Vec<MonthKey> = rows
        .iter()
        .map(|r| r.month_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let mut bucket: HashMap<(&str, MonthKey), f64> = HashMap::new();
    for r in rows {
        *bucket.entry((r.section.as_str(), r.month_key)).or_insert(0.0) += r.amount;
    }

    let sections: BTreeSet<&str> = rows.iter().map(|r| r.section.as_str()).collect();
    sections
        .into_iter()
        .map(|name| SectionSeries {
            name: name.to_string(),
            x: months.clone(),
            y: months
                .iter()
                .map(|m| bucket.get(&(name, *m)).copied().unwrap_or(0.0))
                .collect(),
        })
        .collect()
}

// Sum a per-record value by section in first-seen order. First-seen
// order is what makes the later stable sorts (and the unsorted share
// report) deterministic.
fn sum_by_section(rows: &[CanonicalRecord], pick: fn(&CanonicalRecord) -> f64) -> Vec<SectionStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<SectionStat> = Vec::new();
    for r in rows {
        let i = *index.entry(r.section.as_str()).or_insert_with(|| {
            groups.push(SectionStat {
                section: r.section.clone(),
                value: 0.0,
            });
            groups.len() - 1
        });
        groups[i].value += pick(r);
    }
    groups
}

fn sort_descending(mut stats: Vec<SectionStat>) -> Vec<SectionStat> {
    // Stable: ties keep first-seen (input) order.
    stats.sort_by(|a, b| b.value.partial_cmp(&a.value).unwrap_or(Ordering::Equal));
    stats
}

/// Amount summed per section, descending.
pub fn section_totals(rows: &[CanonicalRecord]) -> Vec<SectionStat> {
    sort_descending(sum_by_section(rows, |r| r.amount))
}

fn mean_by_section(rows: &[CanonicalRecord], pick: fn(&CanonicalRecord) -> f64) -> Vec<SectionStat> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, f64, usize)> = Vec::new();
    for r in rows {
        let i = *index.entry(r.section.as_str()).or_insert_with(|| {
            groups.push((r.section.clone(), 0.0, 0));
            groups.len() - 1
        });
        groups[i].1 += pick(r);
        groups[i].2 += 1;
    }
    groups
        .into_iter()
        .map(|(section, sum, n)| SectionStat {
            section,
            value: if n == 0 { 0.0 } else { sum / n as f64 },
        })
        .collect()
}

/// Arithmetic mean of the `average` field per section, descending.
pub fn section_averages(rows: &[CanonicalRecord]) -> Vec<SectionStat> {
    sort_descending(mean_by_section(rows, |r| r.average))
}

/// Mean headcount per section, in stable first-seen order (feeds the
/// share/pie view, which carries its own ordering).
pub fn section_people_share(rows: &[CanonicalRecord]) -> Vec<SectionStat> {
    mean_by_section(rows, |r| r.count)
}

/// The chronologically last (year, month) present in the *unfiltered*
/// set; `None` when the dataset is empty.
pub fn latest_period(records: &[CanonicalRecord]) -> Option<(i32, u32)> {
    records.iter().map(|r| (r.year, r.month)).max()
}

/// Smallest and largest month present, defaulting to the full 1-12
/// range when the set is empty. Seeds the month-range filter after an
/// import.
pub fn month_bounds(records: &[CanonicalRecord]) -> (u32, u32) {
    let lo = records.iter().map(|r| r.month).min().unwrap_or(1);
    let hi = records.iter().map(|r| r.month).max().unwrap_or(12);
    (lo, hi)
}

/// Total amount per month over the last 12 distinct months of the
/// *unfiltered* set, chronologically sorted. Records outside that
/// window are excluded from the sums.
pub fn last_twelve_months_series(records: &[CanonicalRecord]) -> Vec<SeriesPoint> {
    let months: Vec<MonthKey> = records
        .iter()
        .map(|r| r.month_key)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut window: BTreeMap<MonthKey, f64> = months
        .into_iter()
        .rev()
        .take(12)
        .map(|m| (m, 0.0))
        .collect();

    for r in records {
        if let Some(total) = window.get_mut(&r.month_key) {
            *total += r.amount;
        }
    }
    window
        .into_iter()
        .map(|(x, y)| SeriesPoint { x, y })
        .collect()
}

/// Trend annotations computed from a monthly total series: last
/// month-over-month percent change, rounded mean per month, and the
/// first/last labels of the span. Zeroes and `None`s on short series.
pub fn kpi_badges(points: &[SeriesPoint]) -> KpiBadges {
    let n = points.len();
    let sum: f64 = points.iter().map(|p| p.y).sum();
    let avg_per_month = if n == 0 { 0.0 } else { (sum / n as f64).round() };
    let mom_pct = if n > 1 {
        let last = points[n - 1].y;
        let prev = points[n - 2].y;
        if prev != 0.0 {
            ((last - prev) / prev) * 100.0
        } else {
            0.0
        }
    } else {
        0.0
    };
    KpiBadges {
        mom_pct,
        avg_per_month,
        first: points.first().map(|p| p.x),
        last: points.last().map(|p| p.x),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn rec(section: &str, year: i32, month: u32, amount: f64, count: f64, avg: f64) -> CanonicalRecord {
        CanonicalRecord {
            section: section.to_string(),
            amount,
            count,
            average: avg,
            year,
            month,
            date: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            month_key: MonthKey::new(year, month),
        }
    }

    #[test]
    fn kpi_counts_sections_and_sums_amounts() {
        let rows = vec![
            rec("A", 2024, 1, 1000.0, 2.0, 0.0),
            rec("B", 2024, 1, 500.0, 3.0, 0.0),
            rec("A", 2024, 2, 250.0, 0.0, 0.0),
        ];
        let kpi = kpi_from_rows(&rows);
        assert_eq!(kpi.sections, 2);
        assert_eq!(kpi.total_amount, 1750.0);
        assert_eq!(kpi.count, 5.0);
    }

    #[test]
    fn kpi_falls_back_to_record_count_when_headcounts_are_zero() {
        let rows = vec![
            rec("A", 2024, 1, 10.0, 0.0, 0.0),
            rec("B", 2024, 2, 20.0, 0.0, 0.0),
        ];
        assert_eq!(kpi_from_rows(&rows).count, 2.0);
    }

    #[test]
    fn kpi_of_empty_set_is_zeroed() {
        let kpi = kpi_from_rows(&[]);
        assert_eq!(kpi.sections, 0);
        assert_eq!(kpi.total_amount, 0.0);
        assert_eq!(kpi.count, 0.0);
    }

    #[test]
    fn monthly_series_groups_and_sorts_chronologically() {
        let rows = vec![
            rec("A", 2024, 2, 500.0, 0.0, 0.0),
            rec("A", 2024, 1, 600.0, 0.0, 0.0),
            rec("B", 2024, 1, 400.0, 0.0, 0.0),
            rec("A", 2023, 12, 9.0, 0.0, 0.0),
        ];
        let series = monthly_total_series(&rows);
        let labels: Vec<String> = series.iter().map(|p| p.x.to_string()).collect();
        assert_eq!(labels, ["2023-12-01", "2024-01-01", "2024-02-01"]);
        assert_eq!(series[1].y, 1000.0);
        assert_eq!(series[2].y, 500.0);
        assert!(series.windows(2).all(|w| w[0].x <= w[1].x));
    }

    #[test]
    fn scenario_a_monthly_totals() {
        let rows = vec![
            rec("A", 2024, 1, 1000.0, 0.0, 0.0),
            rec("A", 2024, 2, 500.0, 0.0, 0.0),
        ];
        let series = monthly_total_series(&rows);
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].x.to_string(), "2024-01-01");
        assert_eq!(series[0].y, 1000.0);
        assert_eq!(series[1].x.to_string(), "2024-02-01");
        assert_eq!(series[1].y, 500.0);
    }

    #[test]
    fn section_series_are_dense_aligned() {
        let rows = vec![
            rec("B", 2024, 1, 10.0, 0.0, 0.0),
            rec("A", 2024, 2, 20.0, 0.0, 0.0),
            rec("B", 2024, 3, 30.0, 0.0, 0.0),
        ];
        let series = section_line_series(&rows);
        assert_eq!(series.len(), 2);
        // Alphabetical section order, shared month axis.
        assert_eq!(series[0].name, "A");
        assert_eq!(series[1].name, "B");
        for s in &series {
            assert_eq!(s.y.len(), s.x.len());
            assert_eq!(s.x.len(), 3);
        }
        assert_eq!(series[0].y, vec![0.0, 20.0, 0.0]);
        assert_eq!(series[1].y, vec![10.0, 0.0, 30.0]);
    }

    #[test]
    fn section_totals_sort_descending_with_stable_ties() {
        let rows = vec![
            rec("Low", 2024, 1, 5.0, 0.0, 0.0),
            rec("TieFirst", 2024, 1, 10.0, 0.0, 0.0),
            rec("TieSecond", 2024, 2, 10.0, 0.0, 0.0),
            rec("High", 2024, 3, 50.0, 0.0, 0.0),
        ];
        let totals = section_totals(&rows);
        let names: Vec<&str> = totals.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(names, ["High", "TieFirst", "TieSecond", "Low"]);
    }

    #[test]
    fn section_averages_take_the_mean_and_sort_descending() {
        let rows = vec![
            rec("A", 2024, 1, 0.0, 0.0, 10.0),
            rec("A", 2024, 2, 0.0, 0.0, 20.0),
            rec("B", 2024, 1, 0.0, 0.0, 40.0),
        ];
        let avgs = section_averages(&rows);
        assert_eq!(avgs[0].section, "B");
        assert_eq!(avgs[0].value, 40.0);
        assert_eq!(avgs[1].section, "A");
        assert_eq!(avgs[1].value, 15.0);
    }

    #[test]
    fn people_share_keeps_first_seen_order() {
        let rows = vec![
            rec("Z", 2024, 1, 0.0, 4.0, 0.0),
            rec("A", 2024, 1, 0.0, 2.0, 0.0),
            rec("Z", 2024, 2, 0.0, 6.0, 0.0),
        ];
        let share = section_people_share(&rows);
        assert_eq!(share[0].section, "Z");
        assert_eq!(share[0].value, 5.0);
        assert_eq!(share[1].section, "A");
        assert_eq!(share[1].value, 2.0);
    }

    #[test]
    fn latest_period_scans_the_full_set() {
        assert_eq!(latest_period(&[]), None);
        let rows = vec![
            rec("A", 2024, 3, 0.0, 0.0, 0.0),
            rec("A", 2023, 12, 0.0, 0.0, 0.0),
            rec("A", 2024, 1, 0.0, 0.0, 0.0),
        ];
        assert_eq!(latest_period(&rows), Some((2024, 3)));
    }

    #[test]
    fn month_bounds_default_to_full_range() {
        assert_eq!(month_bounds(&[]), (1, 12));
        let rows = vec![
            rec("A", 2024, 3, 0.0, 0.0, 0.0),
            rec("A", 2024, 7, 0.0, 0.0, 0.0),
        ];
        assert_eq!(month_bounds(&rows), (3, 7));
    }

    #[test]
    fn last_twelve_months_window_excludes_older_records() {
        let mut rows = Vec::new();
        for m in 1..=12 {
            rows.push(rec("A", 2024, m, 1.0, 0.0, 0.0));
        }
        rows.push(rec("A", 2023, 12, 99.0, 0.0, 0.0));
        let series = last_twelve_months_series(&rows);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0].x, MonthKey::new(2024, 1));
        assert_eq!(series[11].x, MonthKey::new(2024, 12));
        assert!(series.iter().all(|p| p.y == 1.0));
    }

    #[test]
    fn badges_cover_short_and_normal_series() {
        assert_eq!(kpi_badges(&[]).avg_per_month, 0.0);
        assert_eq!(kpi_badges(&[]).first, None);

        let points = vec![
            SeriesPoint {
                x: MonthKey::new(2024, 1),
                y: 100.0,
            },
            SeriesPoint {
                x: MonthKey::new(2024, 2),
                y: 150.0,
            },
        ];
        let badges = kpi_badges(&points);
        assert_eq!(badges.mom_pct, 50.0);
        assert_eq!(badges.avg_per_month, 125.0);
        assert_eq!(badges.first, Some(MonthKey::new(2024, 1)));
        assert_eq!(badges.last, Some(MonthKey::new(2024, 2)));
    }
}
