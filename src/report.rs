use std::fmt::Write;

use crate::aggregate::{aggregate, aggregate_by_period};
use crate::config::Config;
use crate::dates::Period;
use crate::listing::ListQuery;
use crate::models::{DateRange, Dimension, OperationRecord, StackedSummary};

const BAR_WIDTH: usize = 24;
const SECTION_LIMIT: usize = 10;

/// Renders a stacked summary as one line per group, with a bar scaled to the
/// largest group and the segment breakdown in descending order.
pub fn format_summary(summary: &StackedSummary, limit: usize) -> String {
    let mut output = String::new();
    let widest = summary.groups.iter().map(|g| g.label.chars().count()).max().unwrap_or(0);
    let largest = summary.groups.iter().map(|g| g.total).max().unwrap_or(0);

    for group in summary.groups.iter().take(limit) {
        let mut parts: Vec<(&String, &usize)> = group.by_segment.iter().collect();
        parts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        let breakdown = parts
            .iter()
            .map(|(label, count)| format!("{label} {count}"))
            .collect::<Vec<_>>()
            .join(" · ");

        let _ = writeln!(
            output,
            "{:<widest$}  {:>4}  {:<bar_width$}  {}",
            group.label,
            group.total,
            bar(group.total, largest),
            breakdown,
            bar_width = BAR_WIDTH,
        );
    }

    if summary.groups.len() > limit {
        let _ = writeln!(output, "… {} more", summary.groups.len() - limit);
    }
    output
}

fn bar(value: usize, largest: usize) -> String {
    if largest == 0 {
        return String::new();
    }
    let filled = (value * BAR_WIDTH).div_ceil(largest);
    "#".repeat(filled)
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn write_stacked(output: &mut String, summary: &StackedSummary, limit: usize, empty_note: &str) {
    if summary.groups.is_empty() {
        let _ = writeln!(output, "{empty_note}");
        return;
    }
    for group in summary.groups.iter().take(limit) {
        let segments = group
            .by_segment
            .iter()
            .map(|(label, count)| format!("{label} {count}"))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "- {}: {} ({})", group.label, group.total, segments);
    }
    if summary.groups.len() > limit {
        let _ = writeln!(output, "- … {} more", summary.groups.len() - limit);
    }
}

pub fn build_report(
    usina: Option<&str>,
    range: DateRange,
    records: &[OperationRecord],
    config: &Config,
) -> String {
    let query = ListQuery {
        usina: usina.map(str::to_string),
        range: Some(range),
        page_size: 5,
        ..ListQuery::default()
    };
    let in_window: Vec<OperationRecord> =
        records.iter().filter(|r| query.matches(r)).cloned().collect();

    let by_client = aggregate(
        &in_window,
        |r| Dimension::Usina.value(r),
        |r| Dimension::Cliente.value(r),
        &config.segment_fallback,
    );
    let by_type = aggregate(
        &in_window,
        |r| Dimension::Usina.value(r),
        |r| Dimension::Tipo.value(r),
        &config.type_fallback,
    );
    let weekly = aggregate_by_period(
        &in_window,
        Period::Week,
        |r| Dimension::Usina.value(r),
        &config.segment_fallback,
    );

    let mut output = String::new();
    let scope_label = usina.unwrap_or("all plants");

    let _ = writeln!(output, "# Solar Maintenance Report");
    let _ = writeln!(
        output,
        "Generated for {} ({} to {}, {} records)",
        scope_label,
        range.start,
        range.end,
        in_window.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Acionamentos by Plant and Client");
    write_stacked(&mut output, &by_client, SECTION_LIMIT, "No records in this window.");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Client Share");
    if by_client.segments.is_empty() {
        let _ = writeln!(output, "No records in this window.");
    } else {
        let whole = by_client.record_count();
        for segment in &by_client.segments {
            let _ = writeln!(
                output,
                "- {}: {} ({:.1}%)",
                segment.label,
                segment.total,
                share(segment.total, whole)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Service Requests by Plant and Type");
    write_stacked(&mut output, &by_type, SECTION_LIMIT, "No records in this window.");

    let _ = writeln!(output);
    let _ = writeln!(output, "## Weekly Evolution");
    // Every week in the window is listed.
    let weeks = weekly.groups.len();
    write_stacked(&mut output, &weekly, weeks, "No dated records in this window.");

    let recent = query.apply(records);
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Records");
    if recent.items.is_empty() {
        let _ = writeln!(output, "No records in this window.");
    } else {
        for record in &recent.items {
            let _ = writeln!(
                output,
                "- {} {} on {}: {}",
                record.id,
                record.usina.as_deref().unwrap_or("-"),
                record
                    .occurred_on
                    .map(|date| date.to_string())
                    .unwrap_or_else(|| "-".to_string()),
                record.note.as_deref().unwrap_or("(no note)")
            );
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DEFAULT_SEGMENT_FALLBACK;
    use chrono::NaiveDate;

    fn record(id: &str, usina: &str, cliente: &str, day: u32) -> OperationRecord {
        OperationRecord {
            id: id.to_string(),
            usina: Some(usina.to_string()),
            cliente: Some(cliente.to_string()),
            tipo: Some("Corretiva".to_string()),
            occurred_on: NaiveDate::from_ymd_opt(2024, 2, day),
            note: Some(format!("falha {id}")),
            ..OperationRecord::default()
        }
    }

    fn february() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
        }
    }

    #[test]
    fn report_lists_sections() {
        let records = vec![
            record("1", "RBB", "INEER", 5),
            record("2", "RBB", "KAMAI", 6),
            record("3", "ITU", "", 20),
        ];
        let report = build_report(None, february(), &records, &Config::default());

        assert!(report.starts_with("# Solar Maintenance Report"));
        assert!(report.contains("all plants (2024-02-01 to 2024-02-29, 3 records)"));
        assert!(report.contains("- RBB: 2 (INEER 1, KAMAI 1)"));
        assert!(report.contains("- ITU: 1 (SEM CLIENTE 1)"));
        assert!(report.contains("- INEER: 1 (33.3%)"));
        assert!(report.contains("- RBB: 2 (CORRETIVA 2)"));
        assert!(report.contains("- 2024-W06: 2 (RBB 2)"));
        assert!(report.contains("- 3 ITU on 2024-02-20: falha 3"));
    }

    #[test]
    fn report_scoped_to_plant_and_window() {
        let records = vec![record("1", "RBB", "INEER", 5), record("2", "ITU", "INEER", 6)];
        let range = DateRange {
            start: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 31).unwrap(),
        };
        let report = build_report(Some("rbb"), range, &records, &Config::default());
        assert!(report.contains("0 records"));
        assert!(report.contains("No dated records in this window."));
    }

    fn year_2024() -> DateRange {
        DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        }
    }

    #[test]
    fn weekly_evolution_keeps_latest_weeks() {
        let first = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let records: Vec<OperationRecord> = (0..15)
            .map(|week| OperationRecord {
                id: format!("w{week}"),
                usina: Some("RBB".to_string()),
                occurred_on: Some(first + chrono::Duration::weeks(week)),
                ..OperationRecord::default()
            })
            .collect();

        let report = build_report(None, year_2024(), &records, &Config::default());
        let weekly = report
            .split("## Weekly Evolution")
            .nth(1)
            .and_then(|rest| rest.split("## Recent Records").next())
            .unwrap();

        assert!(weekly.contains("- 2024-W01: 1 (RBB 1)"));
        assert!(weekly.contains("- 2024-W15: 1 (RBB 1)"));
        assert_eq!(weekly.lines().filter(|line| line.starts_with("- 2024-W")).count(), 15);
        assert!(!weekly.contains("more"));
    }

    #[test]
    fn long_plant_sections_note_the_rest() {
        let records: Vec<OperationRecord> = (1..=12)
            .map(|n| record(&n.to_string(), &format!("USINA {n:02}"), "INEER", 3))
            .collect();
        let report = build_report(None, year_2024(), &records, &Config::default());
        assert!(report.contains("- USINA 10: 1 (INEER 1)"));
        assert!(!report.contains("- USINA 11: 1 (INEER 1)"));
        assert!(report.contains("- … 2 more"));
    }

    #[test]
    fn type_fallback_comes_from_config() {
        let mut untyped = record("1", "ITU", "INEER", 8);
        untyped.tipo = None;
        let config = Config {
            type_fallback: "NAO CLASSIFICADA".to_string(),
            ..Config::default()
        };
        let report = build_report(None, february(), &[untyped], &config);
        assert!(report.contains("- ITU: 1 (NAO CLASSIFICADA 1)"));
    }

    #[test]
    fn summary_lines_scale_bars() {
        let records = vec![
            record("1", "RBB", "INEER", 5),
            record("2", "RBB", "KAMAI", 6),
            record("3", "ITU", "INEER", 7),
        ];
        let summary = aggregate(
            &records,
            |r| Dimension::Usina.value(r),
            |r| Dimension::Cliente.value(r),
            DEFAULT_SEGMENT_FALLBACK,
        );
        let text = format_summary(&summary, 1);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("RBB"));
        assert!(lines[0].contains(&"#".repeat(BAR_WIDTH)));
        assert!(lines[0].ends_with("INEER 1 · KAMAI 1"));
        assert_eq!(lines[1], "… 1 more");
        assert_eq!(bar(1, 2), "#".repeat(BAR_WIDTH / 2));
    }
}
