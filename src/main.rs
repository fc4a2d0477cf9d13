use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use tracing::{info, warn};

mod aggregate;
mod allocate;
mod config;
mod dates;
mod error;
mod ingest;
mod listing;
mod models;
mod report;
mod rounding;

use config::Config;
use dates::{Period, Preset};
use listing::ListQuery;
use models::{DateRange, Dimension, OperationRecord};

#[derive(Parser)]
#[command(name = "solar-ops")]
#[command(about = "Maintenance bookkeeping and dashboards for solar plants", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true, env = "SOLAR_OPS_CONFIG")]
    config: Option<PathBuf>,
    /// Reference date for presets (defaults to the local date)
    #[arg(long, global = true)]
    today: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct WindowArgs {
    #[arg(long, value_enum, conflicts_with = "start")]
    preset: Option<Preset>,
    #[arg(long, requires = "end")]
    start: Option<String>,
    #[arg(long, requires = "start")]
    end: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a date preset to a concrete range
    Range {
        #[arg(long, value_enum)]
        preset: Option<Preset>,
        /// Records used by the `all` preset
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// List every day of a range
    Days {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
    },
    /// Split a loss-hours total evenly across the days of a range
    Split {
        #[arg(long)]
        start: String,
        #[arg(long)]
        end: String,
        #[arg(long)]
        total: Decimal,
        #[arg(long, default_value = "")]
        usina: String,
        /// Write the plan as CSV instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Stacked totals of records by two dimensions
    Summary {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value = "usina")]
        group: Dimension,
        #[arg(long, value_enum, default_value = "cliente")]
        segment: Dimension,
        #[arg(long)]
        usina: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Stacked totals per week or month, oldest first
    Evolution {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, value_enum, default_value = "week")]
        period: Period,
        #[arg(long, value_enum, default_value = "usina")]
        segment: Dimension,
        #[arg(long)]
        usina: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long)]
        json: bool,
    },
    /// Show one page of filtered records
    List {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        usina: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Generate a markdown report
    Report {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        usina: Option<String>,
        #[command(flatten)]
        window: WindowArgs,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = Config::resolve(cli.config.as_deref()).context("failed to load configuration")?;
    config.logging.init();

    let today = match cli.today.as_deref() {
        Some(value) => dates::parse_iso_date(value)
            .with_context(|| format!("--today must be YYYY-MM-DD, got {value:?}"))?,
        None => chrono::Local::now().date_naive(),
    };

    match cli.command {
        Commands::Range {
            preset,
            input,
            json,
        } => {
            let records = match input {
                Some(path) => load(&path)?,
                None => Vec::new(),
            };
            let preset = preset.unwrap_or(config.default_preset);
            let range = preset.resolve_with(today, record_dates(&records));
            if json {
                println!("{}", serde_json::to_string(&range)?);
            } else {
                println!("{} {}", range.start, range.end);
            }
        }
        Commands::Days { start, end } => {
            let days = dates::enumerate_days(&start, &end);
            if days.is_empty() {
                warn!(start = %start, end = %end, "range is inverted or malformed");
            }
            for day in days {
                println!("{day}");
            }
        }
        Commands::Split {
            start,
            end,
            total,
            usina,
            out,
        } => {
            if total.is_sign_negative() {
                bail!("--total must not be negative, got {total}");
            }
            let range = dates::parse_range(&start, &end)?;
            let plan = allocate::build_plan(&usina, range, total)?;

            match out {
                Some(path) => {
                    let mut writer = csv::Writer::from_path(&path)
                        .with_context(|| format!("failed to create {}", path.display()))?;
                    for entry in &plan.entries {
                        writer.serialize(entry)?;
                    }
                    writer.flush()?;
                    println!(
                        "Wrote {} daily entries to {}.",
                        plan.entries.len(),
                        path.display()
                    );
                }
                None => {
                    for entry in &plan.entries {
                        println!(
                            "{}  {:>10}  {}",
                            entry.day,
                            rounding::format_amount(entry.amount),
                            entry.source_key
                        );
                    }
                    println!(
                        "Total {} over {} days.",
                        rounding::format_amount(plan.total),
                        plan.range.day_count()
                    );
                }
            }
        }
        Commands::Summary {
            input,
            group,
            segment,
            usina,
            window,
            limit,
            json,
        } => {
            let records = load(&input)?;
            let range = resolve_window(&window, today, config.default_preset, &records)?;
            let scoped = scope(&records, usina, range);
            let summary = aggregate::aggregate(
                &scoped,
                |r| group.value(r),
                |r| segment.value(r),
                &config.segment_fallback,
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.groups.is_empty() {
                println!("No records found for this window.");
            } else {
                println!(
                    "{} records by {} and {} ({} to {}):",
                    summary.record_count(),
                    group.title(),
                    segment.title(),
                    range.start,
                    range.end
                );
                print!("{}", report::format_summary(&summary, limit));
            }
        }
        Commands::Evolution {
            input,
            period,
            segment,
            usina,
            window,
            json,
        } => {
            let records = load(&input)?;
            let range = resolve_window(&window, today, config.default_preset, &records)?;
            let scoped = scope(&records, usina, range);
            let summary = aggregate::aggregate_by_period(
                &scoped,
                period,
                |r| segment.value(r),
                &config.segment_fallback,
            );

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else if summary.groups.is_empty() {
                println!("No dated records found for this window.");
            } else {
                print!("{}", report::format_summary(&summary, summary.groups.len()));
            }
        }
        Commands::List {
            input,
            search,
            usina,
            window,
            page,
            page_size,
            json,
        } => {
            let records = load(&input)?;
            let has_window = window.preset.is_some() || window.start.is_some();
            let range = if has_window {
                Some(resolve_window(&window, today, config.default_preset, &records)?)
            } else {
                None
            };
            let query = ListQuery {
                search,
                usina,
                range,
                page,
                page_size: page_size.unwrap_or(config.page_size),
            };
            let result = query.apply(&records);
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            for record in &result.items {
                println!(
                    "{:<12} {:<10} {:<12} {:<16} {:<14} {}",
                    record.id,
                    record
                        .occurred_on
                        .map(|date| date.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    record.usina.as_deref().unwrap_or("-"),
                    record.equipamento.as_deref().unwrap_or("-"),
                    record.cliente.as_deref().unwrap_or("-"),
                    record.status.as_deref().unwrap_or("-"),
                );
            }
            println!(
                "Page {} of {} ({} records).",
                result.page, result.total_pages, result.total_items
            );
        }
        Commands::Report {
            input,
            usina,
            window,
            out,
        } => {
            let records = load(&input)?;
            let range = resolve_window(&window, today, config.default_preset, &records)?;
            let report =
                report::build_report(usina.as_deref(), range, &records, &config);
            std::fs::write(&out, report)
                .with_context(|| format!("failed to write {}", out.display()))?;
            info!(path = %out.display(), "report written");
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<Vec<OperationRecord>> {
    ingest::load_records(path).with_context(|| format!("failed to read {}", path.display()))
}

fn record_dates(records: &[OperationRecord]) -> impl Iterator<Item = NaiveDate> + '_ {
    records.iter().filter_map(|record| record.occurred_on)
}

fn resolve_window(
    window: &WindowArgs,
    today: NaiveDate,
    default_preset: Preset,
    records: &[OperationRecord],
) -> anyhow::Result<DateRange> {
    if let (Some(start), Some(end)) = (window.start.as_deref(), window.end.as_deref()) {
        return Ok(dates::parse_range(start, end)?);
    }
    let preset = window.preset.unwrap_or(default_preset);
    Ok(preset.resolve_with(today, record_dates(records)))
}

fn scope(records: &[OperationRecord], usina: Option<String>, range: DateRange) -> Vec<OperationRecord> {
    let query = ListQuery {
        usina,
        range: Some(range),
        ..ListQuery::default()
    };
    records
        .iter()
        .filter(|record| query.matches(record))
        .cloned()
        .collect()
}
