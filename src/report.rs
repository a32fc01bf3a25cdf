//! Plain-text reports
//!
//! Column layouts follow a fixed-width console format: a banner, a header
//! row, a dashed rule and one line per result row.

use std::io::{self, Write};

use chrono::{DateTime, Local};
use clap::ValueEnum;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use logtally_analytics::AnalyticsEngine;
use logtally_tui::bar;
use logtally_store::LogStore;
use logtally_types::{
    CorpusStats, DailyCount, ErrorGroup, HeatmapCell, HourlyCount, IpCount, ResourceStats,
    StatusShare,
};

const NO_DATA: &str = "No data available.";
const NO_ERRORS: &str = "No errors found in the logs.";
const BAR_CELLS: usize = 20;
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ranked rows shown by the summary report
pub const SUMMARY_TOP_N: usize = 5;

/// Reports available from `logtally report`
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportKind {
    #[value(alias = "top_n_ips")]
    TopIps,
    #[value(alias = "status_codes")]
    StatusCodes,
    #[value(alias = "hourly_traffic")]
    HourlyTraffic,
    #[value(alias = "daily_traffic")]
    DailyTraffic,
    #[value(alias = "resource_analysis")]
    ResourceAnalysis,
    #[value(alias = "error_analysis")]
    ErrorAnalysis,
    #[value(alias = "traffic_heatmap")]
    Heatmap,
    Summary,
}

/// Options shared by the report renderers
#[derive(Clone, Copy, Debug)]
pub struct ReportOptions {
    pub top_n: usize,
    pub days: u32,
}

/// Run one report against the engine and write it to `out`
pub fn write_report<S: LogStore, W: Write>(
    out: &mut W,
    engine: &AnalyticsEngine<S>,
    kind: ReportKind,
    opts: ReportOptions,
) -> anyhow::Result<()> {
    match kind {
        ReportKind::TopIps => write_top_ips(out, opts.top_n, &engine.top_ips(opts.top_n)?)?,
        ReportKind::StatusCodes => write_status_codes(out, &engine.status_distribution()?)?,
        ReportKind::HourlyTraffic => write_hourly_traffic(out, &engine.hourly_traffic()?)?,
        ReportKind::DailyTraffic => {
            write_daily_traffic(out, opts.days, &engine.daily_traffic(opts.days)?)?
        }
        ReportKind::ResourceAnalysis => {
            write_resource_analysis(out, opts.top_n, &engine.resource_analysis(opts.top_n)?)?
        }
        ReportKind::ErrorAnalysis => write_error_analysis(out, &engine.error_analysis()?)?,
        ReportKind::Heatmap => write_heatmap(out, &engine.traffic_heatmap()?)?,
        ReportKind::Summary => write_summary(out, engine, Local::now())?,
    }
    Ok(())
}

/// Corpus statistics followed by the core reports
pub fn write_summary<S: LogStore, W: Write>(
    out: &mut W,
    engine: &AnalyticsEngine<S>,
    now: DateTime<Local>,
) -> anyhow::Result<()> {
    banner(
        out,
        60,
        &[
            "LOG ANALYSIS SUMMARY REPORT".to_string(),
            format!("Generated on: {}", now.format(TIME_FORMAT)),
        ],
    )?;

    write_corpus_stats(out, &engine.corpus_stats()?)?;
    write_top_ips(out, SUMMARY_TOP_N, &engine.top_ips(SUMMARY_TOP_N)?)?;
    write_status_codes(out, &engine.status_distribution()?)?;
    write_hourly_traffic(out, &engine.hourly_traffic()?)?;
    write_error_analysis(out, &engine.error_analysis()?)?;

    banner(out, 60, &["END OF REPORT".to_string()])?;
    Ok(())
}

pub fn write_corpus_stats<W: Write>(out: &mut W, stats: &CorpusStats) -> io::Result<()> {
    writeln!(out)?;
    writeln!(out, "STORE STATISTICS:")?;
    writeln!(out, "Total log entries: {}", group_thousands(stats.total_records))?;
    writeln!(out, "Unique IP addresses: {}", group_thousands(stats.unique_ips))?;

    if let (Some(earliest), Some(latest)) = (stats.earliest, stats.latest) {
        writeln!(
            out,
            "Log period: {} to {}",
            earliest.format(TIME_FORMAT),
            latest.format(TIME_FORMAT)
        )?;
        let hours = (latest - earliest).num_hours().max(0);
        writeln!(out, "Duration: {} days, {} hours", hours / 24, hours % 24)?;
    }
    Ok(())
}

pub fn write_top_ips<W: Write>(out: &mut W, n: usize, rows: &[IpCount]) -> io::Result<()> {
    banner(out, 50, &[format!("TOP {} IP ADDRESSES BY REQUEST COUNT", n)])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(out, format!("{:<6} {:<15} {:<15}", "Rank", "IP Address", "Request Count"))?;
    rule(out, 40)?;
    for (i, row) in rows.iter().enumerate() {
        line(
            out,
            format!("{:<6} {:<15} {:<15}", i + 1, row.ip_address, row.request_count),
        )?;
    }
    Ok(())
}

pub fn write_status_codes<W: Write>(out: &mut W, rows: &[StatusShare]) -> io::Result<()> {
    banner(out, 50, &["HTTP STATUS CODE DISTRIBUTION".to_string()])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(out, format!("{:<12} {:<10} {:<12}", "Status Code", "Count", "Percentage"))?;
    rule(out, 35)?;
    for row in rows {
        line(
            out,
            format!(
                "{:<12} {:<10} {:<12}",
                row.status_code,
                row.count,
                format!("{}%", row.percentage)
            ),
        )?;
    }
    Ok(())
}

pub fn write_hourly_traffic<W: Write>(out: &mut W, rows: &[HourlyCount]) -> io::Result<()> {
    banner(out, 50, &["HOURLY TRAFFIC DISTRIBUTION".to_string()])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(out, format!("{:<6} {:<15} {:<30}", "Hour", "Request Count", "Bar Chart"))?;
    rule(out, 55)?;
    let max = rows.iter().map(|r| r.request_count).max().unwrap_or(0);
    for row in rows {
        line(
            out,
            format!(
                "{:<6} {:<15} {:<30}",
                format!("{:02}:00", row.hour),
                row.request_count,
                bar(row.request_count, max, BAR_CELLS)
            ),
        )?;
    }
    Ok(())
}

pub fn write_daily_traffic<W: Write>(
    out: &mut W,
    days: u32,
    rows: &[DailyCount],
) -> io::Result<()> {
    banner(out, 50, &[format!("DAILY TRAFFIC (LAST {} DAYS)", days)])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(out, format!("{:<12} {:<15} {:<30}", "Date", "Request Count", "Bar Chart"))?;
    rule(out, 60)?;
    let max = rows.iter().map(|r| r.request_count).max().unwrap_or(0);
    for row in rows {
        line(
            out,
            format!(
                "{:<12} {:<15} {:<30}",
                row.date.format("%Y-%m-%d").to_string(),
                row.request_count,
                bar(row.request_count, max, BAR_CELLS)
            ),
        )?;
    }
    Ok(())
}

pub fn write_resource_analysis<W: Write>(
    out: &mut W,
    n: usize,
    rows: &[ResourceStats],
) -> io::Result<()> {
    banner(out, 50, &[format!("TOP {} REQUESTED RESOURCES", n)])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(
        out,
        format!("{:<6} {:<40} {:<10} {:<12}", "Rank", "Resource", "Count", "Avg Size"),
    )?;
    rule(out, 70)?;
    for (i, row) in rows.iter().enumerate() {
        line(
            out,
            format!(
                "{:<6} {} {:<10} {:<12}",
                i + 1,
                fit(&row.resource, 40),
                row.request_count,
                row.avg_size
            ),
        )?;
    }
    Ok(())
}

pub fn write_error_analysis<W: Write>(out: &mut W, rows: &[ErrorGroup]) -> io::Result<()> {
    banner(out, 50, &["ERROR ANALYSIS (4xx & 5xx STATUS CODES)".to_string()])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_ERRORS);
    }

    line(
        out,
        format!("{:<12} {:<12} {:<40}", "Status Code", "Error Count", "Sample Resources"),
    )?;
    rule(out, 65)?;
    for row in rows {
        let samples = row.samples();
        let samples = if samples.is_empty() { "N/A".to_string() } else { samples };
        line(
            out,
            format!(
                "{:<12} {:<12} {}",
                row.status_code,
                row.error_count,
                fit(&samples, 40)
            ),
        )?;
    }
    Ok(())
}

pub fn write_heatmap<W: Write>(out: &mut W, rows: &[HeatmapCell]) -> io::Result<()> {
    banner(out, 50, &["TRAFFIC HEATMAP (DAY OF WEEK x HOUR)".to_string()])?;
    if rows.is_empty() {
        return writeln!(out, "{}", NO_DATA);
    }

    line(out, format!("{:<10} {:<6} {:<15}", "Day", "Hour", "Request Count"))?;
    rule(out, 40)?;
    for row in rows {
        line(
            out,
            format!(
                "{:<10} {:<6} {:<15}",
                row.day_name(),
                format!("{:02}:00", row.hour),
                row.request_count
            ),
        )?;
    }
    Ok(())
}

fn banner<W: Write>(out: &mut W, width: usize, titles: &[String]) -> io::Result<()> {
    let edge = "=".repeat(width);
    writeln!(out)?;
    writeln!(out, "{}", edge)?;
    for title in titles {
        writeln!(out, "{}", title)?;
    }
    writeln!(out, "{}", edge)
}

fn rule<W: Write>(out: &mut W, width: usize) -> io::Result<()> {
    writeln!(out, "{}", "-".repeat(width))
}

/// Write a row without the padding of its last column
fn line<W: Write>(out: &mut W, text: String) -> io::Result<()> {
    writeln!(out, "{}", text.trim_end())
}

/// Bar of up to 20 cells scaled against the largest row
/// Pad to `width` display columns, cutting long text to `width - 3`
/// columns plus "..."
fn fit(text: &str, width: usize) -> String {
    let mut fitted = if text.width() > width {
        let keep = width.saturating_sub(3);
        let mut cut = String::new();
        let mut used = 0;
        for c in text.chars() {
            let w = c.width().unwrap_or(0);
            if used + w > keep {
                break;
            }
            used += w;
            cut.push(c);
        }
        cut.push_str("...");
        cut
    } else {
        text.to_string()
    };

    let pad = width.saturating_sub(fitted.width());
    fitted.extend(std::iter::repeat_n(' ', pad));
    fitted
}

/// 1234567 -> "1,234,567"
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
