use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use sales_insights::config::{AppConfig, DashboardConfig};
use sales_insights::dashboard::report::percent;
use sales_insights::dashboard::{
    DashboardSummary, DatasetFilter, SalesDashboard, REQUIRED_COLUMNS,
};
use sales_insights::error::AppError;
use sales_insights::telemetry;
use std::io::{self, Write};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Spreadsheet to analyse (.xlsx or .csv)
    #[arg(long)]
    pub(crate) file: PathBuf,
    /// First day to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) from: Option<NaiveDate>,
    /// Last day to include (YYYY-MM-DD)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) to: Option<NaiveDate>,
    /// Restrict to a time of day; repeat for several
    #[arg(long)]
    pub(crate) time_of_day: Vec<String>,
    /// Restrict to a service type; repeat for several
    #[arg(long)]
    pub(crate) service_type: Vec<String>,
    /// Restrict to a customer type; repeat for several
    #[arg(long)]
    pub(crate) customer_type: Vec<String>,
    /// Restrict to an ad channel; repeat for several
    #[arg(long)]
    pub(crate) ad_channel: Vec<String>,
    /// Bundled share target in percent (defaults to APP_BUNDLED_TARGET)
    #[arg(long, value_parser = parse_percent)]
    pub(crate) bundled_target: Option<f64>,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub(crate) format: OutputFormat,
}

fn parse_percent(raw: &str) -> Result<f64, String> {
    DashboardConfig::parse_target_pct(raw).map_err(|err| err.to_string())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let ReportArgs {
        file,
        from,
        to,
        time_of_day,
        service_type,
        customer_type,
        ad_channel,
        bundled_target,
        format,
    } = args;

    let filter = DatasetFilter {
        from,
        to,
        time_of_day,
        service_type,
        customer_type,
        ad_channel,
    };
    let bundled_target = bundled_target
        .map(|pct| pct / 100.0)
        .unwrap_or_else(|| config.dashboard.bundled_target());

    let dashboard = SalesDashboard::from_path(&file)?;
    let summary = dashboard.summarize(&filter, bundled_target)?;

    match format {
        OutputFormat::Text => render_text(&mut io::stdout().lock(), &summary)?,
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    Ok(())
}

pub(crate) fn run_schema() {
    println!("Required columns");
    for column in REQUIRED_COLUMNS {
        println!("- {column}");
    }
}

/// Inserts thousands separators into a run of digits, e.g. `1234567` -> `1,234,567`.
fn group_digits(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, digit) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

fn count(value: u64) -> String {
    group_digits(&value.to_string())
}

/// Groups thousands, e.g. `1234567.891` with two decimals -> `1,234,567.89`.
fn group_thousands(value: f64, decimals: usize) -> String {
    let formatted = format!("{:.*}", decimals, value.abs());
    let mut grouped = match formatted.split_once('.') {
        Some((whole, fraction)) => format!("{}.{fraction}", group_digits(whole)),
        None => group_digits(&formatted),
    };
    if value < 0.0 && grouped.chars().any(|c| c != '0' && c != '.' && c != ',') {
        grouped.insert(0, '-');
    }
    grouped
}

fn currency(value: f64, decimals: usize) -> String {
    format!("${}", group_thousands(value, decimals))
}

pub(crate) fn render_text<W: Write>(out: &mut W, summary: &DashboardSummary) -> io::Result<()> {
    let kpis = &summary.report.kpis;

    writeln!(out, "Sales performance & upselling dashboard")?;
    writeln!(
        out,
        "Loaded {} rows. Showing {} rows after filters.",
        count(summary.loaded_rows as u64),
        count(summary.filtered_rows as u64)
    )?;
    if let Some(range) = &summary.date_range {
        writeln!(out, "Date range: {} -> {}", range.start, range.end)?;
    }
    if !summary.extra_columns.is_empty() {
        writeln!(out, "Ignored extra columns: {}", summary.extra_columns.join(", "))?;
    }

    writeln!(out, "\nKey metrics")?;
    writeln!(out, "- Total revenue: {}", currency(kpis.total_revenue, 0))?;
    writeln!(out, "- Conversions: {}", count(kpis.total_conversions))?;
    writeln!(
        out,
        "- Avg revenue / conversion: {}",
        currency(kpis.avg_revenue_per_conversion, 2)
    )?;
    writeln!(out, "- Ad spend: {}", currency(kpis.total_ad_spend, 0))?;
    writeln!(out, "- ROAS: {:.2}", kpis.roas)?;

    writeln!(out, "\nDaily revenue trend")?;
    if summary.report.daily_trend.is_empty() {
        writeln!(out, "- no rows match the current filters")?;
    }
    for point in &summary.report.daily_trend {
        writeln!(out, "- {}: {}", point.date, currency(point.revenue, 0))?;
    }

    writeln!(out, "\nProduct mix (revenue by service type)")?;
    for entry in &summary.report.product_mix {
        writeln!(
            out,
            "- {}: {} ({})",
            entry.service_type,
            currency(entry.revenue, 0),
            percent(entry.share)
        )?;
    }

    writeln!(out, "\nUpselling performance by time of day")?;
    for shift in &summary.report.shift_performance {
        writeln!(
            out,
            "- {}: {} bundled share, {} revenue, {} conversions, {} avg revenue / conversion",
            shift.shift,
            percent(shift.bundled_share),
            currency(shift.revenue, 0),
            count(shift.conversions),
            currency(shift.avg_revenue_per_conversion, 2)
        )?;
    }

    writeln!(out, "\nActionable insights")?;
    for message in &summary.insights.messages {
        writeln!(out, "- {message}")?;
    }

    writeln!(out, "\nRecommended actions")?;
    for action in &summary.insights.recommended_actions {
        writeln!(out, "- {action}")?;
    }

    Ok(())
}
