use std::{
    error::Error,
    fs::File,
    io::{self, BufReader, Write},
    path::PathBuf,
};

use clap::Parser;
use serde::Serialize;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use period_summary::{
    ErrorPolicy, Granularity, InputFormat, PeriodSummary, RangePreset, SummaryConfig,
    SummaryReport, Timezone, TransactionRecord, ValidationError, aggregate_records, build_report,
    compute_range, read_records, validate_records,
};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Summarize income and expense records by day, week or month.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the transaction records. Reads from stdin if not given.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// The format of the transaction records: json or csv.
    #[arg(long, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// The period to group transactions by: daily, weekly or monthly.
    #[arg(long, default_value_t = Granularity::Monthly)]
    freq: Granularity,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    #[arg(long, default_value = "Etc/UTC")]
    timezone: String,

    /// What to do with invalid records: fail or collect.
    #[arg(long, default_value_t = ErrorPolicy::FailFast)]
    on_error: ErrorPolicy,

    /// Print a report for a date range instead of the period summary:
    /// last-7-days, last-30-days, this-month or year-to-date.
    #[arg(long)]
    report: Option<RangePreset>,

    /// The date the report range ends on, as YYYY-MM-DD. Defaults to today in
    /// the local timezone.
    #[arg(long, value_parser = parse_date)]
    today: Option<Date>,
}

#[derive(Serialize)]
struct SummaryOutput {
    summary: PeriodSummary,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<String>,
}

#[derive(Serialize)]
struct ReportOutput {
    #[serde(flatten)]
    report: SummaryReport,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    rejected: Vec<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    setup_logging();

    let args = Args::parse();

    let config = SummaryConfig {
        timezone: Timezone::from_name(&args.timezone)?,
        granularity: args.freq,
        error_policy: args.on_error,
    };

    let records = load_records(&args)?;
    tracing::info!(
        "Loaded {} records, summarizing in {}",
        records.len(),
        config.timezone
    );

    let mut stdout = io::stdout().lock();

    match args.report {
        Some(preset) => {
            let today = args.today.unwrap_or_else(|| config.timezone.today());
            let range = compute_range(preset, today);
            let (transactions, rejected) =
                validate_records(&records, &config.timezone, config.error_policy)?;

            tracing::info!("Building report for {} ({range:?})", preset.label());
            let output = ReportOutput {
                report: build_report(&transactions, range)?,
                rejected: describe(&rejected),
            };

            serde_json::to_writer_pretty(&mut stdout, &output)?;
        }
        None => {
            let aggregation = aggregate_records(&records, &config)?;
            let output = SummaryOutput {
                summary: aggregation.summary,
                rejected: describe(&aggregation.rejected),
            };

            serde_json::to_writer_pretty(&mut stdout, &output)?;
        }
    }

    writeln!(stdout)?;

    Ok(())
}

fn describe(rejected: &[ValidationError]) -> Vec<String> {
    rejected.iter().map(ToString::to_string).collect()
}

fn load_records(args: &Args) -> Result<Vec<TransactionRecord>, Box<dyn Error>> {
    let records = match &args.input {
        Some(path) => {
            tracing::debug!("Reading transaction records from {path:#?}");
            let file = File::open(path).map_err(|error| {
                period_summary::Error::Io(format!("{}: {error}", path.display()))
            })?;
            read_records(BufReader::new(file), args.format)?
        }
        None => {
            tracing::debug!("Reading transaction records from stdin");
            read_records(io::stdin().lock(), args.format)?
        }
    };

    Ok(records)
}

fn parse_date(text: &str) -> Result<Date, String> {
    Date::parse(text, DATE_FORMAT).map_err(|error| format!("invalid date \"{text}\": {error}"))
}

fn setup_logging() {
    let stderr_log = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));

    tracing_subscriber::registry().with(stderr_log).init();
}

#[cfg(test)]
mod tests {
    use period_summary::{
        DateRange, ErrorPolicy, RecordAmount, Timezone, TransactionRecord, build_report,
        validate_records,
    };
    use time::macros::date;

    use super::{ReportOutput, describe};

    fn record(date: &str, kind: &str, amount: &str) -> TransactionRecord {
        TransactionRecord {
            id: Some(format!("{kind}-{date}")),
            date: date.to_owned(),
            kind: kind.to_owned(),
            amount: RecordAmount::Text(amount.to_owned()),
            category: None,
            description: None,
        }
    }

    #[test]
    fn report_output_lists_rejected_records() {
        let records = vec![
            record("2024-03-01", "income", "100"),
            record("2024-03-02", "refund", "30"),
        ];
        let (transactions, rejected) =
            validate_records(&records, &Timezone::Utc, ErrorPolicy::Collect).unwrap();
        let range = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 31),
        };

        let output = ReportOutput {
            report: build_report(&transactions, range).unwrap(),
            rejected: describe(&rejected),
        };
        let json = serde_json::to_value(&output).unwrap();

        assert_eq!(json["total_income"], serde_json::json!(100.0));
        assert_eq!(
            json["rejected"],
            serde_json::json!([
                "record 1 (id refund-2024-03-02): unrecognized transaction type \"refund\", expected income or expense"
            ])
        );
    }

    #[test]
    fn report_output_omits_rejected_when_all_records_are_valid() {
        let range = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 02),
        };

        let output = ReportOutput {
            report: build_report(&[], range).unwrap(),
            rejected: describe(&[]),
        };
        let json = serde_json::to_value(&output).unwrap();

        assert!(json.get("rejected").is_none());
        assert_eq!(json["range"]["end"], serde_json::json!("2024-03-02"));
    }
}
