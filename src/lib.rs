//! Period summaries for personal finance transactions.
//!
//! This library groups income and expense transactions into daily, weekly
//! (Sunday-anchored) or monthly totals. It also validates the raw records
//! handed over by a persistence layer and builds date-range summary reports.
//!
//! ```
//! use period_summary::{Amount, Transaction, summarize_by_month};
//! use time::macros::date;
//!
//! # fn main() -> Result<(), period_summary::Error> {
//! let transactions = vec![
//!     Transaction::income(date!(2024 - 03 - 01), Amount::from_cents(100_000)),
//!     Transaction::expense(date!(2024 - 03 - 15), Amount::from_cents(20_000)),
//! ];
//!
//! let summary = summarize_by_month(&transactions)?;
//!
//! let march = summary.get_by_str("2024-03").expect("March has transactions");
//! assert_eq!(march.net, Amount::from_cents(80_000));
//! assert_eq!(
//!     serde_json::to_string(&summary).unwrap(),
//!     r#"{"2024-03":{"income":1000.0,"expense":200.0,"net":800.0}}"#
//! );
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod amount;
mod config;
mod input;
mod period;
mod report;
mod summary;
mod timezone;
mod transaction;

pub use amount::{Amount, AmountError};
pub use config::{ErrorPolicy, SummaryConfig};
pub use input::{InputFormat, read_csv_records, read_json_records, read_records};
pub use period::{Granularity, PeriodLabel};
pub use report::{
    CategoryTotal, DailyNet, DateRange, RangePreset, SummaryReport, build_report, compute_range,
};
pub use summary::{
    Aggregation, PeriodBucket, PeriodSummary, aggregate_records, summarize, summarize_by_day,
    summarize_by_month, summarize_by_week,
};
pub use timezone::Timezone;
pub use transaction::{
    RecordAmount, RecordRef, Transaction, TransactionKind, TransactionRecord, ValidationError,
    ValidationErrorKind, validate_records,
};

/// The errors that may occur in the library.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A record handed to the aggregator could not be turned into a transaction.
    ///
    /// Only returned under [ErrorPolicy::FailFast], the collect policy reports
    /// invalid records alongside the partial summary instead.
    #[error(transparent)]
    InvalidRecord(#[from] ValidationError),

    /// A running total grew past [Amount::MAX].
    ///
    /// The string names the total, e.g. the period label or category.
    #[error("the total for {0} is too large")]
    TotalOutOfRange(String),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// The period granularity was not one of daily, weekly or monthly.
    #[error("unknown period granularity \"{0}\", expected daily, weekly or monthly")]
    InvalidGranularity(String),

    /// The string is not a period label of the given granularity.
    #[error("\"{0}\" is not a valid {1} period label")]
    InvalidPeriodLabel(String, Granularity),

    /// The error policy was not one of fail or collect.
    #[error("unknown error policy \"{0}\", expected fail or collect")]
    InvalidErrorPolicy(String),

    /// The date range preset is not recognised.
    #[error(
        "unknown range preset \"{0}\", expected last-7-days, last-30-days, this-month or year-to-date"
    )]
    InvalidRangePreset(String),

    /// The input format is not recognised.
    #[error("unknown input format \"{0}\", expected json or csv")]
    InvalidInputFormat(String),

    /// The JSON input could not be parsed as a list of transaction records.
    #[error("could not parse the JSON input: {0}")]
    InvalidJson(String),

    /// The CSV input could not be parsed as a list of transaction records.
    #[error("could not parse the CSV input: {0}")]
    InvalidCsv(String),

    /// The input could not be read.
    #[error("could not read the input: {0}")]
    Io(String),
}
