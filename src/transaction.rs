//! Transactions and the raw records they are validated from.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

use crate::{Amount, AmountError, Error, ErrorPolicy, PeriodLabel, Timezone};

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");
const NAIVE_DATE_TIME_FORMAT: &[BorrowedFormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Whether money was earned or spent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money earned.
    Income,
    /// Money spent.
    Expense,
}

impl TransactionKind {
    /// Match the exact, lowercase type names used by stored records.
    fn from_record_type(text: &str) -> Option<Self> {
        match text {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => f.write_str("income"),
            Self::Expense => f.write_str("expense"),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transaction {
    /// The local calendar date the transaction happened on.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Whether the money was earned or spent.
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    /// How much money was earned or spent, never negative.
    pub amount: Amount,
    /// The category the transaction was filed under, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    /// Create an income transaction without a category or description.
    pub fn income(date: Date, amount: Amount) -> Self {
        Self::new(date, TransactionKind::Income, amount)
    }

    /// Create an expense transaction without a category or description.
    pub fn expense(date: Date, amount: Amount) -> Self {
        Self::new(date, TransactionKind::Expense, amount)
    }

    /// Create a transaction without a category or description.
    pub fn new(date: Date, kind: TransactionKind, amount: Amount) -> Self {
        Self {
            date,
            kind,
            amount,
            category: None,
            description: None,
        }
    }

    /// Set the category.
    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_owned());
        self
    }

    /// Set the description.
    pub fn description(mut self, description: &str) -> Self {
        self.description = Some(description.to_owned());
        self
    }
}

/// The amount of a record, as either a JSON number or a decimal string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordAmount {
    /// A number of whole currency units, rounded to the nearest cent.
    Number(f64),
    /// A decimal string with at most two decimal places.
    Text(String),
}

impl RecordAmount {
    fn to_amount(&self) -> Result<Amount, AmountError> {
        match self {
            Self::Number(value) => Amount::from_major(*value),
            Self::Text(text) => text.parse(),
        }
    }
}

impl fmt::Display for RecordAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(text) => write!(f, "{text:?}"),
        }
    }
}

/// A transaction as stored by the persistence layer, before validation.
///
/// Fields other than these are ignored when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// The identifier of the stored record, if known.
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// A date (`2024-03-01`) or date-time (`2024-03-01T09:30:00Z`).
    pub date: String,
    /// Either "income" or "expense".
    #[serde(rename = "type")]
    pub kind: String,
    /// How much money was earned or spent.
    pub amount: RecordAmount,
    /// The category the transaction was filed under.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// A text description of what the transaction was for.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl TransactionRecord {
    /// Validate the record and convert it to a [Transaction].
    ///
    /// `index` is the position of the record in its batch and is only used to
    /// identify the record in errors. Date-times with a UTC offset are
    /// converted to `timezone` before the date is taken.
    ///
    /// # Errors
    /// Returns a [ValidationError] if the date cannot be parsed, the type is
    /// not "income" or "expense", or the amount is negative or not a number
    /// of cents.
    pub fn validate(
        &self,
        index: usize,
        timezone: &Timezone,
    ) -> Result<Transaction, ValidationError> {
        let fail = |kind| self.error(index, kind);

        let date = parse_local_date(&self.date, timezone)
            .ok_or_else(|| fail(ValidationErrorKind::InvalidDate(self.date.clone())))?;

        let kind = TransactionKind::from_record_type(&self.kind)
            .ok_or_else(|| fail(ValidationErrorKind::UnrecognizedType(self.kind.clone())))?;

        let amount = self.amount.to_amount().map_err(|error| {
            fail(ValidationErrorKind::InvalidAmount(
                self.amount.to_string(),
                error,
            ))
        })?;

        if amount.is_negative() {
            return Err(fail(ValidationErrorKind::NegativeAmount(amount)));
        }

        Ok(Transaction {
            date,
            kind,
            amount,
            category: self.category.clone(),
            description: self.description.clone(),
        })
    }

    /// A [ValidationError] for this record at position `index`.
    pub(crate) fn error(&self, index: usize, kind: ValidationErrorKind) -> ValidationError {
        ValidationError {
            record: RecordRef {
                index,
                id: self.id.clone(),
            },
            kind,
        }
    }
}

/// Parse a date or date-time string to a date in the local calendar.
fn parse_local_date(text: &str, timezone: &Timezone) -> Option<Date> {
    let text = text.trim();

    if let Ok(date) = Date::parse(text, DATE_FORMAT) {
        return Some(date);
    }

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(timezone.to_local(date_time).date());
    }

    PrimitiveDateTime::parse(text, NAIVE_DATE_TIME_FORMAT)
        .ok()
        .map(|date_time| date_time.date())
}

/// Validate a batch of records, applying `error_policy` to invalid ones.
///
/// Returns the valid transactions in input order together with the errors for
/// the records that were skipped. The error list is always empty under
/// [ErrorPolicy::FailFast].
///
/// # Errors
/// Returns [Error::InvalidRecord] for the first invalid record under
/// [ErrorPolicy::FailFast].
pub fn validate_records(
    records: &[TransactionRecord],
    timezone: &Timezone,
    error_policy: ErrorPolicy,
) -> Result<(Vec<Transaction>, Vec<ValidationError>), Error> {
    let mut transactions = Vec::with_capacity(records.len());

    let rejected = for_each_record(records, error_policy, |index, record| {
        transactions.push(record.validate(index, timezone)?);
        Ok(())
    })?;

    Ok((transactions, rejected))
}

/// Run `handle` on every record, applying `error_policy` to the records it
/// fails on.
///
/// Returns the errors for the skipped records, always empty under
/// [ErrorPolicy::FailFast].
pub(crate) fn for_each_record<F>(
    records: &[TransactionRecord],
    error_policy: ErrorPolicy,
    mut handle: F,
) -> Result<Vec<ValidationError>, Error>
where
    F: FnMut(usize, &TransactionRecord) -> Result<(), ValidationError>,
{
    let mut rejected = Vec::new();

    for (index, record) in records.iter().enumerate() {
        if let Err(error) = handle(index, record) {
            match error_policy {
                ErrorPolicy::FailFast => return Err(error.into()),
                ErrorPolicy::Collect => {
                    tracing::warn!("Skipping invalid transaction record: {error}");
                    rejected.push(error);
                }
            }
        }
    }

    Ok(rejected)
}

/// Identifies a record within the batch it was supplied in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordRef {
    /// The zero-based position of the record in its batch.
    pub index: usize,
    /// The identifier of the stored record, if it had one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.id {
            Some(id) => write!(f, "record {} (id {id})", self.index),
            None => write!(f, "record {}", self.index),
        }
    }
}

/// A record that could not be turned into a transaction.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{record}: {kind}")]
pub struct ValidationError {
    /// The offending record.
    pub record: RecordRef,
    /// What was wrong with it.
    pub kind: ValidationErrorKind,
}

/// The reasons a record may fail validation.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// The date is not a `YYYY-MM-DD` date or an ISO 8601 date-time.
    #[error("could not parse the date \"{0}\"")]
    InvalidDate(String),

    /// The type was something other than "income" or "expense".
    #[error("unrecognized transaction type \"{0}\", expected income or expense")]
    UnrecognizedType(String),

    /// The amount could not be converted to cents.
    #[error("invalid amount {0}: {1}")]
    InvalidAmount(String, AmountError),

    /// The amount was below zero.
    #[error("amount {0} is negative")]
    NegativeAmount(Amount),

    /// Adding the record would push the totals of its period past [Amount::MAX].
    #[error("the totals for {0} would be too large")]
    TotalOutOfRange(PeriodLabel),
}
