//! Folds transactions into income, expense and net totals per calendar period.

use std::collections::{BTreeMap, btree_map};

use serde::Serialize;
use time::Date;

use crate::{
    Amount, AmountError, Error, Granularity, PeriodLabel, SummaryConfig, Transaction,
    TransactionKind, TransactionRecord, ValidationError, ValidationErrorKind,
    transaction::for_each_record,
};

/// The totals for one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PeriodBucket {
    /// The sum of income transactions.
    pub income: Amount,
    /// The sum of expense transactions.
    pub expense: Amount,
    /// Income minus expenses, updated as each transaction is added.
    pub net: Amount,
}

impl PeriodBucket {
    /// Add a transaction to the totals.
    ///
    /// # Errors
    /// Returns [AmountError::OutOfRange] and leaves the totals unchanged if a
    /// total would grow past [Amount::MAX].
    pub fn add(&mut self, transaction: &Transaction) -> Result<(), AmountError> {
        let amount = transaction.amount;

        *self = match transaction.kind {
            TransactionKind::Income => PeriodBucket {
                income: self.income.checked_add(amount)?,
                expense: self.expense,
                net: self.net.checked_add(amount)?,
            },
            TransactionKind::Expense => PeriodBucket {
                income: self.income,
                expense: self.expense.checked_add(amount)?,
                net: self.net.checked_sub(amount)?,
            },
        };

        Ok(())
    }

    /// Add the totals of another bucket to this one.
    ///
    /// # Errors
    /// Returns [AmountError::OutOfRange] and leaves the totals unchanged if a
    /// total would grow past [Amount::MAX].
    pub fn merge(&mut self, other: &PeriodBucket) -> Result<(), AmountError> {
        *self = PeriodBucket {
            income: self.income.checked_add(other.income)?,
            expense: self.expense.checked_add(other.expense)?,
            net: self.net.checked_add(other.net)?,
        };

        Ok(())
    }
}

/// Period totals keyed by period label, in chronological order.
///
/// Only periods that contain at least one transaction are present.
/// Serializes as an object keyed by the label strings, e.g.
/// `{"2024-03": {"income": 1000.0, "expense": 200.0, "net": 800.0}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PeriodSummary {
    buckets: BTreeMap<PeriodLabel, PeriodBucket>,
}

impl PeriodSummary {
    /// The totals for `label`, if any transactions fell in that period.
    pub fn get(&self, label: &PeriodLabel) -> Option<&PeriodBucket> {
        self.buckets.get(label)
    }

    /// The totals for the period with the display form `label`, e.g. "2024-03".
    pub fn get_by_str(&self, label: &str) -> Option<&PeriodBucket> {
        self.buckets
            .iter()
            .find(|(key, _)| key.to_string() == label)
            .map(|(_, bucket)| bucket)
    }

    /// The number of periods.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Whether there are no periods, i.e. no transactions were summarized.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// The periods and their totals in chronological order.
    pub fn iter(&self) -> btree_map::Iter<'_, PeriodLabel, PeriodBucket> {
        self.buckets.iter()
    }

    /// The labels of all periods in chronological order.
    pub fn labels(&self) -> impl Iterator<Item = &PeriodLabel> {
        self.buckets.keys()
    }

    /// The totals across every period.
    ///
    /// # Errors
    /// Returns [Error::TotalOutOfRange] if the grand totals grow past
    /// [Amount::MAX].
    pub fn totals(&self) -> Result<PeriodBucket, Error> {
        self.buckets
            .values()
            .try_fold(PeriodBucket::default(), |mut totals, bucket| {
                totals
                    .merge(bucket)
                    .map_err(|_| Error::TotalOutOfRange("all periods".to_owned()))?;
                Ok(totals)
            })
    }

    /// Combine two summaries by adding the totals of matching periods.
    ///
    /// Summarizing two lists separately and merging the results gives the same
    /// summary as summarizing the combined list.
    ///
    /// # Errors
    /// Returns [Error::TotalOutOfRange] naming the first period whose totals
    /// grow past [Amount::MAX].
    pub fn merge(mut self, other: PeriodSummary) -> Result<PeriodSummary, Error> {
        for (label, bucket) in other.buckets {
            self.buckets
                .entry(label)
                .or_default()
                .merge(&bucket)
                .map_err(|_| Error::TotalOutOfRange(label.to_string()))?;
        }

        Ok(self)
    }

    /// Add `transaction` to the period `label`.
    ///
    /// A failed add leaves the summary as it was, without an empty bucket.
    fn add(&mut self, label: PeriodLabel, transaction: &Transaction) -> Result<(), AmountError> {
        let mut bucket = self.buckets.get(&label).copied().unwrap_or_default();
        bucket.add(transaction)?;
        self.buckets.insert(label, bucket);

        Ok(())
    }
}

impl<'a> IntoIterator for &'a PeriodSummary {
    type Item = (&'a PeriodLabel, &'a PeriodBucket);
    type IntoIter = btree_map::Iter<'a, PeriodLabel, PeriodBucket>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter()
    }
}

/// The one fold behind every granularity: bucket each transaction under the
/// label `label_of` gives its date.
fn summarize_with<'a, I>(
    transactions: I,
    label_of: fn(Date) -> PeriodLabel,
) -> Result<PeriodSummary, Error>
where
    I: IntoIterator<Item = &'a Transaction>,
{
    transactions
        .into_iter()
        .try_fold(PeriodSummary::default(), |mut summary, transaction| {
            let label = label_of(transaction.date);
            summary
                .add(label, transaction)
                .map_err(|_| Error::TotalOutOfRange(label.to_string()))?;
            Ok(summary)
        })
}

/// Total transactions per calendar day, labelled `YYYY-MM-DD`.
///
/// # Errors
/// Returns [Error::TotalOutOfRange] if a day's totals grow past [Amount::MAX].
pub fn summarize_by_day(transactions: &[Transaction]) -> Result<PeriodSummary, Error> {
    summarize_with(transactions, PeriodLabel::day)
}

/// Total transactions per week, labelled by the week's starting Sunday as `YYYY-MM-DD`.
///
/// # Errors
/// Returns [Error::TotalOutOfRange] if a week's totals grow past [Amount::MAX].
pub fn summarize_by_week(transactions: &[Transaction]) -> Result<PeriodSummary, Error> {
    summarize_with(transactions, PeriodLabel::week)
}

/// Total transactions per calendar month, labelled `YYYY-MM`.
///
/// # Errors
/// Returns [Error::TotalOutOfRange] if a month's totals grow past [Amount::MAX].
pub fn summarize_by_month(transactions: &[Transaction]) -> Result<PeriodSummary, Error> {
    summarize_with(transactions, PeriodLabel::month)
}

/// Total transactions per period of `granularity`.
///
/// # Errors
/// Returns [Error::TotalOutOfRange] if a period's totals grow past [Amount::MAX].
pub fn summarize(
    transactions: &[Transaction],
    granularity: Granularity,
) -> Result<PeriodSummary, Error> {
    match granularity {
        Granularity::Daily => summarize_by_day(transactions),
        Granularity::Weekly => summarize_by_week(transactions),
        Granularity::Monthly => summarize_by_month(transactions),
    }
}

/// The result of summarizing a batch of raw records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// The totals of the valid records.
    pub summary: PeriodSummary,
    /// The records that were skipped, always empty when failing fast.
    pub rejected: Vec<ValidationError>,
}

/// Validate `records` and total them per period.
///
/// The granularity, timezone and error policy are taken from `config`. A
/// record that would push its period's totals past [Amount::MAX] is treated
/// like an invalid record.
///
/// # Errors
/// Returns [Error::InvalidRecord] for the first invalid record when the error
/// policy is [crate::ErrorPolicy::FailFast].
pub fn aggregate_records(
    records: &[TransactionRecord],
    config: &SummaryConfig,
) -> Result<Aggregation, Error> {
    let span = tracing::debug_span!(
        "aggregate_records",
        granularity = %config.granularity,
        timezone = %config.timezone,
    );
    let _enter = span.enter();

    tracing::debug!("Summarizing {} transaction records", records.len());

    let mut summary = PeriodSummary::default();
    let mut accepted = 0;

    let rejected = for_each_record(records, config.error_policy, |index, record| {
        let transaction = record.validate(index, &config.timezone)?;
        let label = config.granularity.label_for(transaction.date);

        summary
            .add(label, &transaction)
            .map_err(|_| record.error(index, ValidationErrorKind::TotalOutOfRange(label)))?;
        accepted += 1;

        Ok(())
    })?;

    tracing::debug!(
        "Summarized {accepted} transactions into {} periods, skipped {} records",
        summary.len(),
        rejected.len()
    );

    Ok(Aggregation { summary, rejected })
}
