//! Summary reports over a date range: totals, savings, spending by category
//! and a daily timeline.

use std::{collections::HashMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    Amount, Error, PeriodLabel, PeriodSummary, Transaction, TransactionKind, summarize_by_day,
};

/// The category name used for expenses without a category.
pub(crate) const UNCATEGORIZED_LABEL: &str = "Other";

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Date ranges that can be computed relative to today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RangePreset {
    /// Today and the six days before it.
    #[serde(rename = "last-7-days")]
    LastSevenDays,
    /// Today and the 29 days before it.
    #[serde(rename = "last-30-days")]
    LastThirtyDays,
    /// From the first of the month until today.
    ThisMonth,
    /// From the first of January until today.
    YearToDate,
}

impl RangePreset {
    /// The value used for this preset in query strings and on the command line.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::LastSevenDays => "last-7-days",
            Self::LastThirtyDays => "last-30-days",
            Self::ThisMonth => "this-month",
            Self::YearToDate => "year-to-date",
        }
    }

    /// A human readable name for the preset.
    pub fn label(self) -> &'static str {
        match self {
            Self::LastSevenDays => "Last 7 days",
            Self::LastThirtyDays => "Last 30 days",
            Self::ThisMonth => "This month",
            Self::YearToDate => "Year to date",
        }
    }
}

impl fmt::Display for RangePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for RangePreset {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "last-7-days" => Ok(Self::LastSevenDays),
            "last-30-days" => Ok(Self::LastThirtyDays),
            "this-month" => Ok(Self::ThisMonth),
            "year-to-date" => Ok(Self::YearToDate),
            _ => Err(Error::InvalidRangePreset(text.to_owned())),
        }
    }
}

/// An inclusive range of dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// The first day in the range.
    #[serde(with = "iso_date")]
    pub start: Date,
    /// The last day in the range.
    #[serde(with = "iso_date")]
    pub end: Date,
}

impl DateRange {
    /// Whether `date` is within the range, including both ends.
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// The range `preset` describes when today is `today`.
pub fn compute_range(preset: RangePreset, today: Date) -> DateRange {
    let start = match preset {
        RangePreset::LastSevenDays => today.saturating_sub(Duration::days(6)),
        RangePreset::LastThirtyDays => today.saturating_sub(Duration::days(29)),
        RangePreset::ThisMonth => today.saturating_sub(Duration::days(i64::from(today.day()) - 1)),
        RangePreset::YearToDate => {
            today.saturating_sub(Duration::days(i64::from(today.ordinal()) - 1))
        }
    };

    DateRange { start, end: today }
}

/// The total spent in one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    /// The category name, "Other" for expenses without one.
    pub category: String,
    /// The sum of the expenses in the category.
    pub total: Amount,
}

/// The net amount for one day of a report's range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DailyNet {
    /// The day.
    #[serde(with = "iso_date")]
    pub date: Date,
    /// Income minus expenses on that day, zero if there were no transactions.
    pub net: Amount,
}

/// Totals, spending by category and a daily timeline for a date range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    /// The dates the report covers.
    pub range: DateRange,
    /// The sum of income in the range.
    pub total_income: Amount,
    /// The sum of expenses in the range.
    pub total_expense: Amount,
    /// Income minus expenses.
    pub net: Amount,
    /// The net as a percentage of income, 0 when there was no income.
    pub savings_rate: f64,
    /// A 0 to 100 score where a savings rate of 50% or more scores 100.
    ///
    /// Negative when more was spent than earned.
    pub health_score: i64,
    /// The expense with the largest amount, the earliest one if there is a tie.
    pub largest_expense: Option<Transaction>,
    /// Expenses grouped by category, largest first.
    pub expenses_by_category: Vec<CategoryTotal>,
    /// Income and expense per day, only for days with transactions.
    pub timeline: PeriodSummary,
    /// The net for every day in the range, including days without transactions.
    pub daily_net: Vec<DailyNet>,
    /// The transactions in the range, in input order.
    pub transactions: Vec<Transaction>,
}

/// The savings rate at which the health score is capped.
const FULL_HEALTH_SAVINGS_RATE: f64 = 50.0;

/// Build a report of the transactions that fall within `range`.
///
/// # Errors
/// Returns [Error::TotalOutOfRange] if a total grows past [Amount::MAX].
pub fn build_report(
    transactions: &[Transaction],
    range: DateRange,
) -> Result<SummaryReport, Error> {
    let in_range: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| range.contains(transaction.date))
        .cloned()
        .collect();

    let timeline = summarize_by_day(&in_range)?;
    let totals = timeline.totals()?;
    let savings_rate = savings_rate(totals.net, totals.income);

    Ok(SummaryReport {
        range,
        total_income: totals.income,
        total_expense: totals.expense,
        net: totals.net,
        savings_rate,
        health_score: health_score(savings_rate),
        largest_expense: largest_expense(&in_range).cloned(),
        expenses_by_category: group_expenses_by_category(&in_range)?,
        daily_net: daily_net(&timeline, range),
        timeline,
        transactions: in_range,
    })
}

fn savings_rate(net: Amount, income: Amount) -> f64 {
    if income == Amount::ZERO {
        return 0.0;
    }

    net.cents() as f64 * 100.0 / income.cents() as f64
}

fn health_score(savings_rate: f64) -> i64 {
    let capped = savings_rate.min(FULL_HEALTH_SAVINGS_RATE);

    (capped / FULL_HEALTH_SAVINGS_RATE * 100.0).round() as i64
}

/// Zero-amount expenses are never the largest.
fn largest_expense(transactions: &[Transaction]) -> Option<&Transaction> {
    transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
        .fold(None, |largest: Option<&Transaction>, transaction| {
            let current_max = largest.map_or(Amount::ZERO, |t| t.amount);

            if transaction.amount > current_max {
                Some(transaction)
            } else {
                largest
            }
        })
}

fn daily_net(timeline: &PeriodSummary, range: DateRange) -> Vec<DailyNet> {
    let mut days = Vec::new();
    let mut date = range.start;

    while date <= range.end {
        let net = timeline
            .get(&PeriodLabel::day(date))
            .map_or(Amount::ZERO, |bucket| bucket.net);
        days.push(DailyNet { date, net });

        match date.next_day() {
            Some(next) => date = next,
            None => break,
        }
    }

    days
}

fn group_expenses_by_category(
    transactions: &[Transaction],
) -> Result<Vec<CategoryTotal>, Error> {
    let mut totals: HashMap<&str, Amount> = HashMap::new();

    for transaction in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense)
    {
        let category = transaction
            .category
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(UNCATEGORIZED_LABEL);
        let total = totals.entry(category).or_default();
        *total = total
            .checked_add(transaction.amount)
            .map_err(|_| Error::TotalOutOfRange(category.to_owned()))?;
    }

    let mut categories: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(category, total)| CategoryTotal {
            category: category.to_owned(),
            total,
        })
        .collect();

    categories.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.category.cmp(&b.category)));
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use time::macros::date;

    use crate::{Amount, Error, Transaction};

    use super::{
        CategoryTotal, DailyNet, DateRange, RangePreset, UNCATEGORIZED_LABEL, build_report,
        compute_range,
    };

    fn dollars(amount: i64) -> Amount {
        Amount::from_cents(amount * 100)
    }

    #[test]
    fn last_seven_days_includes_today() {
        let range = compute_range(RangePreset::LastSevenDays, date!(2024 - 03 - 05));

        assert_eq!(
            range,
            DateRange {
                start: date!(2024 - 02 - 28),
                end: date!(2024 - 03 - 05),
            }
        );
    }

    #[test]
    fn last_thirty_days_spans_thirty_days() {
        let range = compute_range(RangePreset::LastThirtyDays, date!(2024 - 03 - 30));

        assert_eq!(range.start, date!(2024 - 03 - 01));
        assert_eq!(range.end, date!(2024 - 03 - 30));
    }

    #[test]
    fn this_month_starts_on_the_first() {
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 02 - 29));

        assert_eq!(range.start, date!(2024 - 02 - 01));
        assert_eq!(range.end, date!(2024 - 02 - 29));
    }

    #[test]
    fn year_to_date_starts_on_first_of_january() {
        let range = compute_range(RangePreset::YearToDate, date!(2024 - 12 - 31));

        assert_eq!(range.start, date!(2024 - 01 - 01));
        assert_eq!(range.end, date!(2024 - 12 - 31));
    }

    #[test]
    fn range_presets_parse() {
        assert_eq!("last-7-days".parse(), Ok(RangePreset::LastSevenDays));
        assert_eq!("YEAR-TO-DATE".parse(), Ok(RangePreset::YearToDate));
        assert_eq!(
            "forever".parse::<RangePreset>(),
            Err(Error::InvalidRangePreset("forever".to_owned()))
        );
    }

    #[test]
    fn report_only_includes_transactions_in_range() {
        let transactions = vec![
            Transaction::income(date!(2024 - 02 - 29), dollars(500)),
            Transaction::income(date!(2024 - 03 - 01), dollars(1000)),
            Transaction::expense(date!(2024 - 03 - 10), dollars(40)).category("Food"),
            Transaction::expense(date!(2024 - 03 - 31), dollars(60)).category("Rent"),
            Transaction::expense(date!(2024 - 04 - 01), dollars(999)).category("Rent"),
        ];
        let range = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 31),
        };

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(report.transactions.len(), 3);
        assert_eq!(report.total_income, dollars(1000));
        assert_eq!(report.total_expense, dollars(100));
        assert_eq!(report.net, dollars(900));
        assert_eq!(report.timeline.len(), 3);
        assert_eq!(report.timeline.totals().unwrap().net, report.net);
    }

    #[test]
    fn expenses_are_grouped_by_category_largest_first() {
        let transactions = vec![
            Transaction::expense(date!(2024 - 03 - 01), dollars(10)).category("Food"),
            Transaction::expense(date!(2024 - 03 - 02), dollars(30)).category("Fuel"),
            Transaction::expense(date!(2024 - 03 - 03), dollars(25)).category("Food"),
            Transaction::expense(date!(2024 - 03 - 04), dollars(5)),
            Transaction::expense(date!(2024 - 03 - 05), dollars(30)).category("Books"),
            Transaction::income(date!(2024 - 03 - 06), dollars(1000)).category("Salary"),
        ];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(
            report.expenses_by_category,
            vec![
                CategoryTotal {
                    category: "Food".to_owned(),
                    total: dollars(35),
                },
                CategoryTotal {
                    category: "Books".to_owned(),
                    total: dollars(30),
                },
                CategoryTotal {
                    category: "Fuel".to_owned(),
                    total: dollars(30),
                },
                CategoryTotal {
                    category: UNCATEGORIZED_LABEL.to_owned(),
                    total: dollars(5),
                },
            ]
        );
    }

    #[test]
    fn empty_range_gives_empty_report() {
        let transactions = vec![Transaction::income(date!(2024 - 01 - 01), dollars(10))];
        let range = compute_range(RangePreset::LastSevenDays, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert!(report.transactions.is_empty());
        assert!(report.timeline.is_empty());
        assert!(report.expenses_by_category.is_empty());
        assert_eq!(report.net, Amount::ZERO);
    }

    #[test]
    fn report_serializes_range_as_dates() {
        let range = DateRange {
            start: date!(2024 - 03 - 01),
            end: date!(2024 - 03 - 07),
        };

        let json = serde_json::to_value(build_report(&[], range).unwrap()).unwrap();

        assert_eq!(
            json["range"],
            serde_json::json!({ "start": "2024-03-01", "end": "2024-03-07" })
        );
        assert_eq!(json["timeline"], serde_json::json!({}));
        assert_eq!(json["daily_net"].as_array().map(Vec::len), Some(7));
        assert_eq!(json["largest_expense"], serde_json::Value::Null);
    }

    #[test]
    fn daily_net_covers_every_day_in_range() {
        let transactions = vec![
            Transaction::income(date!(2024 - 02 - 28), dollars(100)),
            Transaction::expense(date!(2024 - 02 - 28), dollars(30)),
            Transaction::expense(date!(2024 - 03 - 02), dollars(45)),
        ];
        let range = DateRange {
            start: date!(2024 - 02 - 27),
            end: date!(2024 - 03 - 02),
        };

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(
            report.daily_net,
            vec![
                DailyNet {
                    date: date!(2024 - 02 - 27),
                    net: Amount::ZERO,
                },
                DailyNet {
                    date: date!(2024 - 02 - 28),
                    net: dollars(70),
                },
                DailyNet {
                    date: date!(2024 - 02 - 29),
                    net: Amount::ZERO,
                },
                DailyNet {
                    date: date!(2024 - 03 - 01),
                    net: Amount::ZERO,
                },
                DailyNet {
                    date: date!(2024 - 03 - 02),
                    net: dollars(-45),
                },
            ]
        );
        // The timeline itself only has the days with transactions.
        assert_eq!(report.timeline.len(), 2);
    }

    #[test]
    fn savings_rate_and_health_score() {
        let transactions = vec![
            Transaction::income(date!(2024 - 03 - 01), dollars(1000)),
            Transaction::expense(date!(2024 - 03 - 02), dollars(800)),
        ];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(report.savings_rate, 20.0);
        assert_eq!(report.health_score, 40);
    }

    #[test]
    fn health_score_is_capped_at_fifty_percent_savings() {
        let transactions = vec![
            Transaction::income(date!(2024 - 03 - 01), dollars(1000)),
            Transaction::expense(date!(2024 - 03 - 02), dollars(100)),
        ];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(report.savings_rate, 90.0);
        assert_eq!(report.health_score, 100);
    }

    #[test]
    fn savings_rate_is_zero_without_income() {
        let transactions = vec![Transaction::expense(date!(2024 - 03 - 02), dollars(100))];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(report.savings_rate, 0.0);
        assert_eq!(report.health_score, 0);
    }

    #[test]
    fn largest_expense_prefers_the_earliest_of_equal_amounts() {
        let transactions = vec![
            Transaction::income(date!(2024 - 03 - 01), dollars(5000)),
            Transaction::expense(date!(2024 - 03 - 02), dollars(20)).category("Food"),
            Transaction::expense(date!(2024 - 03 - 03), dollars(350)).category("Rent"),
            Transaction::expense(date!(2024 - 03 - 04), dollars(350)).category("Car"),
            Transaction::expense(date!(2024 - 04 - 01), dollars(900)).category("Rent"),
        ];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(
            report.largest_expense,
            Some(Transaction::expense(date!(2024 - 03 - 03), dollars(350)).category("Rent"))
        );
    }

    #[test]
    fn zero_amount_expense_is_never_the_largest() {
        let transactions = vec![Transaction::expense(date!(2024 - 03 - 02), Amount::ZERO)];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let report = build_report(&transactions, range).unwrap();

        assert_eq!(report.largest_expense, None);
    }

    #[test]
    fn totals_past_max_are_an_error() {
        let transactions = vec![
            Transaction::expense(date!(2024 - 03 - 01), Amount::MAX).category("Rent"),
            Transaction::expense(date!(2024 - 03 - 02), Amount::MAX).category("Rent"),
        ];
        let range = compute_range(RangePreset::ThisMonth, date!(2024 - 03 - 31));

        let result = build_report(&transactions, range);

        assert!(matches!(result, Err(Error::TotalOutOfRange(_))));
    }
}
