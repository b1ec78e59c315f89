//! Calendar periods that transactions are grouped into.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize, Serializer};
use time::{
    Date, Duration, Weekday, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::Error;

const DATE_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// How long each period in a summary is.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// One period per calendar day.
    Daily,
    /// One period per week, starting on Sunday.
    Weekly,
    /// One period per calendar month.
    #[default]
    Monthly,
}

impl Granularity {
    /// The value used for this granularity in query strings and on the command line.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }

    /// The label of the period of this granularity that contains `date`.
    pub fn label_for(self, date: Date) -> PeriodLabel {
        match self {
            Self::Daily => PeriodLabel::day(date),
            Self::Weekly => PeriodLabel::week(date),
            Self::Monthly => PeriodLabel::month(date),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for Granularity {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" => Ok(Self::Daily),
            "weekly" | "week" => Ok(Self::Weekly),
            "monthly" | "month" => Ok(Self::Monthly),
            _ => Err(Error::InvalidGranularity(text.to_owned())),
        }
    }
}

/// Identifies one calendar period, e.g. the week starting on Sunday 3 March 2024.
///
/// A label always stores the first day of its period, so two dates in the
/// same period produce equal labels. Labels display as `YYYY-MM-DD` for days
/// and weeks (the week's Sunday) and as `YYYY-MM` for months.
///
/// Labels order chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeriodLabel {
    start: Date,
    granularity: Granularity,
}

impl PeriodLabel {
    /// The label for the day `date`.
    pub fn day(date: Date) -> Self {
        Self {
            start: date,
            granularity: Granularity::Daily,
        }
    }

    /// The label for the week containing `date`, identified by the Sunday that
    /// begins it.
    ///
    /// The Sunday may fall in the previous month or year.
    pub fn week(date: Date) -> Self {
        let days_since_sunday = date.weekday().number_days_from_sunday();

        Self {
            start: date.saturating_sub(Duration::days(days_since_sunday.into())),
            granularity: Granularity::Weekly,
        }
    }

    /// The label for the month containing `date`.
    pub fn month(date: Date) -> Self {
        let days_since_first = i64::from(date.day()) - 1;

        Self {
            start: date.saturating_sub(Duration::days(days_since_first)),
            granularity: Granularity::Monthly,
        }
    }

    /// Parse a label from its display form.
    ///
    /// # Errors
    /// Returns [Error::InvalidPeriodLabel] if `text` is not a date in the
    /// format of `granularity`, or if a weekly label is not a Sunday.
    pub fn parse(granularity: Granularity, text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidPeriodLabel(text.to_owned(), granularity);

        match granularity {
            Granularity::Daily => Date::parse(text, DATE_FORMAT)
                .map(Self::day)
                .map_err(|_| invalid()),
            Granularity::Weekly => {
                let date = Date::parse(text, DATE_FORMAT).map_err(|_| invalid())?;

                if date.weekday() != Weekday::Sunday {
                    return Err(invalid());
                }

                Ok(Self::week(date))
            }
            Granularity::Monthly => Date::parse(&format!("{text}-01"), DATE_FORMAT)
                .map(Self::month)
                .map_err(|_| invalid()),
        }
    }

    /// The first day of the period.
    pub fn start(&self) -> Date {
        self.start
    }

    /// The granularity of the period.
    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Whether `date` falls within the period.
    pub fn contains(&self, date: Date) -> bool {
        self.granularity.label_for(date) == *self
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let year = self.start.year();
        let month = u8::from(self.start.month());

        match self.granularity {
            Granularity::Daily | Granularity::Weekly => {
                write!(f, "{year:04}-{month:02}-{:02}", self.start.day())
            }
            Granularity::Monthly => write!(f, "{year:04}-{month:02}"),
        }
    }
}

impl Serialize for PeriodLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
