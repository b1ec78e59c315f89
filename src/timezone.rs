//! The local calendar that transaction dates are bucketed in.

use std::fmt;

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone, Tz};

use crate::Error;

/// The timezone whose calendar decides which day a transaction falls on.
///
/// Date-times that carry a UTC offset are converted to this timezone before
/// their date is taken, using the offset in effect at that instant so that
/// daylight saving changes are respected.
#[derive(Clone, Copy, Default)]
pub enum Timezone {
    /// Coordinated Universal Time.
    #[default]
    Utc,
    /// A timezone from the IANA timezone database.
    Named(&'static Tz),
}

impl Timezone {
    /// Look up a timezone by its canonical name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if the name is not in the timezone database.
    pub fn from_name(canonical_timezone: &str) -> Result<Self, Error> {
        match canonical_timezone {
            "UTC" | "Etc/UTC" => Ok(Self::Utc),
            name => time_tz::timezones::get_by_name(name)
                .map(Self::Named)
                .ok_or_else(|| Error::InvalidTimezone(name.to_owned())),
        }
    }

    /// The canonical name of the timezone.
    pub fn name(&self) -> &str {
        match self {
            Self::Utc => "Etc/UTC",
            Self::Named(tz) => tz.name(),
        }
    }

    /// The UTC offset of this timezone at the instant `date_time`.
    pub fn offset_at(&self, date_time: OffsetDateTime) -> UtcOffset {
        match self {
            Self::Utc => UtcOffset::UTC,
            Self::Named(tz) => tz.get_offset_utc(&date_time).to_utc(),
        }
    }

    /// Convert `date_time` to the local time of this timezone.
    pub fn to_local(&self, date_time: OffsetDateTime) -> OffsetDateTime {
        date_time.to_offset(self.offset_at(date_time))
    }

    /// Today's date in this timezone.
    pub fn today(&self) -> Date {
        self.to_local(OffsetDateTime::now_utc()).date()
    }
}

impl PartialEq for Timezone {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Timezone {}

impl fmt::Debug for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Timezone").field(&self.name()).finish()
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
