//! Settings that control how transaction records are summarized.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{Error, Granularity, Timezone};

/// What to do when a record fails validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole call on the first invalid record.
    #[default]
    FailFast,
    /// Skip invalid records and report them alongside the partial result.
    Collect,
}

impl ErrorPolicy {
    /// The value used for this policy on the command line.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::FailFast => "fail",
            Self::Collect => "collect",
        }
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}

impl FromStr for ErrorPolicy {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "fail" | "fail-fast" => Ok(Self::FailFast),
            "collect" => Ok(Self::Collect),
            _ => Err(Error::InvalidErrorPolicy(text.to_owned())),
        }
    }
}

/// The config for summarizing transaction records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SummaryConfig {
    /// The timezone whose calendar transactions are bucketed in.
    pub timezone: Timezone,
    /// The length of each period in the summary.
    pub granularity: Granularity,
    /// What to do with records that fail validation.
    pub error_policy: ErrorPolicy,
}

impl SummaryConfig {
    /// Create a config for the timezone with the canonical name `local_timezone`,
    /// e.g. "Pacific/Auckland", using monthly periods and failing fast.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezone] if the timezone name is not recognised.
    pub fn new(local_timezone: &str) -> Result<Self, Error> {
        Ok(Self {
            timezone: Timezone::from_name(local_timezone)?,
            ..Default::default()
        })
    }

    /// Use `granularity` for the summary periods.
    pub fn granularity(mut self, granularity: Granularity) -> Self {
        self.granularity = granularity;
        self
    }

    /// Use `error_policy` for invalid records.
    pub fn error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use crate::{Error, Granularity, Timezone};

    use super::{ErrorPolicy, SummaryConfig};

    #[test]
    fn default_config_is_monthly_utc_fail_fast() {
        let config = SummaryConfig::default();

        assert_eq!(config.timezone, Timezone::Utc);
        assert_eq!(config.granularity, Granularity::Monthly);
        assert_eq!(config.error_policy, ErrorPolicy::FailFast);
    }

    #[test]
    fn new_looks_up_timezone() {
        let config = SummaryConfig::new("Pacific/Auckland")
            .unwrap()
            .granularity(Granularity::Weekly)
            .error_policy(ErrorPolicy::Collect);

        assert_eq!(config.timezone.name(), "Pacific/Auckland");
        assert_eq!(config.granularity, Granularity::Weekly);
        assert_eq!(config.error_policy, ErrorPolicy::Collect);
    }

    #[test]
    fn new_rejects_unknown_timezone() {
        assert_eq!(
            SummaryConfig::new("Nowhere/Special"),
            Err(Error::InvalidTimezone("Nowhere/Special".to_owned()))
        );
    }

    #[test]
    fn error_policy_parses_command_line_values() {
        assert_eq!("fail".parse(), Ok(ErrorPolicy::FailFast));
        assert_eq!("fail-fast".parse(), Ok(ErrorPolicy::FailFast));
        assert_eq!("Collect".parse(), Ok(ErrorPolicy::Collect));
        assert_eq!(
            "ignore".parse::<ErrorPolicy>(),
            Err(Error::InvalidErrorPolicy("ignore".to_owned()))
        );
    }
}
