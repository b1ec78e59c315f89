//! Money amounts stored as whole cents.

use std::{
    fmt,
    ops::{Add, Neg, Sub},
    str::FromStr,
};

use serde::{Serialize, Serializer};

/// The largest number of cents whose value in whole units is still printed to
/// the exact cent when written as an `f64`.
const MAX_EXACT_CENTS: i64 = 999_999_999_999_999;

/// An amount of money in cents.
///
/// Amounts are signed so that net totals may go below zero. Transaction
/// amounts are checked to be non-negative when records are validated.
///
/// Amounts serialize as a number of whole currency units, e.g. `12.34`.
/// Parsed amounts and running totals are kept within [Amount::MAX] so that
/// they serialize exactly; use [Amount::checked_add] and [Amount::checked_sub]
/// when accumulating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(i64);

impl Amount {
    /// No money at all.
    pub const ZERO: Amount = Amount(0);

    /// The largest amount that can be parsed or accumulated, in either direction.
    pub const MAX: Amount = Amount(MAX_EXACT_CENTS);

    /// Create an amount from a number of cents.
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Create an amount from a number of whole currency units, rounding to the
    /// nearest cent.
    ///
    /// # Errors
    /// Returns an [AmountError] if `value` is NaN, infinite or too large to be
    /// stored exactly.
    pub fn from_major(value: f64) -> Result<Self, AmountError> {
        if !value.is_finite() {
            return Err(AmountError::NotFinite);
        }

        let cents = (value * 100.0).round();

        if cents.abs() > MAX_EXACT_CENTS as f64 {
            return Err(AmountError::OutOfRange);
        }

        Ok(Self(cents as i64))
    }

    /// Add two amounts.
    ///
    /// # Errors
    /// Returns [AmountError::OutOfRange] if the sum is larger than [Amount::MAX]
    /// in either direction.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_add(rhs.0)
            .and_then(Self::within_range)
            .ok_or(AmountError::OutOfRange)
    }

    /// Subtract `rhs` from this amount.
    ///
    /// # Errors
    /// Returns [AmountError::OutOfRange] if the difference is larger than
    /// [Amount::MAX] in either direction.
    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, AmountError> {
        self.0
            .checked_sub(rhs.0)
            .and_then(Self::within_range)
            .ok_or(AmountError::OutOfRange)
    }

    fn within_range(cents: i64) -> Option<Amount> {
        (cents.unsigned_abs() <= MAX_EXACT_CENTS as u64).then_some(Amount(cents))
    }

    /// The amount in whole currency units.
    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Whether the amount is less than zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }
}

/// The reasons a value could not be converted to an [Amount].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum AmountError {
    /// The number was NaN or infinite.
    #[error("amount is not a finite number")]
    NotFinite,

    /// The number is too large to be stored exactly in cents.
    #[error("amount is too large")]
    OutOfRange,

    /// The text did not look like a decimal number.
    #[error("\"{0}\" is not a decimal number")]
    Malformed(String),

    /// The text had more than two digits after the decimal point.
    #[error("\"{0}\" has more than two decimal places")]
    TooPrecise(String),
}

impl FromStr for Amount {
    type Err = AmountError;

    /// Parse a decimal string such as `"12.34"`, `"-5"` or `".5"` exactly.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let trimmed = text.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));

        let is_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
            return Err(AmountError::Malformed(text.to_owned()));
        }

        if fraction.len() > 2 {
            return Err(AmountError::TooPrecise(text.to_owned()));
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| AmountError::OutOfRange)?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| AmountError::OutOfRange)? * 10,
            _ => fraction.parse().map_err(|_| AmountError::OutOfRange)?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|cents| cents.checked_add(fraction))
            .and_then(|cents| Self::within_range(if negative { -cents } else { cents }))
            .ok_or(AmountError::OutOfRange)?;

        Ok(cents)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        let cents = self.0.unsigned_abs();

        write!(f, "{sign}{}.{:02}", cents / 100, cents % 100)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.as_major())
    }
}

impl Add for Amount {
    type Output = Amount;

    fn add(self, rhs: Amount) -> Amount {
        Amount(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Amount;

    fn sub(self, rhs: Amount) -> Amount {
        Amount(self.0 - rhs.0)
    }
}

impl Neg for Amount {
    type Output = Amount;

    fn neg(self) -> Amount {
        Amount(-self.0)
    }
}
