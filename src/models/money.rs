//! Money type for check amounts
//!
//! Amounts are stored in minor units (centimes) as i64 to avoid
//! floating-point precision issues. The currency itself is carried
//! separately on the check; `Money` only knows about the number.

use rusqlite::types::{FromSql, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// A monetary amount stored as minor units (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Largest amount a single check may carry: 99 999 999 999.99
    ///
    /// Keeps sums over any realistic number of checks inside `i64`.
    pub const MAX: Money = Money(9_999_999_999_999);

    /// Create a Money amount from minor units
    ///
    /// # Examples
    /// ```
    /// use checkdesk::models::Money;
    /// let amount = Money::from_minor(150_000); // 1500.00
    /// assert_eq!(amount.to_string(), "1500.00");
    /// ```
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Create a Money amount from whole units and minor units
    pub const fn from_units(units: i64, minor: i64) -> Self {
        Self(units * 100 + minor)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in minor units
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Get the whole units portion (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Get the minor portion (0-99)
    pub const fn minor_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// Amount as a float in major units, for ratios and charts only
    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "1234.50", "1234,50", "1 234,50", "1,234.50", "1.234,50"
    /// and plain integers ("1500" means 1500.00). When both `.` and `,`
    /// appear, the last one is the decimal mark and the other groups
    /// thousands. More than two fraction digits is an error, as is a
    /// magnitude above [`Money::MAX`]. A trailing currency code such as
    /// "MAD" is ignored.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let original = s;
        let invalid = || MoneyParseError::InvalidFormat(original.trim().to_string());

        let trimmed = s
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_alphabetic())
            .trim();

        let (negative, body) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };

        // Drop grouping spaces, including the non-breaking ones spreadsheets emit
        let compact: String = body
            .chars()
            .filter(|c| !matches!(c, ' ' | '\u{a0}' | '\u{202f}'))
            .collect();

        let normalized = match (compact.rfind('.'), compact.rfind(',')) {
            (Some(dot), Some(comma)) if comma > dot => compact.replace('.', "").replace(',', "."),
            (Some(_), Some(_)) => compact.replace(',', ""),
            (None, Some(_)) => compact.replace(',', "."),
            _ => compact,
        };

        if normalized.is_empty() {
            return Err(invalid());
        }

        let minor = match normalized.split_once('.') {
            Some((whole, frac)) => {
                if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                if !whole.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                let whole: i64 = if whole.is_empty() {
                    0
                } else {
                    whole.parse().map_err(|_| invalid())?
                };
                let frac_minor: i64 = match frac.len() {
                    0 => 0,
                    1 => frac.parse::<i64>().map_err(|_| invalid())? * 10,
                    _ => frac.parse().map_err(|_| invalid())?,
                };
                whole
                    .checked_mul(100)
                    .and_then(|w| w.checked_add(frac_minor))
                    .ok_or_else(invalid)?
            }
            None => {
                if !normalized.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                normalized
                    .parse::<i64>()
                    .map_err(|_| invalid())?
                    .checked_mul(100)
                    .ok_or_else(invalid)?
            }
        };

        if minor > Self::MAX.0 {
            return Err(MoneyParseError::OutOfRange(original.trim().to_string()));
        }

        Ok(Self(if negative { -minor } else { minor }))
    }

    /// Whether the magnitude is within [`Money::MAX`]
    pub fn in_range(&self) -> bool {
        self.0.checked_abs().is_some_and(|abs| abs <= Self::MAX.0)
    }

    /// Format with a trailing currency code, e.g. "1 500.00 MAD"
    pub fn format_with_symbol(&self, currency: &str) -> String {
        format!("{} {}", self.grouped(), currency)
    }

    /// Format with space-separated thousands groups
    pub fn grouped(&self) -> String {
        let digits = self.units().abs().to_string();
        let mut out = String::with_capacity(digits.len() + 4);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                out.push(' ');
            }
            out.push(c);
        }
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}.{:02}", sign, out, self.minor_part())
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}.{:02}", self.units().abs(), self.minor_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.minor_part())
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

impl ToSql for Money {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0))
    }
}

impl FromSql for Money {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(Self)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid amount: {}", s),
            MoneyParseError::OutOfRange(s) => {
                write!(f, "Amount too large: {} (max {})", s, Money::MAX.grouped())
            }
        }
    }
}

impl std::error::Error for MoneyParseError {}
