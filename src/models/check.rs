//! Check model
//!
//! A check received from a client, drawn on a bank, and tracked through its
//! collection lifecycle until it is cashed, bounced or cancelled.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BankId, BranchId, CheckId, ClientId, UserId};
use super::money::Money;

/// Collection status of a check
///
/// Any status may follow any other; only re-applying the current status is
/// refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// Received, not yet handed to the bank
    #[default]
    Pending,
    /// Handed to the bank, awaiting clearing
    Deposited,
    /// Collected successfully
    Cashed,
    /// Rejected or unpaid by the bank
    Bounced,
    /// Withdrawn
    Cancelled,
}

impl CheckStatus {
    pub const ALL: [CheckStatus; 5] = [
        Self::Pending,
        Self::Deposited,
        Self::Cashed,
        Self::Bounced,
        Self::Cancelled,
    ];

    /// Parse a status, accepting the French labels used on paper forms
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "en_attente" | "en attente" => Some(Self::Pending),
            "deposited" | "depose" | "déposé" => Some(Self::Deposited),
            "cashed" | "paid" | "encaisse" | "encaissé" => Some(Self::Cashed),
            "bounced" | "rejected" | "unpaid" | "rejete" | "rejeté" | "impaye" | "impayé" => {
                Some(Self::Bounced)
            }
            "cancelled" | "canceled" | "annule" | "annulé" => Some(Self::Cancelled),
            _ => None,
        }
    }

    /// Value stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Deposited => "deposited",
            Self::Cashed => "cashed",
            Self::Bounced => "bounced",
            Self::Cancelled => "cancelled",
        }
    }

    /// Still awaiting an outcome; these are the checks that can fall due
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Deposited)
    }

    /// Outcomes that notify the user when reached
    pub fn notifies_on_change(&self) -> bool {
        matches!(self, Self::Cashed | Self::Bounced | Self::Cancelled)
    }

    /// Next status in display order, used by the TUI filter cycle
    pub fn next(&self) -> Self {
        match self {
            Self::Pending => Self::Deposited,
            Self::Deposited => Self::Cashed,
            Self::Cashed => Self::Bounced,
            Self::Bounced => Self::Cancelled,
            Self::Cancelled => Self::Pending,
        }
    }
}

impl fmt::Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Deposited => write!(f, "Deposited"),
            Self::Cashed => write!(f, "Cashed"),
            Self::Bounced => write!(f, "Bounced"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    pub id: CheckId,

    /// Number printed on the check, unique per bank
    pub number: String,

    pub amount: Money,

    /// ISO currency code
    pub currency: String,

    pub issue_date: NaiveDate,
    pub due_date: NaiveDate,
    pub status: CheckStatus,

    pub client_id: ClientId,
    pub bank_id: BankId,
    #[serde(default)]
    pub branch_id: Option<BranchId>,

    /// Person who brought the check in, when not the client
    #[serde(default)]
    pub depositor_name: String,

    #[serde(default)]
    pub invoice_number: String,
    #[serde(default)]
    pub invoice_date: Option<NaiveDate>,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub created_by: Option<UserId>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Check {
    /// Create a new pending check
    pub fn new(
        number: impl Into<String>,
        amount: Money,
        currency: impl Into<String>,
        issue_date: NaiveDate,
        due_date: NaiveDate,
        client_id: ClientId,
        bank_id: BankId,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: CheckId::new(),
            number: number.into().trim().to_string(),
            amount,
            currency: currency.into().trim().to_uppercase(),
            issue_date,
            due_date,
            status: CheckStatus::Pending,
            client_id,
            bank_id,
            branch_id: None,
            depositor_name: String::new(),
            invoice_number: String::new(),
            invoice_date: None,
            notes: String::new(),
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Change the status, refusing a no-op change
    pub fn set_status(&mut self, status: CheckStatus) -> Result<CheckStatus, CheckValidationError> {
        if self.status == status {
            return Err(CheckValidationError::StatusUnchanged(status));
        }
        let previous = self.status;
        self.status = status;
        self.updated_at = Utc::now();
        Ok(previous)
    }

    /// Signed number of days from `today` until the due date
    pub fn days_until_due(&self, today: NaiveDate) -> i64 {
        (self.due_date - today).num_days()
    }

    /// Open and past its due date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status.is_open() && self.due_date < today
    }

    /// Open and due between today and `today + days` inclusive
    pub fn is_due_within(&self, today: NaiveDate, days: u32) -> bool {
        let remaining = self.days_until_due(today);
        self.status.is_open() && remaining >= 0 && remaining <= i64::from(days)
    }

    pub fn validate(&self) -> Result<(), CheckValidationError> {
        if self.number.trim().is_empty() {
            return Err(CheckValidationError::EmptyNumber);
        }
        if self.number.len() > 50 {
            return Err(CheckValidationError::NumberTooLong(self.number.len()));
        }
        if !self.amount.is_positive() {
            return Err(CheckValidationError::NonPositiveAmount(self.amount));
        }
        if self.amount > Money::MAX {
            return Err(CheckValidationError::AmountTooLarge(self.amount));
        }
        if self.due_date < self.issue_date {
            return Err(CheckValidationError::DueBeforeIssue {
                issue: self.issue_date,
                due: self.due_date,
            });
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(CheckValidationError::InvalidCurrency(self.currency.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} due {} [{}]",
            self.number,
            self.amount.format_with_symbol(&self.currency),
            self.due_date,
            self.status
        )
    }
}

/// A check joined with the names of the entities it references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckDetails {
    #[serde(flatten)]
    pub check: Check,
    pub client_name: String,
    pub bank_name: String,
    #[serde(default)]
    pub branch_name: Option<String>,
}

/// Validation errors for checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckValidationError {
    EmptyNumber,
    NumberTooLong(usize),
    NonPositiveAmount(Money),
    AmountTooLarge(Money),
    DueBeforeIssue { issue: NaiveDate, due: NaiveDate },
    InvalidCurrency(String),
    StatusUnchanged(CheckStatus),
}

impl fmt::Display for CheckValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyNumber => write!(f, "Check number cannot be empty"),
            Self::NumberTooLong(len) => write!(f, "Check number too long ({} chars, max 50)", len),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Check amount must be positive (got {})", amount)
            }
            Self::AmountTooLarge(amount) => write!(
                f,
                "Check amount {} exceeds the maximum of {}",
                amount.grouped(),
                Money::MAX.grouped()
            ),
            Self::DueBeforeIssue { issue, due } => write!(
                f,
                "Due date {} cannot be before issue date {}",
                due, issue
            ),
            Self::InvalidCurrency(c) => write!(f, "Invalid currency code: {}", c),
            Self::StatusUnchanged(status) => write!(f, "Check is already {}", status),
        }
    }
}

impl std::error::Error for CheckValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Check {
        Check::new(
            "1234567",
            Money::from_minor(250_000),
            "mad",
            date(2026, 3, 1),
            date(2026, 3, 31),
            ClientId::new(),
            BankId::new(),
        )
    }

    #[test]
    fn test_new_check() {
        let check = sample();
        assert_eq!(check.status, CheckStatus::Pending);
        assert_eq!(check.currency, "MAD");
        assert!(check.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut check = sample();
        check.number = "  ".into();
        assert_eq!(check.validate(), Err(CheckValidationError::EmptyNumber));

        let mut check = sample();
        check.amount = Money::zero();
        assert!(matches!(
            check.validate(),
            Err(CheckValidationError::NonPositiveAmount(_))
        ));

        let mut check = sample();
        check.amount = Money::from_minor(5_000_000_000_000_000_000);
        assert!(matches!(
            check.validate(),
            Err(CheckValidationError::AmountTooLarge(_))
        ));
        check.amount = Money::MAX;
        assert!(check.validate().is_ok());

        let mut check = sample();
        check.due_date = date(2026, 2, 1);
        assert!(matches!(
            check.validate(),
            Err(CheckValidationError::DueBeforeIssue { .. })
        ));

        let mut check = sample();
        check.currency = "DIRHAM".into();
        assert!(matches!(
            check.validate(),
            Err(CheckValidationError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_same_day_due_is_valid() {
        let mut check = sample();
        check.due_date = check.issue_date;
        assert!(check.validate().is_ok());
    }

    #[test]
    fn test_set_status_rejects_noop() {
        let mut check = sample();
        assert_eq!(
            check.set_status(CheckStatus::Pending),
            Err(CheckValidationError::StatusUnchanged(CheckStatus::Pending))
        );
        assert_eq!(check.set_status(CheckStatus::Bounced), Ok(CheckStatus::Pending));
        // No ordering: a bounced check may go back to pending
        assert_eq!(check.set_status(CheckStatus::Pending), Ok(CheckStatus::Bounced));
    }

    #[test]
    fn test_due_windows() {
        let check = sample();
        assert!(check.is_due_within(date(2026, 3, 28), 3));
        assert!(check.is_due_within(date(2026, 3, 31), 3));
        assert!(!check.is_due_within(date(2026, 3, 27), 3));
        assert!(!check.is_overdue(date(2026, 3, 31)));
        assert!(check.is_overdue(date(2026, 4, 1)));

        let mut cashed = sample();
        cashed.status = CheckStatus::Cashed;
        assert!(!cashed.is_overdue(date(2026, 4, 1)));
        assert!(!cashed.is_due_within(date(2026, 3, 30), 3));
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(CheckStatus::parse("rejete"), Some(CheckStatus::Bounced));
        assert_eq!(CheckStatus::parse("impayé"), Some(CheckStatus::Bounced));
        assert_eq!(CheckStatus::parse("Cashed"), Some(CheckStatus::Cashed));
        assert_eq!(CheckStatus::parse("lost"), None);
        for status in CheckStatus::ALL {
            assert_eq!(CheckStatus::parse(status.as_str()), Some(status));
        }
    }
}
