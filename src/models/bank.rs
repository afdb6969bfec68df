//! Bank and branch models
//!
//! Banks are the issuing institutions of the checks; each bank owns zero or
//! more branches (agencies).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BankId, BranchId};

/// A bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    pub id: BankId,

    /// Full name, unique case-insensitively (e.g. "Attijariwafa Bank")
    pub name: String,

    /// Optional short code (e.g. "AWB")
    #[serde(default)]
    pub code: Option<String>,

    /// Inactive banks are hidden from pickers but keep their checks
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl Bank {
    /// Create a new active bank
    pub fn new(name: impl Into<String>, code: Option<String>) -> Self {
        Self {
            id: BankId::new(),
            name: name.into().trim().to_string(),
            code: normalize_code(code),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn set_code(&mut self, code: Option<String>) {
        self.code = normalize_code(code);
    }

    /// Check whether a user-supplied name or code designates this bank
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.name.eq_ignore_ascii_case(query)
            || self
                .code
                .as_deref()
                .map(|c| c.eq_ignore_ascii_case(query))
                .unwrap_or(false)
    }

    pub fn validate(&self) -> Result<(), BankValidationError> {
        if self.name.trim().is_empty() {
            return Err(BankValidationError::EmptyName);
        }
        if self.name.len() > 100 {
            return Err(BankValidationError::NameTooLong(self.name.len()));
        }
        if let Some(code) = &self.code {
            if code.len() > 10 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(BankValidationError::InvalidCode(code.clone()));
            }
        }
        Ok(())
    }
}

fn normalize_code(code: Option<String>) -> Option<String> {
    code.map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty())
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({})", self.name, code),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Validation errors for banks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BankValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidCode(String),
}

impl fmt::Display for BankValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Bank name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Bank name too long ({} chars, max 100)", len),
            Self::InvalidCode(code) => write!(
                f,
                "Invalid bank code '{}': use up to 10 letters or digits",
                code
            ),
        }
    }
}

impl std::error::Error for BankValidationError {}

/// A branch (agency) of a bank
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Branch {
    pub id: BranchId,
    pub bank_id: BankId,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    pub fn new(bank_id: BankId, name: impl Into<String>) -> Self {
        Self {
            id: BranchId::new(),
            bank_id,
            name: name.into().trim().to_string(),
            address: String::new(),
            postal_code: String::new(),
            phone: String::new(),
            email: String::new(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), BranchValidationError> {
        if self.name.trim().is_empty() {
            return Err(BranchValidationError::EmptyName);
        }
        if !self.email.is_empty() && !super::client::looks_like_email(&self.email) {
            return Err(BranchValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchValidationError {
    EmptyName,
    InvalidEmail(String),
}

impl fmt::Display for BranchValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Branch name cannot be empty"),
            Self::InvalidEmail(e) => write!(f, "Invalid branch email: {}", e),
        }
    }
}

impl std::error::Error for BranchValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bank_normalizes_code() {
        let bank = Bank::new("  Attijariwafa Bank ", Some(" awb ".into()));
        assert_eq!(bank.name, "Attijariwafa Bank");
        assert_eq!(bank.code.as_deref(), Some("AWB"));
        assert!(bank.active);

        let bank = Bank::new("Local Bank", Some("   ".into()));
        assert_eq!(bank.code, None);
    }

    #[test]
    fn test_bank_matches_name_or_code() {
        let bank = Bank::new("Banque Populaire", Some("BP".into()));
        assert!(bank.matches("banque populaire"));
        assert!(bank.matches("bp"));
        assert!(!bank.matches("BMCI"));
    }

    #[test]
    fn test_bank_validation() {
        assert!(Bank::new("CIH", None).validate().is_ok());
        assert_eq!(
            Bank::new("", None).validate(),
            Err(BankValidationError::EmptyName)
        );
        assert!(matches!(
            Bank::new("X", Some("A-B".into())).validate(),
            Err(BankValidationError::InvalidCode(_))
        ));
    }

    #[test]
    fn test_branch_validation() {
        let bank = Bank::new("BMCI", None);
        let mut branch = Branch::new(bank.id, "Casablanca Centre");
        assert!(branch.validate().is_ok());

        branch.email = "not-an-email".into();
        assert!(matches!(
            branch.validate(),
            Err(BranchValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Bank::new("Crédit du Maroc", Some("CDM".into())).to_string(),
            "Crédit du Maroc (CDM)"
        );
    }
}
