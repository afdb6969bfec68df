//! Client model
//!
//! Clients are the payers of the checks, either private individuals or
//! companies.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::ClientId;

/// Whether a client is a person or a legal entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ClientKind {
    #[default]
    Individual,
    Company,
}

impl ClientKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "individual" | "person" | "particulier" => Some(Self::Individual),
            "company" | "business" | "entreprise" => Some(Self::Company),
            _ => None,
        }
    }

    /// Value stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "individual",
            Self::Company => "company",
        }
    }
}

impl fmt::Display for ClientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Individual => write!(f, "Individual"),
            Self::Company => write!(f, "Company"),
        }
    }
}

/// A check issuer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub kind: ClientKind,
    pub name: String,

    /// National ID for individuals, trade register number for companies
    #[serde(default)]
    pub id_number: String,

    /// Tax identifier, companies only
    #[serde(default)]
    pub vat_number: String,

    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,

    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Client {
    pub fn new(name: impl Into<String>, kind: ClientKind) -> Self {
        Self {
            id: ClientId::new(),
            kind,
            name: name.into().trim().to_string(),
            id_number: String::new(),
            vat_number: String::new(),
            address: String::new(),
            phone: String::new(),
            email: String::new(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.name.trim().is_empty() {
            return Err(ClientValidationError::EmptyName);
        }
        if self.name.len() > 150 {
            return Err(ClientValidationError::NameTooLong(self.name.len()));
        }
        if !self.email.is_empty() && !looks_like_email(&self.email) {
            return Err(ClientValidationError::InvalidEmail(self.email.clone()));
        }
        if !self.phone.is_empty() && !looks_like_phone(&self.phone) {
            return Err(ClientValidationError::InvalidPhone(self.phone.clone()));
        }
        if self.kind == ClientKind::Individual && !self.vat_number.is_empty() {
            return Err(ClientValidationError::VatOnIndividual);
        }
        Ok(())
    }
}

impl fmt::Display for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Loose e-mail shape check: one '@' with a dotted domain
pub fn looks_like_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .map(|(host, tld)| !host.is_empty() && tld.len() >= 2)
                    .unwrap_or(false)
        }
        None => false,
    }
}

/// Digits with optional leading '+' and separators, 8 to 15 digits long
pub fn looks_like_phone(phone: &str) -> bool {
    let trimmed = phone.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if !body
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '.' | '(' | ')'))
    {
        return false;
    }
    let digits = body.chars().filter(|c| c.is_ascii_digit()).count();
    (8..=15).contains(&digits)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidEmail(String),
    InvalidPhone(String),
    VatOnIndividual,
}

impl fmt::Display for ClientValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Client name cannot be empty"),
            Self::NameTooLong(len) => write!(f, "Client name too long ({} chars, max 150)", len),
            Self::InvalidEmail(e) => write!(f, "Invalid client email: {}", e),
            Self::InvalidPhone(p) => write!(f, "Invalid client phone: {}", p),
            Self::VatOnIndividual => write!(f, "Only companies can have a VAT number"),
        }
    }
}

impl std::error::Error for ClientValidationError {}
