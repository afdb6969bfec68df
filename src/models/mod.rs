//! Core data models for checkdesk
//!
//! This module contains the data structures of the check-tracking domain:
//! banks and their branches, clients, checks, users, notifications and the
//! export history.

pub mod bank;
pub mod check;
pub mod client;
pub mod export_record;
pub mod ids;
pub mod money;
pub mod notification;
pub mod user;

pub use bank::{Bank, Branch};
pub use check::{Check, CheckDetails, CheckStatus};
pub use client::{Client, ClientKind};
pub use export_record::ExportRecord;
pub use ids::{BankId, BranchId, CheckId, ClientId, ExportId, NotificationId, UserId};
pub use money::Money;
pub use notification::{Notification, NotificationKind};
pub use user::{Permission, Role, User};
