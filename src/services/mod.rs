//! Service layer for checkdesk
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, audit logging, notifications and cross-entity
//! operations.

pub mod analytics;
pub mod bank;
pub mod check;
pub mod client;
pub mod dashboard;
pub mod import;
pub mod notification;
pub mod search;
pub mod session;
pub mod user;

pub use analytics::AnalyticsService;
pub use bank::BankService;
pub use check::CheckService;
pub use client::ClientService;
pub use dashboard::DashboardService;
pub use import::ImportService;
pub use notification::NotificationService;
pub use search::SearchService;
pub use session::SessionService;
pub use user::UserService;
