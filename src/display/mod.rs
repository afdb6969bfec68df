//! Display formatting for terminal output
//!
//! Lists render as rounded `tabled` tables; detail views and the dashboard
//! are plain aligned text.

pub mod bank;
pub mod check;
pub mod client;
pub mod dashboard;
pub mod report;
pub mod user;

pub use bank::{format_bank_details, format_bank_list, format_branch_list};
pub use check::{
    format_check_details, format_check_list, format_duplicate_matches, format_duplicate_pairs,
};
pub use client::{format_client_details, format_client_list};
pub use dashboard::{format_aging, format_dashboard, format_forecast, format_risk_profiles};
pub use report::{format_export_history, format_import_result, format_percentage, format_size};
pub use user::{format_notification_list, format_user_details, format_user_list};
