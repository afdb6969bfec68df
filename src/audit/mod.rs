//! Audit trail for checkdesk
//!
//! Every create, update and delete made through the services is appended
//! to `audit.log` as one JSON object per line, with the entity state before
//! and after the change and the username of the acting user.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
