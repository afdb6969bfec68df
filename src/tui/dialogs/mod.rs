//! Modal dialogs drawn over the active view

pub mod confirm;
pub mod help;
