//! Terminal User Interface module
//!
//! A ratatui front end with three views: the dashboard, the check list and
//! the notification list. It runs as the logged-in user and applies the
//! same permission checks as the CLI.

pub mod app;
pub mod dialogs;
pub mod event;
pub mod handler;
pub mod layout;
pub mod terminal;
pub mod views;

pub use app::App;
pub use terminal::run_tui;
