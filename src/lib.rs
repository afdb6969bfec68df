//! checkdesk - Terminal-based bank check tracking
//!
//! This library provides the core functionality for the checkdesk
//! application: recording checks received from clients, following them
//! through deposit and collection, warning before due dates, and reporting
//! on banks, clients and months.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (banks, clients, checks, users, etc.)
//! - `storage`: SQLite storage layer with schema migrations
//! - `services`: Business logic layer
//! - `audit`: Audit logging system
//! - `backup`: Backup and restore of the database
//! - `crypto`: Password hashing and backup encryption
//! - `reports`: Summary, bank, client and monthly reports
//! - `export`: CSV, Excel, PDF, JSON and YAML output
//! - `display`, `cli`, `tui`: user interfaces
//!
//! # Example
//!
//! ```rust,ignore
//! use checkdesk::config::{paths::CheckdeskPaths, settings::Settings};
//! use checkdesk::storage::Storage;
//!
//! let paths = CheckdeskPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let storage = Storage::open(paths)?;
//! ```

pub mod audit;
pub mod backup;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod display;
pub mod error;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;
pub mod tui;

pub use error::{CheckdeskError, CheckdeskResult};
