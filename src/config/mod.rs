//! Configuration module for checkdesk
//!
//! This module provides configuration management including:
//! - Platform-aware path resolution
//! - User settings persistence
//! - Password policy and security preferences

pub mod paths;
pub mod settings;

pub use paths::CheckdeskPaths;
pub use settings::Settings;
