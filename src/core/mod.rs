//! # Core Module
//!
//! Shared configuration, domain records and message text helpers.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Added models module with task/habit/health/settings records
//! - 1.1.0: Add response module with Telegram message chunking utilities
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod models;
pub mod response;

// Re-export commonly used items
pub use config::Config;
pub use models::{Habit, HealthLog, NewTask, Task, TaskPriority, TaskStatus, UserSettings};
pub use response::{chunk_for_message, chunk_text, escape_html, MESSAGE_LIMIT};
