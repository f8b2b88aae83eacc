//! # Feature: Notifications
//!
//! Scheduled Telegram messages: morning briefing, midday reminder, evening
//! check-in, weekly review and the hourly deadline check. Times come from the
//! user settings and are interpreted in the configured timezone.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (per job, in user settings)
//!
//! ## Changelog
//! - 1.2.0: DST-aware triggers, deadline reminders sent once per window
//! - 1.1.0: Weekly review with habit streaks
//! - 1.0.0: Daily briefing, reminder and check-in

pub mod dispatcher;
pub mod jobs;
pub mod messages;
pub mod schedule;

pub use dispatcher::NotificationDispatcher;
pub use jobs::{JobKind, ScheduledJob};
pub use schedule::{LocalTime, ScheduleError, Trigger};
