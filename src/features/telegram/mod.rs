//! # Feature: Telegram
//!
//! Bot API client used to deliver notifications, plus the long-polling
//! command loop that lets the user register a chat and manage tasks.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//! - **Toggleable**: true (TELEGRAM_POLLING)
//!
//! ## Changelog
//! - 1.1.0: Chat commands (/start, /today, /add, /done, /week, /water)
//! - 1.0.0: Outbound notifications

pub mod client;
pub mod commands;
pub mod updates;

pub use client::{Notifier, SendError, TelegramClient};
pub use commands::{BotCommand, CommandHandler};
pub use updates::{poll_updates, Update};
