// Core layer - shared types and configuration
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

pub use core::Config;
pub use database::Database;

pub use features::{
    // Notifications
    JobKind, NotificationDispatcher,
    // Telegram
    poll_updates, BotCommand, CommandHandler, Notifier, SendError, TelegramClient,
    // Weather
    Weather, WeatherClient,
};
