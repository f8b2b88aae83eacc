//! # Features
//!
//! Each feature lives in its own folder with a versioned module header.

pub mod notifications;
pub mod telegram;
pub mod weather;

pub use notifications::{JobKind, NotificationDispatcher};
pub use telegram::{poll_updates, BotCommand, CommandHandler, Notifier, SendError, TelegramClient};
pub use weather::{Weather, WeatherClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub version: &'static str,
    pub toggleable: bool,
}

/// Registered features, in startup log order
pub fn get_features() -> Vec<FeatureInfo> {
    vec![
        FeatureInfo {
            id: "notifications",
            name: "Notifications",
            version: "1.2.0",
            toggleable: true,
        },
        FeatureInfo {
            id: "telegram",
            name: "Telegram",
            version: "1.1.0",
            toggleable: true,
        },
        FeatureInfo {
            id: "weather",
            name: "Weather",
            version: "1.0.0",
            toggleable: false,
        },
    ]
}

pub fn get_bot_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
