use anyhow::Result;
use dotenvy::dotenv;
use log::{debug, error, info, warn};
use std::sync::Arc;

use lifehub::core::Config;
use lifehub::database::Database;
use lifehub::features::notifications::NotificationDispatcher;
use lifehub::features::telegram::{poll_updates, CommandHandler, Notifier, TelegramClient};
use lifehub::features::weather::WeatherClient;
use lifehub::features::{get_bot_version, get_features};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = Config::from_env()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!(
        "Starting LifeHub notifier v{} ({})",
        get_bot_version(),
        config.app_env
    );
    for feature in get_features() {
        let toggle = if feature.toggleable { " (toggleable)" } else { "" };
        info!("  {} [{}] v{}{toggle}", feature.name, feature.id, feature.version);
    }
    if config.is_development() {
        debug!(
            "Development mode: database {}, timezone {}, polling {}",
            config.database_path, config.timezone, config.telegram_polling
        );
    }

    let database = Database::new(&config.database_path).await?;

    let telegram = TelegramClient::from_config(&config)?;
    if !telegram.is_configured() {
        warn!("TELEGRAM_BOT_TOKEN not set - notifications will fail until it is configured");
    }
    let notifier: Arc<dyn Notifier> = Arc::new(telegram.clone());
    let weather = WeatherClient::from_config(&config)?;

    let dispatcher = NotificationDispatcher::new(database.clone(), notifier.clone(), weather, &config);
    let dispatcher_task = tokio::spawn(async move { dispatcher.run().await });

    let poller_task = if config.telegram_polling {
        let handler = CommandHandler::new(database.clone(), notifier, config.timezone);
        Some(tokio::spawn(poll_updates(telegram, handler)))
    } else {
        info!("TELEGRAM_POLLING disabled - chat commands are not handled");
        None
    };

    info!("✅ LifeHub notifier running. Press Ctrl-C to stop.");

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }

    info!("Shutting down...");
    dispatcher_task.abort();
    if let Some(task) = poller_task {
        task.abort();
    }
    Ok(())
}
