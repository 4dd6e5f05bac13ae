use anyhow::{Context, Result};
use complaint_desk::config::NotifierConfig;
use complaint_desk::db::{init_db, Database};
use complaint_desk::media::MediaStore;
use complaint_desk::notify::{stop_on_signal, Notifier, TelegramChannel};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = NotifierConfig::from_env().context("Failed to load configuration")?;
    info!(chat = config.chat_id, api = %config.api_base, "notifier configured");

    let db = Database::new(&config.storage.database_path);
    // Either process may be the first to start.
    init_db(&db, &config.storage.schema_path).context("Database initialization failed")?;

    let channel = TelegramChannel::new(config.api_base, config.bot_token, config.chat_id)
        .context("Failed to build Telegram client")?;

    let mut notifier = Notifier::new(
        db,
        channel,
        MediaStore::new(&config.storage.upload_dir),
        config.interval,
    );
    stop_on_signal(notifier.stop_handle()).context("Failed to install signal handler")?;
    notifier.run();
    Ok(())
}
