use anyhow::{Context, Result};
use astra::Server;
use complaint_desk::config::WebConfig;
use complaint_desk::db::{init_db, Database};
use complaint_desk::media::MediaStore;
use complaint_desk::responses::error_response;
use complaint_desk::router::{handle, AppState};
use tracing::{error, info};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let config = WebConfig::from_env().context("Failed to load configuration")?;

    // 1️⃣ Create the database handle
    let db = Database::new(&config.storage.database_path);

    // 2️⃣ Initialize database from schema.sql
    init_db(&db, &config.storage.schema_path).context("Database initialization failed")?;

    let state = AppState {
        db,
        media: MediaStore::new(&config.storage.upload_dir),
    };

    // 3️⃣ Start the server
    info!(addr = %config.bind_addr, workers = config.workers, "starting server");
    let server = Server::bind(&config.bind_addr).max_workers(config.workers);

    // 4️⃣ Serve requests, passing the shared state into the closure
    let result = server.serve(move |req, _info| match handle(req, &state) {
        Ok(resp) => resp,
        Err(err) => error_response(err),
    });

    if let Err(e) = result {
        error!(error = %e, "server ended with error");
        return Err(e).context("Server failed");
    }

    info!("server shut down cleanly");
    Ok(())
}
