//! DFMailbox Server Binary
//!
//! Runs the mailbox HTTP server.

use std::env;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dfmailbox_server::{create_router, AppState, MailboxConfig, MailboxStore, MemoryStore};

async fn open_store(
    config: &MailboxConfig,
) -> Result<Arc<dyn MailboxStore>, Box<dyn std::error::Error>> {
    match config.database_url {
        #[cfg(feature = "postgres")]
        Some(ref url) => {
            let store = dfmailbox_server::storage::PostgresStore::new(url).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => Err("DFMC_DATABASE_URL is set but this build lacks the postgres feature".into()),
        None => Ok(Arc::new(MemoryStore::new())),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    let log_level = env::var("DFMC_LOG_LEVEL")
        .unwrap_or_else(|_| "info".into())
        .parse()
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config = MailboxConfig::from_env()?;
    let port = config.port;
    let store = open_store(&config).await?;

    info!(
        public_key = %config.identity.public_key(),
        address = %config.address,
        port = port,
        "Starting mailbox server"
    );

    let state = Arc::new(AppState::from_config(config, store)?);
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "Mailbox listening");

    axum::serve(listener, app).await?;
    Ok(())
}
