//! Mailbatch API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mailbatch_common::config::AppConfig;
use mailbatch_common::db::create_pool;
use mailbatch_engine::{DispatchSettings, Dispatcher, PgRecipientStore};
use mailbatch_notifier::{FsAttachmentSource, ResendTransport};

use mailbatch_api::routes::create_router;
use mailbatch_api::state::AppState;
use mailbatch_api::template::load_template;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("mailbatch_api=debug,mailbatch_engine=debug,tower_http=debug")
        }))
        .init();

    tracing::info!("Starting Mailbatch API server...");

    // Load configuration
    let config = AppConfig::from_env()?;
    let message = load_template(&config)?;
    tracing::info!(
        subject = %message.subject,
        attachments = message.attachments.len(),
        "Message template loaded"
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url, config.db_max_connections).await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    let transport = ResendTransport::new(
        &config.resend_api_url,
        &config.resend_api_key,
        Duration::from_secs(config.transport_timeout_secs),
    )?;

    let dispatcher = Dispatcher::new(
        Arc::new(PgRecipientStore::new(pool.clone())),
        Arc::new(transport),
        Arc::new(FsAttachmentSource::new(&config.attachment_dir)),
        DispatchSettings {
            max_concurrency: config.dispatch_max_concurrency,
            select_timeout: Duration::from_millis(config.select_timeout_ms),
            record_timeout: Duration::from_millis(config.record_timeout_ms),
        },
    );

    // Build application state
    let state = AppState::new(dispatcher, message);

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
            }
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    pool.close().await;
    tracing::info!("Mailbatch API server stopped.");
    Ok(())
}
