use anyhow::Result;
use novhawk_billing::{
    api::invoices::repository::PgInvoiceStore,
    config::Config,
    create_app_router,
    services::email_service::SmtpNotifier,
    state::AppState,
};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database.url)
        .await?;
    info!("✅ Database connected");

    let store = Arc::new(PgInvoiceStore::new(pool));
    let notifier = Arc::new(SmtpNotifier::new(&config.smtp));
    let app_state = Arc::new(AppState::new(store, notifier, config.mail.sender_address));

    let app = create_app_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.app.port));
    info!("🚀 Server running on port {}", config.app.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
