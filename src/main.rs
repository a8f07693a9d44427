use pagsmile_checkout::api::{self, AppState};
use pagsmile_checkout::config::AppConfig;
use pagsmile_checkout::logging::{init_tracing, mask_secret};
use pagsmile_checkout::payments::{GatewayTransport, PagsmileHttpClient};
use pagsmile_checkout::services::{
    LoggingEventSink, OrderService, TransactionService, WebhookHandler,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    init_tracing(&config.logging);

    config.validate().map_err(|e| {
        error!("❌ Invalid configuration: {}", e);
        e
    })?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.gateway.environment,
        "🚀 Starting Pagsmile checkout backend"
    );

    info!(
        app_id = %config.gateway.app_id,
        public_key = %mask_secret(&config.gateway.public_key, 8),
        base_url = %config.gateway.base_url,
        notify_url = %config.gateway.notify_url,
        return_url = %config.gateway.return_url,
        timeout_secs = config.gateway.timeout_secs,
        "Gateway configuration loaded"
    );

    for warning in config.gateway.production_url_warnings() {
        error!("❌ {}", warning);
    }

    info!(
        sdk_timeout_secs = config.reconcile.sdk_timeout_secs,
        settle_delay_secs = config.reconcile.settle_delay_secs,
        max_attempts = config.reconcile.max_attempts,
        interval_secs = config.reconcile.interval_secs,
        "Reconciliation policy"
    );

    info!("💳 Initializing Pagsmile client...");
    let client = PagsmileHttpClient::new(&config.gateway).map_err(|e| {
        error!("❌ Failed to initialize Pagsmile client: {}", e);
        e
    })?;
    let transport: Arc<dyn GatewayTransport> = Arc::new(client);
    info!("✅ Pagsmile client initialized");

    warn!(
        "⚠️  Webhook notifications are accepted without signature verification; \
         confirm payments through /api/query-transaction before fulfilling orders"
    );

    let state = AppState {
        config: Arc::new(config.gateway.clone()),
        orders: Arc::new(OrderService::new(
            transport.clone(),
            config.gateway.clone(),
        )),
        transactions: Arc::new(TransactionService::new(
            transport,
            config.gateway.clone(),
        )),
        webhooks: Arc::new(WebhookHandler::new(Arc::new(LoggingEventSink))),
    };

    info!("🛣️  Setting up application routes...");
    let app = api::router(state);
    info!("✅ Routes configured");

    let addr: SocketAddr = config.server.bind_address().parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        error!("❌ Failed to bind to address {}: {}", addr, e);
        e
    })?;

    info!(address = %addr, "🚀 Server listening on http://{}", addr);
    info!("✅ Server is ready to accept connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("👋 Server shutdown complete");

    Ok(())
}
