use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use intake_api::config::ServerConfig;
use intake_api::media::{CloudinaryConfirmer, MediaConfirmer, NoopConfirmer};
use intake_api::notifications::{RealtimeRelay, SubmissionNotifier};
use intake_api::router::build_app_router;
use intake_api::state::AppState;
use intake_api::ws;
use intake_events::dispatcher::DEFAULT_DEAD_LETTER_CAPACITY;
use intake_events::{BackgroundDispatcher, EmailConfig, EmailDelivery, EventBus, EventPublisher};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "intake_api=debug,intake_events=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = intake_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    intake_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    intake_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- WebSocket manager + heartbeat ---
    let ws_manager = Arc::new(ws::WsManager::new());
    let heartbeat_cancel = CancellationToken::new();
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&ws_manager), heartbeat_cancel.clone());

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());
    let relay_handle =
        tokio::spawn(RealtimeRelay::new(Arc::clone(&ws_manager)).run(event_bus.subscribe()));
    tracing::info!("Event bus and realtime relay started");

    // --- Background dispatcher ---
    let dispatcher_cancel = CancellationToken::new();
    let (dispatcher, dispatcher_handle) = BackgroundDispatcher::new(DEFAULT_DEAD_LETTER_CAPACITY);
    let dispatcher =
        dispatcher.with_drain_timeout(Duration::from_secs(config.shutdown_timeout_secs));
    let dispatcher_task = tokio::spawn(dispatcher.run(dispatcher_cancel.clone()));

    // --- Email ---
    let email = match EmailConfig::from_env() {
        Some(email_config) => {
            let smtp_host = email_config.smtp_host.clone();
            let delivery = EmailDelivery::new(email_config).expect("Invalid SMTP configuration");
            tracing::info!(%smtp_host, "SMTP email delivery enabled");
            Some(Arc::new(delivery))
        }
        None => {
            tracing::warn!("SMTP_HOST not set, artist emails are disabled");
            None
        }
    };

    // --- Media confirmation ---
    let media: Arc<dyn MediaConfirmer> = match config.media.clone() {
        Some(media_config) => {
            tracing::info!(cloud = %media_config.cloud_name, "Upload confirmation enabled");
            Arc::new(CloudinaryConfirmer::new(media_config))
        }
        None => {
            tracing::warn!("Media provider not configured, uploads are accepted unconfirmed");
            Arc::new(NoopConfirmer)
        }
    };

    // --- App state ---
    let publisher: Arc<dyn EventPublisher> = event_bus.clone();
    let notifier = SubmissionNotifier::new(pool.clone(), publisher, email, dispatcher_handle);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        ws_manager: Arc::clone(&ws_manager),
        notifier,
        media,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    // Let in-flight emails and publishes finish before closing the bus.
    dispatcher_cancel.cancel();
    let drain = Duration::from_secs(config.shutdown_timeout_secs + 1);
    let _ = tokio::time::timeout(drain, dispatcher_task).await;
    tracing::info!("Background dispatcher stopped");

    // The state (and its publisher clone) is gone with the server; dropping
    // the last bus handle closes the channel and ends the relay.
    drop(event_bus);
    let _ = tokio::time::timeout(Duration::from_secs(5), relay_handle).await;
    tracing::info!("Realtime relay stopped");

    let ws_count = ws_manager.connection_count().await;
    tracing::info!(ws_count, "Closing remaining WebSocket connections");
    ws_manager.shutdown_all().await;

    heartbeat_cancel.cancel();
    let _ = heartbeat_handle.await;
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT or SIGTERM to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
