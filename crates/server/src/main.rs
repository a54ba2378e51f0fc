//! Glamdesk API server.
//!
//! Serves the JSON API and runs the reminder scheduler in the same process.
//!
//! # Storage
//!
//! With `GLAMDESK_DATABASE_URL` (or `DATABASE_URL`) set, records live in
//! `PostgreSQL`. Without it the server runs on an in-memory store and logs a
//! warning; nothing survives a restart.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glamdesk_server::auth::TokenService;
use glamdesk_server::clock::SystemClock;
use glamdesk_server::config::ServerConfig;
use glamdesk_server::crypto::{FieldCipher, PasswordVault};
use glamdesk_server::delivery::SmsClient;
use glamdesk_server::reminders::{NotificationDispatcher, ReminderScheduler};
use glamdesk_server::state::AppState;
use glamdesk_server::store::{self, MemoryStore, PgStore, Store};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ServerConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        tracing::Level::TRACE => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = ServerConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "glamdesk_server=info,tower_http=debug".into());

    // JSON logs on Fly.io, human-readable text elsewhere
    let is_fly = std::env::var("FLY_APP_NAME").is_ok();
    let json_layer = is_fly.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_fly).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if config.token_secret.is_none() {
        tracing::warn!("JWT_SECRET_KEY is not set; logins will fail until it is configured");
    }

    // NOTE: Migrations are NOT run automatically on startup.
    // Run them explicitly via: cargo run -p glamdesk-cli -- migrate
    match &config.database_url {
        Some(url) => {
            let pool = store::create_pool(url)
                .await
                .expect("Failed to create database pool");
            tracing::info!("Database pool created");
            serve(config, PgStore::new(pool)).await;
        }
        None => {
            tracing::warn!("No database URL configured; using in-memory store");
            serve(config, MemoryStore::new()).await;
        }
    }
}

async fn serve<S: Store>(config: ServerConfig, store: S) {
    let cipher = FieldCipher::new(&config.encryption_key);
    let tokens = TokenService::new(config.token_secret.clone());

    // Reminder scheduler runs alongside the HTTP server
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = ReminderScheduler::new(
        store.clone(),
        Arc::new(cipher.clone()),
        NotificationDispatcher::new(SmsClient::new(&config.sms)),
        SystemClock,
        config.reminders.clone(),
    )
    .spawn(shutdown_rx);

    let state = AppState::new(store, cipher, PasswordVault::new(), tokens);
    let app = glamdesk_server::app(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("glamdesk listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // Let an in-flight reminder pass finish before exiting
    let _ = shutdown_tx.send(true);
    if let Err(e) = scheduler.await {
        tracing::error!(error = %e, "Reminder scheduler task failed");
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
