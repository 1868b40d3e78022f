//! Slot Booking server entry point.
//!
//! Loads configuration, wires the adapters into the turn handler and serves
//! the HTTP/WebSocket surface until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::Context;
use http::HeaderValue;
use axum::Router;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use slot_booking::adapters::auth::StaticTokenVerifier;
use slot_booking::adapters::catalog::StaticCatalog;
use slot_booking::adapters::http::app_router;
use slot_booking::adapters::storage::{
    FileConversationStore, InMemoryConversationStore, RedisConversationStore,
};
use slot_booking::adapters::websocket::WebSocketState;
use slot_booking::application::{ProcessTurnHandler, TurnSettings};
use slot_booking::config::{AppConfig, LogFormat, ServerConfig, StorageBackend};
use slot_booking::domain::conversation::PatternIntentResolver;
use slot_booking::domain::foundation::Timestamp;
use slot_booking::domain::slots::SlotRegistry;
use slot_booking::ports::ConversationStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    init_logging(&config.server);
    config.validate().context("invalid configuration")?;

    info!(
        environment = ?config.server.environment,
        backend = ?config.storage.backend,
        cascade_policy = ?config.engine.cascade_policy,
        "Starting slot booking server"
    );

    let registry = Arc::new(SlotRegistry::appointment_booking());
    let catalog = Arc::new(StaticCatalog::appointment_demo());
    let (store, memory_store) = build_store(&config).await?;

    let settings = TurnSettings {
        intent_timeout: config.engine.intent_timeout(),
        lookup_timeout: config.engine.lookup_timeout(),
        store_timeout: config.engine.store_timeout(),
        cascade_policy: config.engine.cascade_policy,
    };
    let turns = Arc::new(ProcessTurnHandler::new(
        registry,
        catalog,
        store,
        Arc::new(PatternIntentResolver::default()),
        settings,
    ));

    let tokens = config
        .auth
        .tokens_list()
        .into_iter()
        .fold(StaticTokenVerifier::new(), |verifier, token| {
            verifier.with_token(token)
        });

    spawn_sweeper(&config, Arc::clone(&turns), memory_store);

    let app: Router = app_router(WebSocketState::new(turns, Arc::new(tokens))).layer(
        ServiceBuilder::new()
            .layer(TimeoutLayer::new(config.server.request_timeout()))
            .layer(cors_layer(&config.server)),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Installs the global subscriber in the configured format.
fn init_logging(server: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&server.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match server.effective_log_format() {
        LogFormat::Json => builder.json().with_current_span(false).init(),
        LogFormat::Pretty => builder.pretty().init(),
        LogFormat::Compact => builder.compact().with_target(false).init(),
    }
}

/// Builds the configured conversation store.
///
/// The in-memory store is also returned on its own so the sweeper can evict
/// idle conversations; the other backends expire data themselves or not at all.
async fn build_store(
    config: &AppConfig,
) -> anyhow::Result<(Arc<dyn ConversationStore>, Option<InMemoryConversationStore>)> {
    match config.storage.backend {
        StorageBackend::Memory => {
            let store = InMemoryConversationStore::new();
            Ok((Arc::new(store.clone()), Some(store)))
        }
        StorageBackend::File => {
            info!(path = %config.storage.file_path, "Using file conversation store");
            Ok((
                Arc::new(FileConversationStore::new(&config.storage.file_path)),
                None,
            ))
        }
        StorageBackend::Redis => {
            let redis_config = config
                .redis
                .as_ref()
                .context("storage.backend = redis requires a redis section")?;
            let client = redis::Client::open(redis_config.url.as_str())?;
            let conn = tokio::time::timeout(
                redis_config.connect_timeout(),
                client.get_multiplexed_tokio_connection(),
            )
            .await
            .context("timed out connecting to Redis")??;
            info!("Connected to Redis conversation store");

            let store = RedisConversationStore::new(conn)
                .with_key_prefix(redis_config.key_prefix.clone())
                .with_ttl(config.storage.ttl_secs);
            Ok((Arc::new(store), None))
        }
    }
}

/// Periodically drops idle thread locks and expired in-memory conversations.
fn spawn_sweeper(
    config: &AppConfig,
    turns: Arc<ProcessTurnHandler>,
    memory_store: Option<InMemoryConversationStore>,
) {
    let interval = config.storage.sweep_interval();
    let ttl_secs = config.storage.ttl().map(|ttl| ttl.as_secs());

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let pruned = turns.locks().prune_idle().await;
            let evicted = match (&memory_store, ttl_secs) {
                (Some(store), Some(ttl)) => {
                    store.evict_older_than(Timestamp::now().minus_secs(ttl)).await
                }
                _ => 0,
            };
            if pruned > 0 || evicted > 0 {
                info!(pruned, evicted, "Swept idle conversations");
            }
        }
    });
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .into_iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
