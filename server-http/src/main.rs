use arbor::cache::CacheService;
use arbor::ports::KeyValueStore;
use arbor::users::{SledUserRepository, UserService};
use axum::extract::Request;
use axum::ServiceExt;
use server_http::{build_app, AppState};
use shared::config::{CacheBackend, Config};
use shared::TtlSecs;
use std::path::Path;
use std::sync::Arc;
use storage_engine::{MemoryStore, RedisStore};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting Arbor HTTP Server...");

    // Load environment variables from .env file (if exists)
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // Load configuration from environment variables
    let config = Config::from_env();
    arbor::errors::force_stack_capture(config.debug_mode());

    let store: Arc<dyn KeyValueStore> = match config.cache_backend {
        CacheBackend::Redis => {
            info!("Using Redis cache at {}", config.redis.url());
            Arc::new(RedisStore::new(config.redis.clone())?)
        }
        CacheBackend::Memory => {
            info!("Using in-memory cache");
            Arc::new(MemoryStore::new())
        }
    };
    let cache = CacheService::with_default_ttl(store, TtlSecs(config.cache_ttl_secs));

    let user_service = Arc::new(init_user_service(&config, cache.clone()).await?);

    let state = AppState::new(user_service, cache.clone(), config.debug_mode());
    let app = build_app(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await.map_err(|e| {
        error!("Failed to bind {}: {}", bind_addr, e);
        e
    })?;

    info!("HTTP Server listening on http://{}", bind_addr);
    if config.debug_mode() {
        info!("Development mode: error responses include stack traces");
    }

    // Graceful shutdown handler
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received terminate signal");
        },
    }

    info!("Shutting down gracefully...");
}

async fn init_user_service(
    config: &Config,
    cache: CacheService,
) -> Result<UserService, Box<dyn std::error::Error>> {
    let data_dir = Path::new(&config.data_dir);

    // Create data directory if it doesn't exist
    if let Err(e) = std::fs::create_dir_all(data_dir) {
        warn!("Failed to create data directory {}: {}", data_dir.display(), e);
    }

    let user_repo = SledUserRepository::new(data_dir.join("users.sled")).map_err(|e| {
        error!("Failed to initialize user repository: {}", e);
        e
    })?;
    let user_service = UserService::new(Arc::new(user_repo), cache);

    match (&config.admin_email, &config.admin_password) {
        (Some(email), Some(password)) => match user_service.ensure_admin(email, password).await {
            Ok(true) => info!("Default admin user created: {}", email),
            Ok(false) => info!("Admin user already exists: {}", email),
            Err(e) => warn!("Failed to create default admin user {}: {}", email, e),
        },
        _ => info!("ARBOR_ADMIN_EMAIL / ARBOR_ADMIN_PASSWORD not set, skipping admin seed"),
    }

    Ok(user_service)
}
