use anyhow::Context;
use auth_token::http::{self, AppState};
use auth_token::refresh::RefreshTokenRotator;
use auth_token::shutdown::wait_for_signal;
use auth_token::storage::{provision_users, CredentialStore, InMemoryStore, RedisStore};
use auth_token::{Config, SigningKey, StoreBackend, TokenIssuer};
use rust_common::{init_tracing, TracingConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    let tracing_config = TracingConfig::default()
        .with_service_name(config.app_name.clone())
        .with_log_level(config.log_level.clone());
    let tracing_config = if config.debug {
        tracing_config.debug()
    } else {
        tracing_config
    };
    init_tracing(&tracing_config)?;

    info!(
        app_name = %config.app_name,
        store_backend = config.store_backend.as_str(),
        "Starting auth token service"
    );

    let key = Arc::new(
        SigningKey::load(&config.secret_path).context("Failed to load signing key")?,
    );

    let store: Arc<dyn CredentialStore> = match config.store_backend {
        StoreBackend::Redis => Arc::new(
            RedisStore::new(&config.redis_url)
                .await
                .context("Failed to connect to Redis")?,
        ),
        StoreBackend::Memory => {
            warn!("Using in-memory credential store; data is lost on restart");
            Arc::new(InMemoryStore::new())
        }
    };
    provision_users(store.as_ref(), &config.seed_users)
        .await
        .context("Failed to provision seed users")?;
    if config.store_backend == StoreBackend::Memory && config.seed_users.is_empty() {
        warn!("In-memory store has no users; set SEED_USERS to issue tokens");
    }

    let issuer = Arc::new(TokenIssuer::new(store.clone(), key, config.ttls()));
    let rotator = Arc::new(RefreshTokenRotator::new(store, issuer.clone()));
    let app = http::router(AppState::new(issuer, rotator));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(address = %addr, "Auth token service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_signal())
        .await
        .context("HTTP server error")?;

    info!("Auth token service stopped");
    Ok(())
}
