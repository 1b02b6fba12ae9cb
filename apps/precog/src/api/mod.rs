//! # Precog HTTP API Module
//!
//! The ingest server fed by the in-game client mod.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check (never authenticated)
//! - `GET /status` - Session id, output path and counters
//! - `POST /tick` - Process one host tick (`TickFrame`)
//! - `POST /chat` - Attribute a raw chat line
//! - `POST /flush` - Write buffered lines now
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `PRECOG_RATE_LIMIT`: Requests per second (default: 200, 0 to disable)
//! - `PRECOG_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env, keys_match};
pub use handlers::{chat_handler, flush_handler, health_handler, status_handler, tick_handler};
pub use middleware::{
    DEFAULT_RATE_LIMIT, GlobalRateLimiter, RATE_LIMIT_ENV, create_rate_limiter,
    get_rate_limit_from_env,
};
pub use types::{
    ChatRequest, ErrorResponse, FlushResponse, HealthResponse, MAX_CHAT_MESSAGE_BYTES,
    StatusResponse,
};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post},
};
use precog_core::{PrecogError, Session};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Largest accepted request body (a tick with a crowded server fits easily).
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// One mutex serialises ticks, chat and flushes against each other.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
}

impl AppState {
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. Body limit
/// 3. Rate limiting (if enabled)
/// 4. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = (rate_limit > 0).then(|| {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        create_rate_limiter(rate_limit)
    });
    if rate_limiter.is_none() {
        tracing::info!("Rate limiting disabled");
    }

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication disabled; set {} to require a bearer key",
            API_KEY_ENV
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/status", get(handlers::status_handler))
        .route("/tick", post(handlers::tick_handler))
        .route("/chat", post(handlers::chat_handler))
        .route("/flush", post(handlers::flush_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(MAX_BODY_BYTES)),
        )
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Serve until Ctrl+C, then flush whatever is still buffered.
pub async fn run_server(addr: &str, session: Session) -> Result<(), PrecogError> {
    let state = AppState::new(session);
    let router = create_router(state.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| PrecogError::Io(format!("Bind failed: {}", e)))?;

    tracing::info!("Precog ingest server listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PrecogError::Io(format!("Server error: {}", e)))?;

    let session = state.session.clone();
    let flushed = tokio::task::spawn_blocking(move || session.blocking_lock().flush())
        .await
        .map_err(|e| PrecogError::Io(format!("Shutdown flush failed: {}", e)))?;
    if let Err(e) = flushed {
        tracing::warn!(error = %e, "Buffered lines lost at shutdown");
    }

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutdown requested, flushing"),
        Err(e) => {
            tracing::error!(error = %e, "Cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}
