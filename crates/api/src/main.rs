use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pictor_api::config::{ProviderCredentials, ServerConfig};
use pictor_api::{routes, state};
use pictor_core::catalog::ModelCatalog;
use pictor_db::store::{PgCreditLedger, PgTaskStore};
use pictor_orchestrator::Orchestrator;
use pictor_providers::ark::ArkAdapter;
use pictor_providers::fal::FalAdapter;
use pictor_providers::kie::KieAdapter;
use pictor_providers::nano::NanoAdapter;
use pictor_providers::replicate::ReplicateAdapter;
use pictor_providers::ProviderRegistry;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pictor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = pictor_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    pictor_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    pictor_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- Orchestrator ---
    let registry = build_provider_registry(&config.providers);
    let orchestrator = Orchestrator::new(
        Arc::new(ModelCatalog::builtin()),
        Arc::new(registry),
        Arc::new(PgTaskStore::new(pool.clone())),
        Arc::new(PgCreditLedger::new(pool.clone())),
        config.callback_url(),
    );
    tracing::info!(callback_url = %config.callback_url(), "Orchestrator ready");

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        orchestrator: Arc::new(orchestrator),
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        // Health check at root level (not under /api/v1).
        .merge(routes::health::router())
        // API v1 routes.
        .nest("/api/v1", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500 JSON.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // CORS.
        .layer(cors)
        // Shared state.
        .with_state(state);

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

    tracing::info!("Graceful shutdown complete");
}

/// Build the provider registry from configured credentials.
///
/// Platforms without a key are skipped with a warning; submissions
/// targeting them fail cleanly at dispatch time.
fn build_provider_registry(credentials: &ProviderCredentials) -> ProviderRegistry {
    let client = reqwest::Client::new();
    let mut registry = ProviderRegistry::new();

    if credentials.fal_api_key.is_empty() {
        tracing::warn!("FAL_API_KEY not set, fal adapter disabled");
    } else {
        registry = registry.register(Arc::new(FalAdapter::new(
            client.clone(),
            credentials.fal_api_key.clone(),
        )));
    }

    if credentials.replicate_api_token.is_empty() {
        tracing::warn!("REPLICATE_API_TOKEN not set, replicate adapter disabled");
    } else {
        registry = registry.register(Arc::new(ReplicateAdapter::new(
            client.clone(),
            credentials.replicate_api_token.clone(),
        )));
    }

    if credentials.ark_api_key.is_empty() {
        tracing::warn!("ARK_API_KEY not set, ark adapter disabled");
    } else {
        registry = registry.register(Arc::new(ArkAdapter::new(
            client.clone(),
            credentials.ark_api_key.clone(),
        )));
    }

    if credentials.kie_api_key.is_empty() {
        tracing::warn!("KIE_API_KEY not set, kie adapter disabled");
    } else {
        registry = registry.register(Arc::new(KieAdapter::new(
            client.clone(),
            credentials.kie_api_key.clone(),
        )));
    }

    if credentials.nano_api_key.is_empty() {
        tracing::warn!("NANO_API_KEY not set, nano adapter disabled");
    } else {
        registry = registry.register(Arc::new(NanoAdapter::new(
            client,
            credentials.nano_api_key.clone(),
        )));
    }

    registry
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
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

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
