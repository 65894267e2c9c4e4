//! # Server Setup
//!
//! Server initialization, route registration, and HTTP server startup.
//!
//! [`start_server`] loads the [`Config`], opens the payment store, wires the
//! exchange providers into an [`OfferAggregator`], and serves the buy-crypto API.

// region: --- Imports
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use lib_core::model::store::MIGRATOR;
use lib_core::{create_pool, Config, PaymentRepository, PaymentStore};
use lib_exchange::{AddressSource, ExchangeHttpClient, ExchangeProvider, HttpAddressSource, SimplexProvider, WyreProvider};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers;
use crate::middleware::{log_requests, stamp_req};
use crate::services::{BrowserHandoff, CheckoutService, ClientHandoff, Handoff, OfferAggregator, OfferSessions};
// endregion: --- Imports

// region: --- AppState
/// Application state shared across all routes
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn PaymentStore>,
    pub sessions: Arc<OfferSessions>,
    pub aggregator: Arc<OfferAggregator>,
    pub checkout: Arc<CheckoutService>,
}

impl axum::extract::FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl axum::extract::FromRef<AppState> for Arc<dyn PaymentStore> {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}
// endregion: --- AppState

// region: --- Server Configuration
/// Server configuration
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3001")
    pub bind_address: String,
    /// Allowed CORS origins
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3001".to_string(),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

impl ServerConfig {
    /// Read `BIND_ADDRESS` and the comma-separated `ALLOWED_ORIGINS`, keeping
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let bind_address = lib_utils::get_env_or("BIND_ADDRESS", &defaults.bind_address);
        let allowed_origins = lib_utils::get_env("ALLOWED_ORIGINS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or(defaults.allowed_origins);

        Self { bind_address, allowed_origins }
    }
}
// endregion: --- Server Configuration

// region: --- Server Setup
/// Initialize tracing from `LOG_LEVEL` (default `info`).
fn init_tracing() -> String {
    let log_level = std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase();

    let filter = match log_level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => tracing_subscriber::EnvFilter::new(&log_level),
        _ => tracing_subscriber::EnvFilter::new("info"),
    };

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .with_file(true)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Tracing subscriber already set");
    }
    log_level
}

/// Hand-off for confirmed checkouts: the host browser, or the HTTP client.
fn handoff_for(config: &Config) -> Arc<dyn Handoff> {
    if config.open_in_browser {
        info!("Payment pages open in the host browser");
        Arc::new(BrowserHandoff::default())
    } else {
        Arc::new(ClientHandoff)
    }
}

/// Build the application state from a validated config.
pub async fn build_state(app_config: Config) -> anyhow::Result<AppState> {
    info!("Connecting to database: {}", app_config.database_url);
    let pool = create_pool(&app_config.database_url).await?;

    info!("Running database migrations...");
    MIGRATOR.run(&pool).await?;
    info!("Migrations complete");

    let exchange = Arc::new(
        ExchangeHttpClient::builder()
            .base_url(&app_config.exchange_api_url)
            .timeout(app_config.http_timeout())
            .build()?,
    );
    let wallet_service = Arc::new(
        ExchangeHttpClient::builder()
            .base_url(&app_config.wallet_service_url)
            .timeout(app_config.http_timeout())
            .build()?,
    );
    let addresses: Arc<dyn AddressSource> = Arc::new(HttpAddressSource::new(wallet_service));

    let providers: Vec<Arc<dyn ExchangeProvider>> = vec![
        Arc::new(SimplexProvider::new(exchange.clone(), app_config.environment, &app_config.app_scheme)),
        Arc::new(WyreProvider::new(
            exchange,
            addresses.clone(),
            app_config.environment,
            &app_config.app_scheme,
        )),
    ];
    info!("Exchange providers ready ({} via {})", providers.len(), app_config.exchange_api_url);

    let store: Arc<dyn PaymentStore> = Arc::new(PaymentRepository::new(pool));
    let checkout = CheckoutService::new(store.clone(), addresses, handoff_for(&app_config));

    Ok(AppState {
        config: app_config,
        store,
        sessions: Arc::new(OfferSessions::default()),
        aggregator: Arc::new(OfferAggregator::new(providers)),
        checkout: Arc::new(checkout),
    })
}

/// Initialize and start the HTTP server
///
/// # Errors
///
/// This function will return an error if:
/// - Configuration loading or validation fails
/// - Database connection or migrations fail
/// - An HTTP client cannot be built
/// - Server binding fails
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    let log_level = init_tracing();
    info!("BUY-CRYPTO SERVICE STARTING");
    info!("Log level: {}", log_level);

    info!("Loading configuration...");
    let app_config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;
    app_config.validate().map_err(|e| anyhow::anyhow!(e))?;
    info!("Environment: {}", app_config.environment.as_str());

    if let Some(db_path) = app_config.database_url.strip_prefix("sqlite:") {
        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
                info!("Created database directory: {:?}", parent);
            }
        }
    }

    let state = build_state(app_config).await?;
    let app = create_router(state, config.allowed_origins.clone());

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("SERVER READY: http://{}", config.bind_address);
    log_server_info();

    axum::serve(listener, app).await?;
    Ok(())
}

/// Create the main application router with all routes
pub fn create_router(state: AppState, allowed_origins: Vec<String>) -> Router {
    use axum::http::{HeaderValue, Method};

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/api/buy-crypto/offers", post(handlers::buy_crypto::create_offers))
        .route("/api/buy-crypto/offers/{session_id}", get(handlers::buy_crypto::get_offers))
        .route(
            "/api/buy-crypto/offers/{session_id}/checkout/confirm",
            post(handlers::buy_crypto::confirm_checkout),
        )
        .route(
            "/api/buy-crypto/offers/{session_id}/checkout/cancel",
            post(handlers::buy_crypto::cancel_checkout),
        )
        .route(
            "/api/buy-crypto/offers/{session_id}/{provider}/expand",
            post(handlers::buy_crypto::toggle_expanded),
        )
        .route(
            "/api/buy-crypto/offers/{session_id}/{provider}/checkout",
            post(handlers::buy_crypto::begin_checkout),
        )
        .route("/api/buy-crypto/payments", get(handlers::payments::list_payments))
        .route(
            "/api/buy-crypto/payments/{provider}/{order_id}",
            delete(handlers::payments::remove_payment),
        )
        .route(
            "/api/buy-crypto/payments/{provider}/{order_id}/status",
            put(handlers::payments::update_payment_status),
        )
        .route("/health", get(|| async { "OK" }))
        .fallback(|| async {
            info!("[404 HANDLER] Unmatched route - returning 404");
            (axum::http::StatusCode::NOT_FOUND, "Route not found")
        })
        .with_state(state)
        .layer(axum::middleware::from_fn(log_requests))
        // Outer layer so the request ID exists before logging runs
        .layer(axum::middleware::from_fn(stamp_req))
        .layer(
            tower_http::trace::TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::error!(
                            error = ?error,
                            latency_ms = latency.as_millis(),
                            "[HTTP FAILURE] Error: {:?}, Latency: {}ms",
                            error,
                            latency.as_millis()
                        );
                    },
                ),
        )
        .layer(cors)
}

/// Log server information
fn log_server_info() {
    info!(" OFFERS:");
    info!("   • POST /api/buy-crypto/offers");
    info!("   • GET  /api/buy-crypto/offers/{{session_id}}");
    info!("   • POST /api/buy-crypto/offers/{{session_id}}/{{provider}}/expand");
    info!(" CHECKOUT:");
    info!("   • POST /api/buy-crypto/offers/{{session_id}}/{{provider}}/checkout");
    info!("   • POST /api/buy-crypto/offers/{{session_id}}/checkout/confirm");
    info!("   • POST /api/buy-crypto/offers/{{session_id}}/checkout/cancel");
    info!(" PAYMENTS:");
    info!("   • GET    /api/buy-crypto/payments");
    info!("   • PUT    /api/buy-crypto/payments/{{provider}}/{{order_id}}/status");
    info!("   • DELETE /api/buy-crypto/payments/{{provider}}/{{order_id}}");
    info!(" HEALTH:");
    info!("   • GET  /health");
}
// endregion: --- Server Setup

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::offers::tests::StaticProvider;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use lib_core::{Environment, ProviderKey};
    use lib_exchange::{ExchangeError, WalletRef};
    use sqlx::sqlite::SqlitePoolOptions;
    use tower::ServiceExt;

    pub(crate) struct FixedAddress;

    #[async_trait]
    impl AddressSource for FixedAddress {
        async fn create_address(&self, _wallet: &WalletRef) -> Result<String, ExchangeError> {
            Ok("1BoatSLRHtKNngkdXEeobR76b53LETtpyT".to_string())
        }
    }

    pub(crate) struct TestDeps {
        pub store: Arc<PaymentRepository>,
    }

    pub(crate) fn test_config() -> Config {
        Config {
            database_url: "sqlite::memory:".to_string(),
            exchange_api_url: "http://127.0.0.1:9".to_string(),
            wallet_service_url: "http://127.0.0.1:9".to_string(),
            app_scheme: "bitpay".to_string(),
            environment: Environment::Dev,
            http_timeout_secs: 2,
            open_in_browser: false,
        }
    }

    /// State with in-memory storage and providers quoting fixed crypto amounts.
    pub(crate) async fn test_state(simplex_amount: f64, wyre_amount: f64) -> (AppState, TestDeps) {
        let providers: Vec<Arc<dyn ExchangeProvider>> = vec![
            Arc::new(StaticProvider::quoting(ProviderKey::Simplex, simplex_amount)),
            Arc::new(StaticProvider::quoting(ProviderKey::Wyre, wyre_amount)),
        ];
        state_with(providers, Arc::new(FixedAddress)).await
    }

    pub(crate) async fn state_with(
        providers: Vec<Arc<dyn ExchangeProvider>>,
        addresses: Arc<dyn AddressSource>,
    ) -> (AppState, TestDeps) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        MIGRATOR.run(&pool).await.unwrap();
        let repository = Arc::new(PaymentRepository::new(pool));

        let store: Arc<dyn PaymentStore> = repository.clone();
        let state = AppState {
            config: test_config(),
            store: store.clone(),
            sessions: Arc::new(OfferSessions::default()),
            aggregator: Arc::new(OfferAggregator::new(providers)),
            checkout: Arc::new(CheckoutService::new(store, addresses, Arc::new(ClientHandoff))),
        };

        (state, TestDeps { store: repository })
    }

    #[tokio::test]
    async fn test_health_and_request_id() {
        let (state, _deps) = test_state(0.002, 0.002).await;
        let app = create_router(state, vec![]);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("X-Request-ID"));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (state, _deps) = test_state(0.002, 0.002).await;
        let app = create_router(state, vec![]);

        let response = app
            .oneshot(Request::builder().uri("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
