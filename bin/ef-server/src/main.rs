//! EventForge Server
//!
//! Production server for the event-management REST APIs:
//! - Events: CRUD, certificate enablement, template upload
//! - Registrations: sign-up, rosters, attendance
//! - Certificates: authenticated download, public verification
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EF_API_PORT` | `8080` | HTTP API port |
//! | `EF_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `EF_MONGO_DB` | `eventforge` | MongoDB database name |
//! | `EF_JWT_SECRET` | - | HS256 secret shared with the auth service |
//! | `EF_JWT_ISSUER` | `eventforge` | Expected JWT issuer claim |
//! | `EF_UPLOAD_DIR` | `uploads/certificates` | Template upload directory |
//! | `EF_GENERATED_DIR` | `uploads/generated` | Generated PDF directory |
//! | `EF_VERIFY_BASE_URL` | `http://localhost:5173` | Base URL for QR verification links |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Extension, Router};
use tokio::{net::TcpListener, signal};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ef_platform::api::{
    certificates_router, events_router, registrations_router, users_router, ApiDoc, AppState,
    CertificatesState, EventsState, RegistrationsState, UsersState,
};
use ef_platform::config::CertificateConfig;
use ef_platform::repository::{indexes, EventRepository, RegistrationRepository, UserRepository};
use ef_platform::service::{AuthConfig, AuthService, CertificateService};

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_or_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Starting EventForge Server");

    // Configuration from environment
    let api_port: u16 = env_or_parse("EF_API_PORT", 8080);
    let mongo_url = env_or("EF_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("EF_MONGO_DB", "eventforge");
    let jwt_secret = std::env::var("EF_JWT_SECRET").context("EF_JWT_SECRET must be set")?;
    let jwt_issuer = env_or("EF_JWT_ISSUER", "eventforge");
    let upload_dir = env_or("EF_UPLOAD_DIR", "uploads/certificates");
    let generated_dir = env_or("EF_GENERATED_DIR", "uploads/generated");

    let mut certificate_config = CertificateConfig::new(upload_dir, generated_dir);
    if let Ok(base_url) = std::env::var("EF_VERIFY_BASE_URL") {
        certificate_config = certificate_config.with_verify_base_url(base_url);
    }

    // Connect to MongoDB
    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);
    indexes::ensure_indexes(&db).await?;

    // Initialize repositories
    let user_repo = Arc::new(UserRepository::new(&db));
    let event_repo = Arc::new(EventRepository::new(&db));
    let registration_repo = Arc::new(RegistrationRepository::new(&db));
    info!("Repositories initialized");

    // Initialize services
    let auth_service = Arc::new(AuthService::new(AuthConfig::new(jwt_secret, jwt_issuer)));
    let certificate_service = Arc::new(CertificateService::new(
        registration_repo.clone(),
        event_repo.clone(),
        user_repo.clone(),
        certificate_config.clone(),
    ));
    info!("Services initialized");

    let app_state = AppState {
        auth_service: auth_service.clone(),
    };

    // Build API states
    let events_state = EventsState {
        event_repo: event_repo.clone(),
        registration_repo: registration_repo.clone(),
        config: certificate_config.clone(),
    };
    let registrations_state = RegistrationsState {
        registration_repo,
        event_repo,
    };
    let certificates_state = CertificatesState {
        certificate_service,
    };
    let users_state = UsersState { user_repo };

    let app = Router::new()
        .nest("/events", events_router(events_state))
        .nest("/registrations", registrations_router(registrations_state))
        .nest("/certificates", certificates_router(certificates_state))
        .nest("/users", users_router(users_state))
        .route("/health", get(health_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/q/openapi", ApiDoc::openapi()))
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any));

    let api_addr = format!("0.0.0.0:{}", api_port);
    info!("API server listening on http://{}", api_addr);

    let listener = TcpListener::bind(&api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("EventForge Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "UP",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
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
}
