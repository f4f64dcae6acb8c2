use std::sync::Arc;

use authgate::core::auth::{
    AuthApiState, AuthService, JwtConfig, JwtService, PasswordHasher, SessionCookie, SessionGate,
    auth_api_router,
};
use authgate::core::config::Config;
use authgate::core::db::{MemoryUserStore, PgUserStore, UserStore, connect};
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Refuse to start without a signing secret
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return Err(e.into());
        }
    };

    tracing::info!(
        "Config loaded: database={}, token_validity_hours={}, bcrypt_cost={}, cookie_secure={}",
        config.has_database(),
        config.token_validity_hours,
        config.bcrypt_cost,
        config.cookie_secure
    );

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(url) => {
            let pool = connect(url).await?;
            tracing::info!("Using PostgreSQL credential store");
            Arc::new(PgUserStore::new(pool))
        }
        None => {
            tracing::warn!(
                "DATABASE_URL not set, using in-memory credential store; accounts are lost on restart"
            );
            Arc::new(MemoryUserStore::new())
        }
    };

    let jwt_service =
        JwtService::new(JwtConfig::new(config.jwt_secret.clone()).validity(config.token_validity()));
    let auth_service = AuthService::new(
        store,
        PasswordHasher::new(config.bcrypt_cost),
        jwt_service,
    );
    let cookie = SessionCookie::new(
        config.cookie_name.clone(),
        config.token_validity(),
        config.cookie_secure,
    );
    let gate = SessionGate::new(auth_service.clone(), cookie);

    let app = auth_api_router(AuthApiState::new(auth_service, gate))
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    tracing::info!("listening on http://{}", config.server_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// CORS for the configured frontends; credentials are allowed so the
/// browser sends the session cookie.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE])
        .allow_credentials(true)
}
