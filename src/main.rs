use std::sync::Arc;

use authgate::identity::{HttpIdentityBackend, IdentityConfig};
use authgate::routes;
use authgate::services::tokens::CookiePolicy;
use authgate::state::AppState;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    // Missing backend URL is a fatal configuration error, not a degraded mode.
    let config = IdentityConfig::from_env().expect("identity backend config");
    let backend = HttpIdentityBackend::from_config(&config).expect("identity client init");
    let cookies = CookiePolicy::from_env();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()
        .expect("invalid PORT");

    let state = AppState::new(Arc::new(backend), cookies);
    let app = routes::app(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, backend = %config.base_url, secure_cookies = cookies.secure, "authgate listening");
    axum::serve(listener, app).await.expect("server failed");
}
