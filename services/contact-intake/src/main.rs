//! Juniper Broz Contact Intake Service
//!
//! HTTP surface for the advisory site's contact pipeline: form intake
//! with duplicate suppression, dual-channel email dispatch, and the
//! AI-assisted inbound-reply webhook.

use anyhow::Result;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    routing::{get, post},
    Router,
};
use juniper_utils::{init_logging, AppConfig};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use juniper_contact_intake::handlers::{self, AppState};
use juniper_contact_intake::middleware::request_id_middleware;
use juniper_contact_intake::service::IntakeService;

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().unwrap_or_else(|_| {
        eprintln!("Failed to load configuration, using defaults");
        AppConfig::default()
    });

    init_logging(&config.logging)?;
    info!("Starting Juniper Broz Contact Intake Service");

    let port = config.server.port;
    let app = create_app(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr).await?;
    info!("Contact Intake Service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn create_app(config: AppConfig) -> Router {
    let max_request_size = config.server.max_request_size;
    let service = IntakeService::new(config);

    Router::new()
        .route("/health", get(handlers::health_check))
        // POST-only routes answer other methods with 405.
        .route("/api/contact", post(handlers::contact))
        .route("/api/email-reply", post(handlers::email_reply))
        .route("/api/diagnostics", get(handlers::diagnostics))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods([Method::GET, Method::POST])
                        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
                )
                .layer(DefaultBodyLimit::max(max_request_size))
                .layer(axum::middleware::from_fn(request_id_middleware)),
        )
        .with_state(AppState { service })
}
