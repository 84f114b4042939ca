use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use salonbook::config::AppConfig;
use salonbook::db;
use salonbook::handlers;
use salonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/availability",
            get(handlers::availability::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route(
            "/api/bookings/:id/status",
            post(handlers::bookings::update_status),
        )
        .route("/api/admin/services", post(handlers::admin::create_service))
        .route("/api/admin/services", get(handlers::admin::list_services))
        .route("/api/admin/staff", post(handlers::admin::create_staff))
        .route("/api/admin/staff", get(handlers::admin::list_staff))
        .route(
            "/api/admin/staff/:id/hours",
            put(handlers::admin::set_staff_hours),
        )
        .route(
            "/api/admin/staff/:id/overrides",
            put(handlers::admin::set_staff_override),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
