pub mod handlers;
pub mod types;

use std::sync::Arc;

use axum::{routing::get, Router};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::db::EventStore;

pub struct AppState {
    pub events: Arc<dyn EventStore>,
}

pub fn router(events: Arc<dyn EventStore>) -> Router {
    let state = Arc::new(AppState { events });

    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/events/integrator/{chain_id}/{integrator}",
            get(handlers::events_by_integrator),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

pub async fn serve(
    events: Arc<dyn EventStore>,
    host: &str,
    port: u16,
    shutdown: CancellationToken,
) -> eyre::Result<()> {
    let app = router(events);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;
    Ok(())
}
