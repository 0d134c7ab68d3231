use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{calculate, generate_excel, list_sections};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .expose_headers([header::CONTENT_DISPOSITION]);

    Router::new()
        .route("/sections/", get(list_sections))
        .route("/calculate/", post(calculate))
        .route("/generate-excel/", post(generate_excel))
        .with_state(state)
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
}

/// Serves the API on an already bound listener until the process stops.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
) -> std::io::Result<()> {
    axum::serve(listener, create_router(state)).await
}
