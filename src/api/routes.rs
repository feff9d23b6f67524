use crate::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route(
            "/research",
            post(crate::api::handlers::research::create_research),
        )
        .route(
            "/status/{id}",
            get(crate::api::handlers::research::get_status),
        )
}
