mod error;
mod handlers;
mod headers;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::PersonService;

pub use error::{ApiError, ErrorBody};
pub use headers::{AlertHeaders, InvalidAppName, FAILURE_HEADER};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: PersonService,
    pub alerts: AlertHeaders,
}

pub fn create_router(service: PersonService, alerts: AlertHeaders) -> Router {
    let api = Router::new()
        // Persons
        .route(
            "/persons",
            post(handlers::create_person)
                .put(handlers::update_person)
                .get(handlers::list_persons),
        )
        .route(
            "/persons/{id}",
            get(handlers::get_person).delete(handlers::delete_person),
        )
        // Search
        .route("/_search/persons/{query}", get(handlers::search_persons))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(AppState { service, alerts })
}
