//! Axum router construction for the Agenda API.
//!
//! Assembles every REST route into a single [`Router`] with CORS and
//! request tracing layers.

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{handlers, registrations};

/// Build the complete Axum router.
///
/// Fixed segments under `/api/events` (`search`, `conflicts`, `upcoming`,
/// `next`, `range`, `stats`, `by-date`) take precedence over the `{id}`
/// capture, so none of them is ever parsed as an event id. The same holds
/// for `search` and `summary` under `/api/registrations`.
///
/// CORS allows any origin so a browser front end can be served from
/// anywhere during development.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // Collection
        .route(
            "/api/events",
            get(handlers::list_events).post(handlers::create_event),
        )
        .route("/api/events/search", get(handlers::search_events))
        .route("/api/events/conflicts", get(handlers::get_conflicts))
        .route("/api/events/upcoming", get(handlers::upcoming_events))
        .route("/api/events/next", get(handlers::next_event))
        .route("/api/events/range", get(handlers::events_in_range))
        .route("/api/events/stats", get(handlers::stats))
        .route("/api/events/by-date/{day}", get(handlers::events_by_date))
        // Single event
        .route(
            "/api/events/{id}",
            get(handlers::get_event)
                .put(handlers::update_event)
                .delete(handlers::delete_event),
        )
        // Dependencies
        .route(
            "/api/events/{id}/dependencies",
            post(handlers::add_dependency),
        )
        .route(
            "/api/events/{id}/dependencies/{to}",
            delete(handlers::remove_dependency),
        )
        .route("/api/events/{id}/dependents", get(handlers::dependents))
        .route(
            "/api/events/{id}/prerequisites",
            get(handlers::prerequisites),
        )
        .route("/api/schedule/order", get(handlers::execution_order))
        // Registrations
        .route(
            "/api/registrations",
            get(registrations::list_registrations).post(registrations::create_registration),
        )
        .route(
            "/api/registrations/search",
            get(registrations::search_registrations),
        )
        .route(
            "/api/registrations/summary",
            get(registrations::registration_summary),
        )
        .route(
            "/api/registrations/{id}",
            get(registrations::get_registration)
                .put(registrations::update_registration)
                .delete(registrations::delete_registration),
        )
        .route(
            "/api/registrations/{id}/checkin",
            post(registrations::check_in),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
