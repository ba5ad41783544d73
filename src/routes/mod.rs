pub mod application;
pub mod health;
pub mod notification;
pub mod post;
pub mod profile;
pub mod project;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::require_bearer_auth,
    cors::api_cors,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Builds the full HTTP surface. Everything under `/api` requires a bearer token.
pub fn router(state: AppState, api_rps: u32) -> Router {
    let api = Router::new()
        .route("/api/profiles/artist", post(profile::register_artist))
        .route("/api/profiles/artist/:id", get(profile::get_artist))
        .route("/api/profiles/client", post(profile::register_client))
        .route(
            "/api/job-posts",
            get(post::list_job_posts).post(post::create_job_post),
        )
        .route(
            "/api/job-posts/:id",
            get(post::get_job_post)
                .patch(post::update_job_post)
                .delete(post::delete_job_post),
        )
        .route("/api/job-posts/:id/status", post(post::set_job_post_status))
        .route("/api/job-posts/:id/view", post(post::record_job_post_view))
        .route("/api/job-posts/slug/:slug", get(post::get_job_post_by_slug))
        .route(
            "/api/availability-posts",
            get(post::list_availability_posts).post(post::create_availability_post),
        )
        .route(
            "/api/availability-posts/:id",
            get(post::get_availability_post)
                .patch(post::update_availability_post)
                .delete(post::delete_availability_post),
        )
        .route(
            "/api/availability-posts/:id/status",
            post(post::set_availability_post_status),
        )
        .route(
            "/api/availability-posts/:id/view",
            post(post::record_availability_post_view),
        )
        .route(
            "/api/availability-posts/slug/:slug",
            get(post::get_availability_post_by_slug),
        )
        .route(
            "/api/applications",
            get(application::list_applications).post(application::create_application),
        )
        .route(
            "/api/applications/:id",
            get(application::get_application).delete(application::withdraw_application),
        )
        .route(
            "/api/applications/:id/status",
            patch(application::update_application_status),
        )
        .route(
            "/api/applications/:id/convert",
            post(application::convert_application),
        )
        .route(
            "/api/projects",
            get(project::list_projects).post(project::create_project),
        )
        .route(
            "/api/projects/:id",
            get(project::get_project).patch(project::update_project),
        )
        .route("/api/notifications", get(notification::list_notifications))
        .route(
            "/api/notifications/unread-count",
            get(notification::unread_count),
        )
        .route("/api/notifications/read-all", post(notification::mark_all_read))
        .route("/api/notifications/:id/read", post(notification::mark_read))
        .route(
            "/api/notifications/:id",
            axum::routing::delete(notification::delete_notification),
        )
        .route_layer(from_fn_with_state(state.clone(), require_bearer_auth));

    Router::new()
        .route("/health", get(health::health))
        .merge(api)
        .layer(from_fn_with_state(RateLimiter::new(api_rps), rps_middleware))
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
