use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

/// Headroom over the storage quota for form fields and other overhead.
const BODY_OVERHEAD_BYTES: u64 = 16 * 1024;

pub fn router(state: AppState) -> Router {
    let body_limit = body_limit(state.storage().quota_bytes());

    Router::new()
        .route("/", get(handlers::index))
        .route("/food-log", get(handlers::food_log_page))
        .route("/food-log/capture", post(handlers::capture_form))
        .route("/api/food-log", get(handlers::get_log).post(handlers::capture))
        .route("/api/food-log/today", get(handlers::get_today))
        .route("/api/food-log/groups", get(handlers::get_groups))
        .route("/api/workout/complete", post(handlers::workout_complete))
        .route("/api/workout/celebration", get(handlers::workout_celebration))
        .layer(body_limit)
        .with_state(state)
}

/// Lets any body that could still fit in storage reach the handlers, so an
/// oversized photo fails on the quota path instead of with a bare 413.
/// Percent-encoding can triple base64 text in a form post.
fn body_limit(quota_bytes: Option<u64>) -> DefaultBodyLimit {
    match quota_bytes {
        Some(quota) => {
            let limit = quota.saturating_mul(3).saturating_add(BODY_OVERHEAD_BYTES);
            DefaultBodyLimit::max(usize::try_from(limit).unwrap_or(usize::MAX))
        }
        None => DefaultBodyLimit::disable(),
    }
}
