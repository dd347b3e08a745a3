use std::future::ready;

use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{any, get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::handlers::{capture, generate, index, webhooks};
use crate::metrics::track_metrics;
use crate::state::AppState;

/// Build the service. `/metrics` is only routed when a recorder handle is given.
pub fn router(state: AppState, config: &Config, recorder: Option<PrometheusHandle>) -> Router {
    // Captures come from third parties and the inspector UI may live on another origin.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
        .allow_origin(AllowOrigin::mirror_request());

    let status_router = Router::new()
        .route("/", get(index))
        .route("/_readiness", get(index))
        .route("/_liveness", get(index));

    let capture_router = Router::new()
        .route("/capture", any(capture::capture_webhook))
        .route("/capture/*path", any(capture::capture_webhook));

    let api_router = Router::new()
        .route("/api/webhooks", get(webhooks::list_webhooks))
        .route(
            "/api/webhooks/:id",
            get(webhooks::get_webhook).delete(webhooks::delete_webhook),
        )
        .route("/api/generate", post(generate::generate_handler));

    // One semaphore shared by every route below.
    let limited_router = Router::new()
        .merge(capture_router)
        .merge(api_router)
        .layer(DefaultBodyLimit::max(config.max_body_size))
        .layer(GlobalConcurrencyLimitLayer::new(config.concurrency_limit))
        .with_state(state);

    let router = Router::new()
        .merge(status_router)
        .merge(limited_router)
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(track_metrics))
        .layer(cors);

    match recorder {
        Some(recorder_handle) => {
            router.route("/metrics", get(move || ready(recorder_handle.render())))
        }
        None => router,
    }
}
