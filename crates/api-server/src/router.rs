//! Trigger API router — mounts the campaign, token, and probe endpoints.

use crate::handlers::{self, AppState};
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Build the trigger router with all endpoints.
pub fn trigger_router(state: AppState) -> Router {
    Router::new()
        // Scheduler triggers
        .route("/api/cron/daily-reminders", get(handlers::daily_reminders))
        .route("/api/cron/weekly-stats", get(handlers::weekly_stats))
        .route("/api/cron/re-engagement", get(handlers::re_engagement))
        // Operator triggers
        .route("/api/push/send", post(handlers::send_direct))
        .route("/api/push/battery-alert", post(handlers::battery_alert))
        .route("/api/push/premium-reminder", post(handlers::premium_reminder))
        .route("/api/push/receipts", post(handlers::reconcile_receipts))
        // Token lifecycle
        .route(
            "/api/recipients/push-token",
            post(handlers::register_token).delete(handlers::deregister_token),
        )
        // Operational endpoints
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness))
        .route("/live", get(handlers::liveness))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
