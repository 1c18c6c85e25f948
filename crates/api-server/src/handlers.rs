//! Axum handlers for the trigger API.
//!
//! Every externally triggerable endpoint runs the rate governor first, then
//! (for scheduler routes) the shared-secret check, then the campaign work.

use crate::auth::{self, TriggerAuth};
use crate::models::*;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tidypush_campaigns::CampaignRunner;
use tidypush_core::config::TriggerConfig;
use tidypush_core::NotifyError;
use tidypush_delivery::TokenRegistry;
use tidypush_platform::RateGovernor;
use tracing::{error, warn};

/// Shared state for all trigger handlers.
#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<CampaignRunner>,
    pub registry: Arc<TokenRegistry>,
    pub governor: Arc<RateGovernor>,
    pub trigger: TriggerConfig,
    pub start_time: Instant,
}

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, error: &str, message: impl Into<String>) -> HandlerError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            message: message.into(),
        }),
    )
}

/// Admission check; runs before any other work.
fn admit(state: &AppState, identifier: &str) -> Result<(), HandlerError> {
    if state
        .governor
        .admit(identifier, state.trigger.rate_limit, state.trigger.rate_window_ms)
    {
        Ok(())
    } else {
        warn!(identifier, "request rejected by rate governor");
        metrics::counter!("api.rate_limited").increment(1);
        Err(reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "Too many requests; retry later",
        ))
    }
}

/// Shared-secret check for scheduler-triggered routes.
fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), HandlerError> {
    match auth::authorize_trigger(headers, &state.trigger.cron_secret) {
        TriggerAuth::Authorized => Ok(()),
        TriggerAuth::Rejected(reason) => {
            metrics::counter!("api.unauthorized").increment(1);
            Err(reject(StatusCode::UNAUTHORIZED, "unauthorized", reason))
        }
    }
}

fn map_error(e: NotifyError) -> HandlerError {
    match e {
        NotifyError::RecipientNotFound(id) => reject(
            StatusCode::NOT_FOUND,
            "recipient_not_found",
            format!("No recipient with id {id}"),
        ),
        NotifyError::NotEligible(reason) => {
            reject(StatusCode::BAD_REQUEST, "not_eligible", reason)
        }
        NotifyError::InvalidToken(token) => reject(
            StatusCode::BAD_REQUEST,
            "invalid_token",
            format!("Not a valid push token: {token}"),
        ),
        other => {
            error!(error = %other, "trigger request failed");
            reject(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "Internal processing error",
            )
        }
    }
}

// ─── Scheduler triggers ────────────────────────────────────────────────────

pub async fn daily_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, "cron:daily-reminders")?;
    authorize(&state, &headers)?;
    let outcome = state
        .runner
        .run_daily_reminders(Utc::now())
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

pub async fn weekly_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, "cron:weekly-stats")?;
    authorize(&state, &headers)?;
    let outcome = state
        .runner
        .run_weekly_stats(Utc::now())
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

pub async fn re_engagement(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, "cron:re-engagement")?;
    authorize(&state, &headers)?;
    let outcome = state
        .runner
        .run_re_engagement(Utc::now())
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

// ─── Operator triggers ─────────────────────────────────────────────────────

pub async fn send_direct(
    State(state): State<AppState>,
    Json(req): Json<SendRequest>,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, &format!("send:{}", req.recipient_id))?;
    if req.title.is_empty() || req.body.is_empty() {
        return Err(reject(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "title and body must not be empty",
        ));
    }
    let outcome = state
        .runner
        .send_direct(req.recipient_id, req.title, req.body, req.data)
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

pub async fn battery_alert(
    State(state): State<AppState>,
    Json(req): Json<BatteryAlertRequest>,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, &format!("battery:{}", req.recipient_id))?;
    let outcome = state
        .runner
        .send_battery_alert(req.recipient_id, req.battery_level)
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

pub async fn premium_reminder(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PremiumReminderRequest>,
) -> Result<Json<TriggerResponse>, HandlerError> {
    admit(&state, "push:premium-reminder")?;
    authorize(&state, &headers)?;
    let outcome = state
        .runner
        .run_premium_reminder(req.custom_message)
        .await
        .map_err(map_error)?;
    Ok(Json(TriggerResponse::new(outcome)))
}

pub async fn reconcile_receipts(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ReceiptsRequest>,
) -> Result<Json<ReceiptsResponse>, HandlerError> {
    admit(&state, "push:receipts")?;
    authorize(&state, &headers)?;
    let summary = state
        .runner
        .reconcile_receipts(&req.tickets)
        .await
        .map_err(map_error)?;
    Ok(Json(ReceiptsResponse {
        success: true,
        summary,
    }))
}

// ─── Token lifecycle ───────────────────────────────────────────────────────

pub async fn register_token(
    State(state): State<AppState>,
    Json(req): Json<RegisterTokenRequest>,
) -> Result<Json<AckResponse>, HandlerError> {
    admit(&state, &format!("token:{}", req.recipient_id))?;
    state
        .registry
        .register(req.recipient_id, &req.push_token, req.platform)
        .await
        .map_err(map_error)?;
    metrics::counter!("tokens.registered").increment(1);
    Ok(Json(AckResponse {
        success: true,
        message: "Push token registered successfully".to_string(),
    }))
}

pub async fn deregister_token(
    State(state): State<AppState>,
    Json(req): Json<DeregisterTokenRequest>,
) -> Result<Json<AckResponse>, HandlerError> {
    admit(&state, &format!("token:{}", req.recipient_id))?;
    state
        .registry
        .deregister(req.recipient_id)
        .await
        .map_err(map_error)?;
    metrics::counter!("tokens.deregistered").increment(1);
    Ok(Json(AckResponse {
        success: true,
        message: "Push token removed successfully".to_string(),
    }))
}

// ─── Probes ────────────────────────────────────────────────────────────────

pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.start_time.elapsed().as_secs() > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

pub async fn liveness() -> StatusCode {
    StatusCode::OK
}
