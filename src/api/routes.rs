use crate::api::api_error::APIError;
use crate::api::model::WebhookJson;
use crate::api::server::AppState;
use crate::endpoint::{Changes, Endpoint, Negotiation};
use crate::metrics;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub(super) fn new(state: AppState) -> Router {
    Router::new()
        .route("/", get(negotiate).post(apply_changes))
        .route("/records", get(records).post(apply_changes))
        .route("/adjustendpoints", post(adjust_endpoints))
        .route("/healthz", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(state.config.api_timeout))
        .with_state(state)
}

#[allow(clippy::unused_async)]
async fn health_check() -> &'static str {
    "OK"
}

#[allow(clippy::unused_async)]
async fn negotiate(State(state): State<AppState>) -> WebhookJson<Negotiation> {
    metrics::record_request("negotiate", true);
    WebhookJson(Negotiation::new(state.provider.zones().as_slice()))
}

async fn records(State(state): State<AppState>) -> Result<WebhookJson<Vec<Endpoint>>, APIError> {
    let result = state.provider.records().await;
    metrics::record_request("records", result.is_ok());
    let endpoints = result?;
    tracing::debug!("returning {} endpoints", endpoints.len());
    Ok(WebhookJson(endpoints))
}

async fn apply_changes(
    State(state): State<AppState>,
    WithRejection(Json(changes), _): WithRejection<Json<Changes>, APIError>,
) -> Result<StatusCode, APIError> {
    tracing::info!(
        "applying changes: {} create, {} updateOld, {} updateNew, {} delete",
        changes.create.len(),
        changes.update_old.len(),
        changes.update_new.len(),
        changes.delete.len()
    );
    let result = state.provider.apply_changes(&changes).await;
    metrics::record_request("apply_changes", result.is_ok());
    result?;
    Ok(StatusCode::NO_CONTENT)
}

#[allow(clippy::unused_async)]
async fn adjust_endpoints(
    State(state): State<AppState>,
    WithRejection(Json(endpoints), _): WithRejection<Json<Vec<Endpoint>>, APIError>,
) -> WebhookJson<Vec<Endpoint>> {
    metrics::record_request("adjust_endpoints", true);
    WebhookJson(state.provider.adjust_endpoints(endpoints))
}
