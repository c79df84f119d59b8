//! HTTP surface: four prediction endpoints plus a liveness probe.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::features::generate_climate_features;
use crate::forecast::{IndicatorSet, TemperatureForecast};
use crate::state::AppState;
use crate::tables::{MortalityEstimate, YearlyStatistics};
use crate::types::{
    require_object, year_key, EconomyRequest, EnvironmentRequest, TemperatureRequest,
};

type Payload = Result<Json<Value>, JsonRejection>;

pub fn router(state: AppState) -> Router {
    // Called straight from the browser frontend.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(liveness))
        .route("/predict-temperature", post(predict_temperature))
        .route("/predict-mortality", post(predict_mortality))
        .route("/predict-environment", post(predict_environment))
        .route("/predict-economy", post(predict_economy))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn liveness() -> Json<Value> {
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn predict_temperature(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<TemperatureForecast>, ApiError> {
    let body = require_object(payload?.0)?;
    let req = TemperatureRequest::from_body(&body)?;
    let features = generate_climate_features(req.year, req.month, req.day, req.hour, req.dayofweek)?;
    Ok(Json(state.temperature.predict(&features)?))
}

/// Never fails on the year itself: anything that is not a known key yields nulls.
pub async fn predict_mortality(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<MortalityEstimate>, ApiError> {
    let body = require_object(payload?.0)?;
    Ok(Json(mortality(&state.statistics, year_key(body.get("year")))))
}

fn mortality(stats: &YearlyStatistics, key: Option<String>) -> MortalityEstimate {
    match key {
        Some(k) => stats.lookup(&k),
        None => MortalityEstimate::UNKNOWN,
    }
}

pub async fn predict_environment(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<IndicatorSet>, ApiError> {
    let body = require_object(payload?.0)?;
    let req = EnvironmentRequest::from_body(&body)?;
    Ok(Json(state.environment.predict(&req.row())?))
}

pub async fn predict_economy(
    State(state): State<AppState>,
    payload: Payload,
) -> Result<Json<IndicatorSet>, ApiError> {
    let body = require_object(payload?.0)?;
    let req = EconomyRequest::from_body(&body)?;
    Ok(Json(state.economy.predict(&req.row())?))
}
