use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use verdant_types::api::StatusResponse;
use verdant_types::models::{ChartData, NewReading, Reading};

use crate::metrics::to_reading;
use crate::state::AppState;

/// POST /api/data: store one sample from the station.
pub async fn receive_data(
    State(state): State<AppState>,
    payload: Result<Json<NewReading>, JsonRejection>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let Json(reading) = payload.map_err(|e| {
        warn!("Rejected reading: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let db = state.clone();
    let id = tokio::task::spawn_blocking(move || db.db.insert_reading(&reading))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB insert_reading error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    debug!("Stored reading {}", id);
    Ok(Json(StatusResponse::ok()))
}

/// GET /api/latest: the newest reading, or `{}` before the first one.
pub async fn latest(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let rows = recent(&state).await?;
    let body = match rows.into_iter().next() {
        Some(reading) => serde_json::to_value(reading).map_err(|e| {
            error!("Serialize reading: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?,
        None => Value::Object(Default::default()),
    };
    Ok(Json(body))
}

/// GET /api/table-data: recent readings, newest first.
pub async fn table_data(State(state): State<AppState>) -> Result<Json<Vec<Reading>>, StatusCode> {
    Ok(Json(recent(&state).await?))
}

/// GET /api/chart-data: recent temperature and humidity, oldest first.
pub async fn chart_data(State(state): State<AppState>) -> Result<Json<ChartData>, StatusCode> {
    let rows = recent(&state).await?;

    let mut chart = ChartData::default();
    for r in rows.into_iter().rev() {
        chart.labels.push(r.timestamp);
        chart.temperature.push(r.temperature);
        chart.humidity.push(r.humidity);
    }
    Ok(Json(chart))
}

/// Last `history_limit` readings with derived values, newest first.
pub(crate) async fn recent(state: &AppState) -> Result<Vec<Reading>, StatusCode> {
    let db = state.clone();
    let limit = state.settings.history_limit;
    let rows = tokio::task::spawn_blocking(move || db.db.recent_readings(limit))
        .await
        .map_err(|e| {
            error!("spawn_blocking join error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .map_err(|e| {
            error!("DB recent_readings error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(rows
        .into_iter()
        .map(|row| to_reading(row, &state.settings))
        .collect())
}
