use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Local};
use serde_json::Value;
use tracing::{error, warn};

use verdant_types::api::{WeatherError, WeatherResponse};

use crate::state::{AppState, WeatherSettings};

const RAIN_CONDITIONS: [&str; 4] = ["rain", "drizzle", "thunderstorm", "snow"];

/// GET /api/weather: current conditions at the station's location.
pub async fn get_weather(State(state): State<AppState>) -> Response {
    let settings = &state.settings.weather;
    let Some(api_key) = settings.api_key.as_deref() else {
        warn!("Weather requested but OPENWEATHER_API_KEY is not set");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(WeatherError {
                error: "Weather API key not configured".into(),
                details: None,
            }),
        )
            .into_response();
    };

    match fetch(&state.http, settings, api_key).await {
        Ok(body) => Json(parse_weather(&body, &settings.city, Local::now())).into_response(),
        Err(e) => {
            error!("Weather lookup failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(WeatherError {
                    error: "Failed to fetch weather data".into(),
                    details: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

async fn fetch(
    http: &reqwest::Client,
    settings: &WeatherSettings,
    api_key: &str,
) -> reqwest::Result<Value> {
    http.get(&settings.url)
        .query(&[
            ("lat", settings.lat.to_string()),
            ("lon", settings.lon.to_string()),
            ("appid", api_key.to_string()),
            ("units", "metric".to_string()),
            ("lang", "pl".to_string()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Map an OpenWeatherMap "current weather" document to the dashboard payload.
/// Absent fields become empty strings / `None` rather than errors.
pub fn parse_weather(body: &Value, city: &str, now: DateTime<Local>) -> WeatherResponse {
    let first = body.get("weather").and_then(|w| w.get(0));
    let text = |key: &str| {
        first
            .and_then(|w| w.get(key))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    };

    let condition = text("main");
    let is_raining = RAIN_CONDITIONS.contains(&condition.to_lowercase().as_str());

    WeatherResponse {
        city: city.to_string(),
        temperature: body.pointer("/main/temp").and_then(Value::as_f64),
        description: text("description"),
        is_raining,
        condition,
        datetime: now.format("%Y-%m-%d %H:%M:%S").to_string(),
        timestamp: now.timestamp(),
    }
}
