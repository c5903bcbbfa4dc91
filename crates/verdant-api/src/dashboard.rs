use axum::{extract::State, http::StatusCode, response::Html};
use handlebars::{Handlebars, RenderError, TemplateError};
use serde::Serialize;
use tracing::error;

use verdant_types::models::Reading;

use crate::readings::recent;
use crate::state::AppState;

const TEMPLATE: &str = "dashboard";

const HEADERS: [&str; 10] = [
    "Time",
    "Temperature (°C)",
    "Humidity (%)",
    "Soil 1 (%)",
    "Soil 2 (%)",
    "Light (lx)",
    "Battery (V)",
    "Battery (%)",
    "Water distance (cm)",
    "Water (L)",
];

#[derive(Serialize)]
struct Page<'a> {
    headers: &'a [&'a str],
    rows: Vec<Row<'a>>,
}

#[derive(Serialize)]
struct Row<'a> {
    timestamp: &'a str,
    cells: Vec<String>,
}

/// Registry holding the dashboard page. Values are HTML-escaped on render.
pub fn templates() -> Result<Handlebars<'static>, TemplateError> {
    let mut reg = Handlebars::new();
    reg.register_template_string(TEMPLATE, include_str!("../templates/dashboard.hbs"))?;
    Ok(reg)
}

/// GET /: server-rendered table of recent readings.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let rows = recent(&state).await?;
    render(&state.views, &rows).map(Html).map_err(|e| {
        error!("Failed to render dashboard: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn render(reg: &Handlebars<'_>, rows: &[Reading]) -> Result<String, RenderError> {
    let page = Page {
        headers: &HEADERS,
        rows: rows.iter().map(row).collect(),
    };
    reg.render(TEMPLATE, &page)
}

fn row(r: &Reading) -> Row<'_> {
    let cells = [
        r.temperature,
        r.humidity,
        r.soil_1,
        r.soil_2,
        r.light,
        r.battery_voltage,
        r.battery_percent,
        r.water_distance,
        r.water_volume_l,
    ]
    .into_iter()
    .map(cell)
    .collect();
    Row {
        timestamp: &r.timestamp,
        cells,
    }
}

fn cell(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.2}"))
}
