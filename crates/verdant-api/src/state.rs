use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use handlebars::Handlebars;
use verdant_db::Database;
use verdant_upload::Reassembler;

use crate::dashboard;
use crate::metrics::{BatteryCurve, TankGeometry};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub uploads: Reassembler,
    pub settings: Settings,
    pub http: reqwest::Client,
    pub views: Handlebars<'static>,
}

impl AppStateInner {
    pub fn new(db: Database, uploads: Reassembler, settings: Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        let views = dashboard::templates()?;
        Ok(Self {
            db,
            uploads,
            settings,
            http,
            views,
        })
    }
}

/// Tunables read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Rows returned by the latest/table/chart endpoints and the dashboard.
    pub history_limit: u32,
    pub max_body_bytes: usize,
    pub battery: BatteryCurve,
    pub tank: TankGeometry,
    pub weather: WeatherSettings,
}

#[derive(Debug, Clone)]
pub struct WeatherSettings {
    pub api_key: Option<String>,
    pub url: String,
    pub lat: f64,
    pub lon: f64,
    pub city: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_limit: 20,
            max_body_bytes: 16 * 1024 * 1024,
            battery: BatteryCurve::default(),
            tank: TankGeometry::default(),
            weather: WeatherSettings::default(),
        }
    }
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            url: "https://api.openweathermap.org/data/2.5/weather".into(),
            lat: 52.4064,
            lon: 16.9252,
            city: "Poznań".into(),
        }
    }
}
