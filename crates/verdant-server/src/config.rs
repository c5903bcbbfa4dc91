use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use verdant_api::Settings;
use verdant_api::metrics::{BatteryCurve, TankGeometry};
use verdant_api::state::WeatherSettings;

/// Process configuration, read once from the environment (after `.env`).
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
    pub parts_dir: PathBuf,
    pub part_retention_hours: u64,
    pub settings: Settings,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Settings::default();
        let weather = WeatherSettings::default();

        let settings = Settings {
            history_limit: parse_or("VERDANT_HISTORY_LIMIT", defaults.history_limit)?,
            max_body_bytes: parse_or("VERDANT_MAX_BODY_BYTES", defaults.max_body_bytes)?,
            battery: BatteryCurve {
                empty_v: parse_or("VERDANT_BATTERY_EMPTY_V", defaults.battery.empty_v)?,
                full_v: parse_or("VERDANT_BATTERY_FULL_V", defaults.battery.full_v)?,
            },
            tank: TankGeometry {
                height_cm: parse_or("VERDANT_TANK_HEIGHT_CM", defaults.tank.height_cm)?,
                diameter_cm: parse_or("VERDANT_TANK_DIAMETER_CM", defaults.tank.diameter_cm)?,
            },
            weather: WeatherSettings {
                api_key: std::env::var("OPENWEATHER_API_KEY")
                    .ok()
                    .filter(|k| !k.is_empty()),
                url: std::env::var("VERDANT_WEATHER_URL").unwrap_or(weather.url),
                lat: parse_or("VERDANT_LAT", weather.lat)?,
                lon: parse_or("VERDANT_LON", weather.lon)?,
                city: std::env::var("VERDANT_CITY").unwrap_or(weather.city),
            },
        };

        Ok(Self {
            host: std::env::var("VERDANT_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: parse_or("VERDANT_PORT", 5000)?,
            db_path: std::env::var("VERDANT_DB_PATH")
                .unwrap_or_else(|_| "czujniki.db".into())
                .into(),
            upload_dir: std::env::var("VERDANT_UPLOAD_DIR")
                .unwrap_or_else(|_| "uploads".into())
                .into(),
            parts_dir: std::env::var("VERDANT_PARTS_DIR")
                .unwrap_or_else(|_| "temp_parts".into())
                .into(),
            part_retention_hours: parse_or("VERDANT_PART_RETENTION_HOURS", 24)?,
            settings,
        })
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        Err(_) => Ok(default),
    }
}
