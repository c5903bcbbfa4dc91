use serde::{Deserialize, Serialize};

/// One sensor sample as posted by the station.
///
/// Older firmware reports `battery` and `water_level`; newer firmware reports
/// the raw `battery_voltage` and ultrasonic `water_distance`. Both spellings
/// land in the same columns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewReading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_1: Option<f64>,
    pub soil_2: Option<f64>,
    pub light: Option<f64>,
    #[serde(alias = "battery")]
    pub battery_voltage: Option<f64>,
    #[serde(alias = "water_level")]
    pub water_distance: Option<f64>,
}

/// A stored reading plus the values derived from it for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_1: Option<f64>,
    pub soil_2: Option<f64>,
    pub light: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub water_distance: Option<f64>,
    pub battery_percent: Option<f64>,
    pub water_volume_l: Option<f64>,
    pub timestamp: String,
}

/// Oldest-first series for the temperature/humidity chart.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub temperature: Vec<Option<f64>>,
    pub humidity: Vec<Option<f64>>,
}
