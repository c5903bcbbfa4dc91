/// Database row types: these map directly to SQLite rows.
/// Distinct from verdant-types API models to keep the DB layer independent.

#[derive(Debug, Clone, PartialEq)]
pub struct ReadingRow {
    pub id: i64,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub soil_1: Option<f64>,
    pub soil_2: Option<f64>,
    pub light: Option<f64>,
    pub battery_voltage: Option<f64>,
    pub water_distance: Option<f64>,
    pub timestamp: String,
}
