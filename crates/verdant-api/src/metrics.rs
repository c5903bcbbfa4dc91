use std::f64::consts::PI;

use verdant_db::models::ReadingRow;
use verdant_types::models::Reading;

use crate::state::Settings;

/// Linear charge estimate between an empty and a full cell voltage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryCurve {
    pub empty_v: f64,
    pub full_v: f64,
}

impl Default for BatteryCurve {
    fn default() -> Self {
        // single Li-ion cell
        Self {
            empty_v: 3.0,
            full_v: 4.2,
        }
    }
}

impl BatteryCurve {
    pub fn percent(&self, voltage: f64) -> f64 {
        let span = self.full_v - self.empty_v;
        if span <= 0.0 {
            return 0.0;
        }
        let pct = ((voltage - self.empty_v) / span * 100.0).clamp(0.0, 100.0);
        round_to(pct, 1)
    }
}

/// Upright cylindrical tank with the distance sensor mounted at the top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankGeometry {
    pub height_cm: f64,
    pub diameter_cm: f64,
}

impl Default for TankGeometry {
    fn default() -> Self {
        Self {
            height_cm: 100.0,
            diameter_cm: 50.0,
        }
    }
}

impl TankGeometry {
    /// Litres of water given the measured distance from sensor to surface.
    pub fn volume_litres(&self, distance_cm: f64) -> f64 {
        let level = (self.height_cm - distance_cm).clamp(0.0, self.height_cm.max(0.0));
        let radius = self.diameter_cm / 2.0;
        round_to(PI * radius * radius * level / 1000.0, 2)
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// API view of a stored row, with battery and water figures filled in.
pub fn to_reading(row: ReadingRow, settings: &Settings) -> Reading {
    Reading {
        battery_percent: row.battery_voltage.map(|v| settings.battery.percent(v)),
        water_volume_l: row.water_distance.map(|d| settings.tank.volume_litres(d)),
        temperature: row.temperature,
        humidity: row.humidity,
        soil_1: row.soil_1,
        soil_2: row.soil_2,
        light: row.light,
        battery_voltage: row.battery_voltage,
        water_distance: row.water_distance,
        timestamp: row.timestamp,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn battery_percent_is_clamped() {
        let curve = BatteryCurve::default();
        assert_eq!(curve.percent(3.0), 0.0);
        assert_eq!(curve.percent(4.2), 100.0);
        assert_eq!(curve.percent(3.6), 50.0);
        assert_eq!(curve.percent(2.5), 0.0);
        assert_eq!(curve.percent(5.0), 100.0);
    }

    #[test]
    fn degenerate_curve_reads_empty() {
        let curve = BatteryCurve {
            empty_v: 4.0,
            full_v: 4.0,
        };
        assert_eq!(curve.percent(4.1), 0.0);
    }

    #[test]
    fn tank_volume() {
        let tank = TankGeometry {
            height_cm: 100.0,
            diameter_cm: 20.0,
        };
        // full: pi * 10^2 * 100 cm^3 = 31.42 L
        assert_eq!(tank.volume_litres(0.0), 31.42);
        assert_eq!(tank.volume_litres(50.0), 15.71);
        assert_eq!(tank.volume_litres(100.0), 0.0);
        // sensor noise beyond the tank bottom or above the rim
        assert_eq!(tank.volume_litres(130.0), 0.0);
        assert_eq!(tank.volume_litres(-5.0), 31.42);
    }

    #[test]
    fn missing_inputs_stay_missing() {
        let row = ReadingRow {
            id: 1,
            temperature: Some(20.0),
            humidity: None,
            soil_1: None,
            soil_2: None,
            light: None,
            battery_voltage: None,
            water_distance: Some(100.0),
            timestamp: "2024-05-01 10:00:00".into(),
        };
        let reading = to_reading(row, &Settings::default());
        assert_eq!(reading.battery_percent, None);
        assert_eq!(reading.water_volume_l, Some(0.0));
        assert_eq!(reading.temperature, Some(20.0));
    }
}
