use crate::Database;
use crate::models::ReadingRow;
use anyhow::Result;
use rusqlite::Connection;
use verdant_types::models::NewReading;

impl Database {
    /// Insert one sample; the timestamp is assigned by SQLite (UTC).
    /// Returns the new row id.
    pub fn insert_reading(&self, r: &NewReading) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO czujniki (
                    temperature, humidity, soil_1, soil_2, light, battery_voltage, water_distance
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    r.temperature,
                    r.humidity,
                    r.soil_1,
                    r.soil_2,
                    r.light,
                    r.battery_voltage,
                    r.water_distance,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// The `limit` most recent readings, newest first.
    pub fn recent_readings(&self, limit: u32) -> Result<Vec<ReadingRow>> {
        self.with_conn(|conn| query_recent(conn, limit))
    }
}

fn query_recent(conn: &Connection, limit: u32) -> Result<Vec<ReadingRow>> {
    // id breaks ties between rows inserted within the same second
    let mut stmt = conn.prepare(
        "SELECT id, temperature, humidity, soil_1, soil_2, light, battery_voltage, water_distance, timestamp
         FROM czujniki
         ORDER BY timestamp DESC, id DESC
         LIMIT ?1",
    )?;

    let rows = stmt
        .query_map([limit], |row| {
            Ok(ReadingRow {
                id: row.get(0)?,
                temperature: row.get(1)?,
                humidity: row.get(2)?,
                soil_1: row.get(3)?,
                soil_2: row.get(4)?,
                light: row.get(5)?,
                battery_voltage: row.get(6)?,
                water_distance: row.get(7)?,
                timestamp: row.get(8)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}
