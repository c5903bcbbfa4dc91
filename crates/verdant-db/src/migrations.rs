use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Database: running migration v1 (readings)");
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS czujniki (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                temperature     REAL,
                humidity        REAL,
                soil_1          REAL,
                soil_2          REAL,
                light           REAL,
                battery_voltage REAL,
                water_distance  REAL,
                timestamp       TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_czujniki_timestamp
                ON czujniki(timestamp);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
