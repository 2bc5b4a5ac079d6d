use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::debug;

use super::models::{NewReading, Reading};

/// The persistence medium is unreachable, corrupted, or rejected an
/// operation. Always maps to a server-error response at the API layer.
#[derive(Debug, Error)]
#[error("storage I/O failure: {0}")]
pub struct StorageIoError(#[from] sqlx::Error);

/// Per-column aggregate over a trailing time window. A column with no
/// non-null values in the window reports zeros by convention.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColumnStats {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// Result of [`ReadingStore::aggregate_window`]. Values carry full
/// precision; display rounding is the caller's concern.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowStats {
    pub total_readings: i64,
    pub temperature: ColumnStats,
    pub humidity: ColumnStats,
    pub gas_analog: ColumnStats,
}

/// Owned handle over the `sensor_readings` table. Cheap to clone; all
/// clones share one connection pool.
#[derive(Clone)]
pub struct ReadingStore {
    pool: SqlitePool,
}

impl ReadingStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persists one reading and returns the assigned row id. Fills
    /// `timestamp` with the current time when the caller left it unset.
    /// A single-row INSERT, so concurrent readers never observe a
    /// partially written row.
    pub async fn append(&self, reading: NewReading) -> Result<i64, StorageIoError> {
        let timestamp = reading.timestamp.unwrap_or_else(Utc::now);

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sensor_readings
                (timestamp, device_id, temperature, humidity, gas_analog, gas_digital)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(timestamp)
        .bind(&reading.device_id)
        .bind(reading.temperature)
        .bind(reading.humidity)
        .bind(reading.gas_analog)
        .bind(reading.gas_digital)
        .fetch_one(&self.pool)
        .await?;

        debug!(id, device_id = %reading.device_id, "Reading appended");
        Ok(id)
    }

    /// Up to `limit` readings, newest first (`timestamp DESC`, ties broken
    /// by `id DESC`). An empty table yields an empty vec, not an error.
    pub async fn list_recent(&self, limit: i64) -> Result<Vec<Reading>, StorageIoError> {
        let rows = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, timestamp, device_id, temperature, humidity, gas_analog, gas_digital
            FROM sensor_readings
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The single most recent reading, or `None` when the table is empty.
    pub async fn latest(&self) -> Result<Option<Reading>, StorageIoError> {
        let row = sqlx::query_as::<_, Reading>(
            r#"
            SELECT id, timestamp, device_id, temperature, humidity, gas_analog, gas_digital
            FROM sensor_readings
            ORDER BY timestamp DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Aggregates over rows whose timestamp falls within the trailing
    /// `window` from now. `now` is captured once per call so a slow scan
    /// cannot skew the cutoff. NULL measurements are excluded per column
    /// (SQL AVG/MIN/MAX semantics), so a reading with only some fields set
    /// still contributes to the columns it does carry.
    pub async fn aggregate_window(&self, window: Duration) -> Result<WindowStats, StorageIoError> {
        let cutoff = Utc::now() - window;

        #[allow(clippy::type_complexity)]
        let row: (
            i64,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<f64>,
            Option<i64>,
            Option<i64>,
        ) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   AVG(temperature), MIN(temperature), MAX(temperature),
                   AVG(humidity),    MIN(humidity),    MAX(humidity),
                   AVG(gas_analog),  MIN(gas_analog),  MAX(gas_analog)
            FROM sensor_readings
            WHERE timestamp >= ?
            "#,
        )
        .bind(cutoff)
        .fetch_one(&self.pool)
        .await?;

        Ok(WindowStats {
            total_readings: row.0,
            temperature: ColumnStats {
                average: row.1.unwrap_or(0.0),
                min: row.2.unwrap_or(0.0),
                max: row.3.unwrap_or(0.0),
            },
            humidity: ColumnStats {
                average: row.4.unwrap_or(0.0),
                min: row.5.unwrap_or(0.0),
                max: row.6.unwrap_or(0.0),
            },
            gas_analog: ColumnStats {
                average: row.7.unwrap_or(0.0),
                min: row.8.map(|v| v as f64).unwrap_or(0.0),
                max: row.9.map(|v| v as f64).unwrap_or(0.0),
            },
        })
    }

    /// Deletes every stored reading. Irreversible.
    pub async fn clear_all(&self) -> Result<(), StorageIoError> {
        sqlx::query("DELETE FROM sensor_readings")
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
