use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One persisted sensor sample. Immutable once stored.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Reading {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    /// Degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity percentage
    pub humidity: Option<f64>,
    /// Raw ADC value, nominally 0..1024 (not enforced)
    pub gas_analog: Option<i64>,
    /// Binary gas-sensor threshold flag (0 or 1)
    pub gas_digital: Option<i64>,
}

/// A sample as handed to the storage engine, before `id` assignment.
///
/// `timestamp` is filled with the server-observed insertion time when the
/// device did not supply one. Measurement fields stay `None` when absent —
/// absence is a stored state, not a rejected request.
#[derive(Debug, Clone)]
pub struct NewReading {
    pub timestamp: Option<DateTime<Utc>>,
    pub device_id: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas_analog: Option<i64>,
    pub gas_digital: Option<i64>,
}
