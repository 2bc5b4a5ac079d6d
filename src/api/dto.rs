use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::{
    models::{NewReading, Reading},
    store::WindowStats,
};

/// Request body for `POST /api/sensor-data`.
///
/// Every field is optional: a device that omits a measurement produces a
/// null column, never a rejected request. `device_id` falls back to
/// `"unknown"` and `timestamp` to the server clock.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NewReadingRequest {
    pub device_id: Option<String>,
    /// RFC3339; defaults to the server-observed insertion time.
    pub timestamp: Option<DateTime<Utc>>,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas_analog: Option<i64>,
    pub gas_digital: Option<i64>,
}

impl From<NewReadingRequest> for NewReading {
    fn from(req: NewReadingRequest) -> Self {
        Self {
            timestamp: req.timestamp,
            device_id: req.device_id.unwrap_or_else(|| "unknown".to_owned()),
            temperature: req.temperature,
            humidity: req.humidity,
            gas_analog: req.gas_analog,
            gas_digital: req.gas_digital,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReadingDto {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub device_id: String,
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub gas_analog: Option<i64>,
    pub gas_digital: Option<i64>,
}

impl From<Reading> for ReadingDto {
    fn from(r: Reading) -> Self {
        Self {
            id: r.id,
            timestamp: r.timestamp,
            device_id: r.device_id,
            temperature: r.temperature,
            humidity: r.humidity,
            gas_analog: r.gas_analog,
            gas_digital: r.gas_digital,
        }
    }
}

/// Acknowledgment for a stored reading.
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub status: &'static str,
    pub message: &'static str,
    /// Row id assigned by storage.
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ColumnStatsDto {
    pub average: f64,
    pub min: f64,
    pub max: f64,
}

/// The gas block historically reports no minimum.
#[derive(Debug, Serialize, ToSchema)]
pub struct GasStatsDto {
    pub average: f64,
    pub max: f64,
}

/// Response body for `GET /api/stats`. Values are rounded to one decimal
/// place for display; empty columns report zeros.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsDto {
    pub total_readings: i64,
    pub temperature: ColumnStatsDto,
    pub humidity: ColumnStatsDto,
    pub gas: GasStatsDto,
}

impl From<WindowStats> for StatsDto {
    fn from(s: WindowStats) -> Self {
        Self {
            total_readings: s.total_readings,
            temperature: ColumnStatsDto {
                average: round1(s.temperature.average),
                min: round1(s.temperature.min),
                max: round1(s.temperature.max),
            },
            humidity: ColumnStatsDto {
                average: round1(s.humidity.average),
                min: round1(s.humidity.min),
                max: round1(s.humidity.max),
            },
            gas: GasStatsDto {
                average: round1(s.gas_analog.average),
                max: round1(s.gas_analog.max),
            },
        }
    }
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
