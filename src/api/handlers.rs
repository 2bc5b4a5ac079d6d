use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::OpenApi;

use super::{
    dto::{ColumnStatsDto, GasStatsDto, IngestResponse, NewReadingRequest, ReadingDto, StatsDto},
    errors::ApiError,
};
use crate::db::{models::NewReading, store::ReadingStore};

/// Applied when `limit` is absent, non-numeric, or non-positive.
const DEFAULT_LIMIT: i64 = 100;

/// Trailing window for `GET /api/stats`.
const STATS_WINDOW_HOURS: i64 = 24;

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    /// Kept as a raw string so an unparseable value falls back to the
    /// default instead of rejecting the request.
    pub limit: Option<String>,
}

fn effective_limit(raw: Option<&str>) -> i64 {
    raw.and_then(|s| s.parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_LIMIT)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Store one reading pushed by a device. Missing fields persist as nulls;
/// only a body that cannot be parsed as a JSON object is rejected.
#[utoipa::path(
    post,
    path = "/api/sensor-data",
    request_body = NewReadingRequest,
    responses(
        (status = 201, description = "Reading stored", body = IngestResponse),
        (status = 400, description = "Unparseable payload"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensor-data"
)]
pub async fn ingest_reading(
    State(store): State<ReadingStore>,
    payload: Result<Json<NewReadingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::Validation(e.body_text()))?;
    let reading = NewReading::from(req);

    let id = store.append(reading).await?;
    info!(id, "Reading ingested");

    Ok((
        StatusCode::CREATED,
        Json(IngestResponse {
            status: "success",
            message: "Data stored successfully",
            id,
        }),
    ))
}

/// Fetch recent readings, newest first. `?limit=N` caps the result;
/// absent or unparseable values fall back to 100.
#[utoipa::path(
    get,
    path = "/api/sensor-data",
    params(
        ("limit" = Option<String>, Query, description = "Maximum rows to return (default 100)"),
    ),
    responses(
        (status = 200, description = "Readings ordered by timestamp descending", body = Vec<ReadingDto>),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensor-data"
)]
pub async fn get_recent_readings(
    State(store): State<ReadingStore>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Vec<ReadingDto>>, ApiError> {
    let limit = effective_limit(params.limit.as_deref());
    let rows = store.list_recent(limit).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Fetch the single most recent reading.
#[utoipa::path(
    get,
    path = "/api/latest",
    responses(
        (status = 200, description = "Latest reading", body = ReadingDto),
        (status = 404, description = "No readings stored yet"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensor-data"
)]
pub async fn get_latest_reading(State(store): State<ReadingStore>) -> Result<Response, ApiError> {
    match store.latest().await? {
        Some(r) => Ok(Json(ReadingDto::from(r)).into_response()),
        None => Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "message": "No data available" })),
        )
            .into_response()),
    }
}

/// Aggregate statistics over the trailing 24 hours, rounded to one decimal
/// place. Columns with no data in the window report zeros.
#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Windowed aggregates", body = StatsDto),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensor-data"
)]
pub async fn get_stats(State(store): State<ReadingStore>) -> Result<Json<StatsDto>, ApiError> {
    let stats = store
        .aggregate_window(Duration::hours(STATS_WINDOW_HOURS))
        .await?;
    Ok(Json(StatsDto::from(stats)))
}

/// Administrative bulk clear: deletes every stored reading.
#[utoipa::path(
    delete,
    path = "/api/sensor-data",
    responses(
        (status = 200, description = "All readings deleted"),
        (status = 500, description = "Storage failure"),
    ),
    tag = "sensor-data"
)]
pub async fn clear_readings(
    State(store): State<ReadingStore>,
) -> Result<Json<serde_json::Value>, ApiError> {
    store.clear_all().await?;
    info!("All readings cleared");
    Ok(Json(serde_json::json!({
        "status": "success",
        "message": "All readings cleared"
    })))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Static liveness information; never touches storage.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sensor_ingest_service",
        "timestamp": Utc::now(),
    }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        ingest_reading,
        get_recent_readings,
        get_latest_reading,
        get_stats,
        clear_readings,
        health
    ),
    components(schemas(
        NewReadingRequest,
        ReadingDto,
        IngestResponse,
        StatsDto,
        ColumnStatsDto,
        GasStatsDto
    )),
    tags(
        (name = "sensor-data", description = "Reading ingestion and query endpoints"),
        (name = "system", description = "System endpoints"),
    ),
    info(
        title = "Sensor Ingest Service API",
        description = "Ingests environmental readings pushed by embedded devices \
                       and serves raw history and windowed statistics.",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_when_absent() {
        assert_eq!(effective_limit(None), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_defaults_when_non_numeric_or_non_positive() {
        assert_eq!(effective_limit(Some("abc")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("0")), DEFAULT_LIMIT);
        assert_eq!(effective_limit(Some("-5")), DEFAULT_LIMIT);
    }

    #[test]
    fn limit_parses_positive_integers() {
        assert_eq!(effective_limit(Some("1")), 1);
        assert_eq!(effective_limit(Some("250")), 250);
    }
}
