pub mod dto;
pub mod errors;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;

use crate::db::store::ReadingStore;
use handlers::ApiDoc;

pub fn router(store: ReadingStore) -> Router {
    let (router, api) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .route(
            "/api/sensor-data",
            post(handlers::ingest_reading)
                .get(handlers::get_recent_readings)
                .delete(handlers::clear_readings),
        )
        .route("/api/latest", get(handlers::get_latest_reading))
        .route("/api/stats", get(handlers::get_stats))
        .with_state(store)
        .split_for_parts();

    router
        .route("/health", get(handlers::health))
        .route(
            "/api-docs/openapi.json",
            get(move || async move { axum::Json(api) }),
        )
        // The dashboard is a browser client on another origin.
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use sqlx::sqlite::SqlitePoolOptions;

    use super::router;
    use crate::db::{run_migrations, store::ReadingStore};

    async fn test_server() -> TestServer {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        TestServer::new(router(ReadingStore::new(pool))).unwrap()
    }

    #[tokio::test]
    async fn post_then_latest_round_trips_every_field() {
        let server = test_server().await;

        let res = server
            .post("/api/sensor-data")
            .json(&json!({
                "device_id": "esp1",
                "temperature": 22.5,
                "humidity": 60,
                "gas_analog": 150,
                "gas_digital": 0
            }))
            .await;
        res.assert_status(StatusCode::CREATED);
        let ack: Value = res.json();
        assert_eq!(ack["status"], json!("success"));
        assert!(ack["id"].is_i64());

        let res = server.get("/api/latest").await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["device_id"], json!("esp1"));
        assert_eq!(body["temperature"], json!(22.5));
        assert_eq!(body["humidity"], json!(60.0));
        assert_eq!(body["gas_analog"], json!(150));
        assert_eq!(body["gas_digital"], json!(0));
    }

    #[tokio::test]
    async fn ingest_accepts_empty_object_with_defaults() {
        let server = test_server().await;

        let res = server.post("/api/sensor-data").json(&json!({})).await;
        res.assert_status(StatusCode::CREATED);

        let body: Value = server.get("/api/latest").await.json();
        assert_eq!(body["device_id"], json!("unknown"));
        assert_eq!(body["temperature"], Value::Null);
        assert_eq!(body["humidity"], Value::Null);
        assert_eq!(body["gas_analog"], Value::Null);
        assert_eq!(body["gas_digital"], Value::Null);
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn ingest_rejects_unparseable_body() {
        let server = test_server().await;

        let res = server
            .post("/api/sensor-data")
            .content_type("application/json")
            .text("{not json")
            .await;
        res.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = res.json();
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn ingest_rejects_non_object_payload() {
        let server = test_server().await;

        let res = server.post("/api/sensor-data").json(&json!([1, 2, 3])).await;
        res.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recent_returns_newest_first_and_honours_limit() {
        let server = test_server().await;
        for gas in [100, 200, 300] {
            server
                .post("/api/sensor-data")
                .json(&json!({ "device_id": "esp1", "gas_analog": gas }))
                .await
                .assert_status(StatusCode::CREATED);
        }

        let body: Value = server.get("/api/sensor-data").await.json();
        let rows = body.as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["gas_analog"], json!(300));
        assert_eq!(rows[2]["gas_analog"], json!(100));

        let body: Value = server.get("/api/sensor-data?limit=2").await.json();
        assert_eq!(body.as_array().unwrap().len(), 2);

        // Non-numeric limit falls back to the default instead of erroring.
        let res = server.get("/api/sensor-data?limit=abc").await;
        res.assert_status_ok();
        assert_eq!(res.json::<Value>().as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn recent_on_empty_table_is_empty_list() {
        let server = test_server().await;
        let res = server.get("/api/sensor-data").await;
        res.assert_status_ok();
        assert!(res.json::<Value>().as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn latest_on_empty_table_is_not_found() {
        let server = test_server().await;
        let res = server.get("/api/latest").await;
        res.assert_status(StatusCode::NOT_FOUND);
        let body: Value = res.json();
        assert_eq!(body["message"], json!("No data available"));
    }

    #[tokio::test]
    async fn stats_on_empty_table_reports_zeros() {
        let server = test_server().await;
        let res = server.get("/api/stats").await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["total_readings"], json!(0));
        for column in ["temperature", "humidity"] {
            assert_eq!(body[column]["average"], json!(0.0));
            assert_eq!(body[column]["min"], json!(0.0));
            assert_eq!(body[column]["max"], json!(0.0));
        }
        assert_eq!(body["gas"]["average"], json!(0.0));
        assert_eq!(body["gas"]["max"], json!(0.0));
        // The gas block never reports a minimum.
        assert!(body["gas"].get("min").is_none());
    }

    #[tokio::test]
    async fn stats_aggregates_and_rounds_stored_readings() {
        let server = test_server().await;
        server
            .post("/api/sensor-data")
            .json(&json!({ "temperature": 20.0, "gas_analog": 100 }))
            .await
            .assert_status(StatusCode::CREATED);
        server
            .post("/api/sensor-data")
            .json(&json!({ "temperature": 30.0, "gas_analog": 300 }))
            .await
            .assert_status(StatusCode::CREATED);

        let body: Value = server.get("/api/stats").await.json();
        assert_eq!(body["total_readings"], json!(2));
        assert_eq!(body["temperature"]["average"], json!(25.0));
        assert_eq!(body["temperature"]["min"], json!(20.0));
        assert_eq!(body["temperature"]["max"], json!(30.0));
        assert_eq!(body["gas"]["average"], json!(200.0));
        assert_eq!(body["gas"]["max"], json!(300.0));
        // Humidity was never reported: zeros, with the rows still counted.
        assert_eq!(body["humidity"]["average"], json!(0.0));
    }

    #[tokio::test]
    async fn delete_clears_every_reading() {
        let server = test_server().await;
        server
            .post("/api/sensor-data")
            .json(&json!({ "temperature": 21.0 }))
            .await
            .assert_status(StatusCode::CREATED);

        server.delete("/api/sensor-data").await.assert_status_ok();

        server.get("/api/latest").await.assert_status(StatusCode::NOT_FOUND);
        let body: Value = server.get("/api/stats").await.json();
        assert_eq!(body["total_readings"], json!(0));
    }

    #[tokio::test]
    async fn health_is_static_and_always_ok() {
        let server = test_server().await;
        let res = server.get("/health").await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert_eq!(body["status"], json!("healthy"));
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let server = test_server().await;
        let res = server.get("/api-docs/openapi.json").await;
        res.assert_status_ok();
        let body: Value = res.json();
        assert!(body["paths"]["/api/sensor-data"].is_object());
    }
}
