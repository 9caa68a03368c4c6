//! Sensor API Integration Tests
//!
//! History queries and actuator commands against a mock sensor API.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

use envmon_stream::application::ports::{CommandError, QueryError};
use envmon_stream::infrastructure::config::ApiSettings;
use envmon_stream::{
    ActuatorGateway, ApiClient, HistoryQueryConfig, HistoryQueryService, HistoryTable,
    HttpActuatorPort, HttpHistoryStore, QueryWindow, ReadingStatus, StaticTokenProvider,
    TimeRange,
};

fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&ApiSettings::new(server.uri())).unwrap()
}

fn token() -> Arc<StaticTokenProvider> {
    Arc::new(StaticTokenProvider::new(Some("test-token".to_string())))
}

fn history_service(server: &MockServer) -> HistoryQueryService {
    let store = HttpHistoryStore::new(client(server), token());
    HistoryQueryService::new(
        Arc::new(store),
        HistoryQueryConfig {
            series_limit: 500,
            page_size: 20,
        },
    )
}

fn row(recorded_at: &str, temperature: f64, co_level: f64) -> serde_json::Value {
    json!({
        "id": 1,
        "recorded_at": recorded_at,
        "temperature": temperature,
        "humidity": 40.0,
        "co_level": co_level,
    })
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn series_is_sorted_ascending() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("limit", "500"))
        .and(query_param("start", "2024-05-16T12:00:00Z"))
        .and(query_param("end", "2024-05-17T12:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "count": 3,
            "data": [
                row("2024-05-17T11:00:00", 36.0, 3.0),
                row("2024-05-17T10:00:00", 22.0, 80.0),
                row("2024-05-17T09:00:00", 21.0, 2.0),
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let now = Utc.with_ymd_and_hms(2024, 5, 17, 12, 0, 0).unwrap();
    let series = history_service(&server)
        .fetch_range(TimeRange::Last24Hours, now)
        .await
        .unwrap();

    let statuses: Vec<ReadingStatus> = series.iter().map(|r| r.status()).collect();
    assert_eq!(
        statuses,
        vec![ReadingStatus::Ok, ReadingStatus::Danger, ReadingStatus::Warn]
    );
    assert!(series.windows(2).all(|w| w[0].timestamp() <= w[1].timestamp()));
    assert_eq!(series[0].device_id(), "unknown");
}

#[tokio::test]
async fn all_range_omits_start() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param_is_missing("start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": []
        })))
        .expect(1)
        .mount(&server)
        .await;

    let series = history_service(&server)
        .fetch_range(TimeRange::All, Utc::now())
        .await
        .unwrap();
    assert!(series.is_empty());
}

#[tokio::test]
async fn unsuccessful_body_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "data": []
        })))
        .mount(&server)
        .await;

    let result = history_service(&server)
        .fetch_series(None, Utc::now())
        .await;
    assert_eq!(result, Err(QueryError::Unsuccessful));
}

#[tokio::test]
async fn history_unauthorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = history_service(&server)
        .fetch_series(None, Utc::now())
        .await;
    assert_eq!(result, Err(QueryError::Unauthorized));
}

#[tokio::test]
async fn page_without_pagination_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [row("2024-05-17T09:00:00", 21.0, 2.0)]
        })))
        .mount(&server)
        .await;

    let window = QueryWindow::new(None, Utc::now());
    let page = history_service(&server)
        .fetch_page(window, 1, 20)
        .await
        .unwrap();

    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.total_records, 0);
}

#[tokio::test]
async fn table_keeps_cursor_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [],
            "pagination": {"pages": 3, "total": 45}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/history"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .mount(&server)
        .await;

    let service = history_service(&server);
    let mut table = HistoryTable::new(QueryWindow::new(None, Utc::now()), 15);

    let page = table.select_page(&service, 2).await.unwrap();
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.total_records, 45);
    assert_eq!(table.page(), 2);

    let err = table.select_page(&service, 3).await.unwrap_err();
    assert_eq!(
        err,
        QueryError::Status {
            status: 500,
            message: "db down".to_string()
        }
    );
    assert_eq!(table.page(), 2);
}

#[tokio::test]
async fn latest_not_found_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"error": "No sensor data available"})),
        )
        .mount(&server)
        .await;

    let latest = history_service(&server).fetch_latest().await.unwrap();
    assert!(latest.is_none());
}

#[tokio::test]
async fn latest_reading_is_classified() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {
                "timestamp": "2024-05-17 09:30:00",
                "temperature": 37.0,
                "humidity": 40.0,
                "co_level": 5.0,
                "device_id": "esp32-1"
            }
        })))
        .mount(&server)
        .await;

    let latest = history_service(&server)
        .fetch_latest()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.status(), ReadingStatus::Warn);
    assert_eq!(latest.device_id(), "esp32-1");
}

// =============================================================================
// Actuators
// =============================================================================

fn gateway(server: &MockServer) -> ActuatorGateway {
    let port = HttpActuatorPort::new(client(server), token());
    ActuatorGateway::with_actuators(Arc::new(port), ["fan", "heater"])
}

#[tokio::test]
async fn accepted_command_keeps_state() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .and(body_json(json!({"device": "fan", "action": "on", "device_id": "esp32-1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Command sent to fan",
            "device": "fan",
            "action": "on"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    gateway.set_state("fan", true, Some("esp32-1")).await.unwrap();
    assert_eq!(gateway.state("fan"), Some(true));
}

#[tokio::test]
async fn rejected_command_rolls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "MQTT unavailable"})))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let err = gateway.toggle("heater", None).await.unwrap_err();

    assert_eq!(
        err,
        CommandError::Rejected {
            status: 500,
            message: "MQTT unavailable".to_string()
        }
    );
    assert_eq!(gateway.state("heater"), Some(false));
}

#[tokio::test]
async fn unauthorized_command_rolls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/control"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let gateway = gateway(&server);
    let err = gateway.set_state("fan", true, None).await.unwrap_err();

    assert_eq!(err, CommandError::Unauthorized);
    assert_eq!(gateway.state("fan"), Some(false));
}
