//! Integration tests for the API server.

use std::sync::Arc;
use std::sync::OnceLock;

use api::config::Config;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use domain::FixedClock;
use inventory_store::InMemoryInventoryStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::{Value, json};
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
}

fn day(offset: u64) -> String {
    (today() + chrono::Days::new(offset)).to_string()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryInventoryStore,
}

async fn setup() -> TestApp {
    let store = InMemoryInventoryStore::new();
    let state =
        api::create_state_with_clock(store.clone(), &Config::default(), Arc::new(FixedClock(today())));
    state.horizon.fill_missing_days().await.unwrap();
    let app = api::create_app(state, get_metrics_handle());
    TestApp { app, store }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(Value::Null)
    };
    (status, json)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn book(app: &axum::Router, start: &str, end: &str) -> String {
    let (status, json) = send(
        app,
        post_json("/carpark/booking", json!({ "startDate": start, "endDate": end })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "unexpected body: {json}");
    json["id"].as_str().unwrap().to_string()
}

async fn available(app: &axum::Router, start: &str, end: &str) -> Vec<i64> {
    let (status, json) = send(
        app,
        get(&format!(
            "/carpark/availability?startDate={start}&endDate={end}"
        )),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    json.as_array()
        .unwrap()
        .iter()
        .map(|d| d["availableSpaces"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_health_check() {
    let t = setup().await;
    let (status, json) = send(&t.app, get("/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["today"], "2026-10-15");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let t = setup().await;
    book(&t.app, &day(1), &day(1)).await;

    let response = t.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("bookings_created_total"));
}

mod prices {
    use super::*;

    #[tokio::test]
    async fn test_prices_for_range() {
        let t = setup().await;
        let (status, json) = send(
            &t.app,
            get(&format!(
                "/carpark/prices?startDate={}&endDate={}",
                day(0),
                day(10)
            )),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        let prices = json.as_array().unwrap();
        assert_eq!(prices.len(), 11);
        assert_eq!(prices[0]["date"], day(0));
        assert_eq!(prices[10]["date"], day(10));
        assert_eq!(prices[0]["price"], "15.00");
        assert_eq!(prices[0]["priceCents"], 1500);
    }

    #[tokio::test]
    async fn test_prices_reject_past_start() {
        let t = setup().await;
        let (status, json) = send(
            &t.app,
            get("/carpark/prices?startDate=2026-10-14&endDate=2026-10-20"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_prices_reject_bad_format() {
        let t = setup().await;
        let (status, json) = send(
            &t.app,
            get("/carpark/prices?startDate=20/10/2026&endDate=2026-10-20"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            json["error"],
            "startDate was not supplied in yyyy-MM-dd format"
        );
    }

    #[tokio::test]
    async fn test_prices_reject_beyond_horizon() {
        let t = setup().await;
        let (status, _) = send(
            &t.app,
            get("/carpark/prices?startDate=2026-10-20&endDate=2028-10-16"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod availability {
    use super::*;

    #[tokio::test]
    async fn test_full_and_empty_days_in_date_order() {
        let t = setup().await;
        t.store
            .set_reserved(today() + chrono::Days::new(3), 10)
            .await
            .unwrap();

        let (status, json) = send(
            &t.app,
            get(&format!(
                "/carpark/availability?startDate={}&endDate={}",
                day(3),
                day(4)
            )),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json,
            json!([
                { "date": day(3), "availableSpaces": 0 },
                { "date": day(4), "availableSpaces": 10 },
            ])
        );
    }

    #[tokio::test]
    async fn test_missing_dates_rejected() {
        let t = setup().await;
        let (status, json) = send(
            &t.app,
            get(&format!("/carpark/availability?startDate={}", day(1))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "endDate was not supplied in yyyy-MM-dd format");
    }

    #[tokio::test]
    async fn test_reversed_range_rejected() {
        let t = setup().await;
        let (status, _) = send(
            &t.app,
            get(&format!(
                "/carpark/availability?startDate={}&endDate={}",
                day(5),
                day(2)
            )),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

mod bookings {
    use super::*;

    #[tokio::test]
    async fn test_create_booking_reduces_availability() {
        let t = setup().await;
        let id = book(&t.app, &day(1), &day(2)).await;
        assert!(uuid::Uuid::parse_str(&id).is_ok());

        assert_eq!(available(&t.app, &day(0), &day(3)).await, vec![10, 9, 9, 10]);
    }

    #[tokio::test]
    async fn test_create_booking_on_full_day_rejected() {
        let t = setup().await;
        t.store
            .set_reserved(today() + chrono::Days::new(2), 10)
            .await
            .unwrap();

        let (status, json) = send(
            &t.app,
            post_json(
                "/carpark/booking",
                json!({ "startDate": day(1), "endDate": day(2) }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains(&day(2)));
        assert_eq!(available(&t.app, &day(1), &day(1)).await, vec![10]);
        assert_eq!(t.store.booking_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_booking_in_the_past_rejected() {
        let t = setup().await;
        let (status, _) = send(
            &t.app,
            post_json(
                "/carpark/booking",
                json!({ "startDate": "2026-10-01", "endDate": "2026-10-16" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let t = setup().await;
        let request = Request::builder()
            .method("POST")
            .uri("/carpark/booking")
            .header("content-type", "application/json")
            .body(Body::from("{ not json"))
            .unwrap();

        let (status, json) = send(&t.app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].is_string());
    }

    #[tokio::test]
    async fn test_cancel_booking_restores_availability() {
        let t = setup().await;
        let id = book(&t.app, &day(1), &day(2)).await;

        let (status, json) =
            send(&t.app, post_empty(&format!("/carpark/booking/cancel/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id);
        assert_eq!(available(&t.app, &day(1), &day(2)).await, vec![10, 10]);

        let (status, _) =
            send(&t.app, post_empty(&format!("/carpark/booking/cancel/{id}"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(available(&t.app, &day(1), &day(2)).await, vec![10, 10]);
    }

    #[tokio::test]
    async fn test_cancel_unknown_or_malformed_id_rejected() {
        let t = setup().await;
        let unknown = uuid::Uuid::new_v4();
        let (status, _) = send(
            &t.app,
            post_empty(&format!("/carpark/booking/cancel/{unknown}")),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&t.app, post_empty("/carpark/booking/cancel/abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_amend_booking_moves_reservation() {
        let t = setup().await;
        let id = book(&t.app, &day(1), &day(2)).await;

        let (status, json) = send(
            &t.app,
            post_json(
                "/carpark/booking/edit",
                json!({ "id": id, "startDate": day(2), "endDate": day(4) }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id);
        assert_eq!(
            available(&t.app, &day(1), &day(4)).await,
            vec![10, 9, 9, 9]
        );
    }

    #[tokio::test]
    async fn test_amend_into_full_day_rejected() {
        let t = setup().await;
        let id = book(&t.app, &day(1), &day(1)).await;
        t.store
            .set_reserved(today() + chrono::Days::new(2), 10)
            .await
            .unwrap();

        let (status, _) = send(
            &t.app,
            post_json(
                "/carpark/booking/edit",
                json!({ "id": id, "startDate": day(1), "endDate": day(2) }),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(available(&t.app, &day(1), &day(2)).await, vec![9, 0]);

        let (_, json) = send(&t.app, get(&format!("/carpark/booking/{id}"))).await;
        assert_eq!(json["startDate"], day(1));
        assert_eq!(json["endDate"], day(1));
    }

    #[tokio::test]
    async fn test_amend_without_id_rejected() {
        let t = setup().await;
        let (status, json) = send(
            &t.app,
            post_json(
                "/carpark/booking/edit",
                json!({ "startDate": day(1), "endDate": day(2) }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "id was not supplied");
    }

    #[tokio::test]
    async fn test_get_booking() {
        let t = setup().await;
        let id = book(&t.app, &day(1), &day(3)).await;

        let (status, json) = send(&t.app, get(&format!("/carpark/booking/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id);
        assert_eq!(json["startDate"], day(1));
        assert_eq!(json["endDate"], day(3));
        assert_eq!(json["status"], "confirmed");

        send(&t.app, post_empty(&format!("/carpark/booking/cancel/{id}"))).await;
        let (_, json) = send(&t.app, get(&format!("/carpark/booking/{id}"))).await;
        assert_eq!(json["status"], "cancelled");
    }

    #[tokio::test]
    async fn test_get_unknown_booking_returns_404() {
        let t = setup().await;
        let unknown = uuid::Uuid::new_v4();
        let (status, json) = send(&t.app, get(&format!("/carpark/booking/{unknown}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(json["error"].is_string());
    }
}
