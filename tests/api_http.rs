// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - POST /scan            (report shape, events, granularity override)
// - POST /scan/url        (upstream failure → 502 JSON)
// - POST /export/ics      (headers + body)
// - POST /export/links    (google / outlook / share)

use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use calclik::api::{self, AppState};

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

/// Router with defaults and pattern-only extraction.
fn test_router() -> Router {
    api::router(AppState::pattern_only())
}

fn post_json(uri: &str, payload: &Json) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST")
}

async fn body_bytes(resp: Response) -> Vec<u8> {
    body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body")
        .to_vec()
}

#[tokio::test]
async fn health_returns_200_and_ok_body() {
    let req = Request::builder()
        .method("GET")
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");

    let resp = test_router().oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = String::from_utf8(body_bytes(resp).await).expect("utf8");
    assert_eq!(body.trim(), "OK");
}

#[tokio::test]
async fn scan_returns_report_with_annotated_events() {
    let payload = json!({
        "text": "Tech Summit 2025\nJoin industry leaders on March 15, 2025 at 2:00 PM at the Grand Convention Center in Austin.\n\nWe had a great time at the park.",
        "title": "Conference listings",
        "url": "https://example.org/events"
    });
    let resp = test_router()
        .oneshot(post_json("/scan", &payload))
        .await
        .expect("oneshot /scan");
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_slice(&body_bytes(resp).await).expect("scan json");
    assert_eq!(v["title"], "Conference listings");
    assert_eq!(v["url"], "https://example.org/events");
    assert_eq!(v["blocks"], 1);
    assert_eq!(v["dates"], json!(["March 15, 2025"]));
    assert_eq!(v["times"], json!(["2:00 PM"]));

    let ev = &v["events"][0];
    assert_eq!(ev["title"], "Tech Summit 2025");
    assert_eq!(ev["date"], "2025-03-15");
    assert_eq!(ev["time"], "14:00");
    assert_eq!(ev["location"], "Grand Convention Center");
    assert_eq!(ev["category"], "tech");
    assert_eq!(ev["icon"], "💻");
    assert_eq!(ev["confidence_level"], "high");
    assert!(ev["tags"].as_array().is_some_and(|t| t.len() <= 3));
}

#[tokio::test]
async fn scan_honours_granularity_override() {
    let text = "Doors open at the Old Mill on 2025-07-04 at 19:00 sharp. Dancing follows at 21:00 in the yard!";
    let para = test_router()
        .oneshot(post_json("/scan", &json!({ "text": text })))
        .await
        .expect("oneshot paragraph");
    let para: Json = serde_json::from_slice(&body_bytes(para).await).unwrap();
    assert_eq!(para["blocks"], 1);

    let sent = test_router()
        .oneshot(post_json("/scan", &json!({ "text": text, "granularity": "sentence" })))
        .await
        .expect("oneshot sentence");
    let sent: Json = serde_json::from_slice(&body_bytes(sent).await).unwrap();
    assert_eq!(sent["blocks"], 2);
    assert!(sent["title"].is_null());
}

#[tokio::test]
async fn scan_rejects_malformed_body() {
    let req = Request::builder()
        .method("POST")
        .uri("/scan")
        .header("content-type", "application/json")
        .body(Body::from("{\"text\": "))
        .expect("build bad POST");
    let resp = test_router().oneshot(req).await.expect("oneshot bad /scan");
    assert!(resp.status().is_client_error(), "got {}", resp.status());
}

#[tokio::test]
async fn scan_url_upstream_failure_is_502() {
    let resp = test_router()
        .oneshot(post_json("/scan/url", &json!({ "url": "ftp://example.org/list" })))
        .await
        .expect("oneshot /scan/url");
    assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
    let v: Json = serde_json::from_slice(&body_bytes(resp).await).expect("error json");
    assert!(v["error"].as_str().is_some_and(|e| e.contains("scheme")));
}

#[tokio::test]
async fn export_ics_is_a_calendar_attachment() {
    let payload = json!({
        "title": "Board Meeting",
        "date": "2025-06-01",
        "time": "09:30",
        "location": "",
        "description": "",
        "url": ""
    });
    let resp = test_router()
        .oneshot(post_json("/export/ics", &payload))
        .await
        .expect("oneshot /export/ics");
    assert_eq!(resp.status(), StatusCode::OK);

    let ct = resp.headers().get(header::CONTENT_TYPE).expect("content-type");
    assert!(ct.to_str().unwrap().starts_with("text/calendar"));
    let cd = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .expect("content-disposition");
    assert_eq!(cd.to_str().unwrap(), "attachment; filename=\"Board_Meeting.ics\"");

    let body = String::from_utf8(body_bytes(resp).await).expect("utf8");
    assert!(body.contains("DTSTART:20250601T093000\r\n"));
    assert!(body.contains("DTEND:20250601T103000\r\n"));
    assert!(!body.contains("LOCATION:"));
}

#[tokio::test]
async fn export_links_returns_all_targets() {
    // missing fields default to empty
    let payload = json!({ "title": "Jazz Night", "date": "2025-06-21", "time": "20:00" });
    let resp = test_router()
        .oneshot(post_json("/export/links", &payload))
        .await
        .expect("oneshot /export/links");
    assert_eq!(resp.status(), StatusCode::OK);

    let v: Json = serde_json::from_slice(&body_bytes(resp).await).expect("links json");
    let google = v["google"].as_str().expect("google");
    assert!(google.contains("text=Jazz%20Night"));
    assert!(google.contains("dates=20250621T200000/20250621T210000"));
    let outlook = v["outlook"].as_str().expect("outlook");
    assert!(outlook.contains("startdt=2025-06-21T20:00:00"));
    assert_eq!(v["share"], "Jazz Night\n📅 2025-06-21 at 20:00\n📍 TBA");
}

#[tokio::test]
async fn exports_accept_dates_at_the_calendar_edge() {
    let payload = json!({ "title": "Far Future", "date": "+262142-12-31", "time": "23:30" });
    for uri in ["/export/ics", "/export/links"] {
        let resp = test_router()
            .oneshot(post_json(uri, &payload))
            .await
            .expect("oneshot export");
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
    }
}
