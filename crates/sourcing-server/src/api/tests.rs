use super::market::AnalysisItem;
use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use axum::response::Response;
use sourcing_queue::{HttpQueue, QueueGateway};
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// -------------------------------------------------------------------------
// Helpers
// -------------------------------------------------------------------------

fn app_with_queue(pool: sqlx::PgPool, queue: &MockServer) -> Router {
    let auth = AuthState::from_keys(std::iter::empty(), true).expect("auth");
    app_with(pool, queue, auth, default_rate_limit_state())
}

fn app_with(
    pool: sqlx::PgPool,
    queue: &MockServer,
    auth: AuthState,
    rate_limit: RateLimitState,
) -> Router {
    let http = HttpQueue::new(&format!("{}/queue", queue.uri()), None, 5).expect("queue client");
    let services = Services::new(pool.clone(), QueueGateway::Http(http));
    build_app(AppState { pool, services }, auth, rate_limit)
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

async fn json_of(response: Response) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

// -------------------------------------------------------------------------
// Unit tests (no DB)
// -------------------------------------------------------------------------

#[test]
fn normalize_limit_keeps_absent_and_clamps_explicit() {
    assert_eq!(normalize_limit(None), None);
    assert_eq!(normalize_limit(Some(0)), Some(1));
    assert_eq!(normalize_limit(Some(-5)), Some(1));
    assert_eq!(normalize_limit(Some(25)), Some(25));
    assert_eq!(normalize_limit(Some(1_000_000)), Some(MAX_LIST_LIMIT));
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("validation_error", StatusCode::BAD_REQUEST),
        ("queue_error", StatusCode::BAD_GATEWAY),
        ("unauthorized", StatusCode::UNAUTHORIZED),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, status) in cases {
        let response = ApiError::new("req-1", code, "msg").into_response();
        assert_eq!(response.status(), status, "code {code}");
    }
}

#[test]
fn analysis_item_serializes_camel_case() {
    let item = AnalysisItem {
        id: 7,
        search_keyword: "mug".to_string(),
        category: Some("Living".to_string()),
        average_price: 9_900,
        lowest_price: 5_000,
        sample_count: 40,
        top_item_name: None,
        total_listings: 1_200,
        competition_level: Some("HIGH".to_string()),
        search_volume_ratio: 55,
        market_attractiveness: None,
        sourcing_score: 61,
        analysis_date: Utc::now(),
    };
    let json = serde_json::to_value(&item).expect("serialize");
    assert_eq!(json["searchKeyword"], "mug");
    assert_eq!(json["averagePrice"], 9_900);
    assert_eq!(json["searchVolumeRatio"], 55);
    assert!(json["analysisDate"].is_string());
    assert!(json.get("search_keyword").is_none());
}

// -------------------------------------------------------------------------
// Health
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_is_public_and_reports_ok(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let auth = AuthState::from_keys(["secret"], false).expect("auth");
    let app = app_with(pool, &queue, auth, default_rate_limit_state());

    for uri in ["/", "/api/v1/health"] {
        let response = send(&app, get_request(uri)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        let json = json_of(response).await;
        assert_eq!(json["data"]["status"], "ok");
        assert!(json["meta"]["request_id"].is_string());
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn request_id_header_is_echoed(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "trace-123")
        .body(Body::empty())
        .expect("request");
    let response = send(&app, request).await;

    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(b"trace-123".as_slice())
    );
    let json = json_of(response).await;
    assert_eq!(json["meta"]["request_id"], "trace-123");
}

// -------------------------------------------------------------------------
// Sourcing requests
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn sourcing_request_is_accepted_and_queued(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/queue"))
        .and(body_json(serde_json::json!({ "keyword": "winter gloves" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&queue)
        .await;
    let app = app_with_queue(pool, &queue);

    let response = send(
        &app,
        post_empty("/market/sourcing/request?keyword=%20winter%20gloves%20"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    assert!(body.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn sourcing_request_is_served_on_every_prefix(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(3)
        .mount(&queue)
        .await;
    let app = app_with_queue(pool, &queue);

    for uri in [
        "/market/sourcing/request?keyword=mug",
        "/api/market/sourcing/request?keyword=mug",
        "/api/sourcing/request?keyword=mug",
    ] {
        let response = send(&app, post_empty(uri)).await;
        assert_eq!(response.status(), StatusCode::ACCEPTED, "{uri}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn blank_sourcing_request_is_rejected_before_queueing(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&queue)
        .await;
    let app = app_with_queue(pool, &queue);

    for uri in [
        "/market/sourcing/request",
        "/market/sourcing/request?keyword=",
        "/market/sourcing/request?keyword=%20%20",
    ] {
        let response = send(&app, post_empty(uri)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn queue_outage_maps_to_bad_gateway(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("queue down"))
        .mount(&queue)
        .await;
    let app = app_with_queue(pool, &queue);

    let response = send(&app, post_empty("/market/sourcing/request?keyword=mug")).await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let json = json_of(response).await;
    assert_eq!(json["error"]["code"], "queue_error");
    assert!(!json["error"]["message"]
        .as_str()
        .unwrap_or_default()
        .contains("queue down"));
}

// -------------------------------------------------------------------------
// Analysis callbacks and listing
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_callback_is_stored_and_listed(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let response = send(
        &app,
        post_json(
            "/api/market/analysis",
            &serde_json::json!({
                "search_keyword": "hand warmer",
                "keyword": "Living",
                "average_price": 12_900,
                "lowest_price": 7_000,
                "sourcing_score": 72,
                "analysis_date": "1999-01-01T00:00:00"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = json_of(response).await;
    let id = created["data"]["id"].as_i64().expect("id");

    let response = send(&app, get_request("/market/list")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = json_of(response).await;
    let data = json["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["id"].as_i64(), Some(id));
    assert_eq!(data[0]["searchKeyword"], "hand warmer");
    assert_eq!(data[0]["category"], "Living");
    assert_eq!(data[0]["averagePrice"], 12_900);
    assert!(!data[0]["analysisDate"]
        .as_str()
        .unwrap_or_default()
        .starts_with("1999"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_callback_with_echoed_fields_is_accepted(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let response = send(
        &app,
        post_json(
            "/market/analysis",
            &serde_json::json!({
                "search_keyword": "hand warmer",
                "searchKeyword": "ignored",
                "keyword": "hand warmer",
                "category": "Living",
                "sourcing_score": 87.5
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let listed = json_of(send(&app, get_request("/market/list")).await).await;
    let data = listed["data"].as_array().expect("data array");
    assert_eq!(data.len(), 1);
    assert_eq!(data[0]["searchKeyword"], "hand warmer");
    assert_eq!(data[0]["category"], "Living");
    assert_eq!(data[0]["sourcingScore"], 87);
}

#[sqlx::test(migrations = "../../migrations")]
async fn analysis_callback_without_keyword_is_rejected(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let response = send(
        &app,
        post_json("/market/analysis", &serde_json::json!({ "category": "Tech" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_of(response).await;
    assert_eq!(json["error"]["code"], "validation_error");

    let listed = json_of(send(&app, get_request("/market/list")).await).await;
    assert_eq!(listed["data"].as_array().map(Vec::len), Some(0));
}

#[sqlx::test(migrations = "../../migrations")]
async fn malformed_analysis_body_is_a_validation_error(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let request = Request::builder()
        .method("POST")
        .uri("/market/analysis")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .expect("request");
    let response = send(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = json_of(response).await;
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_limit_returns_newest_records(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    for keyword in ["first", "second", "third"] {
        let response = send(
            &app,
            post_json(
                "/market/analysis",
                &serde_json::json!({ "searchKeyword": keyword }),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let json = json_of(send(&app, get_request("/market/list?limit=2")).await).await;
    let keywords: Vec<&str> = json["data"]
        .as_array()
        .expect("data array")
        .iter()
        .filter_map(|r| r["searchKeyword"].as_str())
        .collect();
    assert_eq!(keywords, vec!["third", "second"]);
}

// -------------------------------------------------------------------------
// Ranking callbacks and queries
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn ranking_callback_feeds_full_and_category_views(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    let batch = serde_json::json!([
        { "rank": 1, "keyword": "[Fashion] A", "searchRatio": 100 },
        { "rank": 2, "keyword": "[Tech] B", "searchRatio": 80 }
    ]);
    let response = send(&app, post_json("/market/ranking/receive", &batch)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_of(response).await["data"]["saved"], 2);

    let full = json_of(send(&app, get_request("/api/market/ranking")).await).await;
    assert_eq!(full["data"], batch);

    let fashion = json_of(
        send(
            &app,
            get_request("/market/ranking/category?categoryLabel=Fashion"),
        )
        .await,
    )
    .await;
    assert_eq!(
        fashion["data"],
        serde_json::json!([{ "rank": 1, "keyword": "[Fashion] A", "searchRatio": 100 }])
    );

    for uri in [
        "/market/ranking/category",
        "/market/ranking/category?categoryLabel=",
    ] {
        let unfiltered = json_of(send(&app, get_request(uri)).await).await;
        assert_eq!(unfiltered["data"], batch, "{uri}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_or_null_ranking_batch_is_rejected(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let app = app_with_queue(pool, &queue);

    for body in [serde_json::json!([]), serde_json::Value::Null] {
        let response = send(&app, post_json("/market/ranking/receive", &body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{body}");
        let json = json_of(response).await;
        assert_eq!(json["error"]["code"], "validation_error");
    }

    let ranking = json_of(send(&app, get_request("/market/ranking")).await).await;
    assert_eq!(ranking["data"], serde_json::json!([]));
}

// -------------------------------------------------------------------------
// Auth and rate limiting
// -------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn protected_routes_require_a_configured_bearer_token(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let auth = AuthState::from_keys(["secret"], false).expect("auth");
    let app = app_with(pool, &queue, auth, default_rate_limit_state());

    let response = send(&app, get_request("/market/ranking")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_of(response).await["error"]["code"], "unauthorized");

    let wrong = Request::builder()
        .uri("/market/ranking")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .expect("request");
    assert_eq!(send(&app, wrong).await.status(), StatusCode::UNAUTHORIZED);

    let right = Request::builder()
        .uri("/market/ranking")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .expect("request");
    assert_eq!(send(&app, right).await.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn rate_limit_applies_to_protected_routes_only(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let auth = AuthState::from_keys(std::iter::empty(), true).expect("auth");
    let app = app_with(
        pool,
        &queue,
        auth,
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    assert_eq!(
        send(&app, get_request("/market/ranking")).await.status(),
        StatusCode::OK
    );
    let limited = send(&app, get_request("/api/market/ranking")).await;
    assert_eq!(limited.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_of(limited).await["error"]["code"], "rate_limited");

    assert_eq!(
        send(&app, get_request("/api/v1/health")).await.status(),
        StatusCode::OK
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn worker_callbacks_are_not_rate_limited(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let auth = AuthState::from_keys(std::iter::empty(), true).expect("auth");
    let app = app_with(
        pool,
        &queue,
        auth,
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    assert_eq!(
        send(&app, get_request("/market/ranking")).await.status(),
        StatusCode::OK
    );
    assert_eq!(
        send(&app, get_request("/market/ranking")).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );

    let batch = serde_json::json!([{ "rank": 1, "keyword": "[Tech] B", "searchRatio": 80 }]);
    for uri in ["/market/ranking/receive", "/api/market/ranking/receive"] {
        let response = send(&app, post_json(uri, &batch)).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
    let response = send(
        &app,
        post_json(
            "/market/analysis",
            &serde_json::json!({ "search_keyword": "mug" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unauthenticated_requests_do_not_consume_the_rate_limit(pool: sqlx::PgPool) {
    let queue = MockServer::start().await;
    let auth = AuthState::from_keys(["secret"], false).expect("auth");
    let app = app_with(
        pool,
        &queue,
        auth,
        RateLimitState::new(1, Duration::from_secs(60)),
    );

    for _ in 0..3 {
        assert_eq!(
            send(&app, get_request("/market/ranking")).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    let authorized = Request::builder()
        .uri("/market/ranking")
        .header(header::AUTHORIZATION, "Bearer secret")
        .body(Body::empty())
        .expect("request");
    assert_eq!(send(&app, authorized).await.status(), StatusCode::OK);
}
