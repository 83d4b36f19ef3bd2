//! HTTP surface driven through the router without a socket.

mod support;

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;
use warband::adapter::inbound::http::build_router;
use warband::infrastructure::bootstrap::AppContext;

use support::{manual_clock, TempDb};

const PEER: &str = "10.0.0.1";

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

async fn send_from(
    app: &Router,
    peer: &str,
    method: Method,
    uri: &str,
    body: Option<&str>,
    extra: &[(&str, &str)],
) -> Reply {
    let mut builder = Request::builder().method(method).uri(uri);
    if body.is_some() {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
    }
    for (name, value) in extra {
        builder = builder.header(*name, *value);
    }
    let mut request = builder
        .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
        .unwrap();
    let addr: SocketAddr = format!("{peer}:40000").parse().unwrap();
    request.extensions_mut().insert(ConnectInfo(addr));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    Reply {
        status,
        headers,
        body,
    }
}

async fn get(app: &Router, uri: &str) -> Reply {
    send_from(app, PEER, Method::GET, uri, None, &[]).await
}

async fn post(app: &Router, uri: &str, body: &str) -> Reply {
    send_from(app, PEER, Method::POST, uri, Some(body), &[]).await
}

fn app(ctx: &AppContext) -> Router {
    build_router(ctx.clone())
}

const YODA: &str = r#"{"name":"Master Yoda","dob":"1970-02-01","fight_skills":["BJJ","KungFu"]}"#;

// ---------------------------------------------------------------------------
// Warrior routes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_created_record_and_location() {
    let db = TempDb::new();
    let ctx = db.context();
    let app = app(&ctx);

    let created = post(&app, "/warrior", YODA).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let id = created.body["id"].as_str().unwrap().to_string();
    assert_eq!(created.headers[header::LOCATION], format!("/warrior/{id}"));
    assert_eq!(created.body["fight_skills"], json!(["BJJ", "KungFu"]));

    let fetched = get(&app, &format!("/warrior/{id}")).await;
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.body, created.body);
}

#[tokio::test]
async fn create_rejects_body_that_is_not_json() {
    let db = TempDb::new();
    let ctx = db.context();
    let reply = post(&app(&ctx), "/warrior", "name=yoda").await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, json!({"error": "Request body must be JSON"}));
}

#[tokio::test]
async fn create_reports_first_missing_field() {
    let db = TempDb::new();
    let ctx = db.context();
    let reply = post(&app(&ctx), "/warrior", r#"{"name":"A"}"#).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, json!({"error": "Field 'dob' is required"}));
}

#[tokio::test]
async fn create_rejects_scalar_skills() {
    let db = TempDb::new();
    let ctx = db.context();
    let body = r#"{"name":"A","dob":"2000-01-01","fight_skills":"Karate"}"#;
    let reply = post(&app(&ctx), "/warrior", body).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body, json!({"error": "Field 'fight_skills' must be a list"}));
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_not_found() {
    let db = TempDb::new();
    let ctx = db.context();
    let app = app(&ctx);

    for id in ["not-a-uuid", "7f1d2c3b-0000-4000-8000-000000000000"] {
        let reply = get(&app, &format!("/warrior/{id}")).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body, json!({"error": "Warrior not found"}));
    }
}

#[tokio::test]
async fn search_requires_term() {
    let db = TempDb::new();
    let ctx = db.context();
    let app = app(&ctx);

    for uri in ["/warrior", "/warrior?t="] {
        let reply = get(&app, uri).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            reply.body,
            json!({"error": "Query parameter 't' (search term) is required"})
        );
    }
}

#[tokio::test]
async fn search_and_count_reflect_created_records() {
    let db = TempDb::new();
    let ctx = db.context();
    let app = app(&ctx);

    post(&app, "/warrior", YODA).await;
    post(
        &app,
        "/warrior",
        r#"{"name":"Chuck","dob":"1940-03-10","fight_skills":["Karate"]}"#,
    )
    .await;

    let found = get(&app, "/warrior?t=kungfu").await;
    assert_eq!(found.status, StatusCode::OK);
    let names: Vec<_> = found.body.as_array().unwrap().iter().map(|w| w["name"].clone()).collect();
    assert_eq!(names, vec![json!("Master Yoda")]);

    let count = get(&app, "/counting-warriors").await;
    assert_eq!(count.status, StatusCode::OK);
    assert_eq!(count.body, json!({"count": 2}));
}

#[tokio::test]
async fn unknown_path_is_json_not_found() {
    let db = TempDb::new();
    let ctx = db.context();
    let reply = get(&app(&ctx), "/wp-admin").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["error"], "Not Found");
}

// ---------------------------------------------------------------------------
// Rate limiting
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rate_limit_rejects_over_budget_and_sets_headers() {
    let mut db = TempDb::new();
    db.config_mut().rate_limit.requests_per_minute = 3;
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);

    for remaining in ["2", "1", "0"] {
        let reply = get(&app, "/counting-warriors").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.headers["x-ratelimit-limit"], "3");
        assert_eq!(reply.headers["x-ratelimit-remaining"], remaining);
        assert!(reply.headers.contains_key("x-ratelimit-reset"));
    }

    let limited = get(&app, "/counting-warriors").await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        limited.body,
        json!({"error": "Rate limit exceeded", "message": "Limit of 3 per 1 minute exceeded"})
    );
    assert!(limited.headers.contains_key(header::RETRY_AFTER));

    // The throttled response is fed to the detector.
    let metrics = ctx.detector().metrics(&PEER.into());
    assert_eq!(metrics.total_requests, 4);
    assert_eq!(metrics.throttled_requests, 1);
}

#[tokio::test]
async fn rate_limit_window_resets() {
    let mut db = TempDb::new();
    db.config_mut().rate_limit.requests_per_minute = 1;
    let clock = manual_clock();
    let ctx = db.context_with_clock(clock.clone());
    let app = app(&ctx);

    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);
    assert_eq!(
        get(&app, "/counting-warriors").await.status,
        StatusCode::TOO_MANY_REQUESTS
    );

    clock.advance(Duration::from_secs(61));
    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);
}

#[tokio::test]
async fn health_is_exempt_from_limits_and_tracking() {
    let mut db = TempDb::new();
    db.config_mut().rate_limit.requests_per_minute = 1;
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);

    for _ in 0..5 {
        let reply = get(&app, "/health").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({"status": "ok"}));
        assert!(!reply.headers.contains_key("x-ratelimit-limit"));
    }
    assert_eq!(ctx.detector().metrics(&PEER.into()).total_requests, 0);
}

#[tokio::test]
async fn disabled_rate_limit_sets_no_headers() {
    let mut db = TempDb::new();
    db.config_mut().rate_limit.enabled = false;
    db.config_mut().rate_limit.requests_per_minute = 1;
    let ctx = db.context();
    let app = app(&ctx);

    for _ in 0..3 {
        let reply = get(&app, "/counting-warriors").await;
        assert_eq!(reply.status, StatusCode::OK);
        assert!(!reply.headers.contains_key("x-ratelimit-limit"));
    }
}

// ---------------------------------------------------------------------------
// Abuse detection
// ---------------------------------------------------------------------------

#[tokio::test]
async fn probing_client_is_blocked_until_expiry() {
    let db = TempDb::new();
    let clock = manual_clock();
    let ctx = db.context_with_clock(clock.clone());
    let app = app(&ctx);

    for _ in 0..20 {
        let reply = get(&app, "/warrior/not-a-uuid").await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
    }

    let blocked = get(&app, "/counting-warriors").await;
    assert_eq!(blocked.status, StatusCode::FORBIDDEN);
    assert_eq!(blocked.headers[header::RETRY_AFTER], "300");
    assert_eq!(blocked.body["retry_after_secs"], 300);
    assert!(blocked.body["reason"].is_string());

    // Rejections while blocked are not recorded.
    assert_eq!(ctx.detector().metrics(&PEER.into()).total_requests, 20);

    // Another client is unaffected.
    let other = send_from(&app, "10.0.0.2", Method::GET, "/counting-warriors", None, &[]).await;
    assert_eq!(other.status, StatusCode::OK);

    clock.advance(Duration::from_secs(301));
    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);
}

#[tokio::test]
async fn whitelisted_client_is_never_blocked() {
    let mut db = TempDb::new();
    db.config_mut().abuse.whitelist = vec![PEER.to_string()];
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);

    for _ in 0..40 {
        get(&app, "/warrior/not-a-uuid").await;
    }
    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);
    assert_eq!(ctx.detector().tracked_events(&PEER.into()), 0);
}

#[tokio::test]
async fn trusted_forwarded_for_identifies_client() {
    let mut db = TempDb::new();
    db.config_mut().server.trust_forwarded_for = true;
    let ctx = db.context();
    ctx.detector().manually_block(&"203.0.113.7".into(), None);
    let app = app(&ctx);

    let forwarded = [("x-forwarded-for", "203.0.113.7, 10.0.0.1")];
    let reply = send_from(&app, PEER, Method::GET, "/counting-warriors", None, &forwarded).await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);

    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Health and admin
// ---------------------------------------------------------------------------

#[tokio::test]
async fn readiness_reports_pool_and_database() {
    let db = TempDb::new();
    let ctx = db.context();
    let reply = get(&app(&ctx), "/health/ready").await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["healthy"], true);
    assert_eq!(reply.body["pool"]["max_connections"], 4);
}

#[tokio::test]
async fn readiness_fails_after_shutdown() {
    let db = TempDb::new();
    let ctx = db.context();
    ctx.shutdown();
    let reply = get(&app(&ctx), "/health/ready").await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(reply.body["healthy"], false);
}

#[tokio::test]
async fn closed_pool_maps_to_service_unavailable() {
    let db = TempDb::new();
    let ctx = db.context();
    ctx.shutdown();
    let reply = get(&app(&ctx), "/counting-warriors").await;
    assert_eq!(reply.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn admin_block_and_unblock_round_trip() {
    let db = TempDb::new();
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);
    let target = "10.0.0.5";

    let blocked = post(&app, &format!("/admin/clients/{target}/block"), r#"{"duration_secs":60}"#).await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert_eq!(blocked.body["duration_secs"], 60);

    let rejected = send_from(&app, target, Method::GET, "/counting-warriors", None, &[]).await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);
    assert_eq!(rejected.headers[header::RETRY_AFTER], "60");
    assert_eq!(rejected.body["reason"], "manual block");

    let status = get(&app, &format!("/admin/clients/{target}")).await;
    assert_eq!(status.body["blocked"], true);
    assert_eq!(status.body["whitelisted"], false);

    let unblocked = send_from(
        &app,
        PEER,
        Method::DELETE,
        &format!("/admin/clients/{target}/block"),
        None,
        &[],
    )
    .await;
    assert_eq!(unblocked.body["unblocked"], true);

    let allowed = send_from(&app, target, Method::GET, "/counting-warriors", None, &[]).await;
    assert_eq!(allowed.status, StatusCode::OK);
}

#[tokio::test]
async fn admin_block_accepts_largest_duration() {
    let db = TempDb::new();
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);
    let target = "10.0.0.7";

    let body = format!(r#"{{"duration_secs":{}}}"#, u64::MAX);
    let blocked = post(&app, &format!("/admin/clients/{target}/block"), &body).await;
    assert_eq!(blocked.status, StatusCode::OK);
    assert_eq!(blocked.body["duration_secs"], u64::MAX);

    let rejected = send_from(&app, target, Method::GET, "/counting-warriors", None, &[]).await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_block_without_body_uses_default_duration() {
    let db = TempDb::new();
    let ctx = db.context_with_clock(manual_clock());
    let reply = send_from(
        &app(&ctx),
        PEER,
        Method::POST,
        "/admin/clients/10.0.0.6/block",
        None,
        &[],
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["duration_secs"], 300);
}

#[tokio::test]
async fn admin_whitelist_clears_block() {
    let db = TempDb::new();
    let ctx = db.context_with_clock(manual_clock());
    let app = app(&ctx);
    ctx.detector().manually_block(&PEER.into(), None);

    let listed = send_from(&app, "10.9.9.9", Method::PUT, &format!("/admin/whitelist/{PEER}"), None, &[]).await;
    assert_eq!(listed.body["whitelisted"], true);
    assert_eq!(get(&app, "/counting-warriors").await.status, StatusCode::OK);

    let removed = send_from(&app, "10.9.9.9", Method::DELETE, &format!("/admin/whitelist/{PEER}"), None, &[]).await;
    assert_eq!(removed.body["removed"], true);
    assert!(!ctx.detector().is_whitelisted(&PEER.into()));
}

#[tokio::test]
async fn admin_stats_report_pool_and_detector() {
    let db = TempDb::new();
    let ctx = db.context();
    let app = app(&ctx);
    ctx.detector().manually_block(&"10.0.0.7".into(), None);

    let stats = get(&app, "/admin/stats").await;
    assert_eq!(stats.status, StatusCode::OK);
    assert_eq!(stats.body["pool"]["initial_size"], 2);
    assert_eq!(stats.body["abuse"]["manual_blocks"], 1);
    assert_eq!(stats.body["abuse"]["blocked_clients"], 1);
}

#[tokio::test]
async fn admin_routes_can_be_disabled() {
    let mut db = TempDb::new();
    db.config_mut().server.admin_enabled = false;
    let ctx = db.context();
    let reply = get(&app(&ctx), "/admin/stats").await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}
