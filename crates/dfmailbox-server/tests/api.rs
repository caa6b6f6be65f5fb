//! API Tests
//!
//! Exercise the router end to end: status codes, problem documents and the
//! exact JSON shapes clients rely on.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use common::{
    dead_address, mailbox, MockInstance, DINNERBONE, JEB, JWT_SECRET, MAILBOX_ADDRESS, NOTCH,
};
use dfmailbox_bridge::handlers::JwtHandler;
use dfmailbox_core::{Challenge, PublicKey, Signature, SigningIdentity};
use dfmailbox_server::create_router;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

// =============================================================================
// Test Helpers
// =============================================================================

struct Reply {
    status: StatusCode,
    content_type: Option<String>,
    body: Value,
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
    Reply {
        status,
        content_type,
        body,
    }
}

fn request(method: Method, uri: &str, auth: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn plot_auth(username: &str, plot_id: i32) -> String {
    format!("Plot {}:{}", username, plot_id)
}

fn no_instance() -> Option<Value> {
    Some(json!({ "public_key": null }))
}

fn assert_unauthorized(reply: &Reply) {
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert_eq!(reply.body["type"], "https://tools.ietf.org/html/rfc9110#section-15.5.2");
    assert_eq!(reply.body["title"], "Unauthorized");
    assert_eq!(reply.body["status"], 401);
    assert_eq!(reply.content_type.as_deref(), Some("application/problem+json"));
}

// =============================================================================
// Service Endpoints
// =============================================================================

#[tokio::test]
async fn root_banner() {
    let app = create_router(mailbox());
    let reply = send(&app, request(Method::GET, "/", None, None)).await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, Value::String("dfmailbox".into()));
}

#[tokio::test]
async fn health_and_ready() {
    let state = mailbox();
    let app = create_router(state.clone());

    let health = send(&app, request(Method::GET, "/health", None, None)).await;
    assert_eq!(health.body["status"], "ok");

    let ready = send(&app, request(Method::GET, "/ready", None, None)).await;
    assert_eq!(ready.body["ready"], true);
    assert_eq!(ready.body["address"], MAILBOX_ADDRESS);
    assert_eq!(
        ready.body["public_key"],
        state.identity.public_key().to_base64url()
    );
    assert_eq!(ready.body["plot_count"], 0);
}

#[tokio::test]
async fn mailbox_answers_its_own_challenge() {
    let state = mailbox();
    let app = create_router(state.clone());
    let challenge = Challenge::from_uuid(Uuid::new_v4());

    let reply = send(
        &app,
        request(
            Method::GET,
            &format!("/v0/federation/instance?challenge={}", challenge.query_value()),
            None,
            None,
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["address"], MAILBOX_ADDRESS);

    let key = PublicKey::parse(reply.body["public_key"].as_str().unwrap()).unwrap();
    let signature = Signature::parse(reply.body["signature"].as_str().unwrap()).unwrap();
    assert_eq!(key, state.identity.public_key());
    assert!(key
        .verify(challenge.payload_for(MAILBOX_ADDRESS).as_bytes(), &signature)
        .is_ok());
}

#[tokio::test]
async fn malformed_challenge_is_invalid_input() {
    let app = create_router(mailbox());

    for uri in [
        "/v0/federation/instance?challenge=not-a-uuid",
        "/v0/federation/instance",
    ] {
        let reply = send(&app, request(Method::GET, uri, None, None)).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["type"], "/v0/problems/invalid-input");
    }
}

// =============================================================================
// Instances
// =============================================================================

#[tokio::test]
async fn introduce_and_lookup_instance() {
    let app = create_router(mailbox());
    let instance = MockInstance::spawn_fresh().await;
    let body = json!({ "public_key": instance.public_key(), "address": instance.address });

    let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(body.clone()))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body, body);
    assert_eq!(instance.hits(), 1);

    let lookup = send(
        &app,
        request(Method::GET, &format!("/v0/instance/{}", instance.public_key()), None, None),
    )
    .await;
    assert_eq!(lookup.status, StatusCode::OK);
    assert_eq!(lookup.body["address"], instance.address.as_str());

    let again = send(&app, request(Method::POST, "/v0/instance", None, Some(body))).await;
    assert_eq!(again.status, StatusCode::CONFLICT);
    assert_eq!(again.body["type"], "/v0/problems/already-exists");
    assert_eq!(instance.hits(), 2);
}

#[tokio::test]
async fn lookup_unknown_instance() {
    let app = create_router(mailbox());
    let key = SigningIdentity::generate().public_key().to_base64url();

    let uri = format!("/v0/instance/{}", key);
    let reply = send(&app, request(Method::GET, &uri, None, None)).await;

    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.body["type"], "/v0/problems/unknown-instance");
    assert_eq!(reply.body["title"], "Specified instance has not been identified");
    assert_eq!(reply.body["public_key"], key.as_str());
}

#[tokio::test]
async fn introduce_unreachable_instance() {
    let app = create_router(mailbox());
    let address = dead_address().await;
    let body = json!({
        "public_key": SigningIdentity::generate().public_key().to_base64url(),
        "address": address,
    });

    let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(body))).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["type"], "/v0/problems/federation/instance-unreachable");
    assert_eq!(reply.body["address"], address.as_str());
}

#[tokio::test]
async fn introduce_with_wrong_key_fails_challenge() {
    let app = create_router(mailbox());
    let instance = MockInstance::spawn_fresh().await;
    let body = json!({
        "public_key": SigningIdentity::generate().public_key().to_base64url(),
        "address": instance.address,
    });

    let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(body))).await;

    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["type"], "/v0/problems/challenge-failed");
    assert!(reply.body["challenge_bytes"].is_string());
}

#[tokio::test]
async fn move_instance_with_allow_update() {
    let app = create_router(mailbox());
    let identity = std::sync::Arc::new(SigningIdentity::generate());
    let first = MockInstance::spawn(identity.clone()).await;
    let second = MockInstance::spawn(identity).await;

    let introduce = json!({ "public_key": first.public_key(), "address": first.address });
    send(&app, request(Method::POST, "/v0/instance", None, Some(introduce))).await;

    let same = json!({
        "public_key": first.public_key(),
        "address": first.address,
        "allow_update": true,
    });
    let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(same))).await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["type"], "/v0/problems/no-effect-update");

    let moved = json!({
        "public_key": first.public_key(),
        "address": second.address,
        "allow_update": true,
    });
    let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(moved))).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["address"], second.address.as_str());
}

#[tokio::test]
async fn introduce_rejects_bad_input() {
    let app = create_router(mailbox());

    let bodies = [
        json!({ "public_key": "c2hvcnQ", "address": "a:1" }),
        json!({
            "public_key": SigningIdentity::generate().public_key().to_base64url(),
            "address": "a/b",
        }),
        json!({ "address": "a:1" }),
    ];
    for body in bodies {
        let reply = send(&app, request(Method::POST, "/v0/instance", None, Some(body))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["type"], "/v0/problems/invalid-input");
    }
}

// =============================================================================
// Plots
// =============================================================================

#[tokio::test]
async fn plot_endpoints_require_identity() {
    let app = create_router(mailbox());

    let get = send(&app, request(Method::GET, "/v0/plot", None, None)).await;
    assert_unauthorized(&get);

    let register = send(&app, request(Method::POST, "/v0/plot", None, no_instance())).await;
    assert_unauthorized(&register);

    let update = send(&app, request(Method::PUT, "/v0/plot", None, no_instance())).await;
    assert_unauthorized(&update);
}

#[tokio::test]
async fn invalid_credentials_are_unauthorized() {
    let app = create_router(mailbox());

    for auth in ["Plot nobody:1", "Plot Notch", "Basic Tm90Y2g6MTIz", "Bearer not.a.jwt"] {
        let reply = send(&app, request(Method::GET, "/v0/plot", Some(auth), None)).await;
        assert_unauthorized(&reply);
    }
}

#[tokio::test]
async fn register_then_get_plots() {
    let app = create_router(mailbox());

    for (username, owner, plot_id) in [
        ("Notch", NOTCH, 123),
        ("jeb_", JEB, 456),
        ("dinnerbone", DINNERBONE, 2147483647),
    ] {
        let auth = plot_auth(username, plot_id);

        let created =
            send(&app, request(Method::POST, "/v0/plot", Some(&auth), no_instance())).await;
        assert_eq!(created.status, StatusCode::CREATED);

        let fetched = send(&app, request(Method::GET, "/v0/plot", Some(&auth), None)).await;
        assert_eq!(fetched.status, StatusCode::OK);
        assert_eq!(
            fetched.body,
            json!({
                "plot_id": plot_id,
                "owner": owner,
                "public_key": null,
                "address": null,
                "mailbox_msg_id": 0,
            })
        );
    }
}

#[tokio::test]
async fn get_unregistered_plot_is_forbidden() {
    let app = create_router(mailbox());

    let auth = plot_auth("NOTCH", 666);
    let reply = send(&app, request(Method::GET, "/v0/plot", Some(&auth), None)).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["type"], "/v0/problems/expected-role/any");
    assert_eq!(reply.body["title"], "Expected any registration");
    assert_eq!(reply.body["status"], 403);
    assert_eq!(reply.body["expected"], json!(["host", "registered"]));
    assert_eq!(reply.body["received"], "unregistered");
}

#[tokio::test]
async fn register_twice_is_forbidden() {
    let app = create_router(mailbox());
    let auth = plot_auth("Notch", 123);

    send(&app, request(Method::POST, "/v0/plot", Some(&auth), no_instance())).await;
    let reply = send(&app, request(Method::POST, "/v0/plot", Some(&auth), no_instance())).await;

    assert_eq!(reply.status, StatusCode::FORBIDDEN);
    assert_eq!(reply.body["title"], "Expected unregistered plot");
    assert_eq!(reply.body["expected"], json!(["unregistered"]));
    assert_eq!(reply.body["received"], "registered");
}

#[tokio::test]
async fn register_with_unidentified_instance() {
    let app = create_router(mailbox());
    let key = "UUt_RAzgNOQlxrUsRqpei5HdCXLCTIiyY1FjX5hd2DA=";

    let reply = send(
        &app,
        request(
            Method::POST,
            "/v0/plot",
            Some(&plot_auth("NOTCH", 666)),
            Some(json!({ "public_key": key })),
        ),
    )
    .await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["type"], "/v0/problems/unknown-instance");
    assert_eq!(reply.body["title"], "Specified instance has not been identified");
    assert_eq!(reply.body["status"], 409);
    assert_eq!(reply.body["public_key"], key);
}

#[tokio::test]
async fn hosted_plot_follows_instance_address() {
    let app = create_router(mailbox());
    let identity = std::sync::Arc::new(SigningIdentity::generate());
    let first = MockInstance::spawn(identity.clone()).await;
    let second = MockInstance::spawn(identity).await;
    let key = first.public_key();
    let auth = plot_auth("jeb_", 456);

    send(
        &app,
        request(
            Method::POST,
            "/v0/instance",
            None,
            Some(json!({ "public_key": key, "address": first.address })),
        ),
    )
    .await;
    let created = send(
        &app,
        request(Method::POST, "/v0/plot", Some(&auth), Some(json!({ "public_key": key }))),
    )
    .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["address"], first.address.as_str());

    send(
        &app,
        request(
            Method::POST,
            "/v0/instance",
            None,
            Some(json!({ "public_key": key, "address": second.address, "allow_update": true })),
        ),
    )
    .await;

    let fetched = send(&app, request(Method::GET, "/v0/plot", Some(&auth), None)).await;
    assert_eq!(fetched.body["public_key"], key.as_str());
    assert_eq!(fetched.body["address"], second.address.as_str());
}

#[tokio::test]
async fn update_plot_instance() {
    let app = create_router(mailbox());
    let instance = MockInstance::spawn_fresh().await;
    let key = instance.public_key();
    let auth = plot_auth("dinnerbone", 7);

    send(
        &app,
        request(
            Method::POST,
            "/v0/instance",
            None,
            Some(json!({ "public_key": key, "address": instance.address })),
        ),
    )
    .await;
    send(&app, request(Method::POST, "/v0/plot", Some(&auth), no_instance())).await;

    let attached = send(
        &app,
        request(Method::PUT, "/v0/plot", Some(&auth), Some(json!({ "public_key": key }))),
    )
    .await;
    assert_eq!(attached.status, StatusCode::OK);
    assert_eq!(attached.body["address"], instance.address.as_str());

    let unchanged = send(
        &app,
        request(Method::PUT, "/v0/plot", Some(&auth), Some(json!({ "public_key": key }))),
    )
    .await;
    assert_eq!(unchanged.status, StatusCode::CONFLICT);
    assert_eq!(unchanged.body["type"], "/v0/problems/no-effect-update");

    let detached = send(&app, request(Method::PUT, "/v0/plot", Some(&auth), no_instance())).await;
    assert_eq!(detached.status, StatusCode::OK);
    assert_eq!(detached.body["public_key"], Value::Null);
    assert_eq!(detached.body["address"], Value::Null);
}

#[tokio::test]
async fn bearer_tokens_identify_callers() {
    let app = create_router(mailbox());
    let owner = Uuid::new_v4();
    let token = JwtHandler::new(JWT_SECRET)
        .issue(owner, 42, chrono::Duration::minutes(5))
        .unwrap();
    let auth = format!("Bearer {}", token);

    let created = send(&app, request(Method::POST, "/v0/plot", Some(&auth), no_instance())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["owner"], owner.to_string());
    assert_eq!(created.body["plot_id"], 42);
}

#[tokio::test]
async fn malformed_plot_body_is_invalid_input() {
    let app = create_router(mailbox());
    let request = Request::builder()
        .method(Method::POST)
        .uri("/v0/plot")
        .header(header::AUTHORIZATION, plot_auth("Notch", 1))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let reply = send(&app, request).await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["type"], "/v0/problems/invalid-input");
}
