use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use commission_market::{routes, store::MemoryStore, AppState};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;
use uuid::Uuid;

const SECRET: &str = "test_secret_key";

#[derive(serde::Serialize)]
struct Claims {
    sub: String,
    exp: usize,
    role: Option<String>,
}

fn bearer(user_id: Uuid, role: &str) -> String {
    let exp = (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize;
    let token = encode(
        &Header::default(),
        &Claims {
            sub: user_id.to_string(),
            exp,
            role: Some(role.into()),
        },
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("sign token");
    format!("Bearer {}", token)
}

fn app() -> Router {
    let state = AppState::new(Arc::new(MemoryStore::new()), SECRET);
    routes::router(state, 1000)
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    auth: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), 1024 * 1024).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_is_public_and_api_requires_a_token() {
    let app = app();

    let (status, body) = call(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");

    let (status, body) = call(&app, "GET", "/api/applications", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "unauthorized");

    let (status, _) = call(
        &app,
        "GET",
        "/api/applications",
        Some("Bearer not-a-token"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn job_application_flow_over_http() {
    let app = app();
    let client_auth = bearer(Uuid::new_v4(), "client");
    let artist_auth = bearer(Uuid::new_v4(), "artist");

    let (status, _) = call(
        &app,
        "POST",
        "/api/profiles/client",
        Some(&client_auth),
        Some(json!({"company_name": "Studio"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, artist) = call(
        &app,
        "POST",
        "/api/profiles/artist",
        Some(&artist_auth),
        Some(json!({"display_name": "Ada Lovelace"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(artist["slug"], "ada-lovelace");

    let (status, job) = call(
        &app,
        "POST",
        "/api/job-posts",
        Some(&client_auth),
        Some(json!({
            "title": "Book Cover",
            "description": "Cover art for a novel",
            "category": "illustration",
            "budget": "500.00",
            "deadline": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(job["kind"], "job");
    assert_eq!(job["status"], "open");
    let job_id = job["id"].as_str().unwrap().to_string();

    let (status, by_slug) = call(
        &app,
        "GET",
        "/api/job-posts/slug/book-cover",
        Some(&artist_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["id"], job["id"]);

    let apply_body = json!({
        "application_type": "artist_to_job",
        "job_post_id": job_id,
        "message": "I would love to work on this"
    });
    let (status, application) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&artist_auth),
        Some(apply_body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(application["status"], "pending");
    let application_id = application["id"].as_i64().unwrap();

    let (status, body) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&artist_auth),
        Some(apply_body),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "duplicate_application");

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/convert", application_id),
        Some(&client_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "application_not_accepted");

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        Some(&client_auth),
        Some(json!({"status": "approved"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_status");

    let (status, accepted) = call(
        &app,
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        Some(&client_auth),
        Some(json!({"status": "accepted", "message": "Welcome aboard"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["status"], "accepted");

    let (status, project) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/convert", application_id),
        Some(&client_auth),
        Some(json!({"title": "Custom Title"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["title"], "Custom Title");
    assert_eq!(project["status"], "in_progress");

    let (status, body) = call(
        &app,
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        Some(&client_auth),
        Some(json!({"status": "rejected"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "invalid_transition");

    let (status, job) = call(
        &app,
        "GET",
        &format!("/api/job-posts/{}", job_id),
        Some(&client_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["status"], "in_progress");
    assert_eq!(job["application_count"], 1);

    let (status, unread) = call(
        &app,
        "GET",
        "/api/notifications/unread-count",
        Some(&artist_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(unread["count"], 2);

    let (status, marked) = call(
        &app,
        "POST",
        "/api/notifications/read-all",
        Some(&artist_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(marked["updated"], 2);
}

#[tokio::test]
async fn unknown_application_is_not_found() {
    let app = app();
    let auth = bearer(Uuid::new_v4(), "client");
    let (status, body) = call(&app, "GET", "/api/applications/999", Some(&auth), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "application_not_found");
}

#[tokio::test]
async fn malformed_conversion_overrides_are_rejected_without_converting() {
    let app = app();
    let client_auth = bearer(Uuid::new_v4(), "client");
    let artist_auth = bearer(Uuid::new_v4(), "artist");

    call(
        &app,
        "POST",
        "/api/profiles/client",
        Some(&client_auth),
        Some(json!({"company_name": "Studio"})),
    )
    .await;
    call(
        &app,
        "POST",
        "/api/profiles/artist",
        Some(&artist_auth),
        Some(json!({"display_name": "Ada"})),
    )
    .await;
    let (_, job) = call(
        &app,
        "POST",
        "/api/job-posts",
        Some(&client_auth),
        Some(json!({
            "title": "Book Cover",
            "description": "Cover art for a novel",
            "category": "illustration",
            "budget": "500.00"
        })),
    )
    .await;
    let (_, application) = call(
        &app,
        "POST",
        "/api/applications",
        Some(&artist_auth),
        Some(json!({
            "application_type": "artist_to_job",
            "job_post_id": job["id"],
            "message": "Happy to help"
        })),
    )
    .await;
    let application_id = application["id"].as_i64().unwrap();
    let (status, _) = call(
        &app,
        "PATCH",
        &format!("/api/applications/{}/status", application_id),
        Some(&client_auth),
        Some(json!({"status": "accepted"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/convert", application_id),
        Some(&client_auth),
        Some(json!({"title": 42, "budget": "not-a-number"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, still_accepted) = call(
        &app,
        "GET",
        &format!("/api/applications/{}", application_id),
        Some(&client_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(still_accepted["status"], "accepted");

    let (status, project) = call(
        &app,
        "POST",
        &format!("/api/applications/{}/convert", application_id),
        Some(&client_auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(project["title"], "Book Cover");
}

#[tokio::test]
async fn huge_page_numbers_return_an_empty_page() {
    let app = app();
    let auth = bearer(Uuid::new_v4(), "client");
    let (status, body) = call(
        &app,
        "GET",
        "/api/job-posts?page=9223372036854775807&per_page=100",
        Some(&auth),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"], json!([]));
}
