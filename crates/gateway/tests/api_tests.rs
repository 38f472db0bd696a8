//! Integration tests for the video API gateway.
//!
//! Runs [`VideoApi`] against an in-process axum stub bound to an
//! ephemeral port, covering the happy paths, the shared error path,
//! and the thumbnail-to-video preview fallback.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use assert_matches::assert_matches;
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use sora_core::{JobStatus, ListQuery, SoraError, SortOrder};
use sora_gateway::{ContentVariant, SubmitRequest, VideoApi};

// ---------------------------------------------------------------------------
// Stub server
// ---------------------------------------------------------------------------

/// Captures what the stub observed so tests can assert on it.
#[derive(Default)]
struct Observed {
    queries: Mutex<Vec<HashMap<String, String>>>,
    submit_fields: Mutex<HashMap<String, String>>,
    thumbnail_requests: AtomicUsize,
    video_requests: AtomicUsize,
}

const TEST_KEY: &str = "sk-test";

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {TEST_KEY}"))
        .unwrap_or(false)
}

fn unauthorized() -> impl IntoResponse {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": {"message": "Missing bearer token", "code": "invalid_api_key"}})),
    )
}

fn job_json(id: &str, status: &str) -> serde_json::Value {
    json!({
        "id": id,
        "status": status,
        "progress": 100,
        "model": "sora-2",
        "seconds": "4",
        "size": "720x1280",
        "created_at": 1_700_000_000,
    })
}

fn router(observed: Arc<Observed>) -> Router {
    Router::new()
        .route(
            "/v1/videos",
            post(
                |headers: HeaderMap, State(observed): State<Arc<Observed>>, mut multipart: Multipart| async move {
                    if !authorized(&headers) {
                        return unauthorized().into_response();
                    }
                    let mut fields = HashMap::new();
                    while let Some(field) = multipart.next_field().await.unwrap() {
                        let name = field.name().unwrap_or_default().to_string();
                        let value = field.text().await.unwrap_or_default();
                        fields.insert(name, value);
                    }
                    *observed.submit_fields.lock().unwrap() = fields;
                    Json(job_json("video_new", "queued")).into_response()
                },
            )
            .get(
                |headers: HeaderMap,
                 State(observed): State<Arc<Observed>>,
                 Query(params): Query<HashMap<String, String>>| async move {
                    if !authorized(&headers) {
                        return unauthorized().into_response();
                    }
                    observed.queries.lock().unwrap().push(params);
                    Json(json!({
                        "data": [job_json("video_1", "completed"), job_json("video_2", "processing")]
                    }))
                    .into_response()
                },
            ),
        )
        .route(
            "/v1/videos/{id}",
            get(|headers: HeaderMap, Path(id): Path<String>| async move {
                if !authorized(&headers) {
                    return unauthorized().into_response();
                }
                match id.as_str() {
                    "video_missing" => (
                        StatusCode::NOT_FOUND,
                        Json(json!({"error": {"message": "Video not found", "code": "not_found"}})),
                    )
                        .into_response(),
                    "video_broken" => (
                        StatusCode::BAD_GATEWAY,
                        "<html>Bad Gateway</html>".to_string(),
                    )
                        .into_response(),
                    _ => Json(job_json(&id, "completed")).into_response(),
                }
            })
            .delete(|headers: HeaderMap, Path(id): Path<String>| async move {
                if !authorized(&headers) {
                    return unauthorized().into_response();
                }
                Json(json!({"id": id, "deleted": true, "object": "video.deleted"})).into_response()
            }),
        )
        .route(
            "/v1/videos/{id}/remix",
            post(
                |headers: HeaderMap, Path(id): Path<String>, Json(body): Json<serde_json::Value>| async move {
                    if !authorized(&headers) {
                        return unauthorized().into_response();
                    }
                    let mut job = job_json("video_remixed", "queued");
                    job["remixed_from_video_id"] = json!(id);
                    job["prompt"] = body["prompt"].clone();
                    Json(job).into_response()
                },
            ),
        )
        .route(
            "/v1/videos/{id}/content",
            get(
                |headers: HeaderMap,
                 State(observed): State<Arc<Observed>>,
                 Path(id): Path<String>,
                 Query(params): Query<HashMap<String, String>>| async move {
                    if !authorized(&headers) {
                        return unauthorized().into_response();
                    }
                    match params.get("variant").map(String::as_str) {
                        Some("thumbnail") => {
                            observed.thumbnail_requests.fetch_add(1, Ordering::SeqCst);
                            // `id` has no generated thumbnail.
                            let _ = id;
                            (
                                StatusCode::NOT_FOUND,
                                Json(json!({"error": {"message": "No thumbnail", "code": "not_found"}})),
                            )
                                .into_response()
                        }
                        _ => {
                            observed.video_requests.fetch_add(1, Ordering::SeqCst);
                            b"fake mp4 bytes".to_vec().into_response()
                        }
                    }
                },
            ),
        )
        .with_state(observed)
}

/// Bind the stub on an ephemeral port; returns the base URL.
async fn start_stub(observed: Arc<Observed>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub local addr");
    let app = router(observed);
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("stub server");
    });
    format!("http://{addr}/v1")
}

async fn api_against_stub() -> (VideoApi, Arc<Observed>) {
    let observed = Arc::new(Observed::default());
    let base = start_stub(Arc::clone(&observed)).await;
    (VideoApi::with_base_url(TEST_KEY, base), observed)
}

// ---------------------------------------------------------------------------
// Happy paths
// ---------------------------------------------------------------------------

/// Submission fills in the baseline defaults for every omitted
/// parameter and parses the returned job.
#[tokio::test]
async fn submit_applies_defaults_and_parses_the_job() {
    let (api, observed) = api_against_stub().await;

    let job = api
        .submit(SubmitRequest::new("a calico cat playing a piano"))
        .await
        .unwrap();
    assert_eq!(job.id, "video_new");
    assert_eq!(job.status, JobStatus::Queued);

    let fields = observed.submit_fields.lock().unwrap().clone();
    assert_eq!(fields.get("prompt").map(String::as_str), Some("a calico cat playing a piano"));
    assert_eq!(fields.get("model").map(String::as_str), Some("sora-2"));
    assert_eq!(fields.get("seconds").map(String::as_str), Some("4"));
    assert_eq!(fields.get("size").map(String::as_str), Some("720x1280"));
    assert!(!fields.contains_key("input_reference"));
}

/// Listing sends only the query parameters that are actually present.
#[tokio::test]
async fn list_omits_absent_query_parameters() {
    let (api, observed) = api_against_stub().await;

    let query = ListQuery {
        after: None,
        limit: Some(100),
        order: Some(SortOrder::Desc),
    };
    let jobs = api.list(&query).await.unwrap();
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].status, JobStatus::Completed);

    let seen = observed.queries.lock().unwrap()[0].clone();
    assert_eq!(seen.get("limit").map(String::as_str), Some("100"));
    assert_eq!(seen.get("order").map(String::as_str), Some("desc"));
    assert!(!seen.contains_key("after"), "absent params must be omitted, not sent empty");
}

/// Retrieval parses a single job, including epoch-second timestamps.
#[tokio::test]
async fn retrieve_parses_the_wire_format() {
    let (api, _observed) = api_against_stub().await;

    let job = api.retrieve("video_1").await.unwrap();
    assert_eq!(job.id, "video_1");
    assert_eq!(job.progress, 100);
    assert_eq!(job.created_at.unwrap().timestamp(), 1_700_000_000);
    assert_eq!(job.seconds.as_deref(), Some("4"));
}

/// Deletion parses the confirmation envelope.
#[tokio::test]
async fn remove_returns_the_confirmation() {
    let (api, _observed) = api_against_stub().await;

    let confirmation = api.remove("video_1").await.unwrap();
    assert_eq!(confirmation.id, "video_1");
    assert!(confirmation.deleted);
}

/// Remix posts the replacement prompt and returns the derived job.
#[tokio::test]
async fn remix_returns_the_derived_job() {
    let (api, _observed) = api_against_stub().await;

    let job = api.remix("video_1", "same scene but at night").await.unwrap();
    assert_eq!(job.id, "video_remixed");
    assert_eq!(job.remixed_from_video_id.as_deref(), Some("video_1"));
    assert_eq!(job.prompt.as_deref(), Some("same scene but at night"));
}

// ---------------------------------------------------------------------------
// Error paths
// ---------------------------------------------------------------------------

/// A JSON error body surfaces as a remote error with the message and
/// code extracted.
#[tokio::test]
async fn remote_error_body_is_extracted() {
    let (api, _observed) = api_against_stub().await;

    let err = api.retrieve("video_missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_matches!(
        err,
        SoraError::Remote { status: 404, message, code }
            if message == "Video not found" && code.as_deref() == Some("not_found")
    );
}

/// A non-JSON error body (e.g. an HTML gateway page) degrades to a
/// transport error carrying the raw text.
#[tokio::test]
async fn non_json_error_body_degrades_to_transport() {
    let (api, _observed) = api_against_stub().await;

    let err = api.retrieve("video_broken").await.unwrap_err();
    assert_matches!(err, SoraError::Transport(text) if text.contains("Bad Gateway"));
}

/// A bad credential is surfaced through the same error path.
#[tokio::test]
async fn wrong_credential_is_a_remote_error() {
    let observed = Arc::new(Observed::default());
    let base = start_stub(Arc::clone(&observed)).await;
    let api = VideoApi::with_base_url("sk-wrong", base);

    let err = api.retrieve("video_1").await.unwrap_err();
    assert_matches!(err, SoraError::Remote { status: 401, .. });
}

/// An unreachable host fails as transport, not remote.
#[tokio::test]
async fn unreachable_host_is_a_transport_error() {
    // Port 9 (discard) is assumed closed.
    let api = VideoApi::with_base_url(TEST_KEY, "http://127.0.0.1:9/v1");
    let err = api.retrieve("video_1").await.unwrap_err();
    assert_matches!(err, SoraError::Transport(_));
}

// ---------------------------------------------------------------------------
// Content download
// ---------------------------------------------------------------------------

/// A missing thumbnail is a soft failure: the preview fetch still
/// attempts and returns the video.
#[tokio::test]
async fn preview_falls_back_from_thumbnail_to_video() {
    let (api, observed) = api_against_stub().await;

    let (bytes, variant) = api.fetch_preview("video_1").await.unwrap();
    assert_eq!(variant, ContentVariant::Video);
    assert_eq!(bytes, b"fake mp4 bytes");
    assert_eq!(observed.thumbnail_requests.load(Ordering::SeqCst), 1);
    assert_eq!(observed.video_requests.load(Ordering::SeqCst), 1);
}

/// Direct video download returns the raw bytes.
#[tokio::test]
async fn fetch_content_returns_binary_payload() {
    let (api, _observed) = api_against_stub().await;

    let bytes = api
        .fetch_content("video_1", ContentVariant::Video)
        .await
        .unwrap();
    assert_eq!(bytes, b"fake mp4 bytes");
}
