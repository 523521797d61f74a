//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health          - Liveness
//! GET    /health/ready    - Readiness (store ping)
//!
//! GET    /patients        - List (limit, offset, search, sortBy, order)
//! POST   /patients        - Register (multipart, documentPhoto JPEG)
//! GET    /patients/{id}   - Fetch one
//! DELETE /patients/{id}   - Remove
//!
//! GET    /uploads/*       - Stored document photos
//! ```

pub mod patients;

use std::time::Duration;

use axum::{
    Router,
    extract::{DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    routing::get,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{REQUEST_ID_HEADER, request_id_middleware};
use crate::state::AppState;
use crate::storage::{MAX_PHOTO_BYTES, UPLOADS_ROUTE};

/// Request body limit: one photo plus room for the text fields.
const BODY_LIMIT: usize = MAX_PHOTO_BYTES + 64 * 1024;

/// Build the application router with tracing and request IDs.
///
/// CORS and Sentry layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(state.photos().dir());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/patients", get(patients::list).post(patients::create))
        .route(
            "/patients/{id}",
            get(patients::show).delete(patients::remove),
        )
        .nest_service(UPLOADS_ROUTE, uploads)
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// CORS for the dashboard origins. Invalid origins are skipped with a warning.
#[must_use]
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .inspect_err(|e| {
                    tracing::warn!(origin = %origin, error = %e, "Ignoring CORS origin");
                })
                .ok()
        })
        .collect();
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT, request_id.clone()])
        .expose_headers([request_id])
        .allow_credentials(true)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the patient store is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.patients().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::Request;
    use axum::response::Response;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;
    use crate::db::InMemoryPatientStore;
    use crate::services::{EventBus, PatientService};
    use crate::storage::PhotoStore;

    const BOUNDARY: &str = "patient-registry-test-boundary";
    const JPEG: &[u8] = b"\xFF\xD8\xFF\xE0fake-jpeg\xFF\xD9";

    struct Harness {
        app: Router,
        store: Arc<InMemoryPatientStore>,
        uploads: tempfile::TempDir,
    }

    fn harness() -> Harness {
        let uploads = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryPatientStore::new());
        let service = PatientService::new(store.clone(), EventBus::new());
        let state = AppState::new(service, PhotoStore::new(uploads.path()));

        Harness {
            app: router(state),
            store,
            uploads,
        }
    }

    struct Part<'a> {
        name: &'a str,
        value: &'a [u8],
        file: Option<(&'a str, &'a str)>,
    }

    fn text<'a>(name: &'a str, value: &'a str) -> Part<'a> {
        Part {
            name,
            value: value.as_bytes(),
            file: None,
        }
    }

    fn photo(mime: &'static str, bytes: &'static [u8]) -> Part<'static> {
        Part {
            name: "documentPhoto",
            value: bytes,
            file: Some(("id.jpg", mime)),
        }
    }

    fn valid_fields(email: &str) -> Vec<Part<'_>> {
        vec![
            text("fullName", "juan PEREZ"),
            text("email", email),
            text("phoneCountryCode", "+54"),
            text("phoneNumber", "1122334455"),
        ]
    }

    fn multipart_request(parts: &[Part<'_>]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part.file {
                Some((filename, mime)) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                         Content-Type: {mime}\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
            }
            body.extend_from_slice(part.value);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri("/patients")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    async fn json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn stored_photos(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map_or(0, Iterator::count)
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        assert_eq!(send(&h.app, get("/health")).await.status(), StatusCode::OK);
        assert_eq!(
            send(&h.app, get("/health/ready")).await.status(),
            StatusCode::OK
        );

        h.store.set_unavailable(true);
        assert_eq!(
            send(&h.app, get("/health/ready")).await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[tokio::test]
    async fn test_create_returns_201_and_serves_photo() {
        let h = harness();
        let mut parts = valid_fields("juan@gmail.com");
        parts.push(photo("image/jpeg", JPEG));

        let response = send(&h.app, multipart_request(&parts)).await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));

        let body = json(response).await;
        assert_eq!(body["fullName"], "Juan Perez");
        assert_eq!(body["email"], "juan@gmail.com");
        let url = body["documentPhotoUrl"].as_str().unwrap();
        assert!(url.starts_with("/uploads/patient-"));

        let response = send(&h.app, get(url)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], JPEG);
    }

    #[tokio::test]
    async fn test_create_without_photo_is_400() {
        let h = harness();
        let response = send(&h.app, multipart_request(&valid_fields("juan@gmail.com"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errors"]["documentPhoto"][0], "Document photo is required");
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_non_jpeg_is_400() {
        let h = harness();
        let mut parts = valid_fields("juan@gmail.com");
        parts.push(photo("image/png", b"\x89PNG"));

        let response = send(&h.app, multipart_request(&parts)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["errors"]["documentPhoto"][0], "Only JPEG images are allowed");
        assert_eq!(stored_photos(h.uploads.path()), 0);
    }

    #[tokio::test]
    async fn test_create_reports_field_errors() {
        let h = harness();
        let parts = vec![
            text("fullName", "R2-D2"),
            text("email", "user@yahoo.com"),
            text("phoneCountryCode", "54"),
            text("phoneNumber", "12"),
            text("role", "admin"),
            photo("image/jpeg", JPEG),
        ];

        let response = send(&h.app, multipart_request(&parts)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["message"], "Validation failed");
        let errors = &body["errors"];
        assert_eq!(errors["fullName"][0], "Full name should only contain letters");
        assert_eq!(errors["email"][0], "Email must be a @gmail.com address");
        assert_eq!(
            errors["phoneCountryCode"][0],
            "Country code must be in E.164 format (e.g., +1, +54, +598)"
        );
        assert_eq!(
            errors["phoneNumber"][0],
            "Phone number must contain only digits (6-15 characters, E.164 format)"
        );
        assert_eq!(errors["role"][0], "property role should not exist");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_409_and_photo_removed() {
        let h = harness();
        let mut parts = valid_fields("dup@gmail.com");
        parts.push(photo("image/jpeg", JPEG));

        assert_eq!(
            send(&h.app, multipart_request(&parts)).await.status(),
            StatusCode::CREATED
        );
        let response = send(&h.app, multipart_request(&parts)).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(json(response).await["message"], "Email already registered");
        assert_eq!(h.store.len().await, 1);
        assert_eq!(stored_photos(h.uploads.path()), 1);
    }

    #[tokio::test]
    async fn test_oversized_photo_is_413() {
        static BIG: std::sync::LazyLock<Vec<u8>> =
            std::sync::LazyLock::new(|| vec![0xFF; MAX_PHOTO_BYTES + 1]);

        let h = harness();
        let mut parts = valid_fields("big@gmail.com");
        parts.push(photo("image/jpeg", BIG.as_slice()));

        let response = send(&h.app, multipart_request(&parts)).await;
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert!(h.store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_requires_multipart() {
        let h = harness();
        let request = Request::builder()
            .method("POST")
            .uri("/patients")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();

        assert_eq!(send(&h.app, request).await.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_empty() {
        let h = harness();
        let response = send(&h.app, get("/patients")).await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"], serde_json::json!([]));
        assert_eq!(
            body["meta"],
            serde_json::json!({
                "totalItems": 0,
                "itemCount": 0,
                "itemsPerPage": 10,
                "totalPages": 0,
                "currentPage": 1
            })
        );
    }

    #[tokio::test]
    async fn test_list_search_sort_and_paginate() {
        let h = harness();
        for (name, email) in [
            ("juan perez", "juan@gmail.com"),
            ("ana lopez", "x.perez@gmail.com"),
            ("zoe adams", "zoe@gmail.com"),
        ] {
            let mut parts = valid_fields(email);
            parts[0] = text("fullName", name);
            parts.push(photo("image/jpeg", JPEG));
            assert_eq!(
                send(&h.app, multipart_request(&parts)).await.status(),
                StatusCode::CREATED
            );
        }

        let body = json(
            send(
                &h.app,
                get("/patients?search=PEREZ&sortBy=fullName&order=asc"),
            )
            .await,
        )
        .await;
        assert_eq!(body["meta"]["totalItems"], 2);
        assert_eq!(body["data"][0]["fullName"], "Ana Lopez");
        assert_eq!(body["data"][1]["fullName"], "Juan Perez");

        let body = json(
            send(
                &h.app,
                get("/patients?limit=2&offset=2&sortBy=email&order=ASC"),
            )
            .await,
        )
        .await;
        assert_eq!(body["meta"]["totalPages"], 2);
        assert_eq!(body["meta"]["currentPage"], 2);
        assert_eq!(body["meta"]["itemCount"], 1);
        assert_eq!(body["data"][0]["email"], "zoe@gmail.com");
    }

    #[tokio::test]
    async fn test_list_rejects_bad_numbers() {
        let h = harness();
        for uri in ["/patients?limit=abc", "/patients?offset=-1", "/patients?limit=0"] {
            assert_eq!(
                send(&h.app, get(uri)).await.status(),
                StatusCode::BAD_REQUEST,
                "{uri}"
            );
        }
    }

    #[tokio::test]
    async fn test_show_and_delete() {
        let h = harness();
        let mut parts = valid_fields("juan@gmail.com");
        parts.push(photo("image/jpeg", JPEG));
        let created = json(send(&h.app, multipart_request(&parts)).await).await;
        let uri = format!("/patients/{}", created["id"].as_str().unwrap());

        let response = send(&h.app, get(&uri)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["fullName"], "Juan Perez");

        assert_eq!(send(&h.app, delete(&uri)).await.status(), StatusCode::NO_CONTENT);
        assert_eq!(send(&h.app, get(&uri)).await.status(), StatusCode::NOT_FOUND);
        assert_eq!(send(&h.app, delete(&uri)).await.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_ids_are_404() {
        let h = harness();
        let response = send(&h.app, get("/patients/not-a-uuid")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            json(response).await["message"],
            "Patient with ID not-a-uuid not found"
        );

        let missing = format!("/patients/{}", uuid::Uuid::new_v4());
        assert_eq!(send(&h.app, get(&missing)).await.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        // Construction must not panic with credentials enabled.
        let _layer = cors_layer(&[
            "http://localhost:5173".to_string(),
            "bad\norigin".to_string(),
        ]);
    }
}
