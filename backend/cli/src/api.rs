use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use docverify_core::DocVerifyError;

use crate::service::DocumentService;
use crate::upload::UploadForm;

/// Shared application state for API handlers.
pub struct AppState {
    pub service: DocumentService,
}

/// Build the Axum router with all API routes.
pub fn build_router(state: Arc<AppState>, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/validate-document", post(validate_document))
        .route("/submit", post(submit))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

async fn read_form(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<UploadForm, DocVerifyError> {
    let multipart =
        multipart.map_err(|rejection| DocVerifyError::InvalidInput(rejection.body_text()))?;
    UploadForm::read(multipart).await
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, StatusCode> {
    let submissions = state.service.submission_count().map_err(|e| {
        tracing::error!(error = %e, "Failed to count submissions");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    Ok(Json(json!({
        "status": "ok",
        "service": "docverify",
        "version": env!("CARGO_PKG_VERSION"),
        "extractor": state.service.extractor_name(),
        "submissions": submissions,
    })))
}

/// Extract one document and compare it with the submitted form fields.
async fn validate_document(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let result = match read_form(multipart).await {
        Ok(form) => state.service.validate_document(&request_id, &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(report) => Json(report).into_response(),
        Err(e) => {
            let (status, message) = match &e {
                DocVerifyError::InvalidInput(message) => (StatusCode::BAD_REQUEST, message.clone()),
                DocVerifyError::UnknownDocumentType(_) => {
                    (StatusCode::BAD_REQUEST, "Invalid document type".to_string())
                }
                DocVerifyError::ExtractionFailed { .. } => (
                    StatusCode::BAD_REQUEST,
                    "Failed to extract data from document".to_string(),
                ),
                other => {
                    tracing::error!(
                        request_id = %request_id,
                        error = %other,
                        "Document validation failed"
                    );
                    (StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
                }
            };
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}

/// Reconcile every attached document and persist the submission.
async fn submit(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let result = match read_form(multipart).await {
        Ok(form) => state.service.submit(&request_id, &form).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(submission) => Json(json!({
            "success": true,
            "message": "Form submitted successfully",
            "data": {
                "id": submission.id,
                "hasMismatches": submission.has_mismatches,
            },
        }))
        .into_response(),
        // Failures are reported in the body; the transport status stays 200.
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!(request_id = %request_id, error = %e, "Submission rejected");
            } else {
                tracing::error!(request_id = %request_id, error = %e, "Submission failed");
            }
            Json(json!({ "success": false, "error": e.to_string() })).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use docverify_core::{DocumentRegistry, DocumentType, ExtractedDocument};
    use docverify_store::SubmissionStore;
    use docverify_understanding::FixtureExtractor;
    use tower::ServiceExt;

    const BOUNDARY: &str = "docverify-test-boundary";

    fn multipart_body(fields: &[(&str, &str)], files: &[(&str, &str)]) -> Body {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        for (name, filename) in files {
            body.push_str(&format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: image/png\r\n\r\nnot-really-a-png\r\n"
            ));
        }
        body.push_str(&format!("--{BOUNDARY}--\r\n"));
        Body::from(body)
    }

    fn post_multipart(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(body)
            .unwrap()
    }

    fn app(dir: &std::path::Path) -> Router {
        app_with_store(dir, SubmissionStore::in_memory().unwrap())
    }

    fn app_with_store(dir: &std::path::Path, store: SubmissionStore) -> Router {
        let registry = DocumentRegistry::builtin();
        let extractor = FixtureExtractor::new()
            .with_response(
                registry.prompt_for(DocumentType::Aadhar).unwrap(),
                ExtractedDocument::new()
                    .with("name", "John Doe")
                    .with("dob", "15/05/1990")
                    .with("gender", "Male")
                    .with("aadhar", "1234 5678 9012"),
            )
            .with_response(
                registry.prompt_for(DocumentType::Pan).unwrap(),
                ExtractedDocument::new().with("name", "Jane Roe").with("pan", "ABCDE1234F"),
            );
        let service = DocumentService::new(
            Arc::new(registry),
            Arc::new(extractor),
            Arc::new(store),
            dir.join("uploads"),
        );
        build_router(Arc::new(AppState { service }), 1024 * 1024)
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn validate_aadhar_matches_reformatted_fields() {
        let dir = tempfile::tempdir().unwrap();
        let body = multipart_body(
            &[
                ("type", "aadhar"),
                ("name", "John Doe"),
                ("dob", "1990-05-15"),
                ("gender", "male"),
                ("aadhar", "123456789012"),
            ],
            &[("file", "aadhar.png")],
        );
        let request = post_multipart("/validate-document", body);
        let (status, json) = send(app(dir.path()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["mismatches"], json!([]));
        assert_eq!(json["validatedFields"], json!(["name", "dob", "gender", "aadhar"]));
        assert_eq!(json["docData"]["dob"], "15/05/1990");
    }

    #[tokio::test]
    async fn validate_reports_mismatches() {
        let dir = tempfile::tempdir().unwrap();
        let body = multipart_body(
            &[("type", "pan"), ("name", "John Doe"), ("pan", "abcde1234f")],
            &[("file", "pan.png")],
        );
        let request = post_multipart("/validate-document", body);
        let (status, json) = send(app(dir.path()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["validatedFields"], json!(["pan"]));
        assert_eq!(json["mismatches"][0]["field"], "name");
        assert_eq!(json["mismatches"][0]["formValue"], "John Doe");
        assert_eq!(json["mismatches"][0]["docValue"], "Jane Roe");
    }

    #[tokio::test]
    async fn validate_rejects_missing_file_and_bad_type() {
        let dir = tempfile::tempdir().unwrap();

        let body = multipart_body(&[("type", "aadhar")], &[]);
        let request = post_multipart("/validate-document", body);
        let (status, json) = send(app(dir.path()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No file provided");

        let body = multipart_body(&[("type", "passport")], &[("file", "x.png")]);
        let request = post_multipart("/validate-document", body);
        let (status, json) = send(app(dir.path()), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Invalid document type");
    }

    #[tokio::test]
    async fn validate_extraction_failure_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let body = multipart_body(&[("type", "marksheet")], &[("file", "marks.png")]);
        let request = post_multipart("/validate-document", body);
        let (status, json) = send(app(dir.path()), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Failed to extract data from document");
    }

    #[tokio::test]
    async fn submit_persists_and_reports_flag() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path());
        let body = multipart_body(
            &[
                ("name", "John Doe"),
                ("dob", "1990-05-15"),
                ("gender", "Male"),
                ("aadhar", "1234 5678 9012"),
                ("pan", "ABCDE1234F"),
                ("hasMismatches", "false"),
            ],
            &[("aadhar", "aadhar.png"), ("pan", "pan.png")],
        );
        let (status, json) = send(app.clone(), post_multipart("/submit", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["message"], "Form submitted successfully");
        assert_eq!(json["data"]["hasMismatches"], true);
        assert!(uuid::Uuid::parse_str(json["data"]["id"].as_str().unwrap()).is_ok());

        let request = Request::builder().uri("/api/health").body(Body::empty()).unwrap();
        let (status, json) = send(app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["submissions"], 1);
        assert_eq!(json["extractor"], "fixture");
    }

    #[tokio::test]
    async fn submit_reports_store_failure_in_body() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("docverify.db");
        let store = SubmissionStore::open(&db_path).unwrap();
        rusqlite::Connection::open(&db_path)
            .unwrap()
            .execute_batch("DROP TABLE submissions;")
            .unwrap();

        let body = multipart_body(&[("name", "John Doe")], &[]);
        let app = app_with_store(dir.path(), store);
        let (status, json) = send(app, post_multipart("/submit", body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("persistence error"));
    }

    #[tokio::test]
    async fn submit_rejects_non_multipart_body() {
        let dir = tempfile::tempdir().unwrap();
        let request = Request::builder()
            .method("POST")
            .uri("/submit")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, json) = send(app(dir.path()), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], false);
        assert!(json["error"].is_string());
    }
}
