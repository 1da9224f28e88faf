//! Build-related API endpoints

use std::path::Path;

use odevio_core::domain::artifact::ArtifactDescriptor;
use odevio_core::domain::job::BuildJob;
use odevio_core::dto::build::{BuildForm, SOURCE_FIELD, SOURCE_FILE_NAME};
use reqwest::multipart::{Form, Part};
use tracing::{debug, info};

use crate::OdevioClient;
use crate::error::{ClientError, Result};

impl OdevioClient {
    // =============================================================================
    // Build Lifecycle
    // =============================================================================

    /// Start a new build
    ///
    /// Uploads the source archive together with the form fields in a single
    /// multipart `POST /builds/`.
    ///
    /// # Arguments
    /// * `form` - Text fields of the submission
    /// * `archive` - Path of the zipped source tree
    ///
    /// # Returns
    /// The created build, as first reported by the service
    pub async fn create_build(&self, form: &BuildForm, archive: &Path) -> Result<BuildJob> {
        let source = tokio::fs::read(archive).await?;
        debug!("Uploading {} byte source archive", source.len());

        let mut multipart = Form::new().part(
            SOURCE_FIELD,
            Part::bytes(source)
                .file_name(SOURCE_FILE_NAME)
                .mime_str("application/zip")?,
        );
        for (name, value) in &form.fields {
            multipart = multipart.text(*name, value.to_string());
        }

        let url = format!("{}/builds/", self.base_url);
        let response = self
            .authorized(self.client.post(&url))
            .multipart(multipart)
            .send()
            .await?;

        let build: BuildJob = self.handle_response(response).await?;
        if build.key.is_empty() {
            return Err(ClientError::ParseError(
                "Build response did not contain a key".to_string(),
            ));
        }

        info!("Build started with key {}", build.key);
        Ok(build)
    }

    /// Get a build by key
    ///
    /// # Arguments
    /// * `key` - The build key returned by [`OdevioClient::create_build`]
    pub async fn get_build(&self, key: &str) -> Result<BuildJob> {
        let url = format!("{}/builds/{}/", self.base_url, key);
        let response = self.authorized(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }

    /// Get the IPA download location of a finished ad-hoc build
    ///
    /// # Arguments
    /// * `key` - The build key
    pub async fn get_ipa(&self, key: &str) -> Result<ArtifactDescriptor> {
        let url = format!("{}/builds/{}/ipa/", self.base_url, key);
        let response = self.authorized(self.client.get(&url)).send().await?;

        self.handle_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Multipart, Path as UrlPath, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use odevio_core::domain::build::{BuildRequest, BuildType};
    use odevio_core::domain::job::JobStatus;
    use serde_json::{Value, json};

    use super::*;

    /// A multipart part as received by the fake API
    #[derive(Debug, Clone)]
    struct ReceivedPart {
        name: String,
        file_name: Option<String>,
        data: Vec<u8>,
    }

    #[derive(Clone, Default)]
    struct Received {
        parts: Arc<Mutex<Vec<ReceivedPart>>>,
        headers: Arc<Mutex<Vec<HeaderMap>>>,
    }

    async fn spawn_api(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1", addr)
    }

    async fn create_build_handler(
        State(received): State<Received>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> (StatusCode, Json<Value>) {
        received.headers.lock().unwrap().push(headers);
        while let Some(field) = multipart.next_field().await.unwrap() {
            let part = ReceivedPart {
                name: field.name().unwrap_or_default().to_string(),
                file_name: field.file_name().map(str::to_string),
                data: field.bytes().await.unwrap().to_vec(),
            };
            received.parts.lock().unwrap().push(part);
        }
        (
            StatusCode::CREATED,
            Json(json!({"key": "b-123", "status_code": "queued"})),
        )
    }

    fn write_archive(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join(".app.zip");
        std::fs::write(&path, b"PK\x05\x06fake-archive").unwrap();
        path
    }

    #[tokio::test]
    async fn test_create_build_sends_form_and_archive() {
        let received = Received::default();
        let app = Router::new()
            .route("/api/v1/builds/", post(create_build_handler))
            .with_state(received.clone());
        let client = OdevioClient::new(spawn_api(app).await, "secret-token");

        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir);
        let mut request = BuildRequest::new("K1", BuildType::AdHoc);
        request.build_number = Some("7".to_string());
        request.minimal_ios_version = Some("14.0".to_string());
        let form = BuildForm::from_request(&request).unwrap();

        let build = client.create_build(&form, &archive).await.unwrap();

        assert_eq!(build.key, "b-123");
        assert_eq!(build.status(), JobStatus::Running);

        let headers = received.headers.lock().unwrap();
        assert_eq!(headers[0]["authorization"], "Token secret-token");
        assert_eq!(headers[0]["accept"], "application/json");

        let parts = received.parts.lock().unwrap();
        let text = |name: &str| {
            parts
                .iter()
                .find(|p| p.name == name)
                .map(|p| String::from_utf8(p.data.clone()).unwrap())
        };
        assert_eq!(text("application").as_deref(), Some("K1"));
        assert_eq!(text("build_type").as_deref(), Some("ad-hoc"));
        assert_eq!(text("build_number").as_deref(), Some("7"));
        assert_eq!(text("min_sdk").as_deref(), Some("14.0"));
        assert_eq!(text("flavor"), None);

        let source = parts.iter().find(|p| p.name == "source").unwrap();
        assert_eq!(source.file_name.as_deref(), Some("source.zip"));
        assert_eq!(source.data, b"PK\x05\x06fake-archive");
    }

    #[tokio::test]
    async fn test_create_build_reports_status_and_body_on_rejection() {
        let app = Router::new().route(
            "/api/v1/builds/",
            post(|| async { (StatusCode::FORBIDDEN, "Invalid token.") }),
        );
        let client = OdevioClient::new(spawn_api(app).await, "bad");

        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir);
        let form = BuildForm::from_request(&BuildRequest::new("K1", BuildType::Validation)).unwrap();

        let err = client.create_build(&form, &archive).await.unwrap_err();
        match err {
            ClientError::ApiError { status, message } => {
                assert_eq!(status, 403);
                assert_eq!(message, "Invalid token.");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_build_requires_key_in_response() {
        let app = Router::new().route(
            "/api/v1/builds/",
            post(|| async { Json(json!({"status_code": "queued"})) }),
        );
        let client = OdevioClient::new(spawn_api(app).await, "token");

        let dir = tempfile::tempdir().unwrap();
        let archive = write_archive(&dir);
        let form = BuildForm::from_request(&BuildRequest::new("K1", BuildType::Validation)).unwrap();

        let err = client.create_build(&form, &archive).await.unwrap_err();
        assert!(matches!(err, ClientError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_create_build_fails_without_archive() {
        let client = OdevioClient::new("http://127.0.0.1:9/api/v1", "token");
        let form = BuildForm::from_request(&BuildRequest::new("K1", BuildType::Validation)).unwrap();

        let err = client
            .create_build(&form, Path::new("/nonexistent/.app.zip"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::ArchiveRead(_)));
    }

    #[tokio::test]
    async fn test_get_build_and_ipa() {
        let app = Router::new()
            .route(
                "/api/v1/builds/{key}/",
                get(|UrlPath(key): UrlPath<String>| async move {
                    Json(json!({
                        "key": key,
                        "status_code": "failed",
                        "error_message": "signing error"
                    }))
                }),
            )
            .route(
                "/api/v1/builds/{key}/ipa/",
                get(|UrlPath(key): UrlPath<String>| async move {
                    Json(json!({"url": format!("https://x/{}.ipa", key)}))
                }),
            );
        let client = OdevioClient::new(spawn_api(app).await, "token");

        let build = client.get_build("b-9").await.unwrap();
        assert_eq!(build.key, "b-9");
        assert_eq!(build.status(), JobStatus::Failed);
        assert_eq!(build.error_message.as_deref(), Some("signing error"));

        let ipa = client.get_ipa("b-9").await.unwrap();
        assert_eq!(ipa.url, "https://x/b-9.ipa");
    }

    #[tokio::test]
    async fn test_get_ipa_non_success_is_an_error() {
        let app = Router::new().route(
            "/api/v1/builds/{key}/ipa/",
            get(|| async { (StatusCode::NOT_FOUND, "Not found.") }),
        );
        let client = OdevioClient::new(spawn_api(app).await, "token");

        let err = client.get_ipa("missing").await.unwrap_err();
        assert!(matches!(err, ClientError::ApiError { status: 404, .. }));
    }
}
