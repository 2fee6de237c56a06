//! Works API client used for inspection delivery and work list refresh.
//!
//! Direct submissions and queued replays both go through
//! [`WorksApi::submit_inspection`] with the same [`InspectionPayload`], so the
//! server sees identical requests whichever path produced them.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Request, StatusCode};
use serde::Deserialize;

use crate::models::{
    Coordinates, NewPendingUpdate, PendingUpdate, Photo, WorkStatus, WorkSummary,
    DEFAULT_PHOTO_CONTENT_TYPE,
};
use crate::util::{compact_text, normalize_base_url};
use crate::{Error, Result};

/// Remote operations the field client depends on.
#[allow(async_fn_in_trait)]
pub trait WorksApi {
    /// `POST /works/{work_id}/inspections`; any 2xx counts as delivered
    async fn submit_inspection(&self, payload: &InspectionPayload<'_>) -> Result<()>;

    /// `GET /works`
    async fn list_works(&self) -> Result<Vec<WorkSummary>>;
}

impl<T: WorksApi> WorksApi for &T {
    async fn submit_inspection(&self, payload: &InspectionPayload<'_>) -> Result<()> {
        (**self).submit_inspection(payload).await
    }

    async fn list_works(&self) -> Result<Vec<WorkSummary>> {
        (**self).list_works().await
    }
}

/// The multipart body of an inspection submission
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InspectionPayload<'a> {
    pub work_id: i64,
    pub status: WorkStatus,
    pub coordinates: Coordinates,
    pub photo: &'a Photo,
    pub remarks: &'a str,
}

impl<'a> InspectionPayload<'a> {
    /// Payload for a direct submission
    pub fn from_new(update: &'a NewPendingUpdate) -> Self {
        Self {
            work_id: update.work_id,
            status: update.status,
            coordinates: update.coordinates,
            photo: &update.photo,
            remarks: &update.remarks,
        }
    }

    /// Payload for replaying a queued update
    pub fn from_pending(update: &'a PendingUpdate) -> Self {
        Self {
            work_id: update.work_id,
            status: update.status,
            coordinates: update.coordinates,
            photo: &update.photo,
            remarks: &update.remarks,
        }
    }

    /// File name sent with the photo part
    pub fn photo_file_name(&self) -> String {
        let name = self.photo.file_name.trim();
        if name.is_empty() {
            format!("offline_{}.jpg", self.work_id)
        } else {
            name.to_string()
        }
    }

    fn photo_content_type(&self) -> &str {
        let content_type = self.photo.content_type.trim();
        if content_type.parse::<mime_guess::Mime>().is_ok() {
            content_type
        } else {
            DEFAULT_PHOTO_CONTENT_TYPE
        }
    }
}

/// HTTP client for the works API.
#[derive(Debug, Clone)]
pub struct HttpWorksApi {
    base_url: String,
    access_token: Option<String>,
    client: reqwest::Client,
}

impl HttpWorksApi {
    /// Builds a client for an explicit API base URL.
    ///
    /// `timeout` of `None` keeps the transport default (no overall deadline).
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = normalize_base_url(base_url.into().as_str()).map_err(Error::Configuration)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|error| {
            Error::Configuration(format!("Failed to construct HTTP client: {error}"))
        })?;

        Ok(Self {
            base_url,
            access_token: None,
            client,
        })
    }

    /// Send `Authorization: Bearer <token>` with every request.
    #[must_use]
    pub fn with_access_token(mut self, access_token: Option<String>) -> Self {
        self.access_token = crate::util::normalize_text_option(access_token);
        self
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn build_inspection_request(&self, payload: &InspectionPayload<'_>) -> Result<Request> {
        let photo_part = Part::bytes(payload.photo.bytes.clone())
            .file_name(payload.photo_file_name())
            .mime_str(payload.photo_content_type())
            .map_err(|error| Error::InvalidInput(format!("Invalid photo content type: {error}")))?;

        let form = Form::new()
            .text("status", payload.status.as_str())
            .text("latitude", payload.coordinates.latitude.to_string())
            .text("longitude", payload.coordinates.longitude.to_string())
            .text("remarks", payload.remarks.to_string())
            .text("work_id", payload.work_id.to_string())
            .part("photos", photo_part);

        let endpoint = format!("{}/works/{}/inspections", self.base_url, payload.work_id);
        self.authorize(self.client.post(endpoint))
            .header(reqwest::header::ACCEPT, "application/json")
            .multipart(form)
            .build()
            .map_err(|error| Error::InvalidInput(format!("Failed to build request: {error}")))
    }

    fn build_list_works_request(&self) -> Result<Request> {
        self.authorize(self.client.get(format!("{}/works", self.base_url)))
            .header(reqwest::header::ACCEPT, "application/json")
            .build()
            .map_err(|error| Error::InvalidInput(format!("Failed to build request: {error}")))
    }
}

impl WorksApi for HttpWorksApi {
    async fn submit_inspection(&self, payload: &InspectionPayload<'_>) -> Result<()> {
        let request = self.build_inspection_request(payload)?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| Error::Network(format!("Inspection upload failed: {error}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        tracing::debug!(work_id = payload.work_id, "Inspection accepted by server");
        Ok(())
    }

    async fn list_works(&self) -> Result<Vec<WorkSummary>> {
        let request = self.build_list_works_request()?;
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|error| Error::Network(format!("Work list request failed: {error}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let body = response
            .text()
            .await
            .map_err(|error| Error::Network(format!("Failed to read work list: {error}")))?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
    error: Option<String>,
}

fn api_error(status: StatusCode, body: &str) -> Error {
    Error::Api {
        status: status.as_u16(),
        detail: parse_error_detail(status, body),
    }
}

fn parse_error_detail(status: StatusCode, body: &str) -> String {
    if let Ok(payload) = serde_json::from_str::<ApiErrorBody>(body) {
        let detail = payload
            .detail
            .map(|detail| match detail {
                serde_json::Value::String(text) => text,
                other => other.to_string(),
            })
            .or(payload.message)
            .or(payload.error);
        if let Some(detail) = detail {
            return compact_text(&detail);
        }
    }

    let trimmed = compact_text(body);
    if trimmed.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        trimmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::sync::oneshot;

    fn sample_photo() -> Photo {
        Photo::new("site.jpg", "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
    }

    fn sample_payload(photo: &Photo) -> InspectionPayload<'_> {
        InspectionPayload {
            work_id: 42,
            status: WorkStatus::Completed,
            coordinates: Coordinates::new(18.9, 81.35),
            photo,
            remarks: "",
        }
    }

    /// Serve a single HTTP response and hand the raw request back to the test.
    async fn spawn_one_shot_server(
        status_line: &str,
        body: &str,
    ) -> (String, oneshot::Receiver<String>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test server");
        let address = listener.local_addr().expect("local address");
        let response = format!(
            "HTTP/1.1 {status_line}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        let (sender, receiver) = oneshot::channel();

        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut request = Vec::new();
                let mut buffer = [0_u8; 4096];
                loop {
                    let read = socket.read(&mut buffer).await.unwrap_or(0);
                    if read == 0 {
                        break;
                    }
                    request.extend_from_slice(&buffer[..read]);
                    if request_complete(&request) {
                        break;
                    }
                }
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = sender.send(String::from_utf8_lossy(&request).to_string());
            }
        });

        (format!("http://{address}"), receiver)
    }

    fn request_complete(request: &[u8]) -> bool {
        let Some(header_end) = request.windows(4).position(|window| window == b"\r\n\r\n") else {
            return false;
        };
        let headers = String::from_utf8_lossy(&request[..header_end]).to_ascii_lowercase();
        let content_length = headers.lines().find_map(|line| {
            line.strip_prefix("content-length:")
                .and_then(|value| value.trim().parse::<usize>().ok())
        });

        match content_length {
            Some(length) => request.len() >= header_end + 4 + length,
            None if headers.contains("transfer-encoding: chunked") => {
                request.ends_with(b"0\r\n\r\n")
            }
            None => true,
        }
    }

    #[test]
    fn new_rejects_invalid_base_url() {
        let error = HttpWorksApi::new("api.example.com", None).unwrap_err();
        assert!(matches!(error, Error::Configuration(_)));
    }

    #[test]
    fn base_url_is_normalized() {
        let api = HttpWorksApi::new(" https://works.example.gov/api/ ", None).unwrap();
        assert_eq!(api.base_url(), "https://works.example.gov/api");
    }

    #[test]
    fn inspection_request_shape_is_correct() {
        let api = HttpWorksApi::new("https://works.example.gov/api/", None)
            .unwrap()
            .with_access_token(Some("officer-token".to_string()));
        let photo = sample_photo();
        let request = api
            .build_inspection_request(&sample_payload(&photo))
            .unwrap();

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://works.example.gov/api/works/42/inspections"
        );

        let auth = request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .unwrap()
            .to_str()
            .unwrap();
        assert_eq!(auth, "Bearer officer-token");

        let content_type = request
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
    }

    #[test]
    fn requests_omit_auth_without_token() {
        let api = HttpWorksApi::new("https://works.example.gov", None)
            .unwrap()
            .with_access_token(Some("   ".to_string()));
        let request = api.build_list_works_request().unwrap();

        assert_eq!(request.url().as_str(), "https://works.example.gov/works");
        assert!(request
            .headers()
            .get(reqwest::header::AUTHORIZATION)
            .is_none());
    }

    #[test]
    fn replayed_photo_without_name_gets_offline_name() {
        let photo = Photo::new("", "not a mime type", vec![1]);
        let payload = sample_payload(&photo);

        assert_eq!(payload.photo_file_name(), "offline_42.jpg");
        assert_eq!(payload.photo_content_type(), DEFAULT_PHOTO_CONTENT_TYPE);
    }

    #[test]
    fn parse_error_detail_prefers_json_detail() {
        assert_eq!(
            parse_error_detail(StatusCode::NOT_FOUND, r#"{"detail":"Work not found"}"#),
            "Work not found"
        );
        assert_eq!(
            parse_error_detail(StatusCode::BAD_GATEWAY, ""),
            "HTTP 502"
        );
        assert_eq!(
            parse_error_detail(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>"),
            "<html>bad gateway</html>"
        );
    }

    #[test]
    fn parse_error_detail_renders_structured_detail() {
        let detail = parse_error_detail(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail":[{"loc":["body","photos"],"msg":"field required"}]}"#,
        );
        assert!(detail.contains("field required"));
    }

    #[tokio::test]
    async fn submit_inspection_sends_all_form_fields() {
        let (base_url, request_rx) = spawn_one_shot_server("200 OK", "{\"ok\":true}").await;
        let api = HttpWorksApi::new(base_url, None).unwrap();
        let photo = sample_photo();
        let mut payload = sample_payload(&photo);
        payload.remarks = "plastering pending";

        api.submit_inspection(&payload)
            .await
            .expect("2xx should count as delivered");

        let request = request_rx.await.unwrap();
        assert!(request.starts_with("POST /works/42/inspections"));
        for field in ["status", "latitude", "longitude", "remarks", "work_id", "photos"] {
            assert!(
                request.contains(&format!("name=\"{field}\"")),
                "missing form field {field}"
            );
        }
        assert!(request.contains("Completed"));
        assert!(request.contains("plastering pending"));
        assert!(request.contains("filename=\"site.jpg\""));
    }

    #[tokio::test]
    async fn submit_inspection_accepts_created_status() {
        let (base_url, _request_rx) = spawn_one_shot_server("201 Created", "{}").await;
        let api = HttpWorksApi::new(base_url, None).unwrap();
        let photo = sample_photo();

        api.submit_inspection(&sample_payload(&photo)).await.unwrap();
    }

    #[tokio::test]
    async fn submit_inspection_surfaces_server_detail() {
        let (base_url, _request_rx) =
            spawn_one_shot_server("404 Not Found", "{\"detail\":\"Work not found\"}").await;
        let api = HttpWorksApi::new(base_url, None).unwrap();
        let photo = sample_photo();

        let error = api
            .submit_inspection(&sample_payload(&photo))
            .await
            .unwrap_err();
        match error {
            Error::Api { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail, "Work not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn submit_inspection_reports_unreachable_server_as_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let api = HttpWorksApi::new(format!("http://{address}"), Some(Duration::from_secs(5)))
            .unwrap();
        let photo = sample_photo();

        let error = api
            .submit_inspection(&sample_payload(&photo))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::Network(_)));
        assert!(error.is_network());
    }

    #[tokio::test]
    async fn list_works_parses_payload() {
        let body = r#"[
            {"id": 1, "work_code": "W-1", "block": "Dantewada", "current_status": "Completed"},
            {"id": 2, "work_name": "Pond deepening", "latitude": 18.9, "longitude": 81.35}
        ]"#;
        let (base_url, request_rx) = spawn_one_shot_server("200 OK", body).await;
        let api = HttpWorksApi::new(base_url, None)
            .unwrap()
            .with_access_token(Some("officer-token".to_string()));

        let works = api.list_works().await.unwrap();
        assert_eq!(works.len(), 2);
        assert_eq!(works[1].label(), "Pond deepening");

        let request = request_rx.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /works"));
        assert!(request.contains("authorization: bearer officer-token"));
    }
}
