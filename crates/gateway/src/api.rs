//! REST client for the video generation endpoints.
//!
//! One [`VideoApi`] instance wraps a single credential and base URL.
//! The client is stateless beyond those two values: it has no
//! awareness of the local job list. Requests carry the credential as a
//! bearer token; failures surface immediately with no retry.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use sora_core::defaults::{DEFAULT_DURATION_SECS, DEFAULT_MODEL, DEFAULT_SIZE};
use sora_core::{ListQuery, RemoteJobs, SoraError, VideoJob};

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Timeout applied to every JSON request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout for binary content downloads, which can be large.
const CONTENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Which rendition of a job's output to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentVariant {
    Video,
    Thumbnail,
}

impl ContentVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Thumbnail => "thumbnail",
        }
    }
}

/// An uploaded reference file guiding the generation.
#[derive(Debug, Clone)]
pub struct InputReference {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Parameters for a new generation job. Optional fields fall back to
/// the fixed baseline defaults at submission time.
#[derive(Debug, Clone, Default)]
pub struct SubmitRequest {
    pub prompt: String,
    pub model: Option<String>,
    pub duration_secs: Option<u32>,
    pub size: Option<String>,
    pub input_reference: Option<InputReference>,
}

impl SubmitRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Self::default()
        }
    }
}

/// Confirmation returned by the delete endpoint.
#[derive(Debug, Deserialize)]
pub struct DeleteConfirmation {
    pub id: String,
    #[serde(default)]
    pub deleted: bool,
}

/// Envelope for `GET /videos`.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    data: Vec<VideoJob>,
}

/// JSON error body shape used by the API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: Option<String>,
    code: Option<String>,
}

/// HTTP client for the `/videos` resource family.
pub struct VideoApi {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl VideoApi {
    /// Create a client against the production API root.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client against an alternate base URL (tests, proxies).
    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest HTTP client");
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Submit a new generation job.
    ///
    /// Sends a multipart `POST /videos` with the prompt, model, clip
    /// length, and resolution, plus the optional reference file.
    pub async fn submit(&self, request: SubmitRequest) -> Result<VideoJob, SoraError> {
        let model = request
            .model
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let seconds = request
            .duration_secs
            .unwrap_or(DEFAULT_DURATION_SECS)
            .to_string();
        let size = request.size.unwrap_or_else(|| DEFAULT_SIZE.to_string());

        let mut form = reqwest::multipart::Form::new()
            .text("prompt", request.prompt)
            .text("model", model)
            .text("seconds", seconds)
            .text("size", size);

        if let Some(reference) = request.input_reference {
            let part = reqwest::multipart::Part::bytes(reference.bytes)
                .file_name(reference.file_name);
            form = form.part("input_reference", part);
        }

        let response = self
            .client
            .post(format!("{}/videos", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        parse_json(response).await
    }

    /// Fetch a page of jobs. Absent query parameters are omitted from
    /// the URL entirely.
    pub async fn list(&self, query: &ListQuery) -> Result<Vec<VideoJob>, SoraError> {
        let response = self
            .client
            .get(format!("{}/videos", self.base_url))
            .query(&query.to_pairs())
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;

        let page: ListPage = parse_json(response).await?;
        Ok(page.data)
    }

    /// Fetch the current remote record for one job.
    pub async fn retrieve(&self, id: &str) -> Result<VideoJob, SoraError> {
        let response = self
            .client
            .get(format!("{}/videos/{id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;

        parse_json(response).await
    }

    /// Delete a job remotely.
    pub async fn remove(&self, id: &str) -> Result<DeleteConfirmation, SoraError> {
        let response = self
            .client
            .delete(format!("{}/videos/{id}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(transport)?;

        parse_json(response).await
    }

    /// Create a new job derived from an existing one with a
    /// replacement prompt.
    pub async fn remix(&self, id: &str, prompt: &str) -> Result<VideoJob, SoraError> {
        let body = serde_json::json!({ "prompt": prompt });

        let response = self
            .client
            .post(format!("{}/videos/{id}/remix", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        parse_json(response).await
    }

    /// Download a job's generated content.
    pub async fn fetch_content(
        &self,
        id: &str,
        variant: ContentVariant,
    ) -> Result<Vec<u8>, SoraError> {
        let response = self
            .client
            .get(self.content_url(id, variant))
            .bearer_auth(&self.api_key)
            .timeout(CONTENT_TIMEOUT)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_error(status.as_u16(), &body));
        }

        let bytes = response.bytes().await.map_err(transport)?;
        Ok(bytes.to_vec())
    }

    /// Download a preview for a job: the thumbnail when one exists,
    /// otherwise the full video.
    ///
    /// Jobs without a generated thumbnail fail the first fetch; that
    /// failure is soft and never blocks the video attempt.
    pub async fn fetch_preview(&self, id: &str) -> Result<(Vec<u8>, ContentVariant), SoraError> {
        match self.fetch_content(id, ContentVariant::Thumbnail).await {
            Ok(bytes) => Ok((bytes, ContentVariant::Thumbnail)),
            Err(e) => {
                tracing::debug!(id, error = %e, "No thumbnail available, falling back to video");
                let bytes = self.fetch_content(id, ContentVariant::Video).await?;
                Ok((bytes, ContentVariant::Video))
            }
        }
    }

    /// URL of a job's content endpoint, without issuing a request.
    pub fn content_url(&self, id: &str, variant: ContentVariant) -> String {
        format!(
            "{}/videos/{id}/content?variant={}",
            self.base_url,
            variant.as_str()
        )
    }
}

#[async_trait]
impl RemoteJobs for VideoApi {
    async fn retrieve(&self, id: &str) -> Result<VideoJob, SoraError> {
        VideoApi::retrieve(self, id).await
    }

    async fn list(&self, query: ListQuery) -> Result<Vec<VideoJob>, SoraError> {
        VideoApi::list(self, &query).await
    }

    async fn remove(&self, id: &str) -> Result<(), SoraError> {
        VideoApi::remove(self, id).await.map(|_| ())
    }
}

/// Map a request-level failure (network, DNS, TLS, timeout) into the
/// transport variant.
fn transport(e: reqwest::Error) -> SoraError {
    SoraError::Transport(e.to_string())
}

/// Parse a successful JSON response, or map a non-success response
/// through the shared error path.
async fn parse_json<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SoraError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_error(status.as_u16(), &body));
    }
    response.json::<T>().await.map_err(transport)
}

/// Turn a non-success response into an error.
///
/// The API is expected to answer with `{"error": {"message", "code"}}`.
/// A body that is not JSON at all (e.g. an HTML gateway timeout page)
/// is treated as a transport failure carrying the raw text.
fn classify_error(status: u16, body: &str) -> SoraError {
    match serde_json::from_str::<ErrorBody>(body) {
        Ok(parsed) => {
            let payload = parsed.error;
            SoraError::remote(
                status,
                payload.as_ref().and_then(|p| p.message.clone()),
                payload.and_then(|p| p.code),
            )
        }
        Err(_) => SoraError::Transport(format!("HTTP {status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn json_error_body_maps_to_remote() {
        let body = r#"{"error": {"message": "Invalid prompt", "code": "invalid_prompt"}}"#;
        let err = classify_error(400, body);
        assert_matches!(
            err,
            SoraError::Remote { status: 400, message, code }
                if message == "Invalid prompt" && code.as_deref() == Some("invalid_prompt")
        );
    }

    #[test]
    fn json_body_without_error_field_maps_to_generic_remote() {
        let err = classify_error(500, "{}");
        assert_matches!(
            err,
            SoraError::Remote { status: 500, message, code: None } if message == "request failed"
        );
    }

    #[test]
    fn non_json_body_maps_to_transport_with_raw_text() {
        let err = classify_error(504, "<html>Gateway Timeout</html>");
        assert_matches!(
            err,
            SoraError::Transport(text) if text.contains("Gateway Timeout") && text.contains("504")
        );
    }

    #[test]
    fn content_url_includes_variant() {
        let api = VideoApi::with_base_url("sk-test", "http://localhost:9999/v1");
        assert_eq!(
            api.content_url("video_1", ContentVariant::Thumbnail),
            "http://localhost:9999/v1/videos/video_1/content?variant=thumbnail"
        );
    }
}
