use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Response, StatusCode};
use tracing::debug;

use super::error::ApiError;
use super::types::{ApiEnvelope, CandidateFile, DocumentCategory, ProfileSection, UploadReceipt};
use crate::config::IntakeConfig;

/// Receives transfer progress as a percentage in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Per-stage persistence of profile data.
#[allow(async_fn_in_trait)]
pub trait ProfileService {
    /// Idempotent update of one section of the profile.
    async fn update_section(
        &self,
        section: ProfileSection,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<(), ApiError>;

    /// Marks onboarding as finished.
    async fn complete_onboarding(&self, token: &str) -> Result<(), ApiError>;
}

/// Per-category document storage.
#[allow(async_fn_in_trait)]
pub trait UploadService {
    async fn upload(
        &self,
        category: DocumentCategory,
        file: &CandidateFile,
        token: &str,
        progress: ProgressFn,
    ) -> Result<UploadReceipt, ApiError>;

    async fn delete(
        &self,
        category: DocumentCategory,
        public_id: &str,
        token: &str,
    ) -> Result<(), ApiError>;
}

/// HTTP client for the profile and upload services.
pub struct IntakeClient {
    client: Client,
    base_url: String,
    chunk_bytes: usize,
}

impl IntakeClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            chunk_bytes: 64 * 1024,
        })
    }

    pub fn from_config(config: &IntakeConfig) -> Result<Self, ApiError> {
        let mut client = Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?;
        client.chunk_bytes = config.upload_chunk_bytes.max(1);
        Ok(client)
    }

    /// Granularity of progress events during uploads.
    pub fn with_chunk_size(mut self, chunk_bytes: usize) -> Self {
        self.chunk_bytes = chunk_bytes.max(1);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

impl ProfileService for IntakeClient {
    async fn update_section(
        &self,
        section: ProfileSection,
        body: &serde_json::Value,
        token: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("users/profile/{}", section.path_segment()));
        debug!(%url, "updating profile section");
        let response = self
            .client
            .put(&url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;
        expect_success::<serde_json::Value>(response).await?;
        Ok(())
    }

    async fn complete_onboarding(&self, token: &str) -> Result<(), ApiError> {
        let url = self.url("users/onboarding/complete");
        debug!(%url, "marking onboarding complete");
        let response = self.client.post(&url).bearer_auth(token).send().await?;
        expect_success::<serde_json::Value>(response).await?;
        Ok(())
    }
}

impl UploadService for IntakeClient {
    async fn upload(
        &self,
        category: DocumentCategory,
        file: &CandidateFile,
        token: &str,
        progress: ProgressFn,
    ) -> Result<UploadReceipt, ApiError> {
        let url = self.url(&format!("users/upload/{}", category.upload_segment()));
        debug!(%url, file = %file.name, bytes = file.size(), "uploading document");

        let body = progress_body(file.content.clone(), self.chunk_bytes, progress);
        let part = Part::stream_with_length(body, file.size())
            .file_name(file.name.clone())
            .mime_str(file.mime_type())?;
        let form = Form::new()
            .text("docType", category.doc_type())
            .part(category.field_name(), part);

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await?;

        expect_success::<UploadReceipt>(response)
            .await?
            .ok_or_else(|| ApiError::Malformed("upload response carried no receipt".into()))
    }

    async fn delete(
        &self,
        category: DocumentCategory,
        public_id: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        let url = self.url(&format!("users/documents/{}/{public_id}", category.doc_type()));
        debug!(%url, "deleting document");
        let response = self.client.delete(&url).bearer_auth(token).send().await?;
        expect_success::<serde_json::Value>(response).await?;
        Ok(())
    }
}

/// Classifies the response and returns the envelope's `data`, if any.
async fn expect_success<T: serde::de::DeserializeOwned>(
    response: Response,
) -> Result<Option<T>, ApiError> {
    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
        return Err(ApiError::Unauthorized);
    }

    let text = response.text().await.unwrap_or_default();
    let envelope = serde_json::from_str::<ApiEnvelope<T>>(&text).ok();

    if !status.is_success() {
        let message = envelope
            .and_then(|e| e.failure_message())
            .unwrap_or_default();
        return Err(ApiError::Rejected {
            status: status.as_u16(),
            message,
        });
    }

    match envelope {
        Some(env) if !env.success => Err(ApiError::Rejected {
            status: status.as_u16(),
            message: env.failure_message().unwrap_or_default(),
        }),
        Some(env) => Ok(env.data),
        None => Ok(None),
    }
}

/// Streams `content` in chunks, reporting the share handed to the transport.
fn progress_body(content: Bytes, chunk_bytes: usize, progress: ProgressFn) -> Body {
    let total = content.len();
    let chunks: Vec<Bytes> = (0..total)
        .step_by(chunk_bytes)
        .map(|start| content.slice(start..(start + chunk_bytes).min(total)))
        .collect();

    let mut sent = 0usize;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        progress(percent_of(sent, total));
        Ok::<Bytes, std::io::Error>(chunk)
    });
    Body::wrap_stream(stream)
}

fn percent_of(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done.min(total) * 100) / total) as u8
}
