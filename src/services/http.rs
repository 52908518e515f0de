//! reqwest client for the assistant backend.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::types::{
    ChatRequest, ChatResponse, FillFormRequest, RecommendRequest, RecommendResponse,
    SaveFormRequest, SpeakRequest,
};
use super::AssistantBackend;
use crate::catalog::Language;
use crate::error::ServiceError;
use crate::speech::RemoteSynthesizer;

const RECOMMEND_SCHEME: &str = "recommend-scheme";
const CHAT: &str = "chat";
const SPEAK: &str = "speak";
const SAVE_FORM: &str = "save-form";
const FILL_FORM: &str = "fill-form";

/// Body returned by `/save-form`. A 200 with `success: false` means the
/// backend could not reach its database.
#[derive(Debug, Deserialize)]
struct SaveFormAck {
    #[serde(default = "default_true")]
    success: bool,
    #[serde(default)]
    error: Option<String>,
}

fn default_true() -> bool {
    true
}

/// HTTP implementation of [`AssistantBackend`] and [`RemoteSynthesizer`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::RequestFailed {
                endpoint: base_url.to_string(),
                reason: format!("Failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{endpoint}", self.base_url)
    }

    fn send_error(&self, endpoint: &str, e: reqwest::Error) -> ServiceError {
        if e.is_timeout() {
            ServiceError::Timeout {
                endpoint: endpoint.to_string(),
                timeout: self.timeout,
            }
        } else {
            ServiceError::RequestFailed {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn check_status(
        endpoint: &str,
        resp: reqwest::Response,
    ) -> Result<reqwest::Response, ServiceError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        Err(ServiceError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body: body.chars().take(200).collect(),
        })
    }

    async fn post_json<B, R>(&self, endpoint: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let resp = self
            .client
            .post(self.url(endpoint))
            .json(body)
            .send()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;
        let resp = Self::check_status(endpoint, resp).await?;
        resp.json::<R>()
            .await
            .map_err(|e| ServiceError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    async fn read_bytes(&self, endpoint: &str, resp: reqwest::Response) -> Result<Vec<u8>, ServiceError> {
        let resp = Self::check_status(endpoint, resp).await?;
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| self.send_error(endpoint, e))?;
        if bytes.is_empty() {
            return Err(ServiceError::EmptyBody {
                endpoint: endpoint.to_string(),
            });
        }
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl AssistantBackend for HttpBackend {
    async fn recommend_scheme(
        &self,
        request: RecommendRequest,
    ) -> Result<RecommendResponse, ServiceError> {
        self.post_json(RECOMMEND_SCHEME, &request).await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError> {
        self.post_json(CHAT, &request).await
    }

    async fn save_form(&self, request: SaveFormRequest) -> Result<(), ServiceError> {
        let ack: SaveFormAck = self.post_json(SAVE_FORM, &request).await?;
        if ack.success {
            Ok(())
        } else {
            Err(ServiceError::InvalidResponse {
                endpoint: SAVE_FORM.to_string(),
                reason: ack.error.unwrap_or_else(|| "save rejected".to_string()),
            })
        }
    }

    async fn fill_form(&self, request: FillFormRequest) -> Result<Vec<u8>, ServiceError> {
        let fields =
            serde_json::to_string(&request.fields).map_err(|e| ServiceError::InvalidResponse {
                endpoint: FILL_FORM.to_string(),
                reason: format!("Failed to encode fields: {e}"),
            })?;
        let mut form = Form::new()
            .text("scheme", request.scheme.clone())
            .text("fields", fields);
        for attachment in request.attachments {
            let part = Part::bytes(attachment.bytes).file_name(attachment.file_name);
            form = form.part(attachment.kind.part_name(), part);
        }

        let resp = self
            .client
            .post(self.url(FILL_FORM))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(FILL_FORM, e))?;
        let document = self.read_bytes(FILL_FORM, resp).await?;
        tracing::info!(scheme = %request.scheme, bytes = document.len(), "Document generated");
        Ok(document)
    }
}

#[async_trait]
impl RemoteSynthesizer for HttpBackend {
    async fn synthesize(&self, text: &str, language: Language) -> Result<Vec<u8>, ServiceError> {
        let request = SpeakRequest {
            text: text.to_string(),
            language: language.locale().to_string(),
        };
        let resp = self
            .client
            .post(self.url(SPEAK))
            .json(&request)
            .send()
            .await
            .map_err(|e| self.send_error(SPEAK, e))?;
        self.read_bytes(SPEAK, resp).await
    }
}
