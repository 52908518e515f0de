//! Remote collaborators reached over HTTP.
//!
//! The dialogue controller only sees the [`AssistantBackend`] trait; the
//! reqwest implementation lives in [`http`].

pub mod http;
pub mod types;

pub use http::HttpBackend;
pub use types::*;

use async_trait::async_trait;

use crate::error::ServiceError;

/// Scheme triage, chat fallback, persistence and document generation.
#[async_trait]
pub trait AssistantBackend: Send + Sync {
    /// Classify a free-form problem description into a scheme.
    async fn recommend_scheme(
        &self,
        request: RecommendRequest,
    ) -> Result<RecommendResponse, ServiceError>;

    /// Conversational handling for input that is not a field answer.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, ServiceError>;

    /// Persist a completed submission.
    async fn save_form(&self, request: SaveFormRequest) -> Result<(), ServiceError>;

    /// Render the filled form. Returns the document bytes.
    async fn fill_form(&self, request: FillFormRequest) -> Result<Vec<u8>, ServiceError>;
}
