//! Request/response bodies of the HTTP collaborators.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::catalog::Language;

/// `POST /recommend-scheme`
#[derive(Debug, Clone, Serialize)]
pub struct RecommendRequest {
    pub transcript: String,
    pub language: Language,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub scheme_id: Option<String>,
}

/// `POST /chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub transcript: String,
    pub language: Language,
    pub scheme: Option<String>,
}

/// What the chat service asks the client to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChatAction {
    #[default]
    None,
    SwitchScheme,
    DownloadPdf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default)]
    pub action: ChatAction,
    #[serde(default)]
    pub scheme: Option<String>,
}

/// `POST /speak`
#[derive(Debug, Clone, Serialize)]
pub struct SpeakRequest {
    pub text: String,
    pub language: String,
}

/// Lifecycle of a stored submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    Completed,
}

/// `POST /save-form`
#[derive(Debug, Clone, Serialize)]
pub struct SaveFormRequest {
    pub scheme: String,
    pub mobile: Option<String>,
    pub aadhar: Option<String>,
    pub fields: HashMap<String, String>,
    pub status: SubmissionStatus,
}

impl SaveFormRequest {
    /// Build a completed submission, lifting the lookup keys out of `fields`.
    pub fn completed(scheme: &str, fields: HashMap<String, String>) -> Self {
        Self {
            scheme: scheme.to_string(),
            mobile: fields.get("mobile").cloned(),
            aadhar: fields.get("aadhar").cloned(),
            fields,
            status: SubmissionStatus::Completed,
        }
    }
}

/// Kind of supporting document attached to `/fill-form`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    AadharCopy,
    IncomeCertificate,
    Other1,
    Other2,
}

impl AttachmentKind {
    /// Multipart part name.
    pub fn part_name(&self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::AadharCopy => "aadhar_copy",
            Self::IncomeCertificate => "income_cert",
            Self::Other1 => "other_doc_1",
            Self::Other2 => "other_doc_2",
        }
    }
}

/// An uploaded supporting document.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `POST /fill-form`
#[derive(Debug, Clone)]
pub struct FillFormRequest {
    pub scheme: String,
    pub fields: HashMap<String, String>,
    pub attachments: Vec<Attachment>,
}
