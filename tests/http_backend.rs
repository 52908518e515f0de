//! HttpBackend against a stub collaborator server.
//!
//! Each test spins up an Axum server on a random port that mimics the
//! assistant backend's JSON and binary endpoints.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use jan_sahayak::catalog::Language;
use jan_sahayak::error::ServiceError;
use jan_sahayak::services::{
    AssistantBackend, Attachment, AttachmentKind, ChatAction, ChatRequest, FillFormRequest,
    HttpBackend, RecommendRequest, SaveFormRequest,
};
use jan_sahayak::speech::RemoteSynthesizer;

const TEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Requests seen by the stub, keyed by endpoint.
#[derive(Clone, Default)]
struct Seen {
    json: Arc<Mutex<HashMap<&'static str, Value>>>,
    multipart: Arc<Mutex<Option<(String, String)>>>,
}

async fn recommend(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.json.lock().unwrap().insert("recommend-scheme", body.clone());
    if body["transcript"].as_str().unwrap_or_default().contains("crops") {
        Json(json!({"success": true, "message": "PM Kisan fits you.", "scheme_id": "pm-kisan"}))
    } else {
        Json(json!({"success": false, "message": "Are you a farmer?"}))
    }
}

async fn chat(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    seen.json.lock().unwrap().insert("chat", body);
    Json(json!({"text": "Downloading your form.", "action": "DOWNLOAD_PDF"}))
}

async fn speak(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    let empty = body["text"] == "silence";
    seen.json.lock().unwrap().insert("speak", body);
    if empty {
        Vec::new()
    } else {
        vec![0xFF, 0xFB, 0x90]
    }
}

async fn save_form(State(seen): State<Seen>, Json(body): Json<Value>) -> impl IntoResponse {
    let reject = body["scheme"] == "ujjwala";
    seen.json.lock().unwrap().insert("save-form", body);
    if reject {
        Json(json!({"success": false, "error": "database unavailable"}))
    } else {
        Json(json!({"success": true}))
    }
}

async fn fill_form(State(seen): State<Seen>, headers: HeaderMap, body: Bytes) -> impl IntoResponse {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = String::from_utf8_lossy(&body).to_string();
    *seen.multipart.lock().unwrap() = Some((content_type, body));
    b"%PDF-1.4 stub".to_vec()
}

async fn broken() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "model crashed")
}

async fn start_server() -> (HttpBackend, Seen) {
    let seen = Seen::default();
    let app = Router::new()
        .route("/api/recommend-scheme", post(recommend))
        .route("/api/chat", post(chat))
        .route("/api/speak", post(speak))
        .route("/api/save-form", post(save_form))
        .route("/api/fill-form", post(fill_form))
        .route("/broken/chat", post(broken))
        .with_state(seen.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;

    let backend =
        HttpBackend::new(&format!("http://127.0.0.1:{port}/api"), Duration::from_secs(2)).unwrap();
    (backend, seen)
}

#[tokio::test]
async fn recommend_scheme_round_trip() {
    timeout(TEST_TIMEOUT, async {
        let (backend, seen) = start_server().await;

        let response = backend
            .recommend_scheme(RecommendRequest {
                transcript: "my crops failed".into(),
                language: Language::Hi,
            })
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.scheme_id.as_deref(), Some("pm-kisan"));

        let sent = seen.json.lock().unwrap()["recommend-scheme"].clone();
        assert_eq!(sent["transcript"], "my crops failed");
        assert_eq!(sent["language"], "hi");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn chat_action_is_parsed() {
    timeout(TEST_TIMEOUT, async {
        let (backend, seen) = start_server().await;

        let response = backend
            .chat(ChatRequest {
                transcript: "give me the pdf".into(),
                language: Language::En,
                scheme: Some("ration-card".into()),
            })
            .await
            .unwrap();
        assert_eq!(response.action, ChatAction::DownloadPdf);
        assert_eq!(response.scheme, None);
        assert_eq!(seen.json.lock().unwrap()["chat"]["scheme"], "ration-card");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn speak_sends_locale_and_returns_audio() {
    timeout(TEST_TIMEOUT, async {
        let (backend, seen) = start_server().await;

        let audio = backend.synthesize("नमस्ते", Language::Hi).await.unwrap();
        assert_eq!(audio, vec![0xFF, 0xFB, 0x90]);
        assert_eq!(seen.json.lock().unwrap()["speak"]["language"], "hi-IN");

        let err = backend.synthesize("silence", Language::En).await.unwrap_err();
        assert!(matches!(err, ServiceError::EmptyBody { .. }));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn save_form_reports_rejection() {
    timeout(TEST_TIMEOUT, async {
        let (backend, seen) = start_server().await;

        let fields = HashMap::from([
            ("name".to_string(), "Sita Devi".to_string()),
            ("aadhar".to_string(), "123456789012".to_string()),
        ]);
        backend
            .save_form(SaveFormRequest::completed("ration-card", fields.clone()))
            .await
            .unwrap();
        {
            let sent = seen.json.lock().unwrap()["save-form"].clone();
            assert_eq!(sent["aadhar"], "123456789012");
            assert_eq!(sent["status"], "completed");
        }

        let err = backend
            .save_form(SaveFormRequest::completed("ujjwala", fields))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ServiceError::InvalidResponse { ref reason, .. } if reason == "database unavailable")
        );
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn fill_form_sends_multipart_with_attachments() {
    timeout(TEST_TIMEOUT, async {
        let (backend, seen) = start_server().await;

        let document = backend
            .fill_form(FillFormRequest {
                scheme: "pm-kisan".into(),
                fields: HashMap::from([("name".to_string(), "Ramesh".to_string())]),
                attachments: vec![Attachment {
                    kind: AttachmentKind::AadharCopy,
                    file_name: "aadhar.jpg".into(),
                    bytes: b"jpegdata".to_vec(),
                }],
            })
            .await
            .unwrap();
        assert_eq!(document, b"%PDF-1.4 stub");

        let (content_type, body) = seen.multipart.lock().unwrap().clone().unwrap();
        assert!(content_type.starts_with("multipart/form-data"));
        assert!(body.contains("name=\"scheme\""));
        assert!(body.contains("pm-kisan"));
        assert!(body.contains("name=\"aadhar_copy\""));
        assert!(body.contains("filename=\"aadhar.jpg\""));
        assert!(body.contains("Ramesh"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn error_status_is_surfaced() {
    timeout(TEST_TIMEOUT, async {
        let (backend, _seen) = start_server().await;
        let broken = HttpBackend::new(
            &backend.url("").replace("/api/", "/broken"),
            Duration::from_secs(2),
        )
        .unwrap();

        let err = broken
            .chat(ChatRequest {
                transcript: "hello".into(),
                language: Language::En,
                scheme: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Status { status: 500, ref body, .. } if body == "model crashed"
        ));
    })
    .await
    .expect("test timed out");
}
