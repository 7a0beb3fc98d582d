use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, HeaderValue, Request, StatusCode, header},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info, warn};
use uuid::Uuid;

use crate::{
    assistant::{DocumentUpload, LegalAssistant},
    config::AppConfig,
    embedding::FastEmbedder,
    error::{AssistantError, ExtractionError},
    extract::TextExtractor,
    handlers::DRAFT_TYPES,
    llm::OpenRouterModel,
    models::{
        ChatEntry, ChatRequest, ChatResponse, DraftRequest, DraftResponse, SessionView,
        UploadResponse,
    },
    reference::ReferenceLibrary,
    session::InMemorySessionStore,
};

/// Optional header carrying the uploaded file's name
pub const FILENAME_HEADER: &str = "x-filename";

type ApiResult<T> = Result<Json<T>, ApiError>;
type ApiError = (StatusCode, Json<Value>);

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn not_found_error(message: &str, id: &str) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": message,
            "session_id": id
        })),
    )
}

fn error_with_details(status: StatusCode, message: &str, details: &str) -> ApiError {
    (
        status,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn api_error(err: AssistantError) -> ApiError {
    match &err {
        AssistantError::SessionNotFound(id) => not_found_error("Session not found", id),
        AssistantError::EmptyMessage => bad_request_error("Message cannot be empty"),
        AssistantError::Extraction(ExtractionError::UnsupportedType(_)) => error_with_details(
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Only PDF and DOCX documents are supported",
            &err.to_string(),
        ),
        AssistantError::Extraction(ExtractionError::Pdf(_) | ExtractionError::Docx(_)) => {
            error_with_details(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Could not read the uploaded document",
                &err.to_string(),
            )
        }
        AssistantError::Draft(_) => error_with_details(
            StatusCode::BAD_GATEWAY,
            "Draft generation failed",
            &err.to_string(),
        ),
        AssistantError::Extraction(ExtractionError::Worker(_))
        | AssistantError::Reference(_)
        | AssistantError::Storage(_) => {
            error!(error = %err, "Request failed");
            error_with_details(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error",
                &err.to_string(),
            )
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub assistant: Arc<LegalAssistant>,
}

/// Wire the production components from configuration
pub fn create_app(config: &AppConfig) -> anyhow::Result<Router> {
    let llm = Arc::new(OpenRouterModel::new(&config.api_key, &config.completion_model));
    let library = Arc::new(ReferenceLibrary::new(
        &config.reference_corpus_path,
        Arc::new(FastEmbedder::new()),
    ));
    let assistant = LegalAssistant::new(
        llm,
        Arc::new(InMemorySessionStore::new()),
        library,
        TextExtractor::new(config.pdfium_library_dir.clone()),
    )?
    .with_debug_transcript(config.debug_transcript);

    Ok(build_router(
        AppState {
            assistant: Arc::new(assistant),
        },
        config.max_upload_bytes,
    ))
}

pub fn build_router(app_state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/sessions", post(create_session))
        .route("/sessions/{session_id}", get(get_session).delete(reset_session))
        .route(
            "/sessions/{session_id}/history",
            get(get_history).delete(clear_history),
        )
        .route(
            "/sessions/{session_id}/documents",
            post(upload_document).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/sessions/{session_id}/chat", post(chat))
        .route("/drafts", post(generate_draft))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Tag every request with a correlation id and run it inside a span carrying it
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();
    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Legal Assistant Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Document summaries, legal Q&A over Saudi labor law and legal draft generation",
        "draft_types": DRAFT_TYPES,
        "endpoints": {
            "POST /sessions": "Create a chat session",
            "GET /sessions/{session_id}": "Session state: history, document and index status",
            "DELETE /sessions/{session_id}": "Reset the session",
            "GET /sessions/{session_id}/history": "Conversation history",
            "DELETE /sessions/{session_id}/history": "Clear the conversation",
            "POST /sessions/{session_id}/documents": "Upload a PDF or DOCX document (raw body)",
            "POST /sessions/{session_id}/chat": "Send a chat message",
            "POST /drafts": "Generate a legal draft from form fields",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session = state.assistant.create_session().await.map_err(api_error)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "session_id": session.id,
            "created_at": session.created_at,
        })),
    ))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<SessionView> {
    state
        .assistant
        .session_view(&session_id)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn reset_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!(session_id = %session_id, "Resetting session");
    state.assistant.reset(&session_id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Vec<ChatEntry>> {
    state
        .assistant
        .history(&session_id)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn clear_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .assistant
        .clear_history(&session_id)
        .await
        .map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_document(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<UploadResponse> {
    if body.is_empty() {
        return Err(bad_request_error("Document body is empty"));
    }

    let header_text = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };
    let upload = DocumentUpload {
        bytes: body.to_vec(),
        content_type: header_text(header::CONTENT_TYPE.as_str()),
        filename: header_text(FILENAME_HEADER),
    };

    state
        .assistant
        .upload(&session_id, upload)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(session_id = %session_id, error = %e, "Upload rejected");
            api_error(e)
        })
}

async fn chat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    info!(
        session_id = %session_id,
        message_chars = request.message.chars().count(),
        "Processing chat message"
    );

    state
        .assistant
        .chat(&session_id, &request.message)
        .await
        .map(Json)
        .map_err(api_error)
}

async fn generate_draft(
    State(state): State<AppState>,
    Json(request): Json<DraftRequest>,
) -> ApiResult<DraftResponse> {
    if request.draft_type.trim().is_empty() {
        return Err(bad_request_error("draft_type is required"));
    }

    state
        .assistant
        .generate_draft(request)
        .await
        .map(Json)
        .map_err(api_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::DOCX_MIME;
    use crate::testing::{KeywordEmbedder, ScriptedModel};
    use axum::body::Body;
    use std::io::Write;
    use tower::ServiceExt;

    struct TestApp {
        router: Router,
        _corpus: tempfile::NamedTempFile,
    }

    fn app(model: ScriptedModel, max_upload_bytes: usize) -> TestApp {
        let mut corpus = tempfile::NamedTempFile::new().unwrap();
        writeln!(corpus, "Article 84: end of service award is half a month's wage for each of the first five years.").unwrap();
        corpus.flush().unwrap();

        let library = Arc::new(ReferenceLibrary::new(corpus.path(), Arc::new(KeywordEmbedder::default())));
        let assistant = LegalAssistant::new(
            Arc::new(model),
            Arc::new(InMemorySessionStore::new()),
            library,
            TextExtractor::default(),
        )
        .unwrap();

        TestApp {
            router: build_router(
                AppState {
                    assistant: Arc::new(assistant),
                },
                max_upload_bytes,
            ),
            _corpus: corpus,
        }
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
        };
        (status, body)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).unwrap()
    }

    async fn new_session(router: &Router) -> String {
        let (status, body) = send(router, empty_request("POST", "/sessions")).await;
        assert_eq!(status, StatusCode::CREATED);
        body["session_id"].as_str().unwrap().to_string()
    }

    fn docx(text: &str) -> Vec<u8> {
        let xml = format!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>{text}</w:t></w:r></w:p></w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn root_and_health() {
        let app = app(ScriptedModel::new(""), 1024);
        let (status, body) = send(&app.router, empty_request("GET", "/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draft_types"].as_array().unwrap().len(), DRAFT_TYPES.len());

        let (status, body) = send(&app.router, empty_request("GET", "/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn chat_flow_over_http() {
        let model = ScriptedModel::new("unexpected")
            .on("Helpful Answer", "Half a month's wage per year.")
            .on("classification category", "legal_question");
        let app = app(model, 1024);
        let session_id = new_session(&app.router).await;

        let (status, body) = send(
            &app.router,
            json_request(
                "POST",
                &format!("/sessions/{session_id}/chat"),
                json!({ "message": "How is the end of service award calculated?" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["intent"], "legal_question");
        assert_eq!(body["reply"]["role"], "assistant");
        assert!(body["reply"]["content"]
            .as_str()
            .unwrap()
            .starts_with("⚖️ **Legal Analysis:**\n\nHalf a month's wage per year."));
        assert!(body.get("debug").is_none());

        let (status, history) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}/history"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().unwrap().len(), 2);

        let (status, view) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["index_ready"], true);
        assert!(view["document"].is_null());

        let (status, _) = send(&app.router, empty_request("DELETE", &format!("/sessions/{session_id}/history"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, history) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}/history"))).await;
        assert!(history.as_array().unwrap().is_empty());

        let (status, _) = send(&app.router, empty_request("DELETE", &format!("/sessions/{session_id}"))).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, body) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["session_id"], session_id.as_str());
    }

    #[tokio::test]
    async fn chat_validation() {
        let app = app(ScriptedModel::new(""), 1024);
        let session_id = new_session(&app.router).await;

        let (status, body) = send(
            &app.router,
            json_request("POST", &format!("/sessions/{session_id}/chat"), json!({ "message": " " })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message cannot be empty");

        let (status, _) = send(
            &app.router,
            json_request("POST", "/sessions/does-not-exist/chat", json!({ "message": "Hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upload_over_http() {
        let app = app(ScriptedModel::new("Plain summary."), 64 * 1024);
        let session_id = new_session(&app.router).await;

        let request = Request::builder()
            .method("POST")
            .uri(format!("/sessions/{session_id}/documents"))
            .header(header::CONTENT_TYPE, DOCX_MIME)
            .header(FILENAME_HEADER, "offer.docx")
            .body(Body::from(docx("Offer of employment")))
            .unwrap();
        let (status, body) = send(&app.router, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["document_kind"], "docx");
        assert_eq!(body["entries"][0]["content"], "📄 **Document Summary:**\n\nPlain summary.");
        assert_eq!(body["entries"][1]["content"], "✅ Document processed and ready for Q&A!");

        let (_, view) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}"))).await;
        assert_eq!(view["document"]["filename"], "offer.docx");
    }

    #[tokio::test]
    async fn upload_errors_map_to_status_codes() {
        let app = app(ScriptedModel::new("unused"), 256);
        let session_id = new_session(&app.router).await;
        let uri = format!("/sessions/{session_id}/documents");

        let upload = |content_type: &str, body: Vec<u8>| {
            Request::builder()
                .method("POST")
                .uri(&uri)
                .header(header::CONTENT_TYPE, content_type)
                .body(Body::from(body))
                .unwrap()
        };

        let (status, _) = send(&app.router, upload("text/plain", b"hello".to_vec())).await;
        assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

        let (status, _) = send(&app.router, upload(DOCX_MIME, b"garbage".to_vec())).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app.router, upload(DOCX_MIME, vec![0u8; 1024])).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

        let (status, _) = send(&app.router, upload(DOCX_MIME, Vec::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, history) = send(&app.router, empty_request("GET", &format!("/sessions/{session_id}/history"))).await;
        assert!(history.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn draft_endpoint() {
        let model = ScriptedModel::new("unexpected")
            .on("draft a Service Contract", "SERVICE CONTRACT")
            .failing_on("draft a Legal Notice", "model overloaded");
        let app = app(model, 1024);

        let (status, body) = send(
            &app.router,
            json_request(
                "POST",
                "/drafts",
                json!({ "draft_type": "Service Contract", "fields": { "company-name": "Acme" } }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["draft"], "SERVICE CONTRACT");

        let (status, body) = send(
            &app.router,
            json_request("POST", "/drafts", json!({ "draft_type": "Legal Notice" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["details"], "failed to generate draft: model overloaded");

        let (status, _) = send(&app.router, json_request("POST", "/drafts", json!({ "draft_type": "" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
