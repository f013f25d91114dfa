//! Route handlers.

use crate::error::ApiError;
use crate::session::{ChatEntry, Session};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use docchat_knowledge::{Citation, SourceSummary, UploadedFile};
use docchat_prompt::ResponseMode;
use serde::{Deserialize, Serialize};

const INDEX_HTML: &str = include_str!("../assets/index.html");
const NO_DOCUMENTS: &str = "Please upload and process documents first.";

type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
    pub chunks: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub chunks: usize,
    pub collection: String,
    pub embedding_model: String,
    pub sources: Vec<SourceSummary>,
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    pub session: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub files: usize,
    pub chunks: usize,
    pub file_names: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
    pub message: &'static str,
}

#[derive(Debug, Default, Deserialize)]
pub struct ModeRequest {
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCreated {
    pub session_id: String,
    pub mode: ResponseMode,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub mode: ResponseMode,
    pub file_names: Vec<String>,
    pub history: Vec<ChatEntry>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.id.clone(),
            mode: session.mode,
            file_names: session.file_names.clone(),
            history: session.history.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub answer: String,
    pub sources: Vec<Citation>,
    pub mode: ResponseMode,
}

pub async fn index_handler() -> impl IntoResponse {
    Html(INDEX_HTML)
}

pub async fn health_handler(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let sessions = state.sessions.read().await.count();
    Ok(Json(HealthResponse {
        status: "ok",
        sessions,
        chunks: state.knowledge.count().await?,
    }))
}

pub async fn stats_handler(State(state): State<AppState>) -> ApiResult<Json<StatsResponse>> {
    Ok(Json(StatsResponse {
        chunks: state.knowledge.count().await?,
        collection: state.collection.clone(),
        embedding_model: state.knowledge.embedding_info().model,
        sources: state.knowledge.sources().await?,
    }))
}

/// POST /api/documents
///
/// Every multipart field named `files` is ingested. The batch fails as a
/// whole on the first unreadable or unsupported file.
pub async fn upload_handler(
    State(state): State<AppState>,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    if let Some(id) = &query.session {
        if !state.sessions.read().await.contains(id) {
            return Err(session_not_found(id));
        }
    }

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("files") {
            continue;
        }

        let name = field
            .file_name()
            .map(str::to_string)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("Uploaded file has no name".to_string()))?;
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read '{}': {}", name, e)))?;

        files.push(UploadedFile::new(name, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No files uploaded".to_string()));
    }

    let report = state.knowledge.ingest(files).await?;

    if let Some(id) = &query.session {
        state
            .sessions
            .write()
            .await
            .set_file_names(id, report.file_names.clone());
    }

    Ok(Json(UploadResponse {
        message: format!(
            "Processed {} file(s) → {} chunks embedded!",
            report.files, report.chunks
        ),
        files: report.files,
        chunks: report.chunks,
        file_names: report.file_names,
    }))
}

pub async fn clear_documents_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<ClearResponse>> {
    state.knowledge.clear().await?;
    state.sessions.write().await.reset_all();
    tracing::info!("Knowledge base cleared");

    Ok(Json(ClearResponse {
        cleared: true,
        message: "Knowledge base cleared!",
    }))
}

/// POST /api/sessions
///
/// The body is optional; an empty one starts a strict-mode session.
pub async fn create_session_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let request: ModeRequest = if body.is_empty() {
        ModeRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e)))?
    };

    let mode = match request.mode.as_deref() {
        Some(mode) => parse_mode(mode)?,
        None => ResponseMode::default(),
    };

    let session = state.sessions.write().await.create_session(mode);
    Ok((
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id: session.id,
            mode: session.mode,
        }),
    ))
}

pub async fn get_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<SessionResponse>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(&id))?;
    Ok(Json(SessionResponse::from(session)))
}

pub async fn delete_session_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    if state.sessions.write().await.remove_session(&id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(session_not_found(&id))
    }
}

pub async fn set_mode_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ModeRequest>,
) -> ApiResult<Json<SessionResponse>> {
    let mode = request
        .mode
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Missing 'mode'".to_string()))
        .and_then(parse_mode)?;

    let mut sessions = state.sessions.write().await;
    let session = sessions
        .set_mode(&id, mode)
        .ok_or_else(|| session_not_found(&id))?;
    Ok(Json(SessionResponse::from(session)))
}

/// POST /api/sessions/{id}/chat
///
/// The session lock is released while retrieval and generation run.
pub async fn chat_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ChatRequest>,
) -> ApiResult<Json<ChatResponse>> {
    let (mode, history) = {
        let sessions = state.sessions.read().await;
        let session = sessions.get(&id).ok_or_else(|| session_not_found(&id))?;
        (session.mode, session.chat_messages())
    };

    let question = request.question.trim();
    if question.is_empty() {
        return Err(ApiError::BadRequest("Question must not be empty".to_string()));
    }

    if state.knowledge.count().await? == 0 {
        return Err(ApiError::Conflict(NO_DOCUMENTS.to_string()));
    }

    let docs: Vec<_> = state
        .knowledge
        .search(question, state.top_k)
        .await?
        .into_iter()
        .map(|scored| scored.document)
        .collect();

    let answer = state
        .chain
        .generate_answer(question, &docs, &history, mode)
        .await?;

    let recorded = state
        .sessions
        .write()
        .await
        .record_exchange(&id, question, &answer);
    if !recorded {
        tracing::warn!("Session '{}' was removed before its answer could be recorded", id);
    }

    Ok(Json(ChatResponse {
        answer: answer.answer,
        sources: answer.sources,
        mode: answer.mode,
    }))
}

fn parse_mode(mode: &str) -> ApiResult<ResponseMode> {
    mode.parse()
        .map_err(|_| ApiError::BadRequest(format!("Unknown response mode '{}'", mode)))
}

fn session_not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Session '{}' not found", id))
}
