use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use chrono::{TimeDelta, Utc};
use dashmap::DashMap;
use mediassist_core::{
    AssistError, FlowRunner, InMemorySessionStorage, PdfTextExtractor, ReportSession,
    SessionStorage, Summarizer, TextExtractor,
};
use serde_json::{Value, json};
use std::{sync::Arc, time::Duration};
use tokio::{
    sync::{Mutex, OwnedMutexGuard},
    task::JoinHandle,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};

use crate::{
    config::{DEFAULT_SESSION_TTL_SECS, ServiceConfig},
    models::ReportResponse,
    workflow::{create_flow_runner, create_report_session, is_summary_step},
};

const INDEX_HTML: &str = include_str!("../static/index.html");
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
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

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

/// Map a pipeline failure to the status the page shows to the user.
fn analysis_error(message: &str, e: &AssistError) -> ApiError {
    let status = match e {
        AssistError::Document(_) => StatusCode::UNPROCESSABLE_ENTITY,
        AssistError::Summarization(_) => StatusCode::BAD_GATEWAY,
        AssistError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(json!({
            "error": message,
            "details": e.to_string()
        })),
    )
}

/// One async mutex per report, so actions on the same report run one at a time.
#[derive(Clone, Default)]
pub struct SessionLocks {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
    pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
        let lock = self.locks.entry(session_id.to_string()).or_default().clone();
        lock.lock_owned().await
    }

    pub fn forget(&self, session_id: &str) {
        self.locks.remove(session_id);
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub flow_runner: FlowRunner,
    pub summarizer_backend: String,
    pub session_locks: SessionLocks,
    pub session_ttl: TimeDelta,
}

impl AppState {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        summarizer: Arc<dyn Summarizer>,
        session_storage: Arc<dyn SessionStorage>,
    ) -> Self {
        let summarizer_backend = summarizer.name().to_string();
        let flow_runner = create_flow_runner(extractor, summarizer, session_storage.clone());

        Self {
            session_storage,
            flow_runner,
            summarizer_backend,
            session_locks: SessionLocks::default(),
            session_ttl: TimeDelta::seconds(DEFAULT_SESSION_TTL_SECS.into()),
        }
    }

    pub fn with_session_ttl(mut self, session_ttl: TimeDelta) -> Self {
        self.session_ttl = session_ttl;
        self
    }
}

/// Drop reports older than the session TTL. Returns how many were evicted.
pub async fn evict_expired_sessions(state: &AppState) -> usize {
    let cutoff = Utc::now() - state.session_ttl;
    match state.session_storage.remove_expired(cutoff).await {
        Ok(expired) => {
            for session_id in &expired {
                state.session_locks.forget(session_id);
            }
            if !expired.is_empty() {
                info!(count = expired.len(), "Evicted expired report sessions");
            }
            expired.len()
        }
        Err(e) => {
            error!("Failed to evict expired sessions: {}", e);
            0
        }
    }
}

/// Periodically evict expired reports, even when no uploads arrive.
pub fn spawn_session_sweeper(state: AppState, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            evict_expired_sessions(&state).await;
        }
    })
}

/// Wire the production components: pdf-extract text extraction, in-memory sessions and the
/// summarizer built at startup. Must be called inside a Tokio runtime, since it starts the
/// session sweeper.
pub fn create_app(config: &ServiceConfig, summarizer: Arc<dyn Summarizer>) -> Router {
    let app_state = AppState::new(
        Arc::new(PdfTextExtractor),
        summarizer,
        Arc::new(InMemorySessionStorage::new()),
    )
    .with_session_ttl(TimeDelta::seconds(config.session_ttl_secs.into()));

    spawn_session_sweeper(app_state.clone(), SESSION_SWEEP_INTERVAL);
    build_router(app_state, config.max_upload_bytes)
}

pub fn build_router(app_state: AppState, max_upload_bytes: Option<usize>) -> Router {
    let upload_limit = match max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(index))
        .route("/api", get(api_description))
        .route("/health", get(health_check))
        .route("/reports", post(upload_report))
        .route("/reports/{session_id}", get(get_report).delete(delete_report))
        .route("/reports/{session_id}/summary", post(request_summary))
        .layer(upload_limit)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn api_description() -> Json<Value> {
    Json(json!({
        "service": "MediAssist",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Medical report vitals extraction, severity flags and AI summaries",
        "endpoints": {
            "GET /": "Report upload page",
            "POST /reports": "Upload a PDF report (multipart field 'file') and analyze it",
            "GET /reports/{session_id}": "Get the analysis of an uploaded report",
            "POST /reports/{session_id}/summary": "Generate the AI summary for a report",
            "DELETE /reports/{session_id}": "Discard an uploaded report",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "summarizer": state.summarizer_backend,
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn upload_report(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<ReportResponse> {
    let (file_name, bytes) = read_upload(&mut multipart).await?;
    evict_expired_sessions(&state).await;

    info!(
        file_name = file_name.as_deref().unwrap_or("<unnamed>"),
        bytes = bytes.len(),
        "Received report upload"
    );

    let session = create_report_session(file_name, bytes);
    let session_id = session.id.clone();

    save_session(&state, session).await?;
    analyze_report(&state, &session_id).await
}

/// Pull the `file` field out of the multipart body.
async fn read_upload(multipart: &mut Multipart) -> Result<(Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            e.status(),
            Json(json!({ "error": "Invalid upload", "details": e.body_text() })),
        )
    })? {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().map(str::to_string);
        validate_file_name(file_name.as_deref())?;

        let bytes = field.bytes().await.map_err(|e| {
            (
                e.status(),
                Json(json!({ "error": "Invalid upload", "details": e.body_text() })),
            )
        })?;

        if bytes.is_empty() {
            return Err(bad_request_error("Uploaded file is empty"));
        }

        return Ok((file_name, bytes.to_vec()));
    }

    Err(bad_request_error("A PDF file is required in field 'file'"))
}

fn validate_file_name(file_name: Option<&str>) -> Result<(), ApiError> {
    match file_name {
        Some(name) if !name.to_ascii_lowercase().ends_with(".pdf") => {
            Err(bad_request_error("Only PDF files are accepted"))
        }
        _ => Ok(()),
    }
}

async fn save_session(state: &AppState, session: ReportSession) -> Result<(), ApiError> {
    state.session_storage.save(session).await.map_err(|e| {
        error!("Failed to create session: {}", e);
        internal_error("Failed to create report session", &e.to_string())
    })
}

async fn analyze_report(state: &AppState, session_id: &str) -> ApiResult<ReportResponse> {
    info!("Session {} created successfully", session_id);

    match state.flow_runner.run(session_id).await {
        Ok(result) => {
            info!(
                "Report analysis finished for session {}: {:?}",
                session_id, result.status
            );
            load_report(state, session_id).await
        }
        Err(e) => {
            error!("Failed to analyze report for session {}: {}", session_id, e);

            // the upload never produced a usable report
            if let Err(delete_err) = state.session_storage.delete(session_id).await {
                error!("Failed to discard session {}: {}", session_id, delete_err);
            }

            Err(analysis_error("Failed to analyze report", &e))
        }
    }
}

async fn find_session(state: &AppState, session_id: &str) -> Result<ReportSession, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(session)) => Ok(session),
        Ok(None) => Err(not_found_error("Session not found", session_id)),
        Err(e) => {
            error!("Failed to load session {}: {}", session_id, e);
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

/// Lock `session_id` and load it. Unknown reports leave no lock behind.
async fn lock_session(
    state: &AppState,
    session_id: &str,
) -> Result<(OwnedMutexGuard<()>, ReportSession), ApiError> {
    let guard = state.session_locks.acquire(session_id).await;
    match find_session(state, session_id).await {
        Ok(session) => Ok((guard, session)),
        Err(e) => {
            drop(guard);
            state.session_locks.forget(session_id);
            Err(e)
        }
    }
}

async fn load_report(state: &AppState, session_id: &str) -> ApiResult<ReportResponse> {
    let session = find_session(state, session_id).await?;
    Ok(Json(ReportResponse::from_session(&session)))
}

async fn get_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ReportResponse> {
    info!("Getting report for session: {}", session_id);
    load_report(&state, &session_id).await
}

async fn request_summary(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<ReportResponse> {
    info!("Summary requested for session: {}", session_id);

    // a concurrent request for the same report waits here, then finds the stored summary
    let (_guard, mut session) = lock_session(&state, &session_id).await?;

    if session.summary.is_some() {
        return Ok(Json(ReportResponse::from_session(&session)));
    }

    if !is_summary_step(&session.current_step_id) {
        return Err((
            StatusCode::CONFLICT,
            Json(json!({
                "error": "Report analysis has not finished",
                "session_id": session_id
            })),
        ));
    }

    session.summary_requested = true;
    match state.session_storage.update(session).await {
        Ok(true) => {}
        Ok(false) => return Err(not_found_error("Session not found", &session_id)),
        Err(e) => {
            error!("Failed to save session {}: {}", session_id, e);
            return Err(internal_error("Failed to save session", &e.to_string()));
        }
    }

    match state.flow_runner.run(&session_id).await {
        Ok(result) => {
            info!(
                "Summary step finished for session {}: {:?}",
                session_id, result.status
            );
            load_report(&state, &session_id).await
        }
        Err(e) => {
            error!("Failed to summarize report for session {}: {}", session_id, e);
            Err(analysis_error("Failed to generate summary", &e))
        }
    }
}

async fn delete_report(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Value> {
    let (guard, _) = lock_session(&state, &session_id).await?;

    state.session_storage.delete(&session_id).await.map_err(|e| {
        error!("Failed to delete session {}: {}", session_id, e);
        internal_error("Failed to delete session", &e.to_string())
    })?;
    drop(guard);
    state.session_locks.forget(&session_id);

    info!("Session {} discarded", session_id);
    Ok(Json(json!({
        "session_id": session_id,
        "status": "deleted"
    })))
}
