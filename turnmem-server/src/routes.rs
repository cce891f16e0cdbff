//! Route table (spec §6.1). Handlers do the scrubbing the data-flow
//! diagram puts at the HTTP boundary, then hand off to the Store/Queue/
//! Search/Context/SSE crates; none of them talk to SQLite directly.

use std::convert::Infallible;

use axum::Json;
use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderValue;
use axum::http::StatusCode;
use axum::http::header;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use serde::Deserialize;
use serde::Serialize;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::error::ServerError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/context", get(get_context))
        .route(
            "/api/observations",
            get(list_observations_route).post(create_observation),
        )
        .route("/api/observations/batch", post(batch_observations))
        .route("/api/observation/:id", get(get_observation))
        .route("/api/sessions/init", post(init_session))
        .route("/api/sessions/summarize", post(summarize_session))
        .route("/api/sessions/complete", post(complete_session))
        .route("/api/sessions", get(list_sessions))
        .route("/api/search", get(search))
        .route("/api/stats", get(stats))
        .route("/api/queue", get(queue_status))
        .route("/api/queue/recover", post(recover_queue))
        .route("/stream", get(stream))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> ServerError {
    ServerError::NotFound
}

fn scrub_text(raw: &str) -> Result<String, ServerError> {
    let validated = turnmem_scrubber::validate_content(raw)?;
    let stripped = turnmem_scrubber::strip_privacy_markup(&validated);
    let scrubbed = turnmem_scrubber::scrub_string(&stripped);
    Ok(turnmem_scrubber::enforce_byte_limit(
        &scrubbed,
        turnmem_scrubber::OBSERVATION_BYTE_LIMIT,
    ))
}

// ---------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: u64,
    port: u16,
    #[serde(rename = "tokenPath")]
    token_path: String,
    queue: QueueCountsBody,
}

#[derive(Serialize)]
struct QueueCountsBody {
    pending: i64,
    processing: i64,
    failed: i64,
    stuck: i64,
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthResponse>, ServerError> {
    let counts = state.store.queue_counts()?;
    Ok(Json(HealthResponse {
        status: "ok",
        uptime: state.started_at.elapsed().as_secs(),
        port: state.config.port,
        token_path: state.config.token_path().to_string_lossy().into_owned(),
        queue: QueueCountsBody {
            pending: counts.pending,
            processing: counts.processing,
            failed: counts.failed,
            stuck: counts.stuck,
        },
    }))
}

// ---------------------------------------------------------------------
// GET /api/context
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct ContextQuery {
    project: String,
    limit: Option<usize>,
}

async fn get_context(
    State(state): State<AppState>,
    Query(query): Query<ContextQuery>,
) -> Result<Response, ServerError> {
    let mut options = turnmem_context::ContextOptions {
        token_budget: state.config.token_budget as usize,
        max_sessions: state.config.max_sessions as usize,
        max_observations: state.config.max_observations as usize,
    };
    if let Some(limit) = query.limit {
        options.max_observations = limit;
    }

    let result = turnmem_context::build(&state.store, &query.project, &options)?;
    let mut response = result.markdown.into_response();
    response
        .headers_mut()
        .insert("content-type", "text/markdown".parse().unwrap());
    response
        .headers_mut()
        .insert("X-Token-Estimate", result.token_estimate.to_string().parse().unwrap());
    response.headers_mut().insert(
        "X-Observation-Count",
        result.observation_count.to_string().parse().unwrap(),
    );
    response
        .headers_mut()
        .insert("X-Summary-Count", result.summary_count.to_string().parse().unwrap());
    response
        .headers_mut()
        .insert("X-Truncated", result.truncated.to_string().parse().unwrap());
    Ok(response)
}

// ---------------------------------------------------------------------
// POST /api/observations
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct CreateObservationBody {
    session_id: String,
    tool_name: String,
    tool_input: serde_json::Value,
    #[serde(alias = "tool_response")]
    tool_result: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    #[allow(dead_code)]
    correlation_id: Option<String>,
}

#[derive(Serialize)]
struct CreateObservationResponse {
    success: bool,
    queued: bool,
    queue_id: i64,
}

async fn create_observation(
    State(state): State<AppState>,
    Json(body): Json<CreateObservationBody>,
) -> Result<(StatusCode, Json<CreateObservationResponse>), ServerError> {
    if body.session_id.is_empty() {
        return Err(ServerError::Validation {
            message: "session_id must not be empty".to_string(),
        });
    }
    let project = body.project.unwrap_or_default();
    let scrubbed_input = turnmem_scrubber::scrub_json(&body.tool_input).to_string();
    let scrubbed_result = scrub_text(&body.tool_result)?;

    let item = state
        .queue
        .enqueue(&body.session_id, &body.tool_name, &scrubbed_input, &scrubbed_result, &project)?;

    Ok((
        StatusCode::ACCEPTED,
        Json(CreateObservationResponse {
            success: true,
            queued: true,
            queue_id: item.id,
        }),
    ))
}

// ---------------------------------------------------------------------
// POST /api/observations/batch
// ---------------------------------------------------------------------

const MAX_BATCH_IDS: usize = 200;

#[derive(Deserialize)]
struct BatchObservationsBody {
    ids: Vec<i64>,
}

#[derive(Serialize)]
struct BatchObservationsResponse {
    observations: Vec<turnmem_store::Observation>,
}

async fn batch_observations(
    State(state): State<AppState>,
    Json(body): Json<BatchObservationsBody>,
) -> Result<Json<BatchObservationsResponse>, ServerError> {
    if body.ids.len() > MAX_BATCH_IDS {
        return Err(ServerError::Validation {
            message: format!("at most {MAX_BATCH_IDS} ids allowed per batch"),
        });
    }
    let observations = turnmem_search::get_by_ids(&state.store, &body.ids)?;
    Ok(Json(BatchObservationsResponse { observations }))
}

// ---------------------------------------------------------------------
// GET /api/observation/:id
// ---------------------------------------------------------------------

async fn get_observation(
    State(state): State<AppState>,
    axum::extract::Path(id): axum::extract::Path<i64>,
) -> Result<Json<turnmem_store::Observation>, ServerError> {
    state
        .store
        .get_observation(id)?
        .map(Json)
        .ok_or(ServerError::NotFound)
}

// ---------------------------------------------------------------------
// GET /api/observations
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct PageQuery {
    project: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

const DEFAULT_PAGE_LIMIT: i64 = 50;

#[derive(Serialize)]
struct ObservationsPage {
    observations: Vec<turnmem_store::Observation>,
    total: i64,
    #[serde(rename = "hasMore")]
    has_more: bool,
}

async fn list_observations_route(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ObservationsPage>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let (observations, total) = state
        .store
        .list_observations(query.project.as_deref(), limit, offset)?;
    let has_more = offset + (observations.len() as i64) < total;
    Ok(Json(ObservationsPage {
        observations,
        total,
        has_more,
    }))
}

// ---------------------------------------------------------------------
// GET /api/search
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct SearchQuery {
    q: Option<String>,
    project: Option<String>,
    limit: Option<i64>,
    offset: Option<i64>,
}

#[derive(Serialize)]
struct SearchPage {
    results: Vec<turnmem_store::Observation>,
    total: i64,
    #[serde(rename = "hasMore")]
    has_more: bool,
}

/// FTS has no native offset/total: over-fetch `offset + limit + 1` rows,
/// slice out the requested page, and treat the over-fetched count as an
/// approximate total capped at that fetch size (documented tradeoff, see
/// DESIGN.md).
async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchPage>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let q = query.q.unwrap_or_default();

    let fetch_cap = offset + limit + 1;
    let rows = turnmem_search::search_keyword(&state.store, &q, query.project.as_deref(), fetch_cap)?;
    let total = rows.len() as i64;
    let has_more = total > offset + limit;
    let results = rows
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();

    Ok(Json(SearchPage { results, total, has_more }))
}

// ---------------------------------------------------------------------
// GET /api/sessions
// ---------------------------------------------------------------------

#[derive(Serialize)]
struct SessionsResponse {
    sessions: Vec<turnmem_store::Session>,
}

async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<SessionsResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let offset = query.offset.unwrap_or(0);
    let sessions = state.store.list_sessions(query.project.as_deref(), limit, offset)?;
    Ok(Json(SessionsResponse { sessions }))
}

// ---------------------------------------------------------------------
// POST /api/sessions/init
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct InitSessionBody {
    session_id: String,
    project: String,
    #[serde(rename = "userPrompt")]
    user_prompt: String,
    #[serde(rename = "promptNumber")]
    prompt_number: Option<i64>,
}

#[derive(Serialize)]
struct InitSessionResponse {
    success: bool,
    session_id: String,
    db_id: i64,
}

async fn init_session(
    State(state): State<AppState>,
    Json(body): Json<InitSessionBody>,
) -> Result<Json<InitSessionResponse>, ServerError> {
    if body.session_id.len() < 8 || body.session_id.len() > 128 {
        return Err(ServerError::Validation {
            message: "session_id must be 8-128 characters".to_string(),
        });
    }
    if !body
        .session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ServerError::Validation {
            message: "session_id must be alphanumeric, '_', or '-'".to_string(),
        });
    }
    let scrubbed_prompt = scrub_text(&body.user_prompt)?;
    let session = state.store.create_session(&body.session_id, &body.project)?;
    if session.first_prompt.is_none() {
        state.store.set_first_prompt(session.id, &scrubbed_prompt)?;
    }

    let prompt_number = match body.prompt_number {
        Some(n) => n,
        None => state.store.increment_prompt_counter(session.id)?,
    };
    let prompt = state
        .store
        .insert_user_prompt(session.id, prompt_number, &scrubbed_prompt)?;
    state
        .sse
        .broadcast_user_prompt_created(prompt.id, session.id, &session.project, prompt_number);

    Ok(Json(InitSessionResponse {
        success: true,
        session_id: body.session_id,
        db_id: session.id,
    }))
}

// ---------------------------------------------------------------------
// POST /api/sessions/summarize
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct SummarizeBody {
    session_id: String,
    last_user_message: Option<String>,
    last_assistant_message: Option<String>,
}

#[derive(Serialize)]
struct SummarizeResponse {
    success: bool,
    #[serde(rename = "summary_queued")]
    summary_queued: bool,
}

async fn summarize_session(
    State(state): State<AppState>,
    Json(body): Json<SummarizeBody>,
) -> Result<Json<SummarizeResponse>, ServerError> {
    let session = state
        .store
        .get_session_by_key(&body.session_id)?
        .ok_or(ServerError::NotFound)?;

    state
        .store
        .update_session_status(session.id, turnmem_store::SessionStatus::Summarizing)?;

    let last_user = body
        .last_user_message
        .as_deref()
        .map(scrub_text)
        .transpose()?;
    let last_assistant = body
        .last_assistant_message
        .as_deref()
        .map(scrub_text)
        .transpose()?;

    state
        .queue
        .enqueue_summary(session.id, last_user.as_deref(), last_assistant.as_deref())?;

    Ok(Json(SummarizeResponse {
        success: true,
        summary_queued: true,
    }))
}

// ---------------------------------------------------------------------
// POST /api/sessions/complete
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct CompleteSessionBody {
    session_id: String,
    #[serde(default)]
    #[allow(dead_code)]
    reason: Option<String>,
}

#[derive(Serialize)]
struct CompleteSessionResponse {
    success: bool,
    completed: bool,
}

async fn complete_session(
    State(state): State<AppState>,
    Json(body): Json<CompleteSessionBody>,
) -> Result<Json<CompleteSessionResponse>, ServerError> {
    let session = state
        .store
        .get_session_by_key(&body.session_id)?
        .ok_or(ServerError::NotFound)?;
    state
        .store
        .update_session_status(session.id, turnmem_store::SessionStatus::Completed)?;
    Ok(Json(CompleteSessionResponse {
        success: true,
        completed: true,
    }))
}

// ---------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------

#[derive(Deserialize)]
struct StatsQuery {
    project: Option<String>,
}

#[derive(Serialize)]
struct StatsResponse {
    stats: turnmem_store::ProjectStats,
    project: Option<String>,
}

async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsResponse>, ServerError> {
    let stats = state.store.stats(query.project.as_deref())?;
    Ok(Json(StatsResponse {
        stats,
        project: query.project,
    }))
}

// ---------------------------------------------------------------------
// GET /api/queue, POST /api/queue/recover
// ---------------------------------------------------------------------

async fn queue_status(
    State(state): State<AppState>,
) -> Result<Json<turnmem_store::QueueCounts>, ServerError> {
    Ok(Json(state.store.queue_counts()?))
}

#[derive(Deserialize, Default)]
struct RecoverQueueBody {
    #[serde(rename = "sessionId")]
    #[allow(dead_code)]
    session_id: Option<i64>,
}

#[derive(Serialize)]
struct RecoverQueueResponse {
    success: bool,
    recovered: bool,
}

async fn recover_queue(
    State(state): State<AppState>,
    Json(body): Json<RecoverQueueBody>,
) -> Result<Json<RecoverQueueResponse>, ServerError> {
    let _ = body;
    state.queue.recover_stuck()?;
    Ok(Json(RecoverQueueResponse {
        success: true,
        recovered: true,
    }))
}

// ---------------------------------------------------------------------
// GET /stream
// ---------------------------------------------------------------------

/// Frames are already fully wire-formatted by `turnmem_sse::format_frame`
/// (id/event/data lines plus the terminating blank line), so this streams
/// them straight into the body instead of re-wrapping them through axum's
/// own `Event` builder, which would double-frame the payload.
async fn stream(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<std::net::SocketAddr>,
) -> Result<Response, ServerError> {
    let (_client_id, rx) = state.sse.add_client(&addr.ip().to_string())?;
    let frames = UnboundedReceiverStream::new(rx).map(|frame| Ok::<_, Infallible>(frame));
    let mut response = Response::new(Body::from_stream(frames));
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}
