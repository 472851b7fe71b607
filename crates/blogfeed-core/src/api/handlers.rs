use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderMap},
    Json,
};
use serde_json::{json, Value};

use super::error::{ApiError, ApiResult};
use super::models::{IngestQuery, LogsQuery};
use super::server::AppState;
use crate::feed::FeedSource;
use crate::ingest::{process_feeds, BatchResult};
use crate::scheduler::TaskLog;
use crate::storage::{ApiKey, ApiKeyRepository, TaskLogRepository};
use crate::Error;

const DEFAULT_LOG_LIMIT: u32 = 50;
const MAX_LOG_LIMIT: u32 = 500;

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

async fn authorize(state: &AppState, headers: &HeaderMap) -> ApiResult<ApiKey> {
    let token = bearer_token(headers).ok_or(Error::Unauthorized)?;
    let key = ApiKeyRepository::new(&state.db).authenticate(token).await?;
    Ok(key)
}

/// GET /api/health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Sources posted to the ingest endpoint. An empty body means none.
fn parse_sources(body: &[u8]) -> ApiResult<Vec<FeedSource>> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    serde_json::from_slice(body)
        .map_err(|e| ApiError::BadRequest(format!("expected a JSON array of sources: {}", e)))
}

fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(q)| q)
        .map_err(|e| ApiError::BadRequest(e.body_text()))
}

/// POST /api/ingest
///
/// Runs one batch over the posted sources, or the configured ones when the
/// array is empty. The key is checked before the query or body is looked at.
pub async fn ingest_feeds(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<IngestQuery>, QueryRejection>,
    body: Bytes,
) -> ApiResult<Json<BatchResult>> {
    let key = authorize(&state, &headers).await?;
    let query = query_params(query)?;
    let sources = parse_sources(&body)?;

    let limit = query.limit.unwrap_or(state.default_limit);
    if limit == 0 {
        return Err(ApiError::BadRequest("limit must be at least 1".to_string()));
    }

    let sources = if sources.is_empty() {
        state.sources.as_ref().clone()
    } else {
        sources
    };

    tracing::info!(
        "Ingest triggered by API key '{}' for {} sources",
        key.name,
        sources.len()
    );

    let result = process_feeds(state.fetcher.as_ref(), &state.db, &sources, limit).await;
    Ok(Json(result))
}

/// GET /api/task-logs
pub async fn list_task_logs(
    State(state): State<AppState>,
    headers: HeaderMap,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<TaskLog>>> {
    authorize(&state, &headers).await?;
    let query = query_params(query)?;

    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let logs = TaskLogRepository::new(&state.db)
        .list_recent(limit, query.task_name.as_deref())
        .await?;

    Ok(Json(logs))
}
