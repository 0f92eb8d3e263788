use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::record::AlertTagRecord;
use crate::server::AppState;
use crate::storage::{TagStats, TagStore};

#[derive(Deserialize)]
pub struct TagValue {
    pub value: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct DeletedResponse {
    pub deleted: usize,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ready: bool,
    pub database: String,
}

/// Handler error carrying the HTTP status it maps to
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn not_found(what: String) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: format!("{} not found", what) }
    }
}

impl From<crate::Error> for ApiError {
    fn from(err: crate::Error) -> Self {
        let status = match err {
            crate::Error::Schema(_) => StatusCode::SERVICE_UNAVAILABLE,
            crate::Error::Store(_) | crate::Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self { status, message: err.to_string() }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: err.to_string() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{}", self.message);
        }
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Run a store call on the blocking pool
async fn with_store<T, F>(state: &AppState, f: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&TagStore) -> crate::Result<T> + Send + 'static,
{
    let store = state.store.clone();
    Ok(tokio::task::spawn_blocking(move || f(&store)).await??)
}

pub async fn health(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let (ready, database) =
        with_store(&state, |store| Ok((store.is_ready(), store.target().to_string()))).await?;
    Ok(Json(HealthResponse { status: "ok", ready, database }))
}

pub async fn get_stats(State(state): State<AppState>) -> ApiResult<Json<TagStats>> {
    Ok(Json(with_store(&state, |store| store.stats()).await?))
}

pub async fn get_distinct_tags(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    Ok(Json(with_store(&state, |store| store.all_distinct_tags()).await?))
}

pub async fn get_all_records(State(state): State<AppState>) -> ApiResult<Json<Vec<AlertTagRecord>>> {
    Ok(Json(with_store(&state, |store| store.all_records()).await?))
}

pub async fn delete_all_tags(State(state): State<AppState>) -> ApiResult<Json<DeletedResponse>> {
    let deleted = with_store(&state, |store| store.delete_all_tags()).await?;
    Ok(Json(DeletedResponse { deleted }))
}

pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<i64>,
) -> ApiResult<Json<AlertTagRecord>> {
    with_store(&state, move |store| store.read_by_tag_id(tag_id))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("tag {}", tag_id)))
}

pub async fn delete_tag(State(state): State<AppState>, Path(tag_id): Path<i64>) -> ApiResult<StatusCode> {
    with_store(&state, move |store| store.delete_by_tag_id(tag_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_alert_tags(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    Ok(Json(with_store(&state, move |store| store.tags_for_alert(alert_id)).await?))
}

pub async fn delete_alert_tags(
    State(state): State<AppState>,
    Path(alert_id): Path<i64>,
) -> ApiResult<StatusCode> {
    with_store(&state, move |store| store.delete_all_for_alert(alert_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_alert_tag(
    State(state): State<AppState>,
    Path((alert_id, key)): Path<(i64, String)>,
) -> ApiResult<Json<AlertTagRecord>> {
    let label = format!("tag {} on alert {}", key, alert_id);
    with_store(&state, move |store| store.read_by_alert_and_key(alert_id, &key))
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(label))
}

pub async fn put_alert_tag(
    State(state): State<AppState>,
    Path((alert_id, key)): Path<(i64, String)>,
    Json(body): Json<TagValue>,
) -> ApiResult<Json<AlertTagRecord>> {
    Ok(Json(
        with_store(&state, move |store| store.upsert(alert_id, &key, &body.value)).await?,
    ))
}

pub async fn delete_alert_tag(
    State(state): State<AppState>,
    Path((alert_id, key)): Path<(i64, String)>,
) -> ApiResult<StatusCode> {
    with_store(&state, move |store| store.delete_by_alert_and_key(alert_id, &key)).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn reconnect(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let database = with_store(&state, |store| {
        store.reconnect()?;
        Ok(store.target().to_string())
    })
    .await?;
    tracing::info!("Tag store reconnected to {} via API", database);
    Ok(Json(HealthResponse { status: "ok", ready: true, database }))
}
