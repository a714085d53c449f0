use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::ingest::SyncSummary;
use crate::model::{EndpointDetails, EndpointFilter, Endpoint, Schema, Version};
use crate::server::AppState;
use crate::storage::StoreStats;

#[derive(Deserialize)]
pub struct EndpointParams {
    pub version: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
    pub tag: Option<String>,
}

#[derive(Deserialize, Default)]
pub struct SyncRequest {
    pub url: Option<String>,
    pub version: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub version: String,
    pub deleted: bool,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

impl From<crate::Error> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: crate::Error) -> Self {
        let status = match &err {
            crate::Error::Fetch { .. } | crate::Error::Normalize(_) => StatusCode::BAD_GATEWAY,
            crate::Error::InvalidMethod(_) | crate::Error::InvalidArgument(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() && status != StatusCode::BAD_GATEWAY {
            tracing::error!("Request failed: {}", err);
        }
        api_error(status, err.to_string())
    }
}

pub async fn list_versions(State(state): State<Arc<AppState>>) -> ApiResult<Vec<Version>> {
    Ok(Json(state.store().list_versions()?))
}

pub async fn list_endpoints(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EndpointParams>,
) -> ApiResult<Vec<Endpoint>> {
    let filter = EndpointFilter::from_parts(
        params.version,
        params.path,
        params.method.as_deref(),
        params.tag,
    )?;
    Ok(Json(state.store().list_endpoints(&filter)?))
}

pub async fn get_endpoint(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<EndpointDetails> {
    state
        .store()
        .get_endpoint_details(id)?
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("endpoint {} not found", id)))
}

pub async fn get_schema(
    State(state): State<Arc<AppState>>,
    Path((version, name)): Path<(String, String)>,
) -> ApiResult<Schema> {
    state.store().get_schema(&version, &name)?.map(Json).ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            format!("schema '{}' not found in version {}", name, version),
        )
    })
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> ApiResult<StoreStats> {
    Ok(Json(state.store().stats()?))
}

pub async fn sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SyncRequest>,
) -> ApiResult<SyncSummary> {
    let url = request
        .url
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| state.default_url.clone());
    let summary = state
        .ingestor
        .sync(&url, request.version.as_deref())
        .await?;
    Ok(Json(summary))
}

pub async fn delete_version(
    State(state): State<Arc<AppState>>,
    Path(version): Path<String>,
) -> ApiResult<DeleteResponse> {
    if state.store().delete_version(&version)? {
        Ok(Json(DeleteResponse { version, deleted: true }))
    } else {
        Err(api_error(
            StatusCode::NOT_FOUND,
            format!("version {} not found", version),
        ))
    }
}
