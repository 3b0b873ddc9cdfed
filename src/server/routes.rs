//! Route table and handlers
//!
//! Handlers only frame requests and responses; all behaviour lives in the gateway.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use log::debug;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::config::{ConfigUpdate, EffectiveConfig};
use crate::error::{GatewayError, GatewayResult};
use crate::gateway::Gateway;
use crate::gateway::requests::{
    BatchSaveRequest, CacheAssetRequest, DeleteBatchRequest, DeleteRequest, SaveRequest,
    ThumbnailRequest,
};
use crate::gateway::results::{
    BatchResult, CacheAssetResult, ConfigSnapshot, DeleteResult, Envelope, FileListing,
    SaveResult, StatusReport, ThumbnailResult,
};
use crate::middleware::{cors_layer, log_request};

type JsonBody<T> = Result<Json<T>, JsonRejection>;
type Reply<T> = GatewayResult<Json<Envelope<T>>>;

pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/ping", get(status))
        .route("/status", get(status))
        .route("/config", get(get_config).post(update_config))
        .route("/list-files", get(list_files))
        .route("/file/{*path}", get(fetch_file).head(file_metadata))
        .route("/save", post(save))
        .route("/save-batch", post(save_batch))
        .route("/save-thumbnail", post(save_thumbnail))
        .route("/save-cache", post(save_cache))
        .route("/delete-file", post(delete_file))
        .route("/delete-batch", post(delete_batch))
        .fallback(unknown_route)
        .layer(middleware::from_fn(log_request))
        .layer(cors_layer())
        .with_state(gateway)
}

/// Unwrap a JSON body, turning malformed input into `InvalidRequest`
fn parse<T: DeserializeOwned>(body: JsonBody<T>) -> Result<T, GatewayError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| GatewayError::InvalidRequest(rejection.body_text()))
}

fn reply<T: serde::Serialize>(body: T) -> Json<Envelope<T>> {
    Json(Envelope::ok(body))
}

async fn status(State(gateway): State<Gateway>) -> Json<StatusReport> {
    Json(gateway.status().await)
}

async fn get_config(State(gateway): State<Gateway>) -> Json<EffectiveConfig> {
    Json(gateway.get_config().await)
}

async fn update_config(
    State(gateway): State<Gateway>,
    body: JsonBody<ConfigUpdate>,
) -> Reply<ConfigSnapshot> {
    let update = parse(body)?;
    let config = gateway.update_config(update).await;
    Ok(reply(ConfigSnapshot { config }))
}

async fn list_files(State(gateway): State<Gateway>) -> Reply<FileListing> {
    Ok(reply(gateway.list_files().await?))
}

async fn fetch_file(
    State(gateway): State<Gateway>,
    Path(path): Path<String>,
) -> GatewayResult<Response> {
    let asset = gateway.fetch_asset(path).await?;
    debug!("Serving {} ({} bytes)", asset.path, asset.bytes.len());
    Ok(([(header::CONTENT_TYPE, asset.content_type)], asset.bytes).into_response())
}

async fn file_metadata(
    State(gateway): State<Gateway>,
    Path(path): Path<String>,
) -> GatewayResult<Response> {
    let metadata = gateway.asset_metadata(path).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, metadata.content_type.to_string()),
            (header::CONTENT_LENGTH, metadata.size.to_string()),
        ],
    )
        .into_response())
}

async fn save(State(gateway): State<Gateway>, body: JsonBody<SaveRequest>) -> Reply<SaveResult> {
    Ok(reply(gateway.save(parse(body)?).await?))
}

async fn save_batch(
    State(gateway): State<Gateway>,
    body: JsonBody<BatchSaveRequest>,
) -> Reply<BatchResult> {
    Ok(reply(gateway.batch_save(parse(body)?).await?))
}

async fn save_thumbnail(
    State(gateway): State<Gateway>,
    body: JsonBody<ThumbnailRequest>,
) -> Reply<ThumbnailResult> {
    Ok(reply(gateway.save_thumbnail(parse(body)?).await?))
}

async fn save_cache(
    State(gateway): State<Gateway>,
    body: JsonBody<CacheAssetRequest>,
) -> Reply<CacheAssetResult> {
    Ok(reply(gateway.save_cache_asset(parse(body)?).await?))
}

async fn delete_file(
    State(gateway): State<Gateway>,
    body: JsonBody<DeleteRequest>,
) -> Reply<DeleteResult> {
    Ok(reply(gateway.delete_file(parse(body)?).await?))
}

async fn delete_batch(
    State(gateway): State<Gateway>,
    body: JsonBody<DeleteBatchRequest>,
) -> Reply<BatchResult> {
    Ok(reply(gateway.delete_batch(parse(body)?).await?))
}

async fn unknown_route() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "success": false, "error": "NotFound: unknown endpoint" })),
    )
}
