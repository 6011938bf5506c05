use std::sync::Arc;

use crate::{ServerState, routes::error_message_erasure::ApiError};

use axum::debug_handler;
use axum::extract::Query;
use axum::{Json, extract::State, http::StatusCode};
use axum_extra::extract::WithRejection;
use common::image_cache::{EncodeOptions, EncodeQuery};
use tracing::debug;

#[debug_handler]
pub(crate) async fn encode_handler(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(query), _): WithRejection<Query<EncodeQuery>, ApiError>,
) -> Result<String, ApiError> {
    debug!("{:?}", query);

    let payload = state
        .image_cache
        .encode(&query.source, query.options())
        .await?;

    Ok(payload)
}

// individual failures only show up in the logs, the caller always gets a 200
#[debug_handler]
pub(crate) async fn batch_handler(
    State(state): State<Arc<ServerState>>,
    WithRejection(Query(options), _): WithRejection<Query<EncodeOptions>, ApiError>,
    WithRejection(Json(sources), _): WithRejection<Json<Vec<String>>, ApiError>,
) -> Result<StatusCode, ApiError> {
    debug!("Batch of {} with {:?}", sources.len(), options);

    state.image_cache.encode_batch(&sources, options).await;

    Ok(StatusCode::OK)
}
