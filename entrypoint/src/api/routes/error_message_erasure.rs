use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use image_cache::ImageCacheError;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error(transparent)]
    QueryExtractorRejection(#[from] QueryRejection),
    #[error(transparent)]
    JsonExtractorRejection(#[from] JsonRejection),
    #[error(transparent)]
    Encode(#[from] ImageCacheError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::QueryExtractorRejection(rejection) => (rejection.status(), rejection.body_text()),
            Self::JsonExtractorRejection(rejection) => (rejection.status(), rejection.body_text()),
            // pipeline failures go back to the caller as plain text
            Self::Encode(err) => {
                warn!("Encode failed: {}", err);

                return (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response();
            }
        };

        debug!("Failed to parse incoming request: {}, {}", status, message);

        StatusCode::BAD_REQUEST.into_response()
    }
}
