//! Crate-wide error type.
//!
//! Storage, configuration and the completion transport all report through
//! [`Error`]. The generation client never lets these escape (it substitutes
//! a fallback article); the store lets write errors propagate and wraps read
//! errors in [`crate::store::Lookup`].

use std::io;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),

    #[error(transparent)]
    Url(#[from] url::ParseError),

    #[error("completion service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("completion service returned no content")]
    EmptyCompletion,

    #[error("unknown category `{0}`")]
    UnknownCategory(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::UnknownCategory(_) => StatusCode::NOT_FOUND,
            Error::Json(_) | Error::Yaml(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Reqwest(_) | Error::Upstream { .. } | Error::EmptyCompletion => {
                StatusCode::BAD_GATEWAY
            }
            Error::Io(e) => {
                tracing::error!(%e, "file io error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Error::Url(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (
            status,
            Json(json!({
                "success": false,
                "error": self.to_string(),
            })),
        )
            .into_response()
    }
}
