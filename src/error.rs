use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use serde::Serialize;
use thiserror::Error;

use crate::aggregate::AggregateError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Error processing comments")]
    Comments,

    #[error("Error processing likes")]
    Likes,

    #[error("Internal server error")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error")]
    Io(#[from] std::io::Error),

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<AggregateError> for ApiError {
    fn from(value: AggregateError) -> Self {
        match value {
            AggregateError::Comments { .. } => Self::Comments,
            AggregateError::Likes { .. } => Self::Likes,
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Comments
            | ApiError::Likes
            | ApiError::Database(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Database(x) => error!("database error: {x:?}"),
            ApiError::Io(x) => error!("io error: {x:?}"),
            ApiError::Internal(x) => error!("internal error: {x}"),
            _ => {}
        }

        let msg = self.to_string();

        HttpResponse::build(self.status_code()).json(ErrorResponse { error: &msg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::not_found("x").status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::from(sqlx::Error::PoolTimedOut).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn aggregate_errors_keep_their_domain() {
        let comments: ApiError = AggregateError::Comments { failed: 2 }.into();
        let likes: ApiError = AggregateError::Likes { failed: 1 }.into();

        assert_eq!(comments.to_string(), "Error processing comments");
        assert_eq!(likes.to_string(), "Error processing likes");
    }

    #[test]
    fn internal_details_are_not_leaked() {
        let err = ApiError::from(sqlx::Error::Protocol("secret detail".into()));
        assert_eq!(err.to_string(), "Internal server error");
    }
}
