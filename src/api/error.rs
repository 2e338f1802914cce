//! JSON error responses. Every body carries an `error` field and, except for
//! 404s, a human-readable `message`.

use crate::db::store::StoreError;
use actix_web::{HttpRequest, HttpResponse, ResponseError, error::JsonPayloadError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

#[derive(Debug, Display)]
pub enum ApiError {
    /// Invalid request input; the message doubles as the `error` field.
    #[display(fmt = "{}", _0)]
    Validation(String),

    #[display(fmt = "{}", _0)]
    BadRequest(String),

    #[display(fmt = "{}: {}", context, source)]
    Store {
        context: &'static str,
        source: StoreError,
    },

    #[display(fmt = "Not Found")]
    NotFound,

    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn store(context: &'static str, source: StoreError) -> Self {
        ApiError::Store { context, source }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Store { .. } | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::Validation(message) => json!({ "error": message, "message": message }),
            ApiError::BadRequest(message) => json!({ "error": "Bad Request", "message": message }),
            ApiError::Store { context, source } => {
                json!({ "error": context, "message": source.to_string() })
            }
            ApiError::NotFound => json!({ "error": "Not Found" }),
            ApiError::Internal => {
                json!({ "error": "Internal Server Error", "message": "Internal Server Error" })
            }
        };

        HttpResponse::build(self.status_code()).json(body)
    }
}

/// `JsonConfig` error handler: malformed bodies become 400 JSON.
pub fn json_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::BadRequest(err.to_string()).into()
}

pub async fn not_found() -> HttpResponse {
    ApiError::NotFound.error_response()
}
