use crate::api::error::ApiError;
use actix_cors::Cors;
use actix_web::middleware::Next;
use actix_web::{
    Error,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use tracing::error;

/// Any origin, method and header; `*` is sent as the allowed origin.
pub fn cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .send_wildcard()
        .allow_any_method()
        .allow_any_header()
}

/// Turns a panicking handler into a 500 instead of losing the worker.
pub async fn catch_panic(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let method = req.method().clone();
    let path = req.path().to_owned();

    match AssertUnwindSafe(async move { next.call(req).await })
        .catch_unwind()
        .await
    {
        Ok(res) => res,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());

            error!(panic = %detail, method = %method, path = %path, "Request handler panicked");
            Err(ApiError::Internal.into())
        }
    }
}
