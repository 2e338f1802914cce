//! Serves the front-end from a single root directory.

use crate::api::error::ApiError;
use actix_web::{HttpRequest, HttpResponse, web};
use std::path::{Path, PathBuf};
use std::{fs, io};
use tracing::error;

pub struct StaticRoot {
    root: PathBuf,
}

impl StaticRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps an already percent-decoded request path onto the root.
    /// `..`, backslashes and NUL bytes are rejected rather than normalised.
    pub fn resolve(&self, request_path: &str) -> Result<PathBuf, ApiError> {
        let mut resolved = self.root.clone();
        let mut segments = 0;

        for segment in request_path.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(malformed()),
                s if s.contains(['\\', '\0']) => return Err(malformed()),
                s => {
                    resolved.push(s);
                    segments += 1;
                }
            }
        }

        if segments == 0 {
            resolved.push("index.html");
        }
        Ok(resolved)
    }
}

fn malformed() -> ApiError {
    ApiError::BadRequest("Malformed path".to_string())
}

/// Decodes whatever percent escapes the router left in place. A `%` without
/// two hex digits, or bytes the router already replaced with U+FFFD, mean the
/// request path was not valid percent-encoded UTF-8.
pub fn decode_tail(tail: &str) -> Result<String, ApiError> {
    if tail.contains('\u{FFFD}') {
        return Err(malformed());
    }

    let bytes = tail.as_bytes();
    for (i, _) in tail.match_indices('%') {
        let escape = bytes.get(i + 1..i + 3);
        if !escape.is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit)) {
            return Err(malformed());
        }
    }

    urlencoding::decode(tail)
        .map(|decoded| decoded.into_owned())
        .map_err(|_| malformed())
}

pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json; charset=utf-8",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// `None` when there is nothing servable at `path`.
fn read_file(path: &Path) -> io::Result<Option<Vec<u8>>> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => fs::read(path).map(Some),
        Ok(_) => Ok(None),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// GET handler for everything outside `/api`. Missing files fall through to
/// the JSON 404.
pub async fn serve(req: HttpRequest, root: web::Data<StaticRoot>) -> Result<HttpResponse, ApiError> {
    let tail = req.match_info().query("tail");
    if tail == "api" || tail.starts_with("api/") {
        return Err(ApiError::NotFound);
    }

    let path = root.resolve(&decode_tail(tail)?)?;
    let content_type = content_type_for(&path);

    let lookup_path = path.clone();
    let contents = web::block(move || read_file(&lookup_path))
        .await
        .map_err(|e| {
            error!(error = %e, "Static file worker failed");
            ApiError::Internal
        })?
        .map_err(|e| {
            error!(error = %e, path = %path.display(), "Failed to read static file");
            ApiError::Internal
        })?;

    match contents {
        Some(bytes) => Ok(HttpResponse::Ok().content_type(content_type).body(bytes)),
        None => Err(ApiError::NotFound),
    }
}
