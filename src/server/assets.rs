//! Frontend, image and backup handlers.

use axum::{
    body::Body,
    extract::{Multipart, Path, Request, State},
    http::{header, Uri},
    response::{Html, IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use tokio_util::io::ReaderStream;
use tower::ServiceExt;
use tower_http::services::ServeDir;

use super::{error::ApiError, AppState};
use crate::backup::{self, ArchiveReader};
use crate::images::ImageError;
use crate::ingress::inject_base_path;

/// Serve `index.html` with the ingress base path injected
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let path = state.www_dir.join("index.html");
    let html = tokio::fs::read_to_string(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::NotFound("index.html".to_string())
        } else {
            ApiError::Internal(format!("Failed to read {}: {}", path.display(), e))
        }
    })?;
    Ok(Html(inject_base_path(&html, &state.base_path)))
}

/// Serve static frontend assets below the base path.
///
/// Used as the router fallback: the base path is stripped and the rest is
/// resolved inside the www directory.
pub async fn static_file(State(state): State<AppState>, request: Request) -> Response {
    let path = request.uri().path().to_string();
    let Some(rest) = state.base_path.strip(&path) else {
        return ApiError::NotFound(path).into_response();
    };
    let Ok(uri) = format!("/{}", rest).parse::<Uri>() else {
        return ApiError::NotFound(path).into_response();
    };

    let (mut parts, body) = request.into_parts();
    parts.uri = uri;
    let request = Request::from_parts(parts, body);

    let files = ServeDir::new(&state.www_dir).append_index_html_on_directories(false);
    match files.oneshot(request).await {
        Ok(response) => response.map(Body::new),
        Err(never) => match never {},
    }
}

#[derive(Serialize)]
pub struct UploadResponse {
    success: bool,
    filename: String,
}

/// Accept a single image from the `file` field of a multipart form
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let raw_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await?;
        let filename = state.images.save(&raw_name, &bytes).await?;
        return Ok(Json(UploadResponse {
            success: true,
            filename,
        }));
    }
    Err(ImageError::MissingFile.into())
}

/// Serve a previously uploaded image
pub async fn image(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    match state.images.read(&filename).await? {
        Some((bytes, content_type)) => {
            Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
        }
        None => Err(ApiError::NotFound(format!("Image '{}'", filename))),
    }
}

/// Stream a zip of the data file and all images
pub async fn backup(State(state): State<AppState>) -> Result<Response, ApiError> {
    let data_file = state.collections.store().path().to_path_buf();
    let image_dir = state.images.dir().to_path_buf();

    let reader = tokio::task::spawn_blocking(move || {
        backup::archive(&data_file, &image_dir).and_then(ArchiveReader::new)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Backup task failed: {}", e)))??;

    let filename = backup::archive_file_name(Utc::now());
    tracing::info!("Sending backup {} ({} bytes)", filename, reader.size());

    Ok((
        [
            (header::CONTENT_TYPE, "application/zip".to_string()),
            (header::CONTENT_LENGTH, reader.size().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response())
}
