//! File handlers.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
    Json,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::file::{FileKind, UploadRequest};
use crate::web::dto::{CreateFileRequest, FileResponse, ListFilesQuery, ValidatedJson};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;
use crate::web::middleware::{AuthUser, OptionalAuthUser};

/// Build a safe inline Content-Disposition header value.
///
/// Control characters, quotes and backslashes are stripped from the plain
/// `filename` parameter; non-ASCII names are also sent RFC 5987 encoded.
fn content_disposition_header(filename: &str) -> String {
    let sanitized: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '"' | '\\' => '_',
            _ => c,
        })
        .collect();

    if filename.is_ascii() && sanitized == filename {
        return format!("inline; filename=\"{filename}\"");
    }

    format!(
        "inline; filename=\"{}\"; filename*=UTF-8''{}",
        sanitized,
        urlencoding::encode(filename)
    )
}

/// POST /files - Create a folder or upload a file.
pub async fn post_upload(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    ValidatedJson(req): ValidatedJson<CreateFileRequest>,
) -> Result<(StatusCode, Json<FileResponse>), ApiError> {
    let data = match req.data.as_deref() {
        Some(encoded) => Some(
            STANDARD
                .decode(encoded.trim())
                .map_err(|_| ApiError::bad_request("Invalid data"))?,
        ),
        None => None,
    };

    let upload = UploadRequest {
        name: req.name.clone().unwrap_or_default(),
        kind: req.kind.as_deref().and_then(|k| k.parse::<FileKind>().ok()),
        parent_id: req.parent(),
        is_public: req.is_public.unwrap_or(false),
        data,
    };

    let file = state.files.create(&user_id, &upload).await?;
    Ok((StatusCode::CREATED, Json(file.into())))
}

/// GET /files - List the caller's files in a folder, 20 per page.
pub async fn get_index(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<Vec<FileResponse>>, ApiError> {
    let parent = query.parent();
    let files = state
        .files
        .list(&user_id, parent.as_deref(), query.page())
        .await?;

    Ok(Json(files.into_iter().map(FileResponse::from).collect()))
}

/// GET /files/:id - A file owned by the caller or public.
pub async fn get_show(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let file = state.files.get(&id, Some(&user_id)).await?;
    Ok(Json(file.into()))
}

/// PUT /files/:id/publish - Make a file public.
pub async fn put_publish(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let file = state.files.set_visibility(&id, &user_id, true).await?;
    Ok(Json(file.into()))
}

/// PUT /files/:id/unpublish - Make a file private.
pub async fn put_unpublish(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<FileResponse>, ApiError> {
    let file = state.files.set_visibility(&id, &user_id, false).await?;
    Ok(Json(file.into()))
}

/// GET /files/:id/data - File content.
///
/// Public files are served to anyone; private files only to their owner.
pub async fn get_file_data(
    State(state): State<Arc<AppState>>,
    OptionalAuthUser(user_id): OptionalAuthUser,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let download = state.files.read_content(&id, user_id.as_deref()).await?;

    let content_type = mime_guess::from_path(&download.file.name)
        .first_or_octet_stream()
        .to_string();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_header(&download.file.name),
        )
        .header(header::CONTENT_LENGTH, download.content.len())
        .body(Body::from(download.content))
        .map_err(|e| {
            tracing::error!("Failed to build download response: {}", e);
            ApiError::internal("Failed to build response")
        })
}
