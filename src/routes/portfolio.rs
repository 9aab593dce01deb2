//! Portfolio routes
//!
//! Multipart uploads are read fully into memory; the request body limit
//! bounds how much that can be.

use axum::{
    extract::{multipart::Field, multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{Created, DataResponse, NoContent};
use crate::app::AppState;
use crate::auth::RequireAuth;
use crate::domain::portfolio::{NewPortfolioImage, ReorderPortfolioRequest};
use crate::error::ApiError;
use crate::services::UploadFile;

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::FileSize("Upload exceeds the maximum request size".into())
    } else {
        ApiError::bad_request(format!("Invalid multipart body: {}", e.body_text()))
    }
}

async fn read_file(field: Field<'_>) -> Result<UploadFile, ApiError> {
    let file_name = field.file_name().map(str::to_string);
    let content_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let data = field.bytes().await.map_err(multipart_error)?;

    Ok(UploadFile {
        file_name,
        content_type,
        data,
    })
}

async fn read_text(field: Field<'_>) -> Result<String, ApiError> {
    field.text().await.map_err(multipart_error)
}

/// The `file` part of a single-image upload
pub async fn read_single_file(mut multipart: Multipart) -> Result<UploadFile, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            return read_file(field).await;
        }
    }
    Err(ApiError::bad_request("No file found in upload"))
}

/// Files and their metadata from a portfolio upload.
///
/// Each `files` part may be accompanied by `alt_text` and `sort_order`
/// parts; metadata parts pair with files by position.
async fn read_portfolio_upload(
    mut multipart: Multipart,
) -> Result<Vec<(UploadFile, NewPortfolioImage)>, ApiError> {
    let mut files = Vec::new();
    let mut alt_texts = Vec::new();
    let mut sort_orders = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some("files") | Some("file") => files.push(read_file(field).await?),
            Some("alt_text") => alt_texts.push(read_text(field).await?),
            Some("sort_order") => {
                let raw = read_text(field).await?;
                let value = raw
                    .trim()
                    .parse::<i32>()
                    .map_err(|_| ApiError::bad_request(format!("Invalid sort_order '{}'", raw)))?;
                sort_orders.push(value);
            }
            _ => {}
        }
    }

    let mut alt_texts = alt_texts.into_iter();
    let mut sort_orders = sort_orders.into_iter();
    Ok(files
        .into_iter()
        .map(|file| {
            let meta = NewPortfolioImage {
                alt_text: alt_texts.next().filter(|s| !s.trim().is_empty()),
                sort_order: sort_orders.next(),
            };
            (file, meta)
        })
        .collect())
}

/// POST /profiles/me/portfolio
pub async fn upload_portfolio_images(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let files = read_portfolio_upload(multipart).await?;
    for (file, _) in &files {
        tracing::debug!(
            user_id = %auth.user_id,
            file_name = file.file_name.as_deref().unwrap_or("-"),
            bytes = file.data.len(),
            "Portfolio upload part"
        );
    }

    let images = state
        .profiles
        .add_portfolio_images(state.storage.as_ref(), auth.user_id, files)
        .await?;
    Ok(Created(images))
}

/// DELETE /profiles/me/portfolio/:image_id
pub async fn delete_portfolio_image(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Path(image_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .profiles
        .delete_portfolio_image(state.storage.as_ref(), auth.user_id, image_id)
        .await?;
    Ok(NoContent)
}

/// PUT /profiles/me/portfolio/order
pub async fn reorder_portfolio(
    State(state): State<Arc<AppState>>,
    auth: RequireAuth,
    Json(req): Json<ReorderPortfolioRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let images = state
        .profiles
        .reorder_portfolio_images(auth.user_id, &req.image_ids)
        .await?;
    Ok(DataResponse::new(images))
}
