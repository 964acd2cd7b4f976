//! HTTP routes.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{BytesRejection, JsonRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::debug;

use booth_core::{
    BlobHandle, BlobPath, BlobStore, BoothId, BoothPatch, BoothRecord, Direction, ImageFile,
    ListOrder, NewBooth, RecordStore, SortKey, UploadForm, image_content_type, submit_booth,
};

use crate::error::ApiError;
use crate::state::{AppState, Backend};
use crate::ws;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Create all HTTP routes.
pub fn routes<S: Backend>() -> Router<AppState<S>> {
    Router::new()
        .route("/api/health", get(health))
        .route(
            "/api/festivals",
            get(list_booths::<S>).post(upload_booth::<S>),
        )
        .route("/api/festivals/changes", get(ws::changes_handler::<S>))
        .route(
            "/api/festivals/{id}",
            get(get_booth::<S>)
                .put(put_booth::<S>)
                .patch(patch_booth::<S>)
                .delete(delete_booth::<S>),
        )
        .route("/api/festivals/{id}/like", post(like_booth::<S>))
        .route(
            "/storage/{*path}",
            get(download_blob::<S>).put(upload_blob::<S>),
        )
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    #[serde(default)]
    order_by: SortKey,
    #[serde(default)]
    direction: Direction,
}

async fn list_booths<S: Backend>(
    State(state): State<AppState<S>>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<BoothRecord>>, ApiError> {
    let Query(query) = query?;
    let order = ListOrder::new(query.order_by, query.direction);
    let records = state.store.list(order).await?;
    Ok(Json(records))
}

async fn upload_booth<S: Backend>(
    State(state): State<AppState<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let form = read_upload_form(multipart?).await?;
    let record = submit_booth(&*state.store, &*state.store, form).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Collect the booth form fields. Unknown fields are skipped.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => form.title = field.text().await?,
            "studentsName" | "author" => form.author = field.text().await?,
            "description" => form.description = field.text().await?,
            "image" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or(FALLBACK_CONTENT_TYPE)
                    .to_string();
                let bytes = field.bytes().await?;
                form.image = Some(ImageFile::new(file_name, content_type, bytes.to_vec()));
            }
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

async fn get_booth<S: Backend>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<BoothRecord>, ApiError> {
    let id = BoothId::new(id)?;
    Ok(Json(state.store.get(&id).await?))
}

async fn put_booth<S: Backend>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<NewBooth>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let id = BoothId::new(id)?;
    let Json(booth) = body?;
    if booth.id != id {
        return Err(ApiError::bad_request(format!(
            "path id {} does not match body id {}",
            id, booth.id
        )));
    }

    let record = state.store.insert(&booth).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn patch_booth<S: Backend>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: Result<Json<BoothPatch>, JsonRejection>,
) -> Result<Json<BoothRecord>, ApiError> {
    let id = BoothId::new(id)?;
    let Json(patch) = body?;
    Ok(Json(state.store.update(&id, &patch).await?))
}

async fn delete_booth<S: Backend>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = BoothId::new(id)?;
    state.store.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like_booth<S: Backend>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<BoothRecord>, ApiError> {
    let id = BoothId::new(id)?;
    Ok(Json(state.store.increment_likes(&id).await?))
}

async fn upload_blob<S: Backend>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<BlobHandle>), ApiError> {
    let path = BlobPath::new(path.trim_start_matches('/'))?;
    let bytes = body?;
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| guess_content_type(&path).to_string());

    let handle = state.store.upload(&path, &bytes, &content_type).await?;
    Ok((StatusCode::CREATED, Json(handle)))
}

async fn download_blob<S: Backend>(
    State(state): State<AppState<S>>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let path = BlobPath::new(path.trim_start_matches('/'))?;
    let bytes = state.store.download(&path).await?;
    Ok((blob_headers(guess_content_type(&path)), bytes))
}

/// Response headers for a stored blob.
///
/// Only raster images render inline; anything a browser could execute
/// (SVG, unknown types) is sent as an attachment.
fn blob_headers(content_type: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    let raster = content_type.starts_with("image/") && content_type != "image/svg+xml";
    if !raster {
        headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static("attachment"));
    }
    headers
}

/// Content type from the blob's extension.
fn guess_content_type(path: &BlobPath) -> &'static str {
    path.extension()
        .and_then(image_content_type)
        .unwrap_or(FALLBACK_CONTENT_TYPE)
}
