use super::error::ApiError;
use super::AppState;
use crate::storage::{
    display_name, is_pdf_filename, new_temp_name, processed_name, StorageError,
};
use crate::{extractor, remover};
use axum::{
    body::Body,
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, Path, State},
    http::{header, Response, StatusCode},
    response::{Html, IntoResponse},
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

/// Multipart field carrying the uploaded PDFs.
pub const FILES_FIELD: &str = "files[]";

/// Body of the 500 returned when an upload cannot be stored; the cause is
/// only logged.
const STORE_FAILED: &str = "Failed to store upload";

const INDEX_HTML: &str = include_str!("../../static/index.html");
const MAIN_JS: &str = include_str!("../../static/main.js");

// ── Static page ──────────────────────────────────────────────────────────────

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub async fn main_js() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/javascript; charset=utf-8")], MAIN_JS)
}

// ── Upload ───────────────────────────────────────────────────────────────────

/// One accepted upload. The client keeps this and sends `temp_name` and
/// `original_name` back to `/process`; the server does not remember it.
#[derive(Debug, Serialize)]
pub struct UploadRecord {
    pub original_name: String,
    pub temp_name: String,
    pub metadata: BTreeMap<String, String>,
}

/// `POST /upload`: store every `.pdf` entry of `files[]` under a fresh name
/// and return its XMP mapping.
///
/// Entries without a filename or without a `.pdf` suffix are skipped. A
/// failure while storing or reading any accepted entry fails the whole
/// request.
pub async fn upload_files(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Vec<UploadRecord>>, ApiError> {
    let mut multipart = multipart.map_err(|e| {
        tracing::error!(error = %e, "Upload request is not multipart");
        ApiError::BadRequest("No file part".into())
    })?;

    let mut saw_files_field = false;
    let mut results = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILES_FIELD) {
            continue;
        }
        saw_files_field = true;

        let original_name = field.file_name().unwrap_or_default().to_string();
        if original_name.is_empty() {
            tracing::warn!("Empty filename received");
            continue;
        }
        if !is_pdf_filename(&original_name) {
            tracing::debug!(original_name = %original_name, "Skipping non-PDF upload");
            continue;
        }

        let data = field.bytes().await?;
        let temp_name = new_temp_name();
        let uploads = state.uploads.clone();

        let record = tokio::task::spawn_blocking(move || -> Result<UploadRecord, StorageError> {
            let path = uploads.write(&temp_name, &data)?;
            tracing::info!(temp_name = %temp_name, bytes = data.len(), "File saved successfully");

            let metadata = extractor::get_xmp_metadata(&path);
            Ok(UploadRecord {
                original_name,
                temp_name,
                metadata,
            })
        })
        .await?
        .map_err(|e| {
            tracing::error!(error = %e, "Error processing upload");
            ApiError::Internal(STORE_FAILED.into())
        })?;

        results.push(record);
    }

    if !saw_files_field {
        tracing::error!("No files[] in upload request");
        return Err(ApiError::BadRequest("No file part".into()));
    }

    tracing::info!(accepted = results.len(), "Upload request handled");
    Ok(Json(results))
}

// ── Process ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    pub files: Vec<ProcessEntry>,
}

/// Only these two fields are read; the rest of an upload record (such as
/// `metadata`) may be sent back as-is and is ignored.
#[derive(Debug, Deserialize)]
pub struct ProcessEntry {
    pub temp_name: String,
    pub original_name: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ProcessOutcome {
    Success {
        original_name: String,
        processed_name: String,
    },
    Error {
        original_name: String,
    },
}

/// `POST /process`: write an XMP-free copy of each listed upload.
///
/// Results are reported per entry and the batch never fails as a whole.
/// Entries whose upload no longer exists are left out of the response.
pub async fn process_files(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Json<Vec<ProcessOutcome>>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut results = Vec::with_capacity(request.files.len());

    for entry in request.files {
        let input = match state.uploads.resolve(&entry.temp_name) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected process entry");
                results.push(ProcessOutcome::Error {
                    original_name: entry.original_name,
                });
                continue;
            }
        };
        if !input.is_file() {
            tracing::debug!(temp_name = %entry.temp_name, "Upload no longer exists, skipping");
            continue;
        }

        let output_name = processed_name(&entry.temp_name);
        let output = state.uploads.root().join(&output_name);

        let succeeded = tokio::task::spawn_blocking(move || remover::remove_xmp_metadata(&input, &output))
            .await
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Removal task failed");
                false
            });

        results.push(if succeeded {
            ProcessOutcome::Success {
                original_name: entry.original_name,
                processed_name: output_name,
            }
        } else {
            ProcessOutcome::Error {
                original_name: entry.original_name,
            }
        });
    }

    Ok(Json(results))
}

// ── Download ─────────────────────────────────────────────────────────────────

/// `GET /download/{filename}`: stream a stored file as an attachment named
/// without its `processed_` prefix.
#[tracing::instrument(skip(state))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response<Body>, ApiError> {
    let not_found = || ApiError::NotFound("File not found".into());

    let path = state.uploads.resolve(&filename).map_err(|_| not_found())?;
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(not_found()),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };
    let metadata = file
        .metadata()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if !metadata.is_file() {
        return Err(not_found());
    }

    let download_name = display_name(&filename);
    let content_type = if is_pdf_filename(download_name) {
        "application/pdf"
    } else {
        "application/octet-stream"
    };
    let content_disposition = format!(
        "attachment; filename=\"{}\"",
        download_name.replace(['"', '\\'], "_")
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CONTENT_LENGTH, metadata.len())
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {e}")))
}
