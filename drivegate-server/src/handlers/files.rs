use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::warn;

use drivegate_graph::{CustomFile, GraphError};

use crate::state::AppState;

#[derive(Deserialize, Default)]
pub struct SelectQuery {
    pub select: Option<String>,
}

/// GET with a remainder of exactly two segments addresses a single file's
/// metadata; any other depth lists a folder.
pub async fn get_entry(
    State(state): State<Arc<AppState>>,
    Path((site, drive, rest)): Path<(String, String, String)>,
    Query(query): Query<SelectQuery>,
) -> Response {
    let select = query.select.as_deref();
    let client = state.clients.create();
    match split_file_target(&rest) {
        Some((path, file_name)) => {
            match client.read_file(&site, &drive, path, file_name, select).await {
                Ok(details) => (StatusCode::OK, Json(details)).into_response(),
                Err(e) => error_response(e),
            }
        }
        None => match client.list_files(&site, &drive, &rest, select).await {
            Ok(files) => (StatusCode::OK, Json(files)).into_response(),
            Err(e) => error_response(e),
        },
    }
}

/// Lists the drive root (no path remainder in the URL).
pub async fn list_root(
    State(state): State<Arc<AppState>>,
    Path((site, drive)): Path<(String, String)>,
    Query(query): Query<SelectQuery>,
) -> Response {
    let client = state.clients.create();
    match client
        .list_files(&site, &drive, "", query.select.as_deref())
        .await
    {
        Ok(files) => (StatusCode::OK, Json(files)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn create_file(
    State(state): State<Arc<AppState>>,
    Path((site, drive, path)): Path<(String, String, String)>,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let name = apply_extension(&upload.name, &upload.file_name);
    let file = CustomFile::from_bytes(name, upload.data);
    match state.clients.create().add_file(&site, &drive, &path, file).await {
        Ok(created) => (StatusCode::CREATED, Json(created)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn update_file(
    State(state): State<Arc<AppState>>,
    Path((site, drive, path)): Path<(String, String, String)>,
    multipart: Multipart,
) -> Response {
    let upload = match read_upload(multipart).await {
        Ok(u) => u,
        Err(resp) => return resp,
    };

    let file = CustomFile::from_bytes(upload.name, upload.data);
    match state
        .clients
        .create()
        .update_file(&site, &drive, &path, file)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Path((site, drive, rest)): Path<(String, String, String)>,
) -> Response {
    let Some((path, file_name)) = split_file_target(&rest) else {
        return not_found();
    };
    match state
        .clients
        .create()
        .delete_file(&site, &drive, path, file_name)
        .await
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response(e),
    }
}

pub async fn patch_entry(
    State(state): State<Arc<AppState>>,
    Path((site, drive, rest)): Path<(String, String, String)>,
    body: Option<Json<HashMap<String, String>>>,
) -> Response {
    let Some((path, file_name)) = split_file_target(&rest) else {
        return not_found();
    };
    let updates = match body {
        Some(Json(map)) if !map.is_empty() => map,
        _ => return bad_request("Metadata updates cannot be empty."),
    };
    match state
        .clients
        .create()
        .update_file_metadata(&site, &drive, path, file_name, &updates)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => error_response(e),
    }
}

struct Upload {
    name: String,
    file_name: String,
    data: Vec<u8>,
}

async fn read_upload(mut multipart: Multipart) -> Result<Upload, Response> {
    let mut name: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return Err(bad_request(&e.to_string())),
        };
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("name") => {
                let value = field.text().await.map_err(|e| bad_request(&e.to_string()))?;
                name = Some(value);
            }
            Some("file") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| bad_request(&e.to_string()))?;
                file = Some((file_name, data.to_vec()));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| bad_request("Missing form field: name"))?;
    let (file_name, data) = file.ok_or_else(|| bad_request("Missing form field: file"))?;
    Ok(Upload {
        name,
        file_name,
        data,
    })
}

/// Appends the uploaded file's original extension when the provided name
/// lacks it (case-insensitive comparison).
fn apply_extension(name: &str, original_file_name: &str) -> String {
    let ext = original_file_name
        .rsplit_once('.')
        .map(|(_, e)| e)
        .unwrap_or("");
    if ext.is_empty() {
        return name.to_string();
    }
    let suffix = format!(".{ext}");
    if name.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase()) {
        name.to_string()
    } else {
        format!("{name}{suffix}")
    }
}

/// A remainder of exactly two non-empty segments addresses a single file
/// (`{path}/{file}`); anything else targets a folder.
fn split_file_target(rest: &str) -> Option<(&str, &str)> {
    let mut parts = rest.split('/');
    let path = parts.next()?;
    let file = parts.next()?;
    if parts.next().is_some() || path.is_empty() || file.is_empty() {
        return None;
    }
    Some((path, file))
}

fn error_json(message: &str) -> serde_json::Value {
    serde_json::json!({ "error": message })
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(error_json(message))).into_response()
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(error_json("Not found"))).into_response()
}

/// Maps error kinds to distinct statuses: caller mistakes come back as 4xx,
/// upstream and transport failures as 502 with the upstream status and body
/// preserved in the payload.
fn error_response(err: GraphError) -> Response {
    let (status, body) = match &err {
        GraphError::DriveNotFound { .. } => {
            (StatusCode::NOT_FOUND, error_json(&err.to_string()))
        }
        GraphError::Validation(msg) => (StatusCode::BAD_REQUEST, error_json(msg)),
        GraphError::Api { status, body } => (
            StatusCode::BAD_GATEWAY,
            serde_json::json!({
                "error": "upstream request failed",
                "upstream_status": status.as_u16(),
                "upstream_body": body,
            }),
        ),
        GraphError::Http(_) | GraphError::Json(_) => {
            (StatusCode::BAD_GATEWAY, error_json(&err.to_string()))
        }
        GraphError::Io(_) | GraphError::Cache(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, error_json(&err.to_string()))
        }
    };
    warn!(status = %status, error = %err, "Request failed");
    (status, Json(body)).into_response()
}
