use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_TYPE, HeaderMap},
    },
    response::IntoResponse,
};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::Component;
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{error, info};

pub async fn download_file(
    Path(path): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let pdf_dir = state.plugin.pdf_dir();
    let relative = std::path::Path::new(&path);

    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err((StatusCode::FORBIDDEN, "Forbidden"));
    }
    let file_path = pdf_dir.join(relative);

    let file = match File::open(&file_path).await {
        Ok(f) => f,
        Err(e) => {
            error!("File download failed: {} (Path: {:?})", e, file_path);
            return Err((StatusCode::NOT_FOUND, "File not found"));
        }
    };

    let total_size = match file.metadata().await {
        Ok(metadata) if metadata.is_file() => metadata.len(),
        _ => return Err((StatusCode::NOT_FOUND, "File not found")),
    };
    let filename = file_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    info!("Sending artifact: {} ({} bytes)", filename, total_size);

    let body = Body::from_stream(ReaderStream::new(file));

    let mut headers = HeaderMap::new();
    let mime = mime_guess::from_path(&file_path).first_or_octet_stream();
    if let Ok(val) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, val);
    }
    if let Ok(val) = HeaderValue::from_str(&format!("attachment; filename=\"{}\"", filename)) {
        headers.insert(CONTENT_DISPOSITION, val);
    }
    if let Ok(val) = HeaderValue::from_str(&total_size.to_string()) {
        headers.insert(CONTENT_LENGTH, val);
    }

    Ok((headers, body))
}

pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string())
        .collect::<Vec<_>>()
        .join("/")
}
