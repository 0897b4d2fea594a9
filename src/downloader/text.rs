use super::{Artifact, DownloadError};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use std::path::Path;
use tokio::io::AsyncWriteExt;

/// Media types accepted by the generic downloader
pub const ACCEPTED_CONTENT_TYPES: &[&str] = &[
    "text/plain",
    "text/x-python",
    "application/x-python",
    "text/x-rust",
    "text/x-c",
    "text/x-shellscript",
    "text/javascript",
    "application/javascript",
];

/// Fallback downloader for any URL serving a text file with HTTP 200
#[derive(Debug, Clone, Copy, Default)]
pub struct TextDownloader;

impl TextDownloader {
    pub fn matches(&self, _url: &str) -> bool {
        true
    }

    pub async fn download(
        &self,
        client: &reqwest::Client,
        tmp_dir: &Path,
        url: &str,
    ) -> Result<Artifact, DownloadError> {
        fetch_text_file(client, tmp_dir, url).await
    }
}

/// Whether a Content-Type header value names an accepted media type
pub fn is_accepted_content_type(header: &str) -> bool {
    let media_type = header.split(';').next().unwrap_or("").trim();
    ACCEPTED_CONTENT_TYPES
        .iter()
        .any(|accepted| media_type.eq_ignore_ascii_case(accepted))
}

/// GET `url` and stream the body into a fresh temporary file
pub(super) async fn fetch_text_file(
    client: &reqwest::Client,
    tmp_dir: &Path,
    url: &str,
) -> Result<Artifact, DownloadError> {
    let request_error = |source| DownloadError::Request {
        url: url.to_string(),
        source,
    };

    let mut response = client.get(url).send().await.map_err(request_error)?;

    if response.status() != StatusCode::OK {
        return Err(DownloadError::Status {
            url: url.to_string(),
            status: response.status().as_u16(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    if !is_accepted_content_type(&content_type) {
        return Err(DownloadError::ContentType {
            url: url.to_string(),
            content_type: if content_type.is_empty() {
                "no content type".to_string()
            } else {
                content_type
            },
        });
    }

    let (file, path) = tempfile::Builder::new()
        .prefix("snipty-")
        .tempfile_in(tmp_dir)?
        .into_parts();
    let mut file = tokio::fs::File::from_std(file);

    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await.map_err(request_error)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    tracing::debug!("Fetched {} bytes from {}", written, url);
    Ok(Artifact::File(path))
}
