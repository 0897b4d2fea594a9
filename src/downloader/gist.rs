//! Gist support: single-file gists become a file, multi-file gists a directory

use super::{Artifact, DownloadError};
use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

const GIST_HOST: &str = "gist.github.com";
const GIST_API_BASE: &str = "https://api.github.com";

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: BTreeMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GistDownloader {
    host: String,
    api_base: String,
}

impl GistDownloader {
    /// Downloader for gists hosted on `host`, read through the API at `api_base`
    pub fn new(host: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.eq_ignore_ascii_case(&self.host)))
            .unwrap_or(false)
    }

    /// Gist identifier from `https://gist.github.com/[<owner>/]<id>[/<revision>]`
    pub fn gist_id(url: &str) -> Option<String> {
        let parsed = Url::parse(url).ok()?;
        let segments: Vec<&str> = parsed
            .path_segments()?
            .filter(|s| !s.is_empty())
            .collect();
        let segment = match segments.as_slice() {
            [id] => *id,
            [_owner, id, ..] => *id,
            [] => return None,
        };
        let id = segment.strip_suffix(".git").unwrap_or(segment);
        (!id.is_empty()).then(|| id.to_string())
    }

    pub async fn download(
        &self,
        client: &reqwest::Client,
        tmp_dir: &Path,
        url: &str,
    ) -> Result<Artifact, DownloadError> {
        let id = Self::gist_id(url).ok_or_else(|| DownloadError::InvalidUrl(url.to_string()))?;
        let api_url = format!("{}/gists/{}", self.api_base, id);

        let response = client
            .get(&api_url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(|source| DownloadError::Request {
                url: api_url.clone(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(DownloadError::Status {
                url: api_url,
                status: response.status().as_u16(),
            });
        }

        let gist: GistResponse = response
            .json()
            .await
            .map_err(|e| DownloadError::Malformed(e.to_string()))?;

        let mut files = Vec::with_capacity(gist.files.len());
        for (key, file) in gist.files {
            let filename = file.filename.clone().unwrap_or(key);
            validate_filename(&filename)?;
            let content = file_content(client, &filename, file).await?;
            files.push((filename, content));
        }

        tracing::debug!("Gist {} has {} file(s)", id, files.len());

        match files.len() {
            0 => Err(DownloadError::EmptyGist(id)),
            1 => {
                let (_, content) = &files[0];
                let mut temp = tempfile::Builder::new()
                    .prefix("snipty-")
                    .tempfile_in(tmp_dir)?;
                temp.write_all(content.as_bytes())?;
                temp.flush()?;
                Ok(Artifact::File(temp.into_temp_path()))
            }
            _ => {
                let dir = tempfile::Builder::new()
                    .prefix("snipty-")
                    .tempdir_in(tmp_dir)?;
                for (filename, content) in &files {
                    std::fs::write(dir.path().join(filename), content)?;
                }
                Ok(Artifact::Dir(dir))
            }
        }
    }
}

impl Default for GistDownloader {
    fn default() -> Self {
        Self::new(GIST_HOST, GIST_API_BASE)
    }
}

/// Reject filenames that would escape the artifact directory
fn validate_filename(filename: &str) -> Result<(), DownloadError> {
    if filename.is_empty()
        || filename == "."
        || filename == ".."
        || filename.contains('/')
        || filename.contains('\\')
    {
        return Err(DownloadError::Malformed(format!(
            "invalid file name '{}'",
            filename
        )));
    }
    Ok(())
}

/// Inline content, or the raw file when the API truncated it
async fn file_content(
    client: &reqwest::Client,
    filename: &str,
    file: GistFile,
) -> Result<String, DownloadError> {
    match (file.truncated, file.raw_url, file.content) {
        (true, Some(raw_url), _) => {
            tracing::debug!("Gist file {} is truncated, fetching {}", filename, raw_url);
            let response =
                client
                    .get(&raw_url)
                    .send()
                    .await
                    .map_err(|source| DownloadError::Request {
                        url: raw_url.clone(),
                        source,
                    })?;
            if !response.status().is_success() {
                return Err(DownloadError::Status {
                    url: raw_url,
                    status: response.status().as_u16(),
                });
            }
            response
                .text()
                .await
                .map_err(|source| DownloadError::Request {
                    url: raw_url,
                    source,
                })
        }
        (_, _, Some(content)) => Ok(content),
        (_, _, None) => Err(DownloadError::Malformed(format!(
            "file '{}' has no content",
            filename
        ))),
    }
}
