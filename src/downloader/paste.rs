use super::text::fetch_text_file;
use super::{Artifact, DownloadError};
use std::path::Path;

const GHOSTBIN_PREFIX: &str = "https://ghostbin.com/paste/";
const RAW_SUFFIX: &str = "/raw";

/// Paste service support: rewrites paste links to their raw form
#[derive(Debug, Clone)]
pub struct PasteDownloader {
    prefix: String,
}

impl PasteDownloader {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn matches(&self, url: &str) -> bool {
        url.starts_with(&self.prefix)
    }

    /// URL of the raw representation of a paste
    pub fn raw_url(&self, url: &str) -> String {
        if url.ends_with(RAW_SUFFIX) {
            url.to_string()
        } else {
            format!("{}{}", url, RAW_SUFFIX)
        }
    }

    pub async fn download(
        &self,
        client: &reqwest::Client,
        tmp_dir: &Path,
        url: &str,
    ) -> Result<Artifact, DownloadError> {
        fetch_text_file(client, tmp_dir, &self.raw_url(url)).await
    }
}

impl Default for PasteDownloader {
    fn default() -> Self {
        Self::new(GHOSTBIN_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_prefix_only() {
        let paste = PasteDownloader::default();
        assert!(paste.matches("https://ghostbin.com/paste/abc12"));
        assert!(!paste.matches("https://ghostbin.com/other/abc12"));
        assert!(!paste.matches("http://ghostbin.com/paste/abc12"));
    }

    #[test]
    fn test_raw_suffix_appended_once() {
        let paste = PasteDownloader::default();
        assert_eq!(
            paste.raw_url("https://ghostbin.com/paste/abc12"),
            "https://ghostbin.com/paste/abc12/raw"
        );
        assert_eq!(
            paste.raw_url("https://ghostbin.com/paste/abc12/raw"),
            "https://ghostbin.com/paste/abc12/raw"
        );
    }
}
