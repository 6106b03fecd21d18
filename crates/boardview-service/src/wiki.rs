use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::{ServiceError, WikiSource};

pub const WIKI_FETCH_FAILED: &str = "ページの読み込みに失敗しました。";

fn fetch_error(page: &str, reason: impl Into<String>) -> ServiceError {
    ServiceError::WikiFetch {
        page: page.to_string(),
        reason: reason.into(),
    }
}

fn page_file(page: &str) -> String {
    format!("{page}.md")
}

/// Wiki pages served over HTTP(S) under a base URL.
pub struct HttpWikiSource {
    base_url: String,
    client: Client,
}

impl HttpWikiSource {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub fn page_url(&self, page: &str) -> String {
        format!("{}/{}", self.base_url, page_file(page))
    }
}

#[async_trait]
impl WikiSource for HttpWikiSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_page(&self, page: &str) -> Result<String, ServiceError> {
        let url = self.page_url(page);
        debug!("GET {url}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| fetch_error(page, e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            warn!("wiki page {page}: {status}");
            return Err(fetch_error(page, status.to_string()));
        }
        resp.text()
            .await
            .map_err(|e| fetch_error(page, format!("read body: {e}")))
    }
}

/// Wiki pages read from a checked-out wiki repository.
pub struct LocalWikiSource {
    base_dir: PathBuf,
}

impl LocalWikiSource {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    fn resolve(&self, page: &str) -> Option<PathBuf> {
        let escapes = page.is_empty()
            || page.starts_with("..")
            || page.contains(['/', '\\']);
        if escapes {
            return None;
        }
        Some(self.base_dir.join(page_file(page)))
    }
}

#[async_trait]
impl WikiSource for LocalWikiSource {
    fn name(&self) -> &str {
        "local"
    }

    async fn fetch_page(&self, page: &str) -> Result<String, ServiceError> {
        let path = self
            .resolve(page)
            .ok_or_else(|| fetch_error(page, "invalid page id"))?;
        debug!("read {}", path.display());
        match tokio::fs::read_to_string(&path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("wiki page {page}: not found");
                Err(fetch_error(page, "404 Not Found"))
            }
            Err(e) => Err(fetch_error(page, format!("read {}: {e}", path.display()))),
        }
    }
}

/// Pick a source for `base`: URLs are fetched over HTTP, anything else is
/// treated as a directory.
pub fn create_wiki_source(base: &str) -> Arc<dyn WikiSource> {
    if base.starts_with("http://") || base.starts_with("https://") {
        Arc::new(HttpWikiSource::new(base))
    } else {
        Arc::new(LocalWikiSource::new(base))
    }
}
