use std::sync::Arc;

use boardview_core::ProjectSnapshot;
use tokio::runtime::Runtime;

use crate::{create_wiki_source, BoardFetcher, BoardRequest, GraphqlFetcher, ServiceError, WikiSource};

/// Blocking wrapper around the async board fetcher and wiki source.
///
/// Owns a tokio runtime and uses `block_on()` for each call, so sync
/// callers like the TUI can drive it from worker threads.
pub struct BlockingBoardService {
    fetcher: Arc<dyn BoardFetcher>,
    wiki: Arc<dyn WikiSource>,
    rt: Runtime,
}

impl BlockingBoardService {
    pub fn new(endpoint: &str, wiki_base: &str) -> Result<Self, ServiceError> {
        let fetcher = Arc::new(GraphqlFetcher::new(endpoint)?);
        Self::from_parts(fetcher, create_wiki_source(wiki_base))
    }

    pub fn from_parts(
        fetcher: Arc<dyn BoardFetcher>,
        wiki: Arc<dyn WikiSource>,
    ) -> Result<Self, ServiceError> {
        let rt = Runtime::new()
            .map_err(|e| ServiceError::Transport(format!("failed to create tokio runtime: {e}")))?;
        Ok(Self { fetcher, wiki, rt })
    }

    pub fn fetch_project(&self, request: &BoardRequest) -> Result<ProjectSnapshot, ServiceError> {
        self.rt.block_on(self.fetcher.fetch_project(request))
    }

    pub fn fetch_page(&self, page: &str) -> Result<String, ServiceError> {
        self.rt.block_on(self.wiki.fetch_page(page))
    }

    pub fn wiki_source_name(&self) -> &str {
        self.wiki.name()
    }
}
