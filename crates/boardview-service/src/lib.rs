mod blocking;
pub mod graphql;
mod http;
#[cfg(feature = "test-helpers")]
pub mod test_helpers;
mod traits;
mod wiki;

pub use blocking::BlockingBoardService;
pub use http::{GraphqlFetcher, DEFAULT_ENDPOINT};
pub use traits::{BoardFetcher, BoardRequest, ServiceError, WikiSource};
pub use wiki::{create_wiki_source, HttpWikiSource, LocalWikiSource, WIKI_FETCH_FAILED};
