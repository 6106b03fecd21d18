use async_trait::async_trait;
use boardview_core::ProjectSnapshot;
use chrono::Utc;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::graphql::{self, GraphQLPayload, GraphQLResponse, RepositoryData};
use crate::{BoardFetcher, BoardRequest, ServiceError};

pub const DEFAULT_ENDPOINT: &str = "https://api.github.com/graphql";

const USER_AGENT: &str = concat!("boardview/", env!("CARGO_PKG_VERSION"));

/// Reads project boards from a GitHub-compatible GraphQL endpoint.
pub struct GraphqlFetcher {
    endpoint: String,
    client: Client,
}

impl GraphqlFetcher {
    pub fn new(endpoint: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ServiceError::Transport(format!("build client: {e}")))?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            client,
        })
    }
}

#[async_trait]
impl BoardFetcher for GraphqlFetcher {
    async fn fetch_project(&self, request: &BoardRequest) -> Result<ProjectSnapshot, ServiceError> {
        request.validate()?;
        info!(
            "fetching project {}/{} #{}",
            request.owner, request.repo, request.project_number
        );

        let resp = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("bearer {}", request.token))
            .json(&GraphQLPayload::for_request(request))
            .send()
            .await
            .map_err(|e| ServiceError::Transport(format!("request failed: {e}")))?;

        let response = decode_response(resp).await?;
        let snapshot = graphql::into_snapshot(response, request, Utc::now())?;
        debug!(
            "project '{}' returned {} items",
            snapshot.title,
            snapshot.items.len()
        );
        Ok(snapshot)
    }
}

/// Decode the body as a GraphQL response. Error statuses that carry a
/// GraphQL `errors` list decode normally; anything else becomes a
/// `Query` error with the API's `message` or the status line.
async fn decode_response(resp: Response) -> Result<GraphQLResponse<RepositoryData>, ServiceError> {
    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ServiceError::Transport(format!("read body: {e}")))?;

    if status.is_success() {
        return serde_json::from_str(&body)
            .map_err(|e| ServiceError::Transport(format!("decode response: {e}")));
    }

    warn!("graphql endpoint returned {status}");
    if let Ok(response) = serde_json::from_str::<GraphQLResponse<RepositoryData>>(&body) {
        if response.errors.as_ref().is_some_and(|e| !e.is_empty()) {
            return Ok(response);
        }
    }
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| status.to_string());
    Err(ServiceError::Query(message))
}
