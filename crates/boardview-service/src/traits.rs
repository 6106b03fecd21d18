use async_trait::async_trait;
use boardview_core::ProjectSnapshot;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// The API answered with GraphQL errors; messages are newline-joined.
    #[error("{0}")]
    Query(String),

    #[error("指定されたプロジェクトが見つかりません。リポジトリ名、プロジェクト番号を確認してください。 ({owner}/{repo} #{number})")]
    ProjectNotFound {
        owner: String,
        repo: String,
        number: u32,
    },

    #[error("ページの読み込みに失敗しました。 ({page}: {reason})")]
    WikiFetch { page: String, reason: String },

    #[error("unknown wiki page: {0}")]
    UnknownPage(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("transport error: {0}")]
    Transport(String),
}

/// Identifies one project board and the credential used to read it.
#[derive(Clone, PartialEq, Eq)]
pub struct BoardRequest {
    pub token: String,
    pub owner: String,
    pub repo: String,
    pub project_number: u32,
}

impl BoardRequest {
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.owner.trim().is_empty() {
            return Err(ServiceError::InvalidInput("owner must not be empty".into()));
        }
        if self.repo.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "repository name must not be empty".into(),
            ));
        }
        if self.project_number == 0 {
            return Err(ServiceError::InvalidInput(
                "project number must be positive".into(),
            ));
        }
        Ok(())
    }
}

// Keeps the token out of logs and panic messages.
impl std::fmt::Debug for BoardRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardRequest")
            .field("token", &"<redacted>")
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("project_number", &self.project_number)
            .finish()
    }
}

/// Reads a project board from the tracker.
#[async_trait]
pub trait BoardFetcher: Send + Sync {
    /// One query, one attempt. No retries.
    async fn fetch_project(&self, request: &BoardRequest) -> Result<ProjectSnapshot, ServiceError>;
}

/// Serves wiki pages as markdown text.
#[async_trait]
pub trait WikiSource: Send + Sync {
    fn name(&self) -> &str;

    /// Fetch `<page>.md`. Any failure is reported as `ServiceError::WikiFetch`.
    async fn fetch_page(&self, page: &str) -> Result<String, ServiceError>;
}
