//! In-process mock of the GraphQL endpoint and the wiki host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
struct MockProject {
    status: StatusCode,
    body: Value,
    delay: Duration,
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Default)]
struct MockState {
    projects: Mutex<HashMap<u64, MockProject>>,
    pages: Mutex<HashMap<String, String>>,
    requests: Mutex<Vec<RecordedRequest>>,
    wiki_requests: Mutex<Vec<String>>,
}

/// A running mock API with base_url and background task handle.
pub struct MockApi {
    pub base_url: String,
    state: Arc<MockState>,
    _handle: tokio::task::JoinHandle<()>,
}

impl MockApi {
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    pub fn wiki_url(&self) -> String {
        format!("{}/wiki", self.base_url)
    }

    /// Answer queries for `project_number` with `body` (HTTP 200).
    pub fn set_project(&self, project_number: u64, body: Value) {
        self.set_project_with(project_number, StatusCode::OK, body, Duration::ZERO);
    }

    pub fn set_project_with(
        &self,
        project_number: u64,
        status: StatusCode,
        body: Value,
        delay: Duration,
    ) {
        self.state.projects.lock().unwrap().insert(
            project_number,
            MockProject {
                status,
                body,
                delay,
            },
        );
    }

    pub fn set_page(&self, page: &str, markdown: &str) {
        self.state
            .pages
            .lock()
            .unwrap()
            .insert(page.to_string(), markdown.to_string());
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Page ids requested from the wiki host, in arrival order.
    pub fn wiki_requests(&self) -> Vec<String> {
        self.state.wiki_requests.lock().unwrap().clone()
    }
}

async fn graphql(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let number = body["variables"]["projectNumber"].as_u64().unwrap_or(0);
    state.requests.lock().unwrap().push(RecordedRequest {
        authorization,
        body,
    });

    let project = state.projects.lock().unwrap().get(&number).cloned();
    match project {
        Some(project) => {
            if !project.delay.is_zero() {
                tokio::time::sleep(project.delay).await;
            }
            (project.status, Json(project.body))
        }
        None => (
            StatusCode::OK,
            Json(json!({"data": {"repository": {"projectV2": null}}})),
        ),
    }
}

async fn wiki_page(
    State(state): State<Arc<MockState>>,
    Path(file): Path<String>,
) -> (StatusCode, String) {
    let page = file.strip_suffix(".md").unwrap_or(&file).to_string();
    state.wiki_requests.lock().unwrap().push(page.clone());
    match state.pages.lock().unwrap().get(&page) {
        Some(markdown) => (StatusCode::OK, markdown.clone()),
        None => (StatusCode::NOT_FOUND, "Not Found".into()),
    }
}

/// Spawn the mock on a random port. Unknown project numbers answer with a
/// null `projectV2`; unknown wiki pages answer 404.
pub async fn spawn_mock_api() -> MockApi {
    let state = Arc::new(MockState::default());
    let app = Router::new()
        .route("/graphql", post(graphql))
        .route("/wiki/{file}", get(wiki_page))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockApi {
        base_url: format!("http://{addr}"),
        state,
        _handle: handle,
    }
}

// -- Fixtures --

pub fn project_response(title: &str, items: Vec<Value>) -> Value {
    json!({"data": {"repository": {"projectV2": {
        "title": title,
        "items": {"nodes": items}
    }}}})
}

fn status_values(status: Option<&str>) -> Value {
    match status {
        Some(s) => json!({"nodes": [{}, {"name": s, "field": {"name": "Status"}}]}),
        None => json!({"nodes": [{}]}),
    }
}

pub fn issue_item(
    title: &str,
    status: Option<&str>,
    assignees: &[&str],
    labels: &[(&str, &str)],
) -> Value {
    let assignees: Vec<Value> = assignees.iter().map(|l| json!({"login": l})).collect();
    let labels: Vec<Value> = labels
        .iter()
        .map(|(name, color)| json!({"name": name, "color": color}))
        .collect();
    json!({
        "content": {
            "__typename": "Issue",
            "title": title,
            "url": format!("https://github.com/octo/board/issues/{}", title.replace(' ', "-")),
            "assignees": {"nodes": assignees},
            "labels": {"nodes": labels}
        },
        "fieldValues": status_values(status)
    })
}

pub fn draft_item(title: &str, status: Option<&str>) -> Value {
    json!({
        "content": {"__typename": "DraftIssue", "title": title},
        "fieldValues": status_values(status)
    })
}

pub fn empty_item(status: Option<&str>) -> Value {
    json!({"content": null, "fieldValues": status_values(status)})
}
