//! Wire format of the project board query.
//!
//! Items, assignees, labels and field values are capped by the query
//! itself; nothing here paginates.

use boardview_core::project::{Assignee, Content, DraftIssue, FieldValue, Issue, Label};
use boardview_core::{ProjectItem, ProjectSnapshot};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BoardRequest, ServiceError};

pub const PROJECT_QUERY: &str = r#"
query($owner: String!, $repo: String!, $projectNumber: Int!) {
  repository(owner: $owner, name: $repo) {
    projectV2(number: $projectNumber) {
      title
      items(first: 100) {
        nodes {
          content {
            __typename
            ... on Issue {
              title
              url
              assignees(first: 5) {
                nodes { login }
              }
              labels(first: 10) {
                nodes { name, color }
              }
            }
            ... on DraftIssue {
              title
            }
          }
          fieldValues(first: 10) {
            nodes {
              ... on ProjectV2ItemFieldSingleSelectValue {
                name
                field {
                  ... on ProjectV2SingleSelectField {
                    name
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}
"#;

#[derive(Debug, Clone, Serialize)]
pub struct GraphQLPayload<'a> {
    pub query: &'a str,
    pub variables: Variables<'a>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Variables<'a> {
    pub owner: &'a str,
    pub repo: &'a str,
    pub project_number: u32,
}

impl<'a> GraphQLPayload<'a> {
    pub fn for_request(request: &'a BoardRequest) -> Self {
        Self {
            query: PROJECT_QUERY,
            variables: Variables {
                owner: &request.owner,
                repo: &request.repo,
                project_number: request.project_number,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GraphQLResponse<T> {
    pub data: Option<T>,
    pub errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
pub struct GraphQLError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct Connection<T> {
    #[serde(default = "Vec::new")]
    pub nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

#[derive(Debug, Deserialize)]
pub struct RepositoryData {
    pub repository: Option<RepositoryNode>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryNode {
    #[serde(rename = "projectV2")]
    pub project_v2: Option<ProjectNode>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectNode {
    pub title: String,
    pub items: Connection<ItemNode>,
}

#[derive(Debug, Deserialize)]
pub struct ItemNode {
    pub content: Option<ContentNode>,
    #[serde(rename = "fieldValues")]
    pub field_values: Option<Connection<FieldValueNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "__typename")]
pub enum ContentNode {
    Issue {
        title: String,
        url: String,
        assignees: Option<Connection<AssigneeNode>>,
        labels: Option<Connection<LabelNode>>,
    },
    DraftIssue {
        title: String,
    },
    /// Pull requests and anything else the query has no fragment for.
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Deserialize)]
pub struct AssigneeNode {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct LabelNode {
    pub name: String,
    pub color: String,
}

/// Non-single-select values arrive as `{}` and leave both fields empty.
#[derive(Debug, Deserialize)]
pub struct FieldValueNode {
    pub name: Option<String>,
    pub field: Option<FieldNode>,
}

#[derive(Debug, Deserialize)]
pub struct FieldNode {
    pub name: Option<String>,
}

impl ContentNode {
    fn into_content(self) -> Option<Content> {
        match self {
            ContentNode::Issue {
                title,
                url,
                assignees,
                labels,
            } => Some(Content::Issue(Issue {
                title,
                url,
                assignees: assignees
                    .map(|c| c.into_nodes().map(|a| Assignee { login: a.login }).collect())
                    .unwrap_or_default(),
                labels: labels
                    .map(|c| {
                        c.into_nodes()
                            .map(|l| Label {
                                name: l.name,
                                color: l.color,
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })),
            ContentNode::DraftIssue { title } => Some(Content::DraftIssue(DraftIssue { title })),
            ContentNode::Unsupported => None,
        }
    }
}

impl FieldValueNode {
    fn into_field_value(self) -> Option<FieldValue> {
        Some(FieldValue {
            name: self.name?,
            field_name: self.field?.name?,
        })
    }
}

impl ItemNode {
    fn into_item(self) -> ProjectItem {
        ProjectItem {
            content: self.content.and_then(ContentNode::into_content),
            field_values: self
                .field_values
                .map(|c| c.into_nodes().filter_map(FieldValueNode::into_field_value).collect())
                .unwrap_or_default(),
        }
    }
}

/// Turn a decoded response into a snapshot, or the error it represents.
pub fn into_snapshot(
    response: GraphQLResponse<RepositoryData>,
    request: &BoardRequest,
    fetched_at: DateTime<Utc>,
) -> Result<ProjectSnapshot, ServiceError> {
    if let Some(errors) = response.errors.filter(|e| !e.is_empty()) {
        let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
        return Err(ServiceError::Query(messages.join("\n")));
    }

    let project = response
        .data
        .and_then(|d| d.repository)
        .and_then(|r| r.project_v2)
        .ok_or_else(|| ServiceError::ProjectNotFound {
            owner: request.owner.clone(),
            repo: request.repo.clone(),
            number: request.project_number,
        })?;

    Ok(ProjectSnapshot {
        title: project.title,
        items: project.items.into_nodes().map(ItemNode::into_item).collect(),
        fetched_at,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn request() -> BoardRequest {
        BoardRequest {
            token: "t".into(),
            owner: "octo".into(),
            repo: "board".into(),
            project_number: 1,
        }
    }

    fn decode(value: serde_json::Value) -> Result<ProjectSnapshot, ServiceError> {
        let response: GraphQLResponse<RepositoryData> = serde_json::from_value(value).unwrap();
        into_snapshot(response, &request(), Utc::now())
    }

    #[test]
    fn payload_uses_camel_case_variables() {
        let req = request();
        let value = serde_json::to_value(GraphQLPayload::for_request(&req)).unwrap();
        assert_eq!(
            value["variables"],
            json!({"owner": "octo", "repo": "board", "projectNumber": 1})
        );
        assert!(value["query"].as_str().unwrap().contains("projectV2(number: $projectNumber)"));
    }

    #[test]
    fn query_caps_collections() {
        assert!(PROJECT_QUERY.contains("items(first: 100)"));
        assert!(PROJECT_QUERY.contains("assignees(first: 5)"));
        assert!(PROJECT_QUERY.contains("labels(first: 10)"));
        assert!(PROJECT_QUERY.contains("fieldValues(first: 10)"));
    }

    #[test]
    fn decodes_issue_draft_and_field_values() {
        let snap = decode(json!({
            "data": {"repository": {"projectV2": {
                "title": "Roadmap",
                "items": {"nodes": [
                    {
                        "content": {
                            "__typename": "Issue",
                            "title": "Fix login",
                            "url": "https://github.com/octo/board/issues/1",
                            "assignees": {"nodes": [{"login": "alice"}]},
                            "labels": {"nodes": [{"name": "bug", "color": "d73a4a"}]}
                        },
                        "fieldValues": {"nodes": [
                            {},
                            {"name": "Done", "field": {"name": "Status"}}
                        ]}
                    },
                    {
                        "content": {"__typename": "DraftIssue", "title": "Idea"},
                        "fieldValues": {"nodes": []}
                    }
                ]}
            }}}
        }))
        .unwrap();

        assert_eq!(snap.title, "Roadmap");
        assert_eq!(snap.items.len(), 2);

        let first = &snap.items[0];
        assert_eq!(first.status(), Some("Done"));
        assert_eq!(first.field_values.len(), 1);
        match first.content.as_ref().unwrap() {
            Content::Issue(issue) => {
                assert_eq!(issue.assignees[0].login, "alice");
                assert_eq!(issue.labels[0].color, "d73a4a");
            }
            other => panic!("expected issue, got {other:?}"),
        }

        assert_eq!(
            snap.items[1].content,
            Some(Content::DraftIssue(DraftIssue { title: "Idea".into() }))
        );
    }

    #[test]
    fn null_and_unsupported_content_become_none() {
        let snap = decode(json!({
            "data": {"repository": {"projectV2": {
                "title": "p",
                "items": {"nodes": [
                    {"content": null, "fieldValues": {"nodes": []}},
                    {"content": {"__typename": "PullRequest"}, "fieldValues": {"nodes": []}}
                ]}
            }}}
        }))
        .unwrap();
        assert!(snap.items.iter().all(|i| i.content.is_none()));
    }

    #[test]
    fn field_value_without_field_name_is_skipped() {
        let snap = decode(json!({
            "data": {"repository": {"projectV2": {
                "title": "p",
                "items": {"nodes": [
                    {
                        "content": {"__typename": "DraftIssue", "title": "x"},
                        "fieldValues": {"nodes": [{"name": "Done", "field": {}}]}
                    }
                ]}
            }}}
        }))
        .unwrap();
        assert!(snap.items[0].field_values.is_empty());
    }

    #[test]
    fn errors_are_joined_with_newlines() {
        let err = decode(json!({
            "data": null,
            "errors": [{"message": "first"}, {"message": "second"}]
        }))
        .unwrap_err();
        match err {
            ServiceError::Query(msg) => assert_eq!(msg, "first\nsecond"),
            other => panic!("expected Query, got {other:?}"),
        }
    }

    #[test]
    fn errors_win_over_partial_data() {
        let err = decode(json!({
            "data": {"repository": {"projectV2": {"title": "p", "items": {"nodes": []}}}},
            "errors": [{"message": "partial"}]
        }))
        .unwrap_err();
        assert!(matches!(err, ServiceError::Query(_)));
    }

    #[test]
    fn missing_project_is_not_found() {
        let err = decode(json!({"data": {"repository": {"projectV2": null}}})).unwrap_err();
        match err {
            ServiceError::ProjectNotFound { owner, repo, number } => {
                assert_eq!((owner.as_str(), repo.as_str(), number), ("octo", "board", 1));
            }
            other => panic!("expected ProjectNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_repository_is_not_found() {
        let err = decode(json!({"data": {"repository": null}})).unwrap_err();
        assert!(matches!(err, ServiceError::ProjectNotFound { .. }));
    }

    #[test]
    fn empty_errors_list_is_ignored() {
        let snap = decode(json!({
            "data": {"repository": {"projectV2": {"title": "p", "items": {"nodes": []}}}},
            "errors": []
        }))
        .unwrap();
        assert!(snap.items.is_empty());
    }
}
