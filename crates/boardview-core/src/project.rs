use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the single-select field that decides which column an item lands in.
pub const STATUS_FIELD: &str = "Status";

/// A project board as returned by one fetch. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSnapshot {
    pub title: String,
    pub items: Vec<ProjectItem>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectItem {
    pub content: Option<Content>,
    #[serde(default)]
    pub field_values: Vec<FieldValue>,
}

impl ProjectItem {
    /// Value of the first field value whose field is named `Status`.
    pub fn status(&self) -> Option<&str> {
        self.field_values
            .iter()
            .find(|fv| fv.field_name == STATUS_FIELD)
            .map(|fv| fv.name.as_str())
    }
}

/// A single-select field value together with the name of its field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldValue {
    pub name: String,
    pub field_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Issue(Issue),
    DraftIssue(DraftIssue),
}

impl Content {
    pub fn title(&self) -> &str {
        match self {
            Content::Issue(issue) => &issue.title,
            Content::DraftIssue(draft) => &draft.title,
        }
    }

    pub fn url(&self) -> Option<&str> {
        match self {
            Content::Issue(issue) => Some(&issue.url),
            Content::DraftIssue(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub assignees: Vec<Assignee>,
    #[serde(default)]
    pub labels: Vec<Label>,
}

impl Issue {
    /// Assignee logins joined for display, or `None` when nobody is assigned.
    pub fn assignee_line(&self) -> Option<String> {
        if self.assignees.is_empty() {
            return None;
        }
        let logins: Vec<&str> = self.assignees.iter().map(|a| a.login.as_str()).collect();
        Some(logins.join(", "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftIssue {
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub login: String,
}

/// Issue label. `color` is the tracker's 6-digit hex string without `#`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
    pub color: String,
}
