use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::project::{Content, ProjectSnapshot};

/// Bucket used for items that carry no `Status` field value.
pub const UNSET_STATUS: &str = "ステータス未設定";

/// Items grouped by status. Key order is the order in which each status
/// was first seen while scanning the snapshot; it drives both the chart
/// slice order and the board column order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BoardViewModel {
    buckets: IndexMap<String, Vec<Content>>,
}

impl BoardViewModel {
    /// Group the snapshot's items by status. Items without content are dropped.
    pub fn build(snapshot: &ProjectSnapshot) -> Self {
        let mut buckets: IndexMap<String, Vec<Content>> = IndexMap::new();
        for item in &snapshot.items {
            let Some(content) = &item.content else {
                continue;
            };
            let status = item.status().unwrap_or(UNSET_STATUS);
            buckets
                .entry(status.to_string())
                .or_default()
                .push(content.clone());
        }
        Self { buckets }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn total_items(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }

    pub fn get(&self, status: &str) -> Option<&[Content]> {
        self.buckets.get(status).map(Vec::as_slice)
    }

    /// Buckets in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Content])> {
        self.buckets
            .iter()
            .map(|(status, items)| (status.as_str(), items.as_slice()))
    }
}
