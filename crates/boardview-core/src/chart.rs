use serde::{Deserialize, Serialize};

use crate::board::BoardViewModel;

pub const CHART_TITLE: &str = "プロジェクト進捗";
pub const DATASET_LABEL: &str = "タスク数";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub alpha: f32,
}

const fn rgba(r: u8, g: u8, b: u8) -> Rgba {
    Rgba { r, g, b, alpha: 0.7 }
}

/// Slice colors, applied in order and wrapped when there are more buckets.
pub const PALETTE: [Rgba; 6] = [
    rgba(255, 99, 132),
    rgba(54, 162, 235),
    rgba(255, 206, 86),
    rgba(75, 192, 192),
    rgba(153, 102, 255),
    rgba(255, 159, 64),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSlice {
    pub label: String,
    pub value: usize,
    pub color: Rgba,
}

/// A drawn chart. Owned by whoever rendered it and dropped on dispose.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartHandle {
    pub title: String,
    pub dataset_label: String,
    pub slices: Vec<ChartSlice>,
}

impl ChartHandle {
    pub fn from_view_model(vm: &BoardViewModel) -> Self {
        Self {
            title: CHART_TITLE.to_string(),
            dataset_label: DATASET_LABEL.to_string(),
            slices: slices(vm),
        }
    }

    pub fn total(&self) -> usize {
        self.slices.iter().map(|s| s.value).sum()
    }

    /// Fraction of the total held by slice `idx`, 0.0 for an empty chart.
    pub fn share(&self, idx: usize) -> f64 {
        let total = self.total();
        match self.slices.get(idx) {
            Some(slice) if total > 0 => slice.value as f64 / total as f64,
            _ => 0.0,
        }
    }
}

/// One slice per bucket in key order, sized by bucket cardinality.
pub fn slices(vm: &BoardViewModel) -> Vec<ChartSlice> {
    vm.iter()
        .enumerate()
        .map(|(i, (status, items))| ChartSlice {
            label: status.to_string(),
            value: items.len(),
            color: PALETTE[i % PALETTE.len()],
        })
        .collect()
}
