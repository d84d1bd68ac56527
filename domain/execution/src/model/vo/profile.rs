//! Post-completion summary of the data a worker produced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableProfile {
    pub global_profile: GlobalProfile,
    #[serde(default)]
    pub column_profiles: Vec<ColumnProfile>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalProfile {
    pub samples_used: u64,
    pub column_count: u64,
    pub row_count: u64,
    pub row_has_null_ratio: f64,
    pub row_is_null_ratio: f64,
    pub unique_row_ratio: f64,
    pub duplicate_row_count: u64,
    pub file_type: String,
    pub encoding: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnProfile {
    pub column_name: String,
    pub data_type: String,
    pub data_label: String,
    pub categorical: bool,
    pub order: String,
    /// At most [`ColumnProfile::MAX_SAMPLES`] values.
    pub samples: Vec<String>,
    pub statistics: ColumnStatistics,
}

impl ColumnProfile {
    pub const MAX_SAMPLES: usize = 10;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnStatistics {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub median: Option<f64>,
    pub mean: Option<f64>,
    pub variance: Option<f64>,
    pub stddev: Option<f64>,
    pub skewness: Option<f64>,
    pub kurtosis: Option<f64>,
    pub sum: Option<f64>,
    pub quantiles: Vec<f64>,
    pub num_zeros: u64,
    pub num_negatives: u64,
    pub unique_count: u64,
    pub unique_ratio: f64,
    pub null_count: u64,
    pub null_types: Vec<String>,
    pub categorical_count: BTreeMap<String, u64>,
}

/// Profile of one worker as far as the aggregator knows it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum TableProfileSlot {
    /// No round has reached the worker yet.
    #[default]
    Unchecked,
    /// Checked while the worker had not completed.
    NotAvailable,
    Available(TableProfile),
}

impl TableProfileSlot {
    pub fn profile(&self) -> Option<&TableProfile> {
        match self {
            Self::Available(profile) => Some(profile),
            _ => None,
        }
    }
}
