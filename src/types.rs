use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type MovieId = String;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Movie {
    pub id: MovieId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prequel: Option<MovieId>,
    pub title: String,
    pub from: String,
    /// The rating scale is one to five stars.
    pub rating: f64,
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub revenue: i64,
}
