//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::influence::DEFAULT_INFLUENCE_LIMIT;
use crate::projection::ProjectionConfig;

/// Top-level settings for [`crate::Recommender`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommenderConfig {
    /// Maximum rows returned when explaining a recommendation
    #[serde(default = "default_influence_limit")]
    pub influence_limit: usize,
    #[serde(default)]
    pub projection: ProjectionConfig,
}

fn default_influence_limit() -> usize {
    DEFAULT_INFLUENCE_LIMIT
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            influence_limit: default_influence_limit(),
            projection: ProjectionConfig::default(),
        }
    }
}

impl RecommenderConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}
