//! Projector hyperparameters.

use serde::{Deserialize, Serialize};

use super::{ProjectionError, Result};

/// Distance used to build the neighborhood graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cosine,
    Euclidean,
}

impl std::str::FromStr for Metric {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Metric::Cosine),
            "euclidean" => Ok(Metric::Euclidean),
            other => Err(ProjectionError::InvalidConfig(format!(
                "unknown metric '{}', expected one of: cosine, euclidean",
                other
            ))),
        }
    }
}

/// UMAP configuration.
///
/// Every field has a default so partial JSON documents deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionConfig {
    /// Neighbors per point in the high-dimensional graph
    #[serde(default = "default_n_neighbors")]
    pub n_neighbors: usize,
    /// Minimum spacing of points in the 2-D layout
    #[serde(default = "default_min_dist")]
    pub min_dist: f64,
    /// Scale of the 2-D layout
    #[serde(default = "default_spread")]
    pub spread: f64,
    #[serde(default)]
    pub metric: Metric,
    /// Optimization epochs when fitting
    #[serde(default = "default_n_epochs")]
    pub n_epochs: usize,
    /// Optimization epochs when placing an unseen vector
    #[serde(default = "default_transform_epochs")]
    pub transform_epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Negative samples drawn per positive edge update
    #[serde(default = "default_negative_sample_rate")]
    pub negative_sample_rate: usize,
    #[serde(default = "default_repulsion_strength")]
    pub repulsion_strength: f64,
    /// Seed for layout initialization and negative sampling
    #[serde(default = "default_random_state")]
    pub random_state: u64,
}

fn default_n_neighbors() -> usize {
    15
}
fn default_min_dist() -> f64 {
    0.1
}
fn default_spread() -> f64 {
    1.0
}
fn default_n_epochs() -> usize {
    200
}
fn default_transform_epochs() -> usize {
    100
}
fn default_learning_rate() -> f64 {
    1.0
}
fn default_negative_sample_rate() -> usize {
    5
}
fn default_repulsion_strength() -> f64 {
    1.0
}
fn default_random_state() -> u64 {
    42
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            n_neighbors: default_n_neighbors(),
            min_dist: default_min_dist(),
            spread: default_spread(),
            metric: Metric::default(),
            n_epochs: default_n_epochs(),
            transform_epochs: default_transform_epochs(),
            learning_rate: default_learning_rate(),
            negative_sample_rate: default_negative_sample_rate(),
            repulsion_strength: default_repulsion_strength(),
            random_state: default_random_state(),
        }
    }
}

impl ProjectionConfig {
    pub fn with_n_neighbors(mut self, n_neighbors: usize) -> Self {
        self.n_neighbors = n_neighbors;
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_n_epochs(mut self, n_epochs: usize) -> Self {
        self.n_epochs = n_epochs;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }

    /// Rejects values the optimizer cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.n_neighbors < 2 {
            return Err(ProjectionError::InvalidConfig(format!(
                "n_neighbors must be at least 2, got {}",
                self.n_neighbors
            )));
        }
        if !(self.spread > 0.0) {
            return Err(ProjectionError::InvalidConfig(format!(
                "spread must be positive, got {}",
                self.spread
            )));
        }
        if !(self.min_dist >= 0.0) || self.min_dist > self.spread {
            return Err(ProjectionError::InvalidConfig(format!(
                "min_dist must be in [0, spread], got {}",
                self.min_dist
            )));
        }
        if self.n_epochs == 0 {
            return Err(ProjectionError::InvalidConfig(
                "n_epochs must be positive".to_string(),
            ));
        }
        if self.transform_epochs == 0 {
            return Err(ProjectionError::InvalidConfig(
                "transform_epochs must be positive".to_string(),
            ));
        }
        if self.negative_sample_rate == 0 {
            return Err(ProjectionError::InvalidConfig(
                "negative_sample_rate must be positive".to_string(),
            ));
        }
        if !(self.learning_rate > 0.0) {
            return Err(ProjectionError::InvalidConfig(format!(
                "learning_rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.repulsion_strength >= 0.0) {
            return Err(ProjectionError::InvalidConfig(format!(
                "repulsion_strength must be non-negative, got {}",
                self.repulsion_strength
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_uses_defaults() {
        let config: ProjectionConfig =
            serde_json::from_str(r#"{"n_neighbors": 8, "metric": "euclidean"}"#).unwrap();
        assert_eq!(config.n_neighbors, 8);
        assert_eq!(config.metric, Metric::Euclidean);
        assert_eq!(config.min_dist, 0.1);
        assert_eq!(config.random_state, 42);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(ProjectionConfig::default()
            .with_n_neighbors(1)
            .validate()
            .is_err());
        assert!(ProjectionConfig::default().with_n_epochs(0).validate().is_err());
        let config = ProjectionConfig {
            min_dist: 2.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_zero_sampling_and_transform_epochs() {
        let no_negatives = ProjectionConfig {
            negative_sample_rate: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_negatives.validate(),
            Err(ProjectionError::InvalidConfig(_))
        ));

        let no_transform = ProjectionConfig {
            transform_epochs: 0,
            ..Default::default()
        };
        assert!(matches!(
            no_transform.validate(),
            Err(ProjectionError::InvalidConfig(_))
        ));

        let parsed: ProjectionConfig =
            serde_json::from_str(r#"{"negative_sample_rate": 0}"#).unwrap();
        assert!(parsed.validate().is_err());
    }

    #[test]
    fn parse_metric() {
        assert_eq!("COSINE".parse::<Metric>().unwrap(), Metric::Cosine);
        assert!("manhattan".parse::<Metric>().is_err());
    }
}
