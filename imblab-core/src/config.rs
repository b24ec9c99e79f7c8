//! Pipeline configuration, loadable from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) yields
//! the stock setup: the public repository URLs, factors `[2, 3]`, a minority
//! floor of 15 samples and master seed 0.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub sources: SourceUrls,
    pub imbalance: ImbalanceConfig,
    pub http: HttpConfig,
}

/// Base URLs of the remote repositories.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceUrls {
    pub uci: String,
    pub keel: String,
    pub openml_eucalyptus: String,
    pub pima_db: String,
}

impl Default for SourceUrls {
    fn default() -> Self {
        Self {
            uci: "https://archive.ics.uci.edu/ml/machine-learning-databases/".into(),
            keel: "http://sci2s.ugr.es/keel/keel-dataset/datasets/imbalanced/".into(),
            openml_eucalyptus:
                "https://www.openml.org/data/get_csv/3625/dataset_194_eucalyptus.arff".into(),
            pima_db: "https://raw.githubusercontent.com/IMS-ML-Lab/publications/master/assets/data/various.db"
                .into(),
        }
    }
}

/// Settings for the derived, undersampled datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImbalanceConfig {
    /// Each factor divides the minority count of every eligible dataset.
    pub multiplication_factors: Vec<f64>,
    /// A variant is only derived if it keeps at least this many positives.
    pub min_minority_samples: usize,
    /// Master seed for undersampling and synthetic generators.
    pub seed: u64,
}

impl Default for ImbalanceConfig {
    fn default() -> Self {
        Self {
            multiplication_factors: vec![2.0, 3.0],
            min_minority_samples: 15,
            seed: 0,
        }
    }
}

/// Upper bound accepted for `http.max_retries`.
pub const MAX_RETRIES: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    /// Extra attempts after the first one. Zero means one-shot.
    pub max_retries: u32,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 120,
            max_retries: 0,
            user_agent: concat!("imblab/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl PipelineConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: PipelineConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, url) in [
            ("sources.uci", &self.sources.uci),
            ("sources.keel", &self.sources.keel),
            ("sources.openml_eucalyptus", &self.sources.openml_eucalyptus),
            ("sources.pima_db", &self.sources.pima_db),
        ] {
            if url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }

        if let Some(bad) = self
            .imbalance
            .multiplication_factors
            .iter()
            .find(|f| !f.is_finite() || **f <= 0.0)
        {
            return Err(ConfigError::Invalid(format!(
                "multiplication factor {bad} must be finite and positive"
            )));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be > 0".into()));
        }
        if self.http.max_retries > MAX_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "http.max_retries must be at most {MAX_RETRIES}"
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = PipelineConfig::from_toml("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.imbalance.multiplication_factors, vec![2.0, 3.0]);
        assert_eq!(config.imbalance.min_minority_samples, 15);
        assert_eq!(config.http.max_retries, 0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = PipelineConfig::from_toml(
            r#"
[imbalance]
multiplication_factors = [1.5, 4.0]
seed = 7

[http]
max_retries = 2
"#,
        )
        .unwrap();
        assert_eq!(config.imbalance.multiplication_factors, vec![1.5, 4.0]);
        assert_eq!(config.imbalance.seed, 7);
        assert_eq!(config.imbalance.min_minority_samples, 15);
        assert_eq!(config.http.max_retries, 2);
        assert_eq!(config.sources, SourceUrls::default());
    }

    #[test]
    fn rejects_non_positive_factor() {
        let err = PipelineConfig::from_toml("[imbalance]\nmultiplication_factors = [2.0, 0.0]\n")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_empty_url_and_zero_timeout() {
        assert!(PipelineConfig::from_toml("[sources]\nuci = \"\"\n").is_err());
        assert!(PipelineConfig::from_toml("[http]\ntimeout_secs = 0\n").is_err());
    }

    #[test]
    fn retries_are_bounded() {
        assert!(PipelineConfig::from_toml("[http]\nmax_retries = 10\n").is_ok());
        let err = PipelineConfig::from_toml("[http]\nmax_retries = 40\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(msg) if msg.contains("max_retries")));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = PipelineConfig::from_toml("[imbalance\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
