use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::{
    factorization::{FactorizationMethod, NodeConnector},
    graph::{NodeMode, StateGraph},
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Factorization settings supplied by the query compiler
#[derive(Clone, Debug, PartialEq, Validate, Serialize, Deserialize)]
#[validate(schema(function = "validate_branch_mode"))]
#[serde(default)]
pub struct FactorizationConfig {
    /// Inequality strategy, `auto` picks one per conjunction
    pub method: FactorizationMethod,

    /// Representation of intermediate nodes (plain for paths, branched for trees)
    pub node_mode: NodeMode,

    /// Branch of the left payload nodes that receives the new edges (0-1024)
    #[validate(range(max = 1024, message = "Branch must be at most 1024"))]
    pub branch: usize,
}

impl Default for FactorizationConfig {
    fn default() -> Self {
        Self {
            method: FactorizationMethod::Auto,
            node_mode: NodeMode::Plain,
            branch: 0,
        }
    }
}

fn validate_branch_mode(config: &FactorizationConfig) -> Result<(), ValidationError> {
    if config.node_mode == NodeMode::Plain && config.branch != 0 {
        let mut err = ValidationError::new("branch_in_plain_mode");
        err.message = Some("A non-zero branch requires the branched node mode".into());
        return Err(err);
    }
    Ok(())
}

impl FactorizationConfig {
    /// Create configuration from environment variables with validation
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            method: parse_env_var("THETAJOIN_FACTORIZATION_METHOD", "auto")?,
            node_mode: parse_env_var("THETAJOIN_NODE_MODE", "plain")?,
            branch: parse_env_var("THETAJOIN_BRANCH", "0")?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// A connector writing into `graph` with this configuration's node mode
    pub fn connector<'g>(&self, graph: &'g mut StateGraph) -> NodeConnector<'g> {
        NodeConnector::new(graph, self.node_mode, self.branch)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let value = match env::var(key) {
        Ok(value) => value,
        Err(env::VarError::NotPresent) => default.to_string(),
        Err(e) => return Err(ConfigError::EnvVar(e)),
    };
    value.parse().map_err(|e: T::Err| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: e.into(),
    })
}
