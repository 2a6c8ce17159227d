//! Engine configuration.
//!
//! Every tunable lives in [`IvfConfig`] and is passed to the engine at construction.
//! Configs can be built in code with the `with_*` setters or read from JSON:
//!
//! ```rust
//! use ivfscan::config::{ExecutionStrategy, IvfConfig};
//!
//! let config = IvfConfig::from_json_str(r#"{ "n_probe": 16, "execution": "parallel" }"#)?;
//! assert_eq!(config.n_probe, 16);
//! assert_eq!(config.execution, ExecutionStrategy::Parallel);
//! assert_eq!(config.embedding_dim, 384);
//! # Ok::<(), ivfscan::IvfError>(())
//! ```

use crate::backend::BackendKind;
use crate::{IvfError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_EMBEDDING_DIM: usize = 384;
pub const DEFAULT_N_PROBE: usize = 8;
pub const DEFAULT_BATCH_SIZE: usize = 65_536;
pub const DEFAULT_DATASET_TAG: &str = "Small_Data";

/// How probed clusters are scanned within one search call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStrategy {
    /// One cluster after another on the calling thread.
    #[default]
    Sequential,
    /// One rayon task per probed cluster, merged after all finish.
    Parallel,
}

/// IVF engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IvfConfig {
    /// Fixed vector dimension of the index.
    pub embedding_dim: usize,

    /// Number of clusters examined per query (nprobe).
    pub n_probe: usize,

    /// Rows per backend call on the batched path. 0 scores each pool in one call.
    pub batch_size: usize,

    /// Backend used when a call does not pick one.
    pub default_backend: BackendKind,

    /// Per-cluster scan strategy.
    pub execution: ExecutionStrategy,

    /// Suffix in on-disk file names, e.g. `cluster_centroids_{tag}.bin`.
    pub dataset_tag: String,
}

impl Default for IvfConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            n_probe: DEFAULT_N_PROBE,
            batch_size: DEFAULT_BATCH_SIZE,
            default_backend: BackendKind::Scalar,
            execution: ExecutionStrategy::Sequential,
            dataset_tag: DEFAULT_DATASET_TAG.to_string(),
        }
    }
}

impl IvfConfig {
    /// Parse and validate a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| IvfError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| IvfError::io(path, e))?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.embedding_dim == 0 {
            return Err(IvfError::Config("embedding_dim must be positive".to_string()));
        }
        if self.n_probe == 0 {
            return Err(IvfError::Config("n_probe must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    pub fn with_n_probe(mut self, n_probe: usize) -> Self {
        self.n_probe = n_probe;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_default_backend(mut self, backend: BackendKind) -> Self {
        self.default_backend = backend;
        self
    }

    pub fn with_execution(mut self, execution: ExecutionStrategy) -> Self {
        self.execution = execution;
        self
    }

    pub fn with_dataset_tag(mut self, tag: impl Into<String>) -> Self {
        self.dataset_tag = tag.into();
        self
    }
}
