//! Storage locations for the JSON file store.

use serde::{Deserialize, Serialize};

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory of per-instrument contract price files.
    #[serde(default = "default_contracts_dir")]
    pub contracts_dir: String,
    /// Directory that receives per-instrument artifacts.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            contracts_dir: default_contracts_dir(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_contracts_dir() -> String {
    "./data/contracts".to_string()
}

fn default_output_dir() -> String {
    "./data/output".to_string()
}
