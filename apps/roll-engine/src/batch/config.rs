//! Configuration for batch instrument runs.

use serde::{Deserialize, Serialize};

/// Configuration for running many instrument pipelines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Maximum number of threads to use (0 = use all available).
    pub max_threads: usize,

    /// Whether to collect detailed progress metrics.
    pub track_progress: bool,

    /// Whether to continue when an instrument fails.
    pub continue_on_error: bool,

    /// Minimum parallelization threshold (jobs below this run sequentially).
    pub min_parallel_jobs: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_threads: 0,
            track_progress: true,
            continue_on_error: true,
            min_parallel_jobs: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_config_default() {
        let config = BatchConfig::default();

        assert_eq!(config.max_threads, 0);
        assert!(config.continue_on_error);
        assert!(config.track_progress);
        assert_eq!(config.min_parallel_jobs, 4);
    }

    #[test]
    fn test_batch_config_partial_yaml() {
        let config: BatchConfig = serde_yaml_bw::from_str("max_threads: 2\n").unwrap();
        assert_eq!(config.max_threads, 2);
        assert!(config.continue_on_error);
    }
}
