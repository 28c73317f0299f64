//! Pipeline-wide settings.

use serde::{Deserialize, Serialize};

use crate::application::use_cases::PipelineSettings;
use crate::domain::adjusted_prices::AdjustmentMethod;
use crate::domain::roll_calendar::DEFAULT_SEARCH_WINDOW_DAYS;
use crate::domain::validation::ValidationConfig;

/// Pipeline configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Back-adjustment method (`panama` or `ratio`).
    #[serde(default)]
    pub adjustment_method: AdjustmentMethod,
    /// Roll date search radius in calendar days.
    #[serde(default = "default_search_window")]
    pub roll_search_window_days: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            adjustment_method: AdjustmentMethod::default(),
            roll_search_window_days: default_search_window(),
        }
    }
}

impl PipelineConfig {
    /// Combine with validation thresholds into pipeline settings.
    #[must_use]
    pub fn settings(&self, validation: &ValidationConfig) -> PipelineSettings {
        PipelineSettings {
            search_window_days: self.roll_search_window_days,
            adjustment_method: self.adjustment_method,
            validation: validation.clone(),
        }
    }
}

const fn default_search_window() -> u32 {
    DEFAULT_SEARCH_WINDOW_DAYS
}
