//! Build Instrument Use Case
//!
//! The per-instrument pipeline: generate the roll calendar, apply manual
//! overrides, build multiple and adjusted prices, then validate. Pure and
//! synchronous; callers decide where it runs.

use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::application::dto::InstrumentArtifacts;
use crate::domain::adjusted_prices::{
    AdjustedPriceBuilder, AdjustedPriceSeries, AdjustmentError, AdjustmentMethod,
};
use crate::domain::contract_prices::{ContractPriceSet, NotFoundError};
use crate::domain::multiple_prices::{MultiplePriceBuilder, MultiplePriceSeries};
use crate::domain::roll_calendar::{
    DEFAULT_SEARCH_WINDOW_DAYS, InsufficientOverlapError, RollCalendar, RollCalendarEntry,
    RollCalendarError, RollCalendarGenerator, RollParameters, RollQuality, analyze_rolls,
};
use crate::domain::shared::InstrumentCode;
use crate::domain::validation::{Severity, ValidationConfig, ValidationReport, Validator};
use crate::observability;

/// Pipeline-wide settings shared by every instrument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSettings {
    /// Roll date search radius in calendar days.
    pub search_window_days: u32,
    /// Back-adjustment method.
    pub adjustment_method: AdjustmentMethod,
    /// Validation thresholds.
    pub validation: ValidationConfig,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            search_window_days: DEFAULT_SEARCH_WINDOW_DAYS,
            adjustment_method: AdjustmentMethod::default(),
            validation: ValidationConfig::default(),
        }
    }
}

/// Everything one instrument run needs.
#[derive(Debug, Clone)]
pub struct InstrumentInput {
    /// Roll parameters.
    pub params: RollParameters,
    /// Contract history.
    pub contracts: ContractPriceSet,
    /// Manual calendar corrections, applied in order.
    pub overrides: Vec<RollCalendarEntry>,
}

impl InstrumentInput {
    /// Input without overrides.
    #[must_use]
    pub const fn new(params: RollParameters, contracts: ContractPriceSet) -> Self {
        Self {
            params,
            contracts,
            overrides: Vec::new(),
        }
    }

    /// Add manual calendar corrections.
    #[must_use]
    pub fn with_overrides(mut self, overrides: Vec<RollCalendarEntry>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Instrument code.
    #[must_use]
    pub const fn instrument(&self) -> &InstrumentCode {
        self.contracts.instrument()
    }
}

/// Result of one instrument run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOutput {
    /// Roll calendar, with overrides applied.
    pub calendar: RollCalendar,
    /// Current/forward/carry prices.
    pub multiple: MultiplePriceSeries,
    /// Back-adjusted prices.
    pub adjusted: AdjustedPriceSeries,
    /// Findings from every check.
    pub validation: ValidationReport,
    /// Gap and volume shift at each roll.
    pub roll_quality: Vec<RollQuality>,
}

impl PipelineOutput {
    /// Tables for the storage hand-off.
    #[must_use]
    pub fn artifacts(&self) -> InstrumentArtifacts {
        InstrumentArtifacts::from_domain(
            &self.calendar,
            &self.multiple,
            &self.adjusted,
            &self.roll_quality,
            self.validation.clone(),
        )
    }
}

/// Pipeline error for one instrument.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// Two consecutive contracts never traded on a common date near the target.
    #[error(transparent)]
    InsufficientOverlap(#[from] InsufficientOverlapError),

    /// A contract the calendar designates has no series.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A manual override broke a calendar invariant.
    #[error("Rejected roll calendar override: {0}")]
    Override(#[from] RollCalendarError),

    /// Back-adjustment could not price a roll.
    #[error(transparent)]
    Adjustment(#[from] AdjustmentError),
}

impl PipelineError {
    /// Short label for metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InsufficientOverlap(_) => "insufficient_overlap",
            Self::NotFound(_) => "not_found",
            Self::Override(_) => "override_rejected",
            Self::Adjustment(_) => "adjustment",
        }
    }
}

/// Runs the full calendar-to-adjusted-prices pipeline for one instrument.
#[derive(Debug, Clone, Default)]
pub struct InstrumentPipeline {
    generator: RollCalendarGenerator,
    multiple_builder: MultiplePriceBuilder,
    adjusted_builder: AdjustedPriceBuilder,
    validator: Validator,
}

impl InstrumentPipeline {
    /// Create a pipeline from settings.
    #[must_use]
    pub fn new(settings: &PipelineSettings) -> Self {
        Self {
            generator: RollCalendarGenerator::new(settings.search_window_days),
            multiple_builder: MultiplePriceBuilder::new(),
            adjusted_builder: AdjustedPriceBuilder::new(settings.adjustment_method),
            validator: Validator::new(settings.validation.clone()),
        }
    }

    /// Run the pipeline.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error: insufficient overlap, a missing
    /// contract, a rejected override or an unpriceable roll.
    pub fn run(&self, input: &InstrumentInput) -> Result<PipelineOutput, PipelineError> {
        let instrument = input.instrument().clone();
        let span = info_span!("instrument_pipeline", instrument = %instrument);
        let _guard = span.enter();
        let started = Instant::now();

        let result = self.run_stages(input);
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(output) => {
                observability::record_pipeline_run("success", elapsed);
                observability::update_roll_entries(instrument.as_str(), output.calendar.len());
                info!(
                    rolls = output.calendar.len(),
                    rows = output.adjusted.len(),
                    findings = output.validation.findings().len(),
                    elapsed_ms = started.elapsed().as_millis(),
                    "Instrument pipeline complete"
                );
            }
            Err(e) => {
                observability::record_pipeline_run(e.kind(), elapsed);
                error!(error = %e, "Instrument pipeline failed");
            }
        }

        result
    }

    fn run_stages(&self, input: &InstrumentInput) -> Result<PipelineOutput, PipelineError> {
        let mut calendar = self.generator.generate(&input.contracts, &input.params)?;
        debug!(rolls = calendar.len(), "Generated roll calendar");

        for entry in &input.overrides {
            let outcome = calendar.apply_override(entry.clone(), &input.contracts, &input.params)?;
            info!(
                contract = %entry.current_contract(),
                roll_date = %entry.roll_date(),
                outcome = ?outcome,
                "Applied roll calendar override"
            );
        }

        let multiple = self.multiple_builder.build(&input.contracts, &calendar)?;
        let adjusted = self.adjusted_builder.build(&multiple)?;

        let mut validation = self.validator.validate(&calendar, &multiple, &input.contracts);
        validation.merge(self.validator.validate_adjusted(&adjusted));
        log_findings(&validation);

        let roll_quality = analyze_rolls(&calendar, &input.contracts);
        for roll in &roll_quality {
            debug!(
                roll_date = %roll.roll_date,
                current = %roll.current_contract,
                next = %roll.next_contract,
                price_gap = ?roll.price_gap,
                gap_pct = ?roll.gap_pct,
                volume_ratio = ?roll.volume_ratio,
                "Roll quality"
            );
        }

        Ok(PipelineOutput {
            calendar,
            multiple,
            adjusted,
            validation,
            roll_quality,
        })
    }
}

fn log_findings(report: &ValidationReport) {
    for finding in report.findings() {
        observability::record_validation_finding(finding.severity.as_str(), finding.code.as_str());
        match finding.severity {
            Severity::Warning => warn!(
                code = %finding.code,
                context = ?finding.context,
                "{}",
                finding.message
            ),
            Severity::Error => error!(
                code = %finding.code,
                context = ?finding.context,
                "{}",
                finding.message
            ),
        }
    }
}
