// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Roll Engine - Continuous Futures Core Library
//!
//! Turns per-contract futures price history into roll calendars, multiple
//! price series and back-adjusted continuous prices.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core logic, pure and synchronous
//!   - `contract_prices`: Per-contract daily bars
//!   - `roll_calendar`: Roll parameters, calendar generation, overrides
//!   - `multiple_prices`: Current/forward/carry legs with provenance
//!   - `adjusted_prices`: Panama (and ratio) back-adjustment
//!   - `validation`: Findings over calendars and price series
//!
//! - **Application**: Use cases and orchestration
//!   - `ports`: `ContractPriceRepository`, `PriceArtifactSink`
//!   - `use_cases`: `InstrumentPipeline`, `UpdateInstrumentsUseCase`
//!   - `dto`: Flat tables handed to storage
//!
//! - **Infrastructure**: Adapters
//!   - `persistence`: In-memory and JSON-on-disk stores
//!
//! - **Batch**: Rayon execution of independent instrument pipelines
//! - **Config**: YAML configuration with environment interpolation
//! - **Observability**: Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core logic with no I/O.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Storage adapters.
pub mod infrastructure;

// =============================================================================
// Cross-cutting Modules
// =============================================================================

/// Parallel execution of instrument pipelines.
pub mod batch;

/// Configuration loading and validation.
pub mod config;

/// Metrics exporter and metric names.
pub mod observability;

// =============================================================================
// Re-exports
// =============================================================================

// Domain re-exports
pub use domain::adjusted_prices::{AdjustedPriceBuilder, AdjustedPriceSeries, AdjustmentMethod};
pub use domain::contract_prices::{ContractPriceSeries, ContractPriceSet, PriceBar};
pub use domain::multiple_prices::{MultiplePriceBuilder, MultiplePriceSeries};
pub use domain::roll_calendar::{
    RollCalendar, RollCalendarEntry, RollCalendarGenerator, RollParameters,
};
pub use domain::shared::{ContractCycle, ContractIdentifier, InstrumentCode, MonthCode};
pub use domain::validation::{ValidationReport, Validator};

// Application re-exports
pub use application::ports::{ContractPriceRepository, PriceArtifactSink};
pub use application::use_cases::{InstrumentPipeline, UpdateInstrumentsUseCase};

// Infrastructure re-exports
pub use infrastructure::persistence::{
    InMemoryArtifactSink, InMemoryContractRepository, JsonFileStore,
};
