//! Data Transfer Objects (DTOs)
//!
//! Flat table records written by storage adapters.

mod artifacts_dto;

pub use artifacts_dto::{
    AdjustedPriceRecord, InstrumentArtifacts, MultiplePriceRecord, RollCalendarRecord,
    RollQualityRecord,
};
