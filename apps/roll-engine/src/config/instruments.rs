//! Per-instrument roll configuration.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::application::use_cases::InstrumentSpec;
use crate::domain::roll_calendar::{AssetClass, CarryOffset, RollCalendarEntry, RollParameters};
use crate::domain::shared::{ContractCycle, InstrumentCode};

/// Roll configuration of one instrument.
///
/// With `asset_class` set, the class preset supplies every field not given
/// explicitly. Without it, `roll_offset_days` and `priced_cycle` are required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Preset to start from.
    #[serde(default)]
    pub asset_class: Option<AssetClass>,
    /// Days before expiry to target the roll.
    #[serde(default)]
    pub roll_offset_days: Option<i64>,
    /// `1` for the next contract as carry, `-1` for the previous one.
    #[serde(default)]
    pub carry_offset: Option<CarryOffset>,
    /// Priced months, e.g. `HMUZ`.
    #[serde(default)]
    pub priced_cycle: Option<ContractCycle>,
    /// Held months; defaults to the priced cycle.
    #[serde(default)]
    pub hold_cycle: Option<ContractCycle>,
    /// Expiry as days after the first of the delivery month.
    #[serde(default)]
    pub expiry_offset_days: Option<i32>,
    /// Manual roll calendar corrections.
    #[serde(default)]
    pub overrides: Vec<RollCalendarEntry>,
}

impl InstrumentConfig {
    /// Resolve into immutable roll parameters.
    ///
    /// # Errors
    ///
    /// Returns error if a required field is missing or the parameters are
    /// invalid.
    pub fn roll_parameters(&self, code: &str) -> Result<RollParameters, ConfigError> {
        let invalid =
            |message: String| ConfigError::ValidationError(format!("instruments.{code}: {message}"));
        let preset = self.asset_class.map(RollParameters::preset);

        let roll_offset_days = self
            .roll_offset_days
            .or_else(|| preset.as_ref().map(|p| i64::from(p.roll_offset_days())))
            .ok_or_else(|| invalid("roll_offset_days is required without asset_class".to_string()))?;
        let carry_offset = self
            .carry_offset
            .or_else(|| preset.as_ref().map(RollParameters::carry_offset))
            .unwrap_or(CarryOffset::Next);
        let priced_cycle = self
            .priced_cycle
            .clone()
            .or_else(|| preset.as_ref().map(|p| p.priced_cycle().clone()))
            .ok_or_else(|| invalid("priced_cycle is required without asset_class".to_string()))?;
        let hold_cycle = self
            .hold_cycle
            .clone()
            .or_else(|| preset.as_ref().map(|p| p.hold_cycle().clone()))
            .unwrap_or_else(|| priced_cycle.clone());
        let expiry_offset_days = self
            .expiry_offset_days
            .or_else(|| preset.as_ref().map(RollParameters::expiry_offset_days))
            .unwrap_or(0);

        RollParameters::new(roll_offset_days, carry_offset, priced_cycle, hold_cycle)
            .map(|p| p.with_expiry_offset_days(expiry_offset_days))
            .map_err(|e| invalid(e.to_string()))
    }

    /// Resolve into a pipeline input spec.
    ///
    /// # Errors
    ///
    /// Returns error if the code or the parameters are invalid, or an
    /// override names another instrument's contract.
    pub fn spec(&self, code: &str) -> Result<InstrumentSpec, ConfigError> {
        let instrument = InstrumentCode::new(code)
            .map_err(|e| ConfigError::ValidationError(format!("instruments.{code}: {e}")))?;
        let params = self.roll_parameters(code)?;

        for entry in &self.overrides {
            if entry.current_contract().instrument() != &instrument
                || entry.next_contract().instrument() != &instrument
            {
                return Err(ConfigError::ValidationError(format!(
                    "instruments.{code}: override {} -> {} names another instrument",
                    entry.current_contract(),
                    entry.next_contract()
                )));
            }
        }

        Ok(InstrumentSpec {
            instrument,
            params,
            overrides: self.overrides.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn preset_fills_missing_fields() {
        let config = InstrumentConfig {
            asset_class: Some(AssetClass::Energy),
            roll_offset_days: Some(7),
            ..InstrumentConfig::default()
        };

        let params = config.roll_parameters("CRUDE_W").unwrap();

        assert_eq!(params.roll_offset_days(), 7);
        assert_eq!(params.carry_offset(), CarryOffset::Previous);
        assert_eq!(params.hold_cycle(), &ContractCycle::monthly());
    }

    #[test]
    fn hold_defaults_to_priced() {
        let config = InstrumentConfig {
            roll_offset_days: Some(5),
            priced_cycle: Some("HMUZ".parse().unwrap()),
            ..InstrumentConfig::default()
        };

        let params = config.roll_parameters("SP500").unwrap();

        assert_eq!(params.hold_cycle(), params.priced_cycle());
        assert_eq!(params.carry_offset(), CarryOffset::Next);
    }

    #[test_case(None, Some("HMUZ"), "roll_offset_days" ; "missing offset")]
    #[test_case(Some(5), None, "priced_cycle" ; "missing cycle")]
    #[test_case(Some(-2), Some("HMUZ"), "non-negative" ; "negative offset")]
    fn rejects_incomplete_config(offset: Option<i64>, priced: Option<&str>, expected: &str) {
        let config = InstrumentConfig {
            roll_offset_days: offset,
            priced_cycle: priced.map(|p| p.parse().unwrap()),
            ..InstrumentConfig::default()
        };

        let err = config.roll_parameters("SP500").unwrap_err();

        assert!(err.to_string().contains(expected), "{err}");
    }

    #[test]
    fn override_for_other_instrument_rejected() {
        let entry: RollCalendarEntry = serde_json::from_str(
            r#"{"roll_date":"2024-03-08","current_contract":"GOLD_20240300","next_contract":"GOLD_20240600","carry_contract":"GOLD_20240600"}"#,
        )
        .unwrap();
        let config = InstrumentConfig {
            asset_class: Some(AssetClass::Equity),
            overrides: vec![entry],
            ..InstrumentConfig::default()
        };

        assert!(config.spec("SP500").is_err());
        assert!(config.spec("GOLD").is_ok());
    }
}
