//! Input processing entry point.

use crate::assumptions::{
    AssumptionSet, HistoricalData, ValuationAssumptions, apply_uncoercible_defaults,
};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::ValidationError;
use crate::mode::Mode;
use crate::schema::{Schema, keys};
use crate::validator::validate_fields;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Standard projection horizon in years.
pub const DEFAULT_PROJECTION_YEARS: usize = 5;

const COMPONENT: &str = "input_processor";

/// Raw, unvalidated inputs as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawInputs {
    /// Financial assumptions.
    #[serde(default)]
    pub assumptions: Option<Map<String, Value>>,

    /// Valuation assumptions.
    #[serde(default)]
    pub valuation_assumptions: Option<Map<String, Value>>,

    /// Prior-period actuals.
    #[serde(default)]
    pub historical_data: Option<Value>,
}

/// Input processor configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessorConfig {
    /// Length every projection series is normalized to.
    pub projection_years: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            projection_years: DEFAULT_PROJECTION_YEARS,
        }
    }
}

/// Validated, typed inputs plus everything found wrong with them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedInputs {
    /// Mode the inputs were validated under.
    pub mode: Mode,

    /// Horizon the projection series were normalized to.
    pub projection_years: usize,

    /// Financial assumptions.
    pub assumptions: AssumptionSet,

    /// Valuation assumptions.
    pub valuation_assumptions: ValuationAssumptions,

    /// Prior-period actuals (empty when none were supplied).
    pub historical_data: HistoricalData,

    /// Validation errors.
    #[serde(serialize_with = "serialize_errors")]
    pub errors: Vec<ValidationError>,

    /// Non-error diagnostics.
    pub diagnostics: Diagnostics,
}

fn serialize_errors<S>(errors: &[ValidationError], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(errors.iter().map(ToString::to_string))
}

impl ValidatedInputs {
    /// Whether validation found no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable validation error messages.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

/// Validate and normalize raw inputs for a mode using the standard horizon.
///
/// See [`process_inputs_with_config`].
pub fn process_inputs(raw: &RawInputs, mode: Mode) -> ValidatedInputs {
    process_inputs_with_config(raw, mode, &ProcessorConfig::default())
}

/// Validate and normalize raw inputs for a mode.
///
/// Never fails: every problem is collected into
/// [`ValidatedInputs::errors`] and the caller decides whether to proceed.
/// After validation every projection series is forced to exactly
/// `config.projection_years` elements.
///
/// # Examples
///
/// ```
/// use fathom_inputs::{Mode, ProcessorConfig, RawInputs, process_inputs_with_config};
///
/// let config = ProcessorConfig { projection_years: 7 };
/// let inputs = process_inputs_with_config(&RawInputs::default(), Mode::Founder, &config);
///
/// assert!(inputs.is_valid());
/// assert_eq!(inputs.assumptions.capex_pct.as_ref().map(Vec::len), Some(7));
///
/// let investor = process_inputs_with_config(&RawInputs::default(), Mode::Investor, &config);
/// assert!(!investor.is_valid());
/// ```
pub fn process_inputs_with_config(
    raw: &RawInputs,
    mode: Mode,
    config: &ProcessorConfig,
) -> ValidatedInputs {
    let assumption_schema = Schema::assumptions(mode);
    let valuation_schema = Schema::valuation(mode);
    let (mut assumption_fields, mut errors) =
        validate_fields(raw.assumptions.as_ref(), &assumption_schema);
    let (mut valuation_fields, valuation_errors) =
        validate_fields(raw.valuation_assumptions.as_ref(), &valuation_schema);
    errors.extend(valuation_errors);
    apply_uncoercible_defaults(&mut assumption_fields, &assumption_schema);
    apply_uncoercible_defaults(&mut valuation_fields, &valuation_schema);

    let mut diagnostics = Diagnostics::new();

    // A historical block nested under the assumptions is accepted when no
    // top-level block was supplied.
    let historical_source = raw
        .historical_data
        .as_ref()
        .filter(|v| !v.is_null())
        .or_else(|| assumption_fields.get(keys::HISTORICAL_DATA));
    let historical_data = match historical_source {
        Some(value) => {
            serde_json::from_value::<HistoricalData>(value.clone()).unwrap_or_else(|err| {
                errors.push(ValidationError::InvalidHistoricalData(err.to_string()));
                HistoricalData::default()
            })
        }
        None => HistoricalData::default(),
    };

    if mode == Mode::Investor && historical_data.is_empty() {
        diagnostics.push(Diagnostic::data_gap(
            COMPONENT,
            "Investor mode selected but minimal or no historical data provided; \
             the model will rely on base assumptions",
        ));
    }

    let mut assumptions = AssumptionSet::from_fields(&assumption_fields);
    assumptions.normalize_horizon(config.projection_years, &mut errors);
    let valuation_assumptions = ValuationAssumptions::from_fields(&valuation_fields);

    tracing::debug!(
        mode = %mode,
        projection_years = config.projection_years,
        errors = errors.len(),
        "Processed inputs"
    );

    ValidatedInputs {
        mode,
        projection_years: config.projection_years,
        assumptions,
        valuation_assumptions,
        historical_data,
        errors,
        diagnostics,
    }
}
