#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fathom-finance/fathom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod assumptions;
pub mod diagnostics;
pub mod error;
pub mod mode;
pub mod processor;
pub mod schema;
pub mod validator;

pub use assumptions::{
    AssumptionSet, ExitMetric, HistoricalBalanceSheet, HistoricalData, HistoricalIncomeStatement,
    TerminalValueMethod, ValuationAssumptions, series_at,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::ValidationError;
pub use mode::{Mode, UnknownModeError};
pub use processor::{
    DEFAULT_PROJECTION_YEARS, ProcessorConfig, RawInputs, ValidatedInputs, process_inputs,
    process_inputs_with_config,
};
pub use schema::{FieldSpec, FieldType, Requirement, Schema, SchemaGroup};
pub use validator::{normalize_horizon, validate_fields};
