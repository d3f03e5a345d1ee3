#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fathom-finance/fathom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod comps;
pub mod dcf;
pub mod error;

pub use comps::{
    ComparableCompany, ComparableMultiples, CompsAnalysis, CompsSummary, MultipleKind,
    MultipleStats, generate_comps_analysis,
};
pub use dcf::{
    DcfValuation, calculate_fcff, exit_metric_value, generate_dcf_valuation, net_present_value,
    present_values, terminal_value_exit_multiple, terminal_value_perpetual_growth,
};
pub use error::ValuationError;
