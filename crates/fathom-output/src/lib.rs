#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fathom-finance/fathom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod numbers;
pub mod report;
pub mod statements;
pub mod summary;

pub use report::{Report, ReportBuilder, ReportError};
pub use statements::{render_statements, render_statements_markdown};
pub use summary::{
    CoreAssumptions, DcfExitMultiple, KeyProjectedFinancials, KeyValuationMultiples,
    PerShareValue, Summary, generate_summary_output,
};
