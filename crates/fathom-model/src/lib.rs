#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/fathom-finance/fathom/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod opening;
pub mod statements;

pub use engine::{FinancialModel, generate_three_statement_model};
pub use opening::OpeningBalances;
pub use statements::{BalanceSheetItems, BalanceSheetYear, CashFlowYear, IncomeStatementYear};

/// Relative tolerance used when checking the balance-sheet identity.
pub const BALANCE_TOLERANCE: f64 = 1e-6;

/// Absolute tolerance for a balance-sheet residual at a given scale.
///
/// Scales the relative [`BALANCE_TOLERANCE`] by the magnitude of the
/// figures involved, never dropping below the relative tolerance itself.
pub fn balance_tolerance(scale: f64) -> f64 {
    BALANCE_TOLERANCE * scale.abs().max(1.0)
}
