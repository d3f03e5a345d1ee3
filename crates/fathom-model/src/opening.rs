//! Opening balance sheet for the first projection year.
//!
//! Each figure is taken from historical actuals when supplied, then from
//! the corresponding base assumption, then zero.

use fathom_inputs::{Diagnostic, Diagnostics, ValidatedInputs};
use serde::{Deserialize, Serialize};

use crate::balance_tolerance;

const COMPONENT: &str = "model_engine";

/// Position of the business immediately before year 1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpeningBalances {
    /// Revenue of the base year.
    pub revenue: f64,
    /// D&A of the base year.
    pub depreciation_and_amortization: f64,
    /// Cash.
    pub cash: f64,
    /// Total debt, all carried as long-term.
    pub total_debt: f64,
    /// Net PP&E.
    pub ppe_net: f64,
    /// Common stock.
    pub common_stock: f64,
    /// Retained earnings.
    pub retained_earnings: f64,
    /// Accounts receivable.
    pub accounts_receivable: f64,
    /// Inventory.
    pub inventory: f64,
    /// Accounts payable.
    pub accounts_payable: f64,
    /// Whether retained earnings were derived to balance the sheet.
    pub retained_earnings_derived: bool,
}

impl OpeningBalances {
    /// Resolve opening balances from validated inputs.
    ///
    /// When no retained earnings figure is supplied it is derived so the
    /// opening sheet balances. A fully supplied sheet that does not
    /// balance is kept as-is and reported; its residual then carries into
    /// every projected year.
    pub fn from_inputs(inputs: &ValidatedInputs, diagnostics: &mut Diagnostics) -> Self {
        let a = &inputs.assumptions;
        let history = &inputs.historical_data;

        let revenue = history.revenue().or(a.base_revenue).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::data_gap(
                COMPONENT,
                "No base-year revenue supplied; projecting from zero",
            ));
            0.0
        });
        let depreciation_and_amortization =
            history.depreciation().or(a.base_depreciation).unwrap_or(0.0);

        let cash = history.balance(|bs| bs.cash).or(a.base_cash).unwrap_or(0.0);
        let total_debt = history
            .balance(|bs| bs.total_debt)
            .or(a.base_debt)
            .unwrap_or(0.0);
        let ppe_net = history
            .balance(|bs| bs.ppe_net)
            .or(a.base_ppe_net)
            .unwrap_or(0.0);
        let common_stock = history
            .balance(|bs| bs.common_stock)
            .or(a.base_common_stock)
            .unwrap_or(0.0);
        let accounts_receivable = history
            .balance(|bs| bs.accounts_receivable)
            .or(a.base_receivables)
            .unwrap_or(0.0);
        let inventory = history
            .balance(|bs| bs.inventory)
            .or(a.base_inventory)
            .unwrap_or(0.0);
        let accounts_payable = history
            .balance(|bs| bs.accounts_payable)
            .or(a.base_payables)
            .unwrap_or(0.0);

        let mut opening = Self {
            revenue,
            depreciation_and_amortization,
            cash,
            total_debt,
            ppe_net,
            common_stock,
            retained_earnings: 0.0,
            accounts_receivable,
            inventory,
            accounts_payable,
            retained_earnings_derived: false,
        };

        match history
            .balance(|bs| bs.retained_earnings)
            .or(a.base_retained_earnings)
        {
            Some(retained_earnings) => {
                opening.retained_earnings = retained_earnings;
                let residual = opening.balance_check();
                if residual.abs() > balance_tolerance(opening.total_assets()) {
                    diagnostics.push(Diagnostic::data_gap(
                        COMPONENT,
                        format!(
                            "Opening balance sheet does not balance (assets exceed liabilities \
                             and equity by {residual:.2}); the difference carries into every \
                             projected year"
                        ),
                    ));
                }
            }
            None => {
                opening.retained_earnings =
                    opening.total_assets() - opening.total_liabilities() - common_stock;
                opening.retained_earnings_derived = true;
                tracing::debug!(
                    retained_earnings = opening.retained_earnings,
                    "derived opening retained earnings"
                );
            }
        }

        opening
    }

    /// Cash + receivables + inventory + net PP&E.
    pub const fn total_assets(&self) -> f64 {
        self.cash + self.accounts_receivable + self.inventory + self.ppe_net
    }

    /// Payables + debt.
    pub const fn total_liabilities(&self) -> f64 {
        self.accounts_payable + self.total_debt
    }

    /// Common stock + retained earnings.
    pub const fn total_equity(&self) -> f64 {
        self.common_stock + self.retained_earnings
    }

    /// Assets less liabilities and equity.
    pub const fn balance_check(&self) -> f64 {
        self.total_assets() - self.total_liabilities() - self.total_equity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fathom_inputs::{DiagnosticKind, Mode, RawInputs, process_inputs};
    use serde_json::json;

    fn inputs(mode: Mode, value: serde_json::Value) -> ValidatedInputs {
        let raw: RawInputs = serde_json::from_value(value).unwrap();
        process_inputs(&raw, mode)
    }

    #[test]
    fn test_founder_defaults_derive_retained_earnings() {
        let inputs = inputs(Mode::Founder, json!({}));
        let mut diagnostics = Diagnostics::new();
        let opening = OpeningBalances::from_inputs(&inputs, &mut diagnostics);

        assert_relative_eq!(opening.revenue, 1_000_000.0);
        assert_relative_eq!(opening.cash, 100_000.0);
        assert_relative_eq!(opening.total_debt, 50_000.0);
        assert_relative_eq!(opening.ppe_net, 200_000.0);
        assert!(opening.retained_earnings_derived);
        assert_relative_eq!(opening.balance_check(), 0.0, epsilon = 1e-9);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_supplied_unbalanced_sheet_reported() {
        let inputs = inputs(
            Mode::Founder,
            json!({"assumptions": {"baseRetainedEarnings": 50000}}),
        );
        let mut diagnostics = Diagnostics::new();
        let opening = OpeningBalances::from_inputs(&inputs, &mut diagnostics);

        assert!(!opening.retained_earnings_derived);
        assert_relative_eq!(opening.retained_earnings, 50_000.0);
        // 300k assets against 50k debt + 100k stock + 50k earnings.
        assert_relative_eq!(opening.balance_check(), 100_000.0);
        assert_eq!(diagnostics.of_kind(DiagnosticKind::DataGap).count(), 1);
    }

    #[test]
    fn test_history_takes_precedence() {
        let inputs = inputs(
            Mode::Founder,
            json!({
                "historicalData": {
                    "incomeStatement": {
                        "revenue": 2_000_000,
                        "depreciationAndAmortization": 80_000
                    },
                    "balanceSheet": {"cash": 300_000, "totalDebt": 0}
                }
            }),
        );
        let mut diagnostics = Diagnostics::new();
        let opening = OpeningBalances::from_inputs(&inputs, &mut diagnostics);

        assert_relative_eq!(opening.revenue, 2_000_000.0);
        assert_relative_eq!(opening.depreciation_and_amortization, 80_000.0);
        assert_relative_eq!(opening.cash, 300_000.0);
        assert_relative_eq!(opening.total_debt, 0.0);
        // Not in history, so the base assumption applies.
        assert_relative_eq!(opening.ppe_net, 200_000.0);
    }

    #[test]
    fn test_investor_without_baseline_projects_from_zero() {
        let inputs = inputs(Mode::Investor, json!({}));
        let mut diagnostics = Diagnostics::new();
        let opening = OpeningBalances::from_inputs(&inputs, &mut diagnostics);

        assert_relative_eq!(opening.revenue, 0.0);
        assert_relative_eq!(opening.total_assets(), 0.0);
        assert_eq!(diagnostics.len(), 1);
    }
}
