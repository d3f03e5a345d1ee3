//! Forward-pass projection of the three statements.
//!
//! Year `t` is computed from the finalized year `t - 1` (or the opening
//! balances when `t = 1`) and year `t` assumptions. Within a year the
//! Income Statement is built first, then every non-cash balance, then the
//! Cash Flow Statement, and finally cash settles the Balance Sheet.

use fathom_inputs::{AssumptionSet, Diagnostic, Diagnostics, Mode, ValidatedInputs, series_at};
use serde::{Deserialize, Serialize};

use crate::balance_tolerance;
use crate::opening::OpeningBalances;
use crate::statements::{BalanceSheetItems, BalanceSheetYear, CashFlowYear, IncomeStatementYear};

const COMPONENT: &str = "model_engine";

/// D&A growth applied when no D&A percentage is available.
pub const DEFAULT_DEPRECIATION_GROWTH: f64 = 0.05;

/// Interest rate on prior-year debt when none is supplied.
pub const DEFAULT_INTEREST_RATE: f64 = 0.05;

/// CapEx as a share of revenue when none is supplied.
pub const DEFAULT_CAPEX_PCT: f64 = 0.03;

/// Receivables as a share of revenue when none is supplied.
pub const DEFAULT_RECEIVABLES_PCT: f64 = 30.0 / 365.0;

/// Inventory as a share of COGS when none is supplied.
pub const DEFAULT_INVENTORY_PCT: f64 = 45.0 / 365.0;

/// Payables as a share of COGS when none is supplied.
pub const DEFAULT_PAYABLES_PCT: f64 = 30.0 / 365.0;

/// A projected three-statement model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialModel {
    /// Income Statement, one record per projection year.
    pub income_statement: Vec<IncomeStatementYear>,
    /// Balance Sheet, one record per projection year.
    pub balance_sheet: Vec<BalanceSheetYear>,
    /// Cash Flow Statement, one record per projection year.
    pub cash_flow_statement: Vec<CashFlowYear>,
    /// Balances the first year was projected from.
    pub opening_balances: OpeningBalances,
    /// Data gaps and imbalances found while projecting.
    pub diagnostics: Diagnostics,
}

impl FinancialModel {
    /// Number of projected years.
    pub fn projection_years(&self) -> usize {
        self.income_statement.len()
    }

    /// Whether the model has no projected years.
    pub fn is_empty(&self) -> bool {
        self.income_statement.is_empty()
    }

    /// Largest absolute balance-sheet residual across all years.
    pub fn max_balance_residual(&self) -> f64 {
        self.balance_sheet
            .iter()
            .map(|bs| bs.balance_sheet_check.abs())
            .fold(0.0, f64::max)
    }

    /// Whether every year balances within a tolerance relative to its
    /// total assets.
    pub fn is_balanced(&self, relative_tolerance: f64) -> bool {
        self.balance_sheet.iter().all(|bs| {
            bs.balance_sheet_check.abs() <= relative_tolerance * bs.total_assets.abs().max(1.0)
        })
    }

    /// The three records of projection year `index` (zero-based).
    pub fn year(
        &self,
        index: usize,
    ) -> Option<(&IncomeStatementYear, &BalanceSheetYear, &CashFlowYear)> {
        Some((
            self.income_statement.get(index)?,
            self.balance_sheet.get(index)?,
            self.cash_flow_statement.get(index)?,
        ))
    }

    /// The last projected year.
    pub fn final_year(&self) -> Option<(&IncomeStatementYear, &BalanceSheetYear, &CashFlowYear)> {
        self.projection_years()
            .checked_sub(1)
            .and_then(|index| self.year(index))
    }
}

/// Finalized figures of the year before the one being projected.
#[derive(Debug, Clone, Copy, PartialEq)]
struct PriorYear {
    revenue: f64,
    depreciation: f64,
    cash: f64,
    total_debt: f64,
    ppe_net: f64,
    common_stock: f64,
    retained_earnings: f64,
    accounts_receivable: f64,
    inventory: f64,
    accounts_payable: f64,
}

impl From<&OpeningBalances> for PriorYear {
    fn from(opening: &OpeningBalances) -> Self {
        Self {
            revenue: opening.revenue,
            depreciation: opening.depreciation_and_amortization,
            cash: opening.cash,
            total_debt: opening.total_debt,
            ppe_net: opening.ppe_net,
            common_stock: opening.common_stock,
            retained_earnings: opening.retained_earnings,
            accounts_receivable: opening.accounts_receivable,
            inventory: opening.inventory,
            accounts_payable: opening.accounts_payable,
        }
    }
}

impl PriorYear {
    const fn from_projection(income: &IncomeStatementYear, balance: &BalanceSheetYear) -> Self {
        Self {
            revenue: income.revenue,
            depreciation: income.depreciation_and_amortization,
            cash: balance.cash,
            total_debt: balance.total_debt(),
            ppe_net: balance.ppe_net,
            common_stock: balance.common_stock,
            retained_earnings: balance.retained_earnings,
            accounts_receivable: balance.accounts_receivable,
            inventory: balance.inventory,
            accounts_payable: balance.accounts_payable,
        }
    }
}

/// Project the three statements over `projection_years` years.
///
/// Never fails: missing baseline figures fall back to zero and are
/// reported in [`FinancialModel::diagnostics`]. Assumption series shorter
/// than the horizon repeat their last value.
pub fn generate_three_statement_model(
    inputs: &ValidatedInputs,
    mode: Mode,
    projection_years: usize,
) -> FinancialModel {
    let _span = tracing::debug_span!("three_statement_model", %mode, projection_years).entered();

    let mut diagnostics = Diagnostics::new();
    let opening = OpeningBalances::from_inputs(inputs, &mut diagnostics);

    let mut model = FinancialModel {
        income_statement: Vec::with_capacity(projection_years),
        balance_sheet: Vec::with_capacity(projection_years),
        cash_flow_statement: Vec::with_capacity(projection_years),
        opening_balances: opening,
        diagnostics: Diagnostics::new(),
    };

    let mut prior = PriorYear::from(&opening);
    for index in 0..projection_years {
        let (income, balance, cash_flow) = project_year(index, &prior, &inputs.assumptions);
        prior = PriorYear::from_projection(&income, &balance);

        model.income_statement.push(income);
        model.balance_sheet.push(balance);
        model.cash_flow_statement.push(cash_flow);
    }

    let opening_residual = opening.balance_check();
    if let Some(drifted) = model.balance_sheet.iter().find(|bs| {
        (bs.balance_sheet_check - opening_residual).abs() > balance_tolerance(bs.total_assets)
    }) {
        diagnostics.push(Diagnostic::computation(
            COMPONENT,
            format!(
                "Balance sheet residual drifted to {:.2} in year {}",
                drifted.balance_sheet_check, drifted.year
            ),
        ));
    }

    tracing::debug!(
        years = model.projection_years(),
        max_residual = model.max_balance_residual(),
        "projected three statements"
    );

    model.diagnostics = diagnostics;
    model
}

fn project_year(
    index: usize,
    prior: &PriorYear,
    a: &AssumptionSet,
) -> (IncomeStatementYear, BalanceSheetYear, CashFlowYear) {
    let year = index + 1;
    let at = |series: &Option<Vec<f64>>| series_at(series.as_deref(), index);

    // Income statement
    let revenue = prior.revenue * (1.0 + at(&a.revenue_growth).unwrap_or(0.0));
    let cogs = revenue * at(&a.cogs_pct).unwrap_or(0.0);
    let gross_profit = revenue - cogs;
    let sga = revenue * at(&a.sga_pct).unwrap_or(0.0);
    let rd = revenue * at(&a.rd_pct).unwrap_or(0.0);
    let other_operating_expenses = revenue * at(&a.other_opex_pct).unwrap_or(0.0);
    let operating_expenses = sga + rd + other_operating_expenses;
    let ebitda = gross_profit - operating_expenses;
    let depreciation_and_amortization = at(&a.depreciation_pct).map_or_else(
        || {
            prior.depreciation
                * (1.0 + at(&a.depreciation_growth).unwrap_or(DEFAULT_DEPRECIATION_GROWTH))
        },
        |pct| revenue * pct,
    );
    let ebit = ebitda - depreciation_and_amortization;
    let interest_expense = prior.total_debt * a.interest_rate.unwrap_or(DEFAULT_INTEREST_RATE);
    let earnings_before_tax = ebit - interest_expense;
    let taxes = earnings_before_tax.max(0.0) * a.tax_rate.unwrap_or(0.0);
    let net_income = earnings_before_tax - taxes;

    let income = IncomeStatementYear {
        year,
        revenue,
        cogs,
        gross_profit,
        sga,
        rd,
        other_operating_expenses,
        operating_expenses,
        ebitda,
        depreciation_and_amortization,
        ebit,
        interest_expense,
        earnings_before_tax,
        taxes,
        net_income,
    };

    // Non-cash balances
    let capex = revenue * at(&a.capex_pct).unwrap_or(DEFAULT_CAPEX_PCT);
    let items = BalanceSheetItems {
        accounts_receivable: revenue * a.receivables_pct.unwrap_or(DEFAULT_RECEIVABLES_PCT),
        inventory: cogs * a.inventory_pct.unwrap_or(DEFAULT_INVENTORY_PCT),
        ppe_net: prior.ppe_net + capex - depreciation_and_amortization,
        accounts_payable: cogs * a.payables_pct.unwrap_or(DEFAULT_PAYABLES_PCT),
        short_term_debt: 0.0,
        long_term_debt: prior.total_debt,
        common_stock: prior.common_stock,
        retained_earnings: prior.retained_earnings + net_income,
    };

    // Cash flow statement
    let change_in_accounts_receivable = items.accounts_receivable - prior.accounts_receivable;
    let change_in_inventory = items.inventory - prior.inventory;
    let change_in_accounts_payable = items.accounts_payable - prior.accounts_payable;
    let change_in_working_capital =
        change_in_accounts_payable - change_in_accounts_receivable - change_in_inventory;
    let cash_flow_from_operations =
        net_income + depreciation_and_amortization + change_in_working_capital;
    let capital_expenditures = -capex;
    let cash_flow_from_investing = capital_expenditures;
    let (debt_raised_or_repaid, equity_raised_or_repaid, dividends_paid) = (0.0, 0.0, 0.0);
    let cash_flow_from_financing = debt_raised_or_repaid + equity_raised_or_repaid - dividends_paid;
    let net_change_in_cash =
        cash_flow_from_operations + cash_flow_from_investing + cash_flow_from_financing;
    let ending_cash_balance = prior.cash + net_change_in_cash;

    let cash_flow = CashFlowYear {
        year,
        net_income,
        depreciation_and_amortization,
        change_in_accounts_receivable,
        change_in_inventory,
        change_in_accounts_payable,
        change_in_working_capital,
        cash_flow_from_operations,
        capital_expenditures,
        cash_flow_from_investing,
        debt_raised_or_repaid,
        equity_raised_or_repaid,
        dividends_paid,
        cash_flow_from_financing,
        net_change_in_cash,
        beginning_cash_balance: prior.cash,
        ending_cash_balance,
    };

    let balance = BalanceSheetYear::settle(year, items, ending_cash_balance);

    (income, balance, cash_flow)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fathom_inputs::{DiagnosticKind, RawInputs, process_inputs};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rstest::rstest;
    use serde_json::{Value, json};

    fn inputs(mode: Mode, value: Value) -> ValidatedInputs {
        let raw: RawInputs = serde_json::from_value(value).unwrap();
        process_inputs(&raw, mode)
    }

    fn founder_model() -> FinancialModel {
        let inputs = inputs(Mode::Founder, json!({}));
        generate_three_statement_model(&inputs, Mode::Founder, 5)
    }

    #[test]
    fn test_founder_defaults_year_one() {
        let model = founder_model();
        let (is, bs, cfs) = model.year(0).unwrap();

        assert_relative_eq!(is.revenue, 1_100_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.cogs, 660_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.gross_profit, 440_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.sga, 165_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.ebitda, 275_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.depreciation_and_amortization, 33_000.0, epsilon = 1e-6);
        assert_relative_eq!(is.interest_expense, 2_500.0, epsilon = 1e-6);
        assert_relative_eq!(is.taxes, 239_500.0 * 0.21, epsilon = 1e-6);
        assert_relative_eq!(is.net_income, 239_500.0 * 0.79, epsilon = 1e-6);

        assert_relative_eq!(bs.ppe_net, 211_000.0, epsilon = 1e-6);
        assert_relative_eq!(bs.long_term_debt, 50_000.0);
        assert_relative_eq!(bs.short_term_debt, 0.0);
        assert_relative_eq!(cfs.capital_expenditures, -44_000.0, epsilon = 1e-6);
        assert_relative_eq!(cfs.beginning_cash_balance, 100_000.0);
        assert_relative_eq!(bs.cash, cfs.ending_cash_balance);
        assert_relative_eq!(bs.balance_sheet_check, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_founder_defaults_balance_every_year() {
        let model = founder_model();

        assert_eq!(model.projection_years(), 5);
        assert_eq!(model.balance_sheet.len(), 5);
        assert_eq!(model.cash_flow_statement.len(), 5);
        assert!(model.is_balanced(1e-9));
        assert!(model.diagnostics.is_empty());
    }

    #[test]
    fn test_cash_links_across_years() {
        let model = founder_model();

        for window in model.cash_flow_statement.windows(2) {
            assert_relative_eq!(window[1].beginning_cash_balance, window[0].ending_cash_balance);
        }
        for (bs, cfs) in model.balance_sheet.iter().zip(&model.cash_flow_statement) {
            assert_relative_eq!(bs.cash, cfs.ending_cash_balance);
        }
    }

    #[test]
    fn test_working_capital_sign() {
        let model = founder_model();
        let cfs = &model.cash_flow_statement[0];

        // Receivables and inventory build from zero, so working capital consumes cash.
        assert!(cfs.change_in_working_capital < 0.0);
        assert_relative_eq!(
            cfs.change_in_working_capital,
            cfs.change_in_accounts_payable
                - cfs.change_in_accounts_receivable
                - cfs.change_in_inventory
        );
        assert_relative_eq!(
            cfs.cash_flow_from_operations,
            cfs.net_income + cfs.depreciation_and_amortization + cfs.change_in_working_capital
        );
    }

    #[test]
    fn test_no_tax_on_losses() {
        let inputs = inputs(
            Mode::Founder,
            json!({"assumptions": {"cogsAsPercentageOfRevenue": [0.95]}}),
        );
        let model = generate_three_statement_model(&inputs, Mode::Founder, 3);

        for is in &model.income_statement {
            assert!(is.earnings_before_tax < 0.0);
            assert_relative_eq!(is.taxes, 0.0);
            assert_relative_eq!(is.net_income, is.earnings_before_tax);
        }
    }

    #[test]
    fn test_depreciation_growth_fallback() {
        let inputs = inputs(
            Mode::Founder,
            json!({"assumptions": {"depreciationAsPercentageOfRevenue": [], "baseDA": 40_000}}),
        );
        let model = generate_three_statement_model(&inputs, Mode::Founder, 2);

        assert_relative_eq!(model.income_statement[0].depreciation_and_amortization, 42_000.0);
        assert_relative_eq!(model.income_statement[1].depreciation_and_amortization, 44_100.0);
    }

    #[test]
    fn test_short_series_repeat_last_value() {
        let inputs = inputs(
            Mode::Founder,
            json!({"assumptions": {"revenueGrowthRate": [0.5]}}),
        );
        let model = generate_three_statement_model(&inputs, Mode::Founder, 3);

        assert_relative_eq!(model.income_statement[2].revenue, 1_000_000.0 * 1.5_f64.powi(3));
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(5)]
    #[case(12)]
    fn test_horizon(#[case] years: usize) {
        let inputs = inputs(Mode::Founder, json!({}));
        let model = generate_three_statement_model(&inputs, Mode::Founder, years);

        assert_eq!(model.projection_years(), years);
        assert_eq!(model.is_empty(), years == 0);
        assert_eq!(model.final_year().is_some(), years > 0);
        assert!(model.is_balanced(1e-9));
    }

    #[test]
    fn test_opening_imbalance_carries_forward() {
        let inputs = inputs(
            Mode::Founder,
            json!({"assumptions": {"baseRetainedEarnings": 50_000}}),
        );
        let model = generate_three_statement_model(&inputs, Mode::Founder, 5);

        for bs in &model.balance_sheet {
            assert_relative_eq!(bs.balance_sheet_check, 100_000.0, epsilon = 1e-6);
        }
        assert_eq!(model.diagnostics.of_kind(DiagnosticKind::DataGap).count(), 1);
        assert_eq!(model.diagnostics.of_kind(DiagnosticKind::Computation).count(), 0);
    }

    #[test]
    fn test_random_assumptions_stay_balanced() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..50 {
            let years = rng.gen_range(1..10);
            let series = |rng: &mut StdRng, low: f64, high: f64| -> Vec<f64> {
                (0..years).map(|_| rng.gen_range(low..high)).collect()
            };
            let assumptions = json!({
                "revenueGrowthRate": series(&mut rng, -0.3, 0.5),
                "cogsAsPercentageOfRevenue": series(&mut rng, 0.2, 0.9),
                "sgaAsPercentageOfRevenue": series(&mut rng, 0.0, 0.3),
                "rdAsPercentageOfRevenue": series(&mut rng, 0.0, 0.1),
                "depreciationAsPercentageOfRevenue": series(&mut rng, 0.0, 0.1),
                "capexAsPercentageOfRevenue": series(&mut rng, 0.0, 0.1),
                "taxRate": rng.gen_range(0.0..0.4),
                "interestRateOnDebt": rng.gen_range(0.0..0.12),
                "accountsReceivableAsPercentageOfSales": rng.gen_range(0.0..0.3),
                "inventoryAsPercentageOfCOGS": rng.gen_range(0.0..0.3),
                "accountsPayableAsPercentageOfCOGS": rng.gen_range(0.0..0.3),
                "baseRevenue": rng.gen_range(1e4..1e8),
                "baseCash": rng.gen_range(0.0..1e6),
                "baseDebt": rng.gen_range(0.0..1e6),
                "basePPENet": rng.gen_range(0.0..1e6),
                "baseCommonStock": rng.gen_range(0.0..1e6),
                "baseAccountsReceivable": rng.gen_range(0.0..1e5),
                "baseInventory": rng.gen_range(0.0..1e5),
                "baseAccountsPayable": rng.gen_range(0.0..1e5),
            });
            let inputs = inputs(Mode::Founder, json!({"assumptions": assumptions}));
            let model = generate_three_statement_model(&inputs, Mode::Founder, years);

            assert_eq!(model.projection_years(), years);
            assert!(
                model.is_balanced(1e-6),
                "residual {} over {years} years",
                model.max_balance_residual()
            );
        }
    }
}
