//! Per-year statement records.
//!
//! Records are plain data. Once the engine has built a year it never
//! touches that year again.

use serde::{Deserialize, Serialize};

/// One projected year of the Income Statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomeStatementYear {
    /// Projection year, starting at 1.
    pub year: usize,
    /// Revenue.
    pub revenue: f64,
    /// Cost of goods sold.
    pub cogs: f64,
    /// Revenue less COGS.
    pub gross_profit: f64,
    /// Selling, general and administrative expense.
    pub sga: f64,
    /// Research and development expense.
    pub rd: f64,
    /// Other operating expenses.
    pub other_operating_expenses: f64,
    /// SG&A + R&D + other.
    pub operating_expenses: f64,
    /// Gross profit less operating expenses.
    pub ebitda: f64,
    /// Depreciation and amortization.
    pub depreciation_and_amortization: f64,
    /// EBITDA less D&A.
    pub ebit: f64,
    /// Interest on prior-year debt.
    pub interest_expense: f64,
    /// EBIT less interest.
    pub earnings_before_tax: f64,
    /// Tax on positive pretax income only.
    pub taxes: f64,
    /// Pretax income less taxes.
    pub net_income: f64,
}

/// Balance sheet items known before cash is solved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetItems {
    /// Accounts receivable.
    pub accounts_receivable: f64,
    /// Inventory.
    pub inventory: f64,
    /// Net PP&E.
    pub ppe_net: f64,
    /// Accounts payable.
    pub accounts_payable: f64,
    /// Short-term debt.
    pub short_term_debt: f64,
    /// Long-term debt.
    pub long_term_debt: f64,
    /// Common stock.
    pub common_stock: f64,
    /// Retained earnings.
    pub retained_earnings: f64,
}

/// One projected year of the Balance Sheet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceSheetYear {
    /// Projection year, starting at 1.
    pub year: usize,
    /// Cash, solved from the Cash Flow Statement.
    pub cash: f64,
    /// Accounts receivable.
    pub accounts_receivable: f64,
    /// Inventory.
    pub inventory: f64,
    /// Cash + receivables + inventory.
    pub total_current_assets: f64,
    /// Net PP&E.
    pub ppe_net: f64,
    /// Net PP&E (the only non-current asset modeled).
    pub total_non_current_assets: f64,
    /// Current + non-current assets.
    pub total_assets: f64,
    /// Accounts payable.
    pub accounts_payable: f64,
    /// Short-term debt.
    pub short_term_debt: f64,
    /// Payables + short-term debt.
    pub total_current_liabilities: f64,
    /// Long-term debt.
    pub long_term_debt: f64,
    /// Current liabilities + long-term debt.
    pub total_liabilities: f64,
    /// Common stock.
    pub common_stock: f64,
    /// Retained earnings.
    pub retained_earnings: f64,
    /// Common stock + retained earnings.
    pub total_equity: f64,
    /// Liabilities + equity.
    pub total_liabilities_and_equity: f64,
    /// Assets less liabilities and equity; zero when the sheet balances.
    pub balance_sheet_check: f64,
}

impl BalanceSheetYear {
    /// Finalize a balance sheet once cash is known.
    ///
    /// Totals and the residual check are derived here and nowhere else.
    pub const fn settle(year: usize, items: BalanceSheetItems, cash: f64) -> Self {
        let total_current_assets = cash + items.accounts_receivable + items.inventory;
        let total_non_current_assets = items.ppe_net;
        let total_assets = total_current_assets + total_non_current_assets;

        let total_current_liabilities = items.accounts_payable + items.short_term_debt;
        let total_liabilities = total_current_liabilities + items.long_term_debt;
        let total_equity = items.common_stock + items.retained_earnings;
        let total_liabilities_and_equity = total_liabilities + total_equity;

        Self {
            year,
            cash,
            accounts_receivable: items.accounts_receivable,
            inventory: items.inventory,
            total_current_assets,
            ppe_net: items.ppe_net,
            total_non_current_assets,
            total_assets,
            accounts_payable: items.accounts_payable,
            short_term_debt: items.short_term_debt,
            total_current_liabilities,
            long_term_debt: items.long_term_debt,
            total_liabilities,
            common_stock: items.common_stock,
            retained_earnings: items.retained_earnings,
            total_equity,
            total_liabilities_and_equity,
            balance_sheet_check: total_assets - total_liabilities_and_equity,
        }
    }

    /// Long-term plus short-term debt.
    pub const fn total_debt(&self) -> f64 {
        self.long_term_debt + self.short_term_debt
    }

    /// Total debt less cash.
    pub const fn net_debt(&self) -> f64 {
        self.total_debt() - self.cash
    }

    /// Whether the residual is within `tolerance` of zero.
    pub fn is_balanced(&self, tolerance: f64) -> bool {
        self.balance_sheet_check.abs() <= tolerance
    }
}

/// One projected year of the Cash Flow Statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowYear {
    /// Projection year, starting at 1.
    pub year: usize,
    /// Net income.
    pub net_income: f64,
    /// Depreciation and amortization (added back).
    pub depreciation_and_amortization: f64,
    /// Receivables this year less prior year.
    pub change_in_accounts_receivable: f64,
    /// Inventory this year less prior year.
    pub change_in_inventory: f64,
    /// Payables this year less prior year.
    pub change_in_accounts_payable: f64,
    /// Cash effect of working capital: positive is a source of cash.
    pub change_in_working_capital: f64,
    /// Operating cash flow.
    pub cash_flow_from_operations: f64,
    /// Capital expenditures, stored negative.
    pub capital_expenditures: f64,
    /// Investing cash flow.
    pub cash_flow_from_investing: f64,
    /// Debt issued less repaid (not modeled).
    pub debt_raised_or_repaid: f64,
    /// Equity issued less repurchased (not modeled).
    pub equity_raised_or_repaid: f64,
    /// Dividends paid (not modeled).
    pub dividends_paid: f64,
    /// Financing cash flow.
    pub cash_flow_from_financing: f64,
    /// Operating + investing + financing.
    pub net_change_in_cash: f64,
    /// Cash at the start of the year.
    pub beginning_cash_balance: f64,
    /// Cash at the end of the year.
    pub ending_cash_balance: f64,
}

impl CashFlowYear {
    /// CapEx as a positive magnitude.
    pub const fn capex(&self) -> f64 {
        -self.capital_expenditures
    }

    /// Increase in net working capital; positive means cash consumed.
    pub const fn working_capital_investment(&self) -> f64 {
        -self.change_in_working_capital
    }
}
