//! Statement tables.

use fathom_model::{BalanceSheetYear, CashFlowYear, FinancialModel, IncomeStatementYear};

use crate::numbers::amount;

type Row<T> = (&'static str, fn(&T) -> f64);

const INCOME_STATEMENT: &[Row<IncomeStatementYear>] = &[
    ("Revenue", |y| y.revenue),
    ("COGS", |y| y.cogs),
    ("Gross Profit", |y| y.gross_profit),
    ("SG&A", |y| y.sga),
    ("R&D", |y| y.rd),
    ("Other OpEx", |y| y.other_operating_expenses),
    ("EBITDA", |y| y.ebitda),
    ("D&A", |y| y.depreciation_and_amortization),
    ("EBIT", |y| y.ebit),
    ("Interest", |y| y.interest_expense),
    ("EBT", |y| y.earnings_before_tax),
    ("Taxes", |y| y.taxes),
    ("Net Income", |y| y.net_income),
];

const BALANCE_SHEET: &[Row<BalanceSheetYear>] = &[
    ("Cash", |y| y.cash),
    ("Receivables", |y| y.accounts_receivable),
    ("Inventory", |y| y.inventory),
    ("PP&E, net", |y| y.ppe_net),
    ("Total Assets", |y| y.total_assets),
    ("Payables", |y| y.accounts_payable),
    ("Debt", |y| y.total_debt()),
    ("Total Liabilities", |y| y.total_liabilities),
    ("Common Stock", |y| y.common_stock),
    ("Retained Earnings", |y| y.retained_earnings),
    ("Total Equity", |y| y.total_equity),
    ("Check", |y| y.balance_sheet_check),
];

const CASH_FLOW: &[Row<CashFlowYear>] = &[
    ("Net Income", |y| y.net_income),
    ("D&A", |y| y.depreciation_and_amortization),
    ("Working Capital", |y| y.change_in_working_capital),
    ("Operating CF", |y| y.cash_flow_from_operations),
    ("CapEx", |y| y.capital_expenditures),
    ("Investing CF", |y| y.cash_flow_from_investing),
    ("Financing CF", |y| y.cash_flow_from_financing),
    ("Net Change", |y| y.net_change_in_cash),
    ("Ending Cash", |y| y.ending_cash_balance),
];

/// Render the three statements as ASCII tables, one column per year.
pub fn render_statements(model: &FinancialModel) -> String {
    let mut output = String::new();
    ascii_table(&mut output, "Income Statement", &model.income_statement, INCOME_STATEMENT);
    ascii_table(&mut output, "Balance Sheet", &model.balance_sheet, BALANCE_SHEET);
    ascii_table(&mut output, "Cash Flow Statement", &model.cash_flow_statement, CASH_FLOW);
    output
}

/// Render the three statements as Markdown tables.
pub fn render_statements_markdown(model: &FinancialModel) -> String {
    let mut output = String::new();
    markdown_table(&mut output, "Income Statement", &model.income_statement, INCOME_STATEMENT);
    markdown_table(&mut output, "Balance Sheet", &model.balance_sheet, BALANCE_SHEET);
    markdown_table(&mut output, "Cash Flow Statement", &model.cash_flow_statement, CASH_FLOW);
    output
}

fn ascii_table<T>(output: &mut String, title: &str, years: &[T], rows: &[Row<T>]) {
    let width = 20 + 16 * years.len();

    output.push_str(&format!("\n{title}\n"));
    output.push_str(&"=".repeat(width));
    output.push('\n');
    output.push_str(&format!("{:<20}", ""));
    for year in 1..=years.len() {
        output.push_str(&format!("{:>16}", format!("Year {year}")));
    }
    output.push('\n');
    output.push_str(&"-".repeat(width));
    output.push('\n');

    for (label, value) in rows {
        output.push_str(&format!("{label:<20}"));
        for year in years {
            output.push_str(&format!("{:>16}", amount(value(year))));
        }
        output.push('\n');
    }
}

fn markdown_table<T>(output: &mut String, title: &str, years: &[T], rows: &[Row<T>]) {
    output.push_str(&format!("## {title}\n\n|"));
    for year in 1..=years.len() {
        output.push_str(&format!(" Year {year} |"));
    }
    output.push_str("\n|---|");
    output.push_str(&"---:|".repeat(years.len()));
    output.push('\n');

    for (label, value) in rows {
        output.push_str(&format!("| {label} |"));
        for year in years {
            output.push_str(&format!(" {} |", amount(value(year))));
        }
        output.push('\n');
    }
    output.push('\n');
}
