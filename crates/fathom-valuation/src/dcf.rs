//! Discounted cash flow valuation.
//!
//! Free cash flow to the firm is derived per projected year, a terminal
//! value is added to the final year's flow, and the stream is discounted
//! at WACC with the first year discounted one full period.

use fathom_inputs::{
    Diagnostic, Diagnostics, ExitMetric, Mode, TerminalValueMethod, ValidatedInputs,
};
use fathom_model::{CashFlowYear, FinancialModel, IncomeStatementYear};
use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

const COMPONENT: &str = "valuation_engine";

/// Result of a DCF valuation.
///
/// Values that cannot be computed are `None` and the reason is recorded
/// in [`DcfValuation::diagnostics`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DcfValuation {
    /// Present value of all projected flows plus the terminal value.
    pub enterprise_value: Option<f64>,
    /// Enterprise value less net debt.
    pub equity_value: Option<f64>,
    /// Undiscounted terminal value at the end of the horizon.
    pub terminal_value: f64,
    /// Method the terminal value was estimated with.
    pub terminal_value_method: Option<TerminalValueMethod>,
    /// Free cash flow to the firm per projected year.
    pub fcffs: Vec<f64>,
    /// Discounted flow per year, terminal value included in the last.
    pub present_values: Vec<f64>,
    /// Net present value; equal to the enterprise value.
    pub npv: Option<f64>,
    /// Internal rate of return; not computed.
    pub irr: Option<f64>,
    /// Discount rate.
    pub wacc: Option<f64>,
    /// Perpetual growth rate.
    pub terminal_growth_rate: Option<f64>,
    /// Exit multiple.
    pub exit_multiple: Option<f64>,
    /// Metric the exit multiple was applied to.
    pub exit_multiple_metric: Option<ExitMetric>,
    /// Final-year debt less cash.
    pub net_debt: f64,
    /// Degraded computations.
    pub diagnostics: Diagnostics,
}

/// Free cash flow to the firm for one year.
///
/// `EBIT × (1 − t) + D&A − CapEx − ΔNWC`, where CapEx is a positive
/// magnitude and a positive ΔNWC is cash consumed.
///
/// ```
/// use fathom_model::{CashFlowYear, IncomeStatementYear};
/// use fathom_valuation::calculate_fcff;
///
/// let income = IncomeStatementYear {
///     ebit: 100.0,
///     depreciation_and_amortization: 20.0,
///     ..Default::default()
/// };
/// let cash_flow = CashFlowYear {
///     capital_expenditures: -30.0,
///     change_in_working_capital: -10.0,
///     ..Default::default()
/// };
/// assert_eq!(calculate_fcff(&income, &cash_flow, 0.25), 55.0);
/// ```
pub const fn calculate_fcff(
    income: &IncomeStatementYear,
    cash_flow: &CashFlowYear,
    tax_rate: f64,
) -> f64 {
    income.ebit * (1.0 - tax_rate) + income.depreciation_and_amortization
        - cash_flow.capex()
        - cash_flow.working_capital_investment()
}

/// Gordon growth terminal value: `FCFF × (1 + g) / (wacc − g)`.
pub fn terminal_value_perpetual_growth(
    final_fcff: f64,
    wacc: f64,
    growth: f64,
) -> Result<f64, ValuationError> {
    if wacc <= growth {
        return Err(ValuationError::DiscountRateNotAboveGrowth { wacc, growth });
    }
    Ok(final_fcff * (1.0 + growth) / (wacc - growth))
}

/// Exit multiple terminal value: `metric × multiple`.
pub const fn terminal_value_exit_multiple(metric_value: f64, multiple: f64) -> f64 {
    metric_value * multiple
}

/// The exit-year figure an exit multiple applies to.
pub const fn exit_metric_value(metric: ExitMetric, income: &IncomeStatementYear) -> f64 {
    match metric {
        ExitMetric::Ebitda => income.ebitda,
        ExitMetric::Ebit => income.ebit,
        ExitMetric::Revenue => income.revenue,
        ExitMetric::NetIncome => income.net_income,
    }
}

/// Discount each flow, the first by one full period.
pub fn present_values(cash_flows: &[f64], rate: f64) -> Result<Vec<f64>, ValuationError> {
    if rate <= -1.0 || !rate.is_finite() {
        return Err(ValuationError::InvalidDiscountRate(rate));
    }
    Ok(cash_flows
        .iter()
        .zip(1..)
        .map(|(flow, period)| flow / (1.0 + rate).powi(period))
        .collect())
}

/// Sum of [`present_values`].
///
/// ```
/// use fathom_valuation::net_present_value;
///
/// let npv = net_present_value(&[110.0, 121.0], 0.10).unwrap();
/// assert!((npv - 200.0).abs() < 1e-9);
/// ```
pub fn net_present_value(cash_flows: &[f64], rate: f64) -> Result<f64, ValuationError> {
    Ok(present_values(cash_flows, rate)?.iter().sum())
}

/// Value a projected model by discounted cash flow.
///
/// Never fails. An absent or invalid discount rate, or an empty model,
/// leaves the enterprise value, equity value and NPV unset; an undefined
/// terminal value is taken as zero. Each such case adds a diagnostic.
pub fn generate_dcf_valuation(
    model: &FinancialModel,
    inputs: &ValidatedInputs,
    mode: Mode,
) -> DcfValuation {
    let _span = tracing::debug_span!("dcf_valuation", %mode).entered();

    let assumptions = &inputs.valuation_assumptions;
    let tax_rate = inputs.assumptions.tax_rate.unwrap_or(0.0);

    let mut valuation = DcfValuation {
        wacc: assumptions.wacc,
        terminal_growth_rate: assumptions.terminal_growth_rate,
        exit_multiple: assumptions.exit_multiple,
        ..Default::default()
    };

    valuation.fcffs = model
        .income_statement
        .iter()
        .zip(&model.cash_flow_statement)
        .map(|(income, cash_flow)| calculate_fcff(income, cash_flow, tax_rate))
        .collect();

    valuation.net_debt = model.balance_sheet.last().map_or_else(
        || model.opening_balances.total_debt - model.opening_balances.cash,
        |bs| bs.net_debt(),
    );

    let Some((final_income, _, _)) = model.final_year() else {
        valuation.diagnostics.push(Diagnostic::computation(
            COMPONENT,
            "No projected years to value; enterprise value not computed",
        ));
        return valuation;
    };
    let final_fcff = valuation.fcffs.last().copied().unwrap_or_default();

    let method = assumptions.terminal_value_method.or_else(|| {
        (assumptions.wacc.is_some() && assumptions.terminal_growth_rate.is_some())
            .then_some(TerminalValueMethod::PerpetualGrowth)
    });
    valuation.terminal_value_method = method;
    valuation.terminal_value = match method {
        Some(TerminalValueMethod::PerpetualGrowth) => perpetual_growth(
            final_fcff,
            assumptions.wacc,
            assumptions.terminal_growth_rate,
            &mut valuation.diagnostics,
        ),
        Some(TerminalValueMethod::ExitMultiple) => {
            let metric = assumptions.exit_metric().unwrap_or_else(|raw| {
                valuation.diagnostics.push(Diagnostic::computation(
                    COMPONENT,
                    format!("Unknown exit multiple metric '{raw}'; using EBITDA"),
                ));
                ExitMetric::Ebitda
            });
            valuation.exit_multiple_metric = Some(metric);
            match assumptions.exit_multiple {
                Some(multiple) => {
                    terminal_value_exit_multiple(exit_metric_value(metric, final_income), multiple)
                }
                None => {
                    valuation.diagnostics.push(Diagnostic::computation(
                        COMPONENT,
                        "Exit multiple not provided; terminal value set to 0",
                    ));
                    0.0
                }
            }
        }
        None => {
            valuation.diagnostics.push(Diagnostic::computation(
                COMPONENT,
                "Terminal value method could not be resolved; terminal value set to 0",
            ));
            0.0
        }
    };

    let Some(wacc) = assumptions.wacc else {
        valuation.diagnostics.push(Diagnostic::computation(
            COMPONENT,
            "Discount rate (WACC) not provided; enterprise value not computed",
        ));
        return valuation;
    };

    let mut cash_flows = valuation.fcffs.clone();
    if let Some(last) = cash_flows.last_mut() {
        *last += valuation.terminal_value;
    }

    match present_values(&cash_flows, wacc) {
        Ok(discounted) => {
            let enterprise_value: f64 = discounted.iter().sum();
            valuation.present_values = discounted;
            valuation.enterprise_value = Some(enterprise_value);
            valuation.npv = Some(enterprise_value);
            valuation.equity_value = Some(enterprise_value - valuation.net_debt);
        }
        Err(err) => {
            valuation.diagnostics.push(Diagnostic::computation(
                COMPONENT,
                format!("{err}; enterprise value not computed"),
            ));
        }
    }

    tracing::debug!(
        enterprise_value = ?valuation.enterprise_value,
        terminal_value = valuation.terminal_value,
        "discounted cash flows"
    );

    valuation
}

fn perpetual_growth(
    final_fcff: f64,
    wacc: Option<f64>,
    growth: Option<f64>,
    diagnostics: &mut Diagnostics,
) -> f64 {
    let (Some(wacc), Some(growth)) = (wacc, growth) else {
        diagnostics.push(Diagnostic::computation(
            COMPONENT,
            "Perpetual growth needs both WACC and a terminal growth rate; terminal value set to 0",
        ));
        return 0.0;
    };

    terminal_value_perpetual_growth(final_fcff, wacc, growth).unwrap_or_else(|err| {
        diagnostics.push(Diagnostic::computation(
            COMPONENT,
            format!("{err}; terminal value set to 0"),
        ));
        0.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fathom_inputs::{DiagnosticKind, RawInputs, process_inputs};
    use fathom_model::generate_three_statement_model;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn value(raw: Value, mode: Mode) -> (FinancialModel, ValidatedInputs, DcfValuation) {
        let raw: RawInputs = serde_json::from_value(raw).unwrap();
        let inputs = process_inputs(&raw, mode);
        let model = generate_three_statement_model(&inputs, mode, inputs.projection_years);
        let valuation = generate_dcf_valuation(&model, &inputs, mode);
        (model, inputs, valuation)
    }

    #[rstest]
    #[case(0.10, 0.02, 100.0, 1275.0)]
    #[case(0.08, 0.03, 50.0, 1030.0)]
    #[case(0.12, 0.0, 120.0, 1000.0)]
    #[case(0.09, -0.01, 99.0, 980.1)]
    fn test_perpetual_growth(
        #[case] wacc: f64,
        #[case] growth: f64,
        #[case] fcff: f64,
        #[case] expected: f64,
    ) {
        let tv = terminal_value_perpetual_growth(fcff, wacc, growth).unwrap();
        assert_relative_eq!(tv, expected, max_relative = 1e-12);
    }

    #[rstest]
    #[case(0.05, 0.05)]
    #[case(0.03, 0.04)]
    #[case(-0.02, 0.0)]
    fn test_perpetual_growth_undefined(#[case] wacc: f64, #[case] growth: f64) {
        assert_eq!(
            terminal_value_perpetual_growth(100.0, wacc, growth),
            Err(ValuationError::DiscountRateNotAboveGrowth { wacc, growth })
        );
    }

    #[test]
    fn test_present_values_discount_from_year_one() {
        let discounted = present_values(&[100.0, 100.0], 0.25).unwrap();
        assert_relative_eq!(discounted[0], 80.0);
        assert_relative_eq!(discounted[1], 64.0);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(-1.5)]
    #[case(f64::NAN)]
    fn test_invalid_discount_rate(#[case] rate: f64) {
        assert!(matches!(
            net_present_value(&[1.0], rate),
            Err(ValuationError::InvalidDiscountRate(_))
        ));
    }

    #[test]
    fn test_founder_defaults_exit_multiple() {
        let (model, _, valuation) = value(json!({}), Mode::Founder);
        let (final_income, final_balance, _) = model.final_year().unwrap();

        assert_eq!(valuation.terminal_value_method, Some(TerminalValueMethod::ExitMultiple));
        assert_eq!(valuation.exit_multiple_metric, Some(ExitMetric::Ebitda));
        assert_relative_eq!(valuation.terminal_value, final_income.ebitda * 8.0);
        assert_eq!(valuation.fcffs.len(), 5);
        assert_eq!(valuation.present_values.len(), 5);

        let ev = valuation.enterprise_value.unwrap();
        assert!(ev.is_finite() && ev > 0.0);
        assert_eq!(valuation.npv, Some(ev));
        assert_eq!(valuation.irr, None);
        assert_relative_eq!(valuation.net_debt, final_balance.net_debt());
        assert_relative_eq!(valuation.equity_value.unwrap(), ev - valuation.net_debt);
        assert!(valuation.diagnostics.is_empty());
    }

    #[test]
    fn test_enterprise_value_matches_manual_discounting() {
        let (_, _, valuation) = value(json!({}), Mode::Founder);

        let manual: f64 = valuation
            .fcffs
            .iter()
            .enumerate()
            .map(|(i, fcff)| {
                let flow = if i == 4 { fcff + valuation.terminal_value } else { *fcff };
                flow / 1.1_f64.powi(i as i32 + 1)
            })
            .sum();
        assert_relative_eq!(valuation.enterprise_value.unwrap(), manual, max_relative = 1e-12);
    }

    #[rstest]
    #[case("EBITDA", ExitMetric::Ebitda)]
    #[case("EBIT", ExitMetric::Ebit)]
    #[case("Revenue", ExitMetric::Revenue)]
    #[case("Net Income", ExitMetric::NetIncome)]
    fn test_configured_exit_metric_honoured(#[case] raw: &str, #[case] metric: ExitMetric) {
        let (model, _, valuation) = value(
            json!({"valuationAssumptions": {"exitMultipleMetric": raw}}),
            Mode::Founder,
        );
        let (final_income, _, _) = model.final_year().unwrap();

        assert_eq!(valuation.exit_multiple_metric, Some(metric));
        assert_relative_eq!(
            valuation.terminal_value,
            exit_metric_value(metric, final_income) * 8.0
        );
    }

    #[test]
    fn test_unknown_exit_metric_falls_back_to_ebitda() {
        let (model, _, valuation) = value(
            json!({"valuationAssumptions": {"exitMultipleMetric": "FCF"}}),
            Mode::Founder,
        );
        let (final_income, _, _) = model.final_year().unwrap();

        assert_eq!(valuation.exit_multiple_metric, Some(ExitMetric::Ebitda));
        assert_relative_eq!(valuation.terminal_value, final_income.ebitda * 8.0);
        assert_eq!(valuation.diagnostics.of_kind(DiagnosticKind::Computation).count(), 1);
    }

    #[test]
    fn test_gordon_growth_terminal_value() {
        let (_, _, valuation) = value(
            json!({"valuationAssumptions": {"terminalValueMethod": "gordonGrowth"}}),
            Mode::Founder,
        );
        let final_fcff = *valuation.fcffs.last().unwrap();

        assert_eq!(valuation.terminal_value_method, Some(TerminalValueMethod::PerpetualGrowth));
        assert_relative_eq!(valuation.terminal_value, final_fcff * 1.02 / 0.08);
        assert_eq!(valuation.exit_multiple_metric, None);
    }

    #[test]
    fn test_wacc_not_above_growth_zeroes_terminal_value() {
        let (_, _, valuation) = value(
            json!({"valuationAssumptions": {
                "terminalValueMethod": "perpetualGrowth",
                "wacc": 0.03,
                "terminalGrowthRate": 0.04
            }}),
            Mode::Founder,
        );

        assert_relative_eq!(valuation.terminal_value, 0.0);
        assert!(valuation.enterprise_value.unwrap().is_finite());
        assert_eq!(valuation.diagnostics.of_kind(DiagnosticKind::Computation).count(), 1);
    }

    #[test]
    fn test_missing_wacc_leaves_values_unset() {
        let (_, _, valuation) = value(
            json!({
                "valuationAssumptions": {"terminalValueMethod": "exitMultiple", "exitMultiple": 6}
            }),
            Mode::Investor,
        );

        assert_eq!(valuation.enterprise_value, None);
        assert_eq!(valuation.equity_value, None);
        assert_eq!(valuation.npv, None);
        assert!(valuation.present_values.is_empty());
        assert!(!valuation.diagnostics.is_empty());
    }

    #[test]
    fn test_empty_model() {
        let raw: RawInputs = serde_json::from_value(json!({})).unwrap();
        let inputs = process_inputs(&raw, Mode::Founder);
        let model = generate_three_statement_model(&inputs, Mode::Founder, 0);
        let valuation = generate_dcf_valuation(&model, &inputs, Mode::Founder);

        assert!(valuation.fcffs.is_empty());
        assert_eq!(valuation.enterprise_value, None);
        assert_relative_eq!(valuation.net_debt, -50_000.0);
        assert_eq!(valuation.diagnostics.len(), 1);
    }

    #[test]
    fn test_fcff_uses_working_capital_investment() {
        let (model, inputs, valuation) = value(json!({}), Mode::Founder);
        let tax = inputs.assumptions.tax_rate.unwrap();
        let (is, _, cfs) = model.year(0).unwrap();

        // Working capital builds in year one, so FCFF sits below unlevered
        // earnings plus D&A less CapEx.
        let before_working_capital =
            is.ebit * (1.0 - tax) + is.depreciation_and_amortization - cfs.capex();
        assert!(valuation.fcffs[0] < before_working_capital);
        assert_relative_eq!(
            valuation.fcffs[0],
            before_working_capital + cfs.change_in_working_capital
        );
    }
}
