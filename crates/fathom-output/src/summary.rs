//! Valuation summary.
//!
//! A [`Summary`] is the headline view of one run: what the business is
//! worth, which assumptions produced that figure, and what went wrong on
//! the way.

use std::fmt;

use chrono::{DateTime, Utc};
use fathom_inputs::{
    Diagnostic, Diagnostics, ExitMetric, Mode, TerminalValueMethod, ValidatedInputs,
};
use fathom_model::FinancialModel;
use fathom_valuation::{CompsAnalysis, CompsSummary, DcfValuation, MultipleKind};
use serde::{Serialize, Serializer};

use crate::numbers::{amount, optional_amount, percent};

const VALIDATION_COMPONENT: &str = "input_processor";

/// Equity value per share, or why it is missing.
///
/// Serializes as a number, `null` when not calculable, or a note when no
/// share count was supplied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerShareValue {
    /// Equity value divided by shares outstanding.
    Value(f64),
    /// Shares were supplied but equity value is unavailable or shares are not positive.
    NotCalculable,
    /// No share count was supplied.
    SharesOutstandingNotProvided,
}

impl PerShareValue {
    fn resolve(equity_value: Option<f64>, shares_outstanding: Option<f64>) -> Self {
        match (equity_value, shares_outstanding) {
            (_, None) => Self::SharesOutstandingNotProvided,
            (Some(equity), Some(shares)) if shares > 0.0 && equity.is_finite() => {
                Self::Value(equity / shares)
            }
            _ => Self::NotCalculable,
        }
    }

    /// The per-share value, if calculable.
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(value) => Some(*value),
            Self::NotCalculable | Self::SharesOutstandingNotProvided => None,
        }
    }
}

impl Serialize for PerShareValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Value(value) => serializer.serialize_f64(*value),
            Self::NotCalculable => serializer.serialize_none(),
            Self::SharesOutstandingNotProvided => {
                serializer.serialize_str("Shares outstanding not provided")
            }
        }
    }
}

impl fmt::Display for PerShareValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => write!(f, "{}", amount(*value)),
            Self::NotCalculable => f.write_str("not calculable"),
            Self::SharesOutstandingNotProvided => f.write_str("shares outstanding not provided"),
        }
    }
}

/// The exit multiple used by the DCF.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DcfExitMultiple {
    /// Metric the multiple applies to.
    pub metric: ExitMetric,
    /// The multiple.
    pub value: f64,
}

/// Multiples worth quoting next to the valuation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyValuationMultiples {
    /// Exit multiple of the DCF terminal value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dcf_exit_multiple: Option<DcfExitMultiple>,
    /// Median peer EV / revenue.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comps_ev_to_revenue: Option<f64>,
    /// Median peer EV / EBITDA.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comps_ev_to_ebitda: Option<f64>,
    /// Median peer P/E.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comps_pe_ratio: Option<f64>,
}

/// Assumptions the valuation actually used.
///
/// Growth is reported only for perpetual growth; the exit multiple and
/// its metric only for the exit-multiple method.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoreAssumptions {
    /// Discount rate.
    pub wacc: Option<f64>,
    /// Terminal value method.
    pub terminal_value_method: Option<TerminalValueMethod>,
    /// Perpetual growth rate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terminal_growth_rate: Option<f64>,
    /// Exit multiple.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_multiple: Option<f64>,
    /// Exit metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_multiple_metric: Option<ExitMetric>,
    /// Number of projected years.
    pub projection_years: usize,
}

/// First and last projected year at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyProjectedFinancials {
    /// Year 1 revenue.
    pub first_year_revenue: f64,
    /// Year 1 EBITDA.
    pub first_year_ebitda: f64,
    /// Final year revenue.
    pub last_year_revenue: f64,
    /// Final year EBITDA.
    pub last_year_ebitda: f64,
}

/// Headline results of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// DCF enterprise value.
    pub estimated_enterprise_value: Option<f64>,
    /// DCF equity value.
    pub estimated_equity_value: Option<f64>,
    /// Equity value per share.
    pub equity_value_per_share: PerShareValue,
    /// Internal rate of return; not computed.
    pub irr: Option<f64>,
    /// Net present value.
    pub npv: Option<f64>,
    /// Multiples quoted next to the valuation.
    pub key_valuation_multiples: KeyValuationMultiples,
    /// Assumptions the valuation used.
    pub core_assumptions: CoreAssumptions,
    /// Revenue and EBITDA snapshot; absent for an empty model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_projected_financials: Option<KeyProjectedFinancials>,
    /// Peer multiple statistics, when comps were run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparable_company_summary: Option<CompsSummary>,
    /// Mode the run used.
    pub generation_mode: Mode,
    /// When the summary was produced.
    pub generated_at: DateTime<Utc>,
    /// Validation errors and diagnostics from every stage.
    pub diagnostics: Diagnostics,
}

/// Condense a valuation, its model, and its inputs into a [`Summary`].
pub fn generate_summary_output(
    valuation: &DcfValuation,
    model: &FinancialModel,
    inputs: &ValidatedInputs,
    mode: Mode,
) -> Summary {
    let method = valuation.terminal_value_method;
    let exit_metric = valuation
        .exit_multiple_metric
        .or_else(|| inputs.valuation_assumptions.exit_metric().ok());

    let core_assumptions = CoreAssumptions {
        wacc: valuation.wacc,
        terminal_value_method: method,
        terminal_growth_rate: valuation
            .terminal_growth_rate
            .filter(|_| method == Some(TerminalValueMethod::PerpetualGrowth)),
        exit_multiple: valuation
            .exit_multiple
            .filter(|_| method == Some(TerminalValueMethod::ExitMultiple)),
        exit_multiple_metric: exit_metric
            .filter(|_| method == Some(TerminalValueMethod::ExitMultiple)),
        projection_years: model.projection_years(),
    };

    let key_valuation_multiples = KeyValuationMultiples {
        dcf_exit_multiple: valuation
            .exit_multiple
            .zip(exit_metric)
            .map(|(value, metric)| DcfExitMultiple { metric, value }),
        ..Default::default()
    };

    let key_projected_financials = model
        .income_statement
        .first()
        .zip(model.income_statement.last())
        .map(|(first, last)| KeyProjectedFinancials {
            first_year_revenue: first.revenue,
            first_year_ebitda: first.ebitda,
            last_year_revenue: last.revenue,
            last_year_ebitda: last.ebitda,
        });

    let mut diagnostics: Diagnostics = inputs
        .errors
        .iter()
        .map(|err| Diagnostic::validation(VALIDATION_COMPONENT, err.to_string()))
        .collect();
    diagnostics.merge(&inputs.diagnostics);
    diagnostics.merge(&model.diagnostics);
    diagnostics.merge(&valuation.diagnostics);

    Summary {
        estimated_enterprise_value: valuation.enterprise_value,
        estimated_equity_value: valuation.equity_value,
        equity_value_per_share: PerShareValue::resolve(
            valuation.equity_value,
            inputs.assumptions.shares_outstanding,
        ),
        irr: valuation.irr,
        npv: valuation.npv,
        key_valuation_multiples,
        core_assumptions,
        key_projected_financials,
        comparable_company_summary: None,
        generation_mode: mode,
        generated_at: Utc::now(),
        diagnostics,
    }
}

impl Summary {
    /// Attach peer statistics and quote their medians.
    pub fn with_comps(mut self, comps: &CompsAnalysis) -> Self {
        let median = |kind| comps.summary_metrics.get(kind).map(|stats| stats.median);
        self.key_valuation_multiples.comps_ev_to_revenue = median(MultipleKind::EvToRevenue);
        self.key_valuation_multiples.comps_ev_to_ebitda = median(MultipleKind::EvToEbitda);
        self.key_valuation_multiples.comps_pe_ratio = median(MultipleKind::PeRatio);
        self.comparable_company_summary = Some(comps.summary_metrics.clone());
        self
    }

    fn terminal_label(&self) -> String {
        let assumptions = &self.core_assumptions;
        match assumptions.terminal_value_method {
            Some(TerminalValueMethod::PerpetualGrowth) => format!(
                "perpetual growth at {}",
                percent(assumptions.terminal_growth_rate)
            ),
            Some(TerminalValueMethod::ExitMultiple) => format!(
                "{}x {}",
                assumptions.exit_multiple.map_or_else(|| "n/a".to_string(), |m| format!("{m:.1}")),
                assumptions.exit_multiple_metric.unwrap_or_default()
            ),
            None => "unresolved".to_string(),
        }
    }

    /// Format as ASCII table for terminal display.
    pub fn to_ascii_table(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "\nValuation Summary ({} mode)\n",
            self.generation_mode
        ));
        output.push_str(&format!("Generated: {}\n", self.generated_at.to_rfc3339()));
        output.push_str(&"=".repeat(80));
        output.push('\n');

        output.push_str("\nValuation:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  Enterprise Value:         {}\n",
            optional_amount(self.estimated_enterprise_value)
        ));
        output.push_str(&format!(
            "  Equity Value:             {}\n",
            optional_amount(self.estimated_equity_value)
        ));
        output.push_str(&format!(
            "  Equity Value / Share:     {}\n",
            self.equity_value_per_share
        ));
        output.push_str(&format!(
            "  NPV:                      {}\n",
            optional_amount(self.npv)
        ));

        output.push_str("\nCore Assumptions:\n");
        output.push_str(&"-".repeat(80));
        output.push('\n');
        output.push_str(&format!(
            "  WACC:                     {}\n",
            percent(self.core_assumptions.wacc)
        ));
        output.push_str(&format!(
            "  Terminal Value:           {}\n",
            self.terminal_label()
        ));
        output.push_str(&format!(
            "  Projection Years:         {}\n",
            self.core_assumptions.projection_years
        ));

        if let Some(financials) = &self.key_projected_financials {
            output.push_str("\nKey Projected Financials:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!("{:<20} {:>20} {:>20}\n", "", "First Year", "Last Year"));
            output.push_str(&format!(
                "{:<20} {:>20} {:>20}\n",
                "Revenue",
                amount(financials.first_year_revenue),
                amount(financials.last_year_revenue)
            ));
            output.push_str(&format!(
                "{:<20} {:>20} {:>20}\n",
                "EBITDA",
                amount(financials.first_year_ebitda),
                amount(financials.last_year_ebitda)
            ));
        }

        if let Some(comps) = &self.comparable_company_summary {
            output.push_str("\nComparable Companies:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            output.push_str(&format!(
                "{:<12} {:>10} {:>10} {:>10} {:>10} {:>8}\n",
                "Multiple", "Mean", "Median", "High", "Low", "Count"
            ));
            for kind in MultipleKind::all() {
                if let Some(stats) = comps.get(kind) {
                    output.push_str(&format!(
                        "{:<12} {:>10.2} {:>10.2} {:>10.2} {:>10.2} {:>8}\n",
                        kind.to_string(),
                        stats.mean,
                        stats.median,
                        stats.high,
                        stats.low,
                        stats.count
                    ));
                }
            }
        }

        if !self.diagnostics.is_empty() {
            output.push_str("\nDiagnostics:\n");
            output.push_str(&"-".repeat(80));
            output.push('\n');
            for diagnostic in &self.diagnostics {
                output.push_str(&format!("  {diagnostic}\n"));
            }
        }

        output.push_str(&"=".repeat(80));
        output.push('\n');

        output
    }

    /// Format as Markdown for documentation.
    pub fn to_markdown(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!(
            "# Valuation Summary ({} mode)\n\n",
            self.generation_mode
        ));
        output.push_str(&format!(
            "**Generated:** {}\n\n",
            self.generated_at.to_rfc3339()
        ));

        output.push_str("## Valuation\n\n");
        output.push_str(&format!(
            "- **Enterprise Value:** {}\n",
            optional_amount(self.estimated_enterprise_value)
        ));
        output.push_str(&format!(
            "- **Equity Value:** {}\n",
            optional_amount(self.estimated_equity_value)
        ));
        output.push_str(&format!(
            "- **Equity Value / Share:** {}\n",
            self.equity_value_per_share
        ));
        output.push_str(&format!("- **NPV:** {}\n\n", optional_amount(self.npv)));

        output.push_str("## Core Assumptions\n\n");
        output.push_str(&format!(
            "- **WACC:** {}\n",
            percent(self.core_assumptions.wacc)
        ));
        output.push_str(&format!("- **Terminal Value:** {}\n", self.terminal_label()));
        output.push_str(&format!(
            "- **Projection Years:** {}\n\n",
            self.core_assumptions.projection_years
        ));

        if let Some(financials) = &self.key_projected_financials {
            output.push_str("## Key Projected Financials\n\n");
            output.push_str("| | First Year | Last Year |\n");
            output.push_str("|---|---:|---:|\n");
            output.push_str(&format!(
                "| Revenue | {} | {} |\n",
                amount(financials.first_year_revenue),
                amount(financials.last_year_revenue)
            ));
            output.push_str(&format!(
                "| EBITDA | {} | {} |\n\n",
                amount(financials.first_year_ebitda),
                amount(financials.last_year_ebitda)
            ));
        }

        if let Some(comps) = &self.comparable_company_summary {
            output.push_str("## Comparable Companies\n\n");
            output.push_str("| Multiple | Mean | Median | High | Low | Count |\n");
            output.push_str("|----------|------|--------|------|-----|-------|\n");
            for kind in MultipleKind::all() {
                if let Some(stats) = comps.get(kind) {
                    output.push_str(&format!(
                        "| {} | {:.2} | {:.2} | {:.2} | {:.2} | {} |\n",
                        kind, stats.mean, stats.median, stats.high, stats.low, stats.count
                    ));
                }
            }
            output.push('\n');
        }

        if !self.diagnostics.is_empty() {
            output.push_str("## Diagnostics\n\n");
            for diagnostic in &self.diagnostics {
                output.push_str(&format!("- {diagnostic}\n"));
            }
        }

        output
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Valuation Summary ({} mode)", self.generation_mode)?;
        writeln!(
            f,
            "  Enterprise Value: {}",
            optional_amount(self.estimated_enterprise_value)
        )?;
        writeln!(
            f,
            "  Equity Value: {}",
            optional_amount(self.estimated_equity_value)
        )?;
        writeln!(f, "  Equity Value / Share: {}", self.equity_value_per_share)?;
        writeln!(f, "  WACC: {}", percent(self.core_assumptions.wacc))?;
        writeln!(f, "  Terminal Value: {}", self.terminal_label())?;
        if !self.diagnostics.is_empty() {
            writeln!(f, "  Diagnostics: {}", self.diagnostics.len())?;
        }
        Ok(())
    }
}
