//! Typed assumption sets.
//!
//! The validator works on raw JSON so that mistyped values can still pass
//! through. This module turns the processed fields into typed structs,
//! coercing leniently: numeric strings parse as numbers, and a single number
//! given for a projection series becomes a one-element series. A series
//! element that cannot be coerced takes the value of the nearest valid
//! element before it (or after it, for leading gaps). Values that cannot be
//! coerced at all fall back to the schema default, or are treated as absent.

use crate::error::ValidationError;
use crate::schema::{FieldType, Schema, keys};
use crate::validator::normalize_horizon;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;

pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|v| v.is_finite())
}

pub(crate) fn coerce_series(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Array(items) => fill_gaps(items.iter().map(coerce_number).collect()),
        other => coerce_number(other).map(|v| vec![v]),
    }
}

// Forward-fill bad slots, then back-fill any leading ones from the first
// valid element. `None` when nothing in the series was usable.
fn fill_gaps(slots: Vec<Option<f64>>) -> Option<Vec<f64>> {
    if slots.is_empty() {
        return Some(Vec::new());
    }
    let first = slots.iter().flatten().copied().next()?;
    let mut last = first;
    Some(
        slots
            .into_iter()
            .map(|slot| {
                last = slot.unwrap_or(last);
                last
            })
            .collect(),
    )
}

/// Replace processed values that cannot be coerced with the field default.
///
/// The validator passes mistyped values through so they can still be used;
/// this runs afterwards so a value with nothing usable in it does not leave
/// a defaulted field empty.
pub(crate) fn apply_uncoercible_defaults(fields: &mut Map<String, Value>, schema: &Schema) {
    for spec in schema.fields() {
        let Some(default) = &spec.default else {
            continue;
        };
        let usable = fields.get(spec.name).is_none_or(|value| match spec.field_type {
            FieldType::Number => coerce_number(value).is_some(),
            FieldType::NumberSeries => coerce_series(value).is_some(),
            FieldType::Text | FieldType::Object => true,
        });
        if !usable {
            tracing::debug!(field = spec.name, "Unusable value replaced by default");
            fields.insert(spec.name.to_string(), default.clone());
        }
    }
}

// Historical figures accept the same numeric strings as assumptions do.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => coerce_number(&value).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a number, found {value}"))
        }),
    }
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(coerce_number)
}

fn series(fields: &Map<String, Value>, key: &str) -> Option<Vec<f64>> {
    fields.get(key).and_then(coerce_series)
}

/// Value of a projection series for a given year.
///
/// Years past the end of the series reuse the last element, matching the
/// pad-by-repeat horizon normalization.
pub fn series_at(series: Option<&[f64]>, year: usize) -> Option<f64> {
    series.and_then(|s| s.get(year).or_else(|| s.last()).copied())
}

/// Financial assumptions driving the three-statement model.
///
/// Growth and percentage fields are sequences indexed by projection year.
/// Every field is optional: the model engine applies its own fallbacks for
/// anything the schema neither required nor defaulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssumptionSet {
    /// Revenue growth per year.
    #[serde(rename = "revenueGrowthRate")]
    pub revenue_growth: Option<Vec<f64>>,

    /// COGS as a share of revenue.
    #[serde(rename = "cogsAsPercentageOfRevenue")]
    pub cogs_pct: Option<Vec<f64>>,

    /// SG&A as a share of revenue.
    #[serde(rename = "sgaAsPercentageOfRevenue")]
    pub sga_pct: Option<Vec<f64>>,

    /// R&D as a share of revenue.
    #[serde(rename = "rdAsPercentageOfRevenue")]
    pub rd_pct: Option<Vec<f64>>,

    /// Other operating expenses as a share of revenue.
    #[serde(rename = "otherOpExAsPercentageOfRevenue")]
    pub other_opex_pct: Option<Vec<f64>>,

    /// D&A as a share of revenue.
    #[serde(rename = "depreciationAsPercentageOfRevenue")]
    pub depreciation_pct: Option<Vec<f64>>,

    /// D&A growth, used only when no percentage-of-revenue is given.
    #[serde(rename = "depreciationGrowthRate")]
    pub depreciation_growth: Option<Vec<f64>>,

    /// CapEx as a share of revenue.
    #[serde(rename = "capexAsPercentageOfRevenue")]
    pub capex_pct: Option<Vec<f64>>,

    /// Flat tax rate.
    #[serde(rename = "taxRate")]
    pub tax_rate: Option<f64>,

    /// Flat interest rate on debt.
    #[serde(rename = "interestRateOnDebt")]
    pub interest_rate: Option<f64>,

    /// Receivables as a share of revenue (DSO / 365).
    #[serde(rename = "accountsReceivableAsPercentageOfSales")]
    pub receivables_pct: Option<f64>,

    /// Inventory as a share of COGS (DIO / 365).
    #[serde(rename = "inventoryAsPercentageOfCOGS")]
    pub inventory_pct: Option<f64>,

    /// Payables as a share of COGS (DPO / 365).
    #[serde(rename = "accountsPayableAsPercentageOfCOGS")]
    pub payables_pct: Option<f64>,

    /// Opening revenue.
    #[serde(rename = "baseRevenue")]
    pub base_revenue: Option<f64>,

    /// Opening cash.
    #[serde(rename = "baseCash")]
    pub base_cash: Option<f64>,

    /// Opening debt.
    #[serde(rename = "baseDebt")]
    pub base_debt: Option<f64>,

    /// Opening net PP&E.
    #[serde(rename = "basePPENet")]
    pub base_ppe_net: Option<f64>,

    /// Opening common stock.
    #[serde(rename = "baseCommonStock")]
    pub base_common_stock: Option<f64>,

    /// Opening retained earnings.
    #[serde(rename = "baseRetainedEarnings")]
    pub base_retained_earnings: Option<f64>,

    /// Opening D&A.
    #[serde(rename = "baseDA")]
    pub base_depreciation: Option<f64>,

    /// Opening receivables.
    #[serde(rename = "baseAccountsReceivable")]
    pub base_receivables: Option<f64>,

    /// Opening inventory.
    #[serde(rename = "baseInventory")]
    pub base_inventory: Option<f64>,

    /// Opening payables.
    #[serde(rename = "baseAccountsPayable")]
    pub base_payables: Option<f64>,

    /// Shares outstanding, for per-share equity value.
    #[serde(rename = "sharesOutstanding")]
    pub shares_outstanding: Option<f64>,
}

impl AssumptionSet {
    /// Build a typed assumption set from processed schema fields.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            revenue_growth: series(fields, keys::REVENUE_GROWTH_RATE),
            cogs_pct: series(fields, keys::COGS_PCT),
            sga_pct: series(fields, keys::SGA_PCT),
            rd_pct: series(fields, keys::RD_PCT),
            other_opex_pct: series(fields, keys::OTHER_OPEX_PCT),
            depreciation_pct: series(fields, keys::DEPRECIATION_PCT),
            depreciation_growth: series(fields, keys::DEPRECIATION_GROWTH_RATE),
            capex_pct: series(fields, keys::CAPEX_PCT),
            tax_rate: number(fields, keys::TAX_RATE),
            interest_rate: number(fields, keys::INTEREST_RATE),
            receivables_pct: number(fields, keys::RECEIVABLES_PCT),
            inventory_pct: number(fields, keys::INVENTORY_PCT),
            payables_pct: number(fields, keys::PAYABLES_PCT),
            base_revenue: number(fields, keys::BASE_REVENUE),
            base_cash: number(fields, keys::BASE_CASH),
            base_debt: number(fields, keys::BASE_DEBT),
            base_ppe_net: number(fields, keys::BASE_PPE_NET),
            base_common_stock: number(fields, keys::BASE_COMMON_STOCK),
            base_retained_earnings: number(fields, keys::BASE_RETAINED_EARNINGS),
            base_depreciation: number(fields, keys::BASE_DA),
            base_receivables: number(fields, keys::BASE_RECEIVABLES),
            base_inventory: number(fields, keys::BASE_INVENTORY),
            base_payables: number(fields, keys::BASE_PAYABLES),
            shares_outstanding: number(fields, keys::SHARES_OUTSTANDING),
        }
    }

    fn series_mut(&mut self) -> [(&'static str, &mut Option<Vec<f64>>); 8] {
        [
            (keys::REVENUE_GROWTH_RATE, &mut self.revenue_growth),
            (keys::COGS_PCT, &mut self.cogs_pct),
            (keys::SGA_PCT, &mut self.sga_pct),
            (keys::RD_PCT, &mut self.rd_pct),
            (keys::OTHER_OPEX_PCT, &mut self.other_opex_pct),
            (keys::DEPRECIATION_PCT, &mut self.depreciation_pct),
            (keys::DEPRECIATION_GROWTH_RATE, &mut self.depreciation_growth),
            (keys::CAPEX_PCT, &mut self.capex_pct),
        ]
    }

    /// Normalize every projection series to exactly `horizon` elements.
    ///
    /// Empty series cannot be padded; each one is reported and left empty.
    pub fn normalize_horizon(&mut self, horizon: usize, errors: &mut Vec<ValidationError>) {
        for (field, values) in self.series_mut() {
            if let Some(values) = values
                && !normalize_horizon(values, horizon)
            {
                errors.push(ValidationError::EmptySeries {
                    field: field.to_string(),
                    horizon,
                });
            }
        }
    }

    /// Lengths of every present projection series, keyed by field name.
    pub fn series_lengths(&self) -> Vec<(&'static str, usize)> {
        [
            (keys::REVENUE_GROWTH_RATE, &self.revenue_growth),
            (keys::COGS_PCT, &self.cogs_pct),
            (keys::SGA_PCT, &self.sga_pct),
            (keys::RD_PCT, &self.rd_pct),
            (keys::OTHER_OPEX_PCT, &self.other_opex_pct),
            (keys::DEPRECIATION_PCT, &self.depreciation_pct),
            (keys::DEPRECIATION_GROWTH_RATE, &self.depreciation_growth),
            (keys::CAPEX_PCT, &self.capex_pct),
        ]
        .into_iter()
        .filter_map(|(name, values)| values.as_ref().map(|v| (name, v.len())))
        .collect()
    }
}

/// How the value beyond the projection horizon is estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerminalValueMethod {
    /// Gordon growth: final FCFF grown in perpetuity.
    #[serde(rename = "gordonGrowth", alias = "perpetualGrowth")]
    PerpetualGrowth,

    /// Exit-year metric times a multiple.
    #[serde(rename = "exitMultiple")]
    ExitMultiple,
}

impl TerminalValueMethod {
    /// Wire name of the method.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerpetualGrowth => "gordonGrowth",
            Self::ExitMultiple => "exitMultiple",
        }
    }
}

impl FromStr for TerminalValueMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            m if m.eq_ignore_ascii_case("gordonGrowth")
                || m.eq_ignore_ascii_case("perpetualGrowth") =>
            {
                Ok(Self::PerpetualGrowth)
            }
            m if m.eq_ignore_ascii_case("exitMultiple") => Ok(Self::ExitMultiple),
            other => Err(format!("unknown terminal value method '{other}'")),
        }
    }
}

impl std::fmt::Display for TerminalValueMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exit-year metric an exit multiple is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExitMetric {
    /// EBITDA (EV/EBITDA multiple).
    #[default]
    #[serde(rename = "EBITDA")]
    Ebitda,

    /// EBIT (EV/EBIT multiple).
    #[serde(rename = "EBIT")]
    Ebit,

    /// Revenue (EV/Revenue multiple).
    #[serde(rename = "Revenue")]
    Revenue,

    /// Net income (P/E-style multiple).
    #[serde(rename = "NetIncome")]
    NetIncome,
}

impl ExitMetric {
    /// Display name of the metric.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Ebitda => "EBITDA",
            Self::Ebit => "EBIT",
            Self::Revenue => "Revenue",
            Self::NetIncome => "NetIncome",
        }
    }
}

impl FromStr for ExitMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match normalized.as_str() {
            "ebitda" => Ok(Self::Ebitda),
            "ebit" => Ok(Self::Ebit),
            "revenue" | "sales" => Ok(Self::Revenue),
            "netincome" | "earnings" => Ok(Self::NetIncome),
            _ => Err(format!("unknown exit multiple metric '{s}'")),
        }
    }
}

impl std::fmt::Display for ExitMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Valuation assumptions driving the DCF.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuationAssumptions {
    /// Discount rate.
    pub wacc: Option<f64>,

    /// Terminal value method, when it could be resolved.
    pub terminal_value_method: Option<TerminalValueMethod>,

    /// Perpetual growth rate.
    pub terminal_growth_rate: Option<f64>,

    /// Exit multiple.
    pub exit_multiple: Option<f64>,

    /// Exit multiple metric as supplied (e.g. `EBITDA`).
    pub exit_multiple_metric: Option<String>,
}

impl ValuationAssumptions {
    /// Build typed valuation assumptions from processed schema fields.
    pub fn from_fields(fields: &Map<String, Value>) -> Self {
        Self {
            wacc: number(fields, keys::WACC),
            terminal_value_method: fields
                .get(keys::TERMINAL_VALUE_METHOD)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            terminal_growth_rate: number(fields, keys::TERMINAL_GROWTH_RATE),
            exit_multiple: number(fields, keys::EXIT_MULTIPLE),
            exit_multiple_metric: fields
                .get(keys::EXIT_MULTIPLE_METRIC)
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }

    /// The exit metric, `Err` carrying the raw text when it is unrecognised.
    ///
    /// An absent metric resolves to EBITDA.
    pub fn exit_metric(&self) -> Result<ExitMetric, String> {
        self.exit_multiple_metric
            .as_deref()
            .map_or(Ok(ExitMetric::Ebitda), |raw| {
                raw.parse().map_err(|_| raw.to_string())
            })
    }
}

/// Prior-period income statement actuals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalIncomeStatement {
    /// Revenue.
    #[serde(default, deserialize_with = "lenient_number")]
    pub revenue: Option<f64>,

    /// Depreciation and amortization.
    #[serde(default, deserialize_with = "lenient_number")]
    pub depreciation_and_amortization: Option<f64>,
}

/// Prior-period balance sheet actuals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalBalanceSheet {
    /// Cash and equivalents.
    #[serde(default, deserialize_with = "lenient_number")]
    pub cash: Option<f64>,
    /// Total debt.
    #[serde(default, deserialize_with = "lenient_number")]
    pub total_debt: Option<f64>,
    /// Net PP&E.
    #[serde(default, deserialize_with = "lenient_number")]
    pub ppe_net: Option<f64>,
    /// Common stock.
    #[serde(default, deserialize_with = "lenient_number")]
    pub common_stock: Option<f64>,
    /// Retained earnings.
    #[serde(default, deserialize_with = "lenient_number")]
    pub retained_earnings: Option<f64>,
    /// Accounts receivable.
    #[serde(default, deserialize_with = "lenient_number")]
    pub accounts_receivable: Option<f64>,
    /// Inventory.
    #[serde(default, deserialize_with = "lenient_number")]
    pub inventory: Option<f64>,
    /// Accounts payable.
    #[serde(default, deserialize_with = "lenient_number")]
    pub accounts_payable: Option<f64>,
}

/// Optional prior-period actuals, consulted only for year-0 baselines.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalData {
    /// Income statement actuals.
    #[serde(default)]
    pub income_statement: Option<HistoricalIncomeStatement>,

    /// Balance sheet actuals.
    #[serde(default)]
    pub balance_sheet: Option<HistoricalBalanceSheet>,
}

impl HistoricalData {
    /// Whether no historical figure at all was supplied.
    pub fn is_empty(&self) -> bool {
        let income_empty = self
            .income_statement
            .as_ref()
            .is_none_or(|is| *is == HistoricalIncomeStatement::default());
        let balance_empty = self
            .balance_sheet
            .as_ref()
            .is_none_or(|bs| *bs == HistoricalBalanceSheet::default());
        income_empty && balance_empty
    }

    /// Historical revenue, if supplied.
    pub fn revenue(&self) -> Option<f64> {
        self.income_statement.as_ref().and_then(|is| is.revenue)
    }

    /// Historical D&A, if supplied.
    pub fn depreciation(&self) -> Option<f64> {
        self.income_statement
            .as_ref()
            .and_then(|is| is.depreciation_and_amortization)
    }

    /// Read a balance-sheet figure, if supplied.
    pub fn balance<F>(&self, field: F) -> Option<f64>
    where
        F: Fn(&HistoricalBalanceSheet) -> Option<f64>,
    {
        self.balance_sheet.as_ref().and_then(field)
    }
}
