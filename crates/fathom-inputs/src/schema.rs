//! Declarative input schemas.
//!
//! Each mode has two schema groups: the financial assumptions that drive the
//! three-statement model, and the valuation assumptions that drive the DCF.
//! A schema is plain data, a list of [`FieldSpec`]s, evaluated by the
//! generic validator in [`crate::validator`].

use crate::assumptions::TerminalValueMethod;
use crate::mode::Mode;
use derive_more::Display;
use serde::Serialize;
use serde_json::{Map, Value};

/// JSON field names shared by the schemas and the typed assumption sets.
pub mod keys {
    /// Revenue growth per projection year.
    pub const REVENUE_GROWTH_RATE: &str = "revenueGrowthRate";
    /// COGS as a share of revenue.
    pub const COGS_PCT: &str = "cogsAsPercentageOfRevenue";
    /// SG&A as a share of revenue.
    pub const SGA_PCT: &str = "sgaAsPercentageOfRevenue";
    /// R&D as a share of revenue.
    pub const RD_PCT: &str = "rdAsPercentageOfRevenue";
    /// Other operating expenses as a share of revenue.
    pub const OTHER_OPEX_PCT: &str = "otherOpExAsPercentageOfRevenue";
    /// Depreciation and amortization as a share of revenue.
    pub const DEPRECIATION_PCT: &str = "depreciationAsPercentageOfRevenue";
    /// Growth of D&A when no percentage-of-revenue is given.
    pub const DEPRECIATION_GROWTH_RATE: &str = "depreciationGrowthRate";
    /// Capital expenditure as a share of revenue.
    pub const CAPEX_PCT: &str = "capexAsPercentageOfRevenue";
    /// Flat tax rate.
    pub const TAX_RATE: &str = "taxRate";
    /// Flat interest rate on debt.
    pub const INTEREST_RATE: &str = "interestRateOnDebt";
    /// Receivables as a share of revenue (DSO / 365).
    pub const RECEIVABLES_PCT: &str = "accountsReceivableAsPercentageOfSales";
    /// Inventory as a share of COGS (DIO / 365).
    pub const INVENTORY_PCT: &str = "inventoryAsPercentageOfCOGS";
    /// Payables as a share of COGS (DPO / 365).
    pub const PAYABLES_PCT: &str = "accountsPayableAsPercentageOfCOGS";
    /// Opening revenue.
    pub const BASE_REVENUE: &str = "baseRevenue";
    /// Opening cash.
    pub const BASE_CASH: &str = "baseCash";
    /// Opening debt.
    pub const BASE_DEBT: &str = "baseDebt";
    /// Opening net PP&E.
    pub const BASE_PPE_NET: &str = "basePPENet";
    /// Opening common stock.
    pub const BASE_COMMON_STOCK: &str = "baseCommonStock";
    /// Opening retained earnings.
    pub const BASE_RETAINED_EARNINGS: &str = "baseRetainedEarnings";
    /// Opening D&A.
    pub const BASE_DA: &str = "baseDA";
    /// Opening receivables.
    pub const BASE_RECEIVABLES: &str = "baseAccountsReceivable";
    /// Opening inventory.
    pub const BASE_INVENTORY: &str = "baseInventory";
    /// Opening payables.
    pub const BASE_PAYABLES: &str = "baseAccountsPayable";
    /// Diluted shares outstanding.
    pub const SHARES_OUTSTANDING: &str = "sharesOutstanding";
    /// Historical data block (investor schema only).
    pub const HISTORICAL_DATA: &str = "historicalData";

    /// Discount rate.
    pub const WACC: &str = "wacc";
    /// Terminal value method selector.
    pub const TERMINAL_VALUE_METHOD: &str = "terminalValueMethod";
    /// Perpetual growth rate.
    pub const TERMINAL_GROWTH_RATE: &str = "terminalGrowthRate";
    /// Exit multiple.
    pub const EXIT_MULTIPLE: &str = "exitMultiple";
    /// Metric the exit multiple applies to.
    pub const EXIT_MULTIPLE_METRIC: &str = "exitMultipleMetric";
}

/// Accepted spellings of the terminal value method.
pub const TERMINAL_VALUE_METHODS: &[&str] = &["gordonGrowth", "perpetualGrowth", "exitMultiple"];

/// JSON type expected for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// A single number.
    #[display("number")]
    Number,

    /// An ordered sequence of numbers indexed by projection year.
    #[display("array")]
    NumberSeries,

    /// A string.
    #[display("string")]
    Text,

    /// A JSON object.
    #[display("object")]
    Object,
}

impl FieldType {
    /// Whether a JSON value has this type.
    pub const fn matches(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Number, Value::Number(_))
                | (Self::NumberSeries, Value::Array(_))
                | (Self::Text, Value::String(_))
                | (Self::Object, Value::Object(_))
        )
    }
}

/// Name of a JSON value's type, for error messages.
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Predicate over the fields processed so far in the same group.
pub type RequiredPredicate = fn(&Map<String, Value>) -> bool;

/// Whether a field must be supplied.
#[derive(Debug, Clone, Copy)]
pub enum Requirement {
    /// Never required.
    Optional,

    /// Always required.
    Required,

    /// Required when the predicate holds for the already-processed fields.
    When(RequiredPredicate),
}

impl Requirement {
    /// Evaluate the requirement against the fields processed so far.
    pub fn is_required(&self, processed: &Map<String, Value>) -> bool {
        match self {
            Self::Optional => false,
            Self::Required => true,
            Self::When(predicate) => predicate(processed),
        }
    }
}

/// Schema group a field belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchemaGroup {
    /// Financial assumptions driving the three-statement model.
    #[display("assumption")]
    Assumptions,

    /// Valuation assumptions driving the DCF.
    #[display("valuation assumption")]
    Valuation,
}

/// Declaration of a single input field.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// JSON field name.
    pub name: &'static str,

    /// Expected JSON type.
    pub field_type: FieldType,

    /// Value used when the field is absent.
    pub default: Option<Value>,

    /// Whether the field must be supplied when there is no default.
    pub requirement: Requirement,

    /// Allowed values for text fields (empty means unrestricted).
    pub allowed: &'static [&'static str],
}

impl FieldSpec {
    const fn new(name: &'static str, field_type: FieldType) -> Self {
        Self {
            name,
            field_type,
            default: None,
            requirement: Requirement::Optional,
            allowed: &[],
        }
    }

    /// Declare an optional number field.
    pub const fn number(name: &'static str) -> Self {
        Self::new(name, FieldType::Number)
    }

    /// Declare an optional projection series field.
    pub const fn series(name: &'static str) -> Self {
        Self::new(name, FieldType::NumberSeries)
    }

    /// Declare an optional text field.
    pub const fn text(name: &'static str) -> Self {
        Self::new(name, FieldType::Text)
    }

    /// Declare an optional object field.
    pub const fn object(name: &'static str) -> Self {
        Self::new(name, FieldType::Object)
    }

    /// Set the default value.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Mark the field as always required.
    pub const fn required(mut self) -> Self {
        self.requirement = Requirement::Required;
        self
    }

    /// Mark the field as required when `predicate` holds.
    pub const fn required_when(mut self, predicate: RequiredPredicate) -> Self {
        self.requirement = Requirement::When(predicate);
        self
    }

    /// Restrict a text field to a set of values.
    pub const fn one_of(mut self, allowed: &'static [&'static str]) -> Self {
        self.allowed = allowed;
        self
    }
}

/// An ordered list of field declarations for one group and mode.
#[derive(Debug, Clone)]
pub struct Schema {
    group: SchemaGroup,
    fields: Vec<FieldSpec>,
}

impl Schema {
    /// Create a schema from field declarations.
    pub const fn new(group: SchemaGroup, fields: Vec<FieldSpec>) -> Self {
        Self { group, fields }
    }

    /// Schema group.
    pub const fn group(&self) -> SchemaGroup {
        self.group
    }

    /// Field declarations in evaluation order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Look up a field declaration by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Financial assumption schema for a mode.
    pub fn assumptions(mode: Mode) -> Self {
        match mode {
            Mode::Founder => Self::new(SchemaGroup::Assumptions, founder_assumptions()),
            Mode::Investor => Self::new(SchemaGroup::Assumptions, investor_assumptions()),
        }
    }

    /// Valuation assumption schema for a mode.
    pub fn valuation(mode: Mode) -> Self {
        match mode {
            Mode::Founder => Self::new(SchemaGroup::Valuation, founder_valuation()),
            Mode::Investor => Self::new(SchemaGroup::Valuation, investor_valuation()),
        }
    }
}

fn founder_assumptions() -> Vec<FieldSpec> {
    use keys::*;

    vec![
        FieldSpec::series(REVENUE_GROWTH_RATE).with_default(vec![0.1, 0.08, 0.05, 0.03, 0.03]),
        FieldSpec::series(COGS_PCT).with_default(vec![0.6; 5]),
        FieldSpec::series(SGA_PCT).with_default(vec![0.15, 0.15, 0.14, 0.14, 0.13]),
        FieldSpec::series(RD_PCT).with_default(vec![0.0; 5]),
        FieldSpec::series(OTHER_OPEX_PCT).with_default(vec![0.0; 5]),
        FieldSpec::series(DEPRECIATION_PCT).with_default(vec![0.03; 5]),
        FieldSpec::series(DEPRECIATION_GROWTH_RATE),
        FieldSpec::series(CAPEX_PCT).with_default(vec![0.04, 0.04, 0.04, 0.03, 0.03]),
        FieldSpec::number(TAX_RATE).with_default(0.21),
        FieldSpec::number(INTEREST_RATE).with_default(0.05),
        FieldSpec::number(RECEIVABLES_PCT).with_default(30.0 / 365.0),
        FieldSpec::number(INVENTORY_PCT).with_default(45.0 / 365.0),
        FieldSpec::number(PAYABLES_PCT).with_default(30.0 / 365.0),
        FieldSpec::number(BASE_REVENUE).with_default(1_000_000.0),
        FieldSpec::number(BASE_CASH).with_default(100_000.0),
        FieldSpec::number(BASE_DEBT).with_default(50_000.0),
        FieldSpec::number(BASE_PPE_NET).with_default(200_000.0),
        FieldSpec::number(BASE_COMMON_STOCK).with_default(100_000.0),
        // Derived as the balancing figure of the opening balance sheet when absent.
        FieldSpec::number(BASE_RETAINED_EARNINGS),
        FieldSpec::number(BASE_DA),
        FieldSpec::number(BASE_RECEIVABLES),
        FieldSpec::number(BASE_INVENTORY),
        FieldSpec::number(BASE_PAYABLES),
        FieldSpec::number(SHARES_OUTSTANDING),
    ]
}

fn investor_assumptions() -> Vec<FieldSpec> {
    use keys::*;

    vec![
        FieldSpec::series(REVENUE_GROWTH_RATE).required(),
        FieldSpec::series(COGS_PCT).required(),
        FieldSpec::series(SGA_PCT).required(),
        FieldSpec::series(RD_PCT).with_default(vec![0.0; 5]),
        FieldSpec::series(OTHER_OPEX_PCT),
        FieldSpec::series(DEPRECIATION_PCT).required(),
        FieldSpec::series(DEPRECIATION_GROWTH_RATE),
        FieldSpec::series(CAPEX_PCT).required(),
        FieldSpec::number(TAX_RATE).required(),
        FieldSpec::number(INTEREST_RATE).required(),
        FieldSpec::number(RECEIVABLES_PCT).required(),
        FieldSpec::number(INVENTORY_PCT).required(),
        FieldSpec::number(PAYABLES_PCT).required(),
        FieldSpec::object(HISTORICAL_DATA),
        FieldSpec::number(BASE_REVENUE),
        FieldSpec::number(BASE_CASH),
        FieldSpec::number(BASE_DEBT),
        FieldSpec::number(BASE_PPE_NET),
        FieldSpec::number(BASE_COMMON_STOCK),
        FieldSpec::number(BASE_RETAINED_EARNINGS),
        FieldSpec::number(BASE_DA),
        FieldSpec::number(BASE_RECEIVABLES),
        FieldSpec::number(BASE_INVENTORY),
        FieldSpec::number(BASE_PAYABLES),
        FieldSpec::number(SHARES_OUTSTANDING),
    ]
}

fn founder_valuation() -> Vec<FieldSpec> {
    use keys::*;

    vec![
        FieldSpec::number(WACC).with_default(0.10),
        FieldSpec::text(TERMINAL_VALUE_METHOD)
            .with_default("exitMultiple")
            .one_of(TERMINAL_VALUE_METHODS),
        FieldSpec::number(TERMINAL_GROWTH_RATE).with_default(0.02),
        FieldSpec::number(EXIT_MULTIPLE).with_default(8.0),
        FieldSpec::text(EXIT_MULTIPLE_METRIC).with_default("EBITDA"),
    ]
}

fn investor_valuation() -> Vec<FieldSpec> {
    use keys::*;

    vec![
        FieldSpec::number(WACC).required(),
        FieldSpec::text(TERMINAL_VALUE_METHOD)
            .required()
            .one_of(TERMINAL_VALUE_METHODS),
        FieldSpec::number(TERMINAL_GROWTH_RATE).required_when(uses_perpetual_growth),
        FieldSpec::number(EXIT_MULTIPLE).required_when(uses_exit_multiple),
        FieldSpec::text(EXIT_MULTIPLE_METRIC).with_default("EBITDA"),
    ]
}

fn selected_method(processed: &Map<String, Value>) -> Option<TerminalValueMethod> {
    processed
        .get(keys::TERMINAL_VALUE_METHOD)
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
}

fn uses_perpetual_growth(processed: &Map<String, Value>) -> bool {
    selected_method(processed) == Some(TerminalValueMethod::PerpetualGrowth)
}

fn uses_exit_multiple(processed: &Map<String, Value>) -> bool {
    selected_method(processed) == Some(TerminalValueMethod::ExitMultiple)
}
