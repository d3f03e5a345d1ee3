//! Report envelopes for downstream export.

use std::io::Write;

use chrono::{DateTime, Utc};
use fathom_inputs::Mode;
use fathom_model::FinancialModel;
use fathom_valuation::{CompsAnalysis, DcfValuation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::summary::Summary;

/// Errors that can occur during report generation.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A complete run, packaged for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Company the model describes.
    pub company_name: String,

    /// Mode the run used.
    pub mode: Mode,

    /// Report generation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Number of projected years.
    pub projection_years: usize,

    /// Summary, model, valuation, and comps (JSON format).
    pub contents: serde_json::Value,
}

impl Report {
    /// Convert report to JSON string.
    pub fn to_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as pretty JSON.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ReportError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder<'a> {
    company_name: Option<String>,
    mode: Mode,
    summary: Option<&'a Summary>,
    model: Option<&'a FinancialModel>,
    valuation: Option<&'a DcfValuation>,
    comps: Option<&'a CompsAnalysis>,
}

impl<'a> ReportBuilder<'a> {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the company name.
    pub fn company_name(mut self, name: impl Into<String>) -> Self {
        self.company_name = Some(name.into());
        self
    }

    /// Set the mode.
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the summary.
    pub const fn summary(mut self, summary: &'a Summary) -> Self {
        self.summary = Some(summary);
        self
    }

    /// Set the projected model.
    pub const fn model(mut self, model: &'a FinancialModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Set the DCF valuation.
    pub const fn valuation(mut self, valuation: &'a DcfValuation) -> Self {
        self.valuation = Some(valuation);
        self
    }

    /// Set the comparable company analysis.
    pub const fn comps(mut self, comps: &'a CompsAnalysis) -> Self {
        self.comps = Some(comps);
        self
    }

    /// Build the report.
    pub fn build(self) -> Result<Report, ReportError> {
        let mut contents = serde_json::Map::new();
        if let Some(summary) = self.summary {
            contents.insert("summary".into(), serde_json::to_value(summary)?);
        }
        if let Some(model) = self.model {
            contents.insert("financialModel".into(), serde_json::to_value(model)?);
        }
        if let Some(valuation) = self.valuation {
            contents.insert("valuation".into(), serde_json::to_value(valuation)?);
        }
        if let Some(comps) = self.comps {
            contents.insert("comparableCompanies".into(), serde_json::to_value(comps)?);
        }

        Ok(Report {
            company_name: self.company_name.unwrap_or_default(),
            mode: self.mode,
            timestamp: self
                .summary
                .map_or_else(Utc::now, |summary| summary.generated_at),
            projection_years: self.model.map_or(0, FinancialModel::projection_years),
            contents: serde_json::Value::Object(contents),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_inputs::{RawInputs, process_inputs};
    use fathom_model::generate_three_statement_model;
    use fathom_valuation::generate_dcf_valuation;

    use crate::summary::generate_summary_output;

    #[test]
    fn test_empty_report() {
        let report = ReportBuilder::new().company_name("Acme").build().unwrap();

        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.mode, Mode::Founder);
        assert_eq!(report.projection_years, 0);
        assert_eq!(report.contents, serde_json::json!({}));
    }

    #[test]
    fn test_report_builder() {
        let inputs = process_inputs(&RawInputs::default(), Mode::Founder);
        let model = generate_three_statement_model(&inputs, Mode::Founder, 4);
        let valuation = generate_dcf_valuation(&model, &inputs, Mode::Founder);
        let summary = generate_summary_output(&valuation, &model, &inputs, Mode::Founder);

        let report = ReportBuilder::new()
            .company_name("Acme")
            .mode(Mode::Founder)
            .summary(&summary)
            .model(&model)
            .valuation(&valuation)
            .build()
            .unwrap();

        assert_eq!(report.projection_years, 4);
        assert_eq!(report.timestamp, summary.generated_at);
        assert!(report.contents["summary"]["estimatedEnterpriseValue"].is_number());
        assert_eq!(
            report.contents["financialModel"]["incomeStatement"]
                .as_array()
                .unwrap()
                .len(),
            4
        );
        assert!(report.contents.get("comparableCompanies").is_none());

        let mut buffer = Vec::new();
        report.write_json(&mut buffer).unwrap();
        let parsed: Report = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed.company_name, "Acme");
        assert!(report.to_json().unwrap().contains("\"companyName\": \"Acme\""));
    }
}
