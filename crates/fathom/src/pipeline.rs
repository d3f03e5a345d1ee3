//! End-to-end run of one modeling request.
//!
//! Inputs are validated once, the statements projected once, and every
//! later stage reads those results without modifying them.

use fathom_inputs::{
    DEFAULT_PROJECTION_YEARS, Mode, ProcessorConfig, RawInputs, ValidatedInputs,
    process_inputs_with_config,
};
use fathom_model::{FinancialModel, generate_three_statement_model};
use fathom_output::{Report, ReportBuilder, ReportError, Summary, generate_summary_output};
use fathom_valuation::{
    ComparableCompany, CompsAnalysis, DcfValuation, generate_comps_analysis,
    generate_dcf_valuation,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that stop a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Inputs failed validation and the pipeline rejects invalid inputs.
    #[error("Validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    /// The request could not be parsed.
    #[error("Invalid request: {0}")]
    Request(#[from] serde_json::Error),
}

/// A modeling request as received from a caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    /// `founder` or `investor`; anything else runs as founder.
    #[serde(default)]
    pub mode: Option<String>,

    /// Company the model describes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,

    /// Assumptions, valuation assumptions, and historical data.
    #[serde(flatten)]
    pub inputs: RawInputs,

    /// Peers for comparable company analysis.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comparable_companies: Vec<ComparableCompany>,
}

/// Pipeline configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PipelineConfig {
    /// Number of years to project.
    pub projection_years: usize,

    /// Fail the run when inputs have validation errors.
    pub reject_invalid: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            projection_years: DEFAULT_PROJECTION_YEARS,
            reject_invalid: true,
        }
    }
}

/// Everything one run produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Company the model describes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Validated inputs.
    pub inputs: ValidatedInputs,
    /// Projected statements.
    pub model: FinancialModel,
    /// DCF valuation.
    pub valuation: DcfValuation,
    /// Comparable company analysis, when peers were supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comps: Option<CompsAnalysis>,
    /// Headline summary.
    pub summary: Summary,
}

impl Analysis {
    /// Mode the run used.
    pub const fn mode(&self) -> Mode {
        self.inputs.mode
    }

    /// Package the run as a [`Report`].
    pub fn report(&self) -> Result<Report, ReportError> {
        let mut builder = ReportBuilder::new()
            .company_name(self.company_name.clone().unwrap_or_default())
            .mode(self.mode())
            .summary(&self.summary)
            .model(&self.model)
            .valuation(&self.valuation);
        if let Some(comps) = &self.comps {
            builder = builder.comps(comps);
        }
        builder.build()
    }
}

/// Runs requests through validation, projection, valuation, and summary.
#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline with the given configuration.
    pub const fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Parse a JSON request and run it.
    pub fn run_json(&self, json: &str) -> Result<Analysis, PipelineError> {
        let request: ModelRequest = serde_json::from_str(json)?;
        self.run(&request)
    }

    /// Run one request.
    pub fn run(&self, request: &ModelRequest) -> Result<Analysis, PipelineError> {
        let (mode, mode_diagnostic) = request
            .mode
            .as_deref()
            .map_or((Mode::default(), None), Mode::resolve);

        let _span = tracing::info_span!("pipeline", %mode).entered();

        let processor = ProcessorConfig {
            projection_years: self.config.projection_years,
        };
        let mut inputs = process_inputs_with_config(&request.inputs, mode, &processor);
        if let Some(diagnostic) = mode_diagnostic {
            inputs.diagnostics.push(diagnostic);
        }

        if self.config.reject_invalid && !inputs.is_valid() {
            tracing::warn!(errors = inputs.errors.len(), "rejecting invalid inputs");
            return Err(PipelineError::Validation(inputs.error_messages()));
        }

        let model = generate_three_statement_model(&inputs, mode, inputs.projection_years);
        let valuation = generate_dcf_valuation(&model, &inputs, mode);

        let comps = (!request.comparable_companies.is_empty())
            .then(|| generate_comps_analysis(&request.comparable_companies, mode));

        let mut summary = generate_summary_output(&valuation, &model, &inputs, mode);
        if let Some(comps) = &comps {
            summary = summary.with_comps(comps);
        }

        tracing::info!(
            years = model.projection_years(),
            enterprise_value = ?summary.estimated_enterprise_value,
            diagnostics = summary.diagnostics.len(),
            "model generated"
        );

        Ok(Analysis {
            company_name: request.company_name.clone(),
            inputs,
            model,
            valuation,
            comps,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fathom_inputs::DiagnosticKind;
    use serde_json::json;

    fn request(value: serde_json::Value) -> ModelRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_default_request_runs_founder() {
        let analysis = Pipeline::default().run(&ModelRequest::default()).unwrap();

        assert_eq!(analysis.mode(), Mode::Founder);
        assert_eq!(analysis.model.projection_years(), 5);
        assert!(analysis.comps.is_none());
        assert!(analysis.summary.comparable_company_summary.is_none());
    }

    #[test]
    fn test_unknown_mode_falls_back() {
        let analysis = Pipeline::default()
            .run(&request(json!({"mode": "analyst"})))
            .unwrap();

        assert_eq!(analysis.mode(), Mode::Founder);
        assert_eq!(
            analysis
                .summary
                .diagnostics
                .of_kind(DiagnosticKind::Validation)
                .count(),
            1
        );
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let err = Pipeline::default()
            .run(&request(json!({"mode": "investor"})))
            .unwrap_err();

        let PipelineError::Validation(messages) = err else {
            panic!("expected a validation error");
        };
        assert!(messages.iter().any(|m| m.contains("revenueGrowthRate")));
    }

    #[test]
    fn test_lenient_pipeline_proceeds() {
        let pipeline = Pipeline::new(PipelineConfig {
            reject_invalid: false,
            ..Default::default()
        });
        let analysis = pipeline.run(&request(json!({"mode": "investor"}))).unwrap();

        assert!(!analysis.inputs.is_valid());
        assert_eq!(analysis.summary.estimated_enterprise_value, None);
    }

    #[test]
    fn test_configured_horizon() {
        let pipeline = Pipeline::new(PipelineConfig {
            projection_years: 8,
            ..Default::default()
        });
        let analysis = pipeline.run(&ModelRequest::default()).unwrap();

        assert_eq!(analysis.model.projection_years(), 8);
        assert_eq!(analysis.valuation.fcffs.len(), 8);
        assert_eq!(analysis.summary.core_assumptions.projection_years, 8);
    }

    #[test]
    fn test_run_json_rejects_malformed() {
        assert!(matches!(
            Pipeline::default().run_json("{not json"),
            Err(PipelineError::Request(_))
        ));
    }

    #[test]
    fn test_report() {
        let analysis = Pipeline::default()
            .run(&request(json!({"companyName": "Acme"})))
            .unwrap();
        let report = analysis.report().unwrap();

        assert_eq!(report.company_name, "Acme");
        assert_eq!(report.projection_years, 5);
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: PipelineConfig = serde_json::from_value(json!({"projectionYears": 3})).unwrap();
        assert_eq!(config.projection_years, 3);
        assert!(config.reject_invalid);
    }
}
