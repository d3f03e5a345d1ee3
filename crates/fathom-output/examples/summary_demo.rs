//! Demonstration of a founder-mode projection, valuation, and summary.

use fathom_inputs::{Mode, RawInputs, process_inputs};
use fathom_model::generate_three_statement_model;
use fathom_output::{ReportBuilder, generate_summary_output, render_statements};
use fathom_valuation::generate_dcf_valuation;
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Fathom Summary Demo\n");

    // A young company growing quickly off a small base
    let raw: RawInputs = serde_json::from_value(json!({
        "assumptions": {
            "baseRevenue": 750_000,
            "revenueGrowthRate": [0.40, 0.30, 0.20, 0.12, 0.08],
            "cogsAsPercentageOfRevenue": [0.55, 0.52, 0.50, 0.50, 0.50],
            "sharesOutstanding": 1_000_000
        },
        "valuationAssumptions": {
            "wacc": 0.14,
            "terminalValueMethod": "gordonGrowth",
            "terminalGrowthRate": 0.03
        }
    }))?;

    let inputs = process_inputs(&raw, Mode::Founder);
    let model = generate_three_statement_model(&inputs, Mode::Founder, inputs.projection_years);
    let valuation = generate_dcf_valuation(&model, &inputs, Mode::Founder);
    let summary = generate_summary_output(&valuation, &model, &inputs, Mode::Founder);

    println!("{}", render_statements(&model));
    println!("{}", summary.to_ascii_table());

    let report = ReportBuilder::new()
        .company_name("Demo Co")
        .mode(Mode::Founder)
        .summary(&summary)
        .model(&model)
        .valuation(&valuation)
        .build()?;
    println!("Report JSON is {} bytes", report.to_json()?.len());

    Ok(())
}
