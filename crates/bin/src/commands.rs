//! Command handlers.

use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::{Path, PathBuf};

use fathom::{ModelRequest, Pipeline, PipelineConfig};
use fathom_inputs::{FieldSpec, Mode, Requirement, Schema};
use fathom_output::{render_statements, render_statements_markdown};
use fathom_valuation::{ComparableCompany, CompsAnalysis, MultipleKind, generate_comps_analysis};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::OutputFormat;
use crate::error::CliError;

/// Options of the `run` command.
pub(crate) struct RunOptions {
    pub(crate) input: PathBuf,
    pub(crate) mode: Option<Mode>,
    pub(crate) years: usize,
    pub(crate) format: OutputFormat,
    pub(crate) statements: bool,
    pub(crate) lenient: bool,
    pub(crate) report: Option<PathBuf>,
}

fn read_input(path: &Path) -> Result<String, CliError> {
    let read_error = |source| CliError::Read {
        path: path.to_path_buf(),
        source,
    };

    if path.as_os_str() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).map_err(read_error)?;
        return Ok(buffer);
    }
    std::fs::read_to_string(path).map_err(read_error)
}

fn parse_input<T: DeserializeOwned>(path: &Path, contents: &str) -> Result<T, CliError> {
    serde_json::from_str(contents).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Run the full pipeline on a request file.
pub(crate) fn run_model(options: &RunOptions) -> Result<(), CliError> {
    let contents = read_input(&options.input)?;
    let mut request: ModelRequest = parse_input(&options.input, &contents)?;
    if let Some(mode) = options.mode {
        request.mode = Some(mode.to_string());
    }

    let pipeline = Pipeline::new(PipelineConfig {
        projection_years: options.years,
        reject_invalid: !options.lenient,
    });
    let analysis = pipeline.run(&request)?;

    match options.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&analysis)?),
        OutputFormat::Text => {
            print!("{}", analysis.summary.to_ascii_table());
            if options.statements {
                print!("{}", render_statements(&analysis.model));
            }
        }
        OutputFormat::Markdown => {
            print!("{}", analysis.summary.to_markdown());
            if options.statements {
                print!("\n{}", render_statements_markdown(&analysis.model));
            }
        }
    }

    if let Some(path) = &options.report {
        let file = File::create(path).map_err(|source| CliError::Write {
            path: path.clone(),
            source,
        })?;
        analysis.report()?.write_json(BufWriter::new(file))?;
        tracing::info!(path = %path.display(), "report written");
    }

    Ok(())
}

fn requirement_label(field: &FieldSpec) -> &'static str {
    match (&field.requirement, &field.default) {
        (_, Some(_)) => "default",
        (Requirement::Required, None) => "required",
        (Requirement::When(_), None) => "conditional",
        (Requirement::Optional, None) => "optional",
    }
}

/// Print the input schema of a mode.
pub(crate) fn print_schema(mode: Mode) {
    println!("\nInput schema ({mode} mode)");
    for schema in [Schema::assumptions(mode), Schema::valuation(mode)] {
        println!("{}", "=".repeat(80));
        println!("{} fields", schema.group());
        println!("{}", "-".repeat(80));
        println!("{:<40} {:<8} {:<12} {}", "Field", "Type", "Status", "Default");
        for field in schema.fields() {
            let default = field
                .default
                .as_ref()
                .map_or_else(String::new, Value::to_string);
            println!(
                "{:<40} {:<8} {:<12} {}",
                field.name,
                field.field_type.to_string(),
                requirement_label(field),
                default
            );
            if !field.allowed.is_empty() {
                println!("{:<40} one of: {}", "", field.allowed.join(", "));
            }
        }
    }
}

/// Analyse peers from a file.
pub(crate) fn run_comps(input: &Path, format: OutputFormat) -> Result<(), CliError> {
    let contents = read_input(input)?;
    let value: Value = parse_input(input, &contents)?;
    let companies: Vec<ComparableCompany> = match value {
        Value::Array(_) => serde_json::from_value(value),
        other => serde_json::from_value::<ModelRequest>(other).map(|r| r.comparable_companies),
    }
    .map_err(|source| CliError::Parse {
        path: input.to_path_buf(),
        source,
    })?;

    let comps = generate_comps_analysis(&companies, Mode::default());

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&comps)?),
        OutputFormat::Text => print!("{}", comps_table(&comps)),
        OutputFormat::Markdown => print!("{}", comps_markdown(&comps)),
    }
    Ok(())
}

fn multiple(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:.2}"))
}

fn comps_table(comps: &CompsAnalysis) -> String {
    let mut output = String::new();

    output.push_str("\nComparable Companies\n");
    output.push_str(&"=".repeat(80));
    output.push('\n');
    if let Some(message) = &comps.message {
        output.push_str(&format!("{message}\n"));
        return output;
    }

    output.push_str(&format!(
        "{:<32} {:>14} {:>14} {:>14}\n",
        "Company", "EV/Revenue", "EV/EBITDA", "P/E"
    ));
    output.push_str(&"-".repeat(80));
    output.push('\n');
    for (i, comp) in comps.detailed_comps.iter().enumerate() {
        let name = comp
            .company
            .company_name
            .clone()
            .unwrap_or_else(|| format!("Company {}", i + 1));
        output.push_str(&format!(
            "{:<32} {:>14} {:>14} {:>14}\n",
            name,
            multiple(comp.ev_to_revenue),
            multiple(comp.ev_to_ebitda),
            multiple(comp.pe_ratio)
        ));
    }

    output.push_str(&"-".repeat(80));
    output.push('\n');
    for kind in MultipleKind::all() {
        if let Some(stats) = comps.summary_metrics.get(kind) {
            output.push_str(&format!(
                "{:<12} mean {:>8.2}  median {:>8.2}  high {:>8.2}  low {:>8.2}  (n={})\n",
                kind.to_string(),
                stats.mean,
                stats.median,
                stats.high,
                stats.low,
                stats.count
            ));
        }
    }

    output
}

fn comps_markdown(comps: &CompsAnalysis) -> String {
    let mut output = String::from("# Comparable Companies\n\n");
    if let Some(message) = &comps.message {
        output.push_str(&format!("{message}\n"));
        return output;
    }

    output.push_str("| Company | EV/Revenue | EV/EBITDA | P/E |\n");
    output.push_str("|---------|-----------:|----------:|----:|\n");
    for (i, comp) in comps.detailed_comps.iter().enumerate() {
        let name = comp
            .company
            .company_name
            .clone()
            .unwrap_or_else(|| format!("Company {}", i + 1));
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            name,
            multiple(comp.ev_to_revenue),
            multiple(comp.ev_to_ebitda),
            multiple(comp.pe_ratio)
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer(name: &str, ev: f64) -> ComparableCompany {
        ComparableCompany {
            company_name: Some(name.to_string()),
            enterprise_value: Some(ev),
            ltm_revenue: Some(2_000_000.0),
            ltm_ebitda: Some(1_000_000.0),
            ltm_net_income: Some(500_000.0),
            market_cap: Some(9_000_000.0),
        }
    }

    #[test]
    fn test_comps_table() {
        let comps = generate_comps_analysis(
            &[peer("Alpha", 10_000_000.0), peer("Beta", 12_000_000.0)],
            Mode::Founder,
        );
        let table = comps_table(&comps);

        assert!(table.contains("Alpha"));
        assert!(table.contains("Beta"));
        assert!(table.contains("EV/EBITDA    mean    11.00"));
        assert!(comps_markdown(&comps).contains("| Alpha | 5.00 | 10.00 | 18.00 |"));
    }

    #[test]
    fn test_comps_table_without_peers() {
        let comps = generate_comps_analysis(&[], Mode::Founder);
        assert!(comps_table(&comps).contains("No comparable company data provided."));
    }

    #[test]
    fn test_requirement_label() {
        assert_eq!(requirement_label(&FieldSpec::number("x")), "optional");
        assert_eq!(requirement_label(&FieldSpec::number("x").required()), "required");
        assert_eq!(
            requirement_label(&FieldSpec::number("x").with_default(1.0)),
            "default"
        );
    }

    #[test]
    fn test_parse_input_reports_path() {
        let err = parse_input::<ModelRequest>(Path::new("bad.json"), "{").unwrap_err();
        assert!(err.to_string().contains("bad.json"));
    }
}
