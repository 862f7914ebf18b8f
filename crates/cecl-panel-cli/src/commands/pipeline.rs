use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::info;

use cecl_panel_core::calibration::{calibrate_products, CalibrationInput};
use cecl_panel_core::ecl::{run_cecl, CeclInput, DEFAULT_LGD};
use cecl_panel_core::reporting::{build_report, ReportInput};
use cecl_panel_core::simulation::{generate_portfolio, PortfolioInput};
use cecl_panel_core::validation::{validate_dataset, ValidationInput};
use cecl_panel_core::ProductType;

use crate::input;

/// Arguments for the end-to-end run
#[derive(Args)]
pub struct PipelineArgs {
    /// YAML/JSON pipeline config; defaults apply when omitted
    #[arg(long)]
    pub config: Option<String>,
}

/// Generate, validate, estimate, calibrate and report in one pass.
#[derive(Debug, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub portfolio: PortfolioInput,
    /// Cumulative default targets; calibration is skipped when empty.
    #[serde(default)]
    pub targets: BTreeMap<ProductType, Vec<f64>>,
    #[serde(default)]
    pub calibration_months: Option<usize>,
    #[serde(default = "default_lgd")]
    pub default_lgd: f64,
}

fn default_lgd() -> f64 {
    DEFAULT_LGD
}

pub fn run_pipeline(args: PipelineArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let config: PipelineConfig = match args.config {
        Some(ref path) => input::file::read_config(path)?,
        None => serde_json::from_value(json!({}))?,
    };

    let portfolio = generate_portfolio(&config.portfolio)?;
    let mut warnings = portfolio.warnings.clone();
    let portfolio = portfolio.result;

    let mut validation_input = ValidationInput::default();
    for (product, loans) in &portfolio.loans {
        let rows = loans.iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
        validation_input.loans.insert(*product, rows);
    }
    for (product, panel) in &portfolio.panels {
        let rows = panel.records.iter().map(serde_json::to_value).collect::<Result<_, _>>()?;
        validation_input.panels.insert(*product, rows);
    }
    let validation = validate_dataset(&validation_input)?.result;
    if !validation.passed {
        warnings.push(format!("validation reported {} errors", validation.errors));
    }

    let panel: Vec<_> = portfolio
        .panels
        .values()
        .flat_map(|p| p.records.iter().cloned())
        .collect();
    let loans: Vec<_> = portfolio.loans.values().flatten().cloned().collect();

    let cecl = run_cecl(&CeclInput {
        panel: panel.clone(),
        default_lgd: config.default_lgd,
    })?;
    warnings.extend(cecl.warnings);

    let calibration = if config.targets.is_empty() {
        None
    } else {
        let out = calibrate_products(&CalibrationInput {
            panel: panel.clone(),
            targets: config.targets.clone(),
            months: config.calibration_months,
            default_lgd: config.default_lgd,
        })?;
        warnings.extend(out.warnings);
        Some(out.result)
    };

    let report = build_report(&ReportInput {
        panel,
        loans,
        default_lgd: config.default_lgd,
    })?
    .result;

    info!(
        products = portfolio.panels.len(),
        total_ecl = cecl.result.total_ecl,
        calibrated = calibration.is_some(),
        "pipeline complete"
    );

    Ok(json!({
        "result": {
            "portfolio": portfolio,
            "validation": validation,
            "cecl": cecl.result,
            "calibration": calibration,
            "report": report,
        },
        "warnings": warnings,
        "methodology": "Portfolio generation, validation, CECL, calibration and reporting",
    }))
}
