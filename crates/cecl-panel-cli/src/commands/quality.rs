use clap::Args;
use serde_json::Value;

use cecl_panel_core::ecl::DEFAULT_LGD;
use cecl_panel_core::reporting::{build_report, roll_rate_matrix, ReportInput};
use cecl_panel_core::schema::{loans_from_json, panel_from_json};
use cecl_panel_core::validation::{validate_dataset, ValidationInput};
use cecl_panel_core::{Loan, PerformanceRecord, ProductType};

use crate::input;

/// Arguments for dataset validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to JSON/YAML ValidationInput: {"loans": {...}, "panels": {...}}
    #[arg(long)]
    pub input: Option<String>,

    /// Product of the --loans / --panel files
    #[arg(long)]
    pub product: Option<ProductType>,

    /// Loan batch file
    #[arg(long)]
    pub loans: Option<String>,

    /// Panel file
    #[arg(long)]
    pub panel: Option<String>,
}

/// Arguments for the roll-rate matrix
#[derive(Args)]
pub struct RollRatesArgs {
    /// Panel file (array of rows)
    #[arg(long)]
    pub panel: Option<String>,
}

/// Arguments for the panel report
#[derive(Args)]
pub struct ReportArgs {
    /// Path to JSON/YAML ReportInput (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Panel file (array of rows)
    #[arg(long)]
    pub panel: Option<String>,

    /// Loan tape file, for the vintage summary
    #[arg(long)]
    pub loans: Option<String>,

    /// LGD applied where a row carries none
    #[arg(long, default_value_t = DEFAULT_LGD)]
    pub default_lgd: f64,
}

fn read_rows(path: &str) -> Result<Vec<Value>, Box<dyn std::error::Error>> {
    match input::file::read_config_value(path)? {
        Value::Array(rows) => Ok(rows),
        _ => Err(format!("'{path}' must hold an array of records").into()),
    }
}

fn read_panel(path: &str) -> Result<Vec<PerformanceRecord>, Box<dyn std::error::Error>> {
    Ok(panel_from_json(read_rows(path)?)?)
}

fn read_loans(path: &str) -> Result<Vec<Loan>, Box<dyn std::error::Error>> {
    Ok(loans_from_json(read_rows(path)?)?)
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let validation_input: ValidationInput = if let Some(i) = input::load(args.input.as_deref())? {
        i
    } else {
        let product = args
            .product
            .ok_or("--product is required with --loans/--panel (or provide --input)")?;
        let mut v = ValidationInput::default();
        if let Some(ref path) = args.loans {
            v.loans.insert(product, read_rows(path)?);
        }
        if let Some(ref path) = args.panel {
            v.panels.insert(product, read_rows(path)?);
        }
        if v.loans.is_empty() && v.panels.is_empty() {
            return Err("Nothing to validate: pass --loans and/or --panel".into());
        }
        v
    };
    let result = validate_dataset(&validation_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_roll_rates(args: RollRatesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let panel = match args.panel {
        Some(ref path) => read_panel(path)?,
        None => {
            let data = input::stdin::read_stdin()?.ok_or("--panel is required (or pipe JSON on stdin)")?;
            match data {
                Value::Array(rows) => panel_from_json(rows)?,
                _ => return Err("stdin must hold an array of panel rows".into()),
            }
        }
    };
    Ok(serde_json::to_value(roll_rate_matrix(&panel))?)
}

pub fn run_report(args: ReportArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let report_input: ReportInput = if let Some(i) = input::load(args.input.as_deref())? {
        i
    } else {
        let panel_path = args.panel.ok_or("--panel is required (or provide --input)")?;
        ReportInput {
            panel: read_panel(&panel_path)?,
            loans: match args.loans {
                Some(ref path) => read_loans(path)?,
                None => Vec::new(),
            },
            default_lgd: args.default_lgd,
        }
    };
    let result = build_report(&report_input)?;
    Ok(serde_json::to_value(result)?)
}
